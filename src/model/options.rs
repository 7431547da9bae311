//! Built-in `google.protobuf.*Options` descriptors. These are merged into
//! every linked file so option-name completion works without the user
//! importing descriptor.proto. Built-ins carry no leading comments because
//! they have no source location in the workspace.

use crate::model::descriptor::{Cardinality, FieldDescriptor, FieldKind, MessageDescriptor};
use std::sync::Arc;

pub const MESSAGE_OPTIONS: &str = "google.protobuf.MessageOptions";
pub const FIELD_OPTIONS: &str = "google.protobuf.FieldOptions";
pub const FILE_OPTIONS: &str = "google.protobuf.FileOptions";
const UNINTERPRETED_OPTION: &str = "google.protobuf.UninterpretedOption";

struct BuiltinField {
    name: &'static str,
    number: i64,
    kind: FieldKind,
    cardinality: Cardinality,
    deprecated: bool,
}

fn field(name: &'static str, number: i64, kind: FieldKind) -> BuiltinField {
    BuiltinField {
        name,
        number,
        kind,
        cardinality: Cardinality::Singular,
        deprecated: false,
    }
}

fn message(full_name: &str, fields: Vec<BuiltinField>) -> Arc<MessageDescriptor> {
    let fields = fields
        .into_iter()
        .map(|f| {
            Arc::new(FieldDescriptor {
                name: f.name.to_string(),
                full_name: format!("{full_name}.{}", f.name),
                number: f.number,
                cardinality: f.cardinality,
                kind: f.kind,
                is_extension: false,
                extendee: None,
                deprecated: f.deprecated,
                leading_comment: None,
            })
        })
        .collect();
    Arc::new(MessageDescriptor {
        full_name: full_name.to_string(),
        fields,
        extensions: Vec::new(),
        is_map_entry: false,
        map_key: None,
        map_value: None,
        leading_comment: None,
    })
}

/// Field numbers and deprecation flags follow descriptor.proto.
pub fn builtin_messages() -> Vec<Arc<MessageDescriptor>> {
    let uninterpreted = BuiltinField {
        name: "uninterpreted_option",
        number: 999,
        kind: FieldKind::Message(UNINTERPRETED_OPTION.to_string()),
        cardinality: Cardinality::Repeated,
        deprecated: false,
    };
    vec![
        message(
            MESSAGE_OPTIONS,
            vec![
                field("message_set_wire_format", 1, FieldKind::Bool),
                field("no_standard_descriptor_accessor", 2, FieldKind::Bool),
                field("deprecated", 3, FieldKind::Bool),
                BuiltinField {
                    deprecated: true,
                    ..field("map_entry", 7, FieldKind::Bool)
                },
                uninterpreted,
            ],
        ),
        message(
            FIELD_OPTIONS,
            vec![
                field("ctype", 1, FieldKind::Enum(format!("{FIELD_OPTIONS}.CType"))),
                field("packed", 2, FieldKind::Bool),
                field(
                    "jstype",
                    6,
                    FieldKind::Enum(format!("{FIELD_OPTIONS}.JSType")),
                ),
                field("lazy", 5, FieldKind::Bool),
                field("unverified_lazy", 15, FieldKind::Bool),
                field("deprecated", 3, FieldKind::Bool),
                BuiltinField {
                    deprecated: true,
                    ..field("weak", 10, FieldKind::Bool)
                },
                field("debug_redact", 16, FieldKind::Bool),
            ],
        ),
        message(
            FILE_OPTIONS,
            vec![
                field("java_package", 1, FieldKind::String),
                field("java_outer_classname", 8, FieldKind::String),
                field("java_multiple_files", 10, FieldKind::Bool),
                field(
                    "optimize_for",
                    9,
                    FieldKind::Enum(format!("{FILE_OPTIONS}.OptimizeMode")),
                ),
                field("go_package", 11, FieldKind::String),
                field("cc_enable_arenas", 31, FieldKind::Bool),
                field("objc_class_prefix", 36, FieldKind::String),
                field("csharp_namespace", 37, FieldKind::String),
                field("deprecated", 23, FieldKind::Bool),
            ],
        ),
        message(
            UNINTERPRETED_OPTION,
            vec![
                field("identifier_value", 3, FieldKind::String),
                field("positive_int_value", 4, FieldKind::Uint64),
                field("negative_int_value", 5, FieldKind::Int64),
                field("double_value", 6, FieldKind::Double),
                field("string_value", 7, FieldKind::Bytes),
                field("aggregate_value", 8, FieldKind::String),
            ],
        ),
    ]
}
