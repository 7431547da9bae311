use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    Singular,
    Repeated,
}

/// Closed variant over everything a field can hold. Message and enum types
/// are referenced by full name and resolved through the owning
/// [`LinkedFile`](crate::model::LinkedFile); a name that never resolves is a
/// completion miss, not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    Message(String),
    Enum(String),
}

impl FieldKind {
    pub fn scalar(name: &str) -> Option<FieldKind> {
        Some(match name {
            "double" => FieldKind::Double,
            "float" => FieldKind::Float,
            "int32" => FieldKind::Int32,
            "int64" => FieldKind::Int64,
            "uint32" => FieldKind::Uint32,
            "uint64" => FieldKind::Uint64,
            "sint32" => FieldKind::Sint32,
            "sint64" => FieldKind::Sint64,
            "fixed32" => FieldKind::Fixed32,
            "fixed64" => FieldKind::Fixed64,
            "sfixed32" => FieldKind::Sfixed32,
            "sfixed64" => FieldKind::Sfixed64,
            "bool" => FieldKind::Bool,
            "string" => FieldKind::String,
            "bytes" => FieldKind::Bytes,
            _ => return None,
        })
    }

    pub fn is_message(&self) -> bool {
        matches!(self, FieldKind::Message(_))
    }

    /// The declared type name as shown in completion detail strings.
    pub fn display(&self) -> &str {
        match self {
            FieldKind::Double => "double",
            FieldKind::Float => "float",
            FieldKind::Int32 => "int32",
            FieldKind::Int64 => "int64",
            FieldKind::Uint32 => "uint32",
            FieldKind::Uint64 => "uint64",
            FieldKind::Sint32 => "sint32",
            FieldKind::Sint64 => "sint64",
            FieldKind::Fixed32 => "fixed32",
            FieldKind::Fixed64 => "fixed64",
            FieldKind::Sfixed32 => "sfixed32",
            FieldKind::Sfixed64 => "sfixed64",
            FieldKind::Bool => "bool",
            FieldKind::String => "string",
            FieldKind::Bytes => "bytes",
            FieldKind::Message(name) | FieldKind::Enum(name) => name,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    pub name: String,
    pub full_name: String,
    pub number: i64,
    pub cardinality: Cardinality,
    pub kind: FieldKind,
    pub is_extension: bool,
    /// For extensions, the full name of the extended message.
    pub extendee: Option<String>,
    pub deprecated: bool,
    /// Leading comment from the defining file; `None` for built-ins, which
    /// have no recorded source location.
    pub leading_comment: Option<String>,
}

impl FieldDescriptor {
    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }

    /// The message whose numbering space this field occupies: the extendee
    /// for extensions, the declaring message otherwise.
    pub fn containing_message(&self) -> Option<&str> {
        if let Some(extendee) = &self.extendee {
            return Some(extendee);
        }
        let parent_len = self.full_name.len().checked_sub(self.name.len() + 1)?;
        if parent_len == 0 {
            None
        } else {
            Some(&self.full_name[..parent_len])
        }
    }
}

#[derive(Clone, Debug)]
pub struct MessageDescriptor {
    pub full_name: String,
    /// Declaration order is preserved; completion offers fields in this order.
    pub fields: Vec<Arc<FieldDescriptor>>,
    /// Extensions declared inside this message body (nested `extend` blocks).
    pub extensions: Vec<Arc<FieldDescriptor>>,
    pub is_map_entry: bool,
    pub map_key: Option<FieldKind>,
    pub map_value: Option<FieldKind>,
    pub leading_comment: Option<String>,
}

impl MessageDescriptor {
    pub fn field_by_name(&self, name: &str) -> Option<&Arc<FieldDescriptor>> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn extension_by_name(&self, name: &str) -> Option<&Arc<FieldDescriptor>> {
        self.extensions.iter().find(|ext| ext.name == name)
    }
}
