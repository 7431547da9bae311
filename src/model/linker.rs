use crate::language::{
    ast::{Extend, Field, FieldLabel, FieldType, File, Message, OptionPart, OptionValue},
    parser::ParseResult,
};
use crate::model::descriptor::{Cardinality, FieldDescriptor, FieldKind, MessageDescriptor};
use crate::model::options;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// The fully resolved semantic view of one parsed file plus the built-in
/// option types. A `LinkedFile` owns the `ParseResult` it was built from;
/// node-identity lookups against any other tree are impossible by
/// construction, which is the stale-state invariant the completion engine
/// relies on.
pub struct LinkedFile {
    parse: Arc<ParseResult>,
    package: String,
    messages: HashMap<String, Arc<MessageDescriptor>>,
    extensions: HashMap<String, Arc<FieldDescriptor>>,
}

impl LinkedFile {
    /// Linking is total: unresolvable type names become dangling references
    /// that simply fail to look up later, they never abort the link.
    pub fn link(parse: Arc<ParseResult>) -> LinkedFile {
        let package = parse.file.package.clone().unwrap_or_default();
        let mut linker = Linker {
            package: package.clone(),
            declared: HashSet::new(),
            enums: HashSet::new(),
            messages: HashMap::new(),
            extensions: HashMap::new(),
        };
        for builtin in options::builtin_messages() {
            linker.declared.insert(builtin.full_name.clone());
            linker.messages.insert(builtin.full_name.clone(), builtin);
        }
        linker.collect_names(&parse.file);
        linker.build(&parse.file);
        LinkedFile {
            parse,
            package,
            messages: linker.messages,
            extensions: linker.extensions,
        }
    }

    /// The AST this semantic model was built from.
    pub fn parse(&self) -> &Arc<ParseResult> {
        &self.parse
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn message(&self, full_name: &str) -> Option<&Arc<MessageDescriptor>> {
        self.messages.get(full_name)
    }

    /// The message a message-typed (or map) field points at.
    pub fn message_type_of(&self, field: &FieldDescriptor) -> Option<&Arc<MessageDescriptor>> {
        match &field.kind {
            FieldKind::Message(name) => self.messages.get(name),
            _ => None,
        }
    }

    pub fn find_extension_by_name(&self, full_name: &str) -> Option<&Arc<FieldDescriptor>> {
        self.extensions.get(full_name)
    }

    /// Name-prefix search over every known field and extension descriptor,
    /// filtered by the caller's predicate. Results are ordered by full name
    /// so completion lists are deterministic.
    pub fn find_descriptors_by_prefix(
        &self,
        prefix: &str,
        predicate: impl Fn(&FieldDescriptor) -> bool,
    ) -> Vec<Arc<FieldDescriptor>> {
        let mut found: Vec<Arc<FieldDescriptor>> = Vec::new();
        for message in self.messages.values() {
            for field in &message.fields {
                if field.name.starts_with(prefix) && predicate(field) {
                    found.push(field.clone());
                }
            }
        }
        for ext in self.extensions.values() {
            if ext.name.starts_with(prefix) && predicate(ext) {
                found.push(ext.clone());
            }
        }
        found.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        found.dedup_by(|a, b| a.full_name == b.full_name);
        found
    }
}

struct Linker {
    package: String,
    declared: HashSet<String>,
    enums: HashSet<String>,
    messages: HashMap<String, Arc<MessageDescriptor>>,
    extensions: HashMap<String, Arc<FieldDescriptor>>,
}

impl Linker {
    fn scoped(&self, scope: &str, name: &str) -> String {
        if scope.is_empty() {
            name.to_string()
        } else {
            format!("{scope}.{name}")
        }
    }

    fn collect_names(&mut self, file: &File) {
        let package = self.package.clone();
        for message in &file.messages {
            self.collect_message_names(&package, message);
        }
        for node in &file.enums {
            let full = self.scoped(&package, &node.name);
            self.declared.insert(full.clone());
            self.enums.insert(full);
        }
    }

    fn collect_message_names(&mut self, scope: &str, message: &Message) {
        let full = self.scoped(scope, &message.name);
        self.declared.insert(full.clone());
        for nested in &message.nested {
            self.collect_message_names(&full, nested);
        }
        for node in &message.enums {
            let nested_enum = self.scoped(&full, &node.name);
            self.declared.insert(nested_enum.clone());
            self.enums.insert(nested_enum);
        }
    }

    /// Resolve a written type name against the enclosing scope chain, the
    /// package root, and finally the name as written (for absolute
    /// references such as `google.protobuf.MessageOptions`).
    fn resolve_type_name(&self, scope: &str, written: &str) -> String {
        let written = written.strip_prefix('.').unwrap_or(written);
        let mut scope = scope.to_string();
        loop {
            let candidate = self.scoped(&scope, written);
            if self.declared.contains(&candidate) {
                return candidate;
            }
            match scope.rfind('.') {
                Some(idx) => scope.truncate(idx),
                None if !scope.is_empty() => scope.clear(),
                None => break,
            }
        }
        if self.declared.contains(written) || written.contains('.') {
            written.to_string()
        } else {
            self.scoped(&self.package, written)
        }
    }

    fn field_kind(&self, scope: &str, written: &str) -> FieldKind {
        if let Some(scalar) = FieldKind::scalar(written) {
            return scalar;
        }
        let resolved = self.resolve_type_name(scope, written);
        if self.enums.contains(&resolved) {
            FieldKind::Enum(resolved)
        } else {
            FieldKind::Message(resolved)
        }
    }

    fn build(&mut self, file: &File) {
        let package = self.package.clone();
        for message in &file.messages {
            let built = self.build_message(&package, message);
            self.messages.insert(built.full_name.clone(), built);
        }
        for extend in &file.extends {
            let extensions = self.build_extend(&package, extend);
            for ext in extensions {
                self.extensions.insert(ext.full_name.clone(), ext);
            }
        }
    }

    fn build_message(&mut self, scope: &str, message: &Message) -> Arc<MessageDescriptor> {
        let full = self.scoped(scope, &message.name);
        let fields = message
            .fields
            .iter()
            .map(|field| Arc::new(self.build_field(&full, field, None)))
            .collect();
        let mut declared_extensions = Vec::new();
        for extend in &message.extends {
            let extensions = self.build_extend(&full, extend);
            for ext in extensions {
                self.extensions.insert(ext.full_name.clone(), ext.clone());
                declared_extensions.push(ext);
            }
        }
        for nested in &message.nested {
            let built = self.build_message(&full, nested);
            self.messages.insert(built.full_name.clone(), built);
        }
        Arc::new(MessageDescriptor {
            full_name: full,
            fields,
            extensions: declared_extensions,
            is_map_entry: false,
            map_key: None,
            map_value: None,
            leading_comment: message.leading_comment.clone(),
        })
    }

    fn build_extend(&mut self, scope: &str, extend: &Extend) -> Vec<Arc<FieldDescriptor>> {
        let extendee = self.resolve_type_name(scope, &extend.extendee);
        extend
            .fields
            .iter()
            .map(|field| Arc::new(self.build_field(scope, field, Some(extendee.clone()))))
            .collect()
    }

    fn build_field(
        &mut self,
        scope: &str,
        field: &Field,
        extendee: Option<String>,
    ) -> FieldDescriptor {
        let kind = match &field.ty {
            FieldType::Named(name) => self.field_kind(scope, name),
            FieldType::Map { key, value } => self.build_map_entry(scope, field, key, value),
        };
        FieldDescriptor {
            name: field.name.clone(),
            full_name: self.scoped(scope, &field.name),
            number: field.number,
            cardinality: if field.label == FieldLabel::Repeated {
                Cardinality::Repeated
            } else {
                Cardinality::Singular
            },
            kind,
            is_extension: extendee.is_some(),
            extendee,
            deprecated: field_marked_deprecated(field),
            leading_comment: field.leading_comment.clone(),
        }
    }

    /// Synthesize the implicit map entry message, mirroring how the
    /// compiler lowers `map<K, V> name` to a nested `NameEntry` message.
    fn build_map_entry(&mut self, scope: &str, field: &Field, key: &str, value: &str) -> FieldKind {
        let entry_name = self.scoped(scope, &format!("{}Entry", camel_case(&field.name)));
        let key_kind = FieldKind::scalar(key).unwrap_or(FieldKind::String);
        let value_kind = self.field_kind(scope, value);
        let entry = Arc::new(MessageDescriptor {
            full_name: entry_name.clone(),
            fields: Vec::new(),
            extensions: Vec::new(),
            is_map_entry: true,
            map_key: Some(key_kind),
            map_value: Some(value_kind),
            leading_comment: None,
        });
        self.declared.insert(entry_name.clone());
        self.messages.insert(entry_name.clone(), entry);
        FieldKind::Message(entry_name)
    }
}

fn field_marked_deprecated(field: &Field) -> bool {
    field.options.iter().any(|option| {
        matches!(option.parts.as_slice(), [OptionPart::Plain { name, .. }] if name == "deprecated")
            && matches!(&option.value, OptionValue::Identifier(value, _) if value == "true")
    })
}

fn camel_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::parser::parse;

    fn link(source: &str) -> LinkedFile {
        let parse = parse(source);
        assert!(parse.is_well_formed(), "errors: {:?}", parse.errors);
        LinkedFile::link(Arc::new(parse))
    }

    #[test]
    fn links_messages_and_nested_scopes() {
        let linked = link(
            r#"
package demo;
message Outer {
  message Inner {
    string value = 1;
  }
  Inner inner = 1;
}
"#,
        );
        let outer = linked.message("demo.Outer").expect("outer");
        let inner_field = outer.field_by_name("inner").expect("inner field");
        assert_eq!(
            inner_field.kind,
            FieldKind::Message("demo.Outer.Inner".into())
        );
        assert!(linked.message("demo.Outer.Inner").is_some());
    }

    #[test]
    fn registers_extensions_with_resolved_extendee() {
        let linked = link(
            r#"
package demo;
extend google.protobuf.MessageOptions {
  optional string owner = 50001;
}
"#,
        );
        let ext = linked.find_extension_by_name("demo.owner").expect("owner");
        assert!(ext.is_extension);
        assert_eq!(
            ext.extendee.as_deref(),
            Some("google.protobuf.MessageOptions")
        );
    }

    #[test]
    fn synthesizes_map_entry_messages() {
        let linked = link(
            r#"
package demo;
message Labeled {
  map<string, int64> labels = 1;
}
"#,
        );
        let labeled = linked.message("demo.Labeled").expect("message");
        let labels = labeled.field_by_name("labels").expect("labels");
        let entry = linked.message_type_of(labels).expect("entry message");
        assert!(entry.is_map_entry);
        assert_eq!(entry.map_key, Some(FieldKind::String));
        assert_eq!(entry.map_value, Some(FieldKind::Int64));
    }

    #[test]
    fn prefix_search_spans_user_and_builtin_descriptors() {
        let linked = link(
            r#"
package demo;
extend google.protobuf.MessageOptions {
  optional bool deprecated_alias = 50002;
}
"#,
        );
        let found = linked.find_descriptors_by_prefix("deprecated", |fd| {
            fd.extendee.as_deref() == Some("google.protobuf.MessageOptions") || !fd.is_extension
        });
        let names: Vec<_> = found.iter().map(|fd| fd.full_name.as_str()).collect();
        assert!(names.contains(&"demo.deprecated_alias"));
        assert!(names.contains(&"google.protobuf.MessageOptions.deprecated"));
    }

    #[test]
    fn reads_deprecated_flag_from_field_options() {
        let linked = link(
            r#"
package demo;
message M {
  string old = 1 [deprecated = true];
  string new_name = 2;
}
"#,
        );
        let m = linked.message("demo.M").expect("message");
        assert!(m.field_by_name("old").expect("old").deprecated);
        assert!(!m.field_by_name("new_name").expect("new").deprecated);
    }
}
