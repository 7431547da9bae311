//! Node-path descriptor resolution: mapping a scope path from the syntax
//! tree onto the linked model. Every lookup miss yields `None` — a typo'd
//! field name or unresolved type simply produces no completions.

use std::sync::Arc;

use crate::language::ast::{Node, OptionNode, OptionPart};
use crate::model::{options as builtin, FieldDescriptor, LinkedFile, MessageDescriptor};

/// Walk a root-first scope path, maintaining the message descriptor the
/// innermost node populates. The caller must pass a path obtained from the
/// same tree `linked` was built from.
pub fn deep_path_search(
    path: &[Node<'_>],
    linked: &LinkedFile,
) -> Option<Arc<MessageDescriptor>> {
    let mut scope = linked.package().to_string();
    let mut context: Option<Arc<MessageDescriptor>> = None;
    // Which implicit options message an `option` statement at this depth
    // would target.
    let mut options_scope = builtin::FILE_OPTIONS;
    for node in path {
        match node {
            Node::File(_) | Node::Enum(_) | Node::Extend(_) => {}
            Node::Message(message) => {
                if !scope.is_empty() {
                    scope.push('.');
                }
                scope.push_str(&message.name);
                context = Some(linked.message(&scope)?.clone());
                options_scope = builtin::MESSAGE_OPTIONS;
            }
            Node::Field(_) => {
                options_scope = builtin::FIELD_OPTIONS;
            }
            Node::Option(option) => {
                context = Some(resolve_option_node(linked, option, options_scope)?);
            }
            // The literal populates whatever message the preceding nodes
            // resolved to.
            Node::MessageLiteral(_) => {
                context.as_ref()?;
            }
            Node::LiteralElement(element) => {
                let ctx = context.as_ref()?;
                let field = ctx.field_by_name(&element.name)?;
                context = linked.message_type_of(field).cloned();
            }
        }
    }
    context
}

/// Resolve a fully parsed option path to the message type its value
/// populates. Unlike the partially-typed case, a plain first part resolves
/// against the implicit options message for the enclosing construct.
fn resolve_option_node(
    linked: &LinkedFile,
    option: &OptionNode,
    default_options: &str,
) -> Option<Arc<MessageDescriptor>> {
    let mut context: Option<Arc<MessageDescriptor>> = None;
    for part in &option.parts {
        let field: Arc<FieldDescriptor> = match part {
            OptionPart::Extension { name, .. } => match &context {
                None => linked
                    .find_extension_by_name(&qualify(linked, name))?
                    .clone(),
                Some(ctx) => ctx.extension_by_name(name)?.clone(),
            },
            OptionPart::Plain { name, .. } => {
                let ctx = match &context {
                    Some(ctx) => ctx.clone(),
                    None => linked.message(default_options)?.clone(),
                };
                ctx.field_by_name(name)?.clone()
            }
        };
        context = linked.message_type_of(&field).cloned();
        context.as_ref()?;
    }
    context
}

fn qualify(linked: &LinkedFile, name: &str) -> String {
    if name.contains('.') || linked.package().is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", linked.package(), name)
    }
}
