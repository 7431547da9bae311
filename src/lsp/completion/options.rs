//! Option-name completion. The "am I inside an option statement" check is a
//! deliberate lexical heuristic: the statement being completed is by
//! definition not yet parseable, so it is detected by scanning the text of
//! the cursor's line rather than by a grammar production.

use std::sync::Arc;

use tower_lsp_server::lsp_types::CompletionItem;

use super::items;
use crate::language::ast::Node;
use crate::model::{options as builtin, FieldDescriptor, LinkedFile, MessageDescriptor};

/// One `.`-delimited token of a partially typed option path. Extension
/// segments are wrapped in parentheses; the last one may still be missing
/// its closing paren while the user types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionPathSegment {
    pub name: String,
    pub is_extension: bool,
    pub closed: bool,
}

/// The partial option name under the cursor, if the line-start→cursor text
/// contains an open `option` statement. Matches `option ` with its trailing
/// space so `optional` never triggers, and gives up once a `;` closes the
/// statement.
pub fn option_statement_partial(line_prefix: &str) -> Option<&str> {
    let idx = line_prefix.rfind("option ")?;
    if idx > 0 {
        let before = line_prefix.as_bytes()[idx - 1];
        if before.is_ascii_alphanumeric() || before == b'_' {
            return None;
        }
    }
    let after = &line_prefix[idx + "option ".len()..];
    if after.contains(';') {
        return None;
    }
    Some(after.trim())
}

/// Split a partial option path into segments, keeping dots inside an
/// unclosed parenthesized name together with that segment. A trailing `.`
/// yields an empty final segment, which acts as a match-everything filter.
pub fn split_option_path(text: &str) -> Vec<OptionPathSegment> {
    let mut segments = Vec::new();
    let mut name = String::new();
    let mut is_extension = false;
    let mut closed = false;
    for ch in text.chars() {
        match ch {
            '(' if name.is_empty() && !is_extension => is_extension = true,
            ')' if is_extension && !closed => closed = true,
            '.' if !is_extension || closed => {
                segments.push(OptionPathSegment {
                    name: std::mem::take(&mut name),
                    is_extension,
                    closed,
                });
                is_extension = false;
                closed = false;
            }
            _ => name.push(ch),
        }
    }
    segments.push(OptionPathSegment {
        name,
        is_extension,
        closed,
    });
    segments
}

/// Resolve every segment of an option path to the message context it ends
/// in. The walk starts from a `nil` context meaning the implicit options
/// message for the enclosing construct; any unresolved segment, and any
/// scalar field with segments still to consume, aborts with `None` — a
/// resolution miss, never an error.
pub(super) fn resolve_segments(
    linked: &LinkedFile,
    segments: &[OptionPathSegment],
) -> Option<Arc<MessageDescriptor>> {
    let mut context: Option<Arc<MessageDescriptor>> = None;
    for segment in segments {
        if segment.name.is_empty() {
            return None;
        }
        let field: Arc<FieldDescriptor> = if segment.is_extension {
            match &context {
                // No context yet: the name resolves globally, relative to
                // the current package unless already qualified.
                None => {
                    let fqn = if segment.name.contains('.') {
                        segment.name.clone()
                    } else if linked.package().is_empty() {
                        segment.name.clone()
                    } else {
                        format!("{}.{}", linked.package(), segment.name)
                    };
                    linked.find_extension_by_name(&fqn)?.clone()
                }
                Some(ctx) => ctx.extension_by_name(&segment.name)?.clone(),
            }
        } else {
            context.as_ref()?.field_by_name(&segment.name)?.clone()
        };
        context = linked.message_type_of(&field).cloned();
        context.as_ref()?;
    }
    context
}

/// Entry point for option-name completion, dispatched on the innermost
/// scope node. Only message declarations complete today; field options are
/// a separate scope to be wired in here.
pub fn complete_option_names(
    path: &[Node<'_>],
    partial_name: &str,
    linked: &LinkedFile,
) -> Vec<CompletionItem> {
    match path.last() {
        Some(Node::Message(_)) => complete_message_option_names(partial_name, linked),
        _ => Vec::new(),
    }
}

fn complete_message_option_names(partial_name: &str, linked: &LinkedFile) -> Vec<CompletionItem> {
    let segments = split_option_path(partial_name);
    if segments.len() == 1 {
        let first = &segments[0];
        if first.closed {
            // A fully parenthesized name is complete; the next step is a
            // `.` continuation, not another candidate here.
            return Vec::new();
        }
        return complete_first_segment(first, linked);
    }
    let (last, init) = segments.split_last().expect("segments is never empty");
    let Some(context) = resolve_segments(linked, init) else {
        return Vec::new();
    };
    complete_in_context(&context, last, linked)
}

fn complete_first_segment(segment: &OptionPathSegment, linked: &LinkedFile) -> Vec<CompletionItem> {
    let want_extension = segment.is_extension;
    let candidates = linked.find_descriptors_by_prefix(&segment.name, |fd| {
        if want_extension {
            fd.is_extension && fd.extendee.as_deref() == Some(builtin::MESSAGE_OPTIONS)
        } else {
            !fd.is_extension && fd.containing_message() == Some(builtin::MESSAGE_OPTIONS)
        }
    });
    candidates
        .iter()
        .map(|fd| {
            if fd.kind.is_message() {
                if want_extension {
                    // The '(' is already typed; insert `name)`.
                    items::extension_field_item(linked, fd, false)
                } else {
                    items::message_field_item(linked, fd)
                }
            } else if want_extension {
                items::extension_scalar_option_item(linked, fd, false)
            } else {
                items::scalar_option_item(linked, fd)
            }
        })
        .collect()
}

/// Last-segment filtering is case-sensitive substring containment on the
/// simple name, favoring recall for short partial identifiers.
fn complete_in_context(
    context: &MessageDescriptor,
    last: &OptionPathSegment,
    linked: &LinkedFile,
) -> Vec<CompletionItem> {
    let mut found = Vec::new();
    if last.is_extension {
        for ext in &context.extensions {
            if !ext.name.contains(&last.name) {
                continue;
            }
            found.push(render_candidate(linked, ext, true));
        }
    } else {
        for field in &context.fields {
            if !field.name.contains(&last.name) {
                continue;
            }
            found.push(render_candidate(linked, field, false));
        }
    }
    found
}

fn render_candidate(
    linked: &LinkedFile,
    fd: &Arc<FieldDescriptor>,
    paren_typed: bool,
) -> CompletionItem {
    let is_map = linked
        .message_type_of(fd)
        .map(|m| m.is_map_entry)
        .unwrap_or(false);
    if is_map {
        items::map_field_item(linked, fd)
    } else if fd.kind.is_message() {
        if paren_typed {
            items::extension_field_item(linked, fd, false)
        } else {
            items::message_field_item(linked, fd)
        }
    } else if paren_typed {
        items::extension_scalar_option_item(linked, fd, false)
    } else {
        items::scalar_option_item(linked, fd)
    }
}
