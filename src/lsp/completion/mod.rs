use thiserror::Error;
use tower_lsp_server::lsp_types::{CompletionItem, Position, Range};

use crate::language::ast::Node;
use crate::lsp::backend::Snapshot;
use crate::lsp::text;
use crate::model::{LinkedFile, MessageDescriptor};

mod items;
mod options;
mod resolve;
mod scope;
#[cfg(test)]
mod tests;

pub use items::{field_completion, field_type_detail};
pub use options::{
    complete_option_names, option_statement_partial, split_option_path, OptionPathSegment,
};
pub use resolve::deep_path_search;
pub use scope::narrowest_enclosing_scope;

/// Infrastructure failures only. Every resolution miss — no scope at the
/// cursor, an unresolved path segment, an unknown extension — degrades to
/// an empty candidate list instead.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("document not tracked by the workspace: {uri}")]
    DocumentNotFound { uri: String },
    #[error("position {line}:{character} is outside the document")]
    InvalidPosition { line: u32, character: u32 },
}

pub fn completion_trigger_characters() -> Vec<String> {
    vec![".".into(), "(".into()]
}

/// The completion entry point: derive everything from the immutable
/// snapshot, produce an ordered candidate list. Read-only and side-effect
/// free; a superseded request is simply discarded by the caller.
pub fn completion_items(
    snapshot: &Snapshot,
    position: Position,
) -> Result<Vec<CompletionItem>, CompletionError> {
    let offset = text::position_offset(&snapshot.text, position).ok_or(
        CompletionError::InvalidPosition {
            line: position.line,
            character: position.character,
        },
    )?;
    let mut found = Vec::new();

    // Option-name completion after an open `option ` statement. The scope
    // comes from the live tree — option resolution is name-based, so it is
    // safe against the current text even mid-edit — while descriptors come
    // from the last successful link.
    if let Some(partial) = options::option_statement_partial(text::line_prefix(&snapshot.text, offset))
    {
        if let Some(linked) = &snapshot.linked {
            if let Some(path) = scope::narrowest_enclosing_scope(&snapshot.parse.file, offset) {
                found.extend(options::complete_option_names(&path, partial, linked));
            }
        }
    }

    // Message-literal field completion. Node-identity resolution must use
    // the tree the linked model was built from, so the scope search runs
    // on the arbiter's target with the offset clamped to that revision.
    if let Some(linked) = &snapshot.linked {
        let target = snapshot.search_target();
        let target_offset = offset.min(target.source.len());
        if let Some(path) = scope::narrowest_enclosing_scope(&target.file, target_offset) {
            if let Some(Node::MessageLiteral(literal)) = path.last() {
                if let Some(desc) = resolve::deep_path_search(&path, linked) {
                    let insert = Range {
                        start: position,
                        end: position,
                    };
                    found.extend(literal_field_completions(linked, &desc, literal, insert));
                }
            }
        }
    }

    Ok(found)
}

/// Offer every declared field of `desc` not already present in the literal,
/// in declaration order. Only an exact already-present name suppresses a
/// singular field; repeated fields may legitimately repeat and stay
/// offered.
fn literal_field_completions(
    linked: &LinkedFile,
    desc: &MessageDescriptor,
    literal: &crate::language::ast::MessageLiteral,
    insert: Range,
) -> Vec<CompletionItem> {
    let existing: Vec<&str> = literal
        .elements
        .iter()
        .filter(|element| desc.field_by_name(&element.name).is_some())
        .map(|element| element.name.as_str())
        .collect();
    desc.fields
        .iter()
        .filter(|fld| fld.is_repeated() || !existing.contains(&fld.name.as_str()))
        .map(|fld| items::field_completion(linked, fld, insert))
        .collect()
}
