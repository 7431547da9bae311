//! Synthesis of editor-insertable completion items. One small constructor
//! per field shape keeps the rendering rules data-driven and testable apart
//! from resolution.

use tower_lsp_server::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionTextEdit, Documentation, InsertTextFormat,
    InsertTextMode, MarkupContent, MarkupKind, Range, TextEdit,
};

use crate::model::{FieldDescriptor, FieldKind, LinkedFile};

/// A field candidate inside a message literal, inserted at `range`.
pub fn field_completion(
    linked: &LinkedFile,
    fld: &FieldDescriptor,
    range: Range,
) -> CompletionItem {
    let name = &fld.name;
    let mut item = CompletionItem {
        label: name.clone(),
        kind: Some(CompletionItemKind::FIELD),
        detail: Some(field_type_detail(linked, fld)),
        documentation: documentation(fld),
        deprecated: fld.deprecated.then_some(true),
        ..Default::default()
    };
    if fld.is_repeated() {
        item.detail = item.detail.map(|detail| format!("repeated {detail}"));
        item.text_edit = Some(CompletionTextEdit::Edit(TextEdit {
            range,
            new_text: format!("{name}: [\n  ${{0}}\n]"),
        }));
        item.insert_text_format = Some(InsertTextFormat::SNIPPET);
        item.insert_text_mode = Some(InsertTextMode::ADJUST_INDENTATION);
    } else if let Some(entry) = linked.message_type_of(fld).filter(|m| m.is_map_entry) {
        item.text_edit = Some(CompletionTextEdit::Edit(TextEdit {
            range,
            new_text: map_snippet(name, entry.map_key.as_ref(), entry.map_value.as_ref()),
        }));
        item.insert_text_format = Some(InsertTextFormat::SNIPPET);
    } else if fld.kind.is_message() {
        item.text_edit = Some(CompletionTextEdit::Edit(TextEdit {
            range,
            new_text: format!("{name}: {{\n  ${{0}}\n}}"),
        }));
        item.insert_text_format = Some(InsertTextFormat::SNIPPET);
        item.insert_text_mode = Some(InsertTextMode::ADJUST_INDENTATION);
    } else {
        // Scalar: just the name and separator; the caller types the value.
        item.text_edit = Some(CompletionTextEdit::Edit(TextEdit {
            range,
            new_text: format!("{name}: "),
        }));
    }
    item
}

/// Map fields complete to the full `name = {key: ..., value: ...};` literal
/// shorthand.
pub fn map_field_item(linked: &LinkedFile, fld: &FieldDescriptor) -> CompletionItem {
    let entry = linked.message_type_of(fld).filter(|m| m.is_map_entry);
    let (key, value) = entry
        .map(|m| (m.map_key.clone(), m.map_value.clone()))
        .unwrap_or((None, None));
    CompletionItem {
        label: fld.name.clone(),
        kind: Some(CompletionItemKind::STRUCT),
        detail: Some(field_type_detail(linked, fld)),
        documentation: documentation(fld),
        deprecated: fld.deprecated.then_some(true),
        insert_text_format: Some(InsertTextFormat::SNIPPET),
        insert_text: Some(map_snippet(&fld.name, key.as_ref(), value.as_ref())),
        ..Default::default()
    }
}

/// A message-typed field in an option path: insert the bare name and invite
/// the next `.` segment.
pub fn message_field_item(linked: &LinkedFile, fld: &FieldDescriptor) -> CompletionItem {
    CompletionItem {
        label: fld.name.clone(),
        kind: Some(CompletionItemKind::STRUCT),
        detail: Some(field_type_detail(linked, fld)),
        documentation: documentation(fld),
        deprecated: fld.deprecated.then_some(true),
        insert_text: Some(fld.name.clone()),
        commit_characters: Some(vec![".".into()]),
        ..Default::default()
    }
}

/// A message-typed extension in an option path. `needs_leading_paren` is
/// false when the user already typed the `(`.
pub fn extension_field_item(
    linked: &LinkedFile,
    fld: &FieldDescriptor,
    needs_leading_paren: bool,
) -> CompletionItem {
    let insert = if needs_leading_paren {
        format!("({})", fld.name)
    } else {
        format!("{})", fld.name)
    };
    CompletionItem {
        label: fld.name.clone(),
        kind: Some(CompletionItemKind::MODULE),
        detail: Some(field_type_detail(linked, fld)),
        documentation: documentation(fld),
        deprecated: fld.deprecated.then_some(true),
        insert_text: Some(insert),
        commit_characters: Some(vec![".".into()]),
        ..Default::default()
    }
}

/// A scalar field completing a whole option statement: `name = <value>;`.
pub fn scalar_option_item(linked: &LinkedFile, fld: &FieldDescriptor) -> CompletionItem {
    CompletionItem {
        label: fld.name.clone(),
        kind: Some(CompletionItemKind::VALUE),
        detail: Some(field_type_detail(linked, fld)),
        documentation: documentation(fld),
        deprecated: fld.deprecated.then_some(true),
        insert_text_format: Some(InsertTextFormat::SNIPPET),
        insert_text: Some(format!("{} = ${{0}};", fld.name)),
        ..Default::default()
    }
}

pub fn extension_scalar_option_item(
    linked: &LinkedFile,
    fld: &FieldDescriptor,
    needs_leading_paren: bool,
) -> CompletionItem {
    let insert = if needs_leading_paren {
        format!("({}) = ${{0}};", fld.name)
    } else {
        format!("{}) = ${{0}};", fld.name)
    };
    CompletionItem {
        label: fld.name.clone(),
        kind: Some(CompletionItemKind::VALUE),
        detail: Some(field_type_detail(linked, fld)),
        documentation: documentation(fld),
        deprecated: fld.deprecated.then_some(true),
        insert_text_format: Some(InsertTextFormat::SNIPPET),
        insert_text: Some(insert),
        ..Default::default()
    }
}

/// The declared type shown next to a candidate: `map<K, V>` for maps, the
/// parenthesized qualified name for extensions, the type name otherwise.
pub fn field_type_detail(linked: &LinkedFile, fld: &FieldDescriptor) -> String {
    if let Some(entry) = linked.message_type_of(fld).filter(|m| m.is_map_entry) {
        let key = entry.map_key.as_ref().map(FieldKind::display).unwrap_or("?");
        let value = entry
            .map_value
            .as_ref()
            .map(FieldKind::display)
            .unwrap_or("?");
        return format!("map<{key}, {value}>");
    }
    if fld.is_extension {
        let parent_len = fld.full_name.len().saturating_sub(fld.name.len() + 1);
        return if parent_len == 0 {
            format!("({})", fld.name)
        } else {
            format!("{}.({})", &fld.full_name[..parent_len], fld.name)
        };
    }
    fld.kind.display().to_string()
}

fn documentation(fld: &FieldDescriptor) -> Option<Documentation> {
    fld.leading_comment
        .as_ref()
        .map(|docs| {
            Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value: docs.clone(),
            })
        })
}

fn map_snippet(name: &str, key: Option<&FieldKind>, value: Option<&FieldKind>) -> String {
    let key = key.map(FieldKind::display).unwrap_or("?");
    let value = value.map(FieldKind::display).unwrap_or("?");
    format!("{name} = {{key: ${{1:{key}}}, value: ${{2:{value}}}}};")
}
