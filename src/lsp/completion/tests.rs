use super::*;
use crate::language::parser::parse;
use std::sync::Arc;
use tower_lsp_server::lsp_types::CompletionTextEdit;

const BASE: &str = r#"package demo;

extend google.protobuf.MessageOptions {
  optional Settings opts = 50001;
  optional string owner = 50002;
}

message Settings {
  string name = 1;
  repeated int64 ids = 2;
  map<string, string> labels = 3;
  Settings child = 4;
}
"#;

/// Strip the `@@` cursor marker out of `source` and return the text plus
/// the cursor position the marker stood at.
fn cursor(source: &str) -> (String, Position) {
    let marker = source.find("@@").expect("cursor marker");
    let text = source.replace("@@", "");
    let position = text::offset_to_position(&text, marker);
    (text, position)
}

fn well_formed_snapshot(text: &str) -> Snapshot {
    let parse = Arc::new(parse(text));
    assert!(parse.is_well_formed(), "errors: {:?}", parse.errors);
    let linked = Some(Arc::new(LinkedFile::link(parse.clone())));
    Snapshot {
        text: Arc::from(text),
        parse,
        linked,
        latest_well_formed: true,
    }
}

/// A snapshot whose latest edit is malformed, with the linked model still
/// holding the previous clean revision.
fn stale_snapshot(linked_text: &str, live_text: &str) -> Snapshot {
    let linked_parse = Arc::new(parse(linked_text));
    assert!(
        linked_parse.is_well_formed(),
        "errors: {:?}",
        linked_parse.errors
    );
    let live = Arc::new(parse(live_text));
    assert!(!live.is_well_formed(), "live revision should be malformed");
    Snapshot {
        text: Arc::from(live_text),
        parse: live,
        linked: Some(Arc::new(LinkedFile::link(linked_parse))),
        latest_well_formed: false,
    }
}

fn inserted_text(item: &CompletionItem) -> &str {
    match &item.text_edit {
        Some(CompletionTextEdit::Edit(edit)) => &edit.new_text,
        _ => item.insert_text.as_deref().unwrap_or(&item.label),
    }
}

fn labels_of(items: &[CompletionItem]) -> Vec<&str> {
    items.iter().map(|item| item.label.as_str()).collect()
}

fn item<'a>(items: &'a [CompletionItem], label: &str) -> &'a CompletionItem {
    items
        .iter()
        .find(|item| item.label == label)
        .unwrap_or_else(|| panic!("no item labelled {label:?}"))
}

// ---- scope location ----

#[test]
fn scope_path_descends_to_the_literal_under_the_cursor() {
    let (text, position) = cursor(&format!(
        "{BASE}
message Widget {{
  option (opts) = {{
    name: \"x\"
    @@
  }};
}}
"
    ));
    let result = parse(&text);
    assert!(result.is_well_formed(), "errors: {:?}", result.errors);
    let offset = text::position_offset(&text, position).expect("offset");
    let path = narrowest_enclosing_scope(&result.file, offset).expect("path");
    assert!(matches!(path.first(), Some(Node::File(_))));
    assert!(matches!(path.last(), Some(Node::MessageLiteral(_))));
}

#[test]
fn offset_at_a_declaration_end_still_counts_as_inside_it() {
    let result = parse("message A {\n  string a = 1;\n  string b = 2;\n}\n");
    assert!(result.is_well_formed(), "errors: {:?}", result.errors);
    let end = result.file.messages[0].fields[0].span.end;
    let path = narrowest_enclosing_scope(&result.file, end).expect("path");
    assert!(matches!(path.last(), Some(Node::Field(field)) if field.name == "a"));
}

#[test]
fn offset_between_declarations_stops_at_the_message() {
    let result = parse("message A {\n  string a = 1;\n  string b = 2;\n}\n");
    let between = result.file.messages[0].fields[0].span.end + 1;
    let path = narrowest_enclosing_scope(&result.file, between).expect("path");
    assert!(matches!(path.last(), Some(Node::Message(message)) if message.name == "A"));
}

// ---- message literal field completion ----

#[test]
fn literal_completion_offers_absent_fields_only() {
    let (text, position) = cursor(&format!(
        "{BASE}
message Widget {{
  option (opts) = {{
    name: \"x\"
    @@
  }};
}}
"
    ));
    let snapshot = well_formed_snapshot(&text);
    let items = completion_items(&snapshot, position).expect("items");
    let labels = labels_of(&items);
    assert!(!labels.contains(&"name"), "present singular field offered");
    assert_eq!(labels, vec!["ids", "labels", "child"]);
}

#[test]
fn repeated_fields_stay_offered_when_already_present() {
    let (text, position) = cursor(&format!(
        "{BASE}
message Widget {{
  option (opts) = {{
    name: \"x\"
    ids: [1]
    @@
  }};
}}
"
    ));
    let snapshot = well_formed_snapshot(&text);
    let items = completion_items(&snapshot, position).expect("items");
    let labels = labels_of(&items);
    assert!(labels.contains(&"ids"));
    assert!(!labels.contains(&"name"));
}

#[test]
fn literal_rendering_matches_the_field_shape() {
    let (text, position) = cursor(&format!(
        "{BASE}
message Widget {{
  option (opts) = {{
    @@
  }};
}}
"
    ));
    let snapshot = well_formed_snapshot(&text);
    let items = completion_items(&snapshot, position).expect("items");

    let ids = item(&items, "ids");
    assert_eq!(inserted_text(ids), "ids: [\n  ${0}\n]");
    assert_eq!(ids.detail.as_deref(), Some("repeated int64"));

    let labels = item(&items, "labels");
    assert_eq!(
        inserted_text(labels),
        "labels = {key: ${1:string}, value: ${2:string}};"
    );
    assert_eq!(labels.detail.as_deref(), Some("map<string, string>"));

    let child = item(&items, "child");
    assert_eq!(inserted_text(child), "child: {\n  ${0}\n}");

    let name = item(&items, "name");
    assert_eq!(inserted_text(name), "name: ");
    assert!(name.insert_text_format.is_none());
}

#[test]
fn nested_literals_resolve_through_their_elements() {
    let (text, position) = cursor(&format!(
        "{BASE}
message Widget {{
  option (opts) = {{
    child: {{
      @@
    }}
  }};
}}
"
    ));
    let snapshot = well_formed_snapshot(&text);
    let items = completion_items(&snapshot, position).expect("items");
    let labels = labels_of(&items);
    assert_eq!(labels, vec!["name", "ids", "labels", "child"]);
}

// ---- stale-state handling ----

#[test]
fn malformed_edit_falls_back_to_the_last_linked_revision() {
    let (linked_text, position) = cursor(&format!(
        "{BASE}
message Widget {{
  option (opts) = {{
    name: \"x\"
    @@
  }};
}}
"
    ));
    // The latest keystroke opened a declaration that never closes. The
    // literal itself is untouched, so completion still answers from the
    // previous clean revision.
    let live_text = format!("{linked_text}message Broken {{\n");
    let snapshot = stale_snapshot(&linked_text, &live_text);
    let items = completion_items(&snapshot, position).expect("items");
    assert_eq!(labels_of(&items), vec!["ids", "labels", "child"]);
}

#[test]
fn malformed_document_with_no_linked_revision_completes_nothing() {
    let (text, position) = cursor(
        "message Widget {\n  option (opts) = {\n    @@\n  };\nmessage Broken {\n",
    );
    let parsed = Arc::new(parse(&text));
    assert!(!parsed.is_well_formed());
    let snapshot = Snapshot {
        text: Arc::from(text.as_str()),
        parse: parsed,
        linked: None,
        latest_well_formed: false,
    };
    let items = completion_items(&snapshot, position).expect("items");
    assert!(items.is_empty());
}

#[test]
fn position_outside_the_document_is_an_error() {
    let snapshot = well_formed_snapshot(BASE);
    let err = completion_items(&snapshot, Position::new(999, 0)).unwrap_err();
    assert!(matches!(err, CompletionError::InvalidPosition { line: 999, .. }));
}

// ---- option statement detection and path segmentation ----

#[test]
fn option_statement_detection_requires_the_keyword() {
    assert_eq!(option_statement_partial("  option (ow"), Some("(ow"));
    assert_eq!(option_statement_partial("  option dep"), Some("dep"));
    assert_eq!(option_statement_partial("option "), Some(""));
    assert_eq!(option_statement_partial("  optional str"), None);
    assert_eq!(option_statement_partial("  my_option x"), None);
    assert_eq!(option_statement_partial("option deprecated = true; "), None);
}

#[test]
fn segmentation_keeps_dots_inside_parenthesized_names() {
    let segments = split_option_path("(foo.Bar).baz");
    assert_eq!(
        segments,
        vec![
            OptionPathSegment {
                name: "foo.Bar".into(),
                is_extension: true,
                closed: true,
            },
            OptionPathSegment {
                name: "baz".into(),
                is_extension: false,
                closed: false,
            },
        ]
    );
}

#[test]
fn segmentation_tracks_an_unclosed_extension() {
    let segments = split_option_path("(foo.Ba");
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].name, "foo.Ba");
    assert!(segments[0].is_extension);
    assert!(!segments[0].closed);
}

#[test]
fn a_trailing_dot_yields_an_empty_final_segment() {
    let segments = split_option_path("(opts).");
    assert_eq!(segments.len(), 2);
    assert!(segments[0].closed);
    assert_eq!(segments[1].name, "");
    assert!(!segments[1].is_extension);
}

// ---- option name completion ----

#[test]
fn partial_extension_completes_with_its_closing_paren() {
    let (live_text, position) = cursor(&format!(
        "{BASE}
message Widget {{
  option (ow@@
}}
"
    ));
    let linked_text = format!("{BASE}\nmessage Widget {{\n}}\n");
    let snapshot = stale_snapshot(&linked_text, &live_text);
    let items = completion_items(&snapshot, position).expect("items");
    assert_eq!(labels_of(&items), vec!["owner"]);
    assert_eq!(items[0].insert_text.as_deref(), Some("owner) = ${0};"));
}

#[test]
fn builtin_option_names_complete_by_prefix() {
    let (live_text, position) = cursor(&format!(
        "{BASE}
message Widget {{
  option dep@@
}}
"
    ));
    let linked_text = format!("{BASE}\nmessage Widget {{\n}}\n");
    let snapshot = stale_snapshot(&linked_text, &live_text);
    let items = completion_items(&snapshot, position).expect("items");
    assert_eq!(labels_of(&items), vec!["deprecated"]);
    assert_eq!(items[0].insert_text.as_deref(), Some("deprecated = ${0};"));
}

fn message_scope_path(result: &crate::language::parser::ParseResult) -> Vec<Node<'_>> {
    let message = &result.file.messages[0];
    let inside = message.span.end - 1;
    narrowest_enclosing_scope(&result.file, inside).expect("scope path")
}

#[test]
fn a_closed_extension_segment_waits_for_its_dot() {
    let linked_text = format!("{BASE}\nmessage Widget {{\n}}\n");
    let parsed = Arc::new(parse(&linked_text));
    let linked = LinkedFile::link(parsed.clone());
    let path = message_scope_path(linked.parse());
    assert!(complete_option_names(&path, "(opts)", &linked).is_empty());
}

#[test]
fn extension_paths_complete_fields_of_the_resolved_message() {
    let linked_text = format!("{BASE}\nmessage Widget {{\n}}\n");
    let parsed = Arc::new(parse(&linked_text));
    let linked = LinkedFile::link(parsed.clone());
    let path = message_scope_path(linked.parse());

    let all = complete_option_names(&path, "(opts).", &linked);
    assert_eq!(labels_of(&all), vec!["name", "ids", "labels", "child"]);
    assert_eq!(
        item(&all, "labels").insert_text.as_deref(),
        Some("labels = {key: ${1:string}, value: ${2:string}};")
    );
    assert_eq!(
        item(&all, "child").commit_characters,
        Some(vec![".".to_string()])
    );

    let filtered = complete_option_names(&path, "(opts).na", &linked);
    assert_eq!(labels_of(&filtered), vec!["name"]);
}

#[test]
fn full_path_resolution_matches_stepwise_resolution() {
    let linked_text = format!("{BASE}\nmessage Widget {{\n}}\n");
    let parsed = Arc::new(parse(&linked_text));
    let linked = LinkedFile::link(parsed);
    let path = message_scope_path(linked.parse());

    // `child` is Settings-typed, so the path hops demo.opts -> Settings ->
    // Settings before the last segment filters.
    let full = complete_option_names(&path, "(opts).child.na", &linked);
    assert_eq!(labels_of(&full), vec!["name"]);

    let segments = split_option_path("(opts).child.na");
    let (last, init) = segments.split_last().expect("segments");
    let context = options::resolve_segments(&linked, init).expect("context");
    assert_eq!(context.full_name, "demo.Settings");
    let stepwise: Vec<&str> = context
        .fields
        .iter()
        .filter(|fld| fld.name.contains(&last.name))
        .map(|fld| fld.name.as_str())
        .collect();
    assert_eq!(labels_of(&full), stepwise);
}

#[test]
fn scalar_segments_with_a_trailing_path_resolve_to_nothing() {
    let linked_text = format!("{BASE}\nmessage Widget {{\n}}\n");
    let parsed = Arc::new(parse(&linked_text));
    let linked = LinkedFile::link(parsed);
    let path = message_scope_path(linked.parse());

    // `name` is a string field; anything past it is a shape miss, not an
    // error.
    assert!(complete_option_names(&path, "(opts).name.", &linked).is_empty());
    let segments = split_option_path("(opts).name.");
    let (_, init) = segments.split_last().expect("segments");
    assert!(options::resolve_segments(&linked, init).is_none());

    // Same for a scalar extension at the head of the path.
    assert!(complete_option_names(&path, "(owner).", &linked).is_empty());
}

#[test]
fn option_completion_outside_a_message_scope_is_empty() {
    let linked_text = format!("{BASE}\nmessage Widget {{\n}}\n");
    let parsed = Arc::new(parse(&linked_text));
    let linked = LinkedFile::link(parsed.clone());
    // A path ending at an extend block offers nothing yet.
    let extend = &linked.parse().file.extends[0];
    let inside = extend.span.end - 1;
    let path = narrowest_enclosing_scope(&linked.parse().file, inside).expect("path");
    assert!(!matches!(path.last(), Some(Node::Message(_))));
    assert!(complete_option_names(&path, "ow", &linked).is_empty());
}

// ---- item details ----

#[test]
fn extension_details_show_the_qualified_parenthesized_name() {
    let parsed = Arc::new(parse(BASE));
    let linked = LinkedFile::link(parsed);
    let owner = linked
        .find_extension_by_name("demo.owner")
        .expect("extension");
    assert_eq!(field_type_detail(&linked, owner), "demo.(owner)");
}

#[test]
fn deprecated_fields_carry_the_deprecation_flag() {
    let source = r#"package demo;

extend google.protobuf.MessageOptions {
  optional Legacy meta = 50001;
}

message Legacy {
  string old = 1 [deprecated = true];
}
"#;
    let (text, position) = cursor(&format!(
        "{source}
message Widget {{
  option (meta) = {{
    @@
  }};
}}
"
    ));
    let snapshot = well_formed_snapshot(&text);
    let items = completion_items(&snapshot, position).expect("items");
    assert_eq!(item(&items, "old").deprecated, Some(true));
}
