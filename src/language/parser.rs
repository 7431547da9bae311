use crate::language::{
    ast::*,
    errors::SyntaxError,
    lexer::{lex, Lexed},
    span::Span,
    token::{Comment, Token, TokenKind},
};
use std::sync::Arc;

/// Output of one parse. The tree and the source always belong to the same
/// text revision; `errors` being empty is what "well-formed" means to the
/// rest of the server.
#[derive(Clone, Debug)]
pub struct ParseResult {
    pub source: Arc<str>,
    pub file: File,
    pub errors: Vec<SyntaxError>,
}

impl ParseResult {
    pub fn is_well_formed(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parsing never fails outright: lex/parse errors are recorded and the tree
/// keeps every declaration that could be recovered, which is what an editor
/// mid-keystroke needs.
pub fn parse(source: &str) -> ParseResult {
    let lexed = match lex(source) {
        Ok(lexed) => lexed,
        Err(errors) => {
            return ParseResult {
                source: Arc::from(source),
                file: File {
                    span: Span::new(0, source.len()),
                    ..File::default()
                },
                errors: errors
                    .into_iter()
                    .map(|err| SyntaxError::new(err.message, err.span))
                    .collect(),
            }
        }
    };
    Parser::new(source, lexed).parse()
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    comments: Vec<Comment>,
    pos: usize,
    errors: Vec<SyntaxError>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, lexed: Lexed) -> Self {
        Self {
            source,
            tokens: lexed.tokens,
            comments: lexed.comments,
            pos: 0,
            errors: Vec::new(),
        }
    }

    fn parse(mut self) -> ParseResult {
        let mut file = File {
            span: Span::new(0, self.source.len()),
            ..File::default()
        };

        while !self.is_eof() {
            if self.eat(TokenKind::Semi) {
                continue;
            }
            let result = match self.keyword() {
                Some("syntax") => self.parse_syntax(&mut file),
                Some("package") => self.parse_package(&mut file),
                Some("import") => self.parse_import(&mut file),
                Some("option") => match self.parse_option_statement() {
                    Ok(option) => {
                        file.options.push(option);
                        Ok(())
                    }
                    Err(err) => Err(err),
                },
                Some("message") => match self.parse_message() {
                    Ok(message) => {
                        file.messages.push(message);
                        Ok(())
                    }
                    Err(err) => Err(err),
                },
                Some("enum") => match self.parse_enum() {
                    Ok(node) => {
                        file.enums.push(node);
                        Ok(())
                    }
                    Err(err) => Err(err),
                },
                Some("extend") => match self.parse_extend() {
                    Ok(node) => {
                        file.extends.push(node);
                        Ok(())
                    }
                    Err(err) => Err(err),
                },
                _ => {
                    let span = self.current_span();
                    Err(SyntaxError::new(
                        format!("unexpected {}", self.current_kind().describe()),
                        span,
                    )
                    .with_help("expected a top-level declaration"))
                }
            };
            if let Err(err) = result {
                self.report(err);
                self.synchronize();
            }
        }

        ParseResult {
            source: Arc::from(self.source),
            file,
            errors: self.errors,
        }
    }

    // ---- token plumbing ----

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    fn is_eof(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn keyword(&self) -> Option<&str> {
        match self.current_kind() {
            TokenKind::Identifier(name) => Some(name.as_str()),
            _ => None,
        }
    }

    fn bump(&mut self) -> Token {
        let token = self.current().clone();
        if !self.is_eof() {
            self.pos += 1;
        }
        token
    }

    fn at(&self, kind: TokenKind) -> bool {
        *self.current_kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, SyntaxError> {
        if self.at(kind.clone()) {
            Ok(self.bump())
        } else {
            Err(SyntaxError::new(
                format!(
                    "expected {}, found {}",
                    kind.describe(),
                    self.current_kind().describe()
                ),
                self.current_span(),
            ))
        }
    }

    fn expect_identifier(&mut self) -> Result<(String, Span), SyntaxError> {
        match self.current_kind() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let span = self.current_span();
                self.bump();
                Ok((name, span))
            }
            other => Err(SyntaxError::new(
                format!("expected identifier, found {}", other.describe()),
                self.current_span(),
            )),
        }
    }

    fn expect_integer(&mut self) -> Result<i64, SyntaxError> {
        let negative = self.eat(TokenKind::Minus);
        match *self.current_kind() {
            TokenKind::Integer(value) => {
                self.bump();
                Ok(if negative { -value } else { value })
            }
            ref other => Err(SyntaxError::new(
                format!("expected integer literal, found {}", other.describe()),
                self.current_span(),
            )),
        }
    }

    fn report(&mut self, err: SyntaxError) {
        self.errors.push(err);
    }

    /// Skip forward to just past the next `;`, or stop before a `}`/EOF so
    /// the enclosing body loop can close normally.
    fn synchronize(&mut self) {
        while !self.is_eof() {
            if self.eat(TokenKind::Semi) {
                return;
            }
            if self.at(TokenKind::RBrace) {
                return;
            }
            self.bump();
        }
    }

    /// Comment lines immediately above `start` (no blank line in between),
    /// joined in source order.
    fn leading_comment(&self, start: usize) -> Option<String> {
        let mut parts: Vec<&str> = Vec::new();
        let mut boundary = start;
        for comment in self.comments.iter().rev() {
            if comment.span.end > boundary {
                continue;
            }
            let between = &self.source[comment.span.end..boundary];
            if !between.chars().all(char::is_whitespace)
                || between.chars().filter(|&c| c == '\n').count() > 1
            {
                break;
            }
            parts.push(comment.text.as_str());
            boundary = comment.span.start;
        }
        if parts.is_empty() {
            None
        } else {
            parts.reverse();
            Some(parts.join("\n"))
        }
    }

    // ---- declarations ----

    fn parse_syntax(&mut self, file: &mut File) -> Result<(), SyntaxError> {
        self.bump();
        self.expect(TokenKind::Eq)?;
        match self.current_kind().clone() {
            TokenKind::String(value) => {
                self.bump();
                file.syntax = Some(value);
            }
            other => {
                return Err(SyntaxError::new(
                    format!("expected syntax string, found {}", other.describe()),
                    self.current_span(),
                ))
            }
        }
        self.expect(TokenKind::Semi)?;
        Ok(())
    }

    fn parse_package(&mut self, file: &mut File) -> Result<(), SyntaxError> {
        self.bump();
        let name = self.parse_dotted_name()?;
        file.package = Some(name);
        self.expect(TokenKind::Semi)?;
        Ok(())
    }

    fn parse_import(&mut self, file: &mut File) -> Result<(), SyntaxError> {
        let start = self.current_span();
        self.bump();
        if matches!(self.keyword(), Some("public") | Some("weak")) {
            self.bump();
        }
        match self.current_kind().clone() {
            TokenKind::String(path) => {
                self.bump();
                let span = start.merge(self.current_span());
                file.imports.push(Import { path, span });
            }
            other => {
                return Err(SyntaxError::new(
                    format!("expected import path string, found {}", other.describe()),
                    self.current_span(),
                ))
            }
        }
        self.expect(TokenKind::Semi)?;
        Ok(())
    }

    fn parse_dotted_name(&mut self) -> Result<String, SyntaxError> {
        self.eat(TokenKind::Dot);
        let (mut name, _) = self.expect_identifier()?;
        while self.eat(TokenKind::Dot) {
            let (part, _) = self.expect_identifier()?;
            name.push('.');
            name.push_str(&part);
        }
        Ok(name)
    }

    fn parse_message(&mut self) -> Result<Message, SyntaxError> {
        let start = self.current_span();
        let leading_comment = self.leading_comment(start.start);
        self.bump();
        let (name, name_span) = self.expect_identifier()?;
        let mut message = Message {
            name,
            name_span,
            fields: Vec::new(),
            options: Vec::new(),
            nested: Vec::new(),
            enums: Vec::new(),
            extends: Vec::new(),
            leading_comment,
            span: start,
        };
        self.expect(TokenKind::LBrace)?;
        self.parse_message_body(&mut message);
        message.span = Span::new(start.start, self.prev_end());
        Ok(message)
    }

    fn parse_message_body(&mut self, message: &mut Message) {
        loop {
            if self.eat(TokenKind::RBrace) {
                return;
            }
            if self.is_eof() {
                // Unclosed body: keep everything parsed so far. The file is
                // not well-formed, but the tree is still searchable.
                self.report(SyntaxError::new(
                    format!("message '{}' is missing a closing '}}'", message.name),
                    self.current_span(),
                ));
                return;
            }
            if self.eat(TokenKind::Semi) {
                continue;
            }
            let result = match self.keyword() {
                Some("option") => self.parse_option_statement().map(|option| {
                    message.options.push(option);
                }),
                Some("message") => self.parse_message().map(|nested| {
                    message.nested.push(nested);
                }),
                Some("enum") => self.parse_enum().map(|node| {
                    message.enums.push(node);
                }),
                Some("extend") => self.parse_extend().map(|node| {
                    message.extends.push(node);
                }),
                Some("oneof") => self.parse_oneof(message),
                Some("reserved") => self.skip_statement(),
                Some(_) => self.parse_field().map(|field| {
                    message.fields.push(field);
                }),
                None => Err(SyntaxError::new(
                    format!("unexpected {}", self.current_kind().describe()),
                    self.current_span(),
                )),
            };
            if let Err(err) = result {
                self.report(err);
                self.synchronize();
            }
        }
    }

    /// Oneof members are plain fields at completion granularity; flatten
    /// them into the containing message.
    fn parse_oneof(&mut self, message: &mut Message) -> Result<(), SyntaxError> {
        self.bump();
        self.expect_identifier()?;
        self.expect(TokenKind::LBrace)?;
        loop {
            if self.eat(TokenKind::RBrace) {
                return Ok(());
            }
            if self.is_eof() {
                return Err(SyntaxError::new(
                    "oneof is missing a closing '}'",
                    self.current_span(),
                ));
            }
            if self.eat(TokenKind::Semi) {
                continue;
            }
            match self.parse_field() {
                Ok(field) => message.fields.push(field),
                Err(err) => {
                    self.report(err);
                    self.synchronize();
                }
            }
        }
    }

    fn skip_statement(&mut self) -> Result<(), SyntaxError> {
        while !self.is_eof() && !self.at(TokenKind::RBrace) {
            if self.eat(TokenKind::Semi) {
                return Ok(());
            }
            self.bump();
        }
        Ok(())
    }

    fn parse_field(&mut self) -> Result<Field, SyntaxError> {
        let start = self.current_span();
        let leading_comment = self.leading_comment(start.start);
        let label = match self.keyword() {
            Some("optional") => {
                self.bump();
                FieldLabel::Optional
            }
            Some("required") => {
                self.bump();
                FieldLabel::Required
            }
            Some("repeated") => {
                self.bump();
                FieldLabel::Repeated
            }
            _ => FieldLabel::None,
        };
        let next_is_angle = self
            .tokens
            .get(self.pos + 1)
            .map(|t| t.kind == TokenKind::Lt)
            .unwrap_or(false);
        let ty = if self.keyword() == Some("map") && next_is_angle {
            self.bump();
            self.expect(TokenKind::Lt)?;
            let (key, _) = self.expect_identifier()?;
            self.expect(TokenKind::Comma)?;
            let value = self.parse_dotted_name()?;
            self.expect(TokenKind::Gt)?;
            FieldType::Map { key, value }
        } else {
            FieldType::Named(self.parse_dotted_name()?)
        };
        let (name, name_span) = self.expect_identifier()?;
        self.expect(TokenKind::Eq)?;
        let number = self.expect_integer()?;
        let mut options = Vec::new();
        if self.eat(TokenKind::LBracket) {
            loop {
                options.push(self.parse_option_body()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBracket)?;
        }
        self.expect(TokenKind::Semi)?;
        Ok(Field {
            label,
            ty,
            name,
            name_span,
            number,
            options,
            leading_comment,
            span: Span::new(start.start, self.prev_end()),
        })
    }

    fn parse_extend(&mut self) -> Result<Extend, SyntaxError> {
        let start = self.current_span();
        self.bump();
        let extendee = self.parse_dotted_name()?;
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        loop {
            if self.eat(TokenKind::RBrace) {
                break;
            }
            if self.is_eof() {
                self.report(SyntaxError::new(
                    format!("extend '{extendee}' is missing a closing '}}'"),
                    self.current_span(),
                ));
                break;
            }
            if self.eat(TokenKind::Semi) {
                continue;
            }
            match self.parse_field() {
                Ok(field) => fields.push(field),
                Err(err) => {
                    self.report(err);
                    self.synchronize();
                }
            }
        }
        Ok(Extend {
            extendee,
            fields,
            span: Span::new(start.start, self.prev_end()),
        })
    }

    fn parse_enum(&mut self) -> Result<EnumNode, SyntaxError> {
        let start = self.current_span();
        let leading_comment = self.leading_comment(start.start);
        self.bump();
        let (name, _) = self.expect_identifier()?;
        self.expect(TokenKind::LBrace)?;
        let mut values = Vec::new();
        loop {
            if self.eat(TokenKind::RBrace) {
                break;
            }
            if self.is_eof() {
                self.report(SyntaxError::new(
                    format!("enum '{name}' is missing a closing '}}'"),
                    self.current_span(),
                ));
                break;
            }
            if self.eat(TokenKind::Semi) {
                continue;
            }
            if self.keyword() == Some("option") {
                if let Err(err) = self.parse_option_statement() {
                    self.report(err);
                    self.synchronize();
                }
                continue;
            }
            let value_start = self.current_span();
            match self.parse_enum_value(value_start) {
                Ok(value) => values.push(value),
                Err(err) => {
                    self.report(err);
                    self.synchronize();
                }
            }
        }
        Ok(EnumNode {
            name,
            values,
            leading_comment,
            span: Span::new(start.start, self.prev_end()),
        })
    }

    fn parse_enum_value(&mut self, start: Span) -> Result<EnumValue, SyntaxError> {
        let (name, _) = self.expect_identifier()?;
        self.expect(TokenKind::Eq)?;
        let number = self.expect_integer()?;
        self.expect(TokenKind::Semi)?;
        Ok(EnumValue {
            name,
            number,
            span: Span::new(start.start, self.prev_end()),
        })
    }

    // ---- options ----

    fn parse_option_statement(&mut self) -> Result<OptionNode, SyntaxError> {
        self.bump();
        let option = self.parse_option_body()?;
        self.expect(TokenKind::Semi)?;
        Ok(option)
    }

    /// `<path> = <value>` without the leading `option` keyword or trailing
    /// `;`, shared between option statements and `[...]` field options.
    fn parse_option_body(&mut self) -> Result<OptionNode, SyntaxError> {
        let start = self.current_span();
        let mut parts = Vec::new();
        loop {
            if self.at(TokenKind::LParen) {
                let open = self.bump().span;
                let name = self.parse_dotted_name()?;
                let close = self.expect(TokenKind::RParen)?.span;
                parts.push(OptionPart::Extension {
                    name,
                    span: open.merge(close),
                });
            } else {
                let (name, span) = self.expect_identifier()?;
                parts.push(OptionPart::Plain { name, span });
            }
            if !self.eat(TokenKind::Dot) {
                break;
            }
        }
        self.expect(TokenKind::Eq)?;
        let value = self.parse_option_value()?;
        Ok(OptionNode {
            parts,
            value,
            span: Span::new(start.start, self.prev_end()),
        })
    }

    fn parse_option_value(&mut self) -> Result<OptionValue, SyntaxError> {
        let span = self.current_span();
        match self.current_kind().clone() {
            TokenKind::String(value) => {
                self.bump();
                Ok(OptionValue::String(value, span))
            }
            TokenKind::Integer(_) | TokenKind::Minus => {
                let value = self.expect_integer()?;
                Ok(OptionValue::Int(value, Span::new(span.start, self.prev_end())))
            }
            TokenKind::Float(value) => {
                self.bump();
                Ok(OptionValue::Float(value, span))
            }
            TokenKind::Identifier(name) => {
                self.bump();
                Ok(OptionValue::Identifier(name, span))
            }
            TokenKind::LBrace => self.parse_message_literal().map(OptionValue::Message),
            TokenKind::LBracket => {
                self.bump();
                let mut values = Vec::new();
                loop {
                    if self.eat(TokenKind::RBracket) {
                        break;
                    }
                    if self.is_eof() {
                        return Err(SyntaxError::new(
                            "list value is missing a closing ']'",
                            self.current_span(),
                        ));
                    }
                    values.push(self.parse_option_value()?);
                    self.eat(TokenKind::Comma);
                }
                Ok(OptionValue::List(
                    values,
                    Span::new(span.start, self.prev_end()),
                ))
            }
            other => Err(SyntaxError::new(
                format!("expected option value, found {}", other.describe()),
                span,
            )),
        }
    }

    fn parse_message_literal(&mut self) -> Result<MessageLiteral, SyntaxError> {
        let start = self.expect(TokenKind::LBrace)?.span;
        let mut elements = Vec::new();
        loop {
            if self.eat(TokenKind::RBrace) {
                break;
            }
            if self.is_eof() {
                return Err(SyntaxError::new(
                    "message literal is missing a closing '}'",
                    self.current_span(),
                ));
            }
            if self.eat(TokenKind::Comma) || self.eat(TokenKind::Semi) {
                continue;
            }
            let (name, name_span) = self.expect_identifier()?;
            // The colon is optional before a nested literal.
            let value = if self.eat(TokenKind::Colon) {
                Some(self.parse_option_value()?)
            } else if self.at(TokenKind::LBrace) {
                Some(self.parse_option_value()?)
            } else {
                None
            };
            let end = value.as_ref().map(|v| v.span().end).unwrap_or(name_span.end);
            elements.push(LiteralElement {
                name,
                name_span,
                value,
                span: Span::new(name_span.start, end),
            });
        }
        Ok(MessageLiteral {
            elements,
            span: Span::new(start.start, self.prev_end()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_message_with_fields() {
        let result = parse(
            r#"
syntax = "proto3";
package demo;

message Person {
  string name = 1;
  repeated int32 scores = 2;
  map<string, string> labels = 3;
}
"#,
        );
        assert!(result.is_well_formed(), "errors: {:?}", result.errors);
        assert_eq!(result.file.package.as_deref(), Some("demo"));
        let person = &result.file.messages[0];
        assert_eq!(person.name, "Person");
        assert_eq!(person.fields.len(), 3);
        assert_eq!(person.fields[1].label, FieldLabel::Repeated);
        assert_eq!(
            person.fields[2].ty,
            FieldType::Map {
                key: "string".into(),
                value: "string".into()
            }
        );
    }

    #[test]
    fn attaches_leading_comments() {
        let result = parse(
            r#"
message Person {
  // The person's display name.
  // Shown in the UI.
  string name = 1;

  string email = 2;
}
"#,
        );
        let person = &result.file.messages[0];
        assert_eq!(
            person.fields[0].leading_comment.as_deref(),
            Some("The person's display name.\nShown in the UI.")
        );
        assert!(person.fields[1].leading_comment.is_none());
    }

    #[test]
    fn parses_extend_block_and_option_paths() {
        let result = parse(
            r#"
package demo;
extend google.protobuf.MessageOptions {
  optional string owner = 50001;
}
message Tagged {
  option (demo.owner) = "core-team";
}
"#,
        );
        assert!(result.is_well_formed(), "errors: {:?}", result.errors);
        assert_eq!(
            result.file.extends[0].extendee,
            "google.protobuf.MessageOptions"
        );
        let option = &result.file.messages[0].options[0];
        assert!(
            matches!(&option.parts[0], OptionPart::Extension { name, .. } if name == "demo.owner")
        );
    }

    #[test]
    fn parses_message_literal_option_value() {
        let result = parse(
            r#"
message M {
  option (demo.meta) = {
    name: "x"
    nested { flag: true }
  };
}
"#,
        );
        assert!(result.is_well_formed(), "errors: {:?}", result.errors);
        let option = &result.file.messages[0].options[0];
        let OptionValue::Message(lit) = &option.value else {
            panic!("expected message literal value");
        };
        assert_eq!(lit.elements.len(), 2);
        assert_eq!(lit.elements[1].name, "nested");
        assert!(matches!(
            lit.elements[1].value,
            Some(OptionValue::Message(_))
        ));
    }

    #[test]
    fn recovers_declarations_from_malformed_input() {
        let result = parse(
            r#"
message Good {
  string name = 1;
}
message Broken {
  string dangling
"#,
        );
        assert!(!result.is_well_formed());
        assert_eq!(result.file.messages.len(), 2);
        assert_eq!(result.file.messages[0].name, "Good");
        assert_eq!(result.file.messages[0].fields.len(), 1);
    }

    #[test]
    fn flattens_oneof_members_into_message_fields() {
        let result = parse(
            r#"
message Shape {
  oneof kind {
    string label = 1;
    int32 sides = 2;
  }
}
"#,
        );
        assert!(result.is_well_formed(), "errors: {:?}", result.errors);
        let names: Vec<_> = result.file.messages[0]
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["label", "sides"]);
    }
}
