use crate::language::span::Span;

/// A parsed source file. The tree tolerates malformed input: whatever the
/// parser recovered is present, and missing pieces simply are not.
#[derive(Clone, Debug, Default)]
pub struct File {
    pub syntax: Option<String>,
    pub package: Option<String>,
    pub imports: Vec<Import>,
    pub options: Vec<OptionNode>,
    pub messages: Vec<Message>,
    pub enums: Vec<EnumNode>,
    pub extends: Vec<Extend>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct Import {
    pub path: String,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct Message {
    pub name: String,
    pub name_span: Span,
    pub fields: Vec<Field>,
    pub options: Vec<OptionNode>,
    pub nested: Vec<Message>,
    pub enums: Vec<EnumNode>,
    pub extends: Vec<Extend>,
    pub leading_comment: Option<String>,
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldLabel {
    None,
    Optional,
    Required,
    Repeated,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldType {
    /// A scalar or (possibly dotted) message/enum type name; the linker
    /// decides which it is.
    Named(String),
    Map { key: String, value: String },
}

#[derive(Clone, Debug)]
pub struct Field {
    pub label: FieldLabel,
    pub ty: FieldType,
    pub name: String,
    pub name_span: Span,
    pub number: i64,
    pub options: Vec<OptionNode>,
    pub leading_comment: Option<String>,
    pub span: Span,
}

/// `extend Target { ... }`; every field inside is an extension of `extendee`.
#[derive(Clone, Debug)]
pub struct Extend {
    pub extendee: String,
    pub fields: Vec<Field>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct EnumNode {
    pub name: String,
    pub values: Vec<EnumValue>,
    pub leading_comment: Option<String>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct EnumValue {
    pub name: String,
    pub number: i64,
    pub span: Span,
}

/// `option <path> = <value>;` — the path is dot-separated with plain and
/// parenthesized (extension) parts.
#[derive(Clone, Debug)]
pub struct OptionNode {
    pub parts: Vec<OptionPart>,
    pub value: OptionValue,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum OptionPart {
    Plain { name: String, span: Span },
    Extension { name: String, span: Span },
}

#[derive(Clone, Debug)]
pub enum OptionValue {
    Identifier(String, Span),
    Int(i64, Span),
    Float(f64, Span),
    String(String, Span),
    Message(MessageLiteral),
    List(Vec<OptionValue>, Span),
}

impl OptionValue {
    pub fn span(&self) -> Span {
        match self {
            OptionValue::Identifier(_, span)
            | OptionValue::Int(_, span)
            | OptionValue::Float(_, span)
            | OptionValue::String(_, span)
            | OptionValue::List(_, span) => *span,
            OptionValue::Message(lit) => lit.span,
        }
    }
}

/// `{ name: value, ... }` appearing as an option value.
#[derive(Clone, Debug)]
pub struct MessageLiteral {
    pub elements: Vec<LiteralElement>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct LiteralElement {
    pub name: String,
    pub name_span: Span,
    pub value: Option<OptionValue>,
    pub span: Span,
}

/// A borrowed reference to any syntax node that can appear on a scope path.
#[derive(Clone, Copy, Debug)]
pub enum Node<'a> {
    File(&'a File),
    Message(&'a Message),
    Field(&'a Field),
    Extend(&'a Extend),
    Enum(&'a EnumNode),
    Option(&'a OptionNode),
    MessageLiteral(&'a MessageLiteral),
    LiteralElement(&'a LiteralElement),
}

impl<'a> Node<'a> {
    pub fn span(&self) -> Span {
        match self {
            Node::File(n) => n.span,
            Node::Message(n) => n.span,
            Node::Field(n) => n.span,
            Node::Extend(n) => n.span,
            Node::Enum(n) => n.span,
            Node::Option(n) => n.span,
            Node::MessageLiteral(n) => n.span,
            Node::LiteralElement(n) => n.span,
        }
    }
}
