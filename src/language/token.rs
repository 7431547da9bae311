use crate::language::span::Span;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Keywords in the IDL are contextual (`message`, `option`, `map` and the
/// rest are all legal field names), so the lexer only distinguishes
/// identifiers, literals and punctuation; the parser matches keyword text.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Integer(i64),
    Float(f64),
    String(String),

    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Lt,
    Gt,
    Eq,
    Semi,
    Colon,
    Comma,
    Dot,
    Minus,
    Slash,

    Eof,
}

impl TokenKind {
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Identifier(_) => "identifier",
            TokenKind::Integer(_) => "integer literal",
            TokenKind::Float(_) => "float literal",
            TokenKind::String(_) => "string literal",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Lt => "'<'",
            TokenKind::Gt => "'>'",
            TokenKind::Eq => "'='",
            TokenKind::Semi => "';'",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Minus => "'-'",
            TokenKind::Slash => "'/'",
            TokenKind::Eof => "end of file",
        }
    }
}

/// A comment stripped out by the lexer, kept aside so declarations can pick
/// up their leading documentation text.
#[derive(Clone, Debug, PartialEq)]
pub struct Comment {
    pub text: String,
    pub span: Span,
}
