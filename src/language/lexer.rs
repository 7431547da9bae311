use crate::language::{
    span::Span,
    token::{Comment, Token, TokenKind},
};

#[derive(Debug)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

/// Tokens plus the comments that were stripped between them. Comments are
/// kept out of the token stream but preserved so the parser can attach
/// leading documentation to declarations.
#[derive(Debug)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub comments: Vec<Comment>,
}

pub fn lex(source: &str) -> Result<Lexed, Vec<LexError>> {
    let lexer = Lexer::new(source);
    lexer.run()
}

struct Lexer<'a> {
    src: &'a str,
    chars: std::str::Chars<'a>,
    current: Option<char>,
    offset: usize,
    tokens: Vec<Token>,
    comments: Vec<Comment>,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        let mut chars = src.chars();
        let current = chars.next();
        Self {
            src,
            chars,
            current,
            offset: 0,
            tokens: Vec::new(),
            comments: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Lexed, Vec<LexError>> {
        while let Some(ch) = self.current {
            match ch {
                '/' if self.peek() == Some('/') => self.eat_line_comment(),
                '/' if self.peek() == Some('*') => self.eat_block_comment(),
                ch if ch.is_whitespace() => {
                    self.bump();
                }
                ch if ch.is_ascii_alphabetic() || ch == '_' => self.lex_identifier(),
                ch if ch.is_ascii_digit() => self.lex_number(),
                '"' | '\'' => self.lex_string(),
                _ => self.lex_symbol(),
            }
        }
        self.push_token(TokenKind::Eof, self.offset, self.offset);

        if self.errors.is_empty() {
            Ok(Lexed {
                tokens: self.tokens,
                comments: self.comments,
            })
        } else {
            Err(self.errors)
        }
    }

    fn bump(&mut self) -> Option<char> {
        if let Some(ch) = self.current {
            self.offset += ch.len_utf8();
        }
        self.current = self.chars.next();
        self.current
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn push_token(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, end),
        });
    }

    fn error(&mut self, start: usize, end: usize, message: impl Into<String>) {
        self.errors.push(LexError {
            message: message.into(),
            span: Span::new(start, end),
        });
    }

    fn eat_line_comment(&mut self) {
        let start = self.offset;
        self.bump();
        self.bump();
        let text_start = self.offset;
        while let Some(ch) = self.current {
            if ch == '\n' {
                break;
            }
            self.bump();
        }
        self.comments.push(Comment {
            text: self.src[text_start..self.offset].trim().to_string(),
            span: Span::new(start, self.offset),
        });
    }

    fn eat_block_comment(&mut self) {
        let start = self.offset;
        self.bump();
        self.bump();
        let text_start = self.offset;
        let mut text_end = self.offset;
        loop {
            match self.current {
                Some('*') if self.peek() == Some('/') => {
                    text_end = self.offset;
                    self.bump();
                    self.bump();
                    break;
                }
                Some(_) => {
                    self.bump();
                }
                None => {
                    self.error(start, self.offset, "unterminated block comment");
                    text_end = self.offset;
                    break;
                }
            }
        }
        self.comments.push(Comment {
            text: self.src[text_start..text_end].trim().to_string(),
            span: Span::new(start, self.offset),
        });
    }

    fn lex_identifier(&mut self) {
        let start = self.offset;
        while let Some(ch) = self.current {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let text = self.src[start..self.offset].to_string();
        self.push_token(TokenKind::Identifier(text), start, self.offset);
    }

    fn lex_number(&mut self) {
        let start = self.offset;
        let mut is_float = false;
        while let Some(ch) = self.current {
            if ch.is_ascii_digit() {
                self.bump();
            } else if ch == '.' && self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                is_float = true;
                self.bump();
            } else {
                break;
            }
        }
        let text = &self.src[start..self.offset];
        if is_float {
            match text.parse::<f64>() {
                Ok(value) => self.push_token(TokenKind::Float(value), start, self.offset),
                Err(_) => self.error(start, self.offset, "invalid float literal"),
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => self.push_token(TokenKind::Integer(value), start, self.offset),
                Err(_) => self.error(start, self.offset, "integer literal out of range"),
            }
        }
    }

    fn lex_string(&mut self) {
        let start = self.offset;
        let quote = self.current.unwrap_or('"');
        self.bump();
        let mut value = String::new();
        loop {
            match self.current {
                Some(ch) if ch == quote => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    match self.current {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some(ch) => value.push(ch),
                        None => {}
                    }
                    self.bump();
                }
                Some('\n') | None => {
                    self.error(start, self.offset, "unterminated string literal");
                    break;
                }
                Some(ch) => {
                    value.push(ch);
                    self.bump();
                }
            }
        }
        self.push_token(TokenKind::String(value), start, self.offset);
    }

    fn lex_symbol(&mut self) {
        let start = self.offset;
        let ch = self.current.unwrap_or('\0');
        self.bump();
        let kind = match ch {
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '=' => TokenKind::Eq,
            ';' => TokenKind::Semi,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '-' => TokenKind::Minus,
            '/' => TokenKind::Slash,
            _ => {
                self.error(start, self.offset, format!("unexpected character '{ch}'"));
                return;
            }
        };
        self.push_token(kind, start, self.offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_identifiers_and_punctuation() {
        let lexed = lex("message Foo { int32 id = 1; }").expect("lex");
        let kinds: Vec<_> = lexed.tokens.iter().map(|t| t.kind.clone()).collect();
        assert!(matches!(kinds[0], TokenKind::Identifier(ref s) if s == "message"));
        assert!(matches!(kinds[2], TokenKind::LBrace));
        assert!(kinds.contains(&TokenKind::Integer(1)));
        assert!(matches!(kinds.last(), Some(TokenKind::Eof)));
    }

    #[test]
    fn captures_comment_text_with_spans() {
        let source = "// leading docs\nmessage Foo {}";
        let lexed = lex(source).expect("lex");
        assert_eq!(lexed.comments.len(), 1);
        assert_eq!(lexed.comments[0].text, "leading docs");
        assert_eq!(lexed.comments[0].span.start, 0);
    }

    #[test]
    fn reports_unterminated_string() {
        let errors = lex("option foo = \"oops").expect_err("should fail");
        assert!(errors[0].message.contains("unterminated string"));
    }
}
