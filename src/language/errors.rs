use crate::language::span::Span;
use miette::SourceSpan;

/// One syntax problem in a proto source file. The parser accumulates these
/// while recovering, so a single edit can surface several; an empty error
/// list is what makes a revision well-formed.
#[derive(Clone, Debug)]
pub struct SyntaxError {
    pub message: String,
    pub span: Span,
    /// Optional hint, e.g. the declaration kind that was expected.
    pub help: Option<String>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// The span in miette's offset+length form, for CLI reports.
    pub fn to_source_span(&self) -> SourceSpan {
        (self.span.start, self.span.len()).into()
    }
}
