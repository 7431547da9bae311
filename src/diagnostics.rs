use crate::language::errors::SyntaxError;
use miette::{Diagnostic, NamedSource, Report, SourceSpan};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic, Clone)]
#[error("{message}")]
pub struct SyntaxDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("{message}")]
    span: SourceSpan,
    #[help]
    help: Option<String>,
    message: String,
}

impl SyntaxDiagnostic {
    pub fn from_error(src: NamedSource<String>, err: SyntaxError) -> Self {
        Self {
            src,
            span: err.to_source_span(),
            help: err.help.clone(),
            message: err.message.clone(),
        }
    }
}

pub fn emit_syntax_errors(name: &str, source: &str, errors: &[SyntaxError]) {
    let src = NamedSource::new(name, source.to_string());
    for err in errors {
        let diagnostic = SyntaxDiagnostic::from_error(src.clone(), err.clone());
        eprintln!("{:?}", Report::new(diagnostic));
    }
}
