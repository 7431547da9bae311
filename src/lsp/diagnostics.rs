use tower_lsp_server::lsp_types::{Diagnostic, DiagnosticSeverity};

use crate::language::errors::SyntaxError;
use crate::lsp::text::span_to_range;

pub fn syntax_diagnostics(text: &str, errors: &[SyntaxError]) -> Vec<Diagnostic> {
    errors
        .iter()
        .map(|err| {
            let message = match &err.help {
                Some(help) => format!("{}\nhelp: {}", err.message, help),
                None => err.message.clone(),
            };
            Diagnostic {
                range: span_to_range(text, err.span),
                severity: Some(DiagnosticSeverity::ERROR),
                source: Some("proto-lsp".into()),
                message,
                ..Default::default()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::parser::parse;

    #[test]
    fn malformed_source_yields_error_diagnostics() {
        let source = "message Widget {\n  strin name = 1\n}\n";
        let result = parse(source);
        let diagnostics = syntax_diagnostics(source, &result.errors);
        assert!(!diagnostics.is_empty());
        assert!(diagnostics
            .iter()
            .all(|d| d.severity == Some(DiagnosticSeverity::ERROR)));
    }
}
