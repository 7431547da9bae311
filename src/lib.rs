pub mod diagnostics;
pub mod language;
pub mod lsp;
pub mod model;
