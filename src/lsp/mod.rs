pub mod backend;
pub mod completion;
mod diagnostics;
mod server;
pub mod text;

pub use server::serve_stdio;
