use proto_lsp::diagnostics::emit_syntax_errors;
use proto_lsp::language::parser::parse;
use proto_lsp::lsp;

use std::env;
use std::fs;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("lsp");

    match command {
        "lsp" => {
            if let Err(err) = lsp::serve_stdio() {
                eprintln!("language server failed: {err}");
                process::exit(1);
            }
        }
        "check" => {
            let Some(filename) = args.get(2) else {
                eprintln!("Usage: proto-lsp check <file.proto>");
                process::exit(1);
            };
            let source = match fs::read_to_string(filename) {
                Ok(source) => source,
                Err(err) => {
                    eprintln!("Failed to read {filename}: {err}");
                    process::exit(1);
                }
            };
            let result = parse(&source);
            if result.is_well_formed() {
                println!("{filename}: ok");
            } else {
                emit_syntax_errors(filename, &source, &result.errors);
                process::exit(1);
            }
        }
        _ => {
            eprintln!("Usage: proto-lsp [lsp | check <file.proto>]");
            process::exit(1);
        }
    }
}
