use tower_lsp_server::lsp_types::{Position, Range};

use crate::language::span::Span;

pub fn offset_to_position(text: &str, offset: usize) -> Position {
    let mut line = 0u32;
    let mut col = 0u32;
    for (idx, ch) in text.char_indices() {
        if idx >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    Position::new(line, col)
}

/// Strict position translation: `None` when the line does not exist or the
/// character sits past the end of its line. The completion entry point turns
/// that into an `InvalidPosition` infrastructure error.
pub fn position_offset(text: &str, position: Position) -> Option<usize> {
    let mut offset = 0usize;
    let mut line_count = 0u32;
    for line in text.split_inclusive('\n') {
        if line_count == position.line {
            let content = line.strip_suffix('\n').unwrap_or(line);
            let mut col_bytes = 0usize;
            let mut chars_seen = 0u32;
            for ch in content.chars() {
                if chars_seen == position.character {
                    break;
                }
                col_bytes += ch.len_utf8();
                chars_seen += 1;
            }
            if chars_seen < position.character {
                return None;
            }
            return Some(offset + col_bytes);
        }
        offset += line.len();
        line_count += 1;
    }
    // The cursor may sit on the empty line after a trailing newline, or at
    // (0, 0) in an empty document.
    if position.line == line_count && position.character == 0 {
        return Some(text.len());
    }
    None
}

/// Text from the start of the cursor's line up to the cursor, the window the
/// option-statement heuristic scans.
pub fn line_prefix(text: &str, offset: usize) -> &str {
    let end = offset.min(text.len());
    let start = text[..end].rfind('\n').map(|idx| idx + 1).unwrap_or(0);
    &text[start..end]
}

pub fn span_to_range(text: &str, span: Span) -> Range {
    Range {
        start: offset_to_position(text, span.start),
        end: offset_to_position(text, span.end),
    }
}
