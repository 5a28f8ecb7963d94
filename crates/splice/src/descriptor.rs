//! Helpers over the generated descriptor text.
//!
//! A descriptor is a sequence of blank-line separated blocks:
//!
//! ```text
//! impl<T> NonNull<T>                        <- scope marker
//! #[requires(!ptr.is_null())]               <- annotation lines
//! pub const unsafe fn new_unchecked(ptr: *mut T) -> Self
//!
//! Layout                                    <- next block
//! ...
//! ```

/// Whether a descriptor line is an annotation to splice (attribute or comment)
pub fn is_annotation_line(line: &str) -> bool {
    let line = line.trim();
    line.starts_with('#') || line.starts_with("//")
}

/// Index of the first line of the block after the one containing `from`.
///
/// Returns `lines.len()` when no blank line follows.
pub fn next_block_start<S: AsRef<str>>(lines: &[S], from: usize) -> usize {
    lines
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, line)| line.as_ref().trim().is_empty())
        .map(|(idx, _)| idx + 1)
        .unwrap_or(lines.len())
}

/// Unwrap generator output fenced as a Markdown code block.
///
/// Only a fence on the first non-blank line is recognised; the body runs up to
/// the next fence line or the end of the text.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim_start();
    let Some(first_line_end) = trimmed.find('\n') else {
        return text;
    };
    if !trimmed[..first_line_end].trim_end().starts_with("```") {
        return text;
    }

    let body = &trimmed[first_line_end + 1..];
    let mut end = body.len();
    let mut offset = 0;
    for line in body.split_inclusive('\n') {
        if line.trim_start().starts_with("```") {
            end = offset;
            break;
        }
        offset += line.len();
    }
    &body[..end]
}

/// Function header of every block: the last non-blank line before each blank
/// line, plus the final line when the text does not end with a blank one.
pub fn annotated_functions(text: &str) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();
    let mut functions = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if idx > 0 && line.trim().is_empty() && !lines[idx - 1].trim().is_empty() {
            functions.push(lines[idx - 1]);
        }
    }
    if let Some(last) = lines.last() {
        if !last.trim().is_empty() {
            functions.push(last);
        }
    }
    functions
}
