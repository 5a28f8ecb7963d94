//! Canonical names for scope headers and function headers.

use crate::classify::{strip_const, strip_unsafe, strip_visibility};
use std::borrow::Cow;

/// Prefixes a descriptor scope marker may already carry
const MARKER_HEADER_PREFIXES: [&str; 5] =
    ["impl ", "impl<", "trait ", "unsafe impl", "unsafe trait "];

/// Canonical name of a scope header.
///
/// Returns `None` for a generic `impl<..>` header whose generic list does not
/// close on this line; the caller decides how to continue. A line that is not
/// a header at all comes back verbatim (qualifiers stripped), which will simply
/// never equal a real scope name.
pub fn scope_name(raw: &str) -> Option<String> {
    let line = strip_unsafe(strip_visibility(raw));

    let name = if let Some(rest) = line.strip_prefix("trait ") {
        first_token(rest)
    } else if let Some((_, rest)) = line.split_once(" for ") {
        first_token(rest)
    } else if line.contains("impl<") {
        let (_, rest) = line.split_once("> ")?;
        first_token(rest)
    } else if let Some((_, rest)) = line.split_once("impl ") {
        first_token(rest)
    } else {
        return Some(line.to_string());
    };

    Some(bare_name(name).to_string())
}

/// Canonical name of a generic header continued on the following line
pub fn continued_scope_name(continuation: &str) -> String {
    let continuation = continuation.trim();
    scope_name(&format!("impl<> {continuation}")).unwrap_or_else(|| continuation.to_string())
}

/// Canonical name of a descriptor scope marker.
///
/// A bare identifier is read as `impl <identifier>`. Malformed markers fall
/// back to the trimmed line, which matches nothing.
pub fn descriptor_scope(marker: &str) -> String {
    let marker = strip_visibility(marker);
    let header = if MARKER_HEADER_PREFIXES.iter().any(|p| marker.starts_with(p)) {
        Cow::Borrowed(marker)
    } else {
        Cow::Owned(format!("impl {marker}"))
    };
    scope_name(&header).unwrap_or_else(|| marker.to_string())
}

fn first_token(rest: &str) -> &str {
    rest.split(' ').next().unwrap_or_default()
}

fn bare_name(name: &str) -> &str {
    let name = name.split('<').next().unwrap_or_default();
    name.split(':').next().unwrap_or_default()
}

/// Identity of a line on the function side of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature<'a> {
    /// Function header with a body; holds the bare function name
    Function(&'a str),
    /// Body-less declaration (`fn f();`); never matches anything
    Declaration(&'a str),
    /// Any other line, qualifiers stripped
    Other(&'a str),
}

impl<'a> Signature<'a> {
    pub fn parse(raw: &'a str) -> Self {
        let trimmed = raw.trim();
        // contracts cannot be attached to declarations without bodies
        if trimmed.ends_with(';') {
            return Signature::Declaration(trimmed);
        }

        let line = strip_unsafe(strip_const(strip_visibility(trimmed)));
        let is_function =
            line.starts_with("fn ") || (line.starts_with("extern \"") && line.contains("\" fn "));
        if !is_function {
            return Signature::Other(line);
        }

        let head = line.split('(').next().unwrap_or_default();
        let head = head.split('<').next().unwrap_or_default();
        Signature::Function(head.rsplit(' ').next().unwrap_or_default())
    }

    /// Function name, if this is a function header with a body
    pub fn name(&self) -> Option<&'a str> {
        match self {
            Signature::Function(name) => Some(name),
            _ => None,
        }
    }

    pub fn matches(&self, other: &Signature<'_>) -> bool {
        match (self, other) {
            (Signature::Function(a), Signature::Function(b)) => a == b,
            (Signature::Other(a), Signature::Other(b)) => !a.is_empty() && a == b,
            _ => false,
        }
    }
}
