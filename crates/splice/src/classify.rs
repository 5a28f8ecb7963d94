//! Lexical line classification.
//!
//! Every check here is a prefix test on a single line. Indentation is the only
//! nesting signal the engine has, so [`indentation`] and [`closes_scope`] work
//! on the raw line while the keyword checks work on the trimmed one.

/// Visibility qualifiers removed before any keyword check, most specific first
const VISIBILITY_PREFIXES: [&str; 3] = ["pub(crate) ", "pub(super) ", "pub "];

/// Header prefixes that open a named scope (after visibility stripping)
const SCOPE_OPENER_PREFIXES: [&str; 6] = [
    "impl ",
    "impl<",
    "unsafe impl ",
    "unsafe impl<",
    "trait ",
    "unsafe trait ",
];

const INNER_ATTRIBUTE_PREFIXES: [&str; 2] = ["#![", "#["];

/// Category of a raw source line, as far as the aligner cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `impl`/`trait` header, optionally generic, unsafe or public
    ScopeOpener,
    /// Column-0 `use` statement
    Import,
    /// Column-0 attribute (`#![..]` or `#[..]`)
    Attribute,
    /// Anything else, including function headers and closing braces
    Other,
}

/// Classify a raw line.
///
/// Closing braces are not a kind of their own: whether a `}` closes a scope
/// depends on the live scope stack, see [`closes_scope`].
pub fn classify(raw: &str) -> LineKind {
    if is_scope_opener(raw) {
        LineKind::ScopeOpener
    } else if raw.starts_with("use ") {
        LineKind::Import
    } else if INNER_ATTRIBUTE_PREFIXES.iter().any(|p| raw.starts_with(p)) {
        LineKind::Attribute
    } else {
        LineKind::Other
    }
}

/// Whether the line begins a type implementation or trait definition
pub fn is_scope_opener(raw: &str) -> bool {
    let line = strip_visibility(raw);
    SCOPE_OPENER_PREFIXES.iter().any(|p| line.starts_with(p))
}

/// Remove one leading visibility qualifier.
///
/// The line is cut at the first occurrence of the qualifier token, so the
/// result is whatever follows it up to a second occurrence, trimmed.
pub fn strip_visibility(raw: &str) -> &str {
    strip_keyword(raw.trim(), &VISIBILITY_PREFIXES)
}

/// Remove one leading `unsafe ` qualifier
pub fn strip_unsafe(line: &str) -> &str {
    strip_keyword(line.trim(), &["unsafe "])
}

/// Remove one leading `const ` qualifier
pub fn strip_const(line: &str) -> &str {
    strip_keyword(line.trim(), &["const "])
}

fn strip_keyword<'a>(line: &'a str, keywords: &[&str]) -> &'a str {
    for keyword in keywords {
        if line.starts_with(keyword) {
            return line.split(keyword).nth(1).unwrap_or_default().trim();
        }
    }
    line
}

/// Leading whitespace of a raw line
pub fn indentation(raw: &str) -> &str {
    &raw[..raw.len() - raw.trim_start().len()]
}

/// Whether `raw` is a closing brace at exactly `indent`
pub fn closes_scope(raw: &str, indent: &str) -> bool {
    raw.strip_prefix(indent)
        .is_some_and(|rest| rest.starts_with('}'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_stripping() {
        assert_eq!(strip_visibility("  pub fn len(&self)"), "fn len(&self)");
        assert_eq!(strip_visibility("pub(crate) impl Foo {"), "impl Foo {");
        assert_eq!(strip_visibility("pub(super) trait Bar {"), "trait Bar {");
        assert_eq!(strip_visibility("fn private()"), "fn private()");
        // cut at the first occurrence, up to the next one
        assert_eq!(strip_visibility("pub fn f(x: pub T)"), "fn f(x:");
    }

    #[test]
    fn test_qualifier_stripping() {
        assert_eq!(strip_unsafe("unsafe impl Send for Foo {}"), "impl Send for Foo {}");
        assert_eq!(strip_const("const unsafe fn f()"), "unsafe fn f()");
        assert_eq!(strip_unsafe("impl Foo"), "impl Foo");
    }

    #[test]
    fn test_scope_openers() {
        for line in [
            "impl Foo {",
            "impl<T> Foo<T> {",
            "unsafe impl Send for Foo {}",
            "unsafe impl<T: Send> Send for Foo<T> {}",
            "pub trait Bar {",
            "pub unsafe trait Alloc {",
            "    impl Inner {",
        ] {
            assert_eq!(classify(line), LineKind::ScopeOpener, "{line}");
        }
        assert_eq!(classify("implement_me!();"), LineKind::Other);
        assert_eq!(classify("fn impl_detail() {"), LineKind::Other);
    }

    #[test]
    fn test_imports_and_attributes_are_column_zero() {
        assert_eq!(classify("use core::mem;"), LineKind::Import);
        assert_eq!(classify("    use core::mem;"), LineKind::Other);
        assert_eq!(classify("#![no_std]"), LineKind::Attribute);
        assert_eq!(classify("#[inline]"), LineKind::Attribute);
        assert_eq!(classify("    #[inline]"), LineKind::Other);
    }

    #[test]
    fn test_closing_brace_requires_exact_indentation() {
        assert!(closes_scope("}", ""));
        assert!(closes_scope("    }", "    "));
        assert!(!closes_scope("        }", "    "));
        assert!(!closes_scope("  }", "    "));
        assert!(closes_scope("};", ""));
    }

    #[test]
    fn test_indentation() {
        assert_eq!(indentation("\t    fn x()"), "\t    ");
        assert_eq!(indentation("fn x()"), "");
        assert_eq!(indentation("   "), "   ");
    }
}
