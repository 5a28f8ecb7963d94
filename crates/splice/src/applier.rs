use crate::config::SpliceConfig;
use crate::descriptor::strip_code_fence;
use crate::error::{Result, SpliceError};
use crate::restart::align_all;
use crate::types::PatchReport;
use std::fs;
use std::path::Path;

/// Patched text together with what was done to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub text: String,
    pub report: PatchReport,
}

/// Whether `text` already carries the contract import marker
pub fn is_annotated(text: &str, config: &SpliceConfig) -> Result<bool> {
    Ok(config.annotated_regex()?.is_match(text))
}

/// Splice the annotations of `descriptor` into `original`.
///
/// `path_hint` is the original file's path; it only selects the preamble
/// variant. The feature line and preamble are added at most once, only when
/// at least one annotation line was placed and the text was not annotated
/// before.
pub fn patch_text(
    original: &str,
    descriptor: &str,
    path_hint: &str,
    config: &SpliceConfig,
) -> Result<PatchOutcome> {
    let already_annotated = is_annotated(original, config)?;
    let descriptor: Vec<&str> = strip_code_fence(descriptor).lines().collect();
    let mut buffer: Vec<String> = original.lines().map(str::to_string).collect();

    let run = align_all(&mut buffer, &descriptor);
    let mut report = PatchReport {
        matched_functions: run.matched,
        inserted_lines: run.inserted,
        passes: run.passes,
        forced_skips: run.forced_skips,
        already_annotated,
        ..Default::default()
    };

    if run.inserted > 0 && !already_annotated {
        let core = config.is_core_path(path_hint);

        if let Some(inner_pos) = run.markers.inner_pos {
            if !core {
                buffer.insert(inner_pos, config.feature_line.clone());
                report.feature_line_inserted = true;
            }
        }

        if let Some(use_pos) = run.markers.use_pos {
            let mut preamble = config.preamble_lines(core);
            let mut at = use_pos;
            if !core {
                if report.feature_line_inserted {
                    at += 1;
                } else {
                    preamble.insert(0, config.feature_line.clone());
                }
            }
            buffer.splice(at..at, preamble);
            report.preamble_inserted = true;
        }
    } else if run.inserted == 0 {
        log::debug!("{path_hint}: nothing to annotate");
    } else {
        log::debug!("{path_hint}: already annotated, preamble skipped");
    }

    let mut text = buffer.join("\n");
    if original.ends_with('\n') && !buffer.is_empty() {
        text.push('\n');
    }
    Ok(PatchOutcome { text, report })
}

/// Patch `original_path` with `descriptor_path` and write the result to
/// `output_path`. The output is written only once the whole buffer is built.
pub fn apply_patch(
    original_path: impl AsRef<Path>,
    descriptor_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &SpliceConfig,
) -> Result<PatchReport> {
    let original_path = original_path.as_ref();
    let descriptor_path = descriptor_path.as_ref();
    let output_path = output_path.as_ref();

    let original =
        fs::read_to_string(original_path).map_err(|e| SpliceError::io(original_path, e))?;
    let descriptor =
        fs::read_to_string(descriptor_path).map_err(|e| SpliceError::io(descriptor_path, e))?;

    let outcome = patch_text(
        &original,
        &descriptor,
        &original_path.to_string_lossy(),
        config,
    )?;

    fs::write(output_path, &outcome.text).map_err(|e| SpliceError::io(output_path, e))?;
    log::info!(
        "{}: {} functions annotated ({} lines) -> {}",
        original_path.display(),
        outcome.report.matched_functions,
        outcome.report.inserted_lines,
        output_path.display()
    );
    Ok(outcome.report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STD_FILE: &str = "//! Pointer helpers
#![stable(feature = \"rust1\", since = \"1.0.0\")]

use crate::mem;

impl<T> Ptr<T> {
    pub fn read(&self) -> T {
        unsafe { mem::transmute_copy(self) }
    }
}
";

    const DESCRIPTOR: &str = "impl<T> Ptr<T>
#[requires(self.is_aligned())]
pub fn read(&self) -> T
";

    #[test]
    fn test_std_file_gets_feature_line_and_preamble() {
        let config = SpliceConfig::default();
        let outcome = patch_text(STD_FILE, DESCRIPTOR, "target/library-alloc-src-ptr.rs", &config)
            .unwrap();

        let expected = "//! Pointer helpers
#![feature(ub_checks)]
#![stable(feature = \"rust1\", since = \"1.0.0\")]

use safety::{ensures,requires};
#[cfg(kani)]
#[unstable(feature=\"kani\", issue=\"none\")]
use core::kani;
#[allow(unused_imports)]
#[unstable(feature = \"ub_checks\", issue = \"none\")]
use core::ub_checks::*;

use crate::mem;

impl<T> Ptr<T> {
    #[requires(self.is_aligned())]
    pub fn read(&self) -> T {
        unsafe { mem::transmute_copy(self) }
    }
}
";
        assert_eq!(outcome.text, expected);
        assert!(outcome.report.feature_line_inserted);
        assert!(outcome.report.preamble_inserted);
        assert_eq!(outcome.report.inserted_lines, 1);
    }

    #[test]
    fn test_core_file_gets_core_preamble_only() {
        let config = SpliceConfig::default();
        let outcome = patch_text(STD_FILE, DESCRIPTOR, "target/library-core-src-ptr.rs", &config)
            .unwrap();

        assert!(!outcome.text.contains("#![feature(ub_checks)]"));
        assert!(outcome.text.contains("use crate::kani;\n"));
        assert!(!outcome.report.feature_line_inserted);
        assert!(outcome.report.preamble_inserted);
        let lines: Vec<&str> = outcome.text.lines().collect();
        assert_eq!(lines[3], "use safety::{ensures,requires};");
    }

    #[test]
    fn test_feature_line_joins_preamble_without_inner_attribute() {
        let original = "use crate::mem;\n\nimpl Foo {\n    fn bar() {}\n}\n";
        let outcome =
            patch_text(original, "Foo\n#[attr]\nfn bar()\n", "foo.rs", &SpliceConfig::default())
                .unwrap();

        let lines: Vec<&str> = outcome.text.lines().collect();
        assert_eq!(lines[0], "#![feature(ub_checks)]");
        assert_eq!(lines[1], "use safety::{ensures,requires};");
        assert!(outcome.report.preamble_inserted);
        assert!(!outcome.report.feature_line_inserted);
    }

    #[test]
    fn test_no_annotation_lines_means_no_preamble() {
        let outcome = patch_text(
            STD_FILE,
            "impl<T> Ptr<T>\npub fn read(&self) -> T\n",
            "ptr.rs",
            &SpliceConfig::default(),
        )
        .unwrap();
        assert_eq!(outcome.text, STD_FILE);
        assert_eq!(outcome.report.matched_functions, 1);
        assert!(!outcome.report.preamble_inserted);
    }

    #[test]
    fn test_fenced_descriptor() {
        let fenced = format!("```rust\n{DESCRIPTOR}```\n");
        let outcome = patch_text(STD_FILE, &fenced, "ptr.rs", &SpliceConfig::default()).unwrap();
        assert_eq!(outcome.report.inserted_lines, 1);
    }

    #[test]
    fn test_trailing_newline_is_preserved() {
        let config = SpliceConfig::default();
        let without = patch_text("impl Foo {\n}", "", "f.rs", &config).unwrap();
        assert_eq!(without.text, "impl Foo {\n}");
        let empty = patch_text("", "Foo\nfn a()\n", "f.rs", &config).unwrap();
        assert_eq!(empty.text, "");
    }
}
