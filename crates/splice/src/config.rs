use crate::error::{Result, SpliceError};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

const DEFAULT_FEATURE_LINE: &str = "#![feature(ub_checks)]";

const DEFAULT_CORE_PATH_MARKER: &str = "library-core-";

const DEFAULT_CORE_PREAMBLE: &str = "use safety::{ensures,requires};
#[cfg(kani)]
use crate::kani;
#[allow(unused_imports)]
use crate::ub_checks::*;

";

const DEFAULT_STD_PREAMBLE: &str = "use safety::{ensures,requires};
#[cfg(kani)]
#[unstable(feature=\"kani\", issue=\"none\")]
use core::kani;
#[allow(unused_imports)]
#[unstable(feature = \"ub_checks\", issue = \"none\")]
use core::ub_checks::*;

";

const DEFAULT_ANNOTATED_PATTERN: &str = "^use .*kani";

/// Text the applier splices around the matched annotations
///
/// Built once by the caller and lent to every patch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpliceConfig {
    /// Feature-enabling inner attribute inserted at the first inner attribute
    pub feature_line: String,

    /// Path fragment identifying files of the core library itself
    pub core_path_marker: String,

    /// Import preamble for core-library files
    pub core_preamble: String,

    /// Import preamble for every other file
    pub std_preamble: String,

    /// Multi-line pattern whose presence marks a file as already annotated
    pub annotated_pattern: String,
}

impl Default for SpliceConfig {
    fn default() -> Self {
        Self {
            feature_line: DEFAULT_FEATURE_LINE.to_string(),
            core_path_marker: DEFAULT_CORE_PATH_MARKER.to_string(),
            core_preamble: DEFAULT_CORE_PREAMBLE.to_string(),
            std_preamble: DEFAULT_STD_PREAMBLE.to_string(),
            annotated_pattern: DEFAULT_ANNOTATED_PATTERN.to_string(),
        }
    }
}

impl SpliceConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.feature_line.trim().is_empty() {
            return Err(SpliceError::invalid_config("feature_line must not be empty"));
        }
        if self.feature_line.contains('\n') {
            return Err(SpliceError::invalid_config(
                "feature_line must be a single line",
            ));
        }
        if self.core_preamble.trim().is_empty() || self.std_preamble.trim().is_empty() {
            return Err(SpliceError::invalid_config("preambles must not be empty"));
        }
        self.annotated_regex()?;
        Ok(())
    }

    /// Compile the already-annotated pattern with `^`/`$` anchored per line
    pub fn annotated_regex(&self) -> Result<Regex> {
        Ok(RegexBuilder::new(&self.annotated_pattern)
            .multi_line(true)
            .build()?)
    }

    /// Whether `path` names a file of the core library
    pub fn is_core_path(&self, path: &str) -> bool {
        !self.core_path_marker.is_empty() && path.contains(&self.core_path_marker)
    }

    /// Preamble lines for a file, including the trailing separator line
    pub fn preamble_lines(&self, core: bool) -> Vec<String> {
        let text = if core {
            &self.core_preamble
        } else {
            &self.std_preamble
        };
        text.split_terminator('\n').map(str::to_string).collect()
    }
}
