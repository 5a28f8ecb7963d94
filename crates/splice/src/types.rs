use serde::{Deserialize, Serialize};

/// One line to splice into the original buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionRecord {
    /// Index in the buffer at the moment of insertion.
    ///
    /// Records of a pass are applied in order; each position already accounts
    /// for the records emitted before it.
    pub position: usize,

    /// Full line text, indentation included
    pub text: String,
}

/// Places the preamble is anchored to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Markers {
    /// First column-0 `use` statement
    pub use_pos: Option<usize>,

    /// First column-0 attribute, only kept when it precedes `use_pos`
    pub inner_pos: Option<usize>,
}

impl Markers {
    /// Follow the marked lines across an insertion at `position`
    pub fn shift(&mut self, position: usize) {
        for marker in [&mut self.use_pos, &mut self.inner_pos].into_iter().flatten() {
            if position <= *marker {
                *marker += 1;
            }
        }
    }
}

/// Result of a single matcher pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassOutcome {
    pub records: Vec<InsertionRecord>,
    pub markers: Markers,
    /// Descriptor index to resume from, `None` once the stream is consumed
    pub restart_from: Option<usize>,
    /// Function headers matched during the pass
    pub matched: usize,
}

/// What a patch operation did to one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchReport {
    pub matched_functions: usize,
    pub inserted_lines: usize,
    pub passes: usize,
    pub forced_skips: usize,
    pub feature_line_inserted: bool,
    pub preamble_inserted: bool,
    pub already_annotated: bool,
}
