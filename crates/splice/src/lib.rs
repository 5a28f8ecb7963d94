//! # Contractgen Splice
//!
//! Places generated contract annotations onto the functions of a Rust source
//! file, without parsing Rust.
//!
//! ## Inputs
//!
//! - the **original** file, with `impl`/`trait` scopes containing functions
//! - a **descriptor** produced by an unreliable generator: blank-line separated
//!   blocks, each a scope marker, annotation lines and one function header, in
//!   source order but possibly with skipped, garbled or reordered entries
//!
//! ## Architecture
//!
//! ```text
//! original + descriptor
//!     │
//!     ├──> Matcher pass (classify → scope stack → identity match)
//!     │    └─> InsertionRecord[] + preamble markers + restart point
//!     │
//!     ├──> Restart controller
//!     │    ├─> apply the pass to the buffer
//!     │    ├─> resume from the stalled block
//!     │    └─> no progress: skip to the next block
//!     │
//!     └──> Applier
//!          ├─> feature line at the first inner attribute
//!          └─> import preamble at the first `use` (once per file)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use contractgen_splice::{patch_text, SpliceConfig};
//!
//! let original = "use core::mem;\n\nimpl Foo {\n    pub fn bar(&self) {}\n}\n";
//! let descriptor = "Foo\n#[requires(true)]\npub fn bar(&self)\n";
//!
//! let outcome = patch_text(original, descriptor, "foo.rs", &SpliceConfig::default()).unwrap();
//! assert!(outcome.text.contains("    #[requires(true)]\n    pub fn bar(&self) {}"));
//! assert_eq!(outcome.report.matched_functions, 1);
//! ```

mod applier;
mod classify;
mod config;
mod descriptor;
mod error;
mod matcher;
mod restart;
mod scope;
mod signature;
mod types;

pub use applier::{apply_patch, is_annotated, patch_text, PatchOutcome};
pub use classify::{classify, LineKind};
pub use config::SpliceConfig;
pub use descriptor::{annotated_functions, next_block_start, strip_code_fence};
pub use error::{Result, SpliceError};
pub use matcher::align;
pub use restart::{align_all, AlignmentRun};
pub use scope::{ScopeFrame, ScopeStack};
pub use signature::{descriptor_scope, scope_name, Signature};
pub use types::{InsertionRecord, Markers, PassOutcome, PatchReport};
