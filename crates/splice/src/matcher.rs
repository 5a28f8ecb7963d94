//! Two-stream alignment of descriptor blocks onto the original source.
//!
//! The original side is walked line by line through a [`ScopeStack`]; the
//! descriptor side is consumed one block at a time. A block is matched when
//! the innermost live scope carries the block's marker name and the function
//! identities agree. Until then the original cursor keeps advancing while the
//! descriptor cursor waits on the same block.

use crate::classify::{classify, closes_scope, indentation, LineKind};
use crate::descriptor::is_annotation_line;
use crate::scope::ScopeStack;
use crate::signature::{continued_scope_name, descriptor_scope, scope_name, Signature};
use crate::types::{InsertionRecord, Markers, PassOutcome};

/// Run one matcher pass with the descriptor cursor at `start`.
pub fn align<O, D>(original: &[O], descriptor: &[D], start: usize) -> PassOutcome
where
    O: AsRef<str>,
    D: AsRef<str>,
{
    Pass::new(original, descriptor, start).run()
}

struct Pass<'a, O, D> {
    original: &'a [O],
    descriptor: &'a [D],
    i: usize,
    j: usize,
    offset: usize,
    scopes: ScopeStack,
    expected: Option<String>,
    pending_attrs: usize,
    markers: Markers,
    records: Vec<InsertionRecord>,
    restart_from: Option<usize>,
    matched: usize,
}

impl<'a, O: AsRef<str>, D: AsRef<str>> Pass<'a, O, D> {
    fn new(original: &'a [O], descriptor: &'a [D], start: usize) -> Self {
        Self {
            original,
            descriptor,
            i: 0,
            j: start,
            offset: 0,
            scopes: ScopeStack::new(),
            expected: None,
            pending_attrs: 0,
            markers: Markers::default(),
            records: Vec::new(),
            restart_from: None,
            matched: 0,
        }
    }

    fn orig(&self, idx: usize) -> &'a str {
        let original: &'a [O] = self.original;
        original[idx].as_ref()
    }

    fn desc(&self, idx: usize) -> &'a str {
        let descriptor: &'a [D] = self.descriptor;
        descriptor[idx].as_ref()
    }

    fn skip_blank_descriptor_lines(&mut self) {
        while self.j < self.descriptor.len() && self.desc(self.j).trim().is_empty() {
            self.j += 1;
        }
    }

    fn run(mut self) -> PassOutcome {
        while self.i < self.original.len() && self.j < self.descriptor.len() {
            if self.expected.is_none() && !self.read_block_header() {
                break;
            }

            let raw = self.orig(self.i);
            let kind = classify(raw);
            if kind == LineKind::ScopeOpener {
                if !self.open_scope() {
                    break;
                }
                continue;
            }
            if self.scopes.close(raw) {
                self.i += 1;
                continue;
            }
            if kind == LineKind::Import && self.markers.use_pos.is_none() {
                self.markers.use_pos = Some(self.i);
                self.i += 1;
                continue;
            }
            if kind == LineKind::Attribute && self.markers.inner_pos.is_none() {
                self.markers.inner_pos = Some(self.i);
                self.i += 1;
                continue;
            }

            if self.j >= self.descriptor.len() {
                break;
            }
            if self.is_match() {
                self.accept();
            } else {
                self.i += 1;
            }
        }

        // a match may exhaust the original side while blocks remain
        if self.expected.is_none() && self.matched > 0 {
            self.skip_blank_descriptor_lines();
            if self.j < self.descriptor.len() {
                self.restart_from = Some(self.j);
            }
        }

        if let (Some(use_pos), Some(inner_pos)) = (self.markers.use_pos, self.markers.inner_pos) {
            if inner_pos > use_pos {
                self.markers.inner_pos = None;
            }
        }

        log::debug!(
            "pass: {} matches, {} lines to insert, restart at {:?}",
            self.matched,
            self.records.len(),
            self.restart_from
        );

        PassOutcome {
            records: self.records,
            markers: self.markers,
            restart_from: self.restart_from,
            matched: self.matched,
        }
    }

    /// Read the scope marker of the next descriptor block and count the
    /// annotation lines under it. Returns `false` when the stream is exhausted.
    fn read_block_header(&mut self) -> bool {
        self.skip_blank_descriptor_lines();
        if self.j >= self.descriptor.len() {
            return false;
        }

        self.restart_from = Some(self.j);
        self.pending_attrs = 0;
        let scope = descriptor_scope(self.desc(self.j));
        log::trace!("expecting scope {scope} (descriptor line {})", self.j + 1);
        self.expected = Some(scope);
        self.j += 1;

        while self.j < self.descriptor.len() && is_annotation_line(self.desc(self.j)) {
            self.j += 1;
            self.pending_attrs += 1;
        }
        true
    }

    /// Enter the scope opened at the original cursor. Returns `false` when a
    /// split generic header runs off the end of the file.
    fn open_scope(&mut self) -> bool {
        let (name, header) = match scope_name(self.orig(self.i)) {
            Some(name) => (name, self.i),
            None => {
                let continuation = self.i + 1;
                if continuation >= self.original.len() {
                    return false;
                }
                (continued_scope_name(self.orig(continuation)), continuation)
            }
        };

        let indent = indentation(self.orig(self.i));
        let closes_on_header = self.orig(header).trim_end().ends_with('}');
        let closes_on_next = !closes_on_header
            && header + 1 < self.original.len()
            && closes_scope(self.orig(header + 1), indent);

        if closes_on_header {
            self.i = header + 1;
        } else if closes_on_next {
            // empty body: the scope never becomes current
            self.i = header + 2;
        } else {
            self.scopes.push(name, indent);
            log::trace!(
                "entered scope at line {} (depth {})",
                header + 1,
                self.scopes.depth()
            );
            self.i = header + 1;
        }
        true
    }

    fn is_match(&self) -> bool {
        let Some(expected) = self.expected.as_deref() else {
            return false;
        };
        if self.scopes.current() != Some(expected) {
            return false;
        }
        Signature::parse(self.orig(self.i)).matches(&Signature::parse(self.desc(self.j)))
    }

    /// Whether the lines right above the cursor already are `attrs`
    fn already_placed(&self, attrs: &[D]) -> bool {
        !attrs.is_empty()
            && self.i >= attrs.len()
            && self.original[self.i - attrs.len()..self.i]
                .iter()
                .zip(attrs)
                .all(|(line, attr)| line.as_ref().trim() == attr.as_ref().trim())
    }

    fn accept(&mut self) {
        let indent = indentation(self.orig(self.i));
        let descriptor = self.descriptor;
        let attrs = &descriptor[self.j - self.pending_attrs..self.j];
        if self.already_placed(attrs) {
            log::trace!("annotations above original line {} already present", self.i + 1);
        } else {
            for attr in attrs {
                self.records.push(InsertionRecord {
                    position: self.i + self.offset,
                    text: format!("{indent}{}", attr.as_ref().trim()),
                });
                self.offset += 1;
            }
        }

        log::trace!(
            "matched {:?}::{} at original line {} with {} annotation lines",
            self.expected,
            Signature::parse(self.orig(self.i)).name().unwrap_or("?"),
            self.i + 1,
            self.pending_attrs
        );

        self.matched += 1;
        self.pending_attrs = 0;
        self.expected = None;
        self.restart_from = None;
        self.j += 1;
        self.skip_blank_descriptor_lines();
        self.i += 1;
    }
}
