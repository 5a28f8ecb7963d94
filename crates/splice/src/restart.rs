//! Repeated matcher passes with forced resynchronisation.
//!
//! Every pass is applied to the buffer before the next one starts, so a
//! restarted pass scans the already patched text from the top with fresh
//! offsets. A restart that makes no progress skips the descriptor cursor to
//! the next block; running off the end drops whatever is left.

use crate::descriptor::next_block_start;
use crate::matcher::align;
use crate::types::{Markers, PassOutcome};

/// Totals of a complete alignment over one buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignmentRun {
    /// Preamble anchors from the first pass, tracked through every insertion
    pub markers: Markers,
    pub matched: usize,
    pub inserted: usize,
    pub passes: usize,
    pub forced_skips: usize,
}

/// Align `descriptor` onto `buffer` until the descriptor is consumed or
/// nothing more can be placed, inserting annotation lines in place.
pub fn align_all<D: AsRef<str>>(buffer: &mut Vec<String>, descriptor: &[D]) -> AlignmentRun {
    let first = align(buffer.as_slice(), descriptor, 0);
    let mut run = AlignmentRun {
        markers: first.markers,
        ..Default::default()
    };
    let mut restart = apply_pass(buffer, first, &mut run);

    while let Some(from) = restart {
        let pass = align(buffer.as_slice(), descriptor, from);
        restart = match apply_pass(buffer, pass, &mut run) {
            Some(next) if next > from => Some(next),
            Some(_) => {
                run.forced_skips += 1;
                let skip_to = next_block_start(descriptor, from);
                if skip_to >= descriptor.len() {
                    log::warn!(
                        "dropping unmatched descriptor block at line {} and everything after it",
                        from + 1
                    );
                    None
                } else {
                    log::debug!(
                        "no progress from descriptor line {}, skipping to line {}",
                        from + 1,
                        skip_to + 1
                    );
                    Some(skip_to)
                }
            }
            None => None,
        };
    }

    log::debug!(
        "alignment finished: {} matches, {} lines in {} passes ({} forced skips)",
        run.matched,
        run.inserted,
        run.passes,
        run.forced_skips
    );
    run
}

fn apply_pass(
    buffer: &mut Vec<String>,
    pass: PassOutcome,
    run: &mut AlignmentRun,
) -> Option<usize> {
    run.passes += 1;
    run.matched += pass.matched;
    run.inserted += pass.records.len();
    for record in pass.records {
        run.markers.shift(record.position);
        buffer.insert(record.position, record.text);
    }
    pass.restart_from
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn buffer(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn test_skips_block_for_unknown_scope() {
        let mut buf = buffer("impl Foo {\n    fn a() {}\n}");
        let descriptor: Vec<&str> = "Ghost\n#[x]\nfn a()\n\nFoo\n#[y]\nfn a()".lines().collect();

        let run = align_all(&mut buf, &descriptor);
        assert_eq!(buf, buffer("impl Foo {\n    #[y]\n    fn a() {}\n}"));
        assert_eq!(run.matched, 1);
        assert_eq!(run.forced_skips, 1);
        assert_eq!(run.passes, 3);
    }

    #[test]
    fn test_recovers_out_of_order_blocks() {
        let mut buf = buffer(
            "impl Foo {
    fn a() {}
    fn b() {}
}",
        );
        let descriptor: Vec<&str> = "Foo\n#[b]\nfn b()\n\nFoo\n#[a]\nfn a()".lines().collect();

        let run = align_all(&mut buf, &descriptor);
        assert_eq!(
            buf,
            buffer(
                "impl Foo {
    #[a]
    fn a() {}
    #[b]
    fn b() {}
}"
            )
        );
        assert_eq!(run.matched, 2);
        assert_eq!(run.forced_skips, 0);
    }

    #[test]
    fn test_trailing_garbage_is_dropped() {
        let mut buf = buffer("impl Foo {\n    fn a() {}\n}");
        let descriptor: Vec<&str> = "Foo\n#[a]\nfn a()\n\nBar\n#[z]\nfn z()\n\nBaz\nfn q()"
            .lines()
            .collect();

        let run = align_all(&mut buf, &descriptor);
        assert_eq!(run.matched, 1);
        assert_eq!(run.inserted, 1);
        assert!(run.forced_skips <= 2);
    }

    #[test]
    fn test_markers_follow_insertions_before_them() {
        let mut buf = buffer(
            "impl Early {
    fn first() {}
}
use core::mem;
impl Late {
    fn second() {}
}",
        );
        let descriptor: Vec<&str> =
            "Early\n#[requires(true)]\nfn first()\n\nLate\n#[ensures(true)]\nfn second()"
                .lines()
                .collect();

        let run = align_all(&mut buf, &descriptor);
        assert_eq!(run.matched, 2);
        assert_eq!(run.markers.use_pos, Some(4));
        assert_eq!(buf[4], "use core::mem;");
        assert_eq!(buf[6], "    #[ensures(true)]");
    }

    #[test]
    fn test_empty_inputs() {
        let mut buf: Vec<String> = Vec::new();
        let run = align_all(&mut buf, &["Foo", "fn a()"]);
        assert_eq!(run.matched, 0);
        assert_eq!(run.passes, 1);

        let mut buf = buffer("impl Foo {\n    fn a() {}\n}");
        let none: [&str; 0] = [];
        let run = align_all(&mut buf, &none);
        assert_eq!(run.inserted, 0);
        assert_eq!(run.passes, 1);
    }
}
