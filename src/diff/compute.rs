use similar::{ChangeTag, TextDiff};

use super::{Hunk, HunkLine, Patch};

/// Unchanged lines kept around each change, as `git diff` does.
pub const CONTEXT_LINES: usize = 3;

/// Line diff from `old` to `new`, grouped into hunks.
pub fn patch_between(old: &str, new: &str) -> Patch {
    let diff = TextDiff::from_lines(old, new);

    let hunks = diff
        .grouped_ops(CONTEXT_LINES)
        .iter()
        .map(|group| {
            let lines = group
                .iter()
                .flat_map(|op| diff.iter_changes(op))
                .map(|change| {
                    let lineno = |idx: Option<usize>| idx.map(|i| i as u32 + 1);
                    let (old_no, new_no) = match change.tag() {
                        ChangeTag::Equal => (lineno(change.old_index()), lineno(change.new_index())),
                        ChangeTag::Delete => (lineno(change.old_index()), None),
                        ChangeTag::Insert => (None, lineno(change.new_index())),
                    };
                    HunkLine::new(old_no, new_no, change.value())
                })
                .collect();
            Hunk::new(lines)
        })
        .collect();

    Patch::new(hunks)
}
