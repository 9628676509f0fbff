//! Line-level diff model.
//!
//! A [`Patch`] is what one commit did to the program source: an ordered list
//! of [`Hunk`]s, each an ordered list of [`HunkLine`]s. Renderers never look
//! at hunk lines one at a time; they walk [`Run`]s instead, the maximal
//! stretches of lines sharing one [`LineClass`].
//!
//! ```text
//! Hunk:  unch unch add add add del unch
//! Runs:  [unch unch][add add add][del][unch]
//! ```

mod compute;

pub use compute::patch_between;

use std::num::NonZeroU32;

/// 1-based line number on one side of a diff.
pub type LineNo = NonZeroU32;

/// One line of a hunk.
///
/// A missing line number means the line does not exist on that side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkLine {
    pub old_lineno: Option<LineNo>,
    pub new_lineno: Option<LineNo>,
    /// Line text including its terminator, if it had one.
    pub content: String,
}

impl HunkLine {
    pub fn new(old: Option<u32>, new: Option<u32>, content: impl Into<String>) -> Self {
        Self {
            old_lineno: old.and_then(NonZeroU32::new),
            new_lineno: new.and_then(NonZeroU32::new),
            content: content.into(),
        }
    }

    /// Classify this line. `None` for a line absent on both sides.
    pub fn class(&self) -> Option<LineClass> {
        LineClass::classify(self.old_lineno, self.new_lineno)
    }
}

/// A contiguous block of lines within a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hunk {
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    pub fn new(lines: Vec<HunkLine>) -> Self {
        Self { lines }
    }

    /// Split into maximal runs of same-class lines, in order.
    ///
    /// Lines with neither line number are skipped; they cannot come out of a
    /// real diff.
    pub fn runs(&self) -> Vec<Run<'_>> {
        let mut runs: Vec<Run<'_>> = Vec::new();
        let mut start = 0;

        for (idx, line) in self.lines.iter().enumerate() {
            let Some(class) = line.class() else {
                crate::debug!("diff"; "skipping line with no line numbers: {:?}", line.content);
                continue;
            };

            match runs.last_mut() {
                Some(run) if run.class == class && start == idx => {
                    run.lines = &self.lines[run.offset..=idx];
                }
                _ => runs.push(Run {
                    class,
                    offset: idx,
                    lines: &self.lines[idx..=idx],
                }),
            }
            start = idx + 1;
        }

        runs
    }
}

/// All hunks one commit made to a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    pub hunks: Vec<Hunk>,
}

impl Patch {
    pub fn new(hunks: Vec<Hunk>) -> Self {
        Self { hunks }
    }
}

/// What happened to a line between the two revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineClass {
    Unchanged,
    Added,
    Removed,
}

impl LineClass {
    /// Both numbers present → unchanged, only new → added, only old → removed.
    pub fn classify(old: Option<LineNo>, new: Option<LineNo>) -> Option<Self> {
        match (old, new) {
            (Some(_), Some(_)) => Some(Self::Unchanged),
            (None, Some(_)) => Some(Self::Added),
            (Some(_), None) => Some(Self::Removed),
            (None, None) => None,
        }
    }

    /// CSS class used for the rendered group.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Unchanged => "diff-unch",
            Self::Added => "diff-add",
            Self::Removed => "diff-del",
        }
    }
}

/// Maximal stretch of same-class lines within a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run<'a> {
    pub class: LineClass,
    offset: usize,
    pub lines: &'a [HunkLine],
}

impl Run<'_> {
    /// Concatenated content of every line, terminators kept.
    pub fn text(&self) -> String {
        self.lines.iter().map(|l| l.content.as_str()).collect()
    }
}
