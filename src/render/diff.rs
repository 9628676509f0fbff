//! Patch → HTML diff tables.
//!
//! ```text
//! <div class="patch">                    one per patch
//!   <table>                              one per hunk
//!     <tbody class="diff-add"            one per run
//!            data-added-text="...">
//!       <tr><td>old</td><td>new</td><td><pre>code</pre></td></tr>
//! ```

use crate::diff::{Hunk, HunkLine, LineClass, LineNo, Patch, Run};
use crate::html::{Element, Node};

/// Class of the outer patch container.
pub const PATCH_CLASS: &str = "patch";
/// Attribute holding the exact text of an added run.
pub const ADDED_TEXT_ATTR: &str = "data-added-text";

/// Render a whole patch.
pub fn render_patch(patch: &Patch) -> Element {
    Element::new("div")
        .with_attr("class", PATCH_CLASS)
        .with_children(patch.hunks.iter().map(|h| render_hunk(h).into()))
}

/// Render one hunk as a table of run groups.
pub fn render_hunk(hunk: &Hunk) -> Element {
    Element::new("table").with_children(hunk.runs().iter().map(|r| render_run(r).into()))
}

fn render_run(run: &Run<'_>) -> Element {
    let mut group = Element::new("tbody").with_attr("class", run.class.css_class());
    if run.class == LineClass::Added {
        group.set_attr(ADDED_TEXT_ATTR, run.text());
    }
    group.with_children(run.lines.iter().map(|l| render_line(l).into()))
}

fn render_line(line: &HunkLine) -> Element {
    Element::new("tr")
        .with_child(lineno_cell(line.old_lineno))
        .with_child(lineno_cell(line.new_lineno))
        .with_child(
            Element::new("td")
                .with_child(Element::new("pre").with_child(Node::text(strip_eol(&line.content)))),
        )
}

fn lineno_cell(lineno: Option<LineNo>) -> Element {
    match lineno {
        Some(n) => Element::new("td").with_child(Node::text(n.to_string())),
        None => Element::new("td"),
    }
}

/// Drop one trailing line terminator (`\n` or `\r\n`).
fn strip_eol(content: &str) -> &str {
    content
        .strip_suffix('\n')
        .map(|s| s.strip_suffix('\r').unwrap_or(s))
        .unwrap_or(content)
}
