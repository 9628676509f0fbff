//! Tutorial rendering.
//!
//! ```text
//! narrative.md ──markdown──> nodes ──split──> steps ──assemble──> document
//!                                               ^
//! history ──patches by slug─────────────────────┘
//! ```
//!
//! Everything here is a pure function of its input; the live pipeline and the
//! archive writer both call [`compile_document`].

pub mod diff;
pub mod document;
pub mod narrative;

pub use document::{TutorialDocument, assemble};

use thiserror::Error;

use crate::history::TutorialHistory;
use crate::html::{Element, ParseError, parse_fragment};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("patch placeholder has no `{}` attribute", narrative::SLUG_ATTR)]
    PlaceholderWithoutSlug,

    #[error("narrative refers to commit `{0}`, but no commit in the history carries `{{#{0}}}`")]
    UnknownCommit(String),
}

/// Build the tutorial document for a loaded history.
pub fn compile_document(history: &TutorialHistory) -> Result<TutorialDocument, RenderError> {
    let html = narrative::markdown_to_html(&history.narrative);
    let nodes = parse_fragment(&html)?;
    let steps = narrative::split_steps(nodes, &history.patches)?;
    Ok(assemble(steps, &history.complete_code))
}

/// Render summary markdown into the index entry for a tutorial.
pub fn render_summary(markdown: &str) -> Result<Element, RenderError> {
    let nodes = parse_fragment(&narrative::markdown_to_html(markdown))?;
    Ok(Element::new("div")
        .with_attr("class", "tutorial-summary")
        .with_children(nodes.into_iter().filter(crate::html::is_relevant)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::patch_between;
    use crate::history::TutorialHistory;

    fn history(narrative: &str) -> TutorialHistory {
        let mut history = TutorialHistory::new("boing", narrative);
        history.complete_code = "import pytch\n\ndef hello():\n    pass\n".to_string();
        history.patches.insert(
            "add-hello".to_string(),
            patch_between("import pytch\n", &history.complete_code),
        );
        history
    }

    #[test]
    fn test_compile_document_end_to_end() {
        let doc = compile_document(&history(
            "# Boing\n\nA game.\n\n## Say hello\n\nAdd a function.\n\n{{< commit add-hello >}}\n",
        ))
        .unwrap();

        let html = doc.to_html();
        assert!(html.starts_with(
            "<div class=\"tutorial-bundle\"><div class=\"front-matter\" data-complete-code-text=\"import pytch\n\ndef hello():\n    pass\n\"><h1>Boing</h1><p>A game.</p></div>"
        ));
        assert!(html.contains(
            "<div class=\"chapter-content\"><h2>Say hello</h2><p>Add a function.</p></div>"
        ));
        assert!(html.contains(
            "<div class=\"patch-container\" data-slug=\"add-hello\"><div class=\"patch\"><table>"
        ));
        assert!(html.contains("data-added-text=\"\ndef hello():\n    pass\n\""));
    }

    #[test]
    fn test_compile_document_unknown_commit() {
        let err = compile_document(&history("## One\n\n{{< commit missing >}}\n")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "narrative refers to commit `missing`, but no commit in the history carries `{#missing}`"
        );
    }

    #[test]
    fn test_render_summary() {
        let summary = render_summary("# Boing\n\nBounce the ball.\n").unwrap();
        assert_eq!(
            summary.to_html(),
            "<div class=\"tutorial-summary\"><h1>Boing</h1><p>Bounce the ball.</p></div>"
        );
    }
}
