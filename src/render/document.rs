//! Document assembly: ordered (narrative, patch) steps → tutorial document.

use crate::diff::Patch;
use crate::html::{Element, Node, is_relevant};

use super::diff::render_patch;

/// One step of a tutorial, before assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    /// Narrative nodes, possibly including whitespace-only text.
    pub narrative: Option<Vec<Node>>,
    pub patch: Option<PatchSlot>,
}

impl Step {
    pub fn new(narrative: Option<Vec<Node>>, patch: Option<PatchSlot>) -> Self {
        Self { narrative, patch }
    }
}

/// A patch together with the narrative container it is shown in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSlot {
    pub container: Element,
    pub patch: Patch,
}

impl PatchSlot {
    /// Place a patch in a bare placeholder container.
    #[cfg(test)]
    pub fn new(patch: Patch) -> Self {
        Self::in_container(
            Element::new("div").with_attr("class", crate::html::PATCH_PLACEHOLDER_CLASS),
            patch,
        )
    }

    /// Place a patch in the placeholder element found in the narrative.
    ///
    /// The placeholder's own children (normally none) are discarded.
    pub fn in_container(mut container: Element, patch: Patch) -> Self {
        container.children.clear();
        Self { container, patch }
    }
}

/// A top-level block of the tutorial document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    FrontMatter {
        narrative: Vec<Node>,
        complete_code: String,
    },
    Chapter {
        narrative: Vec<Node>,
    },
    PatchBlock {
        container: Element,
        patch: Patch,
    },
}

impl Block {
    pub fn to_element(&self) -> Element {
        match self {
            Self::FrontMatter {
                narrative,
                complete_code,
            } => Element::new("div")
                .with_attr("class", "front-matter")
                .with_attr("data-complete-code-text", complete_code.as_str())
                .with_children(narrative.iter().cloned()),
            Self::Chapter { narrative } => Element::new("div")
                .with_attr("class", "chapter-content")
                .with_children(narrative.iter().cloned()),
            Self::PatchBlock { container, patch } => {
                container.clone().with_child(render_patch(patch))
            }
        }
    }
}

/// Assembled tutorial.
///
/// Only [`assemble`] builds one, so a front matter block, when present, is
/// always the first and only one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TutorialDocument {
    blocks: Vec<Block>,
}

impl TutorialDocument {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn to_element(&self) -> Element {
        Element::new("div")
            .with_attr("class", "tutorial-bundle")
            .with_children(self.blocks.iter().map(|b| b.to_element().into()))
    }

    /// Serialized form sent to viewers and written to archives.
    pub fn to_html(&self) -> String {
        self.to_element().to_html()
    }
}

/// Assemble steps into a document.
///
/// The first step becomes the front matter, recorded together with
/// `complete_code`. Every later step becomes a chapter, followed by a patch
/// block when the step has a patch. Step order is kept as given; a step whose
/// narrative is all whitespace still yields an (empty) chapter.
pub fn assemble(steps: impl IntoIterator<Item = Step>, complete_code: &str) -> TutorialDocument {
    let mut blocks = Vec::new();

    for (idx, step) in steps.into_iter().enumerate() {
        let narrative = relevant_nodes(step.narrative);
        if idx == 0 {
            blocks.push(Block::FrontMatter {
                narrative,
                complete_code: complete_code.to_string(),
            });
        } else {
            blocks.push(Block::Chapter { narrative });
        }

        if let Some(slot) = step.patch {
            blocks.push(Block::PatchBlock {
                container: slot.container,
                patch: slot.patch,
            });
        }
    }

    TutorialDocument { blocks }
}

fn relevant_nodes(narrative: Option<Vec<Node>>) -> Vec<Node> {
    narrative
        .unwrap_or_default()
        .into_iter()
        .filter(is_relevant)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::patch_between;

    fn paragraph(text: &str) -> Node {
        Element::new("p").with_child(Node::text(text)).into()
    }

    #[test]
    fn test_chapter_block() {
        let block = Block::Chapter {
            narrative: vec![paragraph("hello"), paragraph("world")],
        };
        assert_eq!(
            block.to_element().to_html(),
            "<div class=\"chapter-content\"><p>hello</p><p>world</p></div>"
        );
    }

    #[test]
    fn test_front_matter_block() {
        let doc = assemble(
            [Step::new(
                Some(vec![paragraph("hello"), Node::text("\n"), paragraph("world")]),
                None,
            )],
            "foo()",
        );
        assert_eq!(
            doc.blocks()[0].to_element().to_html(),
            "<div class=\"front-matter\" data-complete-code-text=\"foo()\"><p>hello</p><p>world</p></div>"
        );
    }

    #[test]
    fn test_complete_code_is_verbatim() {
        let code = "def f():\n    return \"<ok>\"\n";
        let doc = assemble([Step::default()], code);
        match &doc.blocks()[0] {
            Block::FrontMatter { complete_code, .. } => assert_eq!(complete_code, code),
            other => panic!("expected front matter, got {other:?}"),
        }
    }

    #[test]
    fn test_block_order_follows_steps() {
        let add_fn = patch_between("", "def hello():\n    pass\n");
        let rename = patch_between("x = 1\n", "count = 1\n");

        let doc = assemble(
            [
                Step::new(Some(vec![paragraph("intro")]), None),
                Step::new(
                    Some(vec![paragraph("add a function")]),
                    Some(PatchSlot::new(add_fn.clone())),
                ),
                Step::new(
                    Some(vec![paragraph("rename a variable")]),
                    Some(PatchSlot::new(rename.clone())),
                ),
            ],
            "",
        );

        let kinds: Vec<&str> = doc
            .blocks()
            .iter()
            .map(|b| match b {
                Block::FrontMatter { .. } => "front",
                Block::Chapter { .. } => "chapter",
                Block::PatchBlock { .. } => "patch",
            })
            .collect();
        assert_eq!(kinds, ["front", "chapter", "patch", "chapter", "patch"]);

        assert!(matches!(&doc.blocks()[2], Block::PatchBlock { patch, .. } if *patch == add_fn));
        assert!(matches!(&doc.blocks()[4], Block::PatchBlock { patch, .. } if *patch == rename));
    }

    #[test]
    fn test_whitespace_only_chapter_is_kept_empty() {
        let doc = assemble(
            [
                Step::default(),
                Step::new(
                    Some(vec![Node::text("\n  \n")]),
                    Some(PatchSlot::new(patch_between("", "a\n"))),
                ),
            ],
            "",
        );
        assert_eq!(doc.blocks().len(), 3);
        assert_eq!(doc.blocks()[1], Block::Chapter { narrative: vec![] });
    }

    #[test]
    fn test_step_without_patch_is_chapter_only() {
        let doc = assemble(
            [Step::default(), Step::new(Some(vec![paragraph("the end")]), None)],
            "",
        );
        assert_eq!(doc.blocks().len(), 2);
        assert!(matches!(doc.blocks()[1], Block::Chapter { .. }));
    }

    #[test]
    fn test_patch_block_keeps_placeholder_attributes() {
        let container = Element::new("div")
            .with_attr("class", "patch-container")
            .with_attr("data-slug", "add-fn")
            .with_child(Node::text("stale"));
        let block = Block::PatchBlock {
            container: PatchSlot::in_container(container, Patch::default()).container,
            patch: Patch::default(),
        };
        assert_eq!(
            block.to_element().to_html(),
            "<div class=\"patch-container\" data-slug=\"add-fn\"><div class=\"patch\"></div></div>"
        );
    }

    #[test]
    fn test_document_wrapper() {
        let doc = assemble([Step::default()], "x");
        assert_eq!(
            doc.to_html(),
            "<div class=\"tutorial-bundle\"><div class=\"front-matter\" data-complete-code-text=\"x\"></div></div>"
        );
    }

    #[test]
    fn test_no_steps_no_blocks() {
        assert!(assemble(Vec::new(), "").blocks().is_empty());
    }
}
