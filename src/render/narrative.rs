//! Narrative markdown → HTML nodes → tutorial steps.
//!
//! Authors mark where a commit's patch goes with a shortcode on its own line:
//!
//! ```text
//! Now give the alien something to say.
//!
//! {{< commit add-greeting >}}
//! ```
//!
//! The shortcode becomes an empty `patch-container` div before markdown
//! rendering, and [`split_steps`] later cuts the rendered narrative at those
//! placeholders.

use std::sync::LazyLock;

use pulldown_cmark::{Options, Parser, html};
use regex::Regex;
use rustc_hash::FxHashMap;

use super::RenderError;
use super::document::{PatchSlot, Step};
use crate::diff::Patch;
use crate::html::{Node, PATCH_PLACEHOLDER_CLASS, is_patch_placeholder, is_relevant};

/// Attribute naming the commit a placeholder stands for.
pub const SLUG_ATTR: &str = "data-slug";

static COMMIT_SHORTCODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*\{\{<[ \t]*commit[ \t]+([A-Za-z0-9_.\-]+)[ \t]*>\}\}[ \t]*$").unwrap()
});

fn markdown_options() -> Options {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    opts
}

/// Replace commit shortcodes with placeholder HTML blocks.
pub fn expand_shortcodes(markdown: &str) -> String {
    let replacement =
        format!("\n<div class=\"{PATCH_PLACEHOLDER_CLASS}\" {SLUG_ATTR}=\"$1\"></div>\n");
    COMMIT_SHORTCODE
        .replace_all(markdown, replacement.as_str())
        .into_owned()
}

/// Render narrative markdown (shortcodes included) to HTML.
pub fn markdown_to_html(markdown: &str) -> String {
    let expanded = expand_shortcodes(markdown);
    let mut out = String::with_capacity(expanded.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(&expanded, markdown_options()));
    out
}

/// Cut the top-level narrative nodes into steps.
///
/// - Front matter: everything before the first `<h2>` or placeholder.
/// - Each placeholder closes a step made of the nodes since the previous cut
///   and the placeholder's patch.
/// - Nodes after the last placeholder form a patch-less final step, but only
///   when something relevant is among them.
pub fn split_steps(
    nodes: Vec<Node>,
    patches: &FxHashMap<String, Patch>,
) -> Result<Vec<Step>, RenderError> {
    let mut nodes = nodes.into_iter().peekable();

    let mut front = Vec::new();
    while let Some(node) = nodes.next_if(|n| !starts_chapter(n)) {
        front.push(node);
    }
    let mut steps = vec![Step::new(Some(front), None)];

    let mut current = Vec::new();
    for node in nodes {
        let container = match node {
            Node::Element(e) if e.has_class(PATCH_PLACEHOLDER_CLASS) => e,
            other => {
                current.push(other);
                continue;
            }
        };

        let slug = container
            .attr(SLUG_ATTR)
            .filter(|s| !s.is_empty())
            .ok_or(RenderError::PlaceholderWithoutSlug)?;
        let patch = patches
            .get(slug)
            .cloned()
            .ok_or_else(|| RenderError::UnknownCommit(slug.to_string()))?;

        steps.push(Step::new(
            Some(std::mem::take(&mut current)),
            Some(PatchSlot::in_container(container, patch)),
        ));
    }

    if current.iter().any(is_relevant) {
        steps.push(Step::new(Some(current), None));
    }

    Ok(steps)
}

fn starts_chapter(node: &Node) -> bool {
    is_patch_placeholder(node) || node.as_element().is_some_and(|e| e.name == "h2")
}

/// Match commit shortcodes in narrative markdown, in order.
pub fn referenced_slugs(markdown: &str) -> Vec<String> {
    COMMIT_SHORTCODE
        .captures_iter(markdown)
        .map(|c| c[1].to_string())
        .collect()
}
