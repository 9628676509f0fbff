//! Owned HTML fragment model.
//!
//! Narrative markup is parsed into [`Node`] trees (see [`parse_fragment`]),
//! filtered and regrouped by the document assembler, and serialized back with
//! [`Node::to_html`]. Text is stored unescaped; escaping happens only on output.

mod escape;
mod parse;

pub use escape::{escape, escape_attr, is_raw_text_element, is_void_element, unescape};
pub use parse::{ParseError, parse_fragment};

use std::fmt;

/// Class marking a narrative container as the slot for a commit's patch.
pub const PATCH_PLACEHOLDER_CLASS: &str = "patch-container";

/// A node in an HTML fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(e) => Some(e),
            Self::Text(_) => None,
        }
    }

    /// Serialize to an HTML string.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out, false);
        out
    }

    fn write_html(&self, out: &mut String, raw_text: bool) {
        match self {
            Self::Text(text) if raw_text => out.push_str(text),
            Self::Text(text) => out.push_str(&escape(text)),
            Self::Element(elem) => elem.write_html(out),
        }
    }
}

impl From<Element> for Node {
    fn from(elem: Element) -> Self {
        Self::Element(elem)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

/// An element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: set an attribute (replacing an existing one of the same name).
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder: append a child.
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Builder: append children.
    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Space-separated entries of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }

        if is_void_element(&self.name) {
            out.push_str("/>");
            return;
        }
        out.push('>');

        let raw_text = is_raw_text_element(&self.name);
        for child in &self.children {
            child.write_html(out, raw_text);
        }

        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

/// Whether a narrative node carries meaning.
///
/// Whitespace-only text is formatting left over from the markdown renderer;
/// elements always count, even when empty.
pub fn is_relevant(node: &Node) -> bool {
    match node {
        Node::Element(_) => true,
        Node::Text(text) => !text.trim().is_empty(),
    }
}

/// Whether a node is a patch placeholder (has the marker class anywhere in
/// its class list).
pub fn is_patch_placeholder(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|e| e.has_class(PATCH_PLACEHOLDER_CLASS))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_node(html: &str) -> Node {
        parse_fragment(html).unwrap().into_iter().next().unwrap()
    }

    #[test]
    fn test_node_is_relevant() {
        let cases = [
            ("<p>Hello</p>", true),
            ("   Hello", true),
            ("Hello       ", true),
            ("    ", false),
            ("\n\nfoo\n", true),
        ];
        for (html, expected) in cases {
            assert_eq!(is_relevant(&first_node(html)), expected, "{html:?}");
        }
    }

    #[test]
    fn test_empty_element_is_relevant() {
        assert!(is_relevant(&Node::Element(Element::new("p"))));
        assert!(!is_relevant(&Node::text("\n\t ")));
    }

    #[test]
    fn test_node_is_patch() {
        let cases = [
            ("<p>Hello</p>", false),
            ("<div><p>Hello</p></div>", false),
            ("<div class=\"banana\"><p>Hello</p></div>", false),
            ("<div class=\"patch-container\"><p>Hello</p></div>", true),
            ("<div class=\"patch-container banana\"><p>Hello</p></div>", true),
            ("<div class=\"banana  patch-container\"></div>", true),
            ("<div class=\"patch-containers\"></div>", false),
        ];
        for (html, expected) in cases {
            assert_eq!(is_patch_placeholder(&first_node(html)), expected, "{html:?}");
        }
    }

    #[test]
    fn test_text_node_is_never_patch() {
        assert!(!is_patch_placeholder(&Node::text("patch-container")));
    }

    #[test]
    fn test_serialize_escapes_text_and_attrs() {
        let elem = Element::new("div")
            .with_attr("data-x", "a\"b")
            .with_child(Node::text("1 < 2 & 3"));
        assert_eq!(
            elem.to_html(),
            "<div data-x=\"a&quot;b\">1 &lt; 2 &amp; 3</div>"
        );
    }

    #[test]
    fn test_serialize_void_and_raw_text() {
        let elem = Element::new("p")
            .with_child(Element::new("br"))
            .with_child(Element::new("script").with_child(Node::text("a < b")));
        assert_eq!(elem.to_html(), "<p><br/><script>a < b</script></p>");
    }

    #[test]
    fn test_set_attr_replaces() {
        let mut elem = Element::new("div").with_attr("class", "a");
        elem.set_attr("class", "b");
        assert_eq!(elem.attrs, vec![("class".to_string(), "b".to_string())]);
    }
}
