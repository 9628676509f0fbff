//! HTML fragment parsing via `tl`.

use thiserror::Error;

use super::{Element, Node, is_raw_text_element, unescape};

#[derive(Debug, Error)]
#[error("cannot parse HTML fragment: {0}")]
pub struct ParseError(String);

/// Parse an HTML fragment into its top-level nodes.
///
/// Comments are dropped. Whitespace-only text is kept: deciding what is
/// relevant is the assembler's job, not the parser's.
pub fn parse_fragment(html: &str) -> Result<Vec<Node>, ParseError> {
    let dom = tl::parse(html, tl::ParserOptions::default())
        .map_err(|e| ParseError(format!("{e:?}")))?;
    let parser = dom.parser();

    Ok(dom
        .children()
        .iter()
        .filter_map(|handle| convert(*handle, parser, false))
        .collect())
}

fn convert(handle: tl::NodeHandle, parser: &tl::Parser, raw_text: bool) -> Option<Node> {
    match handle.get(parser)? {
        tl::Node::Tag(tag) => {
            let name = tag.name().as_utf8_str().to_lowercase();
            let mut elem = Element::new(name);

            let attrs = tag.attributes();
            let mut pairs: Vec<(String, String)> = attrs
                .iter()
                .map(|(key, value)| {
                    let value = value.map(|v| unescape(&v).into_owned()).unwrap_or_default();
                    (key.to_lowercase(), value)
                })
                .collect();
            // `id`/`class` are indexed separately by tl; make sure they survive.
            if !pairs.iter().any(|(k, _)| k == "class")
                && let Some(class) = attrs.class()
            {
                pairs.push(("class".into(), unescape(&class.as_utf8_str()).into_owned()));
            }
            if !pairs.iter().any(|(k, _)| k == "id")
                && let Some(id) = attrs.id()
            {
                pairs.push(("id".into(), unescape(&id.as_utf8_str()).into_owned()));
            }
            // tl keeps attributes in a hash map, so source order is lost anyway.
            pairs.sort_by(|(a, _), (b, _)| attr_rank(a).cmp(&attr_rank(b)).then_with(|| a.cmp(b)));
            for (key, value) in pairs {
                elem.set_attr(key, value);
            }

            let raw_children = is_raw_text_element(&elem.name);
            elem.children = tag
                .children()
                .top()
                .iter()
                .filter_map(|child| convert(*child, parser, raw_children))
                .collect();

            Some(Node::Element(elem))
        }
        tl::Node::Raw(bytes) => {
            let text = bytes.as_utf8_str();
            if raw_text {
                Some(Node::Text(text.into_owned()))
            } else {
                Some(Node::Text(unescape(&text).into_owned()))
            }
        }
        tl::Node::Comment(_) => None,
    }
}

fn attr_rank(name: &str) -> u8 {
    match name {
        "class" => 0,
        "id" => 1,
        _ => 2,
    }
}
