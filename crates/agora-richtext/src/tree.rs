//! Flattening a generic styled-content tree into a [`Payload`].
//!
//! This is the ingestion path for pasted and legacy content, where the source
//! is an element tree rather than an operation log.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::config::FontBounds;
use crate::runs::{Payload, RunBuilder};
use crate::style::{Style, parse_px, sanitize_http_url};

static INLINE_COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|;)\s*color\s*:\s*([^;]+)").expect("static regex")
});

static INLINE_FONT_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|;)\s*font-size\s*:\s*([0-9]+(?:\.[0-9]+)?)\s*px").expect("static regex")
});

/// A node of a styled content tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentNode {
    Text {
        text: String,
    },
    Element {
        tag: SmolStr,
        #[serde(default)]
        attrs: BTreeMap<SmolStr, String>,
        #[serde(default)]
        children: Vec<ContentNode>,
    },
}

impl ContentNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn element(tag: &str, children: Vec<ContentNode>) -> Self {
        Self::Element {
            tag: SmolStr::new(tag),
            attrs: BTreeMap::new(),
            children,
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        if let Self::Element { attrs, .. } = &mut self {
            attrs.insert(SmolStr::new(name), value.into());
        }
        self
    }
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "div" | "li" | "blockquote" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
    )
}

fn is_skipped(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "template")
}

/// Serialize a tree with the default font bounds.
pub fn serialize_tree(node: &ContentNode) -> Payload {
    serialize_tree_with(node, FontBounds::default())
}

/// Depth-first walk producing text and coalesced runs.
pub fn serialize_tree_with(node: &ContentNode, bounds: FontBounds) -> Payload {
    let mut builder = RunBuilder::new();
    walk(node, &Style::default_within(bounds), false, bounds, &mut builder);
    builder.finish()
}

fn walk(
    node: &ContentNode,
    inherited: &Style,
    has_next_sibling: bool,
    bounds: FontBounds,
    out: &mut RunBuilder,
) {
    let (tag, attrs, children) = match node {
        ContentNode::Text { text } => {
            out.push(text, inherited);
            return;
        }
        ContentNode::Element {
            tag,
            attrs,
            children,
        } => (tag.to_ascii_lowercase(), attrs, children),
    };

    if is_skipped(&tag) {
        return;
    }

    let style = element_style(&tag, attrs, inherited, bounds);
    if tag == "br" {
        out.push("\n", &style);
        return;
    }

    for (index, child) in children.iter().enumerate() {
        walk(child, &style, index + 1 < children.len(), bounds, out);
    }

    if is_block(&tag) && has_next_sibling {
        out.push("\n", &style);
    }
}

fn element_style(
    tag: &str,
    attrs: &BTreeMap<SmolStr, String>,
    inherited: &Style,
    bounds: FontBounds,
) -> Style {
    let mut style = inherited.clone();
    match tag {
        "b" | "strong" => style.bold = true,
        "i" | "em" => style.italic = true,
        "s" | "strike" | "del" => style.strikethrough = true,
        "u" | "ins" => style.underline = true,
        "a" => {
            style.link = attribute(attrs, "href")
                .map(sanitize_http_url)
                .unwrap_or_default();
        }
        _ => {}
    }

    if let Some(inline) = attribute(attrs, "style") {
        if let Some(color) = INLINE_COLOR_RE
            .captures(inline)
            .and_then(|caps| caps.get(1))
            .map(|color| color.as_str().trim())
            .filter(|color| !color.is_empty())
        {
            style.color = SmolStr::new(color);
        }
        if let Some(size) = INLINE_FONT_SIZE_RE
            .captures(inline)
            .and_then(|caps| caps.get(1))
            .and_then(|size| parse_px(size.as_str()))
        {
            style.font_size = bounds.coerce(Some(size));
        }
    }
    style
}

/// Attribute lookup by case-insensitive name.
fn attribute<'a>(attrs: &'a BTreeMap<SmolStr, String>, name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runs::Run;

    fn el(tag: &str, children: Vec<ContentNode>) -> ContentNode {
        ContentNode::element(tag, children)
    }

    fn text(text: &str) -> ContentNode {
        ContentNode::text(text)
    }

    #[test]
    fn test_inline_formatting() {
        let tree = el(
            "div",
            vec![
                text("plain "),
                el("STRONG", vec![text("bold "), el("em", vec![text("both")])]),
            ],
        );
        let payload = serialize_tree(&tree);
        assert_eq!(payload.text, "plain bold both");
        assert_eq!(payload.runs.len(), 3);
        assert!(payload.runs[1].style.bold && !payload.runs[1].style.italic);
        assert!(payload.runs[2].style.bold && payload.runs[2].style.italic);
        assert_eq!(payload.check(), Ok(()));
    }

    #[test]
    fn test_blocks_separated_by_newlines() {
        let tree = el(
            "div",
            vec![
                el("p", vec![text("one")]),
                el("p", vec![text("two")]),
                el("p", vec![text("three")]),
            ],
        );
        let payload = serialize_tree(&tree);
        assert_eq!(payload.text, "one\ntwo\nthree");
        assert_eq!(payload.runs, vec![Run::new(0, 13, Style::default())]);
    }

    #[test]
    fn test_br_emits_newline() {
        let tree = el("p", vec![text("a"), el("br", vec![text("ignored")]), text("b")]);
        assert_eq!(serialize_tree(&tree).text, "a\nb");
    }

    #[test]
    fn test_link_href_is_sanitized() {
        let tree = el(
            "p",
            vec![
                el("a", vec![text("ok")]).with_attr("HREF", "https://example.com"),
                el("a", vec![text("bad")]).with_attr("href", "javascript:alert(1)"),
            ],
        );
        let payload = serialize_tree(&tree);
        assert_eq!(payload.runs[0].style.link, "https://example.com");
        assert_eq!(payload.runs[1].style.link, "");
    }

    #[test]
    fn test_nested_unsafe_anchor_clears_outer_link() {
        let tree = el(
            "a",
            vec![
                text("ok "),
                el("a", vec![text("bad")]).with_attr("href", "javascript:alert(1)"),
            ],
        )
        .with_attr("href", "https://ok.example");
        let payload = serialize_tree(&tree);
        assert_eq!(payload.text, "ok bad");
        assert_eq!(payload.runs.len(), 2);
        assert_eq!(payload.runs[0].style.link, "https://ok.example");
        assert_eq!(payload.runs[1].style.link, "");
    }

    #[test]
    fn test_inline_style_overrides() {
        let tree = el(
            "span",
            vec![text("big red")],
        )
        .with_attr("style", "font-weight: bold; color: #ff0000; font-size: 200px");
        let payload = serialize_tree(&tree);
        let style = &payload.runs[0].style;
        assert_eq!(style.color, "#ff0000");
        assert_eq!(style.font_size, 48);
        assert!(!style.bold);
    }

    #[test]
    fn test_malformed_inline_style_ignored() {
        let tree = el("span", vec![text("x")]).with_attr("style", "color:; font-size: large");
        assert_eq!(serialize_tree(&tree).runs[0].style, Style::default());
    }

    #[test]
    fn test_script_subtree_skipped() {
        let tree = el(
            "div",
            vec![text("a"), el("script", vec![text("alert(1)")]), text("b")],
        );
        assert_eq!(serialize_tree(&tree).text, "ab");
    }

    #[test]
    fn test_tree_from_json() {
        let tree: ContentNode = serde_json::from_str(
            r#"{"kind":"element","tag":"b","children":[{"kind":"text","text":"hi"}]}"#,
        )
        .unwrap();
        let payload = serialize_tree(&tree);
        assert_eq!(payload.text, "hi");
        assert!(payload.runs[0].style.bold);
    }
}
