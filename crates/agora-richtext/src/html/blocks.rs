//! Line-oriented rendering of a delta, the way an editing surface lays it out.
//!
//! Each newline closes a line and carries that line's block attributes.
//! Consecutive list items of the same kind share one list wrapper.

use super::{HtmlRunOutput, RunFeature, RunOutput, style_features, write_wrapped};
use crate::codec::sanitize_delta;
use crate::config::FontBounds;
use crate::delta::{Align, AttrSet, Delta, ListKind, Mention, Op};
use crate::style::{Style, sanitize_http_url};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Header(u8),
    Blockquote,
    CodeBlock,
    ListItem(ListKind),
}

impl BlockKind {
    fn from_attrs(attrs: &AttrSet) -> Self {
        if attrs.code_block {
            Self::CodeBlock
        } else if let Some(level) = attrs.header {
            Self::Header(level)
        } else if let Some(list) = attrs.list {
            Self::ListItem(list)
        } else if attrs.blockquote {
            Self::Blockquote
        } else {
            Self::Paragraph
        }
    }

    fn list(self) -> Option<ListKind> {
        match self {
            Self::ListItem(list) => Some(list),
            _ => None,
        }
    }
}

/// One rendered line with its list bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub align: Option<Align>,
    pub indent: Option<u8>,
    /// List wrapper to open before this line.
    pub opens_list: Option<ListKind>,
    /// List wrapper to close after this line.
    pub closes_list: Option<ListKind>,
}

#[derive(Debug)]
enum Inline {
    Text(String, Style),
    Mention(Mention),
}

#[derive(Debug)]
struct Line {
    items: Vec<Inline>,
    attrs: AttrSet,
}

fn split_lines(delta: &Delta, bounds: FontBounds) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut items = Vec::new();
    for op in &delta.ops {
        match op {
            Op::Text { insert, attributes } => {
                for (index, piece) in insert.split('\n').enumerate() {
                    if index > 0 {
                        lines.push(Line {
                            items: std::mem::take(&mut items),
                            attrs: attributes.block(),
                        });
                    }
                    if !piece.is_empty() {
                        items.push(Inline::Text(piece.to_string(), attributes.to_style(bounds)));
                    }
                }
            }
            Op::Embed { insert } => items.push(Inline::Mention(insert.mention.clone())),
        }
    }
    if !items.is_empty() {
        lines.push(Line {
            items,
            attrs: AttrSet::default(),
        });
    }
    lines
}

/// Walk a delta line by line. The delta is sanitized first.
pub fn process_delta<O: RunOutput>(
    delta: &Delta,
    bounds: FontBounds,
    output: &mut O,
) -> Result<(), O::Error> {
    let lines = split_lines(&sanitize_delta(delta, bounds), bounds);
    let kinds: Vec<BlockKind> = lines
        .iter()
        .map(|line| BlockKind::from_attrs(&line.attrs))
        .collect();

    for (index, line) in lines.iter().enumerate() {
        let list = kinds[index].list();
        let previous = index.checked_sub(1).and_then(|prev| kinds[prev].list());
        let next = kinds.get(index + 1).and_then(|next| next.list());
        let block = Block {
            kind: kinds[index],
            align: line.attrs.align,
            indent: line.attrs.indent,
            opens_list: list.filter(|list| previous != Some(*list)),
            closes_list: list.filter(|list| next != Some(*list)),
        };

        output.start_block(&block)?;
        if line.items.is_empty() {
            // An empty line keeps its height.
            output.write_text("\n")?;
        }
        for item in &line.items {
            match item {
                Inline::Text(text, style) => {
                    let href = sanitize_http_url(&style.link);
                    write_wrapped(text, &style_features(style, &href), output)?;
                }
                Inline::Mention(mention) => {
                    let feature = RunFeature::Mention { uid: &mention.uid };
                    write_wrapped(&mention.display_text(), &[feature], output)?;
                }
            }
        }
        output.end_block(&block)?;
    }
    Ok(())
}

/// Render a delta to block-level markup.
pub fn render_delta_markup(delta: &Delta, bounds: FontBounds) -> String {
    let mut output = HtmlRunOutput::new(String::new());
    match process_delta(delta, bounds, &mut output) {
        Ok(()) => output.into_inner(),
        Err(error) => {
            tracing::warn!(?error, "delta render failed");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(delta: &Delta) -> String {
        render_delta_markup(delta, FontBounds::default())
    }

    #[test]
    fn test_paragraphs() {
        let delta = Delta::new(vec![Op::text("one\n\ntwo\n")]);
        assert_eq!(render(&delta), "<p>one</p><p><br></p><p>two</p>");
    }

    #[test]
    fn test_header_and_alignment() {
        let header = AttrSet {
            header: Some(1),
            align: Some(Align::Center),
            ..AttrSet::default()
        };
        let delta = Delta::new(vec![Op::text("Title"), Op::styled("\n", header)]);
        assert_eq!(render(&delta), "<h1 class=\"ql-align-center\">Title</h1>");
    }

    #[test]
    fn test_list_items_share_wrapper() {
        let bullet = AttrSet {
            list: Some(ListKind::Bullet),
            ..AttrSet::default()
        };
        let ordered = AttrSet {
            list: Some(ListKind::Ordered),
            ..AttrSet::default()
        };
        let delta = Delta::new(vec![
            Op::text("a"),
            Op::styled("\n", bullet.clone()),
            Op::text("b"),
            Op::styled("\n", bullet),
            Op::text("c"),
            Op::styled("\n", ordered),
        ]);
        assert_eq!(
            render(&delta),
            "<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol>"
        );
    }

    #[test]
    fn test_mention_renders_as_span() {
        let delta = Delta::new(vec![
            Op::text("hi "),
            Op::mention(Mention::new("u<1>", "bob").unwrap()),
            Op::text("\n"),
        ]);
        assert_eq!(
            render(&delta),
            "<p>hi <span class=\"mention\" data-uid=\"u&lt;1&gt;\">@bob</span></p>"
        );
    }
}
