use pulldown_cmark_escape::{StrWrite, escape_href, escape_html};

use super::{Block, BlockKind, RunFeature, RunOutput};
use crate::delta::ListKind;

pub struct HtmlRunOutput<W: StrWrite> {
    writer: W,
}

impl<W: StrWrite> HtmlRunOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_block_classes(&mut self, block: &Block) -> Result<(), W::Error> {
        let mut classes = Vec::new();
        if let Some(align) = block.align {
            classes.push(format!("ql-align-{}", align.as_str()));
        }
        if let Some(indent) = block.indent {
            classes.push(format!("ql-indent-{indent}"));
        }
        if classes.is_empty() {
            return Ok(());
        }
        self.writer.write_str(" class=\"")?;
        escape_html(&mut self.writer, &classes.join(" "))?;
        self.writer.write_str("\"")
    }
}

fn block_tag(kind: BlockKind) -> &'static str {
    match kind {
        BlockKind::Paragraph => "p",
        BlockKind::Header(1) => "h1",
        BlockKind::Header(_) => "h2",
        BlockKind::Blockquote => "blockquote",
        BlockKind::CodeBlock => "pre",
        BlockKind::ListItem(_) => "li",
    }
}

fn list_tag(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Ordered => "ol",
        ListKind::Bullet => "ul",
    }
}

impl<W: StrWrite> RunOutput for HtmlRunOutput<W> {
    type Error = W::Error;

    fn write_text(&mut self, text: &str) -> Result<(), Self::Error> {
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                self.writer.write_str("<br>")?;
            }
            escape_html(&mut self.writer, line)?;
        }
        Ok(())
    }

    fn start_feature(&mut self, feature: &RunFeature<'_>) -> Result<(), Self::Error> {
        match feature {
            RunFeature::Bold => self.writer.write_str("<strong>"),
            RunFeature::Italic => self.writer.write_str("<em>"),
            RunFeature::Strikethrough => self.writer.write_str("<s>"),
            RunFeature::Underline => self.writer.write_str("<u>"),
            RunFeature::Span { color, font_size } => {
                let mut declarations = Vec::with_capacity(2);
                if let Some(color) = color {
                    declarations.push(format!("color: {color}"));
                }
                if let Some(size) = font_size {
                    declarations.push(format!("font-size: {size}px"));
                }
                if declarations.is_empty() {
                    return self.writer.write_str("<span>");
                }
                self.writer.write_str("<span style=\"")?;
                escape_html(&mut self.writer, &declarations.join("; "))?;
                self.writer.write_str("\">")
            }
            RunFeature::Link { href } => {
                self.writer.write_str("<a href=\"")?;
                escape_href(&mut self.writer, href)?;
                self.writer
                    .write_str("\" target=\"_blank\" rel=\"noopener noreferrer\">")
            }
            RunFeature::Mention { uid } => {
                self.writer.write_str("<span class=\"mention\" data-uid=\"")?;
                escape_html(&mut self.writer, uid)?;
                self.writer.write_str("\">")
            }
        }
    }

    fn end_feature(&mut self, feature: &RunFeature<'_>) -> Result<(), Self::Error> {
        match feature {
            RunFeature::Bold => self.writer.write_str("</strong>"),
            RunFeature::Italic => self.writer.write_str("</em>"),
            RunFeature::Strikethrough => self.writer.write_str("</s>"),
            RunFeature::Underline => self.writer.write_str("</u>"),
            RunFeature::Link { .. } => self.writer.write_str("</a>"),
            RunFeature::Span { .. } | RunFeature::Mention { .. } => {
                self.writer.write_str("</span>")
            }
        }
    }

    fn start_block(&mut self, block: &Block) -> Result<(), Self::Error> {
        if let Some(list) = block.opens_list {
            self.writer.write_str("<")?;
            self.writer.write_str(list_tag(list))?;
            self.writer.write_str(">")?;
        }
        self.writer.write_str("<")?;
        self.writer.write_str(block_tag(block.kind))?;
        self.write_block_classes(block)?;
        self.writer.write_str(">")
    }

    fn end_block(&mut self, block: &Block) -> Result<(), Self::Error> {
        self.writer.write_str("</")?;
        self.writer.write_str(block_tag(block.kind))?;
        self.writer.write_str(">")?;
        if let Some(list) = block.closes_list {
            self.writer.write_str("</")?;
            self.writer.write_str(list_tag(list))?;
            self.writer.write_str(">")?;
        }
        Ok(())
    }
}
