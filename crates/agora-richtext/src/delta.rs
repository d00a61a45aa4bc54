//! The live-editing representation: an ordered list of insert operations.
//!
//! Ops carry either styled text or an atomic mention embed. [`AttrSet`] is the
//! sparse serialized form of a [`Style`] plus the block-level attributes the
//! host surface keeps on line terminators.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

use crate::config::FontBounds;
use crate::style::{
    DEFAULT_COLOR, DEFAULT_FONT_SIZE, Style, numeric, parse_px, sanitize_http_url, truthy,
};

/// Tag the host surface registers the mention embed under.
pub const MENTION_EMBED_TAG: &str = "mentionEmbed";

fn is_false(value: &bool) -> bool {
    !*value
}

/// List kind for the `list` block attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Ordered,
    Bullet,
}

impl ListKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ordered" => Some(Self::Ordered),
            "bullet" => Some(Self::Bullet),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ordered => "ordered",
            Self::Bullet => "bullet",
        }
    }
}

/// Non-default alignment. Left alignment is the absence of the attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Center,
    Right,
    Justify,
}

impl Align {
    /// Parse an alignment value. `""` and `"left"` mean default alignment and
    /// return `None`, as do unknown values.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            "justify" => Some(Self::Justify),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "justify",
        }
    }
}

/// Deepest indent level the block whitelist accepts.
pub const MAX_INDENT: u8 = 8;

/// Sanitized, possibly partial attribute set of one text op.
///
/// Only values that differ from the default style are present, so a default
/// styled op serializes without an `attributes` key at all.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttrSet {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strike: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<SmolStr>,
    /// Font size as `"<n>px"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListKind>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub blockquote: bool,
    #[serde(default, rename = "code-block", skip_serializing_if = "is_false")]
    pub code_block: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indent: Option<u8>,
}

impl AttrSet {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Inline attributes for a style, omitting everything at its default.
    pub fn from_style(style: &Style) -> Self {
        Self {
            bold: style.bold,
            italic: style.italic,
            underline: style.underline,
            strike: style.strikethrough,
            color: style.has_custom_color().then(|| style.color.clone()),
            size: style
                .has_custom_size()
                .then(|| SmolStr::from(format!("{}px", style.font_size))),
            link: (!style.link.is_empty()).then(|| style.link.clone()),
            ..Self::default()
        }
    }

    /// The style these attributes describe, sanitized on the way out.
    pub fn to_style(&self, bounds: FontBounds) -> Style {
        Style {
            bold: self.bold,
            italic: self.italic,
            strikethrough: self.strike,
            underline: self.underline,
            color: self
                .color
                .clone()
                .filter(|color| !color.is_empty())
                .unwrap_or_else(|| SmolStr::new_static(DEFAULT_COLOR)),
            font_size: bounds.coerce(self.size.as_deref().and_then(parse_px)),
            link: self.link.as_deref().map(sanitize_http_url).unwrap_or_default(),
        }
    }

    /// Copy only the block-level attributes, dropping values outside the
    /// whitelist.
    pub fn block(&self) -> Self {
        Self {
            header: self.header.filter(|level| matches!(level, 1 | 2)),
            list: self.list,
            blockquote: self.blockquote,
            code_block: self.code_block,
            align: self.align,
            indent: self.indent.filter(|level| (1..=MAX_INDENT).contains(level)),
            ..Self::default()
        }
    }

    pub fn has_block(&self) -> bool {
        !self.block().is_empty()
    }

    /// Inline attributes re-derived through [`Style`], block attributes
    /// whitelisted.
    pub fn sanitized(&self, bounds: FontBounds) -> Self {
        self.block()
            .with_inline(&Self::from_style(&self.to_style(bounds)))
    }

    /// Block attributes of `self` combined with the inline attributes of `inline`.
    pub fn with_inline(self, inline: &AttrSet) -> Self {
        Self {
            bold: inline.bold,
            italic: inline.italic,
            underline: inline.underline,
            strike: inline.strike,
            color: inline.color.clone(),
            size: inline.size.clone(),
            link: inline.link.clone(),
            ..self
        }
    }

    /// Read attributes from untrusted JSON. Every field is coerced or dropped;
    /// this never fails.
    pub fn from_value(raw: Option<&Value>, bounds: FontBounds) -> Self {
        let Some(raw) = raw.filter(|raw| raw.is_object()) else {
            return Self::from_style(&Style::default_within(bounds));
        };

        let style = Style {
            bold: truthy(raw.get("bold")),
            italic: truthy(raw.get("italic")),
            strikethrough: truthy(raw.get("strike")) || truthy(raw.get("strikethrough")),
            underline: truthy(raw.get("underline")),
            color: raw
                .get("color")
                .and_then(Value::as_str)
                .filter(|color| !color.is_empty())
                .map(SmolStr::new)
                .unwrap_or_else(|| SmolStr::new_static(DEFAULT_COLOR)),
            font_size: bounds.coerce(raw.get("size").and_then(numeric)),
            link: raw
                .get("link")
                .and_then(Value::as_str)
                .map(sanitize_http_url)
                .unwrap_or_default(),
        };

        let block = Self {
            header: raw
                .get("header")
                .and_then(Value::as_u64)
                .and_then(|level| u8::try_from(level).ok()),
            list: raw.get("list").and_then(Value::as_str).and_then(ListKind::parse),
            blockquote: truthy(raw.get("blockquote")),
            code_block: truthy(raw.get("code-block")),
            align: raw.get("align").and_then(Value::as_str).and_then(Align::parse),
            indent: raw
                .get("indent")
                .and_then(Value::as_u64)
                .and_then(|level| u8::try_from(level).ok()),
            ..Self::default()
        };

        block.block().with_inline(&Self::from_style(&style))
    }
}

/// A user reference embedded as one atomic unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mention {
    pub uid: SmolStr,
    pub nickname: SmolStr,
}

impl Mention {
    /// Longest nickname kept, in chars.
    pub const MAX_NICKNAME_CHARS: usize = 20;

    /// Validated constructor. Returns `None` when the nickname is empty after
    /// whitespace collapsing.
    pub fn new(uid: impl AsRef<str>, nickname: impl AsRef<str>) -> Option<Self> {
        let nickname = clean_nickname(nickname.as_ref());
        if nickname.is_empty() {
            return None;
        }
        Some(Self {
            uid: SmolStr::new(uid.as_ref().trim()),
            nickname: SmolStr::from(nickname),
        })
    }

    /// Re-validate a mention that may have come back from storage.
    pub fn sanitized(&self) -> Option<Self> {
        Self::new(&self.uid, &self.nickname)
    }

    /// Lenient read of `{uid, nickname}` from untrusted JSON.
    pub fn from_value(raw: &Value) -> Option<Self> {
        let uid = match raw.get("uid") {
            Some(Value::String(uid)) => uid.clone(),
            Some(Value::Number(uid)) => uid.to_string(),
            _ => String::new(),
        };
        let nickname = raw.get("nickname").and_then(Value::as_str)?;
        Self::new(uid, nickname)
    }

    /// How the mention reads as plain text.
    pub fn display_text(&self) -> String {
        format!("@{}", self.nickname)
    }
}

fn clean_nickname(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(Mention::MAX_NICKNAME_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Payload of an embed insert: `{"mentionEmbed": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(rename = "mentionEmbed")]
    pub mention: Mention,
}

/// One insert operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Op {
    Text {
        insert: String,
        #[serde(default, skip_serializing_if = "AttrSet::is_empty")]
        attributes: AttrSet,
    },
    Embed {
        insert: Embed,
    },
}

impl Op {
    pub fn text(insert: impl Into<String>) -> Self {
        Self::Text {
            insert: insert.into(),
            attributes: AttrSet::default(),
        }
    }

    pub fn styled(insert: impl Into<String>, attributes: AttrSet) -> Self {
        Self::Text {
            insert: insert.into(),
            attributes,
        }
    }

    pub fn mention(mention: Mention) -> Self {
        Self::Embed {
            insert: Embed { mention },
        }
    }

    /// Length in offset units: chars for text, one for an embed.
    pub fn len(&self) -> usize {
        match self {
            Self::Text { insert, .. } => insert.chars().count(),
            Self::Embed { .. } => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_mention(&self) -> Option<&Mention> {
        match self {
            Self::Embed { insert } => Some(&insert.mention),
            Self::Text { .. } => None,
        }
    }
}

/// An ordered list of insert operations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub ops: Vec<Op>,
}

impl Delta {
    pub fn new(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    /// Length in offset units (embeds count as one).
    pub fn len(&self) -> usize {
        self.ops.iter().map(Op::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Concatenated text of the text ops, skipping embeds.
    pub fn text(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Text { insert, .. } => Some(insert.as_str()),
                Op::Embed { .. } => None,
            })
            .collect()
    }

    /// Whether the document terminator is present: the last op is text ending
    /// in a newline.
    pub fn is_terminated(&self) -> bool {
        matches!(self.ops.last(), Some(Op::Text { insert, .. }) if insert.ends_with('\n'))
    }

    pub fn mentions(&self) -> impl Iterator<Item = &Mention> {
        self.ops.iter().filter_map(Op::as_mention)
    }
}
