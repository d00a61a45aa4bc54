//! The host rich-text surface the controller drives.
//!
//! A host surface owns the live document, the selection and the embed
//! registry. The browser adapter implements [`HostSurface`] over the real
//! editing widget; [`crate::HeadlessSurface`] implements it in memory for
//! rendering, tooling and tests.

use agora_richtext::{Align, AttrSet, DEFAULT_COLOR, DEFAULT_FONT_SIZE, Delta, ListKind, Mention};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Error type for host surface operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceError(pub String);

impl std::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SurfaceError {}

impl From<&str> for SurfaceError {
    fn from(s: &str) -> Self {
        SurfaceError(s.to_string())
    }
}

impl From<String> for SurfaceError {
    fn from(s: String) -> Self {
        SurfaceError(s)
    }
}

/// A selection in offset units (chars, with each embed counting as one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub index: usize,
    pub length: usize,
}

impl Selection {
    pub fn new(index: usize, length: usize) -> Self {
        Self { index, length }
    }

    pub fn caret(index: usize) -> Self {
        Self { index, length: 0 }
    }

    pub fn is_collapsed(&self) -> bool {
        self.length == 0
    }

    pub fn end(&self) -> usize {
        self.index + self.length
    }
}

/// Screen geometry of a caret position, relative to the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorRect {
    pub left: f64,
    pub top: f64,
    pub height: f64,
}

/// One attribute change applied over a range.
///
/// Inline formats touch characters; block formats touch the line terminators
/// of every line the range overlaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    Bold(bool),
    Italic(bool),
    Underline(bool),
    Strike(bool),
    Color(Option<SmolStr>),
    Size(Option<u32>),
    Link(Option<String>),
    Header(Option<u8>),
    List(Option<ListKind>),
    Blockquote(bool),
    CodeBlock(bool),
    Align(Option<Align>),
    Indent(Option<u8>),
}

impl Format {
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Self::Header(_)
                | Self::List(_)
                | Self::Blockquote(_)
                | Self::CodeBlock(_)
                | Self::Align(_)
                | Self::Indent(_)
        )
    }

    /// Apply this change to an attribute set, keeping it sparse.
    ///
    /// Header, list, blockquote and code block are exclusive line kinds, so
    /// turning one on turns the others off.
    pub fn apply(&self, attrs: &mut AttrSet) {
        let exclusive = |attrs: &mut AttrSet| {
            attrs.header = None;
            attrs.list = None;
            attrs.blockquote = false;
            attrs.code_block = false;
        };
        match self {
            Self::Bold(on) => attrs.bold = *on,
            Self::Italic(on) => attrs.italic = *on,
            Self::Underline(on) => attrs.underline = *on,
            Self::Strike(on) => attrs.strike = *on,
            Self::Color(color) => {
                attrs.color = color
                    .clone()
                    .filter(|color| !color.is_empty() && color != DEFAULT_COLOR);
            }
            Self::Size(size) => {
                attrs.size = size
                    .filter(|size| *size != DEFAULT_FONT_SIZE)
                    .map(|size| SmolStr::from(format!("{size}px")));
            }
            Self::Link(link) => attrs.link = link.clone().filter(|link| !link.is_empty()),
            Self::Header(level) => {
                if level.is_some() {
                    exclusive(attrs);
                }
                attrs.header = *level;
            }
            Self::List(kind) => {
                if kind.is_some() {
                    exclusive(attrs);
                }
                attrs.list = *kind;
            }
            Self::Blockquote(on) => {
                if *on {
                    exclusive(attrs);
                }
                attrs.blockquote = *on;
            }
            Self::CodeBlock(on) => {
                if *on {
                    exclusive(attrs);
                }
                attrs.code_block = *on;
            }
            Self::Align(align) => attrs.align = *align,
            Self::Indent(level) => attrs.indent = level.filter(|level| *level > 0),
        }
    }
}

/// A live rich-text editing surface.
///
/// Offsets count chars, and an embed occupies exactly one offset. The
/// document always ends in a newline, so [`HostSurface::length`] is at least
/// one.
pub trait HostSurface {
    /// Full contents as a delta.
    fn contents(&self) -> Delta;

    /// Replace the whole document.
    fn set_contents(&mut self, delta: &Delta) -> Result<(), SurfaceError>;

    /// Document length in offset units, terminator included.
    fn length(&self) -> usize;

    /// Current selection, or `None` when the surface is not focused.
    fn selection(&self) -> Option<Selection>;

    fn set_selection(&mut self, selection: Selection);

    /// Attributes shared by the whole range.
    ///
    /// For a collapsed range this is what the next typed character would get,
    /// including any pending format set through [`HostSurface::format`].
    fn format_at(&self, range: Selection) -> AttrSet;

    /// Apply a format to a range. A collapsed range sets the pending format
    /// for the next typed character (inline formats) or formats the caret's
    /// line (block formats).
    fn format(&mut self, range: Selection, format: &Format) -> Result<(), SurfaceError>;

    /// Clear inline and block formatting in a range. A collapsed range resets
    /// the pending format instead.
    fn remove_format(&mut self, range: Selection) -> Result<(), SurfaceError>;

    fn insert_text(
        &mut self,
        index: usize,
        text: &str,
        attributes: &AttrSet,
    ) -> Result<(), SurfaceError>;

    fn delete_text(&mut self, index: usize, length: usize) -> Result<(), SurfaceError>;

    fn insert_embed(&mut self, index: usize, mention: &Mention) -> Result<(), SurfaceError>;

    /// The mention embedded at `index`, if there is one.
    fn embed_at(&self, index: usize) -> Option<Mention>;

    /// Toggle the visual "about to be deleted" marker on an embed.
    fn set_embed_marked(&mut self, index: usize, marked: bool);

    /// Whether an embed type is registered with this surface.
    fn supports_embed(&self, tag: &str) -> bool;

    fn bounds(&self, index: usize) -> Option<CursorRect>;

    /// The surface's own read-only rendering of its contents.
    fn render_html(&self) -> Result<String, SurfaceError>;

    /// Whether the surface is still attached to its host.
    fn is_attached(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_format_stays_sparse() {
        let mut attrs = AttrSet::default();
        Format::Size(Some(20)).apply(&mut attrs);
        assert_eq!(attrs.size.as_deref(), Some("20px"));
        Format::Size(Some(DEFAULT_FONT_SIZE)).apply(&mut attrs);
        assert_eq!(attrs.size, None);
    }

    #[test]
    fn test_line_kinds_are_exclusive() {
        let mut attrs = AttrSet::default();
        Format::Header(Some(1)).apply(&mut attrs);
        Format::Align(Some(Align::Center)).apply(&mut attrs);
        Format::List(Some(ListKind::Bullet)).apply(&mut attrs);
        assert_eq!(attrs.header, None);
        assert_eq!(attrs.list, Some(ListKind::Bullet));
        assert_eq!(attrs.align, Some(Align::Center));
    }

    #[test]
    fn test_default_color_clears() {
        let mut attrs = AttrSet::default();
        Format::Color(Some("red".into())).apply(&mut attrs);
        assert_eq!(attrs.color.as_deref(), Some("red"));
        Format::Color(Some(DEFAULT_COLOR.into())).apply(&mut attrs);
        assert_eq!(attrs.color, None);
    }
}
