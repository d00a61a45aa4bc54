//! In-memory host surface.
//!
//! The document is a flat vector of units, one per offset: a character with
//! its attributes, or a mention embed. Block attributes live on the `'\n'`
//! unit that ends each line, matching the delta layout.

use std::collections::BTreeSet;

use agora_richtext::{
    AttrSet, Delta, FontBounds, MENTION_EMBED_TAG, Mention, Op, render_delta_markup,
    sanitize_delta,
};
use smol_str::SmolStr;

use crate::surface::{CursorRect, Format, HostSurface, Selection, SurfaceError};

const LINE_HEIGHT: f64 = 24.0;
const CHAR_WIDTH: f64 = 8.0;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Unit {
    Char(char, AttrSet),
    Embed { mention: Mention, marked: bool },
}

impl Unit {
    fn is_newline(&self) -> bool {
        matches!(self, Self::Char('\n', _))
    }

    /// Attributes of a non-newline character.
    fn inline_attrs(&self) -> Option<&AttrSet> {
        match self {
            Self::Char(c, attrs) if *c != '\n' => Some(attrs),
            _ => None,
        }
    }
}

fn inline_only(attrs: &AttrSet) -> AttrSet {
    AttrSet::default().with_inline(attrs)
}

/// Attributes two sets agree on.
fn common(a: &AttrSet, b: &AttrSet) -> AttrSet {
    fn keep<T: Clone + PartialEq + Default>(a: &T, b: &T) -> T {
        if a == b { a.clone() } else { T::default() }
    }
    AttrSet {
        bold: keep(&a.bold, &b.bold),
        italic: keep(&a.italic, &b.italic),
        underline: keep(&a.underline, &b.underline),
        strike: keep(&a.strike, &b.strike),
        color: keep(&a.color, &b.color),
        size: keep(&a.size, &b.size),
        link: keep(&a.link, &b.link),
        header: keep(&a.header, &b.header),
        list: keep(&a.list, &b.list),
        blockquote: keep(&a.blockquote, &b.blockquote),
        code_block: keep(&a.code_block, &b.code_block),
        align: keep(&a.align, &b.align),
        indent: keep(&a.indent, &b.indent),
    }
}

fn common_all<'a>(mut sets: impl Iterator<Item = &'a AttrSet>) -> AttrSet {
    let Some(first) = sets.next() else {
        return AttrSet::default();
    };
    sets.fold(first.clone(), |acc, attrs| common(&acc, attrs))
}

/// A complete [`HostSurface`] kept entirely in memory.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    units: Vec<Unit>,
    selection: Option<Selection>,
    /// Inline format for the next typed character.
    pending: Option<AttrSet>,
    embeds: BTreeSet<SmolStr>,
    font_bounds: FontBounds,
    read_only: bool,
    attached: bool,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessSurface {
    /// An empty, focused, editable surface with the mention embed registered.
    pub fn new() -> Self {
        Self {
            units: vec![Unit::Char('\n', AttrSet::default())],
            selection: Some(Selection::caret(0)),
            pending: None,
            embeds: BTreeSet::from([SmolStr::new_static(MENTION_EMBED_TAG)]),
            font_bounds: FontBounds::default(),
            read_only: false,
            attached: true,
        }
    }

    /// A surface that only accepts whole-document replacement.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            selection: None,
            ..Self::new()
        }
    }

    pub fn with_font_bounds(mut self, bounds: FontBounds) -> Self {
        self.font_bounds = bounds;
        self
    }

    /// Unregister every embed type.
    pub fn without_embeds(mut self) -> Self {
        self.embeds.clear();
        self
    }

    /// Simulate the host element going away.
    pub fn detach_host(&mut self) {
        self.attached = false;
    }

    /// Drop focus.
    pub fn blur(&mut self) {
        self.selection = None;
    }

    pub fn is_embed_marked(&self, index: usize) -> bool {
        matches!(self.units.get(index), Some(Unit::Embed { marked: true, .. }))
    }

    /// Type text at the selection the way a user would: the selection is
    /// replaced, the pending format applies and the caret ends up after the
    /// inserted text.
    pub fn type_text(&mut self, text: &str) -> Result<(), SurfaceError> {
        let selection = self.current_selection();
        let attributes = self.format_at(Selection::caret(selection.index));
        if !selection.is_collapsed() {
            self.delete_text(selection.index, selection.length)?;
        }
        self.insert_text(selection.index, text, &attributes)?;
        self.selection = Some(Selection::caret(selection.index + text.chars().count()));
        Ok(())
    }

    /// The host's default backspace behavior.
    pub fn press_backspace(&mut self) -> Result<(), SurfaceError> {
        let selection = self.current_selection();
        if !selection.is_collapsed() {
            self.delete_text(selection.index, selection.length)
        } else if selection.index > 0 {
            self.delete_text(selection.index - 1, 1)
        } else {
            Ok(())
        }
    }

    fn current_selection(&self) -> Selection {
        self.selection
            .unwrap_or_else(|| Selection::caret(self.last_index()))
    }

    /// Offset of the final terminator.
    fn last_index(&self) -> usize {
        self.units.len().saturating_sub(1)
    }

    fn ensure_editable(&self) -> Result<(), SurfaceError> {
        if self.read_only {
            return Err(SurfaceError::from("surface is read-only"));
        }
        Ok(())
    }

    /// Index of the newline ending the line that contains `index`.
    fn line_end(&self, index: usize) -> usize {
        self.units
            .iter()
            .enumerate()
            .skip(index)
            .find(|(_, unit)| unit.is_newline())
            .map(|(at, _)| at)
            .unwrap_or_else(|| self.last_index())
    }

    /// Newline indices of every line the range overlaps.
    fn line_ends(&self, range: Selection) -> Vec<usize> {
        let first = self.line_end(range.index.min(self.last_index()));
        let last_offset = range.end().saturating_sub(1).max(range.index);
        let last = self.line_end(last_offset.min(self.last_index()));
        (first..=last)
            .filter(|at| self.units[*at].is_newline())
            .collect()
    }

    fn clamp_range(&self, range: Selection) -> Selection {
        let index = range.index.min(self.last_index());
        let end = range.end().min(self.last_index()).max(index);
        Selection::new(index, end - index)
    }

    fn block_at(&self, index: usize) -> AttrSet {
        match &self.units[self.line_end(index)] {
            Unit::Char(_, attrs) => attrs.block(),
            Unit::Embed { .. } => AttrSet::default(),
        }
    }

    fn shift_selection_after_insert(&mut self, index: usize, count: usize) {
        if let Some(selection) = &mut self.selection {
            if selection.index >= index {
                selection.index += count;
            } else if selection.end() > index {
                selection.length += count;
            }
        }
    }

    fn insert_units(&mut self, index: usize, units: Vec<Unit>) {
        let index = index.min(self.last_index());
        let count = units.len();
        self.units.splice(index..index, units);
        self.pending = None;
        self.shift_selection_after_insert(index, count);
    }
}

impl HostSurface for HeadlessSurface {
    fn contents(&self) -> Delta {
        let mut ops: Vec<Op> = Vec::new();
        for unit in &self.units {
            match unit {
                Unit::Char(c, attrs) => match ops.last_mut() {
                    Some(Op::Text { insert, attributes }) if *attributes == *attrs => {
                        insert.push(*c);
                    }
                    _ => ops.push(Op::styled(c.to_string(), attrs.clone())),
                },
                Unit::Embed { mention, .. } => ops.push(Op::mention(mention.clone())),
            }
        }
        Delta::new(ops)
    }

    fn set_contents(&mut self, delta: &Delta) -> Result<(), SurfaceError> {
        let delta = sanitize_delta(delta, self.font_bounds);
        let mut units = Vec::with_capacity(delta.len());
        for op in delta.ops {
            match op {
                Op::Text { insert, attributes } => {
                    units.extend(insert.chars().map(|c| Unit::Char(c, attributes.clone())));
                }
                Op::Embed { insert } => units.push(Unit::Embed {
                    mention: insert.mention,
                    marked: false,
                }),
            }
        }
        self.units = units;
        self.pending = None;
        if let Some(selection) = self.selection {
            self.selection = Some(self.clamp_range(selection));
        }
        Ok(())
    }

    fn length(&self) -> usize {
        self.units.len()
    }

    fn selection(&self) -> Option<Selection> {
        self.selection
    }

    fn set_selection(&mut self, selection: Selection) {
        let selection = self.clamp_range(selection);
        if self.selection != Some(selection) {
            self.pending = None;
        }
        self.selection = Some(selection);
    }

    fn format_at(&self, range: Selection) -> AttrSet {
        let range = self.clamp_range(range);
        if range.is_collapsed() {
            let inline = match &self.pending {
                Some(pending) => pending.clone(),
                None => range
                    .index
                    .checked_sub(1)
                    .and_then(|before| self.units[before].inline_attrs())
                    .or_else(|| self.units[range.index].inline_attrs())
                    .map(inline_only)
                    .unwrap_or_default(),
            };
            return self.block_at(range.index).with_inline(&inline);
        }

        let inline = common_all(
            self.units[range.index..range.end()]
                .iter()
                .filter_map(Unit::inline_attrs),
        );
        let blocks: Vec<AttrSet> = self
            .line_ends(range)
            .into_iter()
            .map(|at| self.block_at(at))
            .collect();
        common_all(blocks.iter()).with_inline(&inline)
    }

    fn format(&mut self, range: Selection, format: &Format) -> Result<(), SurfaceError> {
        self.ensure_editable()?;
        let range = self.clamp_range(range);
        if format.is_block() {
            for at in self.line_ends(range) {
                if let Unit::Char(_, attrs) = &mut self.units[at] {
                    format.apply(attrs);
                }
            }
        } else if range.is_collapsed() {
            let mut pending = inline_only(&self.format_at(range));
            format.apply(&mut pending);
            self.pending = Some(pending);
        } else {
            for unit in &mut self.units[range.index..range.end()] {
                if let Unit::Char(c, attrs) = unit {
                    if *c != '\n' {
                        format.apply(attrs);
                    }
                }
            }
        }
        Ok(())
    }

    fn remove_format(&mut self, range: Selection) -> Result<(), SurfaceError> {
        self.ensure_editable()?;
        let range = self.clamp_range(range);
        if range.is_collapsed() {
            self.pending = Some(AttrSet::default());
            return Ok(());
        }
        let line_ends = self.line_ends(range);
        for (at, unit) in self.units.iter_mut().enumerate() {
            if let Unit::Char(c, attrs) = unit {
                let in_range = (range.index..range.end()).contains(&at) && *c != '\n';
                if in_range || line_ends.contains(&at) {
                    *attrs = AttrSet::default();
                }
            }
        }
        Ok(())
    }

    fn insert_text(
        &mut self,
        index: usize,
        text: &str,
        attributes: &AttrSet,
    ) -> Result<(), SurfaceError> {
        self.ensure_editable()?;
        if text.is_empty() {
            return Ok(());
        }
        let index = index.min(self.last_index());
        let block = self.block_at(index);
        let inline = inline_only(attributes);
        let units = text
            .chars()
            .map(|c| match c {
                '\n' => Unit::Char(c, block.clone()),
                _ => Unit::Char(c, inline.clone()),
            })
            .collect();
        self.insert_units(index, units);
        Ok(())
    }

    fn delete_text(&mut self, index: usize, length: usize) -> Result<(), SurfaceError> {
        self.ensure_editable()?;
        let range = self.clamp_range(Selection::new(index, length));
        if range.is_collapsed() {
            return Ok(());
        }
        self.units.drain(range.index..range.end());
        self.pending = None;
        if let Some(selection) = &mut self.selection {
            let start = selection.index;
            let end = selection.end();
            let shrink = |offset: usize| {
                if offset >= range.end() {
                    offset - range.length
                } else {
                    offset.min(range.index)
                }
            };
            let (start, end) = (shrink(start), shrink(end));
            *selection = Selection::new(start, end - start);
        }
        Ok(())
    }

    fn insert_embed(&mut self, index: usize, mention: &Mention) -> Result<(), SurfaceError> {
        self.ensure_editable()?;
        if !self.supports_embed(MENTION_EMBED_TAG) {
            return Err(SurfaceError::from("mention embed is not registered"));
        }
        let mention = mention
            .sanitized()
            .ok_or_else(|| SurfaceError::from("invalid mention"))?;
        self.insert_units(
            index,
            vec![Unit::Embed {
                mention,
                marked: false,
            }],
        );
        Ok(())
    }

    fn embed_at(&self, index: usize) -> Option<Mention> {
        match self.units.get(index) {
            Some(Unit::Embed { mention, .. }) => Some(mention.clone()),
            _ => None,
        }
    }

    fn set_embed_marked(&mut self, index: usize, marked: bool) {
        if let Some(Unit::Embed { marked: flag, .. }) = self.units.get_mut(index) {
            *flag = marked;
        }
    }

    fn supports_embed(&self, tag: &str) -> bool {
        self.embeds.contains(tag)
    }

    fn bounds(&self, index: usize) -> Option<CursorRect> {
        if index > self.last_index() {
            return None;
        }
        let before = &self.units[..index];
        let line = before.iter().filter(|unit| unit.is_newline()).count();
        let column = before.iter().rev().take_while(|unit| !unit.is_newline()).count();
        Some(CursorRect {
            left: column as f64 * CHAR_WIDTH,
            top: line as f64 * LINE_HEIGHT,
            height: LINE_HEIGHT,
        })
    }

    fn render_html(&self) -> Result<String, SurfaceError> {
        if !self.attached {
            return Err(SurfaceError::from("surface is detached"));
        }
        Ok(render_delta_markup(&self.contents(), self.font_bounds))
    }

    fn is_attached(&self) -> bool {
        self.attached
    }
}
