//! The editor command controller.
//!
//! [`EditorController`] is bound to exactly one live [`HostSurface`] and is
//! the only code that touches it. Loading and saving go through the codec,
//! toolbar commands become surface formats with toggle semantics, and the
//! mention-delete state machine is driven from the host's key, selection and
//! content events.

use agora_richtext::{
    AttrSet, Delta, FontBounds, MAX_INDENT, MENTION_EMBED_TAG, Mention, Payload, StoredContent,
    delta_like_to_delta, delta_to_payload, payload_to_delta, render_payload_to_html,
    sanitize_css_color, sanitize_delta, sanitize_http_url,
};
use serde_json::Value;

use crate::actions::{Key, KeydownResult};
use crate::commands::FormatCommand;
use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::mention::{MentionDeleteState, MentionEffect, MentionEvent, Transition, transition};
use crate::surface::{Format, HostSurface, Selection};

/// Direction for the font grow/shrink buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStep {
    Up,
    Down,
}

pub struct EditorController<S: HostSurface> {
    surface: S,
    config: EditorConfig,
    mention_state: MentionDeleteState,
    last_selection: Selection,
    font_size: u32,
}

impl<S: HostSurface> EditorController<S> {
    pub fn bind(surface: S, config: EditorConfig) -> Self {
        let mut controller = Self {
            last_selection: surface.selection().unwrap_or_default(),
            surface,
            config,
            mention_state: MentionDeleteState::Idle,
            font_size: config.content.font_bounds.coerce(None),
        };
        controller.refresh_font_size();
        tracing::debug!(length = controller.surface.length(), "editor bound");
        controller
    }

    /// Release the surface, clearing any mention mark left behind.
    pub fn detach(mut self) -> S {
        if let Some(index) = self.mention_state.armed_index() {
            self.surface.set_embed_marked(index, false);
        }
        self.mention_state = MentionDeleteState::Idle;
        self.surface
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Direct surface access for host adapters. Edits made through it must be
    /// reported with [`EditorController::handle_content_change`].
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn mention_state(&self) -> MentionDeleteState {
        self.mention_state
    }

    fn bounds(&self) -> FontBounds {
        self.config.content.font_bounds
    }

    /// The surface selection, or the last one seen while it had focus.
    pub fn selection(&self) -> Selection {
        self.surface.selection().unwrap_or(self.last_selection)
    }

    fn move_caret(&mut self, index: usize) {
        let caret = Selection::caret(index);
        self.surface.set_selection(caret);
        self.last_selection = self.surface.selection().unwrap_or(caret);
    }

    /// Largest valid offset for an edit (the position of the terminator).
    fn max_index(&self) -> usize {
        self.surface.length().saturating_sub(1)
    }

    fn clamp_range(&self, start: usize, length: usize) -> Selection {
        let start = start.min(self.max_index());
        Selection::new(start, length.min(self.max_index() - start))
    }

    fn step(&mut self, event: MentionEvent) -> Transition {
        let next = transition(self.mention_state, event);
        if let Some(index) = next.disarmed {
            self.surface.set_embed_marked(index, false);
        }
        self.mention_state = next.next;
        next
    }

    fn refresh_font_size(&mut self) {
        let range = self.selection();
        self.font_size = self.surface.format_at(range).to_style(self.bounds()).font_size;
    }

    // === Formatting ===

    /// Apply a toolbar command. Every command except `Clean` toggles: running
    /// it on a selection that already has the format removes it.
    pub fn exec(&mut self, command: FormatCommand) -> Result<(), EditorError> {
        let range = self.selection();
        let current = self.surface.format_at(range);
        let format = match command {
            FormatCommand::Bold => Format::Bold(!current.bold),
            FormatCommand::Italic => Format::Italic(!current.italic),
            FormatCommand::Underline => Format::Underline(!current.underline),
            FormatCommand::Strike => Format::Strike(!current.strike),
            FormatCommand::Header(level) => {
                Format::Header((current.header != Some(level)).then_some(level))
            }
            FormatCommand::List(kind) => Format::List((current.list != Some(kind)).then_some(kind)),
            FormatCommand::Align(align) => {
                Format::Align(if current.align == align { None } else { align })
            }
            FormatCommand::Blockquote => Format::Blockquote(!current.blockquote),
            FormatCommand::CodeBlock => Format::CodeBlock(!current.code_block),
            FormatCommand::Indent(delta) => {
                let level = (i16::from(current.indent.unwrap_or(0)) + i16::from(delta))
                    .clamp(0, i16::from(MAX_INDENT));
                Format::Indent(u8::try_from(level).ok().filter(|level| *level > 0))
            }
            FormatCommand::Clean => {
                self.surface.remove_format(range)?;
                if !range.is_collapsed() {
                    self.handle_content_change();
                }
                self.refresh_font_size();
                return Ok(());
            }
        };

        self.surface.format(range, &format)?;
        if !range.is_collapsed() || format.is_block() {
            self.handle_content_change();
        }
        Ok(())
    }

    /// Set the text color. An empty or default color clears it; colors that
    /// are not plain CSS color values are ignored.
    pub fn set_color(&mut self, color: &str) -> Result<(), EditorError> {
        let color = color.trim();
        let value = if color.is_empty() {
            None
        } else {
            match sanitize_css_color(color) {
                Some(color) => Some(color.into()),
                None => {
                    tracing::debug!(color, "ignoring unsupported color");
                    return Ok(());
                }
            }
        };
        let range = self.selection();
        self.surface.format(range, &Format::Color(value))?;
        if !range.is_collapsed() {
            self.handle_content_change();
        }
        Ok(())
    }

    /// Grow or shrink the selection's font by the configured step. Does
    /// nothing without a selection.
    pub fn step_font(&mut self, direction: FontStep) -> Result<(), EditorError> {
        let range = self.selection();
        if range.is_collapsed() {
            return Ok(());
        }
        let current = i64::from(self.surface.format_at(range).to_style(self.bounds()).font_size);
        let step = i64::from(self.config.font_step);
        let size = self.bounds().clamp(match direction {
            FontStep::Up => current + step,
            FontStep::Down => current - step,
        });
        self.surface.format(range, &Format::Size(Some(size)))?;
        self.font_size = size;
        self.handle_content_change();
        Ok(())
    }

    pub fn font_size(&self) -> u32 {
        self.font_size
    }

    pub fn font_size_label(&self) -> String {
        format!("{}px", self.font_size)
    }

    /// Link the selection, or insert the URL as linked text at the caret.
    /// URLs that are not absolute http(s) are ignored.
    pub fn set_link(&mut self, url: &str) -> Result<(), EditorError> {
        let url = sanitize_http_url(url);
        if url.is_empty() {
            tracing::debug!("ignoring link that is not http(s)");
            return Ok(());
        }
        let range = self.selection();
        if range.is_collapsed() {
            let mut attributes = AttrSet::default().with_inline(&self.surface.format_at(range));
            Format::Link(Some(url.clone())).apply(&mut attributes);
            self.surface.insert_text(range.index, &url, &attributes)?;
            self.move_caret(range.index + url.chars().count());
        } else {
            self.surface.format(range, &Format::Link(Some(url)))?;
        }
        self.handle_content_change();
        Ok(())
    }

    /// Unlink the selection, or the whole link around the caret.
    pub fn remove_link(&mut self) -> Result<(), EditorError> {
        let mut range = self.selection();
        if range.is_collapsed() {
            let link_at = |index: usize| self.surface.format_at(Selection::new(index, 1)).link;
            let index = range.index;
            let link = index
                .checked_sub(1)
                .and_then(link_at)
                .or_else(|| link_at(index));
            let Some(link) = link else {
                return Ok(());
            };
            let mut start = index;
            while start > 0 && link_at(start - 1).as_ref() == Some(&link) {
                start -= 1;
            }
            let mut end = index;
            while end < self.max_index() && link_at(end).as_ref() == Some(&link) {
                end += 1;
            }
            range = Selection::new(start, end - start);
        }
        self.surface.format(range, &Format::Link(None))?;
        self.handle_content_change();
        Ok(())
    }

    // === Content ===

    pub fn get_delta(&self) -> Delta {
        sanitize_delta(&self.surface.contents(), self.bounds())
    }

    pub fn get_payload(&self) -> Payload {
        delta_to_payload(&self.surface.contents(), self.bounds())
    }

    pub fn get_text(&self) -> String {
        self.get_payload().text
    }

    pub fn get_stored(&self) -> StoredContent {
        StoredContent::from_delta(&self.surface.contents(), self.bounds())
    }

    /// The surface's own rendering, or the payload rendering if the surface
    /// cannot render.
    pub fn get_html(&self) -> String {
        match self.surface.render_html() {
            Ok(html) => html,
            Err(error) => {
                tracing::warn!(%error, "surface render failed, using payload renderer");
                render_payload_to_html(&self.get_payload())
            }
        }
    }

    pub fn set_delta(&mut self, delta: &Delta) -> Result<(), EditorError> {
        self.surface.set_contents(&sanitize_delta(delta, self.bounds()))?;
        self.handle_content_change();
        self.refresh_font_size();
        Ok(())
    }

    pub fn set_payload(&mut self, payload: &Payload) -> Result<(), EditorError> {
        self.set_delta(&payload_to_delta(payload, self.bounds()))
    }

    /// Load whatever a document field holds: a delta, an op array, a payload
    /// or a plain string.
    pub fn set_content_json(&mut self, value: &Value) -> Result<(), EditorError> {
        self.set_delta(&delta_like_to_delta(value, self.bounds()))
    }

    /// Replace `length` units at `start` with plain text inheriting the
    /// surrounding format. Returns the caret position after the text.
    pub fn replace_range(
        &mut self,
        start: usize,
        length: usize,
        text: &str,
    ) -> Result<usize, EditorError> {
        let range = self.clamp_range(start, length);
        self.surface.delete_text(range.index, range.length)?;
        let attributes =
            AttrSet::default().with_inline(&self.surface.format_at(Selection::caret(range.index)));
        self.surface.insert_text(range.index, text, &attributes)?;

        let cursor = range.index + text.chars().count();
        self.move_caret(cursor);
        self.handle_content_change();
        Ok(cursor)
    }

    /// Replace `length` units at `start` with a mention followed by a space.
    ///
    /// The mention is re-validated first. Falls back to the literal
    /// `@nickname ` when the surface has no mention embed. Returns the caret
    /// position after the inserted space.
    pub fn insert_mention(
        &mut self,
        start: usize,
        length: usize,
        mention: &Mention,
    ) -> Result<usize, EditorError> {
        let mention = mention.sanitized().ok_or(EditorError::InvalidMention)?;
        let range = self.clamp_range(start, length);
        self.surface.delete_text(range.index, range.length)?;

        let embedded = self.surface.supports_embed(MENTION_EMBED_TAG)
            && match self.surface.insert_embed(range.index, &mention) {
                Ok(()) => true,
                Err(error) => {
                    tracing::warn!(%error, "mention embed failed, inserting text");
                    false
                }
            };

        if !embedded {
            let literal = format!("{} ", mention.display_text());
            return self.replace_range(range.index, 0, &literal);
        }

        self.surface
            .insert_text(range.index + 1, " ", &AttrSet::default())?;
        let cursor = range.index + 2;
        self.move_caret(cursor);
        self.handle_content_change();
        Ok(cursor)
    }

    // === Host events ===

    /// Key handler for hosts that report DOM `KeyboardEvent.key` names.
    pub fn handle_dom_key(&mut self, key: &str) -> KeydownResult {
        self.handle_key(&Key::from_dom(key))
    }

    /// Key handler. Only backspace is intercepted, for mention deletion.
    pub fn handle_key(&mut self, key: &Key) -> KeydownResult {
        if *key != Key::Backspace {
            return KeydownResult::NotHandled;
        }

        let selection = self.surface.selection();
        let embed_before = selection
            .filter(|selection| selection.is_collapsed() && selection.index > 0)
            .is_some_and(|selection| self.surface.embed_at(selection.index - 1).is_some());

        match self.step(MentionEvent::Backspace {
            selection,
            embed_before,
        })
        .effect
        {
            MentionEffect::Arm(index) => {
                self.surface.set_embed_marked(index, true);
                KeydownResult::Handled
            }
            MentionEffect::Delete(index) => match self.surface.delete_text(index, 1) {
                Ok(()) => {
                    self.move_caret(index);
                    KeydownResult::Handled
                }
                Err(error) => {
                    tracing::warn!(%error, index, "mention delete failed");
                    KeydownResult::NotHandled
                }
            },
            MentionEffect::PassThrough => KeydownResult::PassThrough,
            MentionEffect::None => KeydownResult::NotHandled,
        }
    }

    pub fn handle_selection_change(&mut self, selection: Option<Selection>) {
        if let Some(selection) = selection {
            self.last_selection = selection;
            self.refresh_font_size();
        }
        self.step(MentionEvent::SelectionChanged(selection));
    }

    pub fn handle_content_change(&mut self) {
        self.step(MentionEvent::ContentChanged);
    }
}
