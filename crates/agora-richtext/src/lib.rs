//! Rich-text content codec for forum posts, comments and board descriptions.
//!
//! Formatted text lives in three shapes:
//!
//! - [`Delta`]: the editing surface's operation log, including mention embeds
//!   and block attributes.
//! - [`Payload`]: full text plus styled runs, the persisted form.
//! - HTML: sanitized markup for read-only display.
//!
//! Conversions between them are total. Every path that accepts stored or
//! pasted content re-runs the style and URL sanitizers.

pub mod codec;
pub mod config;
pub mod delta;
pub mod error;
pub mod html;
pub mod runs;
pub mod stored;
pub mod style;
pub mod tree;

pub use codec::{
    delta_like_to_delta, delta_to_payload, payload_from_value, payload_to_delta, sanitize_delta,
    sanitize_payload,
};
pub use config::{ContentConfig, FontBounds};
pub use delta::{Align, AttrSet, Delta, Embed, ListKind, MAX_INDENT, MENTION_EMBED_TAG, Mention, Op};
pub use error::ContentError;
pub use html::{render_delta_markup, render_payload_to_html};
pub use runs::{Payload, PayloadViolation, Run, RunBuilder, Segment};
pub use stored::StoredContent;
pub use style::{
    DEFAULT_COLOR, DEFAULT_FONT_SIZE, Style, sanitize_css_color, sanitize_http_url, sanitize_style,
};
pub use tree::{ContentNode, serialize_tree, serialize_tree_with};
