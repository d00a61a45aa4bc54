//! Sanitized HTML for read-only display.
//!
//! Rendering is split in two: a processor walks the content and reports text
//! and features to a [`RunOutput`], and [`HtmlRunOutput`] turns those into
//! markup. Escaping happens in the output, so no processor ever interpolates
//! raw text.

mod blocks;
mod output;

pub use blocks::{Block, BlockKind, process_delta, render_delta_markup};
pub use output::HtmlRunOutput;

use crate::runs::Payload;
use crate::style::{DEFAULT_COLOR, DEFAULT_FONT_SIZE, Style, sanitize_css_color, sanitize_http_url};

/// One wrapper applied around a run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunFeature<'a> {
    Bold,
    Italic,
    Strikethrough,
    Underline,
    /// Inline style span. Both fields absent renders a bare `<span>`.
    Span {
        color: Option<&'a str>,
        font_size: Option<u32>,
    },
    Link {
        href: &'a str,
    },
    Mention {
        uid: &'a str,
    },
}

pub trait RunOutput {
    type Error;

    /// Write escaped text, turning newlines into line breaks.
    fn write_text(&mut self, text: &str) -> Result<(), Self::Error>;
    fn start_feature(&mut self, feature: &RunFeature<'_>) -> Result<(), Self::Error>;
    fn end_feature(&mut self, feature: &RunFeature<'_>) -> Result<(), Self::Error>;

    fn start_block(&mut self, block: &Block) -> Result<(), Self::Error>;
    fn end_block(&mut self, block: &Block) -> Result<(), Self::Error>;
}

/// Features for a style, outermost first.
///
/// Bold is the innermost wrapper and the link the outermost. Colors that fail
/// the CSS gate and links that fail URL sanitizing are left out.
pub fn style_features<'a>(style: &'a Style, href: &'a str) -> Vec<RunFeature<'a>> {
    let mut features = Vec::with_capacity(6);
    if !href.is_empty() {
        features.push(RunFeature::Link { href });
    }

    let color = Some(style.color.as_str())
        .filter(|color| !color.is_empty() && *color != DEFAULT_COLOR)
        .and_then(sanitize_css_color);
    let font_size = Some(style.font_size)
        .filter(|size| *size != 0 && *size != DEFAULT_FONT_SIZE);
    if color.is_some() || font_size.is_some() {
        features.push(RunFeature::Span { color, font_size });
    }

    if style.underline {
        features.push(RunFeature::Underline);
    }
    if style.strikethrough {
        features.push(RunFeature::Strikethrough);
    }
    if style.italic {
        features.push(RunFeature::Italic);
    }
    if style.bold {
        features.push(RunFeature::Bold);
    }
    features
}

/// Write `text` wrapped in `features` (outermost first).
pub(crate) fn write_wrapped<O: RunOutput>(
    text: &str,
    features: &[RunFeature<'_>],
    output: &mut O,
) -> Result<(), O::Error> {
    for feature in features {
        output.start_feature(feature)?;
    }
    output.write_text(text)?;
    for feature in features.iter().rev() {
        output.end_feature(feature)?;
    }
    Ok(())
}

/// Walk a payload's runs, filling gaps with the default style.
///
/// A payload with text but no runs at all is rendered as one bare span.
pub fn process_payload<O: RunOutput>(payload: &Payload, output: &mut O) -> Result<(), O::Error> {
    if payload.runs.is_empty() {
        if payload.text.is_empty() {
            return Ok(());
        }
        let bare = RunFeature::Span {
            color: None,
            font_size: None,
        };
        return write_wrapped(&payload.text, &[bare], output);
    }

    for segment in payload.segments() {
        let href = sanitize_http_url(&segment.style.link);
        write_wrapped(segment.text, &style_features(&segment.style, &href), output)?;
    }
    Ok(())
}

/// Render a payload to markup using only `strong`, `em`, `s`, `u`,
/// `span[style]`, `a[href,target,rel]` and `br`.
pub fn render_payload_to_html(payload: &Payload) -> String {
    let mut output = HtmlRunOutput::new(String::new());
    match process_payload(payload, &mut output) {
        Ok(()) => output.into_inner(),
        Err(error) => {
            tracing::warn!(?error, "payload render failed");
            String::new()
        }
    }
}
