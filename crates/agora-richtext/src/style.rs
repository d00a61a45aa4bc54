//! Character-level styles and the sanitizers every ingestion path runs through.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

use crate::config::FontBounds;

/// Text color used when none is given (dark slate).
pub const DEFAULT_COLOR: &str = "#334155";
/// Font size used when none is given, in px.
pub const DEFAULT_FONT_SIZE: u32 = 16;

static HTTP_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://").expect("static regex"));

static CSS_COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:#[0-9a-f]{3,8}|[a-z]{1,32}|(?:rgba?|hsla?)\(\s*[0-9.%,\s/]+\))$",
    )
    .expect("static regex")
});

/// Character formatting for one run of text.
///
/// Equality is structural; two adjacent runs merge exactly when their styles
/// compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Style {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub color: SmolStr,
    pub font_size: u32,
    pub link: String,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            strikethrough: false,
            underline: false,
            color: SmolStr::new_static(DEFAULT_COLOR),
            font_size: DEFAULT_FONT_SIZE,
            link: String::new(),
        }
    }
}

impl Style {
    /// The default style with its size clamped into `bounds`.
    pub fn default_within(bounds: FontBounds) -> Self {
        Self {
            font_size: bounds.coerce(None),
            ..Self::default()
        }
    }

    /// Re-apply the sanitizer rules to an already typed style.
    ///
    /// Stored payloads are typed on the way in but may still carry stale or
    /// hostile values, so this runs on every codec path.
    pub fn sanitized(&self, bounds: FontBounds) -> Self {
        Self {
            bold: self.bold,
            italic: self.italic,
            strikethrough: self.strikethrough,
            underline: self.underline,
            color: if self.color.is_empty() {
                SmolStr::new_static(DEFAULT_COLOR)
            } else {
                self.color.clone()
            },
            font_size: bounds.clamp(self.font_size as i64),
            link: sanitize_http_url(&self.link),
        }
    }

    pub fn has_custom_color(&self) -> bool {
        self.color != DEFAULT_COLOR
    }

    pub fn has_custom_size(&self) -> bool {
        self.font_size != DEFAULT_FONT_SIZE
    }
}

/// Build a [`Style`] from untrusted JSON.
///
/// Never fails: booleans follow JavaScript truthiness, a missing or non-string
/// color falls back to [`DEFAULT_COLOR`], sizes are rounded and clamped, and
/// links go through [`sanitize_http_url`].
pub fn sanitize_style(raw: &Value, bounds: FontBounds) -> Style {
    Style {
        bold: truthy(raw.get("bold")),
        italic: truthy(raw.get("italic")),
        strikethrough: truthy(raw.get("strikethrough")),
        underline: truthy(raw.get("underline")),
        color: raw
            .get("color")
            .and_then(Value::as_str)
            .filter(|color| !color.is_empty())
            .map(SmolStr::new)
            .unwrap_or_else(|| SmolStr::new_static(DEFAULT_COLOR)),
        font_size: bounds.coerce(raw.get("fontSize").and_then(numeric)),
        link: raw
            .get("link")
            .and_then(Value::as_str)
            .map(sanitize_http_url)
            .unwrap_or_default(),
    }
}

/// Strip control characters and surrounding whitespace, then accept the URL
/// only if it is absolute `http` or `https`. Anything else becomes `""`.
pub fn sanitize_http_url(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| !c.is_control()).collect();
    let trimmed = cleaned.trim();
    if HTTP_URL_RE.is_match(trimmed) {
        trimmed.to_string()
    } else {
        String::new()
    }
}

/// Accept a CSS color only in hex, named, `rgb[a]()` or `hsl[a]()` form.
///
/// Colors are stored as given; this gate applies where they are interpolated
/// into a `style` attribute.
pub fn sanitize_css_color(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    CSS_COLOR_RE.is_match(trimmed).then_some(trimmed)
}

/// JavaScript truthiness for an optional JSON value.
pub(crate) fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Numeric coercion for size-like fields: numbers, or strings holding a
/// number with an optional `px` suffix.
pub(crate) fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_px(s),
        _ => None,
    }
}

/// Parse `"18"`, `"18px"` or `" 18.5 px "`.
pub(crate) fn parse_px(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let number = trimmed
        .strip_suffix("px")
        .or_else(|| trimmed.strip_suffix("PX"))
        .unwrap_or(trimmed)
        .trim();
    if number.is_empty() {
        return None;
    }
    number.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bounds() -> FontBounds {
        FontBounds::new(10, 48)
    }

    #[test]
    fn test_font_size_clamped() {
        assert_eq!(sanitize_style(&json!({"fontSize": 999}), bounds()).font_size, 48);
        assert_eq!(sanitize_style(&json!({"fontSize": 1}), bounds()).font_size, 10);
        assert_eq!(sanitize_style(&json!({"fontSize": "20"}), bounds()).font_size, 20);
        assert_eq!(sanitize_style(&json!({"fontSize": 13.6}), bounds()).font_size, 14);
    }

    #[test]
    fn test_malformed_fields_fall_back() {
        let style = sanitize_style(
            &json!({"fontSize": "huge", "color": 12, "link": false, "bold": "yes"}),
            bounds(),
        );
        assert_eq!(style.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(style.color, DEFAULT_COLOR);
        assert_eq!(style.link, "");
        assert!(style.bold);
    }

    #[test]
    fn test_non_object_input_is_default() {
        assert_eq!(sanitize_style(&json!(null), bounds()), Style::default());
        assert_eq!(sanitize_style(&json!("bold"), bounds()), Style::default());
        assert_eq!(sanitize_style(&json!([1, 2]), bounds()), Style::default());
    }

    #[test]
    fn test_truthiness() {
        assert!(!truthy(Some(&json!(0))));
        assert!(!truthy(Some(&json!(""))));
        assert!(!truthy(Some(&json!(null))));
        assert!(!truthy(None));
        assert!(truthy(Some(&json!(1))));
        assert!(truthy(Some(&json!("false"))));
        assert!(truthy(Some(&json!({}))));
    }

    #[test]
    fn test_http_url_accepts_http_and_https() {
        assert_eq!(sanitize_http_url("https://example.com"), "https://example.com");
        assert_eq!(sanitize_http_url("  HTTP://Example.com/a?b=c "), "HTTP://Example.com/a?b=c");
    }

    #[test]
    fn test_http_url_rejects_other_schemes() {
        assert_eq!(sanitize_http_url("javascript:alert(1)"), "");
        assert_eq!(sanitize_http_url("java\u{0}script:alert(1)"), "");
        assert_eq!(sanitize_http_url("data:text/html,<script>"), "");
        assert_eq!(sanitize_http_url("//example.com"), "");
        assert_eq!(sanitize_http_url("/relative/path"), "");
        assert_eq!(sanitize_http_url(""), "");
    }

    #[test]
    fn test_http_url_strips_control_characters() {
        assert_eq!(
            sanitize_http_url("\u{1}https://exa\tmple.com\u{7f}"),
            "https://example.com"
        );
    }

    #[test]
    fn test_css_color_gate() {
        assert_eq!(sanitize_css_color("#fff"), Some("#fff"));
        assert_eq!(sanitize_css_color(" red "), Some("red"));
        assert_eq!(sanitize_css_color("rgb(1, 2, 3)"), Some("rgb(1, 2, 3)"));
        assert_eq!(sanitize_css_color("hsla(10, 50%, 40%, 0.5)"), Some("hsla(10, 50%, 40%, 0.5)"));
        assert_eq!(sanitize_css_color("red; background: url(x)"), None);
        assert_eq!(sanitize_css_color("\" onmouseover=\"x"), None);
        assert_eq!(sanitize_css_color("expression(alert(1))"), None);
    }

    #[test]
    fn test_typed_sanitize_reapplies_rules() {
        let stale = Style {
            font_size: 200,
            link: "javascript:alert(1)".into(),
            color: SmolStr::default(),
            ..Style::default()
        };
        let clean = stale.sanitized(bounds());
        assert_eq!(clean.font_size, 48);
        assert_eq!(clean.link, "");
        assert_eq!(clean.color, DEFAULT_COLOR);
    }
}
