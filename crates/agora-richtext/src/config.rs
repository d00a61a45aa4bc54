//! Codec configuration.
//!
//! Every sanitizing entry point takes a [`FontBounds`] so the same codec can
//! serve surfaces with different size ranges (post bodies, comments, board
//! descriptions). [`ContentConfig`] bundles the bounds for callers that load
//! settings from the environment.

use serde::{Deserialize, Serialize};

use crate::style::DEFAULT_FONT_SIZE;

/// Smallest font size accepted by default, in px.
pub const DEFAULT_MIN_FONT_SIZE: u32 = 10;
/// Largest font size accepted by default, in px.
pub const DEFAULT_MAX_FONT_SIZE: u32 = 48;

/// Inclusive font-size range, in px.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontBounds {
    pub min: u32,
    pub max: u32,
}

impl Default for FontBounds {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_FONT_SIZE,
            max: DEFAULT_MAX_FONT_SIZE,
        }
    }
}

impl FontBounds {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Lower and upper bound in order, even if the config was written backwards.
    fn ordered(self) -> (u32, u32) {
        if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        }
    }

    /// Clamp an integer size into the range.
    pub fn clamp(self, size: i64) -> u32 {
        let (lo, hi) = self.ordered();
        size.clamp(lo as i64, hi as i64) as u32
    }

    /// Round and clamp a raw size. Non-finite or missing input falls back to
    /// the default size (which is clamped too).
    pub fn coerce(self, raw: Option<f64>) -> u32 {
        match raw {
            Some(size) if size.is_finite() => self.clamp(size.round() as i64),
            _ => self.clamp(DEFAULT_FONT_SIZE as i64),
        }
    }

    pub fn contains(self, size: u32) -> bool {
        let (lo, hi) = self.ordered();
        (lo..=hi).contains(&size)
    }
}

/// Codec settings shared by the editor and tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default)]
    pub font_bounds: FontBounds,
}

impl ContentConfig {
    /// Load config from environment variables.
    ///
    /// - `AGORA_FONT_MIN`: smallest font size in px (default 10)
    /// - `AGORA_FONT_MAX`: largest font size in px (default 48)
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let defaults = FontBounds::default();
        Self {
            font_bounds: FontBounds {
                min: env_u32("AGORA_FONT_MIN").unwrap_or(defaults.min),
                max: env_u32("AGORA_FONT_MAX").unwrap_or(defaults.max),
            },
        }
    }
}

/// Read a numeric setting, ignoring (and logging) values that do not parse.
pub fn env_u32(key: &str) -> Option<u32> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable numeric setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_rounds_and_clamps() {
        let bounds = FontBounds::default();
        assert_eq!(bounds.coerce(Some(17.4)), 17);
        assert_eq!(bounds.coerce(Some(17.5)), 18);
        assert_eq!(bounds.coerce(Some(999.0)), 48);
        assert_eq!(bounds.coerce(Some(1.0)), 10);
        assert_eq!(bounds.coerce(Some(-40.0)), 10);
    }

    #[test]
    fn test_coerce_non_finite_uses_default() {
        let bounds = FontBounds::default();
        assert_eq!(bounds.coerce(None), 16);
        assert_eq!(bounds.coerce(Some(f64::NAN)), 16);
        assert_eq!(bounds.coerce(Some(f64::INFINITY)), 16);
    }

    #[test]
    fn test_default_is_clamped_into_narrow_bounds() {
        let bounds = FontBounds::new(20, 30);
        assert_eq!(bounds.coerce(None), 20);
    }

    #[test]
    fn test_backwards_bounds_do_not_panic() {
        let bounds = FontBounds::new(48, 10);
        assert_eq!(bounds.clamp(100), 48);
        assert_eq!(bounds.clamp(0), 10);
        assert!(bounds.contains(16));
    }
}
