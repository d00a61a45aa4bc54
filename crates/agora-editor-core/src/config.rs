use agora_richtext::ContentConfig;
use agora_richtext::config::env_u32;
use serde::{Deserialize, Serialize};

/// Font-size step used by the grow/shrink buttons, in px.
pub const DEFAULT_FONT_STEP: u32 = 2;

/// Controller settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default = "default_font_step")]
    pub font_step: u32,
}

fn default_font_step() -> u32 {
    DEFAULT_FONT_STEP
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            content: ContentConfig::default(),
            font_step: DEFAULT_FONT_STEP,
        }
    }
}

impl EditorConfig {
    /// Load config from environment variables.
    ///
    /// Reads everything [`ContentConfig::from_env`] reads, plus
    /// `AGORA_FONT_STEP` (default 2).
    pub fn from_env() -> Self {
        Self {
            content: ContentConfig::from_env(),
            font_step: env_u32("AGORA_FONT_STEP")
                .filter(|step| *step > 0)
                .unwrap_or(DEFAULT_FONT_STEP),
        }
    }
}
