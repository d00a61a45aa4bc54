//! The record a document field persists.
//!
//! Every save writes all three representations at once so readers can pick
//! whichever they need: the editor reloads the delta, display code renders
//! the payload and search indexes the text.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::{delta_like_to_delta, delta_to_payload, payload_to_delta, sanitize_delta};
use crate::config::FontBounds;
use crate::delta::Delta;
use crate::error::ContentError;
use crate::runs::Payload;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredContent {
    pub content_delta: Delta,
    pub content_rich: Payload,
    pub content_text: String,
}

impl StoredContent {
    pub fn from_delta(delta: &Delta, bounds: FontBounds) -> Self {
        let content_delta = sanitize_delta(delta, bounds);
        let content_rich = delta_to_payload(&content_delta, bounds);
        Self {
            content_text: content_rich.text.clone(),
            content_delta,
            content_rich,
        }
    }

    pub fn from_payload(payload: &Payload, bounds: FontBounds) -> Self {
        Self::from_delta(&payload_to_delta(payload, bounds), bounds)
    }

    /// Build from a stored record or any shape [`delta_like_to_delta`] reads.
    ///
    /// A full record prefers its delta (which keeps mentions) and falls back to
    /// the payload when the delta is missing.
    pub fn from_json_value(value: &Value, bounds: FontBounds) -> Self {
        let source = match value.get("contentDelta") {
            Some(delta) if !delta.is_null() => delta,
            _ => value
                .get("contentRich")
                .filter(|rich| !rich.is_null())
                .unwrap_or(value),
        };
        Self::from_delta(&delta_like_to_delta(source, bounds), bounds)
    }

    pub fn from_json_str(raw: &str, bounds: FontBounds) -> Result<Self, ContentError> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(Self::from_json_value(&value, bounds))
    }

    pub fn to_json(&self) -> Result<String, ContentError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check the record's internal consistency.
    pub fn check(&self) -> Result<(), ContentError> {
        self.content_rich.check()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::{Mention, Op};
    use serde_json::json;

    #[test]
    fn test_from_delta_keeps_representations_parallel() {
        let delta = Delta::new(vec![
            Op::text("hey "),
            Op::mention(Mention::new("u1", "ann").unwrap()),
        ]);
        let stored = StoredContent::from_delta(&delta, FontBounds::default());
        assert_eq!(stored.content_text, "hey @ann");
        assert_eq!(stored.content_rich.text, stored.content_text);
        assert!(stored.content_delta.is_terminated());
        assert!(stored.check().is_ok());
    }

    #[test]
    fn test_record_prefers_delta() {
        let value = json!({
            "contentDelta": {"ops": [{"insert": {"mentionEmbed": {"uid": "u1", "nickname": "ann"}}}]},
            "contentRich": {"text": "stale", "runs": []},
            "contentText": "stale"
        });
        let stored = StoredContent::from_json_value(&value, FontBounds::default());
        assert_eq!(stored.content_text, "@ann");
        assert_eq!(stored.content_delta.mentions().count(), 1);
    }

    #[test]
    fn test_record_falls_back_to_payload() {
        let value = json!({"contentRich": {"text": "from rich", "runs": []}});
        let stored = StoredContent::from_json_value(&value, FontBounds::default());
        assert_eq!(stored.content_text, "from rich");
    }

    #[test]
    fn test_json_field_names() {
        let stored = StoredContent::from_payload(&Payload::plain("x"), FontBounds::default());
        let value: Value = serde_json::from_str(&stored.to_json().unwrap()).unwrap();
        assert_eq!(value["contentText"], "x");
        assert_eq!(value["contentRich"]["runs"][0]["style"]["fontSize"], 16);
        assert_eq!(value["contentDelta"]["ops"][0]["insert"], "x\n");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let error = StoredContent::from_json_str("{not json", FontBounds::default()).unwrap_err();
        assert!(matches!(error, ContentError::Json(_)));
    }
}
