//! Conversions between [`Payload`] and [`Delta`].
//!
//! Every function here is total over untrusted input. Malformed fields fall
//! back to defaults and malformed ops are dropped, so callers never see an
//! error from the codec itself.

use serde_json::Value;

use crate::config::FontBounds;
use crate::delta::{AttrSet, Delta, Mention, Op};
use crate::runs::{Payload, Run, RunBuilder};
use crate::style::{Style, sanitize_style};

/// Accumulates ops, merging adjacent text ops that share attributes.
#[derive(Debug, Default)]
struct OpBuffer {
    ops: Vec<Op>,
}

impl OpBuffer {
    fn push_text(&mut self, insert: &str, attributes: AttrSet) {
        if insert.is_empty() {
            return;
        }
        if let Some(Op::Text {
            insert: last,
            attributes: last_attributes,
        }) = self.ops.last_mut()
        {
            if *last_attributes == attributes {
                last.push_str(insert);
                return;
            }
        }
        self.ops.push(Op::styled(insert, attributes));
    }

    fn push_mention(&mut self, mention: Mention) {
        self.ops.push(Op::mention(mention));
    }

    /// Append the document terminator unless the last op is text ending a
    /// line. A trailing embed always gets one after it.
    fn terminate(&mut self, bounds: FontBounds) {
        let terminated = matches!(
            self.ops.last(),
            Some(Op::Text { insert, .. }) if insert.ends_with('\n')
        );
        if !terminated {
            self.push_text("\n", AttrSet::from_style(&Style::default_within(bounds)));
        }
    }

    fn finish(self) -> Delta {
        Delta::new(self.ops)
    }
}

/// Re-sanitize every op and restore the terminator. Idempotent.
pub fn sanitize_delta(delta: &Delta, bounds: FontBounds) -> Delta {
    let mut buffer = OpBuffer::default();
    for op in &delta.ops {
        match op {
            Op::Text { insert, attributes } => {
                buffer.push_text(insert, attributes.sanitized(bounds));
            }
            Op::Embed { insert } => match insert.mention.sanitized() {
                Some(mention) => buffer.push_mention(mention),
                None => tracing::debug!(uid = %insert.mention.uid, "dropping invalid mention"),
            },
        }
    }
    buffer.terminate(bounds);
    buffer.finish()
}

/// Convert a stored payload into a sanitized, terminated delta.
///
/// Runs are walked left to right. Gaps and uncovered trailing text get the
/// default style and overlapping runs are clipped.
pub fn payload_to_delta(payload: &Payload, bounds: FontBounds) -> Delta {
    let mut buffer = OpBuffer::default();
    for segment in payload.segments() {
        buffer.push_text(
            segment.text,
            AttrSet::from_style(&segment.style.sanitized(bounds)),
        );
    }
    // Always append so a payload whose text ends in a newline keeps it.
    buffer.push_text("\n", AttrSet::from_style(&Style::default_within(bounds)));
    sanitize_delta(&buffer.finish(), bounds)
}

/// Flatten a delta into text plus runs.
///
/// Mentions become the literal `@nickname` in the default style, and exactly
/// one trailing newline (the document terminator) is removed.
pub fn delta_to_payload(delta: &Delta, bounds: FontBounds) -> Payload {
    let mut builder = RunBuilder::new();
    for op in &delta.ops {
        match op {
            Op::Text { insert, attributes } => {
                builder.push(insert, &attributes.to_style(bounds));
            }
            Op::Embed { insert } => {
                if let Some(mention) = insert.mention.sanitized() {
                    builder.push(&mention.display_text(), &Style::default_within(bounds));
                }
            }
        }
    }
    builder.pop_trailing_newline();
    builder.finish()
}

/// Canonical form of a payload: what it becomes after a trip through the
/// editor representation.
pub fn sanitize_payload(payload: &Payload, bounds: FontBounds) -> Payload {
    delta_to_payload(&payload_to_delta(payload, bounds), bounds)
}

/// Read whatever shape of content a document field holds.
///
/// Accepts `{"ops": [...]}`, a bare op array, a payload-shaped
/// `{"text", "runs"}` object or a plain string. Anything else is an empty
/// document.
pub fn delta_like_to_delta(value: &Value, bounds: FontBounds) -> Delta {
    match value {
        Value::Object(map) if map.get("ops").is_some_and(Value::is_array) => {
            ops_from_values(map.get("ops"), bounds)
        }
        Value::Array(_) => ops_from_values(Some(value), bounds),
        Value::Object(map) if map.get("text").is_some_and(Value::is_string) => {
            payload_to_delta(&payload_from_value(value, bounds), bounds)
        }
        Value::String(text) => payload_to_delta(&Payload::plain(text.as_str()), bounds),
        _ => {
            tracing::debug!("unrecognized content shape, using an empty document");
            sanitize_delta(&Delta::default(), bounds)
        }
    }
}

fn ops_from_values(ops: Option<&Value>, bounds: FontBounds) -> Delta {
    let ops = ops
        .and_then(Value::as_array)
        .map(|ops| ops.iter().filter_map(|op| op_from_value(op, bounds)).collect())
        .unwrap_or_default();
    sanitize_delta(&Delta::new(ops), bounds)
}

fn op_from_value(raw: &Value, bounds: FontBounds) -> Option<Op> {
    match raw.get("insert") {
        Some(Value::String(insert)) => Some(Op::styled(
            insert.as_str(),
            AttrSet::from_value(raw.get("attributes"), bounds),
        )),
        Some(Value::Object(embed)) => {
            let mention = embed.get("mentionEmbed").and_then(Mention::from_value);
            if mention.is_none() {
                tracing::debug!("dropping unsupported or invalid embed op");
            }
            mention.map(Op::mention)
        }
        _ => {
            tracing::debug!("dropping op without an insert");
            None
        }
    }
}

/// Lenient read of a payload-shaped JSON object.
///
/// Styles go through [`sanitize_style`] and the runs are repaired with
/// [`Payload::normalized`], so the result always passes [`Payload::check`].
pub fn payload_from_value(raw: &Value, bounds: FontBounds) -> Payload {
    let text = raw.get("text").and_then(Value::as_str).unwrap_or_default();
    let runs = raw
        .get("runs")
        .and_then(Value::as_array)
        .map(|runs| runs.iter().filter_map(|run| run_from_value(run, bounds)).collect())
        .unwrap_or_default();
    Payload::new(text, runs).normalized()
}

fn run_from_value(raw: &Value, bounds: FontBounds) -> Option<Run> {
    let offset = |key: &str| {
        raw.get(key)
            .and_then(Value::as_f64)
            .filter(|offset| offset.is_finite())
            .map(|offset| offset.max(0.0) as usize)
    };
    let start = offset("start")?;
    let end = offset("end")?;
    let style = raw
        .get("style")
        .map(|style| sanitize_style(style, bounds))
        .unwrap_or_else(|| Style::default_within(bounds));
    (start < end).then(|| Run::new(start, end, style))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bold() -> Style {
        Style {
            bold: true,
            ..Style::default()
        }
    }

    fn bounds() -> FontBounds {
        FontBounds::default()
    }

    #[test]
    fn test_empty_delta_gets_terminator() {
        let delta = sanitize_delta(&Delta::default(), bounds());
        assert_eq!(delta, Delta::new(vec![Op::text("\n")]));
    }

    #[test]
    fn test_sanitize_merges_and_drops_empty() {
        let delta = Delta::new(vec![
            Op::text("a"),
            Op::text(""),
            Op::text("b"),
            Op::styled("c", AttrSet::from_style(&bold())),
        ]);
        let clean = sanitize_delta(&delta, bounds());
        assert_eq!(
            clean.ops,
            vec![
                Op::text("ab"),
                Op::styled("c", AttrSet::from_style(&bold())),
                Op::text("\n"),
            ]
        );
    }

    #[test]
    fn test_sanitize_terminator_merges_into_default_text() {
        let once = sanitize_delta(&Delta::new(vec![Op::text("abc")]), bounds());
        assert_eq!(once.ops, vec![Op::text("abc\n")]);
        assert_eq!(sanitize_delta(&once, bounds()), once);
    }

    #[test]
    fn test_trailing_mention_is_terminated() {
        let mention = Mention::new("u1", "bob").unwrap();
        let delta = sanitize_delta(&Delta::new(vec![Op::mention(mention.clone())]), bounds());
        assert_eq!(delta.ops, vec![Op::mention(mention), Op::text("\n")]);
    }

    #[test]
    fn test_mention_after_newline_still_terminated() {
        let mention = Mention::new("u1", "bob").unwrap();
        let delta = Delta::new(vec![Op::text("a\n"), Op::mention(mention.clone())]);
        let clean = sanitize_delta(&delta, bounds());
        assert_eq!(
            clean.ops,
            vec![Op::text("a\n"), Op::mention(mention), Op::text("\n")]
        );
        assert!(clean.is_terminated());
        assert_eq!(sanitize_delta(&clean, bounds()), clean);
    }

    #[test]
    fn test_invalid_mention_dropped() {
        let delta = Delta::new(vec![
            Op::text("hi "),
            Op::mention(Mention {
                uid: "u1".into(),
                nickname: "   ".into(),
            }),
            Op::text("\n"),
        ]);
        assert_eq!(sanitize_delta(&delta, bounds()).ops, vec![Op::text("hi \n")]);
    }

    #[test]
    fn test_payload_to_delta_simple() {
        let payload = Payload::new(
            "Hello world",
            vec![
                Run::new(0, 5, bold()),
                Run::new(5, 11, Style::default()),
            ],
        );
        let delta = payload_to_delta(&payload, bounds());
        assert_eq!(
            delta.ops,
            vec![
                Op::styled("Hello", AttrSet::from_style(&bold())),
                Op::text(" world\n"),
            ]
        );
        assert_eq!(delta_to_payload(&delta, bounds()), payload);
    }

    #[test]
    fn test_payload_ending_in_newline_round_trips() {
        let payload = Payload::plain("line\n");
        let delta = payload_to_delta(&payload, bounds());
        assert_eq!(delta.ops, vec![Op::text("line\n\n")]);
        assert_eq!(delta_to_payload(&delta, bounds()), payload);
    }

    #[test]
    fn test_empty_payload_round_trips() {
        let delta = payload_to_delta(&Payload::default(), bounds());
        assert_eq!(delta.ops, vec![Op::text("\n")]);
        assert_eq!(delta_to_payload(&delta, bounds()), Payload::default());
    }

    #[test]
    fn test_mention_flattens_to_literal() {
        let delta = Delta::new(vec![
            Op::styled("hi ", AttrSet::from_style(&bold())),
            Op::mention(Mention::new("u1", "bob").unwrap()),
            Op::text("\n"),
        ]);
        let payload = delta_to_payload(&delta, bounds());
        assert_eq!(payload.text, "hi @bob");
        assert_eq!(
            payload.runs,
            vec![Run::new(0, 3, bold()), Run::new(3, 7, Style::default())]
        );
    }

    #[test]
    fn test_payload_with_gap_and_bad_style() {
        let payload = Payload::new(
            "abcdef",
            vec![Run::new(
                2,
                4,
                Style {
                    font_size: 999,
                    link: "javascript:alert(1)".into(),
                    ..Style::default()
                },
            )],
        );
        let result = delta_to_payload(&payload_to_delta(&payload, bounds()), bounds());
        assert_eq!(result.text, "abcdef");
        assert_eq!(result.check(), Ok(()));
        assert_eq!(result.runs[1].style.font_size, 48);
        assert_eq!(result.runs[1].style.link, "");
    }

    #[test]
    fn test_delta_like_shapes() {
        let from_ops = delta_like_to_delta(&json!({"ops": [{"insert": "hi"}]}), bounds());
        assert_eq!(from_ops.ops, vec![Op::text("hi\n")]);

        let from_array = delta_like_to_delta(&json!([{"insert": "hi"}]), bounds());
        assert_eq!(from_array, from_ops);

        let from_string = delta_like_to_delta(&json!("hi"), bounds());
        assert_eq!(from_string, from_ops);

        let from_payload = delta_like_to_delta(
            &json!({"text": "hi", "runs": [{"start": 0, "end": 2, "style": {"bold": true}}]}),
            bounds(),
        );
        assert_eq!(
            from_payload.ops,
            vec![Op::styled("hi", AttrSet::from_style(&bold())), Op::text("\n")]
        );

        for junk in [json!(null), json!(42), json!({"foo": 1}), json!(true)] {
            assert_eq!(delta_like_to_delta(&junk, bounds()).ops, vec![Op::text("\n")]);
        }
    }

    #[test]
    fn test_delta_like_drops_malformed_ops() {
        let delta = delta_like_to_delta(
            &json!({"ops": [
                {"insert": "a", "attributes": {"link": "javascript:x", "size": "huge"}},
                {"retain": 3},
                {"insert": {"image": "x.png"}},
                {"insert": {"mentionEmbed": {"uid": 7, "nickname": "  ann  "}}},
                {"insert": "b"}
            ]}),
            bounds(),
        );
        assert_eq!(
            delta.ops,
            vec![
                Op::text("a"),
                Op::mention(Mention::new("7", "ann").unwrap()),
                Op::text("b\n"),
            ]
        );
    }

    #[test]
    fn test_payload_from_value_is_lenient() {
        let payload = payload_from_value(
            &json!({
                "text": "abcd",
                "runs": [
                    {"start": 2, "end": 10, "style": {"italic": true}},
                    {"start": "x", "end": 1},
                    {"start": 3, "end": 1}
                ]
            }),
            bounds(),
        );
        assert_eq!(payload.check(), Ok(()));
        assert_eq!(payload.runs.len(), 2);
        assert!(payload.runs[1].style.italic);
    }
}
