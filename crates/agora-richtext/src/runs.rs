//! The flat persisted representation: full text plus styled runs.
//!
//! A [`Payload`] is what the storage layer keeps and what search indexes. Its
//! runs are sorted, non-overlapping, cover the whole text and are maximally
//! coalesced. Everything the codec produces goes through [`RunBuilder`], which
//! enforces those invariants at a single `push` boundary.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::style::Style;

/// A `[start, end)` char interval sharing one style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub style: Style,
}

impl Run {
    pub fn new(start: usize, end: usize, style: Style) -> Self {
        Self { start, end, style }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Text plus styled runs. Offsets are in chars, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Payload {
    pub text: String,
    #[serde(default)]
    pub runs: Vec<Run>,
}

/// A slice of a payload walk: char range, its text and the style to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub range: Range<usize>,
    pub text: &'a str,
    pub style: Style,
}

/// First invariant a payload breaks.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadViolation {
    #[error("empty text must not carry runs")]
    RunsOnEmptyText,
    #[error("run {index} is empty or inverted")]
    EmptyRun { index: usize },
    #[error("run {index} ends past the text ({end} > {len})")]
    OutOfBounds { index: usize, end: usize, len: usize },
    #[error("no run covers chars {start}..{end}")]
    Gap { start: usize, end: usize },
    #[error("run {index} overlaps the previous run")]
    Overlap { index: usize },
    #[error("runs {} and {index} share a style and should be merged", .index - 1)]
    Uncoalesced { index: usize },
}

impl Payload {
    pub fn new(text: impl Into<String>, runs: Vec<Run>) -> Self {
        Self {
            text: text.into(),
            runs,
        }
    }

    /// Text with a single run in `style`.
    pub fn styled(text: impl Into<String>, style: Style) -> Self {
        let mut builder = RunBuilder::new();
        builder.push(&text.into(), &style);
        builder.finish()
    }

    /// Text with a single default-style run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::styled(text, Style::default())
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }

    /// Check the run invariants, reporting the first violation.
    pub fn check(&self) -> Result<(), PayloadViolation> {
        let len = self.len_chars();
        if len == 0 {
            return if self.runs.is_empty() {
                Ok(())
            } else {
                Err(PayloadViolation::RunsOnEmptyText)
            };
        }

        let mut cursor = 0;
        for (index, run) in self.runs.iter().enumerate() {
            if run.start >= run.end {
                return Err(PayloadViolation::EmptyRun { index });
            }
            if run.end > len {
                return Err(PayloadViolation::OutOfBounds {
                    index,
                    end: run.end,
                    len,
                });
            }
            if run.start > cursor {
                return Err(PayloadViolation::Gap {
                    start: cursor,
                    end: run.start,
                });
            }
            if run.start < cursor {
                return Err(PayloadViolation::Overlap { index });
            }
            if index > 0 && self.runs[index - 1].style == run.style {
                return Err(PayloadViolation::Uncoalesced { index });
            }
            cursor = run.end;
        }

        if cursor < len {
            return Err(PayloadViolation::Gap {
                start: cursor,
                end: len,
            });
        }
        Ok(())
    }

    /// Walk the text left to right, yielding one segment per covered run.
    ///
    /// Stored runs may be unsorted, overlapping or sparse. Overlaps are
    /// clipped to whatever the earlier run left uncovered, and gaps (including
    /// uncovered trailing text) come back with the default style.
    pub fn segments(&self) -> Vec<Segment<'_>> {
        let offsets: Vec<usize> = self
            .text
            .char_indices()
            .map(|(byte, _)| byte)
            .chain(std::iter::once(self.text.len()))
            .collect();
        let len = offsets.len() - 1;
        let slice = |range: &Range<usize>| char_slice(&self.text, &offsets, range);

        let mut ordered: Vec<&Run> = self.runs.iter().collect();
        ordered.sort_by_key(|run| run.start);

        let mut segments = Vec::with_capacity(ordered.len() + 1);
        let mut cursor = 0;
        for run in ordered {
            let start = run.start.min(len);
            if start > cursor {
                let range = cursor..start;
                segments.push(Segment {
                    text: slice(&range),
                    range,
                    style: Style::default(),
                });
                cursor = start;
            }

            let start = start.max(cursor);
            let end = run.end.min(len);
            if start < end {
                let range = start..end;
                segments.push(Segment {
                    text: slice(&range),
                    range,
                    style: run.style.clone(),
                });
                cursor = end;
            }
        }

        if cursor < len {
            let range = cursor..len;
            segments.push(Segment {
                text: slice(&range),
                range,
                style: Style::default(),
            });
        }
        segments
    }

    /// Repair arbitrary stored runs into a payload that passes [`Payload::check`].
    pub fn normalized(&self) -> Payload {
        let mut builder = RunBuilder::new();
        for segment in self.segments() {
            builder.push(segment.text, &segment.style);
        }
        builder.finish()
    }
}

fn char_slice<'a>(text: &'a str, offsets: &[usize], range: &Range<usize>) -> &'a str {
    &text[offsets[range.start]..offsets[range.end]]
}

/// Accumulates text and runs while keeping the payload invariants.
///
/// `push` appends a segment and either extends the last run (same style) or
/// opens a new one, so the result is always coverage-complete and coalesced.
#[derive(Debug, Clone, Default)]
pub struct RunBuilder {
    text: String,
    len: usize,
    runs: Vec<Run>,
}

impl RunBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: &str, style: &Style) {
        let added = segment.chars().count();
        if added == 0 {
            return;
        }
        self.text.push_str(segment);
        let start = self.len;
        self.len += added;

        if let Some(last) = self.runs.last_mut() {
            if last.style == *style {
                last.end = self.len;
                return;
            }
        }
        self.runs.push(Run::new(start, self.len, style.clone()));
    }

    /// Length of the accumulated text in chars.
    pub fn len_chars(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove exactly one trailing `"\n"`, shrinking or dropping the last run.
    pub fn pop_trailing_newline(&mut self) -> bool {
        if !self.text.ends_with('\n') {
            return false;
        }
        self.text.pop();
        self.len -= 1;
        if let Some(last) = self.runs.last_mut() {
            last.end = last.end.min(self.len);
            if last.is_empty() {
                self.runs.pop();
            }
        }
        true
    }

    pub fn finish(self) -> Payload {
        Payload {
            text: self.text,
            runs: self.runs,
        }
    }
}
