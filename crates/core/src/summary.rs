//! Summary segmentation
//!
//! AI-generated summaries arrive as unstructured text. This module splits them
//! into a short executive paragraph and a bounded list of key points so the
//! shell can render the points behind an expandable section.
//!
//! Two shapes are recognized:
//!
//! - Text containing a "Key points include:" style delimiter. Everything before
//!   the first delimiter is the executive paragraph; the tail is tokenized into
//!   bullet-like points.
//! - Anything else. The text is split into sentences on `.`; the first three
//!   form the executive paragraph and the next five become key points.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Maximum number of key points taken from a delimited tail.
pub const MAX_DELIMITED_POINTS: usize = 10;

/// Number of sentences that make up the executive paragraph when no delimiter is present.
pub const EXECUTIVE_SENTENCES: usize = 3;

/// Maximum number of trailing sentences promoted to key points.
pub const MAX_SENTENCE_POINTS: usize = 5;

static DELIMITER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bkey(?:\s*(?:concepts|points)\b)?(?:\s*include\b)?\s*:?")
        .expect("key points delimiter regex is valid")
});

static POINT_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-•\n\r,;]+").expect("key point separator regex is valid"));

/// Which rule produced a [`SegmentedSummary`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segmentation {
    /// A key points delimiter was found
    Delimited,
    /// No delimiter; the text was split into sentences
    Sentences,
}

/// A summary split into its executive paragraph and key points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentedSummary {
    pub executive: String,
    pub key_points: Vec<String>,
    pub segmentation: Segmentation,
}

impl SegmentedSummary {
    /// Whether the expandable key points section should be rendered at all
    pub fn has_key_points(&self) -> bool {
        !self.key_points.is_empty()
    }
}

/// Find the first delimiter occurrence that actually qualifies "key".
///
/// A bare "key" (as in "the key idea") is not a delimiter; it must be followed
/// by "points"/"concepts", "include" or a colon.
fn find_delimiter(text: &str) -> Option<regex::Match<'_>> {
    DELIMITER
        .find_iter(text)
        .find(|m| m.as_str().trim_end().len() > "key".len())
}

/// Split a summary into an executive paragraph and key points.
///
/// Deterministic and total: every input, including the empty string, yields a
/// value. An empty `key_points` list means "nothing to expand", not "no summary".
pub fn segment(text: &str) -> SegmentedSummary {
    match find_delimiter(text) {
        Some(delimiter) => segment_delimited(text, delimiter.start(), delimiter.end()),
        None => segment_sentences(text),
    }
}

/// Segment an optional summary, treating a missing or blank one as "no summary".
pub fn segment_optional(text: Option<&str>) -> Option<SegmentedSummary> {
    text.filter(|t| !t.trim().is_empty()).map(segment)
}

fn segment_delimited(text: &str, start: usize, end: usize) -> SegmentedSummary {
    let prefix = text[..start].trim();
    let executive = if prefix.is_empty() {
        text.to_string()
    } else {
        prefix.to_string()
    };

    let key_points = POINT_SEPARATOR
        .split(&text[end..])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .take(MAX_DELIMITED_POINTS)
        .map(String::from)
        .collect();

    SegmentedSummary {
        executive,
        key_points,
        segmentation: Segmentation::Delimited,
    }
}

fn segment_sentences(text: &str) -> SegmentedSummary {
    let sentences: Vec<&str> = text
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let mut executive = sentences
        .iter()
        .take(EXECUTIVE_SENTENCES)
        .copied()
        .collect::<Vec<_>>()
        .join(". ");
    if sentences.len() > EXECUTIVE_SENTENCES {
        executive.push_str("...");
    }

    let key_points = sentences
        .iter()
        .skip(EXECUTIVE_SENTENCES)
        .take(MAX_SENTENCE_POINTS)
        .map(|s| s.to_string())
        .collect();

    SegmentedSummary {
        executive,
        key_points,
        segmentation: Segmentation::Sentences,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // Delimited summaries
    // ============================================================================

    #[test]
    fn test_segment_delimiter_with_prefix() {
        let text = "The paper studies caching. Key points include: eviction, admission; sizing";
        let summary = segment(text);
        assert_eq!(summary.segmentation, Segmentation::Delimited);
        assert_eq!(summary.executive, "The paper studies caching.");
        assert_eq!(summary.key_points, vec!["eviction", "admission", "sizing"]);
    }

    #[test]
    fn test_segment_empty_prefix_falls_back_to_full_text() {
        let text = "Key concepts include: alpha, beta, gamma";
        let summary = segment(text);
        assert_eq!(summary.executive, text);
        assert_eq!(summary.key_points, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_segment_delimiter_is_case_insensitive() {
        let summary = segment("Intro text. KEY POINTS INCLUDE: one, two");
        assert_eq!(summary.executive, "Intro text.");
        assert_eq!(summary.key_points, vec!["one", "two"]);
    }

    #[test]
    fn test_segment_delimiter_without_include() {
        let summary = segment("Overview here.\nKey concepts:\n- first\n- second");
        assert_eq!(summary.executive, "Overview here.");
        assert_eq!(summary.key_points, vec!["first", "second"]);
    }

    #[test]
    fn test_segment_bullets_and_newlines() {
        let summary = segment("Lead. Key points include:\n• one\n• two\r\n-- three");
        assert_eq!(summary.key_points, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_segment_delimiter_with_empty_tail() {
        let summary = segment("Lead paragraph. Key points include:");
        assert_eq!(summary.executive, "Lead paragraph.");
        assert!(summary.key_points.is_empty());
        assert!(!summary.has_key_points());
    }

    #[test]
    fn test_segment_truncates_to_ten_points() {
        let tail: Vec<String> = (1..=15).map(|i| format!("p{i}")).collect();
        let text = format!("Lead. Key points include: {}", tail.join(", "));
        let summary = segment(&text);
        assert_eq!(summary.key_points.len(), MAX_DELIMITED_POINTS);
        assert_eq!(summary.key_points[0], "p1");
        assert_eq!(summary.key_points[9], "p10");
    }

    #[test]
    fn test_segment_splits_at_first_delimiter_only() {
        let summary = segment("Lead. Key points: a, b. Key concepts: c");
        assert_eq!(summary.executive, "Lead.");
        assert_eq!(summary.key_points, vec!["a", "b. Key concepts: c"]);
    }

    #[test]
    fn test_segment_bare_key_word_is_not_a_delimiter() {
        let summary = segment("The key idea is simple. Monkeys use keyboards");
        assert_eq!(summary.segmentation, Segmentation::Sentences);
    }

    #[test]
    fn test_segment_never_splits_inside_a_word() {
        let summary = segment("The key includes safety. Second. Third. Fourth.");
        assert_eq!(summary.segmentation, Segmentation::Sentences);
        assert_eq!(summary.executive, "The key includes safety. Second. Third...");
        assert_eq!(summary.key_points, vec!["Fourth"]);

        let summary = segment("Lead. Key pointsmith notes: a");
        assert_eq!(summary.segmentation, Segmentation::Sentences);

        let summary = segment("Lead. Key points include: a, b");
        assert_eq!(summary.key_points, vec!["a", "b"]);
    }

    // ============================================================================
    // Sentence fallback
    // ============================================================================

    #[test]
    fn test_segment_five_sentences() {
        let summary = segment("A. B. C. D. E.");
        assert_eq!(summary.segmentation, Segmentation::Sentences);
        assert_eq!(summary.executive, "A. B. C...");
        assert_eq!(summary.key_points, vec!["D", "E"]);
    }

    #[test]
    fn test_segment_fewer_than_four_sentences_has_no_ellipsis() {
        let summary = segment("First idea. Second idea. Third idea.");
        assert_eq!(summary.executive, "First idea. Second idea. Third idea");
        assert!(!summary.executive.ends_with("..."));
        assert!(summary.key_points.is_empty());
    }

    #[test]
    fn test_segment_caps_sentence_points_at_five() {
        let text = "S0. S1. S2. S3. S4. S5. S6. S7. S8. S9.";
        let summary = segment(text);
        assert_eq!(summary.key_points, vec!["S3", "S4", "S5", "S6", "S7"]);
    }

    #[test]
    fn test_segment_keeps_duplicate_sentences() {
        let summary = segment("A. B. C. Same. Same.");
        assert_eq!(summary.key_points, vec!["Same", "Same"]);
    }

    #[test]
    fn test_segment_no_periods_no_delimiter() {
        let summary = segment("just one run-on thought with no stop");
        assert_eq!(summary.executive, "just one run-on thought with no stop");
        assert!(summary.key_points.is_empty());
    }

    #[test]
    fn test_segment_empty_text() {
        let summary = segment("");
        assert_eq!(summary.executive, "");
        assert!(summary.key_points.is_empty());
    }

    #[test]
    fn test_segment_is_deterministic() {
        let text = "Lead. Key points include: x, y, z";
        assert_eq!(segment(text), segment(text));
    }

    // ============================================================================
    // segment_optional
    // ============================================================================

    #[test]
    fn test_segment_optional_missing_or_blank() {
        assert!(segment_optional(None).is_none());
        assert!(segment_optional(Some("")).is_none());
        assert!(segment_optional(Some("   ")).is_none());
    }

    #[test]
    fn test_segment_optional_present() {
        let summary = segment_optional(Some("A. B.")).unwrap();
        assert_eq!(summary.executive, "A. B");
    }
}
