use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quiz::{parse_questions, QuizQuestion};
use crate::summary::{segment_optional, SegmentedSummary};

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Document as returned by `GET /api/documents` and `GET /api/documents/{id}`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub original_name: String,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub quiz: Option<Vec<serde_json::Value>>,
}

impl Document {
    pub fn has_summary(&self) -> bool {
        self.summary.as_deref().is_some_and(|s| !s.is_empty())
    }

    pub fn has_quiz(&self) -> bool {
        self.quiz.as_ref().is_some_and(|q| !q.is_empty())
    }

    /// Segmented summary, or `None` when the document has no summary yet
    pub fn segmented_summary(&self) -> Option<SegmentedSummary> {
        segment_optional(self.summary.as_deref())
    }

    pub fn questions(&self) -> Vec<QuizQuestion> {
        self.quiz.as_deref().map(parse_questions).unwrap_or_default()
    }

    pub fn uploaded_at(&self) -> Option<DateTime<Utc>> {
        self.upload_date.as_deref().and_then(parse_date)
    }
}

/// Parse an RFC 3339 timestamp as sent by the collaborator
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "—".to_string())
}

/// Human-readable size with base-1024 units rounded to two decimals
///
/// `0 → "0 Bytes"`, `1536 → "1.5 KB"`
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}

/// Reject non-PDF uploads before any network call
pub fn is_pdf_path(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;

    #[test]
    fn test_document_deserialize_minimal() {
        let doc: Document = serde_json::from_value(json!({
            "_id": "abc",
            "originalName": "notes.pdf",
            "uploadDate": "2024-03-01T10:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(doc.id, "abc");
        assert!(!doc.has_summary());
        assert!(!doc.has_quiz());
        assert!(doc.segmented_summary().is_none());
        assert!(doc.questions().is_empty());
        assert_eq!(
            format_date(doc.uploaded_at()),
            "2024-03-01 10:00:00 UTC"
        );
    }

    #[test]
    fn test_document_empty_summary_is_no_summary() {
        let doc = Document {
            summary: Some(String::new()),
            quiz: Some(vec![]),
            ..Default::default()
        };
        assert!(!doc.has_summary());
        assert!(!doc.has_quiz());
    }

    #[test]
    fn test_document_questions_and_summary() {
        let doc = Document {
            summary: Some("A. B. C. D.".to_string()),
            quiz: Some(vec![json!({"type": "short", "question": "Q", "answer": "a"})]),
            ..Default::default()
        };
        assert_eq!(doc.questions().len(), 1);
        assert_eq!(doc.segmented_summary().unwrap().key_points, vec!["D"]);
    }

    #[test]
    fn test_format_date_missing_or_invalid() {
        assert_eq!(format_date(None), "—");
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024 + 1024 * 300), "5.29 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
    }

    #[test]
    fn test_is_pdf_path() {
        assert!(is_pdf_path(Path::new("paper.pdf")));
        assert!(is_pdf_path(Path::new("/tmp/SCAN.PDF")));
        assert!(!is_pdf_path(Path::new("notes.txt")));
        assert!(!is_pdf_path(Path::new("pdf")));
    }
}
