//! Profile and dashboard derivations
//!
//! Pure functions over the document list and the user's score history as
//! returned by the collaborator. Score entries come in two generations: newer
//! ones carry `percentage`, legacy ones only a raw `score`.

use serde::{Deserialize, Serialize};

use crate::documents::{format_date, parse_date, Document};
use crate::reward::Milestone;

/// Number of documents listed under recent activity
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Reference to a document inside a score entry, either bare or populated
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DocumentRef {
    Id(String),
    Populated {
        #[serde(rename = "_id")]
        id: String,
        #[serde(rename = "originalName", default)]
        original_name: Option<String>,
    },
}

impl DocumentRef {
    pub fn id(&self) -> &str {
        match self {
            DocumentRef::Id(id) => id,
            DocumentRef::Populated { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    #[serde(default)]
    pub document_id: Option<DocumentRef>,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl ScoreEntry {
    /// Percentage, falling back to the legacy raw score
    pub fn value(&self) -> Option<f64> {
        self.percentage.or(self.score)
    }

    pub fn recorded_at(&self) -> String {
        let raw = self
            .date
            .as_deref()
            .or(self.created_at.as_deref())
            .or(self.timestamp.as_deref());
        format_date(raw.and_then(parse_date))
    }
}

/// Response of the profile-refresh collaborator
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub coins: i64,
    #[serde(default)]
    pub scores: Vec<ScoreEntry>,
}

impl Profile {
    pub fn milestone(&self) -> Milestone {
        Milestone::from_balance(self.coins)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityItem {
    pub id: String,
    pub name: String,
    pub date: String,
    pub action: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreHistoryItem {
    pub document_id: Option<String>,
    pub document_name: String,
    pub score: Option<f64>,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_documents: usize,
    pub total_summaries: usize,
    pub total_quizzes: usize,
    pub average_score: i64,
    pub recent_activity: Vec<ActivityItem>,
    pub score_history: Vec<ScoreHistoryItem>,
}

/// Rounded mean score; entries without any value count as zero
pub fn average_score(scores: &[ScoreEntry]) -> i64 {
    if scores.is_empty() {
        return 0;
    }
    let total: f64 = scores.iter().map(|s| s.value().unwrap_or(0.0)).sum();
    (total / scores.len() as f64).round() as i64
}

/// Most recently uploaded documents first; undated documents sort last
pub fn recent_activity(documents: &[Document], limit: usize) -> Vec<ActivityItem> {
    let mut sorted: Vec<&Document> = documents.iter().collect();
    sorted.sort_by_key(|d| std::cmp::Reverse(d.uploaded_at()));

    sorted
        .into_iter()
        .take(limit)
        .map(|doc| ActivityItem {
            id: doc.id.clone(),
            name: doc.original_name.clone(),
            date: format_date(doc.uploaded_at()),
            action: if doc.has_summary() {
                "Processed"
            } else {
                "Uploaded"
            },
        })
        .collect()
}

/// Score history newest first, with document names resolved from the list
pub fn score_history(scores: &[ScoreEntry], documents: &[Document]) -> Vec<ScoreHistoryItem> {
    scores
        .iter()
        .rev()
        .map(|entry| {
            let document_id = entry.document_id.as_ref().map(|r| r.id().to_string());
            let document_name = document_id
                .as_deref()
                .and_then(|id| documents.iter().find(|d| d.id == id))
                .map(|d| d.original_name.clone())
                .unwrap_or_else(|| "Removed document".to_string());

            ScoreHistoryItem {
                document_id,
                document_name,
                score: entry.value(),
                date: entry.recorded_at(),
            }
        })
        .collect()
}

pub fn build_dashboard(documents: &[Document], scores: &[ScoreEntry]) -> DashboardStats {
    DashboardStats {
        total_documents: documents.len(),
        total_summaries: documents.iter().filter(|d| d.has_summary()).count(),
        total_quizzes: documents.iter().filter(|d| d.has_quiz()).count(),
        average_score: average_score(scores),
        recent_activity: recent_activity(documents, RECENT_ACTIVITY_LIMIT),
        score_history: score_history(scores, documents),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, name: &str, date: Option<&str>, summary: Option<&str>) -> Document {
        Document {
            id: id.to_string(),
            original_name: name.to_string(),
            upload_date: date.map(String::from),
            summary: summary.map(String::from),
            ..Default::default()
        }
    }

    fn entry(document_id: Option<&str>, percentage: Option<f64>, score: Option<f64>) -> ScoreEntry {
        ScoreEntry {
            document_id: document_id.map(|id| DocumentRef::Id(id.to_string())),
            percentage,
            score,
            ..Default::default()
        }
    }

    // ============================================================================
    // average_score tests
    // ============================================================================

    #[test]
    fn test_average_score_empty() {
        assert_eq!(average_score(&[]), 0);
    }

    #[test]
    fn test_average_score_legacy_fallback() {
        let scores = vec![
            entry(None, Some(80.0), None),
            entry(None, None, Some(65.0)),
            entry(None, None, None),
        ];
        // (80 + 65 + 0) / 3 = 48.33
        assert_eq!(average_score(&scores), 48);
    }

    #[test]
    fn test_average_score_rounds_half_up() {
        let scores = vec![entry(None, Some(70.0), None), entry(None, Some(71.0), None)];
        assert_eq!(average_score(&scores), 71);
    }

    // ============================================================================
    // recent_activity tests
    // ============================================================================

    #[test]
    fn test_recent_activity_sorted_and_limited() {
        let documents: Vec<Document> = (1..=7)
            .map(|day| {
                doc(
                    &format!("d{day}"),
                    &format!("doc{day}.pdf"),
                    Some(&format!("2024-01-0{day}T00:00:00Z")),
                    (day % 2 == 0).then_some("summary"),
                )
            })
            .collect();

        let activity = recent_activity(&documents, RECENT_ACTIVITY_LIMIT);
        assert_eq!(activity.len(), 5);
        assert_eq!(activity[0].id, "d7");
        assert_eq!(activity[0].action, "Uploaded");
        assert_eq!(activity[1].id, "d6");
        assert_eq!(activity[1].action, "Processed");
        assert_eq!(activity[4].id, "d3");
    }

    #[test]
    fn test_recent_activity_undated_last() {
        let documents = vec![
            doc("a", "a.pdf", None, None),
            doc("b", "b.pdf", Some("2024-01-01T00:00:00Z"), None),
        ];
        let activity = recent_activity(&documents, 5);
        assert_eq!(activity[0].id, "b");
        assert_eq!(activity[1].date, "—");
    }

    // ============================================================================
    // score_history tests
    // ============================================================================

    #[test]
    fn test_score_history_newest_first_with_names() {
        let documents = vec![doc("d1", "algebra.pdf", None, None)];
        let scores = vec![
            entry(Some("d1"), Some(90.0), None),
            entry(Some("gone"), None, Some(40.0)),
        ];
        let history = score_history(&scores, &documents);
        assert_eq!(history[0].document_name, "Removed document");
        assert_eq!(history[0].score, Some(40.0));
        assert_eq!(history[1].document_name, "algebra.pdf");
        assert_eq!(history[1].score, Some(90.0));
    }

    #[test]
    fn test_score_entry_accepts_populated_document() {
        let entry: ScoreEntry = serde_json::from_value(json!({
            "documentId": {"_id": "d1", "originalName": "algebra.pdf"},
            "percentage": 75,
            "date": "2024-05-01T12:30:00Z"
        }))
        .unwrap();
        assert_eq!(entry.document_id.as_ref().unwrap().id(), "d1");
        assert_eq!(entry.recorded_at(), "2024-05-01 12:30:00 UTC");
    }

    // ============================================================================
    // build_dashboard tests
    // ============================================================================

    #[test]
    fn test_build_dashboard_totals() {
        let mut with_quiz = doc("q", "q.pdf", None, Some("text"));
        with_quiz.quiz = Some(vec![json!({"type": "short", "question": "?", "answer": "a"})]);
        let documents = vec![
            with_quiz,
            doc("s", "s.pdf", None, Some("text")),
            doc("e", "e.pdf", None, Some("")),
        ];
        let stats = build_dashboard(&documents, &[]);
        assert_eq!(stats.total_documents, 3);
        assert_eq!(stats.total_summaries, 2);
        assert_eq!(stats.total_quizzes, 1);
        assert_eq!(stats.average_score, 0);
        assert!(stats.score_history.is_empty());
    }

    #[test]
    fn test_profile_milestone() {
        let profile: Profile =
            serde_json::from_value(json!({"username": "ana", "coins": 55})).unwrap();
        assert_eq!(profile.milestone(), Milestone::Silver);
        assert!(profile.scores.is_empty());
    }
}
