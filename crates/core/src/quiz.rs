//! Quiz answers, local verdicts and submission state
//!
//! The grading collaborator is the only authority on a quiz score. This module
//! prepares what gets sent to it (a dense answer payload), renders per-item
//! feedback once a result comes back, and guards the submit action so a quiz
//! instance never has two submissions in flight.
//!
//! Local verdicts are a display aid. They use exact matching for multiple
//! choice and trimmed, case-insensitive matching for short answers, and may
//! disagree with a backend that awards partial credit. The aggregate score
//! shown to the user is always the collaborator's `percentage`.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Percentage at or above which a score is displayed with the success tier
pub const SUCCESS_TIER_PERCENTAGE: f64 = 70.0;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuizError {
    #[error("Quiz has no questions")]
    NoQuestions,

    #[error("A submission is already in progress")]
    SubmissionInFlight,

    #[error("Quiz has already been submitted")]
    AlreadySubmitted,

    #[error("No submission is in progress")]
    NotSubmitting,

    #[error("Question {0} does not exist")]
    UnknownQuestion(usize),

    #[error("Question {0} cannot be answered")]
    Unanswerable(usize),

    #[error("'{value}' is not an option for question {index}")]
    InvalidOption { index: usize, value: String },
}

// ============================================================================
// Question model
// ============================================================================

/// Question as sent by the document collaborator
///
/// Every field is optional so a malformed question can still be read and
/// degraded instead of failing the whole document.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestion {
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub question: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub correct_answer: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub answer: Option<String>,
}

/// Accept strings, numbers and booleans as text; anything else reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice {
        options: Vec<String>,
        correct_answer: String,
    },
    ShortAnswer {
        reference_answer: String,
    },
    /// Malformed question shown read-only
    Unanswerable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizQuestion {
    pub index: usize,
    pub prompt: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

impl QuizQuestion {
    pub fn is_answerable(&self) -> bool {
        !matches!(self.kind, QuestionKind::Unanswerable { .. })
    }

    /// Whether `answer` is one of the offered options. Non multiple choice questions accept anything.
    pub fn check_choice(&self, answer: &str) -> Result<(), QuizError> {
        match &self.kind {
            QuestionKind::MultipleChoice { options, .. } if !options.iter().any(|o| o == answer) => {
                Err(QuizError::InvalidOption {
                    index: self.index,
                    value: answer.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Convert a collaborator question, degrading malformed ones to [`QuestionKind::Unanswerable`]
    pub fn from_raw(index: usize, raw: RawQuestion) -> Self {
        let prompt = raw.question.unwrap_or_default();

        let kind = match raw.kind.as_deref() {
            Some("mcq") => match (raw.options, raw.correct_answer) {
                (Some(options), Some(correct_answer)) if !options.is_empty() => {
                    QuestionKind::MultipleChoice {
                        options,
                        correct_answer,
                    }
                }
                (Some(options), Some(_)) if options.is_empty() => QuestionKind::Unanswerable {
                    reason: "multiple choice question has no options".to_string(),
                },
                (None, _) => QuestionKind::Unanswerable {
                    reason: "multiple choice question has no options".to_string(),
                },
                _ => QuestionKind::Unanswerable {
                    reason: "multiple choice question has no correct answer".to_string(),
                },
            },
            Some("short") => match raw.answer {
                Some(reference_answer) => QuestionKind::ShortAnswer { reference_answer },
                None => QuestionKind::Unanswerable {
                    reason: "short answer question has no reference answer".to_string(),
                },
            },
            Some(other) => QuestionKind::Unanswerable {
                reason: format!("unknown question type '{other}'"),
            },
            None => QuestionKind::Unanswerable {
                reason: "question has no type".to_string(),
            },
        };

        QuizQuestion {
            index,
            prompt,
            kind,
        }
    }
}

/// Convert a collaborator quiz into typed questions, indexed by position.
///
/// Entries that are not even objects still produce an unanswerable question so
/// indices stay aligned with what the collaborator grades.
pub fn parse_questions(raw: &[serde_json::Value]) -> Vec<QuizQuestion> {
    raw.iter()
        .enumerate()
        .map(|(index, value)| match RawQuestion::deserialize(value) {
            Ok(question) => QuizQuestion::from_raw(index, question),
            Err(e) => QuizQuestion {
                index,
                prompt: String::new(),
                kind: QuestionKind::Unanswerable {
                    reason: format!("malformed question: {e}"),
                },
            },
        })
        .collect()
}

// ============================================================================
// Answers and submission payload
// ============================================================================

/// Sparse answers keyed by question index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<usize, String>);

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, index: usize, answer: impl Into<String>) {
        self.0.insert(index, answer.into());
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(&index).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&usize, &String)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(usize, String)> for AnswerMap {
    fn from_iter<T: IntoIterator<Item = (usize, String)>>(iter: T) -> Self {
        AnswerMap(iter.into_iter().collect())
    }
}

/// Body of `POST /api/documents/save-score`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub document_id: String,
    pub answers: BTreeMap<usize, String>,
}

/// Build a dense answer payload with exactly one entry per question.
///
/// This is the single place where a missing answer becomes the empty string.
pub fn build_submission(questions: &[QuizQuestion], answers: &AnswerMap) -> BTreeMap<usize, String> {
    (0..questions.len())
        .map(|index| (index, answers.get(index).unwrap_or_default().to_string()))
        .collect()
}

// ============================================================================
// Grading and feedback
// ============================================================================

/// Authoritative result returned by the grading collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
    pub obtained: f64,
    pub total: f64,
    pub percentage: f64,
    #[serde(default, alias = "coins")]
    pub reward_balance_after: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
    NotGradable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    Success,
    Info,
}

impl ScoreTier {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= SUCCESS_TIER_PERCENTAGE {
            ScoreTier::Success
        } else {
            ScoreTier::Info
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFeedback {
    pub index: usize,
    pub submitted: String,
    pub verdict: Verdict,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizFeedback {
    pub items: Vec<ItemFeedback>,
    pub obtained: f64,
    pub total: f64,
    pub percentage: f64,
    pub tier: ScoreTier,
}

impl QuizFeedback {
    pub fn score_line(&self) -> String {
        format!("Your Score: {}%", self.percentage)
    }
}

/// Short-answer comparison: trimmed on both sides, case-insensitive, nothing else.
fn short_answer_matches(submitted: &str, reference: &str) -> bool {
    submitted.trim().to_lowercase() == reference.trim().to_lowercase()
}

/// Local, display-only verdict for one question
pub fn local_verdict(question: &QuizQuestion, submitted: &str) -> Verdict {
    let correct = match &question.kind {
        QuestionKind::MultipleChoice { correct_answer, .. } => submitted == correct_answer,
        QuestionKind::ShortAnswer { reference_answer } => {
            short_answer_matches(submitted, reference_answer)
        }
        QuestionKind::Unanswerable { .. } => return Verdict::NotGradable,
    };

    if correct {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    }
}

fn feedback_message(question: &QuizQuestion, verdict: Verdict) -> String {
    match (&question.kind, verdict) {
        (_, Verdict::Correct) => "Correct!".to_string(),
        (QuestionKind::MultipleChoice { correct_answer, .. }, _) => {
            format!("Incorrect. Correct answer: {correct_answer}")
        }
        (QuestionKind::ShortAnswer { reference_answer }, _) => {
            format!("Answer: {reference_answer}")
        }
        (QuestionKind::Unanswerable { .. }, _) => "This question could not be graded.".to_string(),
    }
}

/// Render per-item feedback next to the collaborator's authoritative score.
///
/// The aggregate fields are copied from `result` and never recomputed from the
/// local verdicts.
pub fn score(questions: &[QuizQuestion], answers: &AnswerMap, result: &GradingResult) -> QuizFeedback {
    let submission = build_submission(questions, answers);

    let items = questions
        .iter()
        .zip(submission.into_values())
        .map(|(question, submitted)| {
            let verdict = local_verdict(question, &submitted);
            ItemFeedback {
                index: question.index,
                message: feedback_message(question, verdict),
                submitted,
                verdict,
            }
        })
        .collect();

    QuizFeedback {
        items,
        obtained: result.obtained,
        total: result.total,
        percentage: result.percentage,
        tier: ScoreTier::from_percentage(result.percentage),
    }
}

// ============================================================================
// Submission session
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Answering,
    Submitting,
    Submitted,
}

/// One rendered quiz instance: its questions, the user's answers and the submit gate
#[derive(Debug, Clone)]
pub struct QuizSession {
    document_id: String,
    questions: Vec<QuizQuestion>,
    answers: AnswerMap,
    phase: SessionPhase,
    result: Option<GradingResult>,
}

impl QuizSession {
    pub fn new(document_id: impl Into<String>, questions: Vec<QuizQuestion>) -> Self {
        Self {
            document_id: document_id.into(),
            questions,
            answers: AnswerMap::new(),
            phase: SessionPhase::Answering,
            result: None,
        }
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn result(&self) -> Option<&GradingResult> {
        self.result.as_ref()
    }

    /// Whether the submit action should be offered at all
    pub fn can_submit(&self) -> bool {
        self.phase == SessionPhase::Answering && !self.questions.is_empty()
    }

    fn ensure_answering(&self) -> Result<(), QuizError> {
        match self.phase {
            SessionPhase::Answering => Ok(()),
            SessionPhase::Submitting => Err(QuizError::SubmissionInFlight),
            SessionPhase::Submitted => Err(QuizError::AlreadySubmitted),
        }
    }

    /// Record a free-text answer. Off-option multiple choice text is stored and graded as incorrect.
    pub fn set_answer(&mut self, index: usize, answer: impl Into<String>) -> Result<(), QuizError> {
        self.ensure_answering()?;

        let question = self
            .questions
            .get(index)
            .ok_or(QuizError::UnknownQuestion(index))?;
        if !question.is_answerable() {
            return Err(QuizError::Unanswerable(index));
        }

        self.answers.set(index, answer);
        Ok(())
    }

    /// Store every answer that can be stored and return the indices that were skipped.
    ///
    /// Entries for unknown or unanswerable questions never block the rest of the quiz.
    pub fn apply_answers(&mut self, answers: &AnswerMap) -> Result<Vec<usize>, QuizError> {
        self.ensure_answering()?;

        let mut skipped = Vec::new();
        for (&index, answer) in answers.iter() {
            match self.set_answer(index, answer) {
                Ok(()) => {}
                Err(QuizError::UnknownQuestion(i) | QuizError::Unanswerable(i)) => skipped.push(i),
                Err(e) => return Err(e),
            }
        }
        Ok(skipped)
    }

    /// Lock the session and produce the payload for the grading collaborator.
    pub fn begin_submit(&mut self) -> Result<Submission, QuizError> {
        if self.questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        self.ensure_answering()?;

        self.phase = SessionPhase::Submitting;
        Ok(Submission {
            document_id: self.document_id.clone(),
            answers: build_submission(&self.questions, &self.answers),
        })
    }

    /// The grading call failed; answers are kept so the user can retry.
    pub fn fail_submit(&mut self) {
        if self.phase == SessionPhase::Submitting {
            self.phase = SessionPhase::Answering;
        }
    }

    pub fn complete_submit(&mut self, result: GradingResult) -> Result<QuizFeedback, QuizError> {
        if self.phase != SessionPhase::Submitting {
            return Err(QuizError::NotSubmitting);
        }

        let feedback = score(&self.questions, &self.answers, &result);
        self.result = Some(result);
        self.phase = SessionPhase::Submitted;
        Ok(feedback)
    }

    /// Reopen the quiz unanswered.
    pub fn reopen(&mut self) -> Result<(), QuizError> {
        if self.phase == SessionPhase::Submitting {
            return Err(QuizError::SubmissionInFlight);
        }

        self.answers.clear();
        self.result = None;
        self.phase = SessionPhase::Answering;
        Ok(())
    }
}
