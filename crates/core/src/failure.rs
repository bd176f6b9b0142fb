//! Mapping collaborator failures to user-facing messages
//!
//! Error bodies from the document service look like
//! `{ "message": "...", "error": "...", "code": "..." }`, every field optional.
//! The message shown to the user prefers `message`, then `error`, then a
//! fallback specific to the action that failed. Summary generation also
//! recognizes coded PDF failures and replaces them with a fixed explanation.
//! Nothing here retries.

use serde::{Deserialize, Serialize};

pub const NO_TEXT_EXTRACTED: &str = "NO_TEXT_EXTRACTED";
pub const OCR_FAILED: &str = "OCR_FAILED";

/// Error body returned by the document collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl ApiErrorBody {
    /// Parse a response body, treating anything unparseable as an empty body
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }
}

/// User action whose failure is being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    FetchDocument,
    FetchDocuments,
    GenerateSummary,
    GenerateQuiz,
    GenerateMcq,
    GenerateBoth,
    SaveSummary,
    SubmitQuiz,
    Upload,
    FetchProfile,
}

impl Action {
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Action::FetchDocument => "Failed to fetch document",
            Action::FetchDocuments => "Failed to fetch documents",
            Action::GenerateSummary => "Failed to generate summary.",
            Action::GenerateQuiz => {
                "Failed to generate quiz. Please ensure a summary has been generated first."
            }
            Action::GenerateMcq => {
                "Failed to generate MCQ quiz. Please ensure a summary has been generated first."
            }
            Action::GenerateBoth => "Failed to generate summary and quiz.",
            Action::SaveSummary => "Failed to save summary",
            Action::SubmitQuiz => "Failed to submit quiz.",
            Action::Upload => "Upload failed",
            Action::FetchProfile => "Failed to fetch profile",
        }
    }

    /// Whether the collaborator's own message is shown instead of the fallback
    fn surfaces_backend_message(&self) -> bool {
        matches!(
            self,
            Action::GenerateSummary
                | Action::GenerateQuiz
                | Action::GenerateMcq
                | Action::Upload
                | Action::FetchProfile
        )
    }
}

/// Explanation for a coded PDF failure, if the code is known
pub fn explain_code(code: &str) -> Option<&'static str> {
    match code {
        NO_TEXT_EXTRACTED => Some(
            "Could not extract readable text from this PDF. The PDF may be corrupted, \
             password-protected, or contain only images without text. Please try a different PDF file.",
        ),
        OCR_FAILED => Some(
            "OCR processing failed. The PDF may be corrupted or unsupported. \
             Please try a different PDF file.",
        ),
        _ => None,
    }
}

/// Message to show for a failed action, given the collaborator's error body (if any).
pub fn describe_failure(action: Action, body: Option<&ApiErrorBody>) -> String {
    if action == Action::GenerateSummary {
        if let Some(explanation) = body
            .and_then(|b| b.code.as_deref())
            .and_then(explain_code)
        {
            return explanation.to_string();
        }
    }

    if action.surfaces_backend_message() {
        if let Some(text) = body.and_then(|b| {
            b.message
                .as_deref()
                .filter(|m| !m.is_empty())
                .or(b.error.as_deref().filter(|e| !e.is_empty()))
        }) {
            return text.to_string();
        }
    }

    action.fallback_message().to_string()
}
