//! HTTP client for the document collaborator
//!
//! Every call maps a failed response to [`Error::Api`] with a message chosen by
//! `docquiz_core::failure`, so commands can print it verbatim. Nothing here
//! retries; the user re-runs the command.

use docquiz_core::dashboard::Profile;
use docquiz_core::documents::Document;
use docquiz_core::failure::{describe_failure, Action, ApiErrorBody};
use docquiz_core::quiz::{GradingResult, Submission};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::prelude::{println, *};

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// API configuration from environment variables
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl ApiConfig {
    /// Load configuration from environment variables
    /// Uses DOCQUIZ_API_URL with default fallback
    /// Uses DOCQUIZ_TOKEN if set and non-empty
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("DOCQUIZ_API_URL")
                .ok()
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            token: std::env::var("DOCQUIZ_TOKEN").ok().filter(|t| !t.is_empty()),
        }
    }

    /// Apply CLI overrides to the configuration
    pub fn with_overrides(mut self, base_url: Option<String>, token: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.token = Some(token);
        }
        self
    }
}

/// Create an HTTP client with JSON and optional Bearer auth headers
pub fn create_client(config: &ApiConfig) -> Result<reqwest::Client> {
    use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(token) = &config.token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| Error::Config(format!("Invalid token header value: {e}")))?,
        );
    }

    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| eyre!("Failed to build HTTP client: {}", e))
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary: String,
}

#[derive(Debug, Deserialize)]
struct QuizResponse {
    #[serde(default)]
    quiz: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProfileResponse {
    Wrapped { user: Profile },
    Bare(Profile),
}

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_global(global: &crate::Global) -> Result<Self> {
        let config =
            ApiConfig::from_env().with_overrides(global.api_url.clone(), global.token.clone());
        if global.verbose {
            println!("API Base: {}", config.base_url);
        }
        Self::new(&config)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        action: Action,
    ) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            log::warn!("{action:?} request failed: {e}");
            Error::Network(describe_failure(action, None))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::debug!("{action:?} returned {status}: {body}");
            let body = ApiErrorBody::from_body(&body);
            return Err(Error::Api {
                status,
                message: describe_failure(action, Some(&body)),
            }
            .into());
        }

        response
            .json::<T>()
            .await
            .map_err(|e| eyre!("Failed to parse response: {}", e))
    }

    pub async fn list_documents(&self) -> Result<Vec<Document>> {
        let request = self.client.get(self.endpoint("/api/documents"));
        self.send(request, Action::FetchDocuments).await
    }

    pub async fn get_document(&self, id: &str) -> Result<Document> {
        let request = self.client.get(self.endpoint(&format!("/api/documents/{id}")));
        self.send(request, Action::FetchDocument).await
    }

    /// Upload a PDF as the multipart field `document`
    pub async fn upload(&self, path: &std::path::Path) -> Result<serde_json::Value> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf")
            .to_string();

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new().part("document", part);

        let request = self
            .client
            .post(self.endpoint("/api/documents/upload"))
            .multipart(form);
        self.send(request, Action::Upload).await
    }

    pub async fn generate_summary(&self, id: &str) -> Result<String> {
        let request = self
            .client
            .post(self.endpoint(&format!("/api/documents/{id}/summary")));
        let response: SummaryResponse = self.send(request, Action::GenerateSummary).await?;
        Ok(response.summary)
    }

    pub async fn save_summary(&self, id: &str, summary: &str) -> Result<String> {
        let request = self
            .client
            .patch(self.endpoint(&format!("/api/documents/{id}/summary")))
            .json(&serde_json::json!({ "summary": summary }));
        let response: SummaryResponse = self.send(request, Action::SaveSummary).await?;
        Ok(response.summary)
    }

    pub async fn generate_quiz(&self, id: &str, mcq: bool) -> Result<Vec<serde_json::Value>> {
        let (path, action) = if mcq {
            (format!("/api/documents/{id}/quiz?type=mcq"), Action::GenerateMcq)
        } else {
            (format!("/api/documents/{id}/quiz"), Action::GenerateQuiz)
        };
        let request = self.client.post(self.endpoint(&path));
        let response: QuizResponse = self.send(request, action).await?;
        Ok(response.quiz)
    }

    /// Summary first, then a quiz from it; either failure reports the combined fallback
    pub async fn generate_both(&self, id: &str) -> Result<(String, Vec<serde_json::Value>)> {
        let request = self
            .client
            .post(self.endpoint(&format!("/api/documents/{id}/summary")));
        let summary: SummaryResponse = self.send(request, Action::GenerateBoth).await?;

        let request = self
            .client
            .post(self.endpoint(&format!("/api/documents/{id}/quiz")));
        let quiz: QuizResponse = self.send(request, Action::GenerateBoth).await?;

        Ok((summary.summary, quiz.quiz))
    }

    pub async fn save_score(&self, submission: &Submission) -> Result<GradingResult> {
        let request = self
            .client
            .post(self.endpoint("/api/documents/save-score"))
            .json(submission);
        self.send(request, Action::SubmitQuiz).await
    }

    pub async fn profile(&self) -> Result<Profile> {
        let request = self.client.get(self.endpoint("/api/auth/profile"));
        let response: ProfileResponse = self.send(request, Action::FetchProfile).await?;
        Ok(match response {
            ProfileResponse::Wrapped { user } => user,
            ProfileResponse::Bare(profile) => profile,
        })
    }
}
