//! Remote generation adapter: Gemini image redesign/edit, the advisory chat
//! session and the before/after compositor.

mod advisor;
mod compare;
mod designer;

use std::sync::Arc;
use std::time::Duration;

use makemyroom_contracts::config::Settings;
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub use advisor::{extract_advice, AdvisorySession, ADVICE_FALLBACK_TEXT};
pub use compare::compose_comparison;
pub use designer::{edit_instruction, extract_image, redesign_instruction, Designer};

const ERROR_BODY_MAX_CHARS: usize = 512;

#[derive(Debug, Error)]
pub enum DesignError {
    #[error("API key not found (set API_KEY, GEMINI_API_KEY or GOOGLE_API_KEY)")]
    MissingCredential,
    #[error("Gemini request failed ({endpoint})")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Gemini request failed ({status}): {body}")]
    Service { status: u16, body: String },
    #[error("Gemini returned an invalid payload: {0}")]
    InvalidPayload(String),
    #[error("no image produced")]
    NoImageProduced,
}

impl DesignError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingCredential)
    }
}

/// One `generateContent` round trip. Stateless; no retries.
pub trait Transport: Send + Sync {
    fn generate_content(
        &self,
        model: &str,
        api_key: &str,
        payload: &Value,
    ) -> Result<Value, DesignError>;
}

pub struct HttpTransport {
    api_base: String,
    http: HttpClient,
}

impl HttpTransport {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let timeout = settings.api.request_timeout_secs.map(Duration::from_secs);
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self::with_client(&settings.api.base_url, http))
    }

    pub(crate) fn with_client(api_base: &str, http: HttpClient) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn shared(settings: &Settings) -> anyhow::Result<Arc<dyn Transport>> {
        Ok(Arc::new(Self::new(settings)?))
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        endpoint_for_model(&self.api_base, model)
    }
}

impl Transport for HttpTransport {
    fn generate_content(
        &self,
        model: &str,
        api_key: &str,
        payload: &Value,
    ) -> Result<Value, DesignError> {
        let endpoint = self.endpoint_for_model(model);
        debug!(%endpoint, "posting generateContent");
        let response = self
            .http
            .post(&endpoint)
            .header("x-goog-api-key", api_key)
            .json(payload)
            .send()
            .map_err(|source| DesignError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;
        response_json_or_error(&endpoint, response)
    }
}

fn endpoint_for_model(api_base: &str, model: &str) -> String {
    let trimmed = model.trim();
    let model_path = if trimmed.starts_with("models/") {
        trimmed.to_string()
    } else {
        format!("models/{trimmed}")
    };
    format!("{api_base}/{model_path}:generateContent")
}

fn response_json_or_error(endpoint: &str, response: HttpResponse) -> Result<Value, DesignError> {
    let status = response.status();
    let body = response.text().map_err(|source| DesignError::Transport {
        endpoint: endpoint.to_string(),
        source,
    })?;
    if !status.is_success() {
        return Err(DesignError::Service {
            status: status.as_u16(),
            body: truncate_text(&body, ERROR_BODY_MAX_CHARS),
        });
    }
    serde_json::from_str(&body).map_err(|err| DesignError::InvalidPayload(err.to_string()))
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

fn credential(settings_key: Option<&str>) -> Result<&str, DesignError> {
    settings_key
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(DesignError::MissingCredential)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use serde_json::Value;

    use super::{DesignError, Transport};

    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedRequest {
        pub model: String,
        pub api_key: String,
        pub payload: Value,
    }

    /// Replays canned responses in order and records every request.
    #[derive(Default)]
    pub struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<Value, DesignError>>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl ScriptedTransport {
        pub fn new(replies: Vec<Result<Value, DesignError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().map(|rows| rows.clone()).unwrap_or_default()
        }
    }

    impl Transport for ScriptedTransport {
        fn generate_content(
            &self,
            model: &str,
            api_key: &str,
            payload: &Value,
        ) -> Result<Value, DesignError> {
            self.requests
                .lock()
                .expect("requests lock")
                .push(RecordedRequest {
                    model: model.to_string(),
                    api_key: api_key.to_string(),
                    payload: payload.clone(),
                });
            self.replies
                .lock()
                .expect("replies lock")
                .pop_front()
                .unwrap_or_else(|| Err(DesignError::InvalidPayload("script exhausted".into())))
        }
    }
}
