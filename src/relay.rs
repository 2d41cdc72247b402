//! OpenRouter chat-completions client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;

pub struct Client {
    api_key: Option<String>,
    settings: RelaySettings,
    http: reqwest::Client,
}

/// Fixed request parameters for every relay call.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl RelaySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.request_timeout,
        }
    }
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: [ApiMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl Client {
    pub fn new(api_key: Option<String>, settings: RelaySettings) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(Self {
            api_key,
            settings,
            http,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Send `prompt` as a single user message and return the first completion.
    pub async fn relay(&self, prompt: &str) -> Result<String, Error> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(Error::NotConfigured);
        };

        info!("🤖 Relaying prompt ({} chars) to {}", prompt.chars().count(), self.settings.model);

        let request = ApiRequest {
            model: &self.settings.model,
            messages: [ApiMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let result = self.send(api_key, &request).await;
        if let Err(ref e) = result {
            warn!("Relay failed: {e}");
        }
        result
    }

    async fn send(&self, api_key: &str, request: &ApiRequest<'_>) -> Result<String, Error> {
        let response = self
            .http
            .post(&self.settings.api_url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(Error::from_reqwest)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::from_reqwest)?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            return Err(Error::Transport(format!("{status}: {detail}")));
        }

        parse_completion(&body)
    }
}

/// Pull `choices[0].message.content` out of a completion body.
fn parse_completion(body: &str) -> Result<String, Error> {
    let parsed: ApiResponse =
        serde_json::from_str(body).map_err(|e| Error::MalformedResponse(e.to_string()))?;

    let content = parsed
        .choices
        .ok_or_else(|| Error::MalformedResponse("no choices in response".into()))?
        .into_iter()
        .next()
        .ok_or_else(|| Error::MalformedResponse("empty choices array".into()))?
        .message
        .and_then(|m| m.content)
        .ok_or_else(|| Error::MalformedResponse("no message content".into()))?;

    if content.trim().is_empty() {
        return Err(Error::MalformedResponse("empty completion".into()));
    }
    Ok(content)
}

#[derive(Debug)]
pub enum Error {
    /// No API key configured; nothing was sent.
    NotConfigured,
    Timeout,
    Transport(String),
    MalformedResponse(String),
}

impl Error {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout
        } else {
            Error::Transport(e.to_string())
        }
    }

    /// Short text shown to the Discord user.
    pub fn user_message(&self) -> String {
        match self {
            Error::NotConfigured => "❌ AI service is not configured.".to_string(),
            Error::Timeout => "⚠️ Error: the AI service took too long to respond.".to_string(),
            Error::Transport(e) => {
                let short: String = e.chars().take(100).collect();
                format!("⚠️ Error: {short}")
            }
            Error::MalformedResponse(_) => "❌ No response from AI.".to_string(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NotConfigured => write!(f, "OpenRouter API key not configured"),
            Error::Timeout => write!(f, "Request timed out"),
            Error::Transport(e) => write!(f, "Transport error: {e}"),
            Error::MalformedResponse(e) => write!(f, "Malformed response: {e}"),
        }
    }
}

impl std::error::Error for Error {}
