//! GeminiChatBackend - Direct REST API implementation for Gemini.
//!
//! Each call sends the caddie system instruction, the replayed session turns
//! and the new user turn (text plus inline images) to `generateContent`.

use crate::persona::CADDIE_SYSTEM_INSTRUCTION;
use async_trait::async_trait;
use caddie_core::chat::{ChatBackend, ChatTurn};
use caddie_core::config::GeminiConfig;
use caddie_core::error::{CaddieError, Result};
use caddie_core::round::Role;
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Chat backend that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiChatBackend {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    system_instruction: String,
}

impl GeminiChatBackend {
    /// Creates a backend with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: BASE_URL.to_string(),
            system_instruction: CADDIE_SYSTEM_INSTRUCTION.to_string(),
        }
    }

    /// Creates a backend from the `[gemini]` config section.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if the HTTP client cannot be built.
    pub fn from_config(config: &GeminiConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CaddieError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: config.model.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| BASE_URL.to_string()),
            system_instruction: CADDIE_SYSTEM_INSTRUCTION.to_string(),
        })
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Replaces the system instruction sent with every request.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, history: &[ChatTurn], turn: &ChatTurn) -> GenerateContentRequest {
        let contents = history
            .iter()
            .chain(std::iter::once(turn))
            .map(to_content)
            .filter(|content| !content.parts.is_empty())
            .collect();

        GenerateContentRequest {
            contents,
            system_instruction: Some(SystemInstruction {
                parts: vec![Part::Text {
                    text: self.system_instruction.clone(),
                }],
            }),
        }
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String> {
        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            self.base_url,
            model = self.model,
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                let retryable = err.is_connect() || err.is_timeout();
                // Drop the URL so the API key never reaches logs.
                CaddieError::upstream(
                    None,
                    format!("Gemini API request failed: {}", err.without_url()),
                    retryable,
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            CaddieError::upstream(None, format!("Failed to parse Gemini response: {err}"), false)
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl ChatBackend for GeminiChatBackend {
    async fn generate(&self, history: &[ChatTurn], turn: &ChatTurn) -> Result<String> {
        let request = self.build_request(history, turn);
        tracing::debug!(
            "[Gemini] Sending turn to {} ({} contents, {} images)",
            self.model,
            request.contents.len(),
            turn.images.len()
        );

        let reply = self.send_request(&request).await;
        if let Err(e) = &reply {
            tracing::error!("[Gemini] Request failed: {}", e);
        }
        reply
    }
}

fn to_content(turn: &ChatTurn) -> Content {
    let role = match turn.role {
        Role::User => "user",
        Role::Model => "model",
    };

    let mut parts = Vec::with_capacity(1 + turn.images.len());
    if !turn.text.trim().is_empty() {
        parts.push(Part::Text {
            text: turn.text.clone(),
        });
    }
    for image in &turn.images {
        parts.push(Part::InlineData {
            inline_data: InlineDataPayload {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            },
        });
    }

    Content {
        role: role.to_string(),
        parts,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String> {
    let text = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .filter(|text| !text.trim().is_empty());

    text.ok_or_else(|| {
        CaddieError::upstream(
            None,
            "Gemini API returned no text in the response candidates",
            false,
        )
    })
}

fn map_http_error(status: StatusCode, body: String, retry_after: Option<Duration>) -> CaddieError {
    let mut message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    if let Some(delay) = retry_after {
        message = format!("{message} (retry after {}s)", delay.as_secs());
    }

    let retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    CaddieError::upstream(Some(status.as_u16()), message, retryable)
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    // HTTP-date form is not handled
    value.parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use caddie_core::round::ImageAttachment;

    fn backend() -> GeminiChatBackend {
        GeminiChatBackend::new("test-key", "gemini-test")
    }

    #[test]
    fn test_request_body_shape() {
        let history = vec![ChatTurn::model("What's the first hole like?")];
        let turn = ChatTurn::user(
            "Here's my lie",
            vec![ImageAttachment {
                mime_type: "image/jpeg".to_string(),
                data: "AAAA".to_string(),
            }],
        );

        let request = backend().build_request(&history, &turn);
        let json = serde_json::to_value(&request).unwrap();

        assert!(json["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("CaddieAI"));
        let contents = json["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0]["role"], "model");
        assert_eq!(contents[1]["role"], "user");
        assert_eq!(contents[1]["parts"][0]["text"], "Here's my lie");
        assert_eq!(contents[1]["parts"][1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(contents[1]["parts"][1]["inlineData"]["data"], "AAAA");
    }

    #[test]
    fn test_blank_turns_are_skipped() {
        let history = vec![ChatTurn::model("  ")];
        let request = backend().build_request(&history, &ChatTurn::user("hi", Vec::new()));
        assert_eq!(request.contents.len(), 1);
    }

    #[test]
    fn test_custom_system_instruction() {
        let backend = backend().with_system_instruction("Be brief.");
        let request = backend.build_request(&[], &ChatTurn::user("hi", Vec::new()));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Be brief.");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Take the "},{"text":"7 iron."}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text_response(response).unwrap(), "Take the 7 iron.");
    }

    #[test]
    fn test_extract_text_without_candidates() {
        let response: GenerateContentResponse = serde_json::from_str(r#"{}"#).unwrap();
        let err = extract_text_response(response).unwrap_err();
        assert!(err.is_upstream());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_map_http_error() {
        let body = r#"{"error":{"code":503,"message":"The model is overloaded.","status":"UNAVAILABLE"}}"#;
        let err = map_http_error(
            StatusCode::SERVICE_UNAVAILABLE,
            body.to_string(),
            Some(Duration::from_secs(3)),
        );
        assert!(err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Upstream model error (503): UNAVAILABLE: The model is overloaded. (retry after 3s)"
        );

        let err = map_http_error(StatusCode::BAD_REQUEST, "bad".to_string(), None);
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Upstream model error (400): bad");
    }

    #[test]
    fn test_parse_retry_after() {
        let value = HeaderValue::from_static("12");
        assert_eq!(parse_retry_after(Some(&value)), Some(Duration::from_secs(12)));
        let date = HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(parse_retry_after(Some(&date)), None);
        assert_eq!(parse_retry_after(None), None);
    }

    #[test]
    fn test_from_config() {
        let config = GeminiConfig {
            model: "gemini-pro".to_string(),
            base_url: Some("http://localhost:9999".to_string()),
            ..GeminiConfig::default()
        };
        let backend = GeminiChatBackend::from_config(&config, "key").unwrap();
        assert_eq!(backend.model(), "gemini-pro");
        assert_eq!(backend.base_url, "http://localhost:9999");
    }
}
