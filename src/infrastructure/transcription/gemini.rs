//! Gemini API transcriber adapter

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ports::{Transcriber, TranscriptionError};
use crate::domain::config::DEFAULT_MODEL;
use crate::domain::transcription::{AudioData, SystemPrompt};

/// Gemini API base URL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Upper bound for one request; long dictations upload a few MB
const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(120);

// Wire format of `models/{model}:generateContent`

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    system_instruction: Instruction<'a>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Instruction<'a> {
    parts: [Part<'a>; 1],
}

/// Serializes as `{"text": ...}` or `{"inlineData": {...}}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    Text(&'a str),
    #[serde(rename_all = "camelCase")]
    InlineData {
        mime_type: &'static str,
        data: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Gemini API transcriber
pub struct GeminiTranscriber {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiTranscriber {
    /// Create a transcriber for the default model
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        }
    }

    /// Use another model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Send requests to another endpoint (a proxy, or a local test server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the API URL
    fn api_url(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }

    /// The recording as the only user turn, the prompt as system instruction
    fn build_request<'a>(audio: &AudioData, prompt: &'a SystemPrompt) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: [Part::InlineData {
                    mime_type: audio.mime_type().as_str(),
                    data: audio.to_base64(),
                }],
            }],
            system_instruction: Instruction {
                parts: [Part::Text(prompt.content())],
            },
            generation_config: GenerationConfig {
                temperature: 0.0,
                // Thinking adds latency without improving dictation
                thinking_config: ThinkingConfig { thinking_budget: 0 },
            },
        }
    }

    /// Text parts of the first candidate, joined and trimmed; `None` if blank
    fn extract_text(response: &GenerateContentResponse) -> Option<String> {
        let text: String = response
            .candidates
            .first()?
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();

        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    fn error_for_status(status: StatusCode, body: &str) -> TranscriptionError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TranscriptionError::InvalidApiKey,
            StatusCode::BAD_REQUEST if body.contains("API key not valid") => {
                TranscriptionError::InvalidApiKey
            }
            StatusCode::TOO_MANY_REQUESTS => TranscriptionError::RateLimited,
            _ => TranscriptionError::ApiError(format!("HTTP {}: {}", status, body)),
        }
    }
}

#[async_trait]
impl Transcriber for GeminiTranscriber {
    async fn transcribe(
        &self,
        audio: &AudioData,
        prompt: &SystemPrompt,
    ) -> Result<String, TranscriptionError> {
        debug!(
            model = %self.model,
            size = %audio.human_readable_size(),
            "Sending audio for transcription"
        );

        let response = self
            .client
            .post(self.api_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::build_request(audio, prompt))
            .send()
            .await
            .map_err(|e| TranscriptionError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Self::error_for_status(status, &body));
        }

        let response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::ParseError(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(TranscriptionError::ApiError(error.message));
        }

        Self::extract_text(&response).ok_or(TranscriptionError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with(parts: Vec<Option<&str>>) -> GenerateContentResponse {
        let parts = parts
            .into_iter()
            .map(|text| ResponsePart {
                text: text.map(String::from),
            })
            .collect();
        GenerateContentResponse {
            candidates: vec![Candidate {
                content: CandidateContent { parts },
            }],
            error: None,
        }
    }

    #[test]
    fn request_carries_audio_and_prompt() {
        let audio = AudioData::new(vec![1, 2, 3], Default::default());
        let prompt = SystemPrompt::default();

        let request = GeminiTranscriber::build_request(&audio, &prompt);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(
            json["contents"][0]["parts"][0]["inlineData"]["mimeType"],
            "audio/flac"
        );
        assert_eq!(json["contents"][0]["parts"][0]["inlineData"]["data"], "AQID");
        assert!(json["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("journal"));
        assert_eq!(json["generationConfig"]["thinkingConfig"]["thinkingBudget"], 0);
    }

    #[test]
    fn sparse_response_deserializes() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(GeminiTranscriber::extract_text(&response).is_none());
    }

    #[test]
    fn url_has_model_but_not_key() {
        let transcriber = GeminiTranscriber::new("secret-key").with_model("custom-model");
        let url = transcriber.api_url();

        assert!(url.ends_with("/custom-model:generateContent"));
        assert!(!url.contains("secret-key"));
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let transcriber = GeminiTranscriber::new("k").with_base_url("http://localhost:1234/");
        assert_eq!(
            transcriber.api_url(),
            format!("http://localhost:1234/{}:generateContent", DEFAULT_MODEL)
        );
    }

    #[test]
    fn extract_joins_and_trims_parts() {
        let response = response_with(vec![Some(" Today I "), None, Some("walked. ")]);
        assert_eq!(
            GeminiTranscriber::extract_text(&response),
            Some("Today I walked.".to_string())
        );
    }

    #[test]
    fn extract_blank_is_none() {
        assert!(GeminiTranscriber::extract_text(&response_with(vec![Some("  ")])).is_none());
        assert!(GeminiTranscriber::extract_text(&GenerateContentResponse::default()).is_none());
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            GeminiTranscriber::error_for_status(StatusCode::FORBIDDEN, ""),
            TranscriptionError::InvalidApiKey
        ));
        assert!(matches!(
            GeminiTranscriber::error_for_status(
                StatusCode::BAD_REQUEST,
                "API key not valid. Please pass a valid API key."
            ),
            TranscriptionError::InvalidApiKey
        ));
        assert!(matches!(
            GeminiTranscriber::error_for_status(StatusCode::TOO_MANY_REQUESTS, ""),
            TranscriptionError::RateLimited
        ));
        assert!(matches!(
            GeminiTranscriber::error_for_status(StatusCode::INTERNAL_SERVER_ERROR, "oops"),
            TranscriptionError::ApiError(_)
        ));
    }
}
