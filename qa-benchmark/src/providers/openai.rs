//! OpenAI chat-completions client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::{GenerationSettings, ProviderError, ProviderResult, TextGenerator};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI API client
pub struct OpenAIClient {
    api_key: String,
    base_url: String,
    http_client: Client,
    settings: GenerationSettings,
}

impl OpenAIClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http_client: Client::new(),
            settings: GenerationSettings::new(DEFAULT_MODEL),
        }
    }

    /// Set custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Reasoning models reject `temperature` and `max_tokens`
    fn is_reasoning_model(&self) -> bool {
        let model = &self.settings.model;
        model.starts_with("o1") || model.starts_with("o3") || model.starts_with("o4") || model.starts_with("gpt-5")
    }

    fn request_body(&self, prompt: &str) -> OpenAIRequest {
        let messages = vec![OpenAIMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        }];

        if self.is_reasoning_model() {
            OpenAIRequest {
                model: self.settings.model.clone(),
                messages,
                max_tokens: None,
                max_completion_tokens: Some(self.settings.max_output_tokens),
                temperature: None,
            }
        } else {
            OpenAIRequest {
                model: self.settings.model.clone(),
                messages,
                max_tokens: Some(self.settings.max_output_tokens),
                max_completion_tokens: None,
                temperature: self.settings.temperature,
            }
        }
    }
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    /// Null when the model returned only a refusal or tool call
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIError {
    error: OpenAIErrorDetail,
}

#[derive(Deserialize)]
struct OpenAIErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

#[async_trait]
impl TextGenerator for OpenAIClient {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn generate(&self, prompt: &str) -> ProviderResult<String> {
        let body = self.request_body(prompt);

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if status == 429 {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60)
                * 1000;

            // insufficient_quota also arrives as 429 but never clears on retry
            let body = response.text().await.unwrap_or_default();
            if let Ok(error) = serde_json::from_str::<OpenAIError>(&body) {
                if error.error.error_type.as_deref() == Some("insufficient_quota") {
                    return Err(ProviderError::Config(format!(
                        "OpenAI quota exceeded: {}",
                        error.error.message
                    )));
                }
                tracing::debug!("Rate limited: {}", error.error.message);
            }

            return Err(ProviderError::RateLimited { retry_after_ms });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<OpenAIError>(&body) {
                Ok(error) => error.error.message,
                Err(_) => format!("HTTP {}: {}", status.as_u16(), body),
            };

            if status == 401 || status == 403 {
                return Err(ProviderError::Config(format!(
                    "OpenAI auth error ({}): {}",
                    status.as_u16(),
                    message
                )));
            }

            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let api_response: OpenAIResponse = response.json().await?;

        api_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default().trim().to_string())
            .ok_or_else(|| ProviderError::Parse("No choices in response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_for_chat_model() {
        let client = OpenAIClient::new("key".into())
            .with_settings(GenerationSettings::new("gpt-4o-mini").with_temperature(0.3));
        let body = serde_json::to_value(client.request_body("Who is Woland?")).unwrap();
        assert_eq!(body["messages"][0]["content"], "Who is Woland?");
        assert_eq!(body["max_tokens"], 2048);
        assert!(body.get("max_completion_tokens").is_none());
    }

    #[test]
    fn test_request_body_for_reasoning_model() {
        let client = OpenAIClient::new("key".into())
            .with_settings(GenerationSettings::new("o3-mini").with_temperature(0.3));
        let body = serde_json::to_value(client.request_body("prompt")).unwrap();
        assert!(body.get("temperature").is_none());
        assert_eq!(body["max_completion_tokens"], 2048);
    }

    #[test]
    fn test_parse_response() {
        let raw = r#"{"choices": [{"message": {"role": "assistant", "content": " Woland. "}}]}"#;
        let parsed: OpenAIResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some(" Woland. "));

        let empty: OpenAIResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#).unwrap();
        assert!(empty.choices[0].message.content.is_none());
    }
}
