use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::ModelConfig;
use crate::error::{Result, SubgenError};
use super::types::{
    GeminiContent, GeminiErrorBody, GeminiPart, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, InlineDataContent,
};
use super::{ContentPart, GenerativeModel, ModelRequest};

/// Gemini REST client authenticated with an API key
pub struct GeminiClient {
    client: Client,
    config: ModelConfig,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: ModelConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("subgen/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn api_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_request_body(&self, request: ModelRequest) -> GenerateContentRequest {
        let parts = request
            .parts
            .into_iter()
            .map(|part| match part {
                ContentPart::Text(text) => GeminiPart::Text { text, thought: None },
                ContentPart::InlineData { mime_type, data } => GeminiPart::InlineData {
                    inline_data: InlineDataContent {
                        mime_type,
                        data: STANDARD.encode(data),
                    },
                },
            })
            .collect();

        GenerateContentRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: self.config.temperature.map(|temperature| GenerationConfig {
                temperature: Some(temperature),
            }),
        }
    }
}

/// Turn an API error body into a readable message.
fn parse_api_error(body: &str) -> String {
    match serde_json::from_str::<GeminiErrorBody>(body) {
        Ok(parsed) => match parsed.error.status {
            Some(status) => format!("{} ({})", parsed.error.message, status),
            None => parsed.error.message,
        },
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: ModelRequest) -> Result<String> {
        let body = self.build_request_body(request);
        let url = self.api_url();

        debug!("Sending generateContent request to: {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SubgenError::ModelRequest(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SubgenError::ModelRequest(format!(
                "Gemini API error {}: {}",
                status,
                parse_api_error(&error_text)
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| SubgenError::ModelRequest(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = &parsed.usage_metadata {
            info!(
                "Model {} used {} prompt / {} output tokens",
                self.config.model, usage.prompt_token_count, usage.candidates_token_count
            );
        }

        match parsed.first_candidate_text() {
            Some(text) => {
                debug!("Raw model response: {}", text);
                // Anything but a natural stop means the answer may be cut short.
                match parsed.candidates.first().and_then(|c| c.finish_reason.as_deref()) {
                    None | Some("STOP") => Ok(text),
                    Some(reason) => {
                        warn!("Model stopped early: {}", reason);
                        Err(SubgenError::ModelRequest(format!(
                            "Model answer is incomplete (finish reason {})",
                            reason
                        )))
                    }
                }
            }
            None => {
                let reason = parsed
                    .prompt_feedback
                    .and_then(|feedback| feedback.block_reason)
                    .or_else(|| parsed.candidates.first().and_then(|c| c.finish_reason.clone()))
                    .unwrap_or_else(|| "no candidates returned".to_string());
                Err(SubgenError::ModelRequest(format!(
                    "Model returned no content: {}",
                    reason
                )))
            }
        }
    }

    fn model_name(&self) -> String {
        self.config.model.clone()
    }
}
