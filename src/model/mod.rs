// Generative model access
//
// The requesters talk to the model through the `GenerativeModel` trait:
// - Types: Gemini generateContent wire format
// - Gemini: REST implementation over reqwest

pub mod gemini;
pub mod types;

use async_trait::async_trait;

pub use gemini::GeminiClient;

use crate::error::Result;

/// One part of a multi-part model request
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    InlineData { mime_type: String, data: Vec<u8> },
}

/// A single-turn request: all parts are sent together, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelRequest {
    pub parts: Vec<ContentPart>,
}

impl ModelRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text<S: Into<String>>(mut self, text: S) -> Self {
        self.parts.push(ContentPart::Text(text.into()));
        self
    }

    pub fn inline_data<S: Into<String>>(mut self, mime_type: S, data: Vec<u8>) -> Self {
        self.parts.push(ContentPart::InlineData {
            mime_type: mime_type.into(),
            data,
        });
        self
    }
}

/// External text-generation service. Implementations are stateless per call
/// and safe to share between concurrent requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Issue exactly one request and return the raw answer text.
    async fn generate(&self, request: ModelRequest) -> Result<String>;

    /// Model identifier used in logs
    fn model_name(&self) -> String;
}
