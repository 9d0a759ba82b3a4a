use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubgenError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Audio extraction failed: {0}")]
    Extraction(String),

    #[error("Model request failed: {0}")]
    ModelRequest(String),

    /// Model output that does not follow the subtitle grammar, or that changed
    /// numbering/timing during translation. `raw` is the untouched model text.
    #[error("Model output violates subtitle format: {reason}")]
    FormatViolation { reason: String, raw: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SubgenError {
    pub fn format_violation(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::FormatViolation {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Extraction(_) => "extraction_error",
            Self::ModelRequest(_) | Self::Http(_) => "model_request_error",
            Self::FormatViolation { .. } => "format_violation_error",
            Self::Config(_) | Self::Toml(_) => "configuration_error",
            Self::Io(_) | Self::Json(_) | Self::Internal(_) => "internal_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, SubgenError>;
