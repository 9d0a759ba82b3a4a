use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::SubgenError;
use crate::workflow::{PipelineError, Stage};

/// Single JSON error body returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

#[derive(Debug)]
pub struct HttpError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl HttpError {
    /// Rejected at the boundary, before the pipeline runs.
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::from(PipelineError {
            stage: Stage::Input,
            error: SubgenError::Validation(message.into()),
        })
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

pub fn status_for(error: &SubgenError) -> StatusCode {
    match error {
        SubgenError::Validation(_) => StatusCode::BAD_REQUEST,
        SubgenError::ModelRequest(_) | SubgenError::Http(_) => StatusCode::BAD_GATEWAY,
        SubgenError::FormatViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SubgenError::Extraction(_)
        | SubgenError::Config(_)
        | SubgenError::Toml(_)
        | SubgenError::Io(_)
        | SubgenError::Json(_)
        | SubgenError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<PipelineError> for HttpError {
    fn from(err: PipelineError) -> Self {
        let status = status_for(&err.error);
        let kind = err.error.kind();
        let (message, raw) = match err.error {
            SubgenError::FormatViolation { reason, raw } => (reason, Some(raw)),
            other => (other.to_string(), None),
        };

        Self {
            status,
            body: ErrorBody {
                error: kind,
                stage: Some(err.stage),
                message,
                raw,
            },
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
