use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lk_gateway::GatewayError;
use lk_site::SiteError;
use serde::Serialize;
use thiserror::Error;

/// Shown under every auth failure. Nothing in the flow retries on its own.
pub const RETRY_HINT: &str = "Please restart the sign-in flow or request a new link.";

#[derive(Error, Debug)]
pub enum ApiError {
    /// Input failed validation; the backend was never called.
    #[error("{0}")]
    InvalidParameters(&'static str),
    /// The auth backend refused the token, code or sign-in.
    #[error("{0}")]
    BackendVerificationFailed(String),
    #[error("Site generation error: {0}")]
    Site(#[from] SiteError),
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self::BackendVerificationFailed(err.user_message())
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidParameters(_) | Self::BackendVerificationFailed(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Site(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            Self::InvalidParameters(message) => ErrorBody {
                error: message.to_string(),
                hint: Some(RETRY_HINT),
            },
            Self::BackendVerificationFailed(message) => ErrorBody {
                error: message,
                hint: Some(RETRY_HINT),
            },
            Self::Site(err) => {
                tracing::error!(error = %err, "Failed to build site document");
                ErrorBody {
                    error: "Internal server error".to_string(),
                    hint: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}
