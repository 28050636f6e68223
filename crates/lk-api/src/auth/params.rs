//! Validation of the query and route parameters of the auth endpoints.
//!
//! Each request type is built from the raw key/value pairs or not at all;
//! nothing downstream ever sees an unvalidated value.

use std::collections::HashMap;

use lk_gateway::{OAuthProvider, OtpType};

use crate::error::ApiError;

pub const INVALID_CONFIRMATION: &str = "Invalid confirmation code";
pub const INVALID_PROVIDER: &str = "Invalid provider";
pub const INVALID_AUTHORIZATION: &str = "Invalid authorization code";

/// Where to land when no usable `next` was given.
pub const DEFAULT_NEXT: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationRequest {
    pub token_hash: String,
    pub otp_type: OtpType,
    pub next: String,
}

impl ConfirmationRequest {
    pub fn from_query(query: &HashMap<String, String>) -> Result<Self, ApiError> {
        let invalid = || ApiError::InvalidParameters(INVALID_CONFIRMATION);

        let token_hash = query
            .get("token_hash")
            .filter(|t| !t.is_empty())
            .ok_or_else(invalid)?;

        let otp_type = query
            .get("type")
            .and_then(|t| t.parse::<OtpType>().ok())
            .ok_or_else(invalid)?;

        Ok(Self {
            token_hash: token_hash.clone(),
            otp_type,
            next: sanitize_next(query.get("next").map(String::as_str)),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthStartRequest {
    pub provider: OAuthProvider,
    /// Page to open once the callback has set the session.
    pub next: Option<String>,
}

impl OAuthStartRequest {
    pub fn from_params(provider: &str, query: &HashMap<String, String>) -> Result<Self, ApiError> {
        let provider = provider
            .parse::<OAuthProvider>()
            .map_err(|_| ApiError::InvalidParameters(INVALID_PROVIDER))?;

        Ok(Self {
            provider,
            next: query
                .get("next")
                .map(|next| sanitize_next(Some(next.as_str()))),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackRequest {
    pub code: String,
    pub next: String,
}

impl CallbackRequest {
    /// A provider-side failure (`error`, `error_description`) is reported as a
    /// backend failure carrying the provider's own text.
    pub fn from_query(query: &HashMap<String, String>) -> Result<Self, ApiError> {
        let provider_error = query
            .get("error_description")
            .or_else(|| query.get("error"))
            .filter(|e| !e.is_empty());
        if let Some(message) = provider_error {
            return Err(ApiError::BackendVerificationFailed(message.clone()));
        }

        let code = query
            .get("code")
            .filter(|c| !c.is_empty())
            .ok_or(ApiError::InvalidParameters(INVALID_AUTHORIZATION))?;

        Ok(Self {
            code: code.clone(),
            next: sanitize_next(query.get("next").map(String::as_str)),
        })
    }
}

/// Keep `next` only when it is a path on this site.
///
/// Absolute URLs, protocol-relative `//host` forms and backslash tricks are
/// replaced by [`DEFAULT_NEXT`] so a crafted link cannot bounce a freshly
/// signed-in user to another origin.
pub fn sanitize_next(raw: Option<&str>) -> String {
    match raw {
        None | Some("") => DEFAULT_NEXT.to_string(),
        Some(path) if is_local_path(path) => path.to_string(),
        Some(path) => {
            tracing::warn!(next = %path, "Ignoring off-site redirect target");
            DEFAULT_NEXT.to_string()
        }
    }
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.contains('\\')
        && !path.chars().any(char::is_control)
}
