use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    /// The backend answered and refused the request.
    #[error("auth backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("auth backend unreachable: {0}")]
    Transport(String),
    #[error("unexpected auth backend response: {0}")]
    Decode(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("no PKCE code verifier cookie on the request")]
    MissingCodeVerifier,
}

impl GatewayError {
    /// Text shown to the end user.
    ///
    /// Backend rejections are passed through verbatim; everything else is
    /// collapsed into a generic line since the details are operator concerns.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::MissingCodeVerifier => {
                "Sign-in session expired, please start again".to_string()
            }
            Self::Transport(_) | Self::Decode(_) | Self::InvalidUrl(_) => {
                "Authentication service is unavailable, please try again later".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
