use async_trait::async_trait;
use axum_extra::extract::cookie::CookieJar;

use crate::{GatewayError, OAuthProvider, OAuthStart, OtpType, SessionCookies, VerifiedToken};

/// Operations consumed from the hosted auth backend.
///
/// Implementations own every cookie that establishes or prepares a session;
/// callers only forward what they get back. Each call is made at most once per
/// request and is never retried.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Redeem the token hash of a confirmation link.
    ///
    /// `cookies` are the request cookies, used to clear an older session
    /// stored under a different chunk layout.
    async fn verify_token(
        &self,
        token_hash: &str,
        otp_type: OtpType,
        cookies: &CookieJar,
    ) -> Result<VerifiedToken, GatewayError>;

    /// Begin a provider sign-in that will come back to `redirect_to`.
    async fn start_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<OAuthStart, GatewayError>;

    /// Trade the provider's authorization code for a session.
    ///
    /// `cookies` are the request cookies, which hold the state stored by
    /// [`AuthGateway::start_oauth`].
    async fn exchange_code(
        &self,
        code: &str,
        cookies: &CookieJar,
    ) -> Result<SessionCookies, GatewayError>;
}
