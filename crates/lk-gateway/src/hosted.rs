use std::{fmt, time::Duration};

use async_trait::async_trait;
use axum_extra::extract::cookie::CookieJar;
use oauth2::PkceCodeChallenge;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::{
    AuthGateway, GatewayError, OAuthProvider, OAuthStart, OtpType, Session, SessionCookies,
    VerifiedToken, cookies::CookieSettings,
};

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub anon_key: String,
    pub timeout: Duration,
    pub cookies: CookieSettings,
}

/// [`AuthGateway`] backed by the hosted backend's `/auth/v1` REST API.
#[derive(Clone)]
pub struct HostedAuthGateway {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    cookies: CookieSettings,
}

impl fmt::Debug for HostedAuthGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostedAuthGateway")
            .field("base_url", &self.base_url)
            .field("cookies", &self.cookies)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct VerifyBody<'a> {
    #[serde(rename = "type")]
    otp_type: OtpType,
    token_hash: &'a str,
}

#[derive(Serialize)]
struct PkceExchangeBody<'a> {
    auth_code: &'a str,
    code_verifier: &'a str,
}

/// `/verify` answers with a session, or with a notice when no session is
/// opened yet (email change awaiting its second confirmation).
#[derive(Deserialize)]
#[serde(untagged)]
enum VerifyResponse {
    Session(Box<Session>),
    Notice(Notice),
}

#[derive(Deserialize)]
struct Notice {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HostedAuthGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        Url::parse(&config.base_url)
            .map_err(|e| GatewayError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key,
            cookies: config.cookies,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        let raw = format!("{}/auth/v1/{path}", self.base_url);
        Url::parse(&raw).map_err(|e| GatewayError::InvalidUrl(format!("{raw}: {e}")))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, GatewayError> {
        let response = request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        tracing::debug!(status = status.as_u16(), %message, "Auth backend rejected request");

        Err(GatewayError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// First human-readable field of an error payload.
fn error_message(status: StatusCode, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    [
        parsed.msg,
        parsed.error_description,
        parsed.message,
        parsed.error,
    ]
    .into_iter()
    .flatten()
    .find(|m| !m.trim().is_empty())
    .unwrap_or_else(|| format!("Authentication failed with status {}", status.as_u16()))
}

#[async_trait]
impl AuthGateway for HostedAuthGateway {
    async fn verify_token(
        &self,
        token_hash: &str,
        otp_type: OtpType,
        cookies: &CookieJar,
    ) -> Result<VerifiedToken, GatewayError> {
        let url = self.endpoint("verify")?;
        let response = self
            .send(self.client.post(url).json(&VerifyBody {
                otp_type,
                token_hash,
            }))
            .await?;

        match response.json::<VerifyResponse>().await? {
            VerifyResponse::Session(session) => Ok(VerifiedToken {
                message: None,
                cookies: self.cookies.session_cookies(&session, cookies)?,
            }),
            VerifyResponse::Notice(notice) => Ok(VerifiedToken {
                message: notice.msg.or(notice.message),
                cookies: SessionCookies::new(),
            }),
        }
    }

    async fn start_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<OAuthStart, GatewayError> {
        Url::parse(redirect_to)
            .map_err(|e| GatewayError::InvalidUrl(format!("{redirect_to}: {e}")))?;

        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();

        let mut url = self.endpoint("authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", challenge.as_str())
            .append_pair("code_challenge_method", "s256");

        let mut cookies = SessionCookies::new();
        cookies.push(self.cookies.code_verifier_cookie(verifier.secret().clone()));

        Ok(OAuthStart {
            url: url.into(),
            cookies,
        })
    }

    async fn exchange_code(
        &self,
        code: &str,
        cookies: &CookieJar,
    ) -> Result<SessionCookies, GatewayError> {
        let verifier_name = self.cookies.code_verifier_name();
        let verifier = cookies
            .get(&verifier_name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(GatewayError::MissingCodeVerifier)?;

        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", "pkce");

        let response = self
            .send(self.client.post(url).json(&PkceExchangeBody {
                auth_code: code,
                code_verifier: &verifier,
            }))
            .await?;

        let session: Session = response.json().await?;

        let mut issued = self.cookies.session_cookies(&session, cookies)?;
        issued.push(self.cookies.removal_cookie(verifier_name));

        Ok(issued)
    }
}
