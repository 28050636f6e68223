//! Browser cookies carrying the backend session.
//!
//! The layout matches what the backend's own browser and server SDKs read:
//! a storage key derived from the project host, a `base64-` prefixed value,
//! and numbered chunks when the value would not fit in a single cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::{GatewayError, Session, SessionCookies};

/// Largest value stored in one cookie before splitting into chunks.
pub const MAX_CHUNK_SIZE: usize = 3180;

/// Prefix marking a base64url-encoded session value.
pub const BASE64_PREFIX: &str = "base64-";

/// How long the PKCE verifier survives while the user is at the provider.
pub const CODE_VERIFIER_EXPIRY_MINUTES: i64 = 10;

#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub storage_key: String,
    pub secure: bool,
    pub domain: Option<String>,
    pub max_age_days: i64,
}

impl CookieSettings {
    /// Settings for a backend hosted at `base_url`.
    pub fn for_backend(
        base_url: &str,
        secure: bool,
        domain: Option<String>,
        max_age_days: i64,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            storage_key: storage_key(base_url)?,
            secure,
            domain,
            max_age_days,
        })
    }

    pub fn code_verifier_name(&self) -> String {
        format!("{}-code-verifier", self.storage_key)
    }

    fn build(&self, name: String, value: String, max_age: time::Duration) -> Cookie<'static> {
        let mut cookie = Cookie::build((name, value))
            .path("/")
            .max_age(max_age)
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .build();

        if let Some(domain) = &self.domain {
            cookie.set_domain(domain.clone());
        }

        cookie
    }

    /// Cookies holding `session`, chunked when needed.
    ///
    /// Any session cookie in `existing` (the request cookies) that the new
    /// layout does not overwrite is removed, so a reader never mixes an old
    /// unchunked value with new chunks or the other way round. A chunked
    /// session always removes the unchunked key.
    pub fn session_cookies(
        &self,
        session: &Session,
        existing: &CookieJar,
    ) -> Result<SessionCookies, GatewayError> {
        let json = serde_json::to_string(session)
            .map_err(|e| GatewayError::Decode(format!("failed to serialize session: {e}")))?;
        let value = format!("{BASE64_PREFIX}{}", URL_SAFE_NO_PAD.encode(json));
        let max_age = time::Duration::days(self.max_age_days);

        let chunks = chunk_value(&self.storage_key, &value);
        let chunked = chunks.iter().all(|(name, _)| *name != self.storage_key);

        let mut stale = existing
            .iter()
            .map(|c| c.name().to_string())
            .filter(|name| self.is_session_cookie(name))
            .filter(|name| !chunks.iter().any(|(new, _)| new == name))
            .collect::<Vec<_>>();
        if chunked && !stale.contains(&self.storage_key) {
            stale.push(self.storage_key.clone());
        }
        stale.sort();

        let mut cookies = chunks
            .into_iter()
            .map(|(name, chunk)| self.build(name, chunk, max_age))
            .collect::<Vec<_>>();
        cookies.extend(stale.into_iter().map(|name| self.removal_cookie(name)));

        Ok(cookies.into())
    }

    /// `<key>` or one of its `<key>.<n>` chunks.
    fn is_session_cookie(&self, name: &str) -> bool {
        match name.strip_prefix(self.storage_key.as_str()) {
            Some("") => true,
            Some(rest) => rest
                .strip_prefix('.')
                .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())),
            None => false,
        }
    }

    pub fn code_verifier_cookie(&self, verifier: String) -> Cookie<'static> {
        self.build(
            self.code_verifier_name(),
            verifier,
            time::Duration::minutes(CODE_VERIFIER_EXPIRY_MINUTES),
        )
    }

    /// Expired cookie telling the browser to drop `name`.
    pub fn removal_cookie(&self, name: String) -> Cookie<'static> {
        let mut cookie = self.build(name, String::new(), time::Duration::ZERO);
        cookie.make_removal();
        cookie
    }
}

/// `sb-<first host label>-auth-token`
pub fn storage_key(base_url: &str) -> Result<String, GatewayError> {
    let url = reqwest::Url::parse(base_url)
        .map_err(|e| GatewayError::InvalidUrl(format!("{base_url}: {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| GatewayError::InvalidUrl(format!("{base_url}: missing host")))?;
    let project = host.split('.').next().unwrap_or(host);

    Ok(format!("sb-{project}-auth-token"))
}

/// Split `value` across `key`, or `key.0`, `key.1`, ... when it is too long.
pub fn chunk_value(key: &str, value: &str) -> Vec<(String, String)> {
    if value.len() <= MAX_CHUNK_SIZE {
        return vec![(key.to_string(), value.to_string())];
    }

    // Values are base64url text, so byte offsets are always char boundaries.
    value
        .as_bytes()
        .chunks(MAX_CHUNK_SIZE)
        .enumerate()
        .map(|(i, chunk)| {
            (
                format!("{key}.{i}"),
                String::from_utf8_lossy(chunk).into_owned(),
            )
        })
        .collect()
}

/// Reassemble and decode a session value split by [`chunk_value`].
pub fn decode_value(value: &str) -> Option<String> {
    let encoded = value.strip_prefix(BASE64_PREFIX)?;
    let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
    String::from_utf8(bytes).ok()
}
