use std::{fmt, str::FromStr};

use axum_extra::extract::cookie::Cookie;
use serde::{Deserialize, Serialize};

/// Kind of one-time token carried by a confirmation link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpType {
    Email,
    Recovery,
    EmailChange,
}

impl OtpType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Recovery => "recovery",
            Self::EmailChange => "email_change",
        }
    }
}

impl fmt::Display for OtpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtpType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "recovery" => Ok(Self::Recovery),
            "email_change" => Ok(Self::EmailChange),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Identity providers enabled for social sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Github,
    Kakao,
}

impl OAuthProvider {
    pub const ALL: [Self; 2] = [Self::Github, Self::Kakao];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Kakao => "kakao",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|provider| provider.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Returned when a wire name matches none of the enum variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value: {0:?}")]
pub struct UnknownVariant(pub String);

/// Session as issued by the auth backend.
///
/// Only the fields needed to recognise a session are typed; the remainder of
/// the payload (user record, provider tokens) is kept as-is so the cookie
/// carries exactly what the backend sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Cookies the backend wants set on the browser, to be forwarded untouched.
#[derive(Debug, Clone, Default)]
pub struct SessionCookies(pub Vec<Cookie<'static>>);

impl SessionCookies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cookie: Cookie<'static>) {
        self.0.push(cookie);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie<'static>> {
        self.0.iter()
    }
}

impl IntoIterator for SessionCookies {
    type Item = Cookie<'static>;
    type IntoIter = std::vec::IntoIter<Cookie<'static>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<Vec<Cookie<'static>>> for SessionCookies {
    fn from(cookies: Vec<Cookie<'static>>) -> Self {
        Self(cookies)
    }
}

/// Successful token verification.
///
/// `message` is set when the backend accepted the link without opening a
/// session yet, e.g. the first half of a double-confirmed email change.
#[derive(Debug, Clone, Default)]
pub struct VerifiedToken {
    pub message: Option<String>,
    pub cookies: SessionCookies,
}

/// Start of a provider sign-in: where to send the browser and what to remember.
#[derive(Debug, Clone)]
pub struct OAuthStart {
    pub url: String,
    pub cookies: SessionCookies,
}
