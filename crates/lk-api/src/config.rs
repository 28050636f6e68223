use std::{net::SocketAddr, path::PathBuf, time::Duration};

use axum::http::Uri;
use lk_site::{ContentSource, RobotsConfig, SitemapConfig};
use serde::Deserialize;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub const fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Env(#[from] envy::Error),
    #[error("{name} must be an absolute http(s) URL, got {value:?}")]
    InvalidUrl { name: &'static str, value: String },
    #[error("invalid bind address: {0}")]
    BindAddress(String),
}

/// Server configuration, read once at startup from the environment.
///
/// Variable names are the upper-cased field names (`SITE_URL`,
/// `AUTH_BACKEND_URL`, ...). Everything except the site URL and the auth
/// backend coordinates has a default.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub env: Environment,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub site_url: String,
    pub auth_backend_url: String,
    pub auth_backend_anon_key: String,
    #[serde(default = "default_backend_timeout_secs")]
    pub auth_backend_timeout_secs: u64,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    #[serde(default)]
    pub cookie_domain: Option<String>,
    #[serde(default = "default_session_cookie_max_age_days")]
    pub session_cookie_max_age_days: i64,
    #[serde(default = "default_blog_content_dir")]
    pub blog_content_dir: PathBuf,
    #[serde(default = "default_docs_content_dir")]
    pub docs_content_dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_backend_timeout_secs() -> u64 {
    10
}

// Browsers cap cookie lifetime at 400 days.
const fn default_session_cookie_max_age_days() -> i64 {
    400
}

fn default_blog_content_dir() -> PathBuf {
    PathBuf::from("content/blog")
}

fn default_docs_content_dir() -> PathBuf {
    PathBuf::from("content/docs")
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        envy::from_env::<Self>()?.validated()
    }

    /// Same as [`ApiConfig::from_env`] but over an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Self>(vars)?.validated()
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        self.site_url = absolute_url("SITE_URL", &self.site_url)?;
        self.auth_backend_url = absolute_url("AUTH_BACKEND_URL", &self.auth_backend_url)?;

        self.cookie_domain = self
            .cookie_domain
            .take()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(self)
    }

    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::BindAddress(raw))
    }

    /// CORS allow-list; the site itself when nothing is configured.
    pub fn parsed_allowed_origins(&self) -> Vec<String> {
        let origins = self
            .allowed_origins
            .iter()
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect::<Vec<_>>();

        if origins.is_empty() {
            vec![self.site_url.clone()]
        } else {
            origins
        }
    }

    /// Absolute URL the OAuth provider sends the browser back to.
    pub fn auth_callback_url(&self) -> String {
        format!("{}{}", self.site_url, crate::auth::CALLBACK_PATH)
    }

    pub const fn auth_backend_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_backend_timeout_secs)
    }

    pub fn robots_config(&self) -> RobotsConfig {
        RobotsConfig::new(self.site_url.clone())
    }

    pub fn sitemap_config(&self) -> SitemapConfig {
        SitemapConfig::new(
            self.site_url.clone(),
            vec![
                ContentSource::new(self.blog_content_dir.clone(), "/blog"),
                ContentSource::new(self.docs_content_dir.clone(), "/docs"),
            ],
        )
    }
}

/// Validate an absolute http(s) URL and drop any trailing slash.
fn absolute_url(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let invalid = || ConfigError::InvalidUrl {
        name,
        value: value.to_string(),
    };

    let trimmed = value.trim().trim_end_matches('/');
    let uri = trimmed.parse::<Uri>().map_err(|_| invalid())?;

    match (uri.scheme_str(), uri.authority()) {
        (Some("http" | "https"), Some(_)) => Ok(trimmed.to_string()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(extra: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut vars = vec![
            ("SITE_URL", "https://example.com/"),
            ("AUTH_BACKEND_URL", "https://abcdefgh.supabase.co"),
            ("AUTH_BACKEND_ANON_KEY", "anon"),
        ];
        for (key, value) in extra {
            vars.retain(|(k, _)| k != key);
            vars.push((*key, *value));
        }
        vars.into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_vars(vars(&[])).unwrap();

        assert_eq!(config.env, Environment::Development);
        assert_eq!(config.site_url, "https://example.com");
        assert_eq!(config.bind_address().unwrap().port(), 3000);
        assert_eq!(config.auth_backend_timeout(), Duration::from_secs(10));
        assert_eq!(config.auth_callback_url(), "https://example.com/auth/callback");
        assert_eq!(config.parsed_allowed_origins(), vec!["https://example.com"]);
        assert_eq!(config.session_cookie_max_age_days, 400);
        assert!(config.cookie_domain.is_none());

        let sitemap = config.sitemap_config();
        assert_eq!(sitemap.sources.len(), 2);
        assert_eq!(sitemap.sources[0].dir, PathBuf::from("content/blog"));
        assert_eq!(sitemap.sources[1].route_prefix, "/docs");
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_vars(vars(&[
            ("ENV", "production"),
            ("PORT", "8080"),
            ("ALLOWED_ORIGINS", "https://a.example.com/,https://b.example.com"),
            ("COOKIE_DOMAIN", " example.com "),
        ]))
        .unwrap();

        assert!(config.env.is_production());
        assert_eq!(config.bind_address().unwrap().port(), 8080);
        assert_eq!(
            config.parsed_allowed_origins(),
            vec!["https://a.example.com", "https://b.example.com"]
        );
        assert_eq!(config.cookie_domain.as_deref(), Some("example.com"));
    }

    #[test]
    fn test_missing_required_variable() {
        let vars = vec![("SITE_URL".to_string(), "https://example.com".to_string())];
        assert!(matches!(
            ApiConfig::from_vars(vars),
            Err(ConfigError::Env(_))
        ));
    }

    #[test]
    fn test_rejects_relative_site_url() {
        let err = ApiConfig::from_vars(vars(&[("SITE_URL", "example.com")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { name: "SITE_URL", .. }));

        let err = ApiConfig::from_vars(vars(&[("AUTH_BACKEND_URL", "ftp://x.example.com")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { name: "AUTH_BACKEND_URL", .. }));
    }
}
