use std::sync::Arc;

use lk_gateway::{AuthGateway, CookieSettings, GatewayConfig, HostedAuthGateway};
use lk_site::{RobotsConfig, SitemapConfig};

use crate::{ApiConfig, config::Environment};

#[derive(Clone)]
pub struct ApiState {
    pub gateway: Arc<dyn AuthGateway>,
    pub environment: Environment,
    /// Absolute URL of the OAuth callback route.
    pub auth_callback_url: String,
    pub robots: Arc<RobotsConfig>,
    pub sitemap: Arc<SitemapConfig>,
}

impl ApiState {
    /// State talking to the configured hosted auth backend.
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let cookies = CookieSettings::for_backend(
            &config.auth_backend_url,
            !config.env.is_development(),
            config.cookie_domain.clone(),
            config.session_cookie_max_age_days,
        )?;

        let gateway = HostedAuthGateway::new(GatewayConfig {
            base_url: config.auth_backend_url.clone(),
            anon_key: config.auth_backend_anon_key.clone(),
            timeout: config.auth_backend_timeout(),
            cookies,
        })?;

        tracing::info!(
            backend = %config.auth_backend_url,
            "Auth gateway configured"
        );

        Ok(Self::with_gateway(config, Arc::new(gateway)))
    }

    /// State over any gateway implementation; tests pass a fake here.
    pub fn with_gateway(config: &ApiConfig, gateway: Arc<dyn AuthGateway>) -> Self {
        Self {
            gateway,
            environment: config.env,
            auth_callback_url: config.auth_callback_url(),
            robots: Arc::new(config.robots_config()),
            sitemap: Arc::new(config.sitemap_config()),
        }
    }
}

impl std::fmt::Debug for ApiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiState")
            .field("environment", &self.environment)
            .field("auth_callback_url", &self.auth_callback_url)
            .field("robots", &self.robots)
            .field("sitemap", &self.sitemap)
            .finish_non_exhaustive()
    }
}
