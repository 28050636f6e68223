//! `robots.txt` rendering.

/// Paths crawlers are asked to stay out of.
pub const DEFAULT_DISALLOW: &[&str] = &["/api/", "/auth/", "/dashboard/", "/settings/"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobotsConfig {
    /// Public origin without a trailing slash.
    pub site_url: String,
    pub disallow: Vec<String>,
}

impl RobotsConfig {
    pub fn new(site_url: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
            disallow: DEFAULT_DISALLOW.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn sitemap_url(&self) -> String {
        format!("{}/sitemap.xml", self.site_url.trim_end_matches('/'))
    }
}

pub fn render(config: &RobotsConfig) -> String {
    let mut out = String::from("User-Agent: *\nAllow: /\n");

    for path in &config.disallow {
        out.push_str("Disallow: ");
        out.push_str(path);
        out.push('\n');
    }

    out.push('\n');
    out.push_str("Sitemap: ");
    out.push_str(&config.sitemap_url());
    out.push('\n');

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_default_rules() {
        let robots = render(&RobotsConfig::new("https://example.com"));

        assert_eq!(
            robots,
            "User-Agent: *\n\
             Allow: /\n\
             Disallow: /api/\n\
             Disallow: /auth/\n\
             Disallow: /dashboard/\n\
             Disallow: /settings/\n\
             \n\
             Sitemap: https://example.com/sitemap.xml\n"
        );
    }

    #[test]
    fn test_sitemap_url_ignores_trailing_slash() {
        let config = RobotsConfig {
            site_url: "https://example.com/".to_string(),
            disallow: vec![],
        };

        assert_eq!(config.sitemap_url(), "https://example.com/sitemap.xml");
        assert!(!render(&config).contains("Disallow"));
    }
}
