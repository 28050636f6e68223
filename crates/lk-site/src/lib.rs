//! Site infrastructure documents: `robots.txt` and `sitemap.xml`.

pub mod error;
pub mod robots;
pub mod sitemap;

pub use error::SiteError;
pub use robots::RobotsConfig;
pub use sitemap::{ContentSource, SitemapConfig, SitemapUrl};
