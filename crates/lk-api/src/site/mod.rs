//! Crawler-facing documents: `robots.txt` and `sitemap.xml`.

mod routes;

pub use routes::routes;
