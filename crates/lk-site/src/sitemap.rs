//! `sitemap.xml` generation from static routes and content files.

use std::{
    collections::HashSet,
    io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::SiteError;

/// Extension of the content files that become pages.
pub const CONTENT_EXTENSION: &str = "mdx";

/// Routes that exist regardless of content.
pub const DEFAULT_STATIC_PATHS: &[&str] = &["", "/blog", "/docs", "/pricing", "/sign-in", "/sign-up"];

const XML_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// A directory of content files served under `route_prefix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSource {
    pub dir: PathBuf,
    /// e.g. `/blog`
    pub route_prefix: String,
}

impl ContentSource {
    pub fn new(dir: impl Into<PathBuf>, route_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            route_prefix: route_prefix.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SitemapConfig {
    pub site_url: String,
    pub sources: Vec<ContentSource>,
    pub static_paths: Vec<String>,
    pub extension: String,
}

impl SitemapConfig {
    pub fn new(site_url: impl Into<String>, sources: Vec<ContentSource>) -> Self {
        Self {
            site_url: site_url.into(),
            sources,
            static_paths: DEFAULT_STATIC_PATHS.iter().map(|p| p.to_string()).collect(),
            extension: CONTENT_EXTENSION.to_string(),
        }
    }
}

/// A content file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    /// Path relative to the source directory, extension removed, `/`-separated.
    /// `index` files resolve to their directory.
    pub slug: String,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapUrl {
    pub loc: String,
    pub lastmod: DateTime<Utc>,
}

/// Walk `source.dir` recursively for files ending in `.{extension}`.
///
/// A missing directory is not an error: the site may simply have no content
/// of that kind yet. Dot-files and dot-directories are skipped.
pub async fn scan_source(
    source: &ContentSource,
    extension: &str,
) -> Result<Vec<ContentEntry>, SiteError> {
    let root = source.dir.as_path();
    let mut entries = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut read_dir = match tokio::fs::read_dir(&dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound && dir == root => {
                tracing::debug!(dir = %root.display(), "Content directory not found, skipping");
                return Ok(entries);
            }
            Err(e) => return Err(SiteError::io(&dir, e)),
        };

        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| SiteError::io(&dir, e))?
        {
            let path = entry.path();
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }

            let file_type = entry.file_type().await.map_err(|e| SiteError::io(&path, e))?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file()
                && path.extension().is_some_and(|ext| ext == extension)
            {
                let metadata = entry.metadata().await.map_err(|e| SiteError::io(&path, e))?;
                let modified = metadata
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .map_err(|e| SiteError::io(&path, e))?;

                if let Some(slug) = slug_for(root, &path) {
                    entries.push(ContentEntry { slug, modified });
                }
            }
        }
    }

    entries.sort_by(|a, b| a.slug.cmp(&b.slug));
    Ok(entries)
}

fn slug_for(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let mut parts = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>();

    if parts.last().is_some_and(|last| last == "index") {
        parts.pop();
    }

    Some(parts.join("/"))
}

/// Percent-encode each `/`-separated segment of a slug.
fn encode_slug(slug: &str) -> String {
    slug.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn join_url(site_url: &str, path: &str) -> String {
    format!("{}{}", site_url.trim_end_matches('/'), path)
}

/// Every URL of the site: static paths first, then content pages by location.
pub async fn collect(config: &SitemapConfig, now: DateTime<Utc>) -> Result<Vec<SitemapUrl>, SiteError> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for path in &config.static_paths {
        let loc = join_url(&config.site_url, path);
        if seen.insert(loc.clone()) {
            urls.push(SitemapUrl { loc, lastmod: now });
        }
    }

    let mut content = Vec::new();
    for source in &config.sources {
        let prefix = source.route_prefix.trim_end_matches('/');
        for entry in scan_source(source, &config.extension).await? {
            let path = if entry.slug.is_empty() {
                prefix.to_string()
            } else {
                format!("{prefix}/{}", encode_slug(&entry.slug))
            };
            content.push(SitemapUrl {
                loc: join_url(&config.site_url, &path),
                lastmod: entry.modified,
            });
        }
    }

    content.sort_by(|a, b| a.loc.cmp(&b.loc));
    urls.extend(content.into_iter().filter(|url| seen.insert(url.loc.clone())));

    Ok(urls)
}

pub fn render(urls: &[SitemapUrl]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!("<urlset xmlns=\"{XML_NAMESPACE}\">\n"));

    for url in urls {
        out.push_str("  <url>\n");
        out.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&url.loc)));
        out.push_str(&format!(
            "    <lastmod>{}</lastmod>\n",
            url.lastmod.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        out.push_str("  </url>\n");
    }

    out.push_str("</urlset>\n");
    out
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
