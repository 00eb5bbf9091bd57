//! Sitemap XML serialization

use crate::sitemap::{SitemapError, SitemapResult};
use chrono::{SecondsFormat, Utc};
use std::path::Path;

/// The sitemaps.org namespace every generated document declares
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Fixed change frequency recorded for every entry
const CHANGEFREQ: &str = "weekly";

/// Fixed priority recorded for every entry
const PRIORITY: &str = "0.8";

/// Serializes a link set to a sitemap document at the given path
///
/// Produces an XML declaration, a `urlset` root in the sitemaps.org
/// namespace, and one `url` entry per link with an escaped `loc`, a single
/// `lastmod` timestamp shared by all entries of this write, and fixed
/// `changefreq`/`priority` values. Any existing file at the path is
/// overwritten.
///
/// # Arguments
///
/// * `urls` - The discovered links, in output order
/// * `path` - Destination file path
pub fn write<S: AsRef<str>>(urls: &[S], path: &Path) -> SitemapResult<()> {
    let lastmod = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let xml = render(urls, &lastmod);

    std::fs::write(path, xml).map_err(|source| SitemapError::Write {
        path: path.display().to_string(),
        source,
    })
}

/// Counts the `<loc>` entries in a persisted sitemap file
///
/// This is the count the escalation controller acts on; it reflects exactly
/// what was written to disk, not the in-memory set size.
pub fn count(path: &Path) -> SitemapResult<usize> {
    let content = std::fs::read_to_string(path).map_err(|source| SitemapError::Read {
        path: path.display().to_string(),
        source,
    })?;

    Ok(content.matches("<loc>").count())
}

/// Renders the sitemap document as a string
fn render<S: AsRef<str>>(urls: &[S], lastmod: &str) -> String {
    let mut xml = String::with_capacity(128 + urls.len() * 160);

    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<urlset xmlns=\"{}\">\n", SITEMAP_NS));

    for url in urls {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(url.as_ref())));
        xml.push_str(&format!("    <lastmod>{}</lastmod>\n", lastmod));
        xml.push_str(&format!("    <changefreq>{}</changefreq>\n", CHANGEFREQ));
        xml.push_str(&format!("    <priority>{}</priority>\n", PRIORITY));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Escapes the five XML special characters
fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
