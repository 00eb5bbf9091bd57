use url::Url;

/// Static-asset extensions that never belong in a sitemap
///
/// Matched against the final path segment, lowercased; query strings are not
/// part of `Url::path()` so `style.css?v=3` is still rejected.
const ASSET_EXTENSIONS: &[&str] = &[
    // stylesheets and scripts
    "css", "js", "mjs", "map",
    // images
    "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "bmp", "avif", "tiff",
    // fonts
    "woff", "woff2", "ttf", "eot", "otf",
    // audio/video
    "mp3", "mp4", "webm", "ogg", "wav", "avi", "mov", "mkv",
    // archives and executables
    "zip", "gz", "tar", "bz2", "7z", "rar", "exe", "dmg", "msi", "apk", "bin",
    // other binary documents
    "pdf",
];

/// Checks whether two hostnames belong to the same site
///
/// Hostnames are compared case-insensitively and are considered equal when
/// they differ only by a leading `www.` on either side, so `www.example.com`
/// and `example.com` are the same site in both directions.
///
/// # Examples
///
/// ```
/// use dementor::extract::same_site;
///
/// assert!(same_site("www.example.com", "example.com"));
/// assert!(same_site("example.com", "www.example.com"));
/// assert!(!same_site("blog.example.com", "example.com"));
/// ```
pub fn same_site(host: &str, base_host: &str) -> bool {
    let a = host.to_lowercase();
    let b = base_host.to_lowercase();

    if a == b {
        return true;
    }

    strip_www(&a) == strip_www(&b)
}

/// Removes a single leading `www.` label if present
fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Checks whether a URL points at a denylisted static asset
///
/// The check looks at the extension of the last path segment only; a URL with
/// no dot in its final segment is never an asset.
pub fn is_denylisted_asset(url: &Url) -> bool {
    let path = url.path();

    let last_segment = match path.rsplit('/').next() {
        Some(s) if !s.is_empty() => s,
        _ => return false,
    };

    let extension = match last_segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => return false,
    };

    ASSET_EXTENSIONS.contains(&extension.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_host_matches() {
        assert!(same_site("example.com", "example.com"));
    }

    #[test]
    fn test_www_prefix_either_side() {
        assert!(same_site("www.example.com", "example.com"));
        assert!(same_site("example.com", "www.example.com"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(same_site("EXAMPLE.com", "example.COM"));
    }

    #[test]
    fn test_subdomain_rejected() {
        assert!(!same_site("blog.example.com", "example.com"));
        assert!(!same_site("blog.example.com", "www.example.com"));
    }

    #[test]
    fn test_different_host_rejected() {
        assert!(!same_site("other.com", "example.com"));
    }

    #[test]
    fn test_www_only_on_one_label() {
        // "wwwexample.com" has no www. label to strip
        assert!(!same_site("wwwexample.com", "example.com"));
    }

    #[test]
    fn test_css_is_asset() {
        let url = Url::parse("https://example.com/style.css").unwrap();
        assert!(is_denylisted_asset(&url));
    }

    #[test]
    fn test_asset_with_query_string() {
        let url = Url::parse("https://example.com/app.js?v=12").unwrap();
        assert!(is_denylisted_asset(&url));
    }

    #[test]
    fn test_uppercase_extension() {
        let url = Url::parse("https://example.com/logo.PNG").unwrap();
        assert!(is_denylisted_asset(&url));
    }

    #[test]
    fn test_page_is_not_asset() {
        let url = Url::parse("https://example.com/services/dental-care").unwrap();
        assert!(!is_denylisted_asset(&url));
    }

    #[test]
    fn test_html_extension_allowed() {
        let url = Url::parse("https://example.com/page.html").unwrap();
        assert!(!is_denylisted_asset(&url));
    }

    #[test]
    fn test_dotted_directory_not_asset() {
        // Extension check only applies to the final segment
        let url = Url::parse("https://example.com/v1.2/pricing").unwrap();
        assert!(!is_denylisted_asset(&url));
    }

    #[test]
    fn test_hidden_file_not_asset() {
        // ".css" has an empty stem; treat as a name, not an extension
        let url = Url::parse("https://example.com/.css").unwrap();
        assert!(!is_denylisted_asset(&url));
    }

    #[test]
    fn test_root_not_asset() {
        let url = Url::parse("https://example.com/").unwrap();
        assert!(!is_denylisted_asset(&url));
    }
}
