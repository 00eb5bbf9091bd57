use url::Url;

/// Normalizes a single raw href candidate into an absolute URL
///
/// # Normalization Steps
///
/// 1. Trim; reject empty and fragment-only references
/// 2. Reject non-navigational schemes (`mailto:`, `tel:`, `javascript:`,
///    `data:`, and anything else that is not HTTP(S))
/// 3. Resolve protocol-relative references (`//host/path`) against the
///    page's own scheme
/// 4. Resolve root-relative and document-relative references against the
///    in-document `<base>` URL when one exists, otherwise the page URL
/// 5. Strip the fragment (`#...`)
/// 6. Strip embedded basic-auth credentials (`user:pass@host`)
///
/// Same-site filtering and asset-denylist filtering are applied by the
/// caller; this function is only concerned with producing a well-formed
/// absolute URL.
///
/// # Arguments
///
/// * `href` - The raw reference as found in the markup
/// * `doc_base` - The resolved `<base href>` of the document, if any
/// * `page_url` - The page's own absolute URL
///
/// # Returns
///
/// * `Some(Url)` - A normalized absolute HTTP(S) URL
/// * `None` - The candidate is non-navigational or malformed
pub fn normalize_candidate(href: &str, doc_base: Option<&Url>, page_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut url = if href.starts_with("//") {
        // Protocol-relative: adopt the page's scheme
        Url::parse(&format!("{}:{}", page_url.scheme(), href)).ok()?
    } else if let Some(scheme) = leading_scheme(href) {
        // Any explicit non-HTTP(S) scheme is non-navigational
        if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
            return None;
        }
        Url::parse(href).ok()?
    } else {
        // Relative reference: prefer the document's <base>, else the page
        doc_base.unwrap_or(page_url).join(href).ok()?
    };

    // Strip fragment
    url.set_fragment(None);

    // Strip basic-auth credentials
    if url.username() != "" || url.password().is_some() {
        url.set_username("").ok()?;
        url.set_password(None).ok()?;
    }

    Some(url)
}

/// Returns the scheme of a reference like `mailto:...` or `https://...`
///
/// A scheme is an initial ASCII-alphabetic character followed by
/// alphanumerics, `+`, `-` or `.`, terminated by `:`. References without
/// such a prefix (plain paths, `./x`, `?q=1`) return `None`.
fn leading_scheme(href: &str) -> Option<&str> {
    let bytes = href.as_bytes();

    if !bytes.first()?.is_ascii_alphabetic() {
        return None;
    }

    for (i, b) in bytes.iter().enumerate().skip(1) {
        match b {
            b':' => return Some(&href[..i]),
            b if b.is_ascii_alphanumeric() => {}
            b'+' | b'-' | b'.' => {}
            _ => return None,
        }
    }

    None
}
