//! Markup-to-link-set extraction
//!
//! Candidates are collected from several attribute families, not just anchor
//! hrefs: any href-bearing element, data-attribute link hints, form submission
//! targets, and URL string literals embedded in inline script text. Every
//! candidate then runs through the shared normalization pipeline and the
//! same-site and asset filters.

use crate::extract::normalize::normalize_candidate;
use crate::extract::origin::{is_denylisted_asset, same_site};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// `rel` values marking a `<link>` as a non-navigational resource
const RESOURCE_RELS: &[&str] = &[
    "stylesheet",
    "icon",
    "preload",
    "prefetch",
    "dns-prefetch",
    "preconnect",
];

/// Data attributes that sites use as link hints on non-anchor elements
const DATA_LINK_ATTRS: &[&str] = &["data-href", "data-url", "data-link"];

/// Extracts the deduplicated set of same-site links from a markup document
///
/// The result preserves first-occurrence order. A page-level
/// `<meta name="robots" content="nofollow">` suppresses extraction entirely;
/// an element-level `rel="nofollow"` suppresses that one candidate.
///
/// This is a pure function of its inputs: no network access, and malformed
/// fragments degrade to skipped candidates rather than errors.
///
/// # Arguments
///
/// * `markup` - The full markup document
/// * `page_url` - The page's own absolute URL, used to resolve relative
///   references and as the same-site anchor
///
/// # Example
///
/// ```
/// use dementor::extract::extract;
/// use url::Url;
///
/// let page = Url::parse("https://site.test/").unwrap();
/// let links = extract(r#"<a href="/a">A</a><a href="https://other.test/b">B</a>"#, &page);
/// assert_eq!(links, vec!["https://site.test/a".to_string()]);
/// ```
pub fn extract(markup: &str, page_url: &Url) -> Vec<String> {
    let document = Html::parse_document(markup);

    let base_host = match page_url.host_str() {
        Some(h) => h.to_string(),
        None => return Vec::new(),
    };

    if page_forbids_following(&document) {
        tracing::debug!("Page-level robots nofollow, suppressing extraction");
        return Vec::new();
    }

    let doc_base = resolve_doc_base(&document, page_url);

    let mut seen: HashSet<String> = HashSet::new();
    let mut links: Vec<String> = Vec::new();

    let mut keep = |candidate: &str| {
        if let Some(url) = normalize_candidate(candidate, doc_base.as_ref(), page_url) {
            let host = match url.host_str() {
                Some(h) => h,
                None => return,
            };
            if !same_site(host, &base_host) || is_denylisted_asset(&url) {
                return;
            }
            let url = url.to_string();
            if seen.insert(url.clone()) {
                links.push(url);
            }
        }
    };

    collect_href_candidates(&document, &mut keep);
    collect_data_attr_candidates(&document, &mut keep);
    collect_form_candidates(&document, &mut keep);
    collect_script_candidates(&document, &mut keep);

    links
}

/// Checks for a page-level `<meta name="robots" content="nofollow">`
fn page_forbids_following(document: &Html) -> bool {
    let meta_selector = match Selector::parse("meta[content]") {
        Ok(s) => s,
        Err(_) => return false,
    };

    document.select(&meta_selector).any(|element| {
        let is_robots = element
            .value()
            .attr("name")
            .map(|n| n.eq_ignore_ascii_case("robots"))
            .unwrap_or(false);

        is_robots
            && element
                .value()
                .attr("content")
                .map(|c| c.to_lowercase().contains("nofollow"))
                .unwrap_or(false)
    })
}

/// Resolves the first `<base href>` element against the page URL, if present
fn resolve_doc_base(document: &Html, page_url: &Url) -> Option<Url> {
    let base_selector = Selector::parse("base[href]").ok()?;
    let href = document
        .select(&base_selector)
        .next()?
        .value()
        .attr("href")?;
    page_url.join(href.trim()).ok()
}

/// Checks for an element-level `rel="nofollow"` marker
fn element_forbids_following(element: &ElementRef) -> bool {
    element
        .value()
        .attr("rel")
        .map(|rel| rel.to_lowercase().contains("nofollow"))
        .unwrap_or(false)
}

/// Collects every href-bearing element, filtering out resource links
///
/// Covers anchors, image-map areas and anything else carrying `href`.
/// `<base>` is the resolution anchor, never a candidate, and `<link>`
/// elements whose `rel` marks a stylesheet/icon/preload resource are skipped.
fn collect_href_candidates(document: &Html, keep: &mut impl FnMut(&str)) {
    let href_selector = match Selector::parse("[href]") {
        Ok(s) => s,
        Err(_) => return,
    };

    for element in document.select(&href_selector) {
        let tag = element.value().name();

        if tag.eq_ignore_ascii_case("base") {
            continue;
        }

        if tag.eq_ignore_ascii_case("link") && is_resource_link(&element) {
            continue;
        }

        if element_forbids_following(&element) {
            continue;
        }

        if let Some(href) = element.value().attr("href") {
            keep(href);
        }
    }
}

/// Checks whether a `<link>` element's rel marks it as a page resource
fn is_resource_link(element: &ElementRef) -> bool {
    element
        .value()
        .attr("rel")
        .map(|rel| {
            let rel = rel.to_lowercase();
            RESOURCE_RELS.iter().any(|r| rel.contains(r))
        })
        .unwrap_or(false)
}

/// Collects data-attribute link hints (`data-href`, `data-url`, `data-link`)
fn collect_data_attr_candidates(document: &Html, keep: &mut impl FnMut(&str)) {
    for attr in DATA_LINK_ATTRS {
        let selector = match Selector::parse(&format!("[{}]", attr)) {
            Ok(s) => s,
            Err(_) => continue,
        };

        for element in document.select(&selector) {
            if element_forbids_following(&element) {
                continue;
            }
            if let Some(value) = element.value().attr(attr) {
                keep(value);
            }
        }
    }
}

/// Collects form submission targets
fn collect_form_candidates(document: &Html, keep: &mut impl FnMut(&str)) {
    let form_selector = match Selector::parse("form[action]") {
        Ok(s) => s,
        Err(_) => return,
    };

    for element in document.select(&form_selector) {
        if let Some(action) = element.value().attr("action") {
            keep(action);
        }
    }
}

/// Collects URL string literals from inline script text
///
/// Matches both fully-qualified `"https://..."` literals and root-relative
/// `"/..."` literals (but not protocol-relative `"//..."`).
fn collect_script_candidates(document: &Html, keep: &mut impl FnMut(&str)) {
    let script_selector = match Selector::parse("script") {
        Ok(s) => s,
        Err(_) => return,
    };

    let literal_re = match Regex::new(r#"["'](https?://[^"'\s]+|/[^/"'\s][^"'\s]*)["']"#) {
        Ok(re) => re,
        Err(_) => return,
    };

    for element in document.select(&script_selector) {
        let text: String = element.text().collect();
        if text.is_empty() {
            continue;
        }

        for capture in literal_re.captures_iter(&text) {
            if let Some(m) = capture.get(1) {
                keep(m.as_str());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://site.test/").unwrap()
    }

    #[test]
    fn test_scenario_cross_origin_and_mailto_rejected() {
        let markup = r#"<html><body><a href="/a">A</a><a href="//x.com/b">B</a><a href="mailto:x@y.com">C</a></body></html>"#;
        let links = extract(markup, &base());
        assert_eq!(links, vec!["https://site.test/a".to_string()]);
    }

    #[test]
    fn test_page_level_nofollow_suppresses_everything() {
        let markup = r#"<html><head><meta name="robots" content="nofollow"></head>
            <body><a href="/a">A</a><a href="/b">B</a><a href="/c">C</a></body></html>"#;
        assert!(extract(markup, &base()).is_empty());
    }

    #[test]
    fn test_page_level_nofollow_case_insensitive() {
        let markup = r#"<meta name="ROBOTS" content="NOINDEX, NOFOLLOW"><a href="/a">A</a>"#;
        assert!(extract(markup, &base()).is_empty());
    }

    #[test]
    fn test_element_level_nofollow_skips_single_link() {
        let markup = r#"<a href="/a" rel="nofollow">A</a><a href="/b">B</a>"#;
        let links = extract(markup, &base());
        assert_eq!(links, vec!["https://site.test/b".to_string()]);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let markup = r#"<a href="/a">A</a><a href="/b#x">B</a><script>go("/c")</script>"#;
        let first = extract(markup, &base());
        let second = extract(markup, &base());
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicates_collapse_to_first_occurrence() {
        let markup = r#"<a href="/a">1</a><a href="/b">2</a><a href="/a">3</a>"#;
        let links = extract(markup, &base());
        assert_eq!(
            links,
            vec![
                "https://site.test/a".to_string(),
                "https://site.test/b".to_string()
            ]
        );
    }

    #[test]
    fn test_fragment_variants_are_one_link() {
        let markup = r##"<a href="/x">A</a><a href="/x#sec2">B</a>"##;
        let links = extract(markup, &base());
        assert_eq!(links, vec!["https://site.test/x".to_string()]);
    }

    #[test]
    fn test_www_prefix_counts_as_same_site() {
        let markup = r#"<a href="https://www.site.test/a">A</a>"#;
        let links = extract(markup, &base());
        assert_eq!(links, vec!["https://www.site.test/a".to_string()]);
    }

    #[test]
    fn test_data_attributes_collected() {
        let markup = r#"<div data-href="/one"></div><span data-url="/two"></span>
            <li data-link="/three"></li>"#;
        let links = extract(markup, &base());
        assert_eq!(links.len(), 3);
        assert!(links.contains(&"https://site.test/one".to_string()));
        assert!(links.contains(&"https://site.test/three".to_string()));
    }

    #[test]
    fn test_area_href_collected() {
        let markup = r#"<map><area href="/region" shape="rect"></map>"#;
        let links = extract(markup, &base());
        assert_eq!(links, vec!["https://site.test/region".to_string()]);
    }

    #[test]
    fn test_form_action_collected() {
        let markup = r#"<form action="/search"><input name="q"></form>"#;
        let links = extract(markup, &base());
        assert_eq!(links, vec!["https://site.test/search".to_string()]);
    }

    #[test]
    fn test_script_absolute_literal_collected() {
        let markup = r#"<script>fetch("https://site.test/api-docs");</script>"#;
        let links = extract(markup, &base());
        assert_eq!(links, vec!["https://site.test/api-docs".to_string()]);
    }

    #[test]
    fn test_script_root_relative_literal_collected() {
        let markup = r#"<script>const next = '/between';</script>"#;
        let links = extract(markup, &base());
        assert_eq!(links, vec!["https://site.test/between".to_string()]);
    }

    #[test]
    fn test_script_protocol_relative_literal_ignored() {
        let markup = r#"<script>load("//cdn.site.test/lib");</script>"#;
        assert!(extract(markup, &base()).is_empty());
    }

    #[test]
    fn test_script_cross_origin_literal_rejected() {
        let markup = r#"<script>fetch("https://tracker.example/beacon");</script>"#;
        assert!(extract(markup, &base()).is_empty());
    }

    #[test]
    fn test_stylesheet_link_skipped() {
        let markup = r#"<link rel="stylesheet" href="/app.bundle"><a href="/a">A</a>"#;
        let links = extract(markup, &base());
        assert_eq!(links, vec!["https://site.test/a".to_string()]);
    }

    #[test]
    fn test_canonical_link_collected() {
        let markup = r#"<link rel="canonical" href="https://site.test/canonical">"#;
        let links = extract(markup, &base());
        assert_eq!(links, vec!["https://site.test/canonical".to_string()]);
    }

    #[test]
    fn test_base_element_resolves_relative_links() {
        let markup = r#"<base href="/docs/"><a href="guide">G</a>"#;
        let links = extract(markup, &base());
        assert_eq!(links, vec!["https://site.test/docs/guide".to_string()]);
    }

    #[test]
    fn test_base_element_itself_not_a_candidate() {
        let markup = r#"<base href="/docs/">"#;
        assert!(extract(markup, &base()).is_empty());
    }

    #[test]
    fn test_assets_rejected() {
        let markup = r#"<a href="/bg.png">img</a><a href="/archive.zip">zip</a>
            <a href="/page">page</a>"#;
        let links = extract(markup, &base());
        assert_eq!(links, vec!["https://site.test/page".to_string()]);
    }

    #[test]
    fn test_no_denylisted_assets_in_output() {
        let markup = r#"<a href="/a.css?v=1">c</a><a href="/b.js">j</a>
            <a href="/ok">ok</a><script>use("/vendor.woff2")</script>"#;
        for link in extract(markup, &base()) {
            let url = Url::parse(&link).unwrap();
            assert!(!is_denylisted_asset(&url), "asset leaked: {}", link);
        }
    }

    #[test]
    fn test_same_origin_invariant_holds() {
        let markup = r#"<a href="/a">A</a><a href="https://www.site.test/b">B</a>
            <a href="https://elsewhere.test/c">C</a><div data-url="https://evil.test/d"></div>"#;
        for link in extract(markup, &base()) {
            let url = Url::parse(&link).unwrap();
            assert!(same_site(url.host_str().unwrap(), "site.test"));
        }
    }

    #[test]
    fn test_malformed_markup_degrades_gracefully() {
        let markup = r#"<a href="/ok"><div><<<%%% <a href=">>broken<a href='/also-ok'>"#;
        let links = extract(markup, &base());
        assert!(links.contains(&"https://site.test/ok".to_string()));
    }

    #[test]
    fn test_empty_markup_yields_empty_set() {
        assert!(extract("", &base()).is_empty());
    }
}
