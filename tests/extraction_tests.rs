//! Integration tests for the link extractor's public contract

use dementor::extract::{extract, is_denylisted_asset, same_site};
use url::Url;

fn base() -> Url {
    Url::parse("https://site.test/").unwrap()
}

#[test]
fn test_cross_origin_and_mail_links_rejected() {
    let markup = r#"<html><body>
        <a href="/a">A</a>
        <a href="//x.com/b">B</a>
        <a href="mailto:x@y.com">C</a>
    </body></html>"#;

    let links = extract(markup, &base());
    assert_eq!(links, vec!["https://site.test/a".to_string()]);
}

#[test]
fn test_robots_meta_nofollow_suppresses_extraction() {
    let markup = r#"<html>
        <head><meta name="robots" content="nofollow"></head>
        <body>
            <a href="/a">A</a><a href="/b">B</a><a href="/c">C</a>
            <a href="/d">D</a><a href="/e">E</a>
        </body></html>"#;

    assert!(extract(markup, &base()).is_empty());
}

#[test]
fn test_extraction_is_deterministic_and_idempotent() {
    let markup = r#"<html><body>
        <a href="/b">B</a><a href="/a">A</a><a href="/b">again</a>
        <div data-url="/c"></div>
        <script>visit("/d");</script>
    </body></html>"#;

    let first = extract(markup, &base());
    let second = extract(markup, &base());

    assert_eq!(first, second);
    // First-occurrence order is preserved
    assert_eq!(first[0], "https://site.test/b");
    assert_eq!(first[1], "https://site.test/a");
}

#[test]
fn test_output_invariants_on_mixed_document() {
    let markup = r#"<html><head><base href="/docs/"></head><body>
        <a href="page#frag">relative with fragment</a>
        <a href="https://www.site.test/www-variant">www</a>
        <a href="https://user:pw@site.test/secret">credentials</a>
        <a href="/styles/app.css">asset</a>
        <a href="https://elsewhere.test/x">cross-origin</a>
        <a href="tel:+49123">phone</a>
        <form action="/submit"><input></form>
        <map><area href="/mapped"></map>
    </body></html>"#;

    let links = extract(markup, &base());

    for link in &links {
        let url = Url::parse(link).expect("extractor emits absolute URLs");
        // Same-origin up to a www. prefix on either side
        assert!(same_site(url.host_str().unwrap(), "site.test"), "{}", link);
        // No denylisted assets
        assert!(!is_denylisted_asset(&url), "{}", link);
        // Fragments are stripped
        assert!(url.fragment().is_none(), "{}", link);
        // Credentials are stripped
        assert_eq!(url.username(), "", "{}", link);
    }

    assert!(links.contains(&"https://site.test/docs/page".to_string()));
    assert!(links.contains(&"https://www.site.test/www-variant".to_string()));
    assert!(links.contains(&"https://site.test/secret".to_string()));
    assert!(links.contains(&"https://site.test/submit".to_string()));
    assert!(links.contains(&"https://site.test/mapped".to_string()));
    assert!(!links.iter().any(|l| l.contains("app.css")));
    assert!(!links.iter().any(|l| l.contains("elsewhere")));
}

#[test]
fn test_fragment_stripping() {
    let links = extract(r##"<a href="/x#sec2">X</a>"##, &base());
    assert_eq!(links, vec!["https://site.test/x".to_string()]);
}
