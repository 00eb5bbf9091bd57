//! Selector-targeted fetch variant
//!
//! Used by the multi-tenant batch mode: fetch the target once via the direct
//! request method, then restrict link discovery to anchors nested within
//! elements matching a CSS-selector hint. Rows may carry a markup fragment
//! instead of a selector; a best-effort selector is then derived from the
//! fragment's tag name, id and class list.

use crate::config::FetchConfig;
use crate::extract::{is_denylisted_asset, normalize_candidate, same_site};
use crate::fetch::direct::DirectFetch;
use crate::fetch::identity::Identity;
use crate::fetch::{synthesize_markup, FetchError, FetchResult, FetchStrategy, Target};
use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Outcome of interpreting a tenant's selector hint
///
/// Derivation is a two-step pipeline: a structured fragment parse first,
/// then pattern extraction over the raw text; hints surviving neither step
/// are `Unrecognized` rather than silently coerced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorHint {
    /// A usable CSS selector
    Selector(String),

    /// The hint could not be turned into a selector
    Unrecognized,
}

impl SelectorHint {
    /// Interprets a raw hint as a selector or derives one from a fragment
    pub fn resolve(hint: &str) -> Self {
        let hint = hint.trim();

        if hint.is_empty() {
            return SelectorHint::Unrecognized;
        }

        if hint.starts_with('<') {
            // Step 1: structured fragment parse
            if let Some(selector) = derive_from_fragment(hint) {
                return SelectorHint::Selector(selector);
            }
            // Step 2: pattern extraction over the raw text
            if let Some(selector) = derive_from_pattern(hint) {
                return SelectorHint::Selector(selector);
            }
            return SelectorHint::Unrecognized;
        }

        match Selector::parse(hint) {
            Ok(_) => SelectorHint::Selector(hint.to_string()),
            Err(_) => SelectorHint::Unrecognized,
        }
    }
}

/// Derives a selector from a parsed markup fragment
fn derive_from_fragment(fragment: &str) -> Option<String> {
    let document = Html::parse_fragment(fragment);
    let any = Selector::parse("*").ok()?;

    for element in document.select(&any) {
        let tag = element.value().name();
        if matches!(tag, "html" | "head" | "body") {
            continue;
        }

        return build_selector(
            tag,
            element.value().attr("id"),
            &element.value().classes().collect::<Vec<_>>(),
        );
    }

    None
}

/// Derives a selector by pattern-matching the raw fragment text
fn derive_from_pattern(fragment: &str) -> Option<String> {
    let tag_re = Regex::new(r"<\s*([a-zA-Z][a-zA-Z0-9-]*)").ok()?;
    let id_re = Regex::new(r#"id\s*=\s*["']([^"']+)["']"#).ok()?;
    let class_re = Regex::new(r#"class\s*=\s*["']([^"']+)["']"#).ok()?;

    let tag = tag_re.captures(fragment)?.get(1)?.as_str().to_lowercase();
    let id = id_re
        .captures(fragment)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    let classes: Vec<String> = class_re
        .captures(fragment)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    let class_refs: Vec<&str> = classes.iter().map(String::as_str).collect();
    build_selector(&tag, id.as_deref(), &class_refs)
}

/// Assembles `tag#id.class1.class2` and validates it parses as a selector
fn build_selector(tag: &str, id: Option<&str>, classes: &[&str]) -> Option<String> {
    let mut selector = tag.to_lowercase();

    if let Some(id) = id {
        if !id.trim().is_empty() && !id.contains(char::is_whitespace) {
            selector.push('#');
            selector.push_str(id.trim());
        }
    }

    for class in classes {
        let class = class.trim();
        if !class.is_empty() {
            selector.push('.');
            selector.push_str(class);
        }
    }

    Selector::parse(&selector).ok()?;
    Some(selector)
}

/// Restricts link discovery to anchors inside elements matching the selector
fn restrict_links(markup: &str, selector: &str, page_url: &Url) -> Vec<String> {
    let document = Html::parse_document(markup);

    let scope_selector = match Selector::parse(selector) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    let anchor_selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let base_host = match page_url.host_str() {
        Some(h) => h.to_string(),
        None => return Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for scope in document.select(&scope_selector) {
        for anchor in scope.select(&anchor_selector) {
            let href = match anchor.value().attr("href") {
                Some(h) => h,
                None => continue,
            };

            let url = match normalize_candidate(href, None, page_url) {
                Some(u) => u,
                None => continue,
            };

            let host = match url.host_str() {
                Some(h) => h,
                None => continue,
            };
            if !same_site(host, &base_host) || is_denylisted_asset(&url) {
                continue;
            }

            let url = url.to_string();
            if seen.insert(url.clone()) {
                links.push(url);
            }
        }
    }

    links
}

/// Batch-mode variant: direct fetch scoped to a selector hint
pub struct SelectorTargeted {
    hint: SelectorHint,
    inner: DirectFetch,
}

impl SelectorTargeted {
    /// Creates the variant from a raw hint (selector or markup fragment)
    pub fn new(hint: &str, config: FetchConfig) -> Self {
        let resolved = SelectorHint::resolve(hint);
        if matches!(resolved, SelectorHint::Unrecognized) {
            tracing::warn!("Selector hint not usable: {:?}", hint);
        }

        Self {
            hint: resolved,
            inner: DirectFetch::new(config),
        }
    }

    /// The resolved hint (for logging and tests)
    pub fn hint(&self) -> &SelectorHint {
        &self.hint
    }
}

#[async_trait]
impl FetchStrategy for SelectorTargeted {
    fn name(&self) -> &'static str {
        "selector-targeted"
    }

    async fn fetch(&self, target: &Target, identity: &Identity) -> FetchResult<String> {
        let selector = match &self.hint {
            SelectorHint::Selector(s) => s.clone(),
            SelectorHint::Unrecognized => {
                return Err(FetchError::Selector(
                    "hint is neither a CSS selector nor a parseable fragment".to_string(),
                ))
            }
        };

        let markup = self.inner.fetch(target, identity).await?;
        let links = restrict_links(&markup, &selector, target.url());

        tracing::info!(
            "Selector '{}' scoped {} links on {}",
            selector,
            links.len(),
            target
        );

        Ok(synthesize_markup(&links))
    }
}
