//! Readable-text extraction from page HTML.
//!
//! Prefers article/main/content containers and headings, skips
//! navigation chrome, and falls back to whole-body text when no
//! container yields anything useful.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};

use crate::models::page::PageContent;

const CONTENT_SELECTORS: &str = "article, [role=\"main\"], .main-content, #main-content, \
     .content, #content, main, .post-content, .article-content, \
     p, h1, h2, h3, h4, h5, h6";

/// Fragments at or below this length are treated as chrome (buttons,
/// nav labels) and skipped.
const MIN_FRAGMENT_LEN: usize = 20;

/// Extract title and readable text from a page.
pub fn extract_page(html: &str, url: &str) -> PageContent {
    let doc = Html::parse_document(html);

    let title_sel = Selector::parse("title").expect("valid selector");
    let title = doc
        .select(&title_sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let content_sel = Selector::parse(CONTENT_SELECTORS).expect("valid selector");

    let mut seen = HashSet::new();
    let mut fragments: Vec<String> = Vec::new();

    for el in doc.select(&content_sel) {
        // A container match already covers its matching descendants.
        if el.ancestors().any(|a| seen.contains(&a.id())) {
            continue;
        }
        if in_skipped_subtree(&el) {
            continue;
        }
        let text = normalize_whitespace(&el.text().collect::<String>());
        if text.len() > MIN_FRAGMENT_LEN {
            seen.insert(el.id());
            fragments.push(text);
        }
    }

    let mut text = fragments.join("\n\n");

    if text.trim().is_empty() {
        text = body_fallback(&doc);
    }

    PageContent {
        url: url.to_string(),
        title,
        text,
    }
}

/// Elements inside navigation, header, footer or sidebar chrome carry no
/// page content.
fn in_skipped_subtree(el: &ElementRef) -> bool {
    el.ancestors().filter_map(ElementRef::wrap).any(|ancestor| {
        let v = ancestor.value();
        matches!(v.name(), "nav" | "header" | "footer")
            || v.attr("role") == Some("navigation")
            || v.attr("id") == Some("sidebar")
            || v
                .attr("class")
                .is_some_and(|c| c.split_whitespace().any(|cls| cls == "sidebar"))
    })
}

/// Whole-body text, keeping only lines long enough to be prose.
fn body_fallback(doc: &Html) -> String {
    let body_sel = Selector::parse("body").expect("valid selector");
    let Some(body) = doc.select(&body_sel).next() else {
        return String::new();
    };
    let joined = body.text().collect::<Vec<_>>().join("\n");
    joined
        .lines()
        .map(str::trim)
        .filter(|line| line.len() > MIN_FRAGMENT_LEN)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
