//! Readable-text extraction from raw HTML.
//!
//! The parser is html5ever-based and never fails: malformed markup is
//! repaired best-effort, and a page with no usable blocks yields empty text.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// Separator placed between extracted blocks.
pub const BLOCK_SEPARATOR: &str = "\n\n";

static BOILERPLATE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script, style, nav, footer, header, aside, iframe, noscript, meta, link")
        .expect("Failed to parse boilerplate selector")
});

static MAIN_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("main").expect("Failed to parse main selector"));

static ARTICLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article").expect("Failed to parse article selector"));

static CONTENT_CLASS_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".content, .main, .article").expect("Failed to parse content class selector")
});

static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("Failed to parse body selector"));

static BLOCK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("p, h1, h2, h3, h4, h5, h6, li, blockquote")
        .expect("Failed to parse block selector")
});

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("Failed to parse title selector"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Text of `<title>`, empty when the page has none.
    pub title: String,
    pub text: String,
}

pub fn extract(html: &str) -> ExtractedPage {
    let mut document = Html::parse_document(html);
    let title = extract_title(&document);

    strip_boilerplate(&mut document);

    let region = content_region(&document);
    let blocks: Vec<String> = region
        .select(&BLOCK_SELECTOR)
        .filter(|element| element.id() != region.id())
        .map(|element| normalize_whitespace(&element.text().collect::<Vec<_>>().join(" ")))
        .filter(|text| !text.is_empty())
        .collect();

    ExtractedPage {
        title,
        text: blocks.join(BLOCK_SEPARATOR),
    }
}

fn extract_title(document: &Html) -> String {
    document
        .root_element()
        .select(&TITLE_SELECTOR)
        .next()
        .map(|title| normalize_whitespace(&title.text().collect::<String>()))
        .unwrap_or_default()
}

/// Detaches every non-content subtree from the document tree.
fn strip_boilerplate(document: &mut Html) {
    let doomed: Vec<_> = document
        .root_element()
        .select(&BOILERPLATE_SELECTOR)
        .map(|element| element.id())
        .collect();

    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// First match wins: `<main>`, `<article>`, a content-ish class, `<body>`,
/// then the document root.
fn content_region(document: &Html) -> ElementRef<'_> {
    let root = document.root_element();
    [
        &*MAIN_SELECTOR,
        &*ARTICLE_SELECTOR,
        &*CONTENT_CLASS_SELECTOR,
        &*BODY_SELECTOR,
    ]
    .into_iter()
    .find_map(|selector| root.select(selector).next())
    .unwrap_or(root)
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
