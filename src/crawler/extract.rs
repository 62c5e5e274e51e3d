//! HTML extraction for forum pages
//!
//! Every function here is pure: it takes markup and returns owned values.
//! Missing or malformed markup never produces an error past this module;
//! metadata degrades to a sentinel, the body to a typed `ContentError`, and
//! broken comment blocks are dropped.

use crate::crawler::article::CommentRecord;
use crate::url::{page_number, ForumUrls};
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::OnceLock;
use thiserror::Error;
use url::Url;

/// A CSS selector kept together with its source text
///
/// A selector that fails to parse matches nothing, which turns every field
/// it feeds into the "absent" path rather than an error.
#[derive(Debug)]
pub struct Locator {
    css: String,
    selector: Option<Selector>,
}

impl Locator {
    pub fn new(css: &str) -> Self {
        let selector = match Selector::parse(css) {
            Ok(selector) => Some(selector),
            Err(e) => {
                tracing::warn!("Invalid locator {:?}: {:?}", css, e);
                None
            }
        };

        Self {
            css: css.to_string(),
            selector,
        }
    }

    pub fn css(&self) -> &str {
        &self.css
    }

    /// Matching elements in document order
    pub fn select_in_document<'a>(
        &'a self,
        document: &'a Html,
    ) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.selector
            .iter()
            .flat_map(move |selector| document.select(selector))
    }

    /// Matching descendants of `element` in document order
    pub fn select_in<'a>(&'a self, element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.selector
            .iter()
            .flat_map(move |selector| element.select(selector))
    }
}

/// Locators for the forum's page layout
#[derive(Debug)]
pub struct Markup {
    pub title: Locator,
    pub meta_value: Locator,
    pub main_content: Locator,
    pub push: Locator,
    pub push_tag: Locator,
    pub push_userid: Locator,
    pub push_content: Locator,
    pub push_ipdatetime: Locator,
    pub listing_entry: Locator,
    pub entry_link: Locator,
    pub nav_button: Locator,
}

/// Classes of the header rows rendered inside the thread body
const METALINE_CLASSES: [&str; 2] = ["article-metaline", "article-metaline-right"];

/// Positions of the metadata rows among `.article-meta-value` elements
pub const AUTHOR_INDEX: usize = 0;
pub const TITLE_INDEX: usize = 2;
pub const DATE_INDEX: usize = 3;

/// Sentinel used when the thread body cannot be extracted
pub const CONTENT_ERROR: &str = "main_content error";

/// The shared forum markup
pub fn markup() -> &'static Markup {
    static MARKUP: OnceLock<Markup> = OnceLock::new();
    MARKUP.get_or_init(|| Markup {
        title: Locator::new("title"),
        meta_value: Locator::new(".article-meta-value"),
        main_content: Locator::new("#main-content"),
        push: Locator::new("div.push"),
        push_tag: Locator::new("span.push-tag"),
        push_userid: Locator::new("span.push-userid"),
        push_content: Locator::new("span.push-content"),
        push_ipdatetime: Locator::new("span.push-ipdatetime"),
        listing_entry: Locator::new("div.r-ent"),
        entry_link: Locator::new("a"),
        nav_button: Locator::new(".btn.wide"),
    })
}

/// Result of a positional field lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Present(String),
    Absent { field: String },
}

impl FieldValue {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// The extracted text, or `"no {field}"`
    pub fn into_text(self) -> String {
        match self {
            Self::Present(text) => text,
            Self::Absent { field } => format!("no {}", field),
        }
    }
}

/// Why the thread body could not be extracted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("main content container missing")]
    MissingContainer,
}

/// Selects the `index`-th element matched by `locator` and returns its text
///
/// Fewer than `index + 1` matches yields `FieldValue::Absent`.
pub fn extract_field(document: &Html, locator: &Locator, index: usize, field: &str) -> FieldValue {
    match locator.select_in_document(document).nth(index) {
        Some(element) => FieldValue::Present(element.text().collect()),
        None => FieldValue::Absent {
            field: field.to_string(),
        },
    }
}

/// Extracts the thread body
///
/// Header rows are skipped, everything from the first `signature_marker`
/// on is dropped and newlines become two spaces.
pub fn extract_content(document: &Html, signature_marker: &str) -> Result<String, ContentError> {
    let container = markup()
        .main_content
        .select_in_document(document)
        .next()
        .ok_or(ContentError::MissingContainer)?;

    let mut text = String::new();
    push_text_without_metalines(container, &mut text);

    let body = match text.find(signature_marker) {
        Some(end) => &text[..end],
        None => text.as_str(),
    };

    Ok(body.replace('\n', "  "))
}

fn push_text_without_metalines(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    if !is_metaline(child) {
                        push_text_without_metalines(child, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn is_metaline(element: ElementRef<'_>) -> bool {
    let value = element.value();
    value.name() == "div" && value.classes().any(|class| METALINE_CLASSES.contains(&class))
}

/// Extracts the comments of a thread in document order
///
/// A comment block missing any of its four spans is skipped whole.
pub fn extract_comments(document: &Html) -> Vec<CommentRecord> {
    let markup = markup();
    let mut comments = Vec::new();

    for (position, block) in markup.push.select_in_document(document).enumerate() {
        let status = first_text(block, &markup.push_tag);
        let commenter = first_text(block, &markup.push_userid);
        let content = first_text(block, &markup.push_content);
        let datetime = first_text(block, &markup.push_ipdatetime);

        match (status, commenter, content, datetime) {
            (Some(status), Some(commenter), Some(content), Some(datetime)) => {
                comments.push(CommentRecord {
                    status,
                    commenter,
                    content: strip_separator(&content).to_string(),
                    datetime: datetime.trim_end().to_string(),
                });
            }
            _ => tracing::debug!("Skipping incomplete comment block #{}", position + 1),
        }
    }

    comments
}

fn first_text(element: ElementRef<'_>, locator: &Locator) -> Option<String> {
    locator
        .select_in(element)
        .next()
        .map(|found| found.text().collect())
}

/// Drops the leading separator the forum renders before comment text
fn strip_separator(content: &str) -> &str {
    let mut chars = content.chars();
    chars.next();
    chars.as_str()
}

/// Extracts the page title
pub fn extract_title(document: &Html) -> Option<String> {
    markup()
        .title
        .select_in_document(document)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// A forum answer after the busy check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageView<T> {
    /// The forum's transient overload page
    Busy,
    /// A real page and what was read from it
    Ready(T),
}

/// Whether `document` is the forum's transient "busy" page
///
/// The marker must appear in the title and the thread body container must be
/// missing. A thread's title is its subject line and may carry the marker.
pub fn is_busy_document(document: &Html, busy_marker: &str) -> bool {
    if markup().main_content.select_in_document(document).next().is_some() {
        return false;
    }
    extract_title(document)
        .map(|title| title.contains(busy_marker))
        .unwrap_or(false)
}

/// Thread links on a listing page, in listing order
///
/// Entries without a link (deleted threads) are skipped.
pub fn extract_article_links(document: &Html, urls: &ForumUrls) -> Vec<Url> {
    let markup = markup();
    let mut links = Vec::new();

    for entry in markup.listing_entry.select_in_document(document) {
        let href = match markup
            .entry_link
            .select_in(entry)
            .next()
            .and_then(|link| link.value().attr("href"))
        {
            Some(href) => href,
            None => continue,
        };

        match urls.resolve(href) {
            Ok(url) => links.push(url),
            Err(e) => tracing::debug!("Skipping unresolvable thread link {}: {}", href, e),
        }
    }

    links
}

/// Reads a listing page body: the busy answer, or its thread links
pub fn read_listing(html: &str, urls: &ForumUrls, busy_marker: &str) -> PageView<Vec<Url>> {
    let document = Html::parse_document(html);
    if is_busy_document(&document, busy_marker) {
        return PageView::Busy;
    }
    PageView::Ready(extract_article_links(&document, urls))
}

/// Total listing pages of a board, read from its index page
///
/// The second wide navigation button links to the previous page; the index
/// itself is one past it. A board with a single page renders that button
/// without a link.
pub fn extract_page_count(document: &Html) -> Option<u32> {
    let previous = markup().nav_button.select_in_document(document).nth(1)?;

    match previous.value().attr("href") {
        Some(href) => page_number(href)?.checked_add(1),
        None => Some(1),
    }
}

/// Reads a board index body: the busy answer, or its page count
pub fn read_page_count(html: &str, busy_marker: &str) -> PageView<Option<u32>> {
    let document = Html::parse_document(html);
    if is_busy_document(&document, busy_marker) {
        return PageView::Busy;
    }
    PageView::Ready(extract_page_count(&document))
}
