//! HTML parser for PubMed listings and article pages
//!
//! This module handles parsing HTML content to extract:
//! - The total result count and the rows of a result listing
//! - Title, journal, authors, abstract and free full-text link of an article

use crate::fetch::{ResultPage, ResultRow};
use crate::record::{collapse_blank_lines, normalize_authors, RecordDetail};
use scraper::{ElementRef, Html, Selector};

fn selector(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|e| format!("invalid selector {}: {:?}", css, e))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_text(scope: ElementRef<'_>, css: &str) -> Result<Option<String>, String> {
    let sel = selector(css)?;
    Ok(scope
        .select(&sel)
        .next()
        .map(text_of)
        .filter(|s| !s.is_empty()))
}

/// Parses a result listing (search or "cited by")
///
/// # Extraction Rules
///
/// - total: `.results-amount h3 span`, thousands separators removed
/// - one row per `.docsum-content` block:
///   - id and title from `a.docsum-title` (`data-article-id`)
///   - long authors from `.full-authors`, else the first `.docsum-authors`
///   - short authors from `.short-authors` when present
///   - citation from the first `.docsum-journal-citation`
///
/// A page without a result count reports as many results as it has rows.
///
/// # Example
///
/// ```
/// use pubmed_crawler::fetch::parse_results_page;
///
/// let html = r#"<div class="results-amount"><h3><span class="value">1,024</span> results</h3></div>"#;
/// let page = parse_results_page(html).unwrap();
/// assert_eq!(page.total_count, 1024);
/// assert!(page.rows.is_empty());
/// ```
pub fn parse_results_page(html: &str) -> Result<ResultPage, String> {
    let document = Html::parse_document(html);

    let rows = extract_rows(&document)?;
    let total_count = match extract_total(&document)? {
        Some(total) => total,
        None => rows.len(),
    };

    Ok(ResultPage { total_count, rows })
}

fn extract_total(document: &Html) -> Result<Option<usize>, String> {
    let sel = selector(".results-amount h3 span")?;
    let Some(element) = document.select(&sel).next() else {
        return Ok(None);
    };

    let raw = text_of(element);
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(format!("unreadable result count '{}'", raw));
    }
    digits
        .parse::<usize>()
        .map(Some)
        .map_err(|e| format!("unreadable result count '{}': {}", raw, e))
}

fn extract_rows(document: &Html) -> Result<Vec<ResultRow>, String> {
    let content_sel = selector(".docsum-content")?;
    let title_sel = selector("a.docsum-title")?;

    let mut rows = Vec::new();
    for content in document.select(&content_sel) {
        let Some(link) = content.select(&title_sel).next() else {
            continue;
        };
        let Some(id) = link.value().attr("data-article-id") else {
            continue;
        };

        let authors_long = match first_text(content, ".full-authors")? {
            Some(authors) => Some(authors),
            None => first_text(content, ".docsum-authors")?,
        };

        rows.push(ResultRow {
            id: id.trim().to_string(),
            title: text_of(link),
            authors_long: authors_long.unwrap_or_default(),
            authors_short: first_text(content, ".short-authors")?,
            citation: first_text(content, ".docsum-journal-citation")?.unwrap_or_default(),
        });
    }

    Ok(rows)
}

/// Parses an article detail page
///
/// Publication is rendered as `"{journal}. {issue}"` from
/// `#full-view-journal-trigger` and `span.cit`; authors go through
/// [`normalize_authors`]. Pages without an `h1.heading-title` are rejected.
pub fn parse_detail_page(html: &str) -> Result<RecordDetail, String> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let title = first_text(root, "h1.heading-title")?
        .ok_or_else(|| "no article heading found".to_string())?;

    let journal = first_text(root, "#full-view-journal-trigger")?;
    let issue = first_text(root, "span.cit")?;
    let publication = match (journal, issue) {
        (Some(journal), Some(issue)) => Some(format!("{}. {}", journal, issue)),
        (Some(journal), None) => Some(journal),
        (None, issue) => issue,
    };

    let authors_sel = selector(".authors-list")?;
    let authors = document
        .select(&authors_sel)
        .next()
        .map(|e| e.text().collect::<String>())
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| normalize_authors(&raw));

    let abstract_sel = selector(".abstract-content")?;
    let abstract_text = document
        .select(&abstract_sel)
        .next()
        .map(|e| collapse_blank_lines(&e.text().collect::<String>()))
        .filter(|s| !s.is_empty());

    let pmc_sel = selector(r#"a[title="Free full text at PubMed Central"]"#)?;
    let full_text_ref = document
        .select(&pmc_sel)
        .next()
        .and_then(|e| e.value().attr("href"))
        .map(|href| href.trim().to_string());

    Ok(RecordDetail {
        title: Some(title),
        authors,
        publication,
        abstract_text,
        full_text_ref,
    })
}
