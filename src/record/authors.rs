//! Text normalization for author lists and abstracts

use regex::Regex;
use std::sync::OnceLock;

fn footnote_marks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d\s)+").expect("valid footnote pattern"))
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

fn given_middle_family() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([A-Z])[^ ]+ ([^ ]) ([^ ]+)").expect("valid author name pattern")
    })
}

fn blank_lines() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n+").expect("valid newline pattern"))
}

/// Reformats an author list from a detail page into citation style
///
/// Affiliation footnote numbers are dropped and `Given M Family` becomes
/// `Family GM`. Names that do not have exactly that shape pass through
/// unchanged, so the result is lossy for unusual names.
///
/// # Example
///
/// ```
/// use pubmed_crawler::record::normalize_authors;
///
/// assert_eq!(normalize_authors("John A Smith 1 , Mary B Jones 2 "), "Smith JA, Jones MB.");
/// ```
pub fn normalize_authors(raw: &str) -> String {
    let stripped = footnote_marks().replace_all(raw, "");
    let collapsed = whitespace().replace_all(&stripped, " ");

    let names: Vec<String> = collapsed
        .split(',')
        .map(|name| {
            given_middle_family()
                .replace_all(name, "$3 $1$2")
                .trim()
                .to_string()
        })
        .collect();

    format!("{}.", names.join(", "))
}

/// Trims text and collapses runs of newlines into one
pub fn collapse_blank_lines(text: &str) -> String {
    blank_lines().replace_all(text.trim(), "\n").into_owned()
}
