//! Markdown bibliography export
//!
//! Archived records are grouped by the search that found them. A record found
//! by several searches appears under each of them.

use crate::record::{ArchiveEntry, Provenance};
use crate::state::CrawlState;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const ARTICLE_BASE_URL: &str = "https://pubmed.ncbi.nlm.nih.gov";

/// Writes the bibliography of `state` to `output_path`
///
/// # Arguments
///
/// * `state` - The crawl state to export
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the bibliography
/// * `Err(std::io::Error)` - Failed to write the file
pub fn export_markdown(state: &CrawlState, output_path: &Path) -> std::io::Result<()> {
    let markdown = format_bibliography(state);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

fn heading(provenance: &Provenance) -> String {
    match provenance {
        Provenance::Query { text } => format!("Search: {}", text),
        Provenance::CitedBy { id } => format!("Citing PMID {}", id),
    }
}

fn format_entry(entry: &ArchiveEntry) -> String {
    let mut line = String::from("- ");
    if !entry.authors.is_empty() {
        line.push_str(&entry.authors);
        line.push(' ');
    }
    if entry.title.is_empty() {
        line.push_str("*untitled*");
    } else {
        line.push_str(&format!("**{}**", entry.title));
    }
    if !entry.citation.is_empty() {
        line.push_str(&format!(" {}", entry.citation));
    }
    line.push_str(&format!(
        " PMID [{}]({}/{}/)",
        entry.id, ARTICLE_BASE_URL, entry.id
    ));
    if let Some(link) = &entry.full_text_ref {
        line.push_str(&format!(" ([full text]({}))", link));
    }
    line.push('\n');
    line
}

/// Formats a crawl state as a markdown bibliography
pub fn format_bibliography(state: &CrawlState) -> String {
    let mut groups: BTreeMap<&Provenance, Vec<&ArchiveEntry>> = BTreeMap::new();
    let mut unattributed = Vec::new();
    for entry in state.results.values() {
        if entry.found_by.is_empty() {
            unattributed.push(entry);
        }
        for provenance in &entry.found_by {
            groups.entry(provenance).or_default().push(entry);
        }
    }

    let mut md = String::new();
    md.push_str("# PubMed Bibliography\n\n");
    md.push_str(&format!(
        "{} records from {} searches.\n\n",
        state.results.len(),
        groups.len()
    ));

    for (provenance, entries) in &groups {
        md.push_str(&format!("## {} ({})\n\n", heading(provenance), entries.len()));
        for entry in entries {
            md.push_str(&format_entry(entry));
        }
        md.push('\n');
    }

    if !unattributed.is_empty() {
        md.push_str(&format!("## Unattributed ({})\n\n", unattributed.len()));
        for entry in unattributed {
            md.push_str(&format_entry(entry));
        }
        md.push('\n');
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use tempfile::TempDir;

    fn entry(id: &str, found_by: Vec<Provenance>) -> ArchiveEntry {
        let mut entry = ArchiveEntry::from_record(&Record::from_listing(
            id,
            Some(format!("Title {}", id)),
            Some("Doe J.".to_string()),
            None,
            Some("Cell. 2020.".to_string()),
        ));
        for p in found_by {
            entry.add_found_by(p);
        }
        entry
    }

    #[test]
    fn test_groups_by_provenance() {
        let mut state = CrawlState::default();
        state.insert(entry("1", vec![Provenance::query("crispr")]));
        state.insert(entry(
            "2",
            vec![Provenance::query("crispr"), Provenance::cited_by("1")],
        ));

        let md = format_bibliography(&state);
        assert!(md.starts_with("# PubMed Bibliography\n\n2 records from 2 searches."));
        assert!(md.contains("## Search: crispr (2)\n"));
        assert!(md.contains("## Citing PMID 1 (1)\n"));
        assert!(md.contains(
            "- Doe J. **Title 2** Cell. 2020. PMID [2](https://pubmed.ncbi.nlm.nih.gov/2/)\n"
        ));
        assert!(md.find("## Search: crispr").unwrap() < md.find("## Citing PMID 1").unwrap());
    }

    #[test]
    fn test_full_text_link_and_unattributed() {
        let mut state = CrawlState::default();
        let mut lonely = entry("5", vec![]);
        lonely.full_text_ref = Some("https://www.ncbi.nlm.nih.gov/pmc/articles/PMC5/".to_string());
        state.insert(lonely);

        let md = format_bibliography(&state);
        assert!(md.contains("## Unattributed (1)"));
        assert!(md.contains("([full text](https://www.ncbi.nlm.nih.gov/pmc/articles/PMC5/))"));
    }

    #[test]
    fn test_export_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bibliography.md");
        let mut state = CrawlState::default();
        state.insert(entry("1", vec![Provenance::query("a")]));

        export_markdown(&state, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, format_bibliography(&state));
    }
}
