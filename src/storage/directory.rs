//! Plain-file archive implementation
//!
//! Each record becomes two files in the archive directory:
//!
//! ```text
//! <id>.meta    id/title/authors/citation lines followed by a found_by list
//! <id>.txt     the abstract
//! ```
//!
//! Whole-file writes go through a temporary file and a rename so an
//! interrupted write never leaves a truncated record behind.

use crate::record::{ArchiveEntry, Provenance};
use crate::storage::traits::{ArchiveStore, StorageError, StorageResult};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const FOUND_BY_HEADER: &str = "found_by:";
const FOUND_BY_ITEM: &str = " - ";

/// Directory-of-files archive backend
pub struct DirectoryArchive {
    root: PathBuf,
}

impl DirectoryArchive {
    /// Opens an archive directory, creating it if needed
    pub fn new(root: &Path) -> StorageResult<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn file(&self, id: &str, extension: &str) -> StorageResult<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(StorageError::Malformed {
                id: id.to_string(),
                message: "record id cannot be used as a file name".to_string(),
            });
        }
        Ok(self.root.join(format!("{}.{}", id, extension)))
    }

    fn read_found_by(path: &Path) -> StorageResult<Vec<Provenance>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path)?;
        Ok(parse_found_by(&content))
    }
}

fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

fn write_atomically(path: &Path, content: &str) -> StorageResult<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn format_meta(id: &str, entry: &ArchiveEntry, found_by: &[Provenance]) -> String {
    let mut out = String::new();
    out.push_str(&format!("id: {}\n", single_line(id)));
    out.push_str(&format!("title: {}\n", single_line(&entry.title)));
    out.push_str(&format!("authors: {}\n", single_line(&entry.authors)));
    out.push_str(&format!("citation: {}\n", single_line(&entry.citation)));
    if let Some(link) = &entry.full_text_ref {
        out.push_str(&format!("full_text_ref: {}\n", single_line(link)));
    }
    out.push_str(FOUND_BY_HEADER);
    out.push('\n');
    for provenance in found_by {
        out.push_str(&format!(
            "{}{}\n",
            FOUND_BY_ITEM,
            provenance.to_archive_string()
        ));
    }
    out
}

fn parse_found_by(content: &str) -> Vec<Provenance> {
    let mut found_by: Vec<Provenance> = Vec::new();
    let mut in_list = false;
    for line in content.lines() {
        if line == FOUND_BY_HEADER {
            in_list = true;
        } else if in_list {
            if let Some(item) = line.strip_prefix(FOUND_BY_ITEM) {
                let provenance = Provenance::from_archive_string(item);
                if !found_by.contains(&provenance) {
                    found_by.push(provenance);
                }
            }
        }
    }
    found_by
}

fn parse_meta(id: &str, content: &str) -> StorageResult<ArchiveEntry> {
    let mut entry = ArchiveEntry {
        id: String::new(),
        title: String::new(),
        authors: String::new(),
        citation: String::new(),
        abstract_text: None,
        full_text_ref: None,
        found_by: parse_found_by(content),
    };

    for line in content.lines() {
        if line == FOUND_BY_HEADER {
            break;
        }
        let Some((key, value)) = line.split_once(": ") else {
            continue;
        };
        let value = value.to_string();
        match key {
            "id" => entry.id = value,
            "title" => entry.title = value,
            "authors" => entry.authors = value,
            "citation" => entry.citation = value,
            "full_text_ref" => entry.full_text_ref = Some(value),
            _ => {}
        }
    }

    if entry.id != id {
        return Err(StorageError::Malformed {
            id: id.to_string(),
            message: format!("metadata names record '{}'", entry.id),
        });
    }
    Ok(entry)
}

impl ArchiveStore for DirectoryArchive {
    fn put_meta(&mut self, id: &str, entry: &ArchiveEntry) -> StorageResult<()> {
        let path = self.file(id, "meta")?;
        let mut found_by = Self::read_found_by(&path)?;
        for provenance in &entry.found_by {
            if !found_by.contains(provenance) {
                found_by.push(provenance.clone());
            }
        }
        write_atomically(&path, &format_meta(id, entry, &found_by))
    }

    fn append_found_by(&mut self, id: &str, provenance: &Provenance) -> StorageResult<()> {
        let path = self.file(id, "meta")?;
        if Self::read_found_by(&path)?.contains(provenance) {
            return Ok(());
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{}{}", FOUND_BY_ITEM, provenance.to_archive_string())?;
        Ok(())
    }

    fn put_text(&mut self, id: &str, text: &str) -> StorageResult<()> {
        let path = self.file(id, "txt")?;
        write_atomically(&path, text)
    }

    fn load_entry(&self, id: &str) -> StorageResult<Option<ArchiveEntry>> {
        let meta_path = self.file(id, "meta")?;
        if !meta_path.exists() {
            return Ok(None);
        }
        let mut entry = parse_meta(id, &fs::read_to_string(&meta_path)?)?;

        let text_path = self.file(id, "txt")?;
        if text_path.exists() {
            entry.abstract_text = Some(fs::read_to_string(&text_path)?);
        }
        Ok(Some(entry))
    }

    fn count_entries(&self) -> StorageResult<u64> {
        let mut count = 0;
        for dir_entry in fs::read_dir(&self.root)? {
            let path = dir_entry?.path();
            if path.extension().is_some_and(|ext| ext == "meta") {
                count += 1;
            }
        }
        Ok(count)
    }
}
