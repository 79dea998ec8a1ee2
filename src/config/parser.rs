use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use pubmed_crawler::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Search jobs: {}", config.search.len());
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    parse_config(&std::fs::read_to_string(path)?)
}

/// Parses and validates configuration text
fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn hash_content(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Loads a configuration and the hash of the exact text it was parsed from
///
/// The SHA-256 hash is kept in checkpoints so a resumed `run` can tell that
/// its job list was edited in between.
///
/// # Returns
///
/// * `Ok((Config, String))` - Validated configuration and its hash
/// * `Err(ConfigError)` - Failed to read, parse or validate the file
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, hash_content(&content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[http]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-email = "admin@example.com"
timeout-secs = 10

[archive]
path = "./archive.db"

[checkpoint]
path = "./crawl.json"

[[search]]
text = "crispr off-target"
limited-to = "5_years"
max-results = 200
citation-depth = 1
citation-limit = 50

[[citations]]
id = "31234567"
depth = 2
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.http.crawler_name, "TestCrawler");
        assert_eq!(config.http.timeout_secs, 10);
        assert_eq!(config.http.base_url, crate::query::DEFAULT_BASE_URL);
        assert_eq!(config.archive.path, Some(PathBuf::from("./archive.db")));
        assert_eq!(config.search.len(), 1);
        assert!(config.search[0].require_abstract);
        assert_eq!(config.search[0].citation_limit, 50);
        assert_eq!(config.citations[0].max_results, 1000);
        assert_eq!(config.citations[0].depth, 2);
    }

    #[test]
    fn test_load_empty_config_uses_defaults() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();

        assert!(config.archive.path.is_none());
        assert!(config.search.is_empty());
        assert_eq!(config.http.crawler_name, "pubmed-crawler");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let config_content = "this is not valid TOML {{{";
        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[[citations]]
id = "not-a-pmid"
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_config_with_unknown_filter() {
        let config_content = r#"
[[search]]
text = "x"
limited-to = "3_years"
"#;

        let file = create_temp_config(config_content);
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_config_hash_is_stable() {
        let file = create_temp_config("[[search]]\ntext = \"a\"\n");

        let (config, hash1) = load_config_with_hash(file.path()).unwrap();
        let (_, hash2) = load_config_with_hash(file.path()).unwrap();

        assert_eq!(config.search.len(), 1);
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA-256 produces 64 hex characters
    }

    #[test]
    fn test_edited_config_changes_hash() {
        let file1 = create_temp_config("[[search]]\ntext = \"a\"\n");
        let file2 = create_temp_config("[[search]]\ntext = \"b\"\n");

        let (_, hash1) = load_config_with_hash(file1.path()).unwrap();
        let (_, hash2) = load_config_with_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_invalid_config_has_no_hash() {
        let file = create_temp_config("[[citations]]\nid = \"x1\"\n");
        assert!(matches!(
            load_config_with_hash(file.path()),
            Err(ConfigError::Validation(_))
        ));
    }
}
