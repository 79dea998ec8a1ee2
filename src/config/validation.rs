use crate::config::types::{CitationJob, Config, HttpConfig, SearchJob};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;
    validate_search_jobs(&config.search)?;
    validate_citation_jobs(&config.citations)?;
    Ok(())
}

/// Validates HTTP client configuration
pub fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    let base_url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    validate_email(&config.contact_email)?;

    if config.timeout_secs < 1 || config.timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and 300, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

/// Validates search jobs
fn validate_search_jobs(jobs: &[SearchJob]) -> Result<(), ConfigError> {
    for job in jobs {
        if job.text.trim().is_empty() {
            return Err(ConfigError::Validation(
                "search text cannot be empty".to_string(),
            ));
        }
        job.filters()?;
    }
    Ok(())
}

/// Validates citation jobs
fn validate_citation_jobs(jobs: &[CitationJob]) -> Result<(), ConfigError> {
    for job in jobs {
        validate_pmid(&job.id)?;
    }
    Ok(())
}

/// Checks that `id` looks like a PubMed identifier
pub fn validate_pmid(id: &str) -> Result<(), ConfigError> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::Validation(format!(
            "PMID must be numeric, got '{}'",
            id
        )));
    }
    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_http_config_is_valid() {
        assert!(validate_http_config(&HttpConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_http_config() {
        let bad_name = HttpConfig {
            crawler_name: "my crawler".to_string(),
            ..HttpConfig::default()
        };
        assert!(matches!(
            validate_http_config(&bad_name),
            Err(ConfigError::Validation(_))
        ));

        let bad_scheme = HttpConfig {
            base_url: "ftp://pubmed.example.org/".to_string(),
            ..HttpConfig::default()
        };
        assert!(matches!(
            validate_http_config(&bad_scheme),
            Err(ConfigError::InvalidUrl(_))
        ));

        let bad_timeout = HttpConfig {
            timeout_secs: 0,
            ..HttpConfig::default()
        };
        assert!(validate_http_config(&bad_timeout).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }

    #[test]
    fn test_validate_pmid() {
        assert!(validate_pmid("31234567").is_ok());
        assert!(validate_pmid("").is_err());
        assert!(validate_pmid("PMC123").is_err());
    }

    #[test]
    fn test_search_job_filter_is_checked() {
        let mut job = SearchJob::new("crispr");
        assert!(validate_search_jobs(std::slice::from_ref(&job)).is_ok());

        job.limited_to = "2_years".to_string();
        assert!(matches!(
            validate_search_jobs(&[job]),
            Err(ConfigError::InvalidFilter(_))
        ));

        assert!(validate_search_jobs(&[SearchJob::new("  ")]).is_err());
    }
}
