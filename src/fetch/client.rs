//! HTTP implementation of [`PageSource`]
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests for result listings and article pages
//! - Error classification

use crate::config::HttpConfig;
use crate::fetch::parser::{parse_detail_page, parse_results_page};
use crate::fetch::{PageSource, ResultPage};
use crate::query::{detail_url, QueryDescriptor};
use crate::record::RecordDetail;
use crate::{ConfigError, CrawlerError, FetchError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use pubmed_crawler::config::HttpConfig;
/// use pubmed_crawler::fetch::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+mailto:ContactEmail)
    let user_agent = format!(
        "{}/{} (+mailto:{})",
        config.crawler_name, config.crawler_version, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Reads PubMed over HTTP
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: Url,
}

impl HttpSource {
    /// Creates a source from the HTTP configuration
    pub fn new(config: &HttpConfig) -> Result<Self, CrawlerError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        let client = build_http_client(config)?;
        Ok(Self::with_client(client, base_url))
    }

    /// Creates a source with a custom HTTP client
    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// GETs a page and returns its body
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx | body text |
    /// | any other status | `FetchError::Status` |
    /// | network/timeout/body error | `FetchError::Http` |
    async fn get_text(&self, url: &Url) -> Result<String, FetchError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch_page(
        &self,
        query: &QueryDescriptor,
        page: u32,
    ) -> Result<ResultPage, FetchError> {
        let url = query.page_url(&self.base_url, page);
        let body = self.get_text(&url).await?;
        parse_results_page(&body).map_err(|message| FetchError::Parse {
            url: url.to_string(),
            message,
        })
    }

    async fn fetch_detail(&self, id: &str) -> Result<RecordDetail, FetchError> {
        let url = detail_url(&self.base_url, id);
        let body = self.get_text(&url).await?;
        parse_detail_page(&body).map_err(|message| FetchError::Parse {
            url: url.to_string(),
            message,
        })
    }
}
