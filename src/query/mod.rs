//! Query descriptors for PubMed result listings
//!
//! This module turns search text and filter flags into the page URLs the
//! fetcher requests. A [`QueryDescriptor`] names one logical result set; the
//! page number is supplied separately by the paginated stream.

use crate::ConfigError;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Default PubMed web interface
pub const DEFAULT_BASE_URL: &str = "https://pubmed.ncbi.nlm.nih.gov/";

/// Publication date restriction for a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DateFilter {
    OneYear,
    FiveYears,
    TenYears,
    #[default]
    None,
}

impl DateFilter {
    /// Returns the PubMed `filter=` value for this restriction, if any
    pub fn filter_value(&self) -> Option<&'static str> {
        match self {
            Self::OneYear => Some("datesearch.y_1"),
            Self::FiveYears => Some("datesearch.y_5"),
            Self::TenYears => Some("datesearch.y_10"),
            Self::None => None,
        }
    }

    /// Returns the configuration spelling of this restriction
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneYear => "1_year",
            Self::FiveYears => "5_years",
            Self::TenYears => "10_years",
            Self::None => "none",
        }
    }
}

impl FromStr for DateFilter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1_year" => Ok(Self::OneYear),
            "5_years" => Ok(Self::FiveYears),
            "10_years" => Ok(Self::TenYears),
            "none" => Ok(Self::None),
            other => Err(ConfigError::InvalidFilter(other.to_string())),
        }
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filters applied to a free-text search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchFilters {
    pub limited_to: DateFilter,
    pub require_abstract: bool,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            limited_to: DateFilter::None,
            require_abstract: true,
        }
    }
}

impl SearchFilters {
    /// Builds filters from their configuration spelling
    ///
    /// Fails with [`ConfigError::InvalidFilter`] before any request is made
    /// if `limited_to` is not a recognized value.
    pub fn parse(limited_to: &str, require_abstract: bool) -> Result<Self, ConfigError> {
        Ok(Self {
            limited_to: limited_to.parse()?,
            require_abstract,
        })
    }
}

/// One logical, paginated result set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryDescriptor {
    /// Free-text search
    Search { term: String, filters: SearchFilters },

    /// Articles citing the given PMID
    CitedBy { id: String },

    /// Articles added to PubMed on the given day, newest first
    Latest { day: NaiveDate },
}

impl QueryDescriptor {
    pub fn search(term: impl Into<String>, filters: SearchFilters) -> Self {
        Self::Search {
            term: term.into(),
            filters,
        }
    }

    pub fn cited_by(id: impl Into<String>) -> Self {
        Self::CitedBy { id: id.into() }
    }

    pub fn latest(day: NaiveDate) -> Self {
        Self::Latest { day }
    }

    /// Builds the URL of result page `page` (1-based) relative to `base`
    pub fn page_url(&self, base: &Url, page: u32) -> Url {
        let mut url = base.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            match self {
                Self::Search { term, filters } => {
                    pairs.append_pair("term", term);
                    if let Some(value) = filters.limited_to.filter_value() {
                        pairs.append_pair("filter", value);
                    }
                    if filters.require_abstract {
                        pairs.append_pair("filter", "simsearch1.fha");
                    }
                }
                Self::CitedBy { id } => {
                    pairs.append_pair("linkname", "pubmed_pubmed_citedin");
                    pairs.append_pair("from_uid", id);
                }
                Self::Latest { day } => {
                    let next = day.checked_add_days(Days::new(1)).unwrap_or(*day);
                    let today = day.format("%Y/%m/%d").to_string();
                    let tomorrow = next.format("%Y/%m/%d").to_string();
                    pairs.append_pair("term", &format!("{}[edat]", today));
                    pairs.append_pair("filter", &format!("dates.{}-{}", today, tomorrow));
                    pairs.append_pair("sort", "date");
                    pairs.append_pair("size", "100");
                }
            }
            pairs.append_pair("page", &page.to_string());
        }
        url
    }
}

impl fmt::Display for QueryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search { term, filters } => {
                write!(f, "search \"{}\" (limited to {}", term, filters.limited_to)?;
                if filters.require_abstract {
                    write!(f, ", abstract required")?;
                }
                write!(f, ")")
            }
            Self::CitedBy { id } => write!(f, "articles citing PMID {}", id),
            Self::Latest { day } => write!(f, "articles added on {}", day),
        }
    }
}

/// Builds the URL of the detail page for a PMID
pub fn detail_url(base: &Url, id: &str) -> Url {
    base.join(&format!("{}/", id)).unwrap_or_else(|_| base.clone())
}
