//! Acquisition configuration

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;

/// Runtime configuration for one acquisition run
#[derive(Debug, Clone)]
pub struct Config {
    /// Search term, combined with each window's `[pdat]` range
    pub term: String,
    /// First day of the requested range (inclusive)
    pub start: NaiveDate,
    /// End of the requested range (exclusive)
    pub end: NaiveDate,
    /// Output directory for window artifacts
    pub output_dir: PathBuf,
    /// `retmax` for each search page
    pub page_size: usize,
    /// Pause after every page request
    pub request_delay: Duration,
    /// Artifact file name prefix
    pub prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            term: String::new(),
            start: NaiveDate::MIN,
            end: NaiveDate::MIN,
            output_dir: PathBuf::from("output"),
            page_size: 1000,
            request_delay: Duration::from_secs(1),
            prefix: "pubmed_articles".to_string(),
        }
    }
}

/// Connection settings for the E-utilities service
#[derive(Debug, Clone)]
pub struct EutilsConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Contact address NCBI asks clients to send
    pub email: Option<String>,
    pub tool: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for EutilsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/".to_string(),
            api_key: None,
            email: None,
            tool: "litner".to_string(),
            timeout_secs: 60,
        }
    }
}
