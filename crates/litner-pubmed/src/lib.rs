//! litner PubMed - windowed acquisition from NCBI E-utilities
//!
//! Splits a publication-date range into 7-day windows, pages through each
//! window's search results, and writes one CSV artifact per non-empty window.
//!
//! # Features
//!
//! - Blocking `esearch`/`efetch` client behind the [`SearchService`] trait
//! - Streaming XML parsing with quick-xml
//! - Per-window failure isolation: a failed window keeps what it collected
//!
//! # Example
//!
//! ```ignore
//! use litner_core::ProgressContext;
//! use litner_pubmed::{Config, EutilsClient, EutilsConfig, run};
//!
//! let config = Config {
//!     term: "photosynthesis".into(),
//!     start: "2020-01-01".parse()?,
//!     end: "2020-01-15".parse()?,
//!     ..Default::default()
//! };
//!
//! let client = EutilsClient::new(&EutilsConfig::default())?;
//! let summary = run(&client, &config, &ProgressContext::new())?;
//! println!("Wrote {} records", summary.total_records);
//! ```

pub mod config;
pub mod eutils;
pub mod parser;
pub mod runner;
pub mod transform;
pub mod window;

// Re-exports
pub use config::{Config, EutilsConfig};
pub use eutils::{EutilsClient, SearchPage, SearchService};
pub use parser::{PubmedArticle, parse_pubmed_xml};
pub use runner::{Summary, run};
pub use window::{RetrievalWindow, partition};
