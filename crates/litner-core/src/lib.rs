//! litner core - shared infrastructure for the literature annotation pipelines
//!
//! Record and mention row types, the CSV artifact contract between the
//! acquisition and annotation stages, and the plumbing both stages share
//! (batch accumulation, HTTP runtime, logging, progress).

pub mod accumulator;
pub mod http;
pub mod logging;
pub mod progress;
pub mod record;
pub mod sink;

// Re-exports for convenience
pub use accumulator::BatchAccumulator;
pub use http::{SHARED_RUNTIME, ServiceError, build_http_client};
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use record::{BibliographicRecord, EntityMention, UNKNOWN};
pub use sink::{CsvSink, cleanup_tmp_files, write_artifact};
