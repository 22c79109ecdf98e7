//! Window-by-window acquisition driver

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, ensure};
use indicatif::ProgressBar;
use litner_core::{
    BatchAccumulator, BibliographicRecord, ProgressContext, ServiceError, cleanup_tmp_files,
    fmt_num, write_artifact,
};
use rustc_hash::FxHashSet;

use crate::config::Config;
use crate::eutils::SearchService;
use crate::transform::to_record;
use crate::window::{RetrievalWindow, partition};

/// Acquisition run summary
#[derive(Debug, Default)]
pub struct Summary {
    pub total_windows: usize,
    /// Windows that produced an artifact
    pub written_windows: usize,
    /// Windows cut short by a service error or whose artifact could not be written
    pub failed_windows: usize,
    pub total_records: usize,
    /// Articles dropped for a missing PMID or as a repeat of an earlier id
    pub skipped_records: usize,
    pub artifacts: Vec<PathBuf>,
    pub elapsed: Duration,
}

/// Per-run state shared by every window
struct RunState {
    seen: FxHashSet<String>,
    batch: BatchAccumulator<BibliographicRecord>,
    skipped: usize,
}

/// Run acquisition over `[config.start, config.end)`.
///
/// Only configuration problems are returned as errors. Service and write
/// failures are confined to their window and reported in the [`Summary`].
pub fn run<S: SearchService>(
    service: &S,
    config: &Config,
    progress: &ProgressContext,
) -> Result<Summary> {
    ensure!(config.page_size > 0, "page size must be positive");
    let started = Instant::now();

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;
    cleanup_tmp_files(&config.output_dir).context("Failed to clean up stale tmp files")?;

    let windows = partition(config.start, config.end);
    log::info!(
        "Searching '{}' from {} to {} in {} windows",
        config.term,
        config.start,
        config.end,
        windows.len()
    );

    let mut summary = Summary {
        total_windows: windows.len(),
        ..Default::default()
    };
    let mut state = RunState {
        seen: FxHashSet::default(),
        batch: BatchAccumulator::new(
            windows.first().map(RetrievalWindow::label).unwrap_or_default(),
        ),
        skipped: 0,
    };

    let labels: Vec<String> = windows.iter().map(RetrievalWindow::label).collect();
    for (i, mut window) in windows.into_iter().enumerate() {
        let pb = progress.stage_line(&window.label());
        let outcome = drain_window(service, &mut window, config, &mut state, &pb);
        pb.finish_and_clear();

        let mut failed = false;
        if let Err(e) = outcome {
            failed = true;
            log::error!(
                "{}: stopped at offset {}/{}: {e}",
                window.label(),
                window.offset,
                window.total_count
            );
            if e.is_rate_limited() {
                log::warn!("Rate limited by the service; set an API key or raise the request delay");
            }
        }

        // Batch boundary: whatever the window collected is written now and the
        // accumulator starts empty for the next window.
        let next_label = labels.get(i + 1).cloned().unwrap_or_default();
        match state.batch.take_batch(next_label) {
            Some(rows) => {
                let filename = window.artifact_name(&config.prefix);
                match write_artifact(&config.output_dir, &filename, &rows) {
                    Ok(path) => {
                        log::info!("{}: wrote {} records", filename, fmt_num(rows.len()));
                        summary.written_windows += 1;
                        summary.total_records += rows.len();
                        summary.artifacts.push(path);
                    }
                    Err(e) => {
                        failed = true;
                        log::error!("{filename}: write failed: {e}");
                    }
                }
            }
            None => log::info!("{}: no records", window.label()),
        }

        if failed {
            summary.failed_windows += 1;
        }
    }

    summary.skipped_records = state.skipped;
    summary.elapsed = started.elapsed();

    log::info!("=== Acquisition Summary ===");
    log::info!(
        "Windows: {}/{} written ({} failed)",
        summary.written_windows,
        summary.total_windows,
        summary.failed_windows
    );
    log::info!(
        "Records: {} ({} skipped)",
        fmt_num(summary.total_records),
        fmt_num(summary.skipped_records)
    );
    log::info!("Time: {:.1}s", summary.elapsed.as_secs_f64());

    Ok(summary)
}

/// Page through one window until it is exhausted or a call fails.
///
/// Records are pushed into `state.batch` as they arrive, so a failure keeps
/// everything collected before it.
fn drain_window<S: SearchService>(
    service: &S,
    window: &mut RetrievalWindow,
    config: &Config,
    state: &mut RunState,
    pb: &ProgressBar,
) -> Result<(), ServiceError> {
    let query = window.query(&config.term);
    log::debug!("{}: {query}", window.label());

    loop {
        let page = service.search(&query, window.offset, config.page_size)?;
        window.total_count = page.total_count;
        if page.ids.is_empty() {
            break;
        }

        let articles = service.fetch(&page.ids)?;
        for article in articles {
            match to_record(article) {
                Ok(record) => {
                    if state.seen.insert(record.id.clone()) {
                        state.batch.push(record);
                    } else {
                        log::debug!("{}: duplicate PMID {}", state.batch.label(), record.id);
                        state.skipped += 1;
                    }
                }
                Err(reason) => {
                    log::warn!("{}: skipping article: {reason}", window.label());
                    state.skipped += 1;
                }
            }
        }

        window.offset += config.page_size;
        pb.set_message(format!(
            "{}/{} records",
            fmt_num(state.batch.len()),
            fmt_num(window.total_count)
        ));

        if !config.request_delay.is_zero() {
            std::thread::sleep(config.request_delay);
        }
        if window.is_exhausted() {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::BTreeSet;
    use std::path::Path;

    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;
    use crate::eutils::SearchPage;
    use crate::parser::PubmedArticle;

    /// In-memory service: ids per query, optional failure on the n-th fetch
    #[derive(Default)]
    struct StubService {
        results: Vec<(String, Vec<&'static str>)>,
        fail_fetch_call: Option<usize>,
        fetch_calls: Cell<usize>,
    }

    impl StubService {
        fn with(mut self, query: &str, ids: &[&'static str]) -> Self {
            self.results.push((query.to_string(), ids.to_vec()));
            self
        }
    }

    impl SearchService for StubService {
        fn search(
            &self,
            query: &str,
            retstart: usize,
            retmax: usize,
        ) -> Result<SearchPage, ServiceError> {
            let ids = self
                .results
                .iter()
                .find(|(q, _)| q == query)
                .map(|(_, ids)| ids.as_slice())
                .unwrap_or_default();
            Ok(SearchPage {
                total_count: ids.len(),
                ids: ids
                    .iter()
                    .skip(retstart)
                    .take(retmax)
                    .map(|id| id.to_string())
                    .collect(),
            })
        }

        fn fetch(&self, ids: &[String]) -> Result<Vec<PubmedArticle>, ServiceError> {
            let call = self.fetch_calls.get() + 1;
            self.fetch_calls.set(call);
            if self.fail_fetch_call == Some(call) {
                return Err(ServiceError::Http {
                    status: Some(503),
                    message: "service unavailable".to_string(),
                });
            }
            Ok(ids
                .iter()
                .map(|id| PubmedArticle {
                    pmid: if id == "nopmid" {
                        String::new()
                    } else {
                        id.clone()
                    },
                    title: Some(format!("Title {id}")),
                    abstract_text: Some(format!("Abstract {id}")),
                    ..Default::default()
                })
                .collect())
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn config(dir: &Path, page_size: usize) -> Config {
        Config {
            term: "photosynthesis".to_string(),
            start: date("2020-01-01"),
            end: date("2020-01-15"),
            output_dir: dir.to_path_buf(),
            page_size,
            request_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    const WEEK1: &str = "photosynthesis AND (2020/01/01:2020/01/07)[pdat]";
    const WEEK2: &str = "photosynthesis AND (2020/01/08:2020/01/14)[pdat]";

    fn read_ids(path: &Path) -> Vec<String> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        reader
            .deserialize::<BibliographicRecord>()
            .map(|r| r.unwrap().id)
            .collect()
    }

    #[test]
    fn two_week_range_writes_two_artifacts() {
        let dir = TempDir::new().unwrap();
        let service = StubService::default()
            .with(WEEK1, &["1", "2", "3"])
            .with(WEEK2, &["4", "5"]);

        let summary = run(&service, &config(dir.path(), 2), &ProgressContext::hidden()).unwrap();

        assert_eq!(summary.total_windows, 2);
        assert_eq!(summary.written_windows, 2);
        assert_eq!(summary.failed_windows, 0);
        assert_eq!(summary.total_records, 5);
        assert_eq!(
            summary.artifacts,
            vec![
                dir.path()
                    .join("pubmed_articles_2020-01-01_to_2020-01-07.csv"),
                dir.path()
                    .join("pubmed_articles_2020-01-08_to_2020-01-14.csv"),
            ]
        );
        assert_eq!(read_ids(&summary.artifacts[0]), vec!["1", "2", "3"]);
        assert_eq!(read_ids(&summary.artifacts[1]), vec!["4", "5"]);
    }

    #[test]
    fn union_of_artifacts_matches_service_ids() {
        let dir = TempDir::new().unwrap();
        let service = StubService::default()
            .with(WEEK1, &["10", "11", "12", "13", "14"])
            .with(WEEK2, &["20", "21", "22"]);

        let summary = run(&service, &config(dir.path(), 3), &ProgressContext::hidden()).unwrap();

        let written: BTreeSet<String> = summary.artifacts.iter().flat_map(|p| read_ids(p)).collect();
        let expected: BTreeSet<String> = ["10", "11", "12", "13", "14", "20", "21", "22"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(written, expected);
    }

    #[test]
    fn empty_window_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let service = StubService::default().with(WEEK2, &["4"]);

        let summary = run(&service, &config(dir.path(), 10), &ProgressContext::hidden()).unwrap();

        assert_eq!(summary.written_windows, 1);
        assert_eq!(summary.failed_windows, 0);
        assert!(
            !dir.path()
                .join("pubmed_articles_2020-01-01_to_2020-01-07.csv")
                .exists()
        );
        assert_eq!(service.fetch_calls.get(), 1);
    }

    #[test]
    fn failure_keeps_partial_window_and_next_window_is_clean() {
        let dir = TempDir::new().unwrap();
        let service = StubService {
            fail_fetch_call: Some(2),
            ..Default::default()
        }
        .with(WEEK1, &["1", "2", "3", "4", "5"])
        .with(WEEK2, &["6", "7"]);

        let summary = run(&service, &config(dir.path(), 2), &ProgressContext::hidden()).unwrap();

        assert_eq!(summary.failed_windows, 1);
        assert_eq!(summary.written_windows, 2);
        assert_eq!(read_ids(&summary.artifacts[0]), vec!["1", "2"]);
        assert_eq!(read_ids(&summary.artifacts[1]), vec!["6", "7"]);
    }

    #[test]
    fn write_failure_does_not_stop_next_window() {
        let dir = TempDir::new().unwrap();
        // a directory squatting on the first artifact's name makes the rename fail
        std::fs::create_dir(dir.path().join("pubmed_articles_2020-01-01_to_2020-01-07.csv"))
            .unwrap();
        let service = StubService::default()
            .with(WEEK1, &["1", "2"])
            .with(WEEK2, &["3"]);

        let summary = run(&service, &config(dir.path(), 10), &ProgressContext::hidden()).unwrap();

        assert_eq!(summary.failed_windows, 1);
        assert_eq!(summary.written_windows, 1);
        assert_eq!(summary.total_records, 1);
        assert_eq!(
            summary.artifacts,
            vec![dir.path().join("pubmed_articles_2020-01-08_to_2020-01-14.csv")]
        );
        assert_eq!(read_ids(&summary.artifacts[0]), vec!["3"]);
    }

    #[test]
    fn records_without_pmid_and_repeats_are_skipped() {
        let dir = TempDir::new().unwrap();
        let service = StubService::default()
            .with(WEEK1, &["1", "nopmid", "2"])
            .with(WEEK2, &["2", "3"]);

        let summary = run(&service, &config(dir.path(), 10), &ProgressContext::hidden()).unwrap();

        assert_eq!(summary.skipped_records, 2);
        assert_eq!(summary.total_records, 3);
        assert_eq!(read_ids(&summary.artifacts[0]), vec!["1", "2"]);
        assert_eq!(read_ids(&summary.artifacts[1]), vec!["3"]);
    }

    #[test]
    fn creates_missing_output_dir() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested").join("out");
        let service = StubService::default().with(WEEK1, &["1"]);

        let summary = run(&service, &config(&out, 10), &ProgressContext::hidden()).unwrap();

        assert_eq!(summary.written_windows, 1);
        assert!(out.join("pubmed_articles_2020-01-01_to_2020-01-07.csv").exists());
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let dir = TempDir::new().unwrap();
        let service = StubService::default();
        assert!(run(&service, &config(dir.path(), 0), &ProgressContext::hidden()).is_err());
    }
}
