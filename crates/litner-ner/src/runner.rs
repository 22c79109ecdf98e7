//! Artifact-by-artifact annotation driver

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use litner_core::{BatchAccumulator, EntityMention, ProgressContext, fmt_num, write_artifact};

use crate::annotator::Annotator;
use crate::config::Config;
use crate::extract::annotate_row;
use crate::input::{InputArtifact, read_artifact};

/// Suffix of entity artifacts, also used to keep them out of directory inputs
pub const ENTITIES_SUFFIX: &str = "_entities.csv";

/// Why an artifact produced no output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingColumns(Vec<&'static str>),
    NoValidRows,
    NoEntities,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingColumns(cols) => write!(f, "missing columns: {}", cols.join(", ")),
            Self::NoValidRows => f.write_str("no rows with both title and abstract"),
            Self::NoEntities => f.write_str("no entities found"),
        }
    }
}

/// What happened to one input artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactOutcome {
    Written {
        path: PathBuf,
        rows: usize,
        mentions: usize,
    },
    Skipped(SkipReason),
}

/// Annotation run summary
#[derive(Debug, Default)]
pub struct Summary {
    pub total_artifacts: usize,
    pub written_artifacts: usize,
    pub skipped_artifacts: usize,
    /// Artifacts that could not be read or written
    pub failed_artifacts: usize,
    pub rows_annotated: usize,
    pub mentions_written: usize,
    pub outputs: Vec<PathBuf>,
    pub elapsed: Duration,
}

/// `<input_base_name>_entities.csv`
pub fn output_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{stem}{ENTITIES_SUFFIX}")
}

/// Annotate every valid row of one artifact and write its entity artifact.
///
/// Validation and empty results are reported as [`ArtifactOutcome::Skipped`];
/// errors are reserved for unreadable input and failed writes.
pub fn annotate_artifact<A: Annotator + ?Sized>(
    path: &Path,
    annotator: &mut A,
    config: &Config,
    progress: &ProgressContext,
) -> Result<ArtifactOutcome> {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let rows = match read_artifact(path)? {
        InputArtifact::MissingColumns(cols) => {
            let reason = SkipReason::MissingColumns(cols);
            log::warn!("{name}: skipped, {reason}");
            return Ok(ArtifactOutcome::Skipped(reason));
        }
        InputArtifact::Rows { rows, dropped } => {
            if dropped > 0 {
                log::debug!("{name}: dropped {dropped} rows without title or abstract");
            }
            rows
        }
    };
    if rows.is_empty() {
        log::warn!("{name}: skipped, {}", SkipReason::NoValidRows);
        return Ok(ArtifactOutcome::Skipped(SkipReason::NoValidRows));
    }

    let pb = progress.rows_bar(&name, rows.len() as u64);
    let mut batch: BatchAccumulator<EntityMention> = BatchAccumulator::new(name.clone());
    for chunk in rows.chunks(config.chunk_len(rows.len())) {
        for row in chunk {
            batch.extend(annotate_row(row, annotator));
            pb.inc(1);
        }
        pb.set_message(format!("{} entities", fmt_num(batch.len())));
        if config.is_chunked() {
            annotator.reclaim();
        }
    }
    pb.finish_and_clear();

    let Some(mentions) = batch.take_batch(String::new()) else {
        log::warn!("{name}: {}", SkipReason::NoEntities);
        return Ok(ArtifactOutcome::Skipped(SkipReason::NoEntities));
    };

    let filename = output_name(path);
    let out = write_artifact(&config.output_dir, &filename, &mentions)
        .with_context(|| format!("Failed to write {filename}"))?;
    log::info!(
        "{name}: {} entities from {} rows -> {filename}",
        fmt_num(mentions.len()),
        fmt_num(rows.len())
    );

    Ok(ArtifactOutcome::Written {
        path: out,
        rows: rows.len(),
        mentions: mentions.len(),
    })
}

/// Expand inputs: files are kept as given, directories contribute their
/// `*.csv` files (sorted) except entity artifacts.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        let pattern = input.join("*.csv");
        let pattern_str = pattern.to_string_lossy();
        let mut entries: Vec<PathBuf> = glob::glob(&pattern_str)
            .context("invalid glob pattern")?
            .filter_map(|e| e.ok())
            .filter(|p| {
                p.is_file()
                    && p
                        .file_name()
                        .is_some_and(|n| !n.to_string_lossy().ends_with(ENTITIES_SUFFIX))
            })
            .collect();
        entries.sort();
        if entries.is_empty() {
            log::warn!("{}: no CSV artifacts", input.display());
        }
        files.extend(entries);
    }
    Ok(files)
}

/// Annotate each input artifact in order.
///
/// A failure on one artifact is logged and counted; the run continues.
pub fn run<A: Annotator + ?Sized>(
    inputs: &[PathBuf],
    annotator: &mut A,
    config: &Config,
    progress: &ProgressContext,
) -> Result<Summary> {
    let started = Instant::now();
    let files = collect_inputs(inputs)?;
    log::info!("Annotating {} artifacts", files.len());

    let mut summary = Summary {
        total_artifacts: files.len(),
        ..Default::default()
    };
    for file in &files {
        match annotate_artifact(file, annotator, config, progress) {
            Ok(ArtifactOutcome::Written {
                path,
                rows,
                mentions,
            }) => {
                summary.written_artifacts += 1;
                summary.rows_annotated += rows;
                summary.mentions_written += mentions;
                summary.outputs.push(path);
            }
            Ok(ArtifactOutcome::Skipped(_)) => summary.skipped_artifacts += 1,
            Err(e) => {
                summary.failed_artifacts += 1;
                log::error!("{}: {e:#}", file.display());
            }
        }
    }
    summary.elapsed = started.elapsed();

    log::info!("=== Annotation Summary ===");
    log::info!(
        "Artifacts: {}/{} written ({} skipped, {} failed)",
        summary.written_artifacts,
        summary.total_artifacts,
        summary.skipped_artifacts,
        summary.failed_artifacts
    );
    log::info!(
        "Entities: {} from {} rows",
        fmt_num(summary.mentions_written),
        fmt_num(summary.rows_annotated)
    );
    log::info!("Time: {:.1}s", summary.elapsed.as_secs_f64());

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use anyhow::bail;
    use tempfile::TempDir;

    use super::*;
    use crate::annotator::Mention;

    /// Tags every capitalized word as GENE and counts reclaim calls
    #[derive(Default)]
    struct Capitals {
        calls: usize,
        reclaims: usize,
        texts: Vec<String>,
    }

    impl Annotator for Capitals {
        fn annotate(&mut self, text: &str) -> anyhow::Result<Vec<Mention>> {
            self.calls += 1;
            self.texts.push(text.to_string());
            Ok(text
                .split_whitespace()
                .filter(|w| w.starts_with(char::is_uppercase))
                .map(|w| Mention::new(w, "GENE"))
                .collect())
        }

        fn reclaim(&mut self) {
            self.reclaims += 1;
        }
    }

    struct Silent;

    impl Annotator for Silent {
        fn annotate(&mut self, _text: &str) -> anyhow::Result<Vec<Mention>> {
            Ok(Vec::new())
        }
    }

    struct Broken;

    impl Annotator for Broken {
        fn annotate(&mut self, _text: &str) -> anyhow::Result<Vec<Mention>> {
            bail!("out of memory")
        }
    }

    const HEADER: &str = "PUBMED_ID,TITLE,ABSTRACT,CONTENT,JOURNAL,PUBLICATION DATE,AUTHORS,DOI,ARTICLE TYPE,LANGUAGE,MESH TERMS,GRANT SUPPORT\n";

    fn artifact(dir: &Path, name: &str, rows: &[(&str, &str, &str)]) -> PathBuf {
        let mut body = HEADER.to_string();
        for (id, title, abstract_text) in rows {
            body.push_str(&format!(
                "{id},{title},{abstract_text},,Unknown,2020/01/03,Unknown,Unknown,Unknown,Unknown,,None\n"
            ));
        }
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn config(dir: &Path, chunk_size: Option<usize>) -> Config {
        Config {
            output_dir: dir.join("entities"),
            chunk_size,
        }
    }

    fn read_entities(path: &Path) -> Vec<EntityMention> {
        csv::Reader::from_path(path)
            .unwrap()
            .deserialize()
            .map(|r| r.unwrap())
            .collect()
    }

    fn sample(dir: &Path) -> PathBuf {
        artifact(
            dir,
            "pubmed_articles_2020-01-01_to_2020-01-07.csv",
            &[
                ("1", "Gene1 regulates", "gene1 and Protein2"),
                ("2", "", "Orphan abstract"),
                ("3", "Kinase study", "ATP binding by Kinase"),
                ("4", "quiet title", "nothing here"),
                ("5", "Rubisco", "Rubisco Activase"),
            ],
        )
    }

    #[test]
    fn writes_deduplicated_entities() {
        let dir = TempDir::new().unwrap();
        let input = sample(dir.path());
        let mut annotator = Capitals::default();

        let outcome = annotate_artifact(
            &input,
            &mut annotator,
            &config(dir.path(), None),
            &ProgressContext::hidden(),
        )
        .unwrap();

        let expected_path = dir
            .path()
            .join("entities")
            .join("pubmed_articles_2020-01-01_to_2020-01-07_entities.csv");
        assert_eq!(
            outcome,
            ArtifactOutcome::Written {
                path: expected_path.clone(),
                rows: 4,
                mentions: 6,
            }
        );

        let entities = read_entities(&expected_path);
        let pairs: Vec<(&str, &str)> = entities
            .iter()
            .map(|e| (e.id.as_str(), e.entity_text.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("1", "gene1"),
                ("1", "protein2"),
                ("3", "kinase"),
                ("3", "atp"),
                ("5", "rubisco"),
                ("5", "activase"),
            ]
        );
        assert_eq!(entities[0].title, "Gene1 regulates");
        assert_eq!(entities[0].publication_date, "2020/01/03");
        assert_eq!(entities[0].label, "GENE");
    }

    #[test]
    fn rows_without_title_never_reach_annotator() {
        let dir = TempDir::new().unwrap();
        let input = sample(dir.path());
        let mut annotator = Capitals::default();

        annotate_artifact(
            &input,
            &mut annotator,
            &config(dir.path(), None),
            &ProgressContext::hidden(),
        )
        .unwrap();

        assert_eq!(annotator.calls, 4);
        assert!(annotator.texts.iter().all(|t| !t.contains("Orphan")));
    }

    #[test]
    fn chunking_does_not_change_output() {
        let dir = TempDir::new().unwrap();
        let input = sample(dir.path());

        let unchunked_dir = dir.path().join("a");
        let chunked_dir = dir.path().join("b");
        let mut one_pass = Capitals::default();
        let mut chunked = Capitals::default();

        annotate_artifact(
            &input,
            &mut one_pass,
            &config(&unchunked_dir, None),
            &ProgressContext::hidden(),
        )
        .unwrap();
        annotate_artifact(
            &input,
            &mut chunked,
            &config(&chunked_dir, Some(3)),
            &ProgressContext::hidden(),
        )
        .unwrap();

        let name = output_name(&input);
        let a = std::fs::read_to_string(unchunked_dir.join("entities").join(&name)).unwrap();
        let b = std::fs::read_to_string(chunked_dir.join("entities").join(&name)).unwrap();
        assert_eq!(a, b);
        assert_eq!(one_pass.reclaims, 0);
        assert_eq!(chunked.reclaims, 2);
    }

    #[test]
    fn missing_columns_skip_without_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("partial.csv");
        std::fs::write(&input, "PUBMED_ID,TITLE,ABSTRACT\n1,Gene1,Protein2\n").unwrap();
        let mut annotator = Capitals::default();

        let outcome = annotate_artifact(
            &input,
            &mut annotator,
            &config(dir.path(), None),
            &ProgressContext::hidden(),
        )
        .unwrap();

        assert_eq!(
            outcome,
            ArtifactOutcome::Skipped(SkipReason::MissingColumns(vec!["PUBLICATION DATE"]))
        );
        assert_eq!(annotator.calls, 0);
        assert!(!dir.path().join("entities").exists());
    }

    #[test]
    fn no_valid_rows_skip() {
        let dir = TempDir::new().unwrap();
        let input = artifact(dir.path(), "empty.csv", &[("1", "", "Abstract")]);

        let outcome = annotate_artifact(
            &input,
            &mut Capitals::default(),
            &config(dir.path(), None),
            &ProgressContext::hidden(),
        )
        .unwrap();
        assert_eq!(outcome, ArtifactOutcome::Skipped(SkipReason::NoValidRows));
    }

    #[test]
    fn no_mentions_means_no_file() {
        let dir = TempDir::new().unwrap();
        let input = sample(dir.path());

        let outcome = annotate_artifact(
            &input,
            &mut Silent,
            &config(dir.path(), None),
            &ProgressContext::hidden(),
        )
        .unwrap();

        assert_eq!(outcome, ArtifactOutcome::Skipped(SkipReason::NoEntities));
        assert!(!dir.path().join("entities").exists());
    }

    #[test]
    fn annotator_failures_are_zero_mentions() {
        let dir = TempDir::new().unwrap();
        let input = sample(dir.path());

        let outcome = annotate_artifact(
            &input,
            &mut Broken,
            &config(dir.path(), None),
            &ProgressContext::hidden(),
        )
        .unwrap();
        assert_eq!(outcome, ArtifactOutcome::Skipped(SkipReason::NoEntities));
    }

    #[test]
    fn collect_inputs_expands_directories() {
        let dir = TempDir::new().unwrap();
        artifact(dir.path(), "b.csv", &[]);
        artifact(dir.path(), "a.csv", &[]);
        std::fs::write(dir.path().join("a_entities.csv"), "x\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x\n").unwrap();
        let single = dir.path().join("elsewhere.csv");

        let files = collect_inputs(&[dir.path().to_path_buf(), single.clone()]).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.csv"), dir.path().join("b.csv"), single]
        );
    }

    #[test]
    fn run_counts_each_outcome() {
        let dir = TempDir::new().unwrap();
        let inputs = dir.path().join("inputs");
        std::fs::create_dir(&inputs).unwrap();
        sample(&inputs);
        artifact(&inputs, "blank.csv", &[("9", "", "")]);
        let missing = dir.path().join("missing.csv");

        let summary = run(
            &[inputs, missing],
            &mut Capitals::default(),
            &config(dir.path(), Some(2)),
            &ProgressContext::hidden(),
        )
        .unwrap();

        assert_eq!(summary.total_artifacts, 3);
        assert_eq!(summary.written_artifacts, 1);
        assert_eq!(summary.skipped_artifacts, 1);
        assert_eq!(summary.failed_artifacts, 1);
        assert_eq!(summary.rows_annotated, 4);
        assert_eq!(summary.mentions_written, 6);
        assert_eq!(summary.outputs.len(), 1);
    }

    #[test]
    fn write_failure_does_not_stop_next_artifact() {
        let dir = TempDir::new().unwrap();
        let inputs = dir.path().join("inputs");
        std::fs::create_dir(&inputs).unwrap();
        artifact(&inputs, "a.csv", &[("1", "Gene1 study", "levels of Protein2")]);
        artifact(&inputs, "b.csv", &[("2", "Kinase study", "binding by Kinase")]);
        std::fs::create_dir_all(dir.path().join("entities").join("a_entities.csv")).unwrap();

        let summary = run(
            &[inputs],
            &mut Capitals::default(),
            &config(dir.path(), None),
            &ProgressContext::hidden(),
        )
        .unwrap();

        assert_eq!(summary.total_artifacts, 2);
        assert_eq!(summary.failed_artifacts, 1);
        assert_eq!(summary.written_artifacts, 1);
        let out = dir.path().join("entities").join("b_entities.csv");
        assert_eq!(summary.outputs, vec![out.clone()]);
        let ids: Vec<String> = read_entities(&out).into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn output_name_uses_stem() {
        assert_eq!(
            output_name(Path::new("/data/pubmed_articles_2020-01-01_to_2020-01-07.csv")),
            "pubmed_articles_2020-01-01_to_2020-01-07_entities.csv"
        );
    }
}
