//! Annotate subcommand - entity extraction over fetched artifacts

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;

use litner_core::{SharedProgress, fmt_num};
use litner_ner::DictionaryAnnotator;

use super::print_summary;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct AnnotateArgs {
    /// Artifact files or directories of artifacts
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Tab-separated lexicon (term, label)
    #[arg(short, long)]
    pub lexicon: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Rows per chunk (0 = whole artifact at once)
    #[arg(long)]
    pub chunk_size: Option<usize>,
}

pub fn run(args: AnnotateArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let Some(lexicon) = args.lexicon.or_else(|| config.annotate.lexicon.clone()) else {
        bail!("No lexicon: pass --lexicon or set [annotate] lexicon in the config file");
    };
    let output_dir = args
        .output
        .unwrap_or_else(|| config.output.dir.join("entities"));

    let ner_config = litner_ner::Config {
        output_dir: output_dir.clone(),
        chunk_size: args.chunk_size.or(config.annotate.chunk_size),
    };

    log::info!("Annotating {} inputs", args.inputs.len());
    log::info!("  Lexicon: {}", lexicon.display());
    log::info!("  Output: {}", output_dir.display());

    let mut annotator = DictionaryAnnotator::from_lexicon(&lexicon)?;
    log::info!("  Terms: {}", fmt_num(annotator.term_count()));
    let summary = litner_ner::run(&args.inputs, &mut annotator, &ner_config, progress)?;

    print_summary(
        "Annotation",
        &[
            (
                "Artifacts",
                format!(
                    "{}/{} written ({} skipped, {} failed)",
                    summary.written_artifacts,
                    summary.total_artifacts,
                    summary.skipped_artifacts,
                    summary.failed_artifacts
                ),
            ),
            ("Rows", fmt_num(summary.rows_annotated)),
            ("Entities", fmt_num(summary.mentions_written)),
            ("Output", output_dir.display().to_string()),
            ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
        ],
    );

    if summary.failed_artifacts > 0 {
        bail!("Some artifacts failed");
    }

    Ok(())
}
