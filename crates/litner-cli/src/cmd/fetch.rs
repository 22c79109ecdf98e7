//! Fetch subcommand - windowed PubMed acquisition

use std::path::PathBuf;

use anyhow::{Result, bail, ensure};
use chrono::NaiveDate;
use clap::Args;

use litner_core::{SharedProgress, fmt_num};
use litner_pubmed::EutilsClient;

use super::print_summary;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Search term, e.g. "photosynthesis"
    #[arg(short, long)]
    pub term: String,

    /// First publication date (YYYY-MM-DD, inclusive)
    #[arg(long, value_parser = parse_date)]
    pub start: NaiveDate,

    /// End publication date (YYYY-MM-DD, exclusive)
    #[arg(long, value_parser = parse_date)]
    pub end: NaiveDate,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Records requested per search page
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Artifact file name prefix
    #[arg(long)]
    pub prefix: Option<String>,

    /// Milliseconds to wait after each page
    #[arg(long)]
    pub delay_ms: Option<u64>,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("Invalid date format: {e}"))
}

pub fn run(args: FetchArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    ensure!(args.start < args.end, "--end must be after --start");

    let output_dir = args
        .output
        .unwrap_or_else(|| config.output.dir.join("pubmed"));

    let pm_config = litner_pubmed::Config {
        term: args.term,
        start: args.start,
        end: args.end,
        output_dir: output_dir.clone(),
        page_size: args.page_size.unwrap_or(config.fetch.page_size),
        request_delay: args
            .delay_ms
            .map(std::time::Duration::from_millis)
            .unwrap_or_else(|| config.eutils.request_delay()),
        prefix: args.prefix.unwrap_or_else(|| config.fetch.prefix.clone()),
    };

    log::info!("Fetching PubMed records for '{}'", pm_config.term);
    log::info!("  Range: {} to {} (exclusive)", pm_config.start, pm_config.end);
    log::info!("  Output: {}", output_dir.display());

    let client = EutilsClient::new(&config.eutils.client_config())?;
    let summary = litner_pubmed::run(&client, &pm_config, progress)?;

    print_summary(
        "PubMed",
        &[
            (
                "Windows",
                format!(
                    "{}/{} written ({} failed)",
                    summary.written_windows, summary.total_windows, summary.failed_windows
                ),
            ),
            (
                "Records",
                format!(
                    "{} ({} skipped)",
                    fmt_num(summary.total_records),
                    fmt_num(summary.skipped_records)
                ),
            ),
            ("Output", output_dir.display().to_string()),
            ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
        ],
    );

    if summary.failed_windows > 0 {
        bail!("Some windows failed");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso() {
        assert_eq!(
            parse_date("2020-01-15").unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 15).unwrap()
        );
    }

    #[test]
    fn parse_date_rejects_other_formats() {
        assert!(parse_date("2020/01/15").is_err());
        assert!(parse_date("15-01-2020").is_err());
    }
}
