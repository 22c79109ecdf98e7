//! Transform parsed PubMed articles into artifact rows

use litner_core::record::{NO_FUNDING, UNKNOWN, combined_text};
use litner_core::BibliographicRecord;

use crate::parser::{Author, PubmedArticle};

/// Why an article could not become a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No PMID in the citation
    MissingId,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId => f.write_str("missing PMID"),
        }
    }
}

/// Build the canonical row for one article.
pub fn to_record(article: PubmedArticle) -> Result<BibliographicRecord, SkipReason> {
    let id = article.pmid.trim().to_string();
    if id.is_empty() {
        return Err(SkipReason::MissingId);
    }

    let title = article.title.as_deref().unwrap_or_default().trim().to_string();
    let abstract_text = article
        .abstract_text
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_string();
    let content = combined_text(&title, &abstract_text);

    Ok(BibliographicRecord {
        id,
        content,
        journal: or_unknown(article.journal_title),
        publication_date: publication_date(article.pub_year, article.pub_month, article.pub_day),
        authors: authors(&article.authors),
        external_reference_id: or_unknown(article.doi.or(article.elocation_doi)),
        record_type: or_unknown(article.publication_types.into_iter().next()),
        language: or_unknown(article.language),
        subject_terms: article.mesh_descriptors.join(", "),
        funding_references: if article.grant_ids.is_empty() {
            NO_FUNDING.to_string()
        } else {
            article.grant_ids.join(", ")
        },
        title,
        abstract_text,
    })
}

fn or_unknown(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// `YYYY/MM/DD`, or `Unknown` unless all three parts are present
fn publication_date(year: Option<i32>, month: Option<i32>, day: Option<i32>) -> String {
    match (year, month, day) {
        (Some(y), Some(m), Some(d)) => format!("{y:04}/{m:02}/{d:02}"),
        _ => UNKNOWN.to_string(),
    }
}

/// "Last, First" for authors with both name parts, in author order
fn authors(authors: &[Author]) -> String {
    let names: Vec<String> = authors
        .iter()
        .filter_map(|a| match (&a.last_name, &a.fore_name) {
            (Some(last), Some(fore)) => Some(format!("{last}, {fore}")),
            _ => None,
        })
        .collect();
    if names.is_empty() {
        UNKNOWN.to_string()
    } else {
        names.join("; ")
    }
}
