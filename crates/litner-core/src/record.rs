//! Row types and column schemas for the artifact handoff
//!
//! Acquisition writes [`BibliographicRecord`] rows, annotation reads them back
//! by column name and writes [`EntityMention`] rows. The serde renames are the
//! on-disk header names.

use serde::{Deserialize, Serialize};

/// Sentinel for metadata fields the service did not supply
pub const UNKNOWN: &str = "Unknown";

/// Sentinel for an absent funding list
pub const NO_FUNDING: &str = "None";

/// Header of an acquisition artifact, in column order
pub const ARTICLE_COLUMNS: [&str; 12] = [
    "PUBMED_ID",
    "TITLE",
    "ABSTRACT",
    "CONTENT",
    "JOURNAL",
    "PUBLICATION DATE",
    "AUTHORS",
    "DOI",
    "ARTICLE TYPE",
    "LANGUAGE",
    "MESH TERMS",
    "GRANT SUPPORT",
];

/// Header of an entity artifact, in column order
pub const ENTITY_COLUMNS: [&str; 6] = [
    "PUBMED_ID",
    "TITLE",
    "ABSTRACT",
    "PUBLICATION DATE",
    "ENTITY",
    "LABEL",
];

/// Columns an acquisition artifact must carry to be annotated
pub const REQUIRED_INPUT_COLUMNS: [&str; 4] = ["PUBMED_ID", "TITLE", "ABSTRACT", "PUBLICATION DATE"];

/// Normalize a header cell for lookup: trimmed and upper-cased
pub fn normalize_column(name: &str) -> String {
    name.trim().to_uppercase()
}

/// One retrieved publication, as persisted by the acquisition stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibliographicRecord {
    #[serde(rename = "PUBMED_ID")]
    pub id: String,
    #[serde(rename = "TITLE")]
    pub title: String,
    #[serde(rename = "ABSTRACT")]
    pub abstract_text: String,
    #[serde(rename = "CONTENT")]
    pub content: String,
    #[serde(rename = "JOURNAL")]
    pub journal: String,
    #[serde(rename = "PUBLICATION DATE")]
    pub publication_date: String,
    #[serde(rename = "AUTHORS")]
    pub authors: String,
    #[serde(rename = "DOI")]
    pub external_reference_id: String,
    #[serde(rename = "ARTICLE TYPE")]
    pub record_type: String,
    #[serde(rename = "LANGUAGE")]
    pub language: String,
    #[serde(rename = "MESH TERMS")]
    pub subject_terms: String,
    #[serde(rename = "GRANT SUPPORT")]
    pub funding_references: String,
}

/// Concatenate title and abstract the way both stages expect (`"<title> <abstract>"`)
pub fn combined_text(title: &str, abstract_text: &str) -> String {
    match (title.is_empty(), abstract_text.is_empty()) {
        (false, false) => format!("{title} {abstract_text}"),
        (false, true) => title.to_string(),
        (true, false) => abstract_text.to_string(),
        (true, true) => String::new(),
    }
}

/// One deduplicated entity found in a record's title + abstract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMention {
    #[serde(rename = "PUBMED_ID")]
    pub id: String,
    #[serde(rename = "TITLE")]
    pub title: String,
    #[serde(rename = "ABSTRACT")]
    pub abstract_text: String,
    #[serde(rename = "PUBLICATION DATE")]
    pub publication_date: String,
    #[serde(rename = "ENTITY")]
    pub entity_text: String,
    #[serde(rename = "LABEL")]
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> BibliographicRecord {
        BibliographicRecord {
            id: "31900001".to_string(),
            title: "Light harvesting".to_string(),
            abstract_text: "Chlorophyll a binds.".to_string(),
            content: "Light harvesting Chlorophyll a binds.".to_string(),
            journal: "Plant Cell".to_string(),
            publication_date: "2020/01/03".to_string(),
            authors: "Doe, Jane".to_string(),
            external_reference_id: UNKNOWN.to_string(),
            record_type: "Journal Article".to_string(),
            language: "eng".to_string(),
            subject_terms: String::new(),
            funding_references: NO_FUNDING.to_string(),
        }
    }

    #[test]
    fn record_header_matches_article_columns() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(sample_record()).unwrap();
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, ARTICLE_COLUMNS.join(","));
    }

    #[test]
    fn mention_header_matches_entity_columns() {
        let mention = EntityMention {
            id: "1".to_string(),
            title: "t".to_string(),
            abstract_text: "a".to_string(),
            publication_date: UNKNOWN.to_string(),
            entity_text: "gene1".to_string(),
            label: "GENE".to_string(),
        };
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(&mention).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(text.lines().next().unwrap(), ENTITY_COLUMNS.join(","));
    }

    #[test]
    fn record_survives_csv() {
        let record = sample_record();
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(&record).unwrap();
        let bytes = writer.into_inner().unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let back: BibliographicRecord = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn normalize_column_trims_and_uppercases() {
        assert_eq!(normalize_column("  publication date "), "PUBLICATION DATE");
        assert_eq!(normalize_column("Title"), "TITLE");
    }

    #[test]
    fn combined_text_joins_with_space() {
        assert_eq!(combined_text("A", "B"), "A B");
        assert_eq!(combined_text("A", ""), "A");
        assert_eq!(combined_text("", "B"), "B");
        assert_eq!(combined_text("", ""), "");
    }
}
