//! Tabular article results
//!
//! Both retrieval paths produce the same shape: one [`ArticleRecord`] per
//! article, collected into an [`ArticleTable`]. The column set and order are
//! fixed by contract so downstream code can rely on them regardless of which
//! path produced the table.

use serde::{Deserialize, Serialize};

/// Metadata for a single PubMed article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// PubMed ID
    pub pmid: String,
    /// Article title, whitespace-normalized
    pub title: String,
    /// Abstract text, whitespace-normalized; empty when the article has none
    pub abstract_text: String,
    /// Full author names in citation order
    pub authors: Vec<String>,
    /// Publication date as reported by PubMed (e.g. "2020 Jan 15")
    pub pub_date: String,
    /// MeSH controlled-vocabulary terms
    pub mesh_terms: Vec<String>,
    /// Author-supplied free-text keywords
    pub other_terms: Vec<String>,
}

/// An immutable table of article records, one row per article
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleTable {
    records: Vec<ArticleRecord>,
}

impl ArticleTable {
    /// Column names, in contract order
    pub const COLUMNS: [&'static str; 7] = [
        "pmid",
        "title",
        "abstract_text",
        "authors",
        "pub_date",
        "mesh_terms",
        "other_terms",
    ];

    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_records(records: Vec<ArticleRecord>) -> Self {
        Self { records }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Borrow the rows
    pub fn records(&self) -> &[ArticleRecord] {
        &self.records
    }

    /// Consume the table, yielding its rows
    pub fn into_records(self) -> Vec<ArticleRecord> {
        self.records
    }

    /// Row at `index`, if present
    pub fn get(&self, index: usize) -> Option<&ArticleRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ArticleRecord> {
        self.records.iter()
    }
}

impl IntoIterator for ArticleTable {
    type Item = ArticleRecord;
    type IntoIter = std::vec::IntoIter<ArticleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a ArticleTable {
    type Item = &'a ArticleRecord;
    type IntoIter = std::slice::Iter<'a, ArticleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pmid: &str) -> ArticleRecord {
        ArticleRecord {
            pmid: pmid.to_string(),
            title: "A title".to_string(),
            abstract_text: String::new(),
            authors: vec!["Doe, Jane".to_string()],
            pub_date: "2020 Jan".to_string(),
            mesh_terms: vec!["Humans".to_string()],
            other_terms: Vec::new(),
        }
    }

    #[test]
    fn test_empty_table() {
        let table = ArticleTable::new();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
        assert!(table.get(0).is_none());
    }

    #[test]
    fn test_rows_preserve_insertion_order() {
        let table = ArticleTable::from_records(vec![record("1"), record("2"), record("3")]);
        assert_eq!(table.len(), 3);
        let pmids: Vec<&str> = table.iter().map(|r| r.pmid.as_str()).collect();
        assert_eq!(pmids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_column_contract() {
        assert_eq!(
            ArticleTable::COLUMNS,
            [
                "pmid",
                "title",
                "abstract_text",
                "authors",
                "pub_date",
                "mesh_terms",
                "other_terms"
            ]
        );
    }

    #[test]
    fn test_serializes_with_contract_field_names() {
        let table = ArticleTable::from_records(vec![record("42")]);
        let json = serde_json::to_value(&table).unwrap();
        let row = &json["records"][0];
        for column in ArticleTable::COLUMNS {
            assert!(row.get(column).is_some(), "missing column {column}");
        }
    }
}
