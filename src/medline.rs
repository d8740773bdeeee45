//! MEDLINE text format parsing
//!
//! Both the Entrez API path (`efetch ... rettype=medline retmode=text`) and
//! the EDirect pipeline (`efetch -format medline`) emit records in the
//! MEDLINE tagged format:
//!
//! ```text
//! PMID- 31978945
//! TI  - A clinical overview of an emerging
//!       respiratory pathogen.
//! FAU - Doe, Jane
//! FAU - Smith, John
//! MH  - Humans
//! ```
//!
//! A tag occupies the first four columns (space-padded) followed by `"- "`;
//! continuation lines are indented and belong to the preceding tag; repeated
//! tags accumulate in order; a blank line ends a record.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{PubMedError, Result};
use crate::table::ArticleRecord;

fn whitespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("static pattern"))
}

/// Collapse runs of whitespace to single spaces and trim the ends
pub(crate) fn normalize_whitespace(text: &str) -> String {
    whitespace_pattern()
        .replace_all(text.trim(), " ")
        .into_owned()
}

/// Tag/value pairs of one MEDLINE record, in document order
type RawRecord = Vec<(String, String)>;

/// Parse a MEDLINE document into article records.
///
/// Records missing a `PMID` tag are skipped with a warning rather than
/// failing the whole document; a structurally malformed line is an error.
pub fn parse_medline(text: &str) -> Result<Vec<ArticleRecord>> {
    let mut records = Vec::new();
    let mut current: RawRecord = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                flush_record(std::mem::take(&mut current), &mut records);
            }
            continue;
        }

        if line.starts_with(' ') {
            // Continuation of the previous field
            let (_, value) = current.last_mut().ok_or_else(|| {
                PubMedError::MedlineParseError {
                    message: format!("continuation line without a preceding tag: {line:?}"),
                }
            })?;
            value.push(' ');
            value.push_str(line.trim_start());
            continue;
        }

        let (tag, value) = split_tag_line(line)?;
        current.push((tag.to_string(), value.to_string()));
    }

    if !current.is_empty() {
        flush_record(current, &mut records);
    }

    debug!(record_count = records.len(), "Parsed MEDLINE document");
    Ok(records)
}

/// Split a `"TAG - value"` line into tag and value
fn split_tag_line(line: &str) -> Result<(&str, &str)> {
    let malformed = || PubMedError::MedlineParseError {
        message: format!("malformed MEDLINE line: {line:?}"),
    };

    let tag = line.get(..4).ok_or_else(malformed)?.trim_end();
    let separator = line.get(4..6).ok_or_else(malformed)?;
    if tag.is_empty() || separator != "- " {
        return Err(malformed());
    }

    Ok((tag, line.get(6..).unwrap_or("")))
}

fn flush_record(fields: RawRecord, records: &mut Vec<ArticleRecord>) {
    match build_record(&fields) {
        Some(record) => records.push(record),
        None => warn!("Skipping MEDLINE record without a PMID"),
    }
}

fn build_record(fields: &RawRecord) -> Option<ArticleRecord> {
    let first = |tag: &str| {
        fields
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, v)| v.trim().to_string())
    };
    let all = |tag: &str| -> Vec<String> {
        fields
            .iter()
            .filter(|(t, _)| t == tag)
            .map(|(_, v)| v.trim().to_string())
            .collect()
    };

    let pmid = first("PMID").filter(|p| !p.is_empty())?;

    Some(ArticleRecord {
        pmid,
        title: normalize_whitespace(&first("TI").unwrap_or_default()),
        abstract_text: normalize_whitespace(&first("AB").unwrap_or_default()),
        authors: all("FAU"),
        pub_date: first("DP").unwrap_or_default(),
        mesh_terms: all("MH"),
        other_terms: all("OT"),
    })
}
