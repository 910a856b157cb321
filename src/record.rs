//! Row normalization: raw CSV records into display-ready contracts.
//!
//! A [`Contract`] keeps every original field (dates upgraded in place when
//! parseable) and carries the derived display fields alongside: the
//! signed-status and recommendation classifications, the concatenated
//! rights-grant text, the cleaned ISBN, and the merged paired fields of the
//! AI-assisted export generation. The transform is pure and idempotent.

use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use indexmap::IndexMap;
use regex::Regex;
use thiserror::Error;

use crate::schema::{self, ContractSchema};

/// One CSV data row: field name to raw string, in source-column order.
pub type RawRecord = IndexMap<String, String>;

/// Display format for coerced dates, e.g. `02 Jan 2020`.
pub const DATE_DISPLAY_FORMAT: &str = "%d %b %Y";

/// Accepted input formats for the date columns, tried in order.
const DATE_INPUT_FORMATS: &[&str] = &["%m/%d/%Y", "%m/%d/%y", "%Y-%m-%d", "%d %b %Y", "%B %d, %Y"];

/// A derivation column was structurally absent from the row's key set.
/// A present-but-empty field is valid input and never raises this.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("column {0:?} is required for normalization but absent from the row")]
pub struct MissingColumn(pub String);

/// Parse a date column value; `None` keeps the original string.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    DATE_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// A field value after date coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn display(&self, date_format: &str) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Date(d) => d.format(date_format).to_string(),
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            FieldValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display(DATE_DISPLAY_FORMAT))
    }
}

/// Three-way classification of the free-text signature-status field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedStatus {
    Signed,
    Unsigned,
    Ambiguous,
}

impl SignedStatus {
    pub fn classify(text: &str) -> Self {
        static FULLY: OnceLock<Regex> = OnceLock::new();
        static NOT: OnceLock<Regex> = OnceLock::new();
        let fully = FULLY.get_or_init(|| Regex::new(r"(?i)fully signed").unwrap());
        let not = NOT.get_or_init(|| Regex::new(r"(?i)not signed").unwrap());

        let text = text.trim();
        if fully.is_match(text) {
            SignedStatus::Signed
        } else if text.is_empty() || not.is_match(text) {
            SignedStatus::Unsigned
        } else {
            SignedStatus::Ambiguous
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            SignedStatus::Signed => "✔",
            SignedStatus::Unsigned => "✘",
            SignedStatus::Ambiguous => "●",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignedStatus::Signed => "Signed",
            SignedStatus::Unsigned => "Unsigned",
            SignedStatus::Ambiguous => "Ambiguous",
        }
    }
}

/// Three-way classification of the free-text licensing recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    Yes,
    No,
    Ambiguous,
}

impl Recommendation {
    pub fn classify(text: &str) -> Self {
        static YES: OnceLock<Regex> = OnceLock::new();
        static NO: OnceLock<Regex> = OnceLock::new();
        let yes = YES.get_or_init(|| Regex::new(r"(?i)\byes\b").unwrap());
        let no = NO.get_or_init(|| Regex::new(r"(?i)\bno\b").unwrap());

        if yes.is_match(text) {
            Recommendation::Yes
        } else if no.is_match(text) {
            Recommendation::No
        } else {
            Recommendation::Ambiguous
        }
    }

    pub fn glyph(&self) -> &'static str {
        "●"
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Yes => "Yes",
            Recommendation::No => "No",
            Recommendation::Ambiguous => "Ambiguous",
        }
    }
}

/// A normalized contract row: the original fields plus derived display data.
#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
    /// Original fields in source order; date columns upgraded when parseable.
    pub fields: IndexMap<String, FieldValue>,
    pub signed: SignedStatus,
    pub recommendation: Recommendation,
    pub rights_grant: String,
    pub isbn: String,
    /// Merged paired fields, category name to merged text (assisted exports).
    pub merged: IndexMap<String, String>,
}

fn require<'a>(raw: &'a RawRecord, field: &str) -> Result<&'a str, MissingColumn> {
    raw.get(field)
        .map(String::as_str)
        .ok_or_else(|| MissingColumn(field.to_string()))
}

/// Merge one paired category. Missing or empty halves collapse to nothing
/// rather than a placeholder; the `Rationale:` decoration is dropped with an
/// empty rationale.
fn merge_paired(output: &str, rationale: &str) -> String {
    match (output.is_empty(), rationale.is_empty()) {
        (true, true) => String::new(),
        (false, true) => output.to_string(),
        (true, false) => format!("Rationale: {rationale}"),
        (false, false) => format!("{output}\n\nRationale: {rationale}"),
    }
}

/// Strip the single leading literal `B` some exports prepend to the ISBN.
/// Exactly one, only `B`: other leading letters are real data.
fn clean_isbn(raw: &str) -> String {
    raw.strip_prefix('B').unwrap_or(raw).to_string()
}

/// Normalize one raw row against the active schema.
pub fn normalize(raw: &RawRecord, schema: &ContractSchema) -> Result<Contract, MissingColumn> {
    let signed = SignedStatus::classify(require(raw, &schema.signature_field)?);
    let recommendation = Recommendation::classify(require(raw, &schema.recommendation_field)?);

    let mut parts = Vec::with_capacity(schema.grant_fields.len());
    for field in &schema.grant_fields {
        let value = require(raw, field)?.trim();
        if !value.is_empty() {
            parts.push(value);
        }
    }
    let rights_grant = parts.join(schema.grant_separator.as_str());

    let isbn = clean_isbn(require(raw, &schema.isbn_field)?);

    let mut merged = IndexMap::new();
    if let Some(paired) = &schema.paired {
        for category in &paired.categories {
            let output = require(raw, &paired.output_column(category))?;
            let rationale = require(raw, &paired.rationale_column(category))?;
            merged.insert(category.clone(), merge_paired(output, rationale));
        }
    }

    let fields = raw
        .iter()
        .map(|(name, value)| {
            let coerced = if schema.date_fields.iter().any(|f| f == name) {
                match parse_date(value) {
                    Some(date) => FieldValue::Date(date),
                    None => FieldValue::Text(value.clone()),
                }
            } else if *name == schema.isbn_field {
                FieldValue::Text(isbn.clone())
            } else {
                FieldValue::Text(value.clone())
            };
            (name.clone(), coerced)
        })
        .collect();

    Ok(Contract {
        fields,
        signed,
        recommendation,
        rights_grant,
        isbn,
        merged,
    })
}

impl Contract {
    /// Resolve a field name to its display value: derived virtual names
    /// first, then merged paired fields, then the original columns.
    pub fn value(&self, name: &str) -> FieldValue {
        match name {
            schema::SIGNED => return FieldValue::Text(self.signed.as_str().to_string()),
            schema::RECOMMENDATION => {
                return FieldValue::Text(self.recommendation.as_str().to_string())
            }
            schema::RIGHTS_GRANT => return FieldValue::Text(self.rights_grant.clone()),
            _ => {}
        }
        if let Some(text) = self.merged.get(name) {
            return FieldValue::Text(text.clone());
        }
        self.fields
            .get(name)
            .cloned()
            .unwrap_or_else(|| FieldValue::Text(String::new()))
    }

    /// Raw text of a field, empty when absent. Does not resolve virtual or
    /// merged names.
    pub fn raw_text(&self, name: &str) -> &str {
        match self.fields.get(name) {
            Some(FieldValue::Text(s)) => s.as_str(),
            _ => "",
        }
    }

    /// Key/value rows for the detail panel: original fields in source order
    /// (paired halves excluded, ISBN cleaned), then the merged paired fields,
    /// then the derived classifications.
    pub fn detail_rows(&self, schema: &ContractSchema, date_format: &str) -> Vec<(String, String)> {
        let mut rows = Vec::with_capacity(self.fields.len() + self.merged.len() + 3);
        for (name, value) in &self.fields {
            if schema
                .paired
                .as_ref()
                .is_some_and(|p| p.is_pair_member(name))
            {
                continue;
            }
            rows.push((name.clone(), value.display(date_format)));
        }
        for (category, text) in &self.merged {
            rows.push((category.clone(), text.clone()));
        }
        rows.push((schema::SIGNED.to_string(), self.signed.as_str().to_string()));
        rows.push((
            schema::RECOMMENDATION.to_string(),
            self.recommendation.as_str().to_string(),
        ));
        rows.push((schema::RIGHTS_GRANT.to_string(), self.rights_grant.clone()));
        rows
    }
}
