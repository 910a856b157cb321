//! Fuzzy search over the accepted contract set.
//!
//! The index snapshots the searchable fields of every row once per load;
//! queries re-rank the whole set on each keystroke. Scoring is
//! case-insensitive: a substring hit is a perfect match, otherwise the best
//! Jaro-Winkler similarity between the term and the field (or any of its
//! whitespace tokens) decides, with everything under the similarity floor
//! dropped. The floor default of 0.6 mirrors the typo tolerance the original
//! grid shipped with (a normalized edit distance of 0.4).

use strsim::jaro_winkler;

use crate::record::{Contract, DATE_DISPLAY_FORMAT};
use crate::schema::ContractSchema;

/// Default minimum similarity for a row to appear in search results.
pub const DEFAULT_THRESHOLD: f64 = 0.6;

#[derive(Debug, Default)]
pub struct SearchIndex {
    /// Lowercased haystack per row, one entry per searchable field.
    entries: Vec<Vec<String>>,
    threshold: f64,
}

impl SearchIndex {
    /// Snapshot the searchable fields of `rows`. Built once per upload.
    pub fn build(rows: &[Contract], schema: &ContractSchema, threshold: f64) -> Self {
        let entries = rows
            .iter()
            .map(|row| {
                schema
                    .searchable_fields
                    .iter()
                    .map(|field| row.value(field).display(DATE_DISPLAY_FORMAT).to_lowercase())
                    .collect()
            })
            .collect();
        SearchIndex { entries, threshold }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn score_field(term: &str, field: &str) -> f64 {
        if field.is_empty() {
            return 0.0;
        }
        if field.contains(term) {
            return 1.0;
        }
        let mut best = jaro_winkler(term, field);
        for token in field.split_whitespace() {
            best = best.max(jaro_winkler(term, token));
        }
        best
    }

    /// Row ids matching `term`, best match first; ties keep original order.
    ///
    /// The empty term is not a meaningful query here; callers reset the
    /// filtered view instead (see `TableModel::search`).
    pub fn query(&self, term: &str) -> Vec<usize> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f64)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(id, fields)| {
                let score = fields
                    .iter()
                    .map(|f| Self::score_field(&term, f))
                    .fold(0.0_f64, f64::max);
                (score >= self.threshold).then_some((id, score))
            })
            .collect();

        scored.sort_by(|(ia, sa), (ib, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ia.cmp(ib))
        });
        scored.into_iter().map(|(id, _)| id).collect()
    }
}
