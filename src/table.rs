//! The table view state machine.
//!
//! Owns the accepted row set, the current sort key/direction, and the
//! filtered view (a sequence of row ids). Sort and search are plain
//! functions of prior state plus input; no rendering concerns live here,
//! the widgets read the state back out.

use std::cmp::Ordering;

use crate::record::{Contract, FieldValue, DATE_DISPLAY_FORMAT};
use crate::search::SearchIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Header indicator for the sorted column.
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

/// Comparator from the original grid: dates compare by instant, everything
/// else by string, case-insensitively. Mixed pairs fall back to strings.
fn compare_values(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a, b) {
        (FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
        (a, b) => {
            let a = a.display(DATE_DISPLAY_FORMAT).to_lowercase();
            let b = b.display(DATE_DISPLAY_FORMAT).to_lowercase();
            a.cmp(&b)
        }
    }
}

#[derive(Debug, Default)]
pub struct TableModel {
    rows: Vec<Contract>,
    /// Row ids (indices into `rows`) making up the current view, in order.
    filtered: Vec<usize>,
    sort_key: Option<String>,
    sort_direction: SortDirection,
}

impl TableModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the full row set; sort and view reset to the upload state.
    pub fn set_rows(&mut self, rows: Vec<Contract>) {
        self.filtered = (0..rows.len()).collect();
        self.rows = rows;
        self.sort_key = None;
        self.sort_direction = SortDirection::Ascending;
    }

    pub fn rows(&self) -> &[Contract] {
        &self.rows
    }

    /// The current view as row ids into `rows()`.
    pub fn filtered(&self) -> &[usize] {
        &self.filtered
    }

    pub fn len(&self) -> usize {
        self.filtered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    /// Row at a position in the current view.
    pub fn row_at(&self, view_index: usize) -> Option<&Contract> {
        self.filtered
            .get(view_index)
            .and_then(|&id| self.rows.get(id))
    }

    /// Row id at a position in the current view.
    pub fn id_at(&self, view_index: usize) -> Option<usize> {
        self.filtered.get(view_index).copied()
    }

    /// Position of a row id within the current view, if visible.
    pub fn position_of(&self, row_id: usize) -> Option<usize> {
        self.filtered.iter().position(|&id| id == row_id)
    }

    pub fn sort_key(&self) -> Option<&str> {
        self.sort_key.as_deref()
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    /// Sort the current view by `field`. Repeating the same field toggles
    /// direction (period 2); a new field starts ascending. The sort is
    /// stable, so ties keep their previous relative order.
    pub fn sort_by(&mut self, field: &str) {
        match &self.sort_key {
            Some(current) if current == field => {
                self.sort_direction = self.sort_direction.toggled();
            }
            _ => {
                self.sort_key = Some(field.to_string());
                self.sort_direction = SortDirection::Ascending;
            }
        }

        let rows = &self.rows;
        let descending = self.sort_direction == SortDirection::Descending;
        self.filtered.sort_by(|&a, &b| {
            let ord = compare_values(&rows[a].value(field), &rows[b].value(field));
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
    }

    /// Filter the view by a search term.
    ///
    /// An empty term restores the full set in original order and clears the
    /// sort key (the ranked view replaced whatever order the sort produced,
    /// so the key no longer describes the view). A non-empty term takes the
    /// index's relevance ranking as the new view.
    pub fn search(&mut self, term: &str, index: &SearchIndex) {
        self.sort_key = None;
        self.sort_direction = SortDirection::Ascending;
        if term.trim().is_empty() {
            self.filtered = (0..self.rows.len()).collect();
        } else {
            self.filtered = index.query(term);
        }
    }
}
