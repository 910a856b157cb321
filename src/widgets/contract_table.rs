//! The contract grid: fixed column set, sort indicator, glyph cells.

use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Row, StatefulWidget, Table, TableState};

use crate::config::Theme;
use crate::record::{Contract, Recommendation, SignedStatus};
use crate::schema::{self, ContractSchema};
use crate::table::TableModel;

/// Truncate to a character budget with a trailing ellipsis.
pub fn shorten(text: &str, max_length: usize) -> String {
    if text.chars().count() > max_length {
        let cut: String = text.chars().take(max_length).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Isbn,
    Signatory,
    Date,
    Signed,
    Recommendation,
    Rationale,
    RightsGrant,
    GoverningLaw,
    Term,
    Amendments,
}

/// One grid column: its header title and the field its sort targets.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub kind: ColumnKind,
    pub title: &'static str,
    pub sort_field: String,
}

/// The fixed column order of the grid, resolved against a schema variant.
pub fn columns(schema: &ContractSchema) -> Vec<ColumnSpec> {
    vec![
        ColumnSpec {
            kind: ColumnKind::Isbn,
            title: "ISBN",
            sort_field: schema.isbn_field.clone(),
        },
        ColumnSpec {
            kind: ColumnKind::Signatory,
            title: "Signatory",
            sort_field: schema.signatory_name_field.clone(),
        },
        ColumnSpec {
            kind: ColumnKind::Date,
            title: "Date",
            sort_field: schema.agreement_date_field.clone(),
        },
        ColumnSpec {
            kind: ColumnKind::Signed,
            title: "Signed",
            sort_field: schema::SIGNED.to_string(),
        },
        ColumnSpec {
            kind: ColumnKind::Recommendation,
            title: "Reco",
            sort_field: schema::RECOMMENDATION.to_string(),
        },
        ColumnSpec {
            kind: ColumnKind::Rationale,
            title: "Why",
            sort_field: schema.rationale_field.clone(),
        },
        ColumnSpec {
            kind: ColumnKind::RightsGrant,
            title: "Grant",
            sort_field: schema::RIGHTS_GRANT.to_string(),
        },
        ColumnSpec {
            kind: ColumnKind::GoverningLaw,
            title: "Governing Law",
            sort_field: schema.governing_law_field.clone(),
        },
        ColumnSpec {
            kind: ColumnKind::Term,
            title: "Term",
            sort_field: schema.term_field.clone(),
        },
        ColumnSpec {
            kind: ColumnKind::Amendments,
            title: "Amendments",
            sort_field: schema.amendments_field.clone(),
        },
    ]
}

pub struct ContractTable<'a> {
    model: &'a TableModel,
    schema: &'a ContractSchema,
    columns: &'a [ColumnSpec],
    selected_column: usize,
    date_format: &'a str,
    truncate_field: usize,
    truncate_summary: usize,
    theme: &'a Theme,
}

impl<'a> ContractTable<'a> {
    pub fn new(
        model: &'a TableModel,
        schema: &'a ContractSchema,
        columns: &'a [ColumnSpec],
        theme: &'a Theme,
    ) -> Self {
        Self {
            model,
            schema,
            columns,
            selected_column: 0,
            date_format: crate::record::DATE_DISPLAY_FORMAT,
            truncate_field: 30,
            truncate_summary: 100,
            theme,
        }
    }

    pub fn with_selected_column(mut self, selected_column: usize) -> Self {
        self.selected_column = selected_column;
        self
    }

    pub fn with_date_format(mut self, date_format: &'a str) -> Self {
        self.date_format = date_format;
        self
    }

    pub fn with_truncation(mut self, field: usize, summary: usize) -> Self {
        self.truncate_field = field;
        self.truncate_summary = summary;
        self
    }

    fn signed_color(&self, status: SignedStatus) -> Color {
        match status {
            SignedStatus::Signed => self.theme.get("success"),
            SignedStatus::Unsigned => self.theme.get("error"),
            SignedStatus::Ambiguous => self.theme.get("warning"),
        }
    }

    fn recommendation_color(&self, recommendation: Recommendation) -> Color {
        match recommendation {
            Recommendation::Yes => self.theme.get("success"),
            Recommendation::No => self.theme.get("error"),
            Recommendation::Ambiguous => self.theme.get("warning"),
        }
    }

    fn header_cell(&self, index: usize, column: &ColumnSpec) -> Cell<'static> {
        let mut title = column.title.to_string();
        if self.model.sort_key() == Some(column.sort_field.as_str()) {
            title.push(' ');
            title.push_str(self.model.sort_direction().arrow());
        }
        let mut style = Style::default()
            .fg(self.theme.get("table_header"))
            .bg(self.theme.get("table_header_bg"));
        if index == self.selected_column {
            style = style
                .fg(self.theme.get("selection"))
                .add_modifier(Modifier::BOLD);
        }
        Cell::from(title).style(style)
    }

    fn cell(&self, contract: &Contract, column: &ColumnSpec) -> Cell<'static> {
        let dimmed = self.theme.get("dimmed");
        match column.kind {
            ColumnKind::Isbn => Cell::from(contract.isbn.clone()),
            ColumnKind::Signatory => {
                let name = contract.raw_text(&self.schema.signatory_name_field).to_string();
                let location = contract
                    .raw_text(&self.schema.signatory_location_field)
                    .to_string();
                let mut lines = vec![Line::from(name)];
                if !location.is_empty() {
                    lines.push(Line::from(Span::styled(
                        location,
                        Style::default().fg(dimmed),
                    )));
                }
                Cell::from(Text::from(lines))
            }
            ColumnKind::Date => Cell::from(
                Line::from(
                    contract
                        .value(&self.schema.agreement_date_field)
                        .display(self.date_format),
                )
                .alignment(Alignment::Right),
            ),
            ColumnKind::Signed => Cell::from(
                Line::from(Span::styled(
                    contract.signed.glyph(),
                    Style::default().fg(self.signed_color(contract.signed)),
                ))
                .alignment(Alignment::Center),
            ),
            ColumnKind::Recommendation => Cell::from(
                Line::from(Span::styled(
                    contract.recommendation.glyph(),
                    Style::default().fg(self.recommendation_color(contract.recommendation)),
                ))
                .alignment(Alignment::Center),
            ),
            ColumnKind::Rationale => Cell::from(
                contract
                    .value(&self.schema.rationale_field)
                    .display(self.date_format),
            ),
            ColumnKind::RightsGrant => {
                let lines: Vec<Line> = contract
                    .rights_grant
                    .lines()
                    .map(|l| Line::from(l.to_string()))
                    .collect();
                Cell::from(Text::from(lines))
            }
            ColumnKind::GoverningLaw => Cell::from(shorten(
                &contract
                    .value(&self.schema.governing_law_field)
                    .display(self.date_format),
                self.truncate_field,
            )),
            ColumnKind::Term => Cell::from(shorten(
                &contract.value(&self.schema.term_field).display(self.date_format),
                self.truncate_field,
            )),
            ColumnKind::Amendments => {
                let flag = contract
                    .value(&self.schema.amendments_field)
                    .display(self.date_format);
                let summary = self
                    .schema
                    .amendment_summary_field
                    .as_deref()
                    .map(|f| contract.raw_text(f))
                    .unwrap_or("");
                let text = if summary.is_empty() {
                    flag
                } else {
                    format!("{} {}", flag, shorten(summary, self.truncate_summary))
                };
                Cell::from(text)
            }
        }
    }

    fn row(&self, contract: &Contract) -> Row<'static> {
        let mut height = 1;
        if !contract
            .raw_text(&self.schema.signatory_location_field)
            .is_empty()
        {
            height = 2;
        }
        height = height.max(contract.rights_grant.lines().count().min(3) as u16);

        Row::new(
            self.columns
                .iter()
                .map(|column| self.cell(contract, column))
                .collect::<Vec<_>>(),
        )
        .height(height)
    }

    fn widths(&self) -> Vec<Constraint> {
        self.columns
            .iter()
            .map(|column| match column.kind {
                ColumnKind::Isbn => Constraint::Length(14),
                ColumnKind::Signatory => Constraint::Min(16),
                ColumnKind::Date => Constraint::Length(12),
                ColumnKind::Signed => Constraint::Length(6),
                ColumnKind::Recommendation => Constraint::Length(4),
                ColumnKind::Rationale => Constraint::Min(14),
                ColumnKind::RightsGrant => Constraint::Min(14),
                ColumnKind::GoverningLaw => Constraint::Min(12),
                ColumnKind::Term => Constraint::Min(10),
                ColumnKind::Amendments => Constraint::Min(14),
            })
            .collect()
    }
}

impl StatefulWidget for ContractTable<'_> {
    type State = TableState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let header = Row::new(
            self.columns
                .iter()
                .enumerate()
                .map(|(i, column)| self.header_cell(i, column))
                .collect::<Vec<_>>(),
        )
        .style(Style::default().bg(self.theme.get("table_header_bg")));

        let rows: Vec<Row> = self
            .model
            .filtered()
            .iter()
            .filter_map(|&id| self.model.rows().get(id))
            .map(|contract| self.row(contract))
            .collect();

        let table = Table::new(rows, self.widths())
            .header(header)
            .block(Block::default().borders(Borders::NONE))
            .column_spacing(1)
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        StatefulWidget::render(table, area, buf, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_respects_budget() {
        assert_eq!(shorten("short", 30), "short");
        let long = "a".repeat(35);
        let shortened = shorten(&long, 30);
        assert_eq!(shortened.len(), 33);
        assert!(shortened.ends_with("..."));
    }

    #[test]
    fn test_shorten_counts_chars_not_bytes() {
        let text = "é".repeat(10);
        assert_eq!(shorten(&text, 10), text);
        assert_eq!(shorten(&text, 5), format!("{}...", "é".repeat(5)));
    }

    #[test]
    fn test_columns_fixed_order() {
        let schema = ContractSchema::classic();
        let cols = columns(&schema);
        assert_eq!(cols.len(), 10);
        assert_eq!(cols[0].title, "ISBN");
        assert_eq!(cols[2].sort_field, "Agreement Date");
        assert_eq!(cols[9].title, "Amendments");
    }

    #[test]
    fn test_assisted_columns_point_at_merged_fields() {
        let schema = ContractSchema::assisted();
        let cols = columns(&schema);
        let law = cols
            .iter()
            .find(|c| c.kind == ColumnKind::GoverningLaw)
            .unwrap();
        assert_eq!(law.sort_field, "Governing Law");
    }
}
