//! The contract detail overlay.
//!
//! Shows every field of the open record as label/value rows in source-column
//! order (paired AI/Rationale halves are hidden in favor of their merged
//! display fields). Values keep their line breaks, and embedded
//! `"Label: value"` segments render with the label emphasized.

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Widget, Wrap};

use crate::config::Theme;
use crate::record::Contract;
use crate::schema::ContractSchema;

/// Center a popup of the given percentage size within `area`.
pub fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

/// Split an embedded `"Label: value"` segment. Labels are short and plain
/// (letters, digits, spaces, slashes); anything else renders unemphasized.
fn split_label(line: &str) -> Option<(&str, &str)> {
    let pos = line.find(": ")?;
    if pos == 0 || pos > 32 {
        return None;
    }
    let label = &line[..pos];
    if label
        .chars()
        .all(|c| c.is_alphanumeric() || c == ' ' || c == '/')
    {
        Some((label, &line[pos + 2..]))
    } else {
        None
    }
}

pub struct DetailPanel<'a> {
    contract: &'a Contract,
    schema: &'a ContractSchema,
    /// Position within the filtered view (0-based) and the view's length.
    position: usize,
    total: usize,
    scroll: u16,
    date_format: &'a str,
    theme: &'a Theme,
}

impl<'a> DetailPanel<'a> {
    pub fn new(
        contract: &'a Contract,
        schema: &'a ContractSchema,
        position: usize,
        total: usize,
        theme: &'a Theme,
    ) -> Self {
        Self {
            contract,
            schema,
            position,
            total,
            scroll: 0,
            date_format: crate::record::DATE_DISPLAY_FORMAT,
            theme,
        }
    }

    pub fn with_scroll(mut self, scroll: u16) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn with_date_format(mut self, date_format: &'a str) -> Self {
        self.date_format = date_format;
        self
    }

    fn value_line(&self, line: &str) -> Line<'static> {
        match split_label(line) {
            Some((label, rest)) => Line::from(vec![
                Span::styled(
                    format!("{label}: "),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(rest.to_string()),
            ]),
            None => Line::from(line.to_string()),
        }
    }

    fn body(&self) -> Vec<Line<'static>> {
        let label_style = Style::default()
            .fg(self.theme.get("keybind_hints"))
            .add_modifier(Modifier::BOLD);
        let dimmed = Style::default().fg(self.theme.get("dimmed"));

        let mut lines = Vec::new();
        for (name, value) in self.contract.detail_rows(self.schema, self.date_format) {
            lines.push(Line::from(Span::styled(name, label_style)));
            if value.is_empty() {
                lines.push(Line::from(Span::styled("—", dimmed)));
            } else {
                for part in value.split('\n') {
                    if part.is_empty() {
                        lines.push(Line::default());
                    } else {
                        lines.push(self.value_line(part));
                    }
                }
            }
            lines.push(Line::default());
        }
        lines
    }
}

impl Widget for DetailPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = popup_area(area, 70, 80);
        Clear.render(area, buf);

        let title = format!(
            "Contract Details for {}",
            self.contract.raw_text(&self.schema.signatory_name_field)
        );
        let footer = format!(
            " {}/{} · ←/→ navigate · PgUp/PgDn scroll · Esc close ",
            self.position + 1,
            self.total
        );
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.get("sidebar_border")))
            .title(title)
            .title_bottom(Line::from(footer).right_aligned())
            .padding(Padding::horizontal(1));
        let inner = block.inner(area);
        block.render(area, buf);

        Paragraph::new(self.body())
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .render(inner, buf);
    }
}
