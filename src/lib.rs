use std::path::PathBuf;
use std::sync::mpsc::Sender;

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, TableState, Widget, Wrap};

pub mod config;
pub mod detail;
pub mod record;
pub mod schema;
pub mod search;
pub mod source;
pub mod table;
pub mod widgets;

pub use config::{parse_color, AppConfig, ConfigManager, Theme};
pub use contratui_cli::{Args, SchemaChoice};

use detail::DetailNavigator;
use schema::ContractSchema;
use search::SearchIndex;
use source::{Dataset, LoadOptions};
use table::TableModel;
use widgets::contract_table::{columns, ColumnSpec, ContractTable};
use widgets::controls::Controls;
use widgets::debug::DebugState;
use widgets::detail_panel::{popup_area, DetailPanel};

/// Application name used for the config directory and other app-specific paths
pub const APP_NAME: &str = "contratui";

pub enum AppEvent {
    Key(KeyEvent),
    Open(PathBuf),
    DoLoad(PathBuf), // Internal event to actually perform loading after UI update
    Search(String),
    SortBy(String),
    Reset,
    Resize(u16, u16), // resized (width, height)
    Exit,
    Crash(String),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
    OpenPath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackLevel {
    Success,
    Danger,
}

/// The upload-boundary notification banner. Replaced by the next upload,
/// dismissed with Esc; never fatal to the session.
#[derive(Default)]
pub struct Feedback {
    message: Option<(FeedbackLevel, String)>,
}

impl Feedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.message = Some((FeedbackLevel::Success, message.into()));
    }

    pub fn danger(&mut self, message: impl Into<String>) {
        self.message = Some((FeedbackLevel::Danger, message.into()));
    }

    pub fn dismiss(&mut self) {
        self.message = None;
    }

    pub fn is_visible(&self) -> bool {
        self.message.is_some()
    }

    pub fn message(&self) -> Option<(FeedbackLevel, &str)> {
        self.message
            .as_ref()
            .map(|(level, msg)| (*level, msg.as_str()))
    }
}

#[derive(Clone, Debug, Default)]
pub enum LoadingState {
    #[default]
    Idle,
    Loading {
        file_path: PathBuf,
    },
}

impl LoadingState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading { .. })
    }
}

pub struct App {
    pub table: TableModel,
    pub detail: DetailNavigator,
    pub table_state: TableState,
    pub input_mode: InputMode,
    pub feedback: Feedback,
    schema: Option<ContractSchema>,
    columns: Vec<ColumnSpec>,
    variants: Vec<ContractSchema>,
    search_index: SearchIndex,
    search_term: String,
    path: Option<PathBuf>,
    events: Sender<AppEvent>,
    input: String,
    input_cursor: usize, // Cursor position in input string, in chars
    selected_column: usize,
    detail_scroll: u16,
    show_help: bool,
    debug: DebugState,
    loading_state: LoadingState,
    theme: Theme,
    config: AppConfig,
    schema_override: Option<String>,
    delimiter: Option<u8>,
}

impl App {
    pub fn new(events: Sender<AppEvent>) -> App {
        let theme = Theme::from_config(&AppConfig::default().theme).unwrap_or_else(|e| {
            eprintln!(
                "Warning: Failed to create default theme: {}. Using fallback.",
                e
            );
            Theme::default()
        });
        Self::new_with_config(events, theme, AppConfig::default())
    }

    pub fn new_with_config(events: Sender<AppEvent>, theme: Theme, config: AppConfig) -> App {
        let variants = config.schema.variants();
        App {
            table: TableModel::new(),
            detail: DetailNavigator::new(),
            table_state: TableState::default(),
            input_mode: InputMode::Normal,
            feedback: Feedback::new(),
            schema: None,
            columns: Vec::new(),
            variants,
            search_index: SearchIndex::default(),
            search_term: String::new(),
            path: None,
            events,
            input: String::new(),
            input_cursor: 0,
            selected_column: 0,
            detail_scroll: 0,
            show_help: false,
            debug: DebugState::default(),
            loading_state: LoadingState::Idle,
            theme,
            config,
            schema_override: None,
            delimiter: None,
        }
    }

    pub fn send_event(&mut self, event: AppEvent) -> Result<()> {
        self.events.send(event)?;
        Ok(())
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    /// Pin the schema variant from the CLI, overriding the config file.
    pub fn set_schema_override(&mut self, choice: Option<SchemaChoice>) {
        self.schema_override = match choice {
            None | Some(SchemaChoice::Auto) => None,
            Some(choice) => Some(choice.as_str().to_string()),
        };
    }

    pub fn set_delimiter(&mut self, delimiter: Option<u8>) {
        self.delimiter = delimiter;
    }

    pub fn schema(&self) -> Option<&ContractSchema> {
        self.schema.as_ref()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    fn load_options(&self) -> LoadOptions {
        let mut options = LoadOptions::new();
        if let Some(delimiter) = self.delimiter {
            options = options.with_delimiter(delimiter);
        }
        let pinned = self
            .schema_override
            .as_deref()
            .or_else(|| self.config.schema.pinned());
        if let Some(name) = pinned {
            options = options.with_variant(name);
        }
        options
    }

    /// Swap in a freshly loaded dataset; all view state resets.
    fn install_dataset(&mut self, dataset: Dataset) {
        self.search_index = SearchIndex::build(
            &dataset.contracts,
            &dataset.schema,
            self.config.search.threshold,
        );
        self.columns = columns(&dataset.schema);
        self.table.set_rows(dataset.contracts);
        self.schema = Some(dataset.schema);
        self.search_term.clear();
        self.detail.close();
        self.detail_scroll = 0;
        self.selected_column = 0;
        self.table_state = TableState::default();
        if !self.table.is_empty() {
            self.table_state.select(Some(0));
        }
    }

    /// Re-clamp everything that points into the filtered view.
    fn sync_view_state(&mut self) {
        self.detail.sync(self.table.len());
        match self.table_state.selected() {
            _ if self.table.is_empty() => self.table_state.select(None),
            Some(i) if i >= self.table.len() => {
                self.table_state.select(Some(self.table.len() - 1))
            }
            None => self.table_state.select(Some(0)),
            _ => {}
        }
    }

    fn select_offset(&mut self, delta: isize) {
        if self.table.is_empty() {
            return;
        }
        let last = self.table.len() - 1;
        let current = self.table_state.selected().unwrap_or(0) as isize;
        let target = (current + delta).clamp(0, last as isize) as usize;
        self.table_state.select(Some(target));
    }

    fn input_byte_cursor(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.input_cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn input_insert(&mut self, c: char) {
        let at = self.input_byte_cursor();
        self.input.insert(at, c);
        self.input_cursor += 1;
    }

    fn input_backspace(&mut self) -> bool {
        if self.input_cursor == 0 {
            return false;
        }
        self.input_cursor -= 1;
        let at = self.input_byte_cursor();
        self.input.remove(at);
        true
    }

    fn key_detail(&mut self, event: &KeyEvent) {
        match event.code {
            KeyCode::Esc => {
                self.debug.last_action = "detail_close".to_string();
                self.detail.close();
                self.detail_scroll = 0;
            }
            KeyCode::Left | KeyCode::Up => {
                if self.detail.navigate(-1, self.table.len()) {
                    self.debug.last_action = "detail_prev".to_string();
                    self.detail_scroll = 0;
                    self.table_state.select(self.detail.index());
                }
            }
            KeyCode::Right | KeyCode::Down => {
                if self.detail.navigate(1, self.table.len()) {
                    self.debug.last_action = "detail_next".to_string();
                    self.detail_scroll = 0;
                    self.table_state.select(self.detail.index());
                }
            }
            KeyCode::PageUp => {
                self.detail_scroll = self.detail_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                self.detail_scroll = self.detail_scroll.saturating_add(5);
            }
            _ => {}
        }
    }

    fn key_search_input(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        match event.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.input.clear();
                self.input_cursor = 0;
                return Some(AppEvent::Search(String::new()));
            }
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Char(c) => {
                self.input_insert(c);
                return Some(AppEvent::Search(self.input.clone()));
            }
            KeyCode::Backspace => {
                if self.input_backspace() {
                    return Some(AppEvent::Search(self.input.clone()));
                }
            }
            KeyCode::Left => self.input_cursor = self.input_cursor.saturating_sub(1),
            KeyCode::Right => {
                self.input_cursor = (self.input_cursor + 1).min(self.input.chars().count())
            }
            KeyCode::Home => self.input_cursor = 0,
            KeyCode::End => self.input_cursor = self.input.chars().count(),
            _ => {}
        }
        None
    }

    fn key_open_input(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        match event.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.input.clear();
                self.input_cursor = 0;
            }
            KeyCode::Enter => {
                let path = self.input.trim().to_string();
                if !path.is_empty() {
                    self.input_mode = InputMode::Normal;
                    self.input.clear();
                    self.input_cursor = 0;
                    return Some(AppEvent::Open(PathBuf::from(path)));
                }
            }
            KeyCode::Char(c) => self.input_insert(c),
            KeyCode::Backspace => {
                self.input_backspace();
            }
            KeyCode::Left => self.input_cursor = self.input_cursor.saturating_sub(1),
            KeyCode::Right => {
                self.input_cursor = (self.input_cursor + 1).min(self.input.chars().count())
            }
            KeyCode::Home => self.input_cursor = 0,
            KeyCode::End => self.input_cursor = self.input.chars().count(),
            _ => {}
        }
        None
    }

    fn key_normal(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        match event.code {
            KeyCode::Char('q') => return Some(AppEvent::Exit),
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Search;
                self.input = self.search_term.clone();
                self.input_cursor = self.input.chars().count();
            }
            KeyCode::Char('o') => {
                self.input_mode = InputMode::OpenPath;
                self.input.clear();
                self.input_cursor = 0;
            }
            KeyCode::Char('s') => {
                if let Some(column) = self.columns.get(self.selected_column) {
                    self.debug.last_action = "sort_by".to_string();
                    return Some(AppEvent::SortBy(column.sort_field.clone()));
                }
            }
            KeyCode::Char('R') => return Some(AppEvent::Reset),
            KeyCode::Enter => {
                if let Some(view_index) = self.table_state.selected() {
                    if let Some(row_id) = self.table.id_at(view_index) {
                        if self.detail.open_at(row_id, self.table.filtered()) {
                            self.debug.last_action = "detail_open".to_string();
                            self.detail_scroll = 0;
                        }
                    }
                }
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.selected_column = self.selected_column.saturating_sub(1);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if !self.columns.is_empty() {
                    self.selected_column = (self.selected_column + 1).min(self.columns.len() - 1);
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.select_offset(-1),
            KeyCode::Down | KeyCode::Char('j') => self.select_offset(1),
            KeyCode::PageUp => self.select_offset(-10),
            KeyCode::PageDown => self.select_offset(10),
            KeyCode::Home | KeyCode::Char('g') => {
                if !self.table.is_empty() {
                    self.table_state.select(Some(0));
                }
            }
            KeyCode::End | KeyCode::Char('G') => {
                if !self.table.is_empty() {
                    self.table_state.select(Some(self.table.len() - 1));
                }
            }
            _ => {}
        }
        None
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        self.debug.on_key(event);

        if self.show_help {
            if matches!(event.code, KeyCode::Esc | KeyCode::Char('q'))
                || (event.code == KeyCode::Char('h')
                    && event.modifiers.contains(KeyModifiers::CONTROL))
            {
                self.show_help = false;
            }
            return None;
        }

        if event.code == KeyCode::Char('h') && event.modifiers.contains(KeyModifiers::CONTROL) {
            self.show_help = true;
            return None;
        }

        if self.feedback.is_visible() && event.code == KeyCode::Esc {
            self.feedback.dismiss();
            return None;
        }

        // Navigation keys drive the detail panel while it is open, and are
        // ignored by it entirely while it is closed.
        if self.detail.is_open() {
            self.key_detail(event);
            return None;
        }

        match self.input_mode {
            InputMode::Search => self.key_search_input(event),
            InputMode::OpenPath => self.key_open_input(event),
            InputMode::Normal => self.key_normal(event),
        }
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Open(path) => {
                // Show the loading state first, then actually load on the
                // follow-up event so a render happens in between.
                self.loading_state = LoadingState::Loading {
                    file_path: path.clone(),
                };
                Some(AppEvent::DoLoad(path.clone()))
            }
            AppEvent::DoLoad(path) => {
                let options = self.load_options();
                match source::load(path, &self.variants, &options) {
                    Ok(dataset) => {
                        self.install_dataset(dataset);
                        self.path = Some(path.clone());
                        self.feedback
                            .success("File uploaded and processed successfully!");
                    }
                    Err(e) => {
                        // The previous table, if any, stays interactive.
                        self.feedback.danger(e.to_string());
                    }
                }
                self.loading_state = LoadingState::Idle;
                None
            }
            AppEvent::Search(term) => {
                self.search_term = term.clone();
                self.table.search(term, &self.search_index);
                self.sync_view_state();
                None
            }
            AppEvent::SortBy(field) => {
                self.table.sort_by(field);
                self.sync_view_state();
                None
            }
            AppEvent::Reset => {
                self.search_term.clear();
                self.input.clear();
                self.input_cursor = 0;
                self.table.search("", &self.search_index);
                self.sync_view_state();
                None
            }
            AppEvent::Resize(_cols, _rows) => None,
            _ => None,
        }
    }

    fn render_input_strip(&self, area: Rect, buf: &mut Buffer) {
        let title = match self.input_mode {
            InputMode::Search => "Search",
            InputMode::OpenPath => "Open file",
            InputMode::Normal => "Input",
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.get("sidebar_border")))
            .title(title);
        let inner = block.inner(area);
        block.render(area, buf);

        // Show the cursor by reversing the character under it.
        let chars: Vec<char> = self.input.chars().collect();
        let before: String = chars[..self.input_cursor.min(chars.len())].iter().collect();
        let at: String = chars
            .get(self.input_cursor)
            .map(|c| c.to_string())
            .unwrap_or_else(|| " ".to_string());
        let after: String = if self.input_cursor < chars.len() {
            chars[self.input_cursor + 1..].iter().collect()
        } else {
            String::new()
        };
        let line = Line::from(vec![
            Span::raw(before),
            Span::styled(at, Style::default().add_modifier(Modifier::REVERSED)),
            Span::raw(after),
        ]);
        Paragraph::new(line).render(inner, buf);
    }

    fn render_feedback(&self, area: Rect, buf: &mut Buffer) {
        if let Some((level, message)) = self.feedback.message() {
            let (bg, label) = match level {
                FeedbackLevel::Success => (self.theme.get("success"), "OK"),
                FeedbackLevel::Danger => (self.theme.get("error"), "Error"),
            };
            Paragraph::new(format!(" {label}: {message}  (Esc to dismiss)"))
                .style(
                    Style::default()
                        .bg(bg)
                        .fg(self.theme.get("background"))
                        .add_modifier(Modifier::BOLD),
                )
                .render(area, buf);
        }
    }

    fn render_help(&self, area: Rect, buf: &mut Buffer) {
        let help_area = popup_area(area, 50, 70);
        Clear.render(help_area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.get("sidebar_border")))
            .title("Help");
        let inner = block.inner(help_area);
        block.render(help_area, buf);

        let bindings: [(&str, &str); 13] = [
            ("/", "search (live, fuzzy)"),
            ("Esc (in search)", "clear search"),
            ("←/→", "select column"),
            ("s", "sort by selected column; again to reverse"),
            ("↑/↓", "select row"),
            ("Enter", "open contract details"),
            ("←/↑ / →/↓ (details)", "previous / next contract"),
            ("PgUp/PgDn (details)", "scroll the panel"),
            ("Esc (details)", "close the panel"),
            ("o", "open another export"),
            ("R", "reset view"),
            ("Ctrl+H", "this help"),
            ("q", "quit"),
        ];
        let key_style = Style::default()
            .fg(self.theme.get("keybind_hints"))
            .add_modifier(Modifier::BOLD);
        let lines: Vec<Line> = bindings
            .iter()
            .map(|(key, action)| {
                Line::from(vec![
                    Span::styled(format!(" {key:<22}"), key_style),
                    Span::raw(action.to_string()),
                ])
            })
            .collect();
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;

        Block::default()
            .style(Style::default().bg(self.theme.get("background")))
            .render(area, buf);

        let mut constraints = vec![Constraint::Fill(1)];
        if self.input_mode != InputMode::Normal {
            constraints.push(Constraint::Length(3));
        }
        if self.feedback.is_visible() {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Length(1)); // Controls
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let main_area = layout[0];
        let mut next = 1;

        match &self.schema {
            Some(schema) => {
                let widget = ContractTable::new(&self.table, schema, &self.columns, &self.theme)
                    .with_selected_column(self.selected_column)
                    .with_date_format(&self.config.display.date_format)
                    .with_truncation(
                        self.config.display.truncate_field,
                        self.config.display.truncate_summary,
                    );
                let mut table_state = std::mem::take(&mut self.table_state);
                ratatui::widgets::StatefulWidget::render(widget, main_area, buf, &mut table_state);
                self.table_state = table_state;

                if let Some(index) = self.detail.index() {
                    if let Some(contract) = self.table.row_at(index) {
                        DetailPanel::new(contract, schema, index, self.table.len(), &self.theme)
                            .with_scroll(self.detail_scroll)
                            .with_date_format(&self.config.display.date_format)
                            .render(main_area, buf);
                    }
                }
            }
            None => {
                let message = match &self.loading_state {
                    LoadingState::Loading { file_path } => {
                        format!("Loading {} ...", file_path.display())
                    }
                    LoadingState::Idle => {
                        "No data loaded. Press o to open a contract export.".to_string()
                    }
                };
                Paragraph::new(message)
                    .style(Style::default().fg(self.theme.get("dimmed")))
                    .centered()
                    .render(main_area, buf);
            }
        }

        if self.input_mode != InputMode::Normal {
            self.render_input_strip(layout[next], buf);
            next += 1;
        }
        if self.feedback.is_visible() {
            self.render_feedback(layout[next], buf);
            next += 1;
        }

        let controls = Controls {
            row_count: self.schema.as_ref().map(|_| self.table.len()),
            dimmed: self.detail.is_open() || self.show_help,
            search_active: !self.search_term.is_empty(),
        };
        (&controls).render(layout[next], buf);
        next += 1;

        if self.debug.enabled {
            (&self.debug).render(layout[next], buf);
        }

        if self.show_help {
            self.render_help(main_area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn test_app_starts_empty_in_normal_mode() {
        let (tx, _rx) = channel();
        let app = App::new(tx);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.schema().is_none());
        assert!(app.table.is_empty());
        assert!(!app.detail.is_open());
    }

    #[test]
    fn test_feedback_lifecycle() {
        let mut feedback = Feedback::new();
        assert!(!feedback.is_visible());
        feedback.success("File uploaded and processed successfully!");
        assert_eq!(
            feedback.message(),
            Some((
                FeedbackLevel::Success,
                "File uploaded and processed successfully!"
            ))
        );
        feedback.danger("Please upload a CSV file.");
        assert_eq!(
            feedback.message(),
            Some((FeedbackLevel::Danger, "Please upload a CSV file."))
        );
        feedback.dismiss();
        assert!(!feedback.is_visible());
    }

    #[test]
    fn test_open_event_returns_do_load_and_sets_loading() {
        let (tx, _rx) = channel();
        let mut app = App::new(tx);
        let next = app.event(&AppEvent::Open(PathBuf::from("contracts.csv")));
        assert!(matches!(next, Some(AppEvent::DoLoad(_))));
        assert!(app.loading_state.is_loading());
    }

    #[test]
    fn test_failed_load_keeps_previous_state_and_sets_feedback() {
        let (tx, _rx) = channel();
        let mut app = App::new(tx);
        let next = app.event(&AppEvent::DoLoad(PathBuf::from("missing.txt")));
        assert!(next.is_none());
        assert!(app.schema().is_none());
        assert_eq!(
            app.feedback.message(),
            Some((FeedbackLevel::Danger, "Please upload a CSV file."))
        );
    }

    #[test]
    fn test_schema_override_resolution() {
        let (tx, _rx) = channel();
        let mut app = App::new(tx);
        app.set_schema_override(Some(SchemaChoice::Assisted));
        assert_eq!(app.load_options().variant.as_deref(), Some("assisted"));
        app.set_schema_override(Some(SchemaChoice::Auto));
        assert_eq!(app.load_options().variant, None);
        app.set_schema_override(None);
        assert_eq!(app.load_options().variant, None);
    }

    #[test]
    fn test_input_editing_is_char_aware() {
        let (tx, _rx) = channel();
        let mut app = App::new(tx);
        app.input_mode = InputMode::Search;
        for c in "séarch".chars() {
            app.key_search_input(&KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        assert_eq!(app.input, "séarch");
        app.key_search_input(&KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(app.input, "séarc");
        app.key_search_input(&KeyEvent::new(KeyCode::Home, KeyModifiers::NONE));
        app.key_search_input(&KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(app.input, "séarc");
    }
}
