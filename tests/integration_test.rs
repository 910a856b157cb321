use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use contratui::detail::DetailState;
use contratui::{App, AppEvent, FeedbackLevel, InputMode};
use std::sync::mpsc;

mod common;

/// Feed an event through the app, chasing follow-up events the way the main
/// loop does.
fn drive(app: &mut App, event: AppEvent) {
    let mut next = app.event(&event);
    while let Some(event) = next {
        next = app.event(&event);
    }
}

fn key(app: &mut App, code: KeyCode) {
    drive(app, AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        key(app, KeyCode::Char(c));
    }
}

fn loaded_app() -> (App, mpsc::Receiver<AppEvent>) {
    let (tx, rx) = mpsc::channel();
    let mut app = App::new(tx);

    let dir = tempfile::tempdir().unwrap();
    let rows = vec![
        common::classic_row("B9780470059376", "Ada Lovelace", "03/01/2021", "Yes", "Fully signed"),
        common::classic_row("9781119183617", "Grace Hopper", "01/15/2020", "No", "Not signed"),
        common::classic_row("9780262033848", "Alan Turing", "06/30/2019", "Yes", "Partially signed"),
        common::classic_row("9780131103627", "Dennis Ritchie", "02/02/2022", "", "Fully signed"),
    ];
    let path = common::write_classic_csv(dir.path(), "contracts.csv", &rows);
    drive(&mut app, AppEvent::Open(path));
    (app, rx)
}

fn visible_isbns(app: &App) -> Vec<String> {
    (0..app.table.len())
        .filter_map(|i| app.table.row_at(i))
        .map(|c| c.isbn.clone())
        .collect()
}

#[test]
fn test_app_creation() {
    let (tx, _rx) = mpsc::channel();
    let app = App::new(tx);
    assert_eq!(app.input_mode, InputMode::Normal);
}

#[test]
fn test_full_workflow() {
    let (mut app, _rx) = loaded_app();

    // 1. Upload: the row without a recommendation is excluded.
    assert_eq!(
        app.feedback.message(),
        Some((
            FeedbackLevel::Success,
            "File uploaded and processed successfully!"
        ))
    );
    assert_eq!(app.table.len(), 3);
    assert_eq!(app.schema().unwrap().name, "classic");
    assert_eq!(app.table_state.selected(), Some(0));

    // 2. Search narrows the view on every keystroke.
    key(&mut app, KeyCode::Char('/'));
    assert_eq!(app.input_mode, InputMode::Search);
    type_text(&mut app, "hopper");
    assert_eq!(visible_isbns(&app), vec!["9781119183617"]);
    key(&mut app, KeyCode::Enter);
    assert_eq!(app.input_mode, InputMode::Normal);
    assert_eq!(app.search_term(), "hopper");

    // 3. Clearing the search restores the original order.
    key(&mut app, KeyCode::Char('/'));
    key(&mut app, KeyCode::Esc);
    assert_eq!(
        visible_isbns(&app),
        vec!["9780470059376", "9781119183617", "9780262033848"]
    );

    // 4. Sorting by the first column (ISBN), then reversing it.
    key(&mut app, KeyCode::Char('s'));
    assert_eq!(
        visible_isbns(&app),
        vec!["9780262033848", "9780470059376", "9781119183617"]
    );
    key(&mut app, KeyCode::Char('s'));
    assert_eq!(
        visible_isbns(&app),
        vec!["9781119183617", "9780470059376", "9780262033848"]
    );

    // 5. Reset restores upload order and clears the sort.
    key(&mut app, KeyCode::Char('R'));
    assert_eq!(
        visible_isbns(&app),
        vec!["9780470059376", "9781119183617", "9780262033848"]
    );
    assert_eq!(app.table.sort_key(), None);
}

#[test]
fn test_detail_navigation_follows_filtered_view() {
    let (mut app, _rx) = loaded_app();

    // Open details on the second row.
    key(&mut app, KeyCode::Down);
    key(&mut app, KeyCode::Enter);
    assert_eq!(app.detail.state(), DetailState::Open(1));

    // Arrow keys move through the filtered view; boundaries are no-ops.
    key(&mut app, KeyCode::Right);
    assert_eq!(app.detail.state(), DetailState::Open(2));
    key(&mut app, KeyCode::Right);
    assert_eq!(app.detail.state(), DetailState::Open(2));
    key(&mut app, KeyCode::Left);
    key(&mut app, KeyCode::Left);
    assert_eq!(app.detail.state(), DetailState::Open(0));
    key(&mut app, KeyCode::Left);
    assert_eq!(app.detail.state(), DetailState::Open(0));

    // Esc closes; navigation keys are then ignored by the panel.
    key(&mut app, KeyCode::Esc);
    assert_eq!(app.detail.state(), DetailState::Closed);
    key(&mut app, KeyCode::Left);
    assert_eq!(app.detail.state(), DetailState::Closed);
}

#[test]
fn test_search_while_detail_open_reclamps_index() {
    let (mut app, _rx) = loaded_app();

    // Open the last row's details, then shrink the view to one row.
    key(&mut app, KeyCode::End);
    key(&mut app, KeyCode::Enter);
    assert_eq!(app.detail.state(), DetailState::Open(2));

    drive(&mut app, AppEvent::Search("hopper".to_string()));
    assert_eq!(app.detail.state(), DetailState::Open(0));

    // An empty view closes the panel instead of leaving a stale index.
    drive(&mut app, AppEvent::Search("zzzzqqqq".to_string()));
    assert_eq!(app.detail.state(), DetailState::Closed);
}

#[test]
fn test_failed_upload_keeps_previous_table() {
    let (mut app, _rx) = loaded_app();
    assert_eq!(app.table.len(), 3);

    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("contracts.txt");
    std::fs::write(&bogus, "not,a,contract\n").unwrap();
    drive(&mut app, AppEvent::Open(bogus));

    assert_eq!(
        app.feedback.message(),
        Some((FeedbackLevel::Danger, "Please upload a CSV file."))
    );
    // The previous upload stays loaded and interactive.
    assert_eq!(app.table.len(), 3);
    key(&mut app, KeyCode::Char('s'));
    assert_eq!(app.table.sort_key(), Some("ISBN"));
}

#[test]
fn test_second_upload_resets_view_state() {
    let (mut app, _rx) = loaded_app();

    // Leave the first dataset sorted, filtered, and with details open.
    drive(&mut app, AppEvent::Search("lovelace".to_string()));
    key(&mut app, KeyCode::Enter);
    assert!(app.detail.is_open());

    let dir = tempfile::tempdir().unwrap();
    let rows = vec![common::classic_row(
        "9780596517748",
        "Barbara Liskov",
        "04/04/2021",
        "Yes",
        "Fully signed",
    )];
    let path = common::write_classic_csv(dir.path(), "replacement.csv", &rows);
    drive(&mut app, AppEvent::Open(path));

    // Last completed upload wins; view state is back to the upload state.
    assert_eq!(app.table.len(), 1);
    assert_eq!(app.search_term(), "");
    assert_eq!(app.table.sort_key(), None);
    assert!(!app.detail.is_open());
    assert_eq!(app.table_state.selected(), Some(0));
}

#[test]
fn test_navigation_keys_ignored_while_detail_closed() {
    let (mut app, _rx) = loaded_app();
    // Down moves the row cursor, not a detail index.
    key(&mut app, KeyCode::Down);
    assert_eq!(app.detail.state(), DetailState::Closed);
    assert_eq!(app.table_state.selected(), Some(1));
}
