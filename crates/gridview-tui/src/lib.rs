// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use gridview_app::{
    AppCommand, AppMode, AppState, CellValue, Column, DetailView, Focus, LoadState, ReportIndex,
    ResultGrid, SortDirection, capitalize, describe,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const PASS_MARK: &str = "✓";
const FAIL_MARK: &str = "✗";
const SORT_ASC_MARK: &str = " ↑";
const SORT_DESC_MARK: &str = " ↓";
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);

pub trait ReportRuntime {
    /// Shown in the title bar.
    fn source_label(&self) -> String;
    fn load_report(&mut self) -> Result<ReportIndex>;
    /// Delivers exactly one `ReportLoaded` event. Runtimes that fetch over
    /// the network override this to do the work off the UI thread.
    fn spawn_report_load(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let outcome = self.load_report().map_err(|error| format!("{error:#}"));
        tx.send(InternalEvent::ReportLoaded(outcome))
            .map_err(|_| anyhow::anyhow!("report event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    ReportLoaded(Result<ReportIndex, String>),
}

#[derive(Debug, Clone, Default, PartialEq)]
struct ViewData {
    source: String,
    index: Option<ReportIndex>,
    grid: ResultGrid,
    sidebar_cursor: usize,
    selected_row: usize,
    selected_col: usize,
    detail: Option<DetailView>,
    detail_scroll: u16,
    help_visible: bool,
    status_token: u64,
}

impl ViewData {
    fn new(source: String, columns: Vec<Column>) -> Self {
        Self {
            source,
            grid: ResultGrid::new(columns),
            ..Self::default()
        }
    }

    fn visible_row_count(&self) -> usize {
        self.grid.filtered_and_sorted_rows().len()
    }

    fn selected_column(&self) -> Option<Column> {
        self.grid.columns().get(self.selected_col).copied()
    }

    fn sidebar_len(&self) -> usize {
        self.index.as_ref().map_or(0, ReportIndex::function_count)
    }

    fn clamp_selection(&mut self) {
        let rows = self.visible_row_count();
        self.selected_row = self.selected_row.min(rows.saturating_sub(1));
    }
}

pub fn run_app<R: ReportRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    columns: Vec<Column>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(runtime.source_label(), columns);
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = runtime.spawn_report_load(internal_tx.clone()) {
        let message = format!("{error:#}");
        warn!(error = %message, "report load did not start");
        state.dispatch(AppCommand::ReportFailed(message));
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::ReportLoaded(Ok(index)) => {
                apply_report(state, view_data, tx, index);
            }
            InternalEvent::ReportLoaded(Err(message)) => {
                warn!(error = %message, "report load failed");
                state.dispatch(AppCommand::ReportFailed(message));
            }
        }
    }
}

fn apply_report(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    index: ReportIndex,
) {
    let status = if index.is_empty() {
        "report has no tests".to_owned()
    } else {
        format!(
            "loaded {} tests, {} failed",
            index.row_count(),
            index.failed_row_count()
        )
    };

    if let Some(function) = index.initial_function().map(str::to_owned) {
        view_data.grid.activate(&index, &function);
        info!(function = %function, "initial function selected");
    }
    view_data.index = Some(index);
    view_data.sidebar_cursor = 0;
    view_data.selected_row = 0;
    view_data.selected_col = 0;

    state.dispatch(AppCommand::ReportLoaded);
    emit_status(state, view_data, tx, status);
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

/// Returns true when the app should exit.
fn handle_key_event(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('q') {
        return true;
    }

    if view_data.detail.is_some() {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                view_data.detail = None;
                view_data.detail_scroll = 0;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                view_data.detail_scroll = view_data.detail_scroll.saturating_add(1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                view_data.detail_scroll = view_data.detail_scroll.saturating_sub(1);
            }
            _ => {}
        }
        return false;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if state.mode == AppMode::Filter {
        handle_filter_key(state, view_data, key);
        return false;
    }

    if ctrl && key.code == KeyCode::Char('u') {
        view_data.grid.clear_filter();
        view_data.clamp_selection();
        emit_status(state, view_data, internal_tx, "filter cleared");
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => view_data.help_visible = true,
        KeyCode::Tab => {
            state.dispatch(AppCommand::ToggleFocus);
        }
        KeyCode::Char('/') => {
            state.dispatch(AppCommand::StartFilter);
        }
        _ => match state.focus {
            Focus::Sidebar => handle_sidebar_key(state, view_data, internal_tx, key),
            Focus::Grid => handle_grid_key(state, view_data, internal_tx, key),
        },
    }
    false
}

fn handle_filter_key(state: &mut AppState, view_data: &mut ViewData, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc | KeyCode::Enter => {
            state.dispatch(AppCommand::ExitToNav);
            return;
        }
        KeyCode::Backspace => {
            if !view_data.grid.pop_filter_char() {
                return;
            }
        }
        KeyCode::Char('u') if ctrl => view_data.grid.clear_filter(),
        KeyCode::Char(value) if !ctrl => view_data.grid.push_filter_char(value),
        _ => return,
    }
    view_data.selected_row = 0;
}

fn handle_sidebar_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let len = view_data.sidebar_len();
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.sidebar_cursor = step(view_data.sidebar_cursor, 1, len);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.sidebar_cursor = step(view_data.sidebar_cursor, -1, len);
        }
        KeyCode::Char('g') | KeyCode::Home => view_data.sidebar_cursor = 0,
        KeyCode::Char('G') | KeyCode::End => view_data.sidebar_cursor = len.saturating_sub(1),
        KeyCode::Enter => activate_selected_function(state, view_data, internal_tx),
        _ => {}
    }
}

fn activate_selected_function(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(index) = view_data.index.as_ref() else {
        return;
    };
    let Some(group) = index.groups().get(view_data.sidebar_cursor) else {
        return;
    };
    let name = group.summary.name.clone();
    let count = group.rows.len();
    if !view_data.grid.activate(index, &name) {
        return;
    }
    view_data.selected_row = 0;
    debug!(function = %name, tests = count, "function activated");
    emit_status(
        state,
        view_data,
        internal_tx,
        format!("{name}: {count} tests"),
    );
}

fn handle_grid_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let rows = view_data.visible_row_count();
    let columns = view_data.grid.columns().len();
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.selected_row = step(view_data.selected_row, 1, rows);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.selected_row = step(view_data.selected_row, -1, rows);
        }
        KeyCode::Char('g') | KeyCode::Home => view_data.selected_row = 0,
        KeyCode::Char('G') | KeyCode::End => view_data.selected_row = rows.saturating_sub(1),
        KeyCode::Char('h') | KeyCode::Left => {
            view_data.selected_col = step(view_data.selected_col, -1, columns);
        }
        KeyCode::Char('l') | KeyCode::Right => {
            view_data.selected_col = step(view_data.selected_col, 1, columns);
        }
        KeyCode::Char('s') => sort_selected_column(state, view_data, internal_tx),
        KeyCode::Enter => open_detail(view_data),
        _ => {}
    }
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current.saturating_add_signed(delta).min(len - 1)
}

fn sort_selected_column(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(column) = view_data.selected_column() else {
        return;
    };
    let Some(direction) = view_data.grid.sort_by(column) else {
        return;
    };
    view_data.selected_row = 0;
    debug!(column = column.as_str(), direction = direction.as_str(), "grid sorted");
    emit_status(
        state,
        view_data,
        internal_tx,
        format!("sort {} {}", column.as_str(), direction.as_str()),
    );
}

fn open_detail(view_data: &mut ViewData) {
    let Some(index) = view_data.index.as_ref() else {
        return;
    };
    let detail = {
        let rows = view_data.grid.filtered_and_sorted_rows();
        let Some(row) = rows.get(view_data.selected_row) else {
            return;
        };
        let Some(record) = index.test(&row.name) else {
            return;
        };
        describe(record)
    };
    view_data.detail = Some(detail);
    view_data.detail_scroll = 0;
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let title = Paragraph::new(title_text(view_data))
        .block(Block::default().title("gridview").borders(Borders::ALL));
    frame.render_widget(title, layout[0]);

    if state.load == LoadState::Ready {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
            .split(layout[1]);
        render_sidebar(frame, body[0], state, view_data);
        render_grid(frame, body[1], state, view_data);
    } else {
        let placeholder = Paragraph::new(load_state_text(&state.load))
            .wrap(Wrap { trim: true })
            .block(Block::default().title("report").borders(Borders::ALL));
        frame.render_widget(placeholder, layout[1]);
    }

    let filter = Paragraph::new(filter_text(state, &view_data.grid))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(filter, layout[2]);

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[3]);

    if let Some(detail) = &view_data.detail {
        let area = centered_rect(80, 70, frame.area());
        frame.render_widget(Clear, area);
        let modal = Paragraph::new(detail.body.clone())
            .wrap(Wrap { trim: false })
            .scroll((view_data.detail_scroll, 0))
            .block(
                Block::default()
                    .title(detail.header.clone())
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Cyan)),
            );
        frame.render_widget(modal, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_sidebar(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let focused = state.focus == Focus::Sidebar;
    let active = view_data.grid.active_function();
    let rows = view_data
        .index
        .iter()
        .flat_map(|index| index.sidebar())
        .enumerate()
        .map(|(position, summary)| {
            let mark_color = if summary.success {
                Color::Green
            } else {
                Color::Red
            };
            let mut name_style = Style::default();
            if active == Some(summary.name.as_str()) {
                name_style = name_style.add_modifier(Modifier::BOLD);
            }
            if focused && position == view_data.sidebar_cursor {
                name_style = name_style.fg(Color::Black).bg(Color::Cyan);
            }
            Row::new([
                Cell::from(sidebar_mark(summary.success)).style(Style::default().fg(mark_color)),
                Cell::from(summary.name.clone()).style(name_style),
            ])
        })
        .collect::<Vec<_>>();

    let table = Table::new(rows, [Constraint::Length(1), Constraint::Min(8)])
        .column_spacing(1)
        .block(
            Block::default()
                .title("functions")
                .borders(Borders::ALL)
                .border_style(pane_border_style(focused)),
        );
    let mut table_state = TableState::default().with_selected(Some(view_data.sidebar_cursor));
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn render_grid(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let focused = state.focus == Focus::Grid;
    let grid = &view_data.grid;
    let columns = grid.columns();
    let rows = grid.filtered_and_sorted_rows();

    let header = Row::new(columns.iter().enumerate().map(|(column_index, column)| {
        let mut style = Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);
        if focused && column_index == view_data.selected_col {
            style = style.fg(Color::Cyan);
        }
        Cell::from(header_label(grid, *column)).style(style)
    }));

    let body = rows
        .iter()
        .enumerate()
        .map(|(row_index, row)| {
            let selected_row = focused && row_index == view_data.selected_row;
            let cells = columns
                .iter()
                .enumerate()
                .map(|(column_index, column)| {
                    let value = row.cell(*column);
                    let mut style = cell_style(&value);
                    if selected_row {
                        style = style.bg(Color::DarkGray);
                    }
                    if selected_row && column_index == view_data.selected_col {
                        style = Style::default()
                            .fg(Color::Black)
                            .bg(Color::Cyan)
                            .add_modifier(Modifier::BOLD);
                    }
                    Cell::from(value.display()).style(style)
                })
                .collect::<Vec<_>>();
            Row::new(cells)
        })
        .collect::<Vec<_>>();

    let widths = columns
        .iter()
        .map(|column| column_width(*column))
        .collect::<Vec<_>>();
    let table = Table::new(body, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(grid_title(grid, rows.len()))
                .borders(Borders::ALL)
                .border_style(pane_border_style(focused)),
        );
    let mut table_state = TableState::default().with_selected(Some(view_data.selected_row));
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn pane_border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn sidebar_mark(success: bool) -> &'static str {
    if success { PASS_MARK } else { FAIL_MARK }
}

fn cell_style(value: &CellValue<'_>) -> Style {
    match value {
        CellValue::Flag(true) => Style::default().fg(Color::Green),
        CellValue::Flag(false) => Style::default().fg(Color::Red),
        _ => Style::default(),
    }
}

fn column_width(column: Column) -> Constraint {
    match column {
        Column::Success => Constraint::Length(7),
        Column::Module | Column::Raises => Constraint::Min(10),
        Column::Name | Column::Args => Constraint::Min(14),
        Column::Result => Constraint::Min(24),
    }
}

fn header_label(grid: &ResultGrid, column: Column) -> String {
    let mut label = capitalize(column.as_str());
    if let Some((sorted, direction)) = grid.sort_state()
        && sorted == column
    {
        label.push_str(match direction {
            SortDirection::Asc => SORT_ASC_MARK,
            SortDirection::Desc => SORT_DESC_MARK,
        });
    }
    label
}

fn grid_title(grid: &ResultGrid, visible: usize) -> String {
    let Some(function) = grid.active_function() else {
        return "tests".to_owned();
    };
    let total = grid.rows().len();
    if grid.filter_key().is_empty() {
        format!("{function} ({total})")
    } else {
        format!("{function} ({visible}/{total})")
    }
}

fn title_text(view_data: &ViewData) -> String {
    match &view_data.index {
        Some(index) => format!(
            "{} | functions: {} | tests: {} | failed: {}",
            view_data.source,
            index.function_count(),
            index.row_count(),
            index.failed_row_count()
        ),
        None => view_data.source.clone(),
    }
}

fn load_state_text(load: &LoadState) -> String {
    match load {
        LoadState::Loading => "loading…".to_owned(),
        LoadState::Failed(message) => format!("failed to load report: {message}"),
        LoadState::Ready => String::new(),
    }
}

fn filter_text(state: &AppState, grid: &ResultGrid) -> String {
    let filter_key = grid.filter_key();
    match state.mode {
        AppMode::Filter => format!("filter: {filter_key}▏"),
        AppMode::Nav if filter_key.is_empty() => "filter: press / to search".to_owned(),
        AppMode::Nav => format!("filter: {filter_key}"),
    }
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if view_data.detail.is_some() {
        return "DETAIL | j/k scroll | esc close".to_owned();
    }
    if view_data.help_visible {
        return "HELP | esc close".to_owned();
    }

    let (mode, hints) = match (state.mode, state.focus) {
        (AppMode::Filter, _) => ("FILTER", "type to filter | ctrl+u clear | enter/esc done"),
        (AppMode::Nav, Focus::Sidebar) => (
            "NAV",
            "j/k g/G | enter open | tab grid | / filter | ? help | q quit",
        ),
        (AppMode::Nav, Focus::Grid) => (
            "NAV",
            "j/k h/l g/G | enter detail | s sort | tab functions | / filter | ? help | q quit",
        ),
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn help_overlay_text() -> &'static str {
    "global: q or ctrl+q quit | ? help | tab switch pane | esc close overlay\n\
functions: j/k move | g/G first/last | enter show tests\n\
grid: j/k rows | h/l columns | g/G first/last | s sort column | enter details\n\
filter: / edit | type to match any column | backspace delete | ctrl+u clear | enter/esc done\n\
details: j/k scroll | esc close"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
