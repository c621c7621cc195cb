// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tafsir_app::{
    ErrorKind, FontSize, Language, MessageCatalog, MessageId, Overlay, Point, PrefKey,
    ReaderCommand, ReaderEvent, ReaderRequest, ReaderResponse, ReaderState, RequestKind, Surah,
    SurahId, Theme, ViewMode, filter_surahs,
};

/// Terminal cells are mapped to gesture units with this footprint.
pub const CELL_WIDTH: f32 = 8.0;
pub const CELL_HEIGHT: f32 = 16.0;

const SCROLL_STEP: u16 = 1;
const PAGE_ROWS: u16 = 10;
const LIST_WINDOW: usize = 200;

/// Side effects the event loop needs from the outside world.
pub trait AppRuntime {
    /// Starts `request` off the UI thread. The outcome must arrive on `tx` as
    /// [`InternalEvent::Response`].
    fn spawn_request(
        &mut self,
        request: ReaderRequest,
        chapters: Vec<Surah>,
        tx: Sender<InternalEvent>,
    ) -> Result<()>;
    fn save_preference(&mut self, key: PrefKey, value: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Response(ReaderResponse),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaunchOptions {
    /// Surah shown once the surah list arrives.
    pub start_surah: Option<SurahId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum InputMode {
    #[default]
    Nav,
    Search,
    Filter,
    Jump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Pane {
    #[default]
    Chapters,
    Results,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ViewData {
    catalog: MessageCatalog,
    input_mode: InputMode,
    input: String,
    filter: String,
    pane: Pane,
    chapter_cursor: usize,
    result_cursor: usize,
    reader_scroll: u16,
    overlay_scroll: u16,
    settings_cursor: usize,
    help_visible: bool,
    drag_start: Option<(u16, u16)>,
    pending_start: Option<SurahId>,
    status_line: Option<String>,
    status_token: u64,
}

pub fn run_app<R: AppRuntime>(
    state: &mut ReaderState,
    runtime: &mut R,
    options: LaunchOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData {
        pending_start: options.start_surah,
        ..ViewData::default()
    };
    let (internal_tx, internal_rx) = mpsc::channel();

    dispatch(
        state,
        runtime,
        &mut view_data,
        &internal_tx,
        ReaderCommand::LoadChapters,
    );

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if !has_event {
            continue;
        }
        match event::read().context("read event") {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                    break;
                }
            }
            Ok(Event::Mouse(mouse)) => {
                handle_mouse_event(state, runtime, &mut view_data, &internal_tx, mouse);
            }
            Ok(_) => {}
            Err(error) => {
                result = Err(error);
                break;
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(
        io::stdout(),
        DisableMouseCapture,
        terminal::LeaveAlternateScreen
    )
    .context("leave alternate screen")?;
    result
}

fn process_internal_events<R: AppRuntime>(
    state: &mut ReaderState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                view_data.status_line = None;
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Response(response) => {
                tracing::debug!(
                    kind = response.kind().as_str(),
                    request_id = %response.request_id(),
                    "response received"
                );
                let events = state.apply(response);
                handle_reader_events(state, runtime, view_data, tx, events);
            }
        }
    }
}

fn dispatch<R: AppRuntime>(
    state: &mut ReaderState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: ReaderCommand,
) {
    let events = state.dispatch(command);
    handle_reader_events(state, runtime, view_data, tx, events);
}

fn handle_reader_events<R: AppRuntime>(
    state: &mut ReaderState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    events: Vec<ReaderEvent>,
) {
    for event in events {
        match event {
            ReaderEvent::Requested(request) => {
                let kind = request.kind();
                let request_id = request.request_id();
                tracing::info!(kind = kind.as_str(), request_id = %request_id, "request issued");
                let pending = request.clone();
                if let Err(error) = runtime.spawn_request(request, state.chapters.clone(), tx.clone())
                {
                    let detail = format!("{error:#}");
                    tracing::error!(kind = kind.as_str(), error = %detail, "request not started");
                    let events = state.apply(failure_response(&pending, detail));
                    handle_reader_events(state, runtime, view_data, tx, events);
                }
            }
            ReaderEvent::ChaptersLoaded(count) => {
                tracing::info!(count, "surah list loaded");
                view_data.chapter_cursor = 0;
                if let Some(start) = view_data.pending_start.take() {
                    let command = match state.chapter(start) {
                        Some(surah) => ReaderCommand::SelectChapter(surah.clone()),
                        None => ReaderCommand::GoToVerse {
                            surah: start,
                            ayah: 1,
                        },
                    };
                    dispatch(state, runtime, view_data, tx, command);
                }
            }
            ReaderEvent::VerseChanged(position) => {
                tracing::info!(%position, "verse shown");
            }
            ReaderEvent::ScrollToTop => view_data.reader_scroll = 0,
            ReaderEvent::SearchResultsUpdated(count) => {
                tracing::info!(count, "search results updated");
                view_data.result_cursor = 0;
                if count > 0 {
                    view_data.pane = Pane::Results;
                }
            }
            ReaderEvent::OverlayChanged(_) => view_data.overlay_scroll = 0,
            ReaderEvent::GeneratedTextReady(kind) => {
                tracing::info!(kind = kind.as_str(), "generated text ready");
            }
            ReaderEvent::ErrorRaised(banner) => {
                if banner.kind == ErrorKind::NoResults {
                    tracing::info!(query = %banner.detail, "search found nothing");
                } else {
                    tracing::warn!(kind = ?banner.kind, detail = %banner.detail, "operation failed");
                }
            }
            ReaderEvent::PreferenceChanged { key, value } => {
                match runtime.save_preference(key, &value) {
                    Ok(()) => tracing::info!(key = key.as_str(), %value, "preference saved"),
                    Err(error) => {
                        let detail = format!("{error:#}");
                        tracing::error!(key = key.as_str(), error = %detail, "preference not saved");
                        emit_status(
                            view_data,
                            tx,
                            format!("could not save {}: {detail}", key.as_str()),
                        );
                    }
                }
            }
            ReaderEvent::StaleResponse {
                kind,
                request_id,
                latest,
            } => {
                tracing::debug!(
                    kind = kind.as_str(),
                    request_id = %request_id,
                    latest = %latest,
                    "stale response applied"
                );
            }
            ReaderEvent::ModeChanged(_) | ReaderEvent::ErrorCleared => {}
        }
    }
}

fn failure_response(request: &ReaderRequest, detail: String) -> ReaderResponse {
    let request_id = request.request_id();
    match request {
        ReaderRequest::Chapters { .. } => ReaderResponse::Chapters {
            request_id,
            result: Err(detail),
        },
        ReaderRequest::Verse { position, .. } => ReaderResponse::Verse {
            request_id,
            position: *position,
            result: Err(detail),
        },
        ReaderRequest::Search { .. } => ReaderResponse::Search {
            request_id,
            result: Err(detail),
        },
        ReaderRequest::Commentary { .. } => ReaderResponse::Commentary {
            request_id,
            result: Err(detail),
        },
        ReaderRequest::Overview { .. } => ReaderResponse::Overview {
            request_id,
            result: Err(detail),
        },
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    view_data.status_line = Some(message.into());
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut ReaderState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
        && key.modifiers.contains(KeyModifiers::CONTROL)
    {
        return true;
    }

    if view_data.input_mode != InputMode::Nav {
        handle_input_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    match state.overlay {
        Some(Overlay::Settings) => {
            handle_settings_key(state, runtime, view_data, internal_tx, key);
            return false;
        }
        Some(Overlay::Commentary | Overlay::Overview) => {
            handle_text_overlay_key(state, runtime, view_data, internal_tx, key);
            return false;
        }
        None => {}
    }

    if handle_preference_key(state, runtime, view_data, internal_tx, key) {
        return false;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('?'), _) => view_data.help_visible = true,
        (KeyCode::Tab, _) => dispatch(
            state,
            runtime,
            view_data,
            internal_tx,
            ReaderCommand::ToggleMode,
        ),
        (KeyCode::Char('/'), _) => {
            dispatch(
                state,
                runtime,
                view_data,
                internal_tx,
                ReaderCommand::SetMode(ViewMode::Search),
            );
            begin_input(view_data, InputMode::Search, state.search_query.clone());
        }
        (KeyCode::Char('s'), KeyModifiers::NONE) => dispatch(
            state,
            runtime,
            view_data,
            internal_tx,
            ReaderCommand::OpenSettings,
        ),
        (KeyCode::Char('x'), KeyModifiers::NONE) => dispatch(
            state,
            runtime,
            view_data,
            internal_tx,
            ReaderCommand::DismissError,
        ),
        (KeyCode::Esc, _) if state.error.is_some() => dispatch(
            state,
            runtime,
            view_data,
            internal_tx,
            ReaderCommand::DismissError,
        ),
        _ => match state.mode {
            ViewMode::Search => handle_search_view_key(state, runtime, view_data, internal_tx, key),
            ViewMode::Reader => handle_reader_view_key(state, runtime, view_data, internal_tx, key),
        },
    }
    false
}

fn begin_input(view_data: &mut ViewData, mode: InputMode, initial: String) {
    view_data.input_mode = mode;
    view_data.input = initial;
}

fn handle_input_key<R: AppRuntime>(
    state: &mut ReaderState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let mode = view_data.input_mode;
    match key.code {
        KeyCode::Esc => {
            view_data.input_mode = InputMode::Nav;
            view_data.input.clear();
        }
        KeyCode::Enter => {
            view_data.input_mode = InputMode::Nav;
            let input = std::mem::take(&mut view_data.input);
            match mode {
                InputMode::Search => dispatch(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    ReaderCommand::Search(input),
                ),
                InputMode::Jump => dispatch(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    ReaderCommand::JumpTo(input),
                ),
                InputMode::Filter => view_data.pane = Pane::Chapters,
                InputMode::Nav => {}
            }
        }
        KeyCode::Backspace => {
            view_data.input.pop();
            if mode == InputMode::Filter {
                let filter = view_data.input.clone();
                set_filter(view_data, filter);
            }
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.input.push(ch);
            if mode == InputMode::Filter {
                let filter = view_data.input.clone();
                set_filter(view_data, filter);
            }
        }
        _ => {}
    }
}

fn set_filter(view_data: &mut ViewData, filter: String) {
    view_data.filter = filter;
    view_data.chapter_cursor = 0;
}

/// Theme, font size and language shortcuts available outside text input.
fn handle_preference_key<R: AppRuntime>(
    state: &mut ReaderState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let command = match key.code {
        KeyCode::Char('t') => ReaderCommand::CycleTheme,
        KeyCode::Char('+') | KeyCode::Char('=') => ReaderCommand::AdjustArabicFont(1),
        KeyCode::Char('-') => ReaderCommand::AdjustArabicFont(-1),
        KeyCode::Char(']') => ReaderCommand::AdjustTranslationFont(1),
        KeyCode::Char('[') => ReaderCommand::AdjustTranslationFont(-1),
        KeyCode::Char('L') => ReaderCommand::ToggleLanguage,
        _ => return false,
    };
    dispatch(state, runtime, view_data, internal_tx, command);
    true
}

fn handle_search_view_key<R: AppRuntime>(
    state: &mut ReaderState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let chapter_count = filter_surahs(&state.chapters, &view_data.filter).len();
    match key.code {
        KeyCode::Char('f') => {
            view_data.pane = Pane::Chapters;
            let filter = view_data.filter.clone();
            begin_input(view_data, InputMode::Filter, filter);
        }
        KeyCode::Char('h') | KeyCode::Left => view_data.pane = Pane::Chapters,
        KeyCode::Char('l') | KeyCode::Right => view_data.pane = Pane::Results,
        KeyCode::Char('j') | KeyCode::Down => move_cursor(state, view_data, chapter_count, 1),
        KeyCode::Char('k') | KeyCode::Up => move_cursor(state, view_data, chapter_count, -1),
        KeyCode::PageDown => move_cursor(state, view_data, chapter_count, PAGE_ROWS as isize),
        KeyCode::PageUp => move_cursor(state, view_data, chapter_count, -(PAGE_ROWS as isize)),
        KeyCode::Char('g') | KeyCode::Home => move_cursor(state, view_data, chapter_count, isize::MIN),
        KeyCode::Char('G') | KeyCode::End => move_cursor(state, view_data, chapter_count, isize::MAX),
        KeyCode::Enter => {
            let command = match view_data.pane {
                Pane::Chapters => filter_surahs(&state.chapters, &view_data.filter)
                    .get(view_data.chapter_cursor)
                    .map(|surah| ReaderCommand::SelectChapter((*surah).clone())),
                Pane::Results => state.search_results.get(view_data.result_cursor).map(
                    |result| ReaderCommand::SelectSearchResult {
                        surah: result.position.surah,
                        ayah: result.position.ayah,
                    },
                ),
            };
            if let Some(command) = command {
                dispatch(state, runtime, view_data, internal_tx, command);
            }
        }
        _ => {}
    }
}

fn move_cursor(state: &ReaderState, view_data: &mut ViewData, chapter_count: usize, delta: isize) {
    let (cursor, len) = match view_data.pane {
        Pane::Chapters => (&mut view_data.chapter_cursor, chapter_count),
        Pane::Results => (&mut view_data.result_cursor, state.search_results.len()),
    };
    if len == 0 {
        *cursor = 0;
        return;
    }
    let last = len - 1;
    *cursor = match delta {
        isize::MIN => 0,
        isize::MAX => last,
        _ => cursor.saturating_add_signed(delta).min(last),
    };
}

fn handle_reader_view_key<R: AppRuntime>(
    state: &mut ReaderState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let command = match key.code {
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('n') | KeyCode::Char(' ') => {
            Some(ReaderCommand::Advance)
        }
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('p') => Some(ReaderCommand::Retreat),
        KeyCode::Char('c') => Some(ReaderCommand::RequestCommentary),
        KeyCode::Char('o') => Some(ReaderCommand::RequestOverview),
        KeyCode::Char(':') | KeyCode::Char('g') => {
            if state.current_surah.is_some() {
                begin_input(view_data, InputMode::Jump, String::new());
            }
            None
        }
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.reader_scroll = view_data.reader_scroll.saturating_add(SCROLL_STEP);
            None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.reader_scroll = view_data.reader_scroll.saturating_sub(SCROLL_STEP);
            None
        }
        KeyCode::PageDown => {
            view_data.reader_scroll = view_data.reader_scroll.saturating_add(PAGE_ROWS);
            None
        }
        KeyCode::PageUp => {
            view_data.reader_scroll = view_data.reader_scroll.saturating_sub(PAGE_ROWS);
            None
        }
        _ => None,
    };
    if let Some(command) = command {
        dispatch(state, runtime, view_data, internal_tx, command);
    }
}

fn handle_text_overlay_key<R: AppRuntime>(
    state: &mut ReaderState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => dispatch(
            state,
            runtime,
            view_data,
            internal_tx,
            ReaderCommand::CloseOverlay,
        ),
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.overlay_scroll = view_data.overlay_scroll.saturating_add(SCROLL_STEP);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.overlay_scroll = view_data.overlay_scroll.saturating_sub(SCROLL_STEP);
        }
        _ => {}
    }
}

fn handle_settings_key<R: AppRuntime>(
    state: &mut ReaderState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let selected = PrefKey::ALL[view_data.settings_cursor.min(PrefKey::ALL.len() - 1)];
    let step = match key.code {
        KeyCode::Esc | KeyCode::Char('s') | KeyCode::Char('q') => {
            dispatch(
                state,
                runtime,
                view_data,
                internal_tx,
                ReaderCommand::CloseOverlay,
            );
            return;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.settings_cursor = (view_data.settings_cursor + 1).min(PrefKey::ALL.len() - 1);
            return;
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.settings_cursor = view_data.settings_cursor.saturating_sub(1);
            return;
        }
        KeyCode::Char('l') | KeyCode::Right | KeyCode::Char('+') | KeyCode::Enter => 1,
        KeyCode::Char('h') | KeyCode::Left | KeyCode::Char('-') => -1,
        _ => return,
    };

    let command = match selected {
        PrefKey::Theme => ReaderCommand::CycleTheme,
        PrefKey::ArabicFontSize => ReaderCommand::AdjustArabicFont(step),
        PrefKey::TranslationFontSize => ReaderCommand::AdjustTranslationFont(step),
        PrefKey::Language => ReaderCommand::ToggleLanguage,
    };
    dispatch(state, runtime, view_data, internal_tx, command);
}

fn handle_mouse_event<R: AppRuntime>(
    state: &mut ReaderState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    mouse: MouseEvent,
) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            view_data.drag_start = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Up(MouseButton::Left) => {
            let Some(start) = view_data.drag_start.take() else {
                return;
            };
            if state.mode != ViewMode::Reader || state.overlay.is_some() {
                return;
            }
            dispatch(
                state,
                runtime,
                view_data,
                internal_tx,
                ReaderCommand::Gesture {
                    start: cell_point(start.0, start.1),
                    end: cell_point(mouse.column, mouse.row),
                },
            );
        }
        MouseEventKind::ScrollDown if state.mode == ViewMode::Reader => {
            view_data.reader_scroll = view_data.reader_scroll.saturating_add(SCROLL_STEP);
        }
        MouseEventKind::ScrollUp if state.mode == ViewMode::Reader => {
            view_data.reader_scroll = view_data.reader_scroll.saturating_sub(SCROLL_STEP);
        }
        _ => {}
    }
}

fn cell_point(column: u16, row: u16) -> Point {
    Point::new(f32::from(column) * CELL_WIDTH, f32::from(row) * CELL_HEIGHT)
}

#[derive(Debug, Clone, Copy)]
struct Palette {
    base: Style,
    accent: Color,
    muted: Color,
    error: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            base: Style::default().fg(Color::White).bg(Color::Black),
            accent: Color::Cyan,
            muted: Color::DarkGray,
            error: Color::LightRed,
        },
        Theme::Light => Palette {
            base: Style::default().fg(Color::Black).bg(Color::White),
            accent: Color::Blue,
            muted: Color::Gray,
            error: Color::Red,
        },
        Theme::Sepia => Palette {
            base: Style::default()
                .fg(Color::Rgb(94, 75, 52))
                .bg(Color::Rgb(244, 236, 216)),
            accent: Color::Rgb(140, 82, 40),
            muted: Color::Rgb(160, 140, 110),
            error: Color::Rgb(170, 40, 30),
        },
    }
}

/// Blank lines placed around a text block for the given size.
fn font_padding(size: FontSize) -> usize {
    usize::from(size.get().saturating_sub(1) / 2)
}

fn font_style(size: FontSize, palette: &Palette) -> Style {
    match size.get() {
        1 => Style::default().fg(palette.muted),
        2 | 3 => Style::default(),
        4 => Style::default().add_modifier(Modifier::BOLD),
        _ => Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &ReaderState, view_data: &ViewData) {
    let language = state.preferences.language;
    let palette = palette(state.preferences.theme);
    let catalog = &view_data.catalog;

    frame.render_widget(Block::default().style(palette.base), frame.area());

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let selected = match state.mode {
        ViewMode::Search => 0,
        ViewMode::Reader => 1,
    };
    let tabs = Tabs::new(vec![
        catalog.mode_title(ViewMode::Search, language),
        catalog.mode_title(ViewMode::Reader, language),
    ])
    .block(
        Block::default()
            .title(header_title(state, catalog))
            .borders(Borders::ALL),
    )
    .highlight_style(
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    )
    .select(selected);
    frame.render_widget(tabs, layout[0]);

    match state.mode {
        ViewMode::Search => render_search_view(frame, layout[1], state, view_data, &palette),
        ViewMode::Reader => {
            let body = Paragraph::new(reader_lines(state, catalog, &palette))
                .wrap(Wrap { trim: false })
                .scroll((view_data.reader_scroll, 0))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(catalog.text(MessageId::ReaderTitle, language)),
                );
            frame.render_widget(body, layout[1]);
        }
    }

    let status_style = if state.error.is_some() {
        Style::default().fg(palette.error)
    } else {
        Style::default().fg(palette.accent)
    };
    let status = Paragraph::new(status_text(state, view_data))
        .style(status_style)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if let Some(overlay) = state.overlay {
        let (title, text) = match overlay {
            Overlay::Commentary => (
                overlay_title(state, catalog, MessageId::CommentaryTitle),
                generated_text(state.commentary.as_deref(), catalog, language),
            ),
            Overlay::Overview => (
                overlay_title(state, catalog, MessageId::OverviewTitle),
                generated_text(state.overview.as_deref(), catalog, language),
            ),
            Overlay::Settings => (
                catalog.text(MessageId::SettingsTitle, language),
                render_settings_text(state, view_data),
            ),
        };
        let area = centered_rect(76, 70, frame.area());
        frame.render_widget(Clear, area);
        let mut widget = Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .style(palette.base)
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.accent)),
            );
        if overlay != Overlay::Settings {
            widget = widget.scroll((view_data.overlay_scroll, 0));
        }
        frame.render_widget(widget, area);
    }

    if view_data.help_visible {
        let area = centered_rect(80, 72, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text()).style(palette.base).block(
            Block::default()
                .title(catalog.text(MessageId::HelpTitle, language))
                .borders(Borders::ALL),
        );
        frame.render_widget(help, area);
    }
}

fn render_search_view(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &ReaderState,
    view_data: &ViewData,
    palette: &Palette,
) {
    let language = state.preferences.language;
    let catalog = &view_data.catalog;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(38), Constraint::Percentage(62)])
        .split(area);

    let focused = |pane: Pane| {
        if view_data.pane == pane {
            Style::default().fg(palette.accent)
        } else {
            Style::default()
        }
    };

    let mut chapters_title = catalog.text(MessageId::ChaptersTitle, language);
    if !view_data.filter.is_empty() {
        chapters_title = format!(
            "{chapters_title} [{}: {}]",
            catalog.text(MessageId::FilterPrompt, language),
            view_data.filter
        );
    }
    let chapters = Paragraph::new(render_chapter_list_text(state, view_data)).block(
        Block::default()
            .title(chapters_title)
            .borders(Borders::ALL)
            .border_style(focused(Pane::Chapters)),
    );
    frame.render_widget(chapters, columns[0]);

    let results = Paragraph::new(render_results_text(state, view_data))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(catalog.text(MessageId::ResultsTitle, language))
                .borders(Borders::ALL)
                .border_style(focused(Pane::Results)),
        );
    frame.render_widget(results, columns[1]);
}

fn header_title(state: &ReaderState, catalog: &MessageCatalog) -> String {
    let language = state.preferences.language;
    let mut title = catalog.text(MessageId::AppTitle, language);
    if let Some(position) = state.position() {
        title.push_str(&format!(" {position}"));
    }
    let busy = if state.is_loading(RequestKind::Search) {
        Some(MessageId::Searching)
    } else if state.is_loading(RequestKind::Commentary) || state.is_loading(RequestKind::Overview)
    {
        Some(MessageId::Generating)
    } else if state.is_loading(RequestKind::Verse) || state.is_loading(RequestKind::Chapters) {
        Some(MessageId::Loading)
    } else {
        None
    };
    if let Some(id) = busy {
        title.push_str(&format!(" | {}", catalog.text(id, language)));
    }
    title
}

fn overlay_title(state: &ReaderState, catalog: &MessageCatalog, id: MessageId) -> String {
    let label = catalog.text(id, state.preferences.language);
    match (&state.verse, &state.current_surah) {
        (Some(verse), _) if id == MessageId::CommentaryTitle => {
            format!("{label} {}", verse.position)
        }
        (_, Some(surah)) => format!("{label} {}", surah.transliteration),
        _ => label,
    }
}

fn generated_text(text: Option<&str>, catalog: &MessageCatalog, language: Language) -> String {
    match text {
        Some(text) => format!("{text}\n\nj/k scroll | esc close"),
        None => catalog.text(MessageId::Generating, language),
    }
}

fn render_chapter_list_text(state: &ReaderState, view_data: &ViewData) -> String {
    let language = state.preferences.language;
    if state.chapters.is_empty() {
        return if state.is_loading(RequestKind::Chapters) {
            view_data.catalog.text(MessageId::Loading, language)
        } else {
            view_data.catalog.text(MessageId::NoChapters, language)
        };
    }

    let matches = filter_surahs(&state.chapters, &view_data.filter);
    let current = state.current_surah.as_ref().map(|surah| surah.id);
    let start = view_data.chapter_cursor.saturating_sub(LIST_WINDOW / 2);
    matches
        .iter()
        .enumerate()
        .skip(start)
        .take(LIST_WINDOW)
        .map(|(index, surah)| {
            let cursor = if index == view_data.chapter_cursor && view_data.pane == Pane::Chapters {
                ">"
            } else {
                " "
            };
            let marker = if current == Some(surah.id) { "*" } else { " " };
            format!(
                "{cursor}{marker}{:>3} {} ({}) {}",
                surah.id.get(), surah.transliteration, surah.translation, surah.verse_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_results_text(state: &ReaderState, view_data: &ViewData) -> String {
    let language = state.preferences.language;
    let catalog = &view_data.catalog;
    let mut lines = Vec::new();

    let prompt = catalog.text(MessageId::SearchPrompt, language);
    if view_data.input_mode == InputMode::Search {
        lines.push(format!("{prompt}> {}_", view_data.input));
    } else if !state.search_query.is_empty() {
        lines.push(format!("{prompt}: {}", state.search_query));
    } else {
        lines.push(format!("{prompt}: / ..."));
    }
    lines.push(String::new());

    if state.is_loading(RequestKind::Search) {
        lines.push(catalog.text(MessageId::Searching, language));
        return lines.join("\n");
    }

    let confidence = catalog.text(MessageId::ConfidenceLabel, language);
    for (index, result) in state.search_results.iter().enumerate() {
        let cursor = if index == view_data.result_cursor && view_data.pane == Pane::Results {
            ">"
        } else {
            " "
        };
        let name = state
            .chapter(result.position.surah)
            .map(|surah| surah.transliteration.as_str())
            .unwrap_or_default();
        lines.push(format!(
            "{cursor} {:<7} {name} | {confidence} {:.0}%",
            result.position.to_string(),
            result.confidence * 100.0
        ));
        if !result.rationale.is_empty() {
            lines.push(format!("    {}", result.rationale));
        }
    }
    lines.join("\n")
}

fn reader_lines(
    state: &ReaderState,
    catalog: &MessageCatalog,
    palette: &Palette,
) -> Vec<Line<'static>> {
    let language = state.preferences.language;
    let Some(verse) = &state.verse else {
        let id = if state.is_loading(RequestKind::Verse) {
            MessageId::Loading
        } else {
            MessageId::NoVerseSelected
        };
        return vec![Line::from(catalog.text(id, language))];
    };

    let mut meta = format!(
        "{} ({}) | {} | {}/{}",
        verse.surah_transliteration,
        verse.surah_translation,
        verse.surah_name,
        verse.position,
        verse.verse_count
    );
    if let Some(juz) = verse.juz {
        meta.push_str(&format!(" | juz {juz}"));
    }
    if let Some(page) = verse.page {
        meta.push_str(&format!(" | page {page}"));
    }

    let arabic_size = state.preferences.arabic_font_size;
    let translation_size = state.preferences.translation_font_size;
    let mut lines = vec![
        Line::from(Span::styled(meta, Style::default().fg(palette.accent))),
        Line::from(""),
    ];

    let arabic_pad = font_padding(arabic_size);
    lines.extend((0..arabic_pad).map(|_| Line::from("")));
    lines.push(
        Line::from(Span::styled(
            verse.arabic.clone(),
            font_style(arabic_size, palette),
        ))
        .alignment(Alignment::Right),
    );
    lines.extend((0..=arabic_pad).map(|_| Line::from("")));

    let translation_pad = font_padding(translation_size);
    for translation in [&verse.primary, &verse.secondary] {
        lines.push(Line::from(Span::styled(
            format!("[{}]", translation.edition),
            Style::default().fg(palette.muted),
        )));
        lines.push(Line::from(Span::styled(
            translation.text.clone(),
            font_style(translation_size, palette),
        )));
        lines.extend((0..=translation_pad).map(|_| Line::from("")));
    }

    lines.push(Line::from(Span::styled(
        "h/l turn | drag to swipe | c commentary | o overview | : jump",
        Style::default().fg(palette.muted),
    )));
    lines
}

fn render_settings_text(state: &ReaderState, view_data: &ViewData) -> String {
    let language = state.preferences.language;
    let catalog = &view_data.catalog;
    let preferences = &state.preferences;
    let mut lines = Vec::new();
    for (index, key) in PrefKey::ALL.into_iter().enumerate() {
        let (label, value) = match key {
            PrefKey::Theme => (
                MessageId::ThemeLabel,
                preferences.theme.as_str().to_owned(),
            ),
            PrefKey::ArabicFontSize => (
                MessageId::ArabicFontLabel,
                size_gauge(preferences.arabic_font_size),
            ),
            PrefKey::TranslationFontSize => (
                MessageId::TranslationFontLabel,
                size_gauge(preferences.translation_font_size),
            ),
            PrefKey::Language => (
                MessageId::LanguageLabel,
                preferences.language.display_name().to_owned(),
            ),
        };
        let cursor = if index == view_data.settings_cursor {
            ">"
        } else {
            " "
        };
        lines.push(format!(
            "{cursor} {:<18} {value}",
            catalog.text(label, language)
        ));
    }
    lines.push(String::new());
    lines.push("j/k pick | h/l change | esc close".to_owned());
    lines.join("\n")
}

fn size_gauge(size: FontSize) -> String {
    let filled = usize::from(size.get());
    let empty = usize::from(FontSize::MAX.get()) - filled;
    format!("{}{} {}", "#".repeat(filled), ".".repeat(empty), size.get())
}

fn status_text(state: &ReaderState, view_data: &ViewData) -> String {
    let language = state.preferences.language;
    let catalog = &view_data.catalog;

    match view_data.input_mode {
        InputMode::Filter => {
            return format!(
                "{}> {}_ | enter done | esc cancel",
                catalog.text(MessageId::FilterPrompt, language),
                view_data.input
            );
        }
        InputMode::Jump => {
            let range = state
                .current_surah
                .as_ref()
                .map(|surah| format!(" (1-{})", surah.verse_count))
                .unwrap_or_default();
            return format!(
                "{}{range}> {}_ | enter go | esc cancel",
                catalog.text(MessageId::JumpPrompt, language),
                view_data.input
            );
        }
        InputMode::Search => return "enter search | esc cancel".to_owned(),
        InputMode::Nav => {}
    }

    if let Some(banner) = &state.error {
        let title = catalog.error_title(banner.kind, language);
        return if banner.detail.is_empty() {
            format!("{title} | x dismiss")
        } else {
            format!("{title}: {} | x dismiss", banner.detail)
        };
    }

    let hints = match state.mode {
        ViewMode::Search => "/ ask | f filter | j/k move | h/l pane | enter open | tab reader",
        ViewMode::Reader => "h/l turn | : jump | c commentary | o overview | tab search",
    };
    let default = format!("{hints} | s settings | ? help | ctrl+q quit");
    match &view_data.status_line {
        Some(status) => format!("{status} | {default}"),
        None => default,
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | tab search/reader | / ask | s settings | x dismiss error | ? help\n\
search: f filter surahs | j/k move | h/l switch pane | g/G top/bottom | enter open\n\
reader: l/n/space/right next | h/p/left previous | drag left/right to swipe\n\
reader: : or g jump to ayah | j/k scroll | c commentary | o overview\n\
preferences: t theme | +/- arabic size | ]/[ translation size | L language\n\
overlays: j/k scroll | esc close"
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

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, InputMode, InternalEvent, Pane, ViewData, centered_rect, dispatch,
        emit_status, handle_key_event, handle_mouse_event, help_overlay_text,
        process_internal_events, render, render_chapter_list_text, render_results_text,
        render_settings_text, status_text,
    };
    use anyhow::{Result, anyhow, bail};
    use crossterm::event::{
        KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    };
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::layout::Rect;
    use std::sync::mpsc::{self, Receiver, Sender};
    use tafsir_app::{
        ErrorKind, Language, Overlay, PrefKey, Preferences, ReaderCommand, ReaderRequest,
        ReaderState, RequestKind, SearchResult, Surah, Theme, VersePosition, ViewMode,
        execute_request,
    };
    use tafsir_testkit::{InMemoryCorpus, ScriptedSearch, surah_id};

    #[derive(Default)]
    struct TestRuntime {
        corpus: InMemoryCorpus,
        search: ScriptedSearch,
        requests: Vec<RequestKind>,
        saved: Vec<(PrefKey, String)>,
        fail_spawn: bool,
        fail_save: bool,
    }

    impl AppRuntime for TestRuntime {
        fn spawn_request(
            &mut self,
            request: ReaderRequest,
            chapters: Vec<Surah>,
            tx: Sender<InternalEvent>,
        ) -> Result<()> {
            if self.fail_spawn {
                bail!("worker pool is gone");
            }
            self.requests.push(request.kind());
            let response = execute_request(&request, &chapters, &self.corpus, &self.search);
            tx.send(InternalEvent::Response(response))
                .map_err(|_| anyhow!("ui channel closed"))
        }

        fn save_preference(&mut self, key: PrefKey, value: &str) -> Result<()> {
            if self.fail_save {
                bail!("database is locked");
            }
            self.saved.push((key, value.to_owned()));
            Ok(())
        }
    }

    struct Harness {
        state: ReaderState,
        runtime: TestRuntime,
        view_data: ViewData,
        tx: Sender<InternalEvent>,
        rx: Receiver<InternalEvent>,
    }

    impl Harness {
        fn with_runtime(runtime: TestRuntime, view_data: ViewData) -> Self {
            let (tx, rx) = mpsc::channel();
            let mut harness = Self {
                state: ReaderState::new(Preferences::default()),
                runtime: TestRuntime {
                    corpus: InMemoryCorpus::new(),
                    ..runtime
                },
                view_data,
                tx,
                rx,
            };
            harness.command(ReaderCommand::LoadChapters);
            harness
        }

        fn new() -> Self {
            Self::with_runtime(TestRuntime::default(), ViewData::default())
        }

        fn pump(&mut self) {
            process_internal_events(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                &self.rx,
            );
        }

        fn command(&mut self, command: ReaderCommand) {
            dispatch(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                command,
            );
            self.pump();
        }

        fn key_with(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
            let quit = handle_key_event(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                KeyEvent::new(code, modifiers),
            );
            self.pump();
            quit
        }

        fn key(&mut self, code: KeyCode) -> bool {
            self.key_with(code, KeyModifiers::NONE)
        }

        fn chars(&mut self, text: &str) {
            for ch in text.chars() {
                self.key(KeyCode::Char(ch));
            }
        }

        fn drag(&mut self, from: u16, to: u16) {
            for (kind, column) in [
                (MouseEventKind::Down(MouseButton::Left), from),
                (MouseEventKind::Up(MouseButton::Left), to),
            ] {
                handle_mouse_event(
                    &mut self.state,
                    &mut self.runtime,
                    &mut self.view_data,
                    &self.tx,
                    MouseEvent {
                        kind,
                        column,
                        row: 10,
                        modifiers: KeyModifiers::NONE,
                    },
                );
            }
            self.pump();
        }

        fn position(&self) -> Option<String> {
            self.state.position().map(|position| position.to_string())
        }

        /// Opens the first surah in the reader.
        fn open_first_surah(&mut self) {
            self.key(KeyCode::Enter);
        }
    }

    fn hit(surah: u16, ayah: u16, confidence: f32, rationale: &str) -> SearchResult {
        SearchResult {
            position: VersePosition::new(surah_id(surah), ayah),
            confidence,
            rationale: rationale.to_owned(),
        }
    }

    #[test]
    fn ctrl_q_quits() {
        let mut harness = Harness::new();
        assert!(!harness.key(KeyCode::Char('q')));
        assert!(harness.key_with(KeyCode::Char('q'), KeyModifiers::CONTROL));
    }

    #[test]
    fn surah_list_loads_on_start() {
        let harness = Harness::new();
        assert_eq!(harness.state.chapters.len(), 114);
        assert!(!harness.state.is_loading(RequestKind::Chapters));
        assert_eq!(harness.runtime.requests, vec![RequestKind::Chapters]);
        let text = render_chapter_list_text(&harness.state, &harness.view_data);
        assert!(text.starts_with(">   1 Al-Faatiha (The Opening) 7"));
    }

    #[test]
    fn start_surah_opens_reader_after_list_loads() {
        let view_data = ViewData {
            pending_start: Some(surah_id(36)),
            ..ViewData::default()
        };
        let harness = Harness::with_runtime(TestRuntime::default(), view_data);
        assert_eq!(harness.state.mode, ViewMode::Reader);
        assert_eq!(harness.position().as_deref(), Some("36:1"));
        assert!(harness.view_data.pending_start.is_none());
    }

    #[test]
    fn spawn_failure_surfaces_as_load_error() {
        let runtime = TestRuntime {
            fail_spawn: true,
            ..TestRuntime::default()
        };
        let harness = Harness::with_runtime(runtime, ViewData::default());
        let error = harness.state.error.as_ref().expect("load error expected");
        assert_eq!(error.kind, ErrorKind::Load);
        assert!(error.detail.contains("worker pool is gone"));
        assert!(!harness.state.is_loading(RequestKind::Chapters));

        let status = status_text(&harness.state, &harness.view_data);
        assert!(status.starts_with("could not load the surah list: worker pool is gone"));
        assert_eq!(
            render_chapter_list_text(&harness.state, &harness.view_data),
            "surah list unavailable"
        );
    }

    #[test]
    fn tab_toggles_between_views() {
        let mut harness = Harness::new();
        assert_eq!(harness.state.mode, ViewMode::Search);
        harness.key(KeyCode::Tab);
        assert_eq!(harness.state.mode, ViewMode::Reader);
        harness.key(KeyCode::Tab);
        assert_eq!(harness.state.mode, ViewMode::Search);
    }

    #[test]
    fn filter_narrows_list_and_enter_opens_surah() {
        let mut harness = Harness::new();
        harness.key(KeyCode::Char('f'));
        assert_eq!(harness.view_data.input_mode, InputMode::Filter);
        harness.chars("yas");
        assert_eq!(harness.view_data.filter, "yas");

        let text = render_chapter_list_text(&harness.state, &harness.view_data);
        assert!(text.contains("Yaseen"));
        assert!(!text.contains("Al-Baqara"));

        harness.key(KeyCode::Enter);
        assert_eq!(harness.view_data.input_mode, InputMode::Nav);
        harness.key(KeyCode::Enter);
        assert_eq!(harness.state.mode, ViewMode::Reader);
        assert_eq!(harness.position().as_deref(), Some("36:1"));
    }

    #[test]
    fn filter_backspace_widens_list() {
        let mut harness = Harness::new();
        harness.key(KeyCode::Char('f'));
        harness.chars("naasx");
        assert_eq!(
            render_chapter_list_text(&harness.state, &harness.view_data),
            ""
        );
        harness.key(KeyCode::Backspace);
        let text = render_chapter_list_text(&harness.state, &harness.view_data);
        assert!(text.contains("An-Naas"));
    }

    #[test]
    fn chapter_cursor_is_clamped_to_list() {
        let mut harness = Harness::new();
        harness.key(KeyCode::Char('k'));
        assert_eq!(harness.view_data.chapter_cursor, 0);
        harness.key(KeyCode::Char('G'));
        assert_eq!(harness.view_data.chapter_cursor, 113);
        harness.key(KeyCode::Char('j'));
        assert_eq!(harness.view_data.chapter_cursor, 113);
        harness.key(KeyCode::Char('g'));
        harness.key(KeyCode::PageDown);
        assert_eq!(harness.view_data.chapter_cursor, 10);
    }

    #[test]
    fn reader_keys_turn_pages_across_surahs() {
        let mut harness = Harness::new();
        harness.open_first_surah();
        assert_eq!(harness.position().as_deref(), Some("1:1"));

        harness.key(KeyCode::Char('l'));
        harness.key(KeyCode::Right);
        assert_eq!(harness.position().as_deref(), Some("1:3"));
        harness.key(KeyCode::Char('h'));
        assert_eq!(harness.position().as_deref(), Some("1:2"));

        for _ in 0..6 {
            harness.key(KeyCode::Char(' '));
        }
        assert_eq!(harness.position().as_deref(), Some("2:1"));
    }

    #[test]
    fn reader_scroll_resets_when_verse_changes() {
        let mut harness = Harness::new();
        harness.open_first_surah();
        harness.key(KeyCode::Char('j'));
        harness.key(KeyCode::Char('j'));
        assert_eq!(harness.view_data.reader_scroll, 2);
        harness.key(KeyCode::Char('n'));
        assert_eq!(harness.view_data.reader_scroll, 0);
    }

    #[test]
    fn jump_input_goes_to_ayah() {
        let mut harness = Harness::new();
        harness.open_first_surah();
        harness.key(KeyCode::Char(':'));
        assert_eq!(harness.view_data.input_mode, InputMode::Jump);
        assert!(
            status_text(&harness.state, &harness.view_data).contains("(1-7)")
        );
        harness.chars("5");
        harness.key(KeyCode::Enter);
        assert_eq!(harness.position().as_deref(), Some("1:5"));

        harness.key(KeyCode::Char(':'));
        harness.chars("99");
        harness.key(KeyCode::Enter);
        assert_eq!(harness.position().as_deref(), Some("1:5"));
        assert!(harness.state.error.is_none());
    }

    #[test]
    fn failed_verse_shows_error_until_dismissed() {
        let mut harness = Harness::new();
        harness.open_first_surah();
        harness
            .runtime
            .corpus
            .fail_at(VersePosition::new(surah_id(1), 2));
        harness.key(KeyCode::Char('l'));

        assert_eq!(harness.position().as_deref(), Some("1:1"));
        let error = harness.state.error.clone().expect("navigation error");
        assert_eq!(error.kind, ErrorKind::Navigation);
        let status = status_text(&harness.state, &harness.view_data);
        assert!(status.contains("1:2: verse 1:2 unavailable"));
        assert!(status.ends_with("x dismiss"));

        harness.key(KeyCode::Char('x'));
        assert!(harness.state.error.is_none());
    }

    #[test]
    fn horizontal_drag_turns_pages() {
        let mut harness = Harness::new();
        harness.open_first_surah();

        harness.drag(40, 20);
        assert_eq!(harness.position().as_deref(), Some("1:2"));
        harness.drag(20, 40);
        assert_eq!(harness.position().as_deref(), Some("1:1"));
        harness.drag(20, 17);
        assert_eq!(harness.position().as_deref(), Some("1:1"));
    }

    #[test]
    fn drag_in_search_view_is_ignored() {
        let mut harness = Harness::new();
        harness.drag(40, 10);
        assert!(harness.state.position().is_none());
        assert_eq!(harness.runtime.requests, vec![RequestKind::Chapters]);
    }

    #[test]
    fn search_input_runs_query_and_opens_result() {
        let mut harness = Harness::new();
        harness.runtime.search.push_results(vec![
            hit(94, 5, 0.95, "With hardship comes ease"),
            hit(2, 153, 0.9, "Seek help through patience"),
        ]);

        harness.key(KeyCode::Char('/'));
        assert_eq!(harness.view_data.input_mode, InputMode::Search);
        harness.chars("patience");
        let typing = render_results_text(&harness.state, &harness.view_data);
        assert!(typing.starts_with("ask> patience_"));
        harness.key(KeyCode::Enter);

        assert_eq!(harness.state.search_query, "patience");
        assert_eq!(harness.state.search_results.len(), 2);
        assert_eq!(harness.view_data.pane, Pane::Results);
        let text = render_results_text(&harness.state, &harness.view_data);
        assert!(text.contains("> 94:5"));
        assert!(text.contains("confidence 95%"));
        assert!(text.contains("    With hardship comes ease"));

        harness.key(KeyCode::Char('j'));
        harness.key(KeyCode::Enter);
        assert_eq!(harness.state.mode, ViewMode::Reader);
        assert_eq!(harness.position().as_deref(), Some("2:153"));
    }

    #[test]
    fn empty_search_result_raises_no_results() {
        let mut harness = Harness::new();
        harness.runtime.search.push_results(Vec::new());
        harness.key(KeyCode::Char('/'));
        harness.chars("unicorns");
        harness.key(KeyCode::Enter);

        let error = harness.state.error.as_ref().expect("no results banner");
        assert_eq!(error.kind, ErrorKind::NoResults);
        assert_eq!(error.detail, "unicorns");
        assert_eq!(harness.view_data.pane, Pane::Chapters);
    }

    #[test]
    fn escape_cancels_input_without_request() {
        let mut harness = Harness::new();
        harness.key(KeyCode::Char('/'));
        harness.chars("abc");
        harness.key(KeyCode::Esc);
        assert_eq!(harness.view_data.input_mode, InputMode::Nav);
        assert!(harness.view_data.input.is_empty());
        assert_eq!(harness.runtime.requests, vec![RequestKind::Chapters]);
    }

    #[test]
    fn commentary_overlay_shows_generated_text() {
        let mut harness = Harness::new();
        harness.open_first_surah();
        harness.runtime.search.push_text("The opening praise.");
        harness.key(KeyCode::Char('c'));

        assert_eq!(harness.state.overlay, Some(Overlay::Commentary));
        assert_eq!(harness.state.commentary.as_deref(), Some("The opening praise."));

        harness.key(KeyCode::Char('l'));
        assert_eq!(harness.position().as_deref(), Some("1:1"));
        harness.key(KeyCode::Esc);
        assert_eq!(harness.state.overlay, None);
    }

    #[test]
    fn generation_failure_closes_overlay() {
        let mut harness = Harness::new();
        harness.open_first_surah();
        harness.runtime.search.push_text_error("model offline");
        harness.key(KeyCode::Char('o'));

        assert_eq!(harness.state.overlay, None);
        let error = harness.state.error.as_ref().expect("generation error");
        assert_eq!(error.kind, ErrorKind::Generation);
        assert!(status_text(&harness.state, &harness.view_data).contains("model offline"));
    }

    #[test]
    fn preference_shortcuts_are_saved() {
        let mut harness = Harness::new();
        harness.key(KeyCode::Char('t'));
        harness.key(KeyCode::Char('+'));
        harness.key(KeyCode::Char('['));
        harness.key(KeyCode::Char('L'));

        assert_eq!(harness.state.preferences.theme, Theme::Sepia);
        assert_eq!(harness.state.preferences.language, Language::Arabic);
        assert_eq!(
            harness.runtime.saved,
            vec![
                (PrefKey::Theme, "sepia".to_owned()),
                (PrefKey::ArabicFontSize, "4".to_owned()),
                (PrefKey::TranslationFontSize, "2".to_owned()),
                (PrefKey::Language, "ar".to_owned()),
            ]
        );
    }

    #[test]
    fn save_failure_is_reported_in_status() {
        let runtime = TestRuntime {
            fail_save: true,
            ..TestRuntime::default()
        };
        let mut harness = Harness::with_runtime(runtime, ViewData::default());
        harness.key(KeyCode::Char('t'));

        assert_eq!(harness.state.preferences.theme, Theme::Sepia);
        let status = status_text(&harness.state, &harness.view_data);
        assert!(status.starts_with("could not save ui.theme: database is locked"));
    }

    #[test]
    fn settings_overlay_adjusts_selected_preference() {
        let mut harness = Harness::new();
        harness.key(KeyCode::Char('s'));
        assert_eq!(harness.state.overlay, Some(Overlay::Settings));

        harness.key(KeyCode::Char('j'));
        harness.key(KeyCode::Char('l'));
        harness.key(KeyCode::Char('l'));
        harness.key(KeyCode::Char('l'));
        assert_eq!(harness.state.preferences.arabic_font_size.get(), 5);
        assert_eq!(harness.runtime.saved.len(), 2);

        let text = render_settings_text(&harness.state, &harness.view_data);
        assert!(text.contains("> arabic size"));
        assert!(text.contains("##### 5"));

        harness.key(KeyCode::Esc);
        assert_eq!(harness.state.overlay, None);
    }

    #[test]
    fn help_overlay_swallows_keys() {
        let mut harness = Harness::new();
        harness.key(KeyCode::Char('?'));
        assert!(harness.view_data.help_visible);
        harness.key(KeyCode::Tab);
        assert_eq!(harness.state.mode, ViewMode::Search);
        harness.key(KeyCode::Esc);
        assert!(!harness.view_data.help_visible);

        let help = help_overlay_text();
        for needle in ["ctrl+q", "drag left/right", "L language", "c commentary"] {
            assert!(help.contains(needle), "help should mention {needle}");
        }
    }

    #[test]
    fn status_clear_ignores_stale_token() {
        let mut harness = Harness::new();
        emit_status(&mut harness.view_data, &harness.tx, "first");
        emit_status(&mut harness.view_data, &harness.tx, "second");

        harness
            .tx
            .send(InternalEvent::ClearStatus { token: 1 })
            .expect("send clear");
        harness.pump();
        assert_eq!(harness.view_data.status_line.as_deref(), Some("second"));

        harness
            .tx
            .send(InternalEvent::ClearStatus { token: 2 })
            .expect("send clear");
        harness.pump();
        assert!(harness.view_data.status_line.is_none());
    }

    #[test]
    fn render_draws_every_view_without_panicking() -> Result<()> {
        let mut harness = Harness::new();
        let mut terminal = Terminal::new(TestBackend::new(100, 30))?;
        terminal.draw(|frame| render(frame, &harness.state, &harness.view_data))?;

        harness.open_first_surah();
        harness.runtime.search.push_text("An overview.");
        harness.key(KeyCode::Char('o'));
        harness.key(KeyCode::Char('?'));
        terminal.draw(|frame| render(frame, &harness.state, &harness.view_data))?;
        Ok(())
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(60, 50, area);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 20);
        assert!(popup.x >= area.x && popup.right() <= area.right());
        assert!(popup.y >= area.y && popup.bottom() <= area.bottom());
    }
}
