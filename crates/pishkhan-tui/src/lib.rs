// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use pishkhan_app::{
    ALL, AppCommand, AppEvent, AppMode, AppState, Breakpoints, CarouselCommand, CarouselEntry,
    CarouselOutcome, CarouselSelector, Confirmation, EngineError, EntityKind, Field, GridLayout,
    ListEvent, ListPresentation, ListView, Location, MemberRole, MutationOp, MutationRequest,
    Plan, Record, RecordId, RecordSource, RecordStatus, Screen, SelectionCell, Settlement,
    TabKind, ViewportClassifier, ViewportSubscription, WorkspaceFormField, WorkspaceFormInput,
    apply_committed, next_record_id, page_window, records_in_workspace,
    resolve_selected_workspace,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::OffsetDateTime;

const APP_TITLE: &str = "پیشخوان";
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const CARD_HEIGHT: u16 = 6;
const PAGE_WINDOW: usize = 7;
const PERSIAN_DIGITS: [char; 10] = ['۰', '۱', '۲', '۳', '۴', '۵', '۶', '۷', '۸', '۹'];

/// Everything the terminal front end needs from storage and the simulated
/// backend. Reads go through [`RecordSource`] and [`SelectionCell`].
pub trait AppRuntime: RecordSource + SelectionCell {
    fn save_records(&mut self, kind: EntityKind, records: &[Record]) -> Result<()>;
    fn load_location(&mut self, tab: TabKind) -> Result<Option<Location>>;
    fn save_location(&mut self, tab: TabKind, location: &Location) -> Result<()>;
    /// Confirms a change already applied on screen. `Err` carries the
    /// rejection reason.
    fn confirm_mutation(&mut self, request: &MutationRequest) -> std::result::Result<(), String>;
    fn mutation_latency(&self) -> Duration;
    fn selection_delay(&self) -> Duration;
    fn grid_layout(&self) -> GridLayout;
    fn breakpoints(&self) -> Breakpoints;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    MutationDue { view: u64, request: MutationRequest },
    SelectionComplete { token: u64, workspace: RecordId },
}

/// Set when the view that scheduled a deferred send goes away.
#[derive(Debug, Clone, Default)]
struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FormUiState {
    input: WorkspaceFormInput,
    field: WorkspaceFormField,
}

impl Default for FormUiState {
    fn default() -> Self {
        Self {
            input: WorkspaceFormInput::default(),
            field: WorkspaceFormField::Name,
        }
    }
}

#[derive(Debug)]
struct MountedList {
    view: ListView,
    scope: Option<Record>,
    cursor: usize,
    pending_delete: Option<RecordId>,
    subscription: ViewportSubscription,
    cancel: CancelFlag,
    token: u64,
}

#[derive(Debug)]
struct ViewData {
    viewport: ViewportClassifier,
    picker: Option<CarouselSelector>,
    form: Option<FormUiState>,
    list: Option<MountedList>,
    status_token: u64,
    view_token: u64,
    selection_token: u64,
}

impl ViewData {
    fn new(width: u32, height: u32, breakpoints: Breakpoints) -> Self {
        Self {
            viewport: ViewportClassifier::new(width, height, breakpoints),
            picker: None,
            form: None,
            list: None,
            status_token: 0,
            view_token: 0,
            selection_token: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListCommand {
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
    GoToPage(usize),
    MoveCursor(isize),
    MoveRow(isize),
    CycleCategory(usize),
    ClearFilters,
}

enum MountOutcome {
    Mounted,
    Redirect(String),
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let (width, height) = terminal::size().context("read terminal size")?;
    let mut view_data = ViewData::new(
        u32::from(width),
        u32::from(height),
        runtime.breakpoints(),
    );
    let (internal_tx, internal_rx) = mpsc::channel();
    sync_screen(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);
        poll_viewport(state, runtime, &mut view_data, &internal_tx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(width, height) => {
                    view_data
                        .viewport
                        .resize(u32::from(width), u32::from(height));
                }
                _ => {}
            }
        }
    }

    unmount_list(&mut view_data);
    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        handle_internal_event(state, runtime, view_data, tx, event);
    }
}

fn handle_internal_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    event: InternalEvent,
) {
    match event {
        InternalEvent::ClearStatus { token } if token == view_data.status_token => {
            state.dispatch(AppCommand::ClearStatus);
        }
        InternalEvent::ClearStatus { .. } => {}
        InternalEvent::MutationDue { view, request } => {
            settle_mutation(state, runtime, view_data, tx, view, request);
        }
        InternalEvent::SelectionComplete { token, workspace }
            if token == view_data.selection_token && state.screen == Screen::WorkspacePicker =>
        {
            navigate(
                state,
                runtime,
                view_data,
                tx,
                AppCommand::WorkspaceChosen(workspace),
            );
        }
        InternalEvent::SelectionComplete { .. } => {}
    }
}

fn schedule(
    tx: &Sender<InternalEvent>,
    delay: Duration,
    cancel: Option<CancelFlag>,
    event: InternalEvent,
) {
    let sender = tx.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        if cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
            return;
        }
        let _ = sender.send(event);
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
    schedule(
        internal_tx,
        STATUS_CLEAR_AFTER,
        None,
        InternalEvent::ClearStatus {
            token: view_data.status_token,
        },
    );
}

fn navigate<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::ScreenChanged(_)))
    {
        sync_screen(state, runtime, view_data, tx);
    }
}

/// Mounts whatever the current screen needs and tears down the rest.
fn sync_screen<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    match state.screen {
        Screen::WorkspacePicker => {
            unmount_list(view_data);
            view_data.form = None;
            if let Err(error) = open_picker(runtime, view_data) {
                emit_status(
                    state,
                    view_data,
                    tx,
                    format!("بارگذاری فضاهای کاری ناموفق بود: {error:#}"),
                );
            }
        }
        Screen::CreateWorkspace => {
            unmount_list(view_data);
            view_data.picker = None;
            view_data.form = Some(FormUiState::default());
        }
        Screen::List(tab) => {
            view_data.picker = None;
            view_data.form = None;
            match mount_list(runtime, view_data, tab) {
                Ok(MountOutcome::Mounted) => {}
                Ok(MountOutcome::Redirect(message)) => {
                    state.selected_workspace =
                        runtime.selected_workspace().unwrap_or_else(|error| {
                            tracing::warn!(
                                target: "pishkhan::tui",
                                error = %error,
                                "ignoring unreadable selection"
                            );
                            None
                        });
                    state.dispatch(AppCommand::OpenPicker);
                    sync_screen(state, runtime, view_data, tx);
                    emit_status(state, view_data, tx, message);
                }
                Err(error) => {
                    emit_status(
                        state,
                        view_data,
                        tx,
                        format!("بارگذاری {} ناموفق بود: {error:#}", tab.label()),
                    );
                }
            }
        }
    }
}

fn open_picker<R: AppRuntime>(runtime: &mut R, view_data: &mut ViewData) -> Result<()> {
    let workspaces = runtime.get_all(EntityKind::Workspace)?;
    let preferred = runtime.selected_workspace().unwrap_or_else(|error| {
        tracing::warn!(target: "pishkhan::tui", error = %error, "ignoring unreadable selection");
        None
    });
    view_data.selection_token = view_data.selection_token.saturating_add(1);
    view_data.picker = Some(CarouselSelector::new(&workspaces, preferred));
    Ok(())
}

fn mount_list<R: AppRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    tab: TabKind,
) -> Result<MountOutcome> {
    unmount_list(view_data);

    let scope = if tab.entity() == EntityKind::Workspace {
        None
    } else {
        match resolve_selected_workspace(&*runtime) {
            Ok(Some(workspace)) => Some(workspace),
            Ok(None) => {
                return Ok(MountOutcome::Redirect(
                    "ابتدا یک فضای کاری انتخاب کنید".to_owned(),
                ));
            }
            Err(error) => {
                let Some(not_found) = error
                    .downcast_ref::<EngineError>()
                    .filter(|engine| matches!(engine, EngineError::NotFound { .. }))
                else {
                    return Err(error);
                };
                let notice = not_found.notice();
                tracing::warn!(target: "pishkhan::tui", error = %not_found, "selected workspace is gone");
                runtime.clear_selected_workspace()?;
                return Ok(MountOutcome::Redirect(notice));
            }
        }
    };

    let mut records = runtime.get_all(tab.entity())?;
    if let Some(workspace) = &scope {
        records = records_in_workspace(records, workspace.id);
    }
    let stored = runtime
        .load_location(tab)?
        .unwrap_or_else(|| Location::new(tab.route()));
    let view = ListView::new(
        tab,
        records,
        &stored,
        runtime.grid_layout(),
        &view_data.viewport.facts(),
    );
    if view.location() != &stored {
        runtime.save_location(tab, view.location())?;
    }

    view_data.view_token = view_data.view_token.saturating_add(1);
    view_data.list = Some(MountedList {
        view,
        scope,
        cursor: 0,
        pending_delete: None,
        subscription: view_data.viewport.subscribe(),
        cancel: CancelFlag::default(),
        token: view_data.view_token,
    });
    Ok(MountOutcome::Mounted)
}

fn unmount_list(view_data: &mut ViewData) {
    let Some(mut list) = view_data.list.take() else {
        return;
    };
    list.cancel.cancel();
    let abandoned = list.view.unmount();
    if abandoned > 0 {
        tracing::debug!(
            target: "pishkhan::tui",
            tab = list.view.tab().route(),
            abandoned,
            "list unmounted with pending changes"
        );
    }
}

fn poll_viewport<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let Some(list) = view_data.list.as_mut() else {
        return;
    };
    let (facts, changed) = list.subscription.poll();
    if !changed {
        return;
    }
    let events = list.view.on_viewport(&facts);
    if let Err(error) = apply_list_events(runtime, list, events) {
        emit_status(state, view_data, tx, format!("ذخیره صفحه ناموفق بود: {error:#}"));
    }
}

fn apply_list_events<R: AppRuntime>(
    runtime: &mut R,
    list: &mut MountedList,
    events: Vec<ListEvent>,
) -> Result<()> {
    for event in events {
        match event {
            ListEvent::LocationChanged(location) => {
                runtime.save_location(list.view.tab(), &location)?;
            }
            ListEvent::ScrollToTop => list.cursor = 0,
            ListEvent::PageSizeChanged(_) => {}
        }
    }
    clamp_cursor(list);
    Ok(())
}

fn clamp_cursor(list: &mut MountedList) {
    let shown = list.view.presentation().page_records.len();
    list.cursor = list.cursor.min(shown.saturating_sub(1));
}

fn focused_record(list: &MountedList) -> Option<RecordId> {
    list.view
        .presentation()
        .page_records
        .get(list.cursor)
        .map(|record| record.id)
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
    {
        return true;
    }

    match state.screen {
        Screen::WorkspacePicker => handle_picker_key(state, runtime, view_data, internal_tx, key),
        Screen::CreateWorkspace => {
            handle_form_key(state, runtime, view_data, internal_tx, key);
            false
        }
        Screen::List(_) => handle_list_key(state, runtime, view_data, internal_tx, key),
    }
}

fn carousel_command_for_key(key: KeyEvent) -> Option<CarouselCommand> {
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => Some(CarouselCommand::Previous),
        KeyCode::Right | KeyCode::Char('l') => Some(CarouselCommand::Next),
        KeyCode::Enter | KeyCode::Char(' ') => Some(CarouselCommand::Commit),
        KeyCode::Char(ch) => digit_value(ch).map(CarouselCommand::DirectSelect),
        _ => None,
    }
}

fn handle_picker_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Tab => {
            navigate(
                state,
                runtime,
                view_data,
                tx,
                AppCommand::OpenTab(TabKind::Workspaces),
            );
            return false;
        }
        _ => {}
    }

    let Some(command) = carousel_command_for_key(key) else {
        return false;
    };
    let Some(carousel) = view_data.picker.as_mut() else {
        return false;
    };
    match carousel.apply(command) {
        CarouselOutcome::CreateNew => {
            navigate(state, runtime, view_data, tx, AppCommand::OpenCreateWorkspace);
        }
        CarouselOutcome::Selected { workspace, .. } => {
            let name = carousel.current_entry().title().to_owned();
            choose_workspace(state, runtime, view_data, tx, workspace, &name);
        }
        CarouselOutcome::Moved(_) | CarouselOutcome::Ignored => {}
    }
    false
}

/// Persists the choice right away and navigates once the selection delay
/// has passed, so the selected card can be shown first.
fn choose_workspace<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    workspace: RecordId,
    name: &str,
) {
    let message = match runtime.set_selected_workspace(workspace) {
        Ok(()) => {
            view_data.selection_token = view_data.selection_token.saturating_add(1);
            schedule(
                tx,
                runtime.selection_delay(),
                None,
                InternalEvent::SelectionComplete {
                    token: view_data.selection_token,
                    workspace,
                },
            );
            format!("فضای کاری «{name}» انتخاب شد")
        }
        Err(error) => {
            if let Err(reload) = open_picker(runtime, view_data) {
                tracing::warn!(target: "pishkhan::tui", error = %reload, "picker reload failed");
            }
            format!("ذخیره انتخاب ناموفق بود: {error:#}")
        }
    };
    emit_status(state, view_data, tx, message);
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            navigate(state, runtime, view_data, tx, AppCommand::OpenPicker);
            return;
        }
        KeyCode::Enter => {
            submit_workspace_form(state, runtime, view_data, tx);
            return;
        }
        _ => {}
    }

    let Some(form) = view_data.form.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Tab | KeyCode::Down => form.field = form.field.rotate(1),
        KeyCode::BackTab | KeyCode::Up => form.field = form.field.rotate(-1),
        KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
            if form.field == WorkspaceFormField::Plan =>
        {
            form.input.cycle_plan();
        }
        KeyCode::Backspace => {
            if let Some(text) = form.input.text_mut(form.field) {
                text.pop();
            }
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(text) = form.input.text_mut(form.field) {
                text.push(ch);
            }
        }
        _ => {}
    }
}

fn submit_workspace_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let Some(form) = view_data.form.as_ref() else {
        return;
    };
    match create_workspace(runtime, form.input.clone()) {
        Ok(record) => {
            emit_status(
                state,
                view_data,
                tx,
                format!("فضای کاری «{}» ساخته شد", record.name),
            );
            navigate(
                state,
                runtime,
                view_data,
                tx,
                AppCommand::WorkspaceChosen(record.id),
            );
        }
        Err(error) => {
            let message = match error.downcast_ref::<EngineError>() {
                Some(engine) => engine.notice(),
                None => format!("ساخت فضای کاری ناموفق بود: {error:#}"),
            };
            emit_status(state, view_data, tx, message);
        }
    }
}

fn create_workspace<R: AppRuntime>(runtime: &mut R, input: WorkspaceFormInput) -> Result<Record> {
    let mut workspaces = runtime.get_all(EntityKind::Workspace)?;
    let record = input.into_record(next_record_id(&workspaces), OffsetDateTime::now_utc())?;
    workspaces.push(record.clone());
    runtime.save_records(EntityKind::Workspace, &workspaces)?;
    runtime.set_selected_workspace(record.id)?;
    tracing::info!(target: "pishkhan::tui", workspace = %record.id, "workspace created");
    Ok(record)
}

fn handle_list_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match state.mode {
        AppMode::Confirm => {
            handle_confirm_key(state, runtime, view_data, tx, key);
            return false;
        }
        AppMode::Search => {
            handle_search_key(state, runtime, view_data, tx, key);
            return false;
        }
        AppMode::Nav => {}
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
        (KeyCode::Tab, _) => navigate(state, runtime, view_data, tx, AppCommand::NextTab),
        (KeyCode::BackTab, _) => navigate(state, runtime, view_data, tx, AppCommand::PrevTab),
        (KeyCode::Char('w'), KeyModifiers::NONE) => {
            navigate(state, runtime, view_data, tx, AppCommand::OpenPicker);
        }
        (KeyCode::Char('/'), _) => {
            state.dispatch(AppCommand::EnterSearch);
        }
        (KeyCode::Char('d'), KeyModifiers::NONE) | (KeyCode::Delete, _) => {
            open_delete_confirm(state, view_data, tx);
        }
        (KeyCode::Char('t'), KeyModifiers::NONE) => {
            if let Some(id) = view_data.list.as_ref().and_then(focused_record) {
                request_change(
                    state,
                    runtime,
                    view_data,
                    tx,
                    id,
                    MutationOp::ToggleStatus,
                    Confirmation::Skipped,
                );
            }
        }
        _ => {
            let Some(command) = list_command_for_key(key) else {
                return false;
            };
            let Some(list) = view_data.list.as_mut() else {
                return false;
            };
            match apply_list_command(runtime, list, command) {
                Ok(Some(message)) => emit_status(state, view_data, tx, message),
                Ok(None) => {}
                Err(error) => {
                    emit_status(state, view_data, tx, format!("ذخیره صفحه ناموفق بود: {error:#}"));
                }
            }
        }
    }
    false
}

fn list_command_for_key(key: KeyEvent) -> Option<ListCommand> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('n'), KeyModifiers::NONE) | (KeyCode::PageDown, _) => {
            Some(ListCommand::NextPage)
        }
        (KeyCode::Char('p'), KeyModifiers::NONE) | (KeyCode::PageUp, _) => {
            Some(ListCommand::PreviousPage)
        }
        (KeyCode::Char('g'), _) | (KeyCode::Home, _) => Some(ListCommand::FirstPage),
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => Some(ListCommand::LastPage),
        // Cards flow right to left.
        (KeyCode::Left, _) => Some(ListCommand::MoveCursor(1)),
        (KeyCode::Right, _) => Some(ListCommand::MoveCursor(-1)),
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(ListCommand::MoveRow(1)),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(ListCommand::MoveRow(-1)),
        (KeyCode::Char('f'), KeyModifiers::NONE) => Some(ListCommand::CycleCategory(0)),
        (KeyCode::Char('F'), _) => Some(ListCommand::CycleCategory(1)),
        (KeyCode::Char('x'), _) => Some(ListCommand::ClearFilters),
        (KeyCode::Char(ch), _) => digit_value(ch)
            .filter(|page| *page > 0)
            .map(ListCommand::GoToPage),
        _ => None,
    }
}

fn apply_list_command<R: AppRuntime>(
    runtime: &mut R,
    list: &mut MountedList,
    command: ListCommand,
) -> Result<Option<String>> {
    let mut message = None;
    let events = match command {
        ListCommand::NextPage => list.view.next_page(),
        ListCommand::PreviousPage => list.view.previous_page(),
        ListCommand::FirstPage => list.view.set_page(1),
        ListCommand::LastPage => {
            let last = list.view.total_pages();
            list.view.set_page(last)
        }
        ListCommand::GoToPage(page) => list.view.set_page(page),
        ListCommand::MoveCursor(delta) => {
            move_cursor(list, delta);
            Vec::new()
        }
        ListCommand::MoveRow(delta) => {
            let per_row = list.view.presentation().per_row as isize;
            move_cursor(list, delta * per_row);
            Vec::new()
        }
        ListCommand::CycleCategory(slot) => {
            let Some(field) = list.view.engine().category_fields().get(slot).copied() else {
                return Ok(None);
            };
            let (value, events) = list.view.cycle_category(field);
            message = Some(format!("{}: {}", field.label(), category_label(field, &value)));
            events
        }
        ListCommand::ClearFilters => {
            message = Some("فیلترها پاک شد".to_owned());
            list.view.clear_filters()
        }
    };
    apply_list_events(runtime, list, events)?;
    Ok(message)
}

fn move_cursor(list: &mut MountedList, delta: isize) {
    let shown = list.view.presentation().page_records.len();
    if shown == 0 {
        list.cursor = 0;
        return;
    }
    let next = (list.cursor as isize + delta).clamp(0, shown as isize - 1);
    list.cursor = next as usize;
}

fn handle_search_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
        state.dispatch(AppCommand::ExitToNav);
        return;
    }
    let Some(list) = view_data.list.as_mut() else {
        return;
    };
    let events = match key.code {
        KeyCode::Backspace => list.view.pop_search_char(),
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            list.view.push_search_char(ch)
        }
        _ => return,
    };
    if let Err(error) = apply_list_events(runtime, list, events) {
        emit_status(state, view_data, tx, format!("ذخیره صفحه ناموفق بود: {error:#}"));
    }
}

fn open_delete_confirm(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let Some(list) = view_data.list.as_mut() else {
        return;
    };
    match focused_record(list) {
        Some(id) => {
            list.pending_delete = Some(id);
            state.dispatch(AppCommand::OpenConfirm);
        }
        None => emit_status(state, view_data, tx, "موردی برای حذف انتخاب نشده است"),
    }
}

fn handle_confirm_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let confirmation = match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Confirmation::Confirmed,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Confirmation::Skipped,
        _ => return,
    };
    state.dispatch(AppCommand::ExitToNav);
    let Some(id) = view_data
        .list
        .as_mut()
        .and_then(|list| list.pending_delete.take())
    else {
        return;
    };
    if confirmation == Confirmation::Skipped {
        emit_status(state, view_data, tx, "لغو شد");
        return;
    }
    request_change(
        state,
        runtime,
        view_data,
        tx,
        id,
        MutationOp::Delete,
        confirmation,
    );
}

fn request_change<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    record_id: RecordId,
    op: MutationOp,
    confirmation: Confirmation,
) {
    let Some(list) = view_data.list.as_mut() else {
        return;
    };
    let message = match list.view.request_mutation(record_id, op, confirmation) {
        Ok((request, events)) => {
            if let Err(error) = apply_list_events(runtime, list, events) {
                tracing::warn!(
                    target: "pishkhan::tui",
                    error = %error,
                    "saving page location failed"
                );
            }
            schedule(
                tx,
                runtime.mutation_latency(),
                Some(list.cancel.clone()),
                InternalEvent::MutationDue {
                    view: list.token,
                    request,
                },
            );
            clamp_cursor(list);
            "در حال ذخیره…".to_owned()
        }
        Err(error) => error.notice(),
    };
    emit_status(state, view_data, tx, message);
}

fn settle_mutation<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    view: u64,
    request: MutationRequest,
) {
    let Some(list) = view_data.list.as_mut() else {
        return;
    };
    if list.token != view || list.cancel.is_cancelled() {
        tracing::debug!(
            target: "pishkhan::tui",
            mutation = %request.id,
            "dropping confirmation for an unmounted view"
        );
        return;
    }

    let outcome = runtime.confirm_mutation(&request);
    let (settlement, events) = list.view.settle(request.id, outcome);
    let mut message = match apply_list_events(runtime, list, events) {
        Ok(()) => None,
        Err(error) => Some(format!("ذخیره صفحه ناموفق بود: {error:#}")),
    };
    match settlement {
        Settlement::Committed(committed) => match persist_commit(runtime, list, &committed) {
            Ok(()) => {
                if committed.kind == EntityKind::Workspace
                    && committed.op.is_destructive()
                    && state.selected_workspace == Some(committed.record_id)
                {
                    state.selected_workspace = None;
                }
                message.get_or_insert_with(|| "تغییرات ذخیره شد".to_owned());
            }
            Err(error) => message = Some(format!("ذخیره تغییرات ناموفق بود: {error:#}")),
        },
        Settlement::RolledBack { error, .. } => message = Some(error.notice()),
        Settlement::Unknown(_) => {}
    }
    if let Some(message) = message {
        emit_status(state, view_data, tx, message);
    }
}

fn persist_commit<R: AppRuntime>(
    runtime: &mut R,
    list: &MountedList,
    request: &MutationRequest,
) -> Result<()> {
    let stored = runtime.get_all(request.kind)?;
    let updated = apply_committed(stored, request, list.view.records());
    runtime.save_records(request.kind, &updated)?;
    if request.kind == EntityKind::Workspace
        && request.op.is_destructive()
        && runtime.selected_workspace()? == Some(request.record_id)
    {
        runtime.clear_selected_workspace()?;
    }
    Ok(())
}

fn digit_value(ch: char) -> Option<usize> {
    if let Some(value) = ch.to_digit(10) {
        return Some(value as usize);
    }
    PERSIAN_DIGITS.iter().position(|digit| *digit == ch)
}

fn persian_number(value: usize) -> String {
    value
        .to_string()
        .chars()
        .map(|ch| {
            ch.to_digit(10)
                .map_or(ch, |digit| PERSIAN_DIGITS[digit as usize])
        })
        .collect()
}

fn category_label(field: Field, value: &str) -> String {
    if value == ALL {
        return "همه".to_owned();
    }
    let label = match field {
        Field::Status => RecordStatus::parse(value).map(RecordStatus::label),
        Field::Plan => Plan::parse(value).map(Plan::label),
        Field::Role => MemberRole::parse(value).map(MemberRole::label),
        Field::Name | Field::Description | Field::Tags | Field::Provider => None,
    };
    label.map_or_else(|| value.to_owned(), str::to_owned)
}

fn mode_label(mode: AppMode) -> &'static str {
    match mode {
        AppMode::Nav => "مرور",
        AppMode::Search => "جستجو",
        AppMode::Confirm => "تأیید",
    }
}

fn key_hints(state: &AppState) -> &'static str {
    match (state.screen, state.mode) {
        (Screen::WorkspacePicker, _) => "←/→ جابجایی | Enter انتخاب | Tab همه فضاها | q خروج",
        (Screen::CreateWorkspace, _) => "Tab فیلد بعد | Enter ثبت | Esc بازگشت",
        (Screen::List(_), AppMode::Search) => "Enter/Esc پایان جستجو",
        (Screen::List(_), AppMode::Confirm) => "y تأیید | n انصراف",
        (Screen::List(_), AppMode::Nav) => {
            "/ جستجو | f/F فیلتر | x پاک‌کردن | n/p صفحه | d حذف | t وضعیت | w فضاها | q خروج"
        }
    }
}

fn status_text(state: &AppState) -> String {
    let mode = mode_label(state.mode);
    let hints = key_hints(state);
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn card_lines(record: &Record, in_flight: bool) -> Vec<String> {
    let mut lines = Vec::new();
    if !record.description.is_empty() {
        lines.push(record.description.clone());
    }
    if !record.tags.is_empty() {
        lines.push(format!("برچسب‌ها: {}", record.tags.join("، ")));
    }
    let mut status = format!("وضعیت: {}", record.status.label());
    if in_flight {
        status.push_str(" ⏳");
    }
    lines.push(status);
    match record.kind {
        EntityKind::Workspace => {
            let plan = record.plan.map_or("-", Plan::label);
            let role = record.role.map_or("-", MemberRole::label);
            lines.push(format!(
                "طرح: {plan} | نقش: {role} | اعضا: {}",
                persian_number(record.member_count as usize)
            ));
        }
        EntityKind::Project => {}
        EntityKind::Integration => {
            if let Some(provider) = &record.provider {
                lines.push(format!("سرویس‌دهنده: {provider}"));
            }
        }
    }
    lines
}

fn filter_summary_text(list: &MountedList, presentation: &ListPresentation<'_>) -> String {
    let filter = list.view.filter();
    let mut parts = Vec::new();
    if !filter.search_term.is_empty() {
        parts.push(format!("جستجو: «{}»", filter.search_term));
    }
    for field in list.view.engine().category_fields() {
        parts.push(format!(
            "{}: {}",
            field.label(),
            category_label(*field, filter.category(*field))
        ));
    }
    parts.push(format!(
        "{} مورد",
        persian_number(presentation.total_matches)
    ));
    parts.join(" | ")
}

fn page_controls_text(presentation: &ListPresentation<'_>) -> Option<String> {
    if !presentation.show_controls {
        return None;
    }
    let pages = page_window(
        presentation.current_page,
        presentation.total_pages,
        PAGE_WINDOW,
    )
    .into_iter()
    .map(|page| {
        if page == presentation.current_page {
            format!("[{}]", persian_number(page))
        } else {
            persian_number(page)
        }
    })
    .collect::<Vec<_>>()
    .join(" ");
    Some(format!(
        "صفحه {pages} از {}",
        persian_number(presentation.total_pages)
    ))
}

fn render_picker_text(carousel: &CarouselSelector) -> String {
    let mut lines = vec!["فضای کاری خود را انتخاب کنید".to_owned(), String::new()];
    let entry = carousel.current_entry();
    lines.push(format!("‹ {} ›", entry.title()));
    match entry {
        CarouselEntry::CreateNew => {
            lines.push("برای ساخت فضای کاری جدید Enter را بزنید".to_owned());
        }
        CarouselEntry::Workspace {
            plan, member_count, ..
        } => {
            lines.push(format!(
                "طرح: {} | اعضا: {}",
                plan.map_or("-", Plan::label),
                persian_number(*member_count as usize)
            ));
        }
    }
    lines.push(String::new());
    lines.push(
        carousel
            .dots()
            .iter()
            .map(|focused| if *focused { "●" } else { "○" })
            .collect::<Vec<_>>()
            .join(" "),
    );
    if carousel.is_selected() {
        lines.push("در حال ورود…".to_owned());
    }
    lines.join("\n")
}

fn render_form_text(form: &FormUiState) -> String {
    WorkspaceFormField::ALL
        .iter()
        .map(|field| {
            let marker = if *field == form.field { "▸" } else { " " };
            let value = match field {
                WorkspaceFormField::Name => form.input.name.as_str(),
                WorkspaceFormField::Description => form.input.description.as_str(),
                WorkspaceFormField::Tags => form.input.tags.as_str(),
                WorkspaceFormField::Plan => form.input.plan.label(),
            };
            format!("{marker} {}: {value}", field.label())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn confirm_text(view_data: &ViewData) -> Option<String> {
    let list = view_data.list.as_ref()?;
    let id = list.pending_delete?;
    let record = list.view.records().iter().find(|record| record.id == id)?;
    Some(format!(
        "«{}» حذف شود؟\n\ny تأیید | n انصراف",
        record.name
    ))
}

fn header_title(view_data: &ViewData) -> String {
    match view_data.list.as_ref().and_then(|list| list.scope.as_ref()) {
        Some(workspace) => format!("{APP_TITLE} | {}", workspace.name),
        None => APP_TITLE.to_owned(),
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    match state.screen {
        Screen::List(active) => {
            let selected = TabKind::ALL
                .iter()
                .position(|tab| *tab == active)
                .unwrap_or(0);
            let titles = TabKind::ALL
                .iter()
                .map(|tab| tab.label().to_owned())
                .collect::<Vec<String>>();
            let tabs = Tabs::new(titles)
                .block(
                    Block::default()
                        .title(header_title(view_data))
                        .borders(Borders::ALL),
                )
                .style(Style::default().fg(Color::White))
                .highlight_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
                .select(selected);
            frame.render_widget(tabs, layout[0]);
            render_list(frame, layout[1], view_data);
        }
        Screen::WorkspacePicker => {
            render_title(frame, layout[0], "انتخاب فضای کاری");
            if let Some(carousel) = &view_data.picker {
                let body = Paragraph::new(render_picker_text(carousel))
                    .alignment(Alignment::Center)
                    .block(Block::default().borders(Borders::ALL));
                frame.render_widget(body, layout[1]);
            }
        }
        Screen::CreateWorkspace => {
            render_title(frame, layout[0], "فضای کاری جدید");
            if let Some(form) = &view_data.form {
                let body = Paragraph::new(render_form_text(form))
                    .alignment(Alignment::Right)
                    .block(Block::default().borders(Borders::ALL));
                frame.render_widget(body, layout[1]);
            }
        }
    }

    let status = Paragraph::new(status_text(state))
        .alignment(Alignment::Right)
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if state.mode == AppMode::Confirm
        && let Some(text) = confirm_text(view_data)
    {
        let area = centered_rect(50, 30, frame.area());
        frame.render_widget(Clear, area);
        let modal = Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .title("حذف")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Red)),
        );
        frame.render_widget(modal, area);
    }
}

fn render_title(frame: &mut ratatui::Frame<'_>, area: Rect, subtitle: &str) {
    let title = Paragraph::new(subtitle)
        .alignment(Alignment::Right)
        .block(Block::default().title(APP_TITLE).borders(Borders::ALL));
    frame.render_widget(title, area);
}

fn render_list(frame: &mut ratatui::Frame<'_>, area: Rect, view_data: &ViewData) {
    let Some(list) = &view_data.list else {
        return;
    };
    let presentation = list.view.presentation();
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    let summary =
        Paragraph::new(filter_summary_text(list, &presentation)).alignment(Alignment::Right);
    frame.render_widget(summary, sections[0]);

    if presentation.page_records.is_empty() {
        let empty = Paragraph::new("موردی یافت نشد").alignment(Alignment::Center);
        frame.render_widget(empty, sections[1]);
    } else {
        render_cards(frame, sections[1], list, &presentation);
    }

    if let Some(controls) = page_controls_text(&presentation) {
        let controls = Paragraph::new(controls).alignment(Alignment::Center);
        frame.render_widget(controls, sections[2]);
    }
}

fn render_cards(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    list: &MountedList,
    presentation: &ListPresentation<'_>,
) {
    let per_row = presentation.per_row.max(1);
    let rows = presentation.page_records.chunks(per_row).collect::<Vec<_>>();
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            rows.iter()
                .map(|_| Constraint::Length(CARD_HEIGHT))
                .collect::<Vec<_>>(),
        )
        .split(area);

    for (row_index, (records, row_area)) in rows.iter().zip(row_areas.iter()).enumerate() {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(
                (0..per_row)
                    .map(|_| Constraint::Ratio(1, per_row as u32))
                    .collect::<Vec<_>>(),
            )
            .split(*row_area);
        for (column, record) in records.iter().enumerate() {
            let index = row_index * per_row + column;
            let focused = index == list.cursor;
            let border = if focused {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let card = Paragraph::new(card_lines(record, list.view.is_in_flight(record.id)).join("\n"))
                .alignment(Alignment::Right)
                .block(
                    Block::default()
                        .title(record.name.clone())
                        .title_alignment(Alignment::Right)
                        .borders(Borders::ALL)
                        .border_style(border),
                );
            // First card sits at the right edge.
            frame.render_widget(card, columns[per_row - 1 - column]);
        }
    }
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
        AppRuntime, InternalEvent, ListCommand, ViewData, carousel_command_for_key, confirm_text,
        digit_value, handle_internal_event, handle_key_event, list_command_for_key,
        page_controls_text, persian_number, poll_viewport, render, status_text, sync_screen,
    };
    use anyhow::Result;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use pishkhan_app::{
        AppMode, AppState, Breakpoints, CarouselCommand, EngineError, EntityKind, Field,
        GridLayout, Location, MutationRequest, Plan, Record, RecordId, RecordSource,
        RecordStatus, Screen, SelectionCell, TabKind,
    };
    use pishkhan_db::demo;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::cell::Cell;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::time::Duration;

    #[derive(Debug)]
    struct TestRuntime {
        collections: BTreeMap<EntityKind, Vec<Record>>,
        selected: Cell<Option<RecordId>>,
        locations: Vec<(TabKind, Location)>,
        rejections: VecDeque<String>,
        confirm_calls: usize,
        unset_selection_fails: bool,
    }

    impl TestRuntime {
        fn demo() -> Self {
            Self {
                collections: EntityKind::ALL
                    .into_iter()
                    .map(|kind| (kind, demo::records(kind)))
                    .collect(),
                selected: Cell::new(None),
                locations: Vec::new(),
                rejections: VecDeque::new(),
                confirm_calls: 0,
                unset_selection_fails: false,
            }
        }

        fn with_selection(id: i64) -> Self {
            let runtime = Self::demo();
            runtime.selected.set(Some(RecordId::new(id)));
            runtime
        }

        fn stored(&self, kind: EntityKind) -> &[Record] {
            self.collections.get(&kind).map(Vec::as_slice).unwrap_or_default()
        }

        fn stored_location(&self, tab: TabKind) -> Option<String> {
            self.locations
                .iter()
                .find(|(saved, _)| *saved == tab)
                .map(|(_, location)| location.to_string())
        }
    }

    impl RecordSource for TestRuntime {
        fn get_all(&self, kind: EntityKind) -> Result<Vec<Record>> {
            Ok(self.stored(kind).to_vec())
        }
    }

    impl SelectionCell for TestRuntime {
        fn selected_workspace(&self) -> Result<Option<RecordId>> {
            let selected = self.selected.get();
            if selected.is_none() && self.unset_selection_fails {
                anyhow::bail!("selection store unavailable");
            }
            Ok(selected)
        }

        fn set_selected_workspace(&self, id: RecordId) -> Result<()> {
            self.selected.set(Some(id));
            Ok(())
        }

        fn clear_selected_workspace(&self) -> Result<()> {
            self.selected.set(None);
            Ok(())
        }
    }

    impl AppRuntime for TestRuntime {
        fn save_records(&mut self, kind: EntityKind, records: &[Record]) -> Result<()> {
            self.collections.insert(kind, records.to_vec());
            Ok(())
        }

        fn load_location(&mut self, tab: TabKind) -> Result<Option<Location>> {
            Ok(self
                .locations
                .iter()
                .find(|(saved, _)| *saved == tab)
                .map(|(_, location)| location.clone()))
        }

        fn save_location(&mut self, tab: TabKind, location: &Location) -> Result<()> {
            self.locations.retain(|(saved, _)| *saved != tab);
            self.locations.push((tab, location.clone()));
            Ok(())
        }

        fn confirm_mutation(&mut self, _request: &MutationRequest) -> Result<(), String> {
            self.confirm_calls += 1;
            match self.rejections.pop_front() {
                Some(reason) => Err(reason),
                None => Ok(()),
            }
        }

        fn mutation_latency(&self) -> Duration {
            Duration::ZERO
        }

        fn selection_delay(&self) -> Duration {
            Duration::ZERO
        }

        fn grid_layout(&self) -> GridLayout {
            GridLayout::CELLS
        }

        fn breakpoints(&self) -> Breakpoints {
            Breakpoints::CELLS
        }
    }

    struct Harness {
        state: AppState,
        runtime: TestRuntime,
        view_data: ViewData,
        tx: Sender<InternalEvent>,
        rx: Receiver<InternalEvent>,
    }

    impl Harness {
        /// 120x20 cells: desktop, three cards per row, six per page.
        fn new(runtime: TestRuntime, screen: Screen) -> Self {
            let (tx, rx) = mpsc::channel();
            let mut harness = Self {
                state: AppState {
                    screen,
                    selected_workspace: runtime.selected.get(),
                    ..AppState::default()
                },
                runtime,
                view_data: ViewData::new(120, 20, Breakpoints::CELLS),
                tx,
                rx,
            };
            sync_screen(
                &mut harness.state,
                &mut harness.runtime,
                &mut harness.view_data,
                &harness.tx,
            );
            harness
        }

        fn press(&mut self, code: KeyCode) -> bool {
            handle_key_event(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                KeyEvent::new(code, KeyModifiers::NONE),
            )
        }

        fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                self.press(KeyCode::Char(ch));
            }
        }

        /// Next deferred event other than a status clear.
        fn next_event(&self) -> InternalEvent {
            loop {
                let event = self
                    .rx
                    .recv_timeout(Duration::from_secs(2))
                    .expect("deferred event should arrive");
                if !matches!(event, InternalEvent::ClearStatus { .. }) {
                    return event;
                }
            }
        }

        fn deliver(&mut self, event: InternalEvent) {
            handle_internal_event(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                event,
            );
        }

        fn settle_next(&mut self) {
            let event = self.next_event();
            self.deliver(event);
        }

        fn picker_index(&self) -> usize {
            self.view_data
                .picker
                .as_ref()
                .expect("picker should be open")
                .current_index()
        }

        fn view_ids(&self) -> Vec<i64> {
            self.view_data
                .list
                .as_ref()
                .expect("list should be mounted")
                .view
                .records()
                .iter()
                .map(|record| record.id.get())
                .collect()
        }

        fn total_matches(&self) -> usize {
            self.view_data
                .list
                .as_ref()
                .expect("list should be mounted")
                .view
                .presentation()
                .total_matches
        }

        fn status(&self) -> &str {
            self.state.status_line.as_deref().unwrap_or_default()
        }
    }

    #[test]
    fn picker_wraps_left_through_create_entry() {
        let mut harness = Harness::new(TestRuntime::demo(), Screen::WorkspacePicker);
        assert_eq!(harness.picker_index(), 1);

        harness.press(KeyCode::Left);
        assert_eq!(harness.picker_index(), 0);
        harness.press(KeyCode::Left);
        assert_eq!(harness.picker_index(), 8);
        harness.press(KeyCode::Right);
        assert_eq!(harness.picker_index(), 0);
    }

    #[test]
    fn picker_focus_starts_on_stored_selection() {
        let harness = Harness::new(TestRuntime::with_selection(4), Screen::WorkspacePicker);
        assert_eq!(harness.picker_index(), 4);
    }

    #[test]
    fn committing_workspace_persists_then_opens_projects() {
        let mut harness = Harness::new(TestRuntime::demo(), Screen::WorkspacePicker);

        harness.press(KeyCode::Enter);
        assert_eq!(harness.runtime.selected.get(), Some(RecordId::new(1)));
        assert_eq!(harness.state.screen, Screen::WorkspacePicker);
        assert!(harness.status().contains("آکمی تک"));

        // Selected carousel ignores further movement.
        harness.press(KeyCode::Left);
        assert_eq!(harness.picker_index(), 1);

        harness.settle_next();
        assert_eq!(harness.state.screen, Screen::List(TabKind::Projects));
        assert_eq!(harness.view_ids(), vec![1, 2, 3, 4, 5, 6, 7]);
        let list = harness.view_data.list.as_ref().expect("projects mounted");
        let presentation = list.view.presentation();
        assert_eq!(presentation.total_pages, 2);
        assert_eq!(presentation.page_records.len(), 6);
        assert_eq!(presentation.per_row, 3);
        assert_eq!(
            harness.runtime.stored_location(TabKind::Projects).as_deref(),
            Some("/projects?page=1")
        );
    }

    #[test]
    fn direct_select_with_persian_digit_moves_focus() {
        let mut harness = Harness::new(TestRuntime::demo(), Screen::WorkspacePicker);
        harness.press(KeyCode::Char('۳'));
        assert_eq!(harness.picker_index(), 3);
        assert_eq!(harness.runtime.selected.get(), None);
    }

    #[test]
    fn create_entry_opens_form_and_requires_name() {
        let mut harness = Harness::new(TestRuntime::demo(), Screen::WorkspacePicker);
        harness.press(KeyCode::Left);
        harness.press(KeyCode::Enter);
        assert_eq!(harness.state.screen, Screen::CreateWorkspace);

        harness.press(KeyCode::Enter);
        assert_eq!(harness.state.screen, Screen::CreateWorkspace);
        assert_eq!(
            harness.status(),
            EngineError::Validation { field: "name" }.notice()
        );

        harness.type_text("تیم نو");
        harness.press(KeyCode::Tab);
        harness.press(KeyCode::Tab);
        harness.press(KeyCode::Tab);
        harness.press(KeyCode::Right);
        harness.press(KeyCode::Enter);

        let created = harness
            .runtime
            .stored(EntityKind::Workspace)
            .last()
            .cloned()
            .expect("workspace created");
        assert_eq!(created.id, RecordId::new(9));
        assert_eq!(created.name, "تیم نو");
        assert_eq!(created.plan, Some(Plan::Pro));
        assert_eq!(harness.runtime.selected.get(), Some(RecordId::new(9)));
        assert_eq!(harness.state.screen, Screen::List(TabKind::Projects));
        assert!(harness.view_ids().is_empty());
    }

    #[test]
    fn escape_leaves_form_without_creating() {
        let mut harness = Harness::new(TestRuntime::demo(), Screen::CreateWorkspace);
        harness.type_text("پیش‌نویس");
        harness.press(KeyCode::Esc);
        assert_eq!(harness.state.screen, Screen::WorkspacePicker);
        assert_eq!(harness.runtime.stored(EntityKind::Workspace).len(), 8);
    }

    #[test]
    fn search_narrows_matches_and_returns_to_first_page() {
        let mut harness = Harness::new(
            TestRuntime::demo(),
            Screen::List(TabKind::Workspaces),
        );
        harness.press(KeyCode::Char('n'));
        assert_eq!(
            harness.runtime.stored_location(TabKind::Workspaces).as_deref(),
            Some("/workspaces?page=2")
        );

        harness.press(KeyCode::Char('/'));
        assert_eq!(harness.state.mode, AppMode::Search);
        harness.type_text("آکمی");
        assert_eq!(harness.total_matches(), 2);
        assert_eq!(
            harness.runtime.stored_location(TabKind::Workspaces).as_deref(),
            Some("/workspaces?page=1")
        );

        harness.press(KeyCode::Esc);
        assert_eq!(harness.state.mode, AppMode::Nav);
        assert_eq!(harness.total_matches(), 2);
    }

    #[test]
    fn stored_page_is_restored_on_mount() {
        let mut runtime = TestRuntime::demo();
        runtime
            .save_location(TabKind::Workspaces, &Location::parse("/workspaces?page=2"))
            .expect("save location");
        let harness = Harness::new(runtime, Screen::List(TabKind::Workspaces));
        let list = harness.view_data.list.as_ref().expect("mounted");
        assert_eq!(list.view.page().current_page, 2);
        assert_eq!(list.view.presentation().page_records.len(), 2);
    }

    #[test]
    fn out_of_range_stored_page_is_clamped_and_rewritten() {
        let mut runtime = TestRuntime::demo();
        runtime
            .save_location(TabKind::Workspaces, &Location::parse("/workspaces?page=9"))
            .expect("save location");
        let harness = Harness::new(runtime, Screen::List(TabKind::Workspaces));
        assert_eq!(
            harness.runtime.stored_location(TabKind::Workspaces).as_deref(),
            Some("/workspaces?page=2")
        );
    }

    #[test]
    fn delete_needs_explicit_confirmation() {
        let mut harness = Harness::new(
            TestRuntime::with_selection(1),
            Screen::List(TabKind::Projects),
        );

        harness.press(KeyCode::Char('d'));
        assert_eq!(harness.state.mode, AppMode::Confirm);
        let prompt = confirm_text(&harness.view_data).expect("confirm prompt");
        assert!(prompt.contains("بازطراحی فروشگاه"));

        harness.press(KeyCode::Char('n'));
        assert_eq!(harness.state.mode, AppMode::Nav);
        assert_eq!(harness.status(), "لغو شد");
        assert_eq!(harness.view_ids().len(), 7);
        let list = harness.view_data.list.as_ref().expect("list mounted");
        assert_eq!(list.pending_delete, None);
        assert!(!list.view.is_in_flight(RecordId::new(1)));

        harness.press(KeyCode::Char('d'));
        harness.press(KeyCode::Char('y'));
        assert_eq!(harness.view_ids(), vec![2, 3, 4, 5, 6, 7]);
        assert_eq!(harness.status(), "در حال ذخیره…");

        harness.settle_next();
        assert_eq!(harness.runtime.confirm_calls, 1);
        assert_eq!(harness.runtime.stored(EntityKind::Project).len(), 13);
        assert_eq!(harness.status(), "تغییرات ذخیره شد");
    }

    #[test]
    fn rejected_delete_restores_record_in_place() {
        let mut runtime = TestRuntime::with_selection(1);
        runtime.rejections.push_back("timeout".to_owned());
        let mut harness = Harness::new(runtime, Screen::List(TabKind::Projects));

        harness.press(KeyCode::Left);
        harness.press(KeyCode::Delete);
        harness.press(KeyCode::Enter);
        assert_eq!(harness.view_ids(), vec![1, 3, 4, 5, 6, 7]);

        harness.settle_next();
        assert_eq!(harness.view_ids(), vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(
            harness.status(),
            EngineError::Transport("timeout".to_owned()).notice()
        );
        assert_eq!(harness.runtime.stored(EntityKind::Project).len(), 14);
    }

    #[test]
    fn toggle_skips_confirmation_and_blocks_overlapping_change() {
        let mut harness = Harness::new(
            TestRuntime::with_selection(1),
            Screen::List(TabKind::Projects),
        );

        harness.press(KeyCode::Char('t'));
        assert_eq!(harness.state.mode, AppMode::Nav);
        let list = harness.view_data.list.as_ref().expect("mounted");
        assert_eq!(list.view.records()[0].status, RecordStatus::Inactive);
        assert!(list.view.is_in_flight(RecordId::new(1)));

        harness.press(KeyCode::Char('t'));
        assert_eq!(harness.status(), EngineError::Busy(RecordId::new(1)).notice());

        harness.settle_next();
        let stored = harness.runtime.stored(EntityKind::Project);
        assert_eq!(stored[0].status, RecordStatus::Inactive);
        assert_eq!(stored[1].status, RecordStatus::Active);
    }

    #[test]
    fn confirmation_for_unmounted_list_is_dropped() {
        let mut harness = Harness::new(
            TestRuntime::with_selection(1),
            Screen::List(TabKind::Projects),
        );
        harness.press(KeyCode::Char('t'));
        let event = harness.next_event();

        harness.press(KeyCode::Char('w'));
        assert_eq!(harness.state.screen, Screen::WorkspacePicker);
        harness.deliver(event);

        assert_eq!(harness.runtime.confirm_calls, 0);
        assert_eq!(
            harness.runtime.stored(EntityKind::Project)[0].status,
            RecordStatus::Active
        );
    }

    #[test]
    fn remounted_list_ignores_confirmation_from_previous_mount() {
        let mut harness = Harness::new(
            TestRuntime::with_selection(1),
            Screen::List(TabKind::Projects),
        );
        harness.press(KeyCode::Char('t'));
        let event = harness.next_event();

        harness.press(KeyCode::Tab);
        harness.press(KeyCode::BackTab);
        assert_eq!(harness.state.screen, Screen::List(TabKind::Projects));
        harness.deliver(event);
        assert_eq!(harness.runtime.confirm_calls, 0);
    }

    #[test]
    fn deleting_selected_workspace_clears_selection() {
        let mut harness = Harness::new(
            TestRuntime::with_selection(1),
            Screen::List(TabKind::Workspaces),
        );
        harness.press(KeyCode::Char('d'));
        harness.press(KeyCode::Char('y'));
        harness.settle_next();

        assert_eq!(harness.runtime.selected.get(), None);
        assert_eq!(harness.state.selected_workspace, None);
        assert_eq!(harness.runtime.stored(EntityKind::Workspace).len(), 7);
    }

    #[test]
    fn dangling_selection_redirects_to_picker() {
        let harness = Harness::new(
            TestRuntime::with_selection(99),
            Screen::List(TabKind::Integrations),
        );
        assert_eq!(harness.state.screen, Screen::WorkspacePicker);
        assert_eq!(harness.runtime.selected.get(), None);
        assert_eq!(
            harness.status(),
            EngineError::NotFound {
                kind: EntityKind::Workspace,
                id: RecordId::new(99),
            }
            .notice()
        );
        assert!(harness.view_data.list.is_none());
    }

    #[test]
    fn redirect_survives_unreadable_selection() {
        let mut runtime = TestRuntime::with_selection(99);
        runtime.unset_selection_fails = true;
        let harness = Harness::new(runtime, Screen::List(TabKind::Projects));

        assert_eq!(harness.state.screen, Screen::WorkspacePicker);
        assert_eq!(harness.state.selected_workspace, None);
        assert!(harness.view_data.picker.is_some());
        assert_eq!(
            harness.status(),
            EngineError::NotFound {
                kind: EntityKind::Workspace,
                id: RecordId::new(99),
            }
            .notice()
        );
    }

    #[test]
    fn missing_selection_redirects_to_picker() {
        let harness = Harness::new(TestRuntime::demo(), Screen::List(TabKind::Projects));
        assert_eq!(harness.state.screen, Screen::WorkspacePicker);
        assert_eq!(harness.status(), "ابتدا یک فضای کاری انتخاب کنید");
    }

    #[test]
    fn workspace_list_needs_no_selection() {
        let harness = Harness::new(TestRuntime::demo(), Screen::List(TabKind::Workspaces));
        assert_eq!(harness.view_ids().len(), 8);
    }

    #[test]
    fn resize_recomputes_page_size_and_unmount_unsubscribes() {
        let mut harness = Harness::new(
            TestRuntime::with_selection(1),
            Screen::List(TabKind::Projects),
        );
        assert_eq!(harness.view_data.viewport.subscriber_count(), 1);

        harness.view_data.viewport.resize(120, 38);
        poll_viewport(
            &mut harness.state,
            &mut harness.runtime,
            &mut harness.view_data,
            &harness.tx,
        );
        let list = harness.view_data.list.as_ref().expect("mounted");
        assert_eq!(list.view.page().page_size, 15);
        assert_eq!(list.view.total_pages(), 1);

        harness.press(KeyCode::Char('w'));
        assert_eq!(harness.view_data.viewport.subscriber_count(), 0);
    }

    #[test]
    fn narrow_terminal_uses_fallback_page_size() {
        let mut harness = Harness::new(
            TestRuntime::demo(),
            Screen::List(TabKind::Workspaces),
        );
        harness.view_data.viewport.resize(50, 60);
        poll_viewport(
            &mut harness.state,
            &mut harness.runtime,
            &mut harness.view_data,
            &harness.tx,
        );
        let list = harness.view_data.list.as_ref().expect("mounted");
        let presentation = list.view.presentation();
        assert_eq!(presentation.page_records.len(), 6);
        assert_eq!(presentation.per_row, 1);
    }

    #[test]
    fn category_cycle_filters_and_announces_value() {
        let mut harness = Harness::new(
            TestRuntime::demo(),
            Screen::List(TabKind::Workspaces),
        );
        harness.press(KeyCode::Char('f'));
        assert_eq!(harness.total_matches(), 3);
        assert_eq!(
            harness.status(),
            format!("{}: {}", Field::Plan.label(), Plan::Pro.label())
        );

        harness.press(KeyCode::Char('x'));
        assert_eq!(harness.total_matches(), 8);
    }

    #[test]
    fn cursor_moves_right_to_left_within_page() {
        let mut harness = Harness::new(
            TestRuntime::demo(),
            Screen::List(TabKind::Workspaces),
        );
        harness.press(KeyCode::Left);
        harness.press(KeyCode::Left);
        harness.press(KeyCode::Down);
        assert_eq!(harness.view_data.list.as_ref().map(|list| list.cursor), Some(5));
        harness.press(KeyCode::Down);
        assert_eq!(harness.view_data.list.as_ref().map(|list| list.cursor), Some(5));
        harness.press(KeyCode::Right);
        assert_eq!(harness.view_data.list.as_ref().map(|list| list.cursor), Some(4));
    }

    #[test]
    fn quit_keys_end_the_loop() {
        let mut harness = Harness::new(TestRuntime::demo(), Screen::WorkspacePicker);
        assert!(harness.press(KeyCode::Char('q')));
        assert!(handle_key_event(
            &mut harness.state,
            &mut harness.runtime,
            &mut harness.view_data,
            &harness.tx,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        ));
    }

    #[test]
    fn list_keys_map_to_commands() {
        let key = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert_eq!(
            list_command_for_key(key(KeyCode::Left)),
            Some(ListCommand::MoveCursor(1))
        );
        assert_eq!(
            list_command_for_key(key(KeyCode::PageDown)),
            Some(ListCommand::NextPage)
        );
        assert_eq!(
            list_command_for_key(key(KeyCode::Char('۳'))),
            Some(ListCommand::GoToPage(3))
        );
        assert_eq!(list_command_for_key(key(KeyCode::Char('0'))), None);
        assert_eq!(
            carousel_command_for_key(key(KeyCode::Char('2'))),
            Some(CarouselCommand::DirectSelect(2))
        );
    }

    #[test]
    fn persian_digits_round_trip_through_helpers() {
        assert_eq!(persian_number(1405), "۱۴۰۵");
        assert_eq!(digit_value('۷'), Some(7));
        assert_eq!(digit_value('x'), None);
    }

    #[test]
    fn page_controls_hidden_for_single_page() {
        let harness = Harness::new(
            TestRuntime::with_selection(3),
            Screen::List(TabKind::Projects),
        );
        let list = harness.view_data.list.as_ref().expect("mounted");
        assert_eq!(page_controls_text(&list.view.presentation()), None);

        let harness = Harness::new(TestRuntime::demo(), Screen::List(TabKind::Workspaces));
        let list = harness.view_data.list.as_ref().expect("mounted");
        assert_eq!(
            page_controls_text(&list.view.presentation()).as_deref(),
            Some("صفحه [۱] ۲ از ۲")
        );
    }

    #[test]
    fn status_text_leads_with_mode() {
        let mut state = AppState::default();
        assert!(status_text(&state).starts_with("مرور | "));
        state.status_line = Some("ذخیره شد".to_owned());
        assert!(status_text(&state).contains("| ذخیره شد |"));
    }

    #[test]
    fn screens_render_headless() -> Result<()> {
        let harness = Harness::new(
            TestRuntime::with_selection(1),
            Screen::List(TabKind::Projects),
        );
        let mut terminal = Terminal::new(TestBackend::new(120, 20))?;
        terminal.draw(|frame| render(frame, &harness.state, &harness.view_data))?;
        let text = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>();
        assert!(text.contains("پیشخوان"));

        let picker = Harness::new(TestRuntime::demo(), Screen::WorkspacePicker);
        terminal.draw(|frame| render(frame, &picker.state, &picker.view_data))?;
        Ok(())
    }
}
