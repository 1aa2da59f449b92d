// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{AppMode, RecordId, Screen, TabKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub screen: Screen,
    pub mode: AppMode,
    pub selected_workspace: Option<RecordId>,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            screen: Screen::WorkspacePicker,
            mode: AppMode::Nav,
            selected_workspace: None,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextTab,
    PrevTab,
    OpenTab(TabKind),
    OpenPicker,
    OpenCreateWorkspace,
    WorkspaceChosen(RecordId),
    EnterSearch,
    OpenConfirm,
    ExitToNav,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ScreenChanged(Screen),
    ModeChanged(AppMode),
    WorkspaceChanged(Option<RecordId>),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn active_tab(&self) -> Option<TabKind> {
        match self.screen {
            Screen::List(tab) => Some(tab),
            Screen::WorkspacePicker | Screen::CreateWorkspace => None,
        }
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextTab => self.rotate_tab(1),
            AppCommand::PrevTab => self.rotate_tab(-1),
            AppCommand::OpenTab(tab) => self.change_screen(Screen::List(tab)),
            AppCommand::OpenPicker => self.change_screen(Screen::WorkspacePicker),
            AppCommand::OpenCreateWorkspace => self.change_screen(Screen::CreateWorkspace),
            AppCommand::WorkspaceChosen(id) => {
                self.selected_workspace = Some(id);
                let mut events = vec![AppEvent::WorkspaceChanged(Some(id))];
                events.extend(self.change_screen(Screen::List(TabKind::Projects)));
                events
            }
            AppCommand::EnterSearch => self.change_mode(AppMode::Search),
            AppCommand::OpenConfirm => self.change_mode(AppMode::Confirm),
            AppCommand::ExitToNav => self.change_mode(AppMode::Nav),
            AppCommand::SetStatus(message) => {
                self.status_line = Some(message.clone());
                vec![AppEvent::StatusUpdated(message)]
            }
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn rotate_tab(&mut self, delta: isize) -> Vec<AppEvent> {
        let Screen::List(active) = self.screen else {
            return Vec::new();
        };
        let tabs = TabKind::ALL;
        let current = tabs.iter().position(|tab| *tab == active).unwrap_or(0) as isize;
        let len = tabs.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.change_screen(Screen::List(tabs[next]))
    }

    fn change_screen(&mut self, screen: Screen) -> Vec<AppEvent> {
        let mut events = Vec::new();
        if self.mode != AppMode::Nav {
            events.extend(self.change_mode(AppMode::Nav));
        }
        self.screen = screen;
        events.push(AppEvent::ScreenChanged(screen));
        events
    }

    fn change_mode(&mut self, mode: AppMode) -> Vec<AppEvent> {
        self.mode = mode;
        vec![AppEvent::ModeChanged(mode)]
    }
}
