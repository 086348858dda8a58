// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Nav,
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Grid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub focus: Focus,
    pub load: LoadState,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            focus: Focus::Grid,
            load: LoadState::Loading,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    ToggleFocus,
    StartFilter,
    ExitToNav,
    ReportLoaded,
    ReportFailed(String),
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    FocusChanged(Focus),
    LoadStateChanged(LoadState),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::ToggleFocus => {
                self.focus = match self.focus {
                    Focus::Sidebar => Focus::Grid,
                    Focus::Grid => Focus::Sidebar,
                };
                vec![AppEvent::FocusChanged(self.focus)]
            }
            AppCommand::StartFilter => {
                self.mode = AppMode::Filter;
                self.focus = Focus::Grid;
                vec![
                    AppEvent::ModeChanged(self.mode),
                    AppEvent::FocusChanged(self.focus),
                ]
            }
            AppCommand::ExitToNav => {
                self.mode = AppMode::Nav;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::ReportLoaded => {
                self.load = LoadState::Ready;
                vec![AppEvent::LoadStateChanged(self.load.clone())]
            }
            AppCommand::ReportFailed(message) => {
                self.load = LoadState::Failed(message);
                vec![
                    AppEvent::LoadStateChanged(self.load.clone()),
                    self.set_status("failed to load report"),
                ]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.load == LoadState::Ready
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
