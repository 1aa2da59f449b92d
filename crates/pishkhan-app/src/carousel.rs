// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{EntityKind, Plan, Record, RecordId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarouselEntry {
    CreateNew,
    Workspace {
        id: RecordId,
        name: String,
        plan: Option<Plan>,
        member_count: u32,
    },
}

impl CarouselEntry {
    pub fn title(&self) -> &str {
        match self {
            Self::CreateNew => "ایجاد فضای کاری جدید",
            Self::Workspace { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselState {
    Idle { current: usize },
    Selected { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselCommand {
    Next,
    Previous,
    DirectSelect(usize),
    Commit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselOutcome {
    Moved(usize),
    /// The command was not valid in the current state.
    Ignored,
    /// The sentinel was committed; the caller navigates to the create form.
    CreateNew,
    Selected { index: usize, workspace: RecordId },
}

/// Circular single-focus selection over workspaces, with the "create new"
/// sentinel always at index 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarouselSelector {
    entries: Vec<CarouselEntry>,
    state: CarouselState,
}

impl CarouselSelector {
    /// Focus starts on `preferred` when it is listed, otherwise on the first
    /// workspace, otherwise on the sentinel.
    pub fn new(workspaces: &[Record], preferred: Option<RecordId>) -> Self {
        let mut entries = Vec::with_capacity(workspaces.len() + 1);
        entries.push(CarouselEntry::CreateNew);
        entries.extend(
            workspaces
                .iter()
                .filter(|record| record.kind == EntityKind::Workspace)
                .map(|record| CarouselEntry::Workspace {
                    id: record.id,
                    name: record.name.clone(),
                    plan: record.plan,
                    member_count: record.member_count,
                }),
        );

        let preferred_index = preferred.and_then(|wanted| {
            entries.iter().position(
                |entry| matches!(entry, CarouselEntry::Workspace { id, .. } if *id == wanted),
            )
        });
        let current = preferred_index.unwrap_or(if entries.len() > 1 { 1 } else { 0 });
        Self {
            entries,
            state: CarouselState::Idle { current },
        }
    }

    pub fn entries(&self) -> &[CarouselEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn state(&self) -> CarouselState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        match self.state {
            CarouselState::Idle { current } => current,
            CarouselState::Selected { index } => index,
        }
    }

    pub fn current_entry(&self) -> &CarouselEntry {
        &self.entries[self.current_index()]
    }

    pub fn is_selected(&self) -> bool {
        matches!(self.state, CarouselState::Selected { .. })
    }

    pub fn apply(&mut self, command: CarouselCommand) -> CarouselOutcome {
        match command {
            CarouselCommand::Next => self.rotate(1),
            CarouselCommand::Previous => self.rotate(-1),
            CarouselCommand::DirectSelect(index) => self.direct_select(index),
            CarouselCommand::Commit => self.commit(self.current_index()),
        }
    }

    pub fn next(&mut self) -> CarouselOutcome {
        self.rotate(1)
    }

    pub fn previous(&mut self) -> CarouselOutcome {
        self.rotate(-1)
    }

    /// Moves focus to `index` without choosing it.
    pub fn direct_select(&mut self, index: usize) -> CarouselOutcome {
        match self.state {
            CarouselState::Idle { .. } if index < self.entries.len() => {
                self.state = CarouselState::Idle { current: index };
                CarouselOutcome::Moved(index)
            }
            _ => CarouselOutcome::Ignored,
        }
    }

    /// Commits `index`, which must be the focused entry.
    pub fn commit(&mut self, index: usize) -> CarouselOutcome {
        let CarouselState::Idle { current } = self.state else {
            return CarouselOutcome::Ignored;
        };
        if index != current {
            return CarouselOutcome::Ignored;
        }
        match &self.entries[current] {
            CarouselEntry::CreateNew => CarouselOutcome::CreateNew,
            CarouselEntry::Workspace { id, .. } => {
                let workspace = *id;
                self.state = CarouselState::Selected { index: current };
                tracing::info!(
                    target: "pishkhan::carousel",
                    workspace = %workspace,
                    index = current,
                    "workspace selected"
                );
                CarouselOutcome::Selected {
                    index: current,
                    workspace,
                }
            }
        }
    }

    fn rotate(&mut self, delta: isize) -> CarouselOutcome {
        let CarouselState::Idle { current } = self.state else {
            return CarouselOutcome::Ignored;
        };
        let len = self.entries.len() as isize;
        let next = (current as isize + delta).rem_euclid(len) as usize;
        self.state = CarouselState::Idle { current: next };
        CarouselOutcome::Moved(next)
    }

    /// Position of `index` in the right-to-left dot indicator.
    pub fn visual_index(&self, index: usize) -> usize {
        self.entries.len().saturating_sub(1).saturating_sub(index)
    }

    /// Dot indicator in display order, `true` marking the focused entry.
    pub fn dots(&self) -> Vec<bool> {
        let focused = self.visual_index(self.current_index());
        (0..self.entries.len()).map(|slot| slot == focused).collect()
    }
}
