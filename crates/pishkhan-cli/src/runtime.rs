// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use pishkhan_app::{
    Breakpoints, EntityKind, GridLayout, Location, MutationRequest, Record, RecordId,
    RecordSource, SelectionCell, TabKind,
};
use pishkhan_db::Store;
use std::time::Duration;

/// How the simulated backend behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Simulation {
    pub latency: Duration,
    pub selection_delay: Duration,
    /// Every Nth confirmation is rejected; 0 never rejects.
    pub fail_every: u64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(800),
            selection_delay: Duration::from_millis(500),
            fail_every: 0,
        }
    }
}

pub struct DbRuntime<'a> {
    store: &'a Store,
    simulation: Simulation,
    layout: GridLayout,
    breakpoints: Breakpoints,
    confirmations: u64,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self::with_settings(
            store,
            Simulation::default(),
            GridLayout::CELLS,
            Breakpoints::CELLS,
        )
    }

    pub fn with_settings(
        store: &'a Store,
        simulation: Simulation,
        layout: GridLayout,
        breakpoints: Breakpoints,
    ) -> Self {
        Self {
            store,
            simulation,
            layout,
            breakpoints,
            confirmations: 0,
        }
    }
}

impl RecordSource for DbRuntime<'_> {
    fn get_all(&self, kind: EntityKind) -> Result<Vec<Record>> {
        self.store.load_records(kind)
    }
}

impl SelectionCell for DbRuntime<'_> {
    fn selected_workspace(&self) -> Result<Option<RecordId>> {
        self.store.selected_workspace()
    }

    fn set_selected_workspace(&self, id: RecordId) -> Result<()> {
        self.store.set_selected_workspace(id)
    }

    fn clear_selected_workspace(&self) -> Result<()> {
        self.store.clear_selected_workspace()
    }
}

impl pishkhan_tui::AppRuntime for DbRuntime<'_> {
    fn save_records(&mut self, kind: EntityKind, records: &[Record]) -> Result<()> {
        self.store.save_records(kind, records)
    }

    fn load_location(&mut self, tab: TabKind) -> Result<Option<Location>> {
        self.store.location(tab)
    }

    fn save_location(&mut self, tab: TabKind, location: &Location) -> Result<()> {
        self.store.set_location(tab, location)
    }

    fn confirm_mutation(&mut self, request: &MutationRequest) -> std::result::Result<(), String> {
        self.confirmations += 1;
        let fail_every = self.simulation.fail_every;
        if fail_every > 0 && self.confirmations % fail_every == 0 {
            tracing::warn!(
                target: "pishkhan::mutation",
                mutation = %request.id,
                attempt = self.confirmations,
                "simulated confirmation failure"
            );
            return Err(format!(
                "simulated failure on confirmation {}",
                self.confirmations
            ));
        }
        Ok(())
    }

    fn mutation_latency(&self) -> Duration {
        self.simulation.latency
    }

    fn selection_delay(&self) -> Duration {
        self.simulation.selection_delay
    }

    fn grid_layout(&self) -> GridLayout {
        self.layout
    }

    fn breakpoints(&self) -> Breakpoints {
        self.breakpoints
    }
}
