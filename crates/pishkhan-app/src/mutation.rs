// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Optimistic changes to a page-owned record collection.
//!
//! A change is applied to the collection as soon as it is requested, then
//! either committed or rolled back once the confirmation step settles.
//! Deletes keep the whole record and its position; updates keep only the
//! prior values of the fields they touch.

use std::collections::BTreeMap;

use crate::{EngineError, EngineResult, EntityKind, MutationId, Record, RecordId, RecordStatus};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<RecordStatus>,
}

impl RecordPatch {
    pub fn status(status: RecordStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.status.is_none()
    }

    fn normalized(mut self) -> EngineResult<Self> {
        if let Some(name) = self.name.as_mut() {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(EngineError::Validation { field: "name" });
            }
            *name = trimmed.to_owned();
        }
        Ok(self)
    }

    /// Writes the patch into `record` and returns the values it replaced.
    fn apply_to(&self, record: &mut Record) -> Self {
        let mut prior = Self::default();
        if let Some(name) = &self.name {
            prior.name = Some(std::mem::replace(&mut record.name, name.clone()));
        }
        if let Some(description) = &self.description {
            prior.description = Some(std::mem::replace(
                &mut record.description,
                description.clone(),
            ));
        }
        if let Some(tags) = &self.tags {
            prior.tags = Some(std::mem::replace(&mut record.tags, tags.clone()));
        }
        if let Some(status) = self.status {
            prior.status = Some(std::mem::replace(&mut record.status, status));
        }
        prior
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOp {
    Delete,
    ToggleStatus,
    Update(RecordPatch),
}

impl MutationOp {
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::Delete)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::ToggleStatus => "toggle_status",
            Self::Update(_) => "update",
        }
    }
}

/// Outcome of the blocking confirmation prompt shown before a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    AppliedLocally,
    Committed,
    RolledBack,
}

/// What the confirmation step is asked to make durable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRequest {
    pub id: MutationId,
    pub kind: EntityKind,
    pub record_id: RecordId,
    pub op: MutationOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Committed(MutationRequest),
    RolledBack {
        request: MutationRequest,
        error: EngineError,
    },
    /// The mutation was already settled or abandoned.
    Unknown(MutationId),
}

impl Settlement {
    pub fn phase(&self) -> Option<MutationPhase> {
        match self {
            Self::Committed(_) => Some(MutationPhase::Committed),
            Self::RolledBack { .. } => Some(MutationPhase::RolledBack),
            Self::Unknown(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Snapshot {
    /// `preceding` lists the ids that came before the record, nearest
    /// first, so a rollback can find a neighbour that is still present.
    Removed {
        record: Box<Record>,
        preceding: Vec<RecordId>,
    },
    Fields(RecordPatch),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InFlight {
    request: MutationRequest,
    snapshot: Snapshot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticMutations {
    kind: EntityKind,
    next_id: i64,
    in_flight: BTreeMap<MutationId, InFlight>,
}

impl OptimisticMutations {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            next_id: 1,
            in_flight: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn is_in_flight(&self, record_id: RecordId) -> bool {
        self.in_flight
            .values()
            .any(|entry| entry.request.record_id == record_id)
    }

    pub fn pending_count(&self) -> usize {
        self.in_flight.len()
    }

    /// `AppliedLocally` while `id` awaits settlement; settled outcomes are
    /// reported once, by `settle`.
    pub fn phase(&self, id: MutationId) -> Option<MutationPhase> {
        self.in_flight
            .contains_key(&id)
            .then_some(MutationPhase::AppliedLocally)
    }

    /// Applies `op` to `records` right away and returns the request the
    /// confirmation step must settle. Nothing changes when this errors.
    pub fn request(
        &mut self,
        records: &mut Vec<Record>,
        record_id: RecordId,
        op: MutationOp,
        confirmation: Confirmation,
    ) -> EngineResult<MutationRequest> {
        if op.is_destructive() && confirmation != Confirmation::Confirmed {
            return Err(EngineError::Unconfirmed);
        }
        if self.is_in_flight(record_id) {
            return Err(EngineError::Busy(record_id));
        }
        let op = match op {
            MutationOp::Update(patch) => MutationOp::Update(patch.normalized()?),
            other => other,
        };
        let index = records
            .iter()
            .position(|record| record.id == record_id)
            .ok_or(EngineError::NotFound {
                kind: self.kind,
                id: record_id,
            })?;

        let snapshot = match &op {
            MutationOp::Delete => {
                let preceding = records[..index]
                    .iter()
                    .rev()
                    .map(|record| record.id)
                    .collect();
                let record = records.remove(index);
                Snapshot::Removed {
                    record: Box::new(record),
                    preceding,
                }
            }
            MutationOp::ToggleStatus => {
                let next = records[index].status.toggled();
                Snapshot::Fields(RecordPatch::status(next).apply_to(&mut records[index]))
            }
            MutationOp::Update(patch) => Snapshot::Fields(patch.apply_to(&mut records[index])),
        };

        let id = MutationId::new(self.next_id);
        self.next_id += 1;
        let request = MutationRequest {
            id,
            kind: self.kind,
            record_id,
            op,
        };
        tracing::debug!(
            target: "pishkhan::mutation",
            mutation = %id,
            record = %record_id,
            kind = self.kind.as_str(),
            op = request.op.as_str(),
            "applied locally"
        );
        self.in_flight.insert(
            id,
            InFlight {
                request: request.clone(),
                snapshot,
            },
        );
        Ok(request)
    }

    /// Settles a pending mutation. A failed confirmation restores the
    /// snapshot into `records`.
    pub fn settle(
        &mut self,
        records: &mut Vec<Record>,
        id: MutationId,
        outcome: Result<(), String>,
    ) -> Settlement {
        let Some(entry) = self.in_flight.remove(&id) else {
            return Settlement::Unknown(id);
        };

        match outcome {
            Ok(()) => {
                tracing::info!(
                    target: "pishkhan::mutation",
                    mutation = %id,
                    record = %entry.request.record_id,
                    op = entry.request.op.as_str(),
                    "committed"
                );
                Settlement::Committed(entry.request)
            }
            Err(reason) => {
                restore(records, entry.request.record_id, entry.snapshot);
                tracing::warn!(
                    target: "pishkhan::mutation",
                    mutation = %id,
                    record = %entry.request.record_id,
                    op = entry.request.op.as_str(),
                    reason = %reason,
                    "rolled back"
                );
                Settlement::RolledBack {
                    request: entry.request,
                    error: EngineError::Transport(reason),
                }
            }
        }
    }

    /// Forgets every pending mutation, e.g. when the owning view unmounts.
    /// Later settlements for them report `Unknown`.
    pub fn abandon_all(&mut self) -> usize {
        let count = self.in_flight.len();
        self.in_flight.clear();
        count
    }
}

/// Carries one committed change from a page's collection into the stored
/// collection. Records with changes still in flight keep their stored
/// values.
pub fn apply_committed(
    mut stored: Vec<Record>,
    request: &MutationRequest,
    view: &[Record],
) -> Vec<Record> {
    match request.op {
        MutationOp::Delete => stored.retain(|record| record.id != request.record_id),
        MutationOp::ToggleStatus | MutationOp::Update(_) => {
            let updated = view.iter().find(|record| record.id == request.record_id);
            let slot = stored
                .iter_mut()
                .find(|record| record.id == request.record_id);
            if let (Some(updated), Some(slot)) = (updated, slot) {
                *slot = updated.clone();
            }
        }
    }
    stored
}

fn restore(records: &mut Vec<Record>, record_id: RecordId, snapshot: Snapshot) {
    match snapshot {
        Snapshot::Removed { record, preceding } => {
            // Other deletes may still be in flight, so the nearest original
            // predecessor can be missing. With none left, the record leads.
            let position = preceding
                .iter()
                .find_map(|prev| records.iter().position(|candidate| candidate.id == *prev))
                .map_or(0, |found| found + 1);
            records.insert(position, *record);
        }
        Snapshot::Fields(prior) => {
            if let Some(record) = records.iter_mut().find(|record| record.id == record_id) {
                prior.apply_to(record);
            }
        }
    }
}
