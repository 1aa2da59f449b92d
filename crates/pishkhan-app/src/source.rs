// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::{EngineError, EntityKind, Record, RecordId};

/// The full, materialized collection for an entity kind. No filtering or
/// paging is delegated to the source.
pub trait RecordSource {
    fn get_all(&self, kind: EntityKind) -> Result<Vec<Record>>;
}

/// Process-wide "selected workspace" cell, injected into the views that
/// need it.
pub trait SelectionCell {
    fn selected_workspace(&self) -> Result<Option<RecordId>>;
    fn set_selected_workspace(&self, id: RecordId) -> Result<()>;
    fn clear_selected_workspace(&self) -> Result<()>;
}

/// Looks up the selected workspace, treating a dangling id as `NotFound`.
/// Returns `Ok(None)` when nothing is selected.
pub fn resolve_selected_workspace<S>(source: &S) -> Result<Option<Record>>
where
    S: RecordSource + SelectionCell,
{
    let Some(id) = source.selected_workspace()? else {
        return Ok(None);
    };
    let workspace = source
        .get_all(EntityKind::Workspace)?
        .into_iter()
        .find(|record| record.id == id)
        .ok_or(EngineError::NotFound {
            kind: EntityKind::Workspace,
            id,
        })?;
    Ok(Some(workspace))
}

/// Records of `kind` that belong to `workspace`.
pub fn records_in_workspace(records: Vec<Record>, workspace: RecordId) -> Vec<Record> {
    records
        .into_iter()
        .filter(|record| record.workspace_id == Some(workspace))
        .collect()
}
