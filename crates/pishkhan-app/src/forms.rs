// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;

use crate::{EngineError, EngineResult, EntityKind, MemberRole, Plan, Record, RecordId, RecordStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceFormField {
    Name,
    Description,
    Tags,
    Plan,
}

impl WorkspaceFormField {
    pub const ALL: [Self; 4] = [Self::Name, Self::Description, Self::Tags, Self::Plan];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "نام",
            Self::Description => "توضیحات",
            Self::Tags => "برچسب‌ها",
            Self::Plan => "طرح",
        }
    }

    pub fn rotate(self, delta: isize) -> Self {
        let current = Self::ALL.iter().position(|field| *field == self).unwrap_or(0) as isize;
        let len = Self::ALL.len() as isize;
        Self::ALL[(current + delta).rem_euclid(len) as usize]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceFormInput {
    pub name: String,
    pub description: String,
    /// Comma separated; `،` (Arabic comma) is accepted too.
    pub tags: String,
    pub plan: Plan,
}

impl Default for WorkspaceFormInput {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            tags: String::new(),
            plan: Plan::Free,
        }
    }
}

impl WorkspaceFormInput {
    pub fn text_mut(&mut self, field: WorkspaceFormField) -> Option<&mut String> {
        match field {
            WorkspaceFormField::Name => Some(&mut self.name),
            WorkspaceFormField::Description => Some(&mut self.description),
            WorkspaceFormField::Tags => Some(&mut self.tags),
            WorkspaceFormField::Plan => None,
        }
    }

    pub fn cycle_plan(&mut self) {
        let current = Plan::ALL.iter().position(|plan| *plan == self.plan).unwrap_or(0);
        self.plan = Plan::ALL[(current + 1) % Plan::ALL.len()];
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::Validation { field: "name" });
        }
        Ok(())
    }

    pub fn parsed_tags(&self) -> Vec<String> {
        self.tags
            .split([',', '،'])
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Builds the new workspace owned by the current user.
    pub fn into_record(self, id: RecordId, now: OffsetDateTime) -> EngineResult<Record> {
        self.validate()?;
        let tags = self.parsed_tags();
        Ok(Record {
            id,
            kind: EntityKind::Workspace,
            workspace_id: None,
            name: self.name.trim().to_owned(),
            description: self.description.trim().to_owned(),
            tags,
            status: RecordStatus::Active,
            plan: Some(self.plan),
            role: Some(MemberRole::Owner),
            provider: None,
            member_count: 1,
            project_count: 0,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Next free id for a collection.
pub fn next_record_id(records: &[Record]) -> RecordId {
    let max = records.iter().map(|record| record.id.get()).max().unwrap_or(0);
    RecordId::new(max + 1)
}
