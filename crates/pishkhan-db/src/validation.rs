// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Stored record shape and its normalization into [`Record`].
//!
//! Collections are written by older builds and by hand, so the stored shape is
//! lenient: ids may be numbers or numeric strings, optional fields may be
//! missing, and timestamps may be RFC 3339 or plain dates.

use anyhow::{Context, Result, anyhow, bail};
use pishkhan_app::{EntityKind, MemberRole, Plan, Record, RecordId, RecordStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Int(i64),
    Text(String),
}

impl RawId {
    pub fn parse(&self) -> Result<RecordId> {
        let value = match self {
            Self::Int(value) => *value,
            Self::Text(value) => value
                .trim()
                .parse::<i64>()
                .map_err(|_| anyhow!("id {value:?} is not an integer"))?,
        };
        if value <= 0 {
            bail!("id {value} must be positive");
        }
        Ok(RecordId::new(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RawId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<RawId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default)]
    pub project_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl StoredRecord {
    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            id: RawId::Int(record.id.get()),
            kind: Some(record.kind.as_str().to_owned()),
            workspace_id: record.workspace_id.map(|id| RawId::Int(id.get())),
            name: record.name.clone(),
            description: record.description.clone(),
            tags: record.tags.clone(),
            status: Some(record.status.as_str().to_owned()),
            plan: record.plan.map(|plan| plan.as_str().to_owned()),
            role: record.role.map(|role| role.as_str().to_owned()),
            provider: record.provider.clone(),
            member_count: record.member_count,
            project_count: record.project_count,
            created_at: Some(format_datetime(record.created_at)?),
            updated_at: Some(format_datetime(record.updated_at)?),
        })
    }

    /// Validates one stored entry of a `kind` collection.
    pub fn normalize(self, kind: EntityKind) -> Result<Record> {
        let id = self.id.parse()?;

        if let Some(raw_kind) = self.kind.as_deref() {
            let stored = EntityKind::parse(raw_kind)
                .ok_or_else(|| anyhow!("record {id} has unknown kind {raw_kind:?}"))?;
            if stored != kind {
                bail!(
                    "record {id} is a {} but is stored with the {}",
                    stored.as_str(),
                    kind.storage_key()
                );
            }
        }

        let name = self.name.trim().to_owned();
        if name.is_empty() {
            bail!("{} {id} has a blank name", kind.as_str());
        }

        let workspace_id = self
            .workspace_id
            .as_ref()
            .map(RawId::parse)
            .transpose()
            .with_context(|| format!("{} {id} workspace_id", kind.as_str()))?;
        if kind != EntityKind::Workspace && workspace_id.is_none() {
            bail!("{} {id} has no workspace_id", kind.as_str());
        }

        let status = match self.status.as_deref() {
            None => RecordStatus::Active,
            Some(raw) => RecordStatus::parse(raw)
                .ok_or_else(|| anyhow!("{} {id} has unknown status {raw:?}", kind.as_str()))?,
        };
        let plan = self
            .plan
            .as_deref()
            .map(|raw| {
                Plan::parse(raw)
                    .ok_or_else(|| anyhow!("{} {id} has unknown plan {raw:?}", kind.as_str()))
            })
            .transpose()?;
        let role = self
            .role
            .as_deref()
            .map(|raw| {
                MemberRole::parse(raw)
                    .ok_or_else(|| anyhow!("{} {id} has unknown role {raw:?}", kind.as_str()))
            })
            .transpose()?;
        let provider = self
            .provider
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let created_at = match self.created_at.as_deref() {
            Some(raw) => parse_datetime(raw)
                .with_context(|| format!("{} {id} created_at", kind.as_str()))?,
            None => OffsetDateTime::UNIX_EPOCH,
        };
        let updated_at = match self.updated_at.as_deref() {
            Some(raw) => parse_datetime(raw)
                .with_context(|| format!("{} {id} updated_at", kind.as_str()))?,
            None => created_at,
        };

        Ok(Record {
            id,
            kind,
            workspace_id: if kind == EntityKind::Workspace {
                None
            } else {
                workspace_id
            },
            name,
            description: self.description.trim().to_owned(),
            tags: self
                .tags
                .into_iter()
                .map(|tag| tag.trim().to_owned())
                .filter(|tag| !tag.is_empty())
                .collect(),
            status,
            plan,
            role,
            provider,
            member_count: self.member_count,
            project_count: self.project_count,
            created_at,
            updated_at,
        })
    }
}

/// Normalizes a whole collection, rejecting duplicate ids. Order is kept.
pub fn normalize_records(kind: EntityKind, stored: Vec<StoredRecord>) -> Result<Vec<Record>> {
    let mut seen = BTreeSet::new();
    let mut records = Vec::with_capacity(stored.len());
    for (position, entry) in stored.into_iter().enumerate() {
        let record = entry
            .normalize(kind)
            .with_context(|| format!("entry {position} of `{}`", kind.storage_key()))?;
        if !seen.insert(record.id) {
            bail!(
                "`{}` lists {} {} twice",
                kind.storage_key(),
                kind.as_str(),
                record.id
            );
        }
        records.push(record);
    }
    Ok(records)
}

pub fn format_datetime(value: OffsetDateTime) -> Result<String> {
    value.format(&Rfc3339).context("format timestamp")
}

pub fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }

    if let Ok(date) = Date::parse(raw, &format_description!("[year]-[month]-[day]")) {
        return Ok(date.midnight().assume_utc());
    }

    Err(anyhow!(
        "timestamp {raw:?} is neither RFC 3339 nor YYYY-MM-DD"
    ))
}

#[cfg(test)]
mod tests {
    use super::{RawId, StoredRecord, normalize_records, parse_datetime};
    use anyhow::Result;
    use pishkhan_app::{EntityKind, Plan, RecordId, RecordStatus};
    use time::macros::datetime;

    fn stored(json: &str) -> Result<Vec<StoredRecord>> {
        Ok(serde_json::from_str(json)?)
    }

    #[test]
    fn string_and_integer_ids_are_accepted() -> Result<()> {
        assert_eq!(RawId::Int(7).parse()?, RecordId::new(7));
        assert_eq!(RawId::Text(" 12 ".to_owned()).parse()?, RecordId::new(12));
        RawId::Text("abc".to_owned())
            .parse()
            .expect_err("non-numeric id should fail");
        RawId::Int(0).parse().expect_err("zero id should fail");
        Ok(())
    }

    #[test]
    fn missing_optional_fields_get_defaults() -> Result<()> {
        let records = normalize_records(
            EntityKind::Workspace,
            stored(r#"[{"id": "3", "name": " گروه ", "plan": "pro"}]"#)?,
        )?;
        let record = &records[0];
        assert_eq!(record.id, RecordId::new(3));
        assert_eq!(record.name, "گروه");
        assert_eq!(record.status, RecordStatus::Active);
        assert_eq!(record.plan, Some(Plan::Pro));
        assert!(record.tags.is_empty());
        assert_eq!(record.updated_at, record.created_at);
        Ok(())
    }

    #[test]
    fn wrong_kind_and_unknown_enums_are_rejected() -> Result<()> {
        let err = normalize_records(
            EntityKind::Project,
            stored(r#"[{"id": 1, "kind": "workspace", "name": "x"}]"#)?,
        )
        .expect_err("kind mismatch should fail");
        assert!(format!("{err:#}").contains("stored with the projects"));

        let err = normalize_records(
            EntityKind::Workspace,
            stored(r#"[{"id": 1, "name": "x", "plan": "gold"}]"#)?,
        )
        .expect_err("unknown plan should fail");
        assert!(format!("{err:#}").contains("unknown plan"));
        Ok(())
    }

    #[test]
    fn projects_require_an_owner() -> Result<()> {
        normalize_records(
            EntityKind::Project,
            stored(r#"[{"id": 1, "name": "x"}]"#)?,
        )
        .expect_err("project without workspace_id should fail");
        Ok(())
    }

    #[test]
    fn duplicate_ids_are_rejected() -> Result<()> {
        let err = normalize_records(
            EntityKind::Workspace,
            stored(r#"[{"id": 1, "name": "a"}, {"id": "1", "name": "b"}]"#)?,
        )
        .expect_err("duplicate id should fail");
        assert!(format!("{err:#}").contains("twice"));
        Ok(())
    }

    #[test]
    fn blank_names_are_rejected() -> Result<()> {
        normalize_records(
            EntityKind::Workspace,
            stored(r#"[{"id": 1, "name": "   "}]"#)?,
        )
        .expect_err("blank name should fail");
        Ok(())
    }

    #[test]
    fn timestamps_accept_dates_and_rfc3339() -> Result<()> {
        assert_eq!(
            parse_datetime("2026-03-01")?,
            datetime!(2026-03-01 00:00 UTC)
        );
        assert_eq!(
            parse_datetime("2026-03-01T10:30:00+03:30")?,
            datetime!(2026-03-01 10:30 +03:30)
        );
        parse_datetime("1404/12/10").expect_err("jalali dates are not parsed");
        Ok(())
    }
}
