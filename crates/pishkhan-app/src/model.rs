// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Workspace,
    Project,
    Integration,
}

impl EntityKind {
    pub const ALL: [Self; 3] = [Self::Workspace, Self::Project, Self::Integration];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::Project => "project",
            Self::Integration => "integration",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "workspace" => Some(Self::Workspace),
            "project" => Some(Self::Project),
            "integration" => Some(Self::Integration),
            _ => None,
        }
    }

    /// Storage key of the whole-document collection for this kind.
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Workspace => "workspaces",
            Self::Project => "projects",
            Self::Integration => "integrations",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Workspace => "فضای کاری",
            Self::Project => "پروژه",
            Self::Integration => "یکپارچه‌سازی",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Active,
    Inactive,
    Archived,
    Error,
}

impl RecordStatus {
    pub const ALL: [Self; 4] = [Self::Active, Self::Inactive, Self::Archived, Self::Error];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Archived => "archived",
            Self::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "archived" => Some(Self::Archived),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "فعال",
            Self::Inactive => "غیرفعال",
            Self::Archived => "بایگانی",
            Self::Error => "خطا",
        }
    }

    /// The status a toggle moves to. Archived and errored records come back as active.
    pub const fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive | Self::Archived | Self::Error => Self::Active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Free,
    Pro,
    Enterprise,
}

impl Plan {
    pub const ALL: [Self; 3] = [Self::Free, Self::Pro, Self::Enterprise];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "free" => Some(Self::Free),
            "pro" => Some(Self::Pro),
            "enterprise" => Some(Self::Enterprise),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Free => "رایگان",
            Self::Pro => "حرفه‌ای",
            Self::Enterprise => "سازمانی",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
}

impl MemberRole {
    pub const ALL: [Self; 3] = [Self::Owner, Self::Admin, Self::Member];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "owner" => Some(Self::Owner),
            "admin" => Some(Self::Admin),
            "member" => Some(Self::Member),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Owner => "مالک",
            Self::Admin => "مدیر",
            Self::Member => "عضو",
        }
    }
}

/// Named record fields the filter engine can search or constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Description,
    Tags,
    Status,
    Plan,
    Role,
    Provider,
}

impl Field {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Tags => "tags",
            Self::Status => "status",
            Self::Plan => "plan",
            Self::Role => "role",
            Self::Provider => "provider",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "نام",
            Self::Description => "توضیحات",
            Self::Tags => "برچسب‌ها",
            Self::Status => "وضعیت",
            Self::Plan => "طرح",
            Self::Role => "نقش",
            Self::Provider => "سرویس‌دهنده",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub kind: EntityKind,
    pub workspace_id: Option<RecordId>,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub status: RecordStatus,
    pub plan: Option<Plan>,
    pub role: Option<MemberRole>,
    pub provider: Option<String>,
    pub member_count: u32,
    pub project_count: u32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Record {
    /// Returns true when any text value of `field` satisfies `predicate`.
    /// Tags are checked one by one so a term never matches across two tags.
    pub fn any_text(&self, field: Field, mut predicate: impl FnMut(&str) -> bool) -> bool {
        match field {
            Field::Name => predicate(&self.name),
            Field::Description => predicate(&self.description),
            Field::Tags => self.tags.iter().any(|tag| predicate(tag)),
            Field::Provider => self.provider.as_deref().is_some_and(predicate),
            Field::Status | Field::Plan | Field::Role => {
                self.category_value(field).is_some_and(predicate)
            }
        }
    }

    /// Canonical value used by exact-match categorical filters.
    pub fn category_value(&self, field: Field) -> Option<&str> {
        match field {
            Field::Status => Some(self.status.as_str()),
            Field::Plan => self.plan.map(Plan::as_str),
            Field::Role => self.role.map(MemberRole::as_str),
            Field::Provider => self.provider.as_deref(),
            Field::Name => Some(self.name.as_str()),
            Field::Description => Some(self.description.as_str()),
            Field::Tags => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabKind {
    Workspaces,
    Projects,
    Integrations,
}

impl TabKind {
    pub const ALL: [Self; 3] = [Self::Workspaces, Self::Projects, Self::Integrations];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Workspaces => "فضاهای کاری",
            Self::Projects => "پروژه‌ها",
            Self::Integrations => "یکپارچه‌سازی‌ها",
        }
    }

    pub const fn entity(self) -> EntityKind {
        match self {
            Self::Workspaces => EntityKind::Workspace,
            Self::Projects => EntityKind::Project,
            Self::Integrations => EntityKind::Integration,
        }
    }

    /// Path component used in the persisted location of this list view.
    pub const fn route(self) -> &'static str {
        match self {
            Self::Workspaces => "/workspaces",
            Self::Projects => "/projects",
            Self::Integrations => "/integrations",
        }
    }

    pub fn from_route(path: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tab| tab.route() == path.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    WorkspacePicker,
    CreateWorkspace,
    List(TabKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppMode {
    Nav,
    Search,
    Confirm,
}
