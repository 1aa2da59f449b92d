// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use pishkhan_app::{EntityKind, MemberRole, Plan, Record, RecordId, RecordStatus};
use std::path::PathBuf;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

const NAME_STEMS: [&str; 12] = [
    "آرمان", "بهار", "پویا", "تیرگان", "جهان", "دماوند", "راه", "زاگرس", "سپیدار", "فردا",
    "مهر", "نیلوفر",
];

const NAME_SUFFIXES: [&str; 6] = ["تک", "سیستم", "داده", "گستر", "افزار", "پرداز"];

const DESCRIPTIONS: [&str; 6] = [
    "خدمات ابری",
    "فروش آنلاین",
    "تحلیل داده",
    "پشتیبانی مشتریان",
    "طراحی محصول",
    "زیرساخت شبکه",
];

const TAGS: [&str; 8] = ["وب", "موبایل", "مالی", "داده", "طراحی", "شبکه", "پژوهش", "بازاریابی"];

const PROVIDERS: [&str; 6] = ["zarinpal", "idpay", "kavenegar", "arvan", "github", "slack"];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator of realistic records. Ids are assigned sequentially per
/// faker so generated collections never collide.
#[derive(Debug, Clone)]
pub struct RecordFaker {
    rng: DeterministicRng,
    next_id: i64,
}

impl RecordFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 1,
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn workspace(&mut self) -> Record {
        let id = self.take_id();
        let name = self.name();
        let mut record = workspace(id, &name);
        record.description = (*self.pick(&DESCRIPTIONS)).to_owned();
        record.tags = self.tags();
        record.plan = Some(*self.pick(&Plan::ALL));
        record.role = Some(*self.pick(&MemberRole::ALL));
        record.member_count = self.int_n(50) as u32 + 1;
        record
    }

    pub fn project(&mut self, workspace_id: RecordId) -> Record {
        let id = self.take_id();
        let name = self.name();
        let mut record = project(id, workspace_id.get(), &name);
        record.description = (*self.pick(&DESCRIPTIONS)).to_owned();
        record.tags = self.tags();
        record.status = *self.pick(&RecordStatus::ALL);
        record
    }

    pub fn integration(&mut self, workspace_id: RecordId) -> Record {
        let id = self.take_id();
        let provider = self.pick(&PROVIDERS);
        let name = format!("{} {}", provider, self.int_n(100));
        let mut record = integration(id, workspace_id.get(), &name, provider);
        record.description = (*self.pick(&DESCRIPTIONS)).to_owned();
        record.status = *self.pick(&RecordStatus::ALL);
        record
    }

    /// `count` records of `kind`; children belong to workspace 1.
    pub fn collection(&mut self, kind: EntityKind, count: usize) -> Vec<Record> {
        let owner = RecordId::new(1);
        (0..count)
            .map(|_| match kind {
                EntityKind::Workspace => self.workspace(),
                EntityKind::Project => self.project(owner),
                EntityKind::Integration => self.integration(owner),
            })
            .collect()
    }

    fn take_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn name(&mut self) -> String {
        let stem = self.pick(&NAME_STEMS);
        let suffix = self.pick(&NAME_SUFFIXES);
        format!("{stem} {suffix}")
    }

    fn tags(&mut self) -> Vec<String> {
        let count = self.int_n(3);
        let mut tags: Vec<String> = Vec::with_capacity(count);
        for _ in 0..count {
            let tag = self.pick(&TAGS);
            if !tags.iter().any(|existing| existing == tag) {
                tags.push((*tag).to_owned());
            }
        }
        tags
    }

    fn pick<'a, T>(&mut self, values: &'a [T]) -> &'a T {
        &values[self.rng.int_n(values.len())]
    }
}

fn base(id: i64, kind: EntityKind, workspace_id: Option<i64>, name: &str) -> Record {
    let created_at = fixture_datetime() + Duration::minutes(id);
    Record {
        id: RecordId::new(id),
        kind,
        workspace_id: workspace_id.map(RecordId::new),
        name: name.to_owned(),
        description: String::new(),
        tags: Vec::new(),
        status: RecordStatus::Active,
        plan: None,
        role: None,
        provider: None,
        member_count: 0,
        project_count: 0,
        created_at,
        updated_at: created_at,
    }
}

pub fn workspace(id: i64, name: &str) -> Record {
    Record {
        plan: Some(Plan::Free),
        role: Some(MemberRole::Owner),
        member_count: 1,
        ..base(id, EntityKind::Workspace, None, name)
    }
}

pub fn project(id: i64, workspace_id: i64, name: &str) -> Record {
    base(id, EntityKind::Project, Some(workspace_id), name)
}

pub fn integration(id: i64, workspace_id: i64, name: &str, provider: &str) -> Record {
    Record {
        provider: Some(provider.to_owned()),
        ..base(id, EntityKind::Integration, Some(workspace_id), name)
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("pishkhan.db");
    Ok((dir, db_path))
}

pub fn fixture_datetime() -> OffsetDateTime {
    datetime!(2026-02-19 12:34:56 UTC)
}

pub fn providers() -> &'static [&'static str] {
    &PROVIDERS
}
