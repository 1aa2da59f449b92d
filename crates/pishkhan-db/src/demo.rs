// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Mock data behind `--demo`.

use pishkhan_app::{EntityKind, MemberRole, Plan, Record, RecordId, RecordStatus};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

type WorkspaceRow = (i64, &'static str, &'static str, &'static [&'static str], Plan, MemberRole, u32);
type ProjectRow = (i64, i64, &'static str, &'static str, &'static [&'static str], RecordStatus);
type IntegrationRow = (i64, i64, &'static str, &'static str, &'static str, RecordStatus);

const WORKSPACES: [WorkspaceRow; 8] = [
    (1, "آکمی تک", "فروشگاه آنلاین و پنل فروشندگان", &["فروشگاه", "وب"], Plan::Pro, MemberRole::Owner, 12),
    (2, "استودیو پارس", "طراحی رابط کاربری برای مشتریان", &["طراحی"], Plan::Free, MemberRole::Admin, 4),
    (3, "گروه آکمی", "خدمات مالی و پرداخت", &["مالی", "پرداخت"], Plan::Enterprise, MemberRole::Member, 40),
    (4, "کاروان داده", "تحلیل داده و گزارش‌گیری", &["داده"], Plan::Pro, MemberRole::Owner, 7),
    (5, "نوآوران البرز", "نرم‌افزارهای سازمانی", &["سازمانی"], Plan::Enterprise, MemberRole::Admin, 25),
    (6, "شبکه مهرگان", "زیرساخت شبکه و میزبانی", &["شبکه", "زیرساخت"], Plan::Free, MemberRole::Member, 3),
    (7, "آزمایشگاه سپهر", "پژوهش و توسعه محصول", &["پژوهش"], Plan::Pro, MemberRole::Member, 9),
    (8, "پارسه سیستم", "پشتیبانی فنی مشتریان", &["پشتیبانی"], Plan::Free, MemberRole::Owner, 2),
];

const PROJECTS: [ProjectRow; 14] = [
    (1, 1, "بازطراحی فروشگاه", "صفحه محصول و سبد خرید", &["وب", "طراحی"], RecordStatus::Active),
    (2, 1, "اپلیکیشن موبایل", "نسخه اندروید و iOS", &["موبایل"], RecordStatus::Active),
    (3, 1, "پنل فروشندگان", "گزارش فروش روزانه", &["پنل"], RecordStatus::Inactive),
    (4, 1, "درگاه پرداخت", "اتصال به درگاه بانکی", &["پرداخت"], RecordStatus::Active),
    (5, 1, "سئو", "بهینه‌سازی موتور جستجو", &["بازاریابی"], RecordStatus::Archived),
    (6, 1, "باشگاه مشتریان", "امتیاز و کد تخفیف", &["بازاریابی"], RecordStatus::Active),
    (7, 1, "انبارداری", "همگام‌سازی موجودی", &["انبار"], RecordStatus::Inactive),
    (8, 2, "کتابخانه کامپوننت", "اجزای مشترک طراحی", &["طراحی"], RecordStatus::Active),
    (9, 2, "وب‌سایت استودیو", "نمونه کارها", &["وب"], RecordStatus::Archived),
    (10, 3, "کیف پول", "شارژ و برداشت", &["مالی"], RecordStatus::Active),
    (11, 3, "تطبیق تراکنش", "تسویه روزانه", &["مالی"], RecordStatus::Error),
    (12, 4, "داشبورد فروش", "نمودارهای ماهانه", &["داده"], RecordStatus::Active),
    (13, 5, "سامانه منابع انسانی", "حضور و غیاب", &["سازمانی"], RecordStatus::Active),
    (14, 7, "نمونه اولیه", "آزمایش ایده‌های جدید", &["پژوهش"], RecordStatus::Inactive),
];

const INTEGRATIONS: [IntegrationRow; 9] = [
    (1, 1, "زرین‌پال", "درگاه پرداخت فروشگاه", "zarinpal", RecordStatus::Active),
    (2, 1, "کاوه‌نگار", "پیامک تایید سفارش", "kavenegar", RecordStatus::Active),
    (3, 1, "آروان", "شبکه توزیع محتوا", "arvan", RecordStatus::Inactive),
    (4, 1, "گیت‌هاب", "استقرار خودکار", "github", RecordStatus::Active),
    (5, 1, "اسلک", "اعلان سفارش‌های جدید", "slack", RecordStatus::Error),
    (6, 1, "آیدی‌پی", "درگاه پشتیبان", "idpay", RecordStatus::Inactive),
    (7, 1, "کاوه‌نگار", "پیامک بازاریابی", "kavenegar", RecordStatus::Archived),
    (8, 3, "زرین‌پال", "پرداخت کیف پول", "zarinpal", RecordStatus::Active),
    (9, 4, "گیت‌هاب", "انتشار گزارش‌ها", "github", RecordStatus::Active),
];

const EPOCH: OffsetDateTime = datetime!(2026-01-05 09:00 UTC);

pub fn records(kind: EntityKind) -> Vec<Record> {
    match kind {
        EntityKind::Workspace => workspaces(),
        EntityKind::Project => projects(),
        EntityKind::Integration => integrations(),
    }
}

pub fn workspaces() -> Vec<Record> {
    WORKSPACES
        .iter()
        .map(|&(id, name, description, tags, plan, role, member_count)| {
            let project_count = PROJECTS.iter().filter(|row| row.1 == id).count() as u32;
            Record {
                plan: Some(plan),
                role: Some(role),
                member_count,
                project_count,
                ..base(id, EntityKind::Workspace, None, name, description, tags)
            }
        })
        .collect()
}

pub fn projects() -> Vec<Record> {
    PROJECTS
        .iter()
        .map(|&(id, workspace, name, description, tags, status)| Record {
            status,
            ..base(id, EntityKind::Project, Some(workspace), name, description, tags)
        })
        .collect()
}

pub fn integrations() -> Vec<Record> {
    INTEGRATIONS
        .iter()
        .map(|&(id, workspace, name, description, provider, status)| Record {
            status,
            provider: Some(provider.to_owned()),
            ..base(id, EntityKind::Integration, Some(workspace), name, description, &[])
        })
        .collect()
}

fn base(
    id: i64,
    kind: EntityKind,
    workspace: Option<i64>,
    name: &str,
    description: &str,
    tags: &[&str],
) -> Record {
    let created_at = EPOCH + Duration::days(id);
    Record {
        id: RecordId::new(id),
        kind,
        workspace_id: workspace.map(RecordId::new),
        name: name.to_owned(),
        description: description.to_owned(),
        tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
        status: RecordStatus::Active,
        plan: None,
        role: None,
        provider: None,
        member_count: 0,
        project_count: 0,
        created_at,
        updated_at: created_at + Duration::hours(id),
    }
}
