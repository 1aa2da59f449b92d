// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod demo;
pub mod validation;

use anyhow::{Context, Result, anyhow, bail};
use pishkhan_app::{
    EntityKind, Location, Record, RecordId, RecordSource, SelectionCell, TabKind,
};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub use validation::{RawId, StoredRecord, normalize_records};

pub const APP_NAME: &str = "pishkhan";
pub const SELECTED_WORKSPACE_KEY: &str = "selected-workspace-id";

const LOCATION_KEY_PREFIX: &str = "location:";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[("documents", &["key", "value", "updated_at"])];

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        }
        Ok(())
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM documents WHERE key = ?",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("read document {key}"))
    }

    pub fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO documents (key, value, updated_at)
                VALUES (?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET
                  value = excluded.value,
                  updated_at = excluded.updated_at
                ",
                params![key, value, now],
            )
            .with_context(|| format!("upsert document {key}"))?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM documents WHERE key = ?", params![key])
            .with_context(|| format!("delete document {key}"))?;
        Ok(changed > 0)
    }

    /// Reads a whole JSON document. Documents are always replaced as a unit.
    pub fn get_document<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(None);
        };
        let value = serde_json::from_str(&raw).with_context(|| {
            format!("document `{key}` is not valid JSON for its shape; remove it or run `pishkhan --check`")
        })?;
        Ok(Some(value))
    }

    pub fn put_document<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw =
            serde_json::to_string(value).with_context(|| format!("encode document {key}"))?;
        self.put_raw(key, &raw)
    }

    pub fn load_records(&self, kind: EntityKind) -> Result<Vec<Record>> {
        let stored: Vec<StoredRecord> = self
            .get_document(kind.storage_key())?
            .unwrap_or_default();
        normalize_records(kind, stored)
            .with_context(|| format!("load {} from `{}`", kind.as_str(), kind.storage_key()))
    }

    pub fn save_records(&self, kind: EntityKind, records: &[Record]) -> Result<()> {
        let mut stored = Vec::with_capacity(records.len());
        for record in records {
            if record.kind != kind {
                bail!(
                    "{} {} cannot be saved under `{}`",
                    record.kind.as_str(),
                    record.id,
                    kind.storage_key()
                );
            }
            stored.push(StoredRecord::from_record(record)?);
        }
        self.put_document(kind.storage_key(), &stored)?;
        tracing::debug!(
            target: "pishkhan::store",
            kind = kind.as_str(),
            count = records.len(),
            "records saved"
        );
        Ok(())
    }

    pub fn selected_workspace(&self) -> Result<Option<RecordId>> {
        let Some(raw) = self.get_raw(SELECTED_WORKSPACE_KEY)? else {
            return Ok(None);
        };
        let value = raw.trim().parse::<i64>().map_err(|_| {
            anyhow!(
                "`{SELECTED_WORKSPACE_KEY}` holds {raw:?}, which is not a workspace id; pick a workspace again"
            )
        })?;
        Ok(Some(RecordId::new(value)))
    }

    pub fn set_selected_workspace(&self, id: RecordId) -> Result<()> {
        self.put_raw(SELECTED_WORKSPACE_KEY, &id.to_string())
    }

    pub fn clear_selected_workspace(&self) -> Result<()> {
        self.remove(SELECTED_WORKSPACE_KEY)?;
        Ok(())
    }

    /// Last location of a list view, including its `page` parameter.
    pub fn location(&self, tab: TabKind) -> Result<Option<Location>> {
        let raw = self.get_raw(&location_key(tab))?;
        Ok(raw.map(|value| Location::parse(&value)))
    }

    pub fn set_location(&self, tab: TabKind, location: &Location) -> Result<()> {
        self.put_raw(&location_key(tab), &location.to_string())
    }

    /// Writes the demo collections that are not stored yet. Returns how many
    /// collections were written.
    pub fn seed_demo_data(&self) -> Result<usize> {
        let mut seeded = 0;
        for kind in EntityKind::ALL {
            if self.get_raw(kind.storage_key())?.is_some() {
                continue;
            }
            self.save_records(kind, &demo::records(kind))?;
            seeded += 1;
        }
        tracing::info!(target: "pishkhan::store", seeded, "demo data seeded");
        Ok(seeded)
    }
}

impl RecordSource for Store {
    fn get_all(&self, kind: EntityKind) -> Result<Vec<Record>> {
        self.load_records(kind)
    }
}

impl SelectionCell for Store {
    fn selected_workspace(&self) -> Result<Option<RecordId>> {
        Store::selected_workspace(self)
    }

    fn set_selected_workspace(&self, id: RecordId) -> Result<()> {
        Store::set_selected_workspace(self, id)
    }

    fn clear_selected_workspace(&self) -> Result<()> {
        Store::clear_selected_workspace(self)
    }
}

fn location_key(tab: TabKind) -> String {
    format!("{LOCATION_KEY_PREFIX}{}", tab.route())
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("PISHKHAN_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set PISHKHAN_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("pishkhan.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        let columns = table_columns(conn, table)?;
        if columns.is_empty() {
            bail!(
                "database is missing required table `{table}`; point [storage].db_path at a pishkhan database"
            );
        }

        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();
        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; move the file aside to start fresh",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}
