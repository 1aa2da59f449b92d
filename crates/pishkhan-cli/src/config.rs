// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use pishkhan_app::{Breakpoints, GridLayout};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_LATENCY: &str = "800ms";
const DEFAULT_SELECTION_DELAY: &str = "500ms";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub breakpoints: BreakpointTable,
    #[serde(default)]
    pub simulation: Simulation,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            layout: Layout::default(),
            breakpoints: BreakpointTable::default(),
            simulation: Simulation::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

/// Card grid geometry, in terminal cells.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Layout {
    pub reserved_height: Option<u32>,
    pub row_height: Option<u32>,
    pub columns_when_wide: Option<usize>,
    pub fallback_page_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BreakpointTable {
    pub mobile_below: Option<u32>,
    pub desktop_from: Option<u32>,
    pub large_from: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Simulation {
    pub latency: Option<String>,
    /// Every Nth confirmation fails; 0 never fails.
    pub fail_every: Option<u64>,
    pub selection_delay: Option<String>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            latency: Some(DEFAULT_LATENCY.to_owned()),
            fail_every: Some(0),
            selection_delay: Some(DEFAULT_SELECTION_DELAY.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub path: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            path: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("PISHKHAN_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set PISHKHAN_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(pishkhan_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [storage], [layout], [breakpoints], [simulation], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            pishkhan_db::validate_db_path(db_path)?;
        }

        let layout = &self.layout;
        for (name, value) in [
            ("row_height", layout.row_height.map(|v| v as usize)),
            ("columns_when_wide", layout.columns_when_wide),
            ("fallback_page_size", layout.fallback_page_size),
        ] {
            if value == Some(0) {
                bail!(
                    "layout.{name} in {} must be positive, got 0",
                    path.display()
                );
            }
        }

        let breakpoints = self.breakpoints();
        if !breakpoints.is_ordered() {
            bail!(
                "breakpoints in {} must be strictly increasing (mobile_below < desktop_from < large_from), got {} / {} / {}",
                path.display(),
                breakpoints.mobile_below,
                breakpoints.desktop_from,
                breakpoints.large_from
            );
        }

        if let Some(latency) = &self.simulation.latency {
            parse_duration(latency)
                .with_context(|| format!("simulation.latency in {}", path.display()))?;
        }
        if let Some(delay) = &self.simulation.selection_delay {
            parse_duration(delay)
                .with_context(|| format!("simulation.selection_delay in {}", path.display()))?;
        }

        if let Some(level) = &self.log.level {
            parse_log_level(level)
                .with_context(|| format!("log.level in {}", path.display()))?;
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => pishkhan_db::default_db_path(),
        }
    }

    pub fn grid_layout(&self) -> GridLayout {
        let defaults = GridLayout::CELLS;
        GridLayout {
            reserved_height: self
                .layout
                .reserved_height
                .unwrap_or(defaults.reserved_height),
            row_height: self.layout.row_height.unwrap_or(defaults.row_height),
            columns_when_wide: self
                .layout
                .columns_when_wide
                .unwrap_or(defaults.columns_when_wide),
            fallback_page_size: self
                .layout
                .fallback_page_size
                .unwrap_or(defaults.fallback_page_size),
        }
    }

    pub fn breakpoints(&self) -> Breakpoints {
        let defaults = Breakpoints::CELLS;
        Breakpoints {
            mobile_below: self
                .breakpoints
                .mobile_below
                .unwrap_or(defaults.mobile_below),
            desktop_from: self
                .breakpoints
                .desktop_from
                .unwrap_or(defaults.desktop_from),
            large_from: self.breakpoints.large_from.unwrap_or(defaults.large_from),
        }
    }

    pub fn mutation_latency(&self) -> Result<Duration> {
        parse_duration(
            self.simulation
                .latency
                .as_deref()
                .unwrap_or(DEFAULT_LATENCY),
        )
    }

    pub fn selection_delay(&self) -> Result<Duration> {
        parse_duration(
            self.simulation
                .selection_delay
                .as_deref()
                .unwrap_or(DEFAULT_SELECTION_DELAY),
        )
    }

    pub fn fail_every(&self) -> u64 {
        self.simulation.fail_every.unwrap_or(0)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log.path {
            return Ok(PathBuf::from(path));
        }
        let data_root = dirs::data_local_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].path to a writable log file")
        })?;
        let app_dir = data_root.join(pishkhan_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create data directory {}", app_dir.display()))?;
        Ok(app_dir.join("pishkhan.log"))
    }

    pub fn example_config(path: &Path) -> String {
        let layout = GridLayout::CELLS;
        let breakpoints = Breakpoints::CELLS;
        format!(
            "# pishkhan config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/pishkhan/pishkhan.db)\n# db_path = \"/absolute/path/to/pishkhan.db\"\n\n[layout]\n# Terminal cells. Page size on wide terminals is rows that fit times columns.\nreserved_height = {}\nrow_height = {}\ncolumns_when_wide = {}\n# Page size below the desktop breakpoint.\nfallback_page_size = {}\n\n[breakpoints]\nmobile_below = {}\ndesktop_from = {}\nlarge_from = {}\n\n[simulation]\n# Confirmation delay for optimistic changes: <N>ms, <N>s or <N>m.\nlatency = \"{DEFAULT_LATENCY}\"\n# Every Nth confirmation fails and is rolled back; 0 never fails.\nfail_every = 0\nselection_delay = \"{DEFAULT_SELECTION_DELAY}\"\n\n[log]\n# trace, debug, info, warn, error or off. PISHKHAN_LOG overrides.\nlevel = \"{DEFAULT_LOG_LEVEL}\"\n# path = \"/absolute/path/to/pishkhan.log\"\n",
            path.display(),
            layout.reserved_height,
            layout.row_height,
            layout.columns_when_wide,
            layout.fallback_page_size,
            breakpoints.mobile_below,
            breakpoints.desktop_from,
            breakpoints.large_from,
        )
    }
}

pub(crate) fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 800ms or 2s)")
}

/// `None` means logging is off.
pub(crate) fn parse_log_level(raw: &str) -> Result<Option<tracing::Level>> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "off" => Ok(None),
        "trace" => Ok(Some(tracing::Level::TRACE)),
        "debug" => Ok(Some(tracing::Level::DEBUG)),
        "info" => Ok(Some(tracing::Level::INFO)),
        "warn" => Ok(Some(tracing::Level::WARN)),
        "error" => Ok(Some(tracing::Level::ERROR)),
        other => bail!(
            "unknown log level {other:?}; use trace, debug, info, warn, error or off"
        ),
    }
}
