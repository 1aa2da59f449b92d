// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::parse_log_level;

pub const LOG_ENV: &str = "PISHKHAN_LOG";

/// Builds the filter from `PISHKHAN_LOG`, falling back to the configured
/// level. `None` means logging stays off.
pub fn log_filter(configured_level: &str) -> Result<Option<EnvFilter>> {
    if let Ok(directives) = std::env::var(LOG_ENV)
        && !directives.trim().is_empty()
    {
        let filter = EnvFilter::try_new(&directives)
            .with_context(|| format!("invalid {LOG_ENV} directives {directives:?}"))?;
        return Ok(Some(filter));
    }

    let Some(level) = parse_log_level(configured_level)? else {
        return Ok(None);
    };
    let directive = format!("pishkhan={}", level.as_str().to_ascii_lowercase());
    let filter = EnvFilter::try_new(directive)
        .with_context(|| format!("invalid log level {configured_level:?}"))?;
    Ok(Some(filter))
}

/// Sends events to `path`. The terminal belongs to the UI, so nothing is
/// written to stdout or stderr.
pub fn init_logging(configured_level: &str, path: &Path) -> Result<()> {
    let Some(filter) = log_filter(configured_level)? else {
        return Ok(());
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| {
            format!(
                "open log file {} -- set [log].path to a writable file or [log].level = \"off\"",
                path.display()
            )
        })?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;

    tracing::info!(target: "pishkhan::cli", path = %path.display(), "logging started");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{LOG_ENV, log_filter};
    use anyhow::Result;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn off_level_disables_logging() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(LOG_ENV);
        }
        assert!(log_filter("off")?.is_none());
        assert!(log_filter("debug")?.is_some());
        Ok(())
    }

    #[test]
    fn env_directives_override_configured_level() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(LOG_ENV, "pishkhan::mutation=trace");
        }
        let filter = log_filter("off");
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(LOG_ENV);
        }
        let filter = filter?.expect("env filter should win over off");
        assert!(filter.to_string().contains("pishkhan::mutation=trace"));
        Ok(())
    }

    #[test]
    fn unknown_configured_level_is_an_error() {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(LOG_ENV);
        }
        let error = log_filter("chatty").expect_err("unknown level should fail");
        assert!(error.to_string().contains("unknown log level"));
    }
}
