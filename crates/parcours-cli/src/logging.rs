// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::config::Config;
use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "PARCOURS_LOG";

/// Sends `tracing` output to the log file. The terminal belongs to the grid,
/// so nothing is written to stderr.
pub fn init(config: &Config) -> Result<()> {
    let path = config.log_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("create log directory {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| {
            format!(
                "open log file {}; set [logging].path to a writable location",
                path.display()
            )
        })?;

    let directives = log_directives(env::var(LOG_ENV).ok().as_deref(), config.log_level());
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid log filter {directives:?}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;
    tracing::info!(path = %path.display(), filter = %directives, "logging started");
    Ok(())
}

/// `PARCOURS_LOG` wins when it is set and parses; otherwise the configured
/// level applies.
pub fn log_directives(env_value: Option<&str>, config_level: &str) -> String {
    if let Some(value) = env_value.map(str::trim)
        && !value.is_empty()
        && EnvFilter::try_new(value).is_ok()
    {
        return value.to_owned();
    }
    config_level.to_owned()
}
