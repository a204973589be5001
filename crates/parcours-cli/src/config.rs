// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const CONFIG_VERSION: i64 = 1;
pub const APP_NAME: &str = "parcours";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub layout: LayoutSection,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub storage: Storage,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            layout: LayoutSection::default(),
            logging: Logging::default(),
            storage: Storage::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutSection {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Logging {
    pub path: Option<String>,
    pub level: Option<String>,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            path: None,
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Storage {
    pub db_path: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("PARCOURS_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set PARCOURS_CONFIG_PATH to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
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
                    "config file {} has no version; add `version = 1` at the top and keep values under [layout], [logging], and [storage]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1. Run `parcours --print-example-config` for the current schema",
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
            parcours_db::validate_db_path(db_path)
                .with_context(|| format!("storage.db_path in {}", path.display()))?;
        }

        if let Some(level) = &self.logging.level {
            EnvFilter::try_new(level).map_err(|error| {
                anyhow!(
                    "logging.level in {} is not a valid filter ({error}); use a level such as \"info\" or a directive such as \"parcours_db=debug\"",
                    path.display()
                )
            })?;
        }

        if let Some(layout) = &self.layout.path
            && layout.trim().is_empty()
        {
            bail!(
                "layout.path in {} is empty; remove it to use the default layout location",
                path.display()
            );
        }

        Ok(())
    }

    /// Layout file location. Relative paths are taken from the directory
    /// holding the config file.
    pub fn layout_path(&self, config_path: &Path) -> PathBuf {
        match &self.layout.path {
            Some(path) => {
                let path = PathBuf::from(path);
                if path.is_relative()
                    && let Some(dir) = config_path.parent()
                {
                    return dir.join(path);
                }
                path
            }
            None => config_path.with_file_name("layout.toml"),
        }
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.logging.path {
            return Ok(PathBuf::from(path));
        }
        let cache_root = dirs::cache_dir().ok_or_else(|| {
            anyhow!("cannot resolve cache directory; set [logging].path in the config file")
        })?;
        Ok(cache_root.join(APP_NAME).join("parcours.log"))
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// `None` keeps the store in memory.
    pub fn db_path(&self) -> Option<PathBuf> {
        self.storage.db_path.as_ref().map(PathBuf::from)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# parcours config\n# Place this file at: {}\n\nversion = 1\n\n[layout]\n# Optional. Default is layout.toml next to this file.\n# path = \"layout.toml\"\n\n[logging]\n# Optional. Default is the platform cache dir (for example ~/.cache/parcours/parcours.log)\n# path = \"/absolute/path/to/parcours.log\"\n# PARCOURS_LOG overrides this level.\nlevel = \"{}\"\n\n[storage]\n# Optional. Without it the log is indexed in memory and dropped on exit.\n# db_path = \"/absolute/path/to/parcours.db\"\n",
            path.display(),
            DEFAULT_LOG_LEVEL,
        )
    }
}
