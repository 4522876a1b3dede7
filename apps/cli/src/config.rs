use std::{fs, io::ErrorKind, path::Path};

use anyhow::Context;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub psgc_base_url: String,
    pub api_base_url: String,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            psgc_base_url: "https://psgc.gitlab.io/api/".into(),
            api_base_url: "http://127.0.0.1:8080/".into(),
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn psgc_url(&self) -> anyhow::Result<Url> {
        parse_base_url(&self.psgc_base_url, "psgc_base_url")
    }

    pub fn api_url(&self) -> anyhow::Result<Url> {
        parse_base_url(&self.api_base_url, "api_base_url")
    }
}

fn parse_base_url(raw: &str, key: &str) -> anyhow::Result<Url> {
    Url::parse(raw.trim()).with_context(|| format!("invalid {key} '{raw}'"))
}

/// Defaults, then the TOML file at `path` if it exists, then the process environment.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

fn load_settings_with(
    path: &Path,
    var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let settings = read_settings_file(path)?;
    Ok(apply_env_overrides(settings, var))
}

fn read_settings_file(path: &Path) -> anyhow::Result<Settings> {
    match fs::read_to_string(path) {
        Ok(raw) => toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display())),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Settings::default()),
        Err(err) => Err(err)
            .with_context(|| format!("failed to read config file '{}'", path.display())),
    }
}

pub fn apply_env_overrides(
    mut settings: Settings,
    var: impl Fn(&str) -> Option<String>,
) -> Settings {
    if let Some(v) = var("PSGC_BASE_URL") {
        settings.psgc_base_url = v;
    }
    if let Some(v) = var("GRABJOB__PSGC_BASE_URL") {
        settings.psgc_base_url = v;
    }

    if let Some(v) = var("API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = var("GRABJOB__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = var("GRABJOB__LOG_FILTER") {
        settings.log_filter = v;
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
