use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_SESSION_SECRET: &str = "please-change-this-to-a-secret";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub submission_log: PathBuf,
    pub pages_dir: PathBuf,
    pub session_secret: String,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:5000".into(),
            submission_log: PathBuf::from("./data.csv"),
            pages_dir: PathBuf::from("./templates"),
            session_secret: DEFAULT_SESSION_SECRET.into(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl Settings {
    pub fn uses_default_secret(&self) -> bool {
        self.session_secret == DEFAULT_SESSION_SECRET
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        apply_file_overrides(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) else {
        return;
    };

    if let Some(v) = file_cfg.get("bind_addr").and_then(toml::Value::as_str) {
        settings.server_bind = v.to_string();
    }
    if let Some(v) = file_cfg.get("submission_log").and_then(toml::Value::as_str) {
        settings.submission_log = PathBuf::from(v);
    }
    if let Some(v) = file_cfg.get("pages_dir").and_then(toml::Value::as_str) {
        settings.pages_dir = PathBuf::from(v);
    }
    if let Some(v) = file_cfg.get("session_secret").and_then(toml::Value::as_str) {
        settings.session_secret = v.to_string();
    }
    if let Some(v) = file_cfg
        .get("max_body_bytes")
        .and_then(toml::Value::as_integer)
        .and_then(|v| usize::try_from(v).ok())
    {
        settings.max_body_bytes = v;
    }
}

fn apply_env_overrides(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("SURVEY_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = var("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = var("SURVEY_LOG_PATH") {
        settings.submission_log = PathBuf::from(v);
    }
    if let Some(v) = var("APP__SUBMISSION_LOG") {
        settings.submission_log = PathBuf::from(v);
    }

    if let Some(v) = var("SURVEY_PAGES_DIR") {
        settings.pages_dir = PathBuf::from(v);
    }
    if let Some(v) = var("APP__PAGES_DIR") {
        settings.pages_dir = PathBuf::from(v);
    }

    if let Some(v) = var("SECRET_KEY") {
        settings.session_secret = v;
    }
    if let Some(v) = var("APP__SESSION_SECRET") {
        settings.session_secret = v;
    }

    if let Some(v) = var("APP__MAX_BODY_BYTES") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.max_body_bytes = parsed;
        }
    }
}

/// Makes sure the directory holding the submission log exists.
pub fn prepare_log_path(path: &Path) -> anyhow::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for submission log '{}'",
            parent.display(),
            path.display()
        )
    })?;

    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
