use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::entities::scope::CentreScope;
use crate::domain::entities::view::DEFAULT_PAGE_SIZE;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PREPARED_BY: &str = "Administrator";

pub const ENV_API_URL: &str = "CENTRE_ADMIN_API_URL";
pub const ENV_CENTRE_ID: &str = "CENTRE_ADMIN_CENTRE_ID";
pub const ENV_CENTRE_NAME: &str = "CENTRE_ADMIN_CENTRE_NAME";
pub const ENV_PAGE_SIZE: &str = "CENTRE_ADMIN_PAGE_SIZE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub centre: CentreScope,
    pub page_size: u32,
    pub request_timeout_secs: u64,
    /// Name printed on ledger exports.
    pub prepared_by: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            centre: CentreScope::default(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            prepared_by: DEFAULT_PREPARED_BY.to_string(),
        }
    }
}

impl AppConfig {
    /// Reads `config.json` from the platform config directory, then applies
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let path = default_config_path()?;
        let contents = if path.exists() {
            Some(
                std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config: {}", path.display()))?,
            )
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            None
        };
        let config = Self::from_sources(contents.as_deref(), |key| std::env::var(key).ok())
            .with_context(|| format!("invalid config: {}", path.display()))?;
        info!(
            api = %config.api_base_url,
            centre_id = ?config.centre.id,
            page_size = config.page_size,
            "configuration loaded"
        );
        Ok(config)
    }

    pub fn from_sources<F>(file_contents: Option<&str>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match file_contents {
            Some(text) if !text.trim().is_empty() => {
                serde_json::from_str::<AppConfig>(text).context("failed to parse config json")?
            }
            _ => AppConfig::default(),
        };

        if let Some(url) = env(ENV_API_URL) {
            config.api_base_url = url;
        }
        if let Some(raw) = env(ENV_CENTRE_ID) {
            let id = raw
                .trim()
                .parse::<i64>()
                .with_context(|| format!("{ENV_CENTRE_ID} is not an integer: {raw}"))?;
            config.centre.id = Some(id);
        }
        if let Some(name) = env(ENV_CENTRE_NAME) {
            config.centre.name = name;
        }
        if let Some(raw) = env(ENV_PAGE_SIZE) {
            config.page_size = raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("{ENV_PAGE_SIZE} is not a positive integer: {raw}"))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            bail!("api_base_url must not be empty");
        }
        Url::parse(url).with_context(|| format!("api_base_url is not a valid url: {url}"))?;
        if self.page_size == 0 {
            bail!("page_size must be greater than zero");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "centre-admin", "centre-admin")
        .ok_or_else(|| anyhow!("unable to resolve config directory"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.json"))
}

fn ensure_webview_data_dir(base_data_dir: &Path) -> Result<PathBuf> {
    let webview_data_dir = base_data_dir.join("webview");
    std::fs::create_dir_all(&webview_data_dir).with_context(|| {
        format!(
            "failed to create webview dir: {}",
            webview_data_dir.display()
        )
    })?;
    Ok(webview_data_dir)
}

pub fn default_webview_data_dir() -> Result<PathBuf> {
    ensure_webview_data_dir(project_dirs()?.data_local_dir())
}
