use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::controller::ControllerOptions;
use crate::error::{FeedError, Result};
use crate::trigger::TriggerStrategy;

pub const DEFAULT_BASE_URL: &str = "https://www.reddit.com";
pub const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    pub page_size: u32,
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            user_agent: format!("scrollfeed/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoadingConfig {
    pub trigger: TriggerStrategy,
    pub coalesce_triggers: bool,
    pub failure_cooldown_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub loading: LoadingConfig,
}

fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("scrollfeed").join("config.toml"))
}

impl Config {
    /// Load the user config, falling back to defaults when it is missing or
    /// does not parse.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Config::default();
        };

        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                if path.exists() {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring config file");
                }
                Config::default()
            }
        }
    }

    /// Load an explicitly named config file. Unlike `load`, errors are returned.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| FeedError::Config(e.to_string()))?;
        Ok(config.normalized())
    }

    pub fn normalized(mut self) -> Self {
        self.feed.page_size = self.feed.page_size.clamp(1, MAX_PAGE_SIZE);
        if self.feed.base_url.trim().is_empty() {
            self.feed.base_url = DEFAULT_BASE_URL.to_string();
        }
        self
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            coalesce_triggers: self.loading.coalesce_triggers,
            failure_cooldown: Duration::from_millis(self.loading.failure_cooldown_ms),
        }
    }
}
