use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::{
    fs::{File, create_dir_all, read_to_string},
    io::AsyncWriteExt,
};
use tracing::debug;

const DEFAULT_REFRESH_INTERVAL: u64 = 15;

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Url of the csv export of the spreadsheet
    pub feed_url: Option<String>,
    /// Url of the endpoint that accepts create/update/delete requests
    pub endpoint_url: Option<String>,
    /// Seconds between background reloads of the feed
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: None,
            endpoint_url: None,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

/// Location of the configuration file when none is given on the command line
pub fn config_file() -> Result<PathBuf> {
    let project_dirs = directories::ProjectDirs::from("org", "mapedit", "mapedit")
        .ok_or_else(|| anyhow!("Unable to determine the configuration directory"))?;
    Ok(project_dirs.config_dir().join("config.json"))
}

impl Config {
    fn parse(contents: String) -> Result<Self> {
        serde_json::from_str(&contents).with_context(|| "Invalid mapedit configuration")
    }

    fn format(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .with_context(|| "Couldn't serialize mapedit configuration")
    }

    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(?path, "Reading feed and endpoint settings");
        let contents = read_to_string(path)
            .await
            .with_context(|| format!("Couldn't read {}", path.display()))?;
        Self::parse(contents)
    }

    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        debug!(?path, refresh = self.refresh_interval, "Saving feed and endpoint settings");
        if let Some(dir) = path.parent() {
            create_dir_all(dir).await?;
        }
        let mut file = File::create(path).await?;
        let serialized = self.format()?;
        file.write_all(serialized.as_bytes())
            .await
            .with_context(|| "Failed to write config file")?;
        Ok(())
    }

    /// Command-line values take priority over the ones from the file
    pub fn with_overrides(
        mut self,
        feed_url: Option<String>,
        endpoint_url: Option<String>,
    ) -> Self {
        if feed_url.is_some() {
            self.feed_url = feed_url;
        }
        if endpoint_url.is_some() {
            self.endpoint_url = endpoint_url;
        }
        self
    }

    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_interval.max(1))
    }
}
