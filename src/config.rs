use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SEARCH_URL: &str = "https://www.indeed.com/jobs";
pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub search_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub identity_url: String,
    pub identity_api_key: Option<String>,
    pub mock_count: usize,
    pub per_page: usize,
    /// Pause before mock results appear, mirroring a real round trip.
    pub simulated_delay: Duration,
    pub upload_step_delay: Duration,
}

impl Config {
    /// Defaults overridden by `JOBPICKER_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let data_dir = match env::var("JOBPICKER_DATA_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => Self::default_data_dir(),
        };

        let request_timeout = match env::var("JOBPICKER_TIMEOUT_SECS") {
            Ok(secs) => Duration::from_secs(
                secs.trim()
                    .parse()
                    .with_context(|| format!("JOBPICKER_TIMEOUT_SECS must be a number, got '{}'", secs))?,
            ),
            Err(_) => Duration::from_secs(30),
        };

        Ok(Self {
            data_dir,
            search_url: env::var("JOBPICKER_SEARCH_URL").unwrap_or_else(|_| DEFAULT_SEARCH_URL.to_string()),
            user_agent: env::var("JOBPICKER_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            request_timeout,
            identity_url: env::var("JOBPICKER_IDENTITY_URL")
                .unwrap_or_else(|_| DEFAULT_IDENTITY_URL.to_string()),
            identity_api_key: env::var("JOBPICKER_IDENTITY_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            mock_count: 15,
            per_page: 5,
            simulated_delay: Duration::from_millis(1500),
            upload_step_delay: Duration::from_millis(100),
        })
    }

    pub fn with_data_dir(mut self, dir: &Path) -> Self {
        self.data_dir = dir.to_path_buf();
        self
    }

    fn default_data_dir() -> PathBuf {
        // XDG data directory, or the working directory as a fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobpicker") {
            proj_dirs.data_dir().to_path_buf()
        } else {
            PathBuf::from(".jobpicker")
        }
    }

    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join("local_storage.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("jobpicker.log")
    }

    pub fn ensure_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("Failed to create data directory {}", self.data_dir.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_live_under_data_dir() {
        let config = Config::from_env().unwrap().with_data_dir(Path::new("/tmp/jp"));
        assert_eq!(config.storage_path(), PathBuf::from("/tmp/jp/local_storage.json"));
        assert_eq!(config.log_path(), PathBuf::from("/tmp/jp/jobpicker.log"));
    }

    #[test]
    fn test_ensure_data_dir_creates_nested_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        let config = Config::from_env().unwrap().with_data_dir(&nested);
        config.ensure_data_dir().unwrap();
        assert!(nested.is_dir());
    }
}
