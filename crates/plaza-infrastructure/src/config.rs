//! Backend configuration.
//!
//! Resolution order: the TOML config file (default location under the user
//! config dir), then environment-variable overrides. The REST backend is
//! the only consumer; the in-memory backend needs no configuration.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use plaza_core::error::{PlazaError, Result};

/// Environment variable overriding the service base URL.
pub const ENV_BACKEND_URL: &str = "PLAZA_BACKEND_URL";
/// Environment variable overriding the service API key.
pub const ENV_API_KEY: &str = "PLAZA_API_KEY";
/// Environment variable overriding the storage bucket.
pub const ENV_STORAGE_BUCKET: &str = "PLAZA_STORAGE_BUCKET";

fn default_bucket() -> String {
    "posts".to_string()
}

/// Connection settings for the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Service base URL, e.g. `https://abc.supabase.co`.
    #[serde(default)]
    pub base_url: String,
    /// Public (anon) API key sent with every request.
    #[serde(default)]
    pub api_key: String,
    /// Bucket holding uploaded post images.
    #[serde(default = "default_bucket")]
    pub storage_bucket: String,
}

impl BackendConfig {
    /// Default config file location: `<user config dir>/plaza/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("plaza").join("config.toml"))
    }

    /// Loads settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|err| PlazaError::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        })
    }

    /// Resolves settings from the default file location and the
    /// environment.
    ///
    /// # Errors
    ///
    /// `Config` when no base URL or API key is available from either
    /// source.
    pub fn resolve() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path)?,
            _ => Self {
                base_url: String::new(),
                api_key: String::new(),
                storage_bucket: default_bucket(),
            },
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Applies environment-variable overrides in place.
    pub fn apply_env(&mut self) {
        if let Ok(url) = env::var(ENV_BACKEND_URL) {
            self.base_url = url;
        }
        if let Ok(key) = env::var(ENV_API_KEY) {
            self.api_key = key;
        }
        if let Ok(bucket) = env::var(ENV_STORAGE_BUCKET) {
            self.storage_bucket = bucket;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(PlazaError::config(format!(
                "no backend URL configured (set {ENV_BACKEND_URL} or the config file)"
            )));
        }
        if self.api_key.is_empty() {
            return Err(PlazaError::config(format!(
                "no API key configured (set {ENV_API_KEY} or the config file)"
            )));
        }
        Ok(())
    }
}
