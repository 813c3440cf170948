//! Server configuration.
//!
//! Values come from built-in defaults, then an optional TOML file named by
//! `EVHUB_CONFIG`, then individual environment variables.

use serde::Deserialize;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Read { path: String, message: String },
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },
    #[error("invalid {key} value {value:?}: {message}")]
    Invalid {
        key: &'static str,
        value: String,
        message: String,
    },
    #[error("{key} is required when assets = \"cloudinary\"")]
    Missing { key: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetBackend {
    Local,
    Cloudinary,
}

impl FromStr for AssetBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "cloudinary" => Ok(Self::Cloudinary),
            _ => Err("expected local or cloudinary".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            folder: "TechEvents".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db_path: String,
    pub host: IpAddr,
    pub port: u16,
    pub pool_max_idle: usize,
    /// Request body cap for event submissions, image included.
    pub max_upload_bytes: usize,
    pub assets: AssetBackend,
    pub upload_dir: PathBuf,
    pub cloudinary: CloudinaryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: ".evhub/events.db".to_string(),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 4830,
            pool_max_idle: 8,
            max_upload_bytes: 10 * 1024 * 1024,
            assets: AssetBackend::Local,
            upload_dir: PathBuf::from(".evhub/uploads"),
            cloudinary: CloudinaryConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Loads configuration using `lookup` in place of the process
    /// environment.
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("EVHUB_CONFIG").filter(|path| !path.trim().is_empty()) {
            Some(path) => {
                let text = std::fs::read_to_string(&path).map_err(|err| ConfigError::Read {
                    path: path.clone(),
                    message: err.to_string(),
                })?;
                info!(%path, "loaded config file");
                Self::from_toml(&path, &text)?
            }
            None => Self::default(),
        };
        config.apply_env(&lookup)?;
        config.check()?;
        Ok(config)
    }

    pub fn from_toml(path: &str, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|err| ConfigError::Parse {
            path: path.to_string(),
            message: err.to_string(),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    fn apply_env<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = var(lookup, "EVHUB_DB_PATH") {
            self.db_path = value;
        }
        if let Some(value) = parsed(lookup, "EVHUB_HOST")? {
            self.host = value;
        }
        if let Some(value) = parsed(lookup, "EVHUB_PORT")? {
            self.port = value;
        }
        if let Some(value) = parsed(lookup, "EVHUB_POOL_MAX_IDLE")? {
            self.pool_max_idle = value;
        }
        if let Some(value) = parsed(lookup, "EVHUB_MAX_UPLOAD_BYTES")? {
            self.max_upload_bytes = value;
        }
        if let Some(value) = parsed(lookup, "EVHUB_ASSETS")? {
            self.assets = value;
        }
        if let Some(value) = var(lookup, "EVHUB_UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(value);
        }
        if let Some(value) = var(lookup, "CLOUDINARY_CLOUD_NAME") {
            self.cloudinary.cloud_name = value;
        }
        if let Some(value) = var(lookup, "CLOUDINARY_API_KEY") {
            self.cloudinary.api_key = value;
        }
        if let Some(value) = var(lookup, "CLOUDINARY_API_SECRET") {
            self.cloudinary.api_secret = value;
        }
        if let Some(value) = var(lookup, "CLOUDINARY_FOLDER") {
            self.cloudinary.folder = value;
        }
        Ok(())
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.db_path.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "EVHUB_DB_PATH",
                value: self.db_path.clone(),
                message: "must not be empty".to_string(),
            });
        }
        if self.assets == AssetBackend::Cloudinary {
            let required = [
                ("CLOUDINARY_CLOUD_NAME", &self.cloudinary.cloud_name),
                ("CLOUDINARY_API_KEY", &self.cloudinary.api_key),
                ("CLOUDINARY_API_SECRET", &self.cloudinary.api_secret),
            ];
            for (key, value) in required {
                if value.trim().is_empty() {
                    return Err(ConfigError::Missing { key });
                }
            }
        }
        Ok(())
    }
}

fn var<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).filter(|value| !value.trim().is_empty());
    if value.is_none() {
        debug!("{key} not set, keeping current value");
    }
    value
}

fn parsed<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    var(lookup, key)
        .map(|value| {
            value.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
                key,
                value: value.clone(),
                message: err.to_string(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::load_with(env(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.addr().to_string(), "127.0.0.1:4830");
        assert_eq!(config.cloudinary.folder, "TechEvents");
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::load_with(env(&[
            ("EVHUB_PORT", "9000"),
            ("EVHUB_HOST", "0.0.0.0"),
            ("EVHUB_DB_PATH", "/tmp/events.db"),
            ("EVHUB_POOL_MAX_IDLE", "2"),
            ("EVHUB_MAX_UPLOAD_BYTES", "4096"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.addr().to_string(), "0.0.0.0:9000");
        assert_eq!(config.db_path, "/tmp/events.db");
        assert_eq!(config.pool_max_idle, 2);
        assert_eq!(config.max_upload_bytes, 4096);
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::load_with(env(&[("EVHUB_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "EVHUB_PORT", .. }));
    }

    #[test]
    fn test_cloudinary_requires_credentials() {
        let err = Config::load_with(env(&[
            ("EVHUB_ASSETS", "cloudinary"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                key: "CLOUDINARY_API_KEY"
            }
        ));
    }

    #[test]
    fn test_toml_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evhub.toml");
        std::fs::write(
            &path,
            "port = 5000\nassets = \"cloudinary\"\n\n[cloudinary]\ncloud_name = \"demo\"\napi_key = \"key\"\napi_secret = \"secret\"\n",
        )
        .unwrap();
        let path = path.to_string_lossy().to_string();
        let config = Config::load_with(env(&[
            ("EVHUB_CONFIG", path.as_str()),
            ("CLOUDINARY_FOLDER", "Meetups"),
        ]))
        .unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.assets, AssetBackend::Cloudinary);
        assert_eq!(config.cloudinary.api_key, "key");
        assert_eq!(config.cloudinary.folder, "Meetups");
        assert_eq!(config.db_path, ".evhub/events.db");
    }

    #[test]
    fn test_unreadable_config_file() {
        let err = Config::load_with(env(&[("EVHUB_CONFIG", "/nonexistent/evhub.toml")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
