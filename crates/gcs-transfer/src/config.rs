//! Configuration module

use crate::log::FilterMode;
use crate::{Result, TransferError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an alternative configuration file
pub const CONFIG_ENV: &str = "GCS_TRANSFER_CONFIG";

/// Default growth increment for object reads (1 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where objects live
    #[serde(default)]
    pub storage: StorageConfig,
    /// Transfer engine settings
    #[serde(default)]
    pub transfer: TransferConfig,
    /// Log sink settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage backend selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Which object store to talk to, as a name or a `{ kind = .. }` table
    #[serde(default, deserialize_with = "deserialize_provider")]
    pub provider: Provider,
    /// Bucket resolved eagerly when the connection opens
    #[serde(default)]
    pub default_bucket: Option<String>,
}

/// Object store provider. Cloud providers take credentials from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Provider {
    /// Google Cloud Storage
    #[default]
    Gcs,
    /// Amazon S3
    S3,
    /// Azure Blob Storage
    Azure,
    /// A directory per bucket under `root`
    Local { root: PathBuf },
    /// Process-local in-memory buckets
    Memory,
}

/// Transfer engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Read buffer growth increment in bytes
    #[serde(deserialize_with = "deserialize_size")]
    pub chunk_size: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Log sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter level (0..5 with the absolute filter)
    pub level: i32,
    /// Filter policy
    #[serde(default)]
    pub filter: FilterMode,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::log::VERBOSITY_VERY_VERBOSE,
            filter: FilterMode::Absolute,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeValue {
    Numeric(u64),
    Text(String),
}

fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let bytes = match SizeValue::deserialize(deserializer)? {
        SizeValue::Numeric(n) => n,
        SizeValue::Text(text) => parse_size(&text).map_err(|e| D::Error::custom(e.to_string()))?,
    };
    usize::try_from(bytes).map_err(|_| D::Error::custom(format!("Size too large: {}", bytes)))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProviderValue {
    Name(String),
    Table(Provider),
}

fn deserialize_provider<'de, D>(deserializer: D) -> std::result::Result<Provider, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    match ProviderValue::deserialize(deserializer)? {
        ProviderValue::Table(provider) => Ok(provider),
        ProviderValue::Name(name) => match name.as_str() {
            "gcs" => Ok(Provider::Gcs),
            "s3" => Ok(Provider::S3),
            "azure" => Ok(Provider::Azure),
            "memory" => Ok(Provider::Memory),
            "local" => Err(D::Error::custom(
                "provider 'local' needs a root: use { kind = \"local\", root = \"...\" }",
            )),
            other => Err(D::Error::custom(format!("Unknown provider: {}", other))),
        },
    }
}

/// Parse size string like "1MiB" to bytes
pub fn parse_size(size_str: &str) -> Result<u64> {
    let size_str = size_str.trim();

    if let Ok(bytes) = size_str.parse::<u64>() {
        return Ok(bytes);
    }

    let split_pos = size_str
        .chars()
        .position(|c| !c.is_ascii_digit() && c != '.')
        .unwrap_or(size_str.len());

    if split_pos == 0 {
        return Err(TransferError::Config(format!(
            "Invalid size format: {}",
            size_str
        )));
    }

    let (number_part, unit_part) = size_str.split_at(split_pos);
    let number: f64 = number_part
        .parse()
        .map_err(|_| TransferError::Config(format!("Invalid number in size: {}", number_part)))?;

    let multiplier: u64 = match unit_part.trim().to_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" => 1_000,
        "m" | "mb" => 1_000_000,
        "g" | "gb" => 1_000_000_000,
        "ki" | "kib" => 1_024,
        "mi" | "mib" => 1_048_576,
        "gi" | "gib" => 1_073_741_824,
        _ => {
            return Err(TransferError::Config(format!(
                "Unknown size unit: {}",
                unit_part
            )))
        }
    };

    Ok((number * multiplier as f64) as u64)
}

impl Config {
    /// Default configuration file location
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }

        dirs::config_dir()
            .map(|dir| dir.join("gcs-transfer").join("config.toml"))
            .ok_or_else(|| TransferError::Config("Could not determine config directory".to_string()))
    }

    /// Load from the default location, falling back to defaults if absent
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| TransferError::LocalIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| TransferError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.transfer.chunk_size == 0 {
            return Err(TransferError::Config(
                "transfer.chunk_size must be greater than zero".to_string(),
            ));
        }
        if let Some(bucket) = &self.storage.default_bucket {
            if bucket.is_empty() {
                return Err(TransferError::Config(
                    "storage.default_bucket must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
