//! Cache manager configuration, read from the process environment at first
//! use (specification §6).

use std::env::{self, VarError};

use thiserror::Error;

const CACHE_SIZE_MIB: &str = "CACHE_SIZE_MIB";
const COMPRESS_MODE: &str = "COMPRESS_MODE";
const CHUNK_SIZE_KIB: &str = "CHUNK_SIZE_KIB";

const DEFAULT_CACHE_SIZE_MIB: u64 = 128;
const DEFAULT_CHUNK_SIZE_KIB: u64 = 512;

/// Errors reading or parsing cache manager configuration. Fatal at manager
/// initialization — a misconfigured environment is never silently ignored.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not valid UTF-8")]
    InvalidUnicode(&'static str),

    #[error("environment variable {name} has invalid value {value:?}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// (cacheSizeBytes, compressMode, chunkSizeBytes) — the cache manager's
/// tunable parameters, mirroring `spec.md` §6's dotted-key table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheManagerConfig {
    pub cache_size_bytes: u64,
    /// Carried for sink implementors; the core itself never compresses.
    pub compress_mode: bool,
    /// Used by the tile-dimension-derivation default-512 fallback and by
    /// sink authors.
    pub chunk_size_bytes: u64,
}

impl Default for CacheManagerConfig {
    fn default() -> Self {
        Self {
            cache_size_bytes: DEFAULT_CACHE_SIZE_MIB * 1024 * 1024,
            compress_mode: true,
            chunk_size_bytes: DEFAULT_CHUNK_SIZE_KIB * 1024,
        }
    }
}

impl CacheManagerConfig {
    /// Builds a config from defaults, overridden by whichever of
    /// `CACHE_SIZE_MIB`, `COMPRESS_MODE`, `CHUNK_SIZE_KIB` are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = read_env(CACHE_SIZE_MIB)? {
            let mib = parse_positive_u64(CACHE_SIZE_MIB, &raw)?;
            config.cache_size_bytes = mib * 1024 * 1024;
        }
        if let Some(raw) = read_env(COMPRESS_MODE)? {
            config.compress_mode = parse_bool(COMPRESS_MODE, &raw)?;
        }
        if let Some(raw) = read_env(CHUNK_SIZE_KIB)? {
            let kib = parse_positive_u64(CHUNK_SIZE_KIB, &raw)?;
            config.chunk_size_bytes = kib * 1024;
        }

        Ok(config)
    }
}

fn read_env(name: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::InvalidUnicode(name)),
    }
}

fn parse_positive_u64(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    let value: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: raw.to_string(),
        reason: "expected a positive integer".to_string(),
    })?;
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            name,
            value: raw.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: raw.to_string(),
            reason: "expected a boolean (true/false, 1/0, yes/no, on/off)".to_string(),
        }),
    }
}
