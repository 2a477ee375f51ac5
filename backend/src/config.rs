//! Runtime settings.
//!
//! Values come from the environment (a `.env` file is loaded first when
//! present) and can be overridden by command-line flags:
//!
//! | Variable       | Meaning                                   | Default          |
//! |----------------|-------------------------------------------|------------------|
//! | `WHX_MAPPING`  | SKU mapping sheet                         | embedded map     |
//! | `WHX_COLUMNS`  | JSON file overriding input header names   | built-in headers |
//! | `WHX_ADDR`     | Listen address of `whx serve`             | `0.0.0.0:8001`   |
//! | `WHX_TIMEOUT`  | Per-request timeout of `whx serve`, in s  | `30`             |

use std::env;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};
use crate::mapping::MappingSource;
use crate::models::ColumnNames;
use crate::transform::pipeline::GenerateOptions;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8001";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Upload size limit of the HTTP service.
pub const MAX_UPLOAD_BYTES: usize = 25 << 20;

/// Resolved settings for one process.
#[derive(Debug, Clone)]
pub struct Settings {
    pub mapping: MappingSource,
    pub columns: ColumnNames,
    pub addr: SocketAddr,
    pub request_timeout: Duration,
}

impl Settings {
    /// Read settings from the environment.
    pub fn from_env() -> ConfigResult<Self> {
        let _ = dotenvy::dotenv();

        Self::from_values(
            env::var("WHX_MAPPING").ok(),
            env::var("WHX_COLUMNS").ok(),
            env::var("WHX_ADDR").ok(),
            env::var("WHX_TIMEOUT").ok(),
        )
    }

    /// Build settings from optional raw values. Empty strings count as unset.
    pub fn from_values(
        mapping: Option<String>,
        columns: Option<String>,
        addr: Option<String>,
        timeout: Option<String>,
    ) -> ConfigResult<Self> {
        let mapping = match non_empty(mapping) {
            Some(path) => MappingSource::File(path),
            None => MappingSource::Embedded,
        };
        let columns = match non_empty(columns) {
            Some(path) => load_column_names(Path::new(&path))?,
            None => ColumnNames::default(),
        };
        let addr = parse_addr(non_empty(addr).as_deref().unwrap_or(DEFAULT_ADDR))?;
        let request_timeout = match non_empty(timeout) {
            Some(secs) => parse_timeout(&secs)?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            mapping,
            columns,
            addr,
            request_timeout,
        })
    }

    /// Replace the mapping source when a flag was given.
    pub fn with_mapping(mut self, path: Option<&Path>) -> Self {
        if let Some(path) = path {
            self.mapping = MappingSource::File(path.to_string_lossy().into_owned());
        }
        self
    }

    /// Replace the column names when a flag was given.
    pub fn with_columns(mut self, path: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = path {
            self.columns = load_column_names(path)?;
        }
        Ok(self)
    }

    /// Replace the listen address when a flag was given.
    pub fn with_addr(mut self, addr: Option<&str>) -> ConfigResult<Self> {
        if let Some(addr) = addr {
            self.addr = parse_addr(addr)?;
        }
        Ok(self)
    }

    /// Pipeline options for a run with these settings.
    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            mapping: self.mapping.clone(),
            columns: self.columns.clone(),
            output: None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse a listen address; a bare `:port` binds all interfaces.
pub fn parse_addr(raw: &str) -> ConfigResult<SocketAddr> {
    let raw = raw.trim();
    let full = if raw.starts_with(':') {
        format!("0.0.0.0{}", raw)
    } else {
        raw.to_string()
    };
    full.parse()
        .map_err(|_| ConfigError::InvalidAddr(raw.to_string()))
}

/// Parse a whole, non-zero number of seconds.
pub fn parse_timeout(raw: &str) -> ConfigResult<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}

/// Load header names from a JSON object. Missing keys keep their defaults.
pub fn load_column_names(path: &Path) -> ConfigResult<ColumnNames> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ColumnsIo {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::ColumnsJson {
        path: display,
        source,
    })
}
