//! Reads wiring and configuration files and builds networks from them.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers, plus the directory-level loading pipeline.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use pulsenet_core::network::{Network, WiringError};

use crate::schema::{SimConfig, WiringFile};

/// Base name of the wiring file in a simulation directory.
pub const NETWORK_FILE: &str = "network";

/// Base name of the optional configuration file.
pub const CONFIG_FILE: &str = "config";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The declarations parsed but do not form a valid network.
    #[error(transparent)]
    Wiring(#[from] WiringError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for `{base_name}.ron`, `.toml`, or `.json`.
///
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// more than one format exists for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its format.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format).map_err(|detail| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    })
}

fn deserialize_str<T: DeserializeOwned>(content: &str, format: Format) -> Result<T, String> {
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    }
}

// ===========================================================================
// Loading pipeline
// ===========================================================================

/// Load a wiring file and build its network.
pub fn load_network(path: &Path) -> Result<Network, DataLoadError> {
    let file: WiringFile = deserialize_file(path)?;
    tracing::debug!(file = %path.display(), nodes = file.nodes.len(), "wiring file read");
    Ok(file.into_builder().build()?)
}

/// Load a run configuration file. Missing sections take their defaults.
pub fn load_config(path: &Path) -> Result<SimConfig, DataLoadError> {
    deserialize_file(path)
}

/// Load `network.*` (required) and `config.*` (optional) from `dir`.
pub fn load_simulation(dir: &Path) -> Result<(Network, SimConfig), DataLoadError> {
    let network = load_network(&require_data_file(dir, NETWORK_FILE)?)?;
    let config = match find_data_file(dir, CONFIG_FILE)? {
        Some(path) => load_config(&path)?,
        None => {
            tracing::debug!(dir = %dir.display(), "no config file; using defaults");
            SimConfig::default()
        }
    };
    Ok((network, config))
}

// ===========================================================================
// Tests
// ===========================================================================
