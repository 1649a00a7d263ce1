//! Configuration file formats.
//!
//! Both formats decode into the same [`serde_json::Value`] tree, so a YAML
//! document and its JSON equivalent are indistinguishable once parsed.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde_json::Value;

use crate::ConfigError;

/// A supported configuration file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// JSON (`.json`).
    Json,
    /// YAML (`.yaml`, `.yml`).
    Yaml,
}

impl Format {
    /// Maps a file extension to a format.
    ///
    /// Matching is case-insensitive and a leading dot is optional.
    ///
    /// # Example
    ///
    /// ```
    /// use konfig::Format;
    ///
    /// assert_eq!(Format::from_extension(".YML"), Some(Format::Yaml));
    /// assert_eq!(Format::from_extension("toml"), None);
    /// ```
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.strip_prefix('.').unwrap_or(extension);
        match extension.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Determines the format of a file from its extension.
    ///
    /// Nothing is read from disk.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnsupportedFormat` carrying the lowercased
    /// extension (with its leading dot, or empty when the path has none).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let extension = path
            .as_ref()
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();

        Self::from_extension(&extension).ok_or_else(|| ConfigError::unsupported_format(extension))
    }

    /// Parses raw bytes into a document tree.
    ///
    /// An empty YAML document parses to [`Value::Null`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Decode` wrapping the parser error.
    pub fn parse(self, bytes: &[u8]) -> Result<Value, ConfigError> {
        match self {
            Self::Json => serde_json::from_slice(bytes).map_err(|e| ConfigError::decode(self, e)),
            Self::Yaml if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Value::Null),
            Self::Yaml => serde_yaml::from_slice(bytes).map_err(|e| ConfigError::decode(self, e)),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("JSON"),
            Self::Yaml => f.write_str("YAML"),
        }
    }
}

impl FromStr for Format {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| ConfigError::unsupported_format(s))
    }
}
