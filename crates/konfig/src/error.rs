//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::{Format, ScalarKind};

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file extension does not name a supported format.
    #[error("unexpected file format: {extension:?}")]
    UnsupportedFormat {
        /// The offending extension, lowercased, including the leading dot.
        extension: String,
    },

    /// The document does not conform to its format, or does not fit the target.
    #[error("while decoding {format} configuration: {source}")]
    Decode {
        /// The format being decoded.
        format: Format,
        /// Underlying parser error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The target's current value could not be captured before merging.
    #[error("failed to snapshot configuration target: {0}")]
    Snapshot(#[source] serde_yaml::Error),

    /// An environment variable could not be coerced into its field's type.
    #[error("failed to parse environment variable {var} for field `{field}`: {source}")]
    EnvOverride {
        /// The environment variable name.
        var: String,
        /// The field the variable is bound to.
        field: String,
        /// Why the value was rejected.
        #[source]
        source: CoercionError,
    },

    /// Failed to load a `.env` file.
    #[error("failed to load dotenv file: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

impl ConfigError {
    /// Create a new read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create a new unsupported format error.
    pub fn unsupported_format(extension: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            extension: extension.into(),
        }
    }

    /// Create a new decode error.
    pub fn decode(
        format: Format,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Decode {
            format,
            source: source.into(),
        }
    }

    /// Create a new environment override error.
    pub fn env_override(
        var: impl Into<String>,
        field: impl Into<String>,
        source: CoercionError,
    ) -> Self {
        Self::EnvOverride {
            var: var.into(),
            field: field.into(),
            source,
        }
    }
}

/// Reasons an environment value cannot be coerced into a field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    /// Not a base-10 signed integer.
    #[error("expected integer: {0}")]
    InvalidInteger(#[from] std::num::ParseIntError),

    /// Not a recognised boolean spelling.
    #[error("expected boolean, got {0:?}")]
    InvalidBoolean(String),

    /// Not a decimal float.
    #[error("expected float: {0}")]
    InvalidFloat(#[from] std::num::ParseFloatError),

    /// The integer does not fit the field's width.
    #[error("{value} is out of range for {target}")]
    OutOfRange {
        /// The parsed value.
        value: i64,
        /// The field's Rust type.
        target: &'static str,
    },

    /// The field cannot hold the parsed scalar.
    #[error("field does not accept a {0} value")]
    Unsupported(ScalarKind),
}
