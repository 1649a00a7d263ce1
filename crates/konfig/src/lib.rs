//! Typed application configuration from JSON or YAML files.
//!
//! This crate decodes a configuration file into an application-supplied,
//! strongly-typed value and then lets individual fields be overridden from
//! environment variables:
//! - JSON (`.json`) and YAML (`.yaml`, `.yml`) files, chosen by extension
//! - Decoding over the target's current value (absent and null fields are kept)
//! - Per-field environment overrides declared with `#[derive(EnvOverride)]`
//! - Optional `.env` files as a fallback layer
//!
//! # Example
//!
//! ```no_run
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize, konfig::EnvOverride)]
//! struct AppConfig {
//!     #[env(nested)]
//!     server: Server,
//!     database: Database,
//! }
//!
//! #[derive(Debug, Default, Serialize, Deserialize, konfig::EnvOverride)]
//! struct Server {
//!     #[env = "PORT"]
//!     port: u16,
//! }
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct Database {
//!     hostname: String,
//!     port: u16,
//! }
//!
//! # fn main() -> Result<(), konfig::ConfigError> {
//! let mut config = AppConfig::default();
//! konfig::load_file("config.yaml", &mut config)?;
//!
//! println!("Server will listen on port {}", config.server.port);
//! # Ok(())
//! # }
//! ```
//!
//! # Environment Overrides
//!
//! A field marked `#[env = "KEY"]` takes the value of `KEY` when it is set,
//! regardless of what the file contained. Integers, booleans, floats and
//! strings are supported; keys on other field types are ignored. A value
//! that cannot be coerced fails the whole load with
//! [`ConfigError::EnvOverride`].

// Lets `#[derive(EnvOverride)]` expand to `::konfig` paths inside this crate.
extern crate self as konfig;

mod env;
mod error;
mod format;
mod loader;
mod merge;
mod overrides;

pub use env::{EnvSource, Layered, ProcessEnv};
pub use error::{CoercionError, ConfigError};
pub use format::Format;
pub use loader::{decode_file, from_file, load_file, ConfigLoader};
pub use overrides::{override_field, EnvOverride, EnvValue, Scalar, ScalarKind};

/// Derives [`EnvOverride`] and a non-scalar [`EnvValue`] for a struct.
///
/// Field attributes:
/// - `#[env = "KEY"]` or `#[env(key = "KEY")]`: override from `KEY`
/// - `#[env(nested)]`: walk into the field's own overrides
#[cfg(feature = "derive")]
pub use konfig_macros::EnvOverride;
