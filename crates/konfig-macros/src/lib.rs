//! Procedural macros for konfig.
//!
//! This crate provides `#[derive(EnvOverride)]`, which generates the
//! environment override pass for a configuration struct from a declarative
//! list of field attributes.
//!
//! # Example
//!
//! ```rust,ignore
//! use konfig::EnvOverride;
//!
//! #[derive(EnvOverride)]
//! struct AppConfig {
//!     #[env = "APP_NAME"]
//!     name: String,
//!     #[env(nested)]
//!     server: ServerConfig,
//! }
//! ```
//!
//! # Macro Expansion
//!
//! For every field, in declaration order, the derive emits:
//!
//! 1. A recursive `apply_env_overrides` call when the field is `nested`
//! 2. An `override_field` call when the field names an environment key
//!
//! Fields without an `#[env ...]` attribute are left alone.

mod derive;
mod parse;

use proc_macro::TokenStream;

/// Derives `konfig::EnvOverride` for a struct.
///
/// # Attributes
///
/// - `#[env = "KEY"]` / `#[env(key = "KEY")]`: override the field from `KEY`
/// - `#[env(nested)]`: apply the field's own overrides (the field type must
///   implement `EnvOverride`)
///
/// Both may be combined: `#[env(nested, key = "KEY")]`.
///
/// # Generated Code
///
/// The macro generates approximately:
///
/// ```rust,ignore
/// impl konfig::EnvOverride for AppConfig {
///     fn apply_env_overrides(
///         &mut self,
///         env: &dyn konfig::EnvSource,
///     ) -> Result<(), konfig::ConfigError> {
///         konfig::override_field(&mut self.name, "AppConfig.name", "APP_NAME", env)?;
///         konfig::EnvOverride::apply_env_overrides(&mut self.server, env)?;
///         Ok(())
///     }
/// }
///
/// impl konfig::EnvValue for AppConfig {}
/// ```
#[proc_macro_derive(EnvOverride, attributes(env))]
pub fn derive_env_override(input: TokenStream) -> TokenStream {
    derive::expand_env_override(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
