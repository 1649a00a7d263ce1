//! Environment variable overrides.
//!
//! After a file is decoded, the override pass walks the configuration value
//! and, for every field bound to an environment variable that is set,
//! replaces the decoded value with the variable's value coerced into the
//! field's type.
//!
//! Types opt in by implementing [`EnvOverride`], usually through
//! `#[derive(EnvOverride)]`:
//!
//! ```
//! use std::collections::HashMap;
//! use konfig::EnvOverride;
//!
//! #[derive(Default, EnvOverride)]
//! struct ServerConfig {
//!     #[env = "PORT"]
//!     port: u16,
//!     host: String,
//! }
//!
//! #[derive(Default, EnvOverride)]
//! struct AppConfig {
//!     #[env(nested)]
//!     server: ServerConfig,
//!     #[env(key = "APP_DEBUG")]
//!     debug: bool,
//! }
//!
//! let env = HashMap::from([("PORT".to_string(), "9000".to_string())]);
//! let mut config = AppConfig::default();
//! config.apply_env_overrides(&env).unwrap();
//!
//! assert_eq!(config.server.port, 9000);
//! assert!(!config.debug);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::{CoercionError, ConfigError, EnvSource};

/// A configuration type whose fields can be overridden from the environment.
pub trait EnvOverride {
    /// Applies every override declared on this value and its nested fields.
    ///
    /// Fields are visited in declaration order and nested values are
    /// processed depth-first. The first coercion failure aborts the walk;
    /// overrides applied before it are kept.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EnvOverride` when a variable is set but cannot
    /// be coerced into its field's type.
    fn apply_env_overrides(&mut self, env: &dyn EnvSource) -> Result<(), ConfigError>;
}

impl<T: EnvOverride> EnvOverride for Option<T> {
    fn apply_env_overrides(&mut self, env: &dyn EnvSource) -> Result<(), ConfigError> {
        match self {
            Some(inner) => inner.apply_env_overrides(env),
            None => Ok(()),
        }
    }
}

impl<T: EnvOverride + ?Sized> EnvOverride for Box<T> {
    fn apply_env_overrides(&mut self, env: &dyn EnvSource) -> Result<(), ConfigError> {
        (**self).apply_env_overrides(env)
    }
}

/// The scalar kinds an environment variable can be coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Base-10 signed integer.
    Integer,
    /// `true`/`false` and their usual spellings.
    Boolean,
    /// Decimal floating point.
    Float,
    /// The raw variable value.
    String,
}

impl ScalarKind {
    /// Coerces a raw environment value into this kind.
    ///
    /// # Errors
    ///
    /// Returns the matching [`CoercionError`] when `raw` is not a valid
    /// spelling of this kind. `String` never fails.
    pub fn parse(self, raw: &str) -> Result<Scalar, CoercionError> {
        match self {
            Self::Integer => Ok(Scalar::Integer(raw.parse()?)),
            Self::Boolean => parse_bool(raw)
                .map(Scalar::Boolean)
                .ok_or_else(|| CoercionError::InvalidBoolean(raw.to_string())),
            Self::Float => Ok(Scalar::Float(raw.parse()?)),
            Self::String => Ok(Scalar::String(raw.to_string())),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Float => "float",
            Self::String => "string",
        })
    }
}

/// A coerced environment value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// An integer value.
    Integer(i64),
    /// A boolean value.
    Boolean(bool),
    /// A floating point value.
    Float(f64),
    /// A string value.
    String(String),
}

impl Scalar {
    /// The kind of this value.
    pub const fn kind(&self) -> ScalarKind {
        match self {
            Self::Integer(_) => ScalarKind::Integer,
            Self::Boolean(_) => ScalarKind::Boolean,
            Self::Float(_) => ScalarKind::Float,
            Self::String(_) => ScalarKind::String,
        }
    }

    fn unsupported(&self) -> CoercionError {
        CoercionError::Unsupported(self.kind())
    }
}

/// A field type that an environment variable can be assigned to.
///
/// Types with no scalar kind (`KIND = None`) accept an environment key but
/// are never overridden.
pub trait EnvValue {
    /// The kind the raw variable is coerced into, if any.
    const KIND: Option<ScalarKind> = None;

    /// Assigns a coerced value.
    ///
    /// # Errors
    ///
    /// Returns `CoercionError` when the value does not fit this type.
    fn set_scalar(&mut self, value: Scalar) -> Result<(), CoercionError> {
        Err(value.unsupported())
    }
}

macro_rules! impl_env_value_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl EnvValue for $ty {
                const KIND: Option<ScalarKind> = Some(ScalarKind::Integer);

                fn set_scalar(&mut self, value: Scalar) -> Result<(), CoercionError> {
                    match value {
                        Scalar::Integer(n) => {
                            *self = <$ty>::try_from(n).map_err(|_| CoercionError::OutOfRange {
                                value: n,
                                target: stringify!($ty),
                            })?;
                            Ok(())
                        }
                        other => Err(other.unsupported()),
                    }
                }
            }
        )*
    };
}

impl_env_value_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl EnvValue for bool {
    const KIND: Option<ScalarKind> = Some(ScalarKind::Boolean);

    fn set_scalar(&mut self, value: Scalar) -> Result<(), CoercionError> {
        match value {
            Scalar::Boolean(b) => {
                *self = b;
                Ok(())
            }
            other => Err(other.unsupported()),
        }
    }
}

impl EnvValue for f64 {
    const KIND: Option<ScalarKind> = Some(ScalarKind::Float);

    fn set_scalar(&mut self, value: Scalar) -> Result<(), CoercionError> {
        match value {
            Scalar::Float(x) => {
                *self = x;
                Ok(())
            }
            other => Err(other.unsupported()),
        }
    }
}

impl EnvValue for f32 {
    const KIND: Option<ScalarKind> = Some(ScalarKind::Float);

    #[allow(clippy::cast_possible_truncation)]
    fn set_scalar(&mut self, value: Scalar) -> Result<(), CoercionError> {
        match value {
            Scalar::Float(x) => {
                *self = x as f32;
                Ok(())
            }
            other => Err(other.unsupported()),
        }
    }
}

impl EnvValue for String {
    const KIND: Option<ScalarKind> = Some(ScalarKind::String);

    fn set_scalar(&mut self, value: Scalar) -> Result<(), CoercionError> {
        match value {
            Scalar::String(s) => {
                *self = s;
                Ok(())
            }
            other => Err(other.unsupported()),
        }
    }
}

impl<T: EnvValue + Default> EnvValue for Option<T> {
    const KIND: Option<ScalarKind> = T::KIND;

    fn set_scalar(&mut self, value: Scalar) -> Result<(), CoercionError> {
        let mut inner = T::default();
        inner.set_scalar(value)?;
        *self = Some(inner);
        Ok(())
    }
}

impl<T> EnvValue for Vec<T> {}

impl<K, V, S> EnvValue for HashMap<K, V, S> {}

impl<K, V> EnvValue for BTreeMap<K, V> {}

/// Overrides a single field from the environment.
///
/// Returns `Ok(true)` when the variable was set and assigned, `Ok(false)`
/// when it is unset or the field has no scalar kind.
///
/// # Errors
///
/// Returns `ConfigError::EnvOverride` naming both `var` and `field` when the
/// value cannot be coerced.
pub fn override_field<T: EnvValue + ?Sized>(
    value: &mut T,
    field: &str,
    var: &str,
    env: &dyn EnvSource,
) -> Result<bool, ConfigError> {
    let Some(raw) = env.get(var) else {
        return Ok(false);
    };

    let Some(kind) = T::KIND else {
        tracing::trace!(var, field, "ignoring environment key on non-scalar field");
        return Ok(false);
    };

    kind.parse(&raw)
        .and_then(|scalar| value.set_scalar(scalar))
        .map_err(|source| ConfigError::env_override(var, field, source))?;

    tracing::debug!(var, field, kind = %kind, "applied environment override");
    Ok(true)
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "on" => Some(true),
        "false" | "f" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
