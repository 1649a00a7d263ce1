//! Environment variable sources.
//!
//! The override pass reads variables through [`EnvSource`] instead of the
//! process environment directly, so a load can be driven from a map in tests
//! or layered over a `.env` file without mutating global state.

use std::collections::{BTreeMap, HashMap};
use std::env;

/// Read-only lookup of environment variables by name.
pub trait EnvSource: Send + Sync {
    /// Returns the value of `key`, or `None` when it is not set.
    fn get(&self, key: &str) -> Option<String>;
}

/// The process environment.
///
/// Values that are not valid Unicode are converted lossily.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        // `var_os` may panic on these; a lookup should just miss.
        if key.is_empty() || key.contains(['=', '\0']) {
            return None;
        }
        env::var_os(key).map(|v| v.to_string_lossy().into_owned())
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).cloned()
    }
}

impl<S: EnvSource + ?Sized> EnvSource for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

impl<S: EnvSource + ?Sized> EnvSource for Box<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// Two sources consulted in order: `primary` first, then `fallback`.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use konfig::{EnvSource, Layered};
///
/// let primary = HashMap::from([("PORT".to_string(), "9000".to_string())]);
/// let fallback = HashMap::from([
///     ("PORT".to_string(), "8080".to_string()),
///     ("HOST".to_string(), "localhost".to_string()),
/// ]);
///
/// let env = Layered::new(primary, fallback);
/// assert_eq!(env.get("PORT").as_deref(), Some("9000"));
/// assert_eq!(env.get("HOST").as_deref(), Some("localhost"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Layered<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> Layered<P, F> {
    /// Create a layered source.
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: EnvSource, F: EnvSource> EnvSource for Layered<P, F> {
    fn get(&self, key: &str) -> Option<String> {
        self.primary.get(key).or_else(|| self.fallback.get(key))
    }
}
