//! Configuration loader.
//!
//! This module provides the [`ConfigLoader`] for decoding a JSON or YAML file
//! into an application-supplied value and then applying environment variable
//! overrides on top of it.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::merge::decode_into;
use crate::{ConfigError, EnvOverride, EnvSource, Format, Layered, ProcessEnv};

/// Configuration loader.
///
/// A load runs in two steps, each overwriting the previous:
/// 1. The file is decoded into the target. Fields absent from the file keep
///    their current value.
/// 2. Fields bound to an environment variable are overridden when that
///    variable is set.
///
/// The loader keeps no reference to the target once a call returns.
///
/// # Example
///
/// ```no_run
/// use konfig::ConfigLoader;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Default, Serialize, Deserialize, konfig::EnvOverride)]
/// struct AppConfig {
///     #[env = "PORT"]
///     port: u16,
/// }
///
/// # fn main() -> Result<(), konfig::ConfigError> {
/// let config: AppConfig = ConfigLoader::new()
///     .with_dotenv()?
///     .load("config.yaml")?;
/// # Ok(())
/// # }
/// ```
pub struct ConfigLoader {
    env: Box<dyn EnvSource>,
    apply_env: bool,
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("apply_env", &self.apply_env)
            .finish_non_exhaustive()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader that reads overrides from the process environment.
    ///
    /// # Example
    ///
    /// ```
    /// use konfig::ConfigLoader;
    ///
    /// let loader = ConfigLoader::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            env: Box::new(ProcessEnv),
            apply_env: true,
        }
    }

    /// Read overrides from `source` instead of the process environment.
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use konfig::ConfigLoader;
    ///
    /// let env = HashMap::from([("PORT".to_string(), "9000".to_string())]);
    /// let loader = ConfigLoader::new().with_env(env);
    /// ```
    #[must_use]
    pub fn with_env(mut self, source: impl EnvSource + 'static) -> Self {
        self.env = Box::new(source);
        self
    }

    /// Use `./.env` as a fallback for variables the current source lacks.
    ///
    /// A missing `.env` file is not an error. The process environment is
    /// never modified.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if `.env` exists but cannot be read or
    /// parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match read_dotenv(Path::new(".env")) {
            Ok(vars) => Ok(self.layer_dotenv(vars)),
            Err(ConfigError::Dotenv(e)) if e.not_found() => Ok(self),
            Err(e) => Err(e),
        }
    }

    /// Use the dotenv file at `path` as a fallback for variables the current
    /// source lacks.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file is missing, unreadable, or
    /// malformed.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let vars = read_dotenv(path.as_ref())?;
        Ok(self.layer_dotenv(vars))
    }

    /// Decode files without applying environment overrides.
    #[must_use]
    pub fn without_env_overrides(mut self) -> Self {
        self.apply_env = false;
        self
    }

    /// Load the file at `path` into `target`.
    ///
    /// The format is chosen from the file extension (`.json`, `.yaml`,
    /// `.yml`, case-insensitive) before anything is read.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The extension is not supported
    /// - The file cannot be read
    /// - The content is not valid for its format or does not fit `T`
    /// - An environment override cannot be coerced
    pub fn load_file<T, P>(&self, path: P, target: &mut T) -> Result<(), ConfigError>
    where
        T: Serialize + DeserializeOwned + EnvOverride,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let bytes = fs::read(path).map_err(|e| ConfigError::read_error(path, e))?;

        tracing::debug!(path = %path.display(), %format, "decoding configuration file");
        self.load_bytes(&bytes, format, target)
    }

    /// Load configuration content already in memory into `target`.
    ///
    /// # Errors
    ///
    /// Same as [`load_file`](Self::load_file), minus the I/O failures.
    ///
    /// # Example
    ///
    /// ```
    /// use konfig::{ConfigLoader, Format};
    /// use serde::{Deserialize, Serialize};
    ///
    /// #[derive(Default, Serialize, Deserialize, konfig::EnvOverride)]
    /// struct Server {
    ///     host: String,
    ///     port: u16,
    /// }
    ///
    /// let mut server = Server { host: "0.0.0.0".into(), port: 8080 };
    /// ConfigLoader::new()
    ///     .load_str("port: 3000", Format::Yaml, &mut server)
    ///     .unwrap();
    ///
    /// assert_eq!(server.host, "0.0.0.0");
    /// assert_eq!(server.port, 3000);
    /// ```
    pub fn load_str<T>(
        &self,
        content: &str,
        format: Format,
        target: &mut T,
    ) -> Result<(), ConfigError>
    where
        T: Serialize + DeserializeOwned + EnvOverride,
    {
        self.load_bytes(content.as_bytes(), format, target)
    }

    /// Load the file at `path` into a fresh `T::default()`.
    ///
    /// # Errors
    ///
    /// Same as [`load_file`](Self::load_file).
    pub fn load<T, P>(&self, path: P) -> Result<T, ConfigError>
    where
        T: Default + Serialize + DeserializeOwned + EnvOverride,
        P: AsRef<Path>,
    {
        let mut target = T::default();
        self.load_file(path, &mut target)?;
        Ok(target)
    }

    /// Run only the override pass against `target`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EnvOverride` for the first variable that cannot
    /// be coerced.
    pub fn apply_env_overrides<T>(&self, target: &mut T) -> Result<(), ConfigError>
    where
        T: EnvOverride + ?Sized,
    {
        target.apply_env_overrides(self.env.as_ref())
    }

    fn load_bytes<T>(&self, bytes: &[u8], format: Format, target: &mut T) -> Result<(), ConfigError>
    where
        T: Serialize + DeserializeOwned + EnvOverride,
    {
        let document = format.parse(bytes)?;
        decode_into(document, format, target)?;

        if self.apply_env {
            self.apply_env_overrides(target)?;
        }
        Ok(())
    }

    fn layer_dotenv(mut self, vars: HashMap<String, String>) -> Self {
        self.env = Box::new(Layered::new(self.env, vars));
        self
    }
}

/// Load the file at `path` into `target`, then apply overrides from the
/// process environment.
///
/// # Errors
///
/// See [`ConfigLoader::load_file`].
///
/// # Example
///
/// ```no_run
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Default, Serialize, Deserialize, konfig::EnvOverride)]
/// struct AppConfig {
///     #[env = "PORT"]
///     port: u16,
/// }
///
/// # fn main() -> Result<(), konfig::ConfigError> {
/// let mut config = AppConfig::default();
/// konfig::load_file("config.json", &mut config)?;
/// # Ok(())
/// # }
/// ```
pub fn load_file<T, P>(path: P, target: &mut T) -> Result<(), ConfigError>
where
    T: Serialize + DeserializeOwned + EnvOverride,
    P: AsRef<Path>,
{
    ConfigLoader::new().load_file(path, target)
}

/// Load the file at `path` into `target` without applying overrides.
///
/// # Errors
///
/// See [`ConfigLoader::load_file`].
pub fn decode_file<T, P>(path: P, target: &mut T) -> Result<(), ConfigError>
where
    T: Serialize + DeserializeOwned + EnvOverride,
    P: AsRef<Path>,
{
    ConfigLoader::new().without_env_overrides().load_file(path, target)
}

/// Load the file at `path` into a fresh `T::default()`, then apply
/// overrides from the process environment.
///
/// # Errors
///
/// See [`ConfigLoader::load_file`].
pub fn from_file<T, P>(path: P) -> Result<T, ConfigError>
where
    T: Default + Serialize + DeserializeOwned + EnvOverride,
    P: AsRef<Path>,
{
    ConfigLoader::new().load(path)
}

// Read a dotenv file without touching the process environment
fn read_dotenv(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let mut vars = HashMap::new();
    for item in dotenvy::from_path_iter(path)? {
        let (key, value) = item?;
        vars.insert(key, value);
    }

    tracing::debug!(path = %path.display(), count = vars.len(), "loaded dotenv file");
    Ok(vars)
}
