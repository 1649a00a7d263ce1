//! Integration tests for loading configuration files.
//!
//! These tests exercise the full pipeline: extension dispatch, file read,
//! decoding over the target, and the environment override pass.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use konfig::{ConfigError, ConfigLoader, EnvOverride, Format};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tempfile::TempDir;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, EnvOverride)]
struct BasicMap {
    integer: i64,
    float: f64,
    string: String,
    boolean: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, EnvOverride)]
struct TestMap {
    #[serde(flatten)]
    #[env(nested)]
    basic: BasicMap,
    list: Vec<Value>,
    #[env(nested)]
    map: BasicMap,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, EnvOverride)]
struct TestConfig {
    #[env(nested)]
    map: TestMap,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize, EnvOverride)]
struct AppConfig {
    #[env(nested)]
    server: ServerSection,
    database: DatabaseSection,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize, EnvOverride)]
struct ServerSection {
    #[env = "PORT"]
    port: i16,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct DatabaseSection {
    driver: String,
    hostname: String,
    port: i16,
    username: String,
    password: String,
    name: String,
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn loader() -> ConfigLoader {
    ConfigLoader::new().with_env(env(&[]))
}

fn validate(config: &TestConfig) {
    let map = &config.map;
    assert!(map.basic.boolean);
    assert!((map.basic.float - 6.25).abs() < f64::EPSILON);
    assert_eq!(map.basic.integer, 1234);
    assert_eq!(map.basic.string, "string");
    assert_eq!(map.list, vec![json!(true), json!("string"), json!(6.25), json!(1234)]);
    assert!(map.map.boolean);
    assert!((map.map.float - 6.25).abs() < f64::EPSILON);
    assert_eq!(map.map.integer, 1234);
    assert_eq!(map.map.string, "string");
}

#[test]
fn test_from_json_file() {
    let mut config = TestConfig::default();
    loader()
        .load_file(fixture("config_test.json"), &mut config)
        .unwrap();
    validate(&config);
}

#[test]
fn test_from_yaml_file() {
    let mut config = TestConfig::default();
    loader()
        .load_file(fixture("config_test.yaml"), &mut config)
        .unwrap();
    validate(&config);
}

#[test]
fn test_json_and_yaml_files_agree() {
    let from_json: TestConfig = loader().load(fixture("config_test.json")).unwrap();
    let from_yaml: TestConfig = loader().load(fixture("config_test.yaml")).unwrap();
    assert_eq!(from_json, from_yaml);
}

#[test]
fn test_example_file_with_port_override() {
    let config: AppConfig = ConfigLoader::new()
        .with_env(env(&[("PORT", "9000")]))
        .load(fixture("config_example.yaml"))
        .unwrap();

    assert_eq!(config.server.port, 9000);
    assert_eq!(
        config.database,
        DatabaseSection {
            driver: "postgres".to_string(),
            hostname: "localhost".to_string(),
            port: 5432,
            username: "postgres".to_string(),
            password: "dummy".to_string(),
            name: "my_database".to_string(),
        }
    );
}

#[test]
fn test_decode_file_skips_overrides() {
    std::env::set_var("KONFIG_IT_DECODE_ONLY_PORT", "1");

    #[derive(Debug, Default, Serialize, Deserialize, EnvOverride)]
    struct Server {
        #[env = "KONFIG_IT_DECODE_ONLY_PORT"]
        port: i16,
    }

    #[derive(Debug, Default, Serialize, Deserialize, EnvOverride)]
    struct Config {
        #[env(nested)]
        server: Server,
    }

    let mut config = Config::default();
    konfig::decode_file(fixture("config_example.yaml"), &mut config).unwrap();
    assert_eq!(config.server.port, 8080);

    konfig::load_file(fixture("config_example.yaml"), &mut config).unwrap();
    assert_eq!(config.server.port, 1);
}

#[test]
fn test_from_file_uses_process_env() {
    std::env::set_var("KONFIG_IT_FROM_FILE_STRING", "from-env");

    #[derive(Debug, Default, Serialize, Deserialize, EnvOverride)]
    struct Map {
        #[env = "KONFIG_IT_FROM_FILE_STRING"]
        string: String,
        integer: i64,
    }

    #[derive(Debug, Default, Serialize, Deserialize, EnvOverride)]
    struct Config {
        #[env(nested)]
        map: Map,
    }

    let config: Config = konfig::from_file(fixture("config_test.json")).unwrap();
    assert_eq!(config.map.string, "from-env");
    assert_eq!(config.map.integer, 1234);
}

#[test]
fn test_unsupported_extension_is_not_read() {
    let mut config = TestConfig::default();
    let err = loader()
        .load_file("/definitely/not/here/config.toml", &mut config)
        .unwrap_err();

    match err {
        ConfigError::UnsupportedFormat { extension } => assert_eq!(extension, ".toml"),
        other => panic!("Expected UnsupportedFormat error, got {other:?}"),
    }
}

#[test]
fn test_missing_file_is_read_error() {
    let mut config = TestConfig::default();
    let err = loader()
        .load_file("/definitely/not/here/config.json", &mut config)
        .unwrap_err();

    match err {
        ConfigError::Read { source, .. } => assert_eq!(source.kind(), ErrorKind::NotFound),
        other => panic!("Expected Read error, got {other:?}"),
    }
}

#[test]
fn test_extension_is_case_insensitive() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("CONFIG.YML");
    fs::write(&path, fs::read(fixture("config_test.yaml")).unwrap()).unwrap();

    let config: TestConfig = loader().load(&path).unwrap();
    validate(&config);
}

#[test]
fn test_malformed_json_is_decode_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.json");
    fs::write(&path, r#"{"map": {"integer": 1234,"#).unwrap();

    let mut config = TestConfig::default();
    let err = loader().load_file(&path, &mut config).unwrap_err();

    assert!(matches!(err, ConfigError::Decode { format: Format::Json, .. }));
    assert!(err.to_string().starts_with("while decoding JSON configuration"));
    assert_eq!(config, TestConfig::default());
}

#[test]
fn test_malformed_yaml_is_decode_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.yaml");
    fs::write(&path, "map:\n  integer: [1234\n").unwrap();

    let mut config = TestConfig::default();
    let err = loader().load_file(&path, &mut config).unwrap_err();

    assert!(matches!(err, ConfigError::Decode { format: Format::Yaml, .. }));
}

#[test]
fn test_partial_file_keeps_existing_values() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("partial.json");
    fs::write(&path, r#"{"map": {"map": {"integer": 7}}}"#).unwrap();

    let mut config = TestConfig::default();
    config.map.basic.string = "kept".to_string();
    config.map.map.string = "also kept".to_string();

    loader().load_file(&path, &mut config).unwrap();

    assert_eq!(config.map.basic.string, "kept");
    assert_eq!(config.map.map.string, "also kept");
    assert_eq!(config.map.map.integer, 7);
}

#[test]
fn test_dotenv_file_is_fallback() {
    let temp_dir = TempDir::new().unwrap();
    let dotenv = temp_dir.path().join(".env");
    fs::write(&dotenv, "PORT=7000\nUNUSED=1\n").unwrap();

    let config: AppConfig = ConfigLoader::new()
        .with_env(env(&[]))
        .with_dotenv_file(&dotenv)
        .unwrap()
        .load(fixture("config_example.yaml"))
        .unwrap();
    assert_eq!(config.server.port, 7000);

    let config: AppConfig = ConfigLoader::new()
        .with_env(env(&[("PORT", "9000")]))
        .with_dotenv_file(&dotenv)
        .unwrap()
        .load(fixture("config_example.yaml"))
        .unwrap();
    assert_eq!(config.server.port, 9000);
}

#[test]
fn test_missing_dotenv_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = ConfigLoader::new().with_dotenv_file(temp_dir.path().join(".env"));
    assert!(matches!(result, Err(ConfigError::Dotenv(_))));
}

#[derive(Debug, Serialize, Deserialize, EnvOverride)]
struct Limits {
    name: String,
    #[env = "LIMITS_RATE"]
    rate: f64,
    burst: u32,
    #[env(nested)]
    nested: Nested,
}

#[derive(Debug, Default, Serialize, Deserialize, EnvOverride)]
struct Nested {
    label: String,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            rate: f64::INFINITY,
            burst: 10,
            nested: Nested::default(),
        }
    }
}

#[test]
fn test_null_values_keep_existing() {
    let temp_dir = TempDir::new().unwrap();
    let json = temp_dir.path().join("limits.json");
    fs::write(&json, r#"{"name": null, "burst": null, "nested": {"label": "set"}}"#).unwrap();
    let yaml = temp_dir.path().join("limits.yaml");
    fs::write(&yaml, "name:\nburst: ~\nnested:\n  label: set\n").unwrap();

    for path in [json, yaml] {
        let limits: Limits = loader().load(&path).unwrap();
        assert_eq!(limits.name, "default");
        assert_eq!(limits.burst, 10);
        assert_eq!(limits.nested.label, "set");
    }
}

#[test]
fn test_non_finite_default_survives_partial_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("limits.json");
    fs::write(&path, r#"{"burst": 3}"#).unwrap();

    let limits: Limits = loader().load(&path).unwrap();
    assert_eq!(limits.burst, 3);
    assert!(limits.rate.is_infinite() && limits.rate.is_sign_positive());

    let limits: Limits = ConfigLoader::new()
        .with_env(env(&[("LIMITS_RATE", "NaN")]))
        .load(&path)
        .unwrap();
    assert!(limits.rate.is_nan());
}

#[test]
fn test_keys_match_fields_ignoring_case() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("limits.yaml");
    fs::write(&path, "Name: upper\nBURST: 42\nNested:\n  Label: deep\n").unwrap();

    let limits: Limits = loader().load(&path).unwrap();
    assert_eq!(limits.name, "upper");
    assert_eq!(limits.burst, 42);
    assert_eq!(limits.nested.label, "deep");
}
