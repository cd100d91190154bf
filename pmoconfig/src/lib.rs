//! # PMOTv Configuration Module
//!
//! This module provides configuration management for PMOTv, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Typed getters and setters for the scheduling and logging knobs
//!
//! ## Usage
//!
//! ```no_run
//! use pmoconfig::get_config;
//!
//! let config = get_config();
//! let cooldown = config.get_filler_repeat_cooldown_ms()?;
//! let level = config.get_log_min_level()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::{info, warn};

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pmotv.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load PMOTv configuration"));
}

const ENV_CONFIG_DIR: &str = "PMOTV_CONFIG";
const ENV_PREFIX: &str = "PMOTV_CONFIG__";
const CONFIG_DIR_NAME: &str = ".pmotv";

const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;
const DEFAULT_FILLER_REPEAT_COOLDOWN_MS: i64 = 30 * 60 * 1000;
const DEFAULT_OFFLINE_SCREEN_CAP_MS: i64 = 10 * 60 * 1000;
const DEFAULT_FIRST_TUNE_EXTENSION_MS: i64 = 7 * 24 * 60 * 60 * 1000;
const DEFAULT_SMOOTHING_THRESHOLD_MS: i64 = 30 * 1000;

/// Generates a getter/setter pair for millisecond values stored as integers
macro_rules! impl_millis_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<i64> {
            match self.get_value($path) {
                Ok(Value::Number(n)) => match n.as_i64() {
                    Some(v) if v >= 0 => Ok(v),
                    _ => Err(anyhow!(
                        "{} must be a non-negative integer number of milliseconds",
                        $path.join(".")
                    )),
                },
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, millis: i64) -> Result<()> {
            self.set_value($path, Value::Number(Number::from(millis)))
        }
    };
}

/// Generates a getter/setter pair for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<bool> {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => Ok(b),
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Configuration manager for PMOTv
///
/// Holds the merged YAML tree behind a mutex. A configuration loaded from a
/// directory is written back to `config.yaml` on every change; one built
/// from a string lives only in memory.
#[derive(Debug)]
pub struct Config {
    config_dir: PathBuf,
    path: Option<PathBuf>,
    data: Mutex<Value>,
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> PathBuf {
        if !directory.is_empty() {
            return PathBuf::from(directory);
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return PathBuf::from(env_path);
        }

        if Path::new(CONFIG_DIR_NAME).exists() {
            return PathBuf::from(CONFIG_DIR_NAME);
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_DIR_NAME);
            if home_config.exists() {
                return home_config;
            }
        }

        PathBuf::from(CONFIG_DIR_NAME)
    }

    /// Creates the directory if needed and checks that it is writable
    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }

        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        Ok(())
    }

    /// Loads the configuration from the specified directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `PMOTV_CONFIG` environment variable
    /// 3. `.pmotv` in the current directory
    /// 4. `.pmotv` in the user's home directory
    ///
    /// The embedded defaults are merged with `config.yaml` (if present),
    /// then `PMOTV_CONFIG__SECTION__KEY=value` variables are applied and the
    /// result is saved back.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);
        Self::validate_config_dir(&config_dir)?;
        info!(config_dir = %config_dir.display(), "Using config directory");

        let path = config_dir.join("config.yaml");

        let external = match fs::read(&path) {
            Ok(data) => {
                info!(config_file = %path.display(), "Loaded config file");
                Some(serde_yaml::from_slice::<Value>(&data)?)
            }
            Err(_) => {
                info!(config_file = %path.display(), "Config file not found, using default embedded config");
                None
            }
        };

        let config = Self::build(config_dir, Some(path), external.as_ref())?;
        config.save()?;
        Ok(config)
    }

    /// Builds an in-memory configuration from a YAML document
    ///
    /// The document is merged over the embedded defaults exactly like a
    /// `config.yaml` file would be, but nothing is ever written to disk.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let external: Value = serde_yaml::from_str(yaml)?;
        Self::build(PathBuf::from("."), None, Some(&external))
    }

    fn build(config_dir: PathBuf, path: Option<PathBuf>, external: Option<&Value>) -> Result<Self> {
        let mut value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
        if let Some(external) = external {
            merge_yaml(&mut value, &lower_keys_value(external.clone()));
        }
        let mut value = lower_keys_value(value);
        apply_env_overrides(&mut value);

        Ok(Config {
            config_dir,
            path,
            data: Mutex::new(value),
        })
    }

    fn data(&self) -> MutexGuard<'_, Value> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Saves the current configuration to `config.yaml` (no-op in memory)
    pub fn save(&self) -> Result<()> {
        if let Some(path) = &self.path {
            let yaml = serde_yaml::to_string(&*self.data())?;
            fs::write(path, yaml)?;
        }
        Ok(())
    }

    /// Directory holding `config.yaml`
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["scheduling", "random_seed"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        {
            let mut data = self.data();
            set_value_internal(&mut data, path, value)?;
        }
        self.save()
    }

    /// Gets a configuration value at the specified path
    ///
    /// Returns an error if the path doesn't exist.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data();
        let mut current = &*data;
        for (i, key) in path.iter().enumerate() {
            match current {
                Value::Mapping(map) => match map.get(key.to_lowercase().as_str()) {
                    Some(next) => current = next,
                    None => return Err(anyhow!("Path {} does not exist", path[..=i].join("."))),
                },
                _ => return Err(anyhow!("Path {} is not a mapping", path[..i].join("."))),
            }
        }
        Ok(current.clone())
    }

    /// Récupère un répertoire géré par la configuration
    ///
    /// Le répertoire peut être absolu ou relatif au répertoire de
    /// configuration. Il est créé s'il n'existe pas.
    ///
    /// # Exemple
    ///
    /// ```no_run
    /// use pmoconfig::get_config;
    ///
    /// let config = get_config();
    /// let dir = config.get_managed_dir(&["scheduling", "output", "directory"], "schedules")?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn get_managed_dir(&self, path: &[&str], default: &str) -> Result<PathBuf> {
        let dir_path = match self.get_value(path) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => {
                self.set_value(path, Value::String(default.to_string()))?;
                default.to_string()
            }
        };

        let dir = Path::new(&dir_path);
        let absolute = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.config_dir.join(dir)
        };

        if !absolute.exists() {
            fs::create_dir_all(&absolute)?;
            info!(directory = %absolute.display(), "Created managed directory");
        }
        Ok(absolute)
    }

    /// Récupère le niveau de log minimum depuis la configuration
    pub fn get_log_min_level(&self) -> Result<String> {
        match self.get_value(&["host", "logger", "min_level"]) {
            Ok(Value::String(s)) => Ok(s),
            _ => Ok(DEFAULT_LOG_MIN_LEVEL.to_string()),
        }
    }

    /// Définit le niveau de log minimum dans la configuration
    pub fn set_log_min_level(&self, level: String) -> Result<()> {
        self.set_value(&["host", "logger", "min_level"], Value::String(level))
    }

    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    impl_millis_config!(
        get_filler_repeat_cooldown_ms,
        set_filler_repeat_cooldown_ms,
        &["scheduling", "filler_repeat_cooldown_ms"],
        DEFAULT_FILLER_REPEAT_COOLDOWN_MS
    );

    impl_millis_config!(
        get_offline_screen_cap_ms,
        set_offline_screen_cap_ms,
        &["scheduling", "offline_screen_cap_ms"],
        DEFAULT_OFFLINE_SCREEN_CAP_MS
    );

    impl_millis_config!(
        get_first_tune_extension_ms,
        set_first_tune_extension_ms,
        &["scheduling", "first_tune_extension_ms"],
        DEFAULT_FIRST_TUNE_EXTENSION_MS
    );

    impl_millis_config!(
        get_smoothing_threshold_ms,
        set_smoothing_threshold_ms,
        &["scheduling", "smoothing_threshold_ms"],
        DEFAULT_SMOOTHING_THRESHOLD_MS
    );

    /// Graine du générateur aléatoire partagé, `None` pour une graine système
    pub fn get_random_seed(&self) -> Result<Option<u64>> {
        match self.get_value(&["scheduling", "random_seed"]) {
            Ok(Value::Number(n)) => n
                .as_u64()
                .map(Some)
                .ok_or_else(|| anyhow!("scheduling.random_seed must be a non-negative integer")),
            Ok(Value::String(s)) => Ok(Some(s.parse::<u64>()?)),
            _ => Ok(None),
        }
    }

    pub fn set_random_seed(&self, seed: Option<u64>) -> Result<()> {
        let value = match seed {
            Some(seed) => Value::Number(Number::from(seed)),
            None => Value::Null,
        };
        self.set_value(&["scheduling", "random_seed"], value)
    }
}

/// Returns the global configuration instance
///
/// The instance is lazily loaded on first access.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    if path.is_empty() {
        *data = value;
        return Ok(());
    }
    match data {
        Value::Mapping(map) => {
            let key = Value::String(path[0].to_lowercase());
            if path.len() == 1 {
                map.insert(key, value);
            } else {
                let entry = map.entry(key).or_insert(Value::Mapping(Mapping::new()));
                // Un scalaire sur le chemin est remplacé par un nœud
                if !entry.is_mapping() {
                    *entry = Value::Mapping(Mapping::new());
                }
                set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        }
        _ => Err(anyhow!("Current node is not a map")),
    }
}

fn apply_env_overrides(config: &mut Value) {
    for (key, value) in env::vars() {
        if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
            let key_path = stripped.split("__").collect::<Vec<_>>();
            let yaml_value =
                serde_yaml::from_str::<Value>(&value).unwrap_or(Value::String(value.clone()));
            if let Err(e) = set_value_internal(config, &key_path, yaml_value) {
                warn!(variable = %key, "Ignoring env override: {}", e);
            }
        }
    }
}

fn lower_keys_value(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| {
                    let k = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (k, lower_keys_value(v))
                })
                .collect(),
        ),
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys_value).collect()),
        _ => value,
    }
}

/// Merges external YAML configuration into default configuration
///
/// Mappings are merged key by key; scalars and sequences from `external`
/// replace the default value.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults() {
        let config = Config::from_yaml_str("{}").unwrap();
        assert_eq!(config.get_filler_repeat_cooldown_ms().unwrap(), 1_800_000);
        assert_eq!(config.get_offline_screen_cap_ms().unwrap(), 600_000);
        assert_eq!(config.get_first_tune_extension_ms().unwrap(), 604_800_000);
        assert_eq!(config.get_smoothing_threshold_ms().unwrap(), 30_000);
        assert_eq!(config.get_random_seed().unwrap(), None);
        assert!(config.get_log_enable_console().unwrap());
    }

    #[test]
    fn test_external_values_override_defaults() {
        let config = Config::from_yaml_str(
            "Scheduling:\n  Filler_Repeat_Cooldown_Ms: 60000\n  random_seed: 42\n",
        )
        .unwrap();
        assert_eq!(config.get_filler_repeat_cooldown_ms().unwrap(), 60_000);
        assert_eq!(config.get_random_seed().unwrap(), Some(42));
        // Les autres clés de la section restent présentes
        assert_eq!(config.get_smoothing_threshold_ms().unwrap(), 30_000);
    }

    #[test]
    fn test_negative_millis_rejected() {
        let config = Config::from_yaml_str("scheduling:\n  offline_screen_cap_ms: -5\n").unwrap();
        assert!(config.get_offline_screen_cap_ms().is_err());
    }

    #[test]
    fn test_set_and_get_value() {
        let config = Config::from_yaml_str("{}").unwrap();
        config.set_random_seed(Some(7)).unwrap();
        assert_eq!(config.get_random_seed().unwrap(), Some(7));
        config.set_random_seed(None).unwrap();
        assert_eq!(config.get_random_seed().unwrap(), None);
        assert!(config.get_value(&["nope", "missing"]).is_err());
    }

    #[test]
    fn test_load_config_writes_merged_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "host:\n  logger:\n    min_level: DEBUG\n",
        )
        .unwrap();

        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(config.get_log_min_level().unwrap(), "DEBUG");

        let saved = fs::read_to_string(dir.path().join("config.yaml")).unwrap();
        assert!(saved.contains("smoothing_threshold_ms"));
    }

    #[test]
    fn test_managed_dir_is_relative_to_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        let out = config
            .get_managed_dir(&["scheduling", "output", "directory"], "schedules")
            .unwrap();
        assert_eq!(out, dir.path().join("schedules"));
        assert!(out.is_dir());
    }
}
