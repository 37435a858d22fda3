//! # OtoMusic Configuration Module
//!
//! Configuration management for OtoMusic:
//! - embedded default configuration merged with an optional YAML file,
//! - environment variable overrides,
//! - type-safe getters and setters with defaults,
//! - thread-safe singleton access.
//!
//! ## Usage
//!
//! ```no_run
//! use otoconfig::get_config;
//!
//! let config = get_config();
//! let guest = config.get_guest_identity();
//! let resume = config.get_resume_enabled();
//! ```

use anyhow::{Result, anyhow};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Value};
use std::{
    env, fs,
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::{info, warn};

// Embedded default configuration
const DEFAULT_CONFIG: &str = include_str!("otomusic.yaml");

const ENV_CONFIG_DIR: &str = "OTOMUSIC_CONFIG";
const ENV_PREFIX: &str = "OTOMUSIC_CONFIG__";

const DEFAULT_GUEST_IDENTITY: &str = "guest";
const DEFAULT_RESUME_ENABLED: bool = true;
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;

lazy_static! {
    static ref CONFIG: Arc<Config> = Arc::new(Config::load_config("").unwrap_or_else(|err| {
        warn!(error = %err, "Failed to load configuration; using embedded defaults");
        Config::from_embedded()
    }));
}

/// Macro to generate getter/setter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> bool {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => b,
                _ => $default,
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Macro to generate getter/setter for non-empty string values with default
macro_rules! impl_string_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> String {
            match self.get_value($path) {
                Ok(Value::String(s)) if !s.is_empty() => s,
                _ => $default.to_string(),
            }
        }

        pub fn $setter(&self, value: String) -> Result<()> {
            self.set_value($path, Value::String(value))
        }
    };
}

/// Configuration manager for OtoMusic.
///
/// Holds the merged YAML tree (embedded defaults, optional user file,
/// environment overrides) and exposes typed accessors. Setters persist to
/// the config file when one is writable.
#[derive(Debug)]
pub struct Config {
    path: Option<String>,
    data: Mutex<Value>,
}

impl Config {
    /// Finds a config directory by trying different locations in order:
    /// the provided directory, the `OTOMUSIC_CONFIG` environment variable,
    /// `.otomusic` in the current directory, `.otomusic` in the home
    /// directory. Returns `None` when none of those exists.
    fn find_config_dir(directory: &str) -> Option<String> {
        if !directory.is_empty() {
            return Some(directory.to_string());
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Using config dir from environment");
            return Some(env_path);
        }

        if Path::new(".otomusic").exists() {
            return Some(".otomusic".to_string());
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(".otomusic");
            if home_config.exists() {
                return Some(home_config.to_string_lossy().to_string());
            }
        }

        None
    }

    /// Configuration built purely from the embedded defaults.
    pub fn from_embedded() -> Self {
        let data: Value = serde_yaml::from_str(DEFAULT_CONFIG)
            .expect("embedded default configuration is valid YAML");
        Config {
            path: None,
            data: Mutex::new(Self::lower_keys_value(data)),
        }
    }

    /// Loads the configuration:
    /// 1. parse the embedded defaults,
    /// 2. merge `config.yaml` from the config directory when present,
    /// 3. apply environment variable overrides.
    pub fn load_config(directory: &str) -> Result<Self> {
        let mut merged: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        let path = Self::find_config_dir(directory).map(|dir| {
            Path::new(&dir)
                .join("config.yaml")
                .to_string_lossy()
                .to_string()
        });

        if let Some(ref file) = path {
            match fs::read(file) {
                Ok(bytes) => {
                    info!(config_file = %file, "Loaded config file");
                    let external: Value = serde_yaml::from_slice(&bytes)?;
                    merge_yaml(&mut merged, &external);
                }
                Err(_) => {
                    info!(config_file = %file, "Config file not found, using embedded defaults");
                }
            }
        }

        let mut data = Self::lower_keys_value(merged);
        Self::apply_env_overrides(&mut data);

        Ok(Config {
            path,
            data: Mutex::new(data),
        })
    }

    /// Saves the current configuration to its config file, if one is set.
    pub fn save(&self) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }
        let data = self.data.lock().unwrap();
        let yaml = serde_yaml::to_string(&*data)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it.
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        {
            let mut data = self.data.lock().unwrap();
            Self::set_value_internal(&mut data, path, value)?;
        }
        self.save()
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if let Value::Mapping(map) = data {
            let key = Value::String(path[0].to_lowercase());
            if path.len() == 1 {
                map.insert(key, value);
            } else {
                let entry = map.entry(key).or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    /// Gets a configuration value at the specified path.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data.lock().unwrap();
        Self::get_value_internal(&data, path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut current = data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                let key = key.to_lowercase();
                if let Some(next) = map.get(&Value::String(key)) {
                    current = next;
                } else {
                    return Err(anyhow!("Path {} does not exist", path[..=i].join(".")));
                }
            } else {
                return Err(anyhow!("Path {} is not a mapping", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    fn apply_env_overrides(config: &mut Value) {
        for (key, value) in env::vars() {
            if key.starts_with(ENV_PREFIX) {
                let key_path = key
                    .trim_start_matches(ENV_PREFIX)
                    .split("__")
                    .collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(&value);
                let _ = Self::set_value_internal(config, &key_path, yaml_value);
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        if let Ok(parsed) = serde_yaml::from_str::<Value>(value) {
            return parsed;
        }
        Value::String(value.to_string())
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    if let Value::String(s) = k {
                        new_map.insert(Value::String(s.to_lowercase()), Self::lower_keys_value(v));
                    } else {
                        new_map.insert(k, Self::lower_keys_value(v));
                    }
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    impl_string_config!(
        get_guest_identity,
        set_guest_identity,
        &["player", "guest_identity"],
        DEFAULT_GUEST_IDENTITY
    );

    impl_bool_config!(
        get_resume_enabled,
        set_resume_enabled,
        &["player", "resume_enabled"],
        DEFAULT_RESUME_ENABLED
    );

    impl_string_config!(
        get_log_min_level,
        set_log_min_level,
        &["logger", "min_level"],
        DEFAULT_LOG_MIN_LEVEL
    );

    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );
}

/// Returns the global configuration instance, lazily loaded on first
/// access.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Merges external YAML configuration into default configuration.
///
/// Mappings merge recursively; scalars and sequences from the external
/// tree replace the defaults.
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
    fn embedded_defaults_parse_and_expose_expected_values() {
        let config = Config::from_embedded();
        assert_eq!(config.get_guest_identity(), "guest");
        assert!(config.get_resume_enabled());
        assert_eq!(config.get_log_min_level(), "INFO");
        assert!(config.get_log_enable_console());
    }

    #[test]
    fn set_value_round_trips_in_memory() {
        let config = Config::from_embedded();
        config
            .set_value(&["player", "guest_identity"], Value::String("anon".into()))
            .unwrap();
        assert_eq!(config.get_guest_identity(), "anon");
    }

    #[test]
    fn empty_string_falls_back_to_default() {
        let config = Config::from_embedded();
        config
            .set_value(&["player", "guest_identity"], Value::String(String::new()))
            .unwrap();
        assert_eq!(config.get_guest_identity(), "guest");
    }

    #[test]
    fn merge_prefers_external_scalars_and_keeps_missing_defaults() {
        let mut default: Value = serde_yaml::from_str(DEFAULT_CONFIG).unwrap();
        let external: Value =
            serde_yaml::from_str("player:\n  resume_enabled: false\n").unwrap();

        merge_yaml(&mut default, &external);
        let config = Config {
            path: None,
            data: Mutex::new(Config::lower_keys_value(default)),
        };

        assert!(!config.get_resume_enabled());
        assert_eq!(config.get_guest_identity(), "guest");
    }

    #[test]
    fn keys_are_case_insensitive() {
        let config = Config::from_embedded();
        assert!(config.get_value(&["PLAYER", "Guest_Identity"]).is_ok());
    }

    #[test]
    fn env_values_convert_to_yaml_types() {
        assert_eq!(Config::convert_env_value("true"), Value::Bool(true));
        assert_eq!(
            Config::convert_env_value("plain text"),
            Value::String("plain text".into())
        );
    }
}
