//! Configuration loader for messagehub
//!
//! `ConfigLoader` resolves where configuration comes from (a directory of
//! layered TOML files or a single file), which environment overlay applies,
//! and then merges `MESSAGEHUB_*` environment variables on top.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

/// Environment variable for configuration directory
const CONFIG_DIR_ENV: &str = "MESSAGEHUB_CONFIG_DIR";

/// Environment variable for a single configuration file
const CONFIG_FILE_ENV: &str = "MESSAGEHUB_CONFIG_FILE";

const DEFAULT_CONFIG_DIR: &str = "config";

/// Environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "MESSAGEHUB";

/// Separator for nested keys: `MESSAGEHUB_SERVER__PORT` -> `server.port`
const ENV_SEPARATOR: &str = "__";

/// Where the settings are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    /// `default.toml`, `{environment}.toml`, `local.toml` in a directory.
    Layered(PathBuf),
    /// One file, no overlays.
    Single(PathBuf),
}

/// Layered configuration loader
///
/// Sources in order of priority (lowest first):
/// 1. `default.toml` (required)
/// 2. `{environment}.toml` (optional)
/// 3. `local.toml` (optional)
/// 4. `MESSAGEHUB_*` environment variables
///
/// In single-file mode only the file and the environment variables apply.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    source: Source,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Create a loader from the process environment
    ///
    /// Reads `MESSAGEHUB_CONFIG_DIR`, `MESSAGEHUB_CONFIG_FILE` and
    /// `MESSAGEHUB_APP_ENV`.
    ///
    /// # Errors
    ///
    /// Returns `MutualExclusivityError` if both `MESSAGEHUB_CONFIG_DIR` and
    /// `MESSAGEHUB_CONFIG_FILE` are set.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV).ok();
        let config_file = std::env::var(CONFIG_FILE_ENV).ok();

        let source = match (config_dir, config_file) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::mutual_exclusivity(format!(
                    "{CONFIG_DIR_ENV} and {CONFIG_FILE_ENV} cannot both be set. \
                     Use {CONFIG_DIR_ENV} for layered configuration or \
                     {CONFIG_FILE_ENV} for a single configuration file."
                )));
            }
            (None, Some(file)) => Source::Single(PathBuf::from(file)),
            (Some(dir), None) => Source::Layered(PathBuf::from(dir)),
            (None, None) => Source::Layered(PathBuf::from(DEFAULT_CONFIG_DIR)),
        };

        Ok(Self {
            source,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Switch to single-file mode, as `--config FILE` does.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Source::Single(path.into());
        self
    }

    /// Override the environment overlay, as `--env` does.
    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    /// The configuration directory, or `None` in single-file mode
    pub fn config_dir(&self) -> Option<&Path> {
        match &self.source {
            Source::Layered(dir) => Some(dir),
            Source::Single(_) => None,
        }
    }

    /// Load, deserialize and validate the settings
    ///
    /// # Errors
    ///
    /// - `FileNotFound` when `default.toml` (or the single file) is missing
    /// - `ParseError` when the merged sources do not deserialize
    /// - `ValidationError` when a value is out of range
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let config = self.build_config()?;
        let settings: Settings = config.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })?;

        settings.validate()?;

        Ok(settings)
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = match &self.source {
            Source::Single(file) => add_file_source(Config::builder(), file, true)?,
            Source::Layered(dir) => {
                let builder = add_file_source(Config::builder(), &dir.join("default.toml"), true)?;
                let env_file = dir.join(format!("{}.toml", self.environment.as_str()));
                let builder = add_file_source(builder, &env_file, false)?;
                add_file_source(builder, &dir.join("local.toml"), false)?
            }
        };

        add_env_source(builder).build().map_err(ConfigError::from)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            source: Source::Layered(PathBuf::from(DEFAULT_CONFIG_DIR)),
            environment: AppEnvironment::default(),
        })
    }
}

fn add_file_source(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
    required: bool,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if required && !path.exists() {
        return Err(ConfigError::file_not_found(format!(
            "Required configuration file not found: {}",
            path.display()
        )));
    }

    Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(required)))
}

/// Environment values are kept as strings and parsed by the typed fields on
/// deserialize, so `+`-prefixed phone numbers are not read as integers.
fn add_env_source(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator(ENV_SEPARATOR)
            .ignore_empty(true),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::ProviderKind;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Tests mutate process-wide env vars; run them one at a time
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    const MANAGED_VARS: &[&str] = &[
        CONFIG_DIR_ENV,
        CONFIG_FILE_ENV,
        "MESSAGEHUB_APP_ENV",
        "MESSAGEHUB_SERVER__PORT",
        "MESSAGEHUB_DATABASE__URL",
        "MESSAGEHUB_PROVIDERS__SMS__KIND",
        "MESSAGEHUB_PROVIDERS__SMS__TWILIO__ACCOUNT_SID",
        "MESSAGEHUB_PROVIDERS__SMS__TWILIO__AUTH_TOKEN",
        "MESSAGEHUB_PROVIDERS__SMS__TWILIO__FROM_NUMBER",
    ];

    const DEFAULT_TOML: &str = r#"
[application]
name = "messagehub-test"
version = "1.0.0"

[server]
host = "127.0.0.1"
port = 3000

[database]
url = ""

[logger]
level = "info"

[dispatch]
send_timeout_seconds = 20

[providers.sms]
kind = "console"

[providers.email]
kind = "console"
"#;

    fn setup_config_dir(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        for (name, content) in files {
            fs::write(temp_dir.path().join(name), content).expect("Failed to write config file");
        }
        temp_dir
    }

    /// Clears every managed variable and restores the originals on drop
    struct EnvGuard {
        saved: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn clean() -> Self {
            let saved = MANAGED_VARS
                .iter()
                .map(|key| (key.to_string(), std::env::var(key).ok()))
                .collect();
            for key in MANAGED_VARS {
                unsafe { std::env::remove_var(key) };
            }
            Self { saved }
        }

        fn set(&mut self, key: &str, value: &str) {
            unsafe { std::env::set_var(key, value) };
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, original) in &self.saved {
                unsafe {
                    match original {
                        Some(value) => std::env::set_var(key, value),
                        None => std::env::remove_var(key),
                    }
                }
            }
        }
    }

    #[test]
    fn test_loader_defaults_to_config_dir() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let _env = EnvGuard::clean();

        let loader = ConfigLoader::new().expect("Should create loader");
        assert_eq!(loader.config_dir(), Some(Path::new("config")));
        assert_eq!(loader.environment(), AppEnvironment::Development);
    }

    #[test]
    fn test_loader_mutual_exclusivity_error() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::clean();
        env.set(CONFIG_DIR_ENV, "/custom/config");
        env.set(CONFIG_FILE_ENV, "/path/to/config.toml");

        match ConfigLoader::new() {
            Err(ConfigError::MutualExclusivityError(msg)) => {
                assert!(msg.contains(CONFIG_DIR_ENV));
                assert!(msg.contains(CONFIG_FILE_ENV));
            }
            other => panic!("Expected MutualExclusivityError, got {other:?}"),
        }
    }

    #[test]
    fn test_load_missing_default_toml() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::clean();
        let temp_dir = setup_config_dir(&[]);
        env.set(CONFIG_DIR_ENV, temp_dir.path().to_str().unwrap());

        match ConfigLoader::new().unwrap().load() {
            Err(ConfigError::FileNotFound(msg)) => assert!(msg.contains("default.toml")),
            other => panic!("Expected FileNotFound error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_layered_precedence() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::clean();

        let production = r#"
[server]
host = "0.0.0.0"
port = 8080

[dispatch]
send_timeout_seconds = 5
"#;
        let local = r#"
[server]
port = 9999
"#;
        let temp_dir = setup_config_dir(&[
            ("default.toml", DEFAULT_TOML),
            ("production.toml", production),
            ("local.toml", local),
        ]);
        env.set(CONFIG_DIR_ENV, temp_dir.path().to_str().unwrap());
        env.set("MESSAGEHUB_APP_ENV", "production");

        let settings = ConfigLoader::new().unwrap().load().expect("Should load settings");

        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 9999);
        assert_eq!(settings.dispatch.send_timeout_seconds, 5);
        assert_eq!(settings.application.name, "messagehub-test");
    }

    #[test]
    fn test_env_vars_override_files() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::clean();
        let temp_dir = setup_config_dir(&[("default.toml", DEFAULT_TOML)]);
        env.set(CONFIG_DIR_ENV, temp_dir.path().to_str().unwrap());
        env.set("MESSAGEHUB_SERVER__PORT", "4000");
        env.set("MESSAGEHUB_DATABASE__URL", "postgres://env-override/db");

        let settings = ConfigLoader::new().unwrap().load().expect("Should load settings");

        assert_eq!(settings.server.port, 4000);
        assert_eq!(settings.database.url, "postgres://env-override/db");
        assert_eq!(settings.server.host, "127.0.0.1");
    }

    #[test]
    fn test_env_vars_select_provider_and_keep_plus_prefix() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::clean();
        let temp_dir = setup_config_dir(&[("default.toml", DEFAULT_TOML)]);
        env.set(CONFIG_DIR_ENV, temp_dir.path().to_str().unwrap());
        env.set("MESSAGEHUB_PROVIDERS__SMS__KIND", "twilio");
        env.set("MESSAGEHUB_PROVIDERS__SMS__TWILIO__ACCOUNT_SID", "AC123");
        env.set("MESSAGEHUB_PROVIDERS__SMS__TWILIO__AUTH_TOKEN", "secret");
        env.set("MESSAGEHUB_PROVIDERS__SMS__TWILIO__FROM_NUMBER", "+15550009999");

        let settings = ConfigLoader::new().unwrap().load().expect("Should load settings");

        assert_eq!(settings.providers.sms.kind, ProviderKind::Twilio);
        assert_eq!(settings.providers.sms.twilio.from_number, "+15550009999");
    }

    #[test]
    fn test_single_file_mode_skips_overlays() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let _env = EnvGuard::clean();

        let temp_dir = setup_config_dir(&[
            ("single.toml", DEFAULT_TOML),
            ("local.toml", "[server]\nport = 1234\n"),
        ]);

        let loader = ConfigLoader::new()
            .unwrap()
            .with_config_file(temp_dir.path().join("single.toml"));
        let settings = loader.load().expect("Should load settings");

        assert!(loader.config_dir().is_none());
        assert_eq!(settings.server.port, 3000);
    }

    #[test]
    fn test_with_environment_overrides_env_var() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::clean();
        let temp_dir = setup_config_dir(&[
            ("default.toml", DEFAULT_TOML),
            ("test.toml", "[server]\nport = 7777\n"),
        ]);
        env.set(CONFIG_DIR_ENV, temp_dir.path().to_str().unwrap());
        env.set("MESSAGEHUB_APP_ENV", "production");

        let settings = ConfigLoader::new()
            .unwrap()
            .with_environment(AppEnvironment::Test)
            .load()
            .expect("Should load settings");

        assert_eq!(settings.server.port, 7777);
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let _lock = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::clean();
        let temp_dir = setup_config_dir(&[
            ("default.toml", DEFAULT_TOML),
            ("local.toml", "[providers.email]\nkind = \"twilio\"\n"),
        ]);
        env.set(CONFIG_DIR_ENV, temp_dir.path().to_str().unwrap());

        let err = ConfigLoader::new().unwrap().load().unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError { field, .. } if field == "providers.email.kind")
        );
    }
}
