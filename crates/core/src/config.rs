use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpq::defaults::DefaultPolicy;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["quotecraft.toml", "config/quotecraft.toml"];

pub const DRAWER_WEIGHT_CLASSES: [&str; 2] = ["30KG", "50KG"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub pricing: PricingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub path: PathBuf,
    pub onsite_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct PricingConfig {
    pub default_finish: String,
    pub default_drawer_weight: String,
    /// Apply the recompute total policy to every component category.
    pub uniform_recompute: bool,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub catalog_path: Option<PathBuf>,
    pub onsite_path: Option<PathBuf>,
    pub uniform_recompute: Option<bool>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        let defaults = DefaultPolicy::default();
        Self {
            catalog: CatalogConfig {
                path: PathBuf::from("catalog/rates.json"),
                onsite_path: PathBuf::from("catalog/onsite.json"),
            },
            pricing: PricingConfig {
                default_finish: defaults.finish,
                default_drawer_weight: defaults.drawer_weight,
                uniform_recompute: false,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl PricingConfig {
    pub fn default_policy(&self) -> DefaultPolicy {
        DefaultPolicy {
            finish: self.default_finish.clone(),
            drawer_weight: self.default_drawer_weight.clone(),
            ..DefaultPolicy::default()
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = path;
            }
            if let Some(onsite_path) = catalog.onsite_path {
                self.catalog.onsite_path = onsite_path;
            }
        }

        if let Some(pricing) = patch.pricing {
            if let Some(default_finish) = pricing.default_finish {
                self.pricing.default_finish = default_finish;
            }
            if let Some(default_drawer_weight) = pricing.default_drawer_weight {
                self.pricing.default_drawer_weight = default_drawer_weight;
            }
            if let Some(uniform_recompute) = pricing.uniform_recompute {
                self.pricing.uniform_recompute = uniform_recompute;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("QUOTECRAFT_CATALOG_PATH") {
            self.catalog.path = PathBuf::from(value);
        }
        if let Some(value) = read_env("QUOTECRAFT_CATALOG_ONSITE_PATH") {
            self.catalog.onsite_path = PathBuf::from(value);
        }

        if let Some(value) = read_env("QUOTECRAFT_PRICING_DEFAULT_FINISH") {
            self.pricing.default_finish = value;
        }
        if let Some(value) = read_env("QUOTECRAFT_PRICING_DEFAULT_DRAWER_WEIGHT") {
            self.pricing.default_drawer_weight = value;
        }
        if let Some(value) = read_env("QUOTECRAFT_PRICING_UNIFORM_RECOMPUTE") {
            self.pricing.uniform_recompute =
                parse_bool("QUOTECRAFT_PRICING_UNIFORM_RECOMPUTE", &value)?;
        }

        let log_level =
            read_env("QUOTECRAFT_LOGGING_LEVEL").or_else(|| read_env("QUOTECRAFT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("QUOTECRAFT_LOGGING_FORMAT").or_else(|| read_env("QUOTECRAFT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = catalog_path;
        }
        if let Some(onsite_path) = overrides.onsite_path {
            self.catalog.onsite_path = onsite_path;
        }
        if let Some(uniform_recompute) = overrides.uniform_recompute {
            self.pricing.uniform_recompute = uniform_recompute;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_pricing(&self.pricing)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Explicit path if it exists, otherwise the first existing default candidate.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("catalog.path must not be empty".to_string()));
    }
    if catalog.onsite_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("catalog.onsite_path must not be empty".to_string()));
    }
    Ok(())
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    if pricing.default_finish.trim().is_empty() {
        return Err(ConfigError::Validation(
            "pricing.default_finish must not be blank".to_string(),
        ));
    }

    if !DRAWER_WEIGHT_CLASSES.contains(&pricing.default_drawer_weight.as_str()) {
        return Err(ConfigError::Validation(format!(
            "pricing.default_drawer_weight must be one of {} (got `{}`)",
            DRAWER_WEIGHT_CLASSES.join("|"),
            pricing.default_drawer_weight
        )));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    pricing: Option<PricingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
    onsite_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    default_finish: Option<String>,
    default_drawer_weight: Option<String>,
    uniform_recompute: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_match_the_pricing_default_policy() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;
        let policy = config.pricing.default_policy();

        ensure(policy.finish == "WHITE", "finish should default to WHITE")?;
        ensure(policy.drawer_weight == "30KG", "drawer weight should default to 30KG")?;
        ensure(!config.pricing.uniform_recompute, "uniform recompute should default off")?;
        ensure(
            config.catalog.path == PathBuf::from("catalog/rates.json"),
            "catalog path should default to catalog/rates.json",
        )?;
        Ok(())
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        env::set_var("TEST_QUOTECRAFT_RATES_DIR", "/srv/rates");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("quotecraft.toml");
            fs::write(
                &path,
                r#"
[catalog]
path = "${TEST_QUOTECRAFT_RATES_DIR}/kitchen.json"
onsite_path = "${TEST_QUOTECRAFT_RATES_DIR}/onsite.json"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.catalog.path == PathBuf::from("/srv/rates/kitchen.json"),
                "catalog path should be interpolated from environment",
            )?;
            ensure(
                config.catalog.onsite_path == PathBuf::from("/srv/rates/onsite.json"),
                "onsite path should be interpolated from environment",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_QUOTECRAFT_RATES_DIR"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_fails() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&["TEST_QUOTECRAFT_UNSET"]);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("quotecraft.toml");
        fs::write(&path, "[catalog]\npath = \"${TEST_QUOTECRAFT_UNSET}\"\n")
            .map_err(|err| err.to_string())?;

        let result = AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() });
        ensure(
            matches!(result, Err(ConfigError::MissingEnvInterpolation { ref var }) if var == "TEST_QUOTECRAFT_UNSET"),
            "unset interpolation variable should be reported",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        env::set_var("QUOTECRAFT_LOG_LEVEL", "warn");
        env::set_var("QUOTECRAFT_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["QUOTECRAFT_LOG_LEVEL", "QUOTECRAFT_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        env::set_var("QUOTECRAFT_CATALOG_PATH", "/from-env/rates.json");
        env::set_var("QUOTECRAFT_PRICING_DEFAULT_FINISH", "GREY");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("quotecraft.toml");
            fs::write(
                &path,
                r#"
[catalog]
path = "/from-file/rates.json"
onsite_path = "/from-file/onsite.json"

[pricing]
default_finish = "IVORY"
default_drawer_weight = "50KG"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    catalog_path: Some(PathBuf::from("/from-override/rates.json")),
                    log_level: Some("debug".to_string()),
                    uniform_recompute: Some(true),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.catalog.path == PathBuf::from("/from-override/rates.json"),
                "override should win over env and file",
            )?;
            ensure(
                config.catalog.onsite_path == PathBuf::from("/from-file/onsite.json"),
                "file should win over default",
            )?;
            ensure(config.pricing.default_finish == "GREY", "env should win over file")?;
            ensure(config.pricing.default_drawer_weight == "50KG", "file value should load")?;
            ensure(config.pricing.uniform_recompute, "override should enable uniform recompute")?;
            ensure(config.logging.level == "debug", "override should win for log level")?;
            Ok(())
        })();

        clear_vars(&["QUOTECRAFT_CATALOG_PATH", "QUOTECRAFT_PRICING_DEFAULT_FINISH"]);
        result
    }

    #[test]
    fn invalid_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        env::set_var("QUOTECRAFT_PRICING_UNIFORM_RECOMPUTE", "sometimes");

        let result = AppConfig::load(LoadOptions::default());
        clear_vars(&["QUOTECRAFT_PRICING_UNIFORM_RECOMPUTE"]);

        ensure(
            matches!(result, Err(ConfigError::InvalidEnvOverride { ref key, .. }) if key == "QUOTECRAFT_PRICING_UNIFORM_RECOMPUTE"),
            "unparseable boolean should be rejected",
        )
    }

    #[test]
    fn unknown_drawer_weight_fails_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        env::set_var("QUOTECRAFT_PRICING_DEFAULT_DRAWER_WEIGHT", "80KG");

        let result = AppConfig::load(LoadOptions::default());
        clear_vars(&["QUOTECRAFT_PRICING_DEFAULT_DRAWER_WEIGHT"]);

        match result {
            Err(ConfigError::Validation(message)) => ensure(
                message.contains("pricing.default_drawer_weight"),
                "validation message should name the field",
            ),
            _ => Err("expected drawer weight validation failure".to_string()),
        }
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let missing = dir.path().join("absent.toml");

        let result = AppConfig::load(LoadOptions {
            config_path: Some(missing.clone()),
            require_file: true,
            ..LoadOptions::default()
        });
        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(ref path)) if *path == missing),
            "missing required file should be reported with its path",
        )
    }
}
