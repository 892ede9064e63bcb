use std::env;
use std::fs;
use std::path::Path;

use quotecraft_core::config::{resolve_config_path, LoadOptions};
use serde::Serialize;
use toml::Value;

use crate::commands::{load_config, to_data, CommandResult};

const COMMAND: &str = "config";

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

struct SourceContext<'a> {
    file_doc: Option<Value>,
    file_path: Option<&'a Path>,
}

pub fn run(options: LoadOptions) -> CommandResult {
    let overrides = options.overrides.clone();
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let context = SourceContext {
        file_doc: load_config_file_doc(config_file_path.as_deref()),
        file_path: config_file_path.as_deref(),
    };

    let entries = vec![
        ConfigEntry {
            key: "catalog.path",
            value: config.catalog.path.display().to_string(),
            source: context.source(
                "catalog.path",
                &["QUOTECRAFT_CATALOG_PATH"],
                overrides.catalog_path.is_some(),
            ),
        },
        ConfigEntry {
            key: "catalog.onsite_path",
            value: config.catalog.onsite_path.display().to_string(),
            source: context.source(
                "catalog.onsite_path",
                &["QUOTECRAFT_CATALOG_ONSITE_PATH"],
                overrides.onsite_path.is_some(),
            ),
        },
        ConfigEntry {
            key: "pricing.default_finish",
            value: config.pricing.default_finish.clone(),
            source: context.source(
                "pricing.default_finish",
                &["QUOTECRAFT_PRICING_DEFAULT_FINISH"],
                false,
            ),
        },
        ConfigEntry {
            key: "pricing.default_drawer_weight",
            value: config.pricing.default_drawer_weight.clone(),
            source: context.source(
                "pricing.default_drawer_weight",
                &["QUOTECRAFT_PRICING_DEFAULT_DRAWER_WEIGHT"],
                false,
            ),
        },
        ConfigEntry {
            key: "pricing.uniform_recompute",
            value: config.pricing.uniform_recompute.to_string(),
            source: context.source(
                "pricing.uniform_recompute",
                &["QUOTECRAFT_PRICING_UNIFORM_RECOMPUTE"],
                overrides.uniform_recompute.is_some(),
            ),
        },
        ConfigEntry {
            key: "logging.level",
            value: config.logging.level.clone(),
            source: context.source(
                "logging.level",
                &["QUOTECRAFT_LOGGING_LEVEL", "QUOTECRAFT_LOG_LEVEL"],
                overrides.log_level.is_some(),
            ),
        },
        ConfigEntry {
            key: "logging.format",
            value: format!("{:?}", config.logging.format).to_ascii_lowercase(),
            source: context.source(
                "logging.format",
                &["QUOTECRAFT_LOGGING_FORMAT", "QUOTECRAFT_LOG_FORMAT"],
                overrides.log_format.is_some(),
            ),
        },
    ];

    match to_data(COMMAND, &entries) {
        Ok(data) => CommandResult::success_with_data(
            COMMAND,
            "effective config (source precedence: override > env > file > default)",
            data,
        ),
        Err(result) => result,
    }
}

impl SourceContext<'_> {
    fn source(&self, key_path: &str, env_keys: &[&str], overridden: bool) -> String {
        if overridden {
            return "override".to_string();
        }

        if let Some(env_key) = env_keys.iter().find(|key| env_is_set(key)) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = &self.file_doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .file_path
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn env_is_set(key: &str) -> bool {
    env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false)
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
