pub mod allocate;
pub mod config;
pub mod doctor;
pub mod onsite;
pub mod price;

use std::fs;
use std::path::Path;

use anyhow::Context;
use quotecraft_core::config::{AppConfig, LoadOptions};
use quotecraft_core::cpq::catalog::RateCatalog;
use quotecraft_core::cpq::onsite::OnsiteServiceTable;
use quotecraft_core::errors::EngineError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

pub const EXIT_OK: u8 = 0;
pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_CATALOG: u8 = 3;
pub const EXIT_INPUT: u8 = 4;
pub const EXIT_ENGINE: u8 = 5;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, Value::Null)
    }

    pub fn success_with_data(command: &str, message: impl Into<String>, data: Value) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: (!data.is_null()).then_some(data),
        };
        Self { exit_code: EXIT_OK, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::failure_with_data(command, error_class, message, exit_code, Value::Null)
    }

    pub fn failure_with_data(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
        data: Value,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: (!data.is_null()).then_some(data),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Engine rejections carry the stable error code so callers can branch on it.
    pub fn engine_rejection(command: &str, context: &str, error: &EngineError) -> Self {
        Self::failure_with_data(
            command,
            "engine_rejection",
            format!("{context}: {error}"),
            EXIT_ENGINE,
            json!({ "code": error.code(), "userMessage": error.user_message() }),
        )
    }
}

pub(crate) fn load_config(command: &str, options: LoadOptions) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })
}

pub(crate) fn load_catalog(command: &str, config: &AppConfig) -> Result<RateCatalog, CommandResult> {
    RateCatalog::load(&config.catalog.path).map_err(|error| {
        CommandResult::failure(command, "catalog_load", error.to_string(), EXIT_CATALOG)
    })
}

pub(crate) fn load_onsite_table(
    command: &str,
    config: &AppConfig,
) -> Result<OnsiteServiceTable, CommandResult> {
    OnsiteServiceTable::load(&config.catalog.onsite_path).map_err(|error| {
        CommandResult::failure(command, "catalog_load", error.to_string(), EXIT_CATALOG)
    })
}

pub(crate) fn read_input<T: DeserializeOwned>(
    command: &str,
    path: &Path,
) -> Result<T, CommandResult> {
    parse_json_file(path).map_err(|error| {
        CommandResult::failure(command, "input", format!("{error:#}"), EXIT_INPUT)
    })
}

fn parse_json_file<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read input file `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("could not parse input file `{}`", path.display()))
}

pub(crate) fn to_data<T: Serialize>(command: &str, value: &T) -> Result<Value, CommandResult> {
    serde_json::to_value(value).map_err(|error| {
        CommandResult::failure(command, "serialization", error.to_string(), EXIT_INPUT)
    })
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
