use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use quotecraft_cli::commands::{allocate, config, doctor, onsite, price};
use quotecraft_core::config::{ConfigOverrides, LoadOptions};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tempfile::TempDir;

const CATALOG: &str = r#"{
    "carcass": { "BWP": { "WHITE": 180 } },
    "shutter": { "PU": { "WHITE": 200 } },
    "shelves": { "perShelf": 450 },
    "accessories": {
        "Handle": { "dimension": { "128mm": 150 }, "finish": { "WHITE": 0 } }
    },
    "partitions": {
        "Open Unit": { "base": 1800 },
        "Chimney": { "base": 0 }
    }
}"#;

const SERVICES: &str = r#"{
    "Painting": { "Wall Putty": { "calculationType": "HxW", "rate": 33 } }
}"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join("rates.json"), CATALOG).expect("write catalog");
        fs::write(dir.path().join("onsite.json"), SERVICES).expect("write services");
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, value: &Value) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, value.to_string()).expect("write input");
        path
    }

    fn options(&self) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                catalog_path: Some(self.path("rates.json")),
                onsite_path: Some(self.path("onsite.json")),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }
}

fn shutter_unit_request(finish: &str) -> Value {
    json!({
        "configuration": {
            "unitType": "CARCASS_WITH_SHUTTERS",
            "carcassType": "BWP",
            "shutterMaterial": "PU",
            "finish": finish,
            "shelves": 2
        },
        "measurement": { "width": 929, "height": 1000, "depth": 560 },
        "accessories": [{ "type": "Handle", "dimension": "128mm", "quantity": 2 }]
    })
}

fn partition(component_type: &str, width: u32) -> Value {
    json!({ "width": width, "componentType": component_type })
}

#[test]
fn price_returns_component_with_accessory_totals() {
    with_env(&[], || {
        let fixture = Fixture::new();
        let request = fixture.write("unit.json", &shutter_unit_request("WHITE"));

        let result = price::run(fixture.options(), &request);
        assert_eq!(result.exit_code, 0, "expected successful pricing: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "price");
        assert_eq!(payload["status"], "ok");
        let data = &payload["data"];
        assert_eq!(decimal(&data["breakdown"]["carcass"]), Decimal::from(1800));
        assert_eq!(decimal(&data["breakdown"]["shutter"]), Decimal::from(2000));
        assert_eq!(decimal(&data["breakdown"]["shelves"]), Decimal::from(900));
        assert_eq!(decimal(&data["basePrice"]), Decimal::from(4700));
        assert_eq!(decimal(&data["accessoriesTotalPrice"]), Decimal::from(300));
        assert_eq!(decimal(&data["totalPrice"]), Decimal::from(5000));
        assert_eq!(data["accessories"][0]["finish"], "WHITE");
    });
}

#[test]
fn price_reports_missing_rate_as_engine_rejection() {
    with_env(&[], || {
        let fixture = Fixture::new();
        let request = fixture.write("unit.json", &shutter_unit_request("PINK"));

        let result = price::run(fixture.options(), &request);
        assert_eq!(result.exit_code, 5);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "engine_rejection");
        assert_eq!(payload["data"]["code"], "PRICING_NOT_FOUND");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("carcass > BWP > PINK"), "unexpected message: {message}");
    });
}

#[test]
fn price_reports_unreadable_catalog_and_input() {
    with_env(&[], || {
        let fixture = Fixture::new();
        let request = fixture.write("unit.json", &shutter_unit_request("WHITE"));

        let mut options = fixture.options();
        options.overrides.catalog_path = Some(fixture.path("missing.json"));
        let result = price::run(options, &request);
        assert_eq!(result.exit_code, 3);
        assert_eq!(parse_payload(&result.output)["error_class"], "catalog_load");

        fs::write(fixture.path("broken.json"), "{ not json").expect("write broken input");
        let result = price::run(fixture.options(), &fixture.path("broken.json"));
        assert_eq!(result.exit_code, 4);
        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "input");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("could not parse input file"), "unexpected message: {message}");
    });
}

#[test]
fn allocate_replays_add_update_remove() {
    with_env(&[], || {
        let fixture = Fixture::new();
        let plan = fixture.write(
            "plan.json",
            &json!({
                "kind": "base",
                "measurement": { "width": 1000, "height": 720, "depth": 560 },
                "kitchenType": "MODULAR",
                "operations": [
                    { "op": "add", "partition": partition("Open Unit", 700) },
                    { "op": "update", "index": 0, "partition": partition("Open Unit", 600) },
                    { "op": "add", "partition": partition("Chimney", 400) }
                ]
            }),
        );

        let result = allocate::run(fixture.options(), &plan);
        assert_eq!(result.exit_code, 0, "expected plan to replay: {}", result.output);

        let data = &parse_payload(&result.output)["data"];
        assert_eq!(data["state"], "full");
        assert_eq!(decimal(&data["section"]["remainingWidth"]), Decimal::ZERO);
        assert_eq!(decimal(&data["partitionsTotal"]), Decimal::from(1800));
        assert_eq!(data["outcomes"].as_array().map(Vec::len), Some(3));
        assert_eq!(data["section"]["revision"], 3);
    });
}

#[test]
fn allocate_stops_at_insufficient_space() {
    with_env(&[], || {
        let fixture = Fixture::new();
        let plan = fixture.write(
            "plan.json",
            &json!({
                "kind": "base",
                "measurement": { "width": 1000, "height": 720, "depth": 560 },
                "operations": [
                    { "op": "add", "partition": partition("Open Unit", 700) },
                    { "op": "add", "partition": partition("Chimney", 400) }
                ]
            }),
        );

        let result = allocate::run(fixture.options(), &plan);
        assert_eq!(result.exit_code, 5);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["code"], "INSUFFICIENT_SPACE");
        assert_eq!(decimal(&payload["data"]["section"]["remainingWidth"]), Decimal::from(300));
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.starts_with("operation #1 (add)"), "unexpected message: {message}");
    });
}

#[test]
fn onsite_prices_items_and_total() {
    with_env(&[], || {
        let fixture = Fixture::new();
        let request = fixture.write(
            "onsite-request.json",
            &json!({
                "items": [
                    { "category": "Painting", "service": "Wall Putty", "height": 10, "width": 20 },
                    { "category": "Painting", "service": "Wall Putty", "area": 5 }
                ]
            }),
        );

        let result = onsite::run(fixture.options(), &request);
        assert_eq!(result.exit_code, 0, "expected onsite pricing: {}", result.output);

        let data = &parse_payload(&result.output)["data"];
        assert_eq!(decimal(&data["items"][0]["price"]), Decimal::from(6600));
        assert_eq!(data["items"][0]["calculationType"], "HxW");
        assert_eq!(decimal(&data["total"]), Decimal::from(6765));
    });
}

#[test]
fn onsite_rejects_unknown_service() {
    with_env(&[], || {
        let fixture = Fixture::new();
        let request = fixture.write(
            "onsite-request.json",
            &json!({ "items": [{ "category": "Civil", "service": "Tiling", "area": 5 }] }),
        );

        let result = onsite::run(fixture.options(), &request);
        assert_eq!(result.exit_code, 5);
        assert_eq!(parse_payload(&result.output)["data"]["code"], "PRICING_NOT_FOUND");
    });
}

#[test]
fn config_reports_value_sources() {
    with_env(&[("QUOTECRAFT_PRICING_DEFAULT_FINISH", "GREY")], || {
        let fixture = Fixture::new();
        let result = config::run(fixture.options());
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let entries = payload["data"].as_array().cloned().unwrap_or_default();
        let source_of = |key: &str| {
            entries
                .iter()
                .find(|entry| entry["key"] == key)
                .map(|entry| entry["source"].as_str().unwrap_or_default().to_string())
                .unwrap_or_default()
        };

        assert_eq!(source_of("catalog.path"), "override");
        assert_eq!(source_of("pricing.default_finish"), "env (QUOTECRAFT_PRICING_DEFAULT_FINISH)");
        assert_eq!(source_of("logging.level"), "default");
    });
}

#[test]
fn config_returns_validation_failure_code() {
    with_env(&[("QUOTECRAFT_LOGGING_FORMAT", "loud")], || {
        let result = config::run(LoadOptions::default());
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "config");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn doctor_checks_catalog_and_onsite_table() {
    with_env(&[], || {
        let fixture = Fixture::new();
        let result = doctor::run(fixture.options());
        assert_eq!(result.exit_code, 0, "expected healthy doctor report: {}", result.output);
        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["overall_status"], "pass");

        let mut options = fixture.options();
        options.overrides.onsite_path = Some(fixture.path("absent.json"));
        let result = doctor::run(options);
        assert_eq!(result.exit_code, 3);
        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["overall_status"], "fail");
        assert_eq!(payload["data"]["checks"][1]["status"], "pass");
        assert_eq!(payload["data"]["checks"][2]["status"], "fail");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(raw) => raw.parse().expect("decimal string"),
        other => panic!("expected decimal string, got {other}"),
    }
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "QUOTECRAFT_CATALOG_PATH",
        "QUOTECRAFT_CATALOG_ONSITE_PATH",
        "QUOTECRAFT_PRICING_DEFAULT_FINISH",
        "QUOTECRAFT_PRICING_DEFAULT_DRAWER_WEIGHT",
        "QUOTECRAFT_PRICING_UNIFORM_RECOMPUTE",
        "QUOTECRAFT_LOGGING_LEVEL",
        "QUOTECRAFT_LOGGING_FORMAT",
        "QUOTECRAFT_LOG_LEVEL",
        "QUOTECRAFT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
