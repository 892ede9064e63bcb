use std::path::Path;

use quotecraft_core::config::LoadOptions;
use quotecraft_core::cpq::QuotationEngine;
use quotecraft_core::domain::accessory::AccessoryRequest;
use quotecraft_core::domain::component::ComponentConfiguration;
use quotecraft_core::domain::measurement::Measurement;
use serde::Deserialize;
use tracing::info;

use crate::commands::{load_catalog, load_config, read_input, to_data, CommandResult};

const COMMAND: &str = "price";

/// One component plus the accessories to book against it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRequest {
    pub configuration: ComponentConfiguration,
    pub measurement: Measurement,
    #[serde(default)]
    pub accessories: Vec<AccessoryRequest>,
}

pub fn run(options: LoadOptions, request_path: &Path) -> CommandResult {
    match execute(options, request_path) {
        Ok(result) | Err(result) => result,
    }
}

fn execute(options: LoadOptions, request_path: &Path) -> Result<CommandResult, CommandResult> {
    let config = load_config(COMMAND, options)?;
    let catalog = load_catalog(COMMAND, &config)?;
    let request: PriceRequest = read_input(COMMAND, request_path)?;
    let engine = QuotationEngine::new(catalog, Default::default())
        .with_pricing_config(&config.pricing);

    let unit_type = request.configuration.unit_type();
    let mut component = engine
        .resolver()
        .price(request.configuration, request.measurement)
        .map_err(|error| CommandResult::engine_rejection(COMMAND, unit_type, &error))?;

    let ledger = engine.ledger();
    for (index, accessory) in request.accessories.iter().enumerate() {
        ledger.add_accessory(&mut component, accessory).map_err(|error| {
            CommandResult::engine_rejection(COMMAND, &format!("accessory #{index}"), &error)
        })?;
    }

    info!(
        event_name = "cli.price.completed",
        unit_type,
        accessory_count = component.accessories().len(),
        total = %component.total_price(),
        "component priced"
    );
    let data = to_data(COMMAND, &component)?;
    Ok(CommandResult::success_with_data(
        COMMAND,
        format!("{unit_type} priced at {}", component.total_price()),
        data,
    ))
}
