use std::path::Path;

use quotecraft_core::config::LoadOptions;
use quotecraft_core::cpq::onsite::{self, OnsiteWorkItem, OnsiteWorkRequest};
use quotecraft_core::cpq::QuotationEngine;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::commands::{load_config, load_onsite_table, read_input, to_data, CommandResult};

const COMMAND: &str = "onsite";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnsiteRequest {
    #[serde(default)]
    pub items: Vec<OnsiteWorkRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OnsiteReport {
    items: Vec<OnsiteWorkItem>,
    total: Decimal,
}

pub fn run(options: LoadOptions, request_path: &Path) -> CommandResult {
    match execute(options, request_path) {
        Ok(result) | Err(result) => result,
    }
}

fn execute(options: LoadOptions, request_path: &Path) -> Result<CommandResult, CommandResult> {
    let config = load_config(COMMAND, options)?;
    let table = load_onsite_table(COMMAND, &config)?;
    let request: OnsiteRequest = read_input(COMMAND, request_path)?;
    let engine = QuotationEngine::new(Default::default(), table);
    let pricing = engine.onsite();

    let mut items = Vec::with_capacity(request.items.len());
    for (index, item) in request.items.iter().enumerate() {
        let priced = pricing.price(item).map_err(|error| {
            let context = format!("item #{index} ({} / {})", item.category, item.service);
            CommandResult::engine_rejection(COMMAND, &context, &error)
        })?;
        items.push(priced);
    }

    let total = onsite::total(&items);
    info!(
        event_name = "cli.onsite.completed",
        item_count = items.len(),
        total = %total,
        "onsite work priced"
    );
    let message = format!("{} onsite item(s) priced at {total}", items.len());
    let data = to_data(COMMAND, &OnsiteReport { items, total })?;
    Ok(CommandResult::success_with_data(COMMAND, message, data))
}
