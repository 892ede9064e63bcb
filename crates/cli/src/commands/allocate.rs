use std::path::Path;

use quotecraft_core::config::LoadOptions;
use quotecraft_core::cpq::allocator::AllocationOutcome;
use quotecraft_core::cpq::QuotationEngine;
use quotecraft_core::domain::measurement::Measurement;
use quotecraft_core::domain::section::{
    CabinetSection, KitchenType, PartitionRequest, SectionKind, SectionState,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::commands::{
    load_catalog, load_config, read_input, to_data, CommandResult, EXIT_ENGINE, EXIT_INPUT,
};

const COMMAND: &str = "allocate";

/// A section to build and the partition operations to replay against it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationPlan {
    pub kind: SectionKind,
    pub measurement: Measurement,
    pub kitchen_type: Option<KitchenType>,
    #[serde(default)]
    pub operations: Vec<PlanOperation>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PlanOperation {
    Add { partition: PartitionRequest },
    Update { index: usize, partition: PartitionRequest },
    Remove { index: usize },
}

impl PlanOperation {
    fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Update { .. } => "update",
            Self::Remove { .. } => "remove",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AllocationReport<'a> {
    section: &'a CabinetSection,
    state: SectionState,
    partitions_total: Decimal,
    outcomes: Vec<AllocationOutcome>,
}

pub fn run(options: LoadOptions, plan_path: &Path) -> CommandResult {
    match execute(options, plan_path) {
        Ok(result) | Err(result) => result,
    }
}

fn execute(options: LoadOptions, plan_path: &Path) -> Result<CommandResult, CommandResult> {
    let config = load_config(COMMAND, options)?;
    let catalog = load_catalog(COMMAND, &config)?;
    let plan: AllocationPlan = read_input(COMMAND, plan_path)?;
    let engine = QuotationEngine::new(catalog, Default::default())
        .with_pricing_config(&config.pricing);

    let mut section = CabinetSection::new(plan.kind, plan.measurement).map_err(|error| {
        CommandResult::failure(COMMAND, "input", format!("invalid section: {error}"), EXIT_INPUT)
    })?;
    let allocator = engine.allocator(plan.kitchen_type);

    let mut outcomes = Vec::with_capacity(plan.operations.len());
    for (position, operation) in plan.operations.into_iter().enumerate() {
        let name = operation.name();
        let outcome = match operation {
            PlanOperation::Add { partition } => allocator.add_partition(&mut section, partition),
            PlanOperation::Update { index, partition } => {
                allocator.update_partition(&mut section, index, partition)
            }
            PlanOperation::Remove { index } => allocator.remove_partition(&mut section, index),
        };

        match outcome {
            Ok(outcome) => outcomes.push(outcome),
            Err(error) => {
                let section = to_data(COMMAND, &section).unwrap_or_default();
                return Err(CommandResult::failure_with_data(
                    COMMAND,
                    "engine_rejection",
                    format!("operation #{position} ({name}): {error}"),
                    EXIT_ENGINE,
                    json!({
                        "code": error.code(),
                        "userMessage": error.user_message(),
                        "section": section,
                    }),
                ));
            }
        }
    }

    info!(
        event_name = "cli.allocate.completed",
        operation_count = outcomes.len(),
        remaining_width = %section.remaining_width(),
        "allocation plan replayed"
    );
    let report = AllocationReport {
        section: &section,
        state: section.state(),
        partitions_total: section.partitions_total(),
        outcomes,
    };
    let data = to_data(COMMAND, &report)?;
    Ok(CommandResult::success_with_data(
        COMMAND,
        format!(
            "{} partition(s) placed, remaining width {}mm",
            section.partitions().len(),
            section.remaining_width()
        ),
        data,
    ))
}
