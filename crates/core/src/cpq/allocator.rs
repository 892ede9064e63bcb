use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cpq::catalog::RateCatalog;
use crate::cpq::partition::{price_partition, price_wall_partition, PartitionQuote};
use crate::domain::measurement::ensure_positive;
use crate::domain::section::{CabinetSection, KitchenType, Partition, PartitionRequest};
use crate::errors::EngineError;

/// Committed partition plus the section's bookkeeping after the commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationOutcome {
    pub partition: Partition,
    pub remaining_width: Decimal,
    pub partition_count: usize,
    pub revision: u64,
}

impl AllocationOutcome {
    fn from_section(section: &CabinetSection, partition: Partition) -> Self {
        Self {
            partition,
            remaining_width: section.remaining_width(),
            partition_count: section.partitions().len(),
            revision: section.revision(),
        }
    }
}

/// Owns every width-changing mutation of a [`CabinetSection`].
///
/// Each operation prices and validates first and only then commits, so a
/// rejected request leaves the section untouched.
#[derive(Clone, Copy, Debug)]
pub struct PartitionAllocator<'a> {
    catalog: &'a RateCatalog,
    kitchen_type: Option<KitchenType>,
}

impl<'a> PartitionAllocator<'a> {
    pub fn new(catalog: &'a RateCatalog) -> Self {
        Self { catalog, kitchen_type: None }
    }

    pub fn with_kitchen_type(mut self, kitchen_type: KitchenType) -> Self {
        self.kitchen_type = Some(kitchen_type);
        self
    }

    pub fn add_partition(
        &self,
        section: &mut CabinetSection,
        request: PartitionRequest,
    ) -> Result<AllocationOutcome, EngineError> {
        let partition = self.build(section, request)?;
        if partition.width > section.remaining_width() {
            return Err(EngineError::InsufficientSpace {
                remaining: section.remaining_width(),
                requested: partition.width,
            });
        }

        section.push_partition(partition.clone());
        info!(
            event_name = "allocator.partition.added",
            component_type = %partition.component_type,
            width = %partition.width,
            remaining_width = %section.remaining_width(),
            revision = section.revision(),
            "partition added"
        );
        Ok(AllocationOutcome::from_section(section, partition))
    }

    pub fn update_partition(
        &self,
        section: &mut CabinetSection,
        index: usize,
        request: PartitionRequest,
    ) -> Result<AllocationOutcome, EngineError> {
        let existing_width = section.partition(index)?.width;
        let partition = self.build(section, request)?;
        let width_diff = partition.width - existing_width;
        if width_diff > section.remaining_width() {
            return Err(EngineError::InsufficientSpace {
                remaining: section.remaining_width(),
                requested: width_diff,
            });
        }

        section.replace_partition(index, partition.clone());
        info!(
            event_name = "allocator.partition.updated",
            index,
            component_type = %partition.component_type,
            width_diff = %width_diff,
            remaining_width = %section.remaining_width(),
            revision = section.revision(),
            "partition updated"
        );
        Ok(AllocationOutcome::from_section(section, partition))
    }

    pub fn remove_partition(
        &self,
        section: &mut CabinetSection,
        index: usize,
    ) -> Result<AllocationOutcome, EngineError> {
        section.partition(index)?;
        let removed = section.take_partition(index);
        info!(
            event_name = "allocator.partition.removed",
            index,
            component_type = %removed.component_type,
            remaining_width = %section.remaining_width(),
            revision = section.revision(),
            "partition removed"
        );
        Ok(AllocationOutcome::from_section(section, removed))
    }

    /// Prices a partition for `section` without committing it.
    pub fn quote(
        &self,
        section: &CabinetSection,
        request: &PartitionRequest,
    ) -> Result<PartitionQuote, EngineError> {
        ensure_positive("width", request.width)?;
        if section.kind().is_wall_mounted() {
            price_wall_partition(self.catalog, request, section.measurement().height)
        } else {
            price_partition(self.catalog, request)
        }
    }

    fn build(
        &self,
        section: &CabinetSection,
        request: PartitionRequest,
    ) -> Result<Partition, EngineError> {
        let quote = self.quote(section, &request)?;
        debug!(
            event_name = "allocator.partition.priced",
            component_type = %request.component_type,
            total = %quote.price.total(),
            "partition priced"
        );

        Ok(Partition {
            width: request.width,
            component_type: request.component_type,
            module: request.module,
            details: request.details,
            accessories: quote.accessories,
            price: quote.price,
            shutter_detail: self.kitchen_type.map(|kind| kind.shutter_detail().to_owned()),
        })
    }
}
