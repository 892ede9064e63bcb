use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::component::CostBreakdown;
use crate::domain::measurement::{ensure_positive, Measurement};
use crate::errors::EngineError;

/// Kitchen zone a section belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Base,
    Wall,
    Loft,
}

impl SectionKind {
    pub fn is_wall_mounted(self) -> bool {
        matches!(self, Self::Wall)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KitchenType {
    Modular,
    #[serde(other)]
    Other,
}

impl KitchenType {
    pub fn shutter_detail(self) -> &'static str {
        match self {
            Self::Modular => "Modular shutters: factory pressed, edge banded",
            Self::Other => "Carpentry shutters: site fabricated, laminate finish",
        }
    }
}

/// How a partition rate scales with the partition's size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RateBasis {
    Flat,
    PerSqft,
    PerRunningFoot,
}

impl RateBasis {
    pub const ALL: [RateBasis; 3] = [Self::Flat, Self::PerSqft, Self::PerRunningFoot];

    pub fn catalog_key(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::PerSqft => "perSqft",
            Self::PerRunningFoot => "perRunningFoot",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionAccessoryRequest {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionRequest {
    pub width: Decimal,
    pub component_type: String,
    pub module: Option<String>,
    #[serde(default)]
    pub details: Vec<String>,
    #[serde(default)]
    pub accessories: Vec<PartitionAccessoryRequest>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionAccessory {
    pub name: String,
    pub quantity: u32,
    pub basis: RateBasis,
    pub rate: Decimal,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partition {
    pub width: Decimal,
    pub component_type: String,
    pub module: Option<String>,
    pub details: Vec<String>,
    pub accessories: Vec<PartitionAccessory>,
    pub price: CostBreakdown,
    pub shutter_detail: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionState {
    Empty,
    PartiallyFilled,
    Full,
}

/// Width-bounded container of partitions.
///
/// `remaining_width + sum(partition.width) == measurement.width` holds after
/// every mutation; only the allocator mutates a section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CabinetSectionRecord")]
pub struct CabinetSection {
    kind: SectionKind,
    measurement: Measurement,
    remaining_width: Decimal,
    partitions: Vec<Partition>,
    revision: u64,
}

impl CabinetSection {
    pub fn new(kind: SectionKind, measurement: Measurement) -> Result<Self, EngineError> {
        measurement.validate()?;
        Ok(Self {
            kind,
            measurement,
            remaining_width: measurement.width,
            partitions: Vec::new(),
            revision: 0,
        })
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    pub fn measurement(&self) -> &Measurement {
        &self.measurement
    }

    pub fn remaining_width(&self) -> Decimal {
        self.remaining_width
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn partition(&self, index: usize) -> Result<&Partition, EngineError> {
        self.partitions.get(index).ok_or_else(|| EngineError::not_found("partition", index))
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn used_width(&self) -> Decimal {
        self.partitions.iter().map(|partition| partition.width).sum()
    }

    pub fn partitions_total(&self) -> Decimal {
        self.partitions.iter().map(|partition| partition.price.total()).sum()
    }

    pub fn state(&self) -> SectionState {
        if self.partitions.is_empty() {
            SectionState::Empty
        } else if self.remaining_width.is_zero() {
            SectionState::Full
        } else {
            SectionState::PartiallyFilled
        }
    }

    /// Rejects a commit prepared against an older read of this section.
    pub fn ensure_revision(&self, expected: u64) -> Result<(), EngineError> {
        if expected != self.revision {
            return Err(EngineError::StaleRevision { expected, actual: self.revision });
        }
        Ok(())
    }

    pub(crate) fn push_partition(&mut self, partition: Partition) {
        self.remaining_width -= partition.width;
        self.partitions.push(partition);
        self.revision += 1;
    }

    pub(crate) fn replace_partition(&mut self, index: usize, partition: Partition) -> Partition {
        let previous = std::mem::replace(&mut self.partitions[index], partition);
        self.remaining_width -= self.partitions[index].width - previous.width;
        self.revision += 1;
        previous
    }

    pub(crate) fn take_partition(&mut self, index: usize) -> Partition {
        let removed = self.partitions.remove(index);
        self.remaining_width += removed.width;
        self.revision += 1;
        removed
    }
}

/// Stored shape of a section; `remainingWidth` is re-derived on load.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CabinetSectionRecord {
    kind: SectionKind,
    measurement: Measurement,
    #[serde(default)]
    partitions: Vec<Partition>,
    #[serde(default)]
    revision: u64,
}

impl TryFrom<CabinetSectionRecord> for CabinetSection {
    type Error = EngineError;

    fn try_from(record: CabinetSectionRecord) -> Result<Self, Self::Error> {
        record.measurement.validate()?;
        for partition in &record.partitions {
            ensure_positive("width", partition.width)?;
        }
        let used: Decimal = record.partitions.iter().map(|partition| partition.width).sum();
        if used > record.measurement.width {
            return Err(EngineError::InsufficientSpace {
                remaining: record.measurement.width,
                requested: used,
            });
        }

        Ok(Self {
            kind: record.kind,
            remaining_width: record.measurement.width - used,
            measurement: record.measurement,
            partitions: record.partitions,
            revision: record.revision,
        })
    }
}
