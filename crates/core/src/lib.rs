pub mod config;
pub mod cpq;
pub mod domain;
pub mod errors;
pub mod ledger;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use cpq::allocator::{AllocationOutcome, PartitionAllocator};
pub use cpq::catalog::{CatalogError, RateCatalog, RatePath};
pub use cpq::defaults::DefaultPolicy;
pub use cpq::onsite::{
    CalculationType, OnsiteRateEngine, OnsiteServiceTable, OnsiteWorkItem, OnsiteWorkRequest,
};
pub use cpq::pricing::{CatalogCostResolver, ResolvedComponent, UnitCostResolver};
pub use cpq::QuotationEngine;
pub use domain::accessory::{Accessory, AccessoryPatch, AccessoryRequest};
pub use domain::component::{
    ComponentCategory, ComponentConfiguration, CostBreakdown, CostContributor, PricedComponent,
};
pub use domain::measurement::{calculate_square_feet, Measurement};
pub use domain::quotation::{Quotation, QuotationId, QuotationTotals, Room, RoomTotals};
pub use domain::section::{
    CabinetSection, KitchenType, Partition, PartitionRequest, SectionKind, SectionState,
};
pub use errors::EngineError;
pub use ledger::{AccessoryLedger, TotalPolicy};
