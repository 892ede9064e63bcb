pub mod allocator;
pub mod catalog;
pub mod defaults;
pub mod onsite;
pub mod partition;
pub mod pricing;

use crate::config::PricingConfig;
use crate::domain::section::KitchenType;
use crate::ledger::AccessoryLedger;

use self::{
    allocator::PartitionAllocator, catalog::RateCatalog, defaults::DefaultPolicy,
    onsite::OnsiteRateEngine, onsite::OnsiteServiceTable, pricing::CatalogCostResolver,
};

/// One catalog snapshot plus the defaults and policies that price against it.
///
/// The engine owns its snapshots; the resolver, allocator, ledger and onsite
/// views it hands out borrow them for the length of one request.
#[derive(Clone, Debug, Default)]
pub struct QuotationEngine {
    catalog: RateCatalog,
    onsite: OnsiteServiceTable,
    defaults: DefaultPolicy,
    uniform_recompute: bool,
}

impl QuotationEngine {
    pub fn new(catalog: RateCatalog, onsite: OnsiteServiceTable) -> Self {
        Self { catalog, onsite, defaults: DefaultPolicy::default(), uniform_recompute: false }
    }

    pub fn with_defaults(mut self, defaults: DefaultPolicy) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_uniform_recompute(mut self, enabled: bool) -> Self {
        self.uniform_recompute = enabled;
        self
    }

    pub fn with_pricing_config(self, pricing: &PricingConfig) -> Self {
        self.with_defaults(pricing.default_policy())
            .with_uniform_recompute(pricing.uniform_recompute)
    }

    pub fn catalog(&self) -> &RateCatalog {
        &self.catalog
    }

    pub fn onsite_table(&self) -> &OnsiteServiceTable {
        &self.onsite
    }

    pub fn defaults(&self) -> &DefaultPolicy {
        &self.defaults
    }

    pub fn resolver(&self) -> CatalogCostResolver<'_> {
        CatalogCostResolver::new(&self.catalog, &self.defaults)
    }

    pub fn allocator(&self, kitchen_type: Option<KitchenType>) -> PartitionAllocator<'_> {
        let allocator = PartitionAllocator::new(&self.catalog);
        match kitchen_type {
            Some(kitchen_type) => allocator.with_kitchen_type(kitchen_type),
            None => allocator,
        }
    }

    pub fn ledger(&self) -> AccessoryLedger<'_> {
        AccessoryLedger::new(&self.catalog, &self.defaults)
            .with_uniform_recompute(self.uniform_recompute)
    }

    pub fn onsite(&self) -> OnsiteRateEngine<'_> {
        OnsiteRateEngine::new(&self.onsite)
    }
}
