use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cpq::catalog::RateCatalog;
use crate::cpq::defaults::{non_blank, DefaultPolicy};
use crate::cpq::pricing::positive_count;
use crate::domain::accessory::{Accessory, AccessoryPatch, AccessoryRequest};
use crate::domain::component::{ComponentCategory, PricedComponent};
use crate::errors::EngineError;

/// How a component's `totalPrice` follows its accessory ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalPolicy {
    /// Adjust the stored total by each entry's price or price delta.
    Additive,
    /// Re-derive the total as `basePrice + accessoriesTotalPrice`.
    Recompute,
}

impl TotalPolicy {
    pub fn for_category(category: ComponentCategory, uniform_recompute: bool) -> Self {
        match category {
            ComponentCategory::Bed => Self::Recompute,
            ComponentCategory::Standard if uniform_recompute => Self::Recompute,
            ComponentCategory::Standard => Self::Additive,
        }
    }
}

/// Accessory list maintenance for priced components.
#[derive(Clone, Copy, Debug)]
pub struct AccessoryLedger<'a> {
    catalog: &'a RateCatalog,
    defaults: &'a DefaultPolicy,
    uniform_recompute: bool,
}

impl<'a> AccessoryLedger<'a> {
    pub fn new(catalog: &'a RateCatalog, defaults: &'a DefaultPolicy) -> Self {
        Self { catalog, defaults, uniform_recompute: false }
    }

    pub fn with_uniform_recompute(mut self, enabled: bool) -> Self {
        self.uniform_recompute = enabled;
        self
    }

    pub fn policy_for(&self, component: &PricedComponent) -> TotalPolicy {
        TotalPolicy::for_category(component.category(), self.uniform_recompute)
    }

    /// Prices a request for `category` without touching any component.
    pub fn price_accessory(
        &self,
        category: ComponentCategory,
        request: &AccessoryRequest,
    ) -> Result<Accessory, EngineError> {
        let quantity = positive_count("quantity", request.quantity)?;
        let accessory_type = non_blank(Some(request.accessory_type.as_str()))
            .ok_or_else(|| EngineError::missing_field("type"))?;

        let (dimension, finish, unit_price) = match category {
            ComponentCategory::Bed => {
                let unit_price =
                    self.catalog.get(&["bedAccessories", accessory_type]).ok_or_else(|| {
                        EngineError::configuration(
                            "type",
                            format!("unknown bed accessory type `{accessory_type}`"),
                        )
                    })?;
                (None, None, unit_price)
            }
            ComponentCategory::Standard => {
                if !self.catalog.contains(&["accessories", accessory_type]) {
                    return Err(EngineError::configuration(
                        "type",
                        format!("unknown accessory type `{accessory_type}`"),
                    ));
                }
                let dimension = non_blank(request.dimension.as_deref())
                    .ok_or_else(|| EngineError::missing_field("dimension"))?;
                let finish = self.defaults.finish_or_default(request.finish.as_deref());

                let dimension_rate = self
                    .catalog
                    .get(&["accessories", accessory_type, "dimension", dimension])
                    .ok_or_else(|| {
                        EngineError::configuration(
                            "dimension",
                            format!("unknown dimension `{dimension}` for `{accessory_type}`"),
                        )
                    })?;
                let finish_surcharge = self
                    .catalog
                    .get(&["accessories", accessory_type, "finish", finish.as_str()])
                    .ok_or_else(|| {
                        EngineError::configuration(
                            "finish",
                            format!("unknown finish `{finish}` for `{accessory_type}`"),
                        )
                    })?;
                (Some(dimension.to_owned()), Some(finish), dimension_rate + finish_surcharge)
            }
        };

        let total_price = unit_price.checked_mul(Decimal::from(quantity)).ok_or_else(|| {
            EngineError::InvalidQuantity { field: "quantity".to_owned(), value: request.quantity }
        })?;

        Ok(Accessory {
            accessory_type: accessory_type.to_owned(),
            dimension,
            finish,
            quantity,
            unit_price,
            total_price,
        })
    }

    pub fn add_accessory(
        &self,
        component: &mut PricedComponent,
        request: &AccessoryRequest,
    ) -> Result<Accessory, EngineError> {
        let accessory = self.price_accessory(component.category(), request)?;
        let policy = self.policy_for(component);

        component.accessories_mut().push(accessory.clone());
        let accessories_total: Decimal =
            component.accessories().iter().map(|entry| entry.total_price).sum();
        let total = match policy {
            TotalPolicy::Additive => component.total_price() + accessory.total_price,
            TotalPolicy::Recompute => component.base_price() + accessories_total,
        };
        component.set_totals(accessories_total, total);

        info!(
            event_name = "ledger.accessory.added",
            accessory_type = %accessory.accessory_type,
            price = %accessory.total_price,
            policy = ?policy,
            total = %component.total_price(),
            "accessory added"
        );
        Ok(accessory)
    }

    pub fn update_accessory(
        &self,
        component: &mut PricedComponent,
        index: usize,
        patch: &AccessoryPatch,
    ) -> Result<Accessory, EngineError> {
        let existing = accessory_at(component, index)?.clone();
        let updated = self.price_accessory(component.category(), &patch.apply_to(&existing))?;
        let delta = updated.total_price - existing.total_price;
        let policy = self.policy_for(component);

        component.accessories_mut()[index] = updated.clone();
        let accessories_total = component.accessories_total_price() + delta;
        let total = match policy {
            TotalPolicy::Additive => component.total_price() + delta,
            TotalPolicy::Recompute => component.base_price() + accessories_total,
        };
        component.set_totals(accessories_total, total);

        info!(
            event_name = "ledger.accessory.updated",
            index,
            delta = %delta,
            policy = ?policy,
            total = %component.total_price(),
            "accessory updated"
        );
        Ok(updated)
    }

    pub fn remove_accessory(
        &self,
        component: &mut PricedComponent,
        index: usize,
    ) -> Result<Accessory, EngineError> {
        accessory_at(component, index)?;
        let policy = self.policy_for(component);

        let removed = component.accessories_mut().remove(index);
        let accessories_total = component.accessories_total_price() - removed.total_price;
        let total = match policy {
            TotalPolicy::Additive => component.total_price() - removed.total_price,
            TotalPolicy::Recompute => component.base_price() + accessories_total,
        };
        component.set_totals(accessories_total, total);

        info!(
            event_name = "ledger.accessory.removed",
            index,
            accessory_type = %removed.accessory_type,
            policy = ?policy,
            total = %component.total_price(),
            "accessory removed"
        );
        Ok(removed)
    }
}

fn accessory_at(component: &PricedComponent, index: usize) -> Result<&Accessory, EngineError> {
    component.accessories().get(index).ok_or_else(|| EngineError::not_found("accessory", index))
}
