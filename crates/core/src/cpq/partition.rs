//! Partition cost functions.
//!
//! Floor partitions (base and loft sections) live under `partitions` in the
//! catalog and only carry flat rates. Wall partitions live under
//! `wallPartitions`; each of their rates is either a flat leaf or an object
//! keyed by `flat`, `perSqft` or `perRunningFoot`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cpq::catalog::{RateCatalog, RatePath};
use crate::cpq::defaults::non_blank;
use crate::cpq::pricing::positive_count;
use crate::domain::component::{CostBreakdown, CostContributor};
use crate::domain::measurement::{checked_amount, round_currency, running_feet, square_feet};
use crate::domain::section::{PartitionAccessory, PartitionRequest, RateBasis};
use crate::errors::EngineError;

pub const FLOOR_TAXONOMY: &str = "partitions";
pub const WALL_TAXONOMY: &str = "wallPartitions";

/// Priced partition, ready to be committed by the allocator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionQuote {
    pub accessories: Vec<PartitionAccessory>,
    pub price: CostBreakdown,
}

/// Number of detail selections a drawer-family partition must carry.
///
/// Matched per word: the count is the word right before `Drawer`, so
/// `12 Drawer` is a single-detail type.
pub fn required_detail_count(component_type: &str) -> Option<usize> {
    let words: Vec<&str> = component_type.split_whitespace().collect();
    let position = words.iter().position(|word| word.starts_with("Drawer"))?;
    let count = position.checked_sub(1).map(|previous| words[previous]);
    match count {
        Some("2") => Some(2),
        Some("3") => Some(3),
        _ => Some(1),
    }
}

pub fn price_partition(
    catalog: &RateCatalog,
    request: &PartitionRequest,
) -> Result<PartitionQuote, EngineError> {
    let scope = PartitionScope::resolve(catalog, FLOOR_TAXONOMY, request)?;
    let flat = |path: &[&str]| catalog.lookup(path).map(|rate| (RateBasis::Flat, rate));
    scope.price(catalog, request, &flat, &SizeUnits::default())
}

pub fn price_wall_partition(
    catalog: &RateCatalog,
    request: &PartitionRequest,
    section_height: Decimal,
) -> Result<PartitionQuote, EngineError> {
    let scope = PartitionScope::resolve(catalog, WALL_TAXONOMY, request)?;
    let units = SizeUnits {
        sqft: square_feet(request.width, section_height)?,
        running_feet: running_feet(request.width),
    };
    let basis = |path: &[&str]| basis_rate(catalog, path);
    scope.price(catalog, request, &basis, &units)
}

/// Flat leaf, or the first of `flat`/`perSqft`/`perRunningFoot` found below `path`.
pub fn basis_rate(
    catalog: &RateCatalog,
    path: &[&str],
) -> Result<(RateBasis, Decimal), EngineError> {
    if let Some(rate) = catalog.get(path) {
        return Ok((RateBasis::Flat, rate));
    }

    for basis in RateBasis::ALL {
        let mut keyed = path.to_vec();
        keyed.push(basis.catalog_key());
        if let Some(rate) = catalog.get(&keyed) {
            return Ok((basis, rate));
        }
    }

    Err(EngineError::PricingNotFound { path: RatePath::from_segments(path.iter().copied()) })
}

#[derive(Default)]
struct SizeUnits {
    sqft: Decimal,
    running_feet: Decimal,
}

impl SizeUnits {
    fn amount(
        &self,
        basis: RateBasis,
        rate: Decimal,
        quantity: u32,
    ) -> Result<Decimal, EngineError> {
        let quantity = Decimal::from(quantity);
        let sized = match basis {
            RateBasis::Flat => return checked_amount("quantity", rate, quantity),
            RateBasis::PerSqft => checked_amount("width", rate, self.sqft)?,
            RateBasis::PerRunningFoot => checked_amount("width", rate, self.running_feet)?,
        };
        checked_amount("quantity", sized, quantity).map(round_currency)
    }
}

/// Catalog prefixes a request resolves against.
struct PartitionScope<'r> {
    component: Vec<&'r str>,
    module: Option<Vec<&'r str>>,
}

impl<'r> PartitionScope<'r> {
    fn resolve(
        catalog: &RateCatalog,
        root: &'r str,
        request: &'r PartitionRequest,
    ) -> Result<Self, EngineError> {
        let component_type = non_blank(Some(request.component_type.as_str()))
            .ok_or_else(|| EngineError::missing_field("componentType"))?;
        if !catalog.contains(&[root, component_type]) {
            return Err(EngineError::configuration(
                "componentType",
                format!("`{component_type}` is not a known {root} type"),
            ));
        }

        let component = vec![root, component_type];
        let modular = catalog.contains(&[root, component_type, "modules"]);
        let module = match (modular, non_blank(request.module.as_deref())) {
            (true, None) => {
                return Err(EngineError::configuration(
                    "module",
                    format!("`{component_type}` requires a module selection"),
                ));
            }
            (false, Some(module)) => {
                return Err(EngineError::configuration(
                    "module",
                    format!("`{component_type}` has no module `{module}`"),
                ));
            }
            (false, None) => None,
            (true, Some(module)) => {
                if !catalog.contains(&[root, component_type, "modules", module]) {
                    return Err(EngineError::configuration(
                        "module",
                        format!("`{component_type}` has no module `{module}`"),
                    ));
                }
                Some(vec![root, component_type, "modules", module])
            }
        };

        Ok(Self { component, module })
    }

    fn component_type(&self) -> &'r str {
        self.component[1]
    }

    /// Module table when one is selected, else the component's own.
    fn selection_table(&self) -> &[&'r str] {
        self.module.as_deref().unwrap_or(&self.component)
    }

    fn price<F>(
        &self,
        catalog: &RateCatalog,
        request: &PartitionRequest,
        rate_at: &F,
        units: &SizeUnits,
    ) -> Result<PartitionQuote, EngineError>
    where
        F: Fn(&[&str]) -> Result<(RateBasis, Decimal), EngineError>,
    {
        let component_type = self.component_type();
        if let Some(expected) = required_detail_count(component_type) {
            if request.details.len() != expected {
                return Err(EngineError::configuration(
                    "details",
                    format!(
                        "`{component_type}` requires exactly {expected} detail selection(s), got {}",
                        request.details.len()
                    ),
                ));
            }
        }

        let mut price = CostBreakdown::new();

        let base_path = match &self.module {
            Some(module) if catalog.contains(&with(module, &["base"])) => with(module, &["base"]),
            _ => with(&self.component, &["base"]),
        };
        let (basis, rate) = rate_at(base_path.as_slice())?;
        price.add(CostContributor::Base, units.amount(basis, rate, 1)?);

        let table = self.selection_table();
        if !request.details.is_empty() {
            let mut details_total = Decimal::ZERO;
            for detail in &request.details {
                let path = with(table, &["details", detail.as_str()]);
                if !catalog.contains(&path) {
                    return Err(EngineError::configuration(
                        "details",
                        format!("`{detail}` is not available for `{component_type}`"),
                    ));
                }
                let (basis, rate) = rate_at(path.as_slice())?;
                details_total += units.amount(basis, rate, 1)?;
            }
            price.add(CostContributor::Details, details_total);
        }

        let mut accessories = Vec::with_capacity(request.accessories.len());
        for accessory in &request.accessories {
            let path = with(table, &["accessories", accessory.name.as_str()]);
            if !catalog.contains(&path) {
                return Err(EngineError::configuration(
                    "accessories",
                    format!("`{}` is not available for `{component_type}`", accessory.name),
                ));
            }
            let quantity = positive_count("quantity", accessory.quantity)?;
            let (basis, rate) = rate_at(path.as_slice())?;
            accessories.push(PartitionAccessory {
                name: accessory.name.clone(),
                quantity,
                basis,
                rate,
                amount: units.amount(basis, rate, quantity)?,
            });
        }
        if !accessories.is_empty() {
            let accessories_total: Decimal = accessories.iter().map(|line| line.amount).sum();
            price.add(CostContributor::Accessories, accessories_total);
        }

        Ok(PartitionQuote { accessories, price })
    }
}

fn with<'p>(prefix: &[&'p str], tail: &[&'p str]) -> Vec<&'p str> {
    let mut path = prefix.to_vec();
    path.extend_from_slice(tail);
    path
}
