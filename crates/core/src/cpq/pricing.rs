use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cpq::catalog::RateCatalog;
use crate::cpq::defaults::{is_hdhmr_class, non_blank, DefaultPolicy, PROFILE_SHUTTER_MATERIAL};
use crate::domain::component::{
    ComponentConfiguration, CostBreakdown, CostContributor, PricedComponent,
};
use crate::domain::measurement::{checked_amount, round_currency, Measurement};
use crate::errors::EngineError;

pub trait UnitCostResolver: Send + Sync {
    fn resolve(
        &self,
        configuration: &ComponentConfiguration,
        measurement: &Measurement,
    ) -> Result<CostBreakdown, EngineError>;
}

/// Shutter choice; `shutter_type` is only kept for HDHMR-class materials.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutterSelection {
    pub material: String,
    pub shutter_type: Option<String>,
}

impl ShutterSelection {
    fn from_options(material: Option<&str>, shutter_type: Option<&str>) -> Result<Self, EngineError> {
        let material = non_blank(material).ok_or_else(|| EngineError::missing_field("shutterMaterial"))?;
        if !is_hdhmr_class(material) {
            return Ok(Self { material: material.to_owned(), shutter_type: None });
        }

        let shutter_type = non_blank(shutter_type).ok_or_else(|| {
            EngineError::configuration("shutterType", format!("required for {material} shutters"))
        })?;
        Ok(Self { material: material.to_owned(), shutter_type: Some(shutter_type.to_owned()) })
    }

    fn rate(&self, catalog: &RateCatalog, finish: &str) -> Result<Decimal, EngineError> {
        match &self.shutter_type {
            Some(shutter_type) => catalog.lookup(&["shutter", &self.material, shutter_type, finish]),
            None => catalog.lookup(&["shutter", &self.material, finish]),
        }
    }
}

/// A configuration that passed its variant's required-field check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ResolvedComponent {
    CarcassWithShutters {
        carcass_type: String,
        shutter: ShutterSelection,
        finish: String,
        shelves: Option<u32>,
    },
    OpenUnit {
        shutter: ShutterSelection,
        shelves: Option<u32>,
    },
    Ledge {
        shutter: ShutterSelection,
    },
    Drawer {
        carcass_type: String,
        finish: String,
        drawer_quantity: u32,
        drawer_weight: String,
    },
    CarcassWithProfileShutter {
        carcass_type: String,
        finish: String,
        profile_type: Option<String>,
        shelves: Option<u32>,
    },
    Panel {
        shutter: ShutterSelection,
        finish: String,
    },
    TvPanel {
        shelves: Option<u32>,
    },
    Bed {
        bed_type: String,
        size: String,
    },
}

impl ResolvedComponent {
    pub fn from_configuration(
        configuration: &ComponentConfiguration,
        defaults: &DefaultPolicy,
    ) -> Result<Self, EngineError> {
        let resolved = match configuration {
            ComponentConfiguration::CarcassWithShutters(options) => Self::CarcassWithShutters {
                carcass_type: required("carcassType", options.carcass_type.as_deref())?,
                shutter: ShutterSelection::from_options(
                    options.shutter_material.as_deref(),
                    options.shutter_type.as_deref(),
                )?,
                finish: defaults.finish_or_default(options.finish.as_deref()),
                shelves: shelf_count(options.shelves)?,
            },
            ComponentConfiguration::OpenUnit(options) => Self::OpenUnit {
                shutter: ShutterSelection::from_options(
                    options.shutter_material.as_deref(),
                    options.shutter_type.as_deref(),
                )?,
                shelves: shelf_count(options.shelves)?,
            },
            ComponentConfiguration::Ledge(options) => {
                if shelf_count(options.shelves)?.is_some() {
                    return Err(EngineError::configuration(
                        "shelves",
                        "ledge units do not carry shelves",
                    ));
                }
                Self::Ledge {
                    shutter: ShutterSelection::from_options(
                        options.shutter_material.as_deref(),
                        options.shutter_type.as_deref(),
                    )?,
                }
            }
            ComponentConfiguration::Drawer(options) => {
                let carcass_type = required("carcassType", options.carcass_type.as_deref())?;
                let quantity =
                    options.drawer_quantity.ok_or_else(|| EngineError::missing_field("drawerQuantity"))?;
                Self::Drawer {
                    carcass_type,
                    finish: defaults.finish_or_default(options.finish.as_deref()),
                    drawer_quantity: positive_count("drawerQuantity", quantity)?,
                    drawer_weight: defaults.drawer_weight_or_default(options.drawer_weight.as_deref()),
                }
            }
            ComponentConfiguration::CarcassWithProfileShutter(options) => {
                let material = non_blank(options.shutter_material.as_deref());
                let profile_type = non_blank(options.shutter_type.as_deref());
                Self::CarcassWithProfileShutter {
                    carcass_type: required("carcassType", options.carcass_type.as_deref())?,
                    finish: defaults.finish_or_default(options.finish.as_deref()),
                    profile_type: material.and(profile_type).map(str::to_owned),
                    shelves: shelf_count(options.shelves)?,
                }
            }
            ComponentConfiguration::Top(options) | ComponentConfiguration::Side(options) => {
                Self::Panel {
                    shutter: ShutterSelection::from_options(
                        options.shutter_material.as_deref(),
                        options.shutter_type.as_deref(),
                    )?,
                    finish: defaults.finish_or_default(options.finish.as_deref()),
                }
            }
            ComponentConfiguration::TvPanel(options) => {
                Self::TvPanel { shelves: shelf_count(options.shelves)? }
            }
            ComponentConfiguration::Bed(options) => Self::Bed {
                bed_type: required("bedType", options.bed_type.as_deref())?,
                size: required("size", options.size.as_deref())?,
            },
        };

        Ok(resolved)
    }

    /// Prices the component. Each per-sqft contributor is rounded on its own
    /// and the total is the sum of the rounded contributors.
    pub fn price(
        &self,
        catalog: &RateCatalog,
        defaults: &DefaultPolicy,
        measurement: &Measurement,
    ) -> Result<CostBreakdown, EngineError> {
        let sqft = measurement.square_feet()?;
        let mut breakdown = CostBreakdown::new();

        match self {
            Self::CarcassWithShutters { carcass_type, shutter, finish, shelves } => {
                let carcass_rate = catalog.lookup(&["carcass", carcass_type, finish])?;
                let shutter_rate = shutter.rate(catalog, finish)?;
                breakdown.add(CostContributor::Carcass, per_sqft(carcass_rate, sqft)?);
                breakdown.add(CostContributor::Shutter, per_sqft(shutter_rate, sqft)?);
                add_shelves(&mut breakdown, catalog, *shelves)?;
            }
            Self::OpenUnit { shutter, shelves } => {
                let base_rate = shutter.rate(catalog, &defaults.base_shutter_finish)?;
                let rate = marked_up(base_rate, defaults)?;
                breakdown.add(CostContributor::OpenUnit, per_sqft(rate, sqft)?);
                add_shelves(&mut breakdown, catalog, *shelves)?;
            }
            Self::Ledge { shutter } => {
                let base_rate = shutter.rate(catalog, &defaults.base_shutter_finish)?;
                let rate = marked_up(base_rate, defaults)?;
                breakdown.add(CostContributor::OpenUnit, per_sqft(rate, sqft)?);
            }
            Self::Drawer { carcass_type, finish, drawer_quantity, drawer_weight } => {
                let carcass_rate = catalog.lookup(&["carcass", carcass_type, finish])?;
                let bracket = drawer_width_bracket(measurement.width);
                let mechanism_rate = catalog.lookup(&["drawer", bracket, drawer_weight])?;
                let mechanism = checked_amount(
                    "drawerQuantity",
                    mechanism_rate,
                    Decimal::from(*drawer_quantity),
                )?;
                breakdown.add(CostContributor::Carcass, per_sqft(carcass_rate, sqft)?);
                breakdown.add(CostContributor::Drawer, mechanism);
            }
            Self::CarcassWithProfileShutter { carcass_type, finish, profile_type, shelves } => {
                let carcass_rate = catalog.lookup(&["carcass", carcass_type, finish])?;
                let profile_rate = match profile_type {
                    Some(profile_type) => catalog.lookup(&[
                        "profileShutter",
                        PROFILE_SHUTTER_MATERIAL,
                        profile_type,
                        finish,
                    ])?,
                    None => defaults.profile_shutter_fallback_rate,
                };
                breakdown.add(CostContributor::Carcass, per_sqft(carcass_rate, sqft)?);
                breakdown.add(CostContributor::ProfileShutter, per_sqft(profile_rate, sqft)?);
                add_shelves(&mut breakdown, catalog, *shelves)?;
            }
            Self::Panel { shutter, finish } => {
                let shutter_rate = shutter.rate(catalog, finish)?;
                breakdown.add(CostContributor::Shutter, per_sqft(shutter_rate, sqft)?);
            }
            Self::TvPanel { shelves } => {
                breakdown.add(CostContributor::Panel, catalog.lookup(&["tvPanel", "base"])?);
                add_shelves(&mut breakdown, catalog, *shelves)?;
            }
            Self::Bed { bed_type, size } => {
                breakdown.add(CostContributor::Bed, catalog.lookup(&["bed", bed_type, size])?);
            }
        }

        Ok(breakdown)
    }
}

/// Drawer mechanism bracket; anything wider than 600mm uses the 900mm row.
pub fn drawer_width_bracket(width: Decimal) -> &'static str {
    if width <= Decimal::from(450) {
        "450mm"
    } else if width <= Decimal::from(600) {
        "600mm"
    } else {
        "900mm"
    }
}

/// Per-sqft contributor, rounded on its own.
fn per_sqft(rate: Decimal, sqft: Decimal) -> Result<Decimal, EngineError> {
    checked_amount("sqft", rate, sqft).map(round_currency)
}

fn marked_up(rate: Decimal, defaults: &DefaultPolicy) -> Result<Decimal, EngineError> {
    checked_amount("openUnitMarkup", rate, defaults.open_unit_markup)
}

fn add_shelves(
    breakdown: &mut CostBreakdown,
    catalog: &RateCatalog,
    shelves: Option<u32>,
) -> Result<(), EngineError> {
    if let Some(count) = shelves {
        let rate = catalog.lookup(&["shelves", "perShelf"])?;
        let amount = checked_amount("shelves", rate, Decimal::from(count))?;
        breakdown.add(CostContributor::Shelves, amount);
    }
    Ok(())
}

fn required(field: &str, value: Option<&str>) -> Result<String, EngineError> {
    non_blank(value).map(str::to_owned).ok_or_else(|| EngineError::missing_field(field))
}

pub(crate) fn positive_count(field: &str, value: i64) -> Result<u32, EngineError> {
    u32::try_from(value)
        .ok()
        .filter(|count| *count > 0)
        .ok_or_else(|| EngineError::InvalidQuantity { field: field.to_owned(), value })
}

/// Zero shelves means none; negative counts are rejected.
fn shelf_count(value: Option<i64>) -> Result<Option<u32>, EngineError> {
    match value {
        None | Some(0) => Ok(None),
        Some(count) => positive_count("shelves", count).map(Some),
    }
}

/// Catalog-backed resolver for one request.
#[derive(Clone, Copy, Debug)]
pub struct CatalogCostResolver<'a> {
    catalog: &'a RateCatalog,
    defaults: &'a DefaultPolicy,
}

impl<'a> CatalogCostResolver<'a> {
    pub fn new(catalog: &'a RateCatalog, defaults: &'a DefaultPolicy) -> Self {
        Self { catalog, defaults }
    }

    pub fn price(
        &self,
        configuration: ComponentConfiguration,
        measurement: Measurement,
    ) -> Result<PricedComponent, EngineError> {
        let breakdown = self.resolve(&configuration, &measurement)?;
        Ok(PricedComponent::new(configuration, measurement, breakdown))
    }

    /// Full recompute of an existing component; accessories are kept.
    pub fn reprice(
        &self,
        component: &mut PricedComponent,
        configuration: ComponentConfiguration,
        measurement: Measurement,
    ) -> Result<(), EngineError> {
        let breakdown = self.resolve(&configuration, &measurement)?;
        component.reprice(configuration, measurement, breakdown);
        Ok(())
    }
}

impl UnitCostResolver for CatalogCostResolver<'_> {
    fn resolve(
        &self,
        configuration: &ComponentConfiguration,
        measurement: &Measurement,
    ) -> Result<CostBreakdown, EngineError> {
        measurement.validate()?;
        let resolved = ResolvedComponent::from_configuration(configuration, self.defaults)?;
        let breakdown = resolved.price(self.catalog, self.defaults, measurement)?;

        debug!(
            event_name = "pricing.unit.resolved",
            unit_type = configuration.unit_type(),
            total = %breakdown.total(),
            "unit cost resolved"
        );
        Ok(breakdown)
    }
}
