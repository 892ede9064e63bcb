use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::accessory::Accessory;
use crate::domain::measurement::Measurement;

/// Customer-chosen configuration of one furniture unit, tagged by `unitType`.
///
/// Every option is optional on the wire; the resolver checks the variant's
/// required set before any rate is looked up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unitType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentConfiguration {
    CarcassWithShutters(ShutterUnitOptions),
    OpenUnit(OpenUnitOptions),
    Ledge(OpenUnitOptions),
    Drawer(DrawerOptions),
    CarcassWithProfileShutter(ProfileShutterOptions),
    Top(PanelOptions),
    Side(PanelOptions),
    TvPanel(TvPanelOptions),
    Bed(BedOptions),
}

impl ComponentConfiguration {
    pub fn unit_type(&self) -> &'static str {
        match self {
            Self::CarcassWithShutters(_) => "CARCASS_WITH_SHUTTERS",
            Self::OpenUnit(_) => "OPEN_UNIT",
            Self::Ledge(_) => "LEDGE",
            Self::Drawer(_) => "DRAWER",
            Self::CarcassWithProfileShutter(_) => "CARCASS_WITH_PROFILE_SHUTTER",
            Self::Top(_) => "TOP",
            Self::Side(_) => "SIDE",
            Self::TvPanel(_) => "TV_PANEL",
            Self::Bed(_) => "BED",
        }
    }

    pub fn category(&self) -> ComponentCategory {
        match self {
            Self::Bed(_) => ComponentCategory::Bed,
            _ => ComponentCategory::Standard,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShutterUnitOptions {
    pub carcass_type: Option<String>,
    pub shutter_material: Option<String>,
    pub shutter_type: Option<String>,
    pub finish: Option<String>,
    pub shelves: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenUnitOptions {
    pub shutter_material: Option<String>,
    pub shutter_type: Option<String>,
    pub finish: Option<String>,
    pub shelves: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawerOptions {
    pub carcass_type: Option<String>,
    pub drawer_quantity: Option<i64>,
    pub drawer_weight: Option<String>,
    pub finish: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileShutterOptions {
    pub carcass_type: Option<String>,
    pub shutter_material: Option<String>,
    pub shutter_type: Option<String>,
    pub finish: Option<String>,
    pub shelves: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelOptions {
    pub shutter_material: Option<String>,
    pub shutter_type: Option<String>,
    pub finish: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TvPanelOptions {
    pub shelves: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedOptions {
    pub bed_type: Option<String>,
    pub size: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentCategory {
    Standard,
    Bed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CostContributor {
    Carcass,
    Shutter,
    ProfileShutter,
    Drawer,
    Shelves,
    OpenUnit,
    Panel,
    Bed,
    Base,
    Details,
    Accessories,
}

/// Contributor amounts plus their exact sum.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    #[serde(flatten)]
    contributions: BTreeMap<CostContributor, Decimal>,
    total: Decimal,
}

impl CostBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, contributor: CostContributor, amount: Decimal) -> Self {
        self.add(contributor, amount);
        self
    }

    pub fn add(&mut self, contributor: CostContributor, amount: Decimal) {
        *self.contributions.entry(contributor).or_insert(Decimal::ZERO) += amount;
        self.total += amount;
    }

    pub fn get(&self, contributor: CostContributor) -> Option<Decimal> {
        self.contributions.get(&contributor).copied()
    }

    pub fn contributions(&self) -> &BTreeMap<CostContributor, Decimal> {
        &self.contributions
    }

    pub fn total(&self) -> Decimal {
        self.total
    }
}

/// A configuration committed with its price and accessory ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedComponent {
    configuration: ComponentConfiguration,
    measurement: Measurement,
    category: ComponentCategory,
    breakdown: CostBreakdown,
    base_price: Decimal,
    #[serde(default)]
    accessories: Vec<Accessory>,
    #[serde(default)]
    accessories_total_price: Decimal,
    total_price: Decimal,
}

impl PricedComponent {
    pub fn new(
        configuration: ComponentConfiguration,
        measurement: Measurement,
        breakdown: CostBreakdown,
    ) -> Self {
        let base_price = breakdown.total();
        Self {
            category: configuration.category(),
            configuration,
            measurement,
            breakdown,
            base_price,
            accessories: Vec::new(),
            accessories_total_price: Decimal::ZERO,
            total_price: base_price,
        }
    }

    pub fn configuration(&self) -> &ComponentConfiguration {
        &self.configuration
    }

    pub fn measurement(&self) -> &Measurement {
        &self.measurement
    }

    pub fn category(&self) -> ComponentCategory {
        self.category
    }

    pub fn breakdown(&self) -> &CostBreakdown {
        &self.breakdown
    }

    pub fn base_price(&self) -> Decimal {
        self.base_price
    }

    pub fn accessories(&self) -> &[Accessory] {
        &self.accessories
    }

    pub fn accessories_total_price(&self) -> Decimal {
        self.accessories_total_price
    }

    pub fn total_price(&self) -> Decimal {
        self.total_price
    }

    /// Replaces the configuration and price; the accessory ledger is kept.
    pub(crate) fn reprice(
        &mut self,
        configuration: ComponentConfiguration,
        measurement: Measurement,
        breakdown: CostBreakdown,
    ) {
        self.category = configuration.category();
        self.configuration = configuration;
        self.measurement = measurement;
        self.base_price = breakdown.total();
        self.breakdown = breakdown;
        self.total_price = self.base_price + self.accessories_total_price;
    }

    pub(crate) fn accessories_mut(&mut self) -> &mut Vec<Accessory> {
        &mut self.accessories
    }

    pub(crate) fn set_totals(&mut self, accessories_total_price: Decimal, total_price: Decimal) {
        self.accessories_total_price = accessories_total_price;
        self.total_price = total_price;
    }
}
