use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cpq::catalog::{CatalogError, RatePath};
use crate::cpq::pricing::positive_count;
use crate::domain::measurement::{checked_amount, round_currency};
use crate::errors::EngineError;

/// How an onsite service rate is applied to the work measured on site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalculationType {
    /// Rate per unit of area: `area`, or `height × width`.
    #[serde(rename = "HxW")]
    HeightByWidth,
    #[serde(rename = "Quantity Count")]
    QuantityCount,
    /// Rate per unit height per running length.
    #[serde(rename = "H / RFT")]
    HeightByRunningFoot,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnsiteService {
    pub calculation_type: CalculationType,
    pub rate: Decimal,
}

/// `category -> service -> {calculationType, rate}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OnsiteServiceTable {
    categories: BTreeMap<String, BTreeMap<String, OnsiteService>>,
}

impl OnsiteServiceTable {
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let table: Self = serde_json::from_str(raw)?;
        for (category, services) in &table.categories {
            for (service, entry) in services {
                if entry.rate.is_sign_negative() && !entry.rate.is_zero() {
                    let path = [category.as_str(), service.as_str(), "rate"];
                    return Err(CatalogError::InvalidLeaf {
                        path: RatePath::from_segments(path),
                        reason: format!("negative rate {}", entry.rate),
                    });
                }
            }
        }

        debug!(
            event_name = "onsite.table.loaded",
            category_count = table.categories.len(),
            "onsite service table loaded"
        );
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_json_str(&raw)
    }

    pub fn insert(&mut self, category: &str, service: &str, entry: OnsiteService) {
        self.categories
            .entry(category.to_owned())
            .or_default()
            .insert(service.to_owned(), entry);
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn service(&self, category: &str, service: &str) -> Result<&OnsiteService, EngineError> {
        self.categories.get(category).and_then(|services| services.get(service)).ok_or_else(
            || EngineError::PricingNotFound {
                path: RatePath::from_segments([category, service]),
            },
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnsiteWorkRequest {
    pub category: String,
    pub service: String,
    pub height: Option<Decimal>,
    pub width: Option<Decimal>,
    pub area: Option<Decimal>,
    pub length: Option<Decimal>,
    pub quantity: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnsiteWorkItem {
    pub category: String,
    pub service: String,
    pub calculation_type: CalculationType,
    pub rate: Decimal,
    pub units: Decimal,
    pub price: Decimal,
}

#[derive(Clone, Copy, Debug)]
pub struct OnsiteRateEngine<'a> {
    table: &'a OnsiteServiceTable,
}

impl<'a> OnsiteRateEngine<'a> {
    pub fn new(table: &'a OnsiteServiceTable) -> Self {
        Self { table }
    }

    pub fn price(&self, request: &OnsiteWorkRequest) -> Result<OnsiteWorkItem, EngineError> {
        let service = self.table.service(&request.category, &request.service)?;
        let units = match service.calculation_type {
            CalculationType::HeightByWidth => match request.area {
                Some(area) => non_negative("area", area)?,
                None => {
                    let height = measured("height", request.height)?;
                    checked_amount("width", height, measured("width", request.width)?)?
                }
            },
            CalculationType::QuantityCount => {
                let quantity =
                    request.quantity.ok_or_else(|| EngineError::missing_field("quantity"))?;
                Decimal::from(positive_count("quantity", quantity)?)
            }
            CalculationType::HeightByRunningFoot => {
                let height = measured("height", request.height)?;
                checked_amount("length", height, measured("length", request.length)?)?
            }
        };
        let price = round_currency(checked_amount("units", service.rate, units)?);

        debug!(
            event_name = "onsite.item.priced",
            category = %request.category,
            service = %request.service,
            units = %units,
            price = %price,
            "onsite work priced"
        );
        Ok(OnsiteWorkItem {
            category: request.category.clone(),
            service: request.service.clone(),
            calculation_type: service.calculation_type,
            rate: service.rate,
            units,
            price,
        })
    }

    /// Prices every request; the first rejection aborts the batch.
    pub fn price_all(
        &self,
        requests: &[OnsiteWorkRequest],
    ) -> Result<Vec<OnsiteWorkItem>, EngineError> {
        requests.iter().map(|request| self.price(request)).collect()
    }
}

pub fn total(items: &[OnsiteWorkItem]) -> Decimal {
    items.iter().fold(Decimal::ZERO, |sum, item| sum + item.price)
}

fn measured(field: &str, value: Option<Decimal>) -> Result<Decimal, EngineError> {
    let value = value.ok_or_else(|| EngineError::missing_field(field))?;
    non_negative(field, value)
}

fn non_negative(field: &str, value: Decimal) -> Result<Decimal, EngineError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(EngineError::InvalidMeasurement { field: field.to_owned(), value });
    }
    Ok(value)
}
