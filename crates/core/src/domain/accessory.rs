use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Priced add-on owned by exactly one component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessory {
    #[serde(rename = "type")]
    pub accessory_type: String,
    pub dimension: Option<String>,
    pub finish: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessoryRequest {
    #[serde(rename = "type")]
    pub accessory_type: String,
    pub dimension: Option<String>,
    pub finish: Option<String>,
    pub quantity: i64,
}

/// Partial update; absent fields keep the stored value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessoryPatch {
    #[serde(rename = "type")]
    pub accessory_type: Option<String>,
    pub dimension: Option<String>,
    pub finish: Option<String>,
    pub quantity: Option<i64>,
}

impl AccessoryPatch {
    pub fn apply_to(&self, existing: &Accessory) -> AccessoryRequest {
        AccessoryRequest {
            accessory_type: self
                .accessory_type
                .clone()
                .unwrap_or_else(|| existing.accessory_type.clone()),
            dimension: self.dimension.clone().or_else(|| existing.dimension.clone()),
            finish: self.finish.clone().or_else(|| existing.finish.clone()),
            quantity: self.quantity.unwrap_or(i64::from(existing.quantity)),
        }
    }
}
