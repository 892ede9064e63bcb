use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const OPEN_UNIT_MARKUP: Decimal = Decimal::from_parts(125, 0, 0, false, 2);
pub const PROFILE_SHUTTER_FALLBACK_RATE: Decimal = Decimal::from_parts(1_100, 0, 0, false, 0);
pub const PROFILE_SHUTTER_MATERIAL: &str = "GLASS_PROFILE";

/// The one place optional configuration values are defaulted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultPolicy {
    pub finish: String,
    pub drawer_weight: String,
    /// Finish row used as the base shutter rate for open units and ledges.
    pub base_shutter_finish: String,
    pub open_unit_markup: Decimal,
    pub profile_shutter_fallback_rate: Decimal,
}

impl Default for DefaultPolicy {
    fn default() -> Self {
        Self {
            finish: "WHITE".to_owned(),
            drawer_weight: "30KG".to_owned(),
            base_shutter_finish: "WHITE".to_owned(),
            open_unit_markup: OPEN_UNIT_MARKUP,
            profile_shutter_fallback_rate: PROFILE_SHUTTER_FALLBACK_RATE,
        }
    }
}

impl DefaultPolicy {
    pub fn finish_or_default(&self, finish: Option<&str>) -> String {
        non_blank(finish).unwrap_or(&self.finish).to_owned()
    }

    pub fn drawer_weight_or_default(&self, weight: Option<&str>) -> String {
        non_blank(weight).unwrap_or(&self.drawer_weight).to_owned()
    }
}

/// Treats blank strings as absent.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Materials whose shutter rates are additionally keyed by shutter type.
pub fn is_hdhmr_class(material: &str) -> bool {
    material.trim().to_ascii_uppercase().starts_with("HDHMR")
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{is_hdhmr_class, non_blank, DefaultPolicy};

    #[test]
    fn defaults_fill_only_finish_and_drawer_weight() {
        let defaults = DefaultPolicy::default();
        assert_eq!(defaults.finish_or_default(None), "WHITE");
        assert_eq!(defaults.finish_or_default(Some("  ")), "WHITE");
        assert_eq!(defaults.finish_or_default(Some("GREY")), "GREY");
        assert_eq!(defaults.drawer_weight_or_default(None), "30KG");
        assert_eq!(defaults.drawer_weight_or_default(Some("50KG")), "50KG");
        assert_eq!(defaults.open_unit_markup, Decimal::new(125, 2));
    }

    #[test]
    fn hdhmr_family_is_matched_by_prefix() {
        assert!(is_hdhmr_class("HDHMR"));
        assert!(is_hdhmr_class("hdhmr_acrylic"));
        assert!(!is_hdhmr_class("BWP"));
        assert_eq!(non_blank(Some(" PU ")), Some("PU"));
    }
}
