use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cpq::onsite::OnsiteWorkItem;
use crate::domain::component::PricedComponent;
use crate::domain::section::CabinetSection;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuotationId(pub String);

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub name: String,
    #[serde(default)]
    pub components: Vec<PricedComponent>,
    #[serde(default)]
    pub sections: Vec<CabinetSection>,
    #[serde(default)]
    pub onsite_work: Vec<OnsiteWorkItem>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomTotals {
    pub furniture: Decimal,
    pub partitions: Decimal,
    pub onsite: Decimal,
    pub total: Decimal,
}

impl RoomTotals {
    fn absorb(&mut self, other: &RoomTotals) {
        self.furniture += other.furniture;
        self.partitions += other.partitions;
        self.onsite += other.onsite;
        self.total += other.total;
    }
}

impl Room {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn totals(&self) -> RoomTotals {
        let furniture: Decimal =
            self.components.iter().map(PricedComponent::total_price).sum();
        let partitions: Decimal =
            self.sections.iter().map(CabinetSection::partitions_total).sum();
        let onsite: Decimal = self.onsite_work.iter().map(|item| item.price).sum();

        RoomTotals { furniture, partitions, onsite, total: furniture + partitions + onsite }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSubtotal {
    pub name: String,
    pub total: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationTotals {
    #[serde(flatten)]
    pub totals: RoomTotals,
    pub rooms: Vec<RoomSubtotal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub id: QuotationId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub rooms: Vec<Room>,
}

impl Quotation {
    pub fn new(id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self { id: QuotationId(id.into()), created_at, rooms: Vec::new() }
    }

    pub fn room(&self, name: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.name == name)
    }

    /// Bottom-up fold: component and partition prices into rooms, rooms into the quotation.
    pub fn totals(&self) -> QuotationTotals {
        self.rooms.iter().fold(QuotationTotals::default(), |mut acc, room| {
            let room_totals = room.totals();
            acc.totals.absorb(&room_totals);
            acc.rooms.push(RoomSubtotal { name: room.name.clone(), total: room_totals.total });
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::{Quotation, Room};
    use crate::cpq::allocator::PartitionAllocator;
    use crate::cpq::catalog::RateCatalog;
    use crate::cpq::onsite::{CalculationType, OnsiteWorkItem};
    use crate::domain::component::{
        ComponentConfiguration, CostBreakdown, CostContributor, PricedComponent, TvPanelOptions,
    };
    use crate::domain::measurement::Measurement;
    use crate::domain::section::{CabinetSection, PartitionRequest, SectionKind};

    fn measurement(width: i64) -> Measurement {
        Measurement::new(Decimal::from(width), Decimal::from(720), Decimal::from(560))
            .expect("measurement")
    }

    fn tv_panel(price: i64) -> PricedComponent {
        PricedComponent::new(
            ComponentConfiguration::TvPanel(TvPanelOptions::default()),
            measurement(1800),
            CostBreakdown::new().with(CostContributor::Panel, Decimal::from(price)),
        )
    }

    fn painting(price: i64) -> OnsiteWorkItem {
        OnsiteWorkItem {
            category: "Painting".to_owned(),
            service: "Wall Putty".to_owned(),
            calculation_type: CalculationType::HeightByWidth,
            rate: Decimal::from(33),
            units: Decimal::from(price) / Decimal::from(33),
            price: Decimal::from(price),
        }
    }

    fn kitchen() -> Room {
        let catalog = RateCatalog::from_rates([
            (vec!["partitions", "Open Unit", "base"], Decimal::from(1800)),
            (vec!["partitions", "Tall Unit", "base"], Decimal::from(5200)),
        ]);
        let allocator = PartitionAllocator::new(&catalog);
        let mut base = CabinetSection::new(SectionKind::Base, measurement(2400)).expect("section");
        for (component_type, width) in [("Open Unit", 600), ("Tall Unit", 900)] {
            allocator
                .add_partition(
                    &mut base,
                    PartitionRequest {
                        width: Decimal::from(width),
                        component_type: component_type.to_owned(),
                        module: None,
                        details: Vec::new(),
                        accessories: Vec::new(),
                    },
                )
                .expect("partition fits");
        }

        Room { sections: vec![base], onsite_work: vec![painting(6600)], ..Room::new("Kitchen") }
    }

    #[test]
    fn room_totals_split_furniture_partitions_and_onsite() {
        let totals = kitchen().totals();
        assert_eq!(totals.furniture, Decimal::ZERO);
        assert_eq!(totals.partitions, Decimal::from(7000));
        assert_eq!(totals.onsite, Decimal::from(6600));
        assert_eq!(totals.total, Decimal::from(13600));
    }

    #[test]
    fn quotation_totals_fold_rooms_in_order() {
        let created_at = Utc.with_ymd_and_hms(2026, 3, 14, 10, 30, 0).single().expect("timestamp");
        let mut quotation = Quotation::new("QT-0042", created_at);
        quotation.rooms.push(kitchen());
        quotation.rooms.push(Room {
            components: vec![tv_panel(12500), tv_panel(4000)],
            ..Room::new("Living")
        });

        let totals = quotation.totals();
        assert_eq!(totals.totals.furniture, Decimal::from(16500));
        assert_eq!(totals.totals.total, Decimal::from(30100));
        assert_eq!(totals.rooms.len(), 2);
        assert_eq!(totals.rooms[0].name, "Kitchen");
        assert_eq!(totals.rooms[1].total, Decimal::from(16500));
        assert!(quotation.room("Living").is_some());
        assert!(quotation.room("Balcony").is_none());
    }

    #[test]
    fn empty_quotation_totals_are_zero() {
        let quotation = Quotation::new("QT-0001", Utc::now());
        let totals = quotation.totals();
        assert_eq!(totals.totals.total, Decimal::ZERO);
        assert!(totals.rooms.is_empty());
    }

    #[test]
    fn quotation_round_trips_through_json() {
        let mut quotation = Quotation::new("QT-0042", Utc::now());
        quotation.rooms.push(kitchen());
        let json = serde_json::to_string(&quotation).expect("serialize");
        let loaded: Quotation = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(loaded, quotation);
        assert_eq!(loaded.totals(), quotation.totals());
    }
}
