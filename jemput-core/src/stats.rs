//! Weight aggregates used by charts and list footers.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{Waste, WasteKind};

/// Total weight per intake day and waste kind.
#[must_use]
pub fn daily_totals(wastes: &[Waste]) -> BTreeMap<(NaiveDate, WasteKind), f64> {
    let mut totals = BTreeMap::new();
    for waste in wastes {
        *totals
            .entry((waste.received_at.date(), waste.kind.clone()))
            .or_insert(0.0) += waste.weight_kg;
    }
    totals
}

/// Total weight per waste kind.
#[must_use]
pub fn totals_by_kind(wastes: &[Waste]) -> BTreeMap<WasteKind, f64> {
    let mut totals = BTreeMap::new();
    for waste in wastes {
        *totals.entry(waste.kind.clone()).or_insert(0.0) += waste.weight_kg;
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{WasteId, WasteStatus};

    fn waste(day: u32, hour: u32, kind: WasteKind, weight_kg: f64) -> Waste {
        Waste {
            id: WasteId(format!("{day}-{hour}")),
            name: "batch".to_owned(),
            kind,
            weight_kg,
            location: "KOTA BANDUNG".to_owned(),
            received_at: NaiveDate::from_ymd_opt(2024, 3, day)
                .and_then(|date| date.and_hms_opt(hour, 0, 0))
                .expect("valid test time"),
            input_by: "admin".to_owned(),
            note: String::new(),
            status: WasteStatus::Pending,
        }
    }

    #[test]
    fn groups_by_day_and_kind() {
        let wastes = [
            waste(1, 8, WasteKind::Organic, 10.0),
            waste(1, 17, WasteKind::Organic, 5.5),
            waste(1, 9, WasteKind::Hazardous, 2.0),
            waste(2, 8, WasteKind::Organic, 1.0),
        ];
        let totals = daily_totals(&wastes);

        let first = NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date");
        let second = NaiveDate::from_ymd_opt(2024, 3, 2).expect("valid date");
        assert_eq!(totals.len(), 3);
        assert_eq!(totals.get(&(first, WasteKind::Organic)), Some(&15.5));
        assert_eq!(totals.get(&(first, WasteKind::Hazardous)), Some(&2.0));
        assert_eq!(totals.get(&(second, WasteKind::Organic)), Some(&1.0));
    }

    #[test]
    fn sums_per_kind() {
        let wastes = [
            waste(1, 8, WasteKind::Recyclable, 3.0),
            waste(4, 8, WasteKind::Recyclable, 4.0),
            waste(4, 9, WasteKind::Other("Kaca".to_owned()), 1.5),
        ];
        let totals = totals_by_kind(&wastes);
        assert_eq!(totals.get(&WasteKind::Recyclable), Some(&7.0));
        assert_eq!(totals.get(&WasteKind::Other("Kaca".to_owned())), Some(&1.5));
        assert!(totals_by_kind(&[]).is_empty());
    }
}
