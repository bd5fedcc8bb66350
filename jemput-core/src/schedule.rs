//! Pickup booking rules: technician double-booking and waste status mirroring.

use chrono::{NaiveDateTime, TimeDelta};
use tracing::{debug, warn};

use crate::model::{PickupId, PickupStatus, UserId, WasteId, WasteStatus};
use crate::ports::{PickupStore, StoreError, WasteStore};

/// Minimum distance between two pickups of the same technician.
#[must_use]
pub fn conflict_window() -> TimeDelta {
    TimeDelta::hours(2)
}

/// Whether two scheduled times are too close for one technician.
///
/// Times exactly [`conflict_window`] apart do not clash.
#[must_use]
pub fn clashes(existing: NaiveDateTime, proposed: NaiveDateTime) -> bool {
    let gap = if existing >= proposed {
        existing - proposed
    } else {
        proposed - existing
    };
    gap < conflict_window()
}

/// Decide whether `assignee` already has a pickup too close to `proposed`.
///
/// `exclude` names the pickup being edited so it never clashes with itself.
/// A failed read counts as a conflict.
pub async fn has_conflict(
    pickups: &dyn PickupStore,
    assignee: &UserId,
    proposed: NaiveDateTime,
    exclude: Option<&PickupId>,
) -> bool {
    let existing = match pickups.pickups_for_assignee(assignee).await {
        Ok(existing) => existing,
        Err(err) => {
            warn!(assignee = %assignee, error = %err, "conflict check failed; treating as conflict");
            return true;
        }
    };

    let clash = existing
        .iter()
        .filter(|pickup| exclude != Some(&pickup.id))
        .find(|pickup| clashes(pickup.scheduled_at, proposed));

    if let Some(pickup) = clash {
        debug!(
            assignee = %assignee,
            existing = %pickup.id,
            scheduled_at = %pickup.scheduled_at,
            "pickup clashes with existing assignment"
        );
        return true;
    }
    false
}

/// Mirror a saved pickup status onto its waste record.
///
/// Returns the status that was written.
///
/// # Errors
///
/// Returns a [`StoreError`] when the waste record cannot be updated.
pub async fn synchronize_waste_status(
    wastes: &dyn WasteStore,
    waste_id: &WasteId,
    status: &PickupStatus,
) -> Result<WasteStatus, StoreError> {
    let target = status.waste_status();
    wastes.set_waste_status(waste_id, target).await?;
    debug!(waste_id = %waste_id, status = %target, "waste status synchronized");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .expect("valid test time")
    }

    #[test]
    fn ninety_minutes_clash() {
        assert!(clashes(at(10, 0), at(11, 30)));
        assert!(clashes(at(11, 30), at(10, 0)));
    }

    #[test]
    fn exactly_two_hours_is_free() {
        assert!(!clashes(at(10, 0), at(12, 0)));
        assert!(!clashes(at(12, 0), at(10, 0)));
    }

    #[test]
    fn one_second_short_of_window_clashes() {
        let proposed = at(12, 0) - TimeDelta::seconds(1);
        assert!(clashes(at(10, 0), proposed));
    }

    #[test]
    fn same_time_clashes() {
        assert!(clashes(at(8, 15), at(8, 15)));
    }
}
