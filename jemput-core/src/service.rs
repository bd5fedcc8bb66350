//! High-level service facade combining the storage ports and booking rules.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tracing::{info, warn};

use crate::model::{
    Pickup, PickupId, PickupStatus, Role, User, UserId, Waste, WasteId, WasteKind, WasteStatus,
};
use crate::ports::StoreError;
use crate::schedule::{has_conflict, synchronize_waste_status};
use crate::stores::Stores;

/// Weight from which a waste intake should be collected soon.
pub const HIGH_VOLUME_KG: f64 = 100.0;

/// Note appended to recyclable intakes.
pub const RECYCLABLE_NOTE: &str = "Perlu Dipisahkan (Daur Ulang)";

/// Placeholder shown when a joined record no longer exists.
pub const MISSING_LABEL: &str = "-";

#[derive(thiserror::Error, Debug)]
/// Errors returned by service operations.
pub enum ServiceError {
    /// A required field is missing or malformed.
    #[error("Invalid input: {0}")]
    Validation(String),
    /// The technician already has a pickup within the conflict window.
    #[error("Technician {assignee} already has a pickup within two hours of that time")]
    Conflict {
        /// Technician whose schedule clashes.
        assignee: UserId,
    },
    /// The acting account lacks the required role.
    #[error("Access denied")]
    Forbidden,
    /// Hazardous waste was submitted without acknowledging the handling warning.
    #[error("Hazardous (B3) waste must be acknowledged before saving")]
    HazardNotAcknowledged,
    /// The requested username is taken.
    #[error("Username '{0}' is already registered")]
    DuplicateUsername(String),
    /// Username or password did not match.
    #[error("Invalid username or password")]
    InvalidCredentials,
    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    /// The storage backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
/// Pickup as submitted by a form, before identity is assigned.
pub struct PickupDraft {
    /// Existing pickup being edited, or `None` to create one.
    pub id: Option<PickupId>,
    /// Waste record to collect.
    pub waste_id: WasteId,
    /// Technician responsible for the run.
    pub assignee_id: UserId,
    /// Planned date and time.
    pub scheduled_at: NaiveDateTime,
    /// Lifecycle status.
    pub status: PickupStatus,
    /// Free text note.
    pub note: String,
}

#[derive(Debug, Clone, PartialEq)]
/// Non-fatal problem reported alongside a successful pickup save.
pub enum SaveWarning {
    /// The pickup was stored but its waste record kept its old status.
    StatusSyncFailed {
        /// Waste record that could not be updated.
        waste_id: WasteId,
        /// Underlying store error.
        reason: String,
    },
}

impl fmt::Display for SaveWarning {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveWarning::StatusSyncFailed { waste_id, reason } => write!(
                formatter,
                "pickup saved, but waste {waste_id} status was not updated: {reason}"
            ),
        }
    }
}

#[derive(Debug, Clone)]
/// Result of a successful pickup save.
pub struct PickupSaved {
    /// The stored pickup.
    pub pickup: Pickup,
    /// Whether a new record was created.
    pub created: bool,
    /// Status written to the waste record, if the sync succeeded.
    pub waste_status: Option<WasteStatus>,
    /// Problems that did not prevent the save.
    pub warnings: Vec<SaveWarning>,
}

#[derive(Debug, Clone)]
/// Pickup joined with the names of the records it references.
pub struct PickupRow {
    /// The stored pickup.
    pub pickup: Pickup,
    /// Name of the referenced waste record.
    pub waste_name: String,
    /// Location of the referenced waste record.
    pub waste_location: String,
    /// Username of the assigned technician.
    pub assignee_name: String,
}

#[derive(Debug, Clone)]
/// Waste intake as submitted by a form.
pub struct WasteDraft {
    /// Existing record being edited, or `None` to create one.
    pub id: Option<WasteId>,
    /// Short description of the batch.
    pub name: String,
    /// Category of the batch.
    pub kind: WasteKind,
    /// Weight in kilograms.
    pub weight_kg: f64,
    /// Where the batch is waiting.
    pub location: String,
    /// Free text note.
    pub note: String,
    /// The operator confirmed hazardous-waste handling procedures.
    pub hazard_acknowledged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Non-fatal notice reported alongside a successful waste save.
pub enum WasteWarning {
    /// The batch is heavy enough that a pickup should be scheduled soon.
    HighVolume {
        /// Recorded weight.
        weight_kg: f64,
    },
}

impl fmt::Display for WasteWarning {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WasteWarning::HighVolume { weight_kg } => write!(
                formatter,
                "high volume ({weight_kg} kg): schedule a pickup soon"
            ),
        }
    }
}

#[derive(Debug, Clone)]
/// Result of a successful waste save.
pub struct WasteSaved {
    /// The stored record.
    pub waste: Waste,
    /// Whether a new record was created.
    pub created: bool,
    /// Notices for the operator.
    pub warnings: Vec<WasteWarning>,
}

/// Public entry point for waste, pickup, and account operations.
pub struct JemputService {
    pub(crate) stores: Arc<Stores>,
    pub(crate) hash_cost: u32,
}

impl JemputService {
    /// Create a new service bound to the provided storage ports.
    #[must_use]
    pub fn new(stores: Arc<Stores>) -> Self {
        Self {
            stores,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Override the bcrypt cost used for new password hashes.
    #[must_use]
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Validate, conflict-check, persist, and synchronize a pickup.
    ///
    /// A failed waste status update does not undo the pickup write; it is
    /// reported in [`PickupSaved::warnings`].
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] for regular accounts,
    /// [`ServiceError::Validation`] for missing references,
    /// [`ServiceError::Conflict`] when the technician is double-booked (or the
    /// check could not read the schedule), and [`ServiceError::Store`] when the
    /// pickup write fails. Nothing is written in the first three cases.
    pub async fn save_pickup(
        &self,
        actor: &User,
        draft: PickupDraft,
    ) -> Result<PickupSaved, ServiceError> {
        if !actor.role.can_manage_records() {
            return Err(ServiceError::Forbidden);
        }
        if draft.waste_id.0.trim().is_empty() {
            return Err(ServiceError::Validation("select a waste record".into()));
        }
        if draft.assignee_id.0.trim().is_empty() {
            return Err(ServiceError::Validation("select a technician".into()));
        }

        let existing_id = draft.id.filter(|id| !id.0.trim().is_empty());

        if has_conflict(
            self.stores.pickups.as_ref(),
            &draft.assignee_id,
            draft.scheduled_at,
            existing_id.as_ref(),
        )
        .await
        {
            return Err(ServiceError::Conflict {
                assignee: draft.assignee_id,
            });
        }

        let created = existing_id.is_none();
        let id = existing_id.unwrap_or_else(|| PickupId(self.stores.ids.next_id()));

        let pickup = Pickup {
            id,
            waste_id: draft.waste_id,
            assignee_id: draft.assignee_id,
            scheduled_at: draft.scheduled_at,
            status: draft.status,
            note: draft.note,
        };

        if created {
            self.stores.pickups.insert_pickup(pickup.clone()).await?;
        } else {
            self.stores.pickups.replace_pickup(pickup.clone()).await?;
        }
        info!(
            pickup_id = %pickup.id,
            assignee = %pickup.assignee_id,
            status = %pickup.status,
            actor = %actor.username,
            created,
            "pickup saved"
        );

        let mut warnings = Vec::new();
        let waste_status = match synchronize_waste_status(
            self.stores.wastes.as_ref(),
            &pickup.waste_id,
            &pickup.status,
        )
        .await
        {
            Ok(status) => Some(status),
            Err(err) => {
                warn!(
                    pickup_id = %pickup.id,
                    waste_id = %pickup.waste_id,
                    error = %err,
                    "waste status sync failed after pickup save"
                );
                warnings.push(SaveWarning::StatusSyncFailed {
                    waste_id: pickup.waste_id.clone(),
                    reason: err.to_string(),
                });
                None
            }
        };

        Ok(PickupSaved {
            pickup,
            created,
            waste_status,
            warnings,
        })
    }

    /// List pickups visible to `actor`, joined with waste and technician names.
    ///
    /// Technicians only see their own assignments. Rows are ordered by
    /// scheduled time.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] for regular accounts and
    /// [`ServiceError::Store`] when a read fails.
    pub async fn list_pickups(&self, actor: &User) -> Result<Vec<PickupRow>, ServiceError> {
        if !actor.role.can_manage_records() {
            return Err(ServiceError::Forbidden);
        }

        let mut pickups = if actor.role == Role::Technician {
            self.stores.pickups.pickups_for_assignee(&actor.id).await?
        } else {
            self.stores.pickups.all_pickups().await?
        };
        pickups.sort_by_key(|pickup| pickup.scheduled_at);

        let wastes: HashMap<WasteId, Waste> = self
            .stores
            .wastes
            .all_wastes()
            .await?
            .into_iter()
            .map(|waste| (waste.id.clone(), waste))
            .collect();
        let users: HashMap<UserId, User> = self
            .stores
            .users
            .all_users()
            .await?
            .into_iter()
            .map(|user| (user.id.clone(), user))
            .collect();

        let rows = pickups
            .into_iter()
            .map(|pickup| {
                let waste = wastes.get(&pickup.waste_id);
                PickupRow {
                    waste_name: waste.map_or(MISSING_LABEL, |waste| &waste.name).to_owned(),
                    waste_location: waste
                        .map_or(MISSING_LABEL, |waste| &waste.location)
                        .to_owned(),
                    assignee_name: users
                        .get(&pickup.assignee_id)
                        .map_or(MISSING_LABEL, |user| &user.username)
                        .to_owned(),
                    pickup,
                }
            })
            .collect();
        Ok(rows)
    }

    /// Delete a pickup. The referenced waste keeps its current status.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] for regular accounts and
    /// [`ServiceError::Store`] when the delete fails.
    pub async fn delete_pickup(&self, actor: &User, id: &PickupId) -> Result<(), ServiceError> {
        if !actor.role.can_manage_records() {
            return Err(ServiceError::Forbidden);
        }
        self.stores.pickups.delete_pickup(id).await?;
        info!(pickup_id = %id, actor = %actor.username, "pickup deleted");
        Ok(())
    }

    /// Accounts that may be assigned to a pickup, ordered by username.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] when the read fails.
    pub async fn assignable_technicians(&self) -> Result<Vec<User>, ServiceError> {
        let mut users: Vec<User> = self
            .stores
            .users
            .all_users()
            .await?
            .into_iter()
            .filter(|user| user.role.can_manage_records())
            .collect();
        users.sort_by(|left, right| left.username.cmp(&right.username));
        Ok(users)
    }

    /// Validate and store a waste intake.
    ///
    /// New records start as [`WasteStatus::Pending`]; edits keep the stored
    /// status since only pickup saves change it.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] for regular accounts,
    /// [`ServiceError::Validation`] for missing fields,
    /// [`ServiceError::HazardNotAcknowledged`] for unconfirmed B3 waste, and
    /// [`ServiceError::Store`] when a read or write fails.
    pub async fn save_waste(
        &self,
        actor: &User,
        draft: WasteDraft,
    ) -> Result<WasteSaved, ServiceError> {
        if !actor.role.can_manage_records() {
            return Err(ServiceError::Forbidden);
        }
        if draft.name.trim().is_empty() || draft.location.trim().is_empty() {
            return Err(ServiceError::Validation(
                "name, weight and location are required".into(),
            ));
        }
        if !draft.weight_kg.is_finite() || draft.weight_kg < 0.0 {
            return Err(ServiceError::Validation(
                "weight must be a non-negative number".into(),
            ));
        }
        if draft.kind == WasteKind::Hazardous && !draft.hazard_acknowledged {
            return Err(ServiceError::HazardNotAcknowledged);
        }

        let mut note = draft.note.trim().to_owned();
        if draft.kind == WasteKind::Recyclable && !note.contains(RECYCLABLE_NOTE) {
            if !note.is_empty() {
                note.push(' ');
            }
            note.push_str(RECYCLABLE_NOTE);
        }

        let mut warnings = Vec::new();
        if draft.weight_kg >= HIGH_VOLUME_KG {
            warnings.push(WasteWarning::HighVolume {
                weight_kg: draft.weight_kg,
            });
        }

        let existing_id = draft.id.filter(|id| !id.0.trim().is_empty());
        let (id, status, created) = match existing_id {
            Some(id) => {
                let stored = self
                    .stores
                    .wastes
                    .waste(&id)
                    .await?
                    .ok_or_else(|| StoreError::NotFound(id.0.clone()))?;
                (id, stored.status, false)
            }
            None => (
                WasteId(self.stores.ids.next_id()),
                WasteStatus::Pending,
                true,
            ),
        };

        let waste = Waste {
            id,
            name: draft.name.trim().to_owned(),
            kind: draft.kind,
            weight_kg: draft.weight_kg,
            location: draft.location.trim().to_owned(),
            received_at: Local::now().naive_local(),
            input_by: actor.username.clone(),
            note,
            status,
        };

        if created {
            self.stores.wastes.insert_waste(waste.clone()).await?;
        } else {
            self.stores.wastes.replace_waste(waste.clone()).await?;
        }
        info!(
            waste_id = %waste.id,
            kind = %waste.kind,
            weight_kg = waste.weight_kg,
            created,
            "waste saved"
        );

        Ok(WasteSaved {
            waste,
            created,
            warnings,
        })
    }

    /// All waste records, newest intake first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] when the read fails.
    pub async fn list_wastes(&self) -> Result<Vec<Waste>, ServiceError> {
        let mut wastes = self.stores.wastes.all_wastes().await?;
        wastes.sort_by(|left, right| right.received_at.cmp(&left.received_at));
        Ok(wastes)
    }

    /// Delete a waste record. Pickups referencing it are left in place.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] for regular accounts and
    /// [`ServiceError::Store`] when the delete fails.
    pub async fn delete_waste(&self, actor: &User, id: &WasteId) -> Result<(), ServiceError> {
        if !actor.role.can_manage_records() {
            return Err(ServiceError::Forbidden);
        }
        self.stores.wastes.delete_waste(id).await?;
        info!(waste_id = %id, actor = %actor.username, "waste deleted");
        Ok(())
    }
}
