//! Domain data structures for waste intake, pickups, and user accounts.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
/// Identifier for a logged waste intake.
pub struct WasteId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
/// Identifier for a scheduled pickup.
pub struct PickupId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
/// Identifier for a user account.
pub struct UserId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
/// Identifier for a custom pickup location.
pub struct LocationId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
/// Identifier for a saved assistant conversation.
pub struct ChatHistoryId(pub String);

impl fmt::Display for WasteId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl fmt::Display for PickupId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl fmt::Display for ChatHistoryId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
/// Waste categories recorded at intake.
pub enum WasteKind {
    /// Organic waste.
    Organic,
    /// Non-organic waste.
    Inorganic,
    /// Hazardous and toxic waste (B3).
    Hazardous,
    /// Recyclables that must be separated.
    Recyclable,
    /// Any other category, kept verbatim.
    Other(String),
}

impl WasteKind {
    /// Categories offered when logging a new intake.
    pub const STANDARD: [WasteKind; 4] = [
        WasteKind::Organic,
        WasteKind::Inorganic,
        WasteKind::Hazardous,
        WasteKind::Recyclable,
    ];

    /// Stored label of the category.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            WasteKind::Organic => "Organik",
            WasteKind::Inorganic => "Anorganik",
            WasteKind::Hazardous => "B3",
            WasteKind::Recyclable => "DaurUlang",
            WasteKind::Other(label) => label,
        }
    }
}

impl From<String> for WasteKind {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Organik" => WasteKind::Organic,
            "Anorganik" => WasteKind::Inorganic,
            "B3" => WasteKind::Hazardous,
            "DaurUlang" => WasteKind::Recyclable,
            _ => WasteKind::Other(label),
        }
    }
}

impl From<WasteKind> for String {
    fn from(kind: WasteKind) -> Self {
        kind.as_str().to_owned()
    }
}

impl fmt::Display for WasteKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
/// Collection state of a waste record. Only the status synchronizer writes it.
pub enum WasteStatus {
    /// Waiting to be collected.
    #[default]
    Pending,
    /// Collected by a completed pickup.
    #[serde(rename = "Dijemput")]
    Collected,
}

impl WasteStatus {
    /// Stored label of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WasteStatus::Pending => "Pending",
            WasteStatus::Collected => "Dijemput",
        }
    }
}

impl fmt::Display for WasteStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
/// Lifecycle status of a pickup. Unknown labels are preserved.
pub enum PickupStatus {
    /// Not yet planned in detail.
    #[default]
    Pending,
    /// Planned for a technician ("Dijadwalkan").
    Scheduled,
    /// Completed ("Selesai"); the only status that marks waste as collected.
    Done,
    /// Any other label, kept verbatim.
    Other(String),
}

impl PickupStatus {
    /// Statuses offered when editing a pickup, in display order.
    pub const STANDARD: [PickupStatus; 3] = [
        PickupStatus::Pending,
        PickupStatus::Scheduled,
        PickupStatus::Done,
    ];

    /// Stored label of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            PickupStatus::Pending => "Pending",
            PickupStatus::Scheduled => "Dijadwalkan",
            PickupStatus::Done => "Selesai",
            PickupStatus::Other(label) => label,
        }
    }

    /// Waste status implied by this pickup status.
    #[must_use]
    pub fn waste_status(&self) -> WasteStatus {
        match self {
            PickupStatus::Done => WasteStatus::Collected,
            _ => WasteStatus::Pending,
        }
    }
}

impl From<String> for PickupStatus {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Pending" => PickupStatus::Pending,
            "Dijadwalkan" => PickupStatus::Scheduled,
            "Selesai" => PickupStatus::Done,
            _ => PickupStatus::Other(label),
        }
    }
}

impl From<&str> for PickupStatus {
    fn from(label: &str) -> Self {
        PickupStatus::from(label.to_owned())
    }
}

impl From<PickupStatus> for String {
    fn from(status: PickupStatus) -> Self {
        status.as_str().to_owned()
    }
}

impl fmt::Display for PickupStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A logged waste intake.
pub struct Waste {
    /// Unique identifier.
    pub id: WasteId,
    /// Short description of the batch.
    pub name: String,
    /// Category of the batch.
    pub kind: WasteKind,
    /// Weight in kilograms.
    pub weight_kg: f64,
    /// Where the batch is waiting.
    pub location: String,
    /// When the batch was logged.
    pub received_at: NaiveDateTime,
    /// Username of whoever logged it.
    pub input_by: String,
    /// Free text note.
    pub note: String,
    /// Collection state, mirrored from the latest saved pickup.
    #[serde(default)]
    pub status: WasteStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A scheduled collection run for one waste record.
pub struct Pickup {
    /// Unique identifier.
    pub id: PickupId,
    /// Waste record being collected.
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
/// Access level of an account.
pub enum Role {
    /// Full access including account administration.
    Admin,
    /// Field technician ("Petugas").
    #[serde(rename = "Petugas")]
    Technician,
    /// Regular account without access to records.
    #[default]
    User,
}

impl Role {
    /// Roles offered in account administration.
    pub const ALL: [Role; 3] = [Role::User, Role::Technician, Role::Admin];

    /// Whether the role may create, edit, and delete waste and pickup records.
    #[must_use]
    pub fn can_manage_records(self) -> bool {
        matches!(self, Role::Admin | Role::Technician)
    }

    /// Whether the role may administer accounts.
    #[must_use]
    pub fn can_manage_users(self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Stored label of the role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Technician => "Petugas",
            Role::User => "User",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A stored account.
pub struct User {
    /// Unique identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Bcrypt hash of the password.
    pub password_hash: String,
    /// Access level.
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A named place wastes can be collected from, added next to the built-in city list.
pub struct Location {
    /// Unique identifier.
    pub id: LocationId,
    /// Display name offered in the waste form.
    pub name: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Free text description.
    pub note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Author of a chat message.
pub enum ChatRole {
    /// Instructions for the model.
    System,
    /// The person asking.
    User,
    /// The model.
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One message in a chat transcript.
pub struct ChatMessage {
    /// Author of the message.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A saved assistant conversation owned by one account.
pub struct ChatHistory {
    /// Unique identifier.
    pub id: ChatHistoryId,
    /// Owner of the conversation.
    pub user_id: UserId,
    /// Label shown in the history list.
    pub title: String,
    /// When the conversation was first saved.
    pub created_at: NaiveDateTime,
    /// When the transcript was last replaced.
    pub last_modified: NaiveDateTime,
    /// Full transcript, system prompt included.
    pub messages: Vec<ChatMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pickup_status_keeps_unknown_labels() {
        let status = PickupStatus::from("Dalam Perjalanan");
        assert_eq!(status, PickupStatus::Other("Dalam Perjalanan".to_owned()));
        assert_eq!(status.as_str(), "Dalam Perjalanan");
        assert_eq!(status.waste_status(), WasteStatus::Pending);
    }

    #[test]
    fn only_done_marks_waste_collected() {
        assert_eq!(PickupStatus::Done.waste_status(), WasteStatus::Collected);
        assert_eq!(PickupStatus::Scheduled.waste_status(), WasteStatus::Pending);
        assert_eq!(PickupStatus::Pending.waste_status(), WasteStatus::Pending);
    }

    #[test]
    fn role_capabilities() {
        assert!(Role::Admin.can_manage_users());
        assert!(Role::Technician.can_manage_records());
        assert!(!Role::Technician.can_manage_users());
        assert!(!Role::User.can_manage_records());
    }

    #[test]
    fn waste_kind_labels_round_trip_through_strings() {
        for kind in WasteKind::STANDARD {
            assert_eq!(WasteKind::from(String::from(kind.clone())), kind);
        }
        assert_eq!(
            WasteKind::from("Kaca".to_owned()),
            WasteKind::Other("Kaca".to_owned())
        );
    }
}
