//! Traits describing storage backends and shared helper types.

use std::io;

use async_trait::async_trait;
use uuid::Uuid;

use crate::model::{
    ChatHistory, ChatHistoryId, Location, LocationId, Pickup, PickupId, User, UserId, Waste,
    WasteId, WasteStatus,
};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to a storage backend.
pub enum StoreError {
    /// No record matched the given identifier.
    #[error("Record not found: {0}")]
    NotFound(String),
    /// A record with the same identifier already exists.
    #[error("Duplicate record: {0}")]
    Duplicate(String),
    /// The backend could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Stored data could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[async_trait]
/// Persistence for waste intake records.
pub trait WasteStore: Send + Sync {
    /// Load every waste record.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend read fails.
    async fn all_wastes(&self) -> Result<Vec<Waste>, StoreError>;

    /// Load a single waste record.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend read fails.
    async fn waste(&self, id: &WasteId) -> Result<Option<Waste>, StoreError>;

    /// Store a new waste record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] when the id is taken, or another
    /// [`StoreError`] when the write fails.
    async fn insert_waste(&self, waste: Waste) -> Result<(), StoreError>;

    /// Replace the stored record with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record has this id.
    async fn replace_waste(&self, waste: Waste) -> Result<(), StoreError>;

    /// Remove a waste record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record has this id.
    async fn delete_waste(&self, id: &WasteId) -> Result<(), StoreError>;

    /// Overwrite only the status field of a waste record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record has this id.
    async fn set_waste_status(&self, id: &WasteId, status: WasteStatus) -> Result<(), StoreError>;
}

#[async_trait]
/// Persistence for scheduled pickups.
pub trait PickupStore: Send + Sync {
    /// Load every pickup.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend read fails.
    async fn all_pickups(&self) -> Result<Vec<Pickup>, StoreError>;

    /// Load the pickups assigned to one technician.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend read fails.
    async fn pickups_for_assignee(&self, assignee: &UserId) -> Result<Vec<Pickup>, StoreError>;

    /// Store a new pickup.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] when the id is taken, or another
    /// [`StoreError`] when the write fails.
    async fn insert_pickup(&self, pickup: Pickup) -> Result<(), StoreError>;

    /// Replace the stored pickup with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no pickup has this id.
    async fn replace_pickup(&self, pickup: Pickup) -> Result<(), StoreError>;

    /// Remove a pickup.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no pickup has this id.
    async fn delete_pickup(&self, id: &PickupId) -> Result<(), StoreError>;
}

#[async_trait]
/// Persistence for user accounts.
pub trait UserStore: Send + Sync {
    /// Load every account.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend read fails.
    async fn all_users(&self) -> Result<Vec<User>, StoreError>;

    /// Load an account by id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend read fails.
    async fn user(&self, id: &UserId) -> Result<Option<User>, StoreError>;

    /// Load an account by its login name.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend read fails.
    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Store a new account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] when the id is taken.
    async fn insert_user(&self, user: User) -> Result<(), StoreError>;

    /// Replace the stored account with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no account has this id.
    async fn replace_user(&self, user: User) -> Result<(), StoreError>;

    /// Remove an account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no account has this id.
    async fn delete_user(&self, id: &UserId) -> Result<(), StoreError>;
}

#[async_trait]
/// Persistence for custom pickup locations.
pub trait LocationStore: Send + Sync {
    /// Load every custom location.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend read fails.
    async fn all_locations(&self) -> Result<Vec<Location>, StoreError>;

    /// Store a new location.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] when the id is taken.
    async fn insert_location(&self, location: Location) -> Result<(), StoreError>;

    /// Replace the stored location with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no location has this id.
    async fn replace_location(&self, location: Location) -> Result<(), StoreError>;

    /// Remove a location.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no location has this id.
    async fn delete_location(&self, id: &LocationId) -> Result<(), StoreError>;
}

#[async_trait]
/// Persistence for saved assistant conversations.
pub trait ChatHistoryStore: Send + Sync {
    /// Load the conversations owned by one account.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend read fails.
    async fn histories_for_user(&self, user_id: &UserId) -> Result<Vec<ChatHistory>, StoreError>;

    /// Load a single conversation.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend read fails.
    async fn history(&self, id: &ChatHistoryId) -> Result<Option<ChatHistory>, StoreError>;

    /// Store a new conversation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] when the id is taken.
    async fn insert_history(&self, history: ChatHistory) -> Result<(), StoreError>;

    /// Replace the stored conversation with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no conversation has this id.
    async fn replace_history(&self, history: ChatHistory) -> Result<(), StoreError>;

    /// Remove a conversation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no conversation has this id.
    async fn delete_history(&self, id: &ChatHistoryId) -> Result<(), StoreError>;
}

/// Source of fresh record identifiers.
pub trait IdGenerator: Send + Sync {
    /// Produce a new globally unique identifier.
    fn next_id(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
/// Identifier source backed by random v4 UUIDs.
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
