//! Bundle of storage ports injected into the service layer.

use std::sync::Arc;

use crate::ports::{
    ChatHistoryStore, IdGenerator, LocationStore, PickupStore, UserStore, UuidGenerator,
    WasteStore,
};

/// Collection of ports implementing one storage backend.
pub struct Stores {
    /// Waste intake records.
    pub wastes: Arc<dyn WasteStore>,
    /// Scheduled pickups.
    pub pickups: Arc<dyn PickupStore>,
    /// User accounts.
    pub users: Arc<dyn UserStore>,
    /// Custom pickup locations.
    pub locations: Arc<dyn LocationStore>,
    /// Saved assistant conversations.
    pub histories: Arc<dyn ChatHistoryStore>,
    /// Identifier source for new records.
    pub ids: Arc<dyn IdGenerator>,
}

impl Stores {
    /// Bundle the given ports with a UUID identifier source.
    #[must_use]
    pub fn new(
        wastes: Arc<dyn WasteStore>,
        pickups: Arc<dyn PickupStore>,
        users: Arc<dyn UserStore>,
        locations: Arc<dyn LocationStore>,
        histories: Arc<dyn ChatHistoryStore>,
    ) -> Self {
        Self {
            wastes,
            pickups,
            users,
            locations,
            histories,
            ids: Arc::new(UuidGenerator),
        }
    }

    /// Replace the identifier source.
    #[must_use]
    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Build a bundle from one backend implementing every store port.
    #[must_use]
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: WasteStore + PickupStore + UserStore + LocationStore + ChatHistoryStore + 'static,
    {
        // Clone as `Arc<B>` first; the binding then unsizes to the trait object.
        let wastes: Arc<dyn WasteStore> = Arc::<B>::clone(&backend);
        let pickups: Arc<dyn PickupStore> = Arc::<B>::clone(&backend);
        let users: Arc<dyn UserStore> = Arc::<B>::clone(&backend);
        let locations: Arc<dyn LocationStore> = Arc::<B>::clone(&backend);
        Self::new(wastes, pickups, users, locations, backend)
    }
}
