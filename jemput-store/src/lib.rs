//! Storage backend keeping every collection in memory, optionally mirrored to a JSON file.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

use jemput_core::{
    model::{
        ChatHistory, ChatHistoryId, Location, LocationId, Pickup, PickupId, User, UserId, Waste,
        WasteId, WasteStatus,
    },
    ports::{ChatHistoryStore, LocationStore, PickupStore, StoreError, UserStore, WasteStore},
    stores::Stores,
};

/// Everything the backend holds, in the layout written to disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    wastes: Vec<Waste>,
    #[serde(default)]
    pickups: Vec<Pickup>,
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    locations: Vec<Location>,
    #[serde(default)]
    chat_histories: Vec<ChatHistory>,
}

/// Store implementing every jemput port over one in-memory snapshot.
pub struct MemoryStore {
    snapshot: RwLock<Snapshot>,
    path: Option<PathBuf>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store that is never written to disk.
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Snapshot::default()),
            path: None,
        }
    }

    /// Open a store mirrored to `path`, loading its contents when the file exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the file cannot be read and
    /// [`StoreError::Serialization`] when it does not contain a valid snapshot.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let snapshot = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Snapshot>(&bytes)
                .map_err(|err| StoreError::Serialization(err.to_string()))?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Snapshot::default(),
            Err(err) => return Err(err.into()),
        };
        info!(
            path = %path.display(),
            wastes = snapshot.wastes.len(),
            pickups = snapshot.pickups.len(),
            users = snapshot.users.len(),
            locations = snapshot.locations.len(),
            chat_histories = snapshot.chat_histories.len(),
            "store opened"
        );
        Ok(Self {
            snapshot: RwLock::new(snapshot),
            path: Some(path),
        })
    }

    /// File the store is mirrored to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Apply `change` to a copy of the snapshot, persist it, then publish it.
    ///
    /// Writers are serialized by the lock; a failed change or write leaves the
    /// published snapshot untouched.
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Snapshot) -> Result<T, StoreError> + Send,
    ) -> Result<T, StoreError> {
        let mut guard = self.snapshot.write().await;
        let mut next = guard.clone();
        let output = change(&mut next)?;
        self.persist(&next).await?;
        *guard = next;
        Ok(output)
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(snapshot)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;

        // Write beside the target and rename so a crash never leaves half a file.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, bytes).await?;
        fs::rename(&staging, path).await?;
        debug!(path = %path.display(), "store persisted");
        Ok(())
    }
}

/// Build the port bundle backed by `store`.
#[must_use]
pub fn stores(store: Arc<MemoryStore>) -> Stores {
    Stores::from_backend(store)
}

fn insert_unique<T>(
    records: &mut Vec<T>,
    record: T,
    key: impl Fn(&T) -> &str,
) -> Result<(), StoreError> {
    if records.iter().any(|stored| key(stored) == key(&record)) {
        return Err(StoreError::Duplicate(key(&record).to_owned()));
    }
    records.push(record);
    Ok(())
}

fn replace_existing<T>(
    records: &mut [T],
    record: T,
    key: impl Fn(&T) -> &str,
) -> Result<(), StoreError> {
    let slot = records
        .iter_mut()
        .find(|stored| key(stored) == key(&record))
        .ok_or_else(|| StoreError::NotFound(key(&record).to_owned()))?;
    *slot = record;
    Ok(())
}

fn remove_existing<T>(
    records: &mut Vec<T>,
    id: &str,
    key: impl Fn(&T) -> &str,
) -> Result<(), StoreError> {
    let before = records.len();
    records.retain(|stored| key(stored) != id);
    if records.len() == before {
        return Err(StoreError::NotFound(id.to_owned()));
    }
    Ok(())
}

fn waste_key(waste: &Waste) -> &str {
    &waste.id.0
}

fn pickup_key(pickup: &Pickup) -> &str {
    &pickup.id.0
}

fn user_key(user: &User) -> &str {
    &user.id.0
}

fn location_key(location: &Location) -> &str {
    &location.id.0
}

fn history_key(history: &ChatHistory) -> &str {
    &history.id.0
}

#[async_trait]
impl WasteStore for MemoryStore {
    async fn all_wastes(&self) -> Result<Vec<Waste>, StoreError> {
        Ok(self.snapshot.read().await.wastes.clone())
    }

    async fn waste(&self, id: &WasteId) -> Result<Option<Waste>, StoreError> {
        Ok(self
            .snapshot
            .read()
            .await
            .wastes
            .iter()
            .find(|waste| &waste.id == id)
            .cloned())
    }

    async fn insert_waste(&self, waste: Waste) -> Result<(), StoreError> {
        self.mutate(|snapshot| insert_unique(&mut snapshot.wastes, waste, waste_key))
            .await
    }

    async fn replace_waste(&self, waste: Waste) -> Result<(), StoreError> {
        self.mutate(|snapshot| replace_existing(&mut snapshot.wastes, waste, waste_key))
            .await
    }

    async fn delete_waste(&self, id: &WasteId) -> Result<(), StoreError> {
        self.mutate(|snapshot| remove_existing(&mut snapshot.wastes, &id.0, waste_key))
            .await
    }

    async fn set_waste_status(&self, id: &WasteId, status: WasteStatus) -> Result<(), StoreError> {
        self.mutate(|snapshot| {
            let waste = snapshot
                .wastes
                .iter_mut()
                .find(|waste| &waste.id == id)
                .ok_or_else(|| StoreError::NotFound(id.0.clone()))?;
            waste.status = status;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl PickupStore for MemoryStore {
    async fn all_pickups(&self) -> Result<Vec<Pickup>, StoreError> {
        Ok(self.snapshot.read().await.pickups.clone())
    }

    async fn pickups_for_assignee(&self, assignee: &UserId) -> Result<Vec<Pickup>, StoreError> {
        Ok(self
            .snapshot
            .read()
            .await
            .pickups
            .iter()
            .filter(|pickup| &pickup.assignee_id == assignee)
            .cloned()
            .collect())
    }

    async fn insert_pickup(&self, pickup: Pickup) -> Result<(), StoreError> {
        self.mutate(|snapshot| insert_unique(&mut snapshot.pickups, pickup, pickup_key))
            .await
    }

    async fn replace_pickup(&self, pickup: Pickup) -> Result<(), StoreError> {
        self.mutate(|snapshot| replace_existing(&mut snapshot.pickups, pickup, pickup_key))
            .await
    }

    async fn delete_pickup(&self, id: &PickupId) -> Result<(), StoreError> {
        self.mutate(|snapshot| remove_existing(&mut snapshot.pickups, &id.0, pickup_key))
            .await
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn all_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.snapshot.read().await.users.clone())
    }

    async fn user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self
            .snapshot
            .read()
            .await
            .users
            .iter()
            .find(|user| &user.id == id)
            .cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .snapshot
            .read()
            .await
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn insert_user(&self, user: User) -> Result<(), StoreError> {
        self.mutate(|snapshot| insert_unique(&mut snapshot.users, user, user_key))
            .await
    }

    async fn replace_user(&self, user: User) -> Result<(), StoreError> {
        self.mutate(|snapshot| replace_existing(&mut snapshot.users, user, user_key))
            .await
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), StoreError> {
        self.mutate(|snapshot| remove_existing(&mut snapshot.users, &id.0, user_key))
            .await
    }
}

#[async_trait]
impl LocationStore for MemoryStore {
    async fn all_locations(&self) -> Result<Vec<Location>, StoreError> {
        Ok(self.snapshot.read().await.locations.clone())
    }

    async fn insert_location(&self, location: Location) -> Result<(), StoreError> {
        self.mutate(|snapshot| insert_unique(&mut snapshot.locations, location, location_key))
            .await
    }

    async fn replace_location(&self, location: Location) -> Result<(), StoreError> {
        self.mutate(|snapshot| replace_existing(&mut snapshot.locations, location, location_key))
            .await
    }

    async fn delete_location(&self, id: &LocationId) -> Result<(), StoreError> {
        self.mutate(|snapshot| remove_existing(&mut snapshot.locations, &id.0, location_key))
            .await
    }
}

#[async_trait]
impl ChatHistoryStore for MemoryStore {
    async fn histories_for_user(&self, user_id: &UserId) -> Result<Vec<ChatHistory>, StoreError> {
        Ok(self
            .snapshot
            .read()
            .await
            .chat_histories
            .iter()
            .filter(|history| &history.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn history(&self, id: &ChatHistoryId) -> Result<Option<ChatHistory>, StoreError> {
        Ok(self
            .snapshot
            .read()
            .await
            .chat_histories
            .iter()
            .find(|history| &history.id == id)
            .cloned())
    }

    async fn insert_history(&self, history: ChatHistory) -> Result<(), StoreError> {
        self.mutate(|snapshot| insert_unique(&mut snapshot.chat_histories, history, history_key))
            .await
    }

    async fn replace_history(&self, history: ChatHistory) -> Result<(), StoreError> {
        self.mutate(|snapshot| {
            replace_existing(&mut snapshot.chat_histories, history, history_key)
        })
        .await
    }

    async fn delete_history(&self, id: &ChatHistoryId) -> Result<(), StoreError> {
        self.mutate(|snapshot| remove_existing(&mut snapshot.chat_histories, &id.0, history_key))
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use jemput_core::model::{ChatMessage, ChatRole, PickupStatus, Role, WasteKind};
    use jemput_core::service::JemputService;

    use super::*;

    fn waste(id: &str) -> Waste {
        Waste {
            id: WasteId(id.to_owned()),
            name: "Sisa makanan".to_owned(),
            kind: WasteKind::Organic,
            weight_kg: 8.0,
            location: "KOTA DEPOK".to_owned(),
            received_at: NaiveDate::from_ymd_opt(2024, 1, 2)
                .and_then(|date| date.and_hms_opt(9, 0, 0))
                .expect("valid time"),
            input_by: "admin".to_owned(),
            note: String::new(),
            status: WasteStatus::Pending,
        }
    }

    fn pickup(id: &str, assignee: &str) -> Pickup {
        Pickup {
            id: PickupId(id.to_owned()),
            waste_id: WasteId("W1".to_owned()),
            assignee_id: UserId(assignee.to_owned()),
            scheduled_at: NaiveDate::from_ymd_opt(2024, 1, 3)
                .and_then(|date| date.and_hms_opt(10, 0, 0))
                .expect("valid time"),
            status: PickupStatus::Scheduled,
            note: String::new(),
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_ids() {
        let store = MemoryStore::new();
        store.insert_waste(waste("W1")).await.expect("first insert");

        let err = store.insert_waste(waste("W1")).await.expect_err("duplicate");
        assert!(matches!(err, StoreError::Duplicate(id) if id == "W1"));
        assert_eq!(store.all_wastes().await.expect("read").len(), 1);
    }

    #[tokio::test]
    async fn replace_and_delete_require_existing_records() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.replace_pickup(pickup("P1", "tech1")).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_pickup(&PickupId("P1".to_owned())).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store
                .set_waste_status(&WasteId("W9".to_owned()), WasteStatus::Collected)
                .await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn pickups_are_filtered_by_assignee() {
        let store = MemoryStore::new();
        store.insert_pickup(pickup("P1", "tech1")).await.expect("insert");
        store.insert_pickup(pickup("P2", "tech2")).await.expect("insert");
        store.insert_pickup(pickup("P3", "tech1")).await.expect("insert");

        let assigned = store
            .pickups_for_assignee(&UserId("tech1".to_owned()))
            .await
            .expect("read");
        let ids: Vec<&str> = assigned.iter().map(|pickup| pickup.id.0.as_str()).collect();
        assert_eq!(ids, ["P1", "P3"]);
    }

    #[tokio::test]
    async fn status_update_touches_only_status() {
        let store = MemoryStore::new();
        store.insert_waste(waste("W1")).await.expect("insert");

        store
            .set_waste_status(&WasteId("W1".to_owned()), WasteStatus::Collected)
            .await
            .expect("update");

        let stored = store
            .waste(&WasteId("W1".to_owned()))
            .await
            .expect("read")
            .expect("present");
        assert_eq!(stored, Waste { status: WasteStatus::Collected, ..waste("W1") });
    }

    #[tokio::test]
    async fn file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("jemput.json");

        let store = MemoryStore::open(&path).await.expect("open empty");
        store.insert_waste(waste("W1")).await.expect("insert waste");
        store.insert_pickup(pickup("P1", "tech1")).await.expect("insert pickup");
        store
            .insert_user(User {
                id: UserId("U1".to_owned()),
                username: "admin".to_owned(),
                password_hash: "hash".to_owned(),
                role: Role::Admin,
            })
            .await
            .expect("insert user");
        drop(store);

        let reopened = MemoryStore::open(&path).await.expect("reopen");
        assert_eq!(reopened.path(), Some(path.as_path()));
        assert_eq!(reopened.all_wastes().await.expect("read").len(), 1);
        assert_eq!(reopened.all_pickups().await.expect("read").len(), 1);
        let admin = reopened
            .user_by_username("admin")
            .await
            .expect("read")
            .expect("present");
        assert_eq!(admin.role, Role::Admin);
    }

    fn history(id: &str, user: &str) -> ChatHistory {
        let at = NaiveDate::from_ymd_opt(2024, 1, 4)
            .and_then(|date| date.and_hms_opt(8, 0, 0))
            .expect("valid time");
        ChatHistory {
            id: ChatHistoryId(id.to_owned()),
            user_id: UserId(user.to_owned()),
            title: "Kompos".to_owned(),
            created_at: at,
            last_modified: at,
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content: "Kompos".to_owned(),
            }],
        }
    }

    #[tokio::test]
    async fn histories_are_scoped_to_their_owner() {
        let store = MemoryStore::new();
        store.insert_history(history("H1", "U1")).await.expect("insert");
        store.insert_history(history("H2", "U2")).await.expect("insert");

        let own = store
            .histories_for_user(&UserId("U1".to_owned()))
            .await
            .expect("read");
        assert_eq!(own.len(), 1);
        assert!(own.iter().all(|history| history.user_id.0 == "U1"));

        store
            .delete_history(&ChatHistoryId("H1".to_owned()))
            .await
            .expect("delete");
        assert!(
            store
                .history(&ChatHistoryId("H1".to_owned()))
                .await
                .expect("read")
                .is_none()
        );
        assert!(matches!(
            store.replace_history(history("H1", "U1")).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn locations_and_histories_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("jemput.json");

        let store = MemoryStore::open(&path).await.expect("open empty");
        store
            .insert_location(Location {
                id: LocationId("L1".to_owned()),
                name: "TPS Cibiru".to_owned(),
                latitude: -6.93,
                longitude: 107.72,
                note: String::new(),
            })
            .await
            .expect("insert location");
        store.insert_history(history("H1", "U1")).await.expect("insert history");
        drop(store);

        let reopened = MemoryStore::open(&path).await.expect("reopen");
        let locations = reopened.all_locations().await.expect("read");
        assert_eq!(locations.len(), 1);
        assert!(locations.iter().all(|location| location.name == "TPS Cibiru"));
        let saved = reopened
            .history(&ChatHistoryId("H1".to_owned()))
            .await
            .expect("read")
            .expect("present");
        assert_eq!(saved, history("H1", "U1"));
    }

    #[tokio::test]
    async fn snapshot_without_new_collections_still_opens() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("jemput.json");
        std::fs::write(&path, br#"{"wastes": [], "pickups": [], "users": []}"#).expect("write");

        let store = MemoryStore::open(&path).await.expect("open");
        assert!(store.all_locations().await.expect("read").is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("jemput.json");
        std::fs::write(&path, b"{ not json").expect("write");

        assert!(matches!(
            MemoryStore::open(&path).await,
            Err(StoreError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn bundle_shares_one_backend() {
        let store = Arc::new(MemoryStore::new());
        let bundle = stores(Arc::clone(&store));
        bundle.wastes.insert_waste(waste("W1")).await.expect("insert");
        assert_eq!(store.all_wastes().await.expect("read").len(), 1);
        assert!(!bundle.ids.next_id().is_empty());

        bundle.histories.insert_history(history("H1", "U1")).await.expect("insert");
        assert!(
            store
                .history(&ChatHistoryId("H1".to_owned()))
                .await
                .expect("read")
                .is_some()
        );
    }

    #[tokio::test]
    async fn service_runs_on_the_memory_backend() {
        let service = JemputService::new(Arc::new(stores(Arc::new(MemoryStore::new()))))
            .with_hash_cost(4);
        let admin = service
            .ensure_admin(Some(("admin", "rahasia")))
            .await
            .expect("bootstrap")
            .expect("store was empty");
        assert_eq!(admin.role, Role::Admin);
        assert!(service.login("admin", "rahasia").await.expect("login").is_some());
    }
}
