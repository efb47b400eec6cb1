//! # Personal Lists
//!
//! User-curated named collections of catalog items, the favorites list and
//! the recent-search history.
//!
//! ```text
//! ListStore
//! ├── state: UserState
//! │   ├── lists: Vec<PersonalList>    // creation order
//! │   └── recent_searches: Vec<String> // newest first, at most 10
//! ├── mirror: Option<PersistenceMirror>
//! └── settings: ListSettings
//! ```
//!
//! Every mutation runs to completion in memory first and then hands a full
//! snapshot to the persistence mirror. In-memory state is authoritative for
//! the session; a failed write never undoes a mutation.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::models::CatalogItem;
use crate::storage::{BlobStore, PersistenceMirror};

/// Reserved identifier of the implicit favorites list.
pub const FAVORITES_LIST_ID: &str = "favorites";

/// Key the serialized state is stored under.
pub const STORAGE_KEY: &str = "user-storage";

/// Maximum number of remembered searches.
pub const MAX_RECENT_SEARCHES: usize = 10;

const STATE_VERSION: u32 = 0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalList {
    pub id: String,
    pub name: String,
    pub items: Vec<CatalogItem>,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub updated_at: i64,
}

impl PersonalList {
    fn new(id: String, name: String) -> Self {
        let now = now_millis();
        Self {
            id,
            name,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.items.iter().any(|item| item.id == item_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserState {
    pub lists: Vec<PersonalList>,
    pub recent_searches: Vec<String>,
}

/// On-disk envelope around [`UserState`].
#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    state: UserState,
    version: u32,
}

#[derive(Debug, Clone)]
pub struct ListSettings {
    /// Name given to lists created with a blank name.
    pub default_list_name: String,
    pub favorites_list_name: String,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            default_list_name: "Yeni Liste".to_string(),
            favorites_list_name: "Favoriler".to_string(),
        }
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn new_list_id() -> String {
    format!("list_{}", uuid::Uuid::new_v4().simple())
}

pub struct ListStore {
    state: UserState,
    mirror: Option<PersistenceMirror>,
    settings: ListSettings,
}

impl ListStore {
    /// A store that is never persisted.
    pub fn in_memory(settings: ListSettings) -> Self {
        Self {
            state: UserState::default(),
            mirror: None,
            settings,
        }
    }

    /// Load state from `store` and mirror every later mutation back to it.
    ///
    /// Unreadable or corrupt stored state is logged and replaced by an empty
    /// state rather than failing startup. A corrupt blob is backed up first so
    /// the next write does not destroy it.
    pub fn open(store: Arc<dyn BlobStore>, settings: ListSettings) -> Self {
        let state = match load_state(store.as_ref()) {
            Ok(Some(state)) => {
                info!(
                    "Loaded {} personal lists and {} recent searches",
                    state.lists.len(),
                    state.recent_searches.len()
                );
                state
            }
            Ok(None) => UserState::default(),
            Err(e @ StorageError::Serialization { .. }) => {
                warn!("Ignoring corrupt personal lists: {}", e);
                match store.backup(STORAGE_KEY) {
                    Ok(()) => info!("Backed up corrupt {} state", STORAGE_KEY),
                    Err(e) => warn!("Failed to back up corrupt {} state: {}", STORAGE_KEY, e),
                }
                UserState::default()
            }
            Err(e) => {
                warn!("Ignoring stored personal lists: {}", e);
                UserState::default()
            }
        };

        Self {
            state,
            mirror: Some(PersistenceMirror::spawn(store, STORAGE_KEY)),
            settings,
        }
    }

    pub fn lists(&self) -> &[PersonalList] {
        &self.state.lists
    }

    pub fn list(&self, list_id: &str) -> Option<&PersonalList> {
        self.state.lists.iter().find(|list| list.id == list_id)
    }

    fn list_mut(&mut self, list_id: &str) -> Option<&mut PersonalList> {
        self.state.lists.iter_mut().find(|list| list.id == list_id)
    }

    /// Create an empty list and return its identifier.
    pub fn create_list(&mut self, name: &str) -> String {
        let name = match name.trim() {
            "" => self.settings.default_list_name.clone(),
            trimmed => trimmed.to_string(),
        };
        let list = PersonalList::new(new_list_id(), name);
        let id = list.id.clone();
        debug!("Created list {} ({})", list.name, id);

        self.state.lists.push(list);
        self.persist();
        id
    }

    /// Remove a list. Unknown identifiers are ignored.
    pub fn delete_list(&mut self, list_id: &str) {
        let before = self.state.lists.len();
        self.state.lists.retain(|list| list.id != list_id);
        if self.state.lists.len() != before {
            self.persist();
        }
    }

    /// Append `item` unless the list already holds an item with its id.
    pub fn add_item_to_list(&mut self, list_id: &str, item: &CatalogItem) {
        let Some(list) = self.list_mut(list_id) else {
            return;
        };
        if list.contains(&item.id) {
            return;
        }
        list.items.push(item.clone());
        list.updated_at = now_millis();
        self.persist();
    }

    pub fn remove_item_from_list(&mut self, list_id: &str, item_id: &str) {
        let Some(list) = self.list_mut(list_id) else {
            return;
        };
        if !list.contains(item_id) {
            return;
        }
        list.items.retain(|item| item.id != item_id);
        list.updated_at = now_millis();
        self.persist();
    }

    /// Rename a list. A blank name keeps the old one but still touches
    /// `updated_at`.
    pub fn update_list_name(&mut self, list_id: &str, new_name: &str) {
        let Some(list) = self.list_mut(list_id) else {
            return;
        };
        let trimmed = new_name.trim();
        if !trimmed.is_empty() {
            list.name = trimmed.to_string();
        }
        list.updated_at = now_millis();
        self.persist();
    }

    pub fn is_item_in_list(&self, list_id: &str, item_id: &str) -> bool {
        self.list(list_id).is_some_and(|list| list.contains(item_id))
    }

    pub fn lists_containing_item(&self, item_id: &str) -> Vec<&PersonalList> {
        self.state
            .lists
            .iter()
            .filter(|list| list.contains(item_id))
            .collect()
    }

    /// Add `item` to the favorites list, or remove it if already there.
    /// Returns whether the item is a favorite afterwards.
    pub fn toggle_favorite(&mut self, item: &CatalogItem) -> bool {
        if self.list(FAVORITES_LIST_ID).is_none() {
            let name = self.settings.favorites_list_name.clone();
            self.state
                .lists
                .push(PersonalList::new(FAVORITES_LIST_ID.to_string(), name));
        }

        if self.is_item_in_list(FAVORITES_LIST_ID, &item.id) {
            self.remove_item_from_list(FAVORITES_LIST_ID, &item.id);
            false
        } else {
            self.add_item_to_list(FAVORITES_LIST_ID, item);
            true
        }
    }

    pub fn is_favorite(&self, item_id: &str) -> bool {
        self.is_item_in_list(FAVORITES_LIST_ID, item_id)
    }

    pub fn favorites(&self) -> &[CatalogItem] {
        self.list(FAVORITES_LIST_ID)
            .map(|list| list.items.as_slice())
            .unwrap_or_default()
    }

    pub fn recent_searches(&self) -> &[String] {
        &self.state.recent_searches
    }

    /// Remember a search, newest first. Blank queries are ignored.
    pub fn add_recent_search(&mut self, query: &str) {
        if query.trim().is_empty() {
            return;
        }
        let searches = &mut self.state.recent_searches;
        searches.retain(|existing| existing != query);
        searches.insert(0, query.to_string());
        searches.truncate(MAX_RECENT_SEARCHES);
        self.persist();
    }

    pub fn clear_history(&mut self) {
        if self.state.recent_searches.is_empty() {
            return;
        }
        self.state.recent_searches.clear();
        self.persist();
    }

    fn persist(&self) {
        let Some(mirror) = &self.mirror else {
            return;
        };
        let envelope = PersistedStateRef {
            state: &self.state,
            version: STATE_VERSION,
        };
        match serde_json::to_string(&envelope) {
            Ok(blob) => mirror.push(blob),
            Err(e) => warn!("Failed to serialize personal lists: {}", e),
        }
    }
}

/// Borrowing twin of [`PersistedState`] used when writing.
#[derive(Serialize)]
struct PersistedStateRef<'a> {
    state: &'a UserState,
    version: u32,
}

fn load_state(store: &dyn BlobStore) -> Result<Option<UserState>, StorageError> {
    let Some(blob) = store.load(STORAGE_KEY)? else {
        return Ok(None);
    };
    let persisted: PersistedState =
        serde_json::from_str(&blob).map_err(|source| StorageError::Serialization { source })?;
    if persisted.version != STATE_VERSION {
        debug!("Stored state version {} differs from {}", persisted.version, STATE_VERSION);
    }
    Ok(Some(persisted.state))
}
