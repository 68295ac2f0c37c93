use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use alloy_primitives::Address;
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::{
    chains::ChainKey,
    consts::{FAVORITES_STORAGE_KEY, LABELS_STORAGE_KEY},
    error::StoreError,
};

/// Persistent key-value storage for user preferences.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Store backed by one JSON object file, rewritten on every mutation.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, Value>>,
}

impl JsonFileStore {
    /// Opens `path`. A missing or unreadable file starts out empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "Ignoring corrupt store file");
                BTreeMap::new()
            }),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "Store file not readable, starting empty");
                BTreeMap::new()
            }
        };

        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        let io_error = |source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let contents = serde_json::to_vec_pretty(entries)?;
        fs::write(&self.path, contents).map_err(io_error)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value);
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write();
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

fn load_or_default<T: DeserializeOwned + Default>(store: &impl KeyValueStore, key: &str) -> T {
    let Some(value) = store.get(key) else {
        return T::default();
    };
    serde_json::from_value(value).unwrap_or_else(|err| {
        warn!(key, error = %err, "Ignoring malformed stored value");
        T::default()
    })
}

fn save<T: Serialize>(store: &impl KeyValueStore, key: &str, value: &T) {
    let result = serde_json::to_value(value)
        .map_err(StoreError::from)
        .and_then(|value| store.set(key, value));
    if let Err(err) = result {
        error!(key, error = %err, "Failed to save to store");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteSafe {
    pub chain_key: ChainKey,
    pub safe_address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FavoriteSafe {
    pub fn new(chain_key: ChainKey, safe_address: Address) -> Self {
        Self {
            chain_key,
            safe_address,
            label: None,
        }
    }

    fn same_safe(&self, chain_key: ChainKey, safe_address: Address) -> bool {
        self.chain_key == chain_key && self.safe_address == safe_address
    }
}

/// Starred Safes, unique per chain and address.
#[derive(Debug)]
pub struct Favorites<S> {
    store: S,
    entries: Vec<FavoriteSafe>,
}

impl<S: KeyValueStore> Favorites<S> {
    pub fn load(store: S) -> Self {
        let entries = load_or_default(&store, FAVORITES_STORAGE_KEY);
        Self { store, entries }
    }

    pub fn list(&self) -> &[FavoriteSafe] {
        &self.entries
    }

    pub fn is_favorite(&self, chain_key: ChainKey, safe_address: Address) -> bool {
        self.entries.iter().any(|fav| fav.same_safe(chain_key, safe_address))
    }

    /// Adds the entry, or removes it when already present. Returns whether it is now a favorite.
    pub fn toggle(&mut self, entry: FavoriteSafe) -> bool {
        let before = self.entries.len();
        self.entries.retain(|fav| !fav.same_safe(entry.chain_key, entry.safe_address));

        let added = self.entries.len() == before;
        if added {
            self.entries.push(entry);
        }
        save(&self.store, FAVORITES_STORAGE_KEY, &self.entries);

        added
    }

    /// Favorites per chain, chains in registry order, entries in insertion order.
    pub fn grouped(&self) -> BTreeMap<ChainKey, Vec<&FavoriteSafe>> {
        let mut groups: BTreeMap<ChainKey, Vec<&FavoriteSafe>> = BTreeMap::new();
        for fav in &self.entries {
            groups.entry(fav.chain_key).or_default().push(fav);
        }
        groups
    }
}

/// User chosen names for Safe addresses, shared by every chain.
#[derive(Debug)]
pub struct SafeLabels<S> {
    store: S,
    labels: BTreeMap<String, String>,
}

impl<S: KeyValueStore> SafeLabels<S> {
    pub fn load(store: S) -> Self {
        let labels = load_or_default(&store, LABELS_STORAGE_KEY);
        Self { store, labels }
    }

    fn key(address: Address) -> String {
        address.to_string().to_lowercase()
    }

    pub fn get_label(&self, address: Address) -> Option<&str> {
        self.labels.get(&Self::key(address)).map(String::as_str)
    }

    /// Stores the trimmed label. A blank label removes the entry.
    pub fn set_label(&mut self, address: Address, label: &str) {
        let key = Self::key(address);
        match label.trim() {
            "" => self.labels.remove(&key),
            trimmed => self.labels.insert(key, trimmed.to_string()),
        };
        save(&self.store, LABELS_STORAGE_KEY, &self.labels);
    }
}

/// `0x1234...abcd` for anything long enough to shorten.
pub fn shorten_address(address: &str) -> String {
    if address.len() < 12 {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

pub fn format_safe_display(address: &str, label: Option<&str>) -> String {
    match label.filter(|label| !label.is_empty()) {
        Some(label) => format!("{} ({})", label, shorten_address(address)),
        None => address.to_string(),
    }
}
