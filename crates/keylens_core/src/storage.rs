use crate::StorageError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Small UI preferences kept between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageItem {
    BrowserViewType,
    BrowserSearchMode,
    ViewFormat,
    CliInputHistory,
    CliClientUuid,
}

impl StorageItem {
    pub fn key(&self) -> &'static str {
        match self {
            StorageItem::BrowserViewType => "browserViewType",
            StorageItem::BrowserSearchMode => "browserSearchMode",
            StorageItem::ViewFormat => "viewFormat",
            StorageItem::CliInputHistory => "cliInputHistory",
            StorageItem::CliClientUuid => "cliClientUuid",
        }
    }
}

/// Local or session storage collaborator.
///
/// Reads never fail: a missing or unreadable item is `None` and callers fall
/// back to their defaults.
pub trait BrowserStorage: Send + Sync {
    fn get(&self, item: StorageItem) -> Option<Value>;

    fn set(&self, item: StorageItem, value: Value) -> Result<(), StorageError>;

    fn remove(&self, item: StorageItem) -> Result<(), StorageError>;
}

pub fn read_item<T: DeserializeOwned>(storage: &dyn BrowserStorage, item: StorageItem) -> Option<T> {
    let value = storage.get(item)?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(error) => {
            log::warn!("Ignoring stored {}: {}", item.key(), error);
            None
        }
    }
}

pub fn write_item<T: Serialize + ?Sized>(
    storage: &dyn BrowserStorage,
    item: StorageItem,
    value: &T,
) -> Result<(), StorageError> {
    storage.set(item, serde_json::to_value(value)?)
}

#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<StorageItem, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<StorageItem, Value>> {
        match self.items.lock() {
            Ok(guard) => guard,
            Err(poison_error) => poison_error.into_inner(),
        }
    }
}

impl BrowserStorage for MemoryStorage {
    fn get(&self, item: StorageItem) -> Option<Value> {
        self.lock().get(&item).cloned()
    }

    fn set(&self, item: StorageItem, value: Value) -> Result<(), StorageError> {
        self.lock().insert(item, value);
        Ok(())
    }

    fn remove(&self, item: StorageItem) -> Result<(), StorageError> {
        self.lock().remove(&item);
        Ok(())
    }
}

/// JSON object on disk, rewritten on every change.
pub struct JsonFileStorage {
    path: PathBuf,
    items: Mutex<Map<String, Value>>,
}

impl JsonFileStorage {
    pub fn new() -> Result<Self, StorageError> {
        let data_dir = dirs::data_dir().ok_or(StorageError::MissingDirectory("data"))?;

        let app_dir = data_dir.join("keylens");
        fs::create_dir_all(&app_dir)?;

        Self::open(app_dir.join("storage.json"))
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let items = Self::load_from_path(&path)?;

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    fn load_from_path(path: &Path) -> Result<Map<String, Value>, StorageError> {
        if !path.exists() {
            return Ok(Map::new());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        Ok(serde_json::from_str(&content)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, Map<String, Value>> {
        match self.items.lock() {
            Ok(guard) => guard,
            Err(poison_error) => poison_error.into_inner(),
        }
    }

    fn save(&self, items: &Map<String, Value>) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(items)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl BrowserStorage for JsonFileStorage {
    fn get(&self, item: StorageItem) -> Option<Value> {
        self.lock().get(item.key()).cloned()
    }

    fn set(&self, item: StorageItem, value: Value) -> Result<(), StorageError> {
        let mut items = self.lock();
        items.insert(item.key().to_string(), value);
        self.save(&items)
    }

    fn remove(&self, item: StorageItem) -> Result<(), StorageError> {
        let mut items = self.lock();
        if items.remove(item.key()).is_some() {
            self.save(&items)?;
        }
        Ok(())
    }
}
