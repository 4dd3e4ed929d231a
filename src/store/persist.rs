//! Write-through persistence for the stores.
//!
//! Stores announce every change to their `StoreListener`s; a `PersistWriter`
//! is one such listener that serializes the new state into a `Storage` slot.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub trait StoreListener<S> {
    fn on_change(&mut self, state: &S);
}

impl<S, F> StoreListener<S> for F
where
    F: FnMut(&S),
{
    fn on_change(&mut self, state: &S) {
        self(state)
    }
}

/// Key/value slots holding serialized store state.
pub trait Storage {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// One `<key>.json` file per slot inside a state directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating state directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("reading {key}")),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let target = self.path(key);
        let staging = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&staging, value).with_context(|| format!("writing {key}"))?;
        fs::rename(&staging, &target).with_context(|| format!("replacing {key}"))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("removing {key}")),
        }
    }
}

/// In-memory slots. Clones share the same map, so a test can keep a handle
/// and "reload" from it.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Listener that writes the serialized state under `key` on every change.
pub struct PersistWriter<S> {
    storage: Box<dyn Storage>,
    key: &'static str,
    _state: PhantomData<fn(&S)>,
}

impl<S> PersistWriter<S> {
    pub fn new(storage: Box<dyn Storage>, key: &'static str) -> Self {
        Self {
            storage,
            key,
            _state: PhantomData,
        }
    }
}

impl<S: Serialize> StoreListener<S> for PersistWriter<S> {
    fn on_change(&mut self, state: &S) {
        let written = serde_json::to_string(state)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.storage.write(self.key, &json));
        if let Err(err) = written {
            tracing::warn!(key = self.key, error = %err, "failed to persist store state");
        }
    }
}

/// Reads back the state a `PersistWriter` stored under `key`.
pub fn restore<S: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Result<Option<S>> {
    let Some(json) = storage.read(key)? else {
        return Ok(None);
    };
    let state = serde_json::from_str(&json).with_context(|| format!("decoding {key}"))?;
    Ok(Some(state))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Counter {
        hits: u32,
    }

    #[test]
    fn file_storage_round_trips_and_misses_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::open(dir.path().join("state")).unwrap();

        assert_eq!(storage.read("missing").unwrap(), None);
        storage.write("slot", r#"{"hits":3}"#).unwrap();
        assert_eq!(storage.read("slot").unwrap().as_deref(), Some(r#"{"hits":3}"#));
        assert!(dir.path().join("state/slot.json").exists());

        storage.remove("slot").unwrap();
        storage.remove("slot").unwrap();
        assert_eq!(storage.read("slot").unwrap(), None);
    }

    #[test]
    fn writer_persists_every_change() {
        let storage = MemoryStorage::new();
        let mut writer = PersistWriter::<Counter>::new(Box::new(storage.clone()), "counter");

        writer.on_change(&Counter { hits: 1 });
        writer.on_change(&Counter { hits: 2 });

        let restored: Option<Counter> = restore(&storage, "counter").unwrap();
        assert_eq!(restored, Some(Counter { hits: 2 }));
    }

    #[test]
    fn restore_rejects_corrupt_state() {
        let mut storage = MemoryStorage::new();
        storage.write("counter", "{not json").unwrap();
        assert!(restore::<Counter>(&storage, "counter").is_err());
    }
}
