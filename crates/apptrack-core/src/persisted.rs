use std::fmt;
use std::rc::Rc;

use anyhow::Context;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::storage::LocalStorage;

/// A single storage slot mirrored in memory.
///
/// The slot is read once on [`Persisted::load`]. A missing, unreadable or
/// malformed slot yields the supplied default without reporting an error.
/// Every successful `set`/`update` writes the whole value back before the
/// in-memory copy is replaced, so a read after the setter returns always
/// sees the new value.
pub struct Persisted<T> {
    key: String,
    value: Rc<T>,
    storage: Rc<dyn LocalStorage>,
}

impl<T> Persisted<T>
where
    T: Serialize + DeserializeOwned,
{
    #[tracing::instrument(skip(storage, default))]
    pub fn load(storage: Rc<dyn LocalStorage>, key: &str, default: T) -> Self {
        let value = or_default(key, read_slot::<T>(storage.as_ref(), key), default);
        Self::with_value(storage, key, value)
    }

    fn with_value(storage: Rc<dyn LocalStorage>, key: &str, value: T) -> Self {
        Self {
            key: key.to_string(),
            value: Rc::new(value),
            storage,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Shared handle to the current value; later writes never touch it.
    pub fn snapshot(&self) -> Rc<T> {
        Rc::clone(&self.value)
    }

    #[tracing::instrument(skip(self, value), fields(key = %self.key))]
    pub fn set(&mut self, value: T) -> anyhow::Result<()> {
        let serialized = serde_json::to_string(&value)
            .with_context(|| format!("failed to serialize {}", self.key))?;
        self.storage
            .set_item(&self.key, &serialized)
            .with_context(|| format!("failed to store {}", self.key))?;
        self.value = Rc::new(value);
        Ok(())
    }

    pub fn update<F>(&mut self, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.value);
        self.set(next)
    }
}

impl<T> Persisted<Vec<T>>
where
    T: Serialize + DeserializeOwned,
{
    /// Loads a list slot record by record.
    ///
    /// Only a slot that is not a JSON array falls back to an empty list. A
    /// record that does not decode is skipped with a warning and the rest
    /// are kept.
    #[tracing::instrument(skip(storage))]
    pub fn load_list(storage: Rc<dyn LocalStorage>, key: &str) -> Self {
        let value = or_default(key, read_list::<T>(storage.as_ref(), key), Vec::new());
        Self::with_value(storage, key, value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Persisted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Persisted")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

fn or_default<T>(key: &str, read: anyhow::Result<Option<T>>, default: T) -> T {
    match read {
        Ok(Some(value)) => {
            debug!(key, "restored persisted value");
            value
        }
        Ok(None) => {
            debug!(key, "no persisted value; using default");
            default
        }
        Err(err) => {
            let error = format!("{err:#}");
            warn!(key, %error, "discarding unreadable persisted value");
            default
        }
    }
}

fn read_slot<T: DeserializeOwned>(
    storage: &dyn LocalStorage,
    key: &str,
) -> anyhow::Result<Option<T>> {
    let Some(raw) = storage.get_item(key)? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&raw).with_context(|| format!("failed parsing {key}"))?;
    Ok(Some(value))
}

fn read_list<T: DeserializeOwned>(
    storage: &dyn LocalStorage,
    key: &str,
) -> anyhow::Result<Option<Vec<T>>> {
    let Some(records) = read_slot::<Vec<serde_json::Value>>(storage, key)? else {
        return Ok(None);
    };

    let total = records.len();
    let kept: Vec<T> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, index, error = %err, "skipping unreadable record");
                None
            }
        })
        .collect();
    if kept.len() != total {
        warn!(key, kept = kept.len(), total, "kept the readable records");
    }
    Ok(Some(kept))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::Persisted;
    use crate::storage::{LocalStorage, MemoryStorage};

    #[test]
    fn falls_back_to_default_on_malformed_slot() {
        let storage = Rc::new(MemoryStorage::new());
        storage.set_item("counts", "{not json").expect("seed");

        let slot = Persisted::load(storage.clone(), "counts", vec![1_u32, 2]);
        assert_eq!(slot.get(), &vec![1, 2]);

        // The corrupt slot is left alone until the next write.
        assert_eq!(
            storage.get_item("counts").expect("read").as_deref(),
            Some("{not json")
        );
    }

    #[test]
    fn falls_back_to_default_on_wrong_shape() {
        let storage = Rc::new(MemoryStorage::new());
        storage.set_item("flag", "\"yes\"").expect("seed");

        let slot = Persisted::load(storage, "flag", true);
        assert!(*slot.get());
    }

    #[test]
    fn update_sees_previous_value_and_writes_through() {
        let storage = Rc::new(MemoryStorage::new());
        let mut slot = Persisted::load(storage.clone(), "names", Vec::<String>::new());

        slot.update(|prev| {
            let mut next = prev.clone();
            next.push("first".to_string());
            next
        })
        .expect("update");
        slot.update(|prev| {
            let mut next = prev.clone();
            next.push("second".to_string());
            next
        })
        .expect("update");

        assert_eq!(slot.get(), &vec!["first".to_string(), "second".to_string()]);
        assert_eq!(
            storage.get_item("names").expect("read").as_deref(),
            Some("[\"first\",\"second\"]")
        );
    }

    #[test]
    fn list_slot_skips_only_the_bad_records() {
        let storage = Rc::new(MemoryStorage::new());
        storage
            .set_item("counts", "[1, \"two\", 3, -4]")
            .expect("seed");

        let slot = Persisted::<Vec<u32>>::load_list(storage.clone(), "counts");
        assert_eq!(slot.get(), &vec![1, 3]);

        storage.set_item("counts", "{\"not\": \"a list\"}").expect("seed");
        let slot = Persisted::<Vec<u32>>::load_list(storage, "counts");
        assert!(slot.get().is_empty());
    }

    #[test]
    fn snapshots_are_not_affected_by_later_writes() {
        let storage = Rc::new(MemoryStorage::new());
        let mut slot = Persisted::load(storage, "numbers", vec![1_u8]);

        let before = slot.snapshot();
        slot.set(vec![1, 2, 3]).expect("set");

        assert_eq!(*before, vec![1]);
        assert_eq!(slot.get(), &vec![1, 2, 3]);
    }
}
