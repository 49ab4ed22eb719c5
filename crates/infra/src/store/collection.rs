use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, RwLock};

use thiserror::Error;

use hrspace_core::DomainError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store lock poisoned")]
    Poisoned,

    #[error("{collection}: document already exists")]
    Duplicate { collection: &'static str },

    #[error("{collection}: write failed")]
    WriteFailed { collection: &'static str },
}

impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Duplicate { .. } => DomainError::conflict(value.to_string()),
            StoreError::Poisoned | StoreError::WriteFailed { .. } => {
                DomainError::dependency(value.to_string())
            }
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Single-document store: each write is atomic, nothing spans documents.
pub trait Collection<K, V>: Send + Sync {
    fn get(&self, key: &K) -> StoreResult<Option<V>>;

    /// Insert a new document; fails if the key is taken.
    fn insert(&self, key: K, value: V) -> StoreResult<()>;

    /// Upsert, returning the previous document.
    fn put(&self, key: K, value: V) -> StoreResult<Option<V>>;

    fn remove(&self, key: &K) -> StoreResult<Option<V>>;

    /// All documents, most recently inserted first.
    fn list(&self) -> StoreResult<Vec<V>>;
}

#[derive(Debug)]
struct Documents<K, V> {
    by_key: HashMap<K, V>,
    /// Insertion order, oldest first.
    order: Vec<K>,
}

/// In-memory collection for tests/dev, with write-fault injection.
#[derive(Debug)]
pub struct InMemoryCollection<K, V> {
    name: &'static str,
    inner: RwLock<Documents<K, V>>,
    /// Number of writes to let through before the next one fails.
    fail_after: Mutex<Option<usize>>,
}

impl<K, V> InMemoryCollection<K, V> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: RwLock::new(Documents {
                by_key: HashMap::new(),
                order: Vec::new(),
            }),
            fail_after: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Make the next write fail once.
    pub fn fail_next_write(&self) {
        self.fail_after_writes(0);
    }

    /// Let `n` writes succeed, then fail the following one once.
    pub fn fail_after_writes(&self, n: usize) {
        if let Ok(mut slot) = self.fail_after.lock() {
            *slot = Some(n);
        }
    }

    fn check_fault(&self) -> StoreResult<()> {
        let mut slot = self.fail_after.lock().map_err(|_| StoreError::Poisoned)?;
        match *slot {
            Some(0) => {
                *slot = None;
                Err(StoreError::WriteFailed {
                    collection: self.name,
                })
            }
            Some(n) => {
                *slot = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl<K, V> Collection<K, V> for InMemoryCollection<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> StoreResult<Option<V>> {
        let docs = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(docs.by_key.get(key).cloned())
    }

    fn insert(&self, key: K, value: V) -> StoreResult<()> {
        self.check_fault()?;
        let mut docs = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if docs.by_key.contains_key(&key) {
            return Err(StoreError::Duplicate {
                collection: self.name,
            });
        }
        docs.order.push(key.clone());
        docs.by_key.insert(key, value);
        Ok(())
    }

    fn put(&self, key: K, value: V) -> StoreResult<Option<V>> {
        self.check_fault()?;
        let mut docs = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if !docs.by_key.contains_key(&key) {
            docs.order.push(key.clone());
        }
        Ok(docs.by_key.insert(key, value))
    }

    fn remove(&self, key: &K) -> StoreResult<Option<V>> {
        self.check_fault()?;
        let mut docs = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let removed = docs.by_key.remove(key);
        if removed.is_some() {
            docs.order.retain(|k| k != key);
        }
        Ok(removed)
    }

    fn list(&self) -> StoreResult<Vec<V>> {
        let docs = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(docs
            .order
            .iter()
            .rev()
            .filter_map(|k| docs.by_key.get(k).cloned())
            .collect())
    }
}
