//! Compensation log for multi-document operations.
//!
//! The document store has no multi-document transaction. Every write made
//! through [`Compensations`] records its inverse; when the operation fails the
//! inverses run in reverse order before the error surfaces.
//!
//! - Steps are recorded only after the forward write succeeded
//! - A failing inverse is logged and skipped; the remaining inverses still run
//! - Nothing is undone once the operation commits

use std::hash::Hash;

use tracing::{debug, warn};

use hrspace_core::DomainResult;

use crate::store::{Collection, StoreResult};

type Undo<'a> = Box<dyn FnOnce() -> StoreResult<()> + 'a>;

/// Ordered list of inverse writes for one operation.
pub struct Compensations<'a> {
    operation: &'static str,
    steps: Vec<(&'static str, Undo<'a>)>,
}

impl<'a> Compensations<'a> {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            steps: Vec::new(),
        }
    }

    /// Run `body` as one compensated unit.
    pub fn run<T>(
        operation: &'static str,
        body: impl FnOnce(&mut Compensations<'a>) -> DomainResult<T>,
    ) -> DomainResult<T> {
        let mut log = Compensations::new(operation);
        match body(&mut log) {
            Ok(value) => {
                log.commit();
                Ok(value)
            }
            Err(err) => {
                warn!(operation, error = %err, steps = log.len(), "operation failed, compensating");
                log.rollback();
                Err(err)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Record an arbitrary inverse for a step already performed.
    pub fn record(&mut self, step: &'static str, undo: impl FnOnce() -> StoreResult<()> + 'a) {
        self.steps.push((step, Box::new(undo)));
    }

    /// Insert a new document; the inverse removes it.
    pub fn insert<K, V, C>(&mut self, collection: &'a C, key: K, value: V) -> StoreResult<()>
    where
        C: Collection<K, V> + ?Sized,
        K: Clone + Eq + Hash + 'a,
        V: 'a,
    {
        collection.insert(key.clone(), value)?;
        self.record("insert", move || collection.remove(&key).map(|_| ()));
        Ok(())
    }

    /// Upsert a document; the inverse restores the previous version (or removes it).
    pub fn put<K, V, C>(&mut self, collection: &'a C, key: K, value: V) -> StoreResult<()>
    where
        C: Collection<K, V> + ?Sized,
        K: Clone + Eq + Hash + 'a,
        V: 'a,
    {
        let previous = collection.put(key.clone(), value)?;
        self.record("put", move || match previous {
            Some(doc) => collection.put(key, doc).map(|_| ()),
            None => collection.remove(&key).map(|_| ()),
        });
        Ok(())
    }

    pub fn commit(self) {
        debug!(operation = self.operation, steps = self.steps.len(), "operation committed");
    }

    pub fn rollback(mut self) {
        while let Some((step, undo)) = self.steps.pop() {
            if let Err(err) = undo() {
                warn!(operation = self.operation, step, error = %err, "compensation step failed");
            }
        }
    }
}

impl core::fmt::Debug for Compensations<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Compensations")
            .field("operation", &self.operation)
            .field("steps", &self.steps.iter().map(|(s, _)| *s).collect::<Vec<_>>())
            .finish()
    }
}
