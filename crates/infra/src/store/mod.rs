//! Document store: per-document atomic writes, no multi-document transactions.

pub mod collection;
pub mod hr_store;

pub use collection::{Collection, InMemoryCollection, StoreError, StoreResult};
pub use hr_store::{HrStore, fetch_active, find_active};
