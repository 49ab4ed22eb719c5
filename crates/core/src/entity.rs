//! Entity trait: identity + continuity across state changes.

use crate::state::RecordState;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Lifecycle state of the stored record.
    fn state(&self) -> RecordState;

    fn is_active(&self) -> bool {
        self.state().is_active()
    }
}
