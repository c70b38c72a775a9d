//! Entity trait: identity + continuity across state changes.

use crate::RecordStatus;

/// Persistent record with a stable identity and a soft-delete lifecycle.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;

    /// Current lifecycle state.
    fn status(&self) -> RecordStatus;

    /// Whether the record takes part in normal listings.
    fn is_active(&self) -> bool {
        self.status().is_active()
    }
}
