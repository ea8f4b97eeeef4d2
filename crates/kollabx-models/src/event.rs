//! Realtime change-event payloads.
//!
//! Every mutation the backend applies to a subscribed table is pushed over
//! the realtime bus as a [`ChangeEvent`]: the event kind plus the affected
//! row before and after the change. Subscribers filter by subject (one
//! subject per channel or per user), so the payload itself carries no
//! routing information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which kind of mutation a change event describes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// A new row was inserted.
    Insert,
    /// An existing row was updated.
    Update,
    /// A row was deleted.
    Delete,
}

/// One pushed change to a subscribed row set.
///
/// `new` is present for inserts and updates; `old` for updates and deletes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChangeEvent<T> {
    /// The kind of mutation.
    pub kind: ChangeKind,
    /// The row after the change, if any.
    pub new: Option<T>,
    /// The row before the change, if any.
    pub old: Option<T>,
    /// When the backend applied the mutation (UTC).
    pub occurred_at: DateTime<Utc>,
}

impl<T> ChangeEvent<T> {
    /// Build an insert event for a freshly created row.
    pub fn insert(row: T) -> Self {
        Self {
            kind: ChangeKind::Insert,
            new: Some(row),
            old: None,
            occurred_at: Utc::now(),
        }
    }

    /// Build an update event carrying both versions of the row.
    pub fn update(old: T, new: T) -> Self {
        Self {
            kind: ChangeKind::Update,
            new: Some(new),
            old: Some(old),
            occurred_at: Utc::now(),
        }
    }

    /// Build a delete event for a removed row.
    pub fn delete(row: T) -> Self {
        Self {
            kind: ChangeKind::Delete,
            new: None,
            old: Some(row),
            occurred_at: Utc::now(),
        }
    }
}
