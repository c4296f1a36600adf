//! Entity bindings.
//!
//! Each entity gets a record struct, its schema tree, a typed field tree for
//! building conditions, and typed store/query/result-set wrappers.

pub mod repository;

pub use repository::{
    CloneLink, Links, Owner, Parent, Repository, RepositoryFields, RepositoryQuery,
    RepositoryResultSet, RepositoryStore, FIELDS,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Creation and modification times, embedded in records that track them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Timestamps {
    /// Timestamps set to `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            updated_at: now,
        }
    }

    /// Stamp a save at `now`: `created_at` only if still unset.
    pub fn stamp(&mut self, now: DateTime<Utc>) {
        if self.created_at == DateTime::<Utc>::default() {
            self.created_at = now;
        }
        self.updated_at = now;
    }
}
