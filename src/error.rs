//! Crate error type.
//!
//! Sentinel variants ([`Error::NotFound`], [`Error::Stop`], ...) are compared
//! with `matches!`; collaborator failures carry the entity and the operation
//! that was running when the driver gave up.

use crate::driver::DriverError;
use crate::value::ConversionError;

/// Lifecycle violations detected before any statement is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RecordStateError {
    #[error("record is already persisted")]
    AlreadyPersisted,

    #[error("record is not persisted")]
    NotPersisted,

    #[error("record is not writable; it was fetched with a partial projection")]
    NotWritable,
}

/// Errors returned by schema, query and store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No row matched, or a write by identifier affected no row.
    #[error("not found")]
    NotFound,

    #[error("unknown column `{column}` for entity {entity}")]
    UnknownColumn {
        entity: &'static str,
        column: String,
    },

    #[error("entity {entity} has no relationship `{field}`")]
    UnsupportedRelationship {
        entity: &'static str,
        field: String,
    },

    #[error(transparent)]
    RecordState(#[from] RecordStateError),

    #[error("transaction callback is missing")]
    InvalidTransactionCallback,

    #[error("store is already bound to a transaction")]
    NestedTransaction,

    #[error("cannot read column `{column}`: {source}")]
    Conversion {
        column: String,
        #[source]
        source: ConversionError,
    },

    #[error("{entity}: {operation} failed: {source}")]
    Collaborator {
        entity: &'static str,
        operation: &'static str,
        #[source]
        source: DriverError,
    },

    #[error("{entity}: pre-save hook rejected the record: {reason}")]
    Hook { entity: &'static str, reason: String },

    /// Returned from a `for_each` callback to end iteration early.
    #[error("iteration stopped")]
    Stop,
}

impl Error {
    pub fn unknown_column(entity: &'static str, column: impl Into<String>) -> Self {
        Error::UnknownColumn {
            entity,
            column: column.into(),
        }
    }

    pub fn conversion(column: impl Into<String>, source: ConversionError) -> Self {
        Error::Conversion {
            column: column.into(),
            source,
        }
    }

    pub fn collaborator(entity: &'static str, operation: &'static str, source: DriverError) -> Self {
        Error::Collaborator {
            entity,
            operation,
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
