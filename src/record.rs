//! Record binding: how an entity exposes its fields to the store.
//!
//! Every entity implements [`Record`] with a `match` over its column names.
//! [`Record::address_of`] hands out a write destination for scanning a fetched
//! value into the field; [`Record::value_of`] reads the field for writing.

use std::any::Any;
use std::fmt;

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::value::{ConversionError, FromValue, Value};

/// Lifecycle flags of a record.
///
/// A record starts transient. It becomes persisted once inserted or fetched,
/// and writable when all of its columns are known to match the stored row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordState {
    persisted: bool,
    writable: bool,
}

impl RecordState {
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn set_persisted(&mut self) {
        self.persisted = true;
    }

    pub fn set_writable(&mut self, writable: bool) {
        self.writable = writable;
    }

    /// Allow updates of a record fetched with a partial projection.
    ///
    /// Columns that were not fetched hold zero values and will overwrite the
    /// stored ones unless the update names its columns explicitly.
    pub fn force_writable(&mut self) {
        self.writable = true;
    }

    pub(crate) fn mark_stored(&mut self) {
        self.persisted = true;
        self.writable = true;
    }

    pub(crate) fn mark_transient(&mut self) {
        self.persisted = false;
        self.writable = false;
    }
}

/// A write destination for one field of a record.
pub struct Address<'a> {
    setter: Box<dyn FnOnce(Value) -> Result<(), ConversionError> + 'a>,
}

impl<'a> Address<'a> {
    /// Destination for a scalar field.
    pub fn scalar<T: FromValue + 'a>(slot: &'a mut T) -> Self {
        Self {
            setter: Box::new(move |value| {
                *slot = T::from_value(value)?;
                Ok(())
            }),
        }
    }

    /// Destination for a structured field stored as JSON.
    ///
    /// SQL NULL decodes as JSON `null`, so `Option<T>` fields come back `None`.
    pub fn json<T: DeserializeOwned + 'a>(slot: &'a mut T) -> Self {
        Self {
            setter: Box::new(move |value| {
                *slot = value.decode_json()?;
                Ok(())
            }),
        }
    }

    /// Store `value` into the field.
    pub fn set(self, value: Value) -> Result<(), ConversionError> {
        (self.setter)(value)
    }
}

impl fmt::Debug for Address<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Address")
    }
}

/// An entity persisted through a [`crate::store::Store`].
pub trait Record: Sized + 'static {
    /// The entity descriptor.
    fn schema() -> &'static Schema<Self>;

    /// Identifier value.
    fn id(&self) -> Value;

    /// Write destination for `column`.
    fn address_of(&mut self, column: &str) -> Result<Address<'_>>;

    /// Current value of `column`.
    fn value_of(&self, column: &str) -> Result<Value>;

    /// New empty record for the relationship `field`.
    fn new_related(&self, field: &str) -> Result<Box<dyn Any>> {
        Err(Error::UnsupportedRelationship {
            entity: Self::schema().entity(),
            field: field.into(),
        })
    }

    /// Attach loaded records to the relationship `field`.
    fn set_related(&mut self, field: &str, _records: Vec<Box<dyn Any>>) -> Result<()> {
        Err(Error::UnsupportedRelationship {
            entity: Self::schema().entity(),
            field: field.into(),
        })
    }

    fn state(&self) -> &RecordState;

    fn state_mut(&mut self) -> &mut RecordState;

    /// Runs before every insert and update.
    fn before_save(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Scan one fetched row into a fresh record.
///
/// `columns` are the projected column names, in row order.
pub(crate) fn scan_row<R: Record>(columns: &[&'static str], row: Vec<Value>) -> Result<R> {
    let mut record = R::schema().new_record();
    for (column, value) in columns.iter().zip(row) {
        record
            .address_of(column)?
            .set(value)
            .map_err(|e| Error::conversion(*column, e))?;
    }
    Ok(record)
}
