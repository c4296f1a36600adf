//! Lazy typed cursor over the rows of a query.
//!
//! ```text
//! open ──next()──▶ has-next ──next()──▶ ... ──next()──▶ exhausted ─▶ closed
//!   └──────────────────────── close() ─────────────────────────────────┘
//! ```
//!
//! Rows are turned into records one at a time, on [`ResultSet::next`]. A
//! result set is consumed as it is read and cannot be restarted.

use std::fmt;

use crate::driver::RowCursor;
use crate::error::{Error, Result};
use crate::record::{scan_row, Record};

pub struct ResultSet<R: Record> {
    cursor: Option<Box<dyn RowCursor>>,
    columns: Vec<&'static str>,
    writable: bool,
    last: Option<R>,
    err: Option<Error>,
}

impl<R: Record> ResultSet<R> {
    /// Wrap `cursor`, whose rows carry `columns` in order.
    ///
    /// Records come back writable only if `writable` is set, i.e. the query
    /// fetched every column.
    pub fn new(cursor: Box<dyn RowCursor>, columns: Vec<&'static str>, writable: bool) -> Self {
        Self {
            cursor: Some(cursor),
            columns,
            writable,
            last: None,
            err: None,
        }
    }

    /// Advance to the next row.
    ///
    /// Returns `false` once the rows are exhausted (the result set closes
    /// itself) or the driver failed (see [`err`](Self::err)). A row that
    /// cannot be scanned still returns `true`; [`get`](Self::get) reports it.
    pub fn next(&mut self) -> bool {
        self.last = None;
        let Some(cursor) = self.cursor.as_mut() else {
            return false;
        };

        match cursor.next_row() {
            Ok(Some(row)) => {
                match scan_row::<R>(&self.columns, row) {
                    Ok(mut record) => {
                        let state = record.state_mut();
                        state.set_persisted();
                        state.set_writable(self.writable);
                        self.last = Some(record);
                    }
                    Err(e) => self.err = Some(e),
                }
                true
            }
            Ok(None) => {
                if let Err(e) = self.close() {
                    self.err = Some(e);
                }
                false
            }
            Err(e) => {
                self.err = Some(Error::collaborator(R::schema().entity(), "fetch", e));
                // The fetch error is the one reported.
                let _ = self.close();
                false
            }
        }
    }

    /// Take the record materialized by the last [`next`](Self::next), or the
    /// error that happened instead.
    pub fn get(&mut self) -> Result<Option<R>> {
        if let Some(e) = self.err.take() {
            return Err(e);
        }
        Ok(self.last.take())
    }

    /// Call `f` for every remaining record.
    ///
    /// Returning [`Error::Stop`] from `f` ends the iteration early and
    /// successfully. Any other error is returned as is. The result set is
    /// closed in every case.
    pub fn for_each<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(R) -> Result<()>,
    {
        let outcome = (|| {
            while self.next() {
                if let Some(record) = self.get()? {
                    f(record)?;
                }
            }
            match self.err.take() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        })();

        let closed = self.close();
        match outcome {
            Ok(()) | Err(Error::Stop) => closed,
            Err(e) => Err(e),
        }
    }

    /// Drain into a vector.
    pub fn all(&mut self) -> Result<Vec<R>> {
        let mut records = Vec::new();
        self.for_each(|record| {
            records.push(record);
            Ok(())
        })?;
        Ok(records)
    }

    /// Take the next record and close, failing with `NotFound` if there is none.
    pub fn one(&mut self) -> Result<R> {
        let found = if self.next() { self.get() } else { Ok(None) };
        let pending = self.err.take();
        self.close()?;
        match (found?, pending) {
            (_, Some(e)) => Err(e),
            (Some(record), None) => Ok(record),
            (None, None) => Err(Error::NotFound),
        }
    }

    /// The last error, if any.
    pub fn err(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.cursor.is_none()
    }

    /// Release the cursor. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        match self.cursor.take() {
            Some(mut cursor) => cursor
                .close()
                .map_err(|e| Error::collaborator(R::schema().entity(), "close", e)),
            None => Ok(()),
        }
    }
}

impl<R: Record> fmt::Debug for ResultSet<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSet")
            .field("entity", &R::schema().entity())
            .field("columns", &self.columns)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Iterator over the records of a [`ResultSet`].
pub struct Records<R: Record> {
    inner: ResultSet<R>,
}

impl<R: Record> Iterator for Records<R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.inner.next() {
            return self.inner.err.take().map(Err);
        }
        self.inner.get().transpose()
    }
}

impl<R: Record> IntoIterator for ResultSet<R> {
    type Item = Result<R>;
    type IntoIter = Records<R>;

    fn into_iter(self) -> Self::IntoIter {
        Records { inner: self }
    }
}
