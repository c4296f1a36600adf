//! Query builder.
//!
//! [`Query`] is a value: every mutator takes it by value and returns it, so a
//! query handed to two call sites can never be changed behind either one's
//! back. [`Query::copy`] makes the intent of branching explicit.
//!
//! ```ignore
//! let q = Query::new()
//!     .filter(Condition::eq("slug", "rowbind"))
//!     .order(vec![desc("size")])
//!     .limit(10);
//! let page2 = q.copy().offset(10);
//! ```

pub mod condition;

pub use condition::{Condition, ScalarOp};

use crate::config::QuerySettings;
use crate::error::{Error, Result};
use crate::schema::{FieldTarget, Schema, SchemaField};
use crate::sql::dialect::Dialect;
use crate::sql::expr::{count_star, table_col, Expr};
use crate::sql::select::{OrderByExpr, Select, SortDir, TableRef};
use crate::sql::token::Statement;

/// Rows fetched per round-trip when expanding 1:N relationships.
pub const DEFAULT_BATCH_SIZE: u64 = 50;

/// Column projection.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Projection {
    #[default]
    All,
    Only(Vec<SchemaField>),
    Except(Vec<SchemaField>),
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub field: SchemaField,
    pub dir: SortDir,
}

/// Ascending order on `field`.
pub fn asc(field: impl Into<SchemaField>) -> Order {
    Order {
        field: field.into(),
        dir: SortDir::Asc,
    }
}

/// Descending order on `field`.
pub fn desc(field: impl Into<SchemaField>) -> Order {
    Order {
        field: field.into(),
        dir: SortDir::Desc,
    }
}

/// A compiled SELECT, with the column list the rows come back in.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSelect {
    pub statement: Statement,
    pub columns: Vec<&'static str>,
    /// False when the projection leaves out columns.
    pub writable: bool,
}

/// A SELECT over one entity.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "queries have no effect until passed to a store"]
pub struct Query {
    projection: Projection,
    conditions: Vec<Condition>,
    order: Vec<Order>,
    limit: Option<u64>,
    offset: Option<u64>,
    batch_size: u64,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            projection: Projection::All,
            conditions: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty query using the configured batch size.
    pub fn from_settings(settings: &QuerySettings) -> Self {
        Self::new().batch_size(settings.batch_size)
    }

    /// Independent copy.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Fetch only `columns` (plus the identifier). Replaces any `select_not`.
    /// An empty list leaves the projection unchanged.
    pub fn select<F: Into<SchemaField>>(mut self, columns: impl IntoIterator<Item = F>) -> Self {
        let columns: Vec<SchemaField> = columns.into_iter().map(Into::into).collect();
        if !columns.is_empty() {
            self.projection = Projection::Only(columns);
        }
        self
    }

    /// Fetch every column except `columns`. Replaces any `select`.
    /// The identifier is always fetched.
    pub fn select_not<F: Into<SchemaField>>(
        mut self,
        columns: impl IntoIterator<Item = F>,
    ) -> Self {
        self.projection = Projection::Except(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Add an AND term.
    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Set the ordering, replacing any previous one.
    pub fn order(mut self, order: impl IntoIterator<Item = Order>) -> Self {
        self.order = order.into_iter().collect();
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    pub fn batch_size(mut self, n: u64) -> Self {
        self.batch_size = n;
        self
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Rows per batch for relationship expansion.
    pub fn current_batch_size(&self) -> u64 {
        self.batch_size
    }

    /// Whether the projection was narrowed.
    pub fn is_read_only<R>(&self, schema: &Schema<R>) -> Result<bool> {
        Ok(self.columns(schema)?.len() < schema.columns().len())
    }

    /// Resolve the projection to column names, in schema order.
    pub fn columns<R>(&self, schema: &Schema<R>) -> Result<Vec<&'static str>> {
        let names = |fields: &[SchemaField]| -> Result<Vec<String>> {
            fields
                .iter()
                .map(|f| match f {
                    SchemaField::Column(name) => {
                        schema.require(name)?;
                        Ok(name.to_string())
                    }
                    // Projections work on whole columns.
                    SchemaField::Path(path) => {
                        Err(Error::unknown_column(schema.entity(), path.to_string()))
                    }
                })
                .collect()
        };

        let all = schema.columns().iter().map(|c| c.name);
        Ok(match &self.projection {
            Projection::All => all.collect(),
            Projection::Only(fields) => {
                let keep = names(fields)?;
                all.filter(|c| *c == schema.id() || keep.iter().any(|k| k.as_str() == *c))
                    .collect()
            }
            Projection::Except(fields) => {
                let drop = names(fields)?;
                all.filter(|c| *c == schema.id() || !drop.iter().any(|d| d.as_str() == *c))
                    .collect()
            }
        })
    }

    fn where_clause<R>(&self, schema: &Schema<R>) -> Result<Option<Expr>> {
        Condition::And(self.conditions.clone()).to_expr(schema)
    }

    fn base<R>(&self, schema: &Schema<R>) -> Result<Select> {
        let mut select =
            Select::new().from(TableRef::new(schema.table()).with_alias(schema.alias()));
        if let Some(expr) = self.where_clause(schema)? {
            select = select.filter(expr);
        }
        Ok(select)
    }

    /// Compile to a SELECT of the projected columns.
    pub fn compile_select<R>(&self, schema: &Schema<R>, dialect: Dialect) -> Result<CompiledSelect> {
        let columns = self.columns(schema)?;
        let mut select = self
            .base(schema)?
            .select(
                columns
                    .iter()
                    .map(|c| table_col(schema.alias(), c))
                    .collect::<Vec<Expr>>(),
            );

        let mut order_by = Vec::with_capacity(self.order.len());
        for order in &self.order {
            let expr = match schema.target(&order.field)? {
                FieldTarget::Value(expr) => expr,
                // Ordering needs one value per row.
                FieldTarget::Each { .. } => {
                    return Err(Error::unknown_column(schema.entity(), order.field.to_string()))
                }
            };
            order_by.push(match order.dir {
                SortDir::Asc => OrderByExpr::asc(expr),
                SortDir::Desc => OrderByExpr::desc(expr),
            });
        }
        if !order_by.is_empty() {
            select = select.order_by(order_by);
        }
        if let Some(limit) = self.limit {
            select = select.limit(limit);
        }
        if let Some(offset) = self.offset {
            select = select.offset(offset);
        }

        Ok(CompiledSelect {
            statement: select.to_statement(dialect),
            writable: columns.len() == schema.columns().len(),
            columns,
        })
    }

    /// Compile to `SELECT COUNT(*)`. Ordering, limit and offset are ignored.
    pub fn compile_count<R>(&self, schema: &Schema<R>, dialect: Dialect) -> Result<Statement> {
        Ok(self
            .base(schema)?
            .select(vec![count_star()])
            .to_statement(dialect))
    }
}
