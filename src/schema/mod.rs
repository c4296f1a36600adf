//! Schema tree: static per-entity metadata.
//!
//! A [`Schema`] names the table, its alias, the identifier column and the
//! ordered column list of one record type. Structured columns carry a
//! [`Shape`] describing the JSON document stored in them, so that paths into
//! the document can be checked before a query reaches the database.
//!
//! Field references ([`SchemaField`]) are plain values produced by the typed
//! field tree of each entity (see [`crate::model::repository::FIELDS`]).

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::sql::expr::{element, json_extract, table_col, Expr};
use crate::sql::json::{split_at_each, JsonKind, PathSegment};

// =============================================================================
// Column descriptors
// =============================================================================

/// Storage type of a scalar column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Text,
    Integer,
    Bool,
    Timestamp,
    Uuid,
}

/// Shape of a JSON document stored in a structured column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Leaf(JsonKind),
    Object(&'static [(&'static str, Shape)]),
    Array(&'static Shape),
}

impl Shape {
    /// Kind of the value `path` leads to, or `None` if the shape has no such path.
    ///
    /// Paths ending on an object or array resolve to [`JsonKind::Any`].
    pub fn resolve(&self, path: &[PathSegment]) -> Option<JsonKind> {
        let Some((head, rest)) = path.split_first() else {
            return Some(match self {
                Shape::Leaf(kind) => *kind,
                Shape::Object(_) | Shape::Array(_) => JsonKind::Any,
            });
        };

        match (self, head) {
            (Shape::Object(members), PathSegment::Key(key)) => members
                .iter()
                .find(|(name, _)| *name == key.as_ref())
                .and_then(|(_, shape)| shape.resolve(rest)),
            (Shape::Array(item), PathSegment::Index(_) | PathSegment::Each) => item.resolve(rest),
            _ => None,
        }
    }
}

/// What a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Scalar(ScalarType),
    Structured(&'static Shape),
}

/// One column of an entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl ColumnDescriptor {
    pub const fn scalar(name: &'static str, ty: ScalarType) -> Self {
        Self {
            name,
            kind: ColumnKind::Scalar(ty),
        }
    }

    pub const fn structured(name: &'static str, shape: &'static Shape) -> Self {
        Self {
            name,
            kind: ColumnKind::Structured(shape),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self.kind, ColumnKind::Structured(_))
    }
}

/// Relationship metadata. Entities without relationships carry an empty map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: &'static str,
    pub inverse: bool,
}

// =============================================================================
// Field references
// =============================================================================

/// Path into a structured column.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    column: Cow<'static, str>,
    segments: Vec<PathSegment>,
    kind: JsonKind,
}

impl JsonPath {
    pub fn new(
        column: impl Into<Cow<'static, str>>,
        segments: Vec<PathSegment>,
        kind: JsonKind,
    ) -> Self {
        Self {
            column: column.into(),
            segments,
            kind,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn kind(&self) -> JsonKind {
        self.kind
    }

    /// Whether the path steps through every element of an array.
    pub fn is_each(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, PathSegment::Each))
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column)?;
        for segment in &self.segments {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}

/// A column or a path into a structured column, as used by conditions,
/// projections and ordering.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaField {
    Column(Cow<'static, str>),
    Path(JsonPath),
}

impl SchemaField {
    pub const fn column(name: &'static str) -> Self {
        SchemaField::Column(Cow::Borrowed(name))
    }

    /// Name of the column the field lives in.
    pub fn column_name(&self) -> &str {
        match self {
            SchemaField::Column(name) => name,
            SchemaField::Path(path) => path.column(),
        }
    }
}

impl fmt::Display for SchemaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaField::Column(name) => write!(f, "{}", name),
            SchemaField::Path(path) => write!(f, "{}", path),
        }
    }
}

impl From<&'static str> for SchemaField {
    fn from(name: &'static str) -> Self {
        SchemaField::column(name)
    }
}

impl From<String> for SchemaField {
    fn from(name: String) -> Self {
        SchemaField::Column(Cow::Owned(name))
    }
}

impl From<JsonPath> for SchemaField {
    fn from(path: JsonPath) -> Self {
        SchemaField::Path(path)
    }
}

/// Where a field lands once compiled: a plain expression, or an array
/// expansion whose predicate is evaluated per element.
pub(crate) enum FieldTarget {
    Value(Expr),
    Each {
        base: Expr,
        array_path: Vec<PathSegment>,
        element: Expr,
    },
}

// =============================================================================
// Schema
// =============================================================================

/// Entity descriptor. One per record type, built once and shared.
pub struct Schema<R> {
    entity: &'static str,
    table: &'static str,
    alias: &'static str,
    id: &'static str,
    columns: &'static [ColumnDescriptor],
    foreign_keys: BTreeMap<&'static str, ForeignKey>,
    factory: fn() -> R,
}

impl<R> Schema<R> {
    /// Build a descriptor.
    ///
    /// `id` must name one of `columns`; it is checked in debug builds.
    pub fn new(
        entity: &'static str,
        table: &'static str,
        alias: &'static str,
        id: &'static str,
        columns: &'static [ColumnDescriptor],
        factory: fn() -> R,
    ) -> Self {
        debug_assert!(
            columns.iter().any(|c| c.name == id),
            "identifier column `{}` missing from {}",
            id,
            entity
        );
        Self {
            entity,
            table,
            alias,
            id,
            columns,
            foreign_keys: BTreeMap::new(),
            factory,
        }
    }

    pub fn with_foreign_key(mut self, field: &'static str, fk: ForeignKey) -> Self {
        self.foreign_keys.insert(field, fk);
        self
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn alias(&self) -> &'static str {
        self.alias
    }

    /// Identifier column name.
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// All columns, in projection order.
    pub fn columns(&self) -> &'static [ColumnDescriptor] {
        self.columns
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&'static ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn foreign_keys(&self) -> &BTreeMap<&'static str, ForeignKey> {
        &self.foreign_keys
    }

    /// A zero-valued record, the starting point for scanning a row.
    pub fn new_record(&self) -> R {
        (self.factory)()
    }

    /// Look up a column, failing with `UnknownColumn`.
    pub fn require(&self, name: &str) -> Result<&'static ColumnDescriptor> {
        self.column(name)
            .ok_or_else(|| Error::unknown_column(self.entity, name))
    }

    /// Check that `field` exists in this schema.
    ///
    /// Paths must address a structured column and follow its shape.
    pub fn validate(&self, field: &SchemaField) -> Result<()> {
        match field {
            SchemaField::Column(name) => self.require(name).map(|_| ()),
            SchemaField::Path(path) => {
                let column = self.require(path.column())?;
                match column.kind {
                    ColumnKind::Structured(shape) if shape.resolve(path.segments()).is_some() => {
                        Ok(())
                    }
                    _ => Err(Error::unknown_column(self.entity, path.to_string())),
                }
            }
        }
    }

    /// Validate `field` and compile it to an expression qualified by the alias.
    pub(crate) fn target(&self, field: &SchemaField) -> Result<FieldTarget> {
        self.validate(field)?;
        let column = table_col(self.alias, field.column_name());
        match field {
            SchemaField::Column(_) => Ok(FieldTarget::Value(column)),
            SchemaField::Path(path) => match split_at_each(path.segments()) {
                None => Ok(FieldTarget::Value(json_extract(
                    column,
                    path.segments().to_vec(),
                    path.kind(),
                ))),
                Some((array_path, inner)) => Ok(FieldTarget::Each {
                    base: column,
                    array_path: array_path.to_vec(),
                    element: json_extract(element(), inner.to_vec(), path.kind()),
                }),
            },
        }
    }
}

impl<R> fmt::Debug for Schema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("entity", &self.entity)
            .field("table", &self.table)
            .field("alias", &self.alias)
            .field("id", &self.id)
            .field("columns", &self.column_names())
            .finish()
    }
}
