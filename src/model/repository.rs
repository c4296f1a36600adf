//! Binding of the `Repository` entity, a source-hosting repository stored in
//! the `bitbucket` table.
//!
//! The `links`, `owner` and `parent` fields are sub-documents persisted as
//! JSON columns; their members are reachable from [`FIELDS`]:
//!
//! ```ignore
//! let q = RepositoryQuery::new()
//!     .filter(Condition::eq(FIELDS.owner().username(), "alice"))
//!     .filter(Condition::eq(FIELDS.links().clone_links().name(), "ssh"));
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Timestamps;
use crate::driver::Session;
use crate::error::{Error, Result};
use crate::log::Logger;
use crate::query::{Condition, Order, Query, ScalarOp};
use crate::record::{Address, Record, RecordState};
use crate::schema::{ColumnDescriptor, JsonPath, ScalarType, Schema, SchemaField, Shape};
use crate::sql::json::{JsonKind, PathSegment};
use crate::store::{ResultSet, Store};
use crate::value::{ConversionError, Value};

const ENTITY: &str = "Repository";

// =============================================================================
// Record
// =============================================================================

/// One entry of `links.clone`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneLink {
    pub href: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub clone: Vec<CloneLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub username: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub uuid: String,
}

/// The repository this one was forked from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub full_name: String,
    pub uuid: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Repository {
    id: Uuid,
    pub timestamps: Timestamps,
    /// Pagination cursor of the listing this record came from.
    pub next: String,
    pub scm: String,
    pub website: String,
    pub name: String,
    pub links: Links,
    pub fork_policy: String,
    /// Identifier assigned by the hosting service.
    pub uuid: String,
    pub language: String,
    pub created_on: String,
    pub parent: Option<Parent>,
    pub full_name: String,
    pub has_issues: bool,
    pub owner: Owner,
    pub updated_on: String,
    pub size: i64,
    /// `type` column.
    pub kind: String,
    pub slug: String,
    pub is_private: bool,
    pub description: String,
    state: RecordState,
}

impl Repository {
    /// A transient record with a fresh identifier.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            ..Self::blank()
        }
    }

    /// Zero-valued record that rows are scanned into; the identifier is nil
    /// until the `id` column is read.
    fn blank() -> Self {
        Self {
            id: Uuid::nil(),
            timestamps: Timestamps::default(),
            next: String::new(),
            scm: String::new(),
            website: String::new(),
            name: String::new(),
            links: Links::default(),
            fork_policy: String::new(),
            uuid: String::new(),
            language: String::new(),
            created_on: String::new(),
            parent: None,
            full_name: String::new(),
            has_issues: false,
            owner: Owner::default(),
            updated_on: String::new(),
            size: 0,
            kind: String::new(),
            slug: String::new(),
            is_private: false,
            description: String::new(),
            state: RecordState::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

fn json_column<T: Serialize>(column: &str, value: &T) -> Result<Value> {
    Value::json(value).map_err(|e| {
        Error::conversion(column, ConversionError::new("json document", e.to_string()))
    })
}

impl Record for Repository {
    fn schema() -> &'static Schema<Self> {
        &SCHEMA
    }

    fn id(&self) -> Value {
        Value::Uuid(self.id)
    }

    fn address_of(&mut self, column: &str) -> Result<Address<'_>> {
        Ok(match column {
            "id" => Address::scalar(&mut self.id),
            "created_at" => Address::scalar(&mut self.timestamps.created_at),
            "updated_at" => Address::scalar(&mut self.timestamps.updated_at),
            "next" => Address::scalar(&mut self.next),
            "scm" => Address::scalar(&mut self.scm),
            "website" => Address::scalar(&mut self.website),
            "name" => Address::scalar(&mut self.name),
            "links" => Address::json(&mut self.links),
            "fork_policy" => Address::scalar(&mut self.fork_policy),
            "uuid" => Address::scalar(&mut self.uuid),
            "language" => Address::scalar(&mut self.language),
            "created_on" => Address::scalar(&mut self.created_on),
            "parent" => Address::json(&mut self.parent),
            "full_name" => Address::scalar(&mut self.full_name),
            "has_issues" => Address::scalar(&mut self.has_issues),
            "owner" => Address::json(&mut self.owner),
            "updated_on" => Address::scalar(&mut self.updated_on),
            "size" => Address::scalar(&mut self.size),
            "type" => Address::scalar(&mut self.kind),
            "slug" => Address::scalar(&mut self.slug),
            "is_private" => Address::scalar(&mut self.is_private),
            "description" => Address::scalar(&mut self.description),
            _ => return Err(Error::unknown_column(ENTITY, column)),
        })
    }

    fn value_of(&self, column: &str) -> Result<Value> {
        Ok(match column {
            "id" => Value::Uuid(self.id),
            "created_at" => Value::Timestamp(self.timestamps.created_at),
            "updated_at" => Value::Timestamp(self.timestamps.updated_at),
            "next" => Value::from(&self.next),
            "scm" => Value::from(&self.scm),
            "website" => Value::from(&self.website),
            "name" => Value::from(&self.name),
            "links" => json_column(column, &self.links)?,
            "fork_policy" => Value::from(&self.fork_policy),
            "uuid" => Value::from(&self.uuid),
            "language" => Value::from(&self.language),
            "created_on" => Value::from(&self.created_on),
            "parent" => match &self.parent {
                Some(parent) => json_column(column, parent)?,
                None => Value::Null,
            },
            "full_name" => Value::from(&self.full_name),
            "has_issues" => Value::Bool(self.has_issues),
            "owner" => json_column(column, &self.owner)?,
            "updated_on" => Value::from(&self.updated_on),
            "size" => Value::Integer(self.size),
            "type" => Value::from(&self.kind),
            "slug" => Value::from(&self.slug),
            "is_private" => Value::Bool(self.is_private),
            "description" => Value::from(&self.description),
            _ => return Err(Error::unknown_column(ENTITY, column)),
        })
    }

    fn state(&self) -> &RecordState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RecordState {
        &mut self.state
    }

    fn before_save(&mut self) -> Result<()> {
        self.timestamps.stamp(Utc::now());
        Ok(())
    }
}

// =============================================================================
// Schema
// =============================================================================

static CLONE_LINK_SHAPE: Shape = Shape::Object(&[
    ("href", Shape::Leaf(JsonKind::Text)),
    ("name", Shape::Leaf(JsonKind::Text)),
]);

static LINKS_SHAPE: Shape = Shape::Object(&[("clone", Shape::Array(&CLONE_LINK_SHAPE))]);

static OWNER_SHAPE: Shape = Shape::Object(&[
    ("username", Shape::Leaf(JsonKind::Text)),
    ("display_name", Shape::Leaf(JsonKind::Text)),
    ("type", Shape::Leaf(JsonKind::Text)),
    ("uuid", Shape::Leaf(JsonKind::Text)),
]);

static PARENT_SHAPE: Shape = Shape::Object(&[
    ("type", Shape::Leaf(JsonKind::Text)),
    ("name", Shape::Leaf(JsonKind::Text)),
    ("full_name", Shape::Leaf(JsonKind::Text)),
    ("uuid", Shape::Leaf(JsonKind::Text)),
]);

static COLUMNS: [ColumnDescriptor; 22] = [
    ColumnDescriptor::scalar("id", ScalarType::Uuid),
    ColumnDescriptor::scalar("created_at", ScalarType::Timestamp),
    ColumnDescriptor::scalar("updated_at", ScalarType::Timestamp),
    ColumnDescriptor::scalar("next", ScalarType::Text),
    ColumnDescriptor::scalar("scm", ScalarType::Text),
    ColumnDescriptor::scalar("website", ScalarType::Text),
    ColumnDescriptor::scalar("name", ScalarType::Text),
    ColumnDescriptor::structured("links", &LINKS_SHAPE),
    ColumnDescriptor::scalar("fork_policy", ScalarType::Text),
    ColumnDescriptor::scalar("uuid", ScalarType::Text),
    ColumnDescriptor::scalar("language", ScalarType::Text),
    ColumnDescriptor::scalar("created_on", ScalarType::Text),
    ColumnDescriptor::structured("parent", &PARENT_SHAPE),
    ColumnDescriptor::scalar("full_name", ScalarType::Text),
    ColumnDescriptor::scalar("has_issues", ScalarType::Bool),
    ColumnDescriptor::structured("owner", &OWNER_SHAPE),
    ColumnDescriptor::scalar("updated_on", ScalarType::Text),
    ColumnDescriptor::scalar("size", ScalarType::Integer),
    ColumnDescriptor::scalar("type", ScalarType::Text),
    ColumnDescriptor::scalar("slug", ScalarType::Text),
    ColumnDescriptor::scalar("is_private", ScalarType::Bool),
    ColumnDescriptor::scalar("description", ScalarType::Text),
];

pub static SCHEMA: Lazy<Schema<Repository>> = Lazy::new(|| {
    Schema::new(
        ENTITY,
        "bitbucket",
        "__repository",
        "id",
        &COLUMNS,
        Repository::blank,
    )
});

// =============================================================================
// Field tree
// =============================================================================

/// Typed references to every column and JSON member of `Repository`.
pub static FIELDS: RepositoryFields = RepositoryFields;

fn text_path(column: &'static str, segments: Vec<PathSegment>) -> SchemaField {
    JsonPath::new(column, segments, JsonKind::Text).into()
}

#[derive(Debug, Clone, Copy)]
pub struct RepositoryFields;

impl RepositoryFields {
    pub fn id(&self) -> SchemaField {
        SchemaField::column("id")
    }

    pub fn created_at(&self) -> SchemaField {
        SchemaField::column("created_at")
    }

    pub fn updated_at(&self) -> SchemaField {
        SchemaField::column("updated_at")
    }

    pub fn next(&self) -> SchemaField {
        SchemaField::column("next")
    }

    pub fn scm(&self) -> SchemaField {
        SchemaField::column("scm")
    }

    pub fn website(&self) -> SchemaField {
        SchemaField::column("website")
    }

    pub fn name(&self) -> SchemaField {
        SchemaField::column("name")
    }

    pub fn links(&self) -> LinksField {
        LinksField
    }

    pub fn fork_policy(&self) -> SchemaField {
        SchemaField::column("fork_policy")
    }

    pub fn uuid(&self) -> SchemaField {
        SchemaField::column("uuid")
    }

    pub fn language(&self) -> SchemaField {
        SchemaField::column("language")
    }

    pub fn created_on(&self) -> SchemaField {
        SchemaField::column("created_on")
    }

    pub fn parent(&self) -> ParentField {
        ParentField
    }

    pub fn full_name(&self) -> SchemaField {
        SchemaField::column("full_name")
    }

    pub fn has_issues(&self) -> SchemaField {
        SchemaField::column("has_issues")
    }

    pub fn owner(&self) -> OwnerField {
        OwnerField
    }

    pub fn updated_on(&self) -> SchemaField {
        SchemaField::column("updated_on")
    }

    pub fn size(&self) -> SchemaField {
        SchemaField::column("size")
    }

    /// The `type` column.
    pub fn kind(&self) -> SchemaField {
        SchemaField::column("type")
    }

    pub fn slug(&self) -> SchemaField {
        SchemaField::column("slug")
    }

    pub fn is_private(&self) -> SchemaField {
        SchemaField::column("is_private")
    }

    pub fn description(&self) -> SchemaField {
        SchemaField::column("description")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LinksField;

impl LinksField {
    /// The whole `links` column.
    pub fn column(&self) -> SchemaField {
        SchemaField::column("links")
    }

    /// `links.clone`, matching any element until narrowed with [`CloneLinksField::at`].
    pub fn clone_links(&self) -> CloneLinksField {
        CloneLinksField { index: None }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CloneLinksField {
    index: Option<usize>,
}

impl CloneLinksField {
    /// Narrow to the element at position `n`.
    pub fn at(&self, n: usize) -> Self {
        Self { index: Some(n) }
    }

    fn element(&self) -> Vec<PathSegment> {
        vec![
            PathSegment::key("clone"),
            match self.index {
                Some(n) => PathSegment::Index(n),
                None => PathSegment::Each,
            },
        ]
    }

    pub fn href(&self) -> SchemaField {
        let mut path = self.element();
        path.push(PathSegment::key("href"));
        text_path("links", path)
    }

    pub fn name(&self) -> SchemaField {
        let mut path = self.element();
        path.push(PathSegment::key("name"));
        text_path("links", path)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OwnerField;

impl OwnerField {
    pub fn column(&self) -> SchemaField {
        SchemaField::column("owner")
    }

    pub fn username(&self) -> SchemaField {
        text_path("owner", vec![PathSegment::key("username")])
    }

    pub fn display_name(&self) -> SchemaField {
        text_path("owner", vec![PathSegment::key("display_name")])
    }

    pub fn kind(&self) -> SchemaField {
        text_path("owner", vec![PathSegment::key("type")])
    }

    pub fn uuid(&self) -> SchemaField {
        text_path("owner", vec![PathSegment::key("uuid")])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParentField;

impl ParentField {
    pub fn column(&self) -> SchemaField {
        SchemaField::column("parent")
    }

    pub fn kind(&self) -> SchemaField {
        text_path("parent", vec![PathSegment::key("type")])
    }

    pub fn name(&self) -> SchemaField {
        text_path("parent", vec![PathSegment::key("name")])
    }

    pub fn full_name(&self) -> SchemaField {
        text_path("parent", vec![PathSegment::key("full_name")])
    }

    pub fn uuid(&self) -> SchemaField {
        text_path("parent", vec![PathSegment::key("uuid")])
    }
}

// =============================================================================
// Query
// =============================================================================

/// Query over `Repository` records, with one finder per column.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "queries have no effect until passed to a store"]
pub struct RepositoryQuery {
    query: Query,
}

impl RepositoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copy(&self) -> Self {
        Self {
            query: self.query.copy(),
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn into_query(self) -> Query {
        self.query
    }

    fn map(self, f: impl FnOnce(Query) -> Query) -> Self {
        Self {
            query: f(self.query),
        }
    }

    pub fn select<F: Into<SchemaField>>(self, columns: impl IntoIterator<Item = F>) -> Self {
        self.map(|q| q.select(columns))
    }

    pub fn select_not<F: Into<SchemaField>>(self, columns: impl IntoIterator<Item = F>) -> Self {
        self.map(|q| q.select_not(columns))
    }

    pub fn order(self, order: impl IntoIterator<Item = Order>) -> Self {
        self.map(|q| q.order(order))
    }

    pub fn batch_size(self, n: u64) -> Self {
        self.map(|q| q.batch_size(n))
    }

    pub fn limit(self, n: u64) -> Self {
        self.map(|q| q.limit(n))
    }

    pub fn offset(self, n: u64) -> Self {
        self.map(|q| q.offset(n))
    }

    pub fn filter(self, condition: Condition) -> Self {
        self.map(|q| q.filter(condition))
    }

    /// Records whose identifier is one of `ids`. No ids means no restriction.
    pub fn find_by_id(self, ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.filter(Condition::is_in(FIELDS.id(), ids))
    }

    pub fn find_by_created_at(self, op: ScalarOp, v: DateTime<Utc>) -> Self {
        self.filter(Condition::cmp(op, FIELDS.created_at(), v))
    }

    pub fn find_by_updated_at(self, op: ScalarOp, v: DateTime<Utc>) -> Self {
        self.filter(Condition::cmp(op, FIELDS.updated_at(), v))
    }

    pub fn find_by_next(self, v: &str) -> Self {
        self.filter(Condition::eq(FIELDS.next(), v))
    }

    pub fn find_by_scm(self, v: &str) -> Self {
        self.filter(Condition::eq(FIELDS.scm(), v))
    }

    pub fn find_by_website(self, v: &str) -> Self {
        self.filter(Condition::eq(FIELDS.website(), v))
    }

    pub fn find_by_name(self, v: &str) -> Self {
        self.filter(Condition::eq(FIELDS.name(), v))
    }

    pub fn find_by_fork_policy(self, v: &str) -> Self {
        self.filter(Condition::eq(FIELDS.fork_policy(), v))
    }

    pub fn find_by_uuid(self, v: &str) -> Self {
        self.filter(Condition::eq(FIELDS.uuid(), v))
    }

    pub fn find_by_language(self, v: &str) -> Self {
        self.filter(Condition::eq(FIELDS.language(), v))
    }

    pub fn find_by_created_on(self, v: &str) -> Self {
        self.filter(Condition::eq(FIELDS.created_on(), v))
    }

    pub fn find_by_full_name(self, v: &str) -> Self {
        self.filter(Condition::eq(FIELDS.full_name(), v))
    }

    pub fn find_by_has_issues(self, v: bool) -> Self {
        self.filter(Condition::eq(FIELDS.has_issues(), v))
    }

    pub fn find_by_updated_on(self, v: &str) -> Self {
        self.filter(Condition::eq(FIELDS.updated_on(), v))
    }

    pub fn find_by_size(self, op: ScalarOp, v: i64) -> Self {
        self.filter(Condition::cmp(op, FIELDS.size(), v))
    }

    pub fn find_by_kind(self, v: &str) -> Self {
        self.filter(Condition::eq(FIELDS.kind(), v))
    }

    pub fn find_by_slug(self, v: &str) -> Self {
        self.filter(Condition::eq(FIELDS.slug(), v))
    }

    pub fn find_by_is_private(self, v: bool) -> Self {
        self.filter(Condition::eq(FIELDS.is_private(), v))
    }

    pub fn find_by_description(self, v: &str) -> Self {
        self.filter(Condition::eq(FIELDS.description(), v))
    }
}

impl From<RepositoryQuery> for Query {
    fn from(q: RepositoryQuery) -> Self {
        q.query
    }
}

// =============================================================================
// Store
// =============================================================================

pub type RepositoryResultSet = ResultSet<Repository>;

/// Store of `Repository` records.
#[derive(Debug, Clone)]
pub struct RepositoryStore {
    store: Store<Repository>,
}

impl RepositoryStore {
    pub fn new(session: Arc<dyn Session>) -> Self {
        Self {
            store: Store::new(session),
        }
    }

    pub fn with_logger(self, logger: Logger) -> Self {
        Self {
            store: self.store.with_logger(logger),
        }
    }

    /// The untyped store underneath.
    pub fn store(&self) -> &Store<Repository> {
        &self.store
    }

    pub fn insert(&self, record: &mut Repository) -> Result<()> {
        self.store.insert(record)
    }

    pub fn update(&self, record: &mut Repository, columns: &[SchemaField]) -> Result<u64> {
        self.store.update(record, columns)
    }

    pub fn save(&self, record: &mut Repository) -> Result<bool> {
        self.store.save(record)
    }

    pub fn delete(&self, record: &mut Repository) -> Result<()> {
        self.store.delete(record)
    }

    pub fn reload(&self, record: &mut Repository) -> Result<()> {
        self.store.reload(record)
    }

    pub fn find(&self, query: RepositoryQuery) -> Result<RepositoryResultSet> {
        self.store.find(query.into())
    }

    pub fn find_one(&self, query: RepositoryQuery) -> Result<Repository> {
        self.store.find_one(query.into())
    }

    pub fn count(&self, query: RepositoryQuery) -> Result<i64> {
        self.store.count(query.into())
    }

    pub fn must_find(&self, query: RepositoryQuery) -> RepositoryResultSet {
        self.store.must_find(query.into())
    }

    pub fn must_find_one(&self, query: RepositoryQuery) -> Repository {
        self.store.must_find_one(query.into())
    }

    pub fn must_count(&self, query: RepositoryQuery) -> i64 {
        self.store.must_count(query.into())
    }

    /// Run `callback` with a store bound to a new transaction.
    pub fn transaction<F, T>(&self, callback: F) -> Result<T>
    where
        F: FnOnce(&RepositoryStore) -> Result<T>,
    {
        self.transaction_with(Some(callback))
    }

    pub fn transaction_with<F, T>(&self, callback: Option<F>) -> Result<T>
    where
        F: FnOnce(&RepositoryStore) -> Result<T>,
    {
        self.store.transaction_with(callback.map(|callback| {
            move |store: &Store<Repository>| {
                callback(&RepositoryStore {
                    store: store.clone(),
                })
            }
        }))
    }
}
