use rowbind::model::repository::SCHEMA;
use rowbind::model::{Repository, FIELDS};
use rowbind::schema::{ColumnKind, JsonPath, ScalarType, SchemaField, Shape};
use rowbind::sql::json::{JsonKind, PathSegment};
use rowbind::{Error, Record};

#[test]
fn test_repository_schema_identity() {
    let schema = Repository::schema();
    assert_eq!(schema.entity(), "Repository");
    assert_eq!(schema.table(), "bitbucket");
    assert_eq!(schema.alias(), "__repository");
    assert_eq!(schema.id(), "id");
    assert!(schema.foreign_keys().is_empty());
}

#[test]
fn test_column_order_is_stable() {
    assert_eq!(
        SCHEMA.column_names(),
        vec![
            "id",
            "created_at",
            "updated_at",
            "next",
            "scm",
            "website",
            "name",
            "links",
            "fork_policy",
            "uuid",
            "language",
            "created_on",
            "parent",
            "full_name",
            "has_issues",
            "owner",
            "updated_on",
            "size",
            "type",
            "slug",
            "is_private",
            "description",
        ]
    );
}

#[test]
fn test_column_kinds() {
    assert_eq!(
        SCHEMA.column("size").map(|c| c.kind),
        Some(ColumnKind::Scalar(ScalarType::Integer))
    );
    assert_eq!(
        SCHEMA.column("created_at").map(|c| c.kind),
        Some(ColumnKind::Scalar(ScalarType::Timestamp))
    );

    let structured: Vec<&str> = SCHEMA
        .columns()
        .iter()
        .filter(|c| c.is_structured())
        .map(|c| c.name)
        .collect();
    assert_eq!(structured, vec!["links", "parent", "owner"]);
}

#[test]
fn test_links_shape() {
    let Some(ColumnKind::Structured(shape)) = SCHEMA.column("links").map(|c| c.kind) else {
        panic!("links must be structured");
    };
    assert_eq!(
        shape.resolve(&[
            PathSegment::key("clone"),
            PathSegment::Each,
            PathSegment::key("href")
        ]),
        Some(JsonKind::Text)
    );
    assert!(matches!(
        shape,
        Shape::Object(members) if members.len() == 1
    ));
}

#[test]
fn test_field_tree_validates() {
    let fields: Vec<SchemaField> = vec![
        FIELDS.id(),
        FIELDS.slug(),
        FIELDS.kind(),
        FIELDS.links().column(),
        FIELDS.links().clone_links().href(),
        FIELDS.links().clone_links().at(1).name(),
        FIELDS.owner().username(),
        FIELDS.owner().display_name(),
        FIELDS.owner().kind(),
        FIELDS.owner().uuid(),
        FIELDS.parent().kind(),
        FIELDS.parent().name(),
        FIELDS.parent().full_name(),
        FIELDS.parent().uuid(),
    ];
    for field in &fields {
        assert!(SCHEMA.validate(field).is_ok(), "{} should validate", field);
    }
}

#[test]
fn test_validate_rejects_unknown() {
    assert!(matches!(
        SCHEMA.validate(&"stars".into()),
        Err(Error::UnknownColumn { entity: "Repository", column }) if column == "stars"
    ));

    let missing_member = JsonPath::new("owner", vec![PathSegment::key("email")], JsonKind::Text);
    assert!(SCHEMA.validate(&missing_member.into()).is_err());

    let into_scalar = JsonPath::new("slug", vec![PathSegment::key("x")], JsonKind::Text);
    assert!(SCHEMA.validate(&into_scalar.into()).is_err());

    let index_on_object = JsonPath::new("owner", vec![PathSegment::Index(0)], JsonKind::Any);
    assert!(SCHEMA.validate(&index_on_object.into()).is_err());
}

#[test]
fn test_new_record_is_transient() {
    let record = SCHEMA.new_record();
    assert!(!record.state().is_persisted());
    assert!(!record.state().is_writable());
    assert!(record.parent.is_none());
}

#[test]
fn test_debug_lists_columns() {
    let debug = format!("{:?}", *SCHEMA);
    assert!(debug.contains("bitbucket"));
    assert!(debug.contains("\"description\""));
}
