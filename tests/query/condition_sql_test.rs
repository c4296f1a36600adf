use chrono::{TimeZone, Utc};
use insta::assert_snapshot;
use rowbind::model::{Repository, FIELDS};
use rowbind::query::{Condition, ScalarOp};
use rowbind::schema::{JsonPath, Schema};
use rowbind::sql::json::{JsonKind, PathSegment};
use rowbind::{Dialect, Error, Record, Value};

fn schema() -> &'static Schema<Repository> {
    Repository::schema()
}

fn render(cond: &Condition, dialect: Dialect) -> (String, Vec<Value>) {
    let stmt = cond
        .to_expr(schema())
        .unwrap()
        .expect("condition restricts")
        .to_tokens_for_dialect(dialect)
        .to_statement(dialect);
    (stmt.sql, stmt.params)
}

#[test]
fn test_eq_on_column() {
    let (sql, params) = render(&Condition::eq(FIELDS.slug(), "rowbind"), Dialect::Sqlite);
    assert_snapshot!(sql, @r#""__repository"."slug" = ?"#);
    assert_eq!(params, vec![Value::Text("rowbind".into())]);
}

#[test]
fn test_comparisons() {
    let since = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let cond = Condition::gt(FIELDS.created_at(), since)
        .and(Condition::lte(FIELDS.size(), 1024i64))
        .and(Condition::cmp(ScalarOp::Lt, FIELDS.updated_at(), since));

    let (sql, params) = render(&cond, Dialect::Postgres);
    assert_snapshot!(sql, @r#""__repository"."created_at" > $1 AND "__repository"."size" <= $2 AND "__repository"."updated_at" < $3"#);
    assert_eq!(
        params,
        vec![
            Value::Timestamp(since),
            Value::Integer(1024),
            Value::Timestamp(since)
        ]
    );
}

#[test]
fn test_in_list() {
    let cond = Condition::is_in(FIELDS.language(), ["rust", "go"]);
    let (sql, params) = render(&cond, Dialect::Sqlite);
    assert_snapshot!(sql, @r#""__repository"."language" IN (?, ?)"#);
    assert_eq!(params.len(), 2);
}

#[test]
fn test_empty_in_does_not_restrict() {
    let cond = Condition::is_in(FIELDS.language(), Vec::<String>::new());
    assert!(cond.to_expr(schema()).unwrap().is_none());

    let cond = Condition::eq(FIELDS.scm(), "git").and(cond);
    let (sql, _) = render(&cond, Dialect::Sqlite);
    assert_snapshot!(sql, @r#""__repository"."scm" = ?"#);
}

#[test]
fn test_empty_in_still_validates_field() {
    let cond = Condition::is_in("stars", Vec::<i64>::new());
    assert!(matches!(
        cond.to_expr(schema()),
        Err(Error::UnknownColumn { .. })
    ));
}

#[test]
fn test_json_member_sqlite_and_postgres() {
    let cond = Condition::eq(FIELDS.parent().full_name(), "team/upstream");

    let (sql, _) = render(&cond, Dialect::Sqlite);
    assert_snapshot!(sql, @r#"json_extract("__repository"."parent", '$.full_name') = ?"#);

    let (sql, _) = render(&cond, Dialect::Postgres);
    assert_snapshot!(sql, @r#"("__repository"."parent" #>> '{full_name}') = $1"#);
}

#[test]
fn test_indexed_array_member() {
    let cond = Condition::eq(FIELDS.links().clone_links().at(0).name(), "https");

    let (sql, _) = render(&cond, Dialect::Sqlite);
    assert_snapshot!(sql, @r#"json_extract("__repository"."links", '$.clone[0].name') = ?"#);

    let (sql, _) = render(&cond, Dialect::Postgres);
    assert_snapshot!(sql, @r#"("__repository"."links" #>> '{clone,0,name}') = $1"#);
}

#[test]
fn test_any_array_member() {
    let cond = Condition::eq(FIELDS.links().clone_links().name(), "ssh");

    let (sql, params) = render(&cond, Dialect::Sqlite);
    assert_snapshot!(sql, @r#"EXISTS (SELECT 1 FROM json_each("__repository"."links", '$.clone') AS "je" WHERE json_extract("je"."value", '$.name') = ?)"#);
    assert_eq!(params, vec![Value::Text("ssh".into())]);

    let (sql, _) = render(&cond, Dialect::Postgres);
    assert_snapshot!(sql, @r#"EXISTS (SELECT 1 FROM jsonb_array_elements(("__repository"."links" #> '{clone}')) AS "je"("value") WHERE ("je"."value" #>> '{name}') = $1)"#);
}

#[test]
fn test_numeric_path_is_cast_on_postgres() {
    let path = JsonPath::new("owner", vec![PathSegment::key("uuid")], JsonKind::Number);
    let cond = Condition::gt(path, 3i64);
    let (sql, _) = render(&cond, Dialect::Postgres);
    assert_snapshot!(sql, @r#"("__repository"."owner" #>> '{uuid}')::numeric > $1"#);
}

#[test]
fn test_path_not_in_shape_is_rejected() {
    let path = JsonPath::new("links", vec![PathSegment::key("avatar")], JsonKind::Text);
    let cond = Condition::eq(path, "x");
    assert!(matches!(
        cond.to_expr(schema()),
        Err(Error::UnknownColumn { column, .. }) if column == "links.avatar"
    ));
}

#[test]
fn test_nested_and_uses_every_term() {
    let cond = Condition::eq(FIELDS.scm(), "git")
        .and(Condition::eq(FIELDS.is_private(), false).and(Condition::eq(FIELDS.kind(), "repository")));
    let (_, params) = render(&cond, Dialect::Sqlite);
    assert_eq!(
        params,
        vec![
            Value::Text("git".into()),
            Value::Bool(false),
            Value::Text("repository".into())
        ]
    );
}
