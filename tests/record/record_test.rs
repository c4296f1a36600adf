use once_cell::sync::Lazy;
use rowbind::model::repository::SCHEMA;
use rowbind::model::{Owner, Parent, Repository};
use rowbind::record::{Address, Record, RecordState};
use rowbind::schema::{ColumnDescriptor, ScalarType, Schema};
use rowbind::{Error, Result, Value};

/// Minimal entity with a hook that rejects empty titles.
#[derive(Debug, Default)]
struct Note {
    id: i64,
    title: String,
    state: RecordState,
}

static NOTE_COLUMNS: [ColumnDescriptor; 2] = [
    ColumnDescriptor::scalar("id", ScalarType::Integer),
    ColumnDescriptor::scalar("title", ScalarType::Text),
];

static NOTE_SCHEMA: Lazy<Schema<Note>> =
    Lazy::new(|| Schema::new("Note", "notes", "__note", "id", &NOTE_COLUMNS, Note::default));

impl Record for Note {
    fn schema() -> &'static Schema<Self> {
        &NOTE_SCHEMA
    }

    fn id(&self) -> Value {
        Value::Integer(self.id)
    }

    fn address_of(&mut self, column: &str) -> Result<Address<'_>> {
        match column {
            "id" => Ok(Address::scalar(&mut self.id)),
            "title" => Ok(Address::scalar(&mut self.title)),
            _ => Err(Error::unknown_column("Note", column)),
        }
    }

    fn value_of(&self, column: &str) -> Result<Value> {
        match column {
            "id" => Ok(Value::Integer(self.id)),
            "title" => Ok(Value::from(&self.title)),
            _ => Err(Error::unknown_column("Note", column)),
        }
    }

    fn state(&self) -> &RecordState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RecordState {
        &mut self.state
    }

    fn before_save(&mut self) -> Result<()> {
        if self.title.is_empty() {
            return Err(Error::Hook {
                entity: "Note",
                reason: "title is empty".into(),
            });
        }
        Ok(())
    }
}

#[test]
fn test_address_and_value_resolve_together() {
    let mut repo = Repository::new();
    let names = SCHEMA
        .column_names()
        .into_iter()
        .chain(["stars", "owner.username", "", "ID"]);
    for name in names {
        let value_ok = repo.value_of(name).is_ok();
        let address_ok = repo.address_of(name).is_ok();
        assert_eq!(value_ok, address_ok, "column {:?}", name);
        assert_eq!(value_ok, SCHEMA.column(name).is_some(), "column {:?}", name);
    }
}

#[test]
fn test_every_value_scans_back() {
    let mut source = Repository::new();
    source.slug = "rowbind".into();
    source.size = 2048;
    source.is_private = true;
    source.owner = Owner {
        username: "alice".into(),
        ..Owner::default()
    };
    source.parent = Some(Parent {
        full_name: "team/upstream".into(),
        ..Parent::default()
    });

    let mut copy = SCHEMA.new_record();
    for name in SCHEMA.column_names() {
        let value = source.value_of(name).unwrap();
        copy.address_of(name).unwrap().set(value).unwrap();
    }
    assert_eq!(copy, source);
}

#[test]
fn test_parent_none_writes_null_and_reads_none() {
    let mut repo = Repository::new();
    repo.owner.username = "alice".into();
    assert_eq!(repo.value_of("parent").unwrap(), Value::Null);

    repo.parent = Some(Parent::default());
    repo.address_of("parent").unwrap().set(Value::Null).unwrap();
    assert!(repo.parent.is_none());
}

#[test]
fn test_json_column_from_text() {
    let mut repo = Repository::new();
    repo.address_of("owner")
        .unwrap()
        .set(Value::Text(
            r#"{"username":"bob","display_name":"Bob","type":"team","uuid":"{b}"}"#.into(),
        ))
        .unwrap();
    assert_eq!(repo.owner.username, "bob");
    assert_eq!(repo.owner.kind, "team");
}

#[test]
fn test_scan_type_mismatch() {
    let mut repo = Repository::new();
    let err = repo
        .address_of("size")
        .unwrap()
        .set(Value::Text("big".into()))
        .unwrap_err();
    assert_eq!(err.expected, "integer");
}

#[test]
fn test_before_save_stamps_timestamps() {
    let mut repo = Repository::new();
    repo.before_save().unwrap();
    let created = repo.timestamps.created_at;
    assert_eq!(repo.timestamps.updated_at, created);

    repo.before_save().unwrap();
    assert_eq!(repo.timestamps.created_at, created);
    assert!(repo.timestamps.updated_at >= created);
}

#[test]
fn test_relationships_unsupported() {
    let mut repo = Repository::new();
    assert!(matches!(
        repo.new_related("forks"),
        Err(Error::UnsupportedRelationship { entity: "Repository", field }) if field == "forks"
    ));
    assert!(matches!(
        repo.set_related("forks", Vec::new()),
        Err(Error::UnsupportedRelationship { .. })
    ));
}

#[test]
fn test_custom_hook_rejects() {
    let mut note = Note::default();
    assert!(matches!(note.before_save(), Err(Error::Hook { entity: "Note", .. })));
    note.title = "hello".into();
    assert!(note.before_save().is_ok());
}

#[test]
fn test_custom_record_schema() {
    assert_eq!(Note::schema().table(), "notes");
    let mut note = Note::schema().new_record();
    note.address_of("title")
        .unwrap()
        .set(Value::Text("t".into()))
        .unwrap();
    assert_eq!(note.value_of("title").unwrap(), Value::Text("t".into()));
    assert!(note.address_of("body").is_err());
}
