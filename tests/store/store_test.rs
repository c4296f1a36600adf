#[path = "../common/mod.rs"]
mod common;

use std::io;
use std::sync::{Arc, Mutex};

use rowbind::config::{LogFormat, LogSettings};
use rowbind::model::{RepositoryQuery, FIELDS};
use rowbind::query::{desc, Condition, ScalarOp};
use rowbind::{Error, Logger, Record, RecordStateError};
use uuid::Uuid;

use common::{fork, repository, seed, store};

#[test]
fn test_insert_then_find_round_trips() {
    let (_session, store) = store();
    let mut upstream = repository("rowbind", "team", 512);
    upstream.description = "row mapping".into();
    upstream.is_private = true;
    let mut forked = fork("rowbind", "alice", &upstream);
    store.insert(&mut upstream).unwrap();
    store.insert(&mut forked).unwrap();

    let found = store
        .find_one(RepositoryQuery::new().find_by_id([upstream.id()]))
        .unwrap();
    assert_eq!(found, upstream);
    assert!(found.parent.is_none());
    assert!(found.state().is_persisted());
    assert!(found.state().is_writable());

    let found = store
        .find_one(RepositoryQuery::new().find_by_id([forked.id()]))
        .unwrap();
    assert_eq!(found, forked);
    assert_eq!(
        found.parent.map(|p| p.full_name),
        Some("team/rowbind".to_string())
    );
}

#[test]
fn test_insert_stamps_and_marks_persisted() {
    let (_session, store) = store();
    let mut repo = repository("a", "alice", 1);
    store.insert(&mut repo).unwrap();

    assert!(repo.state().is_persisted());
    assert!(repo.state().is_writable());
    assert_ne!(repo.timestamps.created_at, <chrono::DateTime<chrono::Utc> as Default>::default());

    let stored = store
        .find_one(RepositoryQuery::new().find_by_slug("a"))
        .unwrap();
    assert_eq!(stored, repo);
}

#[test]
fn test_insert_twice_fails() {
    let (_session, store) = store();
    let mut repo = repository("a", "alice", 1);
    store.insert(&mut repo).unwrap();
    assert!(matches!(
        store.insert(&mut repo),
        Err(Error::RecordState(RecordStateError::AlreadyPersisted))
    ));
}

#[test]
fn test_update_requires_persisted() {
    let (_session, store) = store();
    let mut repo = repository("a", "alice", 1);
    assert!(matches!(
        store.update(&mut repo, &[]),
        Err(Error::RecordState(RecordStateError::NotPersisted))
    ));
}

#[test]
fn test_update_named_columns_only() {
    let (_session, store) = store();
    let mut repo = repository("a", "alice", 1);
    store.insert(&mut repo).unwrap();

    repo.description = "changed".into();
    repo.size = 999;
    let changed = store.update(&mut repo, &[FIELDS.description()]).unwrap();
    assert_eq!(changed, 1);

    let stored = store
        .find_one(RepositoryQuery::new().find_by_id([repo.id()]))
        .unwrap();
    assert_eq!(stored.description, "changed");
    assert_eq!(stored.size, 1);
}

#[test]
fn test_update_rejects_unknown_and_path_columns() {
    let (_session, store) = store();
    let mut repo = repository("a", "alice", 1);
    store.insert(&mut repo).unwrap();

    assert!(matches!(
        store.update(&mut repo, &["stars".into()]),
        Err(Error::UnknownColumn { .. })
    ));
    assert!(matches!(
        store.update(&mut repo, &[FIELDS.owner().username()]),
        Err(Error::UnknownColumn { .. })
    ));
}

#[test]
fn test_partial_fetch_is_not_writable() {
    let (_session, store) = store();
    let mut repo = repository("a", "alice", 7);
    repo.description = "keep me".into();
    store.insert(&mut repo).unwrap();

    let mut partial = store
        .find_one(RepositoryQuery::new().select([FIELDS.slug(), FIELDS.size()]))
        .unwrap();
    assert!(partial.state().is_persisted());
    assert!(!partial.state().is_writable());
    assert!(partial.description.is_empty());

    partial.size = 8;
    assert!(matches!(
        store.update(&mut partial, &[FIELDS.size()]),
        Err(Error::RecordState(RecordStateError::NotWritable))
    ));

    partial.state_mut().force_writable();
    store.update(&mut partial, &[FIELDS.size()]).unwrap();

    let stored = store
        .find_one(RepositoryQuery::new().find_by_id([repo.id()]))
        .unwrap();
    assert_eq!(stored.size, 8);
    assert_eq!(stored.description, "keep me");
}

#[test]
fn test_save_inserts_then_updates() {
    let (_session, store) = store();
    let mut repo = repository("a", "alice", 1);

    assert!(!store.save(&mut repo).unwrap());
    assert!(repo.state().is_persisted());

    repo.language = "go".into();
    assert!(store.save(&mut repo).unwrap());
    assert_eq!(
        store.count(RepositoryQuery::new().find_by_language("go")).unwrap(),
        1
    );
}

#[test]
fn test_delete_and_not_found() {
    let (_session, store) = store();
    let mut repo = repository("a", "alice", 1);
    store.insert(&mut repo).unwrap();

    store.delete(&mut repo).unwrap();
    assert!(!repo.state().is_persisted());
    assert_eq!(store.count(RepositoryQuery::new()).unwrap(), 0);

    assert!(matches!(store.delete(&mut repo), Err(Error::NotFound)));
}

#[test]
fn test_reload_discards_local_changes() {
    let (_session, store) = store();
    let mut repo = repository("a", "alice", 1);
    store.insert(&mut repo).unwrap();

    repo.name = "local".into();
    repo.state_mut().set_writable(false);
    store.reload(&mut repo).unwrap();
    assert_eq!(repo.name, "a");
    assert!(repo.state().is_writable());

    let mut ghost = repository("ghost", "alice", 1);
    assert!(matches!(store.reload(&mut ghost), Err(Error::NotFound)));
}

#[test]
fn test_find_one_empty_is_not_found() {
    let (_session, store) = store();
    let err = store
        .find_one(RepositoryQuery::new().find_by_slug("missing"))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_find_by_id_without_ids_returns_all() {
    let (_session, store) = store();
    seed(
        &store,
        &mut [repository("a", "alice", 1), repository("b", "bob", 2)],
    );
    let all = store
        .find(RepositoryQuery::new().find_by_id(Vec::<Uuid>::new()))
        .unwrap()
        .all()
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn test_count_ignores_limit() {
    let (_session, store) = store();
    seed(
        &store,
        &mut [
            repository("a", "alice", 10),
            repository("b", "alice", 20),
            repository("c", "bob", 30),
        ],
    );
    let q = RepositoryQuery::new()
        .find_by_size(ScalarOp::Gte, 20)
        .limit(1)
        .offset(5);
    assert_eq!(store.count(q).unwrap(), 2);
    assert_eq!(store.must_count(RepositoryQuery::new()), 3);
}

#[test]
fn test_order_limit_offset() {
    let (_session, store) = store();
    seed(
        &store,
        &mut [
            repository("a", "alice", 10),
            repository("b", "alice", 30),
            repository("c", "bob", 20),
        ],
    );
    let slugs: Vec<String> = store
        .must_find(
            RepositoryQuery::new()
                .order([desc(FIELDS.size())])
                .limit(2)
                .offset(1),
        )
        .all()
        .unwrap()
        .into_iter()
        .map(|r| r.slug)
        .collect();
    assert_eq!(slugs, vec!["c", "a"]);
}

#[test]
fn test_query_json_paths() {
    let (_session, store) = store();
    let upstream = repository("core", "team", 100);
    seed(
        &store,
        &mut [
            upstream.clone(),
            fork("core", "alice", &upstream),
            repository("tools", "bob", 5),
        ],
    );

    let by_owner = RepositoryQuery::new().filter(Condition::eq(FIELDS.owner().username(), "bob"));
    assert_eq!(store.must_find_one(by_owner).slug, "tools");

    let forks = RepositoryQuery::new()
        .filter(Condition::eq(FIELDS.parent().full_name(), "team/core"));
    assert_eq!(store.must_find_one(forks).owner.username, "alice");

    let ssh = RepositoryQuery::new().filter(Condition::eq(
        FIELDS.links().clone_links().href(),
        "git@bitbucket.org:bob/tools.git",
    ));
    assert_eq!(store.must_count(ssh), 1);

    let first_is_https = RepositoryQuery::new()
        .filter(Condition::eq(FIELDS.links().clone_links().at(0).name(), "https"));
    assert_eq!(store.must_count(first_is_https), 3);

    let first_is_ssh = RepositoryQuery::new()
        .filter(Condition::eq(FIELDS.links().clone_links().at(0).name(), "ssh"));
    assert_eq!(store.must_count(first_is_ssh), 0);
}

#[test]
fn test_timestamp_comparison() {
    let (_session, store) = store();
    let mut old = repository("old", "alice", 1);
    store.insert(&mut old).unwrap();
    let cutoff = old.timestamps.created_at;

    std::thread::sleep(std::time::Duration::from_millis(5));
    let mut new = repository("new", "alice", 1);
    store.insert(&mut new).unwrap();

    let newer = store
        .must_find(RepositoryQuery::new().find_by_created_at(ScalarOp::Gt, cutoff))
        .all()
        .unwrap();
    assert_eq!(newer.len(), 1);
    assert_eq!(newer[0].slug, "new");
}

#[test]
fn test_driver_failure_carries_context() {
    let (session, store) = store();
    session.execute_batch("DROP TABLE bitbucket").unwrap();

    match store.count(RepositoryQuery::new()) {
        Err(Error::Collaborator {
            entity, operation, ..
        }) => {
            assert_eq!(entity, "Repository");
            assert_eq!(operation, "count");
        }
        other => panic!("expected collaborator error, got {:?}", other),
    }
}

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_statements_are_logged() {
    let capture = Capture::default();
    let sink = capture.clone();
    let settings = LogSettings {
        level: "debug".into(),
        format: LogFormat::Text,
        ..Default::default()
    };
    let logger = Logger::with_writer(&settings, move || sink.clone()).unwrap();

    let (_session, store) = store();
    let store = store.with_logger(logger);
    let mut repo = repository("a", "alice", 1);
    store.insert(&mut repo).unwrap();

    let out = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
    assert!(out.contains("Repository insert: INSERT INTO \"bitbucket\""));
    assert!(out.contains("(22 params)"));
}
