#[path = "../common/mod.rs"]
mod common;

use std::thread;
use std::time::Duration;

use rowbind::driver::DriverError;
use rowbind::model::{RepositoryQuery, RepositoryStore};
use rowbind::{Error, Record, Result};

use common::{repository, store};

#[test]
fn test_commit_on_success() {
    let (_session, store) = store();
    let id = store
        .transaction(|tx| {
            assert!(tx.store().is_in_transaction());
            let mut repo = repository("a", "alice", 1);
            tx.insert(&mut repo)?;
            Ok(repo.id())
        })
        .unwrap();

    assert!(!store.store().is_in_transaction());
    let found = store
        .find_one(RepositoryQuery::new().find_by_id([id]))
        .unwrap();
    assert_eq!(found.slug, "a");
}

#[test]
fn test_rollback_on_error_keeps_count() {
    let (_session, store) = store();
    let mut existing = repository("a", "alice", 1);
    store.insert(&mut existing).unwrap();
    let before = store.must_count(RepositoryQuery::new());

    let result: Result<()> = store.transaction(|tx| {
        let mut repo = repository("b", "bob", 2);
        tx.insert(&mut repo)?;
        tx.delete(&mut existing)?;
        Err(Error::NotFound)
    });

    assert!(matches!(result, Err(Error::NotFound)));
    assert_eq!(store.must_count(RepositoryQuery::new()), before);
    assert!(store
        .find_one(RepositoryQuery::new().find_by_slug("a"))
        .is_ok());
}

#[test]
fn test_missing_callback() {
    let (_session, store) = store();
    let result = store.transaction_with::<fn(&RepositoryStore) -> Result<()>, ()>(None);
    assert!(matches!(result, Err(Error::InvalidTransactionCallback)));
}

#[test]
fn test_nested_transaction_is_rejected() {
    let (_session, store) = store();
    let result = store.transaction(|tx| tx.transaction(|_| Ok(())));
    assert!(matches!(result, Err(Error::NestedTransaction)));
    assert_eq!(store.must_count(RepositoryQuery::new()), 0);
}

#[test]
fn test_reads_inside_transaction_see_writes() {
    let (_session, store) = store();
    let count = store
        .transaction(|tx| {
            let mut repo = repository("a", "alice", 1);
            tx.insert(&mut repo)?;
            assert!(repo.state().is_persisted());
            tx.count(RepositoryQuery::new())
        })
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn test_store_usable_after_rollback() {
    let (_session, store) = store();
    let _ = store.transaction(|_| -> Result<()> { Err(Error::Stop) });

    let mut repo = repository("a", "alice", 1);
    store.insert(&mut repo).unwrap();
    assert_eq!(store.must_count(RepositoryQuery::new()), 1);
}

#[test]
fn test_rollback_keeps_writes_from_other_threads() {
    let (_session, store) = store();
    let outside = store.clone();
    let mut writer = None;

    let result: Result<()> = store.transaction(|tx| {
        let mut repo = repository("inside", "alice", 1);
        tx.insert(&mut repo)?;

        let outside = outside.clone();
        writer = Some(thread::spawn(move || {
            let mut repo = repository("other-caller", "bob", 2);
            outside.insert(&mut repo).is_ok()
        }));
        thread::sleep(Duration::from_millis(50));
        Err(Error::NotFound)
    });

    assert!(matches!(result, Err(Error::NotFound)));
    assert!(writer.expect("writer spawned").join().unwrap());
    assert_eq!(
        store.must_count(RepositoryQuery::new().find_by_slug("other-caller")),
        1
    );
    assert_eq!(
        store.must_count(RepositoryQuery::new().find_by_slug("inside")),
        0
    );
}

#[test]
fn test_concurrent_transactions_run_one_after_another() {
    let (_session, store) = store();
    let outside = store.clone();
    let mut other = None;

    store
        .transaction(|tx| {
            let mut repo = repository("first", "alice", 1);
            tx.insert(&mut repo)?;

            let outside = outside.clone();
            other = Some(thread::spawn(move || {
                outside
                    .transaction(|tx| {
                        let mut repo = repository("second", "bob", 2);
                        tx.insert(&mut repo)?;
                        tx.count(RepositoryQuery::new())
                    })
                    .ok()
            }));
            thread::sleep(Duration::from_millis(50));
            Ok(())
        })
        .unwrap();

    // The second transaction only started once the first had committed.
    assert_eq!(other.expect("transaction spawned").join().unwrap(), Some(2));
    assert_eq!(store.must_count(RepositoryQuery::new()), 2);
}

#[test]
fn test_root_store_inside_callback_is_busy() {
    let (_session, store) = store();

    let result: Result<()> = store.transaction(|tx| {
        let mut repo = repository("inside", "alice", 1);
        tx.insert(&mut repo)?;

        let mut stray = repository("stray", "bob", 2);
        let err = store.insert(&mut stray).unwrap_err();
        assert!(matches!(
            err,
            Error::Collaborator {
                source: DriverError::Busy,
                ..
            }
        ));
        Ok(())
    });

    result.unwrap();
    assert_eq!(store.must_count(RepositoryQuery::new()), 1);
}
