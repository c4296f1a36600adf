//! Shared fixtures for the store tests.
#![allow(dead_code)]

use std::sync::Arc;

use rowbind::driver::SqliteSession;
use rowbind::model::{CloneLink, Links, Owner, Parent, Repository, RepositoryStore};

pub const CREATE_BITBUCKET: &str = "
    CREATE TABLE bitbucket (
        id TEXT PRIMARY KEY,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        next TEXT NOT NULL,
        scm TEXT NOT NULL,
        website TEXT NOT NULL,
        name TEXT NOT NULL,
        links TEXT NOT NULL,
        fork_policy TEXT NOT NULL,
        uuid TEXT NOT NULL,
        language TEXT NOT NULL,
        created_on TEXT NOT NULL,
        parent TEXT,
        full_name TEXT NOT NULL,
        has_issues INTEGER NOT NULL,
        owner TEXT NOT NULL,
        updated_on TEXT NOT NULL,
        size INTEGER NOT NULL,
        type TEXT NOT NULL,
        slug TEXT NOT NULL,
        is_private INTEGER NOT NULL,
        description TEXT NOT NULL
    );
";

pub fn session() -> Arc<SqliteSession> {
    let session = SqliteSession::open_in_memory().unwrap();
    session.execute_batch(CREATE_BITBUCKET).unwrap();
    Arc::new(session)
}

pub fn store() -> (Arc<SqliteSession>, RepositoryStore) {
    let session = session();
    let store = RepositoryStore::new(session.clone());
    (session, store)
}

/// A transient repository owned by `owner`.
pub fn repository(slug: &str, owner: &str, size: i64) -> Repository {
    let mut repo = Repository::new();
    repo.slug = slug.into();
    repo.name = slug.into();
    repo.full_name = format!("{}/{}", owner, slug);
    repo.scm = "git".into();
    repo.language = "rust".into();
    repo.kind = "repository".into();
    repo.fork_policy = "allow_forks".into();
    repo.has_issues = true;
    repo.size = size;
    repo.owner = Owner {
        username: owner.into(),
        display_name: owner.to_uppercase(),
        kind: "user".into(),
        uuid: format!("{{{}}}", owner),
    };
    repo.links = Links {
        clone: vec![
            CloneLink {
                href: format!("https://bitbucket.org/{}/{}.git", owner, slug),
                name: "https".into(),
            },
            CloneLink {
                href: format!("git@bitbucket.org:{}/{}.git", owner, slug),
                name: "ssh".into(),
            },
        ],
    };
    repo
}

/// A fork of `upstream`.
pub fn fork(slug: &str, owner: &str, upstream: &Repository) -> Repository {
    let mut repo = repository(slug, owner, 1);
    repo.parent = Some(Parent {
        kind: "repository".into(),
        name: upstream.name.clone(),
        full_name: upstream.full_name.clone(),
        uuid: upstream.uuid.clone(),
    });
    repo
}

/// Insert every record, in order.
pub fn seed(store: &RepositoryStore, records: &mut [Repository]) {
    for record in records.iter_mut() {
        store.insert(record).unwrap();
    }
}
