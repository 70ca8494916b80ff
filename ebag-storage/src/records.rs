//! System-of-record seam.
//!
//! The cache-aside accessor only talks to the system of record through
//! suppliers. [`RecordStore`] is the query surface those suppliers call in
//! the demo service; [`InMemoryRecordStore`] stands in for a database.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use ebag_core::{Demo, StorageError, User};

/// Read queries against the system of record.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_demo_by_id(&self, id: i64) -> Result<Option<Demo>, StorageError>;

    /// All demo rows, ordered by id.
    async fn find_demos(&self) -> Result<Vec<Demo>, StorageError>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StorageError>;

    /// One page of a school's users, ordered by id.
    async fn find_users_by_school_id(
        &self,
        school_id: i64,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<User>, StorageError>;
}

#[derive(Debug, Default)]
struct Tables {
    demos: BTreeMap<i64, Demo>,
    users: BTreeMap<i64, User>,
}

/// Record store held in memory.
///
/// Counts every query so callers can tell whether a read reached the
/// system of record or was served from the cache.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    tables: Arc<RwLock<Tables>>,
    queries: Arc<AtomicU64>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with the demo rows the service ships with.
    pub fn seeded() -> Self {
        let store = Self::new();
        if let Ok(mut tables) = store.tables.write() {
            for demo in [
                Demo::new(1, "Biao"),
                Demo::new(2, "Alice"),
                Demo::new(3, "Bob"),
            ] {
                tables.demos.insert(demo.id, demo);
            }
            for user in [
                User::new(1, "biao", Some(1)),
                User::new(2, "alice", Some(1)),
                User::new(3, "bob", Some(2)),
                User::new(4, "carol", None),
            ] {
                tables.users.insert(user.id, user);
            }
        }
        store
    }

    /// Insert or replace a demo row.
    pub fn insert_demo(&self, demo: Demo) -> Result<(), StorageError> {
        let mut tables = self.tables.write().map_err(|_| StorageError::LockPoisoned)?;
        tables.demos.insert(demo.id, demo);
        Ok(())
    }

    /// Insert or replace a user row.
    pub fn insert_user(&self, user: User) -> Result<(), StorageError> {
        let mut tables = self.tables.write().map_err(|_| StorageError::LockPoisoned)?;
        tables.users.insert(user.id, user);
        Ok(())
    }

    /// Number of queries served so far.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    fn read<R>(&self, query: impl FnOnce(&Tables) -> R) -> Result<R, StorageError> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let tables = self.tables.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(query(&tables))
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_demo_by_id(&self, id: i64) -> Result<Option<Demo>, StorageError> {
        self.read(|t| t.demos.get(&id).cloned())
    }

    async fn find_demos(&self) -> Result<Vec<Demo>, StorageError> {
        self.read(|t| t.demos.values().cloned().collect())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StorageError> {
        self.read(|t| t.users.get(&id).cloned())
    }

    async fn find_users_by_school_id(
        &self,
        school_id: i64,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<User>, StorageError> {
        self.read(|t| {
            t.users
                .values()
                .filter(|u| u.school_id == Some(school_id))
                .skip(offset)
                .take(limit)
                .cloned()
                .collect()
        })
    }
}
