//! RunStore - in-memory keyed record store
//!
//! Holds process-lifetime state behind an explicit store abstraction so
//! ownership is visible and testable in isolation. Records are value
//! objects: `create` hands ownership to the store, reads hand back clones,
//! and `update` replaces the stored value wholesale.
//!
//! There is deliberately no per-key mutual exclusion: callers that race two
//! updates against the same id get last-write-wins semantics.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Current time as Unix milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Generate a collision-resistant, creation-time-ordered record id
///
/// Returns `{prefix}_{uuid}` where the UUID is a v7 (timestamp-based) value
/// in simple format, e.g. `run_0190f8a1b2c37d5e8f90abcdef012345`.
pub fn generate_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::now_v7().simple())
}

/// A record that can live in a [`Store`]
pub trait Record: Clone + Send + Sync + 'static {
    /// Unique identifier within the collection
    fn id(&self) -> &str;

    /// Last update timestamp (Unix milliseconds)
    fn updated_at(&self) -> i64;

    /// Collection name, used for logging
    fn collection_name() -> &'static str;
}

/// Errors from store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record already exists: {0}")]
    AlreadyExists(String),

    #[error("record not found: {0}")]
    NotFound(String),
}

/// In-memory store keyed by record id
///
/// Cloning the store clones the handle, not the data; all clones share the
/// same underlying map.
#[derive(Clone)]
pub struct Store<T: Record> {
    records: Arc<RwLock<HashMap<String, T>>>,
}

impl<T: Record> Store<T> {
    /// Create an empty store
    pub fn new() -> Self {
        debug!(collection = T::collection_name(), "Store::new: called");
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a new record, returning its id
    ///
    /// Fails if a record with the same id is already present.
    pub async fn create(&self, record: T) -> Result<String, StoreError> {
        let id = record.id().to_string();
        debug!(collection = T::collection_name(), %id, "Store::create: called");
        let mut records = self.records.write().await;
        if records.contains_key(&id) {
            return Err(StoreError::AlreadyExists(id));
        }
        records.insert(id.clone(), record);
        Ok(id)
    }

    /// Fetch a record by id
    pub async fn get(&self, id: &str) -> Option<T> {
        debug!(collection = T::collection_name(), %id, "Store::get: called");
        self.records.read().await.get(id).cloned()
    }

    /// Replace an existing record
    ///
    /// Fails if no record with the same id exists.
    pub async fn update(&self, record: T) -> Result<(), StoreError> {
        let id = record.id().to_string();
        debug!(collection = T::collection_name(), %id, "Store::update: called");
        let mut records = self.records.write().await;
        if !records.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        records.insert(id, record);
        Ok(())
    }

    /// All records, in arbitrary order
    pub async fn list(&self) -> Vec<T> {
        debug!(collection = T::collection_name(), "Store::list: called");
        self.records.read().await.values().cloned().collect()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl<T: Record> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}
