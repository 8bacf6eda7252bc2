// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// redb-backed persistent store.
//
// Uses redb (pure Rust, B-tree, ACID, single-file database) to persist DSS
// entities. No C/C++ dependencies.
//
// # Design
//
// - One table per entity kind mapping id -> JSON row.
// - One multimap table per spatial kind mapping cell id -> entity ids, used
//   to narrow intersection search before the exact time/altitude check.
// - A multimap from subscription id -> dependent operational intent ids.
// - Every `transact` attempt is a single redb write transaction. redb
//   serialises writers, so attempts never conflict with each other; the
//   retry path exists for the `Store` contract.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dss_geo::IndexedVolume4D;
use dss_models::{
    Constraint, EntityId, Manager, OperationalIntent, SpatialEntity, Subscription,
    UssAvailabilityStatus,
};
use redb::{
    Database, MultimapTableDefinition, ReadableMultimapTable, ReadableTable, TableDefinition,
    WriteTransaction,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Retryable, StorageError};
use crate::repository::{
    AvailabilityRepo, ConstraintRepo, OperationalIntentRepo, Repository, SubscriptionRepo,
};
use crate::store::{join_error, run_with_retry, Store, StoreConfig};

type RowTable = TableDefinition<'static, &'static str, &'static [u8]>;
type CellTable = MultimapTableDefinition<'static, u64, &'static str>;

/// Row and cell-index tables of one entity kind.
#[derive(Clone, Copy)]
struct EntityTables {
    rows: RowTable,
    cells: CellTable,
}

const OPERATIONAL_INTENTS: EntityTables = EntityTables {
    rows: TableDefinition::new("operational_intents"),
    cells: MultimapTableDefinition::new("operational_intent_cells"),
};

const CONSTRAINTS: EntityTables = EntityTables {
    rows: TableDefinition::new("constraints"),
    cells: MultimapTableDefinition::new("constraint_cells"),
};

const SUBSCRIPTIONS: EntityTables = EntityTables {
    rows: TableDefinition::new("subscriptions"),
    cells: MultimapTableDefinition::new("subscription_cells"),
};

/// Subscription id -> ids of operational intents relying on it.
const DEPENDENTS: MultimapTableDefinition<&str, &str> =
    MultimapTableDefinition::new("subscription_dependents");

/// Manager -> JSON availability record.
const AVAILABILITY: TableDefinition<&str, &[u8]> = TableDefinition::new("uss_availability");

fn backend<E: std::fmt::Display>(context: &'static str) -> impl Fn(E) -> StorageError {
    move |e| StorageError::BackendUnavailable(format!("{context}: {e}"))
}

fn corrupted<E: std::fmt::Display>(context: &'static str) -> impl Fn(E) -> StorageError {
    move |e| StorageError::CorruptedData(format!("{context}: {e}"))
}

fn read_row<T: DeserializeOwned>(
    txn: &WriteTransaction,
    table: RowTable,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let table = txn.open_table(table).map_err(backend("open table"))?;
    let row = table.get(key).map_err(corrupted("get"))?;
    match row {
        Some(bytes) => Ok(Some(serde_json::from_slice(bytes.value())?)),
        None => Ok(None),
    }
}

fn write_row<T: Serialize>(
    txn: &WriteTransaction,
    table: RowTable,
    key: &str,
    row: &T,
) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec(row)?;
    let mut table = txn.open_table(table).map_err(backend("open table"))?;
    table
        .insert(key, bytes.as_slice())
        .map_err(corrupted("insert"))?;
    Ok(())
}

fn remove_row(txn: &WriteTransaction, table: RowTable, key: &str) -> Result<bool, StorageError> {
    let mut table = txn.open_table(table).map_err(backend("open table"))?;
    let existed = table.remove(key).map_err(corrupted("remove"))?.is_some();
    Ok(existed)
}

fn index_cells<T: SpatialEntity>(
    txn: &WriteTransaction,
    tables: EntityTables,
    row: &T,
    insert: bool,
) -> Result<(), StorageError> {
    let mut index = txn
        .open_multimap_table(tables.cells)
        .map_err(backend("open cell index"))?;
    let id = row.id().as_str();
    for cell in row.extent().cells.iter() {
        if insert {
            index.insert(cell.id(), id).map_err(corrupted("index cell"))?;
        } else {
            index.remove(cell.id(), id).map_err(corrupted("unindex cell"))?;
        }
    }
    Ok(())
}

fn upsert_entity<T>(
    txn: &WriteTransaction,
    tables: EntityTables,
    row: &T,
) -> Result<Option<T>, StorageError>
where
    T: SpatialEntity + Serialize + DeserializeOwned,
{
    let key = row.id().as_str();
    let old: Option<T> = read_row(txn, tables.rows, key)?;
    if let Some(old) = &old {
        index_cells(txn, tables, old, false)?;
    }
    write_row(txn, tables.rows, key, row)?;
    index_cells(txn, tables, row, true)?;
    Ok(old)
}

fn delete_entity<T>(
    txn: &WriteTransaction,
    tables: EntityTables,
    id: &EntityId,
) -> Result<Option<T>, StorageError>
where
    T: SpatialEntity + DeserializeOwned,
{
    let old: Option<T> = read_row(txn, tables.rows, id.as_str())?;
    if let Some(old) = &old {
        index_cells(txn, tables, old, false)?;
        remove_row(txn, tables.rows, id.as_str())?;
    }
    Ok(old)
}

fn search_entities<T>(
    txn: &WriteTransaction,
    tables: EntityTables,
    volume: &IndexedVolume4D,
) -> Result<Vec<T>, StorageError>
where
    T: SpatialEntity + DeserializeOwned,
{
    let mut candidates = BTreeSet::new();
    {
        let index = txn
            .open_multimap_table(tables.cells)
            .map_err(backend("open cell index"))?;
        for cell in volume.cells.iter() {
            let ids = index.get(cell.id()).map_err(corrupted("cell lookup"))?;
            for id in ids {
                let id = id.map_err(corrupted("cell entry"))?;
                candidates.insert(id.value().to_string());
            }
        }
    }

    let mut found = Vec::new();
    for id in candidates {
        let row: T = read_row(txn, tables.rows, &id)?.ok_or_else(|| {
            StorageError::CorruptedData(format!("cell index points at missing row {id}"))
        })?;
        if row.extent().intersects(volume) {
            found.push(row);
        }
    }
    Ok(found)
}

fn list_expired<T>(
    txn: &WriteTransaction,
    tables: EntityTables,
    threshold: DateTime<Utc>,
) -> Result<Vec<T>, StorageError>
where
    T: SpatialEntity + DeserializeOwned,
{
    let table = txn.open_table(tables.rows).map_err(backend("open table"))?;
    let mut expired = Vec::new();
    for entry in table.iter().map_err(corrupted("scan"))? {
        let (_, bytes) = entry.map_err(corrupted("scan entry"))?;
        let row: T = serde_json::from_slice(bytes.value())?;
        if row.is_expired(threshold) {
            expired.push(row);
        }
    }
    Ok(expired)
}

/// Repository view over one open redb write transaction.
struct RedbTxn<'a> {
    txn: &'a WriteTransaction,
}

impl OperationalIntentRepo for RedbTxn<'_> {
    fn get_operational_intent(
        &self,
        id: &EntityId,
    ) -> Result<Option<OperationalIntent>, StorageError> {
        read_row(self.txn, OPERATIONAL_INTENTS.rows, id.as_str())
    }

    fn upsert_operational_intent(
        &mut self,
        operational_intent: OperationalIntent,
    ) -> Result<OperationalIntent, StorageError> {
        let old: Option<OperationalIntent> =
            upsert_entity(self.txn, OPERATIONAL_INTENTS, &operational_intent)?;

        let mut dependents = self
            .txn
            .open_multimap_table(DEPENDENTS)
            .map_err(backend("open dependents"))?;
        let id = operational_intent.id.as_str();
        if let Some(old) = &old {
            dependents
                .remove(old.subscription_id.as_str(), id)
                .map_err(corrupted("unlink dependent"))?;
        }
        dependents
            .insert(operational_intent.subscription_id.as_str(), id)
            .map_err(corrupted("link dependent"))?;
        Ok(operational_intent)
    }

    fn delete_operational_intent(&mut self, id: &EntityId) -> Result<bool, StorageError> {
        let old: Option<OperationalIntent> = delete_entity(self.txn, OPERATIONAL_INTENTS, id)?;
        let Some(old) = old else {
            return Ok(false);
        };
        let mut dependents = self
            .txn
            .open_multimap_table(DEPENDENTS)
            .map_err(backend("open dependents"))?;
        dependents
            .remove(old.subscription_id.as_str(), id.as_str())
            .map_err(corrupted("unlink dependent"))?;
        Ok(true)
    }

    fn search_operational_intents(
        &self,
        volume: &IndexedVolume4D,
    ) -> Result<Vec<OperationalIntent>, StorageError> {
        search_entities(self.txn, OPERATIONAL_INTENTS, volume)
    }

    fn get_dependent_operational_intents(
        &self,
        subscription_id: &EntityId,
    ) -> Result<Vec<EntityId>, StorageError> {
        let dependents = self
            .txn
            .open_multimap_table(DEPENDENTS)
            .map_err(backend("open dependents"))?;
        let mut ids = Vec::new();
        for entry in dependents
            .get(subscription_id.as_str())
            .map_err(corrupted("dependents lookup"))?
        {
            let entry = entry.map_err(corrupted("dependent entry"))?;
            ids.push(EntityId::parse(entry.value()).map_err(corrupted("dependent id"))?);
        }
        Ok(ids)
    }

    fn list_expired_operational_intents(
        &self,
        threshold: DateTime<Utc>,
    ) -> Result<Vec<OperationalIntent>, StorageError> {
        list_expired(self.txn, OPERATIONAL_INTENTS, threshold)
    }
}

impl ConstraintRepo for RedbTxn<'_> {
    fn get_constraint(&self, id: &EntityId) -> Result<Option<Constraint>, StorageError> {
        read_row(self.txn, CONSTRAINTS.rows, id.as_str())
    }

    fn upsert_constraint(&mut self, constraint: Constraint) -> Result<Constraint, StorageError> {
        upsert_entity::<Constraint>(self.txn, CONSTRAINTS, &constraint)?;
        Ok(constraint)
    }

    fn delete_constraint(&mut self, id: &EntityId) -> Result<bool, StorageError> {
        let old: Option<Constraint> = delete_entity(self.txn, CONSTRAINTS, id)?;
        Ok(old.is_some())
    }

    fn search_constraints(
        &self,
        volume: &IndexedVolume4D,
    ) -> Result<Vec<Constraint>, StorageError> {
        search_entities(self.txn, CONSTRAINTS, volume)
    }
}

impl SubscriptionRepo for RedbTxn<'_> {
    fn get_subscription(&self, id: &EntityId) -> Result<Option<Subscription>, StorageError> {
        read_row(self.txn, SUBSCRIPTIONS.rows, id.as_str())
    }

    fn upsert_subscription(
        &mut self,
        subscription: Subscription,
    ) -> Result<Subscription, StorageError> {
        upsert_entity::<Subscription>(self.txn, SUBSCRIPTIONS, &subscription)?;
        Ok(subscription)
    }

    fn delete_subscription(&mut self, id: &EntityId) -> Result<bool, StorageError> {
        let old: Option<Subscription> = delete_entity(self.txn, SUBSCRIPTIONS, id)?;
        Ok(old.is_some())
    }

    fn search_subscriptions(
        &self,
        volume: &IndexedVolume4D,
    ) -> Result<Vec<Subscription>, StorageError> {
        search_entities(self.txn, SUBSCRIPTIONS, volume)
    }

    fn increment_notification_indices(
        &mut self,
        ids: &[EntityId],
    ) -> Result<Vec<u64>, StorageError> {
        let mut indices = Vec::with_capacity(ids.len());
        for id in ids {
            let mut sub: Subscription = read_row(self.txn, SUBSCRIPTIONS.rows, id.as_str())?
                .ok_or_else(|| {
                    StorageError::CorruptedData(format!("subscription {id} vanished during notify"))
                })?;
            sub.notification_index += 1;
            write_row(self.txn, SUBSCRIPTIONS.rows, id.as_str(), &sub)?;
            indices.push(sub.notification_index);
        }
        Ok(indices)
    }

    fn list_expired_subscriptions(
        &self,
        threshold: DateTime<Utc>,
    ) -> Result<Vec<Subscription>, StorageError> {
        list_expired(self.txn, SUBSCRIPTIONS, threshold)
    }
}

impl AvailabilityRepo for RedbTxn<'_> {
    fn get_uss_availability(
        &self,
        manager: &Manager,
    ) -> Result<Option<UssAvailabilityStatus>, StorageError> {
        read_row(self.txn, AVAILABILITY, manager.as_str())
    }

    fn upsert_uss_availability(
        &mut self,
        status: UssAvailabilityStatus,
    ) -> Result<UssAvailabilityStatus, StorageError> {
        write_row(self.txn, AVAILABILITY, status.manager.as_str(), &status)?;
        Ok(status)
    }
}

/// A persistent [`Store`] powered by redb.
///
/// Thread-safe: `Database` is `Send + Sync` and handles internal locking.
///
/// # Example
///
/// ```rust,no_run
/// use dss_storage::redb_backend::RedbStore;
/// use dss_storage::{Repository, StorageError, Store};
///
/// # tokio_test::block_on(async {
/// let store = RedbStore::open("/tmp/dss-test.redb").unwrap();
/// let expired = store
///     .transact(|repo: &mut dyn Repository| {
///         repo.list_expired_subscriptions(chrono::Utc::now())
///     })
///     .await
///     .unwrap();
/// println!("{} expired subscriptions", expired.len());
/// # });
/// ```
pub struct RedbStore {
    /// The redb database handle.
    db: Arc<Database>,
    /// Path to the database file (for diagnostics).
    path: PathBuf,
    config: StoreConfig,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    ///
    /// Creates the file and parent directories if they don't exist. Tables
    /// are created on first use.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::open_with_config(path, StoreConfig::default())
    }

    pub fn open_with_config(
        path: impl AsRef<Path>,
        config: StoreConfig,
    ) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(&path).map_err(|e| {
            StorageError::BackendUnavailable(format!(
                "failed to open redb at {}: {}",
                path.display(),
                e
            ))
        })?;

        debug!(path = %path.display(), "opened redb store");

        Ok(Self {
            db: Arc::new(db),
            path,
            config,
        })
    }

    /// Return the filesystem path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("path", &self.path)
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl Store for RedbStore {
    async fn transact<T, E, F>(&self, mut body: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StorageError> + Retryable + Send + 'static,
        F: FnMut(&mut dyn Repository) -> Result<T, E> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let max_retries = self.config.max_retries;

        tokio::task::spawn_blocking(move || {
            run_with_retry("redb", max_retries, || {
                let txn = db.begin_write().map_err(backend("write txn"))?;
                let result = {
                    let mut repo = RedbTxn { txn: &txn };
                    body(&mut repo)
                };
                match result {
                    Ok(value) => {
                        txn.commit().map_err(corrupted("commit"))?;
                        Ok(value)
                    }
                    Err(err) => {
                        if let Err(abort_err) = txn.abort() {
                            warn!(error = %abort_err, "redb abort failed");
                        }
                        Err(err)
                    }
                }
            })
        })
        .await
        .unwrap_or_else(|e| Err(join_error(e)))
    }

    fn name(&self) -> &str {
        "redb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{oi_at, subscription_at, volume_at};
    use tempfile::tempdir;

    /// Uses `tempdir()` so the directory outlives the open database.
    fn temp_store() -> (RedbStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.redb");
        let store = RedbStore::open(&path).unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_basic_crud() {
        let (store, _dir) = temp_store();
        let oi = oi_at(37.0, -122.0);
        let id = oi.id.clone();
        let expected = oi.clone();

        store
            .transact(move |repo: &mut dyn Repository| repo.upsert_operational_intent(oi.clone()))
            .await
            .unwrap();

        let fetched = {
            let id = id.clone();
            store
                .transact(move |repo: &mut dyn Repository| repo.get_operational_intent(&id))
                .await
                .unwrap()
        };
        assert_eq!(fetched, Some(expected));

        let deleted = store
            .transact(move |repo: &mut dyn Repository| {
                let first = repo.delete_operational_intent(&id)?;
                let second = repo.delete_operational_intent(&id)?;
                Ok::<_, StorageError>((first, second))
            })
            .await
            .unwrap();
        assert_eq!(deleted, (true, false));
    }

    #[tokio::test]
    async fn test_search_and_dependents() {
        let (store, _dir) = temp_store();
        let sub = subscription_at(37.0, -122.0);
        let mut here = oi_at(37.0, -122.0);
        here.subscription_id = sub.id.clone();
        let elsewhere = oi_at(48.0, 11.0);
        let here_id = here.id.clone();

        let (found, subs, dependents) = store
            .transact(move |repo: &mut dyn Repository| {
                repo.upsert_subscription(sub.clone())?;
                repo.upsert_operational_intent(here.clone())?;
                repo.upsert_operational_intent(elsewhere.clone())?;
                let area = volume_at(37.0, -122.0);
                Ok::<_, StorageError>((
                    repo.search_operational_intents(&area)?,
                    repo.search_subscriptions(&area)?,
                    repo.get_dependent_operational_intents(&sub.id)?,
                ))
            })
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, here_id);
        assert_eq!(subs.len(), 1);
        assert_eq!(dependents, vec![here_id]);
    }

    #[tokio::test]
    async fn test_error_aborts() {
        let (store, _dir) = temp_store();
        let oi = oi_at(37.0, -122.0);
        let id = oi.id.clone();

        let result: Result<(), StorageError> = store
            .transact(move |repo: &mut dyn Repository| {
                repo.upsert_operational_intent(oi.clone())?;
                Err(StorageError::CorruptedData("abort".to_string()))
            })
            .await;
        assert!(result.is_err());

        let fetched = store
            .transact(move |repo: &mut dyn Repository| repo.get_operational_intent(&id))
            .await
            .unwrap();
        assert_eq!(fetched, None);
    }

    #[tokio::test]
    async fn test_notification_indices_persist() {
        let (store, _dir) = temp_store();
        let sub = subscription_at(37.0, -122.0);
        let id = sub.id.clone();

        let indices = store
            .transact(move |repo: &mut dyn Repository| {
                repo.upsert_subscription(sub.clone())?;
                repo.increment_notification_indices(&[sub.id.clone()])
            })
            .await
            .unwrap();
        assert_eq!(indices, vec![1]);

        let stored = store
            .transact(move |repo: &mut dyn Repository| repo.get_subscription(&id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.notification_index, 1);
    }

    #[tokio::test]
    async fn test_persistence_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("persist-test.redb");
        let oi = oi_at(37.0, -122.0);
        let id = oi.id.clone();

        {
            let store = RedbStore::open(&path).unwrap();
            store
                .transact(move |repo: &mut dyn Repository| {
                    repo.upsert_operational_intent(oi.clone())
                })
                .await
                .unwrap();
        }

        {
            let store = RedbStore::open(&path).unwrap();
            let found = store
                .transact(|repo: &mut dyn Repository| {
                    repo.search_operational_intents(&volume_at(37.0, -122.0))
                })
                .await
                .unwrap();
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].id, id);
        }
    }
}
