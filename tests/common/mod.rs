//! Shared helpers for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use watchdb::DataEventType;
use watchdb::DataSnapshot;
use watchdb::Database;
use watchdb::DatabaseBuilder;
use watchdb::DatabaseConfig;
use watchdb::DatabaseObserver;
use watchdb::DatabasePath;
use watchdb::DatabaseReference;
use watchdb::RemoteDatabase;
use watchdb::SnapshotCallback;
use watchdb::SubscriptionHandle;
use watchdb::Value;
use watchdb::ValueSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Changed(String, Value),
    Disappeared(String),
}

/// Observer keeping every callback it receives
pub struct RecordingObserver {
    paths: Vec<DatabasePath>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingObserver {
    pub fn new(paths: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            paths: paths.iter().map(|p| p.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Same observer, as registered with the database
    pub fn as_observer(self: &Arc<Self>) -> Arc<dyn DatabaseObserver> {
        self.clone()
    }
}

impl DatabaseObserver for RecordingObserver {
    fn paths(&self) -> Vec<DatabasePath> {
        self.paths.clone()
    }

    fn value_changed(
        &self,
        value: &Value,
        path: &str,
    ) {
        self.calls.lock().push(Call::Changed(path.to_string(), value.clone()));
    }

    fn value_disappeared(
        &self,
        path: &str,
    ) {
        self.calls.lock().push(Call::Disappeared(path.to_string()));
    }
}

/// Remote that only emits events when told to, and records writes
#[derive(Default)]
pub struct ScriptedRemote {
    subscriptions: Mutex<HashMap<u64, (String, Arc<SnapshotCallback>)>>,
    writes: Mutex<Vec<(String, Option<Value>)>>,
    next_handle: AtomicU64,
    persistence: AtomicBool,
}

impl ScriptedRemote {
    pub fn subscriptions_at(
        &self,
        path: &str,
    ) -> usize {
        self.subscriptions.lock().values().filter(|(p, _)| p == path).count()
    }

    pub fn writes(&self) -> Vec<(String, Option<Value>)> {
        self.writes.lock().clone()
    }

    /// Emits `value` on every subscription of `path`
    pub fn emit(
        &self,
        path: &str,
        value: Option<Value>,
    ) {
        let callbacks: Vec<Arc<SnapshotCallback>> = self
            .subscriptions
            .lock()
            .values()
            .filter(|(p, _)| p == path)
            .map(|(_, callback)| callback.clone())
            .collect();

        for callback in callbacks {
            let snapshot: Arc<dyn DataSnapshot> = Arc::new(ValueSnapshot::new(value.clone()));
            callback(snapshot);
        }
    }
}

struct ScriptedDatabase(Arc<ScriptedRemote>);

struct ScriptedReference {
    remote: Arc<ScriptedRemote>,
    path: String,
}

impl RemoteDatabase for ScriptedDatabase {
    fn is_persistence_enabled(&self) -> bool {
        self.0.persistence.load(Ordering::SeqCst)
    }

    fn set_persistence_enabled(
        &self,
        enabled: bool,
    ) {
        self.0.persistence.store(enabled, Ordering::SeqCst);
    }

    fn reference(&self) -> Arc<dyn DatabaseReference> {
        Arc::new(ScriptedReference {
            remote: self.0.clone(),
            path: String::new(),
        })
    }
}

impl DatabaseReference for ScriptedReference {
    fn child(
        &self,
        path: &str,
    ) -> Arc<dyn DatabaseReference> {
        let path = if self.path.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", self.path, path)
        };
        Arc::new(ScriptedReference {
            remote: self.remote.clone(),
            path,
        })
    }

    fn set_value(
        &self,
        value: Option<Value>,
    ) {
        self.remote.writes.lock().push((self.path.clone(), value));
    }

    fn keep_synced(
        &self,
        _keep_synced: bool,
    ) {
    }

    fn observe_event(
        &self,
        _event_type: DataEventType,
        callback: SnapshotCallback,
    ) -> SubscriptionHandle {
        let id = self.remote.next_handle.fetch_add(1, Ordering::Relaxed);
        self.remote
            .subscriptions
            .lock()
            .insert(id, (self.path.clone(), Arc::new(callback)));
        SubscriptionHandle(id)
    }

    fn remove_observer(
        &self,
        handle: SubscriptionHandle,
    ) {
        self.remote.subscriptions.lock().remove(&handle.0);
    }
}

pub fn scripted_database() -> (Arc<ScriptedRemote>, Arc<Database>) {
    let remote = Arc::new(ScriptedRemote::default());
    let database = DatabaseBuilder::new(DatabaseConfig::default())
        .data_source(Arc::new(ScriptedDatabase(remote.clone())))
        .build()
        .expect("build database");
    (remote, Arc::new(database))
}
