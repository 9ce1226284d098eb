//! In-memory realtime database
//!
//! Keeps the whole tree in a single JSON document and behaves like a
//! realtime database client for `Value` subscriptions:
//!
//! - a new subscription immediately receives the current state of its path,
//!   even when nothing is stored there
//! - every write notifies subscriptions at, above, or below the written path
//! - writing `None` or `null` deletes the node and prunes empty parents
//!
//! Callbacks are invoked on the writing thread once the tree locks have been
//! released, but still inside the write serialization: a callback must not
//! write back into the same database synchronously.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use parking_lot::RwLock;
use serde_json::Map;
use tracing::debug;
use tracing::trace;

use super::DataEventType;
use super::DataSnapshot;
use super::DatabaseReference;
use super::RemoteDatabase;
use super::SnapshotCallback;
use super::SubscriptionHandle;
use super::Value;
use super::ValueSnapshot;

struct MemorySubscription {
    segments: Vec<String>,
    event_type: DataEventType,
    callback: Arc<SnapshotCallback>,
}

struct MemoryInner {
    root: RwLock<Value>,
    subscriptions: RwLock<HashMap<u64, MemorySubscription>>,
    synced_paths: Mutex<HashSet<String>>,
    /// Serializes write + notification so every subscriber observes writes in order
    write_lock: Mutex<()>,
    next_handle: AtomicU64,
    persistence_enabled: AtomicBool,
}

/// In-memory [`RemoteDatabase`]
#[derive(Clone)]
pub struct MemoryDatabase {
    inner: Arc<MemoryInner>,
}

impl std::fmt::Debug for MemoryDatabase {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("MemoryDatabase")
            .field("subscriptions", &self.subscription_count())
            .field("persistence_enabled", &self.is_persistence_enabled())
            .finish_non_exhaustive()
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::with_root(Value::Object(Map::new()))
    }

    /// Creates a database pre-populated with `root`
    pub fn with_root(root: Value) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                root: RwLock::new(root),
                subscriptions: RwLock::new(HashMap::new()),
                synced_paths: Mutex::new(HashSet::new()),
                write_lock: Mutex::new(()),
                next_handle: AtomicU64::new(1),
                persistence_enabled: AtomicBool::new(false),
            }),
        }
    }

    /// Current value stored at `path`
    pub fn value_at(
        &self,
        path: &str,
    ) -> Option<Value> {
        let root = self.inner.root.read();
        get_at(&root, &split_path(path)).filter(|v| !v.is_null()).cloned()
    }

    /// Number of live subscriptions, all paths included
    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.read().len()
    }

    /// Number of live subscriptions on exactly `path`
    pub fn subscription_count_at(
        &self,
        path: &str,
    ) -> usize {
        let segments = split_path(path);
        self.inner
            .subscriptions
            .read()
            .values()
            .filter(|s| s.segments == segments)
            .count()
    }

    /// Whether `keep_synced(true)` is in effect for `path`
    pub fn is_synced(
        &self,
        path: &str,
    ) -> bool {
        self.inner.synced_paths.lock().contains(&join_path(&split_path(path)))
    }

    fn root_reference(&self) -> MemoryReference {
        MemoryReference {
            inner: self.inner.clone(),
            segments: Vec::new(),
        }
    }
}

impl RemoteDatabase for MemoryDatabase {
    fn is_persistence_enabled(&self) -> bool {
        self.inner.persistence_enabled.load(Ordering::SeqCst)
    }

    fn set_persistence_enabled(
        &self,
        enabled: bool,
    ) {
        self.inner.persistence_enabled.store(enabled, Ordering::SeqCst);
    }

    fn reference(&self) -> Arc<dyn DatabaseReference> {
        Arc::new(self.root_reference())
    }
}

/// Reference to a location inside a [`MemoryDatabase`]
#[derive(Clone)]
pub struct MemoryReference {
    inner: Arc<MemoryInner>,
    segments: Vec<String>,
}

impl std::fmt::Debug for MemoryReference {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("MemoryReference").field("path", &join_path(&self.segments)).finish()
    }
}

impl MemoryReference {
    fn snapshot(&self) -> Arc<dyn DataSnapshot> {
        let root = self.inner.root.read();
        Arc::new(snapshot_at(&root, &self.segments))
    }
}

impl DatabaseReference for MemoryReference {
    fn child(
        &self,
        path: &str,
    ) -> Arc<dyn DatabaseReference> {
        let mut segments = self.segments.clone();
        segments.extend(split_path(path));
        Arc::new(MemoryReference {
            inner: self.inner.clone(),
            segments,
        })
    }

    fn set_value(
        &self,
        value: Option<Value>,
    ) {
        let _write = self.inner.write_lock.lock();

        {
            let mut root = self.inner.root.write();
            match value.filter(|v| !v.is_null()) {
                Some(value) => insert_at(&mut root, &self.segments, value),
                None => {
                    remove_at(&mut root, &self.segments);
                }
            }
        }

        trace!(path = %join_path(&self.segments), "memory database write");

        // Collect affected subscriptions and their snapshots before calling out
        let notifications: Vec<(Arc<SnapshotCallback>, Arc<dyn DataSnapshot>)> = {
            let root = self.inner.root.read();
            let subscriptions = self.inner.subscriptions.read();
            subscriptions
                .values()
                .filter(|s| s.event_type == DataEventType::Value)
                .filter(|s| is_related(&s.segments, &self.segments))
                .map(|s| {
                    let snapshot: Arc<dyn DataSnapshot> = Arc::new(snapshot_at(&root, &s.segments));
                    (s.callback.clone(), snapshot)
                })
                .collect()
        };

        for (callback, snapshot) in notifications {
            callback(snapshot);
        }
    }

    fn keep_synced(
        &self,
        keep_synced: bool,
    ) {
        let path = join_path(&self.segments);
        let mut synced = self.inner.synced_paths.lock();
        if keep_synced {
            synced.insert(path);
        } else {
            synced.remove(&path);
        }
    }

    fn observe_event(
        &self,
        event_type: DataEventType,
        callback: SnapshotCallback,
    ) -> SubscriptionHandle {
        let _write = self.inner.write_lock.lock();

        let id = self.inner.next_handle.fetch_add(1, Ordering::Relaxed);
        let callback = Arc::new(callback);

        self.inner.subscriptions.write().insert(
            id,
            MemorySubscription {
                segments: self.segments.clone(),
                event_type,
                callback: callback.clone(),
            },
        );

        debug!(
            handle = id,
            path = %join_path(&self.segments),
            ?event_type,
            "memory database subscription opened"
        );

        if event_type == DataEventType::Value {
            callback(self.snapshot());
        }

        SubscriptionHandle(id)
    }

    fn remove_observer(
        &self,
        handle: SubscriptionHandle,
    ) {
        if self.inner.subscriptions.write().remove(&handle.0).is_some() {
            debug!(handle = handle.0, "memory database subscription closed");
        }
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split('/').filter(|s| !s.is_empty()).map(String::from).collect()
}

fn join_path(segments: &[String]) -> String {
    segments.join("/")
}

/// Two locations affect each other when one is an ancestor of (or equal to) the other
fn is_related(
    a: &[String],
    b: &[String],
) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

fn snapshot_at(
    root: &Value,
    segments: &[String],
) -> ValueSnapshot {
    ValueSnapshot::new(get_at(root, segments).cloned())
}

fn get_at<'a>(
    root: &'a Value,
    segments: &[String],
) -> Option<&'a Value> {
    let mut node = root;
    for segment in segments {
        node = match node {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node)
}

fn insert_at(
    root: &mut Value,
    segments: &[String],
    value: Value,
) {
    let mut node = root;
    for segment in segments {
        node = child_mut(node, segment);
    }
    *node = value;
}

/// Child of `node` under `segment`, created when missing.
///
/// Arrays are indexed in place and grow when `segment` is their length. Any
/// other key turns an array into an object keyed by index.
fn child_mut<'a>(
    node: &'a mut Value,
    segment: &str,
) -> &'a mut Value {
    let index = match &*node {
        Value::Array(items) => segment.parse::<usize>().ok().filter(|i| *i <= items.len()),
        _ => None,
    };

    match (index, node) {
        (Some(index), Value::Array(items)) => {
            if index == items.len() {
                items.push(Value::Null);
            }
            &mut items[index]
        }
        (_, node) => object_mut(node)
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new())),
    }
}

/// Objects stay, arrays become index-keyed objects, scalars are replaced
fn object_mut(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        let map = match node.take() {
            Value::Array(items) => index_keyed(items),
            _ => Map::new(),
        };
        *node = Value::Object(map);
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced by an object"),
    }
}

fn index_keyed(items: Vec<Value>) -> Map<String, Value> {
    items
        .into_iter()
        .enumerate()
        .filter(|(_, item)| !item.is_null())
        .map(|(index, item)| (index.to_string(), item))
        .collect()
}

/// Removes the node at `segments`; returns whether `node` is now empty
fn remove_at(
    node: &mut Value,
    segments: &[String],
) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        *node = Value::Object(Map::new());
        return true;
    };

    if let Value::Array(items) = node {
        let Some(index) = first.parse::<usize>().ok().filter(|i| *i < items.len()) else {
            return false;
        };
        if !rest.is_empty() && !remove_at(&mut items[index], rest) {
            return false;
        }

        if index + 1 == items.len() {
            items.pop();
            return items.is_empty();
        }

        // A hole keeps the other indices, so the array becomes an object
        let mut map = index_keyed(std::mem::take(items));
        map.remove(first);
        let is_empty = map.is_empty();
        *node = Value::Object(map);
        return is_empty;
    }

    let Value::Object(map) = node else {
        return false;
    };

    if rest.is_empty() {
        map.remove(first);
    } else if let Some(child) = map.get_mut(first) {
        if remove_at(child, rest) {
            map.remove(first);
        }
    }

    map.is_empty()
}
