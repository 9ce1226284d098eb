use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::bounded;
use crossbeam_channel::unbounded;
use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use parking_lot::MutexGuard;
use tracing::debug;
use tracing::error;
use tracing::trace;
use tracing::warn;

use super::delivery::delivery_channel;
use super::delivery::run_delivery_worker;
use super::delivery::DeliveryKind;
use super::delivery::DeliveryTask;
use super::storage::ObserverEntry;
use super::storage::ObserversStorage;
use super::DatabaseObserver;
use super::DatabasePath;
use super::ObserverId;
use crate::constants::DELIVERY_WORKER_THREAD_NAME;
use crate::constants::EVENT_DISPATCHER_THREAD_NAME;
use crate::remote::DataEventType;
use crate::remote::DataSnapshot;
use crate::remote::DatabaseReference;
use crate::remote::RemoteDatabase;
use crate::remote::SnapshotCallback;
use crate::remote::SubscriptionHandle;
use crate::remote::Value;
use crate::DatabaseConfig;
use crate::DatabaseError;
use crate::Result;

/// Work item for the event dispatcher
enum DispatchEvent {
    /// Remote event received by the subscription opened with `sequence`
    Snapshot {
        path: DatabasePath,
        sequence: u64,
        snapshot: Arc<dyn DataSnapshot>,
    },
    /// Forwarded to the delivery queue once every earlier event is applied
    Flush(Sender<()>),
}

/// Live remote subscription for one path
struct ActiveSubscription {
    reference: Arc<dyn DatabaseReference>,
    handle: SubscriptionHandle,
    /// Local generation; events carrying another sequence are stale
    sequence: u64,
}

/// Structural state, only ever touched under `DatabaseInner::state`
#[derive(Default)]
struct DatabaseState {
    storages: HashMap<DatabasePath, ObserversStorage>,
    snapshots: HashMap<DatabasePath, Arc<dyn DataSnapshot>>,
    subscriptions: HashMap<DatabasePath, ActiveSubscription>,
}

struct DatabaseInner {
    remote: Arc<dyn RemoteDatabase>,
    state: Mutex<DatabaseState>,
    event_sender: Sender<DispatchEvent>,
    delivery_sender: Sender<DeliveryTask>,
    next_sequence: AtomicU64,
    config: DatabaseConfig,
}

struct Workers {
    dispatcher: Option<JoinHandle<()>>,
    delivery: Option<JoinHandle<()>>,
    shutdown: Vec<Sender<()>>,
}

/// Builder for [`Database`]
///
/// # Example
///
/// ```ignore
/// let database = DatabaseBuilder::new(config.database.clone())
///     .data_source(Arc::new(MemoryDatabase::new()))
///     .build()?;
/// ```
pub struct DatabaseBuilder {
    config: DatabaseConfig,
    data_source: Option<Arc<dyn RemoteDatabase>>,
}

impl DatabaseBuilder {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            data_source: None,
        }
    }

    /// Remote database the facade observes and writes to
    pub fn data_source(
        mut self,
        data_source: Arc<dyn RemoteDatabase>,
    ) -> Self {
        self.data_source = Some(data_source);
        self
    }

    /// Builds the facade and starts its dispatcher and delivery threads.
    ///
    /// # Errors
    ///
    /// Building without a data source is a fatal configuration error.
    pub fn build(self) -> Result<Database> {
        let Some(remote) = self.data_source else {
            error!("Database data source is not set, set it with DatabaseBuilder::data_source");
            return Err(DatabaseError::MissingDataSource.into());
        };

        remote.set_persistence_enabled(self.config.persistence_enabled);

        let (event_sender, event_receiver) = unbounded();
        let (delivery_sender, delivery_receiver) = delivery_channel(self.config.delivery_queue_size);

        let inner = Arc::new(DatabaseInner {
            remote,
            state: Mutex::new(DatabaseState::default()),
            event_sender,
            delivery_sender,
            next_sequence: AtomicU64::new(1),
            config: self.config,
        });

        let (delivery_shutdown_tx, delivery_shutdown_rx) = bounded(1);
        let delivery = std::thread::Builder::new()
            .name(DELIVERY_WORKER_THREAD_NAME.into())
            .spawn(move || run_delivery_worker(delivery_receiver, delivery_shutdown_rx))
            .map_err(|source| DatabaseError::ThreadSpawn {
                name: DELIVERY_WORKER_THREAD_NAME,
                source,
            })?;

        let (dispatcher_shutdown_tx, dispatcher_shutdown_rx) = bounded(1);
        let dispatcher_inner = inner.clone();
        let dispatcher = std::thread::Builder::new()
            .name(EVENT_DISPATCHER_THREAD_NAME.into())
            .spawn(move || run_dispatcher(dispatcher_inner, event_receiver, dispatcher_shutdown_rx))
            .map_err(|source| {
                let _ = delivery_shutdown_tx.send(());
                DatabaseError::ThreadSpawn {
                    name: EVENT_DISPATCHER_THREAD_NAME,
                    source,
                }
            })?;

        Ok(Database {
            inner,
            workers: Mutex::new(Workers {
                dispatcher: Some(dispatcher),
                delivery: Some(delivery),
                shutdown: vec![dispatcher_shutdown_tx, delivery_shutdown_tx],
            }),
        })
    }
}

/// Path-keyed observation facade over a [`RemoteDatabase`]
///
/// - one remote subscription per observed path, opened with the first
///   observer and closed with the last one
/// - the last snapshot of every open subscription is cached; observers joining
///   later receive it right away
/// - remote events are applied by a dispatcher thread and fanned out to every
///   observer of the path through the delivery queue
///
/// # Thread Safety
///
/// All methods can be called from any thread. Observer callbacks run on the
/// delivery worker thread and may write values. Adding or removing observers
/// from a callback requires an unbounded delivery queue
/// (`delivery_queue_size = 0`): the worker cannot drain its own queue while
/// waiting for the database lock.
pub struct Database {
    inner: Arc<DatabaseInner>,
    workers: Mutex<Workers>,
}

impl std::fmt::Debug for Database {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("observed_paths", &self.observed_path_count())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Adds a database observer.
    ///
    /// Every path of `observer.paths()` the observer was not yet registered on
    /// gets the cached snapshot (if any, and only when it holds a value), then
    /// a remote subscription if none is open. Adding an observer twice is a
    /// no-op.
    ///
    /// Only a weak reference is kept: the caller owns the observer, and
    /// dropping it ends its registration.
    pub fn add_observer(
        &self,
        observer: &Arc<dyn DatabaseObserver>,
    ) {
        let entry = ObserverEntry {
            id: ObserverId::of(observer),
            observer: Arc::downgrade(observer),
        };

        let mut paths = observer.paths();
        let mut seen = HashSet::new();
        paths.retain(|p| seen.insert(p.clone()));

        let mut state = self.inner.state.lock();
        self.inner.prune_locked(&mut state);

        let mut added_paths = Vec::new();
        for path in paths {
            let newly_added = match state.storages.entry(path.clone()) {
                Entry::Occupied(mut storage) => storage.get_mut().add(entry.clone()),
                Entry::Vacant(slot) => {
                    slot.insert(ObserversStorage::new(path.clone(), entry.clone()));
                    true
                }
            };

            if newly_added {
                added_paths.push(path);
            }
        }

        debug!(
            observer_id = ?entry.id,
            paths = ?added_paths,
            "Observer added"
        );

        for path in &added_paths {
            if let Some(snapshot) = state.snapshots.get(path) {
                self.inner
                    .deliver(snapshot.as_ref(), path, std::slice::from_ref(&entry), false);
            }
        }

        for path in added_paths {
            self.inner.observe(&mut state, path);
        }
    }

    /// Removes the observer from every path it is registered on.
    ///
    /// Paths left without observers stop being observed remotely and lose
    /// their cached snapshot. Removing an unknown observer is a no-op.
    pub fn remove_observer(
        &self,
        observer: &Arc<dyn DatabaseObserver>,
    ) {
        self.remove_observer_by_id(ObserverId::of(observer));
    }

    /// Same as [`Database::remove_observer`], by identity
    pub fn remove_observer_by_id(
        &self,
        id: ObserverId,
    ) {
        let mut state = self.inner.state.lock();
        self.inner.remove_locked(&mut state, id);
    }

    /// Removes every registered observer
    pub fn remove_all_observers(&self) {
        let mut state = self.inner.state.lock();
        self.inner.prune_locked(&mut state);

        // Compute the removal set first, removal mutates the storages
        let ids: HashSet<ObserverId> = state
            .storages
            .values()
            .flat_map(|s| s.observers().iter().map(|o| o.id))
            .collect();

        for id in ids {
            self.inner.remove_locked(&mut state, id);
        }
    }

    /// Writes `value` at `path`; `None` deletes it.
    ///
    /// Both simple (`loc`) and nested (`loc/en/Done`) paths are accepted. The
    /// cache is not touched: observers see the write when the remote echoes it.
    pub fn set_value(
        &self,
        value: Option<Value>,
        path: &str,
    ) {
        trace!(%path, delete = value.is_none(), "Database write");
        self.inner.remote.reference().child(path).set_value(value);
    }

    /// Whether the remote client persists its cache to disk
    pub fn is_persistence_enabled(&self) -> bool {
        self.inner.remote.is_persistence_enabled()
    }

    pub fn set_persistence_enabled(
        &self,
        enabled: bool,
    ) {
        self.inner.remote.set_persistence_enabled(enabled);
    }

    /// Blocks until every remote event and delivery queued before this call
    /// has been processed.
    ///
    /// Returns immediately when called from the delivery worker itself.
    pub fn flush(&self) {
        if self.is_delivery_thread() {
            warn!("Database::flush called from an observer callback, ignoring");
            return;
        }

        let (ack_tx, ack_rx) = bounded(1);
        if self.inner.event_sender.send(DispatchEvent::Flush(ack_tx)).is_err() {
            return;
        }
        let _ = ack_rx.recv();
    }

    /// Number of live observers registered on `path`
    pub fn observer_count(
        &self,
        path: &str,
    ) -> usize {
        self.inner.pruned_state().storages.get(path).map(|s| s.len()).unwrap_or(0)
    }

    /// Number of paths with at least one live observer
    pub fn observed_path_count(&self) -> usize {
        self.inner.pruned_state().storages.len()
    }

    /// Whether a remote subscription is open for `path`
    pub fn is_subscribed(
        &self,
        path: &str,
    ) -> bool {
        self.inner.pruned_state().subscriptions.contains_key(path)
    }

    /// Last snapshot received for `path`, if its subscription is open
    pub fn cached_snapshot(
        &self,
        path: &str,
    ) -> Option<Arc<dyn DataSnapshot>> {
        self.inner.pruned_state().snapshots.get(path).cloned()
    }

    fn is_delivery_thread(&self) -> bool {
        let current = std::thread::current().id();
        self.workers
            .lock()
            .delivery
            .as_ref()
            .map(|h| h.thread().id() == current)
            .unwrap_or(false)
    }

    /// Signals both worker threads and waits for them to exit
    fn stop(&self) {
        let mut workers = self.workers.lock();

        for shutdown in workers.shutdown.drain(..) {
            let _ = shutdown.send(());
        }

        let current = std::thread::current().id();
        for handle in [workers.dispatcher.take(), workers.delivery.take()].into_iter().flatten() {
            // The last handle may be dropped from an observer callback
            if handle.thread().id() != current {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        self.remove_all_observers();
        self.stop();
    }
}

impl DatabaseInner {
    /// Opens the remote subscription for `path` unless one is already open
    fn observe(
        &self,
        state: &mut DatabaseState,
        path: DatabasePath,
    ) {
        if state.subscriptions.contains_key(&path) {
            return;
        }

        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let reference = self.remote.reference_at(&path);
        reference.keep_synced(self.config.keep_synced);

        let event_sender = self.event_sender.clone();
        let event_path = path.clone();
        let callback: SnapshotCallback = Box::new(move |snapshot| {
            // Remote thread: only hand the event over to the dispatcher
            let _ = event_sender.send(DispatchEvent::Snapshot {
                path: event_path.clone(),
                sequence,
                snapshot,
            });
        });

        let handle = reference.observe_event(DataEventType::Value, callback);

        debug!(%path, sequence, ?handle, "Remote subscription opened");

        state.subscriptions.insert(
            path,
            ActiveSubscription {
                reference,
                handle,
                sequence,
            },
        );
    }

    /// Cancels the subscription for `path` and evicts its cached snapshot
    fn stop_observing(
        &self,
        state: &mut DatabaseState,
        path: &str,
    ) {
        let Some(subscription) = state.subscriptions.remove(path) else {
            return;
        };

        subscription.reference.remove_observer(subscription.handle);
        state.snapshots.remove(path);

        debug!(
            %path,
            sequence = subscription.sequence,
            handle = ?subscription.handle,
            "Remote subscription closed"
        );
    }

    fn remove_locked(
        &self,
        state: &mut DatabaseState,
        id: ObserverId,
    ) {
        self.prune_locked(state);

        let emptied: Vec<DatabasePath> = state
            .storages
            .values_mut()
            .filter(|s| s.contains(id))
            .filter_map(|s| s.remove(id).then(|| s.path().to_string()))
            .collect();

        for path in emptied {
            state.storages.remove(&path);
            self.stop_observing(state, &path);
        }

        trace!(observer_id = ?id, "Observer removed");
    }

    /// Drops observers released without removal and closes the paths they
    /// leave empty
    fn prune_locked(
        &self,
        state: &mut DatabaseState,
    ) {
        let emptied: Vec<DatabasePath> = state
            .storages
            .values_mut()
            .filter_map(|s| s.prune().then(|| s.path().to_string()))
            .collect();

        for path in emptied {
            debug!(%path, "Every observer was dropped without removal");
            state.storages.remove(&path);
            self.stop_observing(state, &path);
        }
    }

    fn pruned_state(&self) -> MutexGuard<'_, DatabaseState> {
        let mut state = self.state.lock();
        self.prune_locked(&mut state);
        state
    }

    /// Applies a remote event: cache it, then fan it out
    fn apply_snapshot(
        &self,
        path: DatabasePath,
        sequence: u64,
        snapshot: Arc<dyn DataSnapshot>,
    ) {
        let mut state = self.state.lock();

        match state.subscriptions.get(&path) {
            Some(subscription) if subscription.sequence == sequence => {}
            _ => {
                trace!(%path, sequence, "Dropping event of a closed subscription");
                return;
            }
        }

        state.snapshots.insert(path.clone(), snapshot.clone());

        let Some(storage) = state.storages.get_mut(&path) else {
            debug_assert!(false, "open subscription without observers for {path}");
            return;
        };

        if storage.prune() {
            debug!(%path, "Every observer was dropped without removal");
            state.storages.remove(&path);
            self.stop_observing(&mut state, &path);
            return;
        }

        self.deliver(snapshot.as_ref(), &path, storage.observers(), true);

        trace!(
            %path,
            exists = snapshot.exists(),
            observers = storage.len(),
            "Event dispatched"
        );
    }

    /// Queues one delivery per observer.
    ///
    /// With `call_on_empty` unset, snapshots without a value produce nothing
    /// instead of a disappearance.
    fn deliver(
        &self,
        snapshot: &dyn DataSnapshot,
        path: &str,
        observers: &[ObserverEntry],
        call_on_empty: bool,
    ) {
        let kind = match snapshot.value() {
            Some(value) if snapshot.exists() => DeliveryKind::Changed(Arc::new(value.clone())),
            _ if call_on_empty => DeliveryKind::Disappeared,
            _ => return,
        };

        for entry in observers {
            let task = DeliveryTask::Deliver {
                id: entry.id,
                observer: entry.observer.clone(),
                path: path.to_string(),
                kind: kind.clone(),
            };

            if self.delivery_sender.send(task).is_err() {
                debug!(%path, "Delivery queue closed, dropping delivery");
                return;
            }
        }
    }
}

fn run_dispatcher(
    inner: Arc<DatabaseInner>,
    events: Receiver<DispatchEvent>,
    shutdown: Receiver<()>,
) {
    debug!("Database event dispatcher started");

    loop {
        crossbeam_channel::select! {
            recv(events) -> result => {
                match result {
                    Ok(DispatchEvent::Snapshot { path, sequence, snapshot }) => {
                        inner.apply_snapshot(path, sequence, snapshot);
                    }
                    Ok(DispatchEvent::Flush(ack)) => {
                        if let Err(e) = inner.delivery_sender.send(DeliveryTask::Flush(ack)) {
                            // Delivery worker is gone, nothing left to wait for
                            if let DeliveryTask::Flush(ack) = e.into_inner() {
                                let _ = ack.send(());
                            }
                        }
                    }
                    Err(_) => {
                        warn!("Database event channel closed unexpectedly");
                        break;
                    }
                }
            }
            recv(shutdown) -> _ => {
                debug!("Database event dispatcher received shutdown signal");
                break;
            }
        }
    }

    debug!("Database event dispatcher stopped");
}
