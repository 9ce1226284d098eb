use std::sync::Weak;

use super::DatabaseObserver;
use super::DatabasePath;
use super::ObserverId;

/// Registered observer: identity plus non-owning reference
#[derive(Clone)]
pub(crate) struct ObserverEntry {
    pub(crate) id: ObserverId,
    pub(crate) observer: Weak<dyn DatabaseObserver>,
}

impl std::fmt::Debug for ObserverEntry {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ObserverEntry")
            .field("id", &self.id)
            .field("alive", &(self.observer.strong_count() > 0))
            .finish()
    }
}

/// Observers registered on a single path.
///
/// Exists only while at least one observer is registered; the owner discards
/// it as soon as [`ObserversStorage::remove`] reports it empty.
#[derive(Debug)]
pub(crate) struct ObserversStorage {
    path: DatabasePath,
    observers: Vec<ObserverEntry>,
}

impl ObserversStorage {
    /// Creates the storage seeded with its first observer
    pub(crate) fn new(
        path: DatabasePath,
        observer: ObserverEntry,
    ) -> Self {
        Self {
            path,
            observers: vec![observer],
        }
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    /// Adds an observer; returns false if it was already registered
    pub(crate) fn add(
        &mut self,
        observer: ObserverEntry,
    ) -> bool {
        if self.contains(observer.id) {
            return false;
        }
        self.observers.push(observer);
        true
    }

    /// Removes an observer if present; returns whether no observers are left
    pub(crate) fn remove(
        &mut self,
        id: ObserverId,
    ) -> bool {
        self.observers.retain(|o| o.id != id);
        self.observers.is_empty()
    }

    /// Drops observers that no longer exist; returns whether no observers are left
    pub(crate) fn prune(&mut self) -> bool {
        self.observers.retain(|o| o.observer.strong_count() > 0);
        self.observers.is_empty()
    }

    pub(crate) fn contains(
        &self,
        id: ObserverId,
    ) -> bool {
        self.observers.iter().any(|o| o.id == id)
    }

    pub(crate) fn observers(&self) -> &[ObserverEntry] {
        &self.observers
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }
}
