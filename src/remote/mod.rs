//! Remote database boundary
//!
//! The facade never talks to a concrete realtime database client. It consumes
//! the capabilities below, which a production adaptor implements on top of its
//! SDK and which [`MemoryDatabase`] implements in process.
//!
//! Values crossing this boundary are dynamically typed
//! ([`serde_json::Value`]); absence is modelled as `None`.

mod memory;

pub use memory::*;

use std::fmt::Debug;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
pub use serde_json::Value;

/// Kind of remote event a subscription listens for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataEventType {
    /// A new child node is added to a location
    ChildAdded,
    /// A child node is removed from a location
    ChildRemoved,
    /// A child node at a location changes
    ChildChanged,
    /// A child node moves relative to the other child nodes at a location
    ChildMoved,
    /// Any data changes at a location or, recursively, at any child node
    Value,
}

/// Opaque handle returned by [`DatabaseReference::observe_event`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

/// Remote state at a path at a point in time
pub trait DataSnapshot: Debug + Send + Sync {
    fn value(&self) -> Option<&Value>;

    fn exists(&self) -> bool;
}

/// Plain value-backed snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSnapshot {
    value: Option<Value>,
    exists: bool,
}

impl ValueSnapshot {
    /// A snapshot of `value`; `None` and `Null` do not exist
    pub fn new(value: Option<Value>) -> Self {
        let value = value.filter(|v| !v.is_null());
        let exists = value.is_some();
        Self { value, exists }
    }

    /// A snapshot of a location holding no data
    pub fn empty() -> Self {
        Self::new(None)
    }

    /// Builds a snapshot with an explicit existence flag
    pub fn with_existence(
        value: Option<Value>,
        exists: bool,
    ) -> Self {
        Self { value, exists }
    }
}

impl DataSnapshot for ValueSnapshot {
    fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    fn exists(&self) -> bool {
        self.exists
    }
}

/// Callback invoked by the remote client for every event of a subscription.
///
/// May be called from any thread, including synchronously from inside
/// [`DatabaseReference::observe_event`].
pub type SnapshotCallback = Box<dyn Fn(Arc<dyn DataSnapshot>) + Send + Sync>;

/// A location in the remote hierarchy
#[cfg_attr(test, automock)]
pub trait DatabaseReference: Send + Sync + 'static {
    /// Reference relative to this one; `path` may contain `/`
    fn child(
        &self,
        path: &str,
    ) -> Arc<dyn DatabaseReference>;

    /// Writes `value` at this location; `None` deletes it
    fn set_value(
        &self,
        value: Option<Value>,
    );

    /// Keeps this location synchronized with the server
    fn keep_synced(
        &self,
        keep_synced: bool,
    );

    /// Subscribes `callback` to `event_type` events at this location
    fn observe_event(
        &self,
        event_type: DataEventType,
        callback: SnapshotCallback,
    ) -> SubscriptionHandle;

    /// Cancels the subscription identified by `handle`
    fn remove_observer(
        &self,
        handle: SubscriptionHandle,
    );
}

/// Data source of the facade: root reference plus persistence toggle
#[cfg_attr(test, automock)]
pub trait RemoteDatabase: Send + Sync + 'static {
    fn is_persistence_enabled(&self) -> bool;

    fn set_persistence_enabled(
        &self,
        enabled: bool,
    );

    /// Root reference
    fn reference(&self) -> Arc<dyn DatabaseReference>;

    /// Reference at `path` below the root
    fn reference_at(
        &self,
        path: &str,
    ) -> Arc<dyn DatabaseReference> {
        self.reference().child(path)
    }
}
