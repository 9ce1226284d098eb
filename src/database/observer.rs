use std::sync::Arc;

use crate::remote::Value;

/// Opaque key of a location in the remote hierarchy
pub type DatabasePath = String;

/// Listener registered on one or more database paths.
///
/// The database only keeps a weak reference to its observers: dropping the
/// last strong reference stops deliveries even if the observer was never
/// removed.
pub trait DatabaseObserver: Send + Sync {
    /// Paths this observer wants to be notified about
    fn paths(&self) -> Vec<DatabasePath>;

    /// Called when an updated value arrived for `path`.
    ///
    /// Also called once right after registration when a value is already
    /// cached for `path`.
    fn value_changed(
        &self,
        value: &Value,
        path: &str,
    );

    /// Called when `path` holds no value
    fn value_disappeared(
        &self,
        path: &str,
    );
}

/// Reference identity of an observer
///
/// Two handles to the same allocation have the same id. Ids stay unique for
/// as long as the database holds a weak reference to the observer, because
/// the weak reference keeps the allocation alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(usize);

impl ObserverId {
    pub fn of<T: ?Sized>(observer: &Arc<T>) -> Self {
        Self(Arc::as_ptr(observer) as *const () as usize)
    }

    /// Id of an observer seen through a plain reference, e.g. from `Drop`
    pub fn of_ref<T: ?Sized>(observer: &T) -> Self {
        Self(observer as *const T as *const () as usize)
    }
}
