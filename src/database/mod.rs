//! Path-keyed observation of a remote database
//!
//! # Architecture
//!
//! ```text
//! add_observer()/remove_observer()        remote client thread(s)
//!        │                                        │ value event
//!        ▼                                        ▼
//! ┌──────────────────────┐   Snapshot   ┌──────────────────┐
//! │ DatabaseState (lock) │ ◀─────────── │   Event Queue    │ (crossbeam, unbounded)
//! │  storages            │  dispatcher  └──────────────────┘
//! │  snapshots (cache)   │    thread
//! │  subscriptions       │
//! └──────────┬───────────┘
//!            │ one task per observer
//!            ▼
//! ┌──────────────────────┐
//! │   Delivery Queue     │ (crossbeam, bounded by delivery_queue_size)
//! └──────────┬───────────┘
//!            │ delivery worker thread
//!            ▼
//!   value_changed() / value_disappeared()
//! ```
//!
//! # Lifecycle
//!
//! Per path, the observer storage, the remote subscription and the cached
//! snapshot live and die together:
//!
//! - the first observer of a path opens the subscription
//! - every remote event replaces the cached snapshot and is delivered to every
//!   observer of the path
//! - removing the last observer closes the subscription and evicts the cache;
//!   a later observer starts from scratch
//!
//! An observer joining a path with a cached snapshot gets that snapshot right
//! away, but only if it holds a value: a late observer is never told that a
//! value disappeared.

mod database;
mod delivery;
mod observer;
mod storage;


pub use database::*;
pub use observer::*;
