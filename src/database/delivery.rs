//! Observer delivery queue
//!
//! Deliveries are produced under the database lock, so their queue order
//! matches the order in which snapshots were applied. A single worker drains
//! the queue, which keeps deliveries for one path in FIFO order.

use std::sync::Arc;
use std::sync::Weak;

use crossbeam_channel::bounded;
use crossbeam_channel::unbounded;
use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use tracing::debug;
use tracing::trace;

use super::DatabaseObserver;
use super::DatabasePath;
use super::ObserverId;
use crate::remote::Value;

#[derive(Debug, Clone)]
pub(crate) enum DeliveryKind {
    Changed(Arc<Value>),
    Disappeared,
}

pub(crate) enum DeliveryTask {
    Deliver {
        id: ObserverId,
        observer: Weak<dyn DatabaseObserver>,
        path: DatabasePath,
        kind: DeliveryKind,
    },
    /// Acknowledged once every task queued before it has run
    Flush(Sender<()>),
}

pub(crate) fn delivery_channel(capacity: usize) -> (Sender<DeliveryTask>, Receiver<DeliveryTask>) {
    if capacity > 0 {
        bounded(capacity)
    } else {
        unbounded()
    }
}

/// Worker loop; returns when `shutdown` fires or every sender is gone
pub(crate) fn run_delivery_worker(
    tasks: Receiver<DeliveryTask>,
    shutdown: Receiver<()>,
) {
    debug!("Observers delivery worker started");

    loop {
        crossbeam_channel::select! {
            recv(tasks) -> result => {
                match result {
                    Ok(task) => execute(task),
                    Err(_) => {
                        debug!("Delivery queue closed");
                        break;
                    }
                }
            }
            recv(shutdown) -> _ => {
                debug!("Observers delivery worker received shutdown signal");
                break;
            }
        }
    }

    debug!("Observers delivery worker stopped");
}

fn execute(task: DeliveryTask) {
    match task {
        DeliveryTask::Deliver {
            id,
            observer,
            path,
            kind,
        } => {
            let Some(observer) = observer.upgrade() else {
                trace!(?id, %path, "Observer dropped before delivery");
                return;
            };

            match kind {
                DeliveryKind::Changed(value) => {
                    trace!(?id, %path, "Delivering value change");
                    observer.value_changed(&value, &path);
                }
                DeliveryKind::Disappeared => {
                    trace!(?id, %path, "Delivering value disappearance");
                    observer.value_disappeared(&path);
                }
            }
        }
        DeliveryTask::Flush(ack) => {
            let _ = ack.send(());
        }
    }
}
