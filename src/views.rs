use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info};

use crate::store::VideoStore;

/// Best-effort view counting off the request path.
///
/// `record` queues the id and returns immediately. A background task applies
/// the increments; callers never learn whether one landed. Views are dropped
/// when the queue is full or still queued at shutdown.
#[derive(Clone, Debug)]
pub struct ViewCounter {
    tx: mpsc::Sender<String>,
}

pub const VIEW_QUEUE_CAPACITY: usize = 1024;

impl ViewCounter {
    pub fn spawn(store: Arc<VideoStore>) -> Self {
        Self::spawn_with_capacity(store, VIEW_QUEUE_CAPACITY)
    }

    pub fn spawn_with_capacity(store: Arc<VideoStore>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<String>(capacity);

        tokio::spawn(async move {
            info!("[views] 👁️  View counter started");
            while let Some(id) = rx.recv().await {
                if !store.increment_views(&id) {
                    debug!("[views] Dropped view for unknown video {}", id);
                }
            }
            debug!("[views] View counter stopped");
        });

        Self { tx }
    }

    pub fn record(&self, id: &str) {
        match self.tx.try_send(id.to_string()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                debug!("[views] Queue full, view for {} dropped", id);
            }
            Err(TrySendError::Closed(_)) => {
                debug!("[views] Counter is gone, view for {} lost", id);
            }
        }
    }
}
