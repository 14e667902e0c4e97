use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::models::ProgressUpdate;

pub type ListenerId = u64;

type Listener = Arc<dyn Fn(&ProgressUpdate) + Send + Sync>;

/// Callbacks interested in changes to today's aggregate.
#[derive(Default)]
pub struct ProgressListeners {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
}

impl ProgressListeners {
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ProgressUpdate) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    pub fn notify(&self, update: &ProgressUpdate) {
        // Snapshot first so a listener may unsubscribe itself.
        let snapshot: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            listener(update);
        }
    }
}
