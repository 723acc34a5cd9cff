//! Progress delivery surface between the runners and the driving layer.
//!
//! Subscribers register per run-kind and receive either the bare export
//! ratio or the download phase record. Unsubscribing is idempotent and only
//! stops delivery; it never touches an in-flight subprocess.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use uuid::Uuid;

use crate::download::progress::DownloadEvent;

pub type SubscriptionId = Uuid;

type ExportCallback = Box<dyn Fn(f64) + Send + Sync>;
type DownloadCallback = Box<dyn Fn(&DownloadEvent) + Send + Sync>;

#[derive(Default)]
pub struct ProgressHub {
    export: Mutex<HashMap<SubscriptionId, ExportCallback>>,
    download: Mutex<HashMap<SubscriptionId, DownloadCallback>>,
}

impl ProgressHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_export<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        if let Ok(mut subscribers) = self.export.lock() {
            subscribers.insert(id, Box::new(callback));
        }
        id
    }

    pub fn unsubscribe_export(&self, id: SubscriptionId) {
        if let Ok(mut subscribers) = self.export.lock() {
            subscribers.remove(&id);
        }
    }

    pub fn emit_export(&self, ratio: f64) {
        if let Ok(subscribers) = self.export.lock() {
            for callback in subscribers.values() {
                callback(ratio);
            }
        }
    }

    pub fn subscribe_download<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&DownloadEvent) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        if let Ok(mut subscribers) = self.download.lock() {
            subscribers.insert(id, Box::new(callback));
        }
        id
    }

    pub fn unsubscribe_download(&self, id: SubscriptionId) {
        if let Ok(mut subscribers) = self.download.lock() {
            subscribers.remove(&id);
        }
    }

    pub fn emit_download(&self, event: &DownloadEvent) {
        if let Ok(subscribers) = self.download.lock() {
            for callback in subscribers.values() {
                callback(event);
            }
        }
    }
}

/// Cooperative cancellation handle for a single run. Cloneable; any clone
/// can cancel, all observers see it. Cancelling after completion is a no-op.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&mut self) {
        while !*self.rx.borrow() {
            if self.rx.changed().await.is_err() {
                // Sender kept alive by this struct; unreachable in practice
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves when the optional token is cancelled; never resolves when absent.
/// Lets the runners `select!` uniformly whether or not a token was supplied.
pub async fn cancelled(token: &mut Option<CancelToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::progress::DownloadPhase;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_unsubscribe_is_idempotent_and_stops_delivery() {
        let hub = ProgressHub::new();
        let count = Arc::new(AtomicUsize::new(0));

        let counted = Arc::clone(&count);
        let id = hub.subscribe_export(move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        });

        hub.emit_export(0.5);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        hub.unsubscribe_export(id);
        hub.unsubscribe_export(id);
        hub.emit_export(0.9);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_download_subscribers_receive_events() {
        let hub = ProgressHub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        hub.subscribe_download(move |event| {
            sink.lock().unwrap().push(event.phase);
        });

        hub.emit_download(&DownloadEvent::completed());
        assert_eq!(*seen.lock().unwrap(), vec![DownloadPhase::Completed]);
    }

    #[tokio::test]
    async fn test_cancel_token_resolves_waiters() {
        let token = CancelToken::new();
        let mut waiter = token.clone();
        assert!(!token.is_cancelled());

        token.cancel();
        token.cancel();
        waiter.cancelled().await;
        assert!(waiter.is_cancelled());
    }
}
