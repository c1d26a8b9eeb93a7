//! Bounded collection of live connections.
//!
//! The registry owns one [`ConnectionHandle`] per accepted socket from
//! insertion until the sweep (or the shutdown drain) joins its worker and
//! drops it. Every insertion, removal, and listing happens under one mutex.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::http::connection::ConnectionSignals;

/// Registry-side handle to one connection worker.
#[derive(Debug)]
pub struct ConnectionHandle {
    id: u64,
    peer: SocketAddr,
    signals: Arc<ConnectionSignals>,
    worker: JoinHandle<()>,
}

/// Point-in-time description of a registered connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub id: u64,
    pub peer: SocketAddr,
    pub terminated: bool,
}

impl ConnectionHandle {
    pub fn new(
        id: u64,
        peer: SocketAddr,
        signals: Arc<ConnectionSignals>,
        worker: JoinHandle<()>,
    ) -> Self {
        Self {
            id,
            peer,
            signals,
            worker,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_terminated(&self) -> bool {
        self.signals.is_terminated()
    }

    pub fn request_stop(&self) {
        self.signals.request_stop();
    }

    pub fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            id: self.id,
            peer: self.peer,
            terminated: self.is_terminated(),
        }
    }

    /// Waits for the worker to finish, aborting it if it overruns `grace`.
    pub async fn join(mut self, grace: Duration) {
        match timeout(grace, &mut self.worker).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(id = self.id, error = %e, "connection worker failed");
            }
            Err(_) => {
                tracing::warn!(id = self.id, "connection worker did not stop in time, aborting");
                self.worker.abort();
                let _ = self.worker.await;
            }
        }
    }
}

#[derive(Debug)]
pub struct Registry {
    capacity: usize,
    entries: Mutex<Vec<ConnectionHandle>>,
}

/// Exclusive access to the registry for a check-then-act sequence.
pub struct RegistryGuard<'a> {
    capacity: usize,
    entries: MutexGuard<'a, Vec<ConnectionHandle>>,
}

impl Registry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    pub async fn lock(&self) -> RegistryGuard<'_> {
        RegistryGuard {
            capacity: self.capacity,
            entries: self.entries.lock().await,
        }
    }

    pub async fn len(&self) -> usize {
        self.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.lock().await.is_empty()
    }

    pub async fn insert(&self, handle: ConnectionHandle) -> Result<(), ConnectionHandle> {
        self.lock().await.insert(handle)
    }

    pub async fn snapshot(&self) -> Vec<ConnectionInfo> {
        self.lock().await.snapshot()
    }

    pub async fn sweep(&self, grace: Duration) -> Vec<ConnectionInfo> {
        self.lock().await.sweep(grace).await
    }

    pub async fn drain(&self, grace: Duration) -> Vec<ConnectionInfo> {
        self.lock().await.drain(grace).await
    }
}

impl RegistryGuard<'_> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Adds a connection, handing it back if the registry is full.
    pub fn insert(&mut self, handle: ConnectionHandle) -> Result<(), ConnectionHandle> {
        if self.is_full() {
            return Err(handle);
        }
        self.entries.push(handle);
        Ok(())
    }

    pub fn snapshot(&self) -> Vec<ConnectionInfo> {
        self.entries.iter().map(ConnectionHandle::info).collect()
    }

    /// Removes and joins every connection whose worker has terminated.
    pub async fn sweep(&mut self, grace: Duration) -> Vec<ConnectionInfo> {
        let (done, live): (Vec<_>, Vec<_>) = std::mem::take(&mut *self.entries)
            .into_iter()
            .partition(ConnectionHandle::is_terminated);
        *self.entries = live;

        let mut removed = Vec::with_capacity(done.len());
        for handle in done {
            removed.push(handle.info());
            handle.join(grace).await;
        }
        removed
    }

    /// Stops every connection, then joins and removes all of them.
    pub async fn drain(&mut self, grace: Duration) -> Vec<ConnectionInfo> {
        let handles = std::mem::take(&mut *self.entries);
        for handle in &handles {
            handle.request_stop();
        }

        let mut removed = Vec::with_capacity(handles.len());
        for handle in handles {
            let (id, peer) = (handle.id, handle.peer);
            let signals = handle.signals.clone();
            handle.join(grace).await;
            removed.push(ConnectionInfo {
                id,
                peer,
                terminated: signals.is_terminated(),
            });
        }
        removed
    }
}
