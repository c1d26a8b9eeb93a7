//! Non-blocking readiness checks used by the accept loop and connection
//! workers.
//!
//! Nothing here waits for I/O: each check looks at the socket's current
//! readiness once and reports it. Callers pace their polling with
//! [`Readiness::pause`].

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

#[derive(Debug, Clone, Copy)]
pub struct Readiness {
    interval: Duration,
}

impl Readiness {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Whether a read on `stream` would make progress right now.
    pub async fn readable(&self, stream: &TcpStream) -> bool {
        matches!(timeout(Duration::ZERO, stream.readable()).await, Ok(Ok(())))
    }

    /// Whether a write on `stream` would make progress right now.
    pub async fn writable(&self, stream: &TcpStream) -> bool {
        matches!(timeout(Duration::ZERO, stream.writable()).await, Ok(Ok(())))
    }

    /// Sleeps one polling interval.
    pub async fn pause(&self) {
        tokio::time::sleep(self.interval).await;
    }
}
