use std::io;
use std::net::{SocketAddr, SocketAddrV4};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::info;

use crate::config::{BindAddress, Config};
use crate::error::{ShutdownReason, StartupError};
use crate::http::connection::{Connection, ConnectionContext};
use crate::log::LogSink;
use crate::server::registry::{ConnectionInfo, Registry};

const LISTEN_BACKLOG: u32 = 128;

/// Lifecycle of a [`Server`]. `Shutdown` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Uninitialized,
    Startup,
    Running,
    Shutdown,
}

/// Handle to one listening server and every connection it accepted.
///
/// Cloning is not needed to share it: wrap it in an `Arc` and hand that to
/// whatever triggers shutdown (a signal handler, an admin console).
pub struct Server {
    shared: Arc<Shared>,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    config: Config,
    ctx: Arc<ConnectionContext>,
    registry: Registry,
    state: watch::Sender<ServerState>,
    sink: Arc<dyn LogSink>,
    local_addr: OnceLock<SocketAddr>,
    next_id: AtomicU64,
}

impl Server {
    pub fn new(config: Config, sink: Arc<dyn LogSink>) -> Self {
        let (state, _) = watch::channel(ServerState::Uninitialized);
        let shared = Shared {
            ctx: Arc::new(ConnectionContext::from_config(&config)),
            registry: Registry::new(config.server.max_connections),
            config,
            state,
            sink,
            local_addr: OnceLock::new(),
            next_id: AtomicU64::new(1),
        };
        Self {
            shared: Arc::new(shared),
            accept_task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ServerState {
        *self.shared.state.borrow()
    }

    /// Address the listener is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.shared.local_addr.get().copied()
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Binds, listens, and launches the accept loop.
    ///
    /// Must be called from within a tokio runtime. Any setup failure moves
    /// the server straight to `Shutdown`; there is no retry.
    pub fn start(&self) -> Result<SocketAddr, StartupError> {
        let claimed = self.shared.state.send_if_modified(|state| {
            if *state == ServerState::Uninitialized {
                *state = ServerState::Startup;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(StartupError::AlreadyStarted);
        }

        let listener = match self.shared.bind() {
            Ok(listener) => listener,
            Err(e) => {
                self.shared.set_state(ServerState::Shutdown);
                if let Some(reason) = e.reason() {
                    self.shared.sink.log(reason.message());
                }
                tracing::error!(error = %e, "startup failed");
                return Err(e);
            }
        };

        let addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                self.shared.set_state(ServerState::Shutdown);
                self.shared.sink.log(ShutdownReason::Listen.message());
                return Err(StartupError::Listen(e));
            }
        };
        let _ = self.shared.local_addr.set(addr);

        self.shared.set_state(ServerState::Running);
        self.shared.sink.log(&format!("Listening on {}", addr));
        info!("Listening on {}", addr);

        let task = tokio::spawn(accept_loop(self.shared.clone(), listener));
        *self.accept_task.lock().unwrap_or_else(|e| e.into_inner()) = Some(task);
        Ok(addr)
    }

    /// Stops accepting, closes the listener, and tears down every
    /// connection immediately.
    ///
    /// In-flight requests get no grace period: each worker is told to stop
    /// and joined (aborted after `drain_timeout`). When this returns the
    /// registry is empty and the listening socket is closed.
    pub async fn shutdown(&self, reason: ShutdownReason) {
        self.shared.set_state(ServerState::Shutdown);

        let task = self
            .accept_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "accept loop failed");
            }
        }

        self.shared.drain().await;
        self.shared.sink.log(reason.message());
        info!(reason = ?reason, "server shut down");
    }

    /// Resolves once the server has reached `Shutdown`, whoever caused it.
    pub async fn stopped(&self) {
        let mut rx = self.shared.state.subscribe();
        let _ = rx.wait_for(|state| *state == ServerState::Shutdown).await;
    }

    /// Live connections, for diagnostics.
    pub async fn connections(&self) -> Vec<ConnectionInfo> {
        self.shared.registry.snapshot().await
    }

    pub async fn connection_count(&self) -> usize {
        self.shared.registry.len().await
    }
}

impl Shared {
    fn set_state(&self, state: ServerState) {
        self.state.send_replace(state);
    }

    fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    fn grace(&self) -> Duration {
        self.config.server.drain_timeout()
    }

    fn bind(&self) -> Result<TcpListener, StartupError> {
        let cfg = &self.config.server;
        let addr = BindAddress::parse(&cfg.listen_addr)
            .ok_or_else(|| StartupError::AddressParse(cfg.listen_addr.clone()))?;

        let socket = TcpSocket::new_v4().map_err(StartupError::SocketCreate)?;
        socket
            .set_reuseaddr(true)
            .map_err(StartupError::SocketCreate)?;
        socket
            .bind(SocketAddrV4::new(addr.0, cfg.port).into())
            .map_err(StartupError::Bind)?;
        socket.listen(LISTEN_BACKLOG).map_err(StartupError::Listen)
    }

    /// One accept-loop pass: admit at most one pending connection, then
    /// sweep terminated ones. Both happen under the registry lock.
    async fn tick(&self, listener: &TcpListener) -> io::Result<()> {
        let mut registry = self.registry.lock().await;

        if !registry.is_full() {
            match timeout(Duration::ZERO, listener.accept()).await {
                Err(_) => {}
                Ok(Ok((stream, peer))) => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let handle = Connection::spawn(id, stream, peer, self.ctx.clone());
                    match registry.insert(handle) {
                        Ok(()) => {
                            self.sink
                                .log(&format!("Accepted connection {} from {}", id, peer.ip()));
                        }
                        Err(handle) => {
                            handle.request_stop();
                            handle.join(self.grace()).await;
                        }
                    }
                }
                Ok(Err(e)) if is_transient(&e) => {
                    tracing::debug!(error = %e, "accept failed");
                }
                Ok(Err(e)) => return Err(e),
            }
        }

        for info in registry.sweep(self.grace()).await {
            self.sink
                .log(&format!("Removed connection {} from {}", info.id, info.peer.ip()));
        }
        Ok(())
    }

    async fn drain(&self) {
        for info in self.registry.drain(self.grace()).await {
            self.sink
                .log(&format!("Closed connection {} from {}", info.id, info.peer.ip()));
        }
    }
}

async fn accept_loop(shared: Arc<Shared>, listener: TcpListener) {
    while shared.state() == ServerState::Running {
        if let Err(e) = shared.tick(&listener).await {
            tracing::error!(error = %e, "accept loop failed");
            shared.set_state(ServerState::Shutdown);
            drop(listener);
            shared.drain().await;
            shared.sink.log(ShutdownReason::AcceptFailed.message());
            return;
        }
        shared.ctx.readiness.pause().await;
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock
            | io::ErrorKind::Interrupted
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}
