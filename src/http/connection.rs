use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::Instant;

use crate::config::Config;
use crate::http::mime;
use crate::http::parser::{has_headers_end, parse_request};
use crate::http::request::{Method, RequestView};
use crate::http::response::{KeepAlive, Response, ResponseBuilder, StatusCode};
use crate::http::writer::ResponseWriter;
use crate::resource::{ResourceResolver, percent_decode};
use crate::server::poll::Readiness;
use crate::server::registry::ConnectionHandle;

/// Where an empty or `/` target is redirected.
pub const INDEX_PAGE: &str = "/index.html";

/// Would-block retries tolerated once part of a request has arrived.
const MAX_RECV_RETRIES: u32 = 10;

/// Flags shared between a connection worker and its registry entry.
///
/// `stop` flows registry → worker, `terminated` flows worker → registry.
/// Nothing else about a connection is visible outside its worker.
#[derive(Debug, Default)]
pub struct ConnectionSignals {
    stop: AtomicBool,
    terminated: AtomicBool,
}

impl ConnectionSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub fn mark_terminated(&self) {
        self.terminated.store(true, Ordering::Release);
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }
}

/// Settings and collaborators every connection worker reads.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub resolver: ResourceResolver,
    pub readiness: Readiness,
    pub max_packet_size: usize,
    pub keep_alive_timeout: Duration,
    pub keep_alive_max: u32,
}

impl ConnectionContext {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            resolver: ResourceResolver::from_config(&cfg.static_files),
            readiness: Readiness::new(cfg.server.poll_interval()),
            max_packet_size: cfg.server.max_packet_size.max(1),
            keep_alive_timeout: cfg.server.keep_alive_timeout(),
            keep_alive_max: cfg.server.keep_alive_max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    /// Serving requests
    Active,
    /// Teardown decided
    Closing,
    /// Buffer released, socket shut down
    Closed,
}

enum Received {
    /// A request of this many bytes sits at the front of the buffer
    Request(usize),
    /// Nothing to read right now
    Idle,
    /// Peer closed its side
    Eof,
    Failed(io::Error),
}

/// One accepted client socket and the protocol state machine serving it.
pub struct Connection {
    id: u64,
    stream: TcpStream,
    ip: String,
    buffer: BytesMut,
    keep_alive: bool,
    served: u32,
    last_recv: Instant,
    state: ConnectionState,
    signals: Arc<ConnectionSignals>,
    ctx: Arc<ConnectionContext>,
}

impl Connection {
    pub fn new(
        id: u64,
        stream: TcpStream,
        peer: SocketAddr,
        ctx: Arc<ConnectionContext>,
        signals: Arc<ConnectionSignals>,
    ) -> Self {
        Self {
            id,
            stream,
            ip: peer.ip().to_string(),
            buffer: BytesMut::with_capacity(ctx.max_packet_size),
            keep_alive: false,
            served: 0,
            last_recv: Instant::now(),
            state: ConnectionState::Active,
            signals,
            ctx,
        }
    }

    /// Starts a worker for `stream` and returns the handle the registry keeps.
    pub fn spawn(
        id: u64,
        stream: TcpStream,
        peer: SocketAddr,
        ctx: Arc<ConnectionContext>,
    ) -> ConnectionHandle {
        let signals = Arc::new(ConnectionSignals::new());
        let conn = Connection::new(id, stream, peer, ctx, signals.clone());
        let worker = tokio::spawn(conn.run());
        ConnectionHandle::new(id, peer, signals, worker)
    }

    /// Runs until the connection closes, then raises `terminated`.
    ///
    /// The socket is dropped before the flag is set, so whoever observes
    /// `terminated` never races this worker for it.
    pub async fn run(mut self) {
        loop {
            match self.state {
                ConnectionState::Active => self.step().await,
                ConnectionState::Closing => self.close().await,
                ConnectionState::Closed => break,
            }
        }

        let signals = self.signals.clone();
        tracing::debug!(id = self.id, peer = %self.ip, served = self.served, "connection closed");
        drop(self);
        signals.mark_terminated();
    }

    async fn step(&mut self) {
        if self.signals.stop_requested() {
            self.state = ConnectionState::Closing;
            return;
        }

        match self.receive().await {
            Received::Request(len) => {
                self.last_recv = Instant::now();
                match self.serve(len).await {
                    Ok(true) => {}
                    Ok(false) => self.state = ConnectionState::Closing,
                    Err(e) => {
                        tracing::warn!(id = self.id, peer = %self.ip, error = %e, "send failed");
                        self.state = ConnectionState::Closing;
                    }
                }
            }
            Received::Idle => {
                // A fresh connection gets one idle window to send its first request.
                let open = self.keep_alive || self.served == 0;
                let waiting = self.last_recv.elapsed() < self.ctx.keep_alive_timeout;
                if !(open && waiting) {
                    tracing::debug!(id = self.id, peer = %self.ip, "idle timeout");
                    self.state = ConnectionState::Closing;
                }
            }
            Received::Eof => self.state = ConnectionState::Closing,
            Received::Failed(e) => {
                tracing::warn!(id = self.id, peer = %self.ip, error = %e, "receive failed");
                self.state = ConnectionState::Closing;
            }
        }

        if self.state == ConnectionState::Active {
            self.ctx.readiness.pause().await;
        }
    }

    /// Reads one request into the buffer without ever waiting on the socket.
    ///
    /// Returns `Idle` straight away when the socket is not readable. Once
    /// bytes arrive, keeps reading until the header block is complete, the
    /// buffer is full, or the peer goes quiet for a few polling intervals.
    async fn receive(&mut self) -> Received {
        self.buffer.clear();
        self.buffer.resize(self.ctx.max_packet_size, 0);
        let mut filled = 0;
        let mut retries = 0;

        loop {
            if self.signals.stop_requested() {
                return Received::Idle;
            }

            if self.ctx.readiness.readable(&self.stream).await {
                match self.stream.try_read(&mut self.buffer[filled..]) {
                    Ok(0) => return Received::Eof,
                    Ok(n) => {
                        filled += n;
                        if filled == self.buffer.len() || has_headers_end(&self.buffer[..filled]) {
                            return Received::Request(filled);
                        }
                        retries = 0;
                        continue;
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                    Err(e) => return Received::Failed(e),
                }
            } else if filled == 0 {
                return Received::Idle;
            }

            retries += 1;
            if retries >= MAX_RECV_RETRIES {
                return if filled > 0 {
                    Received::Request(filled)
                } else {
                    Received::Idle
                };
            }
            self.ctx.readiness.pause().await;
        }
    }

    /// Answers the request in the buffer. `Ok(true)` keeps the connection.
    async fn serve(&mut self, len: usize) -> anyhow::Result<bool> {
        let (response, keep_alive) = self.respond(len);

        let mut writer = ResponseWriter::new(&response);
        writer
            .write_to_stream(&self.stream, &self.ctx.readiness, &self.signals)
            .await?;

        self.served += 1;
        self.keep_alive = keep_alive;
        Ok(keep_alive)
    }

    fn respond(&self, len: usize) -> (Response, bool) {
        let request = match parse_request(&self.buffer[..len]) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(id = self.id, peer = %self.ip, error = ?e, "malformed request");
                // Only a keep-alive granted by an earlier request carries over.
                let keep_alive = self.keep_alive && self.below_max();
                let response = Response {
                    keep_alive: self.keep_alive_params(keep_alive),
                    ..Response::not_implemented()
                };
                return (response, keep_alive);
            }
        };

        let keep_alive = request.keep_alive() && self.below_max();
        let response = handle_request(
            &request,
            &self.ctx.resolver,
            self.keep_alive_params(keep_alive),
        );

        tracing::info!(
            id = self.id,
            peer = %self.ip,
            method = request.method,
            target = request.target,
            status = response.status.as_u16(),
            "request served"
        );
        (response, keep_alive)
    }

    /// Whether the response being built is not yet the last one allowed.
    fn below_max(&self) -> bool {
        self.served + 1 < self.ctx.keep_alive_max
    }

    fn keep_alive_params(&self, keep_alive: bool) -> Option<KeepAlive> {
        keep_alive.then(|| KeepAlive {
            timeout_secs: self.ctx.keep_alive_timeout.as_secs(),
            max: self.ctx.keep_alive_max,
        })
    }

    async fn close(&mut self) {
        self.buffer = BytesMut::new();
        if let Err(e) = self.stream.shutdown().await {
            tracing::trace!(id = self.id, error = %e, "socket shutdown failed");
        }
        self.state = ConnectionState::Closed;
    }
}

/// Produces exactly one response for a parsed request.
///
/// Only `GET` is served: an empty or `/` target redirects to
/// [`INDEX_PAGE`], a final path segment containing `.` is served as a file,
/// anything else as a directory listing. Every other method gets 501.
pub fn handle_request(
    request: &RequestView<'_>,
    resolver: &ResourceResolver,
    keep_alive: Option<KeepAlive>,
) -> Response {
    let response = match request.method() {
        Some(Method::GET) => serve_get(request.path(), resolver),
        _ => Response::not_implemented(),
    };

    Response {
        keep_alive,
        user_agent: request.user_agent().map(str::to_string),
        ..response
    }
}

fn serve_get(path: &str, resolver: &ResourceResolver) -> Response {
    if path.trim().is_empty() || path == "/" {
        return Response::found(INDEX_PAGE);
    }

    let segment_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[segment_start..].rfind('.') {
        Some(dot) => {
            let (name, ext) = (&path[..segment_start + dot], &path[segment_start + dot + 1..]);
            match resolver.resolve_file(name, ext) {
                Ok(body) if !body.is_empty() => ResponseBuilder::new(StatusCode::Ok)
                    .content_type(mime::content_type(&percent_decode(ext)))
                    .body(body)
                    .build(),
                Ok(_) => {
                    tracing::debug!(path, "empty file not served");
                    Response::not_found()
                }
                Err(e) => {
                    tracing::debug!(path, error = %e, "file not served");
                    Response::not_found()
                }
            }
        }
        None => match resolver.list_directory(path) {
            Ok(html) => ResponseBuilder::new(StatusCode::Ok).body(html).build(),
            Err(e) => {
                tracing::warn!(path, error = %e, "directory listing failed");
                Response::not_found()
            }
        },
    }
}
