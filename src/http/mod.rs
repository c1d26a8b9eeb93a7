//! HTTP protocol implementation.
//!
//! A deliberately small HTTP/1.1 subset: `GET` only, one request in flight
//! per connection, optional keep-alive.
//!
//! # Architecture
//!
//! - **`connection`**: per-client worker running the request/response state machine
//! - **`parser`**: splits received bytes into a borrowed request view
//! - **`request`**: the request view and method tokens
//! - **`response`**: status codes, the response type, and header serialization
//! - **`writer`**: pushes a serialized response through a non-blocking socket
//! - **`mime`**: Content-Type lookup by file extension
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Active    │ ← receive, parse, dispatch, send; repeat
//!        └──────┬──────┘
//!               │ EOF, I/O error, idle timeout,
//!               │ stop request, or Connection: close
//!               ▼
//!        ┌─────────────┐
//!        │   Closing   │ ← release buffer, shut the socket down
//!        └──────┬──────┘
//!               ▼
//!        ┌─────────────┐
//!        │   Closed    │ → worker exits and raises `terminated`
//!        └─────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lantern::config::Config;
//! use lantern::http::connection::{Connection, ConnectionContext};
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = Arc::new(ConnectionContext::from_config(&Config::default()));
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     let (socket, peer) = listener.accept().await?;
//!     let handle = Connection::spawn(1, socket, peer, ctx);
//!     handle.join(std::time::Duration::from_secs(30)).await;
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
