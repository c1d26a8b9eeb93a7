//! Listening socket, accept loop, and the registry of live connections.

pub mod listener;
pub mod poll;
pub mod registry;

pub use listener::{Server, ServerState};
pub use registry::{ConnectionHandle, ConnectionInfo, Registry};
