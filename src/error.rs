//! Categorized error types.

use std::io;

use thiserror::Error;

/// Why the server entered the `Shutdown` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    AddressParse,
    SocketCreate,
    Bind,
    Listen,
    AcceptFailed,
    Requested,
}

impl ShutdownReason {
    /// Log line reported when shutting down for this reason.
    pub fn message(&self) -> &'static str {
        match self {
            ShutdownReason::AddressParse => "Failed parsing bind address",
            ShutdownReason::SocketCreate => "Failed to create socket",
            ShutdownReason::Bind => "Failed binding socket",
            ShutdownReason::Listen => "Failed listening on socket",
            ShutdownReason::AcceptFailed => "Accept loop failed",
            ShutdownReason::Requested => "Shutdown requested",
        }
    }
}

/// Transport setup failure. Always fatal.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("invalid bind address {0:?}")]
    AddressParse(String),

    #[error("failed to create socket: {0}")]
    SocketCreate(#[source] io::Error),

    #[error("failed to bind socket: {0}")]
    Bind(#[source] io::Error),

    #[error("failed to listen on socket: {0}")]
    Listen(#[source] io::Error),

    #[error("server already started")]
    AlreadyStarted,
}

impl StartupError {
    /// Shutdown category for failures that abort startup. `AlreadyStarted`
    /// leaves the running server untouched and has none.
    pub fn reason(&self) -> Option<ShutdownReason> {
        match self {
            StartupError::AddressParse(_) => Some(ShutdownReason::AddressParse),
            StartupError::SocketCreate(_) => Some(ShutdownReason::SocketCreate),
            StartupError::Bind(_) => Some(ShutdownReason::Bind),
            StartupError::Listen(_) => Some(ShutdownReason::Listen),
            StartupError::AlreadyStarted => None,
        }
    }
}

/// Failure to produce content for a request target.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("resource not found")]
    NotFound,

    #[error("resource is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("path escapes the served root")]
    Forbidden,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
