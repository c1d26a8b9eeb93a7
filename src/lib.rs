//! Lantern - minimal HTTP/1.1 static file server
//!
//! Accepts raw TCP connections, parses GET requests by hand, and serves
//! files or directory listings over keep-alive connections.

pub mod config;
pub mod error;
pub mod http;
pub mod log;
pub mod resource;
pub mod server;
