use std::io;

use bytes::Bytes;
use tokio::net::TcpStream;

use crate::http::connection::ConnectionSignals;
use crate::http::response::Response;
use crate::server::poll::Readiness;

/// Tracks how much of a serialized response has reached the socket.
pub struct ResponseWriter {
    buffer: Bytes,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self::from_bytes(response.to_bytes())
    }

    pub fn from_bytes(buffer: Bytes) -> Self {
        Self { buffer, written: 0 }
    }

    /// Sends the whole buffer, accumulating partial writes.
    ///
    /// Only writes while the socket reports writable and pauses one polling
    /// interval between attempts. Would-block is retried; any other error,
    /// a zero-length write, or a stop request ends the attempt.
    pub async fn write_to_stream(
        &mut self,
        stream: &TcpStream,
        readiness: &Readiness,
        signals: &ConnectionSignals,
    ) -> anyhow::Result<()> {
        while self.written < self.buffer.len() {
            if signals.stop_requested() {
                anyhow::bail!("stop requested while writing");
            }

            if readiness.writable(stream).await {
                match stream.try_write(&self.buffer[self.written..]) {
                    Ok(0) => {
                        return Err(anyhow::anyhow!("connection closed while writing"));
                    }
                    Ok(n) => {
                        self.written += n;
                        continue;
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                    Err(e) => return Err(e.into()),
                }
            }

            readiness.pause().await;
        }

        Ok(())
    }
}
