use std::fmt::Write;

use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, Local, TimeZone};

pub const HTTP_VERSION: &str = "HTTP/1.1";
pub const SERVER_NAME: &str = "Lantern";
pub const SERVER_MAJOR: &str = env!("CARGO_PKG_VERSION_MAJOR");
pub const SERVER_MINOR: &str = env!("CARGO_PKG_VERSION_MINOR");

/// Content type of generated pages and empty status responses.
pub const HTML_CONTENT_TYPE: &str = "text/html";

/// HTTP status codes the server can answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 102 Processing
    Processing,
    /// 200 OK
    Ok,
    /// 202 Accepted
    Accepted,
    /// 302 Found
    Found,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
    /// 501 Not Implemented
    NotImplemented,
    /// 503 Service Unavailable
    ServiceUnavailable,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use lantern::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotImplemented.as_u16(), 501);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Processing => 102,
            StatusCode::Ok => 200,
            StatusCode::Accepted => 202,
            StatusCode::Found => 302,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
            StatusCode::NotImplemented => 501,
            StatusCode::ServiceUnavailable => 503,
        }
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Processing => "Processing",
            StatusCode::Ok => "OK",
            StatusCode::Accepted => "Accepted",
            StatusCode::Found => "Found",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }
}

/// Parameters advertised in the `Keep-Alive` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAlive {
    pub timeout_secs: u64,
    pub max: u32,
}

/// A complete response, ready to be serialized onto a socket.
///
/// `keep_alive` selects between `Connection:keep-alive` (plus the
/// `Keep-Alive` parameter line) and `Connection:close`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub keep_alive: Option<KeepAlive>,
    pub content_type: &'static str,
    pub location: Option<String>,
    pub user_agent: Option<String>,
    pub body: Vec<u8>,
}

/// Builder for constructing responses in a fluent style.
///
/// # Example
///
/// ```
/// # use lantern::http::response::{ResponseBuilder, StatusCode};
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .content_type("text/plain")
///     .body(b"hi".to_vec())
///     .build();
/// assert_eq!(response.content_length(), 2);
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    keep_alive: Option<KeepAlive>,
    content_type: &'static str,
    location: Option<String>,
    user_agent: Option<String>,
    body: Vec<u8>,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            keep_alive: None,
            content_type: HTML_CONTENT_TYPE,
            location: None,
            user_agent: None,
            body: Vec::new(),
        }
    }

    pub fn keep_alive(mut self, keep_alive: Option<KeepAlive>) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn content_type(mut self, content_type: &'static str) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Echoes the client's `User-Agent` back, if it sent one.
    pub fn user_agent(mut self, user_agent: Option<&str>) -> Self {
        self.user_agent = user_agent.map(str::to_string);
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn build(self) -> Response {
        Response {
            status: self.status,
            keep_alive: self.keep_alive,
            content_type: self.content_type,
            location: self.location,
            user_agent: self.user_agent,
            body: self.body,
        }
    }
}

impl Response {
    /// 302 pointing at `location`, with an empty body.
    pub fn found(location: impl Into<String>) -> Self {
        ResponseBuilder::new(StatusCode::Found)
            .location(location)
            .build()
    }

    /// 404 with an empty body.
    pub fn not_found() -> Self {
        ResponseBuilder::new(StatusCode::NotFound).build()
    }

    /// 501 with an empty body.
    pub fn not_implemented() -> Self {
        ResponseBuilder::new(StatusCode::NotImplemented).build()
    }

    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    /// Header block stamped with today's local date.
    pub fn build_header(&self) -> String {
        self.build_header_at(&http_date(&Local::now()))
    }

    /// Header block with a caller-supplied `Date` value.
    ///
    /// Field order is fixed: status line, Connection (and Keep-Alive),
    /// Server, Date, Content-Type, Content-Length, then Location and
    /// User-Agent when present, then the blank line.
    pub fn build_header_at(&self, date: &str) -> String {
        let mut head = String::with_capacity(256);
        // Writing to a String cannot fail.
        let _ = write!(
            head,
            "{} {} {}\r\n",
            HTTP_VERSION,
            self.status.as_u16(),
            self.status.reason_phrase()
        );
        match self.keep_alive {
            Some(ka) => {
                let _ = write!(
                    head,
                    "Connection:keep-alive\r\nKeep-Alive:timeout={}, max={}\r\n",
                    ka.timeout_secs, ka.max
                );
            }
            None => head.push_str("Connection:close\r\n"),
        }
        let _ = write!(
            head,
            "Server:{}/{}.{}\r\nDate:{}\r\nContent-Type:{}\r\nContent-Length:{}\r\n",
            SERVER_NAME,
            SERVER_MAJOR,
            SERVER_MINOR,
            date,
            self.content_type,
            self.content_length()
        );
        if let Some(location) = &self.location {
            let _ = write!(head, "Location:{}\r\n", location);
        }
        if let Some(agent) = &self.user_agent {
            let _ = write!(head, "User-Agent:{}\r\n", agent);
        }
        head.push_str("\r\n");
        head
    }

    /// Header plus body in one buffer.
    pub fn to_bytes(&self) -> Bytes {
        append_body(&self.build_header(), &self.body)
    }
}

/// Concatenates header text and body into a buffer of exactly
/// `header.len() + body.len()` bytes.
pub fn append_body(header: &str, body: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(header.len() + body.len());
    buf.put_slice(header.as_bytes());
    buf.put_slice(body);
    buf.freeze()
}

/// Formats the `Date` header value, e.g. `Sat, 17 Oct 2026`.
pub fn http_date<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format("%a, %d %b %Y").to_string()
}
