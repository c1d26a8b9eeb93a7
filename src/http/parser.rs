use crate::http::request::RequestView;

/// Most lines (request line included) looked at in one request.
pub const MAX_REQUEST_LINES: usize = 20;

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing but whitespace was received
    Empty,
    /// The request line is not valid UTF-8 or has no space after the method
    InvalidRequestLine,
}

/// Parses the request line and headers out of the received bytes.
///
/// Lines are split on CRLF and never read past `buf`. Parsing stops at the
/// blank line ending the header block or after [`MAX_REQUEST_LINES`] lines.
/// Header lines that are not UTF-8 or have no `:` are skipped.
pub fn parse_request(buf: &[u8]) -> Result<RequestView<'_>, ParseError> {
    let mut lines = Lines { rest: buf }.take(MAX_REQUEST_LINES);

    let request_line = lines.next().ok_or(ParseError::Empty)?;
    let request_line =
        std::str::from_utf8(request_line).map_err(|_| ParseError::InvalidRequestLine)?;
    if request_line.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    // A method with no separator after it carries no target at all.
    let (method, rest) = request_line
        .split_once(' ')
        .ok_or(ParseError::InvalidRequestLine)?;
    // Split on single spaces so `GET  HTTP/1.1` yields an empty target.
    let (target, version) = rest.split_once(' ').unwrap_or((rest, ""));
    let version = version.trim();

    let mut headers = Vec::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        let Ok(line) = std::str::from_utf8(line) else {
            continue;
        };
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name, value.trim()));
        }
    }

    Ok(RequestView {
        method,
        target,
        version,
        headers,
    })
}

/// Whether `buf` holds a complete header block.
pub fn has_headers_end(buf: &[u8]) -> bool {
    buf.windows(4).any(|w| w == b"\r\n\r\n")
}

struct Lines<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        match self.rest.windows(2).position(|w| w == b"\r\n") {
            Some(end) => {
                let line = &self.rest[..end];
                self.rest = &self.rest[end + 2..];
                Some(line)
            }
            None => {
                let line = self.rest;
                self.rest = &[];
                Some(line)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";

        let parsed = parse_request(req).unwrap();

        assert_eq!(parsed.method, "GET");
        assert_eq!(parsed.target, "/");
        assert_eq!(parsed.version, "HTTP/1.1");
        assert_eq!(parsed.header("Host"), Some("example.com"));
    }

    #[test]
    fn empty_target_is_preserved() {
        let parsed = parse_request(b"GET  HTTP/1.1\r\n\r\n").unwrap();

        assert_eq!(parsed.target, "");
        assert_eq!(parsed.version, "HTTP/1.1");
    }

    #[test]
    fn header_count_is_bounded() {
        let mut req = String::from("GET / HTTP/1.1\r\n");
        for i in 0..40 {
            req.push_str(&format!("X-{}: {}\r\n", i, i));
        }
        req.push_str("\r\n");

        let parsed = parse_request(req.as_bytes()).unwrap();

        assert_eq!(parsed.headers.len(), MAX_REQUEST_LINES - 1);
    }

    #[test]
    fn stops_at_blank_line() {
        let parsed = parse_request(b"GET /a.txt HTTP/1.1\r\nA: 1\r\n\r\nB: 2\r\n").unwrap();

        assert_eq!(parsed.headers, vec![("A", "1")]);
    }

    #[test]
    fn whitespace_only_is_empty() {
        assert_eq!(parse_request(b"").unwrap_err(), ParseError::Empty);
        assert_eq!(parse_request(b"   \r\n\r\n").unwrap_err(), ParseError::Empty);
    }

    #[test]
    fn unterminated_buffer_is_read_to_its_end() {
        let parsed = parse_request(b"GET /x.html HTTP/1.1\r\nUser-Agent: cu").unwrap();

        assert_eq!(parsed.user_agent(), Some("cu"));
    }
}
