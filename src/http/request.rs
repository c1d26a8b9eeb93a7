/// HTTP request methods.
///
/// Only `GET` is served. Every other method is recognised so it can be
/// logged, then answered with 501 Not Implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// PATCH - Partial modification of a resource
    PATCH,
}

impl Method {
    /// Parses an HTTP method token.
    ///
    /// # Example
    ///
    /// ```
    /// # use lantern::http::request::Method;
    /// assert_eq!(Method::from_token("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_token("get"), None);
    /// ```
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "HEAD" => Some(Method::HEAD),
            "OPTIONS" => Some(Method::OPTIONS),
            "PATCH" => Some(Method::PATCH),
            _ => None,
        }
    }
}

/// A request parsed in place from a connection's receive buffer.
///
/// Every field borrows from the received bytes; the view lives only as long
/// as the buffer it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestView<'a> {
    /// Raw method token, e.g. `"GET"`
    pub method: &'a str,
    /// Request target as sent, possibly empty
    pub target: &'a str,
    /// Version token, empty when the request line omitted it
    pub version: &'a str,
    /// Header lines in arrival order
    pub headers: Vec<(&'a str, &'a str)>,
}

impl<'a> RequestView<'a> {
    pub fn method(&self) -> Option<Method> {
        Method::from_token(self.method)
    }

    /// First header whose name matches `name` exactly.
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    /// Whether the client asked to keep the connection open.
    ///
    /// Only `Connection: keep-alive` does; any other value, or no header at
    /// all, means close after the response.
    pub fn keep_alive(&self) -> bool {
        self.header("Connection")
            .map(|v| v.eq_ignore_ascii_case("keep-alive"))
            .unwrap_or(false)
    }

    pub fn user_agent(&self) -> Option<&'a str> {
        self.header("User-Agent").filter(|v| !v.is_empty())
    }

    /// Target without its query string.
    pub fn path(&self) -> &'a str {
        match self.target.split_once('?') {
            Some((path, _)) => path,
            None => self.target,
        }
    }
}
