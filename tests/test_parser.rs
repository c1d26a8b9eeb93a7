use lantern::http::parser::{ParseError, has_headers_end, parse_request};

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.method, "GET");
    assert_eq!(parsed.target, "/");
    assert_eq!(parsed.version, "HTTP/1.1");
    assert_eq!(parsed.header("Host"), Some("example.com"));
}

#[test]
fn test_parse_multiple_headers_in_order() {
    let req = b"GET /path HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test-client\r\nAccept: */*\r\n\r\n";
    let parsed = parse_request(req).unwrap();

    assert_eq!(
        parsed.headers,
        vec![
            ("Host", "example.com"),
            ("User-Agent", "test-client"),
            ("Accept", "*/*"),
        ]
    );
}

#[test]
fn test_parse_missing_path() {
    let parsed = parse_request(b"GET  HTTP/1.1\r\n\r\n").unwrap();

    assert_eq!(parsed.method, "GET");
    assert_eq!(parsed.target, "");
}

#[test]
fn test_parse_method_then_space_has_empty_target() {
    let parsed = parse_request(b"GET \r\n\r\n").unwrap();

    assert_eq!(parsed.method, "GET");
    assert_eq!(parsed.target, "");
    assert_eq!(parsed.version, "");
}

#[test]
fn test_parse_bare_method_rejected() {
    let result = parse_request(b"GET\r\n\r\n");

    assert!(matches!(result, Err(ParseError::InvalidRequestLine)));
}

#[test]
fn test_parse_unknown_method_is_kept_verbatim() {
    let parsed = parse_request(b"BREW /pot HTTP/1.1\r\n\r\n").unwrap();

    assert_eq!(parsed.method, "BREW");
    assert_eq!(parsed.method(), None);
}

#[test]
fn test_parse_malformed_header_is_skipped() {
    let req = b"GET / HTTP/1.1\r\nBrokenHeader\r\nHost: a\r\n\r\n";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.headers, vec![("Host", "a")]);
}

#[test]
fn test_parse_header_value_is_trimmed() {
    let parsed = parse_request(b"GET / HTTP/1.1\r\nConnection:   keep-alive  \r\n\r\n").unwrap();

    assert_eq!(parsed.header("Connection"), Some("keep-alive"));
}

#[test]
fn test_parse_ignores_body() {
    let req = b"POST /api HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.method, "POST");
    assert_eq!(parsed.headers, vec![("Content-Length", "5")]);
}

#[test]
fn test_parse_binary_request_line_rejected() {
    let result = parse_request(b"\xff\xfe / HTTP/1.1\r\n\r\n");

    assert!(matches!(result, Err(ParseError::InvalidRequestLine)));
}

#[test]
fn test_parse_empty_buffer() {
    assert!(matches!(parse_request(b""), Err(ParseError::Empty)));
}

#[test]
fn test_headers_end_detection() {
    assert!(has_headers_end(b"GET / HTTP/1.1\r\n\r\n"));
    assert!(!has_headers_end(b"GET / HTTP/1.1\r\nHost: a\r\n"));
}
