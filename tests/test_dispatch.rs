use std::fs;

use lantern::http::connection::{INDEX_PAGE, handle_request};
use lantern::http::parser::parse_request;
use lantern::http::response::{KeepAlive, Response, StatusCode};
use lantern::resource::ResourceResolver;
use tempfile::TempDir;

const KEEP_ALIVE: KeepAlive = KeepAlive {
    timeout_secs: 5,
    max: 100,
};

fn site() -> (TempDir, ResourceResolver) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), b"<html>hello</html>").unwrap();
    fs::write(dir.path().join("style.CSS"), b"body{}").unwrap();
    fs::write(dir.path().join("empty.txt"), b"").unwrap();
    fs::write(dir.path().join("large.bin"), vec![0u8; 2048]).unwrap();
    fs::create_dir(dir.path().join("pub")).unwrap();
    fs::write(dir.path().join("pub").join("notes.txt"), b"notes").unwrap();
    let resolver = ResourceResolver::new(dir.path(), 1024, 4096);
    (dir, resolver)
}

fn respond(resolver: &ResourceResolver, raw: &[u8]) -> Response {
    let request = parse_request(raw).unwrap();
    handle_request(&request, resolver, None)
}

#[test]
fn test_root_redirects_to_index() {
    let (_dir, resolver) = site();

    for raw in [&b"GET / HTTP/1.1\r\n\r\n"[..], &b"GET  HTTP/1.1\r\n\r\n"[..]] {
        let response = respond(&resolver, raw);
        assert_eq!(response.status, StatusCode::Found);
        assert_eq!(response.location.as_deref(), Some(INDEX_PAGE));
        assert!(response.body.is_empty());
    }
}

#[test]
fn test_redirect_regardless_of_keep_alive() {
    let (_dir, resolver) = site();
    let request = parse_request(b"GET / HTTP/1.1\r\nConnection: keep-alive\r\n\r\n").unwrap();

    let response = handle_request(&request, &resolver, Some(KEEP_ALIVE));

    assert_eq!(response.status, StatusCode::Found);
    assert_eq!(response.keep_alive, Some(KEEP_ALIVE));
    assert!(
        response
            .build_header_at("d")
            .contains("Location:/index.html\r\n")
    );
}

#[test]
fn test_existing_file_is_served() {
    let (_dir, resolver) = site();

    let response = respond(&resolver, b"GET /index.html HTTP/1.1\r\n\r\n");

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.content_type, "text/html");
    assert_eq!(response.body, b"<html>hello</html>");
    assert_eq!(response.content_length(), 18);
}

#[test]
fn test_extension_lookup_ignores_case() {
    let (_dir, resolver) = site();

    let response = respond(&resolver, b"GET /style.CSS HTTP/1.1\r\n\r\n");

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.content_type, "text/css");
}

#[test]
fn test_missing_empty_and_large_files_are_404() {
    let (_dir, resolver) = site();

    for target in ["/missing.txt", "/empty.txt", "/large.bin"] {
        let raw = format!("GET {} HTTP/1.1\r\n\r\n", target);
        let response = respond(&resolver, raw.as_bytes());
        assert_eq!(response.status, StatusCode::NotFound, "target {}", target);
        assert!(response.body.is_empty());
    }
}

#[test]
fn test_traversal_is_404() {
    let (_dir, resolver) = site();

    let response = respond(&resolver, b"GET /../../etc/passwd.txt HTTP/1.1\r\n\r\n");

    assert_eq!(response.status, StatusCode::NotFound);
}

#[test]
fn test_query_string_is_ignored() {
    let (_dir, resolver) = site();

    let response = respond(&resolver, b"GET /index.html?v=2 HTTP/1.1\r\n\r\n");

    assert_eq!(response.status, StatusCode::Ok);
}

#[test]
fn test_directory_listing() {
    let (_dir, resolver) = site();

    let response = respond(&resolver, b"GET /pub HTTP/1.1\r\n\r\n");

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.content_type, "text/html");
    let html = String::from_utf8(response.body).unwrap();
    assert!(html.contains("Index of /pub"));
    assert!(html.contains("notes.txt"));
}

#[test]
fn test_failed_listing_is_404() {
    let (_dir, resolver) = site();

    let response = respond(&resolver, b"GET /nowhere HTTP/1.1\r\n\r\n");

    assert_eq!(response.status, StatusCode::NotFound);
}

#[test]
fn test_other_methods_not_implemented() {
    let (_dir, resolver) = site();

    for method in ["POST", "PUT", "DELETE", "HEAD", "BREW"] {
        let raw = format!("{} /index.html HTTP/1.1\r\n\r\n", method);
        let response = respond(&resolver, raw.as_bytes());
        assert_eq!(response.status, StatusCode::NotImplemented, "method {}", method);
    }
}

#[test]
fn test_user_agent_is_echoed() {
    let (_dir, resolver) = site();

    let response = respond(
        &resolver,
        b"GET /index.html HTTP/1.1\r\nUser-Agent: probe/1.0\r\n\r\n",
    );

    assert_eq!(response.user_agent.as_deref(), Some("probe/1.0"));
    assert!(
        response
            .build_header_at("d")
            .contains("User-Agent:probe/1.0\r\n")
    );
}

#[test]
fn test_repeat_requests_are_identical() {
    let (_dir, resolver) = site();
    let raw = b"GET /index.html HTTP/1.1\r\n\r\n";

    let first = respond(&resolver, raw);
    let second = respond(&resolver, raw);

    assert_eq!(first, second);
    assert_eq!(first.build_header_at("d"), second.build_header_at("d"));
}
