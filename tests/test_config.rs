use std::collections::HashMap;
use std::io::Write;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use lantern::config::{BindAddress, Config};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_config_defaults() {
    let cfg = Config::load_from(lookup(&[])).unwrap();

    assert_eq!(cfg, Config::default());
    assert_eq!(cfg.server.listen_addr, "ANY");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.server.keep_alive_timeout(), Duration::from_secs(5));
    assert_eq!(cfg.static_files.root, PathBuf::from("."));
}

#[test]
fn test_config_env_overrides() {
    let cfg = Config::load_from(lookup(&[
        ("LISTEN", "127.0.0.1"),
        ("PORT", "3000"),
        ("ROOT", "/srv/www"),
        ("MAX_CONNECTIONS", "8"),
    ]))
    .unwrap();

    assert_eq!(cfg.server.listen_addr, "127.0.0.1");
    assert_eq!(cfg.server.port, 3000);
    assert_eq!(cfg.static_files.root, PathBuf::from("/srv/www"));
    assert_eq!(cfg.server.max_connections, 8);
}

#[test]
fn test_config_invalid_port() {
    let err = Config::load_from(lookup(&[("PORT", "eighty")])).unwrap_err();

    assert!(err.to_string().contains("PORT"));
}

#[test]
fn test_config_from_yaml() {
    let cfg = Config::from_yaml_str(
        "server:\n  port: 9000\n  keep_alive_max: 3\nstatic_files:\n  max_file_size: 10\n",
    )
    .unwrap();

    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.server.keep_alive_max, 3);
    assert_eq!(cfg.static_files.max_file_size, 10);
    // Unspecified fields keep their defaults.
    assert_eq!(cfg.server.listen_addr, "ANY");
    assert_eq!(cfg.server.max_packet_size, 4096);
}

#[test]
fn test_config_file_then_env() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "server:\n  port: 9000\n  listen_addr: 10.0.0.1").unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let cfg = Config::load_from(lookup(&[("LANTERN_CONFIG", path.as_str()), ("PORT", "9100")])).unwrap();

    assert_eq!(cfg.server.listen_addr, "10.0.0.1");
    assert_eq!(cfg.server.port, 9100);
}

#[test]
fn test_config_missing_file() {
    let result = Config::load_from(lookup(&[("LANTERN_CONFIG", "/nonexistent/lantern.yaml")]));

    assert!(result.is_err());
}

#[test]
fn test_bind_address_parse() {
    assert_eq!(
        BindAddress::parse("ANY"),
        Some(BindAddress(Ipv4Addr::UNSPECIFIED))
    );
    assert_eq!(
        BindAddress::parse("127.0.0.1"),
        Some(BindAddress(Ipv4Addr::LOCALHOST))
    );
    assert_eq!(BindAddress::parse("any"), None);
    assert_eq!(BindAddress::parse("::1"), None);
    assert_eq!(BindAddress::parse("300.1.1.1"), None);
}
