//! Loading configuration from disk.

use comedia_client::{ClientConfig, ConfigError, HttpBackend};
use std::io::Write;
use std::time::Duration;

#[test]
fn file_values_flow_into_backend_and_gateway() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
api_url = "http://comedia.test:8080/"
request_timeout_secs = 3

[gateway]
origin = "http://comedia.test:8080/"
cache_name = "metodo-comedia-v2"
precache = ["/", "/static/js/app.js"]
"#
    )
    .unwrap();

    let config = ClientConfig::from_file(file.path()).unwrap();
    assert_eq!(config.timeout(), Duration::from_secs(3));
    assert_eq!(config.gateway.precache, ["/", "/static/js/app.js"]);
    assert_eq!(config.gateway.root_document, "/");

    let backend = HttpBackend::from_config(&config).unwrap();
    assert_eq!(backend.base().as_str(), "http://comedia.test:8080/");
    assert_eq!(
        config.gateway.root_url().unwrap().as_str(),
        "http://comedia.test:8080/"
    );
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("comedia.toml");
    let err = ClientConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("comedia.toml"));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[gateway\ncache_name = 1").unwrap();
    assert!(matches!(
        ClientConfig::from_file(file.path()),
        Err(ConfigError::Parse(_))
    ));
}
