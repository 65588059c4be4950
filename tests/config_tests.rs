//! Configuration files driving a running server

mod common;

use common::*;
use rental::prelude::*;
use serde_json::Value;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(yaml.as_bytes())
        .expect("Failed to write config");
    file
}

#[tokio::test]
async fn test_yaml_file_drives_pagination() {
    let file = write_config(
        r#"
server:
  request_timeout_ms: 2000
pagination:
  default_limit: 2
  max_limit: 4
"#,
    );
    let path = file.path().to_str().expect("utf-8 path");
    let config = RentalConfig::from_yaml_file(path).expect("Failed to load config");

    assert_eq!(config.server.bind, "127.0.0.1:3000");
    assert_eq!(config.request_timeout().as_millis(), 2000);
    assert_eq!(config.reports.items_sheet, "Items");

    let server = test_server_with(config);
    let category = create_category(&server, "Tools").await;
    for i in 0..6 {
        create_item(&server, category, &format!("Tool {}", i)).await;
    }

    let page: Vec<Value> = server.get("/items").await.json();
    assert_eq!(page.len(), 2);
    let capped: Vec<Value> = server.get("/items").add_query_param("limit", 10).await.json();
    assert_eq!(capped.len(), 4);
    let count: Value = server.get("/items/count").await.json();
    assert_eq!(count["count"], 6);
}

#[test]
fn test_invalid_file_is_rejected() {
    let file = write_config("pagination:\n  default_limit: 50\n  max_limit: 10\n");
    let path = file.path().to_str().expect("utf-8 path");

    let err = RentalConfig::from_yaml_file(path).unwrap_err();
    assert!(err.to_string().contains("invalid config file"));
}

#[test]
fn test_missing_file_is_rejected() {
    let err = RentalConfig::from_yaml_file("/nonexistent/rental.yaml").unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));
}

#[test]
fn test_sample_config_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/rental.yaml");
    let config = RentalConfig::from_yaml_file(path).expect("sample config is valid");
    assert!(config.pagination.default_limit <= config.pagination.max_limit);
}
