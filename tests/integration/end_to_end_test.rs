//! End-to-end tests: files on disk through parse, resolve and execute.

use super::{init_test_env, ScriptedTransport};
use restfile::capture::ResponseStore;
use restfile::config::{load_config, EngineConfig};
use restfile::executor::ChainExecutor;
use restfile::models::{DiagnosticCode, Headers, Severity};
use restfile::parser::{parse, parse_with_config, ParseError};
use restfile::variables::{resolve_template, VariableScope};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to create a temporary .http file
fn create_temp_http_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let file_path = dir.path().join(name);
    fs::write(&file_path, content).expect("Failed to write test file");
    file_path
}

#[test]
fn test_reference_example_document() {
    init_test_env();
    let content = "@baseUrl = https://api.example.com\n\n### Login\n# @name login\nPOST {{baseUrl}}/login\nContent-Type: application/json\n\n{\"user\":\"a\"}\n\n### Profile\nGET {{baseUrl}}/profile\nAuthorization: Bearer {{login.response.body.$.token}}\n";
    let file = parse(content, "api.http").unwrap();

    assert_eq!(file.requests.len(), 2);
    assert_eq!(file.requests[0].name.as_deref(), Some("login"));
    assert!(file.requests[0].depends_on.is_empty());
    assert!(!file.requests[0].has_response_references);
    assert_eq!(file.requests[1].depends_on, vec!["login".to_string()]);
    assert!(file.requests[1].has_response_references);
    assert_eq!(file.requests[0].separator_title.as_deref(), Some("Login"));
    assert_eq!(file.requests[1].separator_title.as_deref(), Some("Profile"));
}

#[test]
fn test_file_body_from_disk() {
    init_test_env();
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("payload.json"), r#"{"name":"{{raw}}"}"#).unwrap();
    let content = "# @name upload\nPOST https://api.example.com/upload\nContent-Type: application/json\n\n< ./payload.json\n";
    let path = create_temp_http_file(&temp_dir, "upload.http", content);

    let file = parse(&fs::read_to_string(&path).unwrap(), &path).unwrap();
    assert_eq!(file.requests[0].body_file_path(), Some("./payload.json"));

    let transport = ScriptedTransport::new().route(
        "POST",
        "https://api.example.com/upload",
        201,
        &[("Location", "/uploads/7")],
        "",
    );
    let mut executor = ChainExecutor::new(transport);
    executor.execute(&file, 0).unwrap();

    // File bodies are sent as-is, without placeholder resolution.
    let sent = executor.transport().sent();
    assert_eq!(sent[0].body_text().as_deref(), Some(r#"{"name":"{{raw}}"}"#));
    assert_eq!(
        executor.store().resolve_all("{{upload.response.headers.location}}"),
        "/uploads/7"
    );
    assert_eq!(
        executor.store().resolve_all("{{upload.request.body.$.name}}"),
        "{{raw}}"
    );
}

#[test]
fn test_body_base_dir_from_settings() {
    let bodies = TempDir::new().unwrap();
    fs::write(bodies.path().join("data.txt"), "payload").unwrap();

    let config = load_config(Some(json!({
        "restfile": { "bodyBaseDir": bodies.path() }
    })))
    .unwrap();

    let file = parse("POST https://a.example.com/\n\n< data.txt\n", "/elsewhere/x.http").unwrap();
    let transport = ScriptedTransport::new().route("POST", "https://a.example.com/", 200, &[], "");
    let mut executor = ChainExecutor::with_config(transport, &config);
    executor.execute(&file, 0).unwrap();
    assert_eq!(
        executor.transport().sent()[0].body,
        Some(b"payload".to_vec())
    );
}

#[test]
fn test_additional_methods_from_settings() {
    let config = load_config(Some(json!({
        "restfile": { "additionalMethods": ["purge"] }
    })))
    .unwrap();
    let content = "PURGE https://cdn.example.com/a\n###\nLINK https://cdn.example.com/b\n";

    let default = parse(content, "cdn.http").unwrap();
    assert_eq!(default.warnings().count(), 2);

    let configured = parse_with_config(content, "cdn.http", &config).unwrap();
    assert_eq!(configured.requests.len(), 2);
    assert_eq!(configured.warnings().count(), 1);
    assert_eq!(configured.diagnostics[0].code, DiagnosticCode::UnknownMethod);
    assert_eq!(configured.diagnostics[0].line, 3);
}

#[test]
fn test_parse_error_handling() {
    assert_eq!(parse("GET https://a.example.com", "").unwrap_err(), ParseError::EmptyPath);
    assert!(parse_with_config("", "empty.http", &EngineConfig::default())
        .unwrap()
        .requests
        .is_empty());
}

#[test]
fn test_broken_file_still_yields_requests() {
    let content = r#"
@ broken
### First
GET https://a.example.com/1
Accept application/json
X-Ok: yes

###
POST
###
PUT https://a.example.com/3

< ./body.json
trailing line
"#;
    let file = parse(content, "broken.http").unwrap();

    assert_eq!(file.requests.len(), 2);
    assert_eq!(file.requests[0].headers.len(), 1);
    assert_eq!(file.requests[1].method, "PUT");
    assert_eq!(file.requests[1].body_file_path(), Some("./body.json"));

    let summary: Vec<(DiagnosticCode, Severity, usize)> = file
        .diagnostics
        .iter()
        .map(|d| (d.code, d.severity, d.line))
        .collect();
    assert_eq!(
        summary,
        vec![
            (DiagnosticCode::Variable, Severity::Error, 2),
            (DiagnosticCode::Header, Severity::Error, 5),
            (DiagnosticCode::RequestLine, Severity::Error, 9),
            (DiagnosticCode::Body, Severity::Warning, 14),
        ]
    );
}

#[test]
fn test_resolution_without_execution() {
    // Preview tooling resolves templates before anything has been captured.
    let file = parse(
        "@host = api.example.com\n\nGET https://{{host}}/items/{{list.response.body.$[0].id}}?t={{$timestamp}}\n",
        "preview.http",
    )
    .unwrap();
    let request = &file.requests[0];
    let scope = VariableScope::for_request(&file, request);
    let store = ResponseStore::new();

    let url = resolve_template(&request.url, &scope, &store);
    assert!(url.starts_with("https://api.example.com/items/{{list.response.body.$[0].id}}?t="));
    let timestamp: i64 = url.rsplit('=').next().unwrap().parse().unwrap();
    assert!(timestamp > 1_577_836_800);

    let mut store = ResponseStore::new();
    store.capture("list", 200, r#"[{"id":"first"}]"#, Headers::new(), None);
    let url = resolve_template(&request.url, &scope, &store);
    assert!(url.starts_with("https://api.example.com/items/first?t="));
}
