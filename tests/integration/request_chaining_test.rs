//! Request chaining workflows: parse, order, execute and capture.

use super::{init_test_env, ScriptedTransport};
use restfile::executor::{ChainExecutor, RequestError};
use restfile::graph::execution_order;
use restfile::parser::parse;
use restfile::variables::DynamicResolver;
use std::collections::HashMap;

const AUTH_FLOW: &str = r#"@baseUrl = https://api.example.com
@contentType = application/json

### Profile (declared first, runs second)
# @name profile
GET {{baseUrl}}/users/{{login.response.body.$.user.id}}
Authorization: Bearer {{login.response.body.$.token}}
X-Session: {{login.response.headers.X-Session-Id}}

### Login
# @name login
POST {{baseUrl}}/login
Content-Type: {{contentType}}

{"user":"alice","requestId":"{{$guid}}"}

### Audit
@actor = {{profile.response.body.$.name}}
POST {{baseUrl}}/audit
Content-Type: {{contentType}}

{"actor":"{{actor}}","sentAs":"{{login.request.body.$.user}}"}
"#;

fn auth_transport() -> ScriptedTransport {
    ScriptedTransport::new()
        .route(
            "POST",
            "https://api.example.com/login",
            200,
            &[("Content-Type", "application/json"), ("X-Session-Id", "sess-9")],
            r#"{"token":"tok-1","user":{"id":42}}"#,
        )
        .route(
            "GET",
            "https://api.example.com/users/42",
            200,
            &[("Content-Type", "application/json")],
            r#"{"name":"Alice"}"#,
        )
        .route("POST", "https://api.example.com/audit", 204, &[], "")
}

#[test]
fn test_parse_records_dependencies() {
    init_test_env();
    let file = parse(AUTH_FLOW, "auth.http").unwrap();

    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    assert_eq!(file.requests.len(), 3);
    assert_eq!(file.requests[0].depends_on, vec!["login".to_string()]);
    assert!(file.requests[1].depends_on.is_empty());
    assert_eq!(
        file.requests[2].depends_on,
        vec!["login".to_string(), "profile".to_string()]
    );
    assert_eq!(file.requests[2].separator_title.as_deref(), Some("Audit"));
}

#[test]
fn test_execution_order_runs_login_first() {
    let file = parse(AUTH_FLOW, "auth.http").unwrap();
    assert_eq!(execution_order(&file).unwrap(), vec![1, 0, 2]);
}

#[test]
fn test_full_chain_execution() {
    init_test_env();
    let file = parse(AUTH_FLOW, "auth.http").unwrap();

    let mut executor = ChainExecutor::new(auth_transport());
    let results = executor.run_file(&file).unwrap();
    let statuses: Vec<u16> = results.iter().map(|(_, r)| r.status_code).collect();
    assert_eq!(statuses, vec![200, 200, 204]);

    let sent = executor.transport().sent();
    assert_eq!(sent.len(), 3);

    let login = &sent[0];
    assert_eq!(login.headers.get("content-type"), Some("application/json"));
    let login_body: serde_json::Value =
        serde_json::from_str(&login.body_text().unwrap()).unwrap();
    let request_id = login_body["requestId"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(request_id).is_ok());

    let profile = &sent[1];
    assert_eq!(profile.url, "https://api.example.com/users/42");
    assert_eq!(profile.headers.get("Authorization"), Some("Bearer tok-1"));
    assert_eq!(profile.headers.get("X-Session"), Some("sess-9"));

    let audit = &sent[2];
    assert_eq!(
        audit.body_text().as_deref(),
        Some(r#"{"actor":"Alice","sentAs":"alice"}"#)
    );
}

#[test]
fn test_out_of_order_execution_keeps_references() {
    let file = parse(AUTH_FLOW, "auth.http").unwrap();
    let executor = ChainExecutor::new(auth_transport());

    // Nothing captured yet: references stay verbatim.
    let prepared = executor.prepare(&file, 0).unwrap();
    assert_eq!(
        prepared.url,
        "https://api.example.com/users/{{login.response.body.$.user.id}}"
    );
    assert_eq!(
        prepared.headers.get("authorization"),
        Some("Bearer {{login.response.body.$.token}}")
    );
}

#[test]
fn test_session_reset_between_runs() {
    let file = parse(AUTH_FLOW, "auth.http").unwrap();
    let mut executor = ChainExecutor::new(auth_transport());

    executor.run_file(&file).unwrap();
    assert_eq!(executor.store().len(), 2);

    executor.reset();
    assert!(executor.store().is_empty());

    executor.run_file(&file).unwrap();
    assert_eq!(executor.transport().sent().len(), 6);
}

#[test]
fn test_dynamic_env_in_chain() {
    let content = "# @name ping\nGET https://api.example.com/ping?key={{$processEnv %API_KEY}}\n";
    let transport = ScriptedTransport::new().route(
        "GET",
        "https://api.example.com/ping?key=k-1",
        200,
        &[],
        "pong",
    );
    let mut env = HashMap::new();
    env.insert("API_KEY".to_string(), "k-1".to_string());

    let file = parse(content, "ping.http").unwrap();
    let mut executor =
        ChainExecutor::new(transport).with_dynamic(DynamicResolver::new().with_env(env));
    executor.run_file(&file).unwrap();

    assert_eq!(
        executor.store().resolve_all("{{ping.response.body.*}}"),
        "pong"
    );
}

#[test]
fn test_cycle_stops_execution() {
    let content = "\
# @name a
GET https://x.example.com/{{b.response.body.$.id}}

###
# @name b
GET https://x.example.com/{{a.response.body.$.id}}
";
    let file = parse(content, "cycle.http").unwrap();
    let mut executor = ChainExecutor::new(ScriptedTransport::new());
    assert!(matches!(executor.run_file(&file), Err(RequestError::Order(_))));
    assert!(executor.transport().sent().is_empty());
}
