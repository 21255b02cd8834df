//! Parser and variable-resolution engine for `.http` request files.
//!
//! A `.http` file holds `###`-separated request blocks with `@name = value`
//! variables and `{{...}}` placeholders. This crate turns such a file into a
//! diagnosable model and resolves its placeholders so chained requests can
//! run in sequence.
//!
//! # Architecture
//!
//! - **models**: the parsed file, requests, diagnostics and captured exchanges
//! - **parser**: tolerant line-oriented parser; problems become diagnostics
//! - **variables**: dynamic variables, static scopes and the resolution pipeline
//! - **capture**: session store of named exchanges, with JSONPath/XPath extraction
//! - **graph**: dependency-first execution order
//! - **executor**: resolves, sends and captures requests through a pluggable transport
//! - **config**: engine settings
//!
//! # Usage
//!
//! ```
//! use restfile::capture::ResponseStore;
//! use restfile::models::Headers;
//! use restfile::parser::parse;
//! use restfile::variables::{resolve_template, VariableScope};
//!
//! let content = r#"@baseUrl = https://api.example.com
//!
//! #### Login
//! ## @name login
//! POST {{baseUrl}}/login
//! Content-Type: application/json
//!
//! {"user":"a"}
//!
//! #### Profile
//! GET {{baseUrl}}/profile
//! Authorization: Bearer {{login.response.body.$.token}}
//! "#;
//!
//! let file = parse(content, "api.http").unwrap();
//! assert_eq!(file.requests.len(), 2);
//! assert_eq!(file.requests[1].depends_on, vec!["login".to_string()]);
//!
//! let mut store = ResponseStore::new();
//! store.capture("login", 200, r#"{"token":"t-1"}"#, Headers::new(), None);
//!
//! let profile = &file.requests[1];
//! let scope = VariableScope::for_request(&file, profile);
//! let auth = profile.headers.get("Authorization").unwrap();
//! assert_eq!(resolve_template(auth, &scope, &store), "Bearer t-1");
//! ```

pub mod capture;
pub mod config;
pub mod executor;
pub mod graph;
pub mod models;
pub mod parser;
pub mod variables;

pub use capture::ResponseStore;
pub use config::{load_config, EngineConfig};
pub use graph::execution_order;
pub use models::{CapturedResponse, Diagnostic, HttpFile, HttpRequest};
pub use parser::{parse, parse_with_config, ParseError};
pub use variables::{resolve_template, VariableScope};
