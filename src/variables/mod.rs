//! Variable resolution for `.http` requests.
//!
//! Three placeholder families are resolved, always in this order:
//!
//! 1. response references (`{{login.response.body.$.token}}`), see [`reference`]
//! 2. dynamic variables (`{{$guid}}`, `{{$timestamp -1 d}}`), see [`dynamic`]
//! 3. static variables (`{{baseUrl}}`) from a [`VariableScope`]
//!
//! [`pipeline`] chains the three stages.

pub mod dynamic;
pub mod pipeline;
pub mod reference;

use crate::models::{HttpFile, HttpRequest};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::env;

pub use dynamic::{resolve_dynamic_variable, DynamicResolver};
pub use pipeline::{resolve_template, TemplateResolver};
pub use reference::{find_references, ExchangeSide, MessagePart, ResponseReference};

/// Source of environment variables for `$processEnv` and `$dotEnv`.
pub trait EnvProvider: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvProvider for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }
}

impl EnvProvider for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

/// Static variables visible to one request: the file scope overlaid with the
/// request's own declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableScope {
    values: IndexMap<String, String>,
}

impl VariableScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the scope for `request`. Request-scoped values win on name
    /// collision.
    pub fn for_request(file: &HttpFile, request: &HttpRequest) -> Self {
        let mut scope = Self::from(&file.variables);
        scope.overlay(&request.variables);
        scope
    }

    /// Inserts every entry of `overrides`, replacing existing values.
    pub fn overlay(&mut self, overrides: &IndexMap<String, String>) {
        for (name, value) in overrides {
            self.values.insert(name.clone(), value.clone());
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<&IndexMap<String, String>> for VariableScope {
    fn from(values: &IndexMap<String, String>) -> Self {
        Self {
            values: values.clone(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableScope {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_request_scope_wins() {
        let mut file = HttpFile::new("t.http");
        file.variables.insert("host".into(), "a.example.com".into());
        file.variables.insert("page".into(), "1".into());
        let mut request = HttpRequest::new("GET", "https://{{host}}", 1);
        request.variables.insert("page".into(), "2".into());

        let scope = VariableScope::for_request(&file, &request);
        assert_eq!(scope.get("host"), Some("a.example.com"));
        assert_eq!(scope.get("page"), Some("2"));
        assert_eq!(scope.len(), 2);
    }

    #[test]
    fn test_from_iterator() {
        let scope: VariableScope = vec![("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(scope.get("b"), Some("2"));
        assert_eq!(scope.get("c"), None);
    }

    #[test]
    #[serial]
    fn test_process_env_provider() {
        env::set_var("RESTFILE_TEST_PROVIDER", "yes");
        assert_eq!(ProcessEnv.get("RESTFILE_TEST_PROVIDER").as_deref(), Some("yes"));
        env::remove_var("RESTFILE_TEST_PROVIDER");
        assert_eq!(ProcessEnv.get("RESTFILE_TEST_PROVIDER"), None);
    }

    #[test]
    fn test_map_provider() {
        let mut map = HashMap::new();
        map.insert("KEY".to_string(), "v".to_string());
        assert_eq!(EnvProvider::get(&map, "KEY").as_deref(), Some("v"));
    }
}
