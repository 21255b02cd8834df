//! Template resolution pipeline.
//!
//! Every template passes through three stages, each scanning the output of
//! the previous one:
//!
//! 1. response references, via the [`ResponseStore`]
//! 2. dynamic variables (`{{$fn args}}`)
//! 3. static variables (`{{name}}`) from the [`VariableScope`]
//!
//! Placeholders that cannot be resolved are left verbatim, so a partially
//! configured file still yields a runnable (if incorrect) request.

use super::dynamic::{default_resolver, DynamicResolver};
use super::VariableScope;
use crate::capture::ResponseStore;
use log::{trace, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashSet;

/// Default recursion limit for static values that contain placeholders.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Cached regex for `{{$function args}}`.
static DYNAMIC_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*\$([A-Za-z_][A-Za-z0-9_]*)(?:\s+([^{}]*?))?\s*\}\}")
        .expect("Failed to compile dynamic variable regex")
});

/// Cached regex for `{{name}}`.
static STATIC_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*\}\}")
        .expect("Failed to compile static variable regex")
});

/// Resolves `text` with the default dynamic resolver.
///
/// # Arguments
///
/// * `text` - Template containing `{{...}}` placeholders
/// * `scope` - Static variables for the request
/// * `store` - Captured responses of the current session
///
/// # Examples
///
/// ```
/// use restfile::capture::ResponseStore;
/// use restfile::variables::{resolve_template, VariableScope};
///
/// let scope: VariableScope = vec![("baseUrl", "https://api.example.com")].into_iter().collect();
/// let store = ResponseStore::new();
///
/// assert_eq!(
///     resolve_template("{{baseUrl}}/users/{{id}}", &scope, &store),
///     "https://api.example.com/users/{{id}}"
/// );
/// ```
pub fn resolve_template(text: &str, scope: &VariableScope, store: &ResponseStore) -> String {
    TemplateResolver::new(scope, store).resolve(text)
}

/// Runs the three resolution stages with explicit collaborators.
#[derive(Debug, Clone, Copy)]
pub struct TemplateResolver<'a> {
    scope: &'a VariableScope,
    store: &'a ResponseStore,
    dynamic: &'a DynamicResolver,
    max_depth: usize,
}

impl<'a> TemplateResolver<'a> {
    pub fn new(scope: &'a VariableScope, store: &'a ResponseStore) -> Self {
        Self {
            scope,
            store,
            dynamic: default_resolver(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Uses `dynamic` instead of the process-wide resolver.
    pub fn with_dynamic(mut self, dynamic: &'a DynamicResolver) -> Self {
        self.dynamic = dynamic;
        self
    }

    /// Limits how deeply static values are expanded.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn resolve(&self, text: &str) -> String {
        self.resolve_at(text, 0, &mut HashSet::new())
    }

    fn resolve_at(&self, text: &str, depth: usize, visiting: &mut HashSet<String>) -> String {
        if !text.contains("{{") {
            return text.to_string();
        }

        let text = self.store.resolve_all(text);
        let text = self.resolve_dynamic(&text);
        self.resolve_static(&text, depth, visiting)
    }

    fn resolve_dynamic(&self, text: &str) -> String {
        DYNAMIC_REGEX
            .replace_all(text, |caps: &Captures<'_>| {
                let name = &caps[1];
                let args = caps.get(2).map(|m| m.as_str());
                self.dynamic
                    .try_resolve(name, args)
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    fn resolve_static(&self, text: &str, depth: usize, visiting: &mut HashSet<String>) -> String {
        STATIC_REGEX
            .replace_all(text, |caps: &Captures<'_>| {
                let original = &caps[0];
                let name = &caps[1];

                let Some(value) = self.scope.get(name) else {
                    trace!("variable '{}' is not defined, keeping placeholder", name);
                    return original.to_string();
                };
                if !value.contains("{{") {
                    return value.to_string();
                }

                if visiting.contains(name) {
                    warn!("circular reference through variable '{}'", name);
                    return original.to_string();
                }
                if depth + 1 >= self.max_depth {
                    warn!(
                        "variable '{}' exceeds nesting depth {}",
                        name, self.max_depth
                    );
                    return original.to_string();
                }

                visiting.insert(name.to_string());
                let resolved = self.resolve_at(value, depth + 1, visiting);
                visiting.remove(name);
                resolved
            })
            .into_owned()
    }
}
