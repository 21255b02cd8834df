//! Direct executor for parsed request files.
//!
//! [`ChainExecutor`] owns one session: it resolves each request against the
//! file's variables and the responses captured so far, sends it through an
//! [`HttpTransport`], and captures the exchange under the request's `@name`
//! so later requests can reference it.
//!
//! ```
//! use restfile::executor::{ChainExecutor, HttpTransport, PreparedRequest, RequestError, TransportResponse};
//! use restfile::models::Headers;
//! use restfile::parser::parse;
//!
//! struct Echo;
//!
//! impl HttpTransport for Echo {
//!     fn send(&self, request: &PreparedRequest) -> Result<TransportResponse, RequestError> {
//!         Ok(TransportResponse::new(200, Headers::new(), format!(r#"{{"url":"{}"}}"#, request.url)))
//!     }
//! }
//!
//! let content = "# @name first\nGET https://api.example.com/a\n\n###\nGET https://api.example.com/{{first.response.body.$.url}}\n";
//! let file = parse(content, "chain.http").unwrap();
//!
//! let mut executor = ChainExecutor::new(Echo);
//! let results = executor.run_file(&file).unwrap();
//! assert_eq!(results.len(), 2);
//! assert!(executor.store().contains("first"));
//! ```

pub mod error;
pub mod transport;

#[cfg(feature = "native")]
pub mod native;

pub use error::RequestError;
pub use transport::{BodyLoader, FsBodyLoader, HttpTransport, PreparedRequest, TransportResponse};

#[cfg(feature = "native")]
pub use native::ReqwestTransport;

use crate::capture::ResponseStore;
use crate::config::EngineConfig;
use crate::graph::execution_order;
use crate::models::{CapturedResponse, Headers, HttpFile, RequestBody};
use crate::variables::{DynamicResolver, TemplateResolver, VariableScope};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use url::Url;

/// Executes the requests of a file in one capture session.
pub struct ChainExecutor<T> {
    transport: T,
    loader: Box<dyn BodyLoader>,
    dynamic: DynamicResolver,
    store: ResponseStore,
    body_base_dir: Option<PathBuf>,
    max_depth: usize,
}

impl<T: HttpTransport> ChainExecutor<T> {
    /// Creates an executor with the default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, &EngineConfig::default())
    }

    pub fn with_config(transport: T, config: &EngineConfig) -> Self {
        Self {
            transport,
            loader: Box::new(FsBodyLoader),
            dynamic: DynamicResolver::new(),
            store: ResponseStore::new(),
            body_base_dir: config.body_base_dir.clone(),
            max_depth: config.max_nesting_depth,
        }
    }

    /// Reads `< path` bodies through `loader`.
    pub fn with_body_loader(mut self, loader: impl BodyLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Evaluates dynamic variables with `dynamic`.
    pub fn with_dynamic(mut self, dynamic: DynamicResolver) -> Self {
        self.dynamic = dynamic;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &ResponseStore {
        &self.store
    }

    /// Mutable access to the session store, e.g. to seed captured responses.
    pub fn store_mut(&mut self) -> &mut ResponseStore {
        &mut self.store
    }

    /// Ends the session: forgets every captured response.
    pub fn reset(&mut self) {
        self.store.clear();
    }

    /// Resolves the request at `index` without sending it.
    ///
    /// # Returns
    ///
    /// The resolved request, or an error if the URL is unusable or the body
    /// file cannot be read.
    pub fn prepare(&self, file: &HttpFile, index: usize) -> Result<PreparedRequest, RequestError> {
        let request = file
            .requests
            .get(index)
            .ok_or(RequestError::NoSuchRequest(index))?;

        let scope = VariableScope::for_request(file, request);
        let resolver = TemplateResolver::new(&scope, &self.store)
            .with_dynamic(&self.dynamic)
            .with_max_depth(self.max_depth);

        let url = resolver.resolve(&request.url);
        validate_url(&url)?;

        let headers: Headers = request
            .headers
            .iter()
            .map(|(name, value)| (name, resolver.resolve(value)))
            .collect();

        let body = match &request.body {
            Some(RequestBody::Inline(text)) => Some(resolver.resolve(text).into_bytes()),
            Some(RequestBody::File(path)) => {
                let path = self.body_path(file, &resolver.resolve(path));
                let bytes = self
                    .loader
                    .read_bytes(&path)
                    .map_err(|source| RequestError::BodyFile { path, source })?;
                Some(bytes)
            }
            None => None,
        };

        Ok(PreparedRequest {
            method: request.method.clone(),
            url,
            headers,
            body,
        })
    }

    /// Resolves, sends and captures the request at `index`.
    ///
    /// The exchange is captured only when the request has a `@name`.
    pub fn execute(&mut self, file: &HttpFile, index: usize) -> Result<TransportResponse, RequestError> {
        let request = file
            .requests
            .get(index)
            .ok_or(RequestError::NoSuchRequest(index))?;

        for dependency in &request.depends_on {
            if !self.store.contains(dependency) {
                warn!(
                    "{} runs before '{}' was captured; its references stay unresolved",
                    request.display_name(),
                    dependency
                );
            }
        }

        let prepared = self.prepare(file, index)?;
        debug!("sending {} {}", prepared.method, prepared.url);
        let response = self.transport.send(&prepared)?;
        info!(
            "{} {} -> {}",
            prepared.method, prepared.url, response.status_code
        );

        if let Some(name) = &request.name {
            let exchange = CapturedResponse::new(
                response.status_code,
                response.body_text(),
                response.headers.clone(),
                prepared.body_text(),
            )
            .with_request_headers(prepared.headers);
            self.store.capture_exchange(name, exchange);
        }

        Ok(response)
    }

    /// Executes every request of `file`, dependencies first.
    ///
    /// # Returns
    ///
    /// `(index, response)` pairs in execution order. Stops at the first
    /// failing request.
    pub fn run_file(&mut self, file: &HttpFile) -> Result<Vec<(usize, TransportResponse)>, RequestError> {
        let order = execution_order(file)?;
        let mut results = Vec::with_capacity(order.len());
        for index in order {
            let response = self.execute(file, index)?;
            results.push((index, response));
        }
        Ok(results)
    }

    fn body_path(&self, file: &HttpFile, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match &self.body_base_dir {
            Some(base) => base.join(path),
            None => file
                .path
                .parent()
                .map(|dir| dir.join(path))
                .unwrap_or_else(|| path.to_path_buf()),
        }
    }
}

fn validate_url(url: &str) -> Result<(), RequestError> {
    let parsed = Url::parse(url).map_err(|e| RequestError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(RequestError::UnsupportedProtocol(other.to_string())),
    }
}
