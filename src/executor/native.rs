//! Native HTTP transport using reqwest's blocking client.

use super::{HttpTransport, PreparedRequest, RequestError, TransportResponse};
use crate::config::EngineConfig;
use crate::models::Headers;
use log::trace;
use reqwest::blocking::Client;
use reqwest::Method;

/// Sends prepared requests over the network.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds a client honoring the configured timeout and TLS validation.
    pub fn new(config: &EngineConfig) -> Result<Self, RequestError> {
        let client = Client::builder()
            .timeout(config.timeout_duration())
            .danger_accept_invalid_certs(!config.validate_ssl)
            .build()
            .map_err(|e| RequestError::Build(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: &PreparedRequest) -> Result<TransportResponse, RequestError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| RequestError::Build(format!("{}: {}", request.method, e)))?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send()?;
        let status_code = response.status().as_u16();

        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response.bytes()?.to_vec();
        trace!("received {} byte(s) from {}", body.len(), request.url);

        Ok(TransportResponse {
            status_code,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(&EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_get_request_with_headers() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/users").header("accept", "application/json");
            then.status(200)
                .header("content-type", "application/json")
                .header("x-request-id", "r-1")
                .body(r#"[{"id":1}]"#);
        });

        let request = PreparedRequest {
            method: "GET".to_string(),
            url: server.url("/users"),
            headers: vec![("Accept", "application/json")].into_iter().collect(),
            body: None,
        };
        let response = transport().send(&request).unwrap();

        mock.assert();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.headers.get("X-Request-Id"), Some("r-1"));
        assert_eq!(response.body_text(), r#"[{"id":1}]"#);
    }

    #[test]
    fn test_post_request_with_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/items").body(r#"{"name":"x"}"#);
            then.status(201).body("created");
        });

        let request = PreparedRequest {
            method: "POST".to_string(),
            url: server.url("/items"),
            headers: Headers::new(),
            body: Some(br#"{"name":"x"}"#.to_vec()),
        };
        let response = transport().send(&request).unwrap();

        mock.assert();
        assert_eq!(response.status_code, 201);
    }

    #[test]
    fn test_error_status_is_not_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.path("/missing");
            then.status(404);
        });

        let request = PreparedRequest {
            method: "GET".to_string(),
            url: server.url("/missing"),
            headers: Headers::new(),
            body: None,
        };
        assert_eq!(transport().send(&request).unwrap().status_code, 404);
    }

    #[test]
    fn test_invalid_method_token() {
        let request = PreparedRequest {
            method: "BAD METHOD".to_string(),
            url: "http://127.0.0.1:1/".to_string(),
            headers: Headers::new(),
            body: None,
        };
        assert!(matches!(transport().send(&request), Err(RequestError::Build(_))));
    }
}
