//! GET/POST client for a cluster endpoint.
//!
//! # Design
//! `RestClient` holds only a `ClientConfig` and a transport and carries no
//! mutable state between calls. `build_get` / `build_post` produce an
//! `HttpRequest`, `parse_response` consumes an `HttpResponse`; `get` and
//! `post` run both around `Transport::execute`.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{basic_auth_header, HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};

/// Client for one endpoint of a search cluster.
///
/// ```no_run
/// use esrest_core::{ClientConfig, RestClient};
/// use serde_json::json;
///
/// let config = ClientConfig::new("http://localhost:9200").with_endpoint("index/_search");
/// let client = RestClient::new(config);
/// let hits = client.post(&json!({"query": {"match_all": {}}}), &[]).unwrap();
/// println!("{hits}");
/// ```
#[derive(Debug, Clone)]
pub struct RestClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl RestClient<UreqTransport> {
    /// Client using a blocking `ureq` transport that honours
    /// `config.verify_ssl`.
    pub fn new(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.verify_ssl);
        Self { config, transport }
    }
}

impl<T: Transport> RestClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn build_get(&self, params: &[(&str, &str)]) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.config.prepare_url(),
            query: owned_pairs(params),
            headers: self.auth_headers(),
            body: None,
        }
    }

    pub fn build_post<D>(&self, data: &D, params: &[(&str, &str)]) -> Result<HttpRequest, ApiError>
    where
        D: Serialize + ?Sized,
    {
        let body = serde_json::to_string(data).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut headers = vec![("content-type".to_string(), "application/json".to_string())];
        headers.extend(self.auth_headers());
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.config.prepare_url(),
            query: owned_pairs(params),
            headers,
            body: Some(body),
        })
    }

    /// Decode the body of a 2xx response; anything else becomes
    /// `ServerDefined` with the body as payload. A body that is not JSON is
    /// a `Deserialization` error on either path.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ApiError> {
        let parsed: Result<Value, ApiError> =
            serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()));

        if response.is_success() {
            return parsed;
        }

        let reason = parsed?;
        warn!(status = response.status, %reason, "server returned an error");
        Err(ApiError::ServerDefined {
            status: response.status,
            reason,
        })
    }

    /// Send a GET with `params` as the query string.
    pub fn get(&self, params: &[(&str, &str)]) -> Result<Value, ApiError> {
        self.send(self.build_get(params))
    }

    /// Send a POST with `data` as the JSON body and `params` as the query
    /// string.
    pub fn post<D>(&self, data: &D, params: &[(&str, &str)]) -> Result<Value, ApiError>
    where
        D: Serialize + ?Sized,
    {
        self.send(self.build_post(data, params)?)
    }

    fn send(&self, request: HttpRequest) -> Result<Value, ApiError> {
        debug!(
            method = request.method.as_str(),
            url = %request.url,
            auth = request.header("authorization").is_some(),
            "sending request"
        );
        let response = self.transport.execute(&request).inspect_err(|e| {
            warn!(method = request.method.as_str(), url = %request.url, error = %e, "request failed");
        })?;
        self.parse_response(response)
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        match self.config.credentials() {
            Some((username, password)) => {
                vec![("authorization".to_string(), basic_auth_header(username, password))]
            }
            None => Vec::new(),
        }
    }
}

fn owned_pairs(params: &[(&str, &str)]) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}
