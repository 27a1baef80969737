//! HTTP client for the Sanity content API

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use std::time::Instant;

use super::{ContentStore, QueryParams, RemoteQueryError};
use crate::config::StoreConfig;

/// Content store client talking to the Sanity HTTP API
///
/// One instance is built at startup and shared by every component. No
/// retries and no caching: each call is a fresh round trip.
#[derive(Debug, Clone)]
pub struct SanityClient {
    http: Client,
    /// Base URL for reads (may be the CDN host)
    query_base: String,
    /// Base URL for mutations (never the CDN host)
    mutate_base: String,
    dataset: String,
    token: Option<String>,
}

impl SanityClient {
    /// Create a client from the store configuration
    pub fn new(config: &StoreConfig) -> Result<Self, RemoteQueryError> {
        let http = Client::builder()
            .user_agent(concat!("donblog/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let version = format!("v{}", config.api_version.trim_start_matches('v'));

        let (query_host, mutate_host) = match &config.api_host {
            Some(host) => (host.clone(), host.clone()),
            None => {
                let api = format!("https://{}.api.sanity.io", config.project_id);
                // Authenticated reads bypass the CDN
                let query = if config.use_cdn && config.token.is_none() {
                    format!("https://{}.apicdn.sanity.io", config.project_id)
                } else {
                    api.clone()
                };
                (query, api)
            }
        };

        Ok(Self {
            http,
            query_base: format!("{}/{}", query_host.trim_end_matches('/'), version),
            mutate_base: format!("{}/{}", mutate_host.trim_end_matches('/'), version),
            dataset: config.dataset.clone(),
            token: config.token.clone(),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ContentStore for SanityClient {
    async fn query(&self, query: &str, params: &QueryParams) -> Result<Value, RemoteQueryError> {
        let url = format!("{}/data/query/{}", self.query_base, self.dataset);

        let mut pairs: Vec<(String, String)> = vec![("query".to_string(), query.to_string())];
        for (name, value) in params {
            pairs.push((format!("${}", name), value.to_string()));
        }

        let started = Instant::now();
        let response = self
            .authorize(self.http.get(&url).query(&pairs))
            .send()
            .await?;
        let mut body = read_json(response).await?;

        tracing::debug!(
            dataset = %self.dataset,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query completed"
        );

        body.get_mut("result")
            .map(Value::take)
            .ok_or_else(|| RemoteQueryError::MalformedResponse("missing `result`".to_string()))
    }

    async fn create(&self, document: Value) -> Result<Value, RemoteQueryError> {
        let url = format!("{}/data/mutate/{}", self.mutate_base, self.dataset);
        let payload = json!({ "mutations": [{ "create": document }] });

        let started = Instant::now();
        let response = self
            .authorize(
                self.http
                    .post(&url)
                    .query(&[("returnIds", "true"), ("returnDocuments", "true")])
                    .json(&payload),
            )
            .send()
            .await?;
        let mut body = read_json(response).await?;

        tracing::debug!(
            dataset = %self.dataset,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "mutation completed"
        );

        let first = body
            .get_mut("results")
            .and_then(|r| r.get_mut(0))
            .map(Value::take);

        Ok(match first {
            Some(mut result) => match result.get_mut("document").map(Value::take) {
                Some(document) => document,
                None => result,
            },
            None => body,
        })
    }
}

/// Read a JSON body, turning error statuses into `RemoteQueryError::Backend`
async fn read_json(response: Response) -> Result<Value, RemoteQueryError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let description = serde_json::from_slice::<Value>(&bytes)
            .ok()
            .and_then(|body| describe_error(&body))
            .unwrap_or_else(|| {
                let text = String::from_utf8_lossy(&bytes).trim().to_string();
                if text.is_empty() {
                    status.canonical_reason().unwrap_or("unknown error").to_string()
                } else {
                    text
                }
            });
        return Err(RemoteQueryError::backend(status.as_u16(), description));
    }

    serde_json::from_slice(&bytes).map_err(|e| RemoteQueryError::MalformedResponse(e.to_string()))
}

/// Pull a human readable message out of an error body
fn describe_error(body: &Value) -> Option<String> {
    let error = body.get("error");
    error
        .and_then(|e| e.get("description"))
        .or_else(|| error.filter(|e| e.is_string()))
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
