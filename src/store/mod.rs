//! Content store access
//!
//! Everything that talks to the external document store goes through the
//! [`ContentStore`] trait so pages and handlers receive an explicitly
//! constructed client instead of a module-level singleton.

mod client;
mod error;
mod image;
pub mod queries;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use client::SanityClient;
pub use error::RemoteQueryError;
pub use image::{ImageError, ImageUrlBuilder};

/// Named query parameters, sent as `$name` in the query string
pub type QueryParams = IndexMap<String, Value>;

/// Query/mutation contract of the content store
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Run a GROQ query and return its `result`
    async fn query(&self, query: &str, params: &QueryParams) -> Result<Value, RemoteQueryError>;

    /// Create a new document and return it as stored
    async fn create(&self, document: Value) -> Result<Value, RemoteQueryError>;
}

/// Run a query and decode the result into `T`
pub async fn fetch<T: DeserializeOwned>(
    store: &dyn ContentStore,
    query: &str,
    params: &QueryParams,
) -> Result<T, RemoteQueryError> {
    let value = store.query(query, params).await?;
    serde_json::from_value(value).map_err(|e| RemoteQueryError::MalformedResponse(e.to_string()))
}
