//! Fetch request description and cache key derivation.

use std::collections::BTreeMap;

use reqwest::{Method, Url};
use serde_json::Value;
use url::form_urlencoded;

/// Prefix of every cache key produced by [`FetchRequest::cache_key`].
pub const FETCH_KEY_PREFIX: &str = "fetch:";

// == Fetch Request ==
/// A request to a remote JSON endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    /// Query parameters, kept sorted so equal requests share a cache key
    pub params: BTreeMap<String, String>,
    /// JSON body, sent for non-GET methods only
    pub body: Option<Value>,
}

impl FetchRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: BTreeMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, url).with_body(body)
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Only plain reads may be served from or stored to the cache.
    pub fn is_cacheable(&self) -> bool {
        self.method == Method::GET
    }

    /// Full target URL with the query parameters applied.
    pub fn target(&self) -> String {
        match Url::parse_with_params(&self.url, &self.params) {
            Ok(url) => url.to_string(),
            // Relative or unparseable URLs get the same encoding appended by hand
            Err(_) => {
                if self.params.is_empty() {
                    return self.url.clone();
                }
                let query = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(&self.params)
                    .finish();
                let separator = if self.url.contains('?') { '&' } else { '?' };
                format!("{}{}{}", self.url, separator, query)
            }
        }
    }

    /// Cache key derived from the target and its parameters.
    pub fn cache_key(&self) -> String {
        format!("{}{}", FETCH_KEY_PREFIX, self.target())
    }
}
