//! GraphQL-over-HTTP request encoding
//!
//! Every request body has the shape `{"query": "...", "variables": {...}}`.
//! Absent or empty variables are sent as an empty object so the body is
//! always complete.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::common::{Error, Result};

/// Media type used for request and accepted response bodies
pub const MEDIATYPE_JSON: &str = "application/json";

/// Variables passed alongside a query
pub type Variables = Map<String, Value>;

/// Request body sent to the endpoint
#[derive(Debug, Serialize)]
pub struct RequestBody<'a> {
    pub query: &'a str,
    pub variables: &'a Variables,
}

/// Encode a query and its variables into a request body
pub fn encode_request(query: &str, variables: Option<&Variables>) -> Result<String> {
    if query.trim().is_empty() {
        return Err(Error::Encode("query must not be empty".to_string()));
    }

    let empty = Variables::new();
    let body = RequestBody {
        query,
        variables: variables.unwrap_or(&empty),
    };

    serde_json::to_string(&body).map_err(|e| Error::Encode(e.to_string()))
}

/// Normalize a raw response body by joining its lines, each trimmed
pub fn decode_response(raw: &str) -> String {
    raw.lines().map(str::trim).collect()
}
