//! Backend Module
//!
//! Opaque request/response contract with the portal API. Every response is
//! wrapped in a `{ code, data, message }` envelope; implementations unwrap it
//! and hand back `data`.

mod envelope;
mod http;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::FetchError;

pub use envelope::ApiEnvelope;
pub use http::HttpBackend;
pub use memory::MemoryBackend;

// == Backend Trait ==
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// `GET <path>?<query>`, returning the envelope's `data`.
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, FetchError>;

    /// `POST <path>` with a JSON body, returning the envelope's `data`.
    async fn post(&self, path: &str, body: Value) -> Result<Value, FetchError>;
}

/// Shared backend handle.
pub type SharedBackend = Arc<dyn Backend>;

/// Percent-encodes a value for use as a single path segment.
pub fn path_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.trim().bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// GETs `path` and decodes `data` into `T`.
///
/// A payload that does not match `T` is a permanent failure.
pub async fn get_as<T: DeserializeOwned>(
    backend: &dyn Backend,
    path: &str,
    query: &[(&str, &str)],
) -> Result<T, FetchError> {
    let data = backend.get(path, query).await?;
    serde_json::from_value(data)
        .map_err(|err| FetchError::Permanent(format!("malformed payload from {path}: {err}")))
}
