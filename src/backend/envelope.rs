//! Response envelope shared by every backend endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FetchError;

/// `{ "code": 200, "data": ..., "message": "ok" }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope {
    pub code: i64,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub message: String,
}

impl ApiEnvelope {
    pub fn ok(data: Value) -> Self {
        Self {
            code: 200,
            data,
            message: "ok".to_string(),
        }
    }

    /// Codes 0 and 200 both mean success.
    pub fn is_success(&self) -> bool {
        self.code == 0 || self.code == 200
    }

    /// Unwraps `data`, turning error codes and null payloads into failures.
    pub fn into_data(self) -> Result<Value, FetchError> {
        if !self.is_success() {
            return Err(FetchError::Permanent(format!(
                "backend returned code {}: {}",
                self.code, self.message
            )));
        }
        if self.data.is_null() {
            return Err(FetchError::Permanent("backend returned no data".to_string()));
        }
        Ok(self.data)
    }
}
