//! The uniform `{error, data}` reply shape of the array REST API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codes::ReservedCodes;
use crate::error::{RestError, Result};

/// Error block carried by every reply. Code 0 means success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// 0 on success.
    pub code: i64,
    /// Human-readable message from the array.
    #[serde(default)]
    pub description: String,
}

/// A reply from the array, or one synthesized locally in its place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// Result code and message.
    pub error: ErrorInfo,
    /// Object or list payload; absent on most errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ResultEnvelope {
    /// A successful envelope carrying `data`.
    pub fn success(data: Option<Value>) -> Self {
        Self {
            error: ErrorInfo {
                code: 0,
                description: String::new(),
            },
            data,
        }
    }

    /// An error envelope without payload.
    pub fn failure(code: i64, description: impl Into<String>) -> Self {
        Self {
            error: ErrorInfo {
                code,
                description: description.into(),
            },
            data: None,
        }
    }

    /// Envelope standing in for a request that never reached the array.
    pub fn connect_failure(codes: &ReservedCodes) -> Self {
        Self::failure(codes.connect_failure, "Connect server error")
    }

    /// Envelope returned when no session is established.
    pub fn unauthorized(codes: &ReservedCodes) -> Self {
        Self::failure(codes.unauthorized, "unauthorized.")
    }

    /// Envelope for a non-2xx HTTP status.
    pub fn http_error(status: u16, text: impl Into<String>) -> Self {
        Self::failure(i64::from(status), text)
    }

    /// Result code; 0 means success.
    pub fn code(&self) -> i64 {
        self.error.code
    }

    /// Code 0.
    pub fn is_success(&self) -> bool {
        self.error.code == 0
    }

    /// Payload, if any.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// The payload as a list of records. Missing or non-array payloads
    /// yield an empty list.
    pub fn records(&self) -> Vec<Value> {
        match &self.data {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// First record of a list payload.
    pub fn first_record(&self) -> Option<Value> {
        match &self.data {
            Some(Value::Array(items)) => items.first().cloned(),
            _ => None,
        }
    }

    /// String field of an object payload, e.g. the `ID` of a created object.
    pub fn data_str(&self, key: &str) -> Option<String> {
        self.data.as_ref().and_then(|d| field_str(d, key))
    }

    /// Convert a non-zero code into [`RestError::Backend`].
    pub fn check(&self, context: impl Into<String>) -> Result<&Self> {
        if self.is_success() {
            return Ok(self);
        }
        let context = context.into();
        tracing::error!(code = self.error.code, description = %self.error.description, "{}", context);
        Err(RestError::Backend {
            context,
            code: self.error.code,
            description: self.error.description.clone(),
        })
    }
}

/// Read a field the array may encode either as a string or a number.
pub fn field_str(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
