//! Request body encoding.
//!
//! # Design
//! Callers pick the body kind explicitly through `RequestBody`; nothing is
//! inferred from runtime shape. Encoding checks the kinds in a fixed order
//! (absent, raw bytes, form, JSON text, structured value) and yields the
//! wire payload together with the content-type it implies, if any.

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::Payload;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A caller-supplied request body.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Absent,
    /// Sent as-is with whatever content-type the caller set.
    Raw(Vec<u8>),
    /// Multipart form data. Content-type is left to the transport.
    Form(FormPayload),
    /// Pre-serialized JSON text. Must parse as JSON.
    Text(String),
    /// Any structured value, serialized to JSON.
    Json(Value),
}

impl RequestBody {
    /// Serialize `value` into a `Json` body.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(RequestBody::Json)
            .map_err(|e| ApiError::Serialization(e.to_string()))
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

/// A multipart form, in field order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormPayload {
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: String,
    pub value: FormValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File {
        file_name: String,
        content_type: Option<String>,
        data: Vec<u8>,
    },
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.fields.push(FormField {
            name: name.to_string(),
            value: FormValue::Text(value.to_string()),
        });
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: Option<&str>, data: Vec<u8>) -> Self {
        self.fields.push(FormField {
            name: name.to_string(),
            value: FormValue::File {
                file_name: file_name.to_string(),
                content_type: content_type.map(str::to_string),
                data,
            },
        });
        self
    }
}

/// Result of encoding a `RequestBody`.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBody {
    pub payload: Option<Payload>,
    pub content_type: Option<&'static str>,
}

/// Encode `body` for the wire.
///
/// Fails with `ApiError::InvalidJsonBody` when a `Text` body is not valid
/// JSON; this happens before any request is built.
pub fn encode(body: RequestBody) -> Result<EncodedBody, ApiError> {
    match body {
        RequestBody::Absent => Ok(EncodedBody {
            payload: None,
            content_type: None,
        }),
        RequestBody::Raw(bytes) => Ok(EncodedBody {
            payload: Some(Payload::Bytes(bytes)),
            content_type: None,
        }),
        RequestBody::Form(form) => Ok(EncodedBody {
            payload: Some(Payload::Multipart(form)),
            content_type: None,
        }),
        RequestBody::Text(text) if text.is_empty() => Ok(EncodedBody {
            payload: None,
            content_type: None,
        }),
        RequestBody::Text(text) => {
            serde_json::from_str::<Value>(&text).map_err(|e| ApiError::InvalidJsonBody(e.to_string()))?;
            Ok(EncodedBody {
                payload: Some(Payload::Bytes(text.into_bytes())),
                content_type: Some(JSON_CONTENT_TYPE),
            })
        }
        RequestBody::Json(Value::Null) => Ok(EncodedBody {
            payload: None,
            content_type: None,
        }),
        RequestBody::Json(value) => {
            let text = serde_json::to_vec(&value).map_err(|e| ApiError::Serialization(e.to_string()))?;
            Ok(EncodedBody {
                payload: Some(Payload::Bytes(text)),
                content_type: Some(JSON_CONTENT_TYPE),
            })
        }
    }
}
