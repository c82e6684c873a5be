//! Response normalization
//!
//! The backend answers in one of two shapes:
//!
//! ```text
//! flat:      { "error": "...", "details": "...", "statusCode": 404 }   (or the payload itself)
//! enveloped: { "erc": 1, "msg": "...", "total": 3, "next": "...", "data": <payload> }
//! ```
//!
//! The shape is resolved exactly once, here. Callers only ever see a typed
//! payload or an [`ApiError`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// Envelope result code meaning success. Any other value is an opaque failure.
pub const ERC_SUCCESS: i64 = 1;

/// Enveloped response body
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub erc: i64,
    #[serde(default, deserialize_with = "message")]
    pub msg: String,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default, deserialize_with = "cursor")]
    pub next: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

/// Flat error body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatError {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub status_code: Option<u16>,
}

/// A decoded body, classified by shape
#[derive(Debug)]
pub enum ResponseShape {
    Enveloped(ApiEnvelope<Value>),
    Flat(Value),
}

impl ResponseShape {
    /// An object carrying an integer `erc` is enveloped; anything else is flat
    ///
    /// Once `erc` is present the other envelope fields are read leniently:
    /// a null or mistyped `msg`, `total` or `next` is treated as absent.
    pub fn classify(body: Value) -> Self {
        let Some(erc) = body.get("erc").and_then(Value::as_i64) else {
            return Self::Flat(body);
        };

        let mut fields = match body {
            Value::Object(fields) => fields,
            other => return Self::Flat(other),
        };

        Self::Enveloped(ApiEnvelope {
            erc,
            msg: fields
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            total: fields.get("total").and_then(Value::as_u64),
            next: match fields.get("next") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            },
            data: fields.remove("data"),
        })
    }
}

/// Payload plus the pagination fields an envelope may carry
#[derive(Debug, Clone)]
pub struct Normalized<T> {
    pub data: T,
    pub total: Option<u64>,
    pub next: Option<String>,
}

/// Reduce a response to its payload, discarding pagination
pub fn normalize<T: DeserializeOwned>(status: u16, body: &[u8]) -> ApiResult<T> {
    normalize_with_meta(status, body).map(|n| n.data)
}

/// Reduce a response to a typed payload or a typed failure.
///
/// Rules, in order:
/// 1. unparseable body: `Parse`
/// 2. non-2xx status: `Server`, message from envelope `msg`, else flat `error`,
///    else `API Error: <status>`
/// 3. envelope with `erc != 1`: `Server` with `msg`, whatever the status
/// 4. otherwise success: envelope `data`, or the flat body itself
pub fn normalize_with_meta<T: DeserializeOwned>(
    status: u16,
    body: &[u8],
) -> ApiResult<Normalized<T>> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::Parse(format!("response body is not JSON: {}", e)))?;

    let shape = ResponseShape::classify(value);

    if !is_success_status(status) {
        return Err(ApiError::Server {
            status,
            message: failure_message(&shape, status),
        });
    }

    match shape {
        ResponseShape::Enveloped(envelope) => {
            if envelope.erc != ERC_SUCCESS {
                let message = if envelope.msg.trim().is_empty() {
                    format!("Request failed (erc {})", envelope.erc)
                } else {
                    envelope.msg
                };
                return Err(ApiError::Server { status, message });
            }

            let data = serde_json::from_value(envelope.data.unwrap_or(Value::Null))?;
            Ok(Normalized {
                data,
                total: envelope.total,
                next: envelope.next,
            })
        }
        ResponseShape::Flat(body) => Ok(Normalized {
            data: serde_json::from_value(body)?,
            total: None,
            next: None,
        }),
    }
}

fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

fn failure_message(shape: &ResponseShape, status: u16) -> String {
    let from_body = match shape {
        ResponseShape::Enveloped(envelope) => Some(envelope.msg.clone()),
        ResponseShape::Flat(body) => serde_json::from_value::<FlatError>(body.clone())
            .ok()
            .and_then(|flat| flat.error),
    };

    from_body
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("API Error: {}", status))
}

/// `msg` may be null on failure envelopes
fn message<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Cursor tokens arrive as strings or numbers
fn cursor<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
