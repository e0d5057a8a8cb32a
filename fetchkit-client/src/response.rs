//! Decoded responses.

use std::sync::Arc;

use bytes::Bytes;
use futures::{future, stream};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{RequestConfig, ResponseType, TransportError};

/// Decoded response body, shaped by the configured [`ResponseType`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Parsed JSON (`null` for an empty body).
    Json(Value),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes with their content type.
    Blob {
        /// Value of the `Content-Type` header, if any.
        content_type: Option<String>,
        /// Body bytes.
        bytes: Bytes,
    },
    /// Raw bytes.
    ArrayBuffer(Bytes),
    /// Form fields in body order.
    FormData(Vec<(String, String)>),
}

impl ResponseBody {
    /// Decode `bytes` as `kind`.
    pub async fn decode(
        kind: ResponseType,
        headers: &HeaderMap,
        bytes: Bytes,
    ) -> Result<Self, TransportError> {
        let content_type = headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());

        match kind {
            ResponseType::Json => {
                if bytes.iter().all(u8::is_ascii_whitespace) {
                    return Ok(Self::Json(Value::Null));
                }
                serde_json::from_slice(&bytes)
                    .map(Self::Json)
                    .map_err(|e| TransportError::body(format!("invalid JSON body: {e}")))
            }
            ResponseType::Text => Ok(Self::Text(String::from_utf8_lossy(&bytes).into_owned())),
            ResponseType::Blob => Ok(Self::Blob {
                content_type: content_type.map(str::to_string),
                bytes,
            }),
            ResponseType::ArrayBuffer => Ok(Self::ArrayBuffer(bytes)),
            ResponseType::FormData => decode_form(content_type.unwrap_or_default(), bytes)
                .await
                .map(Self::FormData),
        }
    }

    /// Get the JSON value, if decoded as JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Get the text, if decoded as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Get the raw bytes, if decoded as a blob or array buffer.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Blob { bytes, .. } | Self::ArrayBuffer(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Get the form fields, if decoded as form data.
    pub fn as_form(&self) -> Option<&[(String, String)]> {
        match self {
            Self::FormData(fields) => Some(fields),
            _ => None,
        }
    }
}

/// Successful response delivered to the caller.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Decoded body.
    pub data: ResponseBody,
    /// HTTP status code.
    pub status: StatusCode,
    /// Canonical reason phrase for the status. The phrase sent by the
    /// server is not preserved.
    pub status_text: String,
    /// Response headers.
    pub headers: HeaderMap,
    /// Configuration that produced this response.
    pub config: Arc<RequestConfig>,
}

impl FetchResponse {
    /// Deserialize the JSON body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        match &self.data {
            ResponseBody::Json(value) => T::deserialize(value),
            ResponseBody::Text(text) => serde_json::from_str(text),
            ResponseBody::Blob { bytes, .. } | ResponseBody::ArrayBuffer(bytes) => {
                serde_json::from_slice(bytes)
            }
            ResponseBody::FormData(fields) => {
                let map = fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect::<serde_json::Map<_, _>>();
                T::deserialize(Value::Object(map))
            }
        }
    }

    /// Get the body as text, if decoded as text.
    pub fn text(&self) -> Option<&str> {
        self.data.as_text()
    }

    /// Get a header value.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }
}

/// Decode a urlencoded or multipart body into fields in body order.
///
/// File parts contribute their contents as text.
async fn decode_form(
    content_type: &str,
    bytes: Bytes,
) -> Result<Vec<(String, String)>, TransportError> {
    let mime = content_type
        .split(';')
        .next()
        .map(str::trim)
        .unwrap_or_default()
        .to_ascii_lowercase();

    if mime == "application/x-www-form-urlencoded" {
        return serde_urlencoded::from_bytes(&bytes)
            .map_err(|e| TransportError::body(format!("invalid form body: {e}")));
    }

    if !mime.starts_with("multipart/") {
        return Err(TransportError::body(format!(
            "cannot decode form data from content type {mime:?}"
        )));
    }

    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| TransportError::body(format!("invalid multipart content type: {e}")))?;
    let chunks = stream::once(future::ready(Ok::<_, std::io::Error>(bytes)));
    let mut multipart = multer::Multipart::new(chunks, boundary);

    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.map_err(multipart_error)?;
        fields.push((name, value));
    }

    Ok(fields)
}

fn multipart_error(error: multer::Error) -> TransportError {
    TransportError::body(format!("invalid multipart body: {error}"))
}

/// Reason phrase for a status code.
pub(crate) fn status_text(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or_default().to_string()
}
