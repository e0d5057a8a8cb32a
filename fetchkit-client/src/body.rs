//! Request bodies.

use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};

/// A request body as handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Text body (already serialized).
    Text(String),
    /// Raw bytes.
    Bytes(Bytes),
}

impl Body {
    /// View the body as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    /// View the body as text, if it is a text body.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bytes(_) => None,
        }
    }

    /// Body length in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Check if the body is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the body into bytes.
    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Text(text) => Bytes::from(text),
            Self::Bytes(bytes) => bytes,
        }
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

/// Argument accepted by the verb shortcuts.
///
/// A JSON object is serialized to a JSON text body. Anything else passes
/// through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A plain JSON object.
    Object(Map<String, Value>),
    /// A body used verbatim.
    Raw(Body),
}

impl Payload {
    /// Build a payload from any serializable value.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        Ok(serde_json::to_value(value)?.into())
    }

    /// Check if this payload will be JSON-serialized.
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Produce the body sent on the wire.
    pub fn into_body(self) -> Body {
        match self {
            Self::Object(map) => Body::Text(Value::Object(map).to_string()),
            Self::Raw(body) => body,
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Object(map),
            Value::String(text) => Self::Raw(Body::Text(text)),
            other => Self::Raw(Body::Text(other.to_string())),
        }
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self::Object(map)
    }
}

impl From<Body> for Payload {
    fn from(body: Body) -> Self {
        Self::Raw(body)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Raw(Body::Text(text))
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Raw(Body::from(text))
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Raw(Body::from(bytes))
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Self::Raw(Body::Bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_is_serialized() {
        let body = Payload::from(json!({"name": "a"})).into_body();
        assert_eq!(body, Body::Text(r#"{"name":"a"}"#.to_string()));
    }

    #[test]
    fn test_raw_string_passes_through() {
        let body = Payload::from("raw-body").into_body();
        assert_eq!(body.as_text(), Some("raw-body"));

        // A JSON string is not a plain object.
        let body = Payload::from(json!("raw-body")).into_body();
        assert_eq!(body.as_text(), Some("raw-body"));
    }

    #[test]
    fn test_bytes_pass_through() {
        let payload = Payload::from(vec![0u8, 159, 146, 150]);
        assert!(!payload.is_object());
        assert_eq!(payload.into_body().as_bytes(), &[0u8, 159, 146, 150]);
    }

    #[test]
    fn test_serializable_struct() {
        #[derive(Serialize)]
        struct NewUser {
            name: &'static str,
            admin: bool,
        }

        let payload = Payload::json(&NewUser {
            name: "a",
            admin: false,
        })
        .unwrap();
        assert!(payload.is_object());
        assert_eq!(
            payload.into_body().as_text(),
            Some(r#"{"admin":false,"name":"a"}"#)
        );
    }
}
