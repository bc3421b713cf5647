use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a stored request.
///
/// Serialized untagged: a JSON string is a text body that may still turn out
/// to be JSON once interpolated, anything else is sent as structured JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestBody {
    Text(String),
    Json(Value),
}

impl From<&str> for RequestBody {
    fn from(value: &str) -> Self {
        RequestBody::Text(value.to_string())
    }
}

impl From<String> for RequestBody {
    fn from(value: String) -> Self {
        RequestBody::Text(value)
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => RequestBody::Text(text),
            other => RequestBody::Json(other),
        }
    }
}

/// Unexecuted description of an HTTP request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestTemplate {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,
}

impl RequestTemplate {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: BTreeMap::new(),
            params: BTreeMap::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn body_deserializes_strings_as_text() {
        let template: RequestTemplate = serde_json::from_value(json!({
            "method": "POST",
            "url": "https://example.com",
            "body": "{\"x\": 1}"
        }))
        .unwrap();
        assert_eq!(template.body, Some(RequestBody::Text("{\"x\": 1}".into())));
    }

    #[test]
    fn body_deserializes_structures_as_json() {
        let template: RequestTemplate = serde_json::from_value(json!({
            "method": "POST",
            "url": "https://example.com",
            "headers": {"Accept": "application/json"},
            "body": {"x": 1}
        }))
        .unwrap();
        assert_eq!(template.body, Some(RequestBody::Json(json!({"x": 1}))));
        assert_eq!(template.headers.len(), 1);
        assert!(template.params.is_empty());
    }

    #[test]
    fn missing_and_null_bodies_are_absent() {
        let missing: RequestTemplate =
            serde_json::from_value(json!({"method": "GET", "url": "https://example.com"}))
                .unwrap();
        let null: RequestTemplate = serde_json::from_value(
            json!({"method": "GET", "url": "https://example.com", "body": null}),
        )
        .unwrap();
        assert_eq!(missing.body, None);
        assert_eq!(null.body, None);
    }

    #[test]
    fn value_strings_convert_to_text_bodies() {
        assert_eq!(
            RequestBody::from(json!("raw")),
            RequestBody::Text("raw".to_string())
        );
        assert_eq!(RequestBody::from(json!([1, 2])), RequestBody::Json(json!([1, 2])));
    }
}
