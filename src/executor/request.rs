use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Method,
};
use serde_json::Value;
use url::Url;

use crate::env::{interpolate, EnvMap};
use crate::model::{RequestBody, RequestTemplate};

use super::models::ExecutionError;

#[derive(Debug, Clone, PartialEq)]
pub enum PreparedBody {
    Json(Value),
    Text(String),
}

impl PreparedBody {
    pub fn into_payload(self) -> String {
        match self {
            PreparedBody::Json(value) => value.to_string(),
            PreparedBody::Text(text) => text,
        }
    }
}

/// A fully interpolated and validated request, ready to send.
///
/// Query params are already folded into `url`.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<PreparedBody>,
}

/// Builds the concrete request for `template` without touching the network.
///
/// The URL is interpolated and validated first. Header keys, header values
/// and a text body are interpolated independently. Query params are passed
/// through untouched.
pub fn prepare_request(
    template: &RequestTemplate,
    vars: &EnvMap,
) -> Result<PreparedRequest, ExecutionError> {
    let raw_url = interpolate(&template.url, vars);
    let mut url = parse_http_url(&raw_url).ok_or(ExecutionError::InvalidUrl(raw_url))?;

    let method = Method::from_bytes(template.method.to_ascii_uppercase().as_bytes())
        .map_err(|_| ExecutionError::InvalidMethod(template.method.clone()))?;

    let mut headers = HeaderMap::new();
    for (raw_name, raw_value) in &template.headers {
        let name = interpolate(raw_name, vars);
        let value = interpolate(raw_value, vars);
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ExecutionError::InvalidHeader(name.clone()))?;
        let header_value = HeaderValue::from_bytes(value.as_bytes())
            .map_err(|_| ExecutionError::InvalidHeader(name))?;
        headers.append(header_name, header_value);
    }

    if !template.params.is_empty() {
        url.query_pairs_mut().extend_pairs(&template.params);
    }

    let body = match &template.body {
        None => None,
        Some(RequestBody::Text(text)) => {
            let text = interpolate(text, vars);
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => Some(PreparedBody::Json(value)),
                Err(_) => Some(PreparedBody::Text(text)),
            }
        }
        Some(RequestBody::Json(value)) => Some(PreparedBody::Json(value.clone())),
    };

    if matches!(body, Some(PreparedBody::Json(_))) && !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    Ok(PreparedRequest {
        method,
        url,
        headers,
        body,
    })
}

fn parse_http_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw).ok()?;
    let has_host = url.host_str().is_some_and(|host| !host.is_empty());
    (matches!(url.scheme(), "http" | "https") && has_host).then_some(url)
}
