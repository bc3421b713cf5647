use std::{
    collections::BTreeMap,
    error::Error as StdError,
    time::{Duration, Instant},
};

use reqwest::{header::HeaderMap, redirect::Policy, Client};
use tracing::{debug, info, warn};

use crate::env::EnvMap;
use crate::model::RequestTemplate;

use super::{
    models::{ExecutionError, ExecutionResult, ExecutionSuccess, ResponseData},
    request::{prepare_request, PreparedRequest},
};

/// Upper bound on a whole exchange, connect through last body byte.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Redirect hops followed before giving up.
pub const MAX_REDIRECTS: usize = 5;

/// Runs one request template against the network.
///
/// Never fails: validation and transport problems come back as
/// [`ExecutionResult::Failure`]. Non-2xx statuses are successes.
pub async fn execute(template: &RequestTemplate, vars: &EnvMap) -> ExecutionResult {
    let prepared = match prepare_request(template, vars) {
        Ok(prepared) => prepared,
        Err(err) => {
            warn!(error = %err, "request rejected before dispatch");
            return err.into();
        }
    };

    match dispatch(prepared, REQUEST_TIMEOUT).await {
        Ok(success) => ExecutionResult::Success(success),
        Err(err) => {
            warn!(error = %err, "request failed");
            err.into()
        }
    }
}

pub(super) async fn dispatch(
    request: PreparedRequest,
    timeout: Duration,
) -> Result<ExecutionSuccess, ExecutionError> {
    let client = Client::builder()
        .timeout(timeout)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(classify)?;

    let PreparedRequest {
        method,
        url,
        headers,
        body,
    } = request;
    debug!(%method, %url, "dispatching request");

    let mut request_builder = client.request(method, url).headers(headers);
    if let Some(body) = body {
        request_builder = request_builder.body(body.into_payload());
    }

    let start = Instant::now();
    let response = request_builder.send().await.map_err(classify)?;
    let status = response.status().as_u16();
    let headers = collect_headers(response.headers());
    let bytes = response.bytes().await.map_err(classify)?;
    let duration = start.elapsed().as_secs_f64();

    info!(status, duration, body_bytes = bytes.len(), "response received");

    Ok(ExecutionSuccess {
        status,
        headers,
        data: ResponseData::from_bytes(&bytes),
        duration,
    })
}

fn classify(err: reqwest::Error) -> ExecutionError {
    if err.is_timeout() {
        ExecutionError::Timeout
    } else {
        ExecutionError::Network(describe_error(&err))
    }
}

/// Flattens the error and its sources into one line, skipping repeats.
fn describe_error(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    collected
}
