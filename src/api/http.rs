//! HTTP transport for [`ApiRequest`]s.
//!
//! Only the browser build talks to the network; other targets get a transport
//! that fails every call with [`ApiError::Unsupported`].

use serde_json::Value;
use web_sys::AbortSignal;

use super::ApiRequest;
use crate::error::ApiError;

/// Execute `request` against `base_url` and return the decoded JSON body.
#[cfg(target_arch = "wasm32")]
pub async fn execute(
	base_url: &str,
	request: &ApiRequest,
	signal: Option<&AbortSignal>,
) -> Result<Value, ApiError> {
	use gloo_net::http::Request;

	use super::Method;

	let url = format!("{base_url}{}", request.path());
	let builder = match request.method() {
		Method::Get => Request::get(&url),
		Method::Post => Request::post(&url),
	}
	.query(request.query())
	.abort_signal(signal);

	let prepared = match request.body() {
		Some(body) => builder.json(&body),
		None => builder.build(),
	}
	.map_err(|e| ApiError::Transport(e.to_string()))?;

	let response = prepared.send().await.map_err(|e| {
		if signal.is_some_and(|s| s.aborted()) {
			ApiError::Aborted
		} else {
			ApiError::Transport(e.to_string())
		}
	})?;
	if !response.ok() {
		return Err(ApiError::Status {
			status: response.status(),
			status_text: response.status_text(),
		});
	}
	response
		.json::<Value>()
		.await
		.map_err(|e| ApiError::Decode(e.to_string()))
}

/// Execute `request` against `base_url` and return the decoded JSON body.
#[cfg(not(target_arch = "wasm32"))]
pub async fn execute(
	base_url: &str,
	request: &ApiRequest,
	_signal: Option<&AbortSignal>,
) -> Result<Value, ApiError> {
	log::debug!("trace-graph: no transport for {} at {base_url}", request.label());
	Err(ApiError::Unsupported)
}
