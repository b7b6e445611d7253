//! Error types surfaced to the user-message layer.

use thiserror::Error;

use crate::engine::timers::Millis;

/// Failure of one backend call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
	/// Non-2xx response.
	#[error("{status} {status_text}")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Status text as sent by the server.
		status_text: String,
	},
	/// The request never produced a response.
	#[error("network error: {0}")]
	Transport(String),
	/// The response body did not have the expected shape.
	#[error("unexpected response: {0}")]
	Decode(String),
	/// No response within the configured timeout.
	#[error("request timed out after {0:.0} ms")]
	Timeout(Millis),
	/// Cancelled by a newer request for the same purpose.
	#[error("request aborted")]
	Aborted,
	/// No HTTP transport exists for the compilation target.
	#[error("HTTP transport is not available on this target")]
	Unsupported,
}

impl From<serde_json::Error> for ApiError {
	fn from(e: serde_json::Error) -> Self {
		ApiError::Decode(e.to_string())
	}
}

/// Command rejected by the engine before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
	/// No transformation at this position.
	#[error("no transformation at position {0}")]
	UnknownTransformation(usize),
	/// The target position lies outside the transformation's legal range.
	#[error("transformation {hash} cannot move to position {target} (allowed {lower}..={upper})")]
	ReorderOutOfRange {
		/// Hash of the dragged transformation.
		hash: String,
		/// Requested position.
		target: usize,
		/// Lowest legal position.
		lower: usize,
		/// Highest legal position.
		upper: usize,
	},
	/// Another reorder has not been acknowledged yet.
	#[error("another reorder is still waiting for the server")]
	ReorderInFlight,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn messages_read_like_status_lines() {
		let e = ApiError::Status {
			status: 500,
			status_text: "INTERNAL SERVER ERROR".into(),
		};
		assert_eq!(e.to_string(), "500 INTERNAL SERVER ERROR");
		assert_eq!(ApiError::Timeout(30000.0).to_string(), "request timed out after 30000 ms");
	}

	#[test]
	fn decode_errors_convert() {
		let e: ApiError = serde_json::from_str::<u32>("\"x\"").unwrap_err().into();
		assert!(matches!(e, ApiError::Decode(_)));
	}
}
