//! Errors raised while decoding inbound payloads or building outbound frames.

use thiserror::Error;

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Protocol-level faults.
///
/// None of these are fatal to a connection. [`resets_session`](Self::resets_session)
/// tells the caller whether the fault should also reset the active scan.
#[derive(Debug, Error)]
pub enum ProtocolError {
	/// Payload was not valid JSON at all.
	#[error("malformed payload: {0}")]
	Malformed(#[from] serde_json::Error),

	/// A keypoints update did not carry exactly 17 entries.
	#[error("expected {expected} keypoints, got {found}")]
	KeypointCount { expected: usize, found: usize },

	/// The `keypoints` field was present but not an array.
	#[error("keypoints field is not an array")]
	KeypointsNotArray,

	/// A field had a type the protocol does not allow.
	#[error("invalid `{field}` field: {reason}")]
	InvalidField { field: &'static str, reason: String },

	/// Measurement map could not be decoded as label -> number.
	#[error("invalid measurements: {0}")]
	InvalidMeasurements(String),

	/// The payload was the JSON literal `null`.
	#[error("payload is null")]
	NullPayload,

	/// Capture produced no encoded image data.
	#[error("frame sample contains no image data")]
	EmptyFrame,
}

impl ProtocolError {
	/// Returns true if this fault should reset the active scan session.
	///
	/// Undecodable payloads and measurement results that cannot be presented
	/// reset the session. Rejected keypoint updates and odd field types only
	/// drop the one message.
	pub fn resets_session(&self) -> bool {
		matches!(
			self,
			ProtocolError::Malformed(_)
				| ProtocolError::NullPayload
				| ProtocolError::InvalidMeasurements(_)
		)
	}
}
