//! Outbound frame payloads.
//!
//! The service expects each text frame to hold nothing but base64 JPEG data,
//! so anything a capture API prepends (`data:image/jpeg;base64,`) is removed
//! before sending.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{ProtocolError, Result};

/// Prefix used for JPEG data URIs.
pub const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Raw base64 image data ready to go on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePayload(String);

impl FramePayload {
	/// Builds a payload from a captured sample, stripping any `data:image...,` prefix.
	pub fn from_sample(sample: &str) -> Result<Self> {
		let data = if sample.starts_with("data:image") {
			sample.split_once(',').map(|(_, rest)| rest).unwrap_or_default()
		} else {
			sample
		};

		let data = data.trim();
		if data.is_empty() {
			return Err(ProtocolError::EmptyFrame);
		}
		Ok(Self(data.to_string()))
	}

	/// Encodes raw JPEG bytes.
	pub fn from_jpeg(bytes: &[u8]) -> Result<Self> {
		if bytes.is_empty() {
			return Err(ProtocolError::EmptyFrame);
		}
		Ok(Self(STANDARD.encode(bytes)))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn into_inner(self) -> String {
		self.0
	}
}

/// Wraps base64 JPEG data as a data URI for display.
pub fn debug_image_uri(base64: &str) -> String {
	format!("{DATA_URI_PREFIX}{base64}")
}
