//! Inbound server message classification.
//!
//! The service sends untagged JSON objects whose shape is told apart by which
//! key is present. When several keys appear in one object the first match in
//! this order wins, and only that branch is reported:
//!
//! 1. `disclaimer`
//! 2. `a4_detected`
//! 3. `debug_image`
//! 4. `keypoints`
//! 5. `measurements` (+ optional `pixel_to_inch`)
//! 6. `error`
//!
//! Presence follows the service's own loose checks: `a4_detected` counts as
//! soon as the key exists, every other key only when its value is "truthy"
//! (not null, false, zero, or an empty string).


use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ProtocolError, Result};
use crate::keypoint::{KEYPOINT_COUNT, Pose};
use crate::measurement::MeasurementSet;

/// Discriminant of a classified [`ServerMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
	Disclaimer,
	MarkerDetection,
	DebugImage,
	Keypoints,
	Measurements,
	Error,
	Unrecognized,
}

impl std::fmt::Display for MessageKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			MessageKind::Disclaimer => "disclaimer",
			MessageKind::MarkerDetection => "marker_detection",
			MessageKind::DebugImage => "debug_image",
			MessageKind::Keypoints => "keypoints",
			MessageKind::Measurements => "measurements",
			MessageKind::Error => "error",
			MessageKind::Unrecognized => "unrecognized",
		};
		f.write_str(name)
	}
}

/// One classified message from the measurement service.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
	/// Informational notice, logged only.
	Disclaimer(String),
	/// Whether the A4 reference sheet is visible.
	MarkerDetection(bool),
	/// Base64 JPEG preview produced by the service.
	DebugImage(String),
	/// A full pose; `degraded` lists entries that were malformed and zeroed.
	Keypoints { pose: Pose, degraded: Vec<usize> },
	/// Final result of the scan.
	Measurements(MeasurementSet),
	/// Service-reported failure.
	Error(String),
	/// Valid JSON carrying none of the known keys.
	Unrecognized,
}

impl ServerMessage {
	/// Parses and classifies one text payload.
	pub fn classify(payload: &str) -> Result<Self> {
		let value: Value = serde_json::from_str(payload)?;
		match value {
			Value::Object(map) => Self::from_object(&map),
			Value::Null => Err(ProtocolError::NullPayload),
			_ => Ok(ServerMessage::Unrecognized),
		}
	}

	fn from_object(map: &Map<String, Value>) -> Result<Self> {
		if let Some(disclaimer) = truthy(map, "disclaimer") {
			return Ok(ServerMessage::Disclaimer(text_of(disclaimer)));
		}

		if let Some(detected) = map.get("a4_detected") {
			return Ok(ServerMessage::MarkerDetection(is_truthy(detected)));
		}

		if let Some(image) = truthy(map, "debug_image") {
			return match image.as_str() {
				Some(data) => Ok(ServerMessage::DebugImage(data.to_string())),
				None => Err(ProtocolError::InvalidField {
					field: "debug_image",
					reason: "expected a base64 string".to_string(),
				}),
			};
		}

		if let Some(keypoints) = truthy(map, "keypoints") {
			let entries = keypoints.as_array().ok_or(ProtocolError::KeypointsNotArray)?;
			let (pose, degraded) =
				Pose::from_wire(entries).ok_or(ProtocolError::KeypointCount {
					expected: KEYPOINT_COUNT,
					found: entries.len(),
				})?;
			return Ok(ServerMessage::Keypoints { pose, degraded });
		}

		if let Some(measurements) = truthy(map, "measurements") {
			let set = MeasurementSet::from_wire(measurements, map.get("pixel_to_inch"))?;
			return Ok(ServerMessage::Measurements(set));
		}

		if let Some(error) = truthy(map, "error") {
			return Ok(ServerMessage::Error(text_of(error)));
		}

		Ok(ServerMessage::Unrecognized)
	}

	pub fn kind(&self) -> MessageKind {
		match self {
			ServerMessage::Disclaimer(_) => MessageKind::Disclaimer,
			ServerMessage::MarkerDetection(_) => MessageKind::MarkerDetection,
			ServerMessage::DebugImage(_) => MessageKind::DebugImage,
			ServerMessage::Keypoints { .. } => MessageKind::Keypoints,
			ServerMessage::Measurements(_) => MessageKind::Measurements,
			ServerMessage::Error(_) => MessageKind::Error,
			ServerMessage::Unrecognized => MessageKind::Unrecognized,
		}
	}
}

fn truthy<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
	map.get(key).filter(|v| is_truthy(v))
}

fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
		Value::String(s) => !s.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}

fn text_of(value: &Value) -> String {
	match value.as_str() {
		Some(s) => s.to_string(),
		None => value.to_string(),
	}
}
