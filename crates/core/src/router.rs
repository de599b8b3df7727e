//! Routing of inbound service messages onto the session context.

use fitscan_protocol::{MeasurementSet, ProtocolError, ServerMessage};

use crate::context::SessionContext;
use crate::overlay::{DisplaySize, SCORE_THRESHOLD};

/// What a routed message asks of the controller.
#[derive(Debug)]
pub enum Routed {
	/// Logged only, or not addressed to any handler.
	Ignored,
	/// Reference marker visibility was updated.
	Marker(bool),
	/// A new debug preview was stored.
	DebugImage,
	/// A new pose was stored.
	Keypoints,
	/// The message was dropped; session state is untouched.
	Rejected(ProtocolError),
	/// Terminal result: present it, then reset.
	Complete(MeasurementSet),
	/// The service reported an error: surface it, then reset.
	ServerError(String),
	/// Transient protocol fault: reset the session.
	Reset(ProtocolError),
}

/// Classifies each payload and applies the non-terminal updates itself.
///
/// Terminal outcomes are returned to the caller, which owns the timers that
/// have to be cancelled.
#[derive(Debug, Clone)]
pub struct MessageRouter {
	display: DisplaySize,
}

impl MessageRouter {
	pub fn new(display: DisplaySize) -> Self {
		Self { display }
	}

	pub fn dispatch(&self, ctx: &mut SessionContext, payload: &str) -> Routed {
		let message = match ServerMessage::classify(payload) {
			Ok(message) => message,
			Err(e) if e.resets_session() => {
				tracing::error!("Error parsing service message: {}", e);
				return Routed::Reset(e);
			}
			Err(e) => {
				tracing::warn!("Dropping service message: {}", e);
				return Routed::Rejected(e);
			}
		};

		tracing::debug!(kind = %message.kind(), "Service message");

		match message {
			ServerMessage::Disclaimer(text) => {
				tracing::info!("Disclaimer: {}", text);
				Routed::Ignored
			}
			ServerMessage::MarkerDetection(detected) => {
				ctx.marker_detected = detected;
				Routed::Marker(detected)
			}
			ServerMessage::DebugImage(data) => {
				tracing::debug!(bytes = data.len(), "Debug image received");
				ctx.debug_image = Some(data);
				Routed::DebugImage
			}
			ServerMessage::Keypoints { pose, degraded } => {
				if !degraded.is_empty() {
					tracing::warn!(?degraded, "Zeroed malformed keypoint entries");
				}
				match pose.bounds(SCORE_THRESHOLD) {
					Some((min_x, min_y, max_x, max_y)) => tracing::debug!(
						min_x,
						min_y,
						max_x,
						max_y,
						scale_x = self.display.scale_x(),
						scale_y = self.display.scale_y(),
						"Skeleton bounds"
					),
					None => tracing::debug!("No confident keypoints in update"),
				}
				ctx.keypoints = Some(pose);
				Routed::Keypoints
			}
			ServerMessage::Measurements(set) => {
				if let Some(ratio) = set.pixel_to_inch {
					tracing::info!(pixel_to_inch = ratio, "Measurements received");
				} else {
					tracing::info!("Measurements received");
				}
				let suspicious = set.suspicious_labels();
				if !suspicious.is_empty() {
					tracing::warn!(?suspicious, "Non-positive measurement values");
				}
				Routed::Complete(set)
			}
			ServerMessage::Error(message) => {
				tracing::error!("Service error: {}", message);
				Routed::ServerError(message)
			}
			ServerMessage::Unrecognized => {
				tracing::debug!("Unrecognized service message: {}", payload);
				Routed::Ignored
			}
		}
	}
}
