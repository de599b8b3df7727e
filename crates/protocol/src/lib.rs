//! Wire types for the fitscan pose-estimation protocol.
//!
//! The client streams bare base64 JPEG frames to the measurement service and
//! receives one JSON object per message back. This crate owns both directions:
//!
//! - [`ServerMessage`] - Classification of inbound payloads into the six message kinds
//! - [`Pose`] / [`Keypoint`] - The 17-point skeleton in reference-frame coordinates
//! - [`MeasurementSet`] - The terminal result of a successful scan
//! - [`FramePayload`] - An outbound frame with any data-URI prefix removed
//!
//! # Reference frame
//!
//! Keypoints are always expressed in a fixed 640x480 frame
//! ([`REFERENCE_WIDTH`], [`REFERENCE_HEIGHT`]) regardless of the resolution the
//! client actually captured at.

pub mod error;
pub mod frame;
pub mod keypoint;
pub mod measurement;
pub mod message;

pub use error::{ProtocolError, Result};
pub use frame::{DATA_URI_PREFIX, FramePayload, debug_image_uri};
pub use keypoint::{KEYPOINT_COUNT, Keypoint, KeypointIndex, Pose};
pub use measurement::MeasurementSet;
pub use message::{MessageKind, ServerMessage};

/// Width of the frame server keypoints are expressed in.
pub const REFERENCE_WIDTH: f64 = 640.0;

/// Height of the frame server keypoints are expressed in.
pub const REFERENCE_HEIGHT: f64 = 480.0;
