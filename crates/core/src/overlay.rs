//! Projection of reference-frame keypoints onto the live display.
//!
//! The service reports keypoints in a fixed 640x480 frame. The projector
//! scales them to the display's pixel size and keeps only the pieces of the
//! skeleton whose keypoints are confident enough to draw.

use std::fmt;
use std::str::FromStr;

use fitscan_protocol::{Keypoint, KeypointIndex, Pose, REFERENCE_HEIGHT, REFERENCE_WIDTH};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Keypoints at or below this score are not drawn.
pub const SCORE_THRESHOLD: f64 = 0.3;

/// Radius of a point marker in display pixels.
pub const MARKER_RADIUS: f64 = 5.0;

/// Skeleton topology as (start, end) keypoint pairs.
pub const EDGES: [(KeypointIndex, KeypointIndex); 18] = [
	// head
	(KeypointIndex::Nose, KeypointIndex::LeftEye),
	(KeypointIndex::Nose, KeypointIndex::RightEye),
	(KeypointIndex::LeftEye, KeypointIndex::LeftEar),
	(KeypointIndex::RightEye, KeypointIndex::RightEar),
	// neck and arms
	(KeypointIndex::Nose, KeypointIndex::LeftShoulder),
	(KeypointIndex::Nose, KeypointIndex::RightShoulder),
	(KeypointIndex::LeftShoulder, KeypointIndex::LeftElbow),
	(KeypointIndex::LeftElbow, KeypointIndex::LeftWrist),
	(KeypointIndex::RightShoulder, KeypointIndex::RightElbow),
	(KeypointIndex::RightElbow, KeypointIndex::RightWrist),
	// torso
	(KeypointIndex::LeftShoulder, KeypointIndex::RightShoulder),
	(KeypointIndex::LeftShoulder, KeypointIndex::LeftHip),
	(KeypointIndex::RightShoulder, KeypointIndex::RightHip),
	(KeypointIndex::LeftHip, KeypointIndex::RightHip),
	// legs
	(KeypointIndex::LeftHip, KeypointIndex::LeftKnee),
	(KeypointIndex::LeftKnee, KeypointIndex::LeftAnkle),
	(KeypointIndex::RightHip, KeypointIndex::RightKnee),
	(KeypointIndex::RightKnee, KeypointIndex::RightAnkle),
];

/// Pixel size of the live display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplaySize {
	pub width: f64,
	pub height: f64,
}

impl DisplaySize {
	pub fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	pub fn scale_x(&self) -> f64 {
		self.width / REFERENCE_WIDTH
	}

	pub fn scale_y(&self) -> f64 {
		self.height / REFERENCE_HEIGHT
	}

	/// Maps a reference-frame keypoint into display space.
	pub fn project(&self, kp: &Keypoint) -> Point {
		Point {
			x: kp.x * self.width / REFERENCE_WIDTH,
			y: kp.y * self.height / REFERENCE_HEIGHT,
		}
	}
}

impl Default for DisplaySize {
	fn default() -> Self {
		Self::new(1280.0, 960.0)
	}
}

impl fmt::Display for DisplaySize {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}x{}", self.width, self.height)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid display size `{0}`, expected WIDTHxHEIGHT (e.g. 1280x960)")]
pub struct ParseDisplaySizeError(String);

impl FromStr for DisplaySize {
	type Err = ParseDisplaySizeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let invalid = || ParseDisplaySizeError(s.to_string());
		let (w, h) = s
			.split_once(['x', 'X'])
			.ok_or_else(invalid)?;
		let width: f64 = w.trim().parse().map_err(|_| invalid())?;
		let height: f64 = h.trim().parse().map_err(|_| invalid())?;
		if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
			return Err(invalid());
		}
		Ok(Self { width, height })
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

/// One drawable bone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
	pub from: KeypointIndex,
	pub to: KeypointIndex,
	pub start: Point,
	pub end: Point,
}

/// One drawable joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Marker {
	pub keypoint: KeypointIndex,
	pub center: Point,
	pub radius: f64,
}

impl Marker {
	/// Top-left corner of the marker's bounding square.
	pub fn top_left(&self) -> Point {
		Point {
			x: self.center.x - self.radius,
			y: self.center.y - self.radius,
		}
	}
}

/// Everything to draw for one pose.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Overlay {
	pub segments: Vec<Segment>,
	pub markers: Vec<Marker>,
}

impl Overlay {
	pub fn is_empty(&self) -> bool {
		self.segments.is_empty() && self.markers.is_empty()
	}
}

/// Stateless projector bound to one display size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayProjector {
	display: DisplaySize,
}

impl OverlayProjector {
	pub fn new(display: DisplaySize) -> Self {
		Self { display }
	}

	pub fn display(&self) -> DisplaySize {
		self.display
	}

	pub fn project(&self, pose: &Pose) -> Overlay {
		let segments = EDGES
			.iter()
			.filter_map(|&(from, to)| {
				let a = pose.get(from);
				let b = pose.get(to);
				(a.is_confident(SCORE_THRESHOLD) && b.is_confident(SCORE_THRESHOLD)).then(|| {
					Segment {
						from,
						to,
						start: self.display.project(a),
						end: self.display.project(b),
					}
				})
			})
			.collect();

		let markers = pose
			.iter()
			.filter(|(_, kp)| kp.is_confident(SCORE_THRESHOLD))
			.map(|(keypoint, kp)| Marker {
				keypoint,
				center: self.display.project(kp),
				radius: MARKER_RADIUS,
			})
			.collect();

		Overlay { segments, markers }
	}
}
