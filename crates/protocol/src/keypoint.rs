use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of keypoints in every pose update.
pub const KEYPOINT_COUNT: usize = 17;

/// The 17 COCO body keypoints, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(usize)]
pub enum KeypointIndex {
	Nose = 0,
	LeftEye = 1,
	RightEye = 2,
	LeftEar = 3,
	RightEar = 4,
	LeftShoulder = 5,
	RightShoulder = 6,
	LeftElbow = 7,
	RightElbow = 8,
	LeftWrist = 9,
	RightWrist = 10,
	LeftHip = 11,
	RightHip = 12,
	LeftKnee = 13,
	RightKnee = 14,
	LeftAnkle = 15,
	RightAnkle = 16,
}

impl KeypointIndex {
	pub const ALL: [KeypointIndex; KEYPOINT_COUNT] = [
		Self::Nose,
		Self::LeftEye,
		Self::RightEye,
		Self::LeftEar,
		Self::RightEar,
		Self::LeftShoulder,
		Self::RightShoulder,
		Self::LeftElbow,
		Self::RightElbow,
		Self::LeftWrist,
		Self::RightWrist,
		Self::LeftHip,
		Self::RightHip,
		Self::LeftKnee,
		Self::RightKnee,
		Self::LeftAnkle,
		Self::RightAnkle,
	];

	pub fn from_index(index: usize) -> Option<Self> {
		Self::ALL.get(index).copied()
	}

	pub fn index(self) -> usize {
		self as usize
	}
}

/// A single keypoint in reference-frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Keypoint {
	pub x: f64,
	pub y: f64,
	/// Confidence in `[0, 1]`.
	pub score: f64,
}

impl Keypoint {
	pub const ZERO: Keypoint = Keypoint {
		x: 0.0,
		y: 0.0,
		score: 0.0,
	};

	pub fn new(x: f64, y: f64, score: f64) -> Self {
		Self { x, y, score }
	}

	/// Strictly above `threshold`.
	pub fn is_confident(&self, threshold: f64) -> bool {
		self.score > threshold
	}

	/// Decodes one `[x, y, score]` wire entry.
	///
	/// Extra trailing elements are ignored. Anything that is not an array
	/// with at least three leading numbers yields `None`.
	pub fn from_wire(entry: &Value) -> Option<Self> {
		let values = entry.as_array()?;
		if values.len() < 3 {
			return None;
		}
		Some(Self {
			x: values[0].as_f64()?,
			y: values[1].as_f64()?,
			score: values[2].as_f64()?,
		})
	}
}

/// A full 17-keypoint pose.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
	pub keypoints: [Keypoint; KEYPOINT_COUNT],
}

impl Pose {
	pub fn new(keypoints: [Keypoint; KEYPOINT_COUNT]) -> Self {
		Self { keypoints }
	}

	pub fn get(&self, index: KeypointIndex) -> &Keypoint {
		&self.keypoints[index.index()]
	}

	pub fn iter(&self) -> impl Iterator<Item = (KeypointIndex, &Keypoint)> {
		KeypointIndex::ALL.iter().copied().zip(self.keypoints.iter())
	}

	/// Decodes exactly 17 wire entries.
	///
	/// Malformed entries degrade to [`Keypoint::ZERO`]; their positions are
	/// returned alongside the pose so callers can log them. Returns `None`
	/// when the entry count is wrong.
	pub fn from_wire(entries: &[Value]) -> Option<(Self, Vec<usize>)> {
		if entries.len() != KEYPOINT_COUNT {
			return None;
		}

		let mut keypoints = [Keypoint::ZERO; KEYPOINT_COUNT];
		let mut degraded = Vec::new();
		for (i, entry) in entries.iter().enumerate() {
			match Keypoint::from_wire(entry) {
				Some(kp) => keypoints[i] = kp,
				None => degraded.push(i),
			}
		}
		Some((Self { keypoints }, degraded))
	}

	/// Bounding box `(min_x, min_y, max_x, max_y)` of keypoints above `threshold`.
	pub fn bounds(&self, threshold: f64) -> Option<(f64, f64, f64, f64)> {
		self.keypoints
			.iter()
			.filter(|kp| kp.is_confident(threshold))
			.fold(None, |acc, kp| match acc {
				None => Some((kp.x, kp.y, kp.x, kp.y)),
				Some((min_x, min_y, max_x, max_y)) => Some((
					min_x.min(kp.x),
					min_y.min(kp.y),
					max_x.max(kp.x),
					max_y.max(kp.y),
				)),
			})
	}
}
