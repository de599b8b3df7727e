use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProtocolError, Result};

/// Body measurements in inches, keyed by body-part label in server order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementSet {
	pub entries: IndexMap<String, f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pixel_to_inch: Option<f64>,
}

impl MeasurementSet {
	/// Decodes the `measurements` object and optional `pixel_to_inch` ratio.
	pub fn from_wire(measurements: &Value, pixel_to_inch: Option<&Value>) -> Result<Self> {
		let entries: IndexMap<String, f64> = serde_json::from_value(measurements.clone())
			.map_err(|e| ProtocolError::InvalidMeasurements(e.to_string()))?;

		Ok(Self {
			entries,
			pixel_to_inch: pixel_to_inch.and_then(Value::as_f64),
		})
	}

	pub fn get(&self, label: &str) -> Option<f64> {
		self.entries.get(label).copied()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
		self.entries.iter().map(|(k, v)| (k.as_str(), *v))
	}

	/// Labels whose value is not a positive finite number.
	pub fn suspicious_labels(&self) -> Vec<&str> {
		self.iter()
			.filter(|(_, v)| !(v.is_finite() && *v > 0.0))
			.map(|(k, _)| k)
			.collect()
	}

	/// One `"{label}: {value} inches"` line per entry, two decimals.
	pub fn summary_lines(&self) -> Vec<String> {
		self.iter()
			.map(|(label, value)| format!("{label}: {value:.2} inches"))
			.collect()
	}
}

impl fmt::Display for MeasurementSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.summary_lines().join("\n"))
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn test_from_wire_preserves_server_order() {
		let set = MeasurementSet::from_wire(
			&json!({"waist": 32.456, "chest": 40.0, "inseam": 30.1}),
			Some(&json!(0.021)),
		)
		.unwrap();

		let labels: Vec<&str> = set.iter().map(|(k, _)| k).collect();
		assert_eq!(labels, vec!["waist", "chest", "inseam"]);
		assert_eq!(set.pixel_to_inch, Some(0.021));
	}

	#[test]
	fn test_from_wire_rejects_non_numeric_values() {
		let err = MeasurementSet::from_wire(&json!({"waist": "wide"}), None).unwrap_err();
		assert!(matches!(err, ProtocolError::InvalidMeasurements(_)));
		assert!(err.resets_session());
	}

	#[test]
	fn test_summary_formatting() {
		let set = MeasurementSet::from_wire(&json!({"waist": 32.456, "chest": 40}), None).unwrap();
		assert_eq!(set.to_string(), "waist: 32.46 inches\nchest: 40.00 inches");
	}

	#[test]
	fn test_suspicious_labels() {
		let set =
			MeasurementSet::from_wire(&json!({"waist": 32.0, "neck": 0.0, "hip": -1.0}), None)
				.unwrap();
		assert_eq!(set.suspicious_labels(), vec!["neck", "hip"]);
	}
}
