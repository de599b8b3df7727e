//! Wire-contract diagnostic: classify newline-delimited service messages.

use fitscan_protocol::{MessageKind, ServerMessage};
use serde::Serialize;

use crate::cli::ClassifyArgs;
use crate::error::Result;
use crate::output::{CommandResult, OutputFormat, RenderText, print_result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedLine {
	pub line: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub kind: Option<MessageKind>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	/// Whether a live session would be reset by this message.
	pub resets_session: bool,
}

#[derive(Debug, Serialize)]
pub struct ClassifyData {
	pub messages: Vec<ClassifiedLine>,
}

impl RenderText for ClassifyData {
	fn render_text(&self) -> Vec<String> {
		self.messages
			.iter()
			.map(|m| match (&m.kind, &m.error) {
				(Some(kind), _) => format!("{:>4}  {kind}", m.line),
				(None, Some(error)) => {
					let reset = if m.resets_session { " (resets session)" } else { "" };
					format!("{:>4}  rejected: {error}{reset}", m.line)
				}
				(None, None) => format!("{:>4}  ?", m.line),
			})
			.collect()
	}
}

pub fn execute(args: ClassifyArgs, format: OutputFormat) -> Result<()> {
	let input = super::read_input(args.file.as_deref())?;
	let data = classify_lines(&input);
	print_result(&CommandResult::success("classify", data), format);
	Ok(())
}

/// Classifies each non-blank line; line numbers are 1-based.
pub fn classify_lines(input: &str) -> ClassifyData {
	let messages = input
		.lines()
		.enumerate()
		.filter(|(_, line)| !line.trim().is_empty())
		.map(|(i, line)| match ServerMessage::classify(line) {
			Ok(message) => {
				let kind = message.kind();
				ClassifiedLine {
					line: i + 1,
					kind: Some(kind),
					error: None,
					resets_session: matches!(kind, MessageKind::Measurements | MessageKind::Error),
				}
			}
			Err(err) => ClassifiedLine {
				line: i + 1,
				kind: None,
				error: Some(err.to_string()),
				resets_session: err.resets_session(),
			},
		})
		.collect();
	ClassifyData { messages }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_classifies_each_line() {
		let input = concat!(
			"{\"disclaimer\": \"not medical advice\"}\n",
			"\n",
			"{\"a4_detected\": false}\n",
			"{\"measurements\": {\"waist\": 31.5}, \"pixel_to_inch\": 0.02}\n",
			"{\"keypoints\": [[1, 2, 0.9]]}\n",
			"not json\n",
		);
		let data = classify_lines(input);
		let kinds: Vec<_> = data.messages.iter().map(|m| m.kind).collect();
		assert_eq!(
			kinds,
			vec![
				Some(MessageKind::Disclaimer),
				Some(MessageKind::MarkerDetection),
				Some(MessageKind::Measurements),
				None,
				None,
			]
		);
		assert_eq!(data.messages[1].line, 3);

		let keypoints = &data.messages[3];
		assert!(keypoints.error.as_deref().unwrap().contains("expected 17 keypoints"));
		assert!(!keypoints.resets_session);

		let garbage = &data.messages[4];
		assert!(garbage.resets_session);
	}

	#[test]
	fn test_text_rendering() {
		let data = classify_lines("{\"error\": \"no person\"}\n[1, 2]\n");
		assert_eq!(
			data.render_text(),
			vec!["   1  error".to_string(), "   2  unrecognized".to_string()]
		);
	}
}
