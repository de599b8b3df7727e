//! Frame capture sources.
//!
//! A [`CaptureSource`] hands back one compressed image per call as base64,
//! optionally wrapped in a data URI the way camera APIs return it. The frame
//! scheduler strips the prefix before sending.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use fitscan_protocol::{DATA_URI_PREFIX, ProtocolError};
use fitscan_runtime::transport::BoxFuture;
use thiserror::Error;

/// Errors raised while acquiring a frame.
#[derive(Debug, Error)]
pub enum CaptureError {
	#[error("failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("no JPEG samples found in {0}")]
	NoSamples(PathBuf),

	#[error("unusable frame sample: {0}")]
	Sample(#[from] ProtocolError),
}

/// Produces one encoded image per call.
pub trait CaptureSource: Send + Sync {
	fn capture(&self) -> BoxFuture<'_, Result<String, CaptureError>>;
}

/// Cycles through the JPEG files of a directory in name order.
#[derive(Debug)]
pub struct DirectorySource {
	dir: PathBuf,
	files: Vec<PathBuf>,
	cursor: AtomicUsize,
}

impl DirectorySource {
	/// Lists `*.jpg` / `*.jpeg` files under `dir`.
	pub fn open(dir: impl AsRef<Path>) -> Result<Self, CaptureError> {
		let dir = dir.as_ref().to_path_buf();
		let entries = std::fs::read_dir(&dir).map_err(|source| CaptureError::Io {
			path: dir.clone(),
			source,
		})?;

		let mut files: Vec<PathBuf> = entries
			.filter_map(|entry| entry.ok().map(|e| e.path()))
			.filter(|path| path.is_file() && is_jpeg(path))
			.collect();
		files.sort();

		if files.is_empty() {
			return Err(CaptureError::NoSamples(dir));
		}
		tracing::debug!(dir = %dir.display(), count = files.len(), "Loaded capture samples");

		Ok(Self {
			dir,
			files,
			cursor: AtomicUsize::new(0),
		})
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	pub fn len(&self) -> usize {
		self.files.len()
	}

	pub fn is_empty(&self) -> bool {
		self.files.is_empty()
	}
}

fn is_jpeg(path: &Path) -> bool {
	path.extension()
		.and_then(|ext| ext.to_str())
		.is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
}

impl CaptureSource for DirectorySource {
	fn capture(&self) -> BoxFuture<'_, Result<String, CaptureError>> {
		let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.files.len();
		let path = self.files[index].clone();
		Box::pin(async move {
			let bytes = tokio::fs::read(&path)
				.await
				.map_err(|source| CaptureError::Io { path, source })?;
			Ok(format!("{DATA_URI_PREFIX}{}", STANDARD.encode(bytes)))
		})
	}
}

/// Returns the same sample on every call.
#[derive(Debug, Clone)]
pub struct StaticSource {
	sample: String,
}

impl StaticSource {
	pub fn new(sample: impl Into<String>) -> Self {
		Self {
			sample: sample.into(),
		}
	}

	/// A tiny stand-in frame for running without a camera.
	pub fn placeholder() -> Self {
		Self::new(format!("{DATA_URI_PREFIX}/9j/4AAQSkZJRgABAQAAAQABAAD/2wBDAP/Z"))
	}
}

impl CaptureSource for StaticSource {
	fn capture(&self) -> BoxFuture<'_, Result<String, CaptureError>> {
		let sample = self.sample.clone();
		Box::pin(async move { Ok(sample) })
	}
}

#[cfg(test)]
mod tests {
	use fitscan_protocol::FramePayload;

	use super::*;

	#[tokio::test]
	async fn test_directory_source_cycles_in_name_order() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("b.jpg"), b"second").unwrap();
		std::fs::write(dir.path().join("a.JPEG"), b"first").unwrap();
		std::fs::write(dir.path().join("notes.txt"), b"skip").unwrap();

		let source = DirectorySource::open(dir.path()).unwrap();
		assert_eq!(source.len(), 2);

		let first = source.capture().await.unwrap();
		assert_eq!(first, format!("{DATA_URI_PREFIX}{}", STANDARD.encode(b"first")));
		let second = source.capture().await.unwrap();
		assert_eq!(second, format!("{DATA_URI_PREFIX}{}", STANDARD.encode(b"second")));
		let third = source.capture().await.unwrap();
		assert_eq!(third, first);
	}

	#[test]
	fn test_directory_source_without_samples() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("readme.md"), b"").unwrap();
		assert!(matches!(
			DirectorySource::open(dir.path()),
			Err(CaptureError::NoSamples(_))
		));
		assert!(matches!(
			DirectorySource::open(dir.path().join("missing")),
			Err(CaptureError::Io { .. })
		));
	}

	#[tokio::test]
	async fn test_directory_source_reports_vanished_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("frame.jpg");
		std::fs::write(&path, b"data").unwrap();
		let source = DirectorySource::open(dir.path()).unwrap();

		std::fs::remove_file(&path).unwrap();
		assert!(matches!(source.capture().await, Err(CaptureError::Io { .. })));
	}

	#[tokio::test]
	async fn test_placeholder_strips_to_payload() {
		let sample = StaticSource::placeholder().capture().await.unwrap();
		let payload = FramePayload::from_sample(&sample).unwrap();
		assert!(payload.as_str().starts_with("/9j/"));
	}
}
