//! Test doubles shared by the engine's unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::scheduler::FrameLink;

/// Link that records every frame and can drop after a number of sends.
pub(crate) struct RecordingLink {
	open: AtomicBool,
	close_after: Option<usize>,
	frames: Mutex<Vec<(Instant, String)>>,
}

impl RecordingLink {
	pub(crate) fn new(open: bool) -> Arc<Self> {
		Self::closing_after(open, None)
	}

	pub(crate) fn closing_after(open: bool, close_after: Option<usize>) -> Arc<Self> {
		Arc::new(Self {
			open: AtomicBool::new(open),
			close_after,
			frames: Mutex::new(Vec::new()),
		})
	}

	pub(crate) fn set_open(&self, open: bool) {
		self.open.store(open, Ordering::SeqCst);
	}

	pub(crate) fn frames(&self) -> Vec<(Instant, String)> {
		self.frames.lock().clone()
	}

	pub(crate) fn sent(&self) -> usize {
		self.frames.lock().len()
	}
}

impl FrameLink for RecordingLink {
	fn is_open(&self) -> bool {
		self.open.load(Ordering::SeqCst)
	}

	fn send_frame(&self, payload: String) -> fitscan_runtime::Result<()> {
		if !self.is_open() {
			return Err(fitscan_runtime::Error::NotConnected);
		}
		let mut frames = self.frames.lock();
		frames.push((Instant::now(), payload));
		if self.close_after == Some(frames.len()) {
			self.open.store(false, Ordering::SeqCst);
		}
		Ok(())
	}
}
