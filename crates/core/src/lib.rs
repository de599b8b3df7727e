//! fitscan - scan session engine
//!
//! Streams a bounded, paced sequence of camera frames to a remote
//! pose-estimation service and turns its replies into a live skeleton overlay
//! and a final set of body measurements.
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use fitscan::{DisplaySize, ScanSessionController, StaticSource};
//! use fitscan_runtime::ConnectionManager;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let (manager, connection_events) = ConnectionManager::connect_websocket("ws://127.0.0.1:8000/ws");
//!     let (controller, mut notices) = ScanSessionController::with_connection(
//!         manager,
//!         Arc::new(StaticSource::placeholder()),
//!         DisplaySize::default(),
//!     );
//!     let session = controller.handle();
//!     let engine = tokio::spawn(controller.run(connection_events));
//!
//!     session.start();
//!     while let Some(notice) = notices.recv().await {
//!         println!("{notice:?}");
//!     }
//!     let _ = engine.await;
//! }
//! ```
//!
//! # Components
//!
//! - [`ScanSessionController`] - Idle, countdown, capture and result-wait state machine
//! - [`MessageRouter`] - Applies classified service messages to the [`SessionContext`]
//! - [`FrameScheduler`] - Captures and sends one frame every 200 ms, up to 100
//! - [`OverlayProjector`] - Maps 640x480 keypoints to display-space segments and markers
//! - [`CaptureSource`] - Where frames come from ([`DirectorySource`], [`StaticSource`])

pub mod capture;
pub mod context;
pub mod controller;
pub mod error;
pub mod notice;
pub mod overlay;
pub mod router;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use capture::{CaptureError, CaptureSource, DirectorySource, StaticSource};
pub use context::{COUNTDOWN_SECS, ScanPhase, SessionContext};
pub use controller::{COUNTDOWN_TICK, ScanSessionController, SessionEvent, SessionHandle};
pub use error::{Error, Fault, FaultKind, Result};
pub use notice::SessionNotice;
pub use overlay::{
	DisplaySize, EDGES, MARKER_RADIUS, Marker, Overlay, OverlayProjector, ParseDisplaySizeError,
	Point, SCORE_THRESHOLD, Segment,
};
pub use router::{MessageRouter, Routed};
pub use scheduler::{FRAME_INTERVAL, FrameLink, FrameScheduler, MAX_FRAMES, ScheduleOutcome};
