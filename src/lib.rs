//! Gaze estimation from iris keypoints, drawn as an accumulating trail on an
//! overlay surface.
//!
//! A [`render_loop::RenderLoop`] pulls keypoint snapshots from a
//! [`pipeline::KeypointSource`] on a fixed interval and runs them through
//! [`extractor`], [`gaze`] and [`mapper`] into a [`trail::TrailStore`], which
//! is repainted onto an [`overlay::Surface`] after every new point.

pub mod args;
pub mod config;
pub mod error;
pub mod extractor;
pub mod gaze;
mod gaze_tests;
pub mod logging;
pub mod mapper;
pub mod overlay;
pub mod pipeline;
pub mod render_loop;
pub mod trail;
pub mod types;

pub use error::{RegionFault, SkipReason};
pub use render_loop::{LoopState, RenderLoop, StopHandle, TickOutcome, TickStats};
pub use types::{BoundingBox, Centroid, DrawablePoint, Keypoint, NormalizedPoint, Size, Snapshot};
