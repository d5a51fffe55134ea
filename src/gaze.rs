use serde::{Deserialize, Serialize};

use crate::error::RegionFault;
use crate::extractor::EyeRegion;
use crate::types::{BoundingBox, NormalizedPoint, Size};

/// How an iris centroid becomes a gaze sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GazePolicy {
    /// Centroid as a fraction of the eye box. Tracks absolute position in the socket.
    #[default]
    BoxRelative,
    /// Frame-to-frame displacement of the capture-relative centroid. Drifts and
    /// jitters; kept as an alternative only.
    Delta,
    /// Centroid as a fraction of the fixed capture size, ignoring the eye box.
    CaptureRelative,
}

/// Mutable per-session tracking state. Owned by the render loop; a fresh
/// value starts a fresh session.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Session {
    /// Last emitted point in the active policy's normalized space.
    pub last_point: Option<NormalizedPoint>,
    /// Eye box the last box-relative point was measured against.
    pub last_box: Option<BoundingBox>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Output of the normalizer, consumed by [`crate::mapper::ScreenMapper`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GazeSample {
    /// Fraction of the surface; scaled by the live surface size.
    Relative(NormalizedPoint),
    /// Offset already expressed in viewport pixels.
    Displacement { dx: f32, dy: f32 },
}

#[derive(Debug, Clone)]
pub struct GazeNormalizer {
    policy: GazePolicy,
    hysteresis_margin: f32,
    capture: Size,
}

impl GazeNormalizer {
    pub const DEFAULT_HYSTERESIS_MARGIN: f32 = 10.0;

    pub fn new(policy: GazePolicy, hysteresis_margin: f32, capture: Size) -> Self {
        Self {
            policy,
            hysteresis_margin,
            capture: Size::new(capture.width.max(1), capture.height.max(1)),
        }
    }

    pub fn policy(&self) -> GazePolicy {
        self.policy
    }

    /// Turns an eye region into a sample, updating `session` in place.
    /// On error `session` is left untouched.
    pub fn estimate(
        &self,
        session: &mut Session,
        region: &EyeRegion,
        viewport: Size,
    ) -> Result<GazeSample, RegionFault> {
        match self.policy {
            GazePolicy::BoxRelative => self.box_relative(session, region).map(GazeSample::Relative),
            GazePolicy::Delta => Ok(self.delta(session, region, viewport)),
            GazePolicy::CaptureRelative => {
                let ratio = self.capture_ratio(region);
                session.last_point = Some(ratio);
                Ok(GazeSample::Relative(ratio))
            }
        }
    }

    fn box_relative(
        &self,
        session: &mut Session,
        region: &EyeRegion,
    ) -> Result<NormalizedPoint, RegionFault> {
        let fresh = region.bounds.normalize(region.iris)?;

        // Stored box is only replaced on a rightward jump past the margin.
        // Leftward motion of any size keeps the old box.
        let bounds = match (session.last_box, session.last_point) {
            (Some(stored), Some(prev)) if !self.exceeds_margin(prev, fresh) => stored,
            _ => region.bounds,
        };
        let point = bounds.normalize(region.iris)?;

        session.last_box = Some(bounds);
        session.last_point = Some(point);
        Ok(point)
    }

    // Margin is in percent of the box.
    fn exceeds_margin(&self, prev: NormalizedPoint, next: NormalizedPoint) -> bool {
        (next.x - prev.x) * 100.0 > self.hysteresis_margin
    }

    fn delta(&self, session: &mut Session, region: &EyeRegion, viewport: Size) -> GazeSample {
        let cur = self.capture_ratio(region);
        let prev = session.last_point.unwrap_or_default();
        session.last_point = Some(cur);
        GazeSample::Displacement {
            dx: (cur.x - prev.x) * viewport.width as f32,
            dy: (cur.y - prev.y) * viewport.height as f32,
        }
    }

    fn capture_ratio(&self, region: &EyeRegion) -> NormalizedPoint {
        NormalizedPoint {
            x: region.iris.x / self.capture.width as f32,
            y: region.iris.y / self.capture.height as f32,
        }
    }
}
