use thiserror::Error;

/// Why an eye region could not be turned into a gaze sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegionFault {
    #[error("no eye-contour keypoints")]
    EmptyEyeContour,
    #[error("no iris keypoints")]
    EmptyIris,
    #[error("eye box has zero width")]
    ZeroWidth,
    #[error("eye box has zero height")]
    ZeroHeight,
    #[error("non-finite keypoint coordinate")]
    NonFinite,
}

/// A tick that produced no trail point. Every variant is recovered by
/// skipping; the scheduler carries on at the next interval.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("no face detected")]
    NoFaceDetected,
    #[error("degenerate eye region: {0}")]
    DegenerateRegion(#[from] RegionFault),
    #[error("detector not ready")]
    DetectorNotReady,
    #[error("video frame not ready")]
    FrameNotReady,
    #[error("previous detection still in flight")]
    DetectionInFlight,
    #[error("detection timed out")]
    DetectionTimedOut,
    #[error("detector failed: {0}")]
    DetectorFailed(String),
}

impl SkipReason {
    /// Stable short label, used as the key in tick statistics.
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::NoFaceDetected => "no_face",
            SkipReason::DegenerateRegion(_) => "degenerate_region",
            SkipReason::DetectorNotReady => "detector_not_ready",
            SkipReason::FrameNotReady => "frame_not_ready",
            SkipReason::DetectionInFlight => "in_flight",
            SkipReason::DetectionTimedOut => "timed_out",
            SkipReason::DetectorFailed(_) => "detector_failed",
        }
    }

    /// Whether the skip means the pipeline is not up yet rather than the face
    /// being momentarily lost.
    pub fn is_readiness(&self) -> bool {
        matches!(self, SkipReason::DetectorNotReady | SkipReason::FrameNotReady)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_fault_converts_into_skip() {
        let skip: SkipReason = RegionFault::EmptyIris.into();
        assert_eq!(skip, SkipReason::DegenerateRegion(RegionFault::EmptyIris));
        assert_eq!(skip.kind(), "degenerate_region");
        assert_eq!(skip.to_string(), "degenerate eye region: no iris keypoints");
    }

    #[test]
    fn test_non_finite_is_a_degenerate_region() {
        let skip: SkipReason = RegionFault::NonFinite.into();
        assert_eq!(skip.kind(), "degenerate_region");
    }

    #[test]
    fn test_readiness_classification() {
        assert!(SkipReason::DetectorNotReady.is_readiness());
        assert!(SkipReason::FrameNotReady.is_readiness());
        assert!(!SkipReason::NoFaceDetected.is_readiness());
    }
}
