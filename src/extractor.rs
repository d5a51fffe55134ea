use crate::error::RegionFault;
use crate::types::{BoundingBox, Centroid, Snapshot};

/// Eye box and iris centre pulled out of one snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeRegion {
    pub bounds: BoundingBox,
    pub iris: Centroid,
}

/// Filters a snapshot down to the eye-contour and iris landmark groups.
#[derive(Debug, Clone)]
pub struct EyeRegionExtractor {
    eye_contour: String,
    iris: String,
}

impl Default for EyeRegionExtractor {
    fn default() -> Self {
        Self::new("eye-contour", "iris")
    }
}

impl EyeRegionExtractor {
    pub fn new(eye_contour: impl Into<String>, iris: impl Into<String>) -> Self {
        Self {
            eye_contour: eye_contour.into(),
            iris: iris.into(),
        }
    }

    pub fn extract(&self, snapshot: &Snapshot) -> Result<EyeRegion, RegionFault> {
        let bounds = self.bounds(snapshot)?;
        let iris = self.iris_centroid(snapshot)?;
        Ok(EyeRegion { bounds, iris })
    }

    /// Min/max of the eye-contour group.
    pub fn bounds(&self, snapshot: &Snapshot) -> Result<BoundingBox, RegionFault> {
        // f32::min/max drop NaN silently, so screen the group first.
        if snapshot.group(&self.eye_contour).any(|p| !(p.x.is_finite() && p.y.is_finite())) {
            return Err(RegionFault::NonFinite);
        }
        let mut points = snapshot.group(&self.eye_contour);
        let first = points.next().ok_or(RegionFault::EmptyEyeContour)?;
        let init = BoundingBox {
            left: first.x,
            right: first.x,
            top: first.y,
            bottom: first.y,
        };
        Ok(points.fold(init, |b, p| BoundingBox {
            left: b.left.min(p.x),
            right: b.right.max(p.x),
            top: b.top.min(p.y),
            bottom: b.bottom.max(p.y),
        }))
    }

    /// Arithmetic mean of the iris group.
    pub fn iris_centroid(&self, snapshot: &Snapshot) -> Result<Centroid, RegionFault> {
        let (sum_x, sum_y, count) = snapshot.group(&self.iris).fold(
            (0.0f32, 0.0f32, 0usize),
            |(sx, sy, n), p| (sx + p.x, sy + p.y, n + 1),
        );
        if count == 0 {
            return Err(RegionFault::EmptyIris);
        }
        let centroid = Centroid {
            x: sum_x / count as f32,
            y: sum_y / count as f32,
        };
        if !(centroid.x.is_finite() && centroid.y.is_finite()) {
            return Err(RegionFault::NonFinite);
        }
        Ok(centroid)
    }
}
