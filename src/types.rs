use serde::{Deserialize, Serialize};

use crate::error::RegionFault;

/// A single named landmark in capture-frame pixel space.
/// Several keypoints usually share a name (one eye contour, one iris ring).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: String,
    pub x: f32,
    pub y: f32,
}

impl Keypoint {
    pub fn new(name: impl Into<String>, x: f32, y: f32) -> Self {
        Self { name: name.into(), x, y }
    }
}

/// Keypoints reported by the detector for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    pub points: Vec<Keypoint>,
}

impl Snapshot {
    pub fn new(points: Vec<Keypoint>) -> Self {
        Self { points }
    }

    /// Iterates the keypoints belonging to `group`.
    pub fn group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Keypoint> + 'a {
        self.points.iter().filter(move |p| p.name == group)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Eye region bounds in capture-frame pixels. Always `left <= right`, `top <= bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn contains(&self, p: Centroid) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// Re-expresses `p` relative to the box. Centroids outside the box give
    /// values outside `[0, 1]`; a zero-sized or non-finite box is rejected
    /// before dividing.
    pub fn normalize(&self, p: Centroid) -> Result<NormalizedPoint, RegionFault> {
        let w = self.width();
        let h = self.height();
        if ![w, h, self.left, self.top, p.x, p.y].iter().all(|v| v.is_finite()) {
            return Err(RegionFault::NonFinite);
        }
        if w <= 0.0 {
            return Err(RegionFault::ZeroWidth);
        }
        if h <= 0.0 {
            return Err(RegionFault::ZeroHeight);
        }
        Ok(NormalizedPoint {
            x: (p.x - self.left) / w,
            y: (p.y - self.top) / h,
        })
    }
}

/// Mean position of the iris group, capture-frame pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub x: f32,
    pub y: f32,
}

/// Position as a fraction of some reference extent (eye box or capture frame).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f32,
    pub y: f32,
}

/// One painted sample, overlay-surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawablePoint {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DrawablePoint {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// Width/height in pixels of a viewport or surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::str::FromStr for Size {
    type Err = String;

    // "1440x900"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
        let width = w.trim().parse::<u32>().map_err(|e| format!("bad width '{}': {}", w, e))?;
        let height = h.trim().parse::<u32>().map_err(|e| format!("bad height '{}': {}", h, e))?;
        Ok(Self { width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_centre_of_box() {
        let b = BoundingBox { left: 100.0, right: 140.0, top: 50.0, bottom: 70.0 };
        let n = b.normalize(Centroid { x: 120.0, y: 60.0 }).unwrap();
        assert_eq!(n, NormalizedPoint { x: 0.5, y: 0.5 });
    }

    #[test]
    fn test_normalize_outside_box_is_not_an_error() {
        let b = BoundingBox { left: 0.0, right: 10.0, top: 0.0, bottom: 10.0 };
        let n = b.normalize(Centroid { x: 15.0, y: -5.0 }).unwrap();
        assert!(n.x > 1.0);
        assert!(n.y < 0.0);
    }

    #[test]
    fn test_normalize_rejects_flat_box() {
        let b = BoundingBox { left: 5.0, right: 5.0, top: 0.0, bottom: 10.0 };
        assert_eq!(b.normalize(Centroid::default()), Err(RegionFault::ZeroWidth));
        let b = BoundingBox { left: 0.0, right: 5.0, top: 3.0, bottom: 3.0 };
        assert_eq!(b.normalize(Centroid::default()), Err(RegionFault::ZeroHeight));
    }

    #[test]
    fn test_normalize_rejects_nan_box_and_centroid() {
        let b = BoundingBox { left: f32::NAN, right: f32::NAN, top: 50.0, bottom: 70.0 };
        assert_eq!(b.normalize(Centroid { x: 120.0, y: 60.0 }), Err(RegionFault::NonFinite));

        let b = BoundingBox { left: 0.0, right: 10.0, top: 0.0, bottom: f32::INFINITY };
        assert_eq!(b.normalize(Centroid { x: 5.0, y: 5.0 }), Err(RegionFault::NonFinite));

        let b = BoundingBox { left: 0.0, right: 10.0, top: 0.0, bottom: 10.0 };
        assert_eq!(b.normalize(Centroid { x: f32::NAN, y: 5.0 }), Err(RegionFault::NonFinite));
    }

    #[test]
    fn test_size_parse() {
        assert_eq!("1440x900".parse::<Size>().unwrap(), Size::new(1440, 900));
        assert_eq!("800X600".parse::<Size>().unwrap(), Size::new(800, 600));
        assert!("800".parse::<Size>().is_err());
        assert!("axb".parse::<Size>().is_err());
    }

    #[test]
    fn test_snapshot_deserializes_from_plain_array() {
        let json = r#"[{"name":"iris","x":1.0,"y":2.0}]"#;
        let s: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(s.group("iris").count(), 1);
        assert_eq!(s.group("eye-contour").count(), 0);
    }
}
