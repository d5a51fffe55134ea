use crate::gaze::GazeSample;
use crate::types::{DrawablePoint, Size};

/// Scales gaze samples onto the overlay surface. The surface size is passed
/// in on every call and never cached.
#[derive(Debug, Clone, Copy)]
pub struct ScreenMapper {
    dot_width: f32,
    dot_height: f32,
}

impl Default for ScreenMapper {
    fn default() -> Self {
        Self::new(2.0, 2.0)
    }
}

impl ScreenMapper {
    pub fn new(dot_width: f32, dot_height: f32) -> Self {
        Self { dot_width, dot_height }
    }

    pub fn map(&self, sample: GazeSample, surface: Size) -> DrawablePoint {
        let (x, y) = match sample {
            GazeSample::Relative(p) => (p.x * surface.width as f32, p.y * surface.height as f32),
            GazeSample::Displacement { dx, dy } => (dx, dy),
        };
        DrawablePoint::new(x, y, self.dot_width, self.dot_height)
    }
}
