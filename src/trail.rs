use crate::overlay::Surface;
use crate::types::DrawablePoint;

/// Chronological gaze trail for one tracking session.
#[derive(Debug, Clone, Default)]
pub struct TrailStore {
    points: Vec<DrawablePoint>,
}

impl TrailStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, point: DrawablePoint) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[DrawablePoint] {
        &self.points
    }

    pub fn last(&self) -> Option<&DrawablePoint> {
        self.points.last()
    }

    /// Only used when a session restarts.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Clears `surface` and draws every point in insertion order.
    pub fn repaint<S: Surface + ?Sized>(&self, surface: &mut S) {
        surface.clear();
        for p in &self.points {
            surface.fill_rect(p);
        }
    }
}
