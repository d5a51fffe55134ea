use std::path::Path;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::types::{Keypoint, Size, Snapshot};

/// Face landmark detector bound to a live video stream.
///
/// `detect` looks at whatever frame is current and returns `Ok(None)` when
/// no face is visible. The readiness checks run before every call.
#[async_trait]
pub trait KeypointSource: Send + Sync {
    fn name(&self) -> String;

    /// Model loaded and able to accept frames.
    fn detector_ready(&self) -> bool {
        true
    }

    /// Current video frame is readable.
    fn frame_ready(&self) -> bool {
        true
    }

    async fn detect(&self) -> Result<Option<Snapshot>>;
}

/// Synthetic eye: a fixed elliptical contour with an iris ring drifting
/// around its centre. Needs no camera or model.
pub struct SimulatedSource {
    capture: Size,
    eye_contour: String,
    iris: String,
    warmup_checks: u32,
    latency: Duration,
    checks: AtomicU32,
    frame_count: AtomicU32,
}

impl SimulatedSource {
    pub fn new(capture: Size, eye_contour: &str, iris: &str) -> Self {
        Self {
            capture,
            eye_contour: eye_contour.to_string(),
            iris: iris.to_string(),
            warmup_checks: 0,
            latency: Duration::ZERO,
            checks: AtomicU32::new(0),
            frame_count: AtomicU32::new(0),
        }
    }

    /// Report the detector as not ready for the first `checks` readiness checks.
    pub fn with_warmup(mut self, checks: u32) -> Self {
        self.warmup_checks = checks;
        self
    }

    /// Delay every detection by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn snapshot(&self, frame: u32) -> Snapshot {
        let cx = self.capture.width as f32 / 2.0;
        let cy = self.capture.height as f32 / 2.0;
        let (rx, ry) = (40.0, 15.0);

        let mut points: Vec<Keypoint> = (0..16)
            .map(|i| {
                let a = i as f32 / 16.0 * std::f32::consts::TAU;
                Keypoint::new(self.eye_contour.as_str(), cx + a.cos() * rx, cy + a.sin() * ry)
            })
            .collect();

        // Slow orbit inside the socket
        let t = frame as f32 * 0.05;
        let ix = cx + t.cos() * rx * 0.6;
        let iy = cy + t.sin() * ry * 0.5;
        points.push(Keypoint::new(self.iris.as_str(), ix, iy));
        for i in 0..4 {
            let a = i as f32 / 4.0 * std::f32::consts::TAU;
            points.push(Keypoint::new(self.iris.as_str(), ix + a.cos() * 6.0, iy + a.sin() * 6.0));
        }
        Snapshot::new(points)
    }
}

#[async_trait]
impl KeypointSource for SimulatedSource {
    fn name(&self) -> String {
        "Simulated Eye".to_string()
    }

    fn detector_ready(&self) -> bool {
        let seen = self.checks.fetch_add(1, Ordering::Relaxed);
        seen >= self.warmup_checks
    }

    async fn detect(&self) -> Result<Option<Snapshot>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let frame = self.frame_count.fetch_add(1, Ordering::Relaxed);
        Ok(Some(self.snapshot(frame)))
    }
}

/// Plays back recorded snapshots, one per detection.
///
/// The file is a JSON array; each entry is either an array of keypoints or
/// `null` for a frame without a face. Past the end every call reports no face.
pub struct ReplaySource {
    name: String,
    frames: Vec<Option<Snapshot>>,
    cursor: AtomicUsize,
}

impl ReplaySource {
    pub fn new(name: impl Into<String>, frames: Vec<Option<Snapshot>>) -> Self {
        Self {
            name: name.into(),
            frames,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay file {}", path.display()))?;
        let frames: Vec<Option<Snapshot>> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse replay file {}", path.display()))?;
        log::info!("Loaded {} recorded frames from {}", frames.len(), path.display());
        Ok(Self::new(format!("Replay ({})", path.display()), frames))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor.load(Ordering::Relaxed) >= self.frames.len()
    }
}

#[async_trait]
impl KeypointSource for ReplaySource {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn detect(&self) -> Result<Option<Snapshot>> {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        Ok(self.frames.get(i).cloned().flatten())
    }
}
