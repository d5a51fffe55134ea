//! Fixed-interval detect-and-paint scheduler.
//!
//! One detection may be pending at a time. Timer ticks that land while it is
//! pending, or before the detector and frame are ready, are skipped and
//! counted. After a stop request nothing is committed.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::config::{AppConfig, TrackingConfig};
use crate::error::SkipReason;
use crate::extractor::EyeRegionExtractor;
use crate::gaze::{GazeNormalizer, Session};
use crate::mapper::ScreenMapper;
use crate::overlay::{Surface, Viewport};
use crate::pipeline::KeypointSource;
use crate::trail::TrailStore;
use crate::types::{DrawablePoint, Snapshot};

type DetectionResult = Result<Option<Snapshot>, SkipReason>;
type Detection = Pin<Box<dyn Future<Output = DetectionResult> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Detector has not reported ready yet.
    Uninitialized,
    Idle,
    Detecting,
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Appended(DrawablePoint),
    Skipped(SkipReason),
    /// The loop is stopped, or was stopped while this tick was pending.
    Stopped,
}

/// Per-loop counters. `ticks == appended + skipped`, except for a detection
/// abandoned by a stop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickStats {
    pub ticks: u64,
    pub appended: u64,
    pub skipped: BTreeMap<&'static str, u64>,
    /// Times a readiness streak reached `not_ready_warn_after`.
    pub not_ready_warnings: u64,
}

impl TickStats {
    fn record(&mut self, outcome: &TickOutcome) {
        match outcome {
            TickOutcome::Appended(_) => {
                self.ticks += 1;
                self.appended += 1;
            }
            TickOutcome::Skipped(reason) => {
                self.ticks += 1;
                *self.skipped.entry(reason.kind()).or_insert(0) += 1;
            }
            TickOutcome::Stopped => {}
        }
    }

    pub fn skipped_total(&self) -> u64 {
        self.skipped.values().sum()
    }

    pub fn skips(&self, kind: &str) -> u64 {
        self.skipped.get(kind).copied().unwrap_or(0)
    }

    /// Share of ticks that produced a trail point.
    pub fn effective_rate(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            self.appended as f64 / self.ticks as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopOptions {
    pub tick_interval: Duration,
    pub detection_timeout: Option<Duration>,
    /// Consecutive readiness skips before warning. 0 never warns.
    pub not_ready_warn_after: u32,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self::from(&TrackingConfig::default())
    }
}

impl From<&TrackingConfig> for LoopOptions {
    fn from(c: &TrackingConfig) -> Self {
        Self {
            tick_interval: c.tick_interval(),
            detection_timeout: c.detection_timeout(),
            not_ready_warn_after: c.not_ready_warn_after,
        }
    }
}

/// Requests a stop from outside the loop. Cheap to clone.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

/// What is left after [`RenderLoop::run`] returns.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub stats: TickStats,
    pub trail: TrailStore,
}

pub struct RenderLoop<S: KeypointSource + ?Sized, F: Surface> {
    source: Arc<S>,
    viewport: Box<dyn Viewport + Send + Sync>,
    surface: F,
    extractor: EyeRegionExtractor,
    normalizer: GazeNormalizer,
    mapper: ScreenMapper,
    options: LoopOptions,

    session: Session,
    trail: TrailStore,
    state: LoopState,
    stats: TickStats,
    not_ready_streak: u32,

    stop_tx: Arc<watch::Sender<bool>>,
    stop_rx: watch::Receiver<bool>,
}

impl<S, F> RenderLoop<S, F>
where
    S: KeypointSource + ?Sized + 'static,
    F: Surface,
{
    pub fn new(
        source: Arc<S>,
        viewport: impl Viewport + Send + Sync + 'static,
        surface: F,
        extractor: EyeRegionExtractor,
        normalizer: GazeNormalizer,
        mapper: ScreenMapper,
        options: LoopOptions,
    ) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        Self {
            source,
            viewport: Box::new(viewport),
            surface,
            extractor,
            normalizer,
            mapper,
            options,
            session: Session::new(),
            trail: TrailStore::new(),
            state: LoopState::Uninitialized,
            stats: TickStats::default(),
            not_ready_streak: 0,
            stop_tx: Arc::new(stop_tx),
            stop_rx,
        }
    }

    pub fn from_config(
        source: Arc<S>,
        viewport: impl Viewport + Send + Sync + 'static,
        surface: F,
        config: &AppConfig,
    ) -> Self {
        Self::new(
            source,
            viewport,
            surface,
            EyeRegionExtractor::new(
                config.landmarks.eye_contour.as_str(),
                config.landmarks.iris.as_str(),
            ),
            config.gaze.normalizer(),
            config.render.mapper(),
            LoopOptions::from(&config.tracking),
        )
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn trail(&self) -> &TrailStore {
        &self.trail
    }

    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    pub fn surface(&self) -> &F {
        &self.surface
    }

    pub fn into_surface(self) -> F {
        self.surface
    }

    pub fn source_name(&self) -> String {
        self.source.name()
    }

    /// Consecutive ticks skipped because the detector or frame was not ready.
    pub fn not_ready_streak(&self) -> u32 {
        self.not_ready_streak
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle { tx: Arc::clone(&self.stop_tx) }
    }

    fn stop_requested(&self) -> bool {
        *self.stop_rx.borrow()
    }

    /// Ends the session: drops session state and returns the trail. The
    /// surface keeps its last paint.
    pub fn stop(&mut self) -> TrailStore {
        self.stop_tx.send_replace(true);
        if self.state != LoopState::Stopped {
            log::info!(
                "Render loop stopped after {} ticks ({} points)",
                self.stats.ticks,
                self.trail.len()
            );
        }
        self.state = LoopState::Stopped;
        self.session = Session::new();
        std::mem::take(&mut self.trail)
    }

    /// Starts a new session on the same loop, e.g. after the detector was
    /// re-initialised. Has no effect once stopped.
    pub fn restart_session(&mut self) {
        if self.state == LoopState::Stopped {
            log::warn!("Ignoring session restart on a stopped render loop");
            return;
        }
        log::info!("Restarting tracking session");
        self.session = Session::new();
        self.trail.clear();
        self.state = LoopState::Uninitialized;
        self.not_ready_streak = 0;
        self.trail.repaint(&mut self.surface);
    }

    /// Runs one complete tick: readiness checks, detection, then the
    /// extract, normalize, map, append and repaint chain.
    pub async fn tick(&mut self) -> TickOutcome {
        if self.stop_requested() || self.state == LoopState::Stopped {
            self.stop();
            return TickOutcome::Stopped;
        }
        self.clear_abandoned_detection();
        match self.begin_detection() {
            Ok(detection) => {
                let result = {
                    // Dropping this future mid-detection must not leave it Detecting.
                    let _in_flight = InFlight { state: &mut self.state };
                    detection.await
                };
                self.complete_detection(result)
            }
            Err(reason) => self.settle(TickOutcome::Skipped(reason)),
        }
    }

    /// Drives ticks on the configured interval until stopped through a
    /// [`StopHandle`].
    pub async fn run(&mut self) -> RunReport {
        let mut stop_rx = self.stop_rx.clone();
        let mut interval = tokio::time::interval(self.options.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut pending: Option<Detection> = None;
        self.clear_abandoned_detection();

        log::info!(
            "Render loop started: source '{}', tick every {:?}, policy {:?}",
            self.source.name(),
            self.options.tick_interval,
            self.normalizer.policy()
        );

        while self.state != LoopState::Stopped {
            tokio::select! {
                biased;
                _ = stop_rx.wait_for(|stopped| *stopped) => {
                    // Pending detection is dropped here, never committed.
                    break;
                }
                result = wait_pending(&mut pending) => {
                    pending = None;
                    self.complete_detection(result);
                }
                _ = interval.tick() => {
                    match self.begin_detection() {
                        Ok(detection) => pending = Some(detection),
                        Err(reason) => {
                            self.settle(TickOutcome::Skipped(reason));
                        }
                    }
                }
            }
        }

        let trail = self.stop();
        RunReport { stats: self.stats.clone(), trail }
    }

    /// `&mut self` rules out a live detection on entry to `tick`/`run`, so a
    /// `Detecting` state here was left by a dropped `run()` future.
    fn clear_abandoned_detection(&mut self) {
        if self.state == LoopState::Detecting {
            log::debug!("Discarding detection abandoned by a cancelled run");
            self.state = LoopState::Idle;
        }
    }

    fn begin_detection(&mut self) -> Result<Detection, SkipReason> {
        if self.state == LoopState::Detecting {
            return Err(SkipReason::DetectionInFlight);
        }
        if !self.source.detector_ready() {
            return Err(SkipReason::DetectorNotReady);
        }
        if self.state == LoopState::Uninitialized {
            log::info!("Detector '{}' ready", self.source.name());
            self.state = LoopState::Idle;
        }
        if !self.source.frame_ready() {
            return Err(SkipReason::FrameNotReady);
        }

        self.state = LoopState::Detecting;
        let source = Arc::clone(&self.source);
        let timeout = self.options.detection_timeout;
        Ok(Box::pin(async move {
            let detected = match timeout {
                Some(limit) => tokio::time::timeout(limit, source.detect())
                    .await
                    .map_err(|_| SkipReason::DetectionTimedOut)?,
                None => source.detect().await,
            };
            detected.map_err(|e| SkipReason::DetectorFailed(format!("{:#}", e)))
        }))
    }

    fn complete_detection(&mut self, result: DetectionResult) -> TickOutcome {
        if self.stop_requested() || self.state == LoopState::Stopped {
            self.stop();
            return TickOutcome::Stopped;
        }
        self.state = LoopState::Idle;
        let outcome = match result.and_then(|snapshot| self.commit(snapshot)) {
            Ok(point) => TickOutcome::Appended(point),
            Err(reason) => TickOutcome::Skipped(reason),
        };
        self.settle(outcome)
    }

    fn commit(&mut self, snapshot: Option<Snapshot>) -> Result<DrawablePoint, SkipReason> {
        let snapshot = snapshot.filter(|s| !s.is_empty()).ok_or(SkipReason::NoFaceDetected)?;
        let region = self.extractor.extract(&snapshot)?;

        let viewport = self.viewport.size();
        let mut session = self.session;
        let sample = self.normalizer.estimate(&mut session, &region, viewport)?;

        if self.surface.size() != viewport {
            log::debug!("Resizing overlay to {}x{}", viewport.width, viewport.height);
            self.surface.resize(viewport);
        }
        let point = self.mapper.map(sample, self.surface.size());

        self.session = session;
        self.trail.append(point);
        self.trail.repaint(&mut self.surface);
        Ok(point)
    }

    fn settle(&mut self, outcome: TickOutcome) -> TickOutcome {
        self.stats.record(&outcome);
        match &outcome {
            TickOutcome::Appended(p) => {
                self.not_ready_streak = 0;
                log::trace!(
                    "Gaze point ({:.1}, {:.1}), trail length {}",
                    p.x,
                    p.y,
                    self.trail.len()
                );
            }
            TickOutcome::Skipped(reason) if reason.is_readiness() => {
                let before = self.not_ready_streak;
                self.not_ready_streak = before.saturating_add(1);
                // Once per streak; a saturated streak does not re-warn.
                if self.not_ready_streak != before
                    && self.not_ready_streak == self.options.not_ready_warn_after
                {
                    self.stats.not_ready_warnings += 1;
                    log::warn!(
                        "Source '{}' not ready for {} consecutive ticks ({}); \
                         overlay will stay empty",
                        self.source.name(),
                        self.not_ready_streak,
                        reason
                    );
                }
                log::debug!("Tick skipped: {}", reason);
            }
            TickOutcome::Skipped(reason) => {
                self.not_ready_streak = 0;
                log::debug!("Tick skipped: {}", reason);
            }
            TickOutcome::Stopped => {}
        }
        outcome
    }
}

/// Returns a loop left in `Detecting` to `Idle` when dropped.
struct InFlight<'a> {
    state: &'a mut LoopState,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if *self.state == LoopState::Detecting {
            *self.state = LoopState::Idle;
        }
    }
}

async fn wait_pending(pending: &mut Option<Detection>) -> DetectionResult {
    match pending {
        Some(detection) => detection.await,
        None => std::future::pending().await,
    }
}
