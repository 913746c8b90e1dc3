//! Engine facade: gating, lifecycle, resize and pause/resume.
//!
//! The facade never returns an error to its caller. Gating is decided once at
//! construction and is permanent; a failed setup hides the container and
//! leaves the engine in `Failed`; `destroy` is idempotent.

use crate::config::{GlobeConfig, QualityTier};
use crate::device::{gate, DeviceProfile, EnvironmentSignals, GateReason, Viewport};
use crate::driver::GlobeScene;
use crate::error::SetupError;
use crate::quality::{FrameClock, FrameDecision, FrameGovernor};
use instant::Instant;

/// Platform side of the engine: owns the output surface inside the container.
pub trait RenderBackend {
    /// Append the render surface to the container.
    fn attach(&mut self) -> anyhow::Result<()>;
    /// Remove the render surface from the container, if attached.
    fn detach(&mut self);
    /// Hide the container after a failed setup.
    fn hide_container(&mut self);
    fn resize(&mut self, viewport: Viewport, tier: QualityTier) -> anyhow::Result<()>;
    /// Issue one draw of the current scene.
    fn render(&mut self, scene: &GlobeScene) -> anyhow::Result<()>;
    /// Release every GPU resource; the backend is not used afterwards.
    fn dispose(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EngineState {
    /// Refused to start; permanent.
    Gated(GateReason),
    /// Passed gating, waiting for a backend.
    Pending,
    Running,
    Paused,
    Failed,
    Destroyed,
}

/// What a frame callback did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Not running (gated, pending, paused, failed or destroyed).
    Idle,
    Skipped,
    Rendered,
    /// Drawing failed; the error was logged and the loop should continue.
    RenderFailed,
}

pub struct GlobeEngine<B: RenderBackend> {
    config: GlobeConfig,
    profile: DeviceProfile,
    tier: QualityTier,
    viewport: Viewport,
    state: EngineState,
    backend: Option<B>,
    scene: Option<GlobeScene>,
    governor: FrameGovernor,
    clock: FrameClock,
}

impl<B: RenderBackend> GlobeEngine<B> {
    pub fn new(config: GlobeConfig, signals: &EnvironmentSignals) -> Self {
        let profile = DeviceProfile::from_signals(signals);
        let (state, tier) = match gate(&config, signals) {
            Ok(tier) => (EngineState::Pending, tier),
            Err(reason) => {
                log::info!("[gate] globe disabled: {}", reason);
                (EngineState::Gated(reason), QualityTier::Constrained)
            }
        };
        let governor =
            FrameGovernor::new(config.adaptive_quality && tier == QualityTier::Constrained);
        Self {
            viewport: Viewport::for_tier(signals, tier),
            config,
            profile,
            tier,
            state,
            backend: None,
            scene: None,
            governor,
            clock: FrameClock::new(),
        }
    }

    #[inline]
    pub fn state(&self) -> EngineState {
        self.state
    }

    #[inline]
    pub fn is_gated(&self) -> bool {
        matches!(self.state, EngineState::Gated(_))
    }

    /// Whether frame callbacks should keep being scheduled.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == EngineState::Running
    }

    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn config(&self) -> &GlobeConfig {
        &self.config
    }

    pub fn scene(&self) -> Option<&GlobeScene> {
        self.scene.as_ref()
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn governor(&self) -> &FrameGovernor {
        &self.governor
    }

    /// Build the scene on `backend` and start running.
    ///
    /// Ignored unless the engine is `Pending`. Any setup failure is logged, the
    /// container hidden, and the engine moves to `Failed`.
    pub fn start(&mut self, mut backend: B) {
        if self.state != EngineState::Pending {
            log::debug!("[globe] start ignored in state {:?}", self.state);
            return;
        }
        match self.build(&mut backend) {
            Ok(scene) => {
                self.scene = Some(scene);
                self.backend = Some(backend);
                self.clock.reset();
                self.state = EngineState::Running;
                log::info!("[globe] running ({:?} tier)", self.tier);
            }
            Err(e) => {
                log::error!("[globe] failed to initialize: {}", e);
                backend.detach();
                backend.dispose();
                backend.hide_container();
                self.state = EngineState::Failed;
            }
        }
    }

    fn build(&self, backend: &mut B) -> Result<GlobeScene, SetupError> {
        let scene = GlobeScene::setup(&self.config, self.tier)?;
        backend
            .resize(self.viewport, self.tier)
            .map_err(SetupError::Backend)?;
        backend.attach().map_err(SetupError::Backend)?;
        Ok(scene)
    }

    /// Frame callback at wall-clock time `now`.
    pub fn frame(&mut self, now: Instant) -> FrameOutcome {
        if self.state != EngineState::Running {
            return FrameOutcome::Idle;
        }
        let dt = self.clock.tick(now);
        self.step(dt)
    }

    /// Advance by an explicit frame time: throttle check, scene step, draw.
    pub fn step(&mut self, dt: f32) -> FrameOutcome {
        if self.state != EngineState::Running {
            return FrameOutcome::Idle;
        }
        if self.governor.observe(dt) == FrameDecision::Skip {
            return FrameOutcome::Skipped;
        }
        let (Some(scene), Some(backend)) = (self.scene.as_mut(), self.backend.as_mut()) else {
            return FrameOutcome::Idle;
        };
        scene.step(dt);
        match backend.render(scene) {
            Ok(()) => FrameOutcome::Rendered,
            Err(e) => {
                log::error!("[render] frame failed: {:#}", e);
                FrameOutcome::RenderFailed
            }
        }
    }

    /// Page hidden: stop ticking; nothing advances while paused.
    pub fn pause(&mut self) {
        if self.state == EngineState::Running {
            self.state = EngineState::Paused;
            log::debug!("[globe] paused");
        }
    }

    /// Page visible again; the first frame after resuming measures zero time.
    pub fn resume(&mut self) {
        if self.state == EngineState::Paused {
            self.clock.reset();
            self.state = EngineState::Running;
            log::debug!("[globe] resumed");
        }
    }

    /// Recompute the square viewport and the live quality tier.
    pub fn resize(&mut self, signals: &EnvironmentSignals) {
        if !matches!(self.state, EngineState::Running | EngineState::Paused) {
            return;
        }
        let tier = self.profile.tier_for_width(signals.viewport_width);
        if tier != self.tier {
            log::info!("[globe] quality tier {:?} -> {:?}", self.tier, tier);
            self.tier = tier;
            if let Some(scene) = self.scene.as_mut() {
                scene.apply_tier(self.config.tier(tier));
            }
        }
        self.governor
            .set_enabled(self.config.adaptive_quality && tier == QualityTier::Constrained);
        self.viewport = Viewport::for_tier(signals, tier);
        if let Some(backend) = self.backend.as_mut() {
            if let Err(e) = backend.resize(self.viewport, tier) {
                log::error!("[render] resize failed: {:#}", e);
            }
        }
    }

    /// Tear everything down. Safe to call any number of times, in any state.
    pub fn destroy(&mut self) {
        if let Some(mut scene) = self.scene.take() {
            scene.dispose();
        }
        if let Some(mut backend) = self.backend.take() {
            backend.dispose();
            backend.detach();
            log::info!("[globe] destroyed");
        }
        if !self.is_gated() {
            self.state = EngineState::Destroyed;
        }
    }
}

impl<B: RenderBackend> Drop for GlobeEngine<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}
