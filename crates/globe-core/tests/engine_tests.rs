// Host-side tests for the engine facade, driven through a recording backend.

use anyhow::anyhow;
use globe_core::{
    EngineState, EnvironmentSignals, FrameOutcome, GateReason, GlobeConfig, GlobeEngine,
    GlobeScene, QualityTier, RenderBackend, Viewport,
};
use instant::Instant;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Default)]
struct Log {
    attached: usize,
    hidden: bool,
    disposed: usize,
    renders: usize,
    resizes: Vec<(Viewport, QualityTier)>,
    last_connections: usize,
}

#[derive(Default)]
struct RecordingBackend {
    log: Rc<RefCell<Log>>,
    fail_attach: bool,
    fail_render: bool,
}

impl RecordingBackend {
    fn new() -> (Self, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        (
            Self {
                log: log.clone(),
                ..Self::default()
            },
            log,
        )
    }
}

impl RenderBackend for RecordingBackend {
    fn attach(&mut self) -> anyhow::Result<()> {
        if self.fail_attach {
            return Err(anyhow!("canvas refused"));
        }
        self.log.borrow_mut().attached += 1;
        Ok(())
    }

    fn detach(&mut self) {
        let mut log = self.log.borrow_mut();
        log.attached = log.attached.saturating_sub(1);
    }

    fn hide_container(&mut self) {
        self.log.borrow_mut().hidden = true;
    }

    fn resize(&mut self, viewport: Viewport, tier: QualityTier) -> anyhow::Result<()> {
        self.log.borrow_mut().resizes.push((viewport, tier));
        Ok(())
    }

    fn render(&mut self, scene: &GlobeScene) -> anyhow::Result<()> {
        let mut log = self.log.borrow_mut();
        log.renders += 1;
        log.last_connections = scene.connections().len();
        if self.fail_render {
            return Err(anyhow!("device lost"));
        }
        Ok(())
    }

    fn dispose(&mut self) {
        self.log.borrow_mut().disposed += 1;
    }
}

fn config() -> GlobeConfig {
    GlobeConfig {
        seed: Some(17),
        ..GlobeConfig::default()
    }
}

fn narrow() -> EnvironmentSignals {
    EnvironmentSignals {
        viewport_width: 500.0,
        ..EnvironmentSignals::default()
    }
}

fn running() -> (GlobeEngine<RecordingBackend>, Rc<RefCell<Log>>) {
    let mut engine = GlobeEngine::new(config(), &EnvironmentSignals::default());
    let (backend, log) = RecordingBackend::new();
    engine.start(backend);
    assert_eq!(engine.state(), EngineState::Running);
    (engine, log)
}

#[test]
fn narrow_viewport_never_creates_a_surface() {
    let mut engine: GlobeEngine<RecordingBackend> = GlobeEngine::new(config(), &narrow());
    assert!(engine.is_gated());
    assert_eq!(
        engine.state(),
        EngineState::Gated(GateReason::NarrowViewport(500.0))
    );

    let (backend, log) = RecordingBackend::new();
    engine.start(backend);
    assert_eq!(log.borrow().attached, 0);
    assert!(engine.scene().is_none());
    assert_eq!(engine.frame(Instant::now()), FrameOutcome::Idle);

    engine.destroy();
    assert!(engine.is_gated());
    assert_eq!(log.borrow().disposed, 0);
}

#[test]
fn start_attaches_one_surface_sized_to_the_viewport() {
    let (engine, log) = running();
    let log = log.borrow();
    assert_eq!(log.attached, 1);
    assert_eq!(log.resizes.len(), 1);
    let (viewport, tier) = log.resizes[0];
    assert_eq!(tier, QualityTier::Full);
    assert_eq!(viewport.size_css, 900.0 * 1.2);
    assert_eq!(engine.tier(), QualityTier::Full);
    assert!(!engine.governor().is_enabled());
}

#[test]
fn second_start_is_ignored() {
    let (mut engine, log) = running();
    let (other, other_log) = RecordingBackend::new();
    engine.start(other);
    assert_eq!(log.borrow().attached, 1);
    assert_eq!(other_log.borrow().attached, 0);
}

#[test]
fn destroy_twice_leaves_no_surface() {
    let (mut engine, log) = running();
    engine.destroy();
    engine.destroy();
    assert_eq!(engine.state(), EngineState::Destroyed);
    assert_eq!(log.borrow().attached, 0);
    assert_eq!(log.borrow().disposed, 1);
    assert!(engine.scene().is_none());
    assert_eq!(engine.step(0.016), FrameOutcome::Idle);
}

#[test]
fn dropping_the_engine_destroys_it() {
    let (engine, log) = running();
    drop(engine);
    assert_eq!(log.borrow().attached, 0);
    assert_eq!(log.borrow().disposed, 1);
}

#[test]
fn setup_failure_hides_the_container() {
    let mut engine = GlobeEngine::new(config(), &EnvironmentSignals::default());
    let (mut backend, log) = RecordingBackend::new();
    backend.fail_attach = true;
    engine.start(backend);
    assert_eq!(engine.state(), EngineState::Failed);
    assert!(log.borrow().hidden);
    assert_eq!(log.borrow().attached, 0);
    assert_eq!(log.borrow().disposed, 1);
    assert_eq!(engine.step(0.016), FrameOutcome::Idle);
}

#[test]
fn invalid_config_fails_without_attaching() {
    let bad = GlobeConfig {
        radius: -5.0,
        ..config()
    };
    let mut engine = GlobeEngine::new(bad, &EnvironmentSignals::default());
    let (backend, log) = RecordingBackend::new();
    engine.start(backend);
    assert_eq!(engine.state(), EngineState::Failed);
    assert!(log.borrow().hidden);
    assert!(log.borrow().resizes.is_empty());
}

#[test]
fn render_errors_do_not_stop_the_loop() {
    let mut engine = GlobeEngine::new(config(), &EnvironmentSignals::default());
    let (mut backend, log) = RecordingBackend::new();
    backend.fail_render = true;
    engine.start(backend);
    for _ in 0..5 {
        assert_eq!(engine.step(0.016), FrameOutcome::RenderFailed);
    }
    assert!(engine.is_running());
    assert_eq!(log.borrow().renders, 5);
}

#[test]
fn paused_engine_does_not_advance() {
    let (mut engine, log) = running();
    engine.step(0.5);
    let rotation = engine.scene().unwrap().rotation_y();

    engine.pause();
    assert_eq!(engine.state(), EngineState::Paused);
    for _ in 0..10 {
        assert_eq!(engine.step(0.5), FrameOutcome::Idle);
    }
    assert_eq!(engine.scene().unwrap().rotation_y(), rotation);
    assert_eq!(log.borrow().renders, 1);

    engine.resume();
    assert!(engine.is_running());
    assert_eq!(engine.step(0.5), FrameOutcome::Rendered);
}

#[test]
fn first_frame_after_resume_measures_zero() {
    let (mut engine, _log) = running();
    let t0 = Instant::now();
    engine.frame(t0);
    engine.frame(t0 + Duration::from_millis(16));
    engine.pause();
    engine.resume();
    // a long hidden period must not spawn or age anything
    engine.frame(t0 + Duration::from_secs(60));
    let scene = engine.scene().unwrap();
    assert!(scene.connections().is_empty());
}

#[test]
fn connection_cap_holds_while_running() {
    let (mut engine, log) = running();
    for _ in 0..5000 {
        engine.step(1.0 / 60.0);
        assert!(log.borrow().last_connections <= 10);
    }
    assert!(log.borrow().last_connections > 0);
}

#[test]
fn resize_to_narrow_switches_to_the_constrained_tier() {
    let (mut engine, log) = running();
    engine.resize(&narrow());
    assert_eq!(engine.tier(), QualityTier::Constrained);
    assert!(engine.governor().is_enabled());
    let settings = engine.scene().unwrap().settings();
    assert_eq!(settings.max_connections, 3);
    assert_eq!(settings.spawn_interval_sec, 2.5);
    assert_eq!(log.borrow().resizes.last().unwrap().1, QualityTier::Constrained);
    assert_eq!(engine.viewport().pixel_ratio, 1.0);

    engine.resize(&EnvironmentSignals::default());
    assert_eq!(engine.tier(), QualityTier::Full);
    assert!(!engine.governor().is_enabled());
    assert_eq!(engine.scene().unwrap().settings().max_connections, 10);
}

#[test]
fn resize_into_a_smaller_tier_enforces_the_new_cap() {
    let (mut engine, log) = running();
    for _ in 0..2000 {
        engine.step(1.0 / 60.0);
        if engine.scene().unwrap().connections().len() > 3 {
            break;
        }
    }
    assert!(engine.scene().unwrap().connections().len() > 3);

    engine.resize(&narrow());
    assert!(engine.scene().unwrap().connections().len() <= 3);
    for _ in 0..300 {
        engine.step(1.0 / 60.0);
        assert!(log.borrow().last_connections <= 3);
    }
}

#[test]
fn constrained_engine_enables_the_governor() {
    let permissive = GlobeConfig {
        allow_constrained: true,
        ..config()
    };
    let mut engine = GlobeEngine::new(permissive, &narrow());
    let (backend, _log) = RecordingBackend::new();
    engine.start(backend);
    assert_eq!(engine.tier(), QualityTier::Constrained);
    assert!(engine.governor().is_enabled());
    assert_eq!(engine.scene().unwrap().field().len(), 60);

    let mut skipped = 0;
    for _ in 0..40 {
        if engine.step(1.0 / 15.0) == FrameOutcome::Skipped {
            skipped += 1;
        }
    }
    assert!(skipped >= 10);
}

#[test]
fn resize_before_start_is_ignored() {
    let mut engine: GlobeEngine<RecordingBackend> =
        GlobeEngine::new(config(), &EnvironmentSignals::default());
    engine.resize(&narrow());
    assert_eq!(engine.tier(), QualityTier::Full);
    assert_eq!(engine.state(), EngineState::Pending);
}
