//! Browser-facing engine facade: gate, load, start, wire listeners, tear down.
//!
//! Nothing here returns an error to the page. Gating and load failures leave
//! no trace in the DOM; setup failures hide the container.

use crate::dom;
use crate::env;
use crate::events::{self, Wired, Wiring};
use crate::frame::FrameLoop;
use crate::loader;
use crate::render::GpuBackend;
use globe_core::GlobeEngine;
use instant::Instant;
use std::cell::RefCell;
use std::rc::Rc;
use web_sys as web;

pub struct GlobeManager {
    engine: Rc<RefCell<GlobeEngine<GpuBackend>>>,
    frame_loop: FrameLoop,
    wired: Option<Wired>,
    destroyed: bool,
}

impl GlobeManager {
    /// Run the whole start-up sequence for `container`. `None` means the globe
    /// is not shown (gated, runtime unavailable or setup failed); the reason is logged.
    pub async fn init(container: web::HtmlElement) -> Option<Self> {
        let window = web::window()?;
        let config = dom::read_config(&container);
        log::set_max_level(config.log_level().to_level_filter());

        let signals = env::sample(&window);
        let mut engine: GlobeEngine<GpuBackend> = GlobeEngine::new(config, &signals);
        if engine.is_gated() {
            return None;
        }

        let config = engine.config().clone();
        let backend = match loader::load_backend(container, config.clone(), engine.tier()).await {
            Ok(backend) => backend,
            Err(e) => {
                log::error!("[loader] graphics runtime unavailable: {}", e);
                return None;
            }
        };
        engine.start(backend);
        if !engine.is_running() {
            return None;
        }

        let engine = Rc::new(RefCell::new(engine));
        let frame_loop = {
            let engine = engine.clone();
            FrameLoop::new(move || {
                let mut engine = engine.borrow_mut();
                engine.frame(Instant::now());
                engine.is_running()
            })
        };
        let wired = events::wire_all(
            Wiring {
                engine: engine.clone(),
                frame_loop: frame_loop.clone(),
                signals: Rc::new(RefCell::new(signals)),
                resize_debounce_ms: config.resize_debounce_ms,
            },
            crate::destroy_globe,
        );
        let wired = match wired {
            Ok(wired) => Some(wired),
            Err(e) => {
                log::warn!("[globe] page listeners unavailable: {:#}", e);
                None
            }
        };
        frame_loop.request();
        Some(Self {
            engine,
            frame_loop,
            wired,
            destroyed: false,
        })
    }

    /// Cancel the frame loop, remove listeners, release the scene and GPU,
    /// detach the canvas. Idempotent.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.frame_loop.stop();
        if let Some(mut wired) = self.wired.take() {
            wired.teardown();
        }
        self.engine.borrow_mut().destroy();
    }
}

impl Drop for GlobeManager {
    fn drop(&mut self) {
        self.destroy();
    }
}
