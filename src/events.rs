use crate::dom;
use crate::env;
use crate::frame::FrameLoop;
use crate::render::GpuBackend;
use globe_core::{EnvironmentSignals, GlobeEngine};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// A registered DOM listener; removed from its target when dropped.
pub struct Listener {
    target: web::EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut()>,
}

impl Listener {
    pub fn add(
        target: &web::EventTarget,
        kind: &'static str,
        handler: impl FnMut() + 'static,
    ) -> anyhow::Result<Self> {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut()>);
        target
            .add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
            .map_err(dom::js_error)?;
        Ok(Self {
            target: target.clone(),
            kind,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.callback.as_ref().unchecked_ref());
    }
}

/// Trailing-edge debounce on the window timer.
pub struct Debounced {
    delay_ms: i32,
    timer: Cell<Option<i32>>,
    fire: Closure<dyn FnMut()>,
}

impl Debounced {
    pub fn new(delay_ms: u32, handler: impl FnMut() + 'static) -> Rc<Self> {
        Rc::new(Self {
            delay_ms: delay_ms.min(i32::MAX as u32) as i32,
            timer: Cell::new(None),
            fire: Closure::wrap(Box::new(handler) as Box<dyn FnMut()>),
        })
    }

    /// Restart the countdown.
    pub fn trigger(&self) {
        let Some(w) = web::window() else {
            return;
        };
        if let Some(handle) = self.timer.take() {
            w.clear_timeout_with_handle(handle);
        }
        match w.set_timeout_with_callback_and_timeout_and_arguments_0(
            self.fire.as_ref().unchecked_ref(),
            self.delay_ms,
        ) {
            Ok(handle) => self.timer.set(Some(handle)),
            Err(e) => log::warn!("[globe] setTimeout failed: {:?}", e),
        }
    }

    pub fn cancel(&self) {
        if let (Some(handle), Some(w)) = (self.timer.take(), web::window()) {
            w.clear_timeout_with_handle(handle);
        }
    }
}

pub struct Wiring {
    pub engine: Rc<RefCell<GlobeEngine<GpuBackend>>>,
    pub frame_loop: FrameLoop,
    pub signals: Rc<RefCell<EnvironmentSignals>>,
    pub resize_debounce_ms: u32,
}

/// Everything `wire_all` registered; dropping it unregisters the listeners.
pub struct Wired {
    pub listeners: Vec<Listener>,
    pub resize: Rc<Debounced>,
}

impl Wired {
    pub fn teardown(&mut self) {
        self.resize.cancel();
        self.listeners.clear();
    }
}

/// `on_unload` runs on a microtask after `beforeunload`, since it may drop the
/// listener that invoked it.
pub fn wire_all(wiring: Wiring, on_unload: fn()) -> anyhow::Result<Wired> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow::anyhow!("no document"))?;

    let resize = wire_resize_debounce(&wiring);
    let resize_trigger = resize.clone();
    let listeners = vec![
        Listener::add(window.as_ref(), "resize", move || resize_trigger.trigger())?,
        wire_visibility(&document, &wiring)?,
        Listener::add(window.as_ref(), "beforeunload", move || {
            wasm_bindgen_futures::spawn_local(async move { on_unload() })
        })?,
    ];
    Ok(Wired { listeners, resize })
}

fn wire_resize_debounce(wiring: &Wiring) -> Rc<Debounced> {
    let engine = wiring.engine.clone();
    let signals = wiring.signals.clone();
    Debounced::new(wiring.resize_debounce_ms, move || {
        let Some(w) = web::window() else {
            return;
        };
        let mut signals = signals.borrow_mut();
        env::refresh_viewport(&w, &mut signals);
        engine.borrow_mut().resize(&signals);
    })
}

// Hidden: stop scheduling frames. Visible: restart the clock and the loop.
fn wire_visibility(document: &web::Document, wiring: &Wiring) -> anyhow::Result<Listener> {
    let engine = wiring.engine.clone();
    let frame_loop = wiring.frame_loop.clone();
    let doc = document.clone();
    Listener::add(document.as_ref(), "visibilitychange", move || {
        if doc.hidden() {
            engine.borrow_mut().pause();
            frame_loop.cancel();
        } else {
            engine.borrow_mut().resume();
            if engine.borrow().is_running() {
                frame_loop.request();
            }
        }
    })
}
