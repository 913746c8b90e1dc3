use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

struct LoopState {
    tick: RefCell<Option<Closure<dyn FnMut()>>>,
    pending: Cell<Option<i32>>,
}

impl LoopState {
    fn request(&self) {
        if self.pending.get().is_some() {
            return;
        }
        let Some(w) = web::window() else {
            return;
        };
        if let Some(tick) = self.tick.borrow().as_ref() {
            match w.request_animation_frame(tick.as_ref().unchecked_ref()) {
                Ok(handle) => self.pending.set(Some(handle)),
                Err(e) => log::error!("[render] requestAnimationFrame failed: {:?}", e),
            }
        }
    }
}

/// `requestAnimationFrame` loop with a cancellable pending callback.
///
/// `on_frame` returns whether another frame should be scheduled. The tick
/// closure only holds a weak reference to the loop, so dropping every
/// `FrameLoop` handle (or calling `stop`) releases it.
#[derive(Clone)]
pub struct FrameLoop {
    state: Rc<LoopState>,
}

impl FrameLoop {
    pub fn new(mut on_frame: impl FnMut() -> bool + 'static) -> Self {
        let state = Rc::new(LoopState {
            tick: RefCell::new(None),
            pending: Cell::new(None),
        });
        let weak: Weak<LoopState> = Rc::downgrade(&state);
        *state.tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            let Some(state) = weak.upgrade() else {
                return;
            };
            state.pending.set(None);
            if on_frame() {
                state.request();
            }
        }) as Box<dyn FnMut()>));
        Self { state }
    }

    /// Schedule the next frame unless one is already pending.
    pub fn request(&self) {
        self.state.request();
    }

    /// Cancel the pending frame, if any; `request` restarts the loop.
    pub fn cancel(&self) {
        if let Some(handle) = self.state.pending.take() {
            if let Some(w) = web::window() {
                _ = w.cancel_animation_frame(handle);
            }
        }
    }

    /// Cancel and release the tick closure; the loop cannot be restarted.
    pub fn stop(&self) {
        self.cancel();
        self.state.tick.borrow_mut().take();
    }
}
