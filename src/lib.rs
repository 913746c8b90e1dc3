#![cfg(target_arch = "wasm32")]
use std::cell::{Cell, RefCell};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

mod constants;
mod dom;
mod env;
mod events;
mod frame;
mod loader;
mod manager;
mod render;

use constants::{CONTAINER_ID, LAZY_ROOT_MARGIN};
use manager::GlobeManager;

struct LazyMount {
    observer: web::IntersectionObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, web::IntersectionObserver)>,
}

thread_local! {
    static ACTIVE: RefCell<Option<GlobeManager>> = const { RefCell::new(None) };
    static LAZY: RefCell<Option<LazyMount>> = const { RefCell::new(None) };
    static MOUNTING: Cell<bool> = const { Cell::new(false) };
    // bumped by every teardown so an in-flight mount knows it was cancelled
    static GENERATION: Cell<u32> = const { Cell::new(0) };
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();

    let Some(container) = dom::window_document().and_then(|d| dom::find_container(&d, CONTAINER_ID))
    else {
        log::debug!("[globe] no #{} on this page", CONTAINER_ID);
        return Ok(());
    };
    if let Err(e) = observe_once(container.clone()) {
        log::warn!("[globe] lazy start unavailable ({:#}), starting now", e);
        mount(container);
    }
    Ok(())
}

/// Start the globe right away instead of waiting for the container to scroll into view.
#[wasm_bindgen]
pub fn init_globe() {
    disconnect_lazy_mount();
    if let Some(container) =
        dom::window_document().and_then(|d| dom::find_container(&d, CONTAINER_ID))
    {
        mount(container);
    }
}

/// Tear the globe down. Safe to call at any time, any number of times.
#[wasm_bindgen]
pub fn destroy_globe() {
    GENERATION.with(|g| g.set(g.get().wrapping_add(1)));
    disconnect_lazy_mount();
    let manager = ACTIVE.with(|a| a.borrow_mut().take());
    if let Some(mut manager) = manager {
        manager.destroy();
    }
}

fn observe_once(container: web::HtmlElement) -> anyhow::Result<()> {
    let target = container.clone();
    let callback = Closure::wrap(Box::new(
        move |entries: js_sys::Array, observer: web::IntersectionObserver| {
            let visible = entries
                .iter()
                .filter_map(|e| e.dyn_into::<web::IntersectionObserverEntry>().ok())
                .any(|e| e.is_intersecting());
            if visible {
                observer.disconnect();
                mount(target.clone());
            }
        },
    ) as Box<dyn FnMut(js_sys::Array, web::IntersectionObserver)>);

    let options = web::IntersectionObserverInit::new();
    options.set_root_margin(LAZY_ROOT_MARGIN);
    let observer =
        web::IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)
            .map_err(dom::js_error)?;
    observer.observe(&container);
    LAZY.with(|l| {
        *l.borrow_mut() = Some(LazyMount {
            observer,
            _callback: callback,
        })
    });
    Ok(())
}

fn disconnect_lazy_mount() {
    if let Some(lazy) = LAZY.with(|l| l.borrow_mut().take()) {
        lazy.observer.disconnect();
    }
}

/// Construct the engine exactly once per page (until torn down).
fn mount(container: web::HtmlElement) {
    if MOUNTING.with(Cell::get) || ACTIVE.with(|a| a.borrow().is_some()) {
        return;
    }
    MOUNTING.with(|m| m.set(true));
    let generation = GENERATION.with(Cell::get);
    spawn_local(async move {
        let manager = GlobeManager::init(container).await;
        MOUNTING.with(|m| m.set(false));
        let Some(mut manager) = manager else {
            return;
        };
        if GENERATION.with(Cell::get) != generation {
            log::info!("[globe] torn down while starting");
            manager.destroy();
            return;
        }
        ACTIVE.with(|a| *a.borrow_mut() = Some(manager));
    });
}
