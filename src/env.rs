//! Samples the read-only environment hints the gate and viewport need.

use crate::constants::{GL_MAX_TEXTURE_SIZE, REDUCED_MOTION_QUERY};
use globe_core::{EnvironmentSignals, GraphicsProbe};
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

pub fn sample(window: &web::Window) -> EnvironmentSignals {
    let navigator = window.navigator();
    let mut signals = EnvironmentSignals {
        prefers_reduced_motion: prefers_reduced_motion(window),
        device_memory_gb: device_memory(&navigator),
        hardware_concurrency: hardware_concurrency(&navigator),
        graphics: window
            .document()
            .map(|d| probe_graphics(&d))
            .unwrap_or(GraphicsProbe::Unavailable),
        ..EnvironmentSignals::default()
    };
    refresh_viewport(window, &mut signals);
    log::debug!("[gate] environment {:?}", signals);
    signals
}

/// Update only the fields that change on resize.
pub fn refresh_viewport(window: &web::Window, signals: &mut EnvironmentSignals) {
    signals.viewport_width = as_f64(window.inner_width()).unwrap_or(0.0);
    signals.viewport_height = as_f64(window.inner_height()).unwrap_or(0.0);
    signals.device_pixel_ratio = window.device_pixel_ratio();
}

#[inline]
fn as_f64(value: Result<JsValue, JsValue>) -> Option<f64> {
    value.ok().and_then(|v| v.as_f64())
}

fn prefers_reduced_motion(window: &web::Window) -> bool {
    matches!(window.match_media(REDUCED_MOTION_QUERY), Ok(Some(mql)) if mql.matches())
}

// not exposed by every browser, and not typed in web-sys
fn device_memory(navigator: &web::Navigator) -> Option<f64> {
    js_sys::Reflect::get(navigator, &JsValue::from_str("deviceMemory"))
        .ok()
        .and_then(|v| v.as_f64())
        .filter(|gb| *gb > 0.0)
}

fn hardware_concurrency(navigator: &web::Navigator) -> Option<u32> {
    let cores = navigator.hardware_concurrency();
    (cores.is_finite() && cores >= 1.0).then_some(cores as u32)
}

/// Throwaway WebGL context: reports whether WebGL exists and its max texture size.
fn probe_graphics(document: &web::Document) -> GraphicsProbe {
    let Some(canvas) = document
        .create_element("canvas")
        .ok()
        .and_then(|el| el.dyn_into::<web::HtmlCanvasElement>().ok())
    else {
        return GraphicsProbe::Unavailable;
    };
    let Some(gl) = canvas
        .get_context("webgl")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into::<web::WebGlRenderingContext>().ok())
    else {
        return GraphicsProbe::Unavailable;
    };
    let max_texture_size = gl
        .get_parameter(GL_MAX_TEXTURE_SIZE)
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0) as u32;
    if let Ok(Some(ext)) = gl.get_extension("WEBGL_lose_context") {
        ext.unchecked_into::<web::WebglLoseContext>().lose_context();
    }
    GraphicsProbe::Available { max_texture_size }
}
