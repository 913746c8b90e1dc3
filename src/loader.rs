//! Acquires the graphics runtime once, raced against an explicit timeout.

use crate::render::GpuBackend;
use futures::future::{select, Either};
use globe_core::{GlobeConfig, LoadError, QualityTier};
use std::time::Duration;
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

/// Resolves after `duration` on the browser's timer queue.
fn sleep(duration: Duration) -> JsFuture {
    let ms = duration.as_millis().min(i32::MAX as u128) as i32;
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(window) = web::window() {
            _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
        }
    });
    JsFuture::from(promise)
}

pub async fn load_backend(
    container: web::HtmlElement,
    config: GlobeConfig,
    tier: QualityTier,
) -> Result<GpuBackend, LoadError> {
    let timeout = config.load_timeout();
    log::info!("[loader] acquiring graphics runtime (timeout {:?})", timeout);
    let load = Box::pin(GpuBackend::load(container, &config, tier));
    match select(load, Box::pin(sleep(timeout))).await {
        Either::Left((result, _)) => {
            if result.is_ok() {
                log::info!("[loader] graphics runtime ready");
            }
            result
        }
        Either::Right(_) => Err(LoadError::Timeout(timeout)),
    }
}
