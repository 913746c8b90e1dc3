use crate::constants::{CANVAS_CLASS, CONFIG_ATTRIBUTE};
use globe_core::{GlobeConfig, Viewport};
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

#[inline]
pub fn js_error(value: JsValue) -> anyhow::Error {
    anyhow::anyhow!("{:?}", value)
}

pub fn find_container(document: &web::Document, id: &str) -> Option<web::HtmlElement> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<web::HtmlElement>().ok())
}

/// Configuration from the container's JSON attribute; absent or malformed means defaults.
pub fn read_config(container: &web::Element) -> GlobeConfig {
    let Some(raw) = container.get_attribute(CONFIG_ATTRIBUTE) else {
        return GlobeConfig::default();
    };
    match serde_json::from_str::<GlobeConfig>(&raw) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("[globe] ignoring malformed {}: {}", CONFIG_ATTRIBUTE, e);
            GlobeConfig::default()
        }
    }
}

/// Detached canvas for the render surface; attached later by the backend.
pub fn create_canvas(document: &web::Document) -> anyhow::Result<web::HtmlCanvasElement> {
    let canvas = document
        .create_element("canvas")
        .map_err(js_error)?
        .dyn_into::<web::HtmlCanvasElement>()
        .map_err(|_| anyhow::anyhow!("created element is not a canvas"))?;
    canvas.set_class_name(CANVAS_CLASS);
    canvas.set_width(1);
    canvas.set_height(1);
    Ok(canvas)
}

/// Square backing store of `px` device pixels shown at the viewport's CSS size.
pub fn size_canvas(canvas: &web::HtmlCanvasElement, px: u32, viewport: Viewport) {
    canvas.set_width(px);
    canvas.set_height(px);
    let css = format!("{}px", viewport.size_css.round());
    let style = canvas.style();
    _ = style.set_property("width", &css);
    _ = style.set_property("height", &css);
    _ = style.set_property("display", "block");
}

pub fn hide(element: &web::HtmlElement) {
    _ = element.style().set_property("display", "none");
}
