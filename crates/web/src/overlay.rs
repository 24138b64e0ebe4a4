use std::cell::RefCell;
use std::rc::Rc;

use gridglow_common::{GridConfig, Viewport};
use gridglow_render::{AnimationLoop, GridRenderer};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, MouseEvent, Window};

use crate::canvas::{CanvasSurface, report};
use crate::clock::RafClock;

/// Id of the canvas element the overlay creates.
pub const CANVAS_ID: &str = "cyberpunk-grid";

/// Fixed full-window layer behind all content that never takes pointer input.
pub const CANVAS_STYLE: &str =
    "position:fixed;top:0;left:0;width:100%;height:100%;z-index:-1;pointer-events:none";

/// Viewport for a window's CSS inner size. Missing or nonsensical sizes are
/// treated as zero.
pub fn viewport_from_inner_size(width: Option<f64>, height: Option<f64>) -> Viewport {
    let px = |v: Option<f64>| match v {
        Some(v) if v.is_finite() && v > 0.0 => v as u32,
        _ => 0,
    };
    Viewport::new(px(width), px(height))
}

fn inner_viewport(window: &Window) -> Viewport {
    viewport_from_inner_size(
        window.inner_width().ok().and_then(|v| v.as_f64()),
        window.inner_height().ok().and_then(|v| v.as_f64()),
    )
}

struct OverlayState {
    anim: AnimationLoop,
    surface: CanvasSurface,
    clock: RafClock,
}

/// The lit grid mounted behind the page.
///
/// Dropping the overlay (or calling `free()` from JS) disposes it.
#[wasm_bindgen]
pub struct GridOverlay {
    window: Window,
    canvas: HtmlCanvasElement,
    state: Rc<RefCell<OverlayState>>,
    // Bound into the clock; must outlive every pending frame request.
    _on_frame: Closure<dyn FnMut(f64)>,
    on_resize: Closure<dyn FnMut()>,
    on_pointer: Closure<dyn FnMut(MouseEvent)>,
    disposed: bool,
}

impl GridOverlay {
    /// Mount with the stock look and start animating.
    pub fn mount() -> Result<GridOverlay, JsValue> {
        Self::mount_with_config(GridConfig::default())
    }

    pub fn mount_with_config(config: GridConfig) -> Result<GridOverlay, JsValue> {
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let body = document
            .body()
            .ok_or_else(|| JsValue::from_str("no document body"))?;

        let canvas = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()?;
        canvas.set_id(CANVAS_ID);
        canvas.set_attribute("style", CANVAS_STYLE)?;
        body.append_child(&canvas)?;

        let viewport = inner_viewport(&window);
        let renderer = GridRenderer::with_config(config, viewport)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        let mut surface = CanvasSurface::new(canvas.clone())?;
        let mut anim = AnimationLoop::new(renderer);
        anim.renderer_mut().on_resize(viewport, &mut surface);

        let state = Rc::new(RefCell::new(OverlayState {
            anim,
            surface,
            clock: RafClock::new(window.clone()),
        }));

        let on_frame = {
            let state = Rc::clone(&state);
            Closure::<dyn FnMut(f64)>::new(move |_timestamp: f64| {
                let Ok(mut guard) = state.try_borrow_mut() else {
                    return;
                };
                let OverlayState {
                    anim,
                    surface,
                    clock,
                } = &mut *guard;
                if let Some(request) = anim.pending() {
                    anim.on_frame(request, clock, surface);
                }
            })
        };
        state
            .borrow_mut()
            .clock
            .bind(on_frame.as_ref().unchecked_ref::<js_sys::Function>().clone());

        let on_resize = {
            let state = Rc::clone(&state);
            let window = window.clone();
            Closure::<dyn FnMut()>::new(move || {
                let Ok(mut guard) = state.try_borrow_mut() else {
                    return;
                };
                let OverlayState { anim, surface, .. } = &mut *guard;
                anim.renderer_mut()
                    .on_resize(inner_viewport(&window), surface);
            })
        };
        window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;

        let on_pointer = {
            let state = Rc::clone(&state);
            Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
                if let Ok(mut guard) = state.try_borrow_mut() {
                    guard
                        .anim
                        .renderer_mut()
                        .on_pointer_move(event.client_x() as f32, event.client_y() as f32);
                }
            })
        };
        window
            .add_event_listener_with_callback("mousemove", on_pointer.as_ref().unchecked_ref())?;

        tracing::debug!(
            width = viewport.width,
            height = viewport.height,
            "grid overlay mounted"
        );

        let overlay = GridOverlay {
            window,
            canvas,
            state,
            _on_frame: on_frame,
            on_resize,
            on_pointer,
            disposed: false,
        };
        overlay.start();
        Ok(overlay)
    }
}

#[wasm_bindgen]
impl GridOverlay {
    /// Resume animating. Returns `false` if already running or disposed.
    pub fn start(&self) -> bool {
        if self.disposed {
            return false;
        }
        let mut guard = self.state.borrow_mut();
        let OverlayState { anim, clock, .. } = &mut *guard;
        anim.start(clock)
    }

    /// Pause animating. The last frame stays on the canvas.
    pub fn stop(&self) -> bool {
        let mut guard = self.state.borrow_mut();
        let OverlayState { anim, clock, .. } = &mut *guard;
        anim.stop(clock)
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.state.borrow().anim.is_running()
    }

    /// Stop the loop, remove the listeners and detach the canvas. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.stop();

        for (event, callback) in [
            ("resize", self.on_resize.as_ref()),
            ("mousemove", self.on_pointer.as_ref()),
        ] {
            if let Err(err) = self
                .window
                .remove_event_listener_with_callback(event, callback.unchecked_ref())
            {
                report("removeEventListener", &err);
            }
        }
        self.canvas.remove();
        tracing::debug!("grid overlay disposed");
    }
}

impl Drop for GridOverlay {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_size_maps_to_viewport() {
        assert_eq!(
            viewport_from_inner_size(Some(1280.0), Some(720.0)),
            Viewport::new(1280, 720)
        );
        assert_eq!(
            viewport_from_inner_size(Some(1280.7), Some(719.2)),
            Viewport::new(1280, 719)
        );
    }

    #[test]
    fn bad_inner_size_is_empty() {
        assert_eq!(viewport_from_inner_size(None, Some(10.0)), Viewport::new(0, 10));
        assert_eq!(
            viewport_from_inner_size(Some(f64::NAN), Some(-3.0)),
            Viewport::new(0, 0)
        );
        assert_eq!(
            viewport_from_inner_size(Some(f64::INFINITY), Some(1.0)),
            Viewport::new(0, 1)
        );
    }

    #[test]
    fn canvas_sits_behind_content() {
        assert!(CANVAS_STYLE.contains("position:fixed"));
        assert!(CANVAS_STYLE.contains("z-index:-1"));
        assert!(CANVAS_STYLE.contains("pointer-events:none"));
        assert_eq!(CANVAS_ID, "cyberpunk-grid");
    }
}
