use glam::Vec2;
use gridglow_common::{Rect, Rgba, Viewport};
use gridglow_render::{Paint, Surface};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, CanvasWindingRule, HtmlCanvasElement};

/// [`Surface`] over a 2D canvas context.
///
/// Canvas calls that fail are reported to the browser console; drawing
/// carries on with the next primitive.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx })
    }

    fn set_style(&self, property: &str, value: &JsValue) {
        if let Err(err) = js_sys::Reflect::set(self.ctx.as_ref(), &JsValue::from_str(property), value)
        {
            report("set style", &err);
        }
    }

    fn radial(&self, rect: Rect, g: &gridglow_render::RadialGradient) -> Result<(), JsValue> {
        let (cx, cy) = (g.center.x as f64, g.center.y as f64);
        let gradient = self.ctx.create_radial_gradient(
            cx,
            cy,
            g.inner_radius as f64,
            cx,
            cy,
            g.outer_radius as f64,
        )?;
        gradient.add_color_stop(0.0, &g.inner.css())?;
        gradient.add_color_stop(1.0, &g.outer.css())?;
        self.set_style("fillStyle", gradient.as_ref());
        self.fill(rect);
        Ok(())
    }

    fn fill(&self, rect: Rect) {
        self.ctx.fill_rect(
            rect.x as f64,
            rect.y as f64,
            rect.width as f64,
            rect.height as f64,
        );
    }
}

pub(crate) fn report(what: &str, err: &JsValue) {
    web_sys::console::error_2(&JsValue::from_str(&format!("gridglow: {what} failed:")), err);
}

impl Surface for CanvasSurface {
    fn resize(&mut self, viewport: Viewport) {
        self.canvas.set_width(viewport.width);
        self.canvas.set_height(viewport.height);
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.ctx.clear_rect(
            rect.x as f64,
            rect.y as f64,
            rect.width as f64,
            rect.height as f64,
        );
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        match paint {
            Paint::Solid(color) => {
                self.set_style("fillStyle", &JsValue::from_str(&color.css()));
                self.fill(rect);
            }
            Paint::Radial(g) => {
                // createRadialGradient throws on non-finite input
                if let Err(err) = self.radial(rect, g) {
                    report("radial gradient", &err);
                }
            }
        }
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32) {
        self.set_style("strokeStyle", &JsValue::from_str(&color.css()));
        self.ctx.set_line_width(width as f64);
        self.ctx.begin_path();
        self.ctx.move_to(from.x as f64, from.y as f64);
        self.ctx.line_to(to.x as f64, to.y as f64);
        self.ctx.stroke();
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.set_style("fillStyle", &JsValue::from_str(&color.css()));
        self.ctx.begin_path();
        self.ctx.move_to(first.x as f64, first.y as f64);
        for p in rest {
            self.ctx.line_to(p.x as f64, p.y as f64);
        }
        self.ctx.close_path();
        self.ctx.fill_with_canvas_winding_rule(CanvasWindingRule::Evenodd);
    }
}
