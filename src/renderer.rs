// Renderer that draws a particle field onto anything implementing `DrawTarget`.
// In the browser that is a 2d canvas context; tests record the calls instead.

use crate::color::Color;
use crate::config::Settings;
use crate::field::ParticleField;
use vecmath::Vector2;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

pub trait DrawTarget {
    // Resizes the backing store to `width * pixel_ratio` device pixels while
    // keeping drawing coordinates in logical (css) pixels.
    fn resize(&mut self, width: f64, height: f64, pixel_ratio: f64) -> Result<(), JsValue>;
    fn clear(&mut self, width: f64, height: f64);
    fn fill_circle(
        &mut self,
        center: Vector2<f64>,
        radius: f64,
        color: Color,
        alpha: f64,
    ) -> Result<(), JsValue>;
    fn stroke_line(
        &mut self,
        from: Vector2<f64>,
        to: Vector2<f64>,
        line_width: f64,
        color: Color,
        alpha: f64,
    );
}

pub struct Renderer {
    pub color: Color,
    pub line_width: f64,
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer {
            color: Color::STONE,
            line_width: Settings::LINE_WIDTH,
        }
    }
}

impl Renderer {
    pub fn render<T: DrawTarget + ?Sized>(
        &self,
        field: &ParticleField,
        settings: &Settings,
        target: &mut T,
    ) -> Result<(), JsValue> {
        target.clear(field.width(), field.height());

        for p in field.particles() {
            target.fill_circle(p.pos, p.radius, self.color, p.opacity)?;
        }

        for connection in field.connections(settings.connection_distance) {
            target.stroke_line(
                connection.from,
                connection.to,
                self.line_width,
                self.color,
                connection.opacity,
            );
        }
        Ok(())
    }
}

pub struct CanvasTarget {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasTarget {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d canvas context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(CanvasTarget { canvas, context })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl DrawTarget for CanvasTarget {
    fn resize(&mut self, width: f64, height: f64, pixel_ratio: f64) -> Result<(), JsValue> {
        self.canvas.set_width((width * pixel_ratio) as u32);
        self.canvas.set_height((height * pixel_ratio) as u32);
        let style = self.canvas.style();
        style.set_property("width", &format!("{}px", width))?;
        style.set_property("height", &format!("{}px", height))?;
        // Setting the size resets the transform, so this never compounds
        self.context
            .set_transform(pixel_ratio, 0.0, 0.0, pixel_ratio, 0.0, 0.0)
    }

    fn clear(&mut self, width: f64, height: f64) {
        self.context.clear_rect(0.0, 0.0, width, height);
    }

    #[allow(deprecated)]
    fn fill_circle(
        &mut self,
        center: Vector2<f64>,
        radius: f64,
        color: Color,
        alpha: f64,
    ) -> Result<(), JsValue> {
        self.context.begin_path();
        self.context
            .arc(center[0], center[1], radius, 0.0, std::f64::consts::PI * 2.0)?;
        self.context
            .set_fill_style(&JsValue::from_str(&color.css_rgba(alpha)));
        self.context.fill();
        Ok(())
    }

    #[allow(deprecated)]
    fn stroke_line(
        &mut self,
        from: Vector2<f64>,
        to: Vector2<f64>,
        line_width: f64,
        color: Color,
        alpha: f64,
    ) {
        self.context.begin_path();
        self.context.move_to(from[0], from[1]);
        self.context.line_to(to[0], to[1]);
        self.context
            .set_stroke_style(&JsValue::from_str(&color.css_rgba(alpha)));
        self.context.set_line_width(line_width);
        self.context.stroke();
    }
}
