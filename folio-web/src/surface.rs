/// Canvas 2D render surface
use folio_core::{
    shade_scene, PerspectiveCamera, RenderSurface, Result, Scene, SurfaceSize, ViewerError,
};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

/// Model color at full brightness
const BASE_RGB: (f32, f32, f32) = (205.0, 208.0, 220.0);

/// A `<canvas>` owned by one viewer session. Sizes are CSS pixels; the
/// backing store is scaled by the pixel ratio.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    size: SurfaceSize,
    pixel_ratio: f32,
    disposed: bool,
}

fn surface_err(what: &str, e: JsValue) -> ViewerError {
    ViewerError::Surface(format!("{}: {:?}", what, e))
}

impl CanvasSurface {
    pub fn create(document: &Document, size: SurfaceSize) -> Result<Self> {
        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(|e| surface_err("create canvas", e))?
            .dyn_into()
            .map_err(|_| ViewerError::Surface("element is not a canvas".to_string()))?;
        let context: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .map_err(|e| surface_err("get 2d context", e))?
            .ok_or(ViewerError::ContextLost)?
            .dyn_into()
            .map_err(|_| ViewerError::ContextLost)?;

        let mut surface = Self {
            canvas,
            context,
            size,
            pixel_ratio: 1.0,
            disposed: false,
        };
        surface.apply_size()?;
        Ok(surface)
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn apply_size(&mut self) -> Result<()> {
        let ratio = self.pixel_ratio as f64;
        self.canvas
            .set_width((self.size.width as f64 * ratio).round() as u32);
        self.canvas
            .set_height((self.size.height as f64 * ratio).round() as u32);

        let style = self.canvas.style();
        style
            .set_property("width", &format!("{}px", self.size.width))
            .map_err(|e| surface_err("set css width", e))?;
        style
            .set_property("height", &format!("{}px", self.size.height))
            .map_err(|e| surface_err("set css height", e))?;

        // Resizing the backing store resets the transform
        self.context
            .set_transform(ratio, 0.0, 0.0, ratio, 0.0, 0.0)
            .map_err(|e| surface_err("set transform", e))
    }

    fn set_fill(&self, shade: f32) {
        let (r, g, b) = BASE_RGB;
        let color = format!(
            "rgb({}, {}, {})",
            (r * shade).round(),
            (g * shade).round(),
            (b * shade).round()
        );
        let _ = js_sys::Reflect::set(
            &self.context,
            &JsValue::from_str("fillStyle"),
            &JsValue::from_str(&color),
        );
    }
}

impl RenderSurface for CanvasSurface {
    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = if ratio.is_finite() && ratio > 0.0 { ratio } else { 1.0 };
    }

    fn set_size(&mut self, size: SurfaceSize) -> Result<()> {
        if self.disposed {
            return Err(ViewerError::Surface("surface was disposed".to_string()));
        }
        self.size = size;
        self.apply_size()
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<()> {
        if self.disposed {
            return Err(ViewerError::ContextLost);
        }

        let width = self.size.width as f32;
        let height = self.size.height as f32;
        self.context.clear_rect(0.0, 0.0, width as f64, height as f64);

        // Painter's algorithm: farthest first
        let mut triangles = shade_scene(scene, camera, width, height);
        triangles.retain(|t| t.is_front_facing());
        triangles.sort_by(|a, b| b.depth().total_cmp(&a.depth()));

        for triangle in &triangles {
            let [a, b, c] = triangle.points;
            self.set_fill(triangle.shade);
            self.context.begin_path();
            self.context.move_to(a.x as f64, a.y as f64);
            self.context.line_to(b.x as f64, b.y as f64);
            self.context.line_to(c.x as f64, c.y as f64);
            self.context.close_path();
            self.context.fill();
        }
        Ok(())
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        // Releases the backing store
        self.canvas.set_width(0);
        self.canvas.set_height(0);
    }
}
