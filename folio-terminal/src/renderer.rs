/// ASCII render surface for terminal viewers
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use folio_core::{
    shade_scene, PerspectiveCamera, RenderSurface, Result, Scene, ScreenPoint, SurfaceSize,
    ViewerError,
};
use std::io::Write;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Terminal cells are roughly twice as tall as they are wide. Containers
/// report their height in half-cells so aspect ratios stay physical.
pub const CELL_ASPECT: u32 = 2;

/// Character-grid surface that a viewer session renders into.
///
/// The session owns it; the application blits the finished grid with
/// [`AsciiSurface::draw`] after each frame.
pub struct AsciiSurface {
    id: u64,
    size: SurfaceSize,
    pixel_ratio: f32,
    cols: usize,
    rows: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    disposed: bool,
}

impl AsciiSurface {
    pub fn new(id: u64, size: SurfaceSize) -> Self {
        let mut surface = Self {
            id,
            size: SurfaceSize::default(),
            pixel_ratio: 1.0,
            cols: 0,
            rows: 0,
            depth_buffer: Vec::new(),
            char_buffer: Vec::new(),
            disposed: false,
        };
        surface.allocate(size);
        surface
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Grid dimensions in terminal cells
    pub fn grid(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn allocate(&mut self, size: SurfaceSize) {
        self.size = size;
        self.cols = size.width as usize;
        self.rows = (size.height / CELL_ASPECT) as usize;
        let cells = self.cols * self.rows;
        self.depth_buffer = vec![f32::INFINITY; cells];
        self.char_buffer = vec![' '; cells];
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// One row of the last rendered frame
    pub fn row(&self, y: usize) -> Option<String> {
        if y >= self.rows {
            return None;
        }
        let start = y * self.cols;
        Some(self.char_buffer[start..start + self.cols].iter().collect())
    }

    fn rasterize_triangle(&mut self, points: &[ScreenPoint; 3], character: char) {
        let [v0, v1, v2] = *points;

        // Bounding box, clipped to the grid
        let min_x = v0.x.min(v1.x).min(v2.x).floor().max(0.0) as usize;
        let min_y = v0.y.min(v1.y).min(v2.y).floor().max(0.0) as usize;
        let max_x = v0.x.max(v1.x).max(v2.x).ceil().min(self.cols as f32) as usize;
        let max_y = v0.y.max(v1.y).max(v2.y).ceil().min(self.rows as f32) as usize;

        for y in min_y..max_y {
            for x in min_x..max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let Some((w0, w1, w2)) = barycentric((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y), p)
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.depth + w1 * v1.depth + w2 * v2.depth;
                let idx = y * self.cols + x;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.char_buffer[idx] = character;
                }
            }
        }
    }

    /// Blit the grid with its top-left corner at `(left, top)`
    pub fn draw<W: Write>(&self, writer: &mut W, left: u16, top: u16) -> std::io::Result<()> {
        for y in 0..self.rows {
            writer.queue(cursor::MoveTo(left, top + y as u16))?;
            for x in 0..self.cols {
                let c = self.char_buffer[y * self.cols + x];

                // Color based on character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    _ => Color::Cyan,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl RenderSurface for AsciiSurface {
    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
    }

    fn set_size(&mut self, size: SurfaceSize) -> Result<()> {
        if self.disposed {
            return Err(ViewerError::Surface("surface was disposed".to_string()));
        }
        if size != self.size {
            self.allocate(size);
        }
        Ok(())
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<()> {
        if self.disposed {
            return Err(ViewerError::ContextLost);
        }
        self.clear();

        let mut triangles = shade_scene(scene, camera, self.cols as f32, self.rows as f32);
        triangles.retain(|t| t.is_front_facing());
        for triangle in &triangles {
            let index = (triangle.shade * (LUMINOSITY_RAMP.len() - 1) as f32).round() as usize;
            let character = LUMINOSITY_RAMP[index.min(LUMINOSITY_RAMP.len() - 1)];
            self.rasterize_triangle(&triangle.points, character);
        }
        Ok(())
    }

    fn dispose(&mut self) {
        self.disposed = true;
        self.depth_buffer = Vec::new();
        self.char_buffer = Vec::new();
        self.cols = 0;
        self.rows = 0;
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
