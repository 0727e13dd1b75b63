/// Seams between a viewer session and the platform hosting it
use crate::error::Result;
use crate::loader::LoadTicket;
use crate::projection::PerspectiveCamera;
use crate::scene::Scene;

/// Content-box size of a container, in CSS pixels or terminal sub-cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height. A collapsed side counts as one pixel, so the
    /// ratio is always finite and positive.
    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

/// Token for one scheduled frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// GPU-side (or character-grid) output target owned by one session
pub trait RenderSurface {
    fn set_pixel_ratio(&mut self, ratio: f32);

    /// Resize the output; failure means the graphics context is unusable
    fn set_size(&mut self, size: SurfaceSize) -> Result<()>;

    fn size(&self) -> SurfaceSize;

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<()>;

    /// Release backing resources. Must tolerate repeated calls.
    fn dispose(&mut self);
}

/// Everything a session consumes from the platform: the container it draws
/// into, the paint-synchronized frame scheduler and the asset fetcher.
pub trait ViewerHost {
    type Surface: RenderSurface;

    fn content_size(&self) -> SurfaceSize;

    fn device_pixel_ratio(&self) -> f32;

    fn create_surface(&mut self, size: SurfaceSize) -> Result<Self::Surface>;

    fn attach_output(&mut self, surface: &Self::Surface) -> Result<()>;

    fn contains_output(&self, surface: &Self::Surface) -> bool;

    fn detach_output(&mut self, surface: &Self::Surface);

    /// Start delivering container size changes to the session
    fn observe_resize(&mut self) -> Result<()>;

    fn unobserve_resize(&mut self);

    /// Schedule one callback on the next paint
    fn request_frame(&mut self) -> Result<FrameHandle>;

    /// Cancel a scheduled callback. Unknown or already-fired handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Begin fetching the bytes behind a model reference
    fn fetch(&mut self, reference: &str) -> LoadTicket;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_of_collapsed_container_is_finite() {
        assert_eq!(SurfaceSize::new(800, 600).aspect(), 800.0 / 600.0);
        assert_eq!(SurfaceSize::new(640, 0).aspect(), 640.0);
        assert_eq!(SurfaceSize::new(0, 600).aspect(), 1.0 / 600.0);
        assert_eq!(SurfaceSize::new(0, 0).aspect(), 1.0);
    }
}
