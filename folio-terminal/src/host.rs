/// Terminal host for viewer sessions: a rectangular region of the screen,
/// a fixed-rate frame pacer and background file loading.
use folio_core::loader;
use folio_core::{FrameHandle, LoadTicket, Result, SurfaceSize, ViewerError, ViewerHost};
use log::{debug, trace};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::renderer::{AsciiSurface, CELL_ASPECT};

/// Screen rectangle a viewer draws into, in terminal cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub left: u16,
    pub top: u16,
    pub cols: u16,
    pub rows: u16,
}

impl Viewport {
    pub fn new(left: u16, top: u16, cols: u16, rows: u16) -> Self {
        Self { left, top, cols, rows }
    }

    /// Content size in half-cells, see [`CELL_ASPECT`]
    pub fn content_size(&self) -> SurfaceSize {
        SurfaceSize::new(self.cols as u32, self.rows as u32 * CELL_ASPECT)
    }
}

/// Stands in for the host's paint clock. At most one callback is pending;
/// it becomes due one interval after it was requested.
#[derive(Debug)]
pub struct FramePacer {
    interval: Duration,
    next_id: u64,
    pending: Option<(FrameHandle, Instant)>,
}

impl FramePacer {
    pub fn new(fps: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / fps.max(1),
            next_id: 1,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn request(&mut self, now: Instant) -> Result<FrameHandle> {
        if self.pending.is_some() {
            return Err(ViewerError::Scheduler("a frame is already scheduled".to_string()));
        }
        let handle = FrameHandle(self.next_id);
        self.next_id += 1;
        self.pending = Some((handle, now + self.interval));
        Ok(handle)
    }

    pub fn cancel(&mut self, handle: FrameHandle) {
        if matches!(self.pending, Some((pending, _)) if pending == handle) {
            self.pending = None;
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending.is_some()
    }

    /// Fire the pending callback if its time has come
    pub fn take_due(&mut self, now: Instant) -> Option<FrameHandle> {
        match self.pending {
            Some((handle, due)) if now >= due => {
                self.pending = None;
                Some(handle)
            }
            _ => None,
        }
    }

    /// Time until the pending callback is due
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending.map(|(_, due)| due.saturating_duration_since(now))
    }
}

pub struct TerminalHost {
    viewport: Viewport,
    pacer: FramePacer,
    assets_root: Option<PathBuf>,
    next_surface: u64,
    attached: Option<u64>,
    observing: bool,
}

impl TerminalHost {
    pub fn new(viewport: Viewport, fps: u32) -> Self {
        Self {
            viewport,
            pacer: FramePacer::new(fps),
            assets_root: None,
            next_surface: 1,
            attached: None,
            observing: false,
        }
    }

    /// Serve model references from `root`, the way a web server serves its
    /// public directory: `/model.glb` means `root/model.glb`.
    pub fn set_assets_root(&mut self, root: impl Into<PathBuf>) {
        self.assets_root = Some(root.into());
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Move the container. Returns whether the session should be told.
    pub fn set_viewport(&mut self, viewport: Viewport) -> bool {
        let changed = viewport != self.viewport;
        self.viewport = viewport;
        changed && self.observing
    }

    pub fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    pub fn pacer_mut(&mut self) -> &mut FramePacer {
        &mut self.pacer
    }

    fn resolve(&self, reference: &str) -> PathBuf {
        match &self.assets_root {
            Some(root) => root.join(reference.trim_start_matches('/')),
            None => PathBuf::from(reference),
        }
    }
}

impl ViewerHost for TerminalHost {
    type Surface = AsciiSurface;

    fn content_size(&self) -> SurfaceSize {
        self.viewport.content_size()
    }

    fn device_pixel_ratio(&self) -> f32 {
        1.0
    }

    fn create_surface(&mut self, size: SurfaceSize) -> Result<AsciiSurface> {
        let id = self.next_surface;
        self.next_surface += 1;
        Ok(AsciiSurface::new(id, size))
    }

    fn attach_output(&mut self, surface: &AsciiSurface) -> Result<()> {
        if self.attached.is_some() {
            return Err(ViewerError::Container(
                "viewport already shows another surface".to_string(),
            ));
        }
        self.attached = Some(surface.id());
        Ok(())
    }

    fn contains_output(&self, surface: &AsciiSurface) -> bool {
        self.attached == Some(surface.id())
    }

    fn detach_output(&mut self, surface: &AsciiSurface) {
        if self.contains_output(surface) {
            self.attached = None;
        }
    }

    fn observe_resize(&mut self) -> Result<()> {
        self.observing = true;
        Ok(())
    }

    fn unobserve_resize(&mut self) {
        self.observing = false;
    }

    fn request_frame(&mut self) -> Result<FrameHandle> {
        let handle = self.pacer.request(Instant::now())?;
        trace!("scheduled frame {:?}", handle);
        Ok(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.pacer.cancel(handle);
    }

    fn fetch(&mut self, reference: &str) -> LoadTicket {
        let path = self.resolve(reference);
        debug!("loading model from {}", path.display());
        loader::fetch_file(path)
    }
}
