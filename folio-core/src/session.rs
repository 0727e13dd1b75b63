/// Viewer session lifecycle
///
/// One session owns one surface, camera and scene. The render loop is a
/// chain of single frame callbacks: every [`ViewerSession::tick`] schedules
/// its successor before doing any work, and the pending handle is the only
/// cancellation token. Changing the model reference rebuilds everything.
use log::{debug, error, info, trace};

use crate::config::ViewerConfig;
use crate::error::{LoadError, Result};
use crate::host::{FrameHandle, RenderSurface, SurfaceSize, ViewerHost};
use crate::lighting::Light;
use crate::loader::{self, FetchResult, LoadStatus, LoadTicket};
use crate::projection::PerspectiveCamera;
use crate::scene::Scene;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerState {
    Unmounted,
    Mounting,
    Ready,
}

/// Model progress while the session is ready
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelState {
    Loading,
    Loaded,
    /// Terminal for this load attempt; only a remount retries
    Failed(String),
}

pub struct ViewerSession<H: ViewerHost> {
    host: H,
    config: ViewerConfig,
    state: ViewerState,
    model_state: ModelState,
    reference: Option<String>,
    surface: Option<H::Surface>,
    camera: Option<PerspectiveCamera>,
    scene: Option<Scene>,
    pending_load: Option<LoadTicket>,
    frame: Option<FrameHandle>,
    observing_resize: bool,
    time: f32,
}

impl<H: ViewerHost> ViewerSession<H> {
    pub fn new(host: H, config: ViewerConfig) -> Self {
        Self {
            host,
            config,
            state: ViewerState::Unmounted,
            model_state: ModelState::Loading,
            reference: None,
            surface: None,
            camera: None,
            scene: None,
            pending_load: None,
            frame: None,
            observing_resize: false,
            time: 0.0,
        }
    }

    /// Build surface, camera, lights and loop, start loading `reference` and
    /// render the first frame.
    ///
    /// Mounting an already mounted session tears it down first.
    pub fn mount(&mut self, reference: &str) -> Result<()> {
        if self.state != ViewerState::Unmounted {
            self.unmount();
        }

        self.state = ViewerState::Mounting;
        if let Err(e) = self.build(reference) {
            error!("failed to mount viewer for {}: {}", reference, e);
            self.unmount();
            return Err(e);
        }
        info!("viewer mounted for {}", reference);
        Ok(())
    }

    fn build(&mut self, reference: &str) -> Result<()> {
        let size = self.host.content_size();

        let mut surface = self.host.create_surface(size)?;
        surface.set_pixel_ratio(self.host.device_pixel_ratio());
        surface.set_size(size)?;
        self.surface = Some(surface);
        if let Some(surface) = &self.surface {
            self.host.attach_output(surface)?;
        }

        self.camera = Some(PerspectiveCamera::from_config(&self.config.camera, size.aspect()));
        self.scene = Some(Scene::new(Light::rig(&self.config.lighting)));
        self.time = 0.0;

        self.reference = Some(reference.to_string());
        self.model_state = ModelState::Loading;
        self.pending_load = Some(self.host.fetch(reference));

        self.host.observe_resize()?;
        self.observing_resize = true;

        self.state = ViewerState::Ready;
        self.tick()
    }

    /// One render-loop iteration: reschedule, apply a finished load, advance
    /// the idle animation and draw.
    pub fn tick(&mut self) -> Result<()> {
        if self.state != ViewerState::Ready {
            trace!("ignoring frame for a session that is not ready");
            return Ok(());
        }

        if let Some(previous) = self.frame.take() {
            self.host.cancel_frame(previous);
        }
        self.frame = Some(self.host.request_frame()?);

        self.poll_load();
        self.advance();

        match (&mut self.surface, &self.scene, &self.camera) {
            (Some(surface), Some(scene), Some(camera)) => surface.render(scene, camera),
            _ => Ok(()),
        }
    }

    fn poll_load(&mut self) {
        let Some(ticket) = &mut self.pending_load else {
            return;
        };
        if let LoadStatus::Ready(result) = ticket.poll() {
            self.pending_load = None;
            self.apply_load(result);
        }
    }

    fn apply_load(&mut self, result: FetchResult) {
        let reference = self.reference.as_deref().unwrap_or_default();
        let loaded = result.and_then(|bytes| {
            let mut model = loader::parse_model(&bytes)?;
            let fit = model.normalize(self.config.target_size)?;
            debug!(
                "normalized {}: center={:?} size={:?} scale={}",
                reference, fit.center, fit.size, fit.scale
            );
            Ok::<_, LoadError>(model)
        });

        match loaded {
            Ok(model) => {
                info!("loaded model {} ({} triangles)", reference, model.mesh.triangles.len());
                if let Some(scene) = &mut self.scene {
                    scene.set_model(model);
                }
                self.model_state = ModelState::Loaded;
            }
            Err(e) => {
                error!("Error loading model {}: {}", reference, e);
                self.model_state = ModelState::Failed(e.to_string());
            }
        }
    }

    fn advance(&mut self) {
        let animation = &self.config.animation;
        self.time += animation.time_step;
        if let Some(scene) = &mut self.scene {
            scene.transform.rotation.y = self.time * animation.spin_rate;
            scene.transform.position.y = self.time.sin() * animation.bob_amplitude;
        }
    }

    /// Match camera and surface to a new container size
    pub fn resize(&mut self, size: SurfaceSize) -> Result<()> {
        if self.state != ViewerState::Ready {
            return Ok(());
        }
        if let Some(camera) = &mut self.camera {
            camera.aspect = size.aspect();
            camera.update_projection_matrix();
        }
        if let Some(surface) = &mut self.surface {
            surface.set_size(size)?;
        }
        debug!("viewer resized to {}x{}", size.width, size.height);
        Ok(())
    }

    /// Resize to whatever the container currently measures
    pub fn handle_container_resize(&mut self) -> Result<()> {
        let size = self.host.content_size();
        self.resize(size)
    }

    /// Release everything in reverse order of acquisition. Safe to repeat.
    pub fn unmount(&mut self) {
        if self.observing_resize {
            self.host.unobserve_resize();
            self.observing_resize = false;
        }
        if let Some(frame) = self.frame.take() {
            self.host.cancel_frame(frame);
        }
        if let Some(mut surface) = self.surface.take() {
            if self.host.contains_output(&surface) {
                self.host.detach_output(&surface);
            }
            surface.dispose();
        }

        self.pending_load = None;
        self.scene = None;
        self.camera = None;
        if self.state != ViewerState::Unmounted {
            debug!("viewer unmounted");
        }
        self.state = ViewerState::Unmounted;
    }

    /// Full teardown followed by a fresh mount for `reference`
    pub fn remount(&mut self, reference: &str) -> Result<()> {
        self.unmount();
        self.mount(reference)
    }

    pub fn state(&self) -> ViewerState {
        self.state
    }

    pub fn model_state(&self) -> &ModelState {
        &self.model_state
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn camera(&self) -> Option<&PerspectiveCamera> {
        self.camera.as_ref()
    }

    pub fn surface(&self) -> Option<&H::Surface> {
        self.surface.as_ref()
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.frame
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

impl<H: ViewerHost> Drop for ViewerSession<H> {
    fn drop(&mut self) {
        self.unmount();
    }
}
