/// Viewer lifecycle tests
///
/// Drives `ViewerSession` through a recording host: frames are scheduled
/// into a pending set that the test "paints" by hand, and every surface
/// reports its disposal back to the host.
use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};

use folio_core::{
    FrameHandle, LoadError, LoadSender, LoadTicket, Mesh, ModelState, PerspectiveCamera,
    RenderSurface, Result, Scene, SurfaceSize, ViewerConfig, ViewerError, ViewerHost,
    ViewerSession, ViewerState,
};

// ============================================================================
// Recording host
// ============================================================================

struct RecordingSurface {
    id: u32,
    size: SurfaceSize,
    pixel_ratio: f32,
    renders: Rc<Cell<u32>>,
    disposals: Rc<Cell<u32>>,
    fail_render: Rc<Cell<bool>>,
    fail_resize: Rc<Cell<bool>>,
}

impl RenderSurface for RecordingSurface {
    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
    }

    fn set_size(&mut self, size: SurfaceSize) -> Result<()> {
        if self.fail_resize.get() {
            return Err(ViewerError::ContextLost);
        }
        self.size = size;
        Ok(())
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn render(&mut self, _scene: &Scene, _camera: &PerspectiveCamera) -> Result<()> {
        if self.fail_render.get() {
            return Err(ViewerError::Render("device lost".to_string()));
        }
        self.renders.set(self.renders.get() + 1);
        Ok(())
    }

    fn dispose(&mut self) {
        self.disposals.set(self.disposals.get() + 1);
    }
}

enum Asset {
    Bytes(Vec<u8>),
    Missing,
    Deferred,
}

struct RecordingHost {
    size: SurfaceSize,
    pixel_ratio: f32,
    asset: Asset,
    deferred: Option<LoadSender>,
    next_frame: u64,
    pending_frames: HashSet<u64>,
    cancelled: u32,
    next_surface: u32,
    attached: Option<u32>,
    detached: u32,
    observing: bool,
    renders: Rc<Cell<u32>>,
    disposals: Rc<Cell<u32>>,
    fail_render: Rc<Cell<bool>>,
    fail_resize: Rc<Cell<bool>>,
}

impl RecordingHost {
    fn new(width: u32, height: u32, asset: Asset) -> Self {
        Self {
            size: SurfaceSize::new(width, height),
            pixel_ratio: 2.0,
            asset,
            deferred: None,
            next_frame: 1,
            pending_frames: HashSet::new(),
            cancelled: 0,
            next_surface: 0,
            attached: None,
            detached: 0,
            observing: false,
            renders: Rc::new(Cell::new(0)),
            disposals: Rc::new(Cell::new(0)),
            fail_render: Rc::new(Cell::new(false)),
            fail_resize: Rc::new(Cell::new(false)),
        }
    }

    /// Simulate the host painting: every pending callback fires
    fn paint(&mut self) -> usize {
        let fired = self.pending_frames.len();
        self.pending_frames.clear();
        fired
    }
}

impl ViewerHost for RecordingHost {
    type Surface = RecordingSurface;

    fn content_size(&self) -> SurfaceSize {
        self.size
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    fn create_surface(&mut self, size: SurfaceSize) -> Result<RecordingSurface> {
        self.next_surface += 1;
        Ok(RecordingSurface {
            id: self.next_surface,
            size,
            pixel_ratio: 1.0,
            renders: Rc::clone(&self.renders),
            disposals: Rc::clone(&self.disposals),
            fail_render: Rc::clone(&self.fail_render),
            fail_resize: Rc::clone(&self.fail_resize),
        })
    }

    fn attach_output(&mut self, surface: &RecordingSurface) -> Result<()> {
        self.attached = Some(surface.id);
        Ok(())
    }

    fn contains_output(&self, surface: &RecordingSurface) -> bool {
        self.attached == Some(surface.id)
    }

    fn detach_output(&mut self, _surface: &RecordingSurface) {
        self.attached = None;
        self.detached += 1;
    }

    fn observe_resize(&mut self) -> Result<()> {
        self.observing = true;
        Ok(())
    }

    fn unobserve_resize(&mut self) {
        self.observing = false;
    }

    fn request_frame(&mut self) -> Result<FrameHandle> {
        let id = self.next_frame;
        self.next_frame += 1;
        self.pending_frames.insert(id);
        Ok(FrameHandle(id))
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending_frames.remove(&handle.0) {
            self.cancelled += 1;
        }
    }

    fn fetch(&mut self, _reference: &str) -> LoadTicket {
        match &self.asset {
            Asset::Bytes(bytes) => LoadTicket::ready(Ok(bytes.clone())),
            Asset::Missing => LoadTicket::ready(Err(LoadError::Http {
                url: "/missing.glb".to_string(),
                status: 404,
            })),
            Asset::Deferred => {
                let (sender, ticket) = LoadTicket::channel();
                self.deferred = Some(sender);
                ticket
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// ASCII STL for an axis-aligned box
fn box_stl(center: [f32; 3], size: [f32; 3]) -> Vec<u8> {
    let mesh = Mesh::cuboid(Point3::from(center), Vector3::from(size));
    let mut text = String::from("solid box\n");
    for triangle in &mesh.triangles {
        let n = triangle.calculate_normal();
        text.push_str(&format!("facet normal {} {} {}\nouter loop\n", n.x, n.y, n.z));
        for vertex in &triangle.vertices {
            let p = vertex.position;
            text.push_str(&format!("vertex {} {} {}\n", p.x, p.y, p.z));
        }
        text.push_str("endloop\nendfacet\n");
    }
    text.push_str("endsolid box\n");
    text.into_bytes()
}

fn mounted(host: RecordingHost) -> ViewerSession<RecordingHost> {
    let mut session = ViewerSession::new(host, ViewerConfig::default());
    session.mount("model.stl").unwrap();
    session
}

/// Paint, then run the callback the session had scheduled
fn frame(session: &mut ViewerSession<RecordingHost>) {
    assert_eq!(session.host_mut().paint(), 1);
    session.tick().unwrap();
}

// ============================================================================
// Mount and load
// ============================================================================

#[test]
fn test_reference_model_is_normalized() {
    let host = RecordingHost::new(800, 600, Asset::Bytes(box_stl([10.0, 10.0, 10.0], [2.0, 4.0, 1.0])));
    let session = mounted(host);

    assert_eq!(session.state(), ViewerState::Ready);
    assert_eq!(session.model_state(), &ModelState::Loaded);

    let model = session.scene().unwrap().model().unwrap();
    assert_relative_eq!(model.transform.scale, Vector3::repeat(0.75), epsilon = 1e-6);
    assert_relative_eq!(model.transform.position, Vector3::repeat(-7.5), epsilon = 1e-4);

    let bounds = model.world_bounds();
    assert_relative_eq!(bounds.center(), Point3::origin(), epsilon = 1e-4);
    assert_relative_eq!(bounds.max_extent(), 3.0, epsilon = 1e-4);

    let camera = session.camera().unwrap();
    assert_relative_eq!(camera.aspect, 800.0 / 600.0);
    assert_eq!(camera.fov_degrees, 50.0);
    assert_eq!(camera.position, Point3::new(0.0, 0.0, 5.0));
}

#[test]
fn test_mount_configures_surface_and_renders_first_frame() {
    let host = RecordingHost::new(640, 480, Asset::Deferred);
    let session = mounted(host);

    let surface = session.surface().unwrap();
    assert_eq!(surface.size(), SurfaceSize::new(640, 480));
    assert_eq!(surface.pixel_ratio, 2.0);
    assert!(session.host().contains_output(surface));
    assert!(session.host().observing);
    assert_eq!(session.host().renders.get(), 1);
    assert_eq!(session.host().pending_frames.len(), 1);
    assert_eq!(session.model_state(), &ModelState::Loading);
}

#[test]
fn test_load_completes_between_frames() {
    let host = RecordingHost::new(800, 600, Asset::Deferred);
    let mut session = mounted(host);

    frame(&mut session);
    assert!(session.scene().unwrap().model().is_none());

    let sender = session.host_mut().deferred.take().unwrap();
    sender.send(Ok(box_stl([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])));
    assert!(session.scene().unwrap().model().is_none());

    frame(&mut session);
    assert_eq!(session.model_state(), &ModelState::Loaded);
    assert_eq!(session.scene().unwrap().node_count(), 4);
}

#[test]
fn test_load_failure_keeps_lit_scene_rendering() {
    let host = RecordingHost::new(800, 600, Asset::Missing);
    let mut session = mounted(host);

    assert!(matches!(session.model_state(), ModelState::Failed(msg) if msg.contains("404")));
    let scene = session.scene().unwrap();
    assert!(scene.model().is_none());
    assert_eq!(scene.lights().len(), 3);
    assert_eq!(scene.node_count(), 3);

    for _ in 0..5 {
        frame(&mut session);
    }
    assert_eq!(session.host().renders.get(), 6);
    assert!(matches!(session.model_state(), ModelState::Failed(_)));
}

#[test]
fn test_unparseable_asset_is_a_load_failure() {
    let host = RecordingHost::new(800, 600, Asset::Bytes(b"glTF\x01\x00\x00\x00garbage".to_vec()));
    let session = mounted(host);

    assert_eq!(session.state(), ViewerState::Ready);
    assert!(matches!(session.model_state(), ModelState::Failed(_)));
}

#[test]
fn test_animation_advances_per_tick() {
    let host = RecordingHost::new(800, 600, Asset::Deferred);
    let mut session = mounted(host);
    for _ in 0..9 {
        frame(&mut session);
    }

    let time = session.time();
    assert_relative_eq!(time, 0.1, epsilon = 1e-5);
    let transform = &session.scene().unwrap().transform;
    assert_relative_eq!(transform.rotation.y, time * 0.3, epsilon = 1e-6);
    assert_relative_eq!(transform.position.y, time.sin() * 0.1, epsilon = 1e-6);
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn test_resize_tracks_container() {
    let host = RecordingHost::new(800, 600, Asset::Bytes(box_stl([1.0, 2.0, 3.0], [1.0, 1.0, 1.0])));
    let mut session = mounted(host);
    let model_before = session.scene().unwrap().model().cloned();
    let time_before = session.time();

    for (w, h) in [(1024, 768), (300, 900), (1, 1), (1920, 1080)] {
        session.host_mut().size = SurfaceSize::new(w, h);
        session.handle_container_resize().unwrap();

        let camera = session.camera().unwrap();
        assert_relative_eq!(camera.aspect, w as f32 / h as f32);
        assert_eq!(session.surface().unwrap().size(), SurfaceSize::new(w, h));
        assert_eq!(camera.position, Point3::new(0.0, 0.0, 5.0));
    }

    assert_eq!(session.scene().unwrap().model().cloned(), model_before);
    assert_eq!(session.time(), time_before);
}

#[test]
fn test_resize_to_zero_height_stays_finite() {
    let host = RecordingHost::new(800, 600, Asset::Deferred);
    let mut session = mounted(host);
    session.resize(SurfaceSize::new(500, 0)).unwrap();
    assert!(session.camera().unwrap().aspect.is_finite());
}

#[test]
fn test_mount_into_zero_width_container() {
    let host = RecordingHost::new(0, 600, Asset::Bytes(box_stl([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])));
    let mut session = mounted(host);

    assert_eq!(session.state(), ViewerState::Ready);
    assert_eq!(session.surface().unwrap().size(), SurfaceSize::new(0, 600));
    let aspect = session.camera().unwrap().aspect;
    assert!(aspect.is_finite() && aspect > 0.0);
    frame(&mut session);
}

#[test]
fn test_resize_to_zero_width_stays_finite() {
    let host = RecordingHost::new(800, 600, Asset::Deferred);
    let mut session = mounted(host);

    for size in [SurfaceSize::new(0, 600), SurfaceSize::new(0, 0)] {
        session.resize(size).unwrap();
        let aspect = session.camera().unwrap().aspect;
        assert!(aspect.is_finite() && aspect > 0.0);
        assert_eq!(session.surface().unwrap().size(), size);
    }
    frame(&mut session);
}

#[test]
fn test_resize_failure_propagates() {
    let host = RecordingHost::new(800, 600, Asset::Deferred);
    let mut session = mounted(host);
    session.host().fail_resize.set(true);

    let result = session.resize(SurfaceSize::new(100, 100));
    assert!(matches!(result, Err(ViewerError::ContextLost)));
}

#[test]
fn test_render_failure_propagates() {
    let host = RecordingHost::new(800, 600, Asset::Deferred);
    let mut session = mounted(host);
    session.host().fail_render.set(true);

    session.host_mut().paint();
    assert!(matches!(session.tick(), Err(ViewerError::Render(_))));
}

#[test]
fn test_failed_mount_releases_everything() {
    let host = RecordingHost::new(800, 600, Asset::Deferred);
    host.fail_render.set(true);
    let mut session = ViewerSession::new(host, ViewerConfig::default());

    assert!(session.mount("model.stl").is_err());
    assert_eq!(session.state(), ViewerState::Unmounted);
    assert!(session.host().pending_frames.is_empty());
    assert!(!session.host().observing);
    assert_eq!(session.host().disposals.get(), 1);
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn test_unmount_releases_in_order_and_is_idempotent() {
    let host = RecordingHost::new(800, 600, Asset::Deferred);
    let mut session = mounted(host);

    session.unmount();
    session.unmount();

    let host = session.host();
    assert_eq!(session.state(), ViewerState::Unmounted);
    assert!(!host.observing);
    assert!(host.pending_frames.is_empty());
    assert_eq!(host.cancelled, 1);
    assert_eq!(host.attached, None);
    assert_eq!(host.detached, 1);
    assert_eq!(host.disposals.get(), 1);
    assert!(session.scene().is_none());
}

#[test]
fn test_unmount_skips_detach_when_output_is_gone() {
    let host = RecordingHost::new(800, 600, Asset::Deferred);
    let mut session = mounted(host);
    session.host_mut().attached = None;

    session.unmount();
    assert_eq!(session.host().detached, 0);
    assert_eq!(session.host().disposals.get(), 1);
}

#[test]
fn test_tick_after_unmount_is_ignored() {
    let host = RecordingHost::new(800, 600, Asset::Deferred);
    let mut session = mounted(host);
    session.unmount();

    session.tick().unwrap();
    assert!(session.host().pending_frames.is_empty());
    assert_eq!(session.host().renders.get(), 1);
}

#[test]
fn test_remount_keeps_exactly_one_schedule() {
    let host = RecordingHost::new(800, 600, Asset::Bytes(box_stl([0.0, 0.0, 0.0], [2.0, 2.0, 2.0])));
    let mut session = mounted(host);

    for _ in 0..3 {
        frame(&mut session);
        session.unmount();
        assert!(session.host().pending_frames.is_empty());
        session.mount("other.stl").unwrap();
        assert_eq!(session.host().pending_frames.len(), 1);
    }

    session.remount("third.stl").unwrap();
    assert_eq!(session.host().pending_frames.len(), 1);
    assert_eq!(session.reference(), Some("third.stl"));
    assert_eq!(session.time(), 0.01);
    assert_eq!(session.host().disposals.get(), 4);
}

#[test]
fn test_load_after_unmount_is_dropped() {
    let host = RecordingHost::new(800, 600, Asset::Deferred);
    let mut session = mounted(host);
    let sender = session.host_mut().deferred.take().unwrap();

    session.unmount();
    sender.send(Ok(box_stl([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])));
    session.tick().unwrap();

    assert!(session.scene().is_none());
    assert_eq!(session.model_state(), &ModelState::Loading);
}
