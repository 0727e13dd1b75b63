/// Browser host: a DOM container, `requestAnimationFrame` and `fetch`
use std::cell::RefCell;
use std::rc::Weak;

use folio_core::{
    FrameHandle, LoadError, LoadTicket, Result, SurfaceSize, ViewerError, ViewerHost,
    ViewerSession,
};
use log::{debug, error};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Document, HtmlElement, Node, Window};

use crate::surface::CanvasSurface;

pub type SharedSession = std::rc::Rc<RefCell<ViewerSession<WebHost>>>;

/// Hosts one viewer inside a container element.
///
/// The frame and resize callbacks are created once and live as long as the
/// host, so tearing the session down from inside a callback never frees the
/// closure that is running.
pub struct WebHost {
    window: Window,
    document: Document,
    container: HtmlElement,
    on_frame: Option<Closure<dyn FnMut()>>,
    on_resize: Option<Closure<dyn FnMut()>>,
}

impl WebHost {
    pub fn new(window: Window, container: HtmlElement) -> std::result::Result<Self, JsValue> {
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("window has no document"))?;
        Ok(Self {
            window,
            document,
            container,
            on_frame: None,
            on_resize: None,
        })
    }

    /// Wire the browser callbacks to `session`. They hold a weak reference,
    /// so dropping the last handle to the session is enough to free it.
    pub fn install_callbacks(&mut self, session: Weak<RefCell<ViewerSession<WebHost>>>) {
        let frame_session = session.clone();
        self.on_frame = Some(Closure::new(move || {
            with_session(&frame_session, |s| s.tick());
        }));
        self.on_resize = Some(Closure::new(move || {
            with_session(&session, |s| s.handle_container_resize());
        }));
    }

    fn frame_callback(&self) -> Result<&js_sys::Function> {
        self.on_frame
            .as_ref()
            .map(|c| c.as_ref().unchecked_ref())
            .ok_or_else(|| ViewerError::Scheduler("frame callback not installed".to_string()))
    }
}

/// Run one session operation from a browser callback. Errors are fatal to
/// the session, so it is torn down and the failure logged.
fn with_session<F>(session: &Weak<RefCell<ViewerSession<WebHost>>>, op: F)
where
    F: FnOnce(&mut ViewerSession<WebHost>) -> Result<()>,
{
    let Some(session) = session.upgrade() else {
        return;
    };
    let Ok(mut session) = session.try_borrow_mut() else {
        debug!("session busy, skipping callback");
        return;
    };
    if let Err(e) = op(&mut *session) {
        error!("viewer stopped: {}", e);
        session.unmount();
    }
}

impl ViewerHost for WebHost {
    type Surface = CanvasSurface;

    fn content_size(&self) -> SurfaceSize {
        SurfaceSize::new(
            self.container.client_width().max(0) as u32,
            self.container.client_height().max(0) as u32,
        )
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.window.device_pixel_ratio() as f32
    }

    fn create_surface(&mut self, size: SurfaceSize) -> Result<CanvasSurface> {
        CanvasSurface::create(&self.document, size)
    }

    fn attach_output(&mut self, surface: &CanvasSurface) -> Result<()> {
        self.container
            .append_child(surface.canvas())
            .map(|_| ())
            .map_err(|e| ViewerError::Container(format!("{:?}", e)))
    }

    fn contains_output(&self, surface: &CanvasSurface) -> bool {
        let container: &Node = self.container.as_ref();
        surface
            .canvas()
            .parent_node()
            .is_some_and(|parent| parent == *container)
    }

    fn detach_output(&mut self, surface: &CanvasSurface) {
        if let Err(e) = self.container.remove_child(surface.canvas()) {
            debug!("canvas already detached: {:?}", e);
        }
    }

    fn observe_resize(&mut self) -> Result<()> {
        let callback = self
            .on_resize
            .as_ref()
            .ok_or_else(|| ViewerError::Container("resize callback not installed".to_string()))?;
        self.window
            .add_event_listener_with_callback("resize", callback.as_ref().unchecked_ref())
            .map_err(|e| ViewerError::Container(format!("{:?}", e)))
    }

    fn unobserve_resize(&mut self) {
        if let Some(callback) = &self.on_resize {
            let _ = self
                .window
                .remove_event_listener_with_callback("resize", callback.as_ref().unchecked_ref());
        }
    }

    fn request_frame(&mut self) -> Result<FrameHandle> {
        let callback = self.frame_callback()?;
        let id = self
            .window
            .request_animation_frame(callback)
            .map_err(|e| ViewerError::Scheduler(format!("{:?}", e)))?;
        Ok(FrameHandle(id as u64))
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let _ = self.window.cancel_animation_frame(handle.0 as i32);
    }

    fn fetch(&mut self, reference: &str) -> LoadTicket {
        let (sender, ticket) = LoadTicket::channel();
        let url = reference.to_string();
        spawn_local(async move {
            debug!("fetching {}", url);
            sender.send(fetch_bytes(&url).await);
        });
        ticket
    }
}

fn fetch_err(e: JsValue) -> LoadError {
    LoadError::Fetch(format!("{:?}", e))
}

async fn fetch_bytes(url: &str) -> std::result::Result<Vec<u8>, LoadError> {
    let window = web_sys::window().ok_or_else(|| LoadError::Fetch("no window".to_string()))?;
    let response: web_sys::Response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(fetch_err)?
        .dyn_into()
        .map_err(fetch_err)?;

    if !response.ok() {
        return Err(LoadError::Http {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let buffer = JsFuture::from(response.array_buffer().map_err(fetch_err)?)
        .await
        .map_err(fetch_err)?;
    let bytes = js_sys::Uint8Array::new(&buffer);
    let mut out = vec![0u8; bytes.length() as usize];
    bytes.copy_to(&mut out);
    Ok(out)
}
