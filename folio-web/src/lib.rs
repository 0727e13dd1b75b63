/// folio-web - WASM host for the folio viewer
///
/// Mounts the viewer into a DOM container, drives it from
/// `requestAnimationFrame` and loads models with `fetch`. The page keeps a
/// [`WebViewer`] handle per container and calls `unmount` when the
/// container goes away.
use std::cell::RefCell;
use std::rc::Rc;

use folio_core::{ModelState, ViewerConfig, ViewerSession};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

pub mod demo;
pub mod host;
pub mod logger;
pub mod surface;

pub use host::{SharedSession, WebHost};
pub use surface::CanvasSurface;

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Handle to one viewer session
#[wasm_bindgen]
pub struct WebViewer {
    config: ViewerConfig,
    session: Option<SharedSession>,
}

#[wasm_bindgen]
impl WebViewer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebViewer {
        WebViewer {
            config: ViewerConfig::default(),
            session: None,
        }
    }

    /// Viewer with settings from a JSON config document
    pub fn with_config(config_json: &str) -> Result<WebViewer, JsValue> {
        Ok(WebViewer {
            config: ViewerConfig::from_json(config_json).map_err(js_err)?,
            session: None,
        })
    }

    /// Mount into the element with id `container_id` and start loading
    /// `model_url`. A previous session is torn down first.
    pub fn mount(&mut self, container_id: &str, model_url: &str) -> Result<(), JsValue> {
        self.unmount();

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let container: HtmlElement = window
            .document()
            .and_then(|d| d.get_element_by_id(container_id))
            .ok_or_else(|| JsValue::from_str(&format!("no element with id '{}'", container_id)))?
            .dyn_into()
            .map_err(|_| JsValue::from_str("container is not an HTML element"))?;

        let host = WebHost::new(window, container)?;
        let session = Rc::new(RefCell::new(ViewerSession::new(host, self.config.clone())));
        {
            let mut guard = session.borrow_mut();
            guard.host_mut().install_callbacks(Rc::downgrade(&session));
            guard.mount(model_url).map_err(js_err)?;
        }
        self.session = Some(session);
        Ok(())
    }

    /// Tear down and rebuild the current session for a new model
    pub fn remount(&mut self, model_url: &str) -> Result<(), JsValue> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| js_err(folio_core::ViewerError::NotMounted))?;
        let result = session.borrow_mut().remount(model_url);
        result.map_err(js_err)
    }

    /// Release the session. Safe to call repeatedly.
    pub fn unmount(&mut self) {
        if let Some(session) = self.session.take() {
            session.borrow_mut().unmount();
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.borrow().state() == folio_core::ViewerState::Ready)
    }

    pub fn is_model_loaded(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| *s.borrow().model_state() == ModelState::Loaded)
    }

    /// Load failure message, if the last load failed
    pub fn model_error(&self) -> Option<String> {
        let session = self.session.as_ref()?.borrow();
        match session.model_state() {
            ModelState::Failed(reason) => Some(reason.clone()),
            _ => None,
        }
    }
}

impl Default for WebViewer {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    // Setup panic hook for better error messages in browser console
    console_error_panic_hook::set_once();
    logger::init(log::LevelFilter::Info).map_err(js_err)?;
    Ok(())
}
