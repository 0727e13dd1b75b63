/// Portfolio shell helpers: card images, sandboxed demo frames, external
/// links and the theme
use folio_core::portfolio::{DemoFrame, Project, Theme, NO_DEMO_TEXT};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, HtmlIFrameElement};

fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))
}

fn element_by_id(document: &Document, id: &str) -> Result<HtmlElement, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("no element with id '{}'", id)))?
        .dyn_into()
        .map_err(|_| JsValue::from_str(&format!("element '{}' is not an HTML element", id)))
}

/// Replace the contents of `container_id` with an embedded demo, or the
/// "Demo not available" notice when `url` is empty.
#[wasm_bindgen]
pub fn mount_demo_frame(container_id: &str, url: &str, title: &str) -> Result<(), JsValue> {
    let document = document()?;
    let container = element_by_id(&document, container_id)?;
    container.set_inner_html("");

    if url.is_empty() {
        let notice = document.create_element("p")?;
        notice.set_text_content(Some(NO_DEMO_TEXT));
        let wrapper = document.create_element("div")?;
        wrapper.set_class_name("no-demo");
        wrapper.append_child(&notice)?;
        container.append_child(&wrapper)?;
        return Ok(());
    }

    let frame = DemoFrame::new(url, title);
    let iframe: HtmlIFrameElement = document.create_element("iframe")?.dyn_into()?;
    iframe.set_src(&frame.src);
    iframe.set_title(&frame.title);
    iframe.set_class_name("project-iframe");
    iframe.set_attribute("allow", &DemoFrame::allow_attribute())?;
    iframe.set_allow_fullscreen(DemoFrame::ALLOW_FULLSCREEN);
    container.append_child(&iframe)?;
    log::debug!("embedded demo {}", frame.src);
    Ok(())
}

/// Paint a project card image: its thumbnail, or the gradient when the
/// project has none. `project_json` is one record from
/// [`default_projects_json`] or the page's own list.
#[wasm_bindgen]
pub fn apply_card_backdrop(element_id: &str, project_json: &str) -> Result<(), JsValue> {
    let project: Project =
        serde_json::from_str(project_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let element = element_by_id(&document()?, element_id)?;
    element.style().set_property("background", &project.backdrop())
}

/// Open `url` in a new top-level browsing context
#[wasm_bindgen]
pub fn open_in_new_tab(url: &str) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    window.open_with_url_and_target(url, "_blank")?;
    Ok(())
}

/// Set `data-theme` on the document element. Returns the applied name.
#[wasm_bindgen]
pub fn apply_theme(dark: bool) -> Result<String, JsValue> {
    let theme = if dark { Theme::Dark } else { Theme::Light };
    let root = document()?
        .document_element()
        .ok_or_else(|| JsValue::from_str("no document element"))?;
    root.set_attribute("data-theme", theme.name())?;
    Ok(theme.name().to_string())
}

/// The built-in showcase as JSON, for the page to render its cards
#[wasm_bindgen]
pub fn default_projects_json() -> Result<String, JsValue> {
    serde_json::to_string(&Project::defaults()).map_err(|e| JsValue::from_str(&e.to_string()))
}
