/// Portfolio shell state: project records, theme, navigation and the demo
/// modal. Rendering is left to the hosts.
use std::path::Path;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const LOGO_TEXT: &str = "AR/VR Portfolio";
pub const HERO_TITLE: [&str; 2] = ["3d projects", "in AR & VR"];
pub const HERO_SUBTITLE: &str =
    "Exploring interesting and new web technologies for immersive experiences.";
pub const PROJECTS_TITLE: &str = "Featured Projects";
pub const PROJECTS_SUBTITLE: &str = "Explore my latest work in immersive technology";
pub const FOOTER_TEXT: &str = "\u{a9} 2025 Waltteri Westerholm.";
pub const NO_DEMO_TEXT: &str = "Demo not available";

/// Model shown in the hero viewer
pub const HERO_MODEL: &str = "lego_batman.glb";

/// Card backdrop when a project has no thumbnail
pub const FALLBACK_BACKDROP: &str = "linear-gradient(135deg, #667eea 0%, #764ba2 100%)";

/// How long the modal's close animation keeps the project selected
pub const MODAL_CLOSE_DELAY: Duration = Duration::from_millis(300);

/// A showcased project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: u32,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tech: Vec<String>,
    pub category: String,
    #[serde(default)]
    pub demo_url: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl Project {
    /// The built-in showcase
    pub fn defaults() -> Vec<Project> {
        let tech = |tags: &[&str]| tags.iter().map(|t| t.to_string()).collect();
        vec![
            Project {
                id: 1,
                title: "3D Model Viewer".to_string(),
                description: "Interactive 3D model viewer with real-time rendering and camera \
                              controls. Explore 3D assets with smooth navigation and detailed \
                              visualization."
                    .to_string(),
                tech: tech(&["Three.js", "WebGL", "JavaScript"]),
                category: "3D".to_string(),
                demo_url: Some("https://users.metropolia.fi/~walttewe/3d-model-viewer/dist/".to_string()),
                source_url: Some("https://users.metropolia.fi/~walttewe/3d-model-viewer/dist/".to_string()),
                thumbnail: Some("./public/thumbnails/batman-thumbnail.png".to_string()),
            },
            Project {
                id: 2,
                title: "3D rapier physics demo".to_string(),
                description: "VR compatible 3D physics simulation using Rapier physics engine. \
                              Interact with objects in a realistic environment with gravity"
                    .to_string(),
                tech: tech(&["Three.js", "WebGL", "JavaScript", "Rapier"]),
                category: "VR".to_string(),
                demo_url: Some("https://users.metropolia.fi/~walttewe/rapier-lab/dist/".to_string()),
                source_url: Some("https://github.com/WaltteriWe/rapier-lab".to_string()),
                thumbnail: Some("./public/thumbnails/ball-thumb.png".to_string()),
            },
            Project {
                id: 3,
                title: "WEBGL Stacker game".to_string(),
                description: "3D Stacker game built with WebGL and Three.js. Stack moving blocks \
                              as high as you can while enjoying smooth graphics and engaging \
                              gameplay."
                    .to_string(),
                tech: tech(&["Three.js", "WebGL", "JavaScript"]),
                category: "WEBGL".to_string(),
                demo_url: Some("https://users.metropolia.fi/~walttewe/webgl-stacker/dist/".to_string()),
                source_url: Some("https://github.com/WaltteriWe/webgl-peli".to_string()),
                thumbnail: Some("./public/thumbnails/stacker-thumb.png".to_string()),
            },
        ]
    }

    /// Buttons the project card offers
    pub fn card_actions(&self) -> Vec<CardAction> {
        let mut actions = Vec::with_capacity(2);
        if self.demo_url.is_some() {
            actions.push(CardAction::LaunchDemo);
        }
        if self.source_url.is_some() {
            actions.push(CardAction::ViewCode);
        }
        actions
    }

    /// CSS background for the card image
    pub fn backdrop(&self) -> String {
        match &self.thumbnail {
            Some(path) => format!("url({})", path),
            None => FALLBACK_BACKDROP.to_string(),
        }
    }

    pub fn demo_frame(&self) -> Option<DemoFrame> {
        self.demo_url.as_ref().map(|src| DemoFrame::new(src, &self.title))
    }
}

/// Read a JSON array of projects
pub fn load_projects(path: &Path) -> Result<Vec<Project>, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    let projects: Vec<Project> = serde_json::from_str(&text)?;
    debug!("loaded {} projects from {}", projects.len(), path.display());
    Ok(projects)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    LaunchDemo,
    ViewCode,
}

impl CardAction {
    pub fn label(&self) -> &'static str {
        match self {
            CardAction::LaunchDemo => "Launch Demo",
            CardAction::ViewCode => "View Code",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalAction {
    OpenInNewTab,
    ViewSource,
}

impl ModalAction {
    pub fn label(&self) -> &'static str {
        match self {
            ModalAction::OpenInNewTab => "Open in New Tab",
            ModalAction::ViewSource => "View Source Code",
        }
    }

    /// Target URL for this action, if the project has one
    pub fn url<'a>(&self, project: &'a Project) -> Option<&'a str> {
        match self {
            ModalAction::OpenInNewTab => project.demo_url.as_deref(),
            ModalAction::ViewSource => project.source_url.as_deref(),
        }
    }
}

/// Embedded demo frame with a fixed permission scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoFrame {
    pub src: String,
    pub title: String,
}

impl DemoFrame {
    pub const PERMISSIONS: [&'static str; 6] = [
        "accelerometer",
        "camera",
        "gyroscope",
        "microphone",
        "xr-spatial-tracking",
        "fullscreen",
    ];
    pub const ALLOW_FULLSCREEN: bool = true;

    pub fn new(src: &str, title: &str) -> Self {
        Self {
            src: src.to_string(),
            title: title.to_string(),
        }
    }

    /// Value for the frame's `allow` attribute
    pub fn allow_attribute() -> String {
        Self::PERMISSIONS.join("; ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggle(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Value for the document's `data-theme` attribute
    pub fn name(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Icon on the toggle button; it shows the theme you would switch to
    pub fn toggle_icon(&self) -> &'static str {
        match self {
            Theme::Light => "\u{1f319}",
            Theme::Dark => "\u{2600}\u{fe0f}",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    Home,
    Projects,
}

impl Section {
    pub fn label(&self) -> &'static str {
        match self {
            Section::Home => "Home",
            Section::Projects => "Projects",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modal {
    Closed,
    Open,
    /// Hidden, but the project stays selected until `clear_at`
    Closing { clear_at: Duration },
}

/// In-memory UI state of the portfolio page.
///
/// Timestamps are caller-supplied monotonic offsets, so hosts without a
/// usable `Instant` (WASM) can drive it from their own clock.
#[derive(Debug, Clone)]
pub struct Shell {
    projects: Vec<Project>,
    pub theme: Theme,
    pub section: Section,
    cursor: usize,
    selected: Option<usize>,
    modal: Modal,
}

impl Shell {
    pub fn new(projects: Vec<Project>) -> Self {
        Self {
            projects,
            theme: Theme::default(),
            section: Section::default(),
            cursor: 0,
            selected: None,
            modal: Modal::Closed,
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggle();
    }

    pub fn navigate(&mut self, section: Section) {
        self.section = section;
    }

    /// Index of the highlighted card
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn move_cursor(&mut self, delta: isize) {
        if self.projects.is_empty() {
            return;
        }
        let last = self.projects.len() as isize - 1;
        self.cursor = (self.cursor as isize + delta).clamp(0, last) as usize;
    }

    pub fn highlighted(&self) -> Option<&Project> {
        self.projects.get(self.cursor)
    }

    /// Open the modal for project `index`. Cancels a pending clear.
    pub fn open_project(&mut self, index: usize) -> bool {
        if index >= self.projects.len() {
            return false;
        }
        self.selected = Some(index);
        self.modal = Modal::Open;
        debug!("opened project {}", self.projects[index].title);
        true
    }

    /// Hide the modal now; the selection is released after the close delay
    pub fn close_modal(&mut self, now: Duration) {
        if self.modal == Modal::Open {
            self.modal = Modal::Closing {
                clear_at: now + MODAL_CLOSE_DELAY,
            };
        }
    }

    /// Advance timers
    pub fn tick(&mut self, now: Duration) {
        if let Modal::Closing { clear_at } = self.modal {
            if now >= clear_at {
                self.selected = None;
                self.modal = Modal::Closed;
            }
        }
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal == Modal::Open && self.selected.is_some()
    }

    /// Selected project, including during the close animation
    pub fn selected_project(&self) -> Option<&Project> {
        self.selected.and_then(|i| self.projects.get(i))
    }

    /// The project to draw in the modal, if the modal is visible
    pub fn modal_project(&self) -> Option<&Project> {
        if self.is_modal_open() {
            self.selected_project()
        } else {
            None
        }
    }

    /// Actions available in the open modal
    pub fn modal_actions(&self) -> Vec<ModalAction> {
        let Some(project) = self.modal_project() else {
            return Vec::new();
        };
        [ModalAction::OpenInNewTab, ModalAction::ViewSource]
            .into_iter()
            .filter(|action| action.url(project).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn bare_project() -> Project {
        Project {
            id: 9,
            title: "Sketch".to_string(),
            description: "No links yet".to_string(),
            tech: vec![],
            category: "AR".to_string(),
            demo_url: None,
            source_url: None,
            thumbnail: None,
        }
    }

    #[test]
    fn defaults_match_showcase() {
        let projects = Project::defaults();
        assert_eq!(projects.len(), 3);
        assert_eq!(projects[1].tech.last().map(String::as_str), Some("Rapier"));
        assert!(projects.iter().all(|p| p.card_actions().len() == 2));
    }

    #[test]
    fn missing_links_hide_actions() {
        let project = bare_project();
        assert!(project.card_actions().is_empty());
        assert_eq!(project.backdrop(), FALLBACK_BACKDROP);
        assert!(project.demo_frame().is_none());
    }

    #[test]
    fn demo_frame_permissions() {
        assert_eq!(
            DemoFrame::allow_attribute(),
            "accelerometer; camera; gyroscope; microphone; xr-spatial-tracking; fullscreen"
        );
    }

    #[test]
    fn theme_toggles_and_shows_opposite_icon() {
        let theme = Theme::default();
        assert_eq!(theme, Theme::Dark);
        assert_eq!(theme.toggle_icon(), Theme::Light.toggle().toggle_icon());
        assert_eq!(theme.toggle(), Theme::Light);
        assert_eq!(theme.toggle().toggle(), Theme::Dark);
    }

    #[test]
    fn modal_clears_selection_after_delay() {
        let mut shell = Shell::new(Project::defaults());
        assert!(shell.open_project(1));
        assert!(shell.is_modal_open());

        let t0 = Duration::from_secs(10);
        shell.close_modal(t0);
        assert!(!shell.is_modal_open());
        assert!(shell.modal_project().is_none());
        assert_eq!(shell.selected_project().map(|p| p.id), Some(2));

        shell.tick(t0 + Duration::from_millis(299));
        assert!(shell.selected_project().is_some());
        shell.tick(t0 + MODAL_CLOSE_DELAY);
        assert!(shell.selected_project().is_none());
    }

    #[test]
    fn reopening_cancels_pending_clear() {
        let mut shell = Shell::new(Project::defaults());
        shell.open_project(0);
        shell.close_modal(Duration::ZERO);
        shell.open_project(2);
        shell.tick(Duration::from_secs(1));
        assert_eq!(shell.modal_project().map(|p| p.id), Some(3));
    }

    #[test]
    fn modal_actions_follow_links() {
        let mut project = bare_project();
        project.demo_url = Some("https://example.org/demo".to_string());
        let mut shell = Shell::new(vec![project]);
        assert!(shell.modal_actions().is_empty());
        shell.open_project(0);
        assert_eq!(shell.modal_actions(), vec![ModalAction::OpenInNewTab]);
        assert!(!shell.open_project(5));
    }

    #[test]
    fn cursor_is_clamped() {
        let mut shell = Shell::new(Project::defaults());
        shell.move_cursor(-3);
        assert_eq!(shell.cursor(), 0);
        shell.move_cursor(10);
        assert_eq!(shell.cursor(), 2);
    }

    #[test]
    fn load_projects_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": 4, "title": "Room", "description": "d", "category": "MR",
                 "demoUrl": "/projects/room/index.html"}}]"#
        )
        .unwrap();

        let projects = load_projects(file.path()).unwrap();
        assert_eq!(projects[0].demo_url.as_deref(), Some("/projects/room/index.html"));
        assert_eq!(projects[0].card_actions(), vec![CardAction::LaunchDemo]);
    }
}
