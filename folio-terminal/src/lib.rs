/// Terminal host for the folio viewer and portfolio shell
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{self},
};
use folio_core::portfolio::{ModalAction, Section};
use folio_core::{ModelState, Project, Shell, ViewerConfig, ViewerError, ViewerSession};
use log::{error, info, warn};
use std::io::{self, stdout, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub mod host;
pub mod renderer;
pub mod ui;

pub use host::{FramePacer, TerminalHost, Viewport};
pub use renderer::AsciiSurface;
use ui::Layout;

/// How long headless mode waits for the model before rendering anyway
const HEADLESS_LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Main application struct: the portfolio shell with its hero viewer
pub struct TerminalApp {
    session: ViewerSession<TerminalHost>,
    shell: Shell,
    model: String,
    layout: Layout,
    running: bool,
    status: Option<String>,
    started: Instant,
    last_fps_sample: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    /// Build an app sized to a `cols` x `rows` terminal. The viewer is not
    /// mounted until [`run`](Self::run) or [`run_headless`](Self::run_headless).
    pub fn new(
        cols: u16,
        rows: u16,
        fps: u32,
        config: ViewerConfig,
        projects: Vec<Project>,
        model: &str,
    ) -> Self {
        let layout = Layout::compute(cols, rows);
        let now = Instant::now();
        Self {
            session: ViewerSession::new(TerminalHost::new(layout.viewer, fps), config),
            shell: Shell::new(projects),
            model: model.to_string(),
            layout,
            running: true,
            status: None,
            started: now,
            last_fps_sample: now,
            frame_count: 0,
            fps: 0.0,
        }
    }

    /// Resolve model references against `root` instead of the working
    /// directory
    pub fn with_assets_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.session.host_mut().set_assets_root(root);
        self
    }

    pub fn session(&self) -> &ViewerSession<TerminalHost> {
        &self.session
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        self.mount_viewer();
        let result = self.main_loop();
        self.session.unmount();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    /// Mount the hero viewer, render `frames` frames and return the grid
    /// rows, without touching terminal modes.
    pub fn run_headless(&mut self, frames: u32) -> Vec<String> {
        self.mount_viewer();

        let deadline = Instant::now() + HEADLESS_LOAD_TIMEOUT;
        let mut rendered = 0;
        while self.running && rendered < frames {
            self.wait_for_frame();
            self.render_frame(Instant::now());
            let loading = *self.session.model_state() == ModelState::Loading;
            if !loading || Instant::now() >= deadline {
                rendered += 1;
            }
            if self.session.pending_frame().is_none() {
                break;
            }
        }

        let rows = self
            .session
            .surface()
            .map(|surface| (0..surface.grid().1).filter_map(|y| surface.row(y)).collect())
            .unwrap_or_default();
        self.session.unmount();
        rows
    }

    fn mount_viewer(&mut self) {
        self.status = None;
        if let Err(e) = self.session.mount(&self.model) {
            self.viewer_failed(e);
        }
    }

    /// Session errors are fatal to the session, not to the app
    fn viewer_failed(&mut self, e: ViewerError) {
        error!("viewer stopped: {}", e);
        self.session.unmount();
        self.status = Some(format!("Viewer stopped: {} (press r to remount)", e));
    }

    fn wait_for_frame(&self) {
        if let Some(wait) = self.session.host().pacer().time_until_due(Instant::now()) {
            std::thread::sleep(wait);
        }
    }

    fn main_loop(&mut self) -> io::Result<()> {
        self.draw()?;

        while self.running {
            let timeout = self
                .session
                .host()
                .pacer()
                .time_until_due(Instant::now())
                .unwrap_or(Duration::from_millis(100));

            // Handle input
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(cols, rows) => self.handle_resize(cols, rows),
                    _ => {}
                }
                self.draw()?;
            }

            let now = Instant::now();
            self.shell.tick(now - self.started);
            if self.render_frame(now) {
                self.draw()?;
            }

            // Update FPS counter
            if (now - self.last_fps_sample).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_fps_sample).as_secs_f32();
                self.frame_count = 0;
                self.last_fps_sample = now;
            }
        }

        Ok(())
    }

    /// Run the viewer callback if the pacer says it is due
    fn render_frame(&mut self, now: Instant) -> bool {
        if self.session.host_mut().pacer_mut().take_due(now).is_none() {
            return false;
        }
        match self.session.tick() {
            Ok(()) => {
                self.frame_count += 1;
                true
            }
            Err(e) => {
                self.viewer_failed(e);
                true
            }
        }
    }

    pub fn handle_resize(&mut self, cols: u16, rows: u16) {
        self.layout = Layout::compute(cols, rows);
        if self.session.host_mut().set_viewport(self.layout.viewer) {
            if let Err(e) = self.session.handle_container_resize() {
                self.viewer_failed(e);
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        let now = self.started.elapsed();

        if self.shell.is_modal_open() {
            match key.code {
                KeyCode::Esc | KeyCode::Char('x') => self.shell.close_modal(now),
                KeyCode::Char('o') => self.open_modal_action(ModalAction::OpenInNewTab),
                KeyCode::Char('c') => self.open_modal_action(ModalAction::ViewSource),
                KeyCode::Char('q') => self.running = false,
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('1') | KeyCode::Char('h') => self.shell.navigate(Section::Home),
            KeyCode::Char('2') | KeyCode::Char('p') => self.shell.navigate(Section::Projects),
            KeyCode::Char('t') => self.shell.toggle_theme(),
            KeyCode::Char('j') | KeyCode::Down => self.shell.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.shell.move_cursor(-1),
            KeyCode::Enter if self.shell.section == Section::Projects => {
                let has_demo = self
                    .shell
                    .highlighted()
                    .is_some_and(|project| project.demo_url.is_some());
                if has_demo {
                    self.shell.open_project(self.shell.cursor());
                }
            }
            KeyCode::Char('c') if self.shell.section == Section::Projects => {
                if let Some(url) = self.shell.highlighted().and_then(|p| p.source_url.clone()) {
                    open_url(&url);
                }
            }
            KeyCode::Char('r') => {
                info!("remounting viewer for {}", self.model);
                self.status = None;
                if let Err(e) = self.session.remount(&self.model) {
                    self.viewer_failed(e);
                }
            }
            _ => {}
        }
    }

    fn open_modal_action(&self, action: ModalAction) {
        if let Some(url) = self.shell.modal_project().and_then(|p| action.url(p)) {
            open_url(url);
        }
    }

    fn status_line(&self) -> String {
        if let Some(status) = &self.status {
            return status.clone();
        }
        let model = match self.session.model_state() {
            ModelState::Loading => "loading".to_string(),
            ModelState::Loaded => "loaded".to_string(),
            ModelState::Failed(reason) => format!("failed: {}", reason),
        };
        format!(
            "FPS: {:.1} | {}: {} | 1/2 sections  j/k select  Enter demo  c code  t theme  r remount  q quit",
            self.fps, self.model, model
        )
    }

    fn draw(&mut self) -> io::Result<()> {
        let mut stdout = stdout();
        ui::draw_shell(&mut stdout, &self.shell, &self.layout, &self.status_line())?;

        if self.shell.section == Section::Home {
            if let Some(surface) = self.session.surface() {
                let viewport = self.session.host().viewport();
                surface.draw(&mut stdout, viewport.left, viewport.top)?;
            }
        }

        ui::draw_modal(&mut stdout, &self.shell, &self.layout)?;
        stdout.flush()
    }
}

/// Open `url` in a new browser context
fn open_url(url: &str) {
    info!("opening {}", url);
    if let Err(e) = webbrowser::open(url) {
        warn!("could not open {}: {}", url, e);
    }
}
