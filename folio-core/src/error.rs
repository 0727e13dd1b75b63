/// Error types for the viewer core
use thiserror::Error;

/// Result type for viewer lifecycle operations
pub type Result<T> = std::result::Result<T, ViewerError>;

/// Errors raised while fetching or parsing a model asset.
///
/// These never tear a session down: the viewer logs them once and keeps
/// rendering an empty, lit scene.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP {status} while fetching {url}")]
    Http { url: String, status: u16 },

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported asset: {0}")]
    Unsupported(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model has no measurable geometry")]
    EmptyModel,

    #[error("Load was abandoned before completing")]
    Abandoned,
}

/// Errors that are fatal to a viewer session.
///
/// Surface and render failures mean the graphics context is broken; the
/// host is expected to unmount and optionally remount.
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Graphics context lost")]
    ContextLost,

    #[error("Render error: {0}")]
    Render(String),

    #[error("Frame scheduler error: {0}")]
    Scheduler(String),

    #[error("Container error: {0}")]
    Container(String),

    #[error("Viewer is not mounted")]
    NotMounted,
}

/// Errors raised while reading configuration or project records
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
