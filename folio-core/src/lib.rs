/// folio-core - Shared viewer and portfolio logic
///
/// This library holds everything that does not depend on a platform: model
/// parsing (glTF, GLB, STL), normalization, the scene with its light rig,
/// perspective projection, the viewer session lifecycle and the portfolio
/// shell state. Hosts plug in through the traits in [`host`].
pub mod config;
pub mod error;
pub mod geometry;
pub mod gltf;
pub mod host;
pub mod lighting;
pub mod loader;
pub mod portfolio;
pub mod projection;
pub mod raster;
pub mod scene;
pub mod session;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use config::ViewerConfig;
pub use error::{ConfigError, LoadError, Result, ViewerError};
pub use geometry::{Aabb, Mesh, Triangle, Vertex};
pub use host::{FrameHandle, RenderSurface, SurfaceSize, ViewerHost};
pub use lighting::{Color, Light};
pub use loader::{LoadSender, LoadStatus, LoadTicket};
pub use portfolio::{Project, Shell};
pub use projection::{PerspectiveCamera, ScreenPoint};
pub use raster::{shade_scene, ShadedTriangle};
pub use scene::{ModelNode, Normalization, Scene};
pub use session::{ModelState, ViewerSession, ViewerState};
pub use transform::NodeTransform;
