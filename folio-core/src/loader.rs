/// Asynchronous model loading
///
/// A host starts a fetch and hands back a [`LoadTicket`]; the session polls
/// the ticket once per frame, so completion is always applied between two
/// renders on the render thread. Parsing happens after delivery, inside the
/// session, so hosts only move bytes.
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crate::error::LoadError;
use crate::geometry::Mesh;
use crate::gltf::{self, GLB_MAGIC};
use crate::scene::ModelNode;
use crate::stl;

pub type FetchResult = Result<Vec<u8>, LoadError>;

/// State of an in-flight load
#[derive(Debug)]
pub enum LoadStatus {
    Pending,
    Ready(FetchResult),
}

/// Receiving end of a single model fetch
#[derive(Debug)]
pub struct LoadTicket {
    receiver: Receiver<FetchResult>,
}

/// Sending end of a single model fetch; consumed on delivery
#[derive(Debug)]
pub struct LoadSender {
    sender: Sender<FetchResult>,
}

impl LoadSender {
    /// Deliver the fetch result. A ticket dropped by a torn-down session is
    /// not an error.
    pub fn send(self, result: FetchResult) {
        let _ = self.sender.send(result);
    }
}

impl LoadTicket {
    pub fn channel() -> (LoadSender, LoadTicket) {
        let (sender, receiver) = mpsc::channel();
        (LoadSender { sender }, LoadTicket { receiver })
    }

    /// A ticket that is already resolved
    pub fn ready(result: FetchResult) -> Self {
        let (sender, ticket) = Self::channel();
        sender.send(result);
        ticket
    }

    /// Non-blocking check; a sender dropped without delivering resolves to
    /// [`LoadError::Abandoned`].
    pub fn poll(&mut self) -> LoadStatus {
        match self.receiver.try_recv() {
            Ok(result) => LoadStatus::Ready(result),
            Err(TryRecvError::Empty) => LoadStatus::Pending,
            Err(TryRecvError::Disconnected) => LoadStatus::Ready(Err(LoadError::Abandoned)),
        }
    }
}

/// Asset formats recognised from content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Glb,
    GltfJson,
    Stl,
}

impl ModelFormat {
    pub fn detect(data: &[u8]) -> Self {
        if data.starts_with(GLB_MAGIC) {
            return ModelFormat::Glb;
        }
        let first = data.iter().find(|b| !b.is_ascii_whitespace());
        if first == Some(&b'{') {
            ModelFormat::GltfJson
        } else {
            ModelFormat::Stl
        }
    }
}

/// Parse fetched bytes into an un-normalized model node
pub fn parse_model(data: &[u8]) -> Result<ModelNode, LoadError> {
    let mesh: Mesh = match ModelFormat::detect(data) {
        ModelFormat::Glb => gltf::parse_glb(data)?,
        ModelFormat::GltfJson => gltf::parse_gltf_json(data)?,
        ModelFormat::Stl => stl::parse_stl(data)?,
    };
    if mesh.is_empty() {
        return Err(LoadError::EmptyModel);
    }
    Ok(ModelNode::new(mesh))
}

/// Read a model file on a background thread
#[cfg(not(target_arch = "wasm32"))]
pub fn fetch_file(path: impl Into<std::path::PathBuf>) -> LoadTicket {
    let path = path.into();
    let (sender, ticket) = LoadTicket::channel();
    let spawned = std::thread::Builder::new()
        .name("model-fetch".to_string())
        .spawn(move || {
            log::debug!("reading model file {}", path.display());
            sender.send(std::fs::read(&path).map_err(LoadError::from));
        });
    if let Err(e) = spawned {
        return LoadTicket::ready(Err(LoadError::Io(e)));
    }
    ticket
}
