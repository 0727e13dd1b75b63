/// glTF 2.0 reader (binary `.glb` and embedded `.gltf`)
///
/// Only what the viewer needs is decoded: the default scene's node
/// hierarchy and the triangle positions of its meshes. Node transforms are
/// baked into the returned mesh, so the result is a single root node with an
/// identity transform.
use std::collections::HashMap;

use base64::Engine;
use log::{debug, warn};
use nalgebra::{Matrix4, Point3, Quaternion, UnitQuaternion, Vector3};
use nom::{
    bytes::complete::{tag, take},
    multi::many0,
    number::complete::{le_f32, le_u16, le_u32, le_u8},
    sequence::tuple,
    IResult,
};
use serde::Deserialize;

use crate::error::LoadError;
use crate::geometry::{Mesh, Triangle};

pub const GLB_MAGIC: &[u8] = b"glTF";
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

const COMPONENT_U8: u32 = 5121;
const COMPONENT_U16: u32 = 5123;
const COMPONENT_U32: u32 = 5125;
const COMPONENT_F32: u32 = 5126;
const MODE_TRIANGLES: u32 = 4;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    #[serde(default)]
    scene: Option<usize>,
    #[serde(default)]
    scenes: Vec<SceneDef>,
    #[serde(default)]
    nodes: Vec<NodeDef>,
    #[serde(default)]
    meshes: Vec<MeshDef>,
    #[serde(default)]
    accessors: Vec<AccessorDef>,
    #[serde(default)]
    buffer_views: Vec<BufferViewDef>,
    #[serde(default)]
    buffers: Vec<BufferDef>,
}

#[derive(Debug, Deserialize)]
struct SceneDef {
    #[serde(default)]
    nodes: Vec<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct NodeDef {
    #[serde(default)]
    children: Vec<usize>,
    mesh: Option<usize>,
    matrix: Option<[f32; 16]>,
    translation: Option<[f32; 3]>,
    rotation: Option<[f32; 4]>,
    scale: Option<[f32; 3]>,
}

#[derive(Debug, Deserialize)]
struct MeshDef {
    #[serde(default)]
    primitives: Vec<PrimitiveDef>,
}

#[derive(Debug, Deserialize)]
struct PrimitiveDef {
    attributes: HashMap<String, usize>,
    indices: Option<usize>,
    mode: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessorDef {
    buffer_view: Option<usize>,
    #[serde(default)]
    byte_offset: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: String,
    sparse: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferViewDef {
    buffer: usize,
    #[serde(default)]
    byte_offset: usize,
    byte_length: usize,
    byte_stride: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferDef {
    uri: Option<String>,
    byte_length: usize,
}

struct GlbChunks<'a> {
    json: &'a [u8],
    bin: Option<&'a [u8]>,
}

fn glb_header(input: &[u8]) -> IResult<&[u8], (u32, u32)> {
    let (input, _) = tag(GLB_MAGIC)(input)?;
    tuple((le_u32, le_u32))(input)
}

fn glb_chunk(input: &[u8]) -> IResult<&[u8], (u32, &[u8])> {
    let (input, (length, kind)) = tuple((le_u32, le_u32))(input)?;
    let (input, data) = take(length as usize)(input)?;
    Ok((input, (kind, data)))
}

fn split_glb(data: &[u8]) -> Result<GlbChunks<'_>, LoadError> {
    let (_, (version, length)) =
        glb_header(data).map_err(|_| LoadError::Parse("truncated GLB header".to_string()))?;
    if version != 2 {
        return Err(LoadError::Unsupported(format!("glTF container version {}", version)));
    }
    let length = length as usize;
    if length < 12 || length > data.len() {
        return Err(LoadError::Parse(format!(
            "GLB declares {} bytes but only {} are present",
            length,
            data.len()
        )));
    }

    let (_, chunks) = many0(glb_chunk)(&data[12..length])
        .map_err(|_| LoadError::Parse("malformed GLB chunk table".to_string()))?;

    let mut chunks = chunks.into_iter();
    let json = match chunks.next() {
        Some((CHUNK_JSON, json)) => json,
        _ => return Err(LoadError::Parse("GLB must start with a JSON chunk".to_string())),
    };
    let bin = chunks.find(|(kind, _)| *kind == CHUNK_BIN).map(|(_, data)| data);
    Ok(GlbChunks { json, bin })
}

/// Parse a binary glTF container
pub fn parse_glb(data: &[u8]) -> Result<Mesh, LoadError> {
    let chunks = split_glb(data)?;
    let document: Document = serde_json::from_slice(chunks.json)?;
    build_mesh(&document, chunks.bin)
}

/// Parse a JSON glTF document whose buffers are embedded as data URIs
pub fn parse_gltf_json(data: &[u8]) -> Result<Mesh, LoadError> {
    let document: Document = serde_json::from_slice(data)?;
    build_mesh(&document, None)
}

fn resolve_buffers(document: &Document, glb_bin: Option<&[u8]>) -> Result<Vec<Vec<u8>>, LoadError> {
    document
        .buffers
        .iter()
        .enumerate()
        .map(|(index, buffer)| {
            let bytes = match buffer.uri.as_deref() {
                None => glb_bin
                    .filter(|_| index == 0)
                    .map(<[u8]>::to_vec)
                    .ok_or_else(|| LoadError::Parse(format!("buffer {} has no data", index)))?,
                Some(uri) if uri.starts_with("data:") => decode_data_uri(uri)?,
                Some(uri) => {
                    return Err(LoadError::Unsupported(format!(
                        "external buffer '{}'; embed buffers or use .glb",
                        uri
                    )))
                }
            };
            if bytes.len() < buffer.byte_length {
                return Err(LoadError::Parse(format!(
                    "buffer {} holds {} bytes, expected {}",
                    index,
                    bytes.len(),
                    buffer.byte_length
                )));
            }
            Ok(bytes)
        })
        .collect()
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>, LoadError> {
    let (meta, payload) = uri
        .split_once(',')
        .ok_or_else(|| LoadError::Parse("malformed data URI".to_string()))?;
    if !meta.ends_with(";base64") {
        return Err(LoadError::Unsupported("data URI without base64 encoding".to_string()));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| LoadError::Parse(format!("invalid base64 buffer: {}", e)))
}

fn local_matrix(node: &NodeDef) -> Matrix4<f32> {
    if let Some(m) = node.matrix {
        return Matrix4::from_column_slice(&m);
    }
    let translation = node.translation.map(Vector3::from).unwrap_or_else(Vector3::zeros);
    let rotation = node
        .rotation
        .map(|[x, y, z, w]| UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z)))
        .unwrap_or_else(UnitQuaternion::identity);
    let scale = node.scale.map(Vector3::from).unwrap_or_else(|| Vector3::repeat(1.0));

    Matrix4::new_translation(&translation)
        * rotation.to_homogeneous()
        * Matrix4::new_nonuniform_scaling(&scale)
}

struct MeshBuilder<'a> {
    document: &'a Document,
    buffers: Vec<Vec<u8>>,
    mesh: Mesh,
}

fn build_mesh(document: &Document, glb_bin: Option<&[u8]>) -> Result<Mesh, LoadError> {
    let buffers = resolve_buffers(document, glb_bin)?;
    let mut builder = MeshBuilder {
        document,
        buffers,
        mesh: Mesh::new(),
    };

    for root in root_nodes(document) {
        builder.visit(root, &Matrix4::identity(), 0)?;
    }

    debug!("glTF scene baked into {} triangles", builder.mesh.triangles.len());
    Ok(builder.mesh)
}

/// Nodes of the default scene, or every parentless node when no scene is declared
fn root_nodes(document: &Document) -> Vec<usize> {
    let scene = document.scene.unwrap_or(0);
    if let Some(scene) = document.scenes.get(scene) {
        return scene.nodes.clone();
    }
    let mut is_child = vec![false; document.nodes.len()];
    for node in &document.nodes {
        for &child in &node.children {
            if let Some(flag) = is_child.get_mut(child) {
                *flag = true;
            }
        }
    }
    (0..document.nodes.len()).filter(|&i| !is_child[i]).collect()
}

impl MeshBuilder<'_> {
    fn visit(&mut self, index: usize, parent: &Matrix4<f32>, depth: usize) -> Result<(), LoadError> {
        if depth > self.document.nodes.len() {
            return Err(LoadError::Parse("node hierarchy contains a cycle".to_string()));
        }
        let document = self.document;
        let node = document
            .nodes
            .get(index)
            .ok_or_else(|| LoadError::Parse(format!("node {} out of range", index)))?;
        let world = parent * local_matrix(node);

        if let Some(mesh) = node.mesh {
            self.add_mesh(mesh, &world)?;
        }
        for &child in &node.children {
            self.visit(child, &world, depth + 1)?;
        }
        Ok(())
    }

    fn add_mesh(&mut self, index: usize, world: &Matrix4<f32>) -> Result<(), LoadError> {
        let document = self.document;
        let mesh = document
            .meshes
            .get(index)
            .ok_or_else(|| LoadError::Parse(format!("mesh {} out of range", index)))?;

        for primitive in &mesh.primitives {
            let mode = primitive.mode.unwrap_or(MODE_TRIANGLES);
            if mode != MODE_TRIANGLES {
                warn!("skipping mesh {} primitive with mode {}", index, mode);
                continue;
            }
            let Some(&position_accessor) = primitive.attributes.get("POSITION") else {
                warn!("skipping mesh {} primitive without POSITION", index);
                continue;
            };

            let positions: Vec<Point3<f32>> = self
                .read_positions(position_accessor)?
                .into_iter()
                .map(|p| world.transform_point(&p))
                .collect();
            let indices = match primitive.indices {
                Some(accessor) => self.read_indices(accessor)?,
                None => (0..positions.len() as u32).collect(),
            };

            for face in indices.chunks_exact(3) {
                let corner = |i: u32| {
                    positions.get(i as usize).copied().ok_or_else(|| {
                        LoadError::Parse(format!("index {} exceeds {} positions", i, positions.len()))
                    })
                };
                self.mesh.add_triangle(Triangle::from_positions(
                    corner(face[0])?,
                    corner(face[1])?,
                    corner(face[2])?,
                ));
            }
        }
        Ok(())
    }

    /// Raw bytes of an accessor plus the stride between elements
    fn accessor_bytes(&self, index: usize, element_size: usize) -> Result<(&AccessorDef, &[u8], usize), LoadError> {
        let accessor = self
            .document
            .accessors
            .get(index)
            .ok_or_else(|| LoadError::Parse(format!("accessor {} out of range", index)))?;
        if accessor.sparse.is_some() {
            return Err(LoadError::Unsupported(format!("sparse accessor {}", index)));
        }
        let view_index = accessor
            .buffer_view
            .ok_or_else(|| LoadError::Unsupported(format!("accessor {} has no bufferView", index)))?;
        let view = self
            .document
            .buffer_views
            .get(view_index)
            .ok_or_else(|| LoadError::Parse(format!("bufferView {} out of range", view_index)))?;
        let buffer = self
            .buffers
            .get(view.buffer)
            .ok_or_else(|| LoadError::Parse(format!("buffer {} out of range", view.buffer)))?;

        let view_bytes = view
            .byte_offset
            .checked_add(view.byte_length)
            .and_then(|end| buffer.get(view.byte_offset..end))
            .ok_or_else(|| LoadError::Parse(format!("bufferView {} exceeds its buffer", view_index)))?;

        let stride = view.byte_stride.unwrap_or(element_size);
        if stride < element_size {
            return Err(LoadError::Parse(format!(
                "bufferView {} stride {} is shorter than its elements",
                view_index, stride
            )));
        }
        let needed = match accessor.count {
            0 => Some(0),
            n => (n - 1)
                .checked_mul(stride)
                .and_then(|span| span.checked_add(accessor.byte_offset))
                .and_then(|span| span.checked_add(element_size)),
        };
        let bytes = needed
            .filter(|&needed| needed <= view_bytes.len())
            .and_then(|_| view_bytes.get(accessor.byte_offset..))
            .ok_or_else(|| LoadError::Parse(format!("accessor {} exceeds its bufferView", index)))?;
        Ok((accessor, bytes, stride))
    }

    fn read_positions(&self, index: usize) -> Result<Vec<Point3<f32>>, LoadError> {
        let (accessor, bytes, stride) = self.accessor_bytes(index, 12)?;
        if accessor.kind != "VEC3" || accessor.component_type != COMPONENT_F32 {
            return Err(LoadError::Unsupported(format!(
                "POSITION accessor {} is {} of component type {}",
                index, accessor.kind, accessor.component_type
            )));
        }

        (0..accessor.count)
            .map(|i| {
                let (_, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(&bytes[i * stride..])
                    .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| {
                        LoadError::Parse(format!("accessor {} truncated", index))
                    })?;
                Ok(Point3::new(x, y, z))
            })
            .collect()
    }

    fn read_indices(&self, index: usize) -> Result<Vec<u32>, LoadError> {
        let component_type = self
            .document
            .accessors
            .get(index)
            .map(|a| a.component_type)
            .ok_or_else(|| LoadError::Parse(format!("accessor {} out of range", index)))?;
        let element_size = match component_type {
            COMPONENT_U8 => 1,
            COMPONENT_U16 => 2,
            COMPONENT_U32 => 4,
            other => {
                return Err(LoadError::Unsupported(format!("index component type {}", other)));
            }
        };

        let (accessor, bytes, stride) = self.accessor_bytes(index, element_size)?;
        if accessor.kind != "SCALAR" {
            return Err(LoadError::Parse(format!("index accessor {} is {}", index, accessor.kind)));
        }

        (0..accessor.count)
            .map(|i| {
                let input = &bytes[i * stride..];
                let parsed: IResult<&[u8], u32> = match component_type {
                    COMPONENT_U8 => le_u8(input).map(|(rest, v)| (rest, u32::from(v))),
                    COMPONENT_U16 => le_u16(input).map(|(rest, v)| (rest, u32::from(v))),
                    _ => le_u32(input),
                };
                parsed
                    .map(|(_, v)| v)
                    .map_err(|_| LoadError::Parse(format!("accessor {} truncated", index)))
            })
            .collect()
    }
}
