//! Mesh decoding for the 3D preview
//!
//! The payload's filename extension picks the loader: `glb`/`gltf` go through
//! the glTF importer, `obj` through `tobj`. Either way the
//! result is a flat triangle list with one base colour per triangle.

use cgmath::{InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4};
use std::io::Cursor;
use thiserror::Error;

use crate::state::data::{MeshPayload, PayloadError};

/// Colour used when the file carries no material (bronze)
pub const DEFAULT_COLOR: [f32; 3] = [0.72, 0.55, 0.31];

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("unsupported model format: {0}")]
    Unsupported(String),

    #[error("invalid glTF: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("invalid OBJ: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("model contains no triangles")]
    Empty,

    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// Loaders, chosen by filename extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Gltf,
    Obj,
}

impl MeshFormat {
    pub fn from_payload(payload: &MeshPayload) -> Option<Self> {
        match payload.extension()?.as_str() {
            "glb" | "gltf" => Some(MeshFormat::Gltf),
            "obj" => Some(MeshFormat::Obj),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub indices: [u32; 3],
    pub color: [f32; 3],
}

/// An indexed triangle mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vector3<f32>>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    /// Axis-aligned bounding box as (min, max)
    pub fn bounds(&self) -> Option<(Vector3<f32>, Vector3<f32>)> {
        let first = *self.positions.first()?;
        Some(self.positions.iter().fold((first, first), |(min, max), p| {
            (
                Vector3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Vector3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        }))
    }

    /// Center the mesh on its bounding-box center and scale it uniformly so
    /// its largest dimension equals `size`
    pub fn normalize(&mut self, size: f32) {
        let Some((min, max)) = self.bounds() else {
            return;
        };

        let center = (min + max) * 0.5;
        let extent = max - min;
        let largest = extent.x.max(extent.y).max(extent.z);
        let scale = if largest > f32::EPSILON { size / largest } else { 1.0 };

        for p in &mut self.positions {
            *p = (*p - center) * scale;
        }
    }

    /// Unit face normal, `None` for degenerate triangles
    pub fn face_normal(&self, triangle: &Triangle) -> Option<Vector3<f32>> {
        let [a, b, c] = triangle.indices.map(|i| self.positions[i as usize]);
        let normal = (b - a).cross(c - a);
        if normal.magnitude2() <= f32::EPSILON * f32::EPSILON {
            None
        } else {
            Some(normal.normalize())
        }
    }
}

/// Decode a mesh payload with the loader its extension calls for
pub fn load_mesh(payload: &MeshPayload) -> Result<Mesh, MeshError> {
    let format = MeshFormat::from_payload(payload)
        .ok_or_else(|| MeshError::Unsupported(payload.name.clone()))?;
    let bytes = payload.bytes()?;

    let mesh = match format {
        MeshFormat::Gltf => load_gltf(&bytes)?,
        MeshFormat::Obj => load_obj(&bytes)?,
    };

    if mesh.triangles.is_empty() {
        return Err(MeshError::Empty);
    }
    Ok(mesh)
}

/// Import a glTF or GLB document, baking node transforms into the vertices
pub fn load_gltf(bytes: &[u8]) -> Result<Mesh, MeshError> {
    let (document, buffers, _images) = gltf::import_slice(bytes)?;
    let mut mesh = Mesh::default();

    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                visit_node(&node, Matrix4::identity(), &buffers, &mut mesh);
            }
        }
        None => {
            // Meshes without a scene graph are shown untransformed
            for gltf_mesh in document.meshes() {
                append_gltf_mesh(&gltf_mesh, Matrix4::identity(), &buffers, &mut mesh);
            }
        }
    }

    Ok(mesh)
}

fn visit_node(
    node: &gltf::Node,
    parent: Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    out: &mut Mesh,
) {
    let world = parent * Matrix4::from(node.transform().matrix());

    if let Some(gltf_mesh) = node.mesh() {
        append_gltf_mesh(&gltf_mesh, world, buffers, out);
    }
    for child in node.children() {
        visit_node(&child, world, buffers, out);
    }
}

fn append_gltf_mesh(
    gltf_mesh: &gltf::Mesh,
    world: Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    out: &mut Mesh,
) {
    for primitive in gltf_mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            continue;
        }

        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            continue;
        };

        let base = out.positions.len() as u32;
        out.positions.extend(
            positions.map(|p| (world * Vector4::new(p[0], p[1], p[2], 1.0)).truncate()),
        );
        let count = out.positions.len() as u32 - base;

        let [r, g, b, _] = primitive
            .material()
            .pbr_metallic_roughness()
            .base_color_factor();

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..count).collect(),
        };

        for tri in indices.chunks_exact(3) {
            if tri.iter().all(|&i| i < count) {
                out.triangles.push(Triangle {
                    indices: [base + tri[0], base + tri[1], base + tri[2]],
                    color: [r, g, b],
                });
            }
        }
    }
}

/// Load the geometry of a Wavefront OBJ file.
///
/// Polygons are triangulated by `tobj`; every object in the file is merged
/// into one mesh. Material libraries are never followed since the payload
/// is a single embedded file.
pub fn load_obj(bytes: &[u8]) -> Result<Mesh, MeshError> {
    let options = tobj::LoadOptions {
        triangulate: true,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };
    let (models, _materials) = tobj::load_obj_buf(&mut Cursor::new(bytes), &options, |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })?;

    let mut mesh = Mesh::default();
    for model in models {
        let base = mesh.positions.len() as u32;
        mesh.positions.extend(
            model
                .mesh
                .positions
                .chunks_exact(3)
                .map(|p| Vector3::new(p[0], p[1], p[2])),
        );

        mesh.triangles.extend(model.mesh.indices.chunks_exact(3).map(|tri| Triangle {
            indices: [base + tri[0], base + tri[1], base + tri[2]],
            color: DEFAULT_COLOR,
        }));
    }

    Ok(mesh)
}
