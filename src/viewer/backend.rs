//! Preview backends
//!
//! The real backend builds a lit [`Scene`] around the decoded mesh. The
//! fallback backend is used when no GPU adapter is present: it only offers
//! the raw model file for download.

use iced_wgpu::wgpu;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::mesh::{load_mesh, MeshFormat};
use super::scene::{Scene, Viewport};
use crate::state::data::{MeshPayload, PayloadError};

/// Shown on the fallback panel in place of the viewer
pub const FALLBACK_EXPLANATION: &str =
    "3D preview is not available on this system. Download the model to view it in another application.";

/// What a backend produces for an activated session
#[derive(Debug, Clone)]
pub enum Preview {
    Scene(Box<Scene>),
    Fallback(FallbackPanel),
}

/// A rendering capability the preview lifecycle can be configured with
pub trait PreviewBackend: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Build the preview for `payload`, sized to `viewport`.
    ///
    /// Never fails: problems with the payload degrade to an empty scene.
    fn open(&self, payload: &MeshPayload, viewport: Viewport) -> Preview;
}

/// Renders the model in an orbiting, lit scene
#[derive(Debug, Default, Clone, Copy)]
pub struct SceneBackend;

impl PreviewBackend for SceneBackend {
    fn name(&self) -> &'static str {
        "scene"
    }

    fn open(&self, payload: &MeshPayload, viewport: Viewport) -> Preview {
        let mut scene = Scene::new(viewport);

        if MeshFormat::from_payload(payload).is_none() {
            debug!("No loader for {}, showing an empty scene", payload.name);
            return Preview::Scene(Box::new(scene));
        }

        match load_mesh(payload) {
            Ok(mesh) => {
                info!(
                    "🪙 Loaded {} ({} triangles)",
                    payload.name,
                    mesh.triangles.len()
                );
                scene.add_mesh(mesh);
            }
            Err(e) => warn!("⚠️  Failed to load 3D model {}: {}", payload.name, e),
        }

        Preview::Scene(Box::new(scene))
    }
}

/// Offers the model for download instead of rendering it
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackBackend;

impl PreviewBackend for FallbackBackend {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn open(&self, payload: &MeshPayload, _viewport: Viewport) -> Preview {
        Preview::Fallback(FallbackPanel::new(payload.clone()))
    }
}

/// Filename, explanation and download action for a model that can't be shown
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackPanel {
    pub filename: String,
    pub explanation: &'static str,
    payload: MeshPayload,
}

impl FallbackPanel {
    pub fn new(payload: MeshPayload) -> Self {
        Self {
            filename: payload.name.clone(),
            explanation: FALLBACK_EXPLANATION,
            payload,
        }
    }

    /// The raw model bytes, exactly as uploaded
    pub fn bytes(&self) -> Result<Vec<u8>, PayloadError> {
        self.payload.bytes()
    }

    /// The original filename stripped of any directory components
    pub fn suggested_filename(&self) -> String {
        Path::new(&self.filename)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "model".to_string())
    }

    /// Write the raw bytes into `dir` under the original filename
    pub fn download_into(&self, dir: &Path) -> io::Result<PathBuf> {
        let bytes = self
            .bytes()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let path = dir.join(self.suggested_filename());
        std::fs::write(&path, bytes)?;
        info!("💾 Saved model to {}", path.display());
        Ok(path)
    }
}

/// Whether any GPU adapter can be found
pub fn gpu_available() -> bool {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapters = instance.enumerate_adapters(wgpu::Backends::all());
    for adapter in &adapters {
        let info = adapter.get_info();
        debug!("Found adapter {} ({:?})", info.name, info.backend);
    }
    !adapters.is_empty()
}

/// Pick the backend once at startup
pub fn select_backend(disable_3d: bool) -> Arc<dyn PreviewBackend> {
    if disable_3d {
        info!("3D preview disabled by configuration");
        return Arc::new(FallbackBackend);
    }

    if gpu_available() {
        Arc::new(SceneBackend)
    } else {
        warn!("⚠️  No GPU adapter found, 3D models will be offered for download");
        Arc::new(FallbackBackend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TETRAHEDRON_OBJ: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
v 0 0 1
f 1 3 2
f 1 2 4
f 1 4 3
f 2 3 4
";

    fn viewport() -> Viewport {
        Viewport::new(640.0, 400.0)
    }

    #[test]
    fn test_scene_backend_normalizes_the_model() {
        let payload = MeshPayload::from_bytes("tetra.obj", "model/obj", TETRAHEDRON_OBJ.as_bytes());
        let Preview::Scene(scene) = SceneBackend.open(&payload, viewport()) else {
            panic!("expected a scene");
        };

        let mesh = scene.mesh().unwrap();
        assert_eq!(mesh.triangles.len(), 4);
        let (min, max) = mesh.bounds().unwrap();
        let extent = max - min;
        assert!((extent.x.max(extent.y).max(extent.z) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_scene_backend_survives_bad_models() {
        let broken = MeshPayload::from_bytes("broken.glb", "model/gltf-binary", b"not gltf");
        let Preview::Scene(scene) = SceneBackend.open(&broken, viewport()) else {
            panic!("expected a scene");
        };
        assert!(scene.mesh().is_none());

        let unsupported = MeshPayload::from_bytes("coin.stl", "", b"solid coin");
        let Preview::Scene(scene) = SceneBackend.open(&unsupported, viewport()) else {
            panic!("expected a scene");
        };
        assert!(scene.mesh().is_none());
        assert_eq!(scene.viewport(), viewport());
    }

    #[test]
    fn test_fallback_downloads_original_bytes() {
        let payload = MeshPayload::from_bytes("aureus.obj", "model/obj", TETRAHEDRON_OBJ.as_bytes());
        let Preview::Fallback(panel) = FallbackBackend.open(&payload, viewport()) else {
            panic!("expected the fallback panel");
        };

        assert_eq!(panel.filename, "aureus.obj");
        assert_eq!(panel.explanation, FALLBACK_EXPLANATION);

        let dir = TempDir::new().unwrap();
        let path = panel.download_into(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("aureus.obj"));
        assert_eq!(std::fs::read(path).unwrap(), TETRAHEDRON_OBJ.as_bytes());
    }

    #[test]
    fn test_suggested_filename_drops_directories() {
        let payload = MeshPayload::from_bytes("../../etc/coin.glb", "", b"x");
        assert_eq!(FallbackPanel::new(payload).suggested_filename(), "coin.glb");

        let payload = MeshPayload::from_bytes("", "", b"x");
        assert_eq!(FallbackPanel::new(payload).suggested_filename(), "model");
    }

    #[test]
    fn test_disabled_3d_selects_fallback() {
        assert_eq!(select_backend(true).name(), "fallback");
    }
}
