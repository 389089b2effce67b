//! Interactive 3D preview of a coin's model
//!
//! This module handles:
//! - Decoding glTF and OBJ payloads into triangle meshes
//! - The lit, orbiting scene a mesh is shown in
//! - Backend selection (real scene or download fallback)
//! - The session lifecycle tied to the detail view

pub mod backend;
pub mod lighting;
pub mod mesh;
pub mod scene;
pub mod session;

pub use backend::select_backend;
pub use scene::{Scene, Viewport};
pub use session::{PreviewLifecycle, PreviewState, SessionHandle};
