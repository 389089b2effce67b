//! Preview session lifecycle
//!
//! At most one preview session exists at a time. A session moves
//! `Closed -> Initializing -> Active | FallbackActive -> Closed`; the
//! [`SessionHandle`] returned by [`PreviewLifecycle::start`] identifies it
//! and doubles as its cancellation token. Frames, resizes and deferred
//! activations carrying a handle from an older session are ignored.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use super::backend::{FallbackPanel, Preview, PreviewBackend};
use super::scene::{Scene, Viewport};
use crate::state::data::MeshPayload;

/// Longest step the animation takes, in seconds, after a stalled frame
const MAX_FRAME_STEP: f32 = 0.1;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("a 3D preview is already open")]
    SessionActive,

    #[error("preview session {0} is no longer current")]
    StaleHandle(u64),
}

/// Identifies one preview session; cleared when the session stops
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: u64,
    live: Arc<AtomicBool>,
}

impl SessionHandle {
    fn new(id: u64) -> Self {
        Self {
            id,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// False once the session has been stopped
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.live.store(false, Ordering::Release);
    }
}

impl PartialEq for SessionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SessionHandle {}

#[derive(Debug, Default)]
pub enum PreviewState {
    #[default]
    Closed,
    Initializing {
        handle: SessionHandle,
        payload: MeshPayload,
    },
    Active {
        handle: SessionHandle,
        scene: Box<Scene>,
        last_frame: Option<Instant>,
    },
    FallbackActive {
        handle: SessionHandle,
        panel: FallbackPanel,
    },
}

impl PreviewState {
    pub fn handle(&self) -> Option<&SessionHandle> {
        match self {
            PreviewState::Closed => None,
            PreviewState::Initializing { handle, .. }
            | PreviewState::Active { handle, .. }
            | PreviewState::FallbackActive { handle, .. } => Some(handle),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, PreviewState::Closed)
    }
}

/// Owns the current preview session and the backend that renders it
#[derive(Debug)]
pub struct PreviewLifecycle {
    backend: Arc<dyn PreviewBackend>,
    state: PreviewState,
    next_id: u64,
}

impl PreviewLifecycle {
    pub fn new(backend: Arc<dyn PreviewBackend>) -> Self {
        Self {
            backend,
            state: PreviewState::Closed,
            next_id: 1,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    /// Begin a session for `payload`. Nothing is built until [`activate`].
    ///
    /// [`activate`]: PreviewLifecycle::activate
    pub fn start(&mut self, payload: MeshPayload) -> Result<SessionHandle, PreviewError> {
        if !self.state.is_closed() {
            return Err(PreviewError::SessionActive);
        }

        let handle = SessionHandle::new(self.next_id);
        self.next_id += 1;

        debug!("Preview session {} initializing for {}", handle.id, payload.name);
        self.state = PreviewState::Initializing {
            handle: handle.clone(),
            payload,
        };
        Ok(handle)
    }

    /// Build the scene (or the fallback panel) once the mount point exists
    pub fn activate(&mut self, handle: &SessionHandle, viewport: Viewport) -> Result<(), PreviewError> {
        let current = match &self.state {
            PreviewState::Initializing { handle: current, .. } => current,
            _ => return Err(PreviewError::StaleHandle(handle.id)),
        };
        if current != handle || !handle.is_live() {
            return Err(PreviewError::StaleHandle(handle.id));
        }

        let PreviewState::Initializing { handle, payload } = std::mem::take(&mut self.state) else {
            return Err(PreviewError::StaleHandle(handle.id));
        };

        self.state = match self.backend.open(&payload, viewport) {
            Preview::Scene(scene) => {
                info!("Preview session {} active ({})", handle.id, self.backend.name());
                PreviewState::Active {
                    handle,
                    scene,
                    last_frame: None,
                }
            }
            Preview::Fallback(panel) => {
                info!("Preview session {} showing download fallback", handle.id);
                PreviewState::FallbackActive { handle, panel }
            }
        };
        Ok(())
    }

    /// Advance one animation frame.
    ///
    /// Returns false when `handle` no longer names an active session, in which
    /// case no more frames should be requested for it.
    pub fn tick(&mut self, handle: &SessionHandle, now: Instant) -> bool {
        if !handle.is_live() {
            return false;
        }

        match &mut self.state {
            PreviewState::Active {
                handle: current,
                scene,
                last_frame,
            } if *current == *handle => {
                let dt = last_frame
                    .map(|last| now.saturating_duration_since(last).as_secs_f32())
                    .unwrap_or(0.0)
                    .min(MAX_FRAME_STEP);
                scene.update(dt);
                *last_frame = Some(now);
                true
            }
            _ => false,
        }
    }

    /// Track a new mount-point size. Returns whether a scene was resized.
    pub fn resize(&mut self, handle: &SessionHandle, viewport: Viewport) -> bool {
        match &mut self.state {
            PreviewState::Active {
                handle: current,
                scene,
                ..
            } if *current == *handle && handle.is_live() => {
                scene.resize(viewport);
                true
            }
            _ => false,
        }
    }

    /// Queue an orbit rotation from a pointer drag
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        if let PreviewState::Active { scene, .. } = &mut self.state {
            let height = scene.viewport().height;
            scene.controls.rotate(dx, dy, height);
        }
    }

    pub fn zoom(&mut self, steps: f32) {
        if let PreviewState::Active { scene, .. } = &mut self.state {
            scene.controls.zoom(steps);
        }
    }

    /// Tear the session down and release its scene.
    ///
    /// A handle from an older session is cancelled but leaves the current
    /// session alone. Returns whether the current session was closed.
    pub fn stop(&mut self, handle: SessionHandle) -> bool {
        handle.cancel();

        if self.state.handle() != Some(&handle) {
            return false;
        }

        debug!("Preview session {} closed", handle.id);
        self.state = PreviewState::Closed;
        true
    }

    /// Whether frames and resizes should currently be delivered
    pub fn is_rendering(&self) -> bool {
        matches!(self.state, PreviewState::Active { .. })
    }

    pub fn scene(&self) -> Option<&Scene> {
        match &self.state {
            PreviewState::Active { scene, .. } => Some(&**scene),
            _ => None,
        }
    }

    pub fn fallback(&self) -> Option<&FallbackPanel> {
        match &self.state {
            PreviewState::FallbackActive { panel, .. } => Some(panel),
            _ => None,
        }
    }
}
