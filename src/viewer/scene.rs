//! The 3D preview scene: camera, lights, orbit controls and the loaded mesh
//!
//! Rendering is a painter's-algorithm projection: every visible triangle is
//! projected to screen space, flat-shaded, and handed to the canvas far to
//! near.

use cgmath::{perspective, Deg, EuclideanSpace, InnerSpace, Matrix4, Point3, Vector3};
use std::f32::consts::PI;

use super::lighting::Lighting;
use super::mesh::Mesh;

/// Vertical field of view of the preview camera
pub const FIELD_OF_VIEW: Deg<f32> = Deg(75.0);

/// Largest dimension of a model after normalization
pub const MODEL_SIZE: f32 = 2.0;

/// Background colour behind the model
pub const BACKGROUND: [f32; 3] = [0.94, 0.94, 0.94];

const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 1000.0;

/// Orbit distance when a session opens
const INITIAL_RADIUS: f32 = 3.5;
const MIN_RADIUS: f32 = 1.5;
const MAX_RADIUS: f32 = 20.0;

/// Fraction of the pending rotation applied per frame
const DAMPING_FACTOR: f32 = 0.05;

/// 2.0 = one full orbit every 30 seconds
const AUTO_ROTATE_SPEED: f32 = 2.0;

/// Keeps the camera off the poles
const POLAR_MARGIN: f32 = 0.01;

/// Dense scans are thinned to this many triangles per frame
const MAX_DRAWN_TRIANGLES: usize = 20_000;

/// Size of the mount point the scene renders into, in logical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// Perspective camera with a fixed field of view
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub fov: Deg<f32>,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(aspect: f32) -> Self {
        Self {
            fov: FIELD_OF_VIEW,
            aspect,
            near: NEAR_PLANE,
            far: FAR_PLANE,
        }
    }

    pub fn projection(&self) -> Matrix4<f32> {
        perspective(self.fov, self.aspect, self.near, self.far)
    }
}

/// Orbit-style camera controls with damping and constant auto-rotation
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    /// Angle around the vertical axis, in radians
    pub azimuth: f32,
    /// Angle down from the vertical axis, in radians
    pub polar: f32,
    pub radius: f32,
    pub damping_factor: f32,
    pub auto_rotate_speed: f32,
    azimuth_delta: f32,
    polar_delta: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Point3::origin(),
            azimuth: 0.0,
            polar: PI / 2.0,
            radius: INITIAL_RADIUS,
            damping_factor: DAMPING_FACTOR,
            auto_rotate_speed: AUTO_ROTATE_SPEED,
            azimuth_delta: 0.0,
            polar_delta: 0.0,
        }
    }
}

impl OrbitControls {
    /// Queue a rotation from a pointer drag of `dx`/`dy` pixels.
    ///
    /// Dragging across the full viewport height turns the camera once.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.azimuth_delta -= 2.0 * PI * dx / height;
        self.polar_delta -= 2.0 * PI * dy / height;
    }

    /// Move closer (positive steps) or further away (negative steps)
    pub fn zoom(&mut self, steps: f32) {
        self.radius = (self.radius * 0.95f32.powf(steps)).clamp(MIN_RADIUS, MAX_RADIUS);
    }

    /// Advance one frame, `dt` seconds after the previous one
    pub fn update(&mut self, dt: f32) {
        self.azimuth -= 2.0 * PI / 60.0 * self.auto_rotate_speed * dt;

        self.azimuth += self.azimuth_delta * self.damping_factor;
        self.polar += self.polar_delta * self.damping_factor;
        self.azimuth_delta *= 1.0 - self.damping_factor;
        self.polar_delta *= 1.0 - self.damping_factor;

        self.polar = self.polar.clamp(POLAR_MARGIN, PI - POLAR_MARGIN);
        self.azimuth %= 2.0 * PI;
    }

    pub fn eye(&self) -> Point3<f32> {
        let (sin_polar, cos_polar) = self.polar.sin_cos();
        let (sin_azimuth, cos_azimuth) = self.azimuth.sin_cos();

        self.target
            + Vector3::new(
                sin_polar * sin_azimuth,
                cos_polar,
                sin_polar * cos_azimuth,
            ) * self.radius
    }
}

/// A projected, lit triangle in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadedTriangle {
    pub points: [[f32; 2]; 3],
    pub color: [f32; 3],
}

/// Everything a preview session draws
#[derive(Debug, Clone)]
pub struct Scene {
    pub background: [f32; 3],
    pub camera: Camera,
    pub lighting: Lighting,
    pub controls: OrbitControls,
    viewport: Viewport,
    mesh: Option<Mesh>,
}

impl Scene {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            background: BACKGROUND,
            camera: Camera::new(viewport.aspect()),
            lighting: Lighting::studio(),
            controls: OrbitControls::default(),
            viewport,
            mesh: None,
        }
    }

    /// Add a mesh, normalized to fit the camera's framing
    pub fn add_mesh(&mut self, mut mesh: Mesh) {
        mesh.normalize(MODEL_SIZE);
        self.mesh = Some(mesh);
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera.aspect = viewport.aspect();
    }

    pub fn update(&mut self, dt: f32) {
        self.controls.update(dt);
    }

    /// Project the mesh into viewport coordinates, farthest triangle first
    pub fn rasterize(&self) -> Vec<ShadedTriangle> {
        let Some(mesh) = &self.mesh else {
            return Vec::new();
        };

        let eye = self.controls.eye();
        let view = Matrix4::look_at_rh(eye, self.controls.target, Vector3::unit_y());
        let clip = self.camera.projection() * view;
        let stride = mesh.triangles.len().div_ceil(MAX_DRAWN_TRIANGLES).max(1);

        let mut drawn: Vec<(f32, ShadedTriangle)> = Vec::new();

        'triangles: for triangle in mesh.triangles.iter().step_by(stride) {
            let Some(normal) = mesh.face_normal(triangle) else {
                continue;
            };

            let corners = triangle.indices.map(|i| mesh.positions[i as usize]);

            // Back-face culling
            if normal.dot(eye.to_vec() - corners[0]) <= 0.0 {
                continue;
            }

            let mut points = [[0.0f32; 2]; 3];
            let mut depth = 0.0;
            for (point, corner) in points.iter_mut().zip(corners.iter()) {
                let projected = clip * corner.extend(1.0);
                if projected.w <= self.camera.near {
                    continue 'triangles;
                }

                let ndc_x = projected.x / projected.w;
                let ndc_y = projected.y / projected.w;
                *point = [
                    (ndc_x + 1.0) * 0.5 * self.viewport.width,
                    (1.0 - ndc_y) * 0.5 * self.viewport.height,
                ];
                depth += projected.w;
            }

            drawn.push((
                depth,
                ShadedTriangle {
                    points,
                    color: self.lighting.shade(normal, triangle.color),
                },
            ));
        }

        drawn.sort_by(|a, b| b.0.total_cmp(&a.0));
        drawn.into_iter().map(|(_, triangle)| triangle).collect()
    }
}
