//! Orbit camera and viewport-derived projection constants.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Default eye position, looking down onto the disk at an angle.
const DEFAULT_EYE: Vec3 = Vec3::new(15.0, 112.0, 168.0);
const NEAR_PLANE: f32 = 0.01;

/// On-screen star size factor, in world units at distance 1.
pub const STAR_SIZE: f32 = 0.35;

/// Size of the render surface in physical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Orbit camera for viewing the galaxy.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    pub zoom: f32,
}

impl Camera {
    /// Camera at `eye` looking at the origin.
    pub fn looking_from(eye: Vec3) -> Self {
        let distance = eye.length().max(NEAR_PLANE);
        Self {
            yaw: eye.x.atan2(eye.z),
            pitch: (eye.y / distance).clamp(-1.0, 1.0).asin(),
            distance,
            target: Vec3::ZERO,
            fov_y_degrees: 75.0,
            zoom: 1.0,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, viewport: Viewport) -> Mat4 {
        Mat4::perspective_infinite_rh(self.fov_y_radians(), viewport.aspect(), NEAR_PLANE)
    }

    #[inline]
    pub fn fov_y_radians(&self) -> f32 {
        self.fov_y_degrees.to_radians()
    }

    /// Pixels covered by one world unit at distance 1.
    ///
    /// Recomputed from the viewport height, field of view and zoom.
    pub fn camera_constant(&self, viewport: Viewport) -> f32 {
        viewport.height as f32 / ((0.5 * self.fov_y_radians()).tan() / self.zoom)
    }

    /// Rotate around the target by a mouse drag in pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * 0.005;
        self.pitch = (self.pitch + dy * 0.005).clamp(-1.5, 1.5);
    }

    /// Move towards or away from the target.
    pub fn dolly(&mut self, scroll: f32) {
        self.distance = (self.distance * (1.0 - scroll * 0.1)).clamp(1.0, 5000.0);
    }

    /// Uniform block for the particle renderer.
    pub fn uniform(&self, viewport: Viewport) -> CameraUniform {
        let view_proj = self.projection_matrix(viewport) * self.view_matrix();
        CameraUniform {
            view_proj: view_proj.to_cols_array_2d(),
            viewport: [viewport.width as f32, viewport.height as f32],
            camera_constant: self.camera_constant(viewport),
            star_size: STAR_SIZE,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::looking_from(DEFAULT_EYE)
    }
}

/// GPU layout of the camera uniform.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub viewport: [f32; 2],
    pub camera_constant: f32,
    pub star_size: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looking_from_reproduces_eye() {
        let camera = Camera::default();
        let pos = camera.position();
        assert!((pos - DEFAULT_EYE).length() < 1e-3, "got {:?}", pos);
    }

    #[test]
    fn test_camera_constant() {
        let mut camera = Camera::default();
        camera.fov_y_degrees = 90.0;
        let c = camera.camera_constant(Viewport::new(1280, 720));
        assert!((c - 720.0).abs() < 1e-3);

        camera.zoom = 2.0;
        let c = camera.camera_constant(Viewport::new(1280, 720));
        assert!((c - 1440.0).abs() < 1e-3);
    }

    #[test]
    fn test_camera_constant_tracks_viewport_and_fov() {
        let camera = Camera::default();
        let small = camera.camera_constant(Viewport::new(800, 600));
        let large = camera.camera_constant(Viewport::new(800, 1200));
        assert!((large - 2.0 * small).abs() < 1e-2);

        let mut wide = camera.clone();
        wide.fov_y_degrees = 100.0;
        assert!(wide.camera_constant(Viewport::new(800, 600)) < small);
    }

    #[test]
    fn test_uniform_size() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
    }

    #[test]
    fn test_origin_projects_to_screen_center() {
        let camera = Camera::default();
        let u = camera.uniform(Viewport::new(640, 480));
        let clip = Mat4::from_cols_array_2d(&u.view_proj) * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(clip.w > 0.0);
        assert!((clip.x / clip.w).abs() < 1e-4);
        assert!((clip.y / clip.w).abs() < 1e-4);
    }

    #[test]
    fn test_zero_viewport_is_clamped() {
        let viewport = Viewport::new(0, 0);
        assert_eq!(viewport.width, 1);
        assert_eq!(viewport.height, 1);
    }
}
