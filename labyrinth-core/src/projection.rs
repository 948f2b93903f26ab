/// Camera pose, viewport and projection utilities
use std::f32::consts::PI;

use nalgebra::{Matrix4, Point3, Vector3, Vector4};

use crate::error::ViewportError;
use crate::transform::Transform;

/// Perspective projection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportParams {
    /// Vertical field of view in radians
    pub fov: f32,
    pub width: f32,
    pub height: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl ViewportParams {
    pub fn new(fov: f32, width: f32, height: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            fov,
            width,
            height,
            z_near,
            z_far,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    pub fn validate(&self) -> Result<(), ViewportError> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(self.width) || !positive(self.height) || self.aspect() <= f32::EPSILON {
            return Err(ViewportError::Dimensions {
                width: self.width,
                height: self.height,
            });
        }
        if !positive(self.z_near) || !self.z_far.is_finite() || self.z_far - self.z_near <= f32::EPSILON {
            return Err(ViewportError::ClipPlanes {
                near: self.z_near,
                far: self.z_far,
            });
        }
        if !(self.fov > 0.0 && self.fov < PI) {
            return Err(ViewportError::FieldOfView { fov: self.fov });
        }
        Ok(())
    }

    /// OpenGL-style perspective projection
    pub fn projection_matrix(&self) -> Result<Matrix4<f32>, ViewportError> {
        self.validate()?;
        Ok(Matrix4::new_perspective(
            self.aspect(),
            self.fov,
            self.z_near,
            self.z_far,
        ))
    }
}

impl Default for ViewportParams {
    fn default() -> Self {
        Self {
            fov: 60f32.to_radians(),
            width: 1080.0,
            height: 720.0,
            z_near: 0.01,
            z_far: 1000.0,
        }
    }
}

/// Free-roaming camera placement
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraPose {
    pub position: Vector3<f32>,
    /// Degrees about X
    pub pitch: f32,
    /// Degrees about Y
    pub yaw: f32,
    /// Degrees about Z, not used by the view matrix
    pub roll: f32,
}

impl CameraPose {
    pub fn new(position: Vector3<f32>, pitch: f32, yaw: f32, roll: f32) -> Self {
        Self {
            position,
            pitch,
            yaw,
            roll,
        }
    }

    /// Move relative to the current heading.
    ///
    /// `offset_z` moves along the yaw direction (negative is forward),
    /// `offset_x` strafes and `offset_y` moves straight up or down.
    pub fn advance(&mut self, offset_x: f32, offset_y: f32, offset_z: f32) {
        if offset_z != 0.0 {
            let yaw = self.yaw.to_radians();
            self.position.x += -yaw.sin() * offset_z;
            self.position.z += yaw.cos() * offset_z;
        }
        if offset_x != 0.0 {
            let yaw = (self.yaw - 90.0).to_radians();
            self.position.x += -yaw.sin() * offset_x;
            self.position.z += yaw.cos() * offset_x;
        }
        self.position.y += offset_y;
    }

    /// Rotate by delta amounts (in degrees)
    pub fn rotate(&mut self, d_pitch: f32, d_yaw: f32, d_roll: f32) {
        self.pitch += d_pitch;
        self.yaw += d_yaw;
        self.roll += d_roll;
    }

    /// View matrix: rotate by pitch, then yaw, then translate by the negated position
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Transform::rotation_x(self.pitch.to_radians())
            * Transform::rotation_y(self.yaw.to_radians())
            * Transform::translation_matrix(-self.position.x, -self.position.y, -self.position.z)
    }
}

/// Project a 3D point to screen space through a full model-view-projection matrix.
///
/// Returns `(x, y, depth)` with depth in normalized device coordinates, or `None`
/// when the point falls outside the view volume.
pub fn project_to_screen(
    mvp: &Matrix4<f32>,
    point: &Point3<f32>,
    width: u32,
    height: u32,
) -> Option<(f32, f32, f32)> {
    let clip: Vector4<f32> = mvp * point.to_homogeneous();

    // Prevent division by near-zero w values
    if clip.w.abs() < 1e-6 {
        return None;
    }

    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    let depth = clip.z / clip.w;

    // Clip test
    if !(-1.0..=1.0).contains(&ndc_x)
        || !(-1.0..=1.0).contains(&ndc_y)
        || !(-1.0..=1.0).contains(&depth)
    {
        return None;
    }

    // Convert to screen space
    let screen_x = (ndc_x + 1.0) * 0.5 * width as f32;
    let screen_y = (1.0 - ndc_y) * 0.5 * height as f32;

    Some((screen_x, screen_y, depth))
}
