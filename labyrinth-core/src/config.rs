//! Viewer configuration.
//!
//! Loop rates, projection parameters, camera speeds and the two fixed pipeline
//! choices (matrix convention and vertex strategy). Loaded from TOML; every field
//! is optional and falls back to its default.

use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LabyrinthError, LabyrinthResult};
use crate::lighting::PointLight;
use crate::projection::ViewportParams;
use crate::transform::{MatrixConvention, TransformPipeline};
use crate::vertex_buffer::VertexStrategy;

/// Light placement as written in a config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub position: [f32; 3],
    /// RGB components from 0.0 to 1.0.
    pub colour: [f32; 3],
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 10.0],
            colour: [1.0, 1.0, 1.0],
        }
    }
}

/// Configuration for the viewer loop and transform pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Window or status-line title.
    pub title: String,

    /// Render cap per second; `None` renders as fast as possible.
    pub max_fps: Option<u32>,

    /// Fixed update rate per second.
    pub max_ups: u32,

    /// Vertical field of view in degrees.
    pub fov_degrees: f32,

    pub z_near: f32,
    pub z_far: f32,

    /// Camera distance per update per unit of input.
    pub camera_speed: f32,

    /// Model rotation per update while a rotate key is held, in degrees.
    pub model_rotation_step: f32,

    pub convention: MatrixConvention,
    pub strategy: VertexStrategy,
    pub light: LightConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "The Labyrinth".to_string(),
            max_fps: None,
            max_ups: 20,
            fov_degrees: 60.0,
            z_near: 0.01,
            z_far: 1000.0,
            camera_speed: 0.05,
            model_rotation_step: 5.0,
            convention: MatrixConvention::default(),
            strategy: VertexStrategy::default(),
            light: LightConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn from_toml_str(source: &str) -> LabyrinthResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> LabyrinthResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading viewer config");
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Reject values the loop or projection cannot work with.
    pub fn validate(&self) -> LabyrinthResult<()> {
        if self.max_ups == 0 {
            return Err(invalid("max_ups must be at least 1"));
        }
        if self.max_fps == Some(0) {
            return Err(invalid("max_fps must be at least 1 when set"));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(invalid(format!(
                "fov_degrees must lie in (0, 180), got {}",
                self.fov_degrees
            )));
        }
        if !(self.z_near > 0.0 && self.z_far > self.z_near) {
            return Err(invalid(format!(
                "clip planes need 0 < z_near < z_far, got {} and {}",
                self.z_near, self.z_far
            )));
        }
        Ok(())
    }

    /// Projection parameters for a surface of the given size.
    pub fn viewport(&self, width: f32, height: f32) -> ViewportParams {
        ViewportParams::new(
            self.fov_degrees.to_radians(),
            width,
            height,
            self.z_near,
            self.z_far,
        )
    }

    pub fn pipeline(&self) -> TransformPipeline {
        TransformPipeline::new(self.convention)
    }

    pub fn point_light(&self) -> PointLight {
        PointLight::new(
            Vector3::from(self.light.position),
            Vector3::from(self.light.colour),
        )
    }
}

fn invalid(message: impl Into<String>) -> LabyrinthError {
    LabyrinthError::InvalidConfig(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_ups, 20);
        assert_eq!(config.convention, MatrixConvention::ModelView);
        assert_eq!(config.strategy, VertexStrategy::SharedPosition);
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let source = r#"
title = "Bunny"
max_fps = 30
convention = "separate_view_model"
strategy = "tuple_keyed"

[light]
colour = [1.0, 0.5, 0.0]
"#;
        let config = ViewerConfig::from_toml_str(source).unwrap();
        assert_eq!(config.title, "Bunny");
        assert_eq!(config.max_fps, Some(30));
        assert_eq!(config.convention, MatrixConvention::SeparateViewModel);
        assert_eq!(config.strategy, VertexStrategy::TupleKeyed);
        assert_eq!(config.light.position, [0.0, 0.0, 10.0]);
        assert_eq!(config.point_light().colour, Vector3::new(1.0, 0.5, 0.0));
    }

    #[test]
    fn test_unknown_convention_is_format_error() {
        let err = ViewerConfig::from_toml_str("convention = \"sideways\"").unwrap_err();
        assert!(matches!(err, LabyrinthError::ConfigFormat(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = ViewerConfig::from_toml_str("max_ups = 0").unwrap_err();
        assert!(matches!(err, LabyrinthError::InvalidConfig(_)));

        let err = ViewerConfig::from_toml_str("z_near = 10.0\nz_far = 1.0").unwrap_err();
        assert!(err.to_string().contains("clip planes"));
    }

    #[test]
    fn test_viewport_uses_radians() {
        let viewport = ViewerConfig::default().viewport(800.0, 600.0);
        assert!((viewport.fov - std::f32::consts::FRAC_PI_3).abs() < 1e-6);
        assert!(viewport.projection_matrix().is_ok());
    }
}
