/// Phong lighting inputs: point lights and surface materials
use nalgebra::{Vector3, Vector4};

use crate::sink::{uniforms, UniformSink};

fn default_colour() -> Vector4<f32> {
    Vector4::repeat(1.0)
}

/// A stationary point of light emitting diffuse light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vector3<f32>,
    /// Components from 0.0 (black) to 1.0 (white)
    pub colour: Vector3<f32>,
}

impl PointLight {
    pub fn new(position: Vector3<f32>, colour: Vector3<f32>) -> Self {
        Self { position, colour }
    }

    /// Build from 8-bit RGB components
    pub fn from_rgb(position: Vector3<f32>, r: u8, g: u8, b: u8) -> Self {
        Self {
            position,
            colour: Vector3::new(r as f32, g as f32, b as f32) / 255.0,
        }
    }

    pub fn apply<S: UniformSink + ?Sized>(&self, sink: &mut S) {
        sink.set_vec3(uniforms::LIGHT_POSITION, &self.position);
        sink.set_vec3(uniforms::LIGHT_COLOUR, &self.colour);
    }

    /// Diffuse intensity at `point` with surface `normal`, both in world space
    pub fn diffuse(&self, point: &Vector3<f32>, normal: &Vector3<f32>) -> f32 {
        let to_light = self.position - point;
        match (to_light.try_normalize(1e-6), normal.try_normalize(1e-6)) {
            (Some(l), Some(n)) => n.dot(&l).max(0.0),
            _ => 0.0,
        }
    }

    /// Phong specular intensity at `point` as seen from `eye`.
    ///
    /// The reflected light direction is compared with the direction to the eye,
    /// raised to `shine_damper` and scaled by `reflectivity`.
    pub fn specular(
        &self,
        point: &Vector3<f32>,
        normal: &Vector3<f32>,
        eye: &Vector3<f32>,
        shine_damper: f32,
        reflectivity: f32,
    ) -> f32 {
        let (Some(l), Some(n), Some(v)) = (
            (self.position - point).try_normalize(1e-6),
            normal.try_normalize(1e-6),
            (eye - point).try_normalize(1e-6),
        ) else {
            return 0.0;
        };
        if n.dot(&l) <= 0.0 {
            return 0.0;
        }
        let reflected = n * (2.0 * n.dot(&l)) - l;
        reflected.dot(&v).max(0.0).powf(shine_damper) * reflectivity
    }

    /// Mean of the colour channels
    pub fn luminance(&self) -> f32 {
        self.colour.mean()
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self::new(Vector3::new(0.0, 0.0, 10.0), Vector3::new(1.0, 1.0, 1.0))
    }
}

/// Surface colours and specular response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: Vector4<f32>,
    pub diffuse: Vector4<f32>,
    pub specular: Vector4<f32>,
    pub reflectance: f32,
    pub shine_damper: f32,
    /// Whether a texture is bound in place of the flat colour
    pub textured: bool,
}

impl Material {
    /// Flat colour for every channel
    pub fn coloured(colour: Vector4<f32>, reflectance: f32) -> Self {
        Self {
            ambient: colour,
            diffuse: colour,
            specular: colour,
            reflectance,
            ..Self::default()
        }
    }

    pub fn textured(reflectance: f32) -> Self {
        Self {
            reflectance,
            textured: true,
            ..Self::default()
        }
    }

    pub fn apply<S: UniformSink + ?Sized>(&self, sink: &mut S) {
        sink.set_vec4(uniforms::COLOUR, &self.diffuse);
        sink.set_bool(uniforms::USE_COLOUR, !self.textured);
        if self.textured {
            sink.set_int(uniforms::TEXTURE_SAMPLER, 0);
        }
        sink.set_float(uniforms::SHINE_DAMPER, self.shine_damper);
        sink.set_float(uniforms::REFLECTIVITY, self.reflectance);
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: default_colour(),
            diffuse: default_colour(),
            specular: default_colour(),
            reflectance: 0.0,
            shine_damper: 1.0,
            textured: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix4;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Recorder {
        ints: HashMap<String, i32>,
        floats: HashMap<String, f32>,
        vectors: HashMap<String, Vec<f32>>,
    }

    impl UniformSink for Recorder {
        fn set_matrix4(&mut self, _: &str, _: &Matrix4<f32>) {}
        fn set_vec3(&mut self, name: &str, value: &Vector3<f32>) {
            self.vectors.insert(name.to_string(), value.as_slice().to_vec());
        }
        fn set_vec4(&mut self, name: &str, value: &Vector4<f32>) {
            self.vectors.insert(name.to_string(), value.as_slice().to_vec());
        }
        fn set_float(&mut self, name: &str, value: f32) {
            self.floats.insert(name.to_string(), value);
        }
        fn set_int(&mut self, name: &str, value: i32) {
            self.ints.insert(name.to_string(), value);
        }
    }

    #[test]
    fn test_from_rgb_scales_each_channel() {
        let light = PointLight::from_rgb(Vector3::zeros(), 255, 0, 51);
        assert!((light.colour - Vector3::new(1.0, 0.0, 0.2)).norm() < 1e-6);
    }

    #[test]
    fn test_diffuse_falls_off_with_angle() {
        let light = PointLight::new(Vector3::new(0.0, 10.0, 0.0), Vector3::repeat(1.0));
        let up = Vector3::new(0.0, 1.0, 0.0);
        assert!((light.diffuse(&Vector3::zeros(), &up) - 1.0).abs() < 1e-6);
        assert_eq!(light.diffuse(&Vector3::zeros(), &-up), 0.0);
        assert_eq!(light.diffuse(&Vector3::zeros(), &Vector3::zeros()), 0.0);
    }

    #[test]
    fn test_specular_peaks_along_reflection() {
        let light = PointLight::new(Vector3::new(0.0, 0.0, 10.0), Vector3::repeat(1.0));
        let up = Vector3::new(0.0, 0.0, 1.0);
        let origin = Vector3::zeros();

        let head_on = light.specular(&origin, &up, &Vector3::new(0.0, 0.0, 5.0), 1.0, 0.5);
        assert!((head_on - 0.5).abs() < 1e-6);

        let eye = Vector3::new(5.0, 0.0, 5.0);
        let soft = light.specular(&origin, &up, &eye, 1.0, 1.0);
        let sharp = light.specular(&origin, &up, &eye, 10.0, 1.0);
        assert!(soft > sharp && sharp > 0.0);

        assert_eq!(light.specular(&origin, &-up, &eye, 1.0, 1.0), 0.0);
        assert_eq!(light.specular(&origin, &up, &eye, 1.0, 0.0), 0.0);
    }

    #[test]
    fn test_untextured_material_uses_colour() {
        let mut sink = Recorder::default();
        Material::coloured(Vector4::new(0.5, 0.25, 1.0, 1.0), 0.3).apply(&mut sink);
        assert_eq!(sink.ints[uniforms::USE_COLOUR], 1);
        assert!(!sink.ints.contains_key(uniforms::TEXTURE_SAMPLER));
        assert_eq!(sink.vectors[uniforms::COLOUR], vec![0.5, 0.25, 1.0, 1.0]);
        assert_eq!(sink.floats[uniforms::REFLECTIVITY], 0.3);
    }

    #[test]
    fn test_textured_material_binds_sampler() {
        let mut sink = Recorder::default();
        Material::textured(1.0).apply(&mut sink);
        assert_eq!(sink.ints[uniforms::USE_COLOUR], 0);
        assert_eq!(sink.ints[uniforms::TEXTURE_SAMPLER], 0);
    }

    #[test]
    fn test_light_uniforms() {
        let mut sink = Recorder::default();
        PointLight::default().apply(&mut sink);
        assert_eq!(sink.vectors[uniforms::LIGHT_POSITION], vec![0.0, 0.0, 10.0]);
        assert_eq!(sink.vectors[uniforms::LIGHT_COLOUR], vec![1.0, 1.0, 1.0]);
    }
}
