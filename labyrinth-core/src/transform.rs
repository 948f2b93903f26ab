/// Object poses, model matrices and per-frame matrix composition
use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::ViewportError;
use crate::projection::{CameraPose, ViewportParams};
use crate::sink::{uniforms, UniformSink};

/// Placement of an object in the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectPose {
    pub position: Vector3<f32>,
    /// Euler angles in degrees
    pub rotation: Vector3<f32>,
    pub scale: f32,
}

impl ObjectPose {
    pub fn new(position: Vector3<f32>, rotation: Vector3<f32>, scale: f32) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            ..Self::default()
        }
    }

    pub fn translate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.position += Vector3::new(dx, dy, dz);
    }

    /// Rotate by delta amounts (in degrees)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.rotation += Vector3::new(dx, dy, dz);
    }

    /// Model matrix: translate, then rotate X, Y, Z by the negated angles, then scale
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Transform::translation_matrix(self.position.x, self.position.y, self.position.z)
            * Transform::rotation_x(-self.rotation.x.to_radians())
            * Transform::rotation_y(-self.rotation.y.to_radians())
            * Transform::rotation_z(-self.rotation.z.to_radians())
            * Transform::scale_matrix(self.scale, self.scale, self.scale)
    }
}

impl Default for ObjectPose {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: 1.0,
        }
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Rotation about the X axis (radians)
    pub fn rotation_x(angle: f32) -> Matrix4<f32> {
        Matrix4::new_rotation(Vector3::new(angle, 0.0, 0.0))
    }

    /// Rotation about the Y axis (radians)
    pub fn rotation_y(angle: f32) -> Matrix4<f32> {
        Matrix4::new_rotation(Vector3::new(0.0, angle, 0.0))
    }

    /// Rotation about the Z axis (radians)
    pub fn rotation_z(angle: f32) -> Matrix4<f32> {
        Matrix4::new_rotation(Vector3::new(0.0, 0.0, angle))
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Create a scale matrix
    pub fn scale_matrix(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }
}

/// How view and model matrices reach the shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixConvention {
    /// `projectionMatrix` + `modelViewMatrix` (view * model on the CPU)
    #[default]
    ModelView,
    /// `projectionMatrix` + `viewMatrix` + `transformationMatrix`
    SeparateViewModel,
}

/// Matrices shared by every object in a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMatrices {
    pub convention: MatrixConvention,
    pub projection: Matrix4<f32>,
    pub view: Matrix4<f32>,
}

impl FrameMatrices {
    pub fn apply<S: UniformSink + ?Sized>(&self, sink: &mut S) {
        sink.set_matrix4(uniforms::PROJECTION_MATRIX, &self.projection);
        if self.convention == MatrixConvention::SeparateViewModel {
            sink.set_matrix4(uniforms::VIEW_MATRIX, &self.view);
        }
    }
}

/// Per-object matrix, shaped by the pipeline's convention
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectMatrices {
    ModelView(Matrix4<f32>),
    Transformation(Matrix4<f32>),
}

impl ObjectMatrices {
    pub fn apply<S: UniformSink + ?Sized>(&self, sink: &mut S) {
        match self {
            ObjectMatrices::ModelView(m) => sink.set_matrix4(uniforms::MODEL_VIEW_MATRIX, m),
            ObjectMatrices::Transformation(m) => {
                sink.set_matrix4(uniforms::TRANSFORMATION_MATRIX, m)
            }
        }
    }

    /// The full view * model product regardless of convention
    pub fn model_view(&self, frame: &FrameMatrices) -> Matrix4<f32> {
        match self {
            ObjectMatrices::ModelView(m) => *m,
            ObjectMatrices::Transformation(m) => frame.view * m,
        }
    }
}

/// Computes frame and object matrices from pose snapshots.
///
/// Holds no state besides the convention, so the matrix builder and the uniform
/// contract always agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransformPipeline {
    convention: MatrixConvention,
}

impl TransformPipeline {
    pub fn new(convention: MatrixConvention) -> Self {
        Self { convention }
    }

    pub fn convention(&self) -> MatrixConvention {
        self.convention
    }

    pub fn frame(
        &self,
        viewport: &ViewportParams,
        camera: &CameraPose,
    ) -> Result<FrameMatrices, ViewportError> {
        Ok(FrameMatrices {
            convention: self.convention,
            projection: viewport.projection_matrix()?,
            view: camera.view_matrix(),
        })
    }

    pub fn object(&self, frame: &FrameMatrices, pose: &ObjectPose) -> ObjectMatrices {
        let model = pose.model_matrix();
        match self.convention {
            MatrixConvention::ModelView => ObjectMatrices::ModelView(frame.view * model),
            MatrixConvention::SeparateViewModel => ObjectMatrices::Transformation(model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector4};
    use std::collections::HashMap;

    #[derive(Default)]
    struct Recorder {
        matrices: HashMap<String, Matrix4<f32>>,
    }

    impl UniformSink for Recorder {
        fn set_matrix4(&mut self, name: &str, value: &Matrix4<f32>) {
            self.matrices.insert(name.to_string(), *value);
        }
        fn set_vec3(&mut self, _: &str, _: &Vector3<f32>) {}
        fn set_vec4(&mut self, _: &str, _: &Vector4<f32>) {}
        fn set_float(&mut self, _: &str, _: f32) {}
        fn set_int(&mut self, _: &str, _: i32) {}
    }

    #[test]
    fn test_object_pose_moves() {
        let mut pose = ObjectPose::default();
        assert_eq!(pose.scale, 1.0);

        pose.translate(1.0, 2.0, 3.0);
        pose.rotate(10.0, 20.0, 30.0);
        assert!((pose.position - Vector3::new(1.0, 2.0, 3.0)).norm() < 1e-6);
        assert!((pose.rotation - Vector3::new(10.0, 20.0, 30.0)).norm() < 1e-6);
    }

    #[test]
    fn test_identity_pose() {
        let matrix = ObjectPose::default().model_matrix();
        assert!((matrix - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_unrotated_pose_is_pure_translation() {
        let matrix = ObjectPose::at(1.5, -2.0, 3.0).model_matrix();
        let mut expected = Matrix4::identity();
        expected[(0, 3)] = 1.5;
        expected[(1, 3)] = -2.0;
        expected[(2, 3)] = 3.0;
        assert!((matrix - expected).norm() < 1e-6);
    }

    #[test]
    fn test_rotation_angles_are_negated() {
        let mut pose = ObjectPose::default();
        pose.rotation.y = 90.0;
        let rotated = pose.model_matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        // -90 degrees about Y carries +X onto +Z
        assert!((rotated - Point3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
    }

    #[test]
    fn test_scale_applies_before_translation() {
        let pose = ObjectPose::new(Vector3::new(0.0, 0.0, -2.0), Vector3::zeros(), 3.0);
        let point = pose.model_matrix().transform_point(&Point3::new(1.0, 1.0, 1.0));
        assert!((point - Point3::new(3.0, 3.0, 1.0)).norm() < 1e-6);
    }

    #[test]
    fn test_rotation_happens_about_local_origin() {
        let mut pose = ObjectPose::at(5.0, 0.0, 0.0);
        pose.rotation.z = 180.0;
        let point = pose.model_matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!((point - Point3::new(4.0, 0.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn test_model_view_convention() {
        let pipeline = TransformPipeline::new(MatrixConvention::ModelView);
        let mut camera = CameraPose::default();
        camera.position = Vector3::new(0.0, 0.0, 4.0);
        let frame = pipeline.frame(&ViewportParams::default(), &camera).unwrap();
        let pose = ObjectPose::at(1.0, 0.0, 0.0);
        let object = pipeline.object(&frame, &pose);

        let mut sink = Recorder::default();
        frame.apply(&mut sink);
        object.apply(&mut sink);

        assert!(sink.matrices.contains_key(uniforms::PROJECTION_MATRIX));
        assert!(!sink.matrices.contains_key(uniforms::VIEW_MATRIX));
        assert!(!sink.matrices.contains_key(uniforms::TRANSFORMATION_MATRIX));
        let model_view = sink.matrices[uniforms::MODEL_VIEW_MATRIX];
        assert!((model_view - frame.view * pose.model_matrix()).norm() < 1e-6);
    }

    #[test]
    fn test_separate_convention_never_premultiplies() {
        let pipeline = TransformPipeline::new(MatrixConvention::SeparateViewModel);
        let mut camera = CameraPose::default();
        camera.position = Vector3::new(0.0, 1.0, 4.0);
        let frame = pipeline.frame(&ViewportParams::default(), &camera).unwrap();
        let pose = ObjectPose::at(1.0, 0.0, 0.0);
        let object = pipeline.object(&frame, &pose);

        let mut sink = Recorder::default();
        frame.apply(&mut sink);
        object.apply(&mut sink);

        assert!(!sink.matrices.contains_key(uniforms::MODEL_VIEW_MATRIX));
        assert!((sink.matrices[uniforms::VIEW_MATRIX] - frame.view).norm() < 1e-6);
        let transformation = sink.matrices[uniforms::TRANSFORMATION_MATRIX];
        assert!((transformation - pose.model_matrix()).norm() < 1e-6);
        assert!((object.model_view(&frame) - frame.view * transformation).norm() < 1e-6);
    }

    #[test]
    fn test_conventions_agree_in_clip_space() {
        let mut camera = CameraPose::default();
        camera.position = Vector3::new(0.5, 1.0, 6.0);
        camera.rotate(10.0, -15.0, 0.0);
        let mut pose = ObjectPose::at(0.0, 0.0, -1.0);
        pose.rotate(30.0, 45.0, 0.0);
        let point = Point3::new(1.0, -1.0, 1.0);

        let clip = |convention| {
            let pipeline = TransformPipeline::new(convention);
            let frame = pipeline.frame(&ViewportParams::default(), &camera).unwrap();
            let model_view = pipeline.object(&frame, &pose).model_view(&frame);
            frame.projection * model_view * point.to_homogeneous()
        };

        let expected = ViewportParams::default().projection_matrix().unwrap()
            * camera.view_matrix()
            * pose.model_matrix()
            * point.to_homogeneous();
        assert!((clip(MatrixConvention::ModelView) - expected).norm() < 1e-4);
        assert!((clip(MatrixConvention::SeparateViewModel) - expected).norm() < 1e-4);
    }

    #[test]
    fn test_degenerate_viewport_fails_frame() {
        let pipeline = TransformPipeline::default();
        let viewport = ViewportParams {
            height: 0.0,
            ..ViewportParams::default()
        };
        assert!(pipeline.frame(&viewport, &CameraPose::default()).is_err());
    }
}
