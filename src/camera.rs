//! Camera, projection and the uniform shared by every camera-space pass.

use cgmath::{Matrix4, Point3, Rad, SquareMatrix, Vector3};

/// Converts cgmath's OpenGL clip space (z in -1..1) to wgpu's (z in 0..1).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Eye position plus yaw (around y) and tilt (around x).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub tilt: Rad<f32>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new((0.0, 0.0, 5.0), Rad(0.0), Rad(0.0))
    }
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, T: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        tilt: T,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            tilt: tilt.into(),
        }
    }

    /// `rotX(tilt) * rotY(yaw) * translate(-position)`.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        let eye = Vector3::new(self.position.x, self.position.y, self.position.z);
        Matrix4::from_angle_x(self.tilt)
            * Matrix4::from_angle_y(self.yaw)
            * Matrix4::from_translation(-eye)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    /// Used by the lighting pass to rebuild world positions from depth.
    pub inv_view_proj: [[f32; 4]; 4],
    pub position: [f32; 4],
    /// xy = target size in pixels
    pub screen: [f32; 4],
}

impl CameraUniform {
    pub fn new(camera: &Camera, projection: &Projection, size: [u32; 2]) -> Self {
        let view_proj = projection.calc_matrix() * camera.calc_matrix();
        let inv_view_proj = view_proj.invert().unwrap_or_else(Matrix4::identity);
        Self {
            view_proj: view_proj.into(),
            inv_view_proj: inv_view_proj.into(),
            position: camera.position.to_homogeneous().into(),
            screen: [size[0] as f32, size[1] as f32, 0.0, 0.0],
        }
    }
}
