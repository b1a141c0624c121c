/// Camera model: view/projection matrices and frustum plane extraction.
/// The culler only consumes matrices and planes; input handling lives with
/// the renderer.
use glam::{Mat4, Quat, Vec3, Vec4};

pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,   // Rotation around Y axis (radians)
    pub pitch: f32, // Rotation around X axis (radians)
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub aspect_ratio: f32,
}

impl Camera {
    pub fn new(position: Vec3, aspect_ratio: f32) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            fov: 70.0f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            aspect_ratio,
        }
    }

    /// Update camera orientation to look at a specific target point.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let view_matrix = Mat4::look_at_rh(self.position, target, up);
        let rotation_quat = Quat::from_mat4(&view_matrix.inverse());
        let (yaw, pitch, _roll) = rotation_quat.to_euler(glam::EulerRot::YXZ);
        self.yaw = yaw;
        self.pitch = pitch;
    }

    /// Get view matrix
    pub fn view_matrix(&self) -> Mat4 {
        let rotation = self.rotation_quat();
        let forward = rotation * Vec3::NEG_Z;
        let target = self.position + forward;
        let up = rotation * Vec3::Y;

        Mat4::look_at_rh(self.position, target, up)
    }

    /// Get projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
    }

    /// Get combined view-projection matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Get rotation quaternion
    fn rotation_quat(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }

    /// Update aspect ratio (call when the viewport resizes)
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Extract the 6 frustum planes for bounding-sphere culling.
    pub fn extract_frustum_planes(&self) -> [FrustumPlane; 6] {
        extract_frustum_planes(&self.view_projection_matrix())
    }
}

/// One frustum plane in Hessian normal form: unit normal plus signed
/// distance to the origin. A point p is inside when
/// `dot(normal, p) + dist_to_origin >= 0`.
#[derive(Debug, Clone, Copy)]
pub struct FrustumPlane {
    pub normal: Vec3,
    pub dist_to_origin: f32,
}

impl FrustumPlane {
    /// Signed distance from a point to the plane.
    #[inline]
    pub fn distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.dist_to_origin
    }
}

/// Extract the 6 frustum planes from a view-projection matrix using the
/// Gribb-Hartmann method. Plane order: left, right, bottom, top, near, far.
pub fn extract_frustum_planes(vp: &Mat4) -> [FrustumPlane; 6] {
    let row0 = vp.row(0);
    let row1 = vp.row(1);
    let row2 = vp.row(2);
    let row3 = vp.row(3);

    [
        normalize_plane(row3 + row0), // left
        normalize_plane(row3 - row0), // right
        normalize_plane(row3 + row1), // bottom
        normalize_plane(row3 - row1), // top
        normalize_plane(row3 + row2), // near
        normalize_plane(row3 - row2), // far
    ]
}

#[inline]
fn normalize_plane(plane: Vec4) -> FrustumPlane {
    let normal_length = plane.truncate().length();
    let plane = if normal_length > 0.0001 {
        plane / normal_length
    } else {
        plane
    };
    FrustumPlane {
        normal: plane.truncate(),
        dist_to_origin: plane.w,
    }
}
