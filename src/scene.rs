/// Scene-side input model for the culling pipeline.
/// The renderer hands over a snapshot of renderable objects each frame;
/// everything here is immutable for the duration of one tick.
use glam::{Mat4, Vec3};

/// World-space bounding sphere.
#[derive(Debug, Clone, Copy)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

/// Object-local axis-aligned bounding box.
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// The 8 box corners, starting from `max` and ending at `min`.
    /// Order matches the occludee vertex synthesis in the transform stage.
    pub fn corners(&self) -> [Vec3; 8] {
        let (min, max) = (self.min, self.max);
        [
            max,
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, min.y, max.z),
            min,
            Vec3::new(max.x, min.y, min.z),
        ]
    }
}

/// Render-queue classification of a material. Only the transparent queue
/// matters to the culler; it is carried as an opaque input from the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderQueue {
    Background,
    Geometry,
    AlphaTest,
    Transparent,
    Overlay,
}

#[derive(Debug, Clone, Copy)]
pub struct Material {
    pub render_queue: RenderQueue,
}

impl Material {
    pub const fn opaque() -> Self {
        Self {
            render_queue: RenderQueue::Geometry,
        }
    }

    pub const fn transparent() -> Self {
        Self {
            render_queue: RenderQueue::Transparent,
        }
    }

    #[inline]
    pub fn is_transparent(&self) -> bool {
        self.render_queue == RenderQueue::Transparent
    }
}

/// Triangle mesh data for occluder rasterization: a flat vertex array and a
/// flattened index array (three indices per triangle).
#[derive(Debug, Clone)]
pub struct MeshData {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl MeshData {
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned quad in the local XY plane, centered at the origin.
    pub fn quad(half_width: f32, half_height: f32) -> Self {
        Self {
            vertices: vec![
                Vec3::new(-half_width, -half_height, 0.0),
                Vec3::new(half_width, -half_height, 0.0),
                Vec3::new(half_width, half_height, 0.0),
                Vec3::new(-half_width, half_height, 0.0),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// Axis-aligned cube centered at the origin.
    pub fn cube(half_extent: f32) -> Self {
        let h = half_extent;
        let vertices = vec![
            Vec3::new(-h, -h, -h),
            Vec3::new(h, -h, -h),
            Vec3::new(h, h, -h),
            Vec3::new(-h, h, -h),
            Vec3::new(-h, -h, h),
            Vec3::new(h, -h, h),
            Vec3::new(h, h, h),
            Vec3::new(-h, h, h),
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 1, 2, 0, 2, 3, // back
            5, 4, 7, 5, 7, 6, // front
            4, 0, 3, 4, 3, 7, // left
            1, 5, 6, 1, 6, 2, // right
            3, 2, 6, 3, 6, 7, // top
            4, 5, 1, 4, 1, 0, // bottom
        ];
        Self { vertices, indices }
    }

    /// Local bounds of the mesh vertices. Degenerate (empty) meshes collapse
    /// to a zero box at the origin.
    pub fn local_bounds(&self) -> Aabb {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for v in &self.vertices {
            min = min.min(*v);
            max = max.max(*v);
        }
        if self.vertices.is_empty() {
            min = Vec3::ZERO;
            max = Vec3::ZERO;
        }
        Aabb { min, max }
    }
}

/// One renderable object as seen by the culler. `index` is the caller's slot
/// for this object; visibility results are reported against it.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub index: usize,
    pub bounding_sphere: BoundingSphere,
    pub model_matrix: Mat4,
    pub materials: Vec<Material>,
    /// Whether the caller nominated this object as occluder-capable.
    pub occluder_capable: bool,
    /// Triangle mesh; objects without one can only be occludees.
    pub mesh: Option<MeshData>,
    /// Local-space bounds used to synthesize the 8 occludee proxy corners.
    pub local_bounds: Aabb,
}

impl SceneObject {
    /// Convenience constructor for a meshed object. The bounding sphere is
    /// derived from the mesh bounds under the given model matrix.
    pub fn with_mesh(index: usize, mesh: MeshData, model_matrix: Mat4, occluder_capable: bool) -> Self {
        let local_bounds = mesh.local_bounds();
        let bounding_sphere = world_sphere(&local_bounds, &model_matrix);
        Self {
            index,
            bounding_sphere,
            model_matrix,
            materials: vec![Material::opaque()],
            occluder_capable,
            mesh: Some(mesh),
            local_bounds,
        }
    }

    /// True if any material on the object uses the transparent render queue.
    pub fn has_transparent_material(&self) -> bool {
        self.materials.iter().any(|m| m.is_transparent())
    }
}

/// World-space bounding sphere enclosing a local box under a model matrix.
fn world_sphere(bounds: &Aabb, model: &Mat4) -> BoundingSphere {
    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for corner in bounds.corners() {
        let p = model.transform_point3(corner);
        min = min.min(p);
        max = max.max(p);
    }
    let center = (min + max) * 0.5;
    let radius = (max - center).length();
    BoundingSphere { center, radius }
}
