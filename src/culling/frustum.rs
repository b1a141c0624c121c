/// Stage 1: frustum rejection.
///
/// An object is rejected when its bounding sphere lies entirely on the
/// outside of any of the 6 frustum planes. Survivors become `CullingItem`s
/// tagged with a transparency flag derived by scanning the object's
/// materials. Malformed spheres (negative radius) are undefined input and
/// are not validated here.
use crate::camera::FrustumPlane;
use crate::culling::CullingItem;
use crate::scene::SceneObject;

/// True when the sphere is at least partially inside every plane.
#[inline]
pub fn sphere_in_frustum(planes: &[FrustumPlane; 6], center: glam::Vec3, radius: f32) -> bool {
    for plane in planes {
        if plane.distance(center) < -radius {
            return false;
        }
    }
    true
}

/// Populate `items` with the objects surviving frustum rejection.
/// `CullingItem::index` is the object's slot in this frame's input slice.
pub fn filter_objects(
    planes: &[FrustumPlane; 6],
    objects: &[SceneObject],
    items: &mut Vec<CullingItem>,
) {
    for (slot, object) in objects.iter().enumerate() {
        let sphere = object.bounding_sphere;
        if !sphere_in_frustum(planes, sphere.center, sphere.radius) {
            continue;
        }

        items.push(CullingItem {
            center: sphere.center,
            bound_radius: sphere.radius,
            screen_size: 0.0,
            transparent: object.has_transparent_material(),
            index: slot,
            occluder: false,
        });
    }
}
