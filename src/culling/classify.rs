/// Stage 2: occluder/occludee classification.
///
/// Computes each survivor's projected screen size, then splits the list:
/// occluders are opaque, nominated, meshed, and large enough on screen;
/// everything is also an occludee unless the exclusion policy is enabled.
/// Occluders are sorted by descending screen size so that large occluders
/// are transformed first; rasterization order itself is driven by geometric
/// depth in the triangle stage, not by this sort.
use std::cmp::Ordering;

use glam::{Mat4, Vec3};

use crate::config::CullingConfig;
use crate::culling::CullingItem;
use crate::scene::SceneObject;

/// Approximate fraction of the viewport covered by a bounding sphere.
/// Matches the projected-diameter heuristic: half the larger projection
/// scale, divided by the (distance-clamped) range to the sphere center.
#[inline]
pub fn compute_bounds_screen_size(
    view_pos: Vec3,
    center: Vec3,
    sphere_radius: f32,
    proj: &Mat4,
) -> f32 {
    let distance = view_pos.distance(center);
    let screen_scale = 0.5 * proj.col(0).x.max(proj.col(1).y);
    let screen_radius = screen_scale * sphere_radius / distance.max(1.0);
    screen_radius * 2.0
}

/// Classify frustum survivors into occluder and occludee sets.
///
/// `items` is updated in place with the computed screen sizes; objects are
/// consulted for occluder nomination and mesh availability (an object
/// without mesh data can never rasterize coverage, so it silently stays
/// occludee-only).
pub fn classify_items(
    config: &CullingConfig,
    view_pos: Vec3,
    proj: &Mat4,
    objects: &[SceneObject],
    items: &mut [CullingItem],
    occluders: &mut Vec<CullingItem>,
    occludees: &mut Vec<CullingItem>,
) {
    for item in items.iter_mut() {
        item.screen_size =
            compute_bounds_screen_size(view_pos, item.center, item.bound_radius, proj);

        let object = &objects[item.index];
        item.occluder = object.occluder_capable
            && !item.transparent
            && object.mesh.is_some()
            && item.screen_size > config.min_occluder_screen_size;

        if item.occluder {
            occluders.push(*item);
        }

        if !(item.occluder && config.exclude_occluders_from_occludees) {
            occludees.push(*item);
        }
    }

    // Largest occluders first; ties keep scene order for determinism.
    occluders.sort_by(|a, b| {
        b.screen_size
            .partial_cmp(&a.screen_size)
            .unwrap_or(Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, MeshData};
    use glam::Mat4;

    fn test_proj() -> Mat4 {
        Mat4::perspective_rh(70.0f32.to_radians(), 16.0 / 9.0, 0.1, 1000.0)
    }

    fn item(index: usize, center: Vec3, radius: f32, transparent: bool) -> CullingItem {
        CullingItem {
            center,
            bound_radius: radius,
            screen_size: 0.0,
            transparent,
            index,
            occluder: false,
        }
    }

    fn nominated_object(index: usize) -> SceneObject {
        SceneObject::with_mesh(index, MeshData::cube(1.0), Mat4::IDENTITY, true)
    }

    #[test]
    fn screen_size_shrinks_with_distance() {
        let proj = test_proj();
        let near = compute_bounds_screen_size(Vec3::ZERO, Vec3::new(0.0, 0.0, -5.0), 1.0, &proj);
        let far = compute_bounds_screen_size(Vec3::ZERO, Vec3::new(0.0, 0.0, -50.0), 1.0, &proj);
        assert!(near > far);
        assert!(far > 0.0);
    }

    #[test]
    fn nominated_opaque_large_object_becomes_occluder() {
        let config = CullingConfig::default();
        let objects = vec![nominated_object(0)];
        let mut items = vec![item(0, Vec3::new(0.0, 0.0, -5.0), 2.0, false)];
        let mut occluders = Vec::new();
        let mut occludees = Vec::new();

        classify_items(
            &config,
            Vec3::ZERO,
            &test_proj(),
            &objects,
            &mut items,
            &mut occluders,
            &mut occludees,
        );

        assert_eq!(occluders.len(), 1);
        // Default policy keeps occluders in the occludee set too.
        assert_eq!(occludees.len(), 1);
    }

    #[test]
    fn transparent_or_tiny_objects_stay_occludee_only() {
        let config = CullingConfig::default();
        let objects = vec![nominated_object(0), nominated_object(1)];
        let mut items = vec![
            item(0, Vec3::new(0.0, 0.0, -5.0), 2.0, true), // transparent
            item(1, Vec3::new(0.0, 0.0, -900.0), 0.1, false), // tiny on screen
        ];
        let mut occluders = Vec::new();
        let mut occludees = Vec::new();

        classify_items(
            &config,
            Vec3::ZERO,
            &test_proj(),
            &objects,
            &mut items,
            &mut occluders,
            &mut occludees,
        );

        assert!(occluders.is_empty());
        assert_eq!(occludees.len(), 2);
    }

    #[test]
    fn meshless_object_cannot_be_occluder() {
        let config = CullingConfig::default();
        let mut object = nominated_object(0);
        object.mesh = None;
        let objects = vec![object];
        let mut items = vec![item(0, Vec3::new(0.0, 0.0, -5.0), 2.0, false)];
        let mut occluders = Vec::new();
        let mut occludees = Vec::new();

        classify_items(
            &config,
            Vec3::ZERO,
            &test_proj(),
            &objects,
            &mut items,
            &mut occluders,
            &mut occludees,
        );

        assert!(occluders.is_empty());
        assert_eq!(occludees.len(), 1);
    }

    #[test]
    fn occluders_sort_by_descending_screen_size_with_stable_ties() {
        let config = CullingConfig::default();
        let objects: Vec<SceneObject> = (0..3).map(nominated_object).collect();
        let mut items = vec![
            item(0, Vec3::new(0.0, 0.0, -20.0), 2.0, false),
            item(1, Vec3::new(0.0, 0.0, -5.0), 2.0, false),
            item(2, Vec3::new(0.0, 0.0, -20.0), 2.0, false),
        ];
        let mut occluders = Vec::new();
        let mut occludees = Vec::new();

        classify_items(
            &config,
            Vec3::ZERO,
            &test_proj(),
            &objects,
            &mut items,
            &mut occluders,
            &mut occludees,
        );

        let order: Vec<usize> = occluders.iter().map(|o| o.index).collect();
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn exclusion_policy_removes_occluders_from_occludee_set() {
        let config = CullingConfig {
            exclude_occluders_from_occludees: true,
            ..Default::default()
        };
        let mut transparent_object = nominated_object(1);
        transparent_object.materials = vec![Material::transparent()];
        let objects = vec![nominated_object(0), transparent_object];
        let mut items = vec![
            item(0, Vec3::new(0.0, 0.0, -5.0), 2.0, false),
            item(1, Vec3::new(0.0, 0.0, -5.0), 2.0, true),
        ];
        let mut occluders = Vec::new();
        let mut occludees = Vec::new();

        classify_items(
            &config,
            Vec3::ZERO,
            &test_proj(),
            &objects,
            &mut items,
            &mut occluders,
            &mut occludees,
        );

        assert_eq!(occluders.len(), 1);
        assert_eq!(occludees.len(), 1);
        assert_eq!(occludees[0].index, 1);
    }
}
