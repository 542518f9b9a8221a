//! Conversion between Unity's coordinate convention and PMX's.
//!
//! Unity and MMD are both left-handed and Y-up, but MMD models face the
//! opposite X direction. Conversion mirrors across the YZ plane and, for
//! positions and offsets, applies the configured uniform scale. These functions
//! are the only places where source data changes convention: hierarchy import,
//! vertex import, bone tail offsets and morph offsets all go through them.

use nalgebra::{Quaternion, UnitQuaternion, Vector2, Vector3};

/// Convert a source position or offset into PMX space.
pub fn to_pmx_position(v: Vector3<f32>, scale: f32) -> Vector3<f32> {
    Vector3::new(-v.x, v.y, v.z) * scale
}

/// Convert a source normal into PMX space. Normals are never scaled.
pub fn to_pmx_normal(n: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(-n.x, n.y, n.z)
}

/// Convert a source rotation into PMX space.
///
/// Mirroring across the YZ plane keeps the rotation angle and maps the axis
/// `(x, y, z)` to `(x, -y, -z)`.
pub fn to_pmx_rotation(q: UnitQuaternion<f32>) -> UnitQuaternion<f32> {
    let q = q.quaternion();
    UnitQuaternion::new_unchecked(Quaternion::new(q.w, q.i, -q.j, -q.k))
}

/// Inverse of [`to_pmx_position`].
pub fn to_source_position(v: Vector3<f32>, scale: f32) -> Vector3<f32> {
    let unscaled = v / scale;
    Vector3::new(-unscaled.x, unscaled.y, unscaled.z)
}

/// Inverse of [`to_pmx_normal`].
pub fn to_source_normal(n: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(-n.x, n.y, n.z)
}

/// Inverse of [`to_pmx_rotation`].
pub fn to_source_rotation(q: UnitQuaternion<f32>) -> UnitQuaternion<f32> {
    // The mirror is an involution.
    to_pmx_rotation(q)
}

/// Body UVs are stored upside down relative to PMX; head UVs are not.
pub fn to_pmx_uv(uv: Vector2<f32>, flip_v: bool) -> Vector2<f32> {
    if flip_v {
        Vector2::new(uv.x, 1.0 - uv.y)
    } else {
        uv
    }
}
