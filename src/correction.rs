use nalgebra::{Matrix3, Matrix4, Point3, Translation3, UnitQuaternion, Vector3};

/// Builds a bone's local pose matrix relative to its parent.
///
/// # Arguments
///
/// * `rest_position` - World-space rest position of the bone.
/// * `parent_rest_position` - World-space rest position of the parent, or the
///   origin for root bones.
/// * `pose_rotation` - Current pose rotation applied on top of the rest pose.
///
/// # Returns
///
/// `T(rest - parent_rest) * R(pose)`.
pub fn local_pose_matrix(
    rest_position: Vector3<f32>,
    parent_rest_position: Vector3<f32>,
    pose_rotation: UnitQuaternion<f32>,
) -> Matrix4<f32> {
    Translation3::from(rest_position - parent_rest_position).to_homogeneous()
        * pose_rotation.to_homogeneous()
}

/// Computes the skin matrix that moves rest-pose geometry into the posed
/// configuration of a bone.
///
/// # Arguments
///
/// * `world_pose` - World matrix of the posed bone.
/// * `rest_position` - World-space rest position of the bone.
///
/// # Returns
///
/// `world_pose * T(-rest_position)`.
pub fn skin_matrix(world_pose: Matrix4<f32>, rest_position: Vector3<f32>) -> Matrix4<f32> {
    world_pose * Translation3::from(-rest_position).to_homogeneous()
}

/// Sums weighted skin matrices (linear blend skinning).
///
/// # Arguments
///
/// * `influences` - `(skin matrix, weight)` pairs.
///
/// # Returns
///
/// The blended matrix; the zero matrix when there are no influences.
pub fn blend_skin_matrices<'a>(
    influences: impl IntoIterator<Item = (&'a Matrix4<f32>, f32)>,
) -> Matrix4<f32> {
    influences
        .into_iter()
        .fold(Matrix4::zeros(), |acc, (matrix, weight)| acc + matrix * weight)
}

/// Applies a blended skin matrix to a vertex position.
pub fn skin_position(position: Vector3<f32>, matrix: &Matrix4<f32>) -> Vector3<f32> {
    matrix.transform_point(&Point3::from(position)).coords
}

/// Applies the linear part of a blended skin matrix to a normal and
/// renormalizes it. Degenerate results keep the original normal.
pub fn skin_normal(normal: Vector3<f32>, matrix: &Matrix4<f32>) -> Vector3<f32> {
    let linear: Matrix3<f32> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    let transformed = linear * normal;
    transformed.try_normalize(1e-12).unwrap_or(normal)
}

/// Extracts the translation column of a transform matrix.
pub fn matrix_translation(matrix: &Matrix4<f32>) -> Vector3<f32> {
    Vector3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)])
}
