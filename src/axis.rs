//! Principal-axis extraction and rotation onto a canonical axis.
//!
//! The long axis of a parcel is the dominant eigenvector of the
//! second-moment tensor of its voxel point cloud. A Rodrigues rotation then
//! maps that axis onto whichever coordinate axis it is already closest to,
//! so that section boundaries can be laid out along a single array axis.

use crate::common::{CoordinateFrame, Direction};
use crate::components::largest_component_3d;
use crate::error::PipelineError;
use nalgebra::{Matrix3, Point4, Vector3};
use ndarray::ArrayView3;

/// A rotation taking a parcel's long axis onto a canonical axis.
#[derive(Debug, Clone)]
pub struct AxisRotation {
    /// Orthonormal rotation matrix (column-vector convention).
    pub matrix: Matrix3<f64>,
    /// The canonical axis the long axis is rotated onto.
    pub dest: Direction,
}

/// Index of the component with the largest absolute value.
fn dominant_index(v: &Vector3<f64>) -> usize {
    let mut idx = 0;
    for i in 1..3 {
        if v[i].abs() > v[idx].abs() {
            idx = i;
        }
    }
    idx
}

/// Maps voxel indices into the requested coordinate frame.
pub fn point_cloud(
    indices: &[[usize; 3]],
    frame: &CoordinateFrame,
) -> Vec<Vector3<f64>> {
    match frame {
        CoordinateFrame::Voxel(size) => indices
            .iter()
            .map(|&[i, j, k]| {
                Vector3::new(i as f64 * size[0], j as f64 * size[1], k as f64 * size[2])
            })
            .collect(),
        CoordinateFrame::World(affine) => indices
            .iter()
            .map(|&[i, j, k]| {
                let p = affine * Point4::new(i as f64, j as f64, k as f64, 1.0);
                Vector3::new(p[0], p[1], p[2])
            })
            .collect(),
    }
}

/// Computes the principal axis of a point cloud.
///
/// Builds the mean-centred second-moment tensor
/// `M[i][j] = mean(diff_i * diff_j)` over all points and takes the
/// eigenvector of its largest eigenvalue. The sign is normalised so the
/// dominant-magnitude component is positive, making downstream
/// canonical-axis alignment independent of point ordering.
pub fn principal_axis(points: &[Vector3<f64>]) -> Result<Vector3<f64>, PipelineError> {
    if points.is_empty() {
        return Err(PipelineError::EmptyMask("point cloud"));
    }
    let n = points.len() as f64;
    let centroid: Vector3<f64> =
        points.iter().fold(Vector3::zeros(), |acc, p| acc + p) / n;

    let mut m = Matrix3::<f64>::zeros();
    for p in points {
        let d = p - centroid;
        for i in 0..3 {
            for j in 0..3 {
                m[(i, j)] += d[i] * d[j];
            }
        }
    }
    m /= n;

    // M is symmetric positive semi-definite, so the singular vectors are
    // its eigenvectors and the largest eigenvalue marks the long axis.
    let eig = m.symmetric_eigen();
    let mut best = 0;
    for i in 1..3 {
        if eig.eigenvalues[i] > eig.eigenvalues[best] {
            best = i;
        }
    }
    let mut axis: Vector3<f64> = eig.eigenvectors.column(best).into_owned();

    if axis[dominant_index(&axis)] < 0.0 {
        axis = -axis;
    }
    Ok(axis)
}

/// Computes the long axis of one label in a parcellation volume.
///
/// Only the largest 6-connected component of the label is used, so stray
/// voxels elsewhere in the volume cannot tilt the axis.
pub fn parcel_long_axis(
    parc: ArrayView3<f64>,
    label: i32,
    frame: &CoordinateFrame,
) -> Result<Vector3<f64>, PipelineError> {
    let mask = parc.mapv(|v| v.round() as i32 == label);
    if !mask.iter().any(|&v| v) {
        return Err(PipelineError::EmptyMask("target label"));
    }
    let lcc = largest_component_3d(mask.view())?;
    let indices: Vec<[usize; 3]> = lcc
        .indexed_iter()
        .filter(|(_, &v)| v)
        .map(|((i, j, k), _)| [i, j, k])
        .collect();
    principal_axis(&point_cloud(&indices, frame))
}

/// Builds the rotation aligning `axis` with its nearest canonical axis.
///
/// The rotation axis is the normalised cross product of `axis` and the
/// destination unit vector, the angle is `arccos(dot)`, and the matrix
/// comes from the axis-angle (Rodrigues) formula. Rodrigues alone admits
/// two rotations, one of which drives the axis away from the destination,
/// so the result is checked against the input: if the rotated axis's
/// destination component shrank, the transpose is used instead.
///
/// Postcondition: `(R * axis)[dest] >= axis[dest]` — alignment with the
/// destination axis never decreases.
pub fn rotation_to_canonical(axis: &Vector3<f64>) -> AxisRotation {
    let dest_idx = dominant_index(axis);
    let mut dest = Vector3::<f64>::zeros();
    dest[dest_idx] = 1.0;

    let cross = axis.cross(&dest);
    let cross_norm = cross.norm();
    if cross_norm < 1e-12 {
        // already on the canonical axis
        return AxisRotation {
            matrix: Matrix3::identity(),
            dest: Direction::from_usize(dest_idx),
        };
    }
    let u = cross / cross_norm;
    let angle = axis.dot(&dest).clamp(-1.0, 1.0).acos();
    let (rsin, rcos) = angle.sin_cos();

    let mut r = Matrix3::<f64>::zeros();
    r[(0, 0)] = rcos + u[0] * u[0] * (1.0 - rcos);
    r[(1, 0)] = u[2] * rsin + u[1] * u[0] * (1.0 - rcos);
    r[(2, 0)] = -u[1] * rsin + u[2] * u[0] * (1.0 - rcos);
    r[(0, 1)] = -u[2] * rsin + u[0] * u[1] * (1.0 - rcos);
    r[(1, 1)] = rcos + u[1] * u[1] * (1.0 - rcos);
    r[(2, 1)] = u[0] * rsin + u[2] * u[1] * (1.0 - rcos);
    r[(0, 2)] = u[1] * rsin + u[0] * u[2] * (1.0 - rcos);
    r[(1, 2)] = -u[0] * rsin + u[1] * u[2] * (1.0 - rcos);
    r[(2, 2)] = rcos + u[2] * u[2] * (1.0 - rcos);

    let rotated = r * axis;
    if rotated[dest_idx] < axis[dest_idx] {
        // wrong handedness, rotate the other way
        r = r.transpose();
    }
    AxisRotation {
        matrix: r,
        dest: Direction::from_usize(dest_idx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Matrix4;
    use ndarray::{s, Array3};

    #[test]
    fn elongated_cloud_yields_its_long_axis() {
        let points: Vec<Vector3<f64>> = (0..20)
            .flat_map(|y| {
                (0..2).flat_map(move |x| {
                    (0..2).map(move |z| Vector3::new(x as f64, y as f64, z as f64))
                })
            })
            .collect();
        let axis = principal_axis(&points).unwrap();
        assert_relative_eq!(axis[1].abs(), 1.0, epsilon = 1e-10);
        assert!(axis[1] > 0.0, "sign must be normalised positive");
    }

    #[test]
    fn voxel_frame_scaling_changes_the_axis() {
        // an isotropic 4x4x4 cube of indices, but with thick slices the
        // world-space cloud is longest along z
        let indices: Vec<[usize; 3]> = (0..4)
            .flat_map(|i| (0..4).flat_map(move |j| (0..4).map(move |k| [i, j, k])))
            .collect();
        let frame = CoordinateFrame::Voxel([1.0, 1.0, 5.0]);
        let axis = principal_axis(&point_cloud(&indices, &frame)).unwrap();
        assert_relative_eq!(axis[2].abs(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn world_frame_applies_the_affine() {
        let indices = vec![[0, 0, 0], [1, 0, 0], [2, 0, 0]];
        let mut affine = Matrix4::<f64>::identity();
        affine[(0, 3)] = -10.0;
        let points = point_cloud(&indices, &CoordinateFrame::World(affine));
        assert_relative_eq!(points[0][0], -10.0);
        assert_relative_eq!(points[2][0], -8.0);
    }

    #[test]
    fn rotation_is_orthonormal() {
        let axis = Vector3::new(0.3, 0.9, 0.3).normalize();
        let rot = rotation_to_canonical(&axis);
        let r = rot.matrix;
        let rrt = r * r.transpose();
        assert_relative_eq!(rrt, Matrix3::identity(), epsilon = 1e-10);
        assert_relative_eq!(r.determinant().abs(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn alignment_never_decreases() {
        let candidates = [
            Vector3::new(0.3, 0.9, 0.3),
            Vector3::new(0.9, 0.1, 0.4),
            Vector3::new(0.2, 0.3, 0.93),
            Vector3::new(0.57, 0.57, 0.59),
            Vector3::new(-0.3, 0.8, -0.5),
        ];
        for v in candidates {
            let mut axis = v.normalize();
            let idx = super::dominant_index(&axis);
            if axis[idx] < 0.0 {
                axis = -axis;
            }
            let rot = rotation_to_canonical(&axis);
            let rotated = rot.matrix * axis;
            let d = rot.dest.to_usize();
            assert_eq!(d, idx);
            assert!(
                rotated[d] >= axis[d] - 1e-12,
                "rotation moved {axis:?} away from its canonical axis"
            );
            // a full alignment: the rotated axis is the destination axis
            assert_relative_eq!(rotated[d], 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn canonical_axis_maps_to_identity() {
        let rot = rotation_to_canonical(&Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(rot.dest, Direction::Z);
        assert_relative_eq!(rot.matrix, Matrix3::identity());
    }

    #[test]
    fn long_axis_ignores_stray_voxels() {
        let mut parc = Array3::<f64>::zeros((12, 12, 12));
        // elongated block along x
        parc.slice_mut(s![1..11, 4..6, 4..6]).fill(7.0);
        // a distant stray voxel of the same label, elongated along z would
        // be wrong anyway; the LCC keeps the block only
        parc[[0, 11, 11]] = 7.0;
        let frame = CoordinateFrame::Voxel([1.0, 1.0, 1.0]);
        let axis = parcel_long_axis(parc.view(), 7, &frame).unwrap();
        assert_relative_eq!(axis[0], 1.0, epsilon = 1e-10);
    }
}
