//! Splitting a parcel into sequential sections along its long axis.
//!
//! The rotation from [`crate::axis`] is only used to decide which section a
//! voxel belongs to; section labels are written back at the original voxel
//! indices, so the image geometry is never resampled.

use crate::axis::{parcel_long_axis, rotation_to_canonical};
use crate::common::CoordinateFrame;
use crate::error::PipelineError;
use nalgebra::{Matrix4, Vector3};
use ndarray::{Array3, ArrayView3};

/// Lays out `sections + 1` equal-width boundaries over `[min, max]`.
///
/// The first boundary is floored and the last is ceiled so that no extremal
/// point falls outside the range through floating-point rounding.
fn section_boundaries(min: f64, max: f64, sections: usize) -> Vec<f64> {
    let mut boundaries: Vec<f64> = (0..=sections)
        .map(|n| min + (max - min) * n as f64 / sections as f64)
        .collect();
    boundaries[0] = boundaries[0].floor();
    boundaries[sections] = boundaries[sections].ceil();
    boundaries
}

/// Splits one label of a parcellation into `sections` slabs along its
/// principal axis.
///
/// The axis is computed from the label's largest connected component for
/// stability, but every voxel of the label is assigned a section. Voxel
/// coordinates are anchored at the affine's translation, rotated onto the
/// canonical axis nearest the long axis, and binned into equal-width
/// intervals along it; the last interval is closed so a voxel landing
/// exactly on the ceiled upper boundary is still binned.
///
/// Returns a volume of the parcel's shape holding 0 outside the parcel and
/// the section index 1..=`sections` inside it.
pub fn split_parcel(
    parc: ArrayView3<f64>,
    label: i32,
    sections: usize,
    affine: &Matrix4<f64>,
    frame: &CoordinateFrame,
) -> Result<Array3<u8>, PipelineError> {
    if sections == 0 || sections > u8::MAX as usize {
        return Err(PipelineError::InvalidSections);
    }

    let long_axis = parcel_long_axis(parc, label, frame)?;
    let rotation = rotation_to_canonical(&long_axis);
    let dest = rotation.dest.to_usize();

    // the full parcel this time, not just its largest component
    let indices: Vec<[usize; 3]> = parc
        .indexed_iter()
        .filter(|(_, &v)| v.round() as i32 == label)
        .map(|((i, j, k), _)| [i, j, k])
        .collect();

    // anchor at the affine translation, rotate, translate back
    let t = Vector3::new(affine[(0, 3)], affine[(1, 3)], affine[(2, 3)]);
    let rotated: Vec<f64> = indices
        .iter()
        .map(|&[i, j, k]| {
            let p = Vector3::new(i as f64, j as f64, k as f64);
            (rotation.matrix * (p + t) - t)[dest]
        })
        .collect();

    let min = rotated.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = rotated.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let boundaries = section_boundaries(min, max, sections);

    let mut out = Array3::<u8>::zeros(parc.dim());
    for (idx, &c) in indices.iter().zip(rotated.iter()) {
        for n in 0..sections {
            let above = c >= boundaries[n];
            let below = if n + 1 == sections {
                c <= boundaries[n + 1]
            } else {
                c < boundaries[n + 1]
            };
            if above && below {
                out[*idx] = (n + 1) as u8;
                break;
            }
        }
    }
    Ok(out)
}
