//! Binary morphology: near-spherical structuring elements and dilation.

use crate::error::PipelineError;
use ndarray::{s, Array3, ArrayView3, Zip};

/// Iteration cap for [`dilate_until_overlap`]. A cortical ROI that has not
/// met its overlap target after this many passes will never meet it.
pub const MAX_DILATION_ITERS: usize = 100;

/// Builds a near-spherical `k x k x k` structuring element.
///
/// A unit impulse at the kernel centre is smoothed with an isotropic
/// Gaussian (sigma = 1 voxel per axis) and thresholded at 99% of the
/// intensity at the face centre `(c, c, 0)`, giving a rounded neighbourhood
/// rather than a full cube. For `k = 3` this is the 6-connected cross.
///
/// `k` must be odd so the centre voxel is well defined.
pub fn ball_element(k: usize) -> Array3<bool> {
    assert!(k % 2 == 1, "structuring element size must be odd");
    let c = (k - 1) / 2;
    // Smoothing an impulse just evaluates the separable Gaussian weights;
    // the threshold is relative so normalisation cancels.
    let g = |i: usize| -> f64 {
        let d = i as f64 - c as f64;
        (-0.5 * d * d).exp()
    };
    let threshold = 0.99 * g(c) * g(c) * g(0);
    Array3::from_shape_fn((k, k, k), |(i, j, l)| g(i) * g(j) * g(l) >= threshold)
}

/// Binary dilation of a 3D mask by a structuring element.
///
/// Uses the shift-and-OR strategy: for each active position in the
/// structuring element, shift the whole grid by that offset and OR it into
/// the result. Shifted-out regions are clipped at the volume borders.
pub fn binary_dilation(input: ArrayView3<bool>, se: ArrayView3<bool>) -> Array3<bool> {
    let (nx, ny, nz) = input.dim();
    let (sx, sy, sz) = se.dim();
    let (cx, cy, cz) = ((sx / 2) as i64, (sy / 2) as i64, (sz / 2) as i64);

    // active structuring element offsets relative to the centre
    let mut offsets = Vec::new();
    for i in 0..sx {
        for j in 0..sy {
            for l in 0..sz {
                if se[[i, j, l]] {
                    offsets.push((i as i64 - cx, j as i64 - cy, l as i64 - cz));
                }
            }
        }
    }

    let mut out = Array3::<bool>::from_elem((nx, ny, nz), false);
    for &(dx, dy, dz) in &offsets {
        let (src_x, dst_x, w) = shift_range(dx, nx);
        let (src_y, dst_y, h) = shift_range(dy, ny);
        let (src_z, dst_z, d) = shift_range(dz, nz);
        if w == 0 || h == 0 || d == 0 {
            continue;
        }
        Zip::from(out.slice_mut(s![
            dst_x..dst_x + w,
            dst_y..dst_y + h,
            dst_z..dst_z + d
        ]))
        .and(input.slice(s![
            src_x..src_x + w,
            src_y..src_y + h,
            src_z..src_z + d
        ]))
        .for_each(|dst, &src| *dst |= src);
    }
    out
}

/// Compute source start, destination start, and length for a shift offset.
#[inline]
fn shift_range(offset: i64, size: usize) -> (usize, usize, usize) {
    let n = size as i64;
    if offset >= 0 {
        (0, offset as usize, (n - offset).max(0) as usize)
    } else {
        ((-offset) as usize, 0, (n + offset).max(0) as usize)
    }
}

/// Dilates `roi` by `se` until its overlap with `valid` reaches one sixth of
/// the original ROI volume, accumulating dilation across iterations.
///
/// Dilation is inflationary, so the dilated region grows monotonically; once
/// the valid region under the mask carries enough volume the loop stops. If
/// the valid region is too sparse the target is unreachable, so the loop is
/// capped at `max_iters` and reports [`PipelineError::NonConvergence`]
/// instead of running forever.
pub fn dilate_until_overlap(
    roi: ArrayView3<bool>,
    valid: ArrayView3<bool>,
    se: ArrayView3<bool>,
    max_iters: usize,
) -> Result<Array3<bool>, PipelineError> {
    let roi_vol = roi.iter().filter(|&&v| v).count();
    if roi_vol == 0 {
        return Err(PipelineError::EmptyMask("input ROI"));
    }
    let target = roi_vol as f64 / 6.0;

    let mut dilated = binary_dilation(roi, se);
    let mut iters = 1;
    loop {
        let overlap = Zip::from(&dilated)
            .and(valid)
            .fold(0usize, |acc, &d, &v| acc + (d && v) as usize);
        if overlap as f64 >= target {
            return Ok(dilated);
        }
        if iters >= max_iters {
            return Err(PipelineError::NonConvergence(iters));
        }
        dilated = binary_dilation(dilated.view(), se);
        iters += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    #[test]
    fn ball_element_3_is_the_six_connected_cross() {
        let se = ball_element(3);
        assert_eq!(se.iter().filter(|&&v| v).count(), 7);
        assert!(se[[1, 1, 1]]);
        for p in [
            [0, 1, 1],
            [2, 1, 1],
            [1, 0, 1],
            [1, 2, 1],
            [1, 1, 0],
            [1, 1, 2],
        ] {
            assert!(se[p]);
        }
        // corners and edges stay out
        assert!(!se[[0, 0, 0]]);
        assert!(!se[[0, 0, 1]]);
    }

    #[test]
    fn dilating_a_point_with_the_cross_gives_the_cross() {
        let se = ball_element(3);
        let mut mask = Array3::from_elem((5, 5, 5), false);
        mask[[2, 2, 2]] = true;
        let dil = binary_dilation(mask.view(), se.view());
        assert_eq!(dil.iter().filter(|&&v| v).count(), 7);
        assert!(dil[[1, 2, 2]] && dil[[3, 2, 2]]);
        assert!(!dil[[1, 1, 2]]);
    }

    #[test]
    fn dilation_is_clipped_at_the_volume_border() {
        let se = ball_element(3);
        let mut mask = Array3::from_elem((3, 3, 3), false);
        mask[[0, 0, 0]] = true;
        let dil = binary_dilation(mask.view(), se.view());
        assert_eq!(dil.iter().filter(|&&v| v).count(), 4);
    }

    #[test]
    fn overlap_loop_stops_once_the_target_is_met() {
        let se = ball_element(3);
        let mut roi = Array3::from_elem((12, 12, 12), false);
        roi.slice_mut(s![2..5, 2..5, 2..5]).fill(true);
        // valid region one voxel beyond the ROI face
        let mut valid = Array3::from_elem((12, 12, 12), false);
        valid.slice_mut(s![5..9, 2..5, 2..5]).fill(true);
        let dilated =
            dilate_until_overlap(roi.view(), valid.view(), se.view(), MAX_DILATION_ITERS)
                .unwrap();
        // the dilated mask still covers the seed
        for ((x, y, z), &v) in roi.indexed_iter() {
            if v {
                assert!(dilated[[x, y, z]]);
            }
        }
        let overlap = dilated
            .indexed_iter()
            .filter(|(p, &v)| v && valid[[p.0, p.1, p.2]])
            .count();
        assert!(overlap as f64 >= 27.0 / 6.0);
    }

    #[test]
    fn sparse_valid_region_reports_non_convergence() {
        let se = ball_element(3);
        let mut roi = Array3::from_elem((8, 8, 8), false);
        roi.slice_mut(s![2..5, 2..5, 2..5]).fill(true);
        let valid = Array3::from_elem((8, 8, 8), false);
        let result = dilate_until_overlap(roi.view(), valid.view(), se.view(), 10);
        assert!(matches!(result, Err(PipelineError::NonConvergence(10))));
    }

    #[test]
    fn empty_seed_is_an_error() {
        let se = ball_element(3);
        let roi = Array3::from_elem((4, 4, 4), false);
        let valid = Array3::from_elem((4, 4, 4), true);
        assert!(matches!(
            dilate_until_overlap(roi.view(), valid.view(), se.view(), 10),
            Err(PipelineError::EmptyMask(_))
        ));
    }
}
