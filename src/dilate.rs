//! Growing a cortical ROI into the neighbouring white matter.

use crate::error::PipelineError;
use crate::morphology::{ball_element, dilate_until_overlap, MAX_DILATION_ITERS};
use ndarray::{Array3, ArrayView3, Zip};

/// Kernel size of the dilation structuring element.
const KERNEL_SIZE: usize = 3;

/// Tissue and mask values at or below this are treated as background when
/// building the valid white-matter region.
const MASK_THRESHOLD: f64 = 0.1;

/// Dilates a cortical seed ROI into the masked white matter.
///
/// The valid region is the intersection of white-matter positivity with the
/// independent mask thresholded at `> 0.1`. The ROI is dilated by a
/// near-spherical kernel until the overlap with the valid region reaches a
/// sixth of the original ROI volume, then the overlap is merged back into
/// the seed. The output therefore always fully contains the seed ROI.
pub fn dilate_cortex<'a>(
    wm: ArrayView3<f64>,
    mask: ArrayView3<'a, f64>,
    roi: ArrayView3<'a, f64>,
) -> Result<Array3<f64>, PipelineError> {
    for other in [&mask, &roi] {
        if other.dim() != wm.dim() {
            return Err(PipelineError::ShapeMismatch {
                expected: wm.shape().to_vec(),
                found: other.shape().to_vec(),
            });
        }
    }

    let valid = Zip::from(&wm)
        .and(&mask)
        .map_collect(|&w, &m| w > 0.0 && m > MASK_THRESHOLD);
    let seed = roi.mapv(|v| v > 0.0);

    let se = ball_element(KERNEL_SIZE);
    let dilated = dilate_until_overlap(
        seed.view(),
        valid.view(),
        se.view(),
        MAX_DILATION_ITERS,
    )?;

    // union of (dilated overlap with the valid region) and the seed
    let out = Zip::from(&dilated)
        .and(&valid)
        .and(&seed)
        .map_collect(|&d, &v, &s| ((d && v) || s) as u8 as f64);
    Ok(out)
}
