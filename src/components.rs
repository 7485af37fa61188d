//! Connected-component labeling and largest-component extraction.
//!
//! Components are connected under face adjacency only: 4-connectivity in 2D
//! and 6-connectivity in 3D (a plus-shaped neighbourhood, not the full 8/26
//! neighbourhood), matching the structure used for anatomical parcels.

use crate::error::PipelineError;
use ndarray::{Array2, Array3, ArrayD, ArrayView2, ArrayView3, Ix2, Ix3};
use std::collections::VecDeque;

/// Labels the connected components of a 3D binary volume under
/// 6-connectivity.
///
/// Returns the label volume (0 = background, components numbered from 1 in
/// scan order) and the number of components found.
pub fn label_components_3d(mask: ArrayView3<bool>) -> (Array3<u32>, u32) {
    let (nx, ny, nz) = mask.dim();
    let mut labels = Array3::<u32>::zeros((nx, ny, nz));
    let mut n_labels = 0u32;
    let mut queue = VecDeque::new();

    for x in 0..nx {
        for y in 0..ny {
            for z in 0..nz {
                if !mask[[x, y, z]] || labels[[x, y, z]] != 0 {
                    continue;
                }
                // flood fill a new component from here
                n_labels += 1;
                labels[[x, y, z]] = n_labels;
                queue.push_back((x, y, z));
                while let Some((cx, cy, cz)) = queue.pop_front() {
                    for (dx, dy, dz) in [
                        (-1i64, 0i64, 0i64),
                        (1, 0, 0),
                        (0, -1, 0),
                        (0, 1, 0),
                        (0, 0, -1),
                        (0, 0, 1),
                    ] {
                        let (px, py, pz) = (
                            cx as i64 + dx,
                            cy as i64 + dy,
                            cz as i64 + dz,
                        );
                        if px < 0
                            || py < 0
                            || pz < 0
                            || px >= nx as i64
                            || py >= ny as i64
                            || pz >= nz as i64
                        {
                            continue;
                        }
                        let p = [px as usize, py as usize, pz as usize];
                        if mask[p] && labels[p] == 0 {
                            labels[p] = n_labels;
                            queue.push_back((p[0], p[1], p[2]));
                        }
                    }
                }
            }
        }
    }
    (labels, n_labels)
}

/// Labels the connected components of a 2D binary image under
/// 4-connectivity. Same output convention as [`label_components_3d`].
pub fn label_components_2d(mask: ArrayView2<bool>) -> (Array2<u32>, u32) {
    let (nx, ny) = mask.dim();
    let mut labels = Array2::<u32>::zeros((nx, ny));
    let mut n_labels = 0u32;
    let mut queue = VecDeque::new();

    for x in 0..nx {
        for y in 0..ny {
            if !mask[[x, y]] || labels[[x, y]] != 0 {
                continue;
            }
            n_labels += 1;
            labels[[x, y]] = n_labels;
            queue.push_back((x, y));
            while let Some((cx, cy)) = queue.pop_front() {
                for (dx, dy) in [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)] {
                    let (px, py) = (cx as i64 + dx, cy as i64 + dy);
                    if px < 0 || py < 0 || px >= nx as i64 || py >= ny as i64 {
                        continue;
                    }
                    let p = [px as usize, py as usize];
                    if mask[p] && labels[p] == 0 {
                        labels[p] = n_labels;
                        queue.push_back((p[0], p[1]));
                    }
                }
            }
        }
    }
    (labels, n_labels)
}

/// Picks the label with the most voxels from a label volume.
///
/// Ties go to the lowest label index, which is the component found first in
/// scan order. Returns `None` when there are no components.
fn argmax_label<D>(labels: &ndarray::Array<u32, D>, n_labels: u32) -> Option<u32>
where
    D: ndarray::Dimension,
{
    if n_labels == 0 {
        return None;
    }
    let mut counts = vec![0usize; n_labels as usize + 1];
    for &l in labels.iter() {
        counts[l as usize] += 1;
    }
    let mut best = 1u32;
    for l in 2..=n_labels {
        if counts[l as usize] > counts[best as usize] {
            best = l;
        }
    }
    Some(best)
}

/// Extracts the largest 6-connected component of a 3D binary volume.
pub fn largest_component_3d(
    mask: ArrayView3<bool>,
) -> Result<Array3<bool>, PipelineError> {
    let (labels, n_labels) = label_components_3d(mask);
    let best = argmax_label(&labels, n_labels)
        .ok_or(PipelineError::EmptyMask("component input"))?;
    Ok(labels.mapv(|l| l == best))
}

/// Extracts the largest 4-connected component of a 2D binary image.
pub fn largest_component_2d(
    mask: ArrayView2<bool>,
) -> Result<Array2<bool>, PipelineError> {
    let (labels, n_labels) = label_components_2d(mask);
    let best = argmax_label(&labels, n_labels)
        .ok_or(PipelineError::EmptyMask("component input"))?;
    Ok(labels.mapv(|l| l == best))
}

/// Extracts the largest connected component of a 2D or 3D binary volume,
/// dispatching on dimensionality.
pub fn largest_connected_component(
    mask: &ArrayD<bool>,
) -> Result<ArrayD<bool>, PipelineError> {
    match mask.ndim() {
        2 => {
            let m = mask.view().into_dimensionality::<Ix2>().unwrap();
            Ok(largest_component_2d(m)?.into_dyn())
        }
        3 => {
            let m = mask.view().into_dimensionality::<Ix3>().unwrap();
            Ok(largest_component_3d(m)?.into_dyn())
        }
        n => Err(PipelineError::WrongDimensionality {
            expected: "2D or 3".to_string(),
            found: n,
        }),
    }
}
