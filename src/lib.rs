//! Library backing the `dilatenii` and `splitnii` commandline utilities.
//!
//! Two independent pipelines over 3D nifti label volumes:
//!
//! - [`dilate`]: grow a seed ROI into the neighbouring white matter using a
//!   tissue-segmentation prior (`dilatenii`).
//! - [`split`]: split one parcel of a parcellation into sequential sections
//!   along its principal anatomical axis (`splitnii`).
//!
//! The pipelines only see `ndarray` arrays and `nalgebra` affines; reading
//! and writing nifti files is left to the binaries so the numerics stay
//! testable on synthetic volumes.

pub mod axis;
pub mod common;
pub mod components;
pub mod dilate;
pub mod error;
pub mod morphology;
pub mod split;
