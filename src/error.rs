use thiserror::Error;

/// Errors produced by the pipeline functions.
///
/// File and nifti parsing errors are handled at the binary boundary, so
/// everything here is a property of the arrays themselves.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Co-registered inputs must share a shape.
    #[error("input volumes have mismatched shapes: {expected:?} vs {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// A mask or label selection came up with zero foreground voxels.
    #[error("{0} contains no foreground voxels")]
    EmptyMask(&'static str),

    /// The dilation loop hit its iteration cap before reaching the
    /// overlap target.
    #[error("dilation did not reach the overlap target after {0} iterations")]
    NonConvergence(usize),

    /// `--sections` must be at least 1.
    #[error("number of sections must be at least 1")]
    InvalidSections,

    /// Only 2D and 3D volumes are supported by the component labeling.
    #[error("expected a {expected}D volume, got {found}D")]
    WrongDimensionality { expected: String, found: usize },
}
