use nalgebra::Matrix4;
use std::fmt;

// set up enums and structs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Direction {
    X,
    Y,
    Z,
}

impl Direction {
    pub fn to_usize(&self) -> usize {
        match self {
            Direction::X => 0,
            Direction::Y => 1,
            Direction::Z => 2,
        }
    }
    pub fn from_usize(val: usize) -> Self {
        match val {
            0 => Direction::X,
            1 => Direction::Y,
            2 => Direction::Z,
            _ => unreachable!(),
        }
    }
}
impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::X => write!(f, "0"),
            Direction::Y => write!(f, "1"),
            Direction::Z => write!(f, "2"),
        }
    }
}

/// The coordinate frame in which a parcel's point cloud is expressed.
///
/// The frame only affects the principal-axis computation; section labels
/// are always written back at the original voxel indices.
#[derive(Debug, Clone)]
pub enum CoordinateFrame {
    /// Voxel indices scaled by the voxel size in mm (header `pixdim`).
    Voxel([f64; 3]),
    /// Voxel indices mapped through the affine into world coordinates.
    World(Matrix4<f64>),
}
