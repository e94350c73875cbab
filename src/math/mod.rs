//! Mathematical utilities for 2D bone transforms

pub mod angle;
pub mod transform;

pub use angle::{lerp_angle, shortest_delta, wrap_angle, Angle, Lerp};
pub use transform::{bone_affine, compose, Transform2D};
