//! Small, self-contained math kernels shared by every subsystem.
//!
//! These are intentionally hand-rolled rather than pulled from a SIMD math
//! crate: per the implementation budget, SIMD math kernels are assumed to be
//! provided by the host toolchain and aren't part of this core.

pub mod numbers;
pub mod random;
pub mod ray;
pub mod util;
pub mod vector;

pub use random::RandGen;
pub use ray::Ray;
pub use vector::{Vec2, Vec3};
