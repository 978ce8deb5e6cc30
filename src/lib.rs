//! `lumen_rt`: a progressive, tiled CPU path-tracing core. Owns the film,
//! adaptive block scheduler, sampler/color machinery, light-transport
//! integrators, and post-processing pipeline; geometry, acceleration
//! structures, and material bodies are supplied by a host through the
//! [`external`] traits.

pub mod color;
pub mod counters;
pub mod external;
pub mod film;
pub mod integrator;
pub mod math;
pub mod postprocess;
pub mod sampler;
pub mod threading;
pub mod viewport;

#[cfg(feature = "testutil")]
pub mod testutil;

pub use external::{Bsdf, Camera, Light, Scene};
pub use viewport::Viewport;
