//! Radiance carriers: hero-wavelength spectra or plain tristimulus color,
//! selected at compile time via the `spectral` feature (see crate root).
//!
//! This mirrors the teacher's `spectrum.rs`, which stored a fixed-size
//! `Spectrum<T>` sample array; here the sample count is a const generic so
//! the tristimulus (`N = 3`) and spectral (`N = NUM_HERO_WAVELENGTHS`)
//! flavors share one implementation instead of two copy-pasted types.

pub mod raycolor;
pub mod wavelength;

pub use raycolor::RayColor;
pub use wavelength::Wavelength;

/// Number of hero wavelengths carried per ray in spectral builds.
pub const NUM_HERO_WAVELENGTHS: usize = 8;

/// `RayColor` component count for the active build: 8 spectral samples
/// under the `spectral` feature, 3 tristimulus channels otherwise.
#[cfg(feature = "spectral")]
pub const NUM_COMPONENTS: usize = NUM_HERO_WAVELENGTHS;
#[cfg(not(feature = "spectral"))]
pub const NUM_COMPONENTS: usize = 3;

pub const SPECTRUM_LAMBDA_MIN: f64 = 360.0;
pub const SPECTRUM_LAMBDA_MAX: f64 = 830.0;
