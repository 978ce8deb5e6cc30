//! Per-pixel sample generation: a Halton low-discrepancy sequence feeding a
//! per-pass seed, and a [`GenericSampler`] that turns that seed plus pixel
//! coordinates into a reproducible, decorrelated stream of floats.
//!
//! Grounded in the teacher's `sampler.rs`/`sampler/mod.rs` trait shape
//! (`start_pixel`, `get_1d`/`get_2d`) but reworked to match spec.md §4.4:
//! a single concrete sampler pair rather than a closed set of
//! polymorphic sampler strategies.

pub mod bluenoise;
pub mod halton;

pub use halton::HaltonSequence;

use crate::math::{RandGen, Vec2, Vec3};

/// Per-pixel sampler driving both the integrators and the viewport's own
/// one-off draws (pixel offset, time-of-sample, wavelength hero offset).
///
/// `reset_frame` is called once per pass by each thread-local context;
/// `reset_pixel` reseeds deterministically so that
/// `(passSeed, x, y, sampleIndex)` alone determines every value drawn
/// thereafter, independent of which worker thread executes the pixel
/// (spec.md §5, "Ordering guarantees").
pub struct GenericSampler {
    seeds: Vec<u64>,
    use_blue_noise: bool,
    rng: RandGen,
    pixel: Vec2<u32>,
    sample_index: u32,
}

impl GenericSampler {
    pub fn new() -> Self {
        GenericSampler {
            seeds: Vec::new(),
            use_blue_noise: false,
            rng: RandGen::new_default(),
            pixel: Vec2 { x: 0, y: 0 },
            sample_index: 0,
        }
    }

    /// Copies the per-pass seed vector produced by
    /// `HaltonSequence::next_leap` into this thread-local sampler.
    pub fn reset_frame(&mut self, seeds: &[u64], use_blue_noise_dithering: bool) {
        self.seeds.clear();
        self.seeds.extend_from_slice(seeds);
        self.use_blue_noise = use_blue_noise_dithering;
    }

    /// Reseeds for a specific pixel: every sample drawn afterwards depends
    /// only on `(seeds, x, y)`, never on thread id or scheduling order.
    pub fn reset_pixel(&mut self, x: u32, y: u32) {
        self.pixel = Vec2 { x, y };
        self.sample_index = 0;
        let pixel_hash = (x as u64).wrapping_mul(0x9E3779B97F4A7C15) ^ (y as u64).wrapping_mul(0xC2B2AE3D27D4EB4F);
        let seed_fold = self
            .seeds
            .iter()
            .fold(0u64, |acc, &s| acc ^ s.wrapping_mul(0xFF51AFD7ED558CCD));
        self.rng = RandGen::new(pixel_hash ^ seed_fold);
    }

    fn next_u01(&mut self) -> f64 {
        let u = self.rng.uniform_f64();
        self.sample_index = self.sample_index.wrapping_add(1);
        if self.use_blue_noise {
            bluenoise::cranley_patterson_xor(u, self.pixel.x, self.pixel.y, self.sample_index)
        } else {
            u
        }
    }

    pub fn get_float(&mut self) -> f64 {
        self.next_u01()
    }

    pub fn get_vec2(&mut self) -> Vec2<f64> {
        Vec2 {
            x: self.next_u01(),
            y: self.next_u01(),
        }
    }

    pub fn get_float3(&mut self) -> Vec3<f64> {
        Vec3 {
            x: self.next_u01(),
            y: self.next_u01(),
            z: self.next_u01(),
        }
    }
}

impl Default for GenericSampler {
    fn default() -> Self {
        Self::new()
    }
}
