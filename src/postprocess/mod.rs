//! Post-processing pipeline (spec.md §4.5): applied after every pass,
//! writing a new BGRA8 front buffer from the linear HDR sum buffer.

pub mod bloom;
pub mod dither;
pub mod lut;
pub mod tonemap;

use bloom::{BloomParams, BloomState};
use lut::{LutParams, PostprocessLut};

use crate::color::raycolor::Tristimulus;
use crate::film::block::Block;
use crate::math::{RandGen, Vec3};

#[derive(Clone, Copy, Debug)]
pub struct PostprocessParams {
    pub exposure: f64,
    pub film_grain_sigma: f64,
    pub lut: LutParams,
}

impl Default for PostprocessParams {
    fn default() -> Self {
        PostprocessParams {
            exposure: 0.0,
            film_grain_sigma: 0.0,
            lut: LutParams::default(),
        }
    }
}

impl PartialEq for PostprocessParams {
    fn eq(&self, other: &Self) -> bool {
        self.exposure == other.exposure
            && self.film_grain_sigma == other.film_grain_sigma
            && self.lut.size_shift == other.lut.size_shift
            && self.lut.min_value == other.lut.min_value
            && self.lut.max_value == other.lut.max_value
            && self.lut.tonemapper == other.lut.tonemapper
    }
}

/// Owns the LUT and bloom persistent state, and produces one BGRA8 front
/// buffer per pass. A params diff decides whether only active tiles or the
/// whole image needs reprocessing, and whether the LUT itself must be
/// rebuilt (spec.md §4.5, "LUT generation trigger").
pub struct Postprocessor {
    width: u32,
    height: u32,
    lut: PostprocessLut,
    bloom: BloomState,
    bloom_params: BloomParams,
    front_buffer: Vec<[u8; 4]>,
    lut_generation_required: bool,
    full_update_required: bool,
}

impl Postprocessor {
    pub fn new(width: u32, height: u32, params: &PostprocessParams) -> simple_error::SimpleResult<Self> {
        let lut = PostprocessLut::generate(&params.lut)?;
        let size = width as usize * height as usize;
        Ok(Postprocessor {
            width,
            height,
            lut,
            bloom: BloomState::new(width, height, 0),
            bloom_params: BloomParams::default(),
            front_buffer: vec![[0, 0, 0, 255]; size],
            lut_generation_required: false,
            full_update_required: true,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        let size = width as usize * height as usize;
        self.front_buffer = vec![[0, 0, 0, 255]; size];
        self.bloom.resize(width, height, self.bloom_params.elements.len());
        self.full_update_required = true;
    }

    /// Diff-compares `new_params` against the LUT currently loaded; marks
    /// `lutGenerationRequired` iff LUT inputs changed, `fullUpdateRequired`
    /// iff anything changed.
    pub fn set_params(&mut self, new_params: &PostprocessParams, old_params: &PostprocessParams) {
        let lut_changed = new_params.lut.size_shift != old_params.lut.size_shift
            || new_params.lut.min_value != old_params.lut.min_value
            || new_params.lut.max_value != old_params.lut.max_value
            || new_params.lut.tonemapper != old_params.lut.tonemapper
            || new_params.lut.grading.gain.x != old_params.lut.grading.gain.x
            || new_params.lut.grading.gain.y != old_params.lut.grading.gain.y
            || new_params.lut.grading.gain.z != old_params.lut.grading.gain.z
            || new_params.lut.grading.saturation != old_params.lut.grading.saturation
            || new_params.lut.grading.contrast != old_params.lut.grading.contrast;

        self.lut_generation_required |= lut_changed;
        self.full_update_required |= new_params != old_params;
    }

    pub fn set_bloom_params(&mut self, params: BloomParams) {
        self.bloom_params = params;
        self.full_update_required = true;
    }

    pub fn front_buffer(&self) -> &[[u8; 4]] {
        &self.front_buffer
    }

    /// Runs the per-pixel pipeline (spec.md §4.5 steps 1-8) over either the
    /// whole image (`fullUpdateRequired`, e.g. right after construction,
    /// resize, or a post-param change) or just `active_blocks` (spec.md:228)
    /// — the blocks the adaptive manager is still sampling, since a retired
    /// block's linear sum stops changing and its front-buffer pixels would
    /// reprocess to the same output. `sum_buffer` is the raw accumulation
    /// sum, `rng` drives film grain and dither.
    pub fn process(
        &mut self,
        sum_buffer: &[Tristimulus],
        passes_finished: u32,
        params: &PostprocessParams,
        rng: &mut RandGen,
        active_blocks: &[Block],
    ) -> simple_error::SimpleResult<()> {
        if self.lut_generation_required {
            self.lut = PostprocessLut::generate(&params.lut)?;
            self.lut_generation_required = false;
        }

        let bloom_contribution = if params_bloom_active(&self.bloom_params) {
            Some(self.bloom.update(sum_buffer, &self.bloom_params))
        } else {
            None
        };

        let divisor = 1.0 + passes_finished as f64;
        let exposure_scale = 2f64.powf(params.exposure);
        let width = self.width;

        let full_update = self.full_update_required;
        let indices: Box<dyn Iterator<Item = usize>> = if full_update {
            Box::new(0..sum_buffer.len())
        } else {
            Box::new(active_blocks.iter().flat_map(move |b| {
                (b.min_y..b.max_y).flat_map(move |y| (b.min_x..b.max_x).map(move |x| (y * width + x) as usize))
            }))
        };

        for i in indices {
            let raw = &sum_buffer[i];
            let mut color = raw.clamp_non_negative();
            if let Some(bloom) = &bloom_contribution {
                color = lerp_tristimulus(color, bloom[i], self.bloom_params.factor);
            }

            let mut linear = Vec3 { x: color.r as f64, y: color.g as f64, z: color.b as f64 };
            linear.x /= divisor;
            linear.y /= divisor;
            linear.z /= divisor;
            linear.x *= exposure_scale;
            linear.y *= exposure_scale;
            linear.z *= exposure_scale;

            if params.film_grain_sigma > 0.0 {
                let grain = 2f64.powf(params.film_grain_sigma * standard_normal(rng));
                linear.x *= grain;
                linear.y *= grain;
                linear.z *= grain;
            }

            let graded = self.lut.sample(linear);
            let packed = dither::pack_bgra8(graded, [
                rng.uniform_f64(), rng.uniform_f64(),
                rng.uniform_f64(), rng.uniform_f64(),
                rng.uniform_f64(), rng.uniform_f64(),
            ]);
            self.front_buffer[i] = packed;
        }

        self.full_update_required = false;
        Ok(())
    }
}

fn params_bloom_active(params: &BloomParams) -> bool {
    params.factor > 0.0 && !params.elements.is_empty()
}

fn lerp_tristimulus(a: Tristimulus, b: Tristimulus, t: f32) -> Tristimulus {
    a + (b - a) * t
}

/// Box-Muller, consuming two uniforms from `rng` for one N(0,1) sample.
fn standard_normal(rng: &mut RandGen) -> f64 {
    let u1 = rng.uniform_f64().max(1e-12);
    let u2 = rng.uniform_f64();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_runs_end_to_end() {
        let params = PostprocessParams::default();
        let mut post = Postprocessor::new(4, 4, &params).unwrap();
        let sum = vec![Tristimulus { r: 0.5, g: 0.5, b: 0.5 }; 16];
        let mut rng = RandGen::new(7);
        post.process(&sum, 1, &params, &mut rng, &[]).unwrap();
        assert_eq!(post.front_buffer().len(), 16);
    }

    #[test]
    fn lut_regeneration_flag_set_on_domain_change() {
        let params = PostprocessParams::default();
        let mut post = Postprocessor::new(2, 2, &params).unwrap();
        let mut changed = params;
        changed.lut.max_value *= 2.0;
        post.set_params(&changed, &params);
        assert!(post.lut_generation_required);
    }

    /// Once the first (full) update has run, a pass with `fullUpdateRequired
    /// == false` must only touch pixels inside `active_blocks` — everything
    /// else keeps whatever the previous pass wrote.
    #[test]
    fn process_without_full_update_only_touches_active_blocks() {
        let params = PostprocessParams::default();
        let mut post = Postprocessor::new(4, 4, &params).unwrap();
        let mut rng = RandGen::new(7);

        let dim_sum = vec![Tristimulus { r: 0.1, g: 0.1, b: 0.1 }; 16];
        post.process(&dim_sum, 1, &params, &mut rng, &[]).unwrap();
        let baseline = post.front_buffer().to_vec();

        // A much brighter sum buffer, but only the top-left 2x2 block is
        // "active" this pass.
        let bright_sum = vec![Tristimulus { r: 10.0, g: 10.0, b: 10.0 }; 16];
        let active = [Block { min_x: 0, max_x: 2, min_y: 0, max_y: 2 }];
        post.process(&bright_sum, 2, &params, &mut rng, &active).unwrap();

        for y in 0..4u32 {
            for x in 0..4u32 {
                let i = (y * 4 + x) as usize;
                let in_active = x < 2 && y < 2;
                if in_active {
                    assert_ne!(post.front_buffer()[i], baseline[i], "active pixel ({x},{y}) should update");
                } else {
                    assert_eq!(post.front_buffer()[i], baseline[i], "inactive pixel ({x},{y}) must be untouched");
                }
            }
        }
    }
}
