//! The tonemapping LUT (spec.md §4.5 "Tonemapping LUT"): a precomputed 3D
//! color-grading + tonemap table in log-spaced domain, stored in `half`
//! precision and sampled trilinearly at runtime.

use super::tonemap::Tonemapper;
use crate::math::Vec3;
use half::f16;
use simple_error::{bail, SimpleResult};

#[derive(Clone, Copy, Debug)]
pub struct ColorGradingParams {
    pub gain: Vec3<f64>,
    pub saturation: f64,
    pub contrast: f64,
    pub log_midpoint: f64,
    pub negate: bool,
}

impl Default for ColorGradingParams {
    fn default() -> Self {
        ColorGradingParams {
            gain: Vec3 { x: 1.0, y: 1.0, z: 1.0 },
            saturation: 1.0,
            contrast: 1.0,
            log_midpoint: 0.18,
            negate: false,
        }
    }
}

/// `gain -> saturation -> contrast -> tonemap -> optional negate`
/// (spec.md §4.5, "Color-grading pipeline").
pub fn grade_and_tonemap(color: Vec3<f64>, grading: &ColorGradingParams, tonemapper: Tonemapper) -> Vec3<f64> {
    let gained = Vec3 {
        x: color.x * grading.gain.x,
        y: color.y * grading.gain.y,
        z: color.z * grading.gain.z,
    };

    let luma = gained.x * 0.2126 + gained.y * 0.7152 + gained.z * 0.0722;
    let saturated = Vec3 {
        x: luma + (gained.x - luma) * grading.saturation,
        y: luma + (gained.y - luma) * grading.saturation,
        z: luma + (gained.z - luma) * grading.saturation,
    };

    let contrast_channel = |c: f64| {
        let c = c.max(1e-6);
        (c.ln() * grading.contrast + grading.log_midpoint.max(1e-6).ln() * (1.0 - grading.contrast)).exp()
    };
    let contrasted = Vec3 {
        x: contrast_channel(saturated.x),
        y: contrast_channel(saturated.y),
        z: contrast_channel(saturated.z),
    };

    let tonemapped = tonemapper.apply(contrasted);

    if grading.negate {
        Vec3 { x: 1.0 - tonemapped.x, y: 1.0 - tonemapped.y, z: 1.0 - tonemapped.z }
    } else {
        tonemapped
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LutParams {
    pub size_shift: u32,
    pub min_value: f64,
    pub max_value: f64,
    pub grading: ColorGradingParams,
    pub tonemapper: Tonemapper,
}

impl LutParams {
    pub fn validate(&self) -> SimpleResult<()> {
        if !(1..=8).contains(&self.size_shift) {
            bail!("LUT sizeShift must be in [1,8], got {}", self.size_shift);
        }
        if self.min_value <= 0.0 || self.max_value <= 0.0 {
            bail!("LUT min/max must be positive");
        }
        if self.min_value >= self.max_value {
            bail!("LUT minValue must be < maxValue");
        }
        Ok(())
    }
}

impl Default for LutParams {
    fn default() -> Self {
        LutParams {
            size_shift: 5,
            min_value: 1.0 / 4096.0,
            max_value: 64.0,
            grading: ColorGradingParams::default(),
            tonemapper: Tonemapper::ApproxAces,
        }
    }
}

/// Half-precision 3D LUT: `side^3` half4 voxels (alpha channel unused but
/// kept to match the `half4` storage of the source renderer).
pub struct PostprocessLut {
    side: usize,
    scale: f64,
    bias: f64,
    voxels: Vec<[f16; 4]>,
}

impl PostprocessLut {
    pub fn generate(params: &LutParams) -> SimpleResult<Self> {
        params.validate()?;
        let side = 1usize << params.size_shift;
        let scale = 1.0 / (params.max_value / params.min_value).log2();
        let bias = -scale * params.min_value.log2();

        let axis_value = |i: usize| -> f64 {
            2f64.powf(((i as f64 + 0.5) / side as f64 - bias) / scale)
        };

        let mut voxels = Vec::with_capacity(side * side * side);
        for bi in 0..side {
            for gi in 0..side {
                for ri in 0..side {
                    let linear = Vec3 { x: axis_value(ri), y: axis_value(gi), z: axis_value(bi) };
                    let graded = grade_and_tonemap(linear, &params.grading, params.tonemapper);
                    voxels.push([
                        f16::from_f64(graded.x),
                        f16::from_f64(graded.y),
                        f16::from_f64(graded.z),
                        f16::from_f64(1.0),
                    ]);
                }
            }
        }

        Ok(PostprocessLut { side, scale, bias, voxels })
    }

    pub fn side(&self) -> usize {
        self.side
    }

    fn voxel(&self, r: usize, g: usize, b: usize) -> Vec3<f64> {
        let idx = (b * self.side + g) * self.side + r;
        let v = self.voxels[idx];
        Vec3 { x: v[0].to_f64(), y: v[1].to_f64(), z: v[2].to_f64() }
    }

    /// `coord = scale * log2(color) + bias`, clamped to `[0, side-1]`,
    /// trilinearly sampled (spec.md §4.5).
    pub fn sample(&self, color: Vec3<f64>) -> Vec3<f64> {
        let to_coord = |c: f64| {
            let c = c.max(1e-8);
            (self.scale * c.log2() + self.bias) * self.side as f64 - 0.5
        };

        let coord = Vec3 { x: to_coord(color.x), y: to_coord(color.y), z: to_coord(color.z) };
        let max_idx = (self.side - 1) as f64;
        let cr = coord.x.clamp(0.0, max_idx);
        let cg = coord.y.clamp(0.0, max_idx);
        let cb = coord.z.clamp(0.0, max_idx);

        let r0 = cr.floor() as usize;
        let g0 = cg.floor() as usize;
        let b0 = cb.floor() as usize;
        let r1 = (r0 + 1).min(self.side - 1);
        let g1 = (g0 + 1).min(self.side - 1);
        let b1 = (b0 + 1).min(self.side - 1);
        let (fr, fg, fb) = (cr - r0 as f64, cg - g0 as f64, cb - b0 as f64);

        let lerp3 = |a: Vec3<f64>, b: Vec3<f64>, t: f64| Vec3 {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
            z: a.z + (b.z - a.z) * t,
        };

        let c00 = lerp3(self.voxel(r0, g0, b0), self.voxel(r1, g0, b0), fr);
        let c10 = lerp3(self.voxel(r0, g1, b0), self.voxel(r1, g1, b0), fr);
        let c01 = lerp3(self.voxel(r0, g0, b1), self.voxel(r1, g0, b1), fr);
        let c11 = lerp3(self.voxel(r0, g1, b1), self.voxel(r1, g1, b1), fr);
        let c0 = lerp3(c00, c10, fg);
        let c1 = lerp3(c01, c11, fg);
        lerp3(c0, c1, fb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_size_shift() {
        let mut p = LutParams::default();
        p.size_shift = 9;
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_min_gte_max() {
        let mut p = LutParams::default();
        p.min_value = 10.0;
        p.max_value = 1.0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn sample_stays_within_display_range() {
        let params = LutParams::default();
        let lut = PostprocessLut::generate(&params).unwrap();
        let out = lut.sample(Vec3 { x: 0.5, y: 0.5, z: 0.5 });
        assert!(out.x >= 0.0 && out.x <= 1.0001);
    }

    /// `generate`'s `axis_value` and `sample`'s `to_coord` must be algebraic
    /// inverses: the color stored for voxel `i` has to map back to
    /// coordinate `i`, not some unrelated point in log-space.
    #[test]
    fn axis_value_is_the_inverse_of_sample_coord() {
        let params = LutParams::default();
        let lut = PostprocessLut::generate(&params).unwrap();
        let side = lut.side();

        let to_coord = |c: f64| {
            let c = c.max(1e-8);
            (lut.scale * c.log2() + lut.bias) * side as f64 - 0.5
        };

        for &i in &[0usize, side / 2, side - 1] {
            let axis_value = 2f64.powf(((i as f64 + 0.5) / side as f64 - lut.bias) / lut.scale);
            let coord = to_coord(axis_value);
            assert!((coord - i as f64).abs() < 1e-6, "voxel {i} round-trips to coord {coord}, expected {i}");
        }
    }

    #[test]
    fn sample_at_grid_vertex_reproduces_generated_voxel() {
        let params = LutParams::default();
        let lut = PostprocessLut::generate(&params).unwrap();
        let side = lut.side();
        let i = side / 2;

        let axis_value = 2f64.powf(((i as f64 + 0.5) / side as f64 - lut.bias) / lut.scale);
        let sampled = lut.sample(Vec3 { x: axis_value, y: axis_value, z: axis_value });
        let voxel = lut.voxel(i, i, i);

        assert!((sampled.x - voxel.x).abs() < 1e-3, "{sampled:?} vs {voxel:?}");
        assert!((sampled.y - voxel.y).abs() < 1e-3, "{sampled:?} vs {voxel:?}");
        assert!((sampled.z - voxel.z).abs() < 1e-3, "{sampled:?} vs {voxel:?}");
    }
}
