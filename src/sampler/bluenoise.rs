//! Per-pixel Cranley-Patterson rotation used to decorrelate neighboring
//! pixels while preserving each pixel's own stratification.
//!
//! The source renderer ships a precomputed blue-noise texture asset for
//! this; asset loading is out of this crate's scope (spec.md §1), so the
//! per-pixel rotation value is instead derived from a low-discrepancy R2
//! sequence (Martin Roberts' generalization of the golden ratio to 2D),
//! which is the standard stand-in when no blue-noise tile is available and
//! shares blue noise's goal of even high-frequency coverage across pixels.

/// Golden-ratio-derived 2D low-discrepancy constants (R2 sequence).
const R2_ALPHA_X: f64 = 0.754_877_666_246_692_8;
const R2_ALPHA_Y: f64 = 0.569_840_290_998_638_1;

fn tile_value_bits(x: u32, y: u32, sample_index: u32) -> u32 {
    let u = ((x as f64 * R2_ALPHA_X + y as f64 * R2_ALPHA_Y + sample_index as f64 * 0.618_033_988_75)
        .fract())
    .abs();
    (u * u32::MAX as f64) as u32
}

/// XORs the fixed-point representation of `u` with the per-pixel blue-noise
/// tile value, then converts back to `[0, 1)` — the "Cranley-Patterson
/// rotation" of spec.md §4.4.
pub fn cranley_patterson_xor(u: f64, x: u32, y: u32, sample_index: u32) -> f64 {
    let bits = (u.clamp(0.0, 1.0) * u32::MAX as f64) as u32;
    let rotated = bits ^ tile_value_bits(x, y, sample_index);
    rotated as f64 / u32::MAX as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_in_unit_range() {
        for i in 0..100u32 {
            let v = cranley_patterson_xor(0.37, i, i * 3, i);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn differs_across_neighboring_pixels() {
        let a = cranley_patterson_xor(0.5, 10, 10, 0);
        let b = cranley_patterson_xor(0.5, 11, 10, 0);
        assert_ne!(a, b);
    }
}
