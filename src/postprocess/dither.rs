//! Triangular-PDF dither (spec.md §4.5 step 7): blends two uniforms with a
//! triangular weighting that concentrates noise in the midtones and goes
//! uniform near 0/1, avoiding banding when packing to 8 bits.

/// `s = 255`; `t = min(2*s*c, 2*s*(1-c))`, blended between the two
/// uniforms `u0, u1 ∈ [0,1)`, then divided back by `s` to land in 1/255
/// steps.
pub fn dither_channel(c: f64, u0: f64, u1: f64) -> f64 {
    const S: f64 = 255.0;
    let t = (2.0 * S * c).min(2.0 * S * (1.0 - c)).clamp(0.0, 1.0);
    let noise = u0 * (1.0 - t) + u1 * t - 0.5;
    (c + noise / S).clamp(0.0, 1.0)
}

/// Packs an already display-gamma `(r,g,b)` triple to `BGRA8`, dithering
/// each channel independently with its own uniform pair.
pub fn pack_bgra8(color: crate::math::Vec3<f64>, uniforms: [f64; 6]) -> [u8; 4] {
    let r = dither_channel(color.x, uniforms[0], uniforms[1]);
    let g = dither_channel(color.y, uniforms[2], uniforms[3]);
    let b = dither_channel(color.z, uniforms[4], uniforms[5]);
    [
        (b * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (r * 255.0).round() as u8,
        255,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dither_stays_in_unit_range() {
        for i in 0..10 {
            let c = i as f64 / 9.0;
            let v = dither_channel(c, 0.1, 0.9);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn pack_is_bgra_ordered() {
        let packed = pack_bgra8(crate::math::Vec3 { x: 1.0, y: 0.0, z: 0.0 }, [0.5; 6]);
        assert_eq!(packed[2], 255); // R channel at index 2
        assert_eq!(packed[3], 255); // alpha
    }
}
