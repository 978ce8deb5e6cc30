//! Tonemap operators (spec.md §4.5): all operate in linear and produce
//! display-gamma output; `Clamped` and `Reinhard` finish with an explicit
//! sRGB encode, the filmic curves already approximate one.

use crate::math::Vec3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tonemapper {
    Clamped,
    Reinhard,
    FilmicHejlBurgessDawson,
    ApproxAces,
}

fn srgb_encode(c: f64) -> f64 {
    if c <= 0.0031308 {
        12.92 * c
    } else {
        1.055 * c.max(0.0).powf(1.0 / 2.4) - 0.055
    }
}

fn apply_channel(op: Tonemapper, c: f64) -> f64 {
    match op {
        Tonemapper::Clamped => srgb_encode(c.clamp(0.0, 1.0)),
        Tonemapper::Reinhard => srgb_encode((c / (1.0 + c)).clamp(0.0, 1.0)),
        Tonemapper::FilmicHejlBurgessDawson => {
            let x = (c - 0.004).max(0.0);
            (x * (6.2 * x + 0.5)) / (x * (6.2 * x + 1.7) + 0.06)
        }
        Tonemapper::ApproxAces => {
            const A: f64 = 2.51;
            const B: f64 = 0.03;
            const C: f64 = 2.43;
            const D: f64 = 0.59;
            const E: f64 = 0.14;
            ((c * (A * c + B)) / (c * (C * c + D) + E)).clamp(0.0, 1.0)
        }
    }
}

impl Tonemapper {
    pub fn apply(&self, color: Vec3<f64>) -> Vec3<f64> {
        Vec3 {
            x: apply_channel(*self, color.x),
            y: apply_channel(*self, color.y),
            z: apply_channel(*self, color.z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_maps_zero_and_one() {
        let black = Tonemapper::Clamped.apply(Vec3 { x: 0.0, y: 0.0, z: 0.0 });
        assert_eq!(black.x, 0.0);
        let white = Tonemapper::Clamped.apply(Vec3 { x: 1.0, y: 1.0, z: 1.0 });
        assert!((white.x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn reinhard_compresses_highlights() {
        let bright = Tonemapper::Reinhard.apply(Vec3 { x: 100.0, y: 100.0, z: 100.0 });
        assert!(bright.x <= 1.0);
    }

    #[test]
    fn aces_output_stays_in_unit_range_for_high_input() {
        let hdr = Tonemapper::ApproxAces.apply(Vec3 { x: 50.0, y: 50.0, z: 50.0 });
        assert!((0.0..=1.0).contains(&hdr.x));
    }
}
