//! Stateless debug renderer (spec.md §4.3.a): returns a deterministic color
//! derived straight from the hit, with no light transport at all.

use super::{Integrator, RenderParam, RenderingContext};
use crate::color::raycolor::RayColor;
use crate::math::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugMode {
    TriangleId,
    Normal,
    Tangent,
    Position,
    Depth,
    BaseColor,
    Emission,
    Roughness,
    Metalness,
    Ior,
}

pub struct DebugRenderer {
    pub mode: DebugMode,
    pub max_depth: f64,
}

impl DebugRenderer {
    pub fn new(mode: DebugMode, max_depth: f64) -> Self {
        DebugRenderer { mode, max_depth }
    }
}

/// 64-bit hash of `(objectId << 32) | subObjectId`, folded to HSV with
/// `hue = low32 / 2^32`, `saturation = 0.5 + 0.5 * high32 / 2^32`.
fn triangle_id_color(object_id: u32, sub_object_id: u32) -> RayColor {
    let key = ((object_id as u64) << 32) | sub_object_id as u64;
    let h = splitmix64(key);
    let low = (h & 0xFFFF_FFFF) as f64 / u32::MAX as f64;
    let high = (h >> 32) as f64 / u32::MAX as f64;
    let hue = low;
    let sat = 0.5 + 0.5 * high;
    let (r, g, b) = hsv_to_rgb(hue, sat, 1.0);
    RayColor::from_fn(|i| match i {
        0 => r as f32,
        1 => g as f32,
        _ => b as f32,
    })
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    let i = (h * 6.0).floor();
    let f = h * 6.0 - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    match (i as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

fn vec3_to_color(v: crate::math::Vec3<f64>) -> RayColor {
    RayColor::from_fn(|i| match i {
        0 => (v.x * 0.5 + 0.5) as f32,
        1 => (v.y * 0.5 + 0.5) as f32,
        _ => (v.z * 0.5 + 0.5) as f32,
    })
}

impl Integrator for DebugRenderer {
    fn render_pixel(
        &self,
        film_coord: Vec2<f64>,
        param: &RenderParam<'_>,
        ctx: &mut RenderingContext,
    ) -> RayColor {
        let ray = param.camera.generate_ray(film_coord, ctx.time).ray;
        ctx.counters.num_rays += 1;
        let hit = param.scene.trace(&ray);
        if !hit.is_hit() {
            return RayColor::zero();
        }

        match self.mode {
            DebugMode::TriangleId => triangle_id_color(hit.object_id, hit.sub_object_id),
            DebugMode::Depth => {
                let d = (hit.distance.max(1e-6).ln() / self.max_depth.max(1e-6).ln()).clamp(0.0, 1.0);
                RayColor::splat(d as f32)
            }
            DebugMode::Normal | DebugMode::Tangent | DebugMode::Position | DebugMode::BaseColor
            | DebugMode::Emission | DebugMode::Roughness | DebugMode::Metalness | DebugMode::Ior => {
                let isect = param.scene.evaluate_intersection(&ray, &hit, ctx.time);
                let shading = param.scene.evaluate_shading_data(&isect);
                match self.mode {
                    DebugMode::Normal => vec3_to_color(shading.frame.normal),
                    DebugMode::Tangent => vec3_to_color(shading.frame.tangent),
                    DebugMode::Position => vec3_to_color(shading.frame.position),
                    DebugMode::BaseColor => shading.base_color,
                    DebugMode::Emission => shading.emission,
                    DebugMode::Roughness => RayColor::splat(shading.roughness),
                    DebugMode::Metalness => RayColor::splat(shading.metalness),
                    DebugMode::Ior => RayColor::splat((shading.ior / 3.0).clamp(0.0, 1.0)),
                    DebugMode::TriangleId | DebugMode::Depth => unreachable!(),
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "Debug"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_id_color_is_deterministic() {
        let a = triangle_id_color(7, 3);
        let b = triangle_id_color(7, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn triangle_id_color_varies_with_input() {
        let a = triangle_id_color(7, 3);
        let b = triangle_id_color(7, 4);
        assert_ne!(a, b);
    }

    #[test]
    fn hsv_to_rgb_pure_hues() {
        let (r, g, b) = hsv_to_rgb(0.0, 1.0, 1.0);
        assert!((r - 1.0).abs() < 1e-9 && g < 1e-9 && b < 1e-9);
    }
}
