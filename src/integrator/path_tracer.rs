//! Naive unidirectional path tracer (spec.md §4.3.b). Correct only for
//! scenes whose lights are area lights or environments — it cannot sample
//! delta (point/directional) lights, since it never performs NEE.

use super::{russian_roulette, Integrator, PathState, RenderParam, RenderingContext};
use crate::color::raycolor::RayColor;
use crate::math::Vec2;

pub struct PathTracer;

impl Integrator for PathTracer {
    fn render_pixel(
        &self,
        film_coord: Vec2<f64>,
        param: &RenderParam<'_>,
        ctx: &mut RenderingContext,
    ) -> RayColor {
        let generated = param.camera.generate_ray(film_coord, ctx.time);
        let mut state = PathState::new(generated.ray);
        let mut radiance = RayColor::zero();

        // `max_ray_depth == 0` still traces the primary ray and collects
        // its emission, but samples no bounce (spec.md's "maxDepth = 0"
        // edge case); `.max(1)` keeps that one pass running.
        while state.depth <= param.params.max_ray_depth.max(1) {
            ctx.counters.num_rays += 1;
            let hit = param.scene.trace(&state.ray);

            if !hit.is_hit() {
                for light in param.scene.global_lights() {
                    radiance += state.throughput * light.evaluate(state.ray.dir, &hit);
                }
                break;
            }

            if let Some(light) = param.scene.light_for_hit(&hit) {
                radiance += state.throughput * light.evaluate(state.ray.dir, &hit);
                break;
            }

            let isect = param.scene.evaluate_intersection(&state.ray, &hit, ctx.time);
            let shading = param.scene.evaluate_shading_data(&isect);
            let outgoing = -state.ray.dir;

            ctx.counters.num_bsdf_samples += 1;
            let u = ctx.sampler.get_vec2();
            let sample = match isect.material.sample(&shading, outgoing, u) {
                Some(s) => s,
                None => break,
            };

            if sample.pdf.is_finite() && sample.pdf > 0.0 {
                state.throughput = state.throughput * sample.color.scale((1.0 / sample.pdf) as f32);
            } else {
                state.throughput = state.throughput * sample.color;
            }
            if !state.throughput.is_valid() {
                break;
            }

            let rr_u = ctx.sampler.get_float();
            match russian_roulette(
                state.throughput,
                state.depth,
                param.params.min_russian_roulette_depth,
                rr_u,
            ) {
                Some(q) => state.throughput = state.throughput.scale(1.0 / q),
                None => break,
            }

            state.ray = crate::math::Ray::new(shading.frame.position, sample.incoming_dir, ctx.time);
            state.last_event = sample.event;
            state.last_specular = sample.event.is_specular();
            state.depth += 1;
        }

        radiance.clamp_non_negative()
    }

    fn name(&self) -> &'static str {
        "PathTracer"
    }
}

impl Clone for PathTracer {
    fn clone(&self) -> Self {
        PathTracer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_itself() {
        assert_eq!(PathTracer.name(), "PathTracer");
    }
}
