//! Path tracer with multiple importance sampling and next-event estimation
//! (spec.md §4.3.c).

use super::{russian_roulette, Integrator, PathState, RenderParam, RenderingContext, COS_EPSILON};
use crate::color::raycolor::RayColor;
use crate::math::util::power_heuristic;
use crate::math::{Ray, Vec2};

pub struct PathTracerMis {
    pub power_heuristic_beta: f64,
}

impl Default for PathTracerMis {
    fn default() -> Self {
        PathTracerMis { power_heuristic_beta: 2.0 }
    }
}

impl PathTracerMis {
    /// Next-event estimation at one camera-path vertex: pick a light
    /// uniformly, sample it, shadow-test, evaluate both pdfs, and weight
    /// with the power heuristic (β=1 for the light-sampling term, per the
    /// teacher's VCM-shared implementation).
    fn sample_direct_light(
        &self,
        shading: &crate::external::ShadingData,
        outgoing: crate::math::Vec3<f64>,
        param: &RenderParam<'_>,
        ctx: &mut RenderingContext,
        material: &dyn crate::external::Bsdf,
    ) -> RayColor {
        let pick = match param.scene.pick_light(ctx.sampler.get_float()) {
            Some(p) => p,
            None => return RayColor::zero(),
        };
        let u = ctx.sampler.get_vec2();
        let sample = pick.light.sample(shading.frame.position, u);
        if sample.pdf <= 0.0 || sample.radiance.is_black() {
            return RayColor::zero();
        }

        let cos_theta = shading.frame.normal.dot(sample.direction);
        if cos_theta.abs() <= COS_EPSILON {
            return RayColor::zero();
        }

        let shadow_ray = Ray::new(shading.frame.position, sample.direction, ctx.time);
        ctx.counters.num_shadow_rays += 1;
        if param.scene.occluded(&shadow_ray, sample.distance * (1.0 - 1e-4)) {
            return RayColor::zero();
        }

        let eval = material.evaluate(shading, outgoing, sample.direction);
        let light_pdf = sample.pdf * pick.pick_pdf;

        let weight = if sample.is_delta {
            1.0
        } else {
            power_heuristic(1.0, light_pdf, eval.forward_pdf)
        };

        (eval.color * sample.radiance).scale((weight * cos_theta.abs() / light_pdf) as f32)
    }
}

impl Integrator for PathTracerMis {
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
                    let emission = light.evaluate(state.ray.dir, &hit);
                    let weight = if state.last_specular {
                        1.0
                    } else {
                        let light_pdf = light.pdf(state.ray.org, state.ray.dir);
                        power_heuristic(self.power_heuristic_beta, state.last_pdf_w, light_pdf)
                    };
                    radiance += state.throughput * emission.scale(weight as f32);
                }
                break;
            }

            if let Some(light) = param.scene.light_for_hit(&hit) {
                let emission = light.evaluate(state.ray.dir, &hit);
                let weight = if state.last_specular || state.depth == 1 {
                    1.0
                } else {
                    let light_pdf = light.pdf(state.ray.org, state.ray.dir);
                    power_heuristic(self.power_heuristic_beta, state.last_pdf_w, light_pdf)
                };
                radiance += state.throughput * emission.scale(weight as f32);
                break;
            }

            let isect = param.scene.evaluate_intersection(&state.ray, &hit, ctx.time);
            let shading = param.scene.evaluate_shading_data(&isect);
            let outgoing = -state.ray.dir;

            if !isect.material.is_delta() {
                let direct = self.sample_direct_light(&shading, outgoing, param, ctx, isect.material);
                radiance += state.throughput * direct;
            }

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

            state.last_pdf_w = sample.pdf;
            state.last_specular = sample.event.is_specular();
            state.last_event = sample.event;
            state.ray = Ray::new(shading.frame.position, sample.incoming_dir, ctx.time);
            state.depth += 1;
        }

        radiance.clamp_non_negative()
    }

    fn name(&self) -> &'static str {
        "PathTracerMIS"
    }
}

impl Clone for PathTracerMis {
    fn clone(&self) -> Self {
        PathTracerMis { power_heuristic_beta: self.power_heuristic_beta }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_beta_two() {
        assert_eq!(PathTracerMis::default().power_heuristic_beta, 2.0);
    }
}
