//! Light tracer (spec.md §4.3.d): traces paths starting from light sources
//! and splats radiance directly onto the film via connect-to-camera.
//! Contributes nothing for directly visible specular surfaces, since those
//! can only be seen by chance through a camera-ray hit, which this
//! integrator never performs.

use super::{russian_roulette, Integrator, PathState, RenderParam, RenderingContext, COS_EPSILON};
use crate::color::raycolor::RayColor;
use crate::math::{Ray, Vec2};

pub struct LightTracer;

/// Connects `vertex` to the camera: projects it, shadow-tests, and splats
/// `throughput * bsdf * G / (cameraPdf * lightPathPdf)` (spec.md §4.3.d).
/// Shared by the light tracer and VCM's light-path pass.
pub fn connect_to_camera(
    shading: &crate::external::ShadingData,
    outgoing: crate::math::Vec3<f64>,
    throughput: RayColor,
    light_path_pdf: f64,
    material: &dyn crate::external::Bsdf,
    param: &RenderParam<'_>,
    ctx: &mut RenderingContext,
) {
    let (film_coord, camera_pdf) = match param.camera.project(shading.frame.position) {
        Some(p) => p,
        None => return,
    };
    if camera_pdf <= 0.0 || light_path_pdf <= 0.0 {
        return;
    }

    let camera_ray_origin = param.camera.generate_ray(film_coord, ctx.time).ray.org;
    let delta = camera_ray_origin - shading.frame.position;
    if delta.length2() <= 0.0 {
        return;
    }
    let distance = delta.length();
    let to_camera = delta.normalize();
    let cos_theta = shading.frame.normal.dot(to_camera);
    if cos_theta.abs() <= COS_EPSILON {
        return;
    }

    let shadow_ray = Ray::new(shading.frame.position, to_camera, ctx.time);
    ctx.counters.num_shadow_rays += 1;
    if param.scene.occluded(&shadow_ray, distance * (1.0 - 1e-4)) {
        return;
    }

    let eval = material.evaluate(shading, outgoing, to_camera);
    let contribution = (throughput * eval.color)
        .scale((cos_theta.abs() / (camera_pdf * light_path_pdf)) as f32);

    let mut rng = crate::math::RandGen::new(ctx.rng.uniform_u32() as u64);
    param.film.accumulate_sub_pixel(
        film_coord,
        crate::color::raycolor::convert_to_tristimulus(contribution, &ctx.wavelength),
        &mut rng,
    );
}

/// Traces a single emitted light path, splatting every non-delta-material
/// hit onto the film via [`connect_to_camera`].
fn trace_one_path(param: &RenderParam<'_>, ctx: &mut RenderingContext) {
    let pick = match param.scene.pick_light(ctx.sampler.get_float()) {
        Some(p) => p,
        None => return,
    };

    // Sample an origin on the light via a zero-distance "self sample";
    // concrete light shapes expose this through the same `sample`
    // entry point used for NEE, seeded from the light's own reference
    // frame (the coordinate conventions live with the light).
    let origin_sample = pick.light.sample(crate::math::Vec3 { x: 0.0, y: 0.0, z: 0.0 }, ctx.sampler.get_vec2());
    if origin_sample.pdf <= 0.0 {
        return;
    }
    let light_path_pdf = origin_sample.pdf * pick.pick_pdf;

    let ray = Ray::new(
        crate::math::Vec3 { x: 0.0, y: 0.0, z: 0.0 },
        origin_sample.direction,
        ctx.time,
    );
    let mut state = PathState::new(ray);
    state.throughput = origin_sample.radiance.scale(1.0 / light_path_pdf as f32);

    // `max_ray_depth == 0` still traces the primary emitted ray (and any
    // non-delta hit it connects to the camera via NEE) but samples no
    // further bounce; `.max(1)` keeps that one pass running without
    // special-casing the loop body (spec.md's "maxDepth = 0" edge case).
    while state.depth <= param.params.max_ray_depth.max(1) {
        ctx.counters.num_rays += 1;
        let hit = param.scene.trace(&state.ray);
        if !hit.is_hit() {
            break;
        }

        let isect = param.scene.evaluate_intersection(&state.ray, &hit, ctx.time);
        let shading = param.scene.evaluate_shading_data(&isect);
        let outgoing = -state.ray.dir;

        if !isect.material.is_delta() {
            connect_to_camera(
                &shading,
                outgoing,
                state.throughput,
                light_path_pdf,
                isect.material,
                param,
                ctx,
            );
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

        state.ray = Ray::new(shading.frame.position, sample.incoming_dir, ctx.time);
        state.depth += 1;
    }
}

impl Integrator for LightTracer {
    fn render_pixel(
        &self,
        _film_coord: Vec2<f64>,
        param: &RenderParam<'_>,
        ctx: &mut RenderingContext,
    ) -> RayColor {
        // `light_path_count_multiplier` paths per camera-pixel call, on
        // average: the whole part traces unconditionally, and the
        // fractional remainder traces with matching probability so the
        // expected path count stays an unbiased estimator for non-integer
        // multipliers (spec.md's per-pixel budget carries over exactly when
        // the multiplier is 1.0, the default).
        let requested = param.params.light_path_count_multiplier.max(0.0);
        let whole = requested.floor() as u32;
        for _ in 0..whole {
            trace_one_path(param, ctx);
        }
        let fractional = requested - whole as f64;
        if fractional > 0.0 && ctx.sampler.get_float() < fractional {
            trace_one_path(param, ctx);
        }

        // Light tracer never returns a per-pixel color: all contribution is
        // splatted directly via `connect_to_camera`.
        RayColor::zero()
    }

    fn name(&self) -> &'static str {
        "LightTracer"
    }
}

impl Clone for LightTracer {
    fn clone(&self) -> Self {
        LightTracer
    }
}
