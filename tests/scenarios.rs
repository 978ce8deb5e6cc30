//! Scenario tests from spec.md §8, run against the analytic test scene.
//! Scenario 6 (the film race test) already lives as a unit test next to
//! `Film` itself; it isn't repeated here.

#![cfg(feature = "testutil")]

use lumen_rt::color::raycolor::RayColor;
use lumen_rt::film::block::AdaptiveConfig;
use lumen_rt::integrator::path_tracer::PathTracer;
use lumen_rt::integrator::path_tracer_mis::PathTracerMis;
use lumen_rt::integrator::{Integrator, RenderParam, RenderingContext, RenderingParams};
use lumen_rt::math::Vec2;
use lumen_rt::testutil::{cornell_like_scene, furnace_scene};
use lumen_rt::threading::WorkerPool;
use lumen_rt::viewport::Viewport;

use std::sync::Mutex;

/// Scenario 2: a uniform white environment and an albedo-0.5 Lambertian
/// sphere. Energy conservation forces the sphere's measured radiance to
/// converge on `albedo * environment_radiance = 0.5`.
#[test]
fn furnace_test_converges_to_half_albedo() {
    let (scene, camera) = furnace_scene(1.0, 0.5);

    let mut viewport = Viewport::new(48, 48).unwrap();
    viewport.set_renderer(Box::new(PathTracer));
    let mut params = RenderingParams::default();
    params.max_ray_depth = 16;
    viewport.set_rendering_params(params).unwrap();

    const PASSES: u32 = 64;
    for _ in 0..PASSES {
        viewport.render(&scene, &camera).unwrap();
    }

    let sum = viewport.sum_buffer();
    let n = PASSES as f32;
    // Only the central pixels are guaranteed to hit the sphere; a ring
    // around the border sees nothing (background) and stays at zero.
    let center = sum[48 / 2 * 48 + 48 / 2];
    let measured = center.luminance() / n;
    assert!(
        (0.3..=0.7).contains(&measured),
        "expected furnace measurement near 0.5, got {measured}"
    );
}

/// Scenario 1 (smoke-scale): a Cornell-box-like scene with PathTracerMIS
/// should at minimum produce nonzero, finite, non-negative accumulated
/// radiance everywhere a primary ray hits geometry. The spec's exact
/// ±1%-of-reference bound requires a precomputed reference render from
/// the original implementation, which this repo doesn't carry; this test
/// instead locks in the weaker but checkable half of the property.
#[test]
fn cornell_like_scene_produces_valid_finite_radiance() {
    let (scene, camera) = cornell_like_scene();

    let mut viewport = Viewport::new(32, 32).unwrap();
    viewport.set_renderer(Box::new(PathTracerMis::default()));

    for _ in 0..8 {
        viewport.render(&scene, &camera).unwrap();
    }

    let sum = viewport.sum_buffer();
    assert!(sum.iter().any(|c| c.luminance() > 0.0), "nothing was lit");
    for c in &sum {
        assert!(c.r.is_finite() && c.g.is_finite() && c.b.is_finite());
        assert!(c.r >= 0.0 && c.g >= 0.0 && c.b >= 0.0);
    }
}

/// Scenario 4: the sampler draw at a given pixel depends only on
/// `(pass seeds, x, y)`, never on which worker thread happened to run it
/// or how many workers there were.
#[test]
fn sampler_draw_is_independent_of_thread_count() {
    let seeds = vec![11u64, 22, 33, 44];
    let items: Vec<(u32, u32, usize)> = (0..37).map(|i| (i % 9, i / 9, i as usize)).collect();

    let draw_with = |num_threads: usize| -> Vec<f64> {
        let mut pool = WorkerPool::new(num_threads, 0xABCD).unwrap();
        pool.reset_frame(&seeds, false);
        let results: Vec<Mutex<f64>> = (0..items.len()).map(|_| Mutex::new(0.0)).collect();
        pool.parallel_for(&items, |_worker, ctx, &(x, y, slot)| {
            ctx.sampler.reset_pixel(x, y);
            *results[slot].lock().unwrap() = ctx.sampler.get_float();
        });
        results.into_iter().map(|m| m.into_inner().unwrap()).collect()
    };

    let single = draw_with(1);
    let multi = draw_with(5);
    assert_eq!(single, multi);
}

/// Scenario 5 (degenerate case): a scene with no geometry at all has zero
/// variance everywhere, so every block should retire (active_pixels == 0)
/// as soon as the adaptive manager is allowed to run.
#[test]
fn fully_converged_scene_retires_every_block() {
    let (scene, camera) = furnace_scene(0.0, 0.5); // environment radiance 0: every pixel is exactly black.

    let mut viewport = Viewport::new(16, 16).unwrap();
    viewport.set_renderer(Box::new(PathTracer));
    viewport.set_adaptive_config(AdaptiveConfig::new(2, 2, 16, 0.01, 0.1).unwrap());

    for _ in 0..4 {
        viewport.render(&scene, &camera).unwrap();
    }

    let progress = viewport.progress();
    assert_eq!(progress.active_pixels, 0, "an all-black scene should fully converge");
}

/// A tiny integrator used only to prove `RenderingContext` plumbing works
/// end to end through `Viewport::render` without needing real light
/// transport.
struct ConstantIntegrator;

impl Integrator for ConstantIntegrator {
    fn render_pixel(&self, _film_coord: Vec2<f64>, _param: &RenderParam<'_>, _ctx: &mut RenderingContext) -> RayColor {
        RayColor::splat(1.0)
    }

    fn name(&self) -> &'static str {
        "ConstantIntegrator"
    }
}

#[test]
fn constant_integrator_fills_every_pixel() {
    let (scene, camera) = cornell_like_scene();
    let mut viewport = Viewport::new(4, 4).unwrap();
    viewport.set_renderer(Box::new(ConstantIntegrator));
    viewport.render(&scene, &camera).unwrap();
    let sum = viewport.sum_buffer();
    assert!(sum.iter().all(|c| c.r == 1.0 && c.g == 1.0 && c.b == 1.0));
}

/// Regression for the per-tile Hilbert walk: image dimensions that aren't a
/// multiple of `tile_size` force clipped, non-square, non-power-of-two edge
/// tiles, which a shared global-tile-size step table silently skips pixels
/// in. Every pixel must still get filled.
#[test]
fn constant_integrator_fills_every_pixel_with_odd_dimensions_and_edge_tiles() {
    let (scene, camera) = cornell_like_scene();
    let mut viewport = Viewport::new(13, 7).unwrap();
    let mut params = RenderingParams::default();
    params.tile_size = 4;
    viewport.set_rendering_params(params).unwrap();
    viewport.set_renderer(Box::new(ConstantIntegrator));
    viewport.render(&scene, &camera).unwrap();
    let sum = viewport.sum_buffer();
    assert_eq!(sum.len(), 13 * 7);
    for (i, c) in sum.iter().enumerate() {
        assert_eq!((c.r, c.g, c.b), (1.0, 1.0, 1.0), "pixel {i} was never rendered");
    }
}
