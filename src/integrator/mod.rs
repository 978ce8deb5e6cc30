//! Light-transport integrators: a shared `PathState`/`RenderingContext`
//! vocabulary plus five estimators (spec.md §4.3) behind one
//! [`Integrator`] trait.

pub mod debug;
pub mod light_tracer;
pub mod path_tracer;
pub mod path_tracer_mis;
pub mod vcm;

use crate::color::raycolor::RayColor;
use crate::color::Wavelength;
use crate::counters::RayTracingCounters;
use crate::external::{BsdfEvent, Camera, Scene};
use crate::film::Film;
use crate::math::{RandGen, Ray};
use crate::sampler::GenericSampler;

/// cos(incidence) must clear this on both sides of a surface before a BSDF
/// term is evaluated (spec.md §4.3, "Common primitives").
pub const COS_EPSILON: f64 = 1e-5;

/// Roughness below this is treated as a Dirac specular, to avoid pdf
/// blow-up near-specular materials would otherwise produce.
pub const SPECULAR_EVENT_ROUGHNESS_THRESHOLD: f32 = 5e-3;

/// Depth at which Russian roulette starts being applied to the path
/// throughput.
#[derive(Clone, Copy, Debug)]
pub struct RenderingParams {
    pub tile_size: u32,
    pub max_ray_depth: u32,
    pub min_russian_roulette_depth: u32,
    pub aa_spread: f64,
    pub motion_blur_strength: f64,
    pub light_path_count_multiplier: f64,
}

impl Default for RenderingParams {
    fn default() -> Self {
        RenderingParams {
            tile_size: 16,
            max_ray_depth: 16,
            min_russian_roulette_depth: 4,
            aa_spread: 1.0,
            motion_blur_strength: 0.0,
            light_path_count_multiplier: 1.0,
        }
    }
}

/// Running state of a single camera (or light) path (spec.md §3 "PathState").
#[derive(Clone, Debug)]
pub struct PathState {
    pub ray: Ray<f64>,
    pub throughput: RayColor,
    /// MIS bookkeeping terms shared by the MIS path tracer and VCM.
    pub d_vc: f32,
    pub d_vm: f32,
    pub d_vcm: f32,
    pub depth: u32,
    pub last_event: BsdfEvent,
    pub last_specular: bool,
    pub last_pdf_w: f64,
}

impl PathState {
    pub fn new(ray: Ray<f64>) -> Self {
        PathState {
            ray,
            throughput: RayColor::one(),
            d_vc: 0.0,
            d_vm: 0.0,
            d_vcm: 1.0,
            depth: 1,
            last_event: BsdfEvent::Null,
            last_specular: false,
            last_pdf_w: 0.0,
        }
    }
}

/// Per-bounce record populated only for the UI-picked debug pixel.
#[derive(Clone, Debug)]
pub struct PathDebugData {
    pub records: Vec<PathDebugRecord>,
    pub termination: Option<PathTerminationReason>,
}

#[derive(Clone, Debug)]
pub struct PathDebugRecord {
    pub ray_origin: crate::math::Vec3<f64>,
    pub ray_dir: crate::math::Vec3<f64>,
    pub hit: bool,
    pub throughput: RayColor,
    pub event: BsdfEvent,
}

/// Not an error: why a path stopped extending (spec.md §7).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathTerminationReason {
    DepthExceeded,
    ThroughputBelowThreshold,
    RussianRouletteKill,
    NoSampledEvent,
    Background,
}

/// Thread-owned state an integrator may keep across a whole pass: its own
/// RNG/sampler handle, per-pass counters, and (optionally) the debug record
/// for whichever pixel the UI has picked.
pub struct RenderingContext {
    pub sampler: GenericSampler,
    pub rng: RandGen,
    pub time: f64,
    /// The hero wavelength set sampled once for the pixel currently being
    /// rendered (spec.md §3's "single-wavelength fallback"); every splat for
    /// that pixel, whether returned by `render_pixel` or accumulated
    /// directly (light tracer, VCM), must resolve spectral radiance against
    /// this value rather than a constant default.
    pub wavelength: Wavelength,
    pub counters: RayTracingCounters,
    pub debug_pixel: Option<(u32, u32)>,
    pub debug_data: Option<PathDebugData>,
}

impl RenderingContext {
    pub fn new(seed: u64) -> Self {
        RenderingContext {
            sampler: GenericSampler::new(),
            rng: RandGen::new(seed),
            time: 0.0,
            wavelength: Wavelength::default(),
            counters: RayTracingCounters::default(),
            debug_pixel: None,
            debug_data: None,
        }
    }
}

/// `q = clamp(max_channel(throughput), 0, 1)`; on survival, the caller must
/// scale throughput by `1/q` (spec.md §4.3).
pub fn russian_roulette(throughput: RayColor, depth: u32, min_depth: u32, u: f64) -> Option<f32> {
    if depth < min_depth {
        return Some(1.0);
    }
    let q = throughput.max_channel().clamp(0.0, 1.0);
    if u < q as f64 {
        Some(q.max(1e-6))
    } else {
        None
    }
}

/// Parameters an integrator needs to render one tile: the scene, camera,
/// film to splat into, and a pre-sampled pixel offset shared by the whole
/// pass.
pub struct RenderParam<'a> {
    pub scene: &'a dyn Scene,
    pub camera: &'a dyn Camera,
    pub film: &'a Film,
    pub params: RenderingParams,
    pub pixel_offset: crate::math::Vec2<f64>,
}

/// Shared integrator surface (spec.md §4.3.f). `pre_render` defaults to a
/// no-op; only VCM overrides it to run its light-vertex pass.
pub trait Integrator: Send + Sync {
    /// Renders one pixel's contribution and returns it for the caller to
    /// accumulate — except light-transport strategies that splat directly
    /// (light tracer, VCM's vertex-merging/connecting), which accumulate
    /// to `param.film` themselves and may return `RayColor::zero()`.
    fn render_pixel(
        &self,
        film_coord: crate::math::Vec2<f64>,
        param: &RenderParam<'_>,
        ctx: &mut RenderingContext,
    ) -> RayColor;

    /// Runs once per pass, before any tile is rendered; used by VCM to
    /// generate and hash its light-path vertices/photons.
    fn pre_render(&mut self, _param: &RenderParam<'_>, _pass_index: u32) {}

    fn name(&self) -> &'static str;
}
