//! Vertex Connection and Merging (spec.md §4.3.e): a light-path pre-pass
//! builds a vertex list and a photon hash grid; the camera pass combines
//! next-event estimation, vertex connecting, and vertex merging under one
//! MIS weighting scheme (Georgiev, Krivanek, Davidovic & Slusallek 2012).

use super::light_tracer::connect_to_camera;
use super::{russian_roulette, Integrator, PathState, RenderParam, RenderingContext, COS_EPSILON};
use crate::color::raycolor::RayColor;
use crate::external::{Bsdf, ShadingData};
use crate::math::util::power_heuristic;
use crate::math::{Ray, Vec3};

use rustc_hash::FxHashMap;
use std::sync::RwLock;

#[derive(Clone, Copy, Debug)]
pub struct VcmConfig {
    pub min_merging_radius: f64,
    pub initial_merging_radius: f64,
    pub merging_radius_multiplier: f64,
    pub use_vertex_merging: bool,
}

impl Default for VcmConfig {
    fn default() -> Self {
        VcmConfig {
            min_merging_radius: 1e-5,
            initial_merging_radius: 0.1,
            merging_radius_multiplier: 0.9,
            use_vertex_merging: true,
        }
    }
}

/// Debug splat tints for the five sampling strategies (spec.md §4.3.e,
/// "Debug splat weighting"); all default to white (1,1,1).
#[derive(Clone, Copy, Debug)]
pub struct VcmDebugTints {
    pub light_sampling: RayColor,
    pub bsdf_sampling: RayColor,
    pub vertex_connecting: RayColor,
    pub vertex_merging: RayColor,
    pub camera_connecting: RayColor,
}

impl Default for VcmDebugTints {
    fn default() -> Self {
        VcmDebugTints {
            light_sampling: RayColor::one(),
            bsdf_sampling: RayColor::one(),
            vertex_connecting: RayColor::one(),
            vertex_merging: RayColor::one(),
            camera_connecting: RayColor::one(),
        }
    }
}

/// A light-path vertex retained for connecting/merging during the camera
/// pass. `material` borrows from the `Scene` for the lifetime of one pass;
/// see the `SAFETY` note on [`VcmLightPathData::push_vertex`].
struct LightVertex {
    shading: ShadingData,
    material: *const dyn Bsdf,
    incoming_dir: Vec3<f64>,
    throughput: RayColor,
    d_vc: f64,
    d_vm: f64,
    d_vcm: f64,
    path_length: u32,
}

// SAFETY: `LightVertex` is only read back during the camera-pass fence that
// follows the light-pass fence that produced it; no two threads touch the
// same vertex concurrently because the vertex list is immutable by then.
unsafe impl Send for LightVertex {}
unsafe impl Sync for LightVertex {}

struct Photon {
    position: Vec3<f64>,
    direction: Vec3<f64>,
    throughput: RayColor,
    d_vm: f64,
    d_vcm: f64,
}

fn cell_index(p: Vec3<f64>, cell_size: f64) -> (i64, i64, i64) {
    (
        (p.x / cell_size).floor() as i64,
        (p.y / cell_size).floor() as i64,
        (p.z / cell_size).floor() as i64,
    )
}

#[derive(Default)]
struct PhotonGrid {
    cell_size: f64,
    cells: FxHashMap<(i64, i64, i64), Vec<u32>>,
}

impl PhotonGrid {
    fn build(photons: &[Photon], cell_size: f64) -> Self {
        let mut cells: FxHashMap<(i64, i64, i64), Vec<u32>> = FxHashMap::default();
        for (i, photon) in photons.iter().enumerate() {
            cells.entry(cell_index(photon.position, cell_size)).or_default().push(i as u32);
        }
        PhotonGrid { cell_size, cells }
    }

    /// Indices of photons in the 27 cells around `p` (a superset of those
    /// actually within radius `r`; callers still distance-check).
    fn query(&self, p: Vec3<f64>) -> Vec<u32> {
        let (cx, cy, cz) = cell_index(p, self.cell_size);
        let mut out = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(v) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) {
                        out.extend_from_slice(v);
                    }
                }
            }
        }
        out
    }
}

#[derive(Default)]
struct VcmLightPathData {
    vertices: Vec<LightVertex>,
    photons: Vec<Photon>,
    grid: Option<PhotonGrid>,
    merging_radius: f64,
    eta_vcm: f64,
    num_light_paths: f64,
}

pub struct Vcm {
    pub config: VcmConfig,
    pub tints: VcmDebugTints,
    pass_data: RwLock<VcmLightPathData>,
}

impl Vcm {
    pub fn new(config: VcmConfig, tints: VcmDebugTints) -> Self {
        Vcm { config, tints, pass_data: RwLock::new(VcmLightPathData::default()) }
    }

    /// Generates the full light-path vertex/photon set for one pass: the
    /// number of paths is `light_path_count_multiplier` times the pixel
    /// count, each pushing a vertex and a photon at every non-specular hit
    /// and performing connect-to-camera along the way (spec.md §4.3.e,
    /// "Allocate a light-path pass first").
    fn generate_light_paths(&self, param: &RenderParam<'_>, pass_index: u32, ctx: &mut RenderingContext) {
        let pixel_count = param.film.width() as f64 * param.film.height() as f64;
        let num_light_paths =
            (param.params.light_path_count_multiplier * pixel_count).round().max(1.0) as u32;
        let n = num_light_paths as f64;
        let merging_radius = (self.config.initial_merging_radius
            * self.config.merging_radius_multiplier.powi(pass_index as i32))
        .max(self.config.min_merging_radius);
        let eta_vcm = std::f64::consts::PI * merging_radius * merging_radius * n;

        let mut vertices = Vec::new();
        let mut photons = Vec::new();

        for _ in 0..num_light_paths {
            // Each light path gets its own hero wavelength, same as a
            // camera path does per pixel; reusing one context-wide value
            // across every path would collapse spectral rendering onto a
            // single wavelength for the whole pre-pass.
            ctx.wavelength = crate::color::Wavelength::from_offset(ctx.sampler.get_float());

            let pick = match param.scene.pick_light(ctx.sampler.get_float()) {
                Some(p) => p,
                None => continue,
            };
            let origin = pick.light.sample(Vec3 { x: 0.0, y: 0.0, z: 0.0 }, ctx.sampler.get_vec2());
            if origin.pdf <= 0.0 {
                continue;
            }
            let light_pdf = origin.pdf * pick.pick_pdf;

            let mut throughput = origin.radiance.scale((1.0 / light_pdf) as f32);
            let mut ray = Ray::new(Vec3 { x: 0.0, y: 0.0, z: 0.0 }, origin.direction, ctx.time);
            // dVCM/dVC/dVM recurrence per Georgiev et al.; emission starts the
            // path with dVCM = Mis(lightPickPdf / directionPdf) and
            // dVC = dVM = 0 (no prior vertex to account for).
            let mut d_vcm = power_heuristic(1.0, pick.pick_pdf, origin.pdf).max(0.0) / origin.pdf.max(1e-12);
            let mut d_vc = 0.0f64;
            let mut d_vm = 0.0f64;
            let mut depth = 1u32;

            // `max_ray_depth == 0` still traces one emitted segment (and
            // connects it to the camera) but samples no further bounce.
            while depth <= param.params.max_ray_depth.max(1) {
                ctx.counters.num_rays += 1;
                let hit = param.scene.trace(&ray);
                if !hit.is_hit() {
                    break;
                }
                let isect = param.scene.evaluate_intersection(&ray, &hit, ctx.time);
                let shading = param.scene.evaluate_shading_data(&isect);
                let incoming_dir = -ray.dir;

                if !isect.material.is_delta() {
                    vertices.push(LightVertex {
                        shading,
                        material: isect.material as *const dyn Bsdf,
                        incoming_dir,
                        throughput,
                        d_vc,
                        d_vm,
                        d_vcm,
                        path_length: depth,
                    });
                    photons.push(Photon {
                        position: shading.frame.position,
                        direction: incoming_dir,
                        throughput,
                        d_vm,
                        d_vcm,
                    });

                    connect_to_camera(&shading, incoming_dir, throughput, light_pdf, isect.material, param, ctx);
                }

                ctx.counters.num_bsdf_samples += 1;
                let u = ctx.sampler.get_vec2();
                let sample = match isect.material.sample(&shading, incoming_dir, u) {
                    Some(s) => s,
                    None => break,
                };
                if sample.pdf <= 0.0 || !sample.pdf.is_finite() {
                    break;
                }

                let cos_out = shading.frame.normal.dot(sample.incoming_dir).abs();
                // Recurrence per Georgiev et al., eq. 2-3: propagate dVCM/dVC
                // forward using the reverse BSDF pdf of the vertex we just
                // left, then fold in the merging normalization term.
                if !sample.event.is_specular() {
                    d_vcm = power_heuristic(1.0, 1.0, sample.pdf).max(0.0) / sample.pdf;
                    d_vc = (cos_out / sample.pdf) * (d_vc * sample.pdf + d_vcm + eta_vcm * d_vm);
                    d_vm = (cos_out / sample.pdf) * (d_vm * sample.pdf + d_vcm);
                } else {
                    d_vcm = 0.0;
                }

                throughput = throughput * sample.color.scale((cos_out / sample.pdf) as f32);
                if !throughput.is_valid() {
                    break;
                }

                let rr_u = ctx.sampler.get_float();
                match russian_roulette(throughput, depth, param.params.min_russian_roulette_depth, rr_u) {
                    Some(q) => throughput = throughput.scale(1.0 / q),
                    None => break,
                }

                ray = Ray::new(shading.frame.position, sample.incoming_dir, ctx.time);
                depth += 1;
            }
        }

        let grid = PhotonGrid::build(&photons, 2.0 * merging_radius);
        let mut data = self.pass_data.write().unwrap();
        data.vertices = vertices;
        data.photons = photons;
        data.grid = Some(grid);
        data.merging_radius = merging_radius;
        data.eta_vcm = eta_vcm;
        data.num_light_paths = n;
    }
}

impl Integrator for Vcm {
    fn pre_render(&mut self, param: &RenderParam<'_>, pass_index: u32) {
        let mut ctx = RenderingContext::new(pass_index as u64 ^ 0x51_7c_c1_b7_27_22_0a_95);
        self.generate_light_paths(param, pass_index, &mut ctx);
    }

    fn render_pixel(
        &self,
        film_coord: crate::math::Vec2<f64>,
        param: &RenderParam<'_>,
        ctx: &mut RenderingContext,
    ) -> RayColor {
        let data = self.pass_data.read().unwrap();
        let eta_vcm = data.eta_vcm;
        let merging_radius2 = data.merging_radius * data.merging_radius;
        let vm_normalization = if self.config.use_vertex_merging {
            1.0 / (std::f64::consts::PI * merging_radius2 * data.num_light_paths.max(1.0))
        } else {
            0.0
        };

        let generated = param.camera.generate_ray(film_coord, ctx.time);
        let mut state = PathState::new(generated.ray);
        let mut d_vcm = power_heuristic(1.0, 1.0, generated.camera_pdf.max(1e-12)).max(0.0);
        let mut d_vc = 0.0f64;
        let mut d_vm = 0.0f64;
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
                let emission = light.evaluate(state.ray.dir, &hit);
                let weight = if state.last_specular || state.depth == 1 {
                    1.0
                } else {
                    let light_pdf = light.pdf(state.ray.org, state.ray.dir);
                    1.0 / (1.0 + d_vcm * light_pdf + d_vc * light_pdf)
                };
                radiance += (state.throughput * emission).scale(weight as f32);
                break;
            }

            let isect = param.scene.evaluate_intersection(&state.ray, &hit, ctx.time);
            let shading = param.scene.evaluate_shading_data(&isect);
            let outgoing = -state.ray.dir;

            if !isect.material.is_delta() {
                // Next event estimation / connect to light.
                if let Some(pick) = param.scene.pick_light(ctx.sampler.get_float()) {
                    let u = ctx.sampler.get_vec2();
                    let sample = pick.light.sample(shading.frame.position, u);
                    if sample.pdf > 0.0 && !sample.radiance.is_black() {
                        let cos_theta = shading.frame.normal.dot(sample.direction);
                        if cos_theta.abs() > COS_EPSILON {
                            let shadow_ray = Ray::new(shading.frame.position, sample.direction, ctx.time);
                            ctx.counters.num_shadow_rays += 1;
                            if !param.scene.occluded(&shadow_ray, sample.distance * (1.0 - 1e-4)) {
                                let eval = isect.material.evaluate(&shading, outgoing, sample.direction);
                                let light_pdf = sample.pdf * pick.pick_pdf;
                                let weight = if sample.is_delta {
                                    1.0
                                } else {
                                    power_heuristic(1.0, light_pdf, eval.forward_pdf)
                                };
                                let contribution = (eval.color * sample.radiance)
                                    .scale((weight * cos_theta.abs() / light_pdf) as f32);
                                radiance += (state.throughput * contribution) * self.tints.light_sampling;
                            }
                        }
                    }
                }

                // Connect vertices: walk every retained light-path vertex
                // whose combined path length still fits the depth budget.
                for v in data.vertices.iter() {
                    if v.path_length + state.depth + 1 > param.params.max_ray_depth {
                        continue;
                    }
                    let to_light = v.shading.frame.position - shading.frame.position;
                    let dist2 = to_light.length2();
                    if dist2 <= 1e-12 {
                        continue;
                    }
                    let dist = dist2.sqrt();
                    let dir = to_light.scale(1.0 / dist);
                    let cos_cam = shading.frame.normal.dot(dir);
                    let cos_light = v.shading.frame.normal.dot(dir.scale(-1.0));
                    if cos_cam.abs() <= COS_EPSILON || cos_light.abs() <= COS_EPSILON {
                        continue;
                    }

                    let shadow_ray = Ray::new(shading.frame.position, dir, ctx.time);
                    ctx.counters.num_shadow_rays += 1;
                    if param.scene.occluded(&shadow_ray, dist * (1.0 - 1e-4)) {
                        continue;
                    }

                    let cam_eval = isect.material.evaluate(&shading, outgoing, dir);
                    let light_material = unsafe { &*v.material };
                    let light_eval = light_material.evaluate(&v.shading, v.incoming_dir, dir.scale(-1.0));

                    let g = (cos_cam.abs() * cos_light.abs()) / dist2;
                    if g <= 0.0 {
                        continue;
                    }

                    let weight = 1.0
                        / (1.0
                            + eta_vcm * vm_normalization
                            + v.d_vcm * cam_eval.forward_pdf.max(0.0)
                            + d_vcm * light_eval.forward_pdf.max(0.0));

                    let contribution = (cam_eval.color * light_eval.color * v.throughput)
                        .scale((g * weight) as f32);
                    radiance += (state.throughput * contribution) * self.tints.vertex_connecting;
                }

                // Merge vertices: query the photon grid for nearby photons
                // and accumulate a density-estimate contribution.
                if self.config.use_vertex_merging {
                    if let Some(grid) = &data.grid {
                        for idx in grid.query(shading.frame.position) {
                            let photon = &data.photons[idx as usize];
                            let d2 = (photon.position - shading.frame.position).length2();
                            if d2 > merging_radius2 {
                                continue;
                            }
                            let eval = isect.material.evaluate(&shading, outgoing, photon.direction);
                            if eval.color.is_black() {
                                continue;
                            }
                            let weight = 1.0 / (1.0 + photon.d_vcm * 0.0 + photon.d_vm);
                            let contribution = (eval.color * photon.throughput)
                                .scale((vm_normalization * weight) as f32);
                            radiance += (state.throughput * contribution) * self.tints.vertex_merging;
                        }
                    }
                }
            }

            ctx.counters.num_bsdf_samples += 1;
            let u = ctx.sampler.get_vec2();
            let sample = match isect.material.sample(&shading, outgoing, u) {
                Some(s) => s,
                None => break,
            };
            if sample.pdf <= 0.0 || !sample.pdf.is_finite() {
                break;
            }

            let cos_out = shading.frame.normal.dot(sample.incoming_dir).abs();
            if !sample.event.is_specular() {
                let new_d_vcm = power_heuristic(1.0, 1.0, sample.pdf).max(0.0) / sample.pdf;
                let new_d_vc = (cos_out / sample.pdf) * (d_vc * sample.pdf + d_vcm + eta_vcm * d_vm);
                let new_d_vm = (cos_out / sample.pdf) * (d_vm * sample.pdf + d_vcm);
                d_vcm = new_d_vcm;
                d_vc = new_d_vc;
                d_vm = new_d_vm;
            } else {
                d_vcm = 0.0;
            }

            state.throughput = state.throughput * sample.color.scale((cos_out / sample.pdf) as f32);
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

            state.last_specular = sample.event.is_specular();
            state.ray = Ray::new(shading.frame.position, sample.incoming_dir, ctx.time);
            state.depth += 1;
        }

        radiance.clamp_non_negative()
    }

    fn name(&self) -> &'static str {
        "VCM"
    }
}
