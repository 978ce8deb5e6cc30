//! External collaborator interfaces (spec.md §6). Scene/geometry loading,
//! BVH traversal, material/BSDF evaluation bodies, and texture sampling are
//! out of scope; this crate only names the shapes it needs from them.

use crate::color::raycolor::RayColor;
use crate::math::{Ray, Vec2, Vec3};

/// A scene-space vertex frame: shading normal plus an orthonormal tangent
/// basis, as handed back by `Scene::evaluate_intersection`.
#[derive(Clone, Copy, Debug)]
pub struct ShadingFrame {
    pub position: Vec3<f64>,
    pub normal: Vec3<f64>,
    pub tangent: Vec3<f64>,
    pub bitangent: Vec3<f64>,
}

/// The minimal result of a visibility/closest-hit query.
#[derive(Clone, Copy, Debug)]
pub struct HitPoint {
    pub distance: f64,
    pub object_id: u32,
    pub sub_object_id: u32,
    pub u: f32,
    pub v: f32,
}

impl HitPoint {
    pub const NONE: HitPoint = HitPoint {
        distance: f64::INFINITY,
        object_id: u32::MAX,
        sub_object_id: u32::MAX,
        u: 0.0,
        v: 0.0,
    };

    pub fn is_hit(&self) -> bool {
        self.distance.is_finite()
    }
}

/// Per-vertex geometric + material data resolved from a `HitPoint`.
pub struct IntersectionData<'a> {
    pub frame: ShadingFrame,
    pub material: &'a dyn Bsdf,
    pub tex_coord: Vec2<f64>,
}

/// Fully resolved shading inputs (texture lookups applied) for a BSDF call.
#[derive(Clone, Copy)]
pub struct ShadingData {
    pub frame: ShadingFrame,
    pub base_color: RayColor,
    pub emission: RayColor,
    pub roughness: f32,
    pub metalness: f32,
    pub ior: f32,
}

/// A sampled light: emitted radiance towards `direction`, the pdf of having
/// sampled that direction/point, and whether the light is a Dirac delta
/// (point/directional — no BSDF-side MIS term exists for it).
pub struct LightSample {
    pub direction: Vec3<f64>,
    pub distance: f64,
    pub radiance: RayColor,
    pub pdf: f64,
    pub is_delta: bool,
}

/// A light source, as consumed by NEE / light-path generation. Concrete
/// emitter shapes (area, environment, point) live outside this crate.
pub trait Light: Send + Sync {
    fn is_delta(&self) -> bool;
    fn sample(&self, reference: Vec3<f64>, u: Vec2<f64>) -> LightSample;
    fn evaluate(&self, ray_dir: Vec3<f64>, hit: &HitPoint) -> RayColor;
    fn pdf(&self, reference: Vec3<f64>, direction: Vec3<f64>) -> f64;
}

/// A picked light plus the discrete probability of that pick, from
/// `Scene::pick_light`.
pub struct LightPick<'a> {
    pub light: &'a dyn Light,
    pub pick_pdf: f64,
}

/// The renderer-facing scene: a closest-hit/any-hit oracle plus the light
/// list. Geometry storage, acceleration structures, and material graphs are
/// entirely the implementer's concern.
pub trait Scene: Send + Sync {
    fn trace(&self, ray: &Ray<f64>) -> HitPoint;

    /// Any-hit shadow query; `max_distance` excludes the endpoint itself.
    fn occluded(&self, ray: &Ray<f64>, max_distance: f64) -> bool;

    fn evaluate_intersection(&self, ray: &Ray<f64>, hit: &HitPoint, time: f64) -> IntersectionData<'_>;

    fn evaluate_shading_data(&self, isect: &IntersectionData<'_>) -> ShadingData;

    fn lights(&self) -> &[Box<dyn Light>];

    fn pick_light(&self, u: f64) -> Option<LightPick<'_>>;

    /// The light attached to a surface hit, if that surface is itself
    /// emissive (area lights are ordinary geometry with a light backing).
    fn light_for_hit(&self, hit: &HitPoint) -> Option<&dyn Light>;

    /// Environment/distant lights, contributing only on a camera-ray miss;
    /// disjoint from the set iterated by `lights()`/`pick_light()` only in
    /// that they have no surface representation to be hit directly.
    fn global_lights(&self) -> &[Box<dyn Light>];
}

/// A generated camera ray plus its differential (for texture filtering,
/// unused by this crate directly but threaded through for completeness).
pub struct GeneratedRay {
    pub ray: Ray<f64>,
    pub camera_pdf: f64,
}

/// The renderer-facing camera. `film_coord` is in `[0,1]^2`, `(0,0)` at the
/// top-left, matching the film-coordinate convention of spec.md §4.1.
pub trait Camera: Send + Sync {
    fn generate_ray(&self, film_coord: Vec2<f64>, time: f64) -> GeneratedRay;

    /// Projects a world-space point back to film space for light-tracer /
    /// VCM connect-to-camera splats. `None` if the point is behind the
    /// camera or outside the frustum.
    fn project(&self, world_pos: Vec3<f64>) -> Option<(Vec2<f64>, f64)>;
}

/// BSDF sampling event kinds (spec.md §4.3, common primitives).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BsdfEvent {
    Null,
    DiffuseReflection,
    DiffuseTransmission,
    GlossyReflection,
    GlossyRefraction,
    SpecularReflection,
    SpecularRefraction,
}

impl BsdfEvent {
    pub fn is_specular(&self) -> bool {
        matches!(self, BsdfEvent::SpecularReflection | BsdfEvent::SpecularRefraction)
    }
}

/// Result of `Bsdf::sample`.
pub struct BsdfSample {
    pub incoming_dir: Vec3<f64>,
    pub color: RayColor,
    pub pdf: f64,
    pub event: BsdfEvent,
}

/// Result of `Bsdf::evaluate`: the bidirectional color plus both the
/// forward and reverse sampling pdf, needed by VCM's dVC/dVM bookkeeping.
pub struct BsdfEvaluation {
    pub color: RayColor,
    pub forward_pdf: f64,
    pub reverse_pdf: f64,
}

/// Polymorphic material surface (spec.md §6): Diffuse, RoughDiffuse,
/// Dielectric, RoughDielectric, Metal, RoughMetal, Plastic, RoughPlastic are
/// all implementers living outside this crate.
pub trait Bsdf: Send + Sync {
    fn is_delta(&self) -> bool;
    fn sample(&self, shading: &ShadingData, outgoing_dir: Vec3<f64>, u: Vec2<f64>) -> Option<BsdfSample>;
    fn evaluate(&self, shading: &ShadingData, outgoing_dir: Vec3<f64>, incoming_dir: Vec3<f64>) -> BsdfEvaluation;
    fn pdf(&self, shading: &ShadingData, outgoing_dir: Vec3<f64>, incoming_dir: Vec3<f64>) -> f64;
}

/// A fully resolved display-space color, produced by a [`crate::postprocess::tonemap::Tonemapper`].
pub type DisplayColor = Vec3<f64>;
