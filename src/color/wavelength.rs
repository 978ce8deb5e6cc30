use super::{NUM_HERO_WAVELENGTHS, SPECTRUM_LAMBDA_MAX, SPECTRUM_LAMBDA_MIN};
use crate::math::RandGen;

/// `N` hero wavelengths sampled per ray for spectral rendering, stratified
/// across `[360nm, 830nm]` with a single uniform offset per pixel.
///
/// The first component (`primary`) is the one NEE/BSDF sampling privileges;
/// `single_wavelength` records that dispersion collapsed the carrier onto
/// just that component (the "single-wavelength fallback" of spec.md §3).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wavelength {
    lambdas: [f64; NUM_HERO_WAVELENGTHS],
    primary: usize,
    single_wavelength: bool,
}

impl Wavelength {
    pub const NUM_COMPONENTS: usize = NUM_HERO_WAVELENGTHS;

    /// Stratified hero-wavelength sample with a single shared random offset,
    /// as used once per pixel by `Viewport::render_tile`.
    pub fn sample(rng: &mut RandGen) -> Self {
        Self::from_offset(rng.uniform_f64())
    }

    /// Builds the stratified hero set from an already-drawn `offset`
    /// (usually a per-pixel sampler draw, rather than a fresh RNG value).
    pub fn from_offset(offset: f64) -> Self {
        let span = SPECTRUM_LAMBDA_MAX - SPECTRUM_LAMBDA_MIN;
        let step = span / NUM_HERO_WAVELENGTHS as f64;

        let mut lambdas = [0.0; NUM_HERO_WAVELENGTHS];
        for (i, l) in lambdas.iter_mut().enumerate() {
            let u = (i as f64 + offset) / NUM_HERO_WAVELENGTHS as f64;
            *l = SPECTRUM_LAMBDA_MIN + u * span;
            let _ = step;
        }

        Wavelength {
            lambdas,
            primary: 0,
            single_wavelength: false,
        }
    }

    pub fn lambdas(&self) -> &[f64; NUM_HERO_WAVELENGTHS] {
        &self.lambdas
    }

    pub fn primary(&self) -> f64 {
        self.lambdas[self.primary]
    }

    pub fn primary_index(&self) -> usize {
        self.primary
    }

    pub fn is_single_wavelength(&self) -> bool {
        self.single_wavelength
    }

    /// Collapses the carrier to its primary component only, as forced by a
    /// dispersive bounce (e.g. entering a dielectric with wavelength-
    /// dependent IOR). Irreversible for the remainder of the path.
    pub fn collapse_to_single(&mut self) {
        self.single_wavelength = true;
    }
}

impl Default for Wavelength {
    /// An unstratified, evenly spaced hero set starting at the band's low
    /// edge. In non-spectral builds `convert_to_tristimulus` ignores its
    /// `Wavelength` argument entirely; render-path callers should use
    /// [`RenderingContext::wavelength`](crate::integrator::RenderingContext),
    /// sampled once per pixel, rather than this constant fallback.
    fn default() -> Self {
        let mut rng = RandGen::new_default();
        Wavelength::sample(&mut rng)
    }
}
