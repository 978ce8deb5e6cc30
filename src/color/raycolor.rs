use super::wavelength::Wavelength;
use super::NUM_COMPONENTS;
use crate::math::util::{clamp, max as fmax};
use crate::math::Vec3;

use std::ops::{Add, AddAssign, Div, Mul, Sub};

/// Radiance carrier: `N` non-negative floats. `N` is fixed per build by
/// [`super::NUM_COMPONENTS`] (3 for tristimulus, 8 for spectral hero
/// wavelengths); `RayColor` is the type alias integrators actually use.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayColorN<const N: usize> {
    data: [f32; N],
}

pub type RayColor = RayColorN<NUM_COMPONENTS>;

impl<const N: usize> RayColorN<N> {
    pub const fn zero() -> Self {
        RayColorN { data: [0.0; N] }
    }

    pub const fn one() -> Self {
        RayColorN { data: [1.0; N] }
    }

    pub fn splat(v: f32) -> Self {
        RayColorN { data: [v; N] }
    }

    pub fn from_fn(f: impl Fn(usize) -> f32) -> Self {
        let mut data = [0.0f32; N];
        for (i, d) in data.iter_mut().enumerate() {
            *d = f(i);
        }
        RayColorN { data }
    }

    pub fn get(&self, i: usize) -> f32 {
        self.data[i]
    }

    pub fn is_black(&self) -> bool {
        self.data.iter().all(|&v| v == 0.0)
    }

    /// `IsValid()` from spec.md §3: no NaN/Inf in any channel.
    pub fn is_valid(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// Clamps every channel to `>= 0`; non-spectral builds must never carry
    /// negative radiance (spectral builds tolerate it transiently, per the
    /// Film invariant in spec.md §3).
    pub fn clamp_non_negative(self) -> Self {
        RayColorN {
            data: self.data.map(|v| fmax(v, 0.0)),
        }
    }

    /// Max channel value, used both for Russian-roulette survival
    /// probability and for adaptive-error luminance when no RGB weights
    /// apply.
    pub fn max_channel(&self) -> f32 {
        self.data.iter().copied().fold(f32::MIN, f32::max)
    }

    pub fn scale(self, s: f32) -> Self {
        RayColorN {
            data: self.data.map(|v| v * s),
        }
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        let mut data = [0.0f32; N];
        for i in 0..N {
            data[i] = self.data[i] * (1.0 - t) + other.data[i] * t;
        }
        RayColorN { data }
    }
}

impl<const N: usize> Add for RayColorN<N> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        let mut data = [0.0f32; N];
        for i in 0..N {
            data[i] = self.data[i] + rhs.data[i];
        }
        RayColorN { data }
    }
}

impl<const N: usize> AddAssign for RayColorN<N> {
    fn add_assign(&mut self, rhs: Self) {
        for i in 0..N {
            self.data[i] += rhs.data[i];
        }
    }
}

impl<const N: usize> Sub for RayColorN<N> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        let mut data = [0.0f32; N];
        for i in 0..N {
            data[i] = self.data[i] - rhs.data[i];
        }
        RayColorN { data }
    }
}

impl<const N: usize> Mul for RayColorN<N> {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let mut data = [0.0f32; N];
        for i in 0..N {
            data[i] = self.data[i] * rhs.data[i];
        }
        RayColorN { data }
    }
}

impl<const N: usize> Div<f32> for RayColorN<N> {
    type Output = Self;
    fn div(self, rhs: f32) -> Self {
        self.scale(1.0 / rhs)
    }
}

/// Linear Rec.709 luminance weights used by the adaptive block error
/// estimator and by the post-process tonemapping pipeline.
pub const REC709_LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// A plain 3-channel RGB value, the universal currency once radiance
/// leaves the integrator (Film sum buffers, post-process, LUT).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Tristimulus {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Tristimulus {
    pub const fn zero() -> Self {
        Tristimulus { r: 0.0, g: 0.0, b: 0.0 }
    }

    pub fn luminance(&self) -> f32 {
        self.r * REC709_LUMA[0] + self.g * REC709_LUMA[1] + self.b * REC709_LUMA[2]
    }

    pub fn max_channel(&self) -> f32 {
        fmax(fmax(self.r, self.g), self.b)
    }

    pub fn clamp_non_negative(self) -> Self {
        Tristimulus {
            r: fmax(self.r, 0.0),
            g: fmax(self.g, 0.0),
            b: fmax(self.b, 0.0),
        }
    }

    pub fn clamp01(self) -> Self {
        Tristimulus {
            r: clamp(self.r, 0.0, 1.0),
            g: clamp(self.g, 0.0, 1.0),
            b: clamp(self.b, 0.0, 1.0),
        }
    }

    pub fn to_vec3(self) -> Vec3<f64> {
        Vec3 {
            x: self.r as f64,
            y: self.g as f64,
            z: self.b as f64,
        }
    }

    pub fn from_vec3(v: Vec3<f64>) -> Self {
        Tristimulus {
            r: v.x as f32,
            g: v.y as f32,
            b: v.z as f32,
        }
    }
}

impl Add for Tristimulus {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Tristimulus {
            r: self.r + rhs.r,
            g: self.g + rhs.g,
            b: self.b + rhs.b,
        }
    }
}

impl Mul<f32> for Tristimulus {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Tristimulus {
            r: self.r * rhs,
            g: self.g * rhs,
            b: self.b * rhs,
        }
    }
}

impl Mul for Tristimulus {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Tristimulus {
            r: self.r * rhs.r,
            g: self.g * rhs.g,
            b: self.b * rhs.b,
        }
    }
}

impl Sub for Tristimulus {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Tristimulus {
            r: self.r - rhs.r,
            g: self.g - rhs.g,
            b: self.b - rhs.b,
        }
    }
}

/// CIE 1931 XYZ matching functions, fit as a sum of Gaussian lobes (Wyman,
/// Sloan & Shirley 2013). Used only by spectral builds to resolve a
/// `RayColor` to tristimulus; identity in non-spectral builds.
#[cfg(feature = "spectral")]
fn gaussian_lobe(x: f64, mu: f64, sigma1: f64, sigma2: f64) -> f64 {
    let sigma = if x < mu { sigma1 } else { sigma2 };
    let t = (x - mu) / sigma;
    (-0.5 * t * t).exp()
}

#[cfg(feature = "spectral")]
fn cie_xyz(lambda: f64) -> (f64, f64, f64) {
    let x = 1.056 * gaussian_lobe(lambda, 599.8, 37.9, 31.0)
        + 0.362 * gaussian_lobe(lambda, 442.0, 16.0, 26.7)
        - 0.065 * gaussian_lobe(lambda, 501.1, 20.4, 26.2);
    let y = 0.821 * gaussian_lobe(lambda, 568.8, 46.9, 40.5)
        + 0.286 * gaussian_lobe(lambda, 530.9, 16.3, 31.1);
    let z = 1.217 * gaussian_lobe(lambda, 437.0, 11.8, 36.0)
        + 0.681 * gaussian_lobe(lambda, 459.0, 26.0, 13.8);
    (x, y, z)
}

/// `ConvertToTristimulus(wavelength)`: identity when non-spectral, CIE XYZ
/// integration when spectral (spec.md §4.4).
pub fn convert_to_tristimulus(color: RayColor, wavelength: &Wavelength) -> Tristimulus {
    #[cfg(not(feature = "spectral"))]
    {
        let _ = wavelength;
        Tristimulus {
            r: color.get(0),
            g: color.get(1),
            b: color.get(2),
        }
    }

    #[cfg(feature = "spectral")]
    {
        let n = Wavelength::NUM_COMPONENTS as f64;
        let mut xyz = (0.0, 0.0, 0.0);
        if wavelength.is_single_wavelength() {
            let (x, y, z) = cie_xyz(wavelength.primary());
            let w = color.get(0) as f64 * n;
            xyz = (x * w, y * w, z * w);
        } else {
            for (i, &lambda) in wavelength.lambdas().iter().enumerate() {
                let (x, y, z) = cie_xyz(lambda);
                let w = color.get(i) as f64 / n;
                xyz.0 += x * w;
                xyz.1 += y * w;
                xyz.2 += z * w;
            }
        }
        // CIE XYZ -> linear Rec.709.
        Tristimulus {
            r: (3.2406 * xyz.0 - 1.5372 * xyz.1 - 0.4986 * xyz.2) as f32,
            g: (-0.9689 * xyz.0 + 1.8758 * xyz.1 + 0.0415 * xyz.2) as f32,
            b: (0.0557 * xyz.0 - 0.2040 * xyz.1 + 1.0570 * xyz.2) as f32,
        }
    }
}
