//! Bloom: per-element separable Gaussian blur of the raw HDR buffer,
//! persisted across passes and blended back in (spec.md §4.5 step 2).

use crate::color::raycolor::Tristimulus;

#[derive(Clone, Copy, Debug)]
pub struct BloomElement {
    pub weight: f32,
    pub sigma: f32,
    pub num_blur_passes: u32,
}

#[derive(Clone, Debug, Default)]
pub struct BloomParams {
    pub factor: f32,
    pub elements: Vec<BloomElement>,
}

/// One persistent blurred buffer per bloom element.
pub struct BloomState {
    width: u32,
    height: u32,
    buffers: Vec<Vec<Tristimulus>>,
}

impl BloomState {
    pub fn new(width: u32, height: u32, num_elements: usize) -> Self {
        let size = width as usize * height as usize;
        BloomState {
            width,
            height,
            buffers: (0..num_elements).map(|_| vec![Tristimulus::zero(); size]).collect(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32, num_elements: usize) {
        *self = BloomState::new(width, height, num_elements);
    }

    /// Re-blurs every element's buffer from `raw` (the current linear HDR
    /// frame) and returns the weighted sum to lerp against `raw` at the
    /// blend step.
    pub fn update(&mut self, raw: &[Tristimulus], params: &BloomParams) -> Vec<Tristimulus> {
        let size = self.width as usize * self.height as usize;
        let mut combined = vec![Tristimulus::zero(); size];

        if self.buffers.len() != params.elements.len() {
            self.buffers = (0..params.elements.len()).map(|_| vec![Tristimulus::zero(); size]).collect();
        }

        for (buf, element) in self.buffers.iter_mut().zip(params.elements.iter()) {
            buf.copy_from_slice(raw);
            for _ in 0..element.num_blur_passes.max(1) {
                *buf = gaussian_blur_separable(buf, self.width, self.height, element.sigma);
            }
            for (c, b) in combined.iter_mut().zip(buf.iter()) {
                *c = *c + *b * element.weight;
            }
        }

        combined
    }
}

/// 1D Gaussian kernel truncated to ±3σ, normalized.
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let sigma = sigma.max(1e-3);
    let radius = (sigma * 3.0).ceil().max(1.0) as i32;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| {
            let x = i as f32;
            (-0.5 * (x * x) / (sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

fn gaussian_blur_separable(src: &[Tristimulus], width: u32, height: u32, sigma: f32) -> Vec<Tristimulus> {
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as i32;
    let (w, h) = (width as i32, height as i32);

    let mut horizontal = vec![Tristimulus::zero(); src.len()];
    for y in 0..h {
        for x in 0..w {
            let mut acc = Tristimulus::zero();
            for (k, &weight) in kernel.iter().enumerate() {
                let sx = (x + k as i32 - radius).clamp(0, w - 1);
                acc = acc + src[(y * w + sx) as usize] * weight;
            }
            horizontal[(y * w + x) as usize] = acc;
        }
    }

    let mut out = vec![Tristimulus::zero(); src.len()];
    for y in 0..h {
        for x in 0..w {
            let mut acc = Tristimulus::zero();
            for (k, &weight) in kernel.iter().enumerate() {
                let sy = (y + k as i32 - radius).clamp(0, h - 1);
                acc = acc + horizontal[(sy * w + x) as usize] * weight;
            }
            out[(y * w + x) as usize] = acc;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_is_normalized() {
        let k = gaussian_kernel(2.0);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
    }

    #[test]
    fn blur_preserves_uniform_field() {
        let src = vec![Tristimulus { r: 1.0, g: 1.0, b: 1.0 }; 16 * 16];
        let out = gaussian_blur_separable(&src, 16, 16, 2.0);
        for t in &out {
            assert!((t.r - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn update_combines_weighted_elements() {
        let mut state = BloomState::new(4, 4, 1);
        let params = BloomParams {
            factor: 1.0,
            elements: vec![BloomElement { weight: 1.0, sigma: 1.0, num_blur_passes: 1 }],
        };
        let raw = vec![Tristimulus { r: 1.0, g: 0.0, b: 0.0 }; 16];
        let combined = state.update(&raw, &params);
        assert!(combined[5].r > 0.0);
    }
}
