//! Blocks (adaptive-refinement units), tiles (scheduling units) and the
//! adaptive block manager that subdivides or retires blocks based on
//! per-block variance (spec.md §3, §4.2).

use super::Film;
use crate::color::raycolor::REC709_LUMA;
use simple_error::{bail, SimpleResult};

/// A half-open, axis-aligned rectangle in pixel space. Used both as a
/// `Block` (adaptive-refinement unit) and a `Tile` (scheduling unit); a
/// tile is simply a block whose extent is clamped to `tileSize`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
}

impl Block {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }
}

pub type Tile = Block;

/// Splits `[0,width) x [0,height)` into `block_size`-sided rectangles,
/// clipping the last row/column (spec.md §4.2 "Initial block list").
pub fn tile_image(width: u32, height: u32, block_size: u32) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut y = 0;
    while y < height {
        let max_y = (y + block_size).min(height);
        let mut x = 0;
        while x < width {
            let max_x = (x + block_size).min(width);
            blocks.push(Block {
                min_x: x,
                max_x,
                min_y: y,
                max_y,
            });
            x += block_size;
        }
        y += block_size;
    }
    blocks
}

/// Scheduling tiles derived from the current block list: any block wider or
/// taller than `tile_size` is itself retiled.
pub fn tiles_from_blocks(blocks: &[Block], tile_size: u32) -> Vec<Tile> {
    blocks
        .iter()
        .flat_map(|b| tile_image(b.width(), b.height(), tile_size).into_iter().map(
            move |t| Block {
                min_x: b.min_x + t.min_x,
                max_x: b.min_x + t.max_x,
                min_y: b.min_y + t.min_y,
                max_y: b.min_y + t.max_y,
            },
        ))
        .collect()
}

#[derive(Clone, Copy, Debug)]
pub struct AdaptiveConfig {
    pub num_initial_passes: u32,
    pub min_block_size: u32,
    pub max_block_size: u32,
    pub convergence_threshold: f32,
    pub subdivision_threshold: f32,
}

impl AdaptiveConfig {
    pub fn new(
        num_initial_passes: u32,
        min_block_size: u32,
        max_block_size: u32,
        convergence_threshold: f32,
        subdivision_threshold: f32,
    ) -> SimpleResult<Self> {
        if convergence_threshold > subdivision_threshold {
            bail!("convergence_threshold must not exceed subdivision_threshold");
        }
        if min_block_size == 0 || max_block_size < min_block_size {
            bail!("min_block_size must be > 0 and <= max_block_size");
        }
        Ok(AdaptiveConfig {
            num_initial_passes,
            min_block_size,
            max_block_size,
            convergence_threshold,
            subdivision_threshold,
        })
    }
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        AdaptiveConfig {
            num_initial_passes: 8,
            min_block_size: 8,
            max_block_size: 64,
            convergence_threshold: 0.01,
            subdivision_threshold: 0.1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RenderingProgress {
    pub passes_finished: u32,
    pub active_blocks: u32,
    pub active_pixels: u64,
    pub converged: f32,
    pub average_error: f32,
}

/// Per-block error, per spec.md §4.2: `A = sum/N`, `B = 2*secondarySum/N`;
/// project `A` and `|A-B|` onto Rec.709 luminance, sum
/// `L(|A-B|) / sqrt(eps + L(A))` over the block, scale by
/// `sqrt(blockArea/totalArea) / blockArea`.
pub fn block_error(film: &Film, block: &Block, num_samples: f32, total_area: f64) -> f32 {
    const EPS: f32 = 1e-3;
    let n = num_samples.max(1.0);

    let mut accum = 0.0f32;
    for y in block.min_y..block.max_y {
        for x in block.min_x..block.max_x {
            let sum = film.sum_at(x, y);
            let a = [sum.r / n, sum.g / n, sum.b / n];
            let l_a = a[0] * REC709_LUMA[0] + a[1] * REC709_LUMA[1] + a[2] * REC709_LUMA[2];

            let l_diff = if let Some(sec) = film.secondary_at(x, y) {
                let b = [2.0 * sec.r / n, 2.0 * sec.g / n, 2.0 * sec.b / n];
                let diff = [(a[0] - b[0]).abs(), (a[1] - b[1]).abs(), (a[2] - b[2]).abs()];
                diff[0] * REC709_LUMA[0] + diff[1] * REC709_LUMA[1] + diff[2] * REC709_LUMA[2]
            } else {
                0.0
            };

            accum += l_diff / (EPS + l_a.max(0.0)).sqrt();
        }
    }

    let area = block.area() as f64;
    if area == 0.0 {
        return 0.0;
    }
    (accum as f64 * (area / total_area).sqrt() / area) as f32
}

/// Retires converged blocks, subdivides noisy-but-salvageable ones along
/// their longer axis, and leaves the rest unchanged (spec.md §4.2 "Update
/// policy"). Skipped entirely (by the caller) while
/// `passesFinished < numInitialPasses`.
pub fn update_blocks(
    film: &Film,
    blocks: &[Block],
    config: &AdaptiveConfig,
    num_samples: f32,
    image_area: u64,
) -> (Vec<Block>, f32) {
    let total_area = image_area as f64;
    let mut next = Vec::with_capacity(blocks.len());
    let mut total_error = 0.0f32;
    let mut num_blocks = 0u32;

    for block in blocks {
        let error = block_error(film, block, num_samples, total_area);
        total_error += error;
        num_blocks += 1;

        if error < config.convergence_threshold {
            continue; // retire
        }

        let can_split = block.width() > config.min_block_size || block.height() > config.min_block_size;
        if error < config.subdivision_threshold && can_split {
            if block.width() >= block.height() {
                let mid = block.min_x + block.width() / 2;
                next.push(Block { max_x: mid, ..*block });
                next.push(Block { min_x: mid, ..*block });
            } else {
                let mid = block.min_y + block.height() / 2;
                next.push(Block { max_y: mid, ..*block });
                next.push(Block { min_y: mid, ..*block });
            }
        } else {
            next.push(*block);
        }
    }

    let average_error = if num_blocks > 0 {
        total_error / num_blocks as f32
    } else {
        0.0
    };
    (next, average_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_image_covers_exactly_once_with_clipping() {
        let blocks = tile_image(10, 10, 4);
        let mut covered = vec![0u8; 100];
        for b in &blocks {
            for y in b.min_y..b.max_y {
                for x in b.min_x..b.max_x {
                    covered[(y * 10 + x) as usize] += 1;
                }
            }
        }
        assert!(covered.iter().all(|&c| c == 1));
    }

    #[test]
    fn config_rejects_inverted_thresholds() {
        assert!(AdaptiveConfig::new(8, 8, 64, 0.5, 0.1).is_err());
    }

    #[test]
    fn converged_blocks_are_retired() {
        let film = Film::new(8, 8, true).unwrap();
        let config = AdaptiveConfig::new(0, 2, 8, 1.0, 2.0).unwrap();
        let blocks = tile_image(8, 8, 8);
        let (next, _) = update_blocks(&film, &blocks, &config, 16.0, 64);
        assert!(next.is_empty(), "a zero-variance block should retire");
    }
}
