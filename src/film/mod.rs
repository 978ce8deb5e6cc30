//! The accumulation film: a thread-safe HDR sum buffer sharded across a
//! fixed array of spin locks by pixel hash (spec.md §3, §4.4, §5).

pub mod block;
pub mod hilbert;

use crate::color::raycolor::Tristimulus;
use crate::math::{RandGen, Vec2};

use crossbeam::utils::CachePadded;
use simple_error::{bail, SimpleResult};
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, Ordering};

/// Number of spin locks sharding the sum buffer; must stay a power of two
/// so `ComputeLockIndex` can mask instead of modulo.
pub const NUM_LOCKS: usize = 512;

struct SpinLock {
    locked: AtomicBool,
}

impl SpinLock {
    const fn new() -> Self {
        SpinLock {
            locked: AtomicBool::new(false),
        }
    }

    fn lock(&self) {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            std::hint::spin_loop();
        }
    }

    fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }
}

/// `((x * 73856093) XOR (y * 19349663)) mod NUM_LOCKS` (spec.md §3), with
/// the mod folded into a mask since `NUM_LOCKS` is a power of two.
fn lock_index(x: u32, y: u32) -> usize {
    ((x.wrapping_mul(73_856_093) ^ y.wrapping_mul(19_349_663)) as usize) & (NUM_LOCKS - 1)
}

/// The accumulating HDR film. Owns the sum buffer exclusively; the only
/// ways to mutate it are [`Film::accumulate`], [`Film::accumulate_sub_pixel`]
/// and [`Film::clear`] (spec.md §4.4 invariant).
/// A pixel slot mutated only while its [`SpinLock`] shard is held.
struct Slot(UnsafeCell<Tristimulus>);

// SAFETY: every write to a `Slot` happens with `Film::locks[lock_index(..)]`
// held, so concurrent access to the same slot is serialized even though the
// surrounding `Vec` is only ever borrowed as `&Film`.
unsafe impl Sync for Slot {}

impl Clone for Slot {
    fn clone(&self) -> Self {
        Slot(UnsafeCell::new(unsafe { *self.0.get() }))
    }
}

pub struct Film {
    width: u32,
    height: u32,
    sum: Vec<Slot>,
    secondary_sum: Option<Vec<Slot>>,
    locks: Box<[CachePadded<SpinLock>]>,
    /// Which half (even/odd pass) currently feeds the secondary buffer;
    /// flipped once per pass by the viewport between fences.
    secondary_parity: bool,
}

impl Film {
    /// Fails for zero or out-of-range dimensions, per spec.md §4.1.
    pub fn new(width: u32, height: u32, with_secondary: bool) -> SimpleResult<Self> {
        if width == 0 || height == 0 || width > 65536 || height > 65536 {
            bail!(
                "Film dimensions must be in [1, 65536], got {}x{}",
                width,
                height
            );
        }
        let num_pixels = width as usize * height as usize;
        let locks = (0..NUM_LOCKS)
            .map(|_| CachePadded::new(SpinLock::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        let make_buffer = || {
            (0..num_pixels)
                .map(|_| Slot(UnsafeCell::new(Tristimulus::zero())))
                .collect::<Vec<_>>()
        };

        Ok(Film {
            width,
            height,
            sum: make_buffer(),
            secondary_sum: if with_secondary { Some(make_buffer()) } else { None },
            locks,
            secondary_parity: false,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary_sum.is_some()
    }

    /// Flips which half of the alternating passes feeds the secondary
    /// buffer. Called by the viewport between fences, never during a
    /// parallel tile-render or post-process section.
    pub fn begin_pass(&mut self, pass_is_odd: bool) {
        self.secondary_parity = pass_is_odd;
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Integer-pixel accumulate: atomic under `locks[hash(x,y)]`, updating
    /// both the sum and (if present and on this pass's parity) the
    /// secondary sum.
    ///
    /// # Safety / threading
    /// Requires `self` to be shared (`&self`) across worker threads; the
    /// spin lock is what makes that sound despite the interior mutation.
    pub fn accumulate(&self, x: u32, y: u32, sample: Tristimulus) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = self.index(x, y);
        let lock_idx = lock_index(x, y);
        self.locks[lock_idx].lock();
        unsafe {
            let cell = self.sum[idx].0.get();
            *cell = *cell + sample;
            if self.secondary_parity {
                if let Some(sec) = &self.secondary_sum {
                    let cell = sec[idx].0.get();
                    *cell = *cell + sample;
                }
            }
        }
        self.locks[lock_idx].unlock();
    }

    /// Sub-pixel accumulate: maps a film-space position to a pixel,
    /// stochastically rounding each axis to simulate a 1-pixel box filter,
    /// dropping samples that land outside the image.
    ///
    /// OPEN QUESTION (decided, see DESIGN.md): the source mixes in a
    /// `(0, 0.5)` pixel-space offset on the y axis before rounding. The
    /// behavior is preserved here rather than "fixed".
    pub fn accumulate_sub_pixel(&self, pos: Vec2<f64>, sample: Tristimulus, rng: &mut RandGen) {
        let px = pos.x * self.width as f64;
        let py = pos.y * self.height as f64 + 0.5;

        let fx = px.floor();
        let fy = py.floor();
        let frac_x = px - fx;
        let frac_y = py - fy;

        let x = fx as i64 + if rng.uniform_f64() < frac_x { 1 } else { 0 };
        let y = fy as i64 + if rng.uniform_f64() < frac_y { 1 } else { 0 };

        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        self.accumulate(x as u32, y as u32, sample);
    }

    /// Zeroes both buffers (spec.md §4.1 `reset`).
    pub fn clear(&mut self) {
        for slot in &mut self.sum {
            *slot.0.get_mut() = Tristimulus::zero();
        }
        if let Some(sec) = &mut self.secondary_sum {
            for slot in sec {
                *slot.0.get_mut() = Tristimulus::zero();
            }
        }
    }

    pub fn sum_at(&self, x: u32, y: u32) -> Tristimulus {
        unsafe { *self.sum[self.index(x, y)].0.get() }
    }

    pub fn secondary_at(&self, x: u32, y: u32) -> Option<Tristimulus> {
        let idx = self.index(x, y);
        self.secondary_sum
            .as_ref()
            .map(|s| unsafe { *s[idx].0.get() })
    }

    /// Snapshot of the full sum buffer in row-major order, for post-process
    /// and tests. Only safe to call between fences (not during a parallel
    /// tile-render or post-process section).
    pub fn sum_buffer_snapshot(&self) -> Vec<Tristimulus> {
        self.sum.iter().map(|s| unsafe { *s.0.get() }).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_rejects_out_of_range() {
        assert!(Film::new(0, 10, false).is_err());
        assert!(Film::new(10, 0, false).is_err());
        assert!(Film::new(70000, 10, false).is_err());
    }

    #[test]
    fn clear_zeroes_both_buffers() {
        let mut film = Film::new(4, 4, true).unwrap();
        film.accumulate(1, 1, Tristimulus { r: 1.0, g: 1.0, b: 1.0 });
        film.clear();
        assert_eq!(film.sum_at(1, 1), Tristimulus::zero());
        assert_eq!(film.secondary_at(1, 1), Some(Tristimulus::zero()));
    }

    #[test]
    fn out_of_bounds_accumulate_is_dropped() {
        let film = Film::new(4, 4, false).unwrap();
        // Should not panic.
        film.accumulate(100, 100, Tristimulus { r: 1.0, g: 0.0, b: 0.0 });
    }

    #[test]
    fn threaded_accumulate_loses_no_updates() {
        // Scenario 6 of spec.md §8: 8 threads splat 1.0 a million times each
        // to a 4x4 film; the per-channel sum must be exactly 8,000,000.
        let film = Film::new(4, 4, false).unwrap();
        crossbeam::scope(|scope| {
            for _ in 0..8 {
                let film = &film;
                scope.spawn(move |_| {
                    for _ in 0..1_000_000 {
                        film.accumulate(2, 2, Tristimulus { r: 1.0, g: 1.0, b: 1.0 });
                    }
                });
            }
        })
        .unwrap();
        let total = film.sum_at(2, 2);
        assert_eq!(total.r, 8_000_000.0);
        assert_eq!(total.g, 8_000_000.0);
        assert_eq!(total.b, 8_000_000.0);
    }
}
