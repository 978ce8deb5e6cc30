//! Fixed-size worker pool driving the three fence-separated stages of one
//! pass (spec.md §5): integrator `pre_render`, parallel tile rendering,
//! parallel post-processing. `pre_render` itself may fan out further (the
//! VCM light-path pass) before the camera pass's fence.
//!
//! Builds a fresh `crossbeam::scope` per pass rather than keeping threads
//! parked between passes: borrowed per-pass data (the current tile list,
//! thread-local `RenderingContext`s) can then be captured by reference
//! instead of needing `'static` bounds, while still giving every worker
//! its own id drawn from the pool (spec.md §9, "Thread-local state").

use crate::integrator::RenderingContext;
use simple_error::{bail, SimpleResult};

pub struct WorkerPool {
    num_threads: usize,
    contexts: Vec<RenderingContext>,
}

impl WorkerPool {
    /// `num_threads = 0` requests `std::thread::available_parallelism()`.
    pub fn new(num_threads: usize, seed: u64) -> SimpleResult<Self> {
        let resolved = if num_threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            num_threads
        };
        if resolved == 0 {
            bail!("WorkerPool requires at least one thread");
        }
        let contexts = (0..resolved)
            .map(|i| RenderingContext::new(seed ^ (i as u64).wrapping_mul(0x9E3779B97F4A7C15)))
            .collect();
        Ok(WorkerPool { num_threads: resolved, contexts })
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Reseeds every worker's context for a new pass, per
    /// `GenericSampler::reset_frame` (spec.md §4.1 step 3).
    pub fn reset_frame(&mut self, seeds: &[u64], use_blue_noise_dithering: bool) {
        for ctx in &mut self.contexts {
            ctx.sampler.reset_frame(seeds, use_blue_noise_dithering);
        }
    }

    /// Runs `work(worker_id, &mut ctx)` once per item in `items`, spreading
    /// items round-robin across workers and running each worker's share on
    /// its own thread; returns once every item has completed (the tile- and
    /// post-process fences of spec.md §5).
    pub fn parallel_for<T, F>(&mut self, items: &[T], work: F)
    where
        T: Sync,
        F: Fn(usize, &mut RenderingContext, &T) + Sync,
    {
        let num_threads = self.num_threads.max(1);
        crossbeam::scope(|scope| {
            for (worker_id, ctx) in self.contexts.iter_mut().enumerate() {
                let work = &work;
                scope.spawn(move |_| {
                    let mut i = worker_id;
                    while i < items.len() {
                        work(worker_id, ctx, &items[i]);
                        i += num_threads;
                    }
                });
            }
        })
        .expect("worker thread panicked");
    }

    pub fn contexts_mut(&mut self) -> &mut [RenderingContext] {
        &mut self.contexts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn resolves_zero_to_available_parallelism() {
        let pool = WorkerPool::new(0, 1).unwrap();
        assert!(pool.num_threads() >= 1);
    }

    #[test]
    fn parallel_for_visits_every_item_exactly_once() {
        let mut pool = WorkerPool::new(4, 1).unwrap();
        let items: Vec<u32> = (0..37).collect();
        let counter = AtomicU64::new(0);
        pool.parallel_for(&items, |_worker, _ctx, _item| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(counter.load(Ordering::Relaxed), 37);
    }
}
