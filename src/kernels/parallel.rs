//! Thread-parallel variant.
//!
//! Output rows are split across a dedicated rayon pool. Each row is computed
//! independently in column tiles of [`Invocation::block_size`] so the active
//! slice of `C` and the matching columns of `B` stay cache resident while `k`
//! sweeps. Rows never overlap between workers, so no synchronization is needed
//! beyond the implicit join at the end of `install`.

use std::cmp::min;

use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
    ThreadPool, ThreadPoolBuilder,
};
use tracing::debug;

use crate::error::{config_error, Result};
use crate::kernel::{Invocation, Kernel};
use crate::matrix::at;
use crate::sched;

/// The thread-parallel variant. Owns its worker pool.
pub struct ParallelKernel {
    pool: ThreadPool,
    threads: usize,
}

impl ParallelKernel {
    /// Builds a pool of `threads` workers. With `pin`, worker `w` is bound to
    /// core `cpu + w` (best effort).
    pub fn new(threads: usize, cpu: usize, pin: bool) -> Result<Self> {
        if threads == 0 {
            return Err(config_error("parallel kernel needs at least one thread"));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|idx| format!("matbench-worker-{idx}"))
            .start_handler(move |idx| {
                if pin {
                    let core = cpu + idx;
                    if !sched::pin_current_thread(core) {
                        debug!(worker = idx, core, "could not pin worker");
                    }
                }
            })
            .build()?;

        Ok(Self { pool, threads })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }
}

impl std::fmt::Debug for ParallelKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelKernel")
            .field("threads", &self.threads)
            .finish()
    }
}

fn compute_row(a_row: &[f32], b: &[f32], c_row: &mut [f32], m: usize, p: usize, block: usize) {
    c_row.fill(0.0);
    for jj in (0..p).step_by(block) {
        let max_j = min(jj + block, p);
        let c_tile = &mut c_row[jj..max_j];
        for (k, &a_ik) in a_row.iter().enumerate().take(m) {
            let b_tile = &b[at(k, jj, p)..at(k, max_j, p)];
            for (cv, &bv) in c_tile.iter_mut().zip(b_tile) {
                *cv += a_ik * bv;
            }
        }
    }
}

impl Kernel for ParallelKernel {
    fn name(&self) -> &'static str {
        "parallelized"
    }

    fn multiply(&self, inv: &mut Invocation<'_>) {
        let d = inv.dims;
        let block = inv.block_size.max(1);
        let a = inv.a.as_slice();
        let b = inv.b.as_slice();
        let c = inv.c.as_mut_slice();

        if d.p == 0 {
            return;
        }

        self.pool.install(|| {
            c.par_chunks_mut(d.p).enumerate().for_each(|(i, c_row)| {
                let a_row = &a[at(i, 0, d.m)..at(i, 0, d.m) + d.m];
                compute_row(a_row, b, c_row, d.m, d.p, block);
            });
        });
    }
}
