//! Scheduling hints requested from the host OS before measurement.
//!
//! Three requests are made, all best effort: raise the process priority
//! (lowest niceness the OS accepts, starting at -20), switch to `SCHED_FIFO`
//! at its maximum priority, and restrict the calling thread (the one driving
//! the measurement loop) to cores `cpu..cpu + threads`. A refusal is logged
//! and the benchmark carries on with default scheduling. Only Linux is
//! supported; elsewhere every request is reported as not obtained.

use tracing::{info, warn};

/// Most favourable niceness requested first.
pub const TARGET_NICENESS: i32 = -20;

/// One past the highest core id an affinity mask can name. Whether a core
/// below this bound exists is left to `sched_setaffinity`.
#[cfg(target_os = "linux")]
pub const MAX_CORES: usize = libc::CPU_SETSIZE as usize;
#[cfg(not(target_os = "linux"))]
pub const MAX_CORES: usize = 1024;

/// What the harness asks the OS for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulingHints {
    /// First core of the affinity mask.
    pub cpu: usize,
    /// Number of consecutive cores in the mask.
    pub threads: usize,
}

/// What the OS actually granted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulingReport {
    /// Niceness the process ended up with, if any change was accepted.
    pub niceness: Option<i32>,
    /// Whether `SCHED_FIFO` was granted.
    pub fifo: bool,
    /// Whether the affinity mask was applied.
    pub affinity: bool,
}

impl SchedulingHints {
    pub fn new(cpu: usize, threads: usize) -> Self {
        Self { cpu, threads }
    }

    /// Cores the affinity mask will contain, clipped to ids a mask can hold.
    pub fn cores(&self) -> Vec<usize> {
        let wanted = self.threads.max(1);
        let cores: Vec<usize> = (self.cpu..self.cpu.saturating_add(wanted))
            .filter(|&core| core < MAX_CORES)
            .collect();
        if cores.len() < wanted {
            warn!(
                cpu = self.cpu,
                threads = self.threads,
                max = MAX_CORES,
                "requested cores exceed the largest core id"
            );
        }
        cores
    }

    /// Requests niceness, FIFO scheduling and affinity. Never fails.
    pub fn apply(&self) -> SchedulingReport {
        info!("setting up schedulers and affinity");

        let niceness = raise_priority();
        match niceness {
            Some(level) => info!(level, "process niceness set"),
            None => warn!("could not change process niceness"),
        }

        let fifo = request_fifo();
        if fifo {
            info!("FIFO scheduling granted");
        } else {
            warn!("FIFO scheduling refused, keeping the default policy");
        }

        let cores = self.cores();
        let affinity = !cores.is_empty() && set_affinity(&cores);
        if affinity {
            info!(?cores, "scheduling affinity set");
        } else {
            warn!(?cores, granted = ?current_affinity(), "could not set scheduling affinity");
        }

        SchedulingReport {
            niceness,
            fifo,
            affinity,
        }
    }
}

/// Steps from [`TARGET_NICENESS`] towards 0 until the OS accepts a value.
#[cfg(target_os = "linux")]
fn raise_priority() -> Option<i32> {
    for level in TARGET_NICENESS..=0 {
        // SAFETY: setpriority only reads its scalar arguments.
        let ret = unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, level) };
        if ret == 0 {
            return Some(level);
        }
    }
    None
}

#[cfg(not(target_os = "linux"))]
fn raise_priority() -> Option<i32> {
    None
}

#[cfg(target_os = "linux")]
fn request_fifo() -> bool {
    // SAFETY: sched_param is plain data and outlives the call.
    unsafe {
        let max = libc::sched_get_priority_max(libc::SCHED_FIFO);
        if max < 0 {
            return false;
        }
        let param = libc::sched_param {
            sched_priority: max,
        };
        libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) == 0
    }
}

#[cfg(not(target_os = "linux"))]
fn request_fifo() -> bool {
    false
}

#[cfg(target_os = "linux")]
fn set_affinity(cores: &[usize]) -> bool {
    // SAFETY: we pass a correctly-sized, zero-initialised cpu_set_t for the
    // calling thread (tid 0).
    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        for &core in cores {
            libc::CPU_SET(core, &mut set);
        }
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) == 0
    }
}

#[cfg(not(target_os = "linux"))]
fn set_affinity(_cores: &[usize]) -> bool {
    false
}

/// Cores the calling thread may currently run on. Empty when the mask cannot
/// be read.
#[cfg(target_os = "linux")]
pub fn current_affinity() -> Vec<usize> {
    // SAFETY: the kernel fills a cpu_set_t we own and sized correctly.
    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        if libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut set) != 0 {
            return Vec::new();
        }
        (0..MAX_CORES)
            .filter(|&core| libc::CPU_ISSET(core, &set))
            .collect()
    }
}

#[cfg(not(target_os = "linux"))]
pub fn current_affinity() -> Vec<usize> {
    Vec::new()
}

/// Pins the calling thread to a single core. Returns whether the OS accepted.
///
/// The current mask does not bound `core`: a thread already restricted to
/// other cores can still be moved.
pub fn pin_current_thread(core: usize) -> bool {
    core < MAX_CORES && set_affinity(&[core])
}
