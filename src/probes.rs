//! Entropy probe contracts.
//!
//! Platform-specific probe *implementations* are treated as pluggable; only
//! their interfaces are specified here as traits, plus one concrete,
//! portable implementation per trait so the Collector is runnable end to
//! end. The defaults here are deliberately conservative stand-ins, not a
//! faithful reimplementation of any one OS's statistics surface.

use std::time::Instant;

/// The operating system's cryptographic RNG.
pub trait SystemRng: Send + Sync {
    /// Fills `buf` with OS-RNG output. The only probe whose failure is fatal
    /// to both fast and slow polls.
    fn fill(&self, buf: &mut [u8]) -> bool;
}

/// x86 `RDRAND`/`RDSEED`-style CPU RNG instructions.
pub trait CpuRng: Send + Sync {
    /// One 64-bit word from the on-chip PRNG, or `None` if unavailable.
    fn rand64(&self) -> Option<u64>;
    /// One 64-bit word from the on-chip true-entropy seed source, or `None`.
    fn seed64(&self) -> Option<u64>;
}

/// SP 800-90B-style timing-jitter collector.
///
/// The Collector's slow poll treats this as the only *true* entropy
/// source it consumes directly, and requires it to succeed.
pub trait TimingJitter: Send + Sync {
    /// Fills `buf` with jitter-derived bytes, oversampled by a factor of
    /// `osr`. Returns the number of bytes written, or `None` on failure.
    fn read(&self, buf: &mut [u8], osr: u32) -> Option<usize>;
}

/// Opaque, OS-specific structured snapshots (identifiers, counters,
/// network/disk statistics, hardware telemetry).
///
/// The Collector does not interpret these buffers; each successful read is
/// simply added to the pool.
pub trait OsStats: Send + Sync {
    /// Human-readable name, used only for log messages on skip/failure.
    fn name(&self) -> &str;
    /// One opaque snapshot, or `None` if this source is unavailable here.
    fn snapshot(&self) -> Option<Vec<u8>>;
}

/// `getrandom`-backed [`SystemRng`].
#[derive(Default)]
pub struct OsSystemRng;

impl SystemRng for OsSystemRng {
    fn fill(&self, buf: &mut [u8]) -> bool {
        getrandom::getrandom(buf).is_ok()
    }
}

/// `RDRAND`/`RDSEED`-backed [`CpuRng`], detected at runtime.
///
/// Returns `None` from both methods off x86/x86_64 or when the CPU lacks
/// the corresponding feature; absence is indicated by the capability flag
/// rather than an error.
#[derive(Default)]
pub struct X86CpuRng;

impl CpuRng for X86CpuRng {
    fn rand64(&self) -> Option<u64> {
        #[cfg(target_arch = "x86_64")]
        {
            if std::is_x86_feature_detected!("rdrand") {
                let mut out: u64 = 0;
                let ok = unsafe { std::arch::x86_64::_rdrand64_step(&mut out) };
                if ok == 1 {
                    return Some(out);
                }
            }
        }
        None
    }

    fn seed64(&self) -> Option<u64> {
        #[cfg(target_arch = "x86_64")]
        {
            if std::is_x86_feature_detected!("rdseed") {
                let mut out: u64 = 0;
                let ok = unsafe { std::arch::x86_64::_rdseed64_step(&mut out) };
                if ok == 1 {
                    return Some(out);
                }
            }
        }
        None
    }
}

/// Coarse timing-jitter collector built from successive [`Instant`] deltas.
///
/// Not a hardware jitter source; a conservative, portable stand-in for an
/// external SP 800-90B-style collector. Each output byte is the low byte
/// of a tight-loop timing delta, sampled `osr` times and XOR-folded to
/// reduce bias.
#[derive(Default)]
pub struct CoarseTimingJitter;

impl TimingJitter for CoarseTimingJitter {
    fn read(&self, buf: &mut [u8], osr: u32) -> Option<usize> {
        let osr = osr.max(1);
        for slot in buf.iter_mut() {
            let mut acc = 0u8;
            for _ in 0..osr {
                let t0 = Instant::now();
                // A tight, data-independent spin gives the scheduler and
                // cache hierarchy room to introduce jitter in `elapsed()`.
                let mut x: u32 = 0x9E37_79B9;
                for _ in 0..8 {
                    x = x.wrapping_mul(0x8088_405).wrapping_add(1);
                }
                let nanos = t0.elapsed().subsec_nanos();
                acc ^= (nanos as u8) ^ (x as u8);
            }
            *slot = acc;
        }
        Some(buf.len())
    }
}

/// Process/thread identifiers and a monotonic clock reading, with a
/// best-effort `/proc/self/stat` snapshot on Linux.
#[derive(Default)]
pub struct ProcessStats;

impl OsStats for ProcessStats {
    fn name(&self) -> &str {
        "process-stats"
    }

    fn snapshot(&self) -> Option<Vec<u8>> {
        let mut out = Vec::with_capacity(32);
        out.extend_from_slice(&(std::process::id() as u64).to_le_bytes());
        out.extend_from_slice(&crate::collector::wall_clock_nanos().to_le_bytes());
        #[cfg(target_os = "linux")]
        {
            if let Ok(stat) = std::fs::read("/proc/self/stat") {
                out.extend_from_slice(&stat);
            }
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_rng_fills_buffer() {
        let rng = OsSystemRng;
        let mut buf = [0u8; 32];
        assert!(rng.fill(&mut buf));
    }

    #[test]
    fn timing_jitter_always_succeeds() {
        let jitter = CoarseTimingJitter;
        let mut buf = [0u8; 32];
        assert_eq!(jitter.read(&mut buf, 4), Some(32));
    }

    #[test]
    fn process_stats_nonempty() {
        let stats = ProcessStats;
        let snap = stats.snapshot().expect("process stats always available");
        assert!(snap.len() >= 16);
    }
}
