//! Collector: orchestrates probes and feeds their output to the Pool.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::consts::USER_EVENT_CAPTURE_LIMIT;
use crate::crc32::crc32;
use crate::pool::Pool;
use crate::probes::{CoarseTimingJitter, CpuRng, OsStats, OsSystemRng, ProcessStats, SystemRng, TimingJitter, X86CpuRng};

static STRICT_MODE: AtomicBool = AtomicBool::new(false);
static STARTUP_SNAPSHOT_TAKEN: AtomicBool = AtomicBool::new(false);

fn system_rng() -> &'static dyn SystemRng {
    static P: OnceLock<OsSystemRng> = OnceLock::new();
    P.get_or_init(OsSystemRng::default)
}

fn cpu_rng() -> &'static dyn CpuRng {
    static P: OnceLock<X86CpuRng> = OnceLock::new();
    P.get_or_init(X86CpuRng::default)
}

fn timing_jitter() -> &'static dyn TimingJitter {
    static P: OnceLock<CoarseTimingJitter> = OnceLock::new();
    P.get_or_init(CoarseTimingJitter::default)
}

fn os_stats_sources() -> &'static [Box<dyn OsStats>] {
    static P: OnceLock<Vec<Box<dyn OsStats>>> = OnceLock::new();
    P.get_or_init(|| vec![Box::new(ProcessStats)])
}

/// Escalates any non-OS-RNG, non-jitter probe failure in a slow poll to a
/// hard slow-poll failure when strict mode is enabled.
pub fn set_strict_mode(enabled: bool) {
    STRICT_MODE.store(enabled, Ordering::SeqCst);
}

pub fn strict_mode() -> bool {
    STRICT_MODE.load(Ordering::SeqCst)
}

/// Runs one fast-poll cycle against the given pool.
///
/// Adds OS-RNG output, CPU RNG words where available, process identifiers,
/// and a monotonic clock reading. Returns `false` only if the OS RNG call
/// itself fails — every other probe here is best-effort.
pub fn fast_poll(pool: &Pool) -> bool {
    let mut buf = [0u8; 16];
    if !system_rng().fill(&mut buf) {
        log::error!("fast poll: OS RNG failed");
        return false;
    }
    pool.add_bytes(&buf);

    if let Some(v) = cpu_rng().rand64() {
        pool.add_bytes(&v.to_le_bytes());
    }
    if let Some(v) = cpu_rng().seed64() {
        pool.add_bytes(&v.to_le_bytes());
    }

    pool.add_bytes(&(std::process::id() as u64).to_le_bytes());

    // ThreadId has no stable byte representation; hash it for a
    // process/thread-identifying contribution.
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    std::thread::current().id().hash(&mut hasher);
    pool.add_bytes(&hasher.finish().to_le_bytes());

    pool.add_bytes(&wall_clock_nanos().to_le_bytes());

    log::debug!("fast poll completed");
    true
}

/// Nanoseconds since the Unix epoch, truncated to 64 bits.
///
/// A genuine wall-clock reading, not an elapsed-since-construction delta:
/// `Instant::now().elapsed()` on a just-built `Instant` measures only the
/// cost of the `elapsed()` call itself, which is a near-constant handful of
/// nanoseconds and contributes almost no entropy.
pub(crate) fn wall_clock_nanos() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0)
}

/// Runs one slow-poll cycle against the given pool.
///
/// OS RNG and timing-jitter failures are always fatal; other probe
/// failures are logged and skipped unless strict mode is enabled.
pub fn slow_poll(pool: &Pool) -> bool {
    let mut fast_buf = [0u8; 16];
    if !system_rng().fill(&mut fast_buf) {
        log::error!("slow poll: OS RNG failed");
        return false;
    }
    pool.add_bytes(&fast_buf);

    let mut jitter_buf = [0u8; 32];
    match timing_jitter().read(&mut jitter_buf, 1) {
        Some(n) if n > 0 => pool.add_bytes(&jitter_buf[..n]),
        _ => {
            log::error!("slow poll: timing jitter source failed");
            return false;
        }
    }

    if !STARTUP_SNAPSHOT_TAKEN.swap(true, Ordering::SeqCst) {
        if let Some(snap) = ProcessStats.snapshot() {
            pool.add_bytes(&snap);
        }
    }

    for source in os_stats_sources() {
        match source.snapshot() {
            Some(bytes) => pool.add_bytes(&bytes),
            None => {
                log::warn!("slow poll: probe '{}' unavailable, skipping", source.name());
                if strict_mode() {
                    log::error!("slow poll: strict mode escalates failure of '{}'", source.name());
                    return false;
                }
            }
        }
    }

    pool.mix();
    log::debug!("slow poll completed");
    true
}

struct UserEventState {
    count: usize,
    last_event_at: Option<Instant>,
}

static USER_EVENTS_ENABLED: AtomicBool = AtomicBool::new(false);
static USER_EVENT_COUNT: AtomicUsize = AtomicUsize::new(0);

fn user_event_state() -> &'static Mutex<UserEventState> {
    static P: OnceLock<Mutex<UserEventState>> = OnceLock::new();
    P.get_or_init(|| Mutex::new(UserEventState { count: 0, last_event_at: None }))
}

/// Opts in to user-input capture. Subsequent calls to
/// [`capture_user_event`] will mix captured events into the pool until
/// [`crate::consts::USER_EVENT_CAPTURE_LIMIT`] events have been recorded.
pub fn enable_user_events() {
    let mut state = user_event_state().lock().unwrap();
    state.count = 0;
    state.last_event_at = None;
    USER_EVENT_COUNT.store(0, Ordering::SeqCst);
    USER_EVENTS_ENABLED.store(true, Ordering::SeqCst);
}

pub fn user_events_enabled() -> bool {
    USER_EVENTS_ENABLED.load(Ordering::SeqCst)
}

/// Feeds one captured mouse/keyboard event into the pool.
///
/// `event_bytes` is an opaque encoding of the event (position, key code,
/// or whatever the platform-specific hook captured); this function does
/// not install the hook itself, only the accounting and mixing state
/// machine. Mixes `crc32(event) + crc32(time_delta)` as a little-endian
/// `u32`, where `time_delta` is the elapsed milliseconds since the
/// previous captured event.
///
/// Returns `true` while still capturing, `false` once the capture limit
/// has been reached and the pool has received its closing mix.
pub fn capture_user_event(pool: &Pool, event_bytes: &[u8]) -> bool {
    if !user_events_enabled() {
        return false;
    }
    let mut state = user_event_state().lock().unwrap();
    let now = Instant::now();
    let delta_ms: u64 = match state.last_event_at {
        Some(prev) => now.duration_since(prev).as_millis() as u64,
        None => 0,
    };
    state.last_event_at = Some(now);

    let event_crc = crc32(event_bytes);
    let delta_crc = crc32(&delta_ms.to_le_bytes());
    let mixed = event_crc.wrapping_add(delta_crc);
    pool.add_bytes(&mixed.to_le_bytes());

    state.count += 1;
    let count = state.count;
    drop(state);
    USER_EVENT_COUNT.store(count, Ordering::SeqCst);

    if count >= USER_EVENT_CAPTURE_LIMIT {
        pool.mix();
        USER_EVENTS_ENABLED.store(false, Ordering::SeqCst);
        log::debug!("user-event capture complete after {} events", count);
        false
    } else {
        true
    }
}
