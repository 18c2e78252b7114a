//! The entropy pool: a fixed-size byte buffer that accumulates contributions
//! from many sources by XOR and is periodically diffused by SHA-512.

use sha2::{Digest, Sha512};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::thread::JoinHandle;
use zeroize::Zeroize;

use crate::collector;
use crate::consts::{DIGEST_SIZE, FAST_POLL_INTERVAL, MIX_INTERVAL, POOL_SIZE};
use crate::errors::RngError;

struct PoolState {
    bytes: Vec<u8>,
    write_cursor: usize,
    read_cursor: usize,
    bytes_since_last_mix: usize,
    initialized: bool,
    did_slow_poll: bool,
    locked: bool,
}

impl PoolState {
    const fn empty() -> Self {
        PoolState {
            bytes: Vec::new(),
            write_cursor: 0,
            read_cursor: 0,
            bytes_since_last_mix: 0,
            initialized: false,
            did_slow_poll: false,
            locked: false,
        }
    }
}

/// Process-wide entropy pool.
///
/// Realized as a lazily-initialized singleton (via [`Pool::global`]) guarded
/// by a single mutex, per the design note that every probe in the process
/// must write to the same state. [`Pool::new_for_test`] builds an
/// independent, already-initialized instance for unit tests that would
/// otherwise interfere with each other through the shared singleton.
pub struct Pool {
    state: Mutex<PoolState>,
    stop_requested: AtomicBool,
    background: Mutex<Option<JoinHandle<()>>>,
}

impl Pool {
    const fn new() -> Self {
        Pool {
            state: Mutex::new(PoolState::empty()),
            stop_requested: AtomicBool::new(false),
            background: Mutex::new(None),
        }
    }

    /// The process-wide pool instance.
    pub fn global() -> &'static Pool {
        static POOL: OnceLock<Pool> = OnceLock::new();
        POOL.get_or_init(Pool::new)
    }

    /// Builds a standalone, already-initialized pool for tests. Never
    /// spawns a background poller and never touches [`Pool::global`]'s
    /// state, so concurrent test threads don't interfere with each other.
    #[doc(hidden)]
    pub fn new_for_test() -> Pool {
        let pool = Pool::new();
        {
            let mut state = pool.state.lock().unwrap();
            state.bytes = vec![0u8; POOL_SIZE];
            state.initialized = true;
            state.did_slow_poll = true;
        }
        pool
    }

    /// Same as [`Pool::new_for_test`], leaked to a `'static` reference for
    /// tests that exercise APIs requiring `&'static Pool` (e.g. [`Pool::fetch`]
    /// or [`crate::stream_gen::StreamGen`]) without touching the real
    /// process-wide singleton.
    #[doc(hidden)]
    pub fn new_for_test_leaked() -> &'static Pool {
        Box::leak(Box::new(Pool::new_for_test()))
    }

    /// Allocates, locks, and zero-initializes pool storage, and starts the
    /// background fast-poll task. Idempotent.
    pub fn init(&'static self) -> Result<(), RngError> {
        debug_assert!(POOL_SIZE % DIGEST_SIZE == 0, "POOL_SIZE must be a multiple of the digest size");
        if POOL_SIZE % DIGEST_SIZE != 0 {
            // An invalid pool size is an unrecoverable configuration bug,
            // not a runtime error a caller can recover from.
            log::error!("POOL_SIZE {} is not a multiple of DIGEST_SIZE {}", POOL_SIZE, DIGEST_SIZE);
            std::process::abort();
        }

        let mut state = self.state.lock().unwrap();
        if state.initialized {
            return Ok(());
        }

        let mut bytes = vec![0u8; POOL_SIZE];
        let locked = lock_memory(&mut bytes);
        if !locked {
            log::debug!("pool storage could not be locked against paging on this platform");
        }

        state.bytes = bytes;
        state.write_cursor = 0;
        state.read_cursor = 0;
        state.bytes_since_last_mix = 0;
        state.did_slow_poll = false;
        state.locked = locked;
        state.initialized = true;
        drop(state);

        self.stop_requested.store(false, Ordering::SeqCst);
        let handle = std::thread::spawn(move || {
            while !self.stop_requested.load(Ordering::SeqCst) {
                std::thread::sleep(FAST_POLL_INTERVAL);
                if self.stop_requested.load(Ordering::SeqCst) {
                    break;
                }
                collector::fast_poll(self);
            }
        });
        *self.background.lock().unwrap() = Some(handle);

        Ok(())
    }

    pub fn did_start(&self) -> bool {
        self.state.lock().unwrap().initialized
    }

    pub fn did_slow_poll(&self) -> bool {
        self.state.lock().unwrap().did_slow_poll
    }

    /// XOR-accumulates `src` into the pool at the write cursor, mixing
    /// every [`MIX_INTERVAL`] bytes appended.
    pub fn add_bytes(&self, src: &[u8]) {
        let mut state = self.state.lock().unwrap();
        if state.bytes.is_empty() {
            return;
        }
        for &byte in src {
            let idx = state.write_cursor;
            state.bytes[idx] ^= byte;
            state.write_cursor = (state.write_cursor + 1) % POOL_SIZE;
            state.bytes_since_last_mix += 1;
            if state.bytes_since_last_mix >= MIX_INTERVAL {
                mix_locked(&mut state);
            }
        }
    }

    /// Diffuses pool contents with SHA-512 so every output bit depends on
    /// every input bit.
    pub fn mix(&self) {
        let mut state = self.state.lock().unwrap();
        if state.bytes.is_empty() {
            return;
        }
        mix_locked(&mut state);
    }

    /// Serves `buf` with pool-derived bytes. Runs a slow poll first if one
    /// has not yet completed in this process lifetime, or if `force_slow`
    /// is set.
    pub fn fetch(&'static self, buf: &mut [u8], force_slow: bool) -> Result<(), RngError> {
        if !self.did_start() {
            return Err(RngError::NotInitialized);
        }
        if buf.len() > POOL_SIZE {
            return Err(RngError::InvalidArgument);
        }

        if !self.did_slow_poll() || force_slow {
            if !collector::slow_poll(self) {
                return Err(RngError::EntropySourceFailed);
            }
            self.state.lock().unwrap().did_slow_poll = true;
        }

        // A live platform hook would call collector::capture_user_event
        // asynchronously as events arrive; there is no synchronous capture
        // to perform here when user-event capture is enabled.

        let mut state = self.state.lock().unwrap();
        let start = state.read_cursor;

        mix_locked(&mut state);
        xor_from_pool(&state, start, buf);

        for b in state.bytes.iter_mut() {
            *b ^= 0xFF;
        }

        mix_locked(&mut state);
        xor_from_pool(&state, start, buf);

        state.read_cursor = (start + buf.len()) % POOL_SIZE;

        mix_locked(&mut state);
        Ok(())
    }

    /// Signals the background task to stop, joins it, and scrubs and
    /// releases backing storage.
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
        if let Some(handle) = self.background.lock().unwrap().take() {
            let _ = handle.join();
        }

        let mut state = self.state.lock().unwrap();
        if state.locked {
            unlock_memory(&mut state.bytes);
        }
        state.bytes.zeroize();
        state.bytes = Vec::new();
        state.write_cursor = 0;
        state.read_cursor = 0;
        state.bytes_since_last_mix = 0;
        state.did_slow_poll = false;
        state.locked = false;
        state.initialized = false;
    }
}

fn mix_locked(state: &mut MutexGuard<'_, PoolState>) {
    let n = POOL_SIZE / DIGEST_SIZE;
    for i in 0..n {
        let digest = Sha512::digest(&state.bytes);
        let block = &mut state.bytes[i * DIGEST_SIZE..(i + 1) * DIGEST_SIZE];
        for (b, h) in block.iter_mut().zip(digest.iter()) {
            *b ^= h;
        }
    }
    state.bytes_since_last_mix = 0;
}

fn xor_from_pool(state: &MutexGuard<'_, PoolState>, start: usize, buf: &mut [u8]) {
    for (i, slot) in buf.iter_mut().enumerate() {
        *slot ^= state.bytes[(start + i) % POOL_SIZE];
    }
}

#[cfg(unix)]
fn lock_memory(bytes: &mut [u8]) -> bool {
    if bytes.is_empty() {
        return true;
    }
    let ret = unsafe { libc::mlock(bytes.as_ptr() as *const libc::c_void, bytes.len()) };
    ret == 0
}

#[cfg(not(unix))]
fn lock_memory(_bytes: &mut [u8]) -> bool {
    false
}

#[cfg(unix)]
fn unlock_memory(bytes: &mut [u8]) {
    if bytes.is_empty() {
        return;
    }
    unsafe {
        libc::munlock(bytes.as_ptr() as *const libc::c_void, bytes.len());
    }
}

#[cfg(not(unix))]
fn unlock_memory(_bytes: &mut [u8]) {}
