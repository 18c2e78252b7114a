//! Entropy pool and SP 800-90A DRBG core.
//!
//! Provides an entropy pool that continuously accumulates unpredictable
//! data from heterogeneous system sources, diffuses it with SHA-512, and
//! produces high-strength seed material; and a family of SP 800-90A
//! Deterministic Random Bit Generators (CTR_DRBG, Hash_DRBG, HMAC_DRBG)
//! that consume that seed material and emit bulk pseudorandom output with
//! reseed discipline and backtracking resistance.
//!
//! # Example
//! ```no_run
//! use rng_core::{rng_start, rng_fetch, rng_stop};
//!
//! fn main() {
//!     assert!(rng_start());
//!     let mut buf = [0u8; 64];
//!     assert!(rng_fetch(&mut buf));
//!     rng_stop();
//! }
//! ```

mod collector;
mod consts;
mod crc32;
pub mod drbg;
mod errors;
mod pool;
mod probes;
mod stream_gen;

pub use crc32::crc32;
pub use drbg::{CtrDrbg, Drbg, DrbgStatus, HashDrbg, HmacDrbg};
pub use errors::RngError;
pub use pool::Pool;
pub use stream_gen::StreamGen;

/// Starts the entropy pool: allocates and locks backing storage and spawns
/// the background fast-poll task. Idempotent; returns `false` only if
/// storage could not be allocated at all.
pub fn rng_start() -> bool {
    Pool::global().init().is_ok()
}

/// Stops the pool: joins the background task and scrubs storage.
pub fn rng_stop() {
    Pool::global().stop();
}

/// `true` once [`rng_start`] has completed successfully.
pub fn rng_did_start() -> bool {
    Pool::global().did_start()
}

/// `true` once a slow poll has completed at least once in this process.
pub fn rng_did_slow_poll() -> bool {
    Pool::global().did_slow_poll()
}

/// Forces an immediate pool mix.
pub fn rng_mix() {
    Pool::global().mix();
}

/// Opts the process into user-input-driven entropy capture.
pub fn rng_enable_user_events() {
    collector::enable_user_events();
}

/// Fills `buf` with pool-derived bytes, forcing a slow poll. Returns
/// `false` on any failure; `buf` is left untouched by the core on failure.
pub fn rng_fetch(buf: &mut [u8]) -> bool {
    Pool::global().fetch(buf, true).is_ok()
}
