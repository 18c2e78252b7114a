//! Fixed parameters of the entropy pool and DRBG family.
//!
//! Per the design note that fast-poll cadence and pool geometry are a
//! balance struck once, not a runtime knob, every value here is a `const`,
//! never a constructor argument.

/// Digest size of the pool's mixing hash (SHA-512), in bytes.
pub const DIGEST_SIZE: usize = 64;

/// Capacity of the entropy pool, in bytes. Must be a positive multiple of
/// [`DIGEST_SIZE`]; enforced at [`crate::pool::Pool::init`] time.
pub const POOL_SIZE: usize = 384;

/// Number of bytes appended to the pool between automatic `mix()` calls.
pub const MIX_INTERVAL: usize = 32;

/// Interval between background fast-poll cycles.
pub const FAST_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(500);

/// Number of distinct user-input events captured per opt-in session.
pub const USER_EVENT_CAPTURE_LIMIT: usize = 256;

/// CTR_DRBG entropy seed length (AES-256 key + one block), in bytes.
pub const CTR_DRBG_SEED_LEN: usize = 48;
/// CTR_DRBG maximum output bytes per `generate` call (2^16).
pub const CTR_DRBG_MAX_OUT_PER_CALL: u64 = 1 << 16;
/// CTR_DRBG maximum `reseed_counter` value before a reseed is mandatory.
pub const CTR_DRBG_MAX_RESEED: u64 = 1 << 48;
/// CTR_DRBG AES block size, in bytes.
pub const CTR_DRBG_BLOCK_LEN: usize = 16;
/// CTR_DRBG AES-256 key length, in bytes.
pub const CTR_DRBG_KEY_LEN: usize = 32;

/// Hash_DRBG / HMAC_DRBG seed length for SHA-512 (`SEED_LEN`), in bytes.
pub const HASH_DRBG_SEED_LEN: usize = 111;
/// Hash_DRBG / HMAC_DRBG maximum output bytes per `generate` call.
pub const DRBG_MAX_OUT_PER_CALL: u64 = 1 << 16;
/// Hash_DRBG / HMAC_DRBG maximum `reseed_counter` before reseed is mandatory.
pub const DRBG_MAX_RESEED: u64 = 1 << 48;
/// HMAC_DRBG key/value length for SHA-512 (`OUTLEN`), in bytes.
pub const HMAC_DRBG_OUTLEN: usize = 64;

/// Output bytes produced by the Trivium-style stream generator between
/// automatic reseeds (2^20).
pub const STREAM_GEN_RESEED_INTERVAL: u64 = 1 << 20;
/// Trivium-style generator IV length fetched from the pool on reseed.
pub const STREAM_GEN_IV_LEN: usize = 10;
/// Trivium-style generator fixed key length.
pub const STREAM_GEN_KEY_LEN: usize = 10;
/// Number of register cycles clocked (and discarded) at initialization,
/// expressed as a multiple of the 288-bit register width.
pub const STREAM_GEN_WARMUP_CYCLES: usize = 4 * 288;
