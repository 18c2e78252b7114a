//! Hash_DRBG: SP 800-90Ar1 §10.1.1, SHA-512.

use sha2::{Digest, Sha512};
use zeroize::Zeroize;

use crate::consts::{DRBG_MAX_OUT_PER_CALL, DRBG_MAX_RESEED, HASH_DRBG_SEED_LEN};
use crate::drbg::Drbg;
use crate::errors::DrbgStatus;

const SEED_LEN: usize = HASH_DRBG_SEED_LEN;

/// Hash_DRBG state: the working value `V`, a constant `C` derived at
/// instantiation, and a reseed counter. Both `V` and `C` are `SEED_LEN`
/// bytes, per §10.1.1.1.
pub struct HashDrbg {
    v: [u8; SEED_LEN],
    c: [u8; SEED_LEN],
    reseed_counter: u64,
    instantiated: bool,
}

impl HashDrbg {
    pub fn new() -> Self {
        HashDrbg { v: [0u8; SEED_LEN], c: [0u8; SEED_LEN], reseed_counter: 0, instantiated: false }
    }

    /// Instantiates from entropy, an optional nonce, and an optional
    /// personalization string. `entropy || nonce || personalization` is
    /// fed through `Hash_df` to produce the initial `V`.
    pub fn init(&mut self, entropy: &[u8], nonce: &[u8], personalization: &[u8]) -> DrbgStatus {
        if entropy.is_empty() {
            return DrbgStatus::InvalidArgument;
        }

        let mut seed_material = Vec::with_capacity(entropy.len() + nonce.len() + personalization.len());
        seed_material.extend_from_slice(entropy);
        seed_material.extend_from_slice(nonce);
        seed_material.extend_from_slice(personalization);

        self.v = hash_df_seed(&seed_material);

        let mut c_material = Vec::with_capacity(1 + SEED_LEN);
        c_material.push(0x00);
        c_material.extend_from_slice(&self.v);
        self.c = hash_df_seed(&c_material);

        seed_material.zeroize();
        c_material.zeroize();

        self.reseed_counter = 1;
        self.instantiated = true;
        DrbgStatus::Success
    }

    fn reseed_internal(&mut self, entropy: &[u8], additional_input: &[u8]) {
        let mut seed_material = Vec::with_capacity(1 + SEED_LEN + entropy.len() + additional_input.len());
        seed_material.push(0x01);
        seed_material.extend_from_slice(&self.v);
        seed_material.extend_from_slice(entropy);
        seed_material.extend_from_slice(additional_input);

        self.v = hash_df_seed(&seed_material);

        let mut c_material = Vec::with_capacity(1 + SEED_LEN);
        c_material.push(0x00);
        c_material.extend_from_slice(&self.v);
        self.c = hash_df_seed(&c_material);

        seed_material.zeroize();
        c_material.zeroize();
        self.reseed_counter = 1;
    }

    /// The `Hashgen` construction of §10.1.1.1: generates `len` bytes by
    /// repeatedly hashing a counter `data` seeded from `V`, discarding `V`
    /// itself on return (the caller restores the real `V` separately).
    fn hashgen(&self, len: usize) -> Vec<u8> {
        let m = len.div_ceil(DIGEST_SIZE_INTERNAL);
        let mut data = self.v;
        let mut out = Vec::with_capacity(m * DIGEST_SIZE_INTERNAL);
        for _ in 0..m {
            let w = Sha512::digest(data);
            out.extend_from_slice(&w);
            add_be_one(&mut data);
        }
        out.truncate(len);
        out
    }
}

const DIGEST_SIZE_INTERNAL: usize = 64;

impl Default for HashDrbg {
    fn default() -> Self {
        Self::new()
    }
}

impl Drbg for HashDrbg {
    fn reseed(&mut self, entropy: &[u8], additional_input: &[u8]) -> DrbgStatus {
        if !self.instantiated {
            return DrbgStatus::NotInit;
        }
        if entropy.is_empty() {
            return DrbgStatus::InvalidArgument;
        }
        self.reseed_internal(entropy, additional_input);
        DrbgStatus::Success
    }

    fn generate(&mut self, output: &mut [u8], additional_input: &[u8]) -> DrbgStatus {
        if !self.instantiated {
            return DrbgStatus::NotInit;
        }
        if output.len() as u64 > DRBG_MAX_OUT_PER_CALL {
            return DrbgStatus::InvalidArgument;
        }
        if self.reseed_counter > DRBG_MAX_RESEED {
            return DrbgStatus::DoReseed;
        }

        if !additional_input.is_empty() {
            let mut w_material = Vec::with_capacity(1 + SEED_LEN + additional_input.len());
            w_material.push(0x02);
            w_material.extend_from_slice(&self.v);
            w_material.extend_from_slice(additional_input);
            let w = Sha512::digest(&w_material);
            w_material.zeroize();
            add_be_bytes(&mut self.v, &w);
        }

        let bytes = self.hashgen(output.len());
        output.copy_from_slice(&bytes);

        let mut h_material = Vec::with_capacity(1 + SEED_LEN);
        h_material.push(0x03);
        h_material.extend_from_slice(&self.v);
        let h = Sha512::digest(&h_material);
        h_material.zeroize();

        add_be_bytes(&mut self.v, &h);
        add_be_bytes(&mut self.v, &self.c);
        add_be_u64(&mut self.v, self.reseed_counter);

        self.reseed_counter += 1;
        DrbgStatus::Success
    }

    fn clear(&mut self) {
        self.v.zeroize();
        self.c.zeroize();
        self.reseed_counter = 0;
        self.instantiated = false;
    }

    fn reseed_counter(&self) -> u64 {
        self.reseed_counter
    }
}

impl Drop for HashDrbg {
    fn drop(&mut self) {
        self.clear();
    }
}

/// `Hash_df`: derives exactly `out_len` bytes from `input`, per §10.3.1.
/// Each iteration hashes a one-byte counter, a 32-bit bit-length, and the
/// input together.
fn hash_df(input: &[u8], out_len: usize) -> Vec<u8> {
    let bits_to_return = (out_len as u32) * 8;
    let iterations = out_len.div_ceil(DIGEST_SIZE_INTERNAL);

    let mut out = Vec::with_capacity(iterations * DIGEST_SIZE_INTERNAL);
    for i in 1..=iterations {
        let mut hasher = Sha512::new();
        hasher.update([i as u8]);
        hasher.update(bits_to_return.to_be_bytes());
        hasher.update(input);
        out.extend_from_slice(&hasher.finalize());
    }
    out.truncate(out_len);
    out
}

/// [`hash_df`] specialized to `SEED_LEN`, the only size Hash_DRBG itself
/// ever derives.
fn hash_df_seed(input: &[u8]) -> [u8; SEED_LEN] {
    let mut out = hash_df(input, SEED_LEN);
    let mut result = [0u8; SEED_LEN];
    result.copy_from_slice(&out);
    out.zeroize();
    result
}

/// Adds `b` (interpreted big-endian) into `a` modulo `2^(SEED_LEN*8)`,
/// in place. `b` may be shorter than `a`; it is right-aligned (treated
/// as the low-order bytes) before the addition.
fn add_be_bytes(a: &mut [u8; SEED_LEN], b: &[u8]) {
    debug_assert!(b.len() <= SEED_LEN);
    let offset = SEED_LEN - b.len();
    let mut carry: u16 = 0;
    for i in (0..SEED_LEN).rev() {
        let bv = if i >= offset { b[i - offset] as u16 } else { 0 };
        let sum = a[i] as u16 + bv + carry;
        a[i] = (sum & 0xFF) as u8;
        carry = sum >> 8;
    }
}

fn add_be_one(a: &mut [u8; SEED_LEN]) {
    let mut carry: u16 = 1;
    for i in (0..SEED_LEN).rev() {
        if carry == 0 {
            break;
        }
        let sum = a[i] as u16 + carry;
        a[i] = (sum & 0xFF) as u8;
        carry = sum >> 8;
    }
}

fn add_be_u64(a: &mut [u8; SEED_LEN], val: u64) {
    add_be_bytes(a, &val.to_be_bytes());
}
