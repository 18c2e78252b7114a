//! CTR_DRBG: SP 800-90Ar1 §10.2.1, AES-256, no derivation function.

use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes256;
use zeroize::Zeroize;

use crate::consts::{CTR_DRBG_BLOCK_LEN, CTR_DRBG_KEY_LEN, CTR_DRBG_MAX_OUT_PER_CALL, CTR_DRBG_MAX_RESEED, CTR_DRBG_SEED_LEN};
use crate::drbg::Drbg;
use crate::errors::DrbgStatus;

/// CTR_DRBG state: a 16-byte counter `V`, a 32-byte AES-256 key `K`, and a
/// reseed counter. Scrubbed on [`CtrDrbg::clear`] and on drop.
pub struct CtrDrbg {
    k: [u8; CTR_DRBG_KEY_LEN],
    v: [u8; CTR_DRBG_BLOCK_LEN],
    reseed_counter: u64,
    instantiated: bool,
}

impl CtrDrbg {
    /// Builds an uninstantiated state; call [`CtrDrbg::init`] before use.
    pub fn new() -> Self {
        CtrDrbg {
            k: [0u8; CTR_DRBG_KEY_LEN],
            v: [0u8; CTR_DRBG_BLOCK_LEN],
            reseed_counter: 0,
            instantiated: false,
        }
    }

    /// Instantiates the generator from a 48-byte entropy seed and an
    /// optional personalization string (length <= 48).
    pub fn init(&mut self, entropy: &[u8], personalization: Option<&[u8]>) -> DrbgStatus {
        if entropy.len() != CTR_DRBG_SEED_LEN {
            return DrbgStatus::InvalidArgument;
        }
        if let Some(p) = personalization {
            if p.len() > CTR_DRBG_SEED_LEN {
                return DrbgStatus::InvalidArgument;
            }
        }

        let seed = xor_padded(entropy, personalization.unwrap_or(&[]));
        self.k = [0u8; CTR_DRBG_KEY_LEN];
        self.v = [0u8; CTR_DRBG_BLOCK_LEN];
        self.update(&seed);
        self.reseed_counter = 1;
        self.instantiated = true;
        DrbgStatus::Success
    }

    fn update(&mut self, data: &[u8]) {
        debug_assert!(data.len() <= CTR_DRBG_SEED_LEN);
        let cipher = Aes256::new_from_slice(&self.k).expect("AES-256 key is always 32 bytes");

        let mut temp = [0u8; CTR_DRBG_SEED_LEN];
        for block_idx in 0..3 {
            increment_counter(&mut self.v);
            let mut block = self.v.into();
            cipher.encrypt_block(&mut block);
            temp[block_idx * CTR_DRBG_BLOCK_LEN..(block_idx + 1) * CTR_DRBG_BLOCK_LEN].copy_from_slice(&block);
        }
        for (t, d) in temp.iter_mut().zip(data.iter()) {
            *t ^= d;
        }
        self.k.copy_from_slice(&temp[0..CTR_DRBG_KEY_LEN]);
        self.v.copy_from_slice(&temp[CTR_DRBG_KEY_LEN..CTR_DRBG_SEED_LEN]);
        temp.zeroize();
    }
}

impl Default for CtrDrbg {
    fn default() -> Self {
        Self::new()
    }
}

impl Drbg for CtrDrbg {
    fn reseed(&mut self, entropy: &[u8], additional_input: &[u8]) -> DrbgStatus {
        if !self.instantiated {
            return DrbgStatus::NotInit;
        }
        if entropy.len() != CTR_DRBG_SEED_LEN || additional_input.len() > CTR_DRBG_SEED_LEN {
            return DrbgStatus::InvalidArgument;
        }
        let seed = xor_padded(entropy, additional_input);
        self.update(&seed);
        self.reseed_counter = 1;
        DrbgStatus::Success
    }

    fn generate(&mut self, output: &mut [u8], additional_input: &[u8]) -> DrbgStatus {
        if !self.instantiated {
            return DrbgStatus::NotInit;
        }
        if output.len() as u64 > CTR_DRBG_MAX_OUT_PER_CALL || additional_input.len() > CTR_DRBG_SEED_LEN {
            return DrbgStatus::InvalidArgument;
        }
        if self.reseed_counter > CTR_DRBG_MAX_RESEED {
            return DrbgStatus::DoReseed;
        }

        if !additional_input.is_empty() {
            self.update(additional_input);
        }

        let cipher = Aes256::new_from_slice(&self.k).expect("AES-256 key is always 32 bytes");
        let mut produced = 0;
        while produced < output.len() {
            increment_counter(&mut self.v);
            let mut block = self.v.into();
            cipher.encrypt_block(&mut block);
            let take = (output.len() - produced).min(CTR_DRBG_BLOCK_LEN);
            output[produced..produced + take].copy_from_slice(&block[..take]);
            produced += take;
        }

        // Backtracking resistance: update again with the same additional
        // input (possibly empty) so compromising the post-output state
        // doesn't reveal what was just produced.
        self.update(additional_input);
        self.reseed_counter += 1;
        DrbgStatus::Success
    }

    fn clear(&mut self) {
        self.k.zeroize();
        self.v.zeroize();
        self.reseed_counter = 0;
        self.instantiated = false;
    }

    fn reseed_counter(&self) -> u64 {
        self.reseed_counter
    }
}

impl Drop for CtrDrbg {
    fn drop(&mut self) {
        self.clear();
    }
}

/// `a XOR (b padded with zeros to a.len())`, the seed derivation used by
/// both instantiate and reseed.
fn xor_padded(a: &[u8], b: &[u8]) -> [u8; CTR_DRBG_SEED_LEN] {
    let mut out = [0u8; CTR_DRBG_SEED_LEN];
    out[..a.len()].copy_from_slice(a);
    for (o, bb) in out.iter_mut().zip(b.iter()) {
        *o ^= bb;
    }
    out
}

/// Increments only the last 32 bits of `V`, big-endian (the
/// "ctr_len = blocklen" variant — upper 96 bits never carry).
fn increment_counter(v: &mut [u8; CTR_DRBG_BLOCK_LEN]) {
    let mut ctr = u32::from_be_bytes([v[12], v[13], v[14], v[15]]);
    ctr = ctr.wrapping_add(1);
    v[12..16].copy_from_slice(&ctr.to_be_bytes());
}
