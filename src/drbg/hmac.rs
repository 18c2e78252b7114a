//! HMAC_DRBG: SP 800-90Ar1 §10.1.2, HMAC-SHA-512.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroize;

use crate::consts::{DRBG_MAX_OUT_PER_CALL, DRBG_MAX_RESEED, HMAC_DRBG_OUTLEN};
use crate::drbg::Drbg;
use crate::errors::DrbgStatus;

type HmacSha512 = Hmac<Sha512>;

const OUTLEN: usize = HMAC_DRBG_OUTLEN;

/// HMAC_DRBG state: key `K`, value `V`, and a reseed counter, per
/// §10.1.2.1.
pub struct HmacDrbg {
    k: [u8; OUTLEN],
    v: [u8; OUTLEN],
    reseed_counter: u64,
    instantiated: bool,
}

impl HmacDrbg {
    pub fn new() -> Self {
        HmacDrbg { k: [0u8; OUTLEN], v: [1u8; OUTLEN], reseed_counter: 0, instantiated: false }
    }

    /// The `Update` function of §10.1.2.2: folds `provided_data` into `K`
    /// and `V` in one or two HMAC passes.
    fn update(&mut self, provided_data: &[u8]) {
        let mut mac = HmacSha512::new_from_slice(&self.k).expect("HMAC accepts any key length");
        mac.update(&self.v);
        mac.update(&[0x00]);
        mac.update(provided_data);
        self.k.copy_from_slice(&mac.finalize().into_bytes());

        let mut mac = HmacSha512::new_from_slice(&self.k).expect("HMAC accepts any key length");
        mac.update(&self.v);
        self.v.copy_from_slice(&mac.finalize().into_bytes());

        if provided_data.is_empty() {
            return;
        }

        let mut mac = HmacSha512::new_from_slice(&self.k).expect("HMAC accepts any key length");
        mac.update(&self.v);
        mac.update(&[0x01]);
        mac.update(provided_data);
        self.k.copy_from_slice(&mac.finalize().into_bytes());

        let mut mac = HmacSha512::new_from_slice(&self.k).expect("HMAC accepts any key length");
        mac.update(&self.v);
        self.v.copy_from_slice(&mac.finalize().into_bytes());
    }

    /// Instantiates from entropy, an optional nonce, and an optional
    /// personalization string, per §10.1.2.3.
    pub fn init(&mut self, entropy: &[u8], nonce: &[u8], personalization: &[u8]) -> DrbgStatus {
        if entropy.is_empty() {
            return DrbgStatus::InvalidArgument;
        }

        self.k = [0u8; OUTLEN];
        self.v = [1u8; OUTLEN];

        let mut seed_material = Vec::with_capacity(entropy.len() + nonce.len() + personalization.len());
        seed_material.extend_from_slice(entropy);
        seed_material.extend_from_slice(nonce);
        seed_material.extend_from_slice(personalization);
        self.update(&seed_material);
        seed_material.zeroize();

        self.reseed_counter = 1;
        self.instantiated = true;
        DrbgStatus::Success
    }
}

impl Default for HmacDrbg {
    fn default() -> Self {
        Self::new()
    }
}

impl Drbg for HmacDrbg {
    fn reseed(&mut self, entropy: &[u8], additional_input: &[u8]) -> DrbgStatus {
        if !self.instantiated {
            return DrbgStatus::NotInit;
        }
        if entropy.is_empty() {
            return DrbgStatus::InvalidArgument;
        }
        let mut seed_material = Vec::with_capacity(entropy.len() + additional_input.len());
        seed_material.extend_from_slice(entropy);
        seed_material.extend_from_slice(additional_input);
        self.update(&seed_material);
        seed_material.zeroize();
        self.reseed_counter = 1;
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
            self.update(additional_input);
        }

        let mut produced = 0;
        while produced < output.len() {
            let mut mac = HmacSha512::new_from_slice(&self.k).expect("HMAC accepts any key length");
            mac.update(&self.v);
            self.v.copy_from_slice(&mac.finalize().into_bytes());
            let take = (output.len() - produced).min(OUTLEN);
            output[produced..produced + take].copy_from_slice(&self.v[..take]);
            produced += take;
        }

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

impl Drop for HmacDrbg {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instantiate_and_generate_is_deterministic() {
        let mut a = HmacDrbg::new();
        let mut b = HmacDrbg::new();
        assert_eq!(a.init(b"entropy-input-material-000000000", b"nonce", b"pers"), DrbgStatus::Success);
        assert_eq!(b.init(b"entropy-input-material-000000000", b"nonce", b"pers"), DrbgStatus::Success);

        let mut out_a = [0u8; 40];
        let mut out_b = [0u8; 40];
        assert_eq!(a.generate(&mut out_a, &[]), DrbgStatus::Success);
        assert_eq!(b.generate(&mut out_b, &[]), DrbgStatus::Success);
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn successive_generate_calls_diverge() {
        let mut drbg = HmacDrbg::new();
        drbg.init(b"entropy-input-material-000000000", b"nonce", b"");
        let mut out1 = [0u8; 32];
        let mut out2 = [0u8; 32];
        drbg.generate(&mut out1, &[]);
        drbg.generate(&mut out2, &[]);
        assert_ne!(out1, out2);
    }

    #[test]
    fn additional_input_changes_output() {
        let mut a = HmacDrbg::new();
        let mut b = HmacDrbg::new();
        a.init(b"entropy-input-material-000000000", b"nonce", b"");
        b.init(b"entropy-input-material-000000000", b"nonce", b"");
        let mut out_a = [0u8; 32];
        let mut out_b = [0u8; 32];
        a.generate(&mut out_a, b"extra");
        b.generate(&mut out_b, &[]);
        assert_ne!(out_a, out_b);
    }

    #[test]
    fn generate_before_init_fails() {
        let mut drbg = HmacDrbg::new();
        let mut out = [0u8; 16];
        assert_eq!(drbg.generate(&mut out, &[]), DrbgStatus::NotInit);
    }

    #[test]
    fn generate_rejects_oversized_output() {
        let mut drbg = HmacDrbg::new();
        drbg.init(b"entropy-input-material-000000000", b"nonce", b"");
        let mut out = vec![0u8; (DRBG_MAX_OUT_PER_CALL + 1) as usize];
        assert_eq!(drbg.generate(&mut out, &[]), DrbgStatus::InvalidArgument);
    }

    #[test]
    fn init_rejects_empty_entropy() {
        let mut drbg = HmacDrbg::new();
        assert_eq!(drbg.init(b"", b"nonce", b""), DrbgStatus::InvalidArgument);
    }

    #[test]
    fn reseed_resets_counter_and_changes_output() {
        let mut drbg = HmacDrbg::new();
        drbg.init(b"entropy-input-material-000000000", b"nonce", b"");
        let mut before = [0u8; 16];
        drbg.generate(&mut before, &[]);
        assert_eq!(drbg.reseed(b"fresh-entropy-input-material-0000", &[]), DrbgStatus::Success);
        assert_eq!(drbg.reseed_counter(), 1);
        let mut after = [0u8; 16];
        drbg.generate(&mut after, &[]);
        assert_ne!(before, after);
    }

    #[test]
    fn clear_zeroizes_state() {
        let mut drbg = HmacDrbg::new();
        drbg.init(b"entropy-input-material-000000000", b"nonce", b"");
        drbg.clear();
        assert_eq!(drbg.k, [0u8; OUTLEN]);
        assert_eq!(drbg.v, [0u8; OUTLEN]);
        assert!(!drbg.instantiated);
    }
}
