use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes256;
use rng_core::{CtrDrbg, Drbg, DrbgStatus};

/// A from-scratch CTR_DRBG (AES-256, no derivation function) built directly
/// against SP 800-90Ar1 §10.2.1 out of the raw AES block cipher, independent
/// of `rng_core`'s own `update`/`generate` internals. Pinning the crate's
/// output against this lets a divergence from the standard's update/generate
/// equations show up as a test failure, not just a divergence from itself.
struct Reference {
    k: [u8; 32],
    v: [u8; 16],
}

impl Reference {
    fn new(entropy: &[u8; 48]) -> Self {
        let mut r = Reference { k: [0u8; 32], v: [0u8; 16] };
        r.update(entropy);
        r
    }

    fn increment(v: &mut [u8; 16]) {
        let ctr = u32::from_be_bytes([v[12], v[13], v[14], v[15]]).wrapping_add(1);
        v[12..16].copy_from_slice(&ctr.to_be_bytes());
    }

    fn update(&mut self, data: &[u8]) {
        let cipher = Aes256::new_from_slice(&self.k).unwrap();
        let mut temp = [0u8; 48];
        for block_idx in 0..3 {
            Self::increment(&mut self.v);
            let mut block = self.v.into();
            cipher.encrypt_block(&mut block);
            temp[block_idx * 16..(block_idx + 1) * 16].copy_from_slice(&block);
        }
        for (t, d) in temp.iter_mut().zip(data.iter()) {
            *t ^= d;
        }
        self.k.copy_from_slice(&temp[0..32]);
        self.v.copy_from_slice(&temp[32..48]);
    }

    fn reseed(&mut self, entropy: &[u8; 48]) {
        self.update(entropy);
    }

    fn generate(&mut self, out: &mut [u8]) {
        let cipher = Aes256::new_from_slice(&self.k).unwrap();
        let mut produced = 0;
        while produced < out.len() {
            Self::increment(&mut self.v);
            let mut block = self.v.into();
            cipher.encrypt_block(&mut block);
            let take = (out.len() - produced).min(16);
            out[produced..produced + take].copy_from_slice(&block[..take]);
            produced += take;
        }
        self.update(&[]);
    }
}

#[test]
fn matches_independent_reimplementation_for_all_zero_seed() {
    // All-zero entropy, no personalization, reseed with all-zero entropy,
    // generate twice: the second output is compared against an
    // independently built reference rather than only against itself.
    let entropy = [0u8; 48];

    let mut reference = Reference::new(&entropy);
    reference.reseed(&entropy);
    let mut expected_first = [0u8; 64];
    let mut expected_second = [0u8; 64];
    reference.generate(&mut expected_first);
    reference.generate(&mut expected_second);

    let mut drbg = CtrDrbg::new();
    assert_eq!(drbg.init(&entropy, None), DrbgStatus::Success);
    assert_eq!(drbg.reseed(&entropy, &[]), DrbgStatus::Success);

    let mut first = [0u8; 64];
    let mut second = [0u8; 64];
    assert_eq!(drbg.generate(&mut first, &[]), DrbgStatus::Success);
    assert_eq!(drbg.generate(&mut second, &[]), DrbgStatus::Success);

    assert_eq!(first, expected_first);
    assert_eq!(second, expected_second);
    assert_ne!(first, second, "backtracking resistance must change the key/counter between calls");
}

#[test]
fn invalid_argument_leaves_state_usable() {
    let mut drbg = CtrDrbg::new();
    drbg.init(&[0u8; 48], None);

    let mut oversized = vec![0u8; (1usize << 16) + 1];
    assert_eq!(drbg.generate(&mut oversized, &[]), DrbgStatus::InvalidArgument);

    let mut ok = [0u8; 16];
    assert_eq!(drbg.generate(&mut ok, &[]), DrbgStatus::Success);
}
