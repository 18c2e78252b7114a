//! Lightweight Trivium-style stream generator, reseeded from the
//! [`Pool`](crate::pool::Pool).
//!
//! Tap positions follow the eSTREAM Trivium specification rather than any
//! one reference implementation's masked-AND macro.

use zeroize::Zeroize;

use crate::consts::{STREAM_GEN_IV_LEN, STREAM_GEN_RESEED_INTERVAL, STREAM_GEN_WARMUP_CYCLES};
use crate::errors::RngError;
use crate::pool::Pool;

/// Fixed, public key combined with a pool-derived IV on every reseed.
/// Not secret: only the IV (drawn from the entropy pool) varies between
/// reseeds, which is what gives this generator its unpredictability.
const STREAM_GEN_KEY: [u8; 10] = [0x53, 0x43, 0x2D, 0x54, 0x52, 0x49, 0x56, 0x49, 0x55, 0x4D];

/// Trivium-style keystream generator for bulk, non-cryptographic-strength
/// output (random-variate consumers).
pub struct StreamGen {
    /// 288-bit register, nine 32-bit words; bit `pos - 1` (1-indexed `s_pos`
    /// in Trivium's own numbering) lives at `regs[(pos-1)/32]` bit
    /// `(pos-1) % 32`.
    regs: [u32; 9],
    /// Output bytes produced since the last reseed.
    count: u64,
    pool: &'static Pool,
}

impl StreamGen {
    /// Creates a new generator, seeding it from the pool immediately.
    pub fn new(pool: &'static Pool) -> Result<Self, RngError> {
        let mut gen = StreamGen { regs: [0; 9], count: 0, pool };
        gen.reseed()?;
        Ok(gen)
    }

    /// Draws a fresh IV from the pool and reinitializes the register.
    pub fn reseed(&mut self) -> Result<(), RngError> {
        let mut iv = [0u8; STREAM_GEN_IV_LEN];
        self.pool.fetch(&mut iv, false)?;
        self.init_registers(&STREAM_GEN_KEY, &iv);
        iv.zeroize();
        self.count = 0;
        Ok(())
    }

    fn get_bit(&self, pos: usize) -> u32 {
        let idx = pos - 1;
        (self.regs[idx / 32] >> (idx % 32)) & 1
    }

    fn set_bit(&mut self, pos: usize, val: u32) {
        let idx = pos - 1;
        let word = &mut self.regs[idx / 32];
        if val & 1 == 1 {
            *word |= 1 << (idx % 32);
        } else {
            *word &= !(1 << (idx % 32));
        }
    }

    fn init_registers(&mut self, key: &[u8; 10], iv: &[u8; 10]) {
        self.regs = [0; 9];
        // s_1..s_80 = key, s_81..s_93 = 0
        for bit in 0..80 {
            let byte = key[bit / 8];
            let v = (byte >> (bit % 8)) & 1;
            self.set_bit(1 + bit, v as u32);
        }
        // s_94..s_173 = IV, s_174..s_177 = 0
        for bit in 0..80 {
            let byte = iv[bit / 8];
            let v = (byte >> (bit % 8)) & 1;
            self.set_bit(94 + bit, v as u32);
        }
        // s_178..s_285 = 0, s_286 = s_287 = s_288 = 1
        self.set_bit(286, 1);
        self.set_bit(287, 1);
        self.set_bit(288, 1);

        for _ in 0..STREAM_GEN_WARMUP_CYCLES {
            self.clock();
        }
    }

    /// Clocks the register once, producing one keystream bit.
    fn clock(&mut self) -> u8 {
        let t1 = self.get_bit(66) ^ self.get_bit(93);
        let t2 = self.get_bit(162) ^ self.get_bit(177);
        let t3 = self.get_bit(243) ^ self.get_bit(288);
        let z = t1 ^ t2 ^ t3;

        let t1p = t1 ^ (self.get_bit(91) & self.get_bit(92)) ^ self.get_bit(171);
        let t2p = t2 ^ (self.get_bit(175) & self.get_bit(176)) ^ self.get_bit(264);
        let t3p = t3 ^ (self.get_bit(286) & self.get_bit(287)) ^ self.get_bit(69);

        // s1 (1..93) shifts toward 93, fed by t3p at position 1.
        for pos in (2..=93).rev() {
            let v = self.get_bit(pos - 1);
            self.set_bit(pos, v);
        }
        self.set_bit(1, t3p);

        // s2 (94..177) shifts, fed by t1p at position 94.
        for pos in (95..=177).rev() {
            let v = self.get_bit(pos - 1);
            self.set_bit(pos, v);
        }
        self.set_bit(94, t1p);

        // s3 (178..288) shifts, fed by t2p at position 178.
        for pos in (179..=288).rev() {
            let v = self.get_bit(pos - 1);
            self.set_bit(pos, v);
        }
        self.set_bit(178, t2p);

        z as u8
    }

    fn next_byte(&mut self) -> u8 {
        let mut byte = 0u8;
        for i in 0..8 {
            byte |= self.clock() << i;
        }
        byte
    }
}

impl rand_core::RngCore for StreamGen {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.fill_bytes(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.fill_bytes(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for slot in dst.iter_mut() {
            if self.count >= STREAM_GEN_RESEED_INTERVAL {
                if let Err(err) = self.reseed() {
                    log::warn!("stream generator reseed failed ({err}); continuing with current state");
                }
            }
            *slot = self.next_byte();
            self.count += 1;
        }
    }
}

impl Drop for StreamGen {
    fn drop(&mut self) {
        self.regs.zeroize();
    }
}
