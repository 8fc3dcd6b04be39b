//! Incremental Keccak-f[1600] sponge.
//!
//! The permutation itself is `keccak::f1600`; this module owns the rate
//! bookkeeping: byte-granular absorption, domain padding, and block
//! serialization. Absorb and squeeze alternate; once a state has been
//! finished, only an explicit re-absorb (see [`Sponge::restart_absorb`])
//! returns it to the absorbing phase.
//!
//! Rates: 168 bytes for the 128-bit-strength mode, 136 for the 256-bit
//! mode. Domain bytes: 0x1F (SHAKE), 0x04 (cSHAKE).

use zeroize::Zeroize;

/// Lanes in the Keccak-f[1600] state.
pub const STATE_WORDS: usize = 25;

/// SHAKE-128 / 128-bit-strength rate in bytes.
pub const RATE_128: usize = 168;

/// SHAKE-256 / 256-bit-strength rate in bytes.
pub const RATE_256: usize = 136;

/// SHAKE domain separation byte.
pub const SHAKE_DOMAIN: u8 = 0x1F;

/// cSHAKE domain separation byte.
pub const CSHAKE_DOMAIN: u8 = 0x04;

/// A single Keccak sponge with byte-granular absorb position.
#[derive(Clone)]
pub struct Sponge {
    state: [u64; STATE_WORDS],
    rate: usize,
    position: usize,
}

impl Sponge {
    /// A zeroed state with the given rate (must be a multiple of 8 and
    /// smaller than the 200-byte state).
    pub fn new(rate: usize) -> Self {
        debug_assert!(rate % 8 == 0 && rate < 200);
        Self {
            state: [0u64; STATE_WORDS],
            rate,
            position: 0,
        }
    }

    #[inline]
    pub fn rate(&self) -> usize {
        self.rate
    }

    /// XOR `input` into the rate region, permuting at each block boundary.
    pub fn absorb(&mut self, input: &[u8]) {
        for &byte in input {
            self.state[self.position / 8] ^= u64::from(byte) << (8 * (self.position % 8));
            self.position += 1;
            if self.position == self.rate {
                keccak::f1600(&mut self.state);
                self.position = 0;
            }
        }
    }

    /// Zero-pad the current block to the rate boundary and permute
    /// (the tail of SP 800-185 `bytepad`). No-op on an empty block.
    pub fn pad_block(&mut self) {
        if self.position != 0 {
            keccak::f1600(&mut self.state);
            self.position = 0;
        }
    }

    /// Apply the domain byte and final-bit padding, then permute.
    /// The state is left holding its first squeezable block.
    pub fn finish(&mut self, domain: u8) {
        self.state[self.position / 8] ^= u64::from(domain) << (8 * (self.position % 8));
        self.state[(self.rate - 1) / 8] ^= 0x80u64 << 56;
        keccak::f1600(&mut self.state);
        self.position = 0;
    }

    /// Advance the squeeze phase by one permutation.
    #[inline]
    pub fn permute(&mut self) {
        keccak::f1600(&mut self.state);
    }

    /// Serialize the rate region (lanes `0..rate/8`) little-endian into
    /// `out`, which must be exactly one rate block.
    pub fn read_block(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), self.rate);
        for (chunk, word) in out.chunks_exact_mut(8).zip(self.state.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
    }

    /// Return a finished state to the absorbing phase without clearing it,
    /// so fresh seed material can be folded in over the existing state.
    #[inline]
    pub fn restart_absorb(&mut self) {
        self.position = 0;
    }
}

impl Zeroize for Sponge {
    fn zeroize(&mut self) {
        self.state.zeroize();
        self.position = 0;
    }
}

impl Drop for Sponge {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// SP 800-185 `left_encode`: the minimal big-endian representation of
/// `value`, preceded by its byte length. Returns the bytes written into
/// `buffer` (at least 2).
pub fn left_encode(buffer: &mut [u8], value: usize) -> usize {
    let mut n = 0usize;
    let mut v = value;
    while v != 0 && n < core::mem::size_of::<usize>() {
        n += 1;
        v >>= 8;
    }
    if n == 0 {
        n = 1;
    }
    for i in 1..=n {
        buffer[i] = (value >> (8 * (n - i))) as u8;
    }
    buffer[0] = n as u8;
    n + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enc(value: usize) -> Vec<u8> {
        let mut buf = [0u8; 9];
        let n = left_encode(&mut buf, value);
        buf[..n].to_vec()
    }

    #[test]
    fn left_encode_boundaries() {
        assert_eq!(enc(0), vec![0x01, 0x00]);
        assert_eq!(enc(255), vec![0x01, 0xFF]);
        assert_eq!(enc(256), vec![0x02, 0x01, 0x00]);
        assert_eq!(enc(168), vec![0x01, 0xA8]);
        assert_eq!(enc(0x0001_0000), vec![0x03, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn shake256_empty_input() {
        // SHAKE-256("") first 32 bytes, FIPS 202.
        let expected = [
            0x46, 0xb9, 0xdd, 0x2b, 0x0b, 0xa8, 0x8d, 0x13, 0x23, 0x3b, 0x3f, 0xeb, 0x74, 0x3e,
            0xeb, 0x24, 0x3f, 0xcd, 0x52, 0xea, 0x62, 0xb8, 0x1b, 0x82, 0xb5, 0x0c, 0x27, 0x64,
            0x6e, 0xd5, 0x76, 0x2f,
        ];
        let mut sponge = Sponge::new(RATE_256);
        sponge.finish(SHAKE_DOMAIN);
        let mut block = [0u8; RATE_256];
        sponge.read_block(&mut block);
        assert_eq!(&block[..32], &expected);
    }

    #[test]
    fn absorb_is_chunking_independent() {
        let data = [0x5Au8; 300];
        let mut a = Sponge::new(RATE_128);
        a.absorb(&data);
        a.finish(SHAKE_DOMAIN);

        let mut b = Sponge::new(RATE_128);
        for chunk in data.chunks(7) {
            b.absorb(chunk);
        }
        b.finish(SHAKE_DOMAIN);

        let (mut ba, mut bb) = ([0u8; RATE_128], [0u8; RATE_128]);
        a.read_block(&mut ba);
        b.read_block(&mut bb);
        assert_eq!(ba, bb);
    }
}
