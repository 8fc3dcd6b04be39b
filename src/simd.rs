//! Portable wide words for the bulk cipher paths.
//!
//! [`Wide<L>`] carries one 32-bit word from each of `L` independent blocks,
//! so the bitsliced round functions in [`crate::serpent`] advance 4, 8, or
//! 16 blocks per pass. Plain array arithmetic keeps the output identical on
//! every target; the compiler vectorizes the lanes where the ISA allows.

use core::ops::{BitAnd, BitOr, BitXor, Not};

use crate::serpent::Word;

/// `L` lanes of `u32`, one per block.
#[derive(Clone, Copy)]
pub(crate) struct Wide<const L: usize>([u32; L]);

/// 4-lane word (128-bit register width).
pub(crate) type W128 = Wide<4>;
/// 8-lane word (256-bit register width).
pub(crate) type W256 = Wide<8>;
/// 16-lane word (512-bit register width).
pub(crate) type W512 = Wide<16>;

impl<const L: usize> BitXor for Wide<L> {
    type Output = Self;

    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        Wide(core::array::from_fn(|i| self.0[i] ^ rhs.0[i]))
    }
}

impl<const L: usize> BitAnd for Wide<L> {
    type Output = Self;

    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        Wide(core::array::from_fn(|i| self.0[i] & rhs.0[i]))
    }
}

impl<const L: usize> BitOr for Wide<L> {
    type Output = Self;

    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        Wide(core::array::from_fn(|i| self.0[i] | rhs.0[i]))
    }
}

impl<const L: usize> Not for Wide<L> {
    type Output = Self;

    #[inline(always)]
    fn not(self) -> Self {
        Wide(core::array::from_fn(|i| !self.0[i]))
    }
}

impl<const L: usize> Word for Wide<L> {
    #[inline(always)]
    fn splat(value: u32) -> Self {
        Wide([value; L])
    }

    #[inline(always)]
    fn rotl(self, n: u32) -> Self {
        Wide(core::array::from_fn(|i| self.0[i].rotate_left(n)))
    }

    #[inline(always)]
    fn rotr(self, n: u32) -> Self {
        Wide(core::array::from_fn(|i| self.0[i].rotate_right(n)))
    }

    #[inline(always)]
    fn shl(self, n: u32) -> Self {
        Wide(core::array::from_fn(|i| self.0[i] << n))
    }
}

/// Gather `L` consecutive 16-byte blocks into four wide words, transposed
/// so word `i` holds word `i` of every block (little-endian).
#[inline]
pub(crate) fn load_blocks<const L: usize>(input: &[u8]) -> [Wide<L>; 4] {
    debug_assert!(input.len() >= 16 * L);
    core::array::from_fn(|word| {
        Wide(core::array::from_fn(|lane| {
            let off = lane * 16 + word * 4;
            u32::from_le_bytes([input[off], input[off + 1], input[off + 2], input[off + 3]])
        }))
    })
}

/// Scatter four wide words back out as `L` consecutive 16-byte blocks.
#[inline]
pub(crate) fn store_blocks<const L: usize>(words: &[Wide<L>; 4], output: &mut [u8]) {
    debug_assert!(output.len() >= 16 * L);
    for (word, w) in words.iter().enumerate() {
        for (lane, &value) in w.0.iter().enumerate() {
            let off = lane * 16 + word * 4;
            output[off..off + 4].copy_from_slice(&value.to_le_bytes());
        }
    }
}
