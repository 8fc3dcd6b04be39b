//! Capability traits over the engine families.
//!
//! The sets are closed: dispatch inside the crate goes through tagged
//! variants, and these traits exist for the consumers layered on top
//! (the asymmetric constructions draw keystream through [`Prng`] and
//! authenticate exchanged secrets through [`Aead`]).

use crate::error::Result;

/// A pseudo-random byte and integer source.
pub trait Prng {
    fn name(&self) -> String;

    /// Fill `output` with pseudo-random bytes.
    fn get_bytes(&mut self, output: &mut [u8]) -> Result<()>;

    fn next_u16(&mut self) -> Result<u16>;
    fn next_u32(&mut self) -> Result<u32>;
    fn next_u64(&mut self) -> Result<u64>;

    /// Fill a typed slice, `size_of::<T>()` little-endian bytes per element.
    fn fill_u16(&mut self, output: &mut [u16]) -> Result<()>;
    fn fill_u32(&mut self, output: &mut [u32]) -> Result<()>;
    fn fill_u64(&mut self, output: &mut [u64]) -> Result<()>;

    /// Restart the generator stream.
    fn reset(&mut self) -> Result<()>;
}

/// A deterministic random bit generator.
pub trait Drbg {
    fn name(&self) -> &'static str;

    /// Generate pseudo-random bytes; returns the count produced.
    fn generate(&mut self, output: &mut [u8]) -> Result<usize>;

    /// Fold fresh seed material into the state.
    fn update(&mut self, seed: &[u8]) -> Result<()>;

    /// Clear the state; `initialize` is required before the next use.
    fn reset(&mut self);
}

/// A 16-byte-block cipher engine in a fixed transform direction.
pub trait BlockCipherEngine {
    fn block_size(&self) -> usize;
    fn is_initialized(&self) -> bool;

    /// Transform one block in the initialized direction.
    fn transform(&self, input: &[u8], output: &mut [u8]) -> Result<()>;
}

/// Authenticated encryption with associated data, as consumed by the
/// asymmetric layer. Implementations are external to this crate.
///
/// The contract: initialization takes a key and a 12-byte nonce;
/// associated data is absorbed before the payload; encryption appends a
/// 16-byte tag; decryption verifies the tag in constant time (see
/// [`crate::ct`]) and fails with
/// [`Error::AuthenticationFailure`](crate::Error::AuthenticationFailure)
/// before releasing any plaintext.
pub trait Aead {
    /// Required nonce length in bytes.
    const NONCE_SIZE: usize = 12;

    /// Authentication tag length in bytes.
    const TAG_SIZE: usize = 16;

    fn initialize(&mut self, encryption: bool, key: &[u8], nonce: &[u8]) -> Result<()>;

    /// Absorb associated data; must precede the payload.
    fn set_associated_data(&mut self, data: &[u8]) -> Result<()>;

    /// Encrypt `input`, writing ciphertext plus tag into `output`.
    fn encrypt(&mut self, input: &[u8], output: &mut [u8]) -> Result<()>;

    /// Verify and decrypt; on tag mismatch no plaintext is written.
    fn decrypt(&mut self, input: &[u8], output: &mut [u8]) -> Result<()>;
}
