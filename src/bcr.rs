//! Block-cipher counter-mode PRNG.
//!
//! A buffered reader over an internal counter-mode generator (BCG): the
//! engine encrypts an incrementing little-endian counter into a 4096-byte
//! buffer and hands out slices of it. Integer extraction is little-endian
//! and never spans a refill; a tail shorter than the requested word is
//! discarded. The same seed always reproduces the same stream.

use zeroize::Zeroizing;

use crate::ahx::Ahx;
use crate::error::{Error, Result};
use crate::hkdf::KdfDigest;
use crate::key::KeyMaterial;
use crate::provider::ProviderType;
use crate::shx::{Shx, BLOCK_SIZE};
use crate::traits::Prng;

const BUFFER_DEF: usize = 4096;
const BUFFER_MIN: usize = 64;

/// The closed set of block ciphers that can power the generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CipherType {
    /// Extended AES: HKDF(SHA-256) schedule, 22 rounds, 32-byte key.
    /// The default engine.
    Ahx,
    /// Classical AES-256 (14 rounds).
    Aes256,
    /// Classical Serpent with a 32-byte key.
    Shx256,
    /// HKDF(SHA-512)-scheduled SHX with a 64-byte key and 40 rounds.
    Shx512,
}

impl CipherType {
    /// Cipher key length in bytes; seeds carry this plus a 16-byte counter.
    pub const fn key_size(self) -> usize {
        match self {
            CipherType::Ahx => 32,
            CipherType::Aes256 => 32,
            CipherType::Shx256 => 32,
            CipherType::Shx512 => 64,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            CipherType::Ahx => "AHX256",
            CipherType::Aes256 => "Rijndael256",
            CipherType::Shx256 => "SHX256",
            CipherType::Shx512 => "SHX512",
        }
    }
}

impl Default for CipherType {
    fn default() -> Self {
        CipherType::Ahx
    }
}

enum Engine {
    Ahx(Box<Ahx>),
    Shx(Box<Shx>),
}

/// Counter-mode generator: a block cipher over an incrementing counter.
struct Bcg {
    engine: Engine,
    counter: Zeroizing<[u8; BLOCK_SIZE]>,
    parallel: bool,
}

impl Bcg {
    fn new(cipher: CipherType, key: &[u8], iv: &[u8; BLOCK_SIZE], parallel: bool) -> Result<Self> {
        let engine = match cipher {
            CipherType::Ahx => {
                let mut ahx = Ahx::with_kdf(KdfDigest::Sha256, 22)?;
                ahx.initialize(true, &KeyMaterial::new(key.to_vec()))?;
                Engine::Ahx(Box::new(ahx))
            }
            CipherType::Aes256 => {
                let mut ahx = Ahx::new();
                ahx.initialize(true, &KeyMaterial::new(key.to_vec()))?;
                Engine::Ahx(Box::new(ahx))
            }
            CipherType::Shx256 => {
                let mut shx = Shx::new();
                shx.initialize(true, &KeyMaterial::new(key.to_vec()))?;
                Engine::Shx(Box::new(shx))
            }
            CipherType::Shx512 => {
                let mut shx = Shx::with_kdf(KdfDigest::Sha512, 40)?;
                shx.initialize(true, &KeyMaterial::new(key.to_vec()))?;
                Engine::Shx(Box::new(shx))
            }
        };
        Ok(Self {
            engine,
            counter: Zeroizing::new(*iv),
            parallel,
        })
    }

    /// Fill `output` (a multiple of the block size) with keystream.
    fn generate(&mut self, output: &mut [u8]) -> Result<()> {
        debug_assert_eq!(output.len() % BLOCK_SIZE, 0);

        // the wide path eats 16 blocks per pass; identical output, fewer passes
        const WIDE: usize = 16 * BLOCK_SIZE;
        if self.parallel && matches!(self.engine, Engine::Shx(_)) {
            let mut wide_chunks = output.chunks_exact_mut(WIDE);
            let mut counters = [0u8; WIDE];
            for chunk in &mut wide_chunks {
                for block in counters.chunks_exact_mut(BLOCK_SIZE) {
                    block.copy_from_slice(self.counter.as_ref());
                    increment(&mut self.counter);
                }
                if let Engine::Shx(shx) = &self.engine {
                    shx.transform_2048(&counters, chunk)?;
                }
            }
            for block in wide_chunks.into_remainder().chunks_exact_mut(BLOCK_SIZE) {
                self.encrypt_counter(block)?;
            }
            return Ok(());
        }

        for block in output.chunks_exact_mut(BLOCK_SIZE) {
            self.encrypt_counter(block)?;
        }
        Ok(())
    }

    fn encrypt_counter(&mut self, output: &mut [u8]) -> Result<()> {
        match &self.engine {
            Engine::Ahx(ahx) => {
                ahx.transform(self.counter.as_ref(), output)?;
            }
            Engine::Shx(shx) => {
                shx.transform(self.counter.as_ref(), output)?;
            }
        }
        increment(&mut self.counter);
        Ok(())
    }
}

#[inline]
fn increment(counter: &mut [u8; BLOCK_SIZE]) {
    for byte in counter.iter_mut() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}

/// Block-counter PRNG (BCR).
pub struct Bcr {
    cipher: CipherType,
    parallel: bool,
    buffer: Zeroizing<Vec<u8>>,
    buffer_index: usize,
    seed: Zeroizing<Vec<u8>>,
    generator: Bcg,
}

impl Bcr {
    /// Seed a generator from the named entropy provider.
    pub fn new(cipher: CipherType, provider: ProviderType, parallel: bool) -> Result<Self> {
        let mut source = provider.instance()?;
        let mut seed = Zeroizing::new(vec![0u8; cipher.key_size() + BLOCK_SIZE]);
        source.get_bytes(&mut seed)?;
        Self::from_seed(&seed, cipher, parallel)
    }

    /// Seed a generator explicitly; identical seeds yield identical
    /// streams. The seed carries the cipher key followed by the 16-byte
    /// starting counter.
    pub fn from_seed(seed: &[u8], cipher: CipherType, parallel: bool) -> Result<Self> {
        Self::with_buffer_size(seed, cipher, parallel, BUFFER_DEF)
    }

    /// `from_seed` with an explicit buffer size (rounded to whole blocks,
    /// minimum 64 bytes).
    pub fn with_buffer_size(
        seed: &[u8],
        cipher: CipherType,
        parallel: bool,
        buffer_size: usize,
    ) -> Result<Self> {
        if buffer_size < BUFFER_MIN || buffer_size % BLOCK_SIZE != 0 {
            return Err(Error::config("BCR::with_buffer_size", "buffer size"));
        }
        let need = cipher.key_size() + BLOCK_SIZE;
        if seed.len() < need {
            return Err(Error::config("BCR::from_seed", "seed length"));
        }
        let seed = Zeroizing::new(seed[..need].to_vec());
        let generator = Self::build_generator(cipher, &seed, parallel)?;
        Ok(Self {
            cipher,
            parallel,
            buffer: Zeroizing::new(vec![0u8; buffer_size]),
            buffer_index: buffer_size,
            seed,
            generator,
        })
    }

    pub fn cipher_type(&self) -> CipherType {
        self.cipher
    }

    fn build_generator(cipher: CipherType, seed: &[u8], parallel: bool) -> Result<Bcg> {
        let (key, iv) = seed.split_at(cipher.key_size());
        let iv: [u8; BLOCK_SIZE] = iv.try_into().expect("seed carries a full counter");
        Bcg::new(cipher, key, &iv, parallel)
    }

    fn refill(&mut self) -> Result<()> {
        self.generator.generate(&mut self.buffer)?;
        self.buffer_index = 0;
        Ok(())
    }

    /// Copy `N` buffered bytes, refilling first when fewer remain.
    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        if self.buffer.len() - self.buffer_index < N {
            self.refill()?;
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buffer[self.buffer_index..self.buffer_index + N]);
        self.buffer_index += N;
        Ok(out)
    }
}

impl Prng for Bcr {
    fn name(&self) -> String {
        format!("BCR-{}{}", self.cipher.name(), if self.parallel { "W" } else { "" })
    }

    fn get_bytes(&mut self, output: &mut [u8]) -> Result<()> {
        let mut written = 0;
        while written < output.len() {
            if self.buffer_index == self.buffer.len() {
                self.refill()?;
            }
            let take = (output.len() - written).min(self.buffer.len() - self.buffer_index);
            output[written..written + take]
                .copy_from_slice(&self.buffer[self.buffer_index..self.buffer_index + take]);
            self.buffer_index += take;
            written += take;
        }
        Ok(())
    }

    fn next_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take::<2>()?))
    }

    fn next_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take::<4>()?))
    }

    fn next_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take::<8>()?))
    }

    fn fill_u16(&mut self, output: &mut [u16]) -> Result<()> {
        for slot in output {
            *slot = self.next_u16()?;
        }
        Ok(())
    }

    fn fill_u32(&mut self, output: &mut [u32]) -> Result<()> {
        for slot in output {
            *slot = self.next_u32()?;
        }
        Ok(())
    }

    fn fill_u64(&mut self, output: &mut [u64]) -> Result<()> {
        for slot in output {
            *slot = self.next_u64()?;
        }
        Ok(())
    }

    /// Restart the stream from the retained seed.
    fn reset(&mut self) -> Result<()> {
        self.generator = Self::build_generator(self.cipher, &self.seed, self.parallel)?;
        self.buffer_index = self.buffer.len();
        Ok(())
    }
}
