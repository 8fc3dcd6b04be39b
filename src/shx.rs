//! SHX: Serpent with an extended key schedule.
//!
//! Two schedules share one round function. Without a KDF digest the
//! classical rotate-polynomial schedule runs: 16/24/32-byte keys give the
//! standard 32-round cipher, a 64-byte key widens the polynomial to 16
//! taps and forces 40 rounds. With a digest configured the subkeys come
//! from HKDF over that digest and the cipher runs 32..64 rounds.
//!
//! `transform_512/1024/2048` drive 4/8/16 blocks through the same
//! bitsliced rounds on wide words; their output is bit-identical to the
//! scalar transform applied per block.

use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::hkdf::{self, KdfDigest};
use crate::key::{KeyMaterial, SymmetricKeySize};
use crate::serpent::{self, Quad, Word};
use crate::simd;

/// Cipher block size in bytes.
pub const BLOCK_SIZE: usize = 16;

const PHI: u32 = 0x9E37_79B9;
const MIN_ROUNDS: usize = 32;
const MAX_ROUNDS: usize = 64;

/// Default HKDF personalization when the caller supplies no info string.
const DEF_INFO: &[u8] = b"SHX version 1 information string";

/// Key-schedule S-box sequence; the pass terminates with one more S3.
const SCHEDULE_BOXES: [usize; 8] = [3, 2, 1, 0, 7, 6, 5, 4];

/// The extended Serpent block cipher.
pub struct Shx {
    exp_key: Zeroizing<Vec<u32>>,
    rounds: usize,
    kdf: Option<KdfDigest>,
    info: Zeroizing<Vec<u8>>,
    key_bits: usize,
    encryption: bool,
    initialized: bool,
}

impl Shx {
    /// Classical Serpent; the round count follows the key size.
    pub fn new() -> Self {
        Self {
            exp_key: Zeroizing::new(Vec::new()),
            rounds: MIN_ROUNDS,
            kdf: None,
            info: Zeroizing::new(DEF_INFO.to_vec()),
            key_bits: 0,
            encryption: false,
            initialized: false,
        }
    }

    /// HKDF-scheduled variant over `digest` with an explicit round count
    /// from the legal set {32, 40, 48, 56, 64}.
    pub fn with_kdf(digest: KdfDigest, rounds: usize) -> Result<Self> {
        if !(MIN_ROUNDS..=MAX_ROUNDS).contains(&rounds) || rounds % 8 != 0 {
            return Err(Error::config("SHX::with_kdf", "rounds count"));
        }
        Ok(Self {
            exp_key: Zeroizing::new(Vec::new()),
            rounds,
            kdf: Some(digest),
            info: Zeroizing::new(DEF_INFO.to_vec()),
            key_bits: 0,
            encryption: false,
            initialized: false,
        })
    }

    pub const fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_encryption(&self) -> bool {
        self.encryption
    }

    pub fn kdf_digest(&self) -> Option<KdfDigest> {
        self.kdf
    }

    /// Longest accepted info (distribution code) in HKDF mode; zero in
    /// classical mode.
    pub fn distribution_code_max(&self) -> usize {
        match self.kdf {
            Some(digest) => digest.info_max(),
            None => 0,
        }
    }

    pub fn legal_rounds(&self) -> &'static [usize] {
        match self.kdf {
            Some(_) => &[32, 40, 48, 56, 64],
            None => &[32, 40],
        }
    }

    pub fn legal_key_sizes(&self) -> Vec<SymmetricKeySize> {
        match self.kdf {
            None => vec![
                SymmetricKeySize::new(16, BLOCK_SIZE, 0),
                SymmetricKeySize::new(24, BLOCK_SIZE, 0),
                SymmetricKeySize::new(32, BLOCK_SIZE, 0),
                SymmetricKeySize::new(64, BLOCK_SIZE, 0),
            ],
            Some(digest) => {
                let info_max = digest.info_max();
                vec![
                    // minimum allowable HMAC key
                    SymmetricKeySize::new(digest.output_size(), BLOCK_SIZE, info_max),
                    // a full compression block, no zero-padding inside HMAC
                    SymmetricKeySize::new(digest.block_size(), BLOCK_SIZE, info_max),
                    // saturation; triggers the extract step
                    SymmetricKeySize::new(digest.block_size() * 2, BLOCK_SIZE, info_max),
                ]
            }
        }
    }

    pub fn name(&self) -> String {
        match self.kdf {
            None => format!("Serpent{}", self.key_bits),
            Some(_) => format!("SHX{}", self.key_bits),
        }
    }

    /// Expand the key schedule and set the transform direction.
    pub fn initialize(&mut self, encryption: bool, material: &KeyMaterial) -> Result<()> {
        let key = material.key();
        if !SymmetricKeySize::contains_key(&self.legal_key_sizes(), key.len()) {
            return Err(Error::config("SHX::initialize", "key size"));
        }
        if self.kdf.is_some() && material.info().len() > self.distribution_code_max() {
            return Err(Error::config("SHX::initialize", "info size"));
        }
        if !material.info().is_empty() {
            self.info = Zeroizing::new(material.info().to_vec());
        }

        match self.kdf {
            Some(digest) => self.secure_expand(digest, key)?,
            None => self.standard_expand(key),
        }

        self.key_bits = key.len() * 8;
        self.encryption = encryption;
        self.initialized = true;
        log::debug!("{} initialized: {} rounds", self.name(), self.rounds);
        Ok(())
    }

    /// Transform one 16-byte block in the initialized direction.
    pub fn transform(&self, input: &[u8], output: &mut [u8]) -> Result<()> {
        self.check_io(input, output, BLOCK_SIZE)?;
        let quad = load_block(input);
        let quad = if self.encryption {
            encrypt_rounds(&self.exp_key, self.rounds, quad)
        } else {
            decrypt_rounds(&self.exp_key, self.rounds, quad)
        };
        store_block(quad, output);
        Ok(())
    }

    /// Transform 4 blocks (64 bytes) on 128-bit-wide lanes.
    pub fn transform_512(&self, input: &[u8], output: &mut [u8]) -> Result<()> {
        self.check_io(input, output, 4 * BLOCK_SIZE)?;
        self.transform_wide::<4>(input, output);
        Ok(())
    }

    /// Transform 8 blocks (128 bytes) on 256-bit-wide lanes.
    pub fn transform_1024(&self, input: &[u8], output: &mut [u8]) -> Result<()> {
        self.check_io(input, output, 8 * BLOCK_SIZE)?;
        self.transform_wide::<8>(input, output);
        Ok(())
    }

    /// Transform 16 blocks (256 bytes) on 512-bit-wide lanes.
    pub fn transform_2048(&self, input: &[u8], output: &mut [u8]) -> Result<()> {
        self.check_io(input, output, 16 * BLOCK_SIZE)?;
        self.transform_wide::<16>(input, output);
        Ok(())
    }

    /// Encrypt one block; fails when the engine was initialized for
    /// decryption.
    pub fn encrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<()> {
        if self.initialized && !self.encryption {
            return Err(Error::config(
                "SHX::encrypt_block",
                "engine is initialized for decryption",
            ));
        }
        self.transform(input, output)
    }

    /// Decrypt one block; fails when the engine was initialized for
    /// encryption.
    pub fn decrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<()> {
        if self.initialized && self.encryption {
            return Err(Error::config(
                "SHX::decrypt_block",
                "engine is initialized for encryption",
            ));
        }
        self.transform(input, output)
    }

    fn check_io(&self, input: &[u8], output: &[u8], len: usize) -> Result<()> {
        if !self.initialized {
            return Err(Error::uninit("SHX::transform"));
        }
        if input.len() != len || output.len() != len {
            return Err(Error::config("SHX::transform", "block length"));
        }
        Ok(())
    }

    fn transform_wide<const L: usize>(&self, input: &[u8], output: &mut [u8]) {
        let [r0, r1, r2, r3] = simd::load_blocks::<L>(input);
        let quad = if self.encryption {
            encrypt_rounds(&self.exp_key, self.rounds, (r0, r1, r2, r3))
        } else {
            decrypt_rounds(&self.exp_key, self.rounds, (r0, r1, r2, r3))
        };
        simd::store_blocks(&[quad.0, quad.1, quad.2, quad.3], output);
    }

    /// Classical schedule: reverse-copied big-endian key words through the
    /// rotating polynomial, then the S-box pass S3,S2,S1,S0,S7,S6,S5,S4 …
    /// ending with a final S3.
    fn standard_expand(&mut self, key: &[u8]) {
        // a 64-byte key runs the 16-tap polynomial and 8 extra rounds
        self.rounds = if key.len() == 64 { 40 } else { MIN_ROUNDS };
        let key_size = 4 * (self.rounds + 1);
        let pad_size = if key.len() < 32 { 16 } else { key.len() / 2 };

        let mut wp = Zeroizing::new(vec![0u32; pad_size]);
        let mut index = 0;
        let mut offset = key.len();
        while offset > 0 {
            wp[index] = u32::from_be_bytes(key[offset - 4..offset].try_into().unwrap());
            index += 1;
            offset -= 4;
        }
        // pad a short key
        if index < 8 {
            wp[index] = 1;
        }

        let mut wk = Zeroizing::new(vec![0u32; key_size]);
        if pad_size == 16 {
            for i in 8..16 {
                wp[i] = (wp[i - 8] ^ wp[i - 5] ^ wp[i - 3] ^ wp[i - 1] ^ PHI ^ (i as u32 - 8))
                    .rotate_left(11);
            }
            wk[..8].copy_from_slice(&wp[8..16]);
            for i in 8..key_size {
                wk[i] = (wk[i - 8] ^ wk[i - 5] ^ wk[i - 3] ^ wk[i - 1] ^ PHI ^ i as u32)
                    .rotate_left(11);
            }
        } else {
            // 64-byte key: 16-tap polynomial (taps 16,13,11,10,8,5,3,1)
            for i in 16..32 {
                wp[i] = (wp[i - 16]
                    ^ wp[i - 13]
                    ^ wp[i - 11]
                    ^ wp[i - 10]
                    ^ wp[i - 8]
                    ^ wp[i - 5]
                    ^ wp[i - 3]
                    ^ wp[i - 1]
                    ^ PHI
                    ^ (i as u32 - 16))
                    .rotate_left(11);
            }
            wk[..16].copy_from_slice(&wp[16..32]);
            for i in 16..key_size {
                wk[i] = (wk[i - 16]
                    ^ wk[i - 13]
                    ^ wk[i - 11]
                    ^ wk[i - 10]
                    ^ wk[i - 8]
                    ^ wk[i - 5]
                    ^ wk[i - 3]
                    ^ wk[i - 1]
                    ^ PHI
                    ^ i as u32)
                    .rotate_left(11);
            }
        }

        let mut cnt = 0;
        let mut cycle = 0;
        while cnt < key_size - 4 {
            let boxed = serpent::sbox(
                SCHEDULE_BOXES[cycle & 7],
                (wk[cnt], wk[cnt + 1], wk[cnt + 2], wk[cnt + 3]),
            );
            wk[cnt] = boxed.0;
            wk[cnt + 1] = boxed.1;
            wk[cnt + 2] = boxed.2;
            wk[cnt + 3] = boxed.3;
            cnt += 4;
            cycle += 1;
        }
        let boxed = serpent::sbox(3, (wk[cnt], wk[cnt + 1], wk[cnt + 2], wk[cnt + 3]));
        wk[cnt] = boxed.0;
        wk[cnt + 1] = boxed.1;
        wk[cnt + 2] = boxed.2;
        wk[cnt + 3] = boxed.3;

        self.exp_key = wk;
    }

    /// HKDF schedule: `16·(rounds+1)` bytes of keystream interpreted as
    /// little-endian words. Extract-then-Expand always runs; the key tail
    /// beyond one digest block becomes the salt, empty for shorter keys.
    fn secure_expand(&mut self, digest: KdfDigest, key: &[u8]) -> Result<()> {
        let key_size = 4 * (self.rounds + 1);
        let mut raw = Zeroizing::new(vec![0u8; key_size * 4]);

        let split = digest.block_size().min(key.len());
        let (ikm, salt) = key.split_at(split);
        hkdf::extract_and_expand(digest, ikm, salt, &self.info, &mut raw)?;

        let mut wk = Zeroizing::new(vec![0u32; key_size]);
        for (word, chunk) in wk.iter_mut().zip(raw.chunks_exact(4)) {
            *word = u32::from_le_bytes(chunk.try_into().unwrap());
        }
        self.exp_key = wk;
        Ok(())
    }
}

impl Default for Shx {
    fn default() -> Self {
        Self::new()
    }
}

impl crate::traits::BlockCipherEngine for Shx {
    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn is_initialized(&self) -> bool {
        Shx::is_initialized(self)
    }

    fn transform(&self, input: &[u8], output: &mut [u8]) -> Result<()> {
        Shx::transform(self, input, output)
    }
}

#[inline]
fn load_block(input: &[u8]) -> Quad<u32> {
    (
        u32::from_le_bytes(input[0..4].try_into().unwrap()),
        u32::from_le_bytes(input[4..8].try_into().unwrap()),
        u32::from_le_bytes(input[8..12].try_into().unwrap()),
        u32::from_le_bytes(input[12..16].try_into().unwrap()),
    )
}

#[inline]
fn store_block((r0, r1, r2, r3): Quad<u32>, output: &mut [u8]) {
    output[0..4].copy_from_slice(&r0.to_le_bytes());
    output[4..8].copy_from_slice(&r1.to_le_bytes());
    output[8..12].copy_from_slice(&r2.to_le_bytes());
    output[12..16].copy_from_slice(&r3.to_le_bytes());
}

#[inline]
fn xor_key<W: Word>((r0, r1, r2, r3): Quad<W>, key: &[u32], at: usize) -> Quad<W> {
    (
        r0 ^ W::splat(key[at]),
        r1 ^ W::splat(key[at + 1]),
        r2 ^ W::splat(key[at + 2]),
        r3 ^ W::splat(key[at + 3]),
    )
}

fn encrypt_rounds<W: Word>(key: &[u32], rounds: usize, mut quad: Quad<W>) -> Quad<W> {
    for r in 0..rounds {
        quad = xor_key(quad, key, 4 * r);
        quad = serpent::sbox(r, quad);
        if r != rounds - 1 {
            quad = serpent::linear_transform(quad);
        }
    }
    xor_key(quad, key, 4 * rounds)
}

fn decrypt_rounds<W: Word>(key: &[u32], rounds: usize, mut quad: Quad<W>) -> Quad<W> {
    quad = xor_key(quad, key, 4 * rounds);
    quad = serpent::inv_sbox(rounds - 1, quad);
    quad = xor_key(quad, key, 4 * (rounds - 1));
    for r in (0..rounds - 1).rev() {
        quad = serpent::inverse_transform(quad);
        quad = serpent::inv_sbox(r, quad);
        quad = xor_key(quad, key, 4 * r);
    }
    quad
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(cipher_enc: &Shx, cipher_dec: &Shx, plain: &[u8; 16]) {
        let mut ct = [0u8; 16];
        let mut pt = [0u8; 16];
        cipher_enc.transform(plain, &mut ct).unwrap();
        assert_ne!(&ct, plain);
        cipher_dec.transform(&ct, &mut pt).unwrap();
        assert_eq!(&pt, plain);
    }

    #[test]
    fn classical_roundtrip_all_key_sizes() {
        let plain = [0x42u8; 16];
        for key_len in [16usize, 24, 32, 64] {
            let key: Vec<u8> = (0..key_len as u8).collect();
            let material = KeyMaterial::new(key);
            let mut enc = Shx::new();
            let mut dec = Shx::new();
            enc.initialize(true, &material).unwrap();
            dec.initialize(false, &material).unwrap();
            roundtrip(&enc, &dec, &plain);
        }
    }

    #[test]
    fn sixtyfour_byte_key_runs_forty_rounds() {
        let mut cipher = Shx::new();
        cipher
            .initialize(true, &KeyMaterial::new(vec![0u8; 64]))
            .unwrap();
        assert_eq!(cipher.rounds(), 40);
        assert_eq!(cipher.exp_key.len(), 4 * 41);
    }

    #[test]
    fn kdf_mode_roundtrip_across_round_counts() {
        let plain = [0x07u8; 16];
        for rounds in [32usize, 40, 48, 56, 64] {
            let material = KeyMaterial::new(vec![0x55; 64]);
            let mut enc = Shx::with_kdf(KdfDigest::Sha512, rounds).unwrap();
            let mut dec = Shx::with_kdf(KdfDigest::Sha512, rounds).unwrap();
            enc.initialize(true, &material).unwrap();
            dec.initialize(false, &material).unwrap();
            assert_eq!(enc.rounds(), rounds);
            roundtrip(&enc, &dec, &plain);
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(Shx::with_kdf(KdfDigest::Sha256, 33).is_err());
        assert!(Shx::with_kdf(KdfDigest::Sha256, 72).is_err());

        let mut cipher = Shx::new();
        assert!(cipher
            .initialize(true, &KeyMaterial::new(vec![0u8; 20]))
            .is_err());

        let mut kdf_cipher = Shx::with_kdf(KdfDigest::Sha256, 32).unwrap();
        let oversized_info = vec![0u8; KdfDigest::Sha256.info_max() + 1];
        assert!(kdf_cipher
            .initialize(true, &KeyMaterial::with_info(vec![0u8; 32], vec![], oversized_info))
            .is_err());
    }

    #[test]
    fn direction_is_enforced() {
        let mut enc = Shx::new();
        enc.initialize(true, &KeyMaterial::new(vec![1u8; 32])).unwrap();
        let (input, mut output) = ([0u8; 16], [0u8; 16]);
        assert!(enc.encrypt_block(&input, &mut output).is_ok());
        assert!(enc.decrypt_block(&input, &mut output).is_err());
    }

    // A key at or below the digest block still runs Extract, with the
    // RFC-default empty salt; the raw key is never used as the PRK.
    #[test]
    fn sub_block_keys_extract_with_empty_salt() {
        let key = vec![0x9Du8; 64];
        let mut cipher = Shx::with_kdf(KdfDigest::Sha512, 32).unwrap();
        cipher.initialize(true, &KeyMaterial::new(key.clone())).unwrap();

        let prk = hkdf::extract(KdfDigest::Sha512, &[], &key);
        let mut raw = vec![0u8; 16 * 33];
        hkdf::expand(KdfDigest::Sha512, &prk, DEF_INFO, &mut raw).unwrap();
        let expected: Vec<u32> = raw
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes(chunk.try_into().unwrap()))
            .collect();
        assert_eq!(&cipher.exp_key[..], &expected[..]);
    }

    #[test]
    fn info_changes_the_kdf_stream() {
        let plain = [0u8; 16];
        let key = vec![0x11u8; 64];

        let mut a = Shx::with_kdf(KdfDigest::Sha512, 40).unwrap();
        a.initialize(true, &KeyMaterial::new(key.clone())).unwrap();
        let mut b = Shx::with_kdf(KdfDigest::Sha512, 40).unwrap();
        b.initialize(true, &KeyMaterial::with_info(key, vec![], b"alt code".to_vec()))
            .unwrap();

        let (mut ca, mut cb) = ([0u8; 16], [0u8; 16]);
        a.transform(&plain, &mut ca).unwrap();
        b.transform(&plain, &mut cb).unwrap();
        assert_ne!(ca, cb);
    }
}
