//! AHX: Rijndael (AES) with an extended key schedule.
//!
//! The counterpart of [`crate::shx::Shx`] on the AES round function. The
//! classical FIPS-197 schedule drives 10/12/14 rounds for 16/24/32-byte
//! keys; with a KDF digest configured the round keys come from HKDF over
//! that digest and the cipher stretches to 10..38 rounds. The entropy
//! provider's output stage runs the 38-round HKDF(SHA-512) configuration.
//!
//! The S-box is computed, not looked up: constant-time field inversion
//! (`x^254` over GF(2^8)) followed by the affine transform, so no
//! secret-indexed table access exists anywhere in the round.

use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::hkdf::{self, KdfDigest};
use crate::key::{KeyMaterial, SymmetricKeySize};

const BLOCK_SIZE: usize = 16;
const MIN_ROUNDS: usize = 10;
const MAX_ROUNDS: usize = 38;

/// Default HKDF personalization when the caller supplies no info string.
const DEF_INFO: &[u8] = b"AHX version 1 information string";

/// The extended AES block cipher.
pub struct Ahx {
    round_keys: Zeroizing<Vec<u8>>,
    rounds: usize,
    kdf: Option<KdfDigest>,
    info: Zeroizing<Vec<u8>>,
    key_bits: usize,
    encryption: bool,
    initialized: bool,
}

impl Ahx {
    /// Classical AES; the round count follows the key size.
    pub fn new() -> Self {
        Self {
            round_keys: Zeroizing::new(Vec::new()),
            rounds: MIN_ROUNDS,
            kdf: None,
            info: Zeroizing::new(DEF_INFO.to_vec()),
            key_bits: 0,
            encryption: false,
            initialized: false,
        }
    }

    /// HKDF-scheduled variant over `digest` with an explicit even round
    /// count from 10..38.
    pub fn with_kdf(digest: KdfDigest, rounds: usize) -> Result<Self> {
        if !(MIN_ROUNDS..=MAX_ROUNDS).contains(&rounds) || rounds % 2 != 0 {
            return Err(Error::config("AHX::with_kdf", "rounds count"));
        }
        Ok(Self {
            round_keys: Zeroizing::new(Vec::new()),
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

    pub fn distribution_code_max(&self) -> usize {
        match self.kdf {
            Some(digest) => digest.info_max(),
            None => 0,
        }
    }

    pub fn legal_key_sizes(&self) -> Vec<SymmetricKeySize> {
        match self.kdf {
            None => vec![
                SymmetricKeySize::new(16, BLOCK_SIZE, 0),
                SymmetricKeySize::new(24, BLOCK_SIZE, 0),
                SymmetricKeySize::new(32, BLOCK_SIZE, 0),
            ],
            Some(digest) => {
                let info_max = digest.info_max();
                vec![
                    SymmetricKeySize::new(digest.output_size(), BLOCK_SIZE, info_max),
                    SymmetricKeySize::new(digest.block_size(), BLOCK_SIZE, info_max),
                    SymmetricKeySize::new(digest.block_size() * 2, BLOCK_SIZE, info_max),
                ]
            }
        }
    }

    pub fn name(&self) -> String {
        match self.kdf {
            None => format!("Rijndael{}", self.key_bits),
            Some(_) => format!("AHX{}", self.key_bits),
        }
    }

    /// Expand the key schedule and set the transform direction.
    pub fn initialize(&mut self, encryption: bool, material: &KeyMaterial) -> Result<()> {
        let key = material.key();
        if !SymmetricKeySize::contains_key(&self.legal_key_sizes(), key.len()) {
            return Err(Error::config("AHX::initialize", "key size"));
        }
        if self.kdf.is_some() && material.info().len() > self.distribution_code_max() {
            return Err(Error::config("AHX::initialize", "info size"));
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
        if !self.initialized {
            return Err(Error::uninit("AHX::transform"));
        }
        if input.len() != BLOCK_SIZE || output.len() != BLOCK_SIZE {
            return Err(Error::config("AHX::transform", "block length"));
        }
        let mut state: [u8; BLOCK_SIZE] = input.try_into().expect("length checked");
        if self.encryption {
            self.encrypt_state(&mut state);
        } else {
            self.decrypt_state(&mut state);
        }
        output.copy_from_slice(&state);
        Ok(())
    }

    /// Encrypt one block; fails when initialized for decryption.
    pub fn encrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<()> {
        if self.initialized && !self.encryption {
            return Err(Error::config(
                "AHX::encrypt_block",
                "engine is initialized for decryption",
            ));
        }
        self.transform(input, output)
    }

    /// Decrypt one block; fails when initialized for encryption.
    pub fn decrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<()> {
        if self.initialized && self.encryption {
            return Err(Error::config(
                "AHX::decrypt_block",
                "engine is initialized for encryption",
            ));
        }
        self.transform(input, output)
    }

    fn encrypt_state(&self, state: &mut [u8; BLOCK_SIZE]) {
        add_round_key(state, self.round_key(0));
        for r in 1..self.rounds {
            sub_bytes(state);
            shift_rows(state);
            mix_columns(state);
            add_round_key(state, self.round_key(r));
        }
        sub_bytes(state);
        shift_rows(state);
        add_round_key(state, self.round_key(self.rounds));
    }

    fn decrypt_state(&self, state: &mut [u8; BLOCK_SIZE]) {
        add_round_key(state, self.round_key(self.rounds));
        inv_shift_rows(state);
        inv_sub_bytes(state);
        for r in (1..self.rounds).rev() {
            add_round_key(state, self.round_key(r));
            inv_mix_columns(state);
            inv_shift_rows(state);
            inv_sub_bytes(state);
        }
        add_round_key(state, self.round_key(0));
    }

    fn round_key(&self, round: usize) -> &[u8] {
        &self.round_keys[BLOCK_SIZE * round..BLOCK_SIZE * (round + 1)]
    }

    /// FIPS-197 schedule; Nk-word keys give Nk+6 rounds.
    fn standard_expand(&mut self, key: &[u8]) {
        let nk = key.len() / 4;
        self.rounds = nk + 6;
        let total_words = 4 * (self.rounds + 1);

        let mut words = Zeroizing::new(vec![[0u8; 4]; total_words]);
        for (word, chunk) in words.iter_mut().zip(key.chunks_exact(4)) {
            word.copy_from_slice(chunk);
        }

        let mut rcon: u8 = 0x01;
        for i in nk..total_words {
            let mut temp = words[i - 1];
            if i % nk == 0 {
                temp = [
                    sbox(temp[1]) ^ rcon,
                    sbox(temp[2]),
                    sbox(temp[3]),
                    sbox(temp[0]),
                ];
                rcon = xtime(rcon);
            } else if nk > 6 && i % nk == 4 {
                temp = [sbox(temp[0]), sbox(temp[1]), sbox(temp[2]), sbox(temp[3])];
            }
            for (out, prev) in temp.iter_mut().zip(words[i - nk]) {
                *out ^= prev;
            }
            words[i] = temp;
        }

        let mut flat = Zeroizing::new(vec![0u8; total_words * 4]);
        for (chunk, word) in flat.chunks_exact_mut(4).zip(words.iter()) {
            chunk.copy_from_slice(word);
        }
        self.round_keys = flat;
    }

    /// HKDF schedule: `16·(rounds+1)` round-key bytes. Extract-then-Expand
    /// always runs; the key tail beyond one digest block is the salt,
    /// empty for shorter keys.
    fn secure_expand(&mut self, digest: KdfDigest, key: &[u8]) -> Result<()> {
        let mut raw = Zeroizing::new(vec![0u8; BLOCK_SIZE * (self.rounds + 1)]);

        let split = digest.block_size().min(key.len());
        let (ikm, salt) = key.split_at(split);
        hkdf::extract_and_expand(digest, ikm, salt, &self.info, &mut raw)?;

        self.round_keys = raw;
        Ok(())
    }
}

impl Default for Ahx {
    fn default() -> Self {
        Self::new()
    }
}

impl crate::traits::BlockCipherEngine for Ahx {
    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn is_initialized(&self) -> bool {
        Ahx::is_initialized(self)
    }

    fn transform(&self, input: &[u8], output: &mut [u8]) -> Result<()> {
        Ahx::transform(self, input, output)
    }
}

// -- round primitives --------------------------------------------------------
//
// The state is column-major: byte i of a block sits at row i%4, column
// i/4. Every helper below is branch-free and index-fixed.

#[inline(always)]
fn xtime(a: u8) -> u8 {
    (a << 1) ^ (0x1B & (a >> 7).wrapping_neg())
}

/// Carry-less GF(2^8) multiply, reduction polynomial 0x11B.
#[inline]
fn gf_mul(a: u8, b: u8) -> u8 {
    let mut r = 0u8;
    let mut x = a;
    let mut y = b;
    for _ in 0..8 {
        r ^= x & (y & 1).wrapping_neg();
        x = xtime(x);
        y >>= 1;
    }
    r
}

/// Field inversion as `a^254`; maps 0 to 0 as the S-box requires.
#[inline]
fn gf_inv(a: u8) -> u8 {
    let a2 = gf_mul(a, a);
    let a4 = gf_mul(a2, a2);
    let a8 = gf_mul(a4, a4);
    let a16 = gf_mul(a8, a8);
    let a32 = gf_mul(a16, a16);
    let a64 = gf_mul(a32, a32);
    let a128 = gf_mul(a64, a64);
    // 254 = 11111110b
    gf_mul(
        a128,
        gf_mul(a64, gf_mul(a32, gf_mul(a16, gf_mul(a8, gf_mul(a4, a2))))),
    )
}

#[inline]
fn sbox(a: u8) -> u8 {
    let x = gf_inv(a);
    x ^ x.rotate_left(1) ^ x.rotate_left(2) ^ x.rotate_left(3) ^ x.rotate_left(4) ^ 0x63
}

#[inline]
fn inv_sbox(s: u8) -> u8 {
    let x = s.rotate_left(1) ^ s.rotate_left(3) ^ s.rotate_left(6) ^ 0x05;
    gf_inv(x)
}

fn sub_bytes(state: &mut [u8; BLOCK_SIZE]) {
    for byte in state.iter_mut() {
        *byte = sbox(*byte);
    }
}

fn inv_sub_bytes(state: &mut [u8; BLOCK_SIZE]) {
    for byte in state.iter_mut() {
        *byte = inv_sbox(*byte);
    }
}

fn shift_rows(state: &mut [u8; BLOCK_SIZE]) {
    let s = *state;
    for row in 1..4 {
        for col in 0..4 {
            state[row + 4 * col] = s[row + 4 * ((col + row) % 4)];
        }
    }
}

fn inv_shift_rows(state: &mut [u8; BLOCK_SIZE]) {
    let s = *state;
    for row in 1..4 {
        for col in 0..4 {
            state[row + 4 * ((col + row) % 4)] = s[row + 4 * col];
        }
    }
}

fn mix_columns(state: &mut [u8; BLOCK_SIZE]) {
    for col in state.chunks_exact_mut(4) {
        let (a0, a1, a2, a3) = (col[0], col[1], col[2], col[3]);
        col[0] = xtime(a0) ^ xtime(a1) ^ a1 ^ a2 ^ a3;
        col[1] = a0 ^ xtime(a1) ^ xtime(a2) ^ a2 ^ a3;
        col[2] = a0 ^ a1 ^ xtime(a2) ^ xtime(a3) ^ a3;
        col[3] = xtime(a0) ^ a0 ^ a1 ^ a2 ^ xtime(a3);
    }
}

fn inv_mix_columns(state: &mut [u8; BLOCK_SIZE]) {
    for col in state.chunks_exact_mut(4) {
        let (a0, a1, a2, a3) = (col[0], col[1], col[2], col[3]);
        col[0] = gf_mul(a0, 14) ^ gf_mul(a1, 11) ^ gf_mul(a2, 13) ^ gf_mul(a3, 9);
        col[1] = gf_mul(a0, 9) ^ gf_mul(a1, 14) ^ gf_mul(a2, 11) ^ gf_mul(a3, 13);
        col[2] = gf_mul(a0, 13) ^ gf_mul(a1, 9) ^ gf_mul(a2, 14) ^ gf_mul(a3, 11);
        col[3] = gf_mul(a0, 11) ^ gf_mul(a1, 13) ^ gf_mul(a2, 9) ^ gf_mul(a3, 14);
    }
}

fn add_round_key(state: &mut [u8; BLOCK_SIZE], round_key: &[u8]) {
    for (byte, &k) in state.iter_mut().zip(round_key) {
        *byte ^= k;
    }
}
