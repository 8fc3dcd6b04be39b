//! HKDF Extract-and-Expand (RFC 5869) over a closed digest set.
//!
//! The digest is a tagged variant rather than a type parameter; the two
//! members are the schedules the extended ciphers are defined over. The
//! HMAC core comes from the `hmac` crate, the loop logic lives here.

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Digests the key-expansion engines may be built over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KdfDigest {
    Sha256,
    Sha512,
}

impl KdfDigest {
    /// Digest output size in bytes.
    pub const fn output_size(self) -> usize {
        match self {
            KdfDigest::Sha256 => 32,
            KdfDigest::Sha512 => 64,
        }
    }

    /// Underlying compression block size in bytes (the HMAC key width).
    pub const fn block_size(self) -> usize {
        match self {
            KdfDigest::Sha256 => 64,
            KdfDigest::Sha512 => 128,
        }
    }

    /// Bytes of the final block consumed by the digest's length padding.
    const fn padding_size(self) -> usize {
        match self {
            KdfDigest::Sha256 => 9,
            KdfDigest::Sha512 => 17,
        }
    }

    /// Largest info string that still hashes inside one block alongside the
    /// finalizer padding and the one-byte expand counter.
    pub const fn info_max(self) -> usize {
        self.block_size() - (self.padding_size() + 1)
    }

    pub const fn name(self) -> &'static str {
        match self {
            KdfDigest::Sha256 => "SHA256",
            KdfDigest::Sha512 => "SHA512",
        }
    }
}

/// `PRK = HMAC(salt, IKM)`. An empty salt is the RFC default (a zero block).
pub fn extract(digest: KdfDigest, salt: &[u8], ikm: &[u8]) -> Zeroizing<Vec<u8>> {
    match digest {
        KdfDigest::Sha256 => extract_mac::<HmacSha256>(salt, ikm),
        KdfDigest::Sha512 => extract_mac::<HmacSha512>(salt, ikm),
    }
}

/// `T(i) = HMAC(PRK, T(i-1) || info || i)`, concatenated into `okm`.
///
/// Fails once the requested length exceeds `255 · digest_size`.
pub fn expand(digest: KdfDigest, prk: &[u8], info: &[u8], okm: &mut [u8]) -> Result<()> {
    if okm.len() > 255 * digest.output_size() {
        return Err(Error::limit("HKDF::expand", "output length (255 * digest size)"));
    }
    match digest {
        KdfDigest::Sha256 => expand_mac::<HmacSha256>(prk, info, okm),
        KdfDigest::Sha512 => expand_mac::<HmacSha512>(prk, info, okm),
    }
    Ok(())
}

/// Extract-then-Expand in one call.
pub fn extract_and_expand(
    digest: KdfDigest,
    ikm: &[u8],
    salt: &[u8],
    info: &[u8],
    okm: &mut [u8],
) -> Result<()> {
    let prk = extract(digest, salt, ikm);
    expand(digest, &prk, info, okm)
}

fn extract_mac<M: Mac + KeyInit>(salt: &[u8], ikm: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut mac = <M as Mac>::new_from_slice(salt).expect("HMAC accepts any key length");
    mac.update(ikm);
    Zeroizing::new(mac.finalize().into_bytes().to_vec())
}

fn expand_mac<M: Mac + KeyInit>(prk: &[u8], info: &[u8], okm: &mut [u8]) {
    let hash_len = <M as hmac::digest::OutputSizeUser>::output_size();
    let mut previous: Zeroizing<Vec<u8>> = Zeroizing::new(Vec::new());
    let mut counter = 1u8;

    for chunk in okm.chunks_mut(hash_len) {
        let mut mac = <M as Mac>::new_from_slice(prk).expect("HMAC accepts any key length");
        mac.update(&previous);
        mac.update(info);
        mac.update(&[counter]);
        let block = mac.finalize().into_bytes();
        chunk.copy_from_slice(&block[..chunk.len()]);
        *previous = block.to_vec();
        counter = counter.wrapping_add(1);
    }
}
