//! Keying material containers and legal-size descriptors.
//!
//! Every engine publishes its accepted `(key, nonce, info)` sizes as a
//! list of [`SymmetricKeySize`] entries: the first is the mandatory
//! minimum, the second the recommended size, the third the saturation
//! size (the point at which HKDF/cSHAKE switch to an extract step).

use zeroize::{Zeroize, Zeroizing};

use crate::ct;

/// A (key, nonce, info) triple. Nonce and info may be empty.
///
/// The key is held in zeroizing storage and wiped on drop. Equality is
/// constant-time over the key bytes.
pub struct KeyMaterial {
    key: Zeroizing<Vec<u8>>,
    nonce: Vec<u8>,
    info: Vec<u8>,
}

impl KeyMaterial {
    /// Key-only material.
    pub fn new(key: Vec<u8>) -> Self {
        Self {
            key: Zeroizing::new(key),
            nonce: Vec::new(),
            info: Vec::new(),
        }
    }

    /// Key and nonce.
    pub fn with_nonce(key: Vec<u8>, nonce: Vec<u8>) -> Self {
        Self {
            key: Zeroizing::new(key),
            nonce,
            info: Vec::new(),
        }
    }

    /// Key, nonce, and info string.
    pub fn with_info(key: Vec<u8>, nonce: Vec<u8>, info: Vec<u8>) -> Self {
        Self {
            key: Zeroizing::new(key),
            nonce,
            info,
        }
    }

    #[inline]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    #[inline]
    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    #[inline]
    pub fn info(&self) -> &[u8] {
        &self.info
    }
}

impl PartialEq for KeyMaterial {
    fn eq(&self, other: &Self) -> bool {
        ct::eq(&self.key, &other.key)
            && self.nonce == other.nonce
            && self.info == other.info
    }
}

impl Eq for KeyMaterial {}

impl Clone for KeyMaterial {
    fn clone(&self) -> Self {
        Self {
            key: Zeroizing::new(self.key.to_vec()),
            nonce: self.nonce.clone(),
            info: self.info.clone(),
        }
    }
}

impl core::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key_len", &self.key.len())
            .field("nonce_len", &self.nonce.len())
            .field("info_len", &self.info.len())
            .finish_non_exhaustive()
    }
}

impl Zeroize for KeyMaterial {
    fn zeroize(&mut self) {
        self.key.zeroize();
        self.nonce.zeroize();
        self.info.zeroize();
    }
}

/// One accepted `(key, nonce, info)` size combination, in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymmetricKeySize {
    pub key_size: usize,
    pub nonce_size: usize,
    pub info_size: usize,
}

impl SymmetricKeySize {
    pub const fn new(key_size: usize, nonce_size: usize, info_size: usize) -> Self {
        Self {
            key_size,
            nonce_size,
            info_size,
        }
    }

    /// Whether any entry in `sizes` accepts a key of `key_len` bytes.
    pub fn contains_key(sizes: &[SymmetricKeySize], key_len: usize) -> bool {
        sizes.iter().any(|s| s.key_size == key_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_material_accessors() {
        let km = KeyMaterial::with_info(vec![1; 32], vec![2; 8], vec![3; 4]);
        assert_eq!(km.key().len(), 32);
        assert_eq!(km.nonce(), &[2; 8]);
        assert_eq!(km.info(), &[3; 4]);
    }

    #[test]
    fn equality_is_by_content() {
        let a = KeyMaterial::new(vec![9; 16]);
        let b = KeyMaterial::new(vec![9; 16]);
        let c = KeyMaterial::new(vec![8; 16]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn contains_key_matches_exact_sizes() {
        let sizes = [
            SymmetricKeySize::new(16, 16, 0),
            SymmetricKeySize::new(32, 16, 0),
        ];
        assert!(SymmetricKeySize::contains_key(&sizes, 16));
        assert!(!SymmetricKeySize::contains_key(&sizes, 24));
    }
}
