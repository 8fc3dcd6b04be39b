//! `xsc-rs` — extended symmetric primitives.
//!
//! Four composable engines over shared Keccak/Serpent/HKDF kernels:
//!
//! - [`Shx`] — Serpent with an extended key schedule: the classical
//!   rotate-polynomial schedule (32/40 rounds), or HKDF-derived subkeys
//!   for 32..64 rounds, with 4/8/16-block bitsliced bulk transforms.
//! - [`Csg`] — a cSHAKE DRBG with SHAKE, simple-cSHAKE and full cSHAKE
//!   modes, optional predictive-resistance reseeding, and multi-lane
//!   generation.
//! - [`Bcr`] — a buffered counter-mode PRNG over a configurable block
//!   cipher, with typed-integer extraction.
//! - [`Acp`] — a two-stage entropy provider: system sources compressed
//!   through Keccak-512 driving a counter-mode stage over [`Ahx`], the
//!   38-round HKDF(SHA-512)-scheduled extended AES.
//!
//! # Design principles
//!
//! - **Constant time** — bitsliced S-boxes, data-independent sponge and
//!   schedule code, constant-time comparison in [`ct`].
//! - **RAII zeroization** of key schedules, Keccak states, and PRNG
//!   buffers via the `zeroize` crate.
//! - **Deterministic streams** — identical seeds yield identical output;
//!   wide (SIMD-lane) paths are bit-identical to their scalar reference.
//! - **Result discipline** — five error kinds, reported at the call
//!   boundary; engines stay usable for reset + re-initialization.
//!
//! Engine instances are single-threaded; "parallel" refers to lane
//! parallelism inside one call, never worker threads.

pub mod acp;
pub mod ahx;
pub mod bcr;
pub mod csg;
pub mod ct;
pub mod error;
pub mod hkdf;
pub mod keccak;
pub mod key;
pub mod provider;
pub mod shx;
pub mod traits;

mod serpent;
mod simd;

// Re-export the public API surface.
pub use acp::{Acp, SourceReport};
pub use ahx::Ahx;
pub use bcr::{Bcr, CipherType};
pub use csg::{Csg, ShakeMode, PARALLEL_LANES};
pub use error::{Error, Result};
pub use hkdf::KdfDigest;
pub use key::{KeyMaterial, SymmetricKeySize};
pub use provider::{EntropyProvider, OsProvider, ProviderHandle, ProviderType};
pub use shx::{Shx, BLOCK_SIZE};
pub use traits::{Aead, BlockCipherEngine, Drbg, Prng};
