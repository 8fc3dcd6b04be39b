//! Auto-collection entropy provider.
//!
//! Two stages. Collection concatenates the platform CSP, RDRAND draws,
//! timestamp-counter jitter, and process/time identifiers into a staging
//! buffer, which Keccak (SHA3-512) compresses into a 64-byte digest. The
//! digest keys a counter-mode stage over the extended AES engine
//! (38 rounds, HKDF(SHA-512) schedule); the schedule's distribution code
//! and the 16-byte starting counter come from the CSP. Output is the
//! encryption of the incrementing counter.
//!
//! Collection fails unless the CSP and at least one further source
//! contributed; the contributing set is recorded for audit.

use rand_core::{OsRng, RngCore};
use sha3::{Digest, Sha3_512};
use zeroize::Zeroizing;

use crate::ahx::Ahx;
use crate::error::{Error, Result};
use crate::hkdf::KdfDigest;
use crate::key::KeyMaterial;
use crate::provider::EntropyProvider;

const STATE_CAP: usize = 1024;
const OS_POOL: usize = 64;
const RDRAND_DRAWS: usize = 16;
const RDRAND_RETRY: usize = 10;
const JITTER_SAMPLES: usize = 32;

/// Which sources fed the current seed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceReport {
    pub os_csp: bool,
    pub rdrand: bool,
    pub tsc_jitter: bool,
    pub process_info: bool,
    pub time_info: bool,
}

impl SourceReport {
    fn count(&self) -> usize {
        usize::from(self.os_csp)
            + usize::from(self.rdrand)
            + usize::from(self.tsc_jitter)
            + usize::from(self.process_info)
            + usize::from(self.time_info)
    }
}

/// Auto-collection provider (ACP). One instance per thread.
pub struct Acp {
    stage: Ahx,
    counter: Zeroizing<[u8; 16]>,
    sources: SourceReport,
    has_rdrand: bool,
}

impl Acp {
    /// Collect, compress, and key the output stage.
    pub fn new() -> Result<Self> {
        let has_rdrand = detect_rdrand();
        let (stage, counter, sources) = seed_state(has_rdrand)?;
        log::debug!("ACP seeded from {} sources", sources.count());
        Ok(Self {
            stage,
            counter,
            sources,
            has_rdrand,
        })
    }

    /// The sources that contributed to the current seed.
    pub fn sources(&self) -> SourceReport {
        self.sources
    }

    pub fn get_bytes_vec(&mut self, length: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; length];
        EntropyProvider::get_bytes(self, &mut out)?;
        Ok(out)
    }
}

impl EntropyProvider for Acp {
    fn get_bytes(&mut self, output: &mut [u8]) -> Result<()> {
        let mut block = [0u8; 16];
        for chunk in output.chunks_mut(16) {
            self.stage.transform(self.counter.as_ref(), &mut block)?;
            chunk.copy_from_slice(&block[..chunk.len()]);
            increment(&mut self.counter);
        }
        Ok(())
    }

    /// Re-run collection and compression, rekeying the output stage.
    fn reset(&mut self) -> Result<()> {
        let (stage, counter, sources) = seed_state(self.has_rdrand)?;
        self.stage = stage;
        self.counter = counter;
        self.sources = sources;
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "ACP"
    }
}

fn seed_state(has_rdrand: bool) -> Result<(Ahx, Zeroizing<[u8; 16]>, SourceReport)> {
    let (staging, sources) = collect(has_rdrand)?;

    // stage two: compress, then key the extended-AES CTR stage; the digest
    // is the cipher key, the CSP supplies the distribution code and counter
    let mut compressed = Zeroizing::new([0u8; 64]);
    compressed.copy_from_slice(&Sha3_512::digest(&staging[..]));

    let mut dist_code = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut dist_code)
        .map_err(|_| Error::entropy("ACP::reset", "platform RNG failed"))?;

    let mut counter = Zeroizing::new([0u8; 16]);
    OsRng
        .try_fill_bytes(counter.as_mut())
        .map_err(|_| Error::entropy("ACP::reset", "platform RNG failed"))?;

    let mut stage = Ahx::with_kdf(KdfDigest::Sha512, 38)?;
    stage.initialize(
        true,
        &KeyMaterial::with_info(compressed.to_vec(), Vec::new(), dist_code.to_vec()),
    )?;
    Ok((stage, counter, sources))
}

fn collect(has_rdrand: bool) -> Result<(Zeroizing<Vec<u8>>, SourceReport)> {
    let mut staging = Zeroizing::new(Vec::with_capacity(STATE_CAP));
    let mut sources = SourceReport::default();

    // the platform CSP is mandatory
    let mut pool = Zeroizing::new([0u8; OS_POOL]);
    OsRng
        .try_fill_bytes(pool.as_mut())
        .map_err(|_| Error::entropy("ACP::reset", "platform RNG failed"))?;
    staging.extend_from_slice(&pool[..]);
    sources.os_csp = true;

    if has_rdrand {
        sources.rdrand = rdrand_fill(&mut staging);
    }
    sources.tsc_jitter = jitter_fill(&mut staging);

    staging.extend_from_slice(&std::process::id().to_le_bytes());
    staging.extend_from_slice(format!("{:?}", std::thread::current().id()).as_bytes());
    sources.process_info = true;

    if let Ok(elapsed) = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        staging.extend_from_slice(&elapsed.as_nanos().to_le_bytes());
        sources.time_info = true;
    }
    staging.extend_from_slice(&monotonic_deltas());

    staging.truncate(STATE_CAP);
    if sources.count() < 2 {
        return Err(Error::entropy(
            "ACP::reset",
            "the CSP plus one further source must contribute",
        ));
    }
    Ok((staging, sources))
}

/// Timer deltas around short arithmetic chains; coarse on platforms
/// without a cycle counter, still collected for the mix.
fn monotonic_deltas() -> [u8; 16] {
    let mut acc = 0u64;
    let start = std::time::Instant::now();
    for i in 0..64u64 {
        acc = acc
            .wrapping_mul(0x9E37_79B9_7F4A_7C15)
            .wrapping_add(i)
            .rotate_left(11);
    }
    let nanos = start.elapsed().as_nanos() as u64;
    let mut out = [0u8; 16];
    out[..8].copy_from_slice(&nanos.to_le_bytes());
    out[8..].copy_from_slice(&acc.to_le_bytes());
    out
}

#[inline]
fn increment(counter: &mut [u8; 16]) {
    for byte in counter.iter_mut() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}

#[cfg(target_arch = "x86_64")]
fn detect_rdrand() -> bool {
    std::arch::is_x86_feature_detected!("rdrand")
}

#[cfg(not(target_arch = "x86_64"))]
fn detect_rdrand() -> bool {
    false
}

/// Bounded-retry RDRAND draws; zero successes drops the source.
#[cfg(target_arch = "x86_64")]
fn rdrand_fill(staging: &mut Vec<u8>) -> bool {
    let mut drawn = 0;
    for _ in 0..RDRAND_DRAWS {
        if let Some(value) = unsafe { rdrand64() } {
            staging.extend_from_slice(&value.to_le_bytes());
            drawn += 1;
        }
    }
    drawn > 0
}

#[cfg(not(target_arch = "x86_64"))]
fn rdrand_fill(_staging: &mut Vec<u8>) -> bool {
    false
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "rdrand")]
unsafe fn rdrand64() -> Option<u64> {
    let mut value = 0u64;
    for _ in 0..RDRAND_RETRY {
        if unsafe { core::arch::x86_64::_rdrand64_step(&mut value) } == 1 {
            return Some(value);
        }
    }
    None
}

/// Timestamp-counter jitter interleaved with short arithmetic chains.
#[cfg(target_arch = "x86_64")]
fn jitter_fill(staging: &mut Vec<u8>) -> bool {
    let mut acc = 0u64;
    for i in 0..JITTER_SAMPLES as u64 {
        let t0 = unsafe { core::arch::x86_64::_rdtsc() };
        acc = acc
            .wrapping_mul(0x9E37_79B9_7F4A_7C15)
            .wrapping_add(i)
            .rotate_left(17)
            ^ t0;
        let t1 = unsafe { core::arch::x86_64::_rdtsc() };
        staging.extend_from_slice(&(t1.wrapping_sub(t0) as u16).to_le_bytes());
    }
    staging.extend_from_slice(&acc.to_le_bytes());
    true
}

#[cfg(not(target_arch = "x86_64"))]
fn jitter_fill(_staging: &mut Vec<u8>) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_advances_the_counter() {
        let mut acp = Acp::new().unwrap();
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        acp.get_bytes(&mut a).unwrap();
        acp.get_bytes(&mut b).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn csp_always_contributes() {
        let acp = Acp::new().unwrap();
        let sources = acp.sources();
        assert!(sources.os_csp);
        assert!(sources.count() >= 2);
    }

    #[test]
    fn reset_rekeys_the_stage() {
        let mut acp = Acp::new().unwrap();
        let mut before = [0u8; 32];
        acp.get_bytes(&mut before).unwrap();
        acp.reset().unwrap();
        let mut after = [0u8; 32];
        acp.get_bytes(&mut after).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn next_u32_draws_four_bytes() {
        let mut acp = Acp::new().unwrap();
        let a = acp.next_u32().unwrap();
        let b = acp.next_u32().unwrap();
        // 2^-32 collision odds; a stuck counter would repeat forever
        assert!(a != b || acp.next_u32().unwrap() != a);
    }
}
