//! cSHAKE deterministic random bit generator.
//!
//! Mode selection follows the keying material: a bare key runs plain
//! SHAKE, key + nonce runs simple-cSHAKE with the nonce as customization,
//! and key + nonce + info runs full cSHAKE with the info string as the
//! function name. With a provider attached the generator reseeds itself
//! every `reseed_threshold` bytes (predictive resistance).
//!
//! Parallel mode keeps [`PARALLEL_LANES`] independent Keccak states,
//! differentiated by the low byte of the nonce, and interleaves one rate
//! block per lane into the output buffer. Sequential mode is the
//! reference: the parallel stream equals the block-interleaved
//! concatenation of the matching sequential streams.

use zeroize::{Zeroize, Zeroizing};

use crate::error::{Error, Result};
use crate::keccak::{self, Sponge, CSHAKE_DOMAIN, RATE_128, RATE_256, SHAKE_DOMAIN};
use crate::key::{KeyMaterial, SymmetricKeySize};
use crate::provider::{ProviderHandle, ProviderType};

/// Keccak lanes driven in parallel mode. Fixed at build time so the
/// stream never depends on runtime feature probing.
pub const PARALLEL_LANES: usize = if cfg!(target_feature = "avx512f") { 8 } else { 4 };

const MAX_OUTPUT: u64 = 35_184_372_088_832; // 2^45 bytes per instance
const MAX_REQUEST: usize = 65_536;
const MAX_RESEED: usize = 536_870_912; // 2^29 reseed operations
const NONCE_SIZE: usize = 8;

/// The underlying SHAKE strength.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShakeMode {
    Shake128,
    Shake256,
}

impl ShakeMode {
    /// Sponge rate in bytes.
    pub const fn rate(self) -> usize {
        match self {
            ShakeMode::Shake128 => RATE_128,
            ShakeMode::Shake256 => RATE_256,
        }
    }

    /// Security strength in bytes; also the minimum seed size.
    pub const fn security_size(self) -> usize {
        match self {
            ShakeMode::Shake128 => 16,
            ShakeMode::Shake256 => 32,
        }
    }
}

/// cSHAKE generator (CSG).
pub struct Csg<'a> {
    mode: ShakeMode,
    rate: usize,
    domain: u8,
    parallel: bool,
    lanes: Vec<Sponge>,
    buffer: Zeroizing<Vec<u8>>,
    buffer_index: usize,
    custom: Zeroizing<Vec<u8>>,
    name: Vec<u8>,
    seed_size: usize,
    reseed_counter: usize,
    reseed_requests: usize,
    reseed_threshold: usize,
    bytes_generated: u64,
    provider: Option<ProviderHandle<'a>>,
    initialized: bool,
}

impl<'a> Csg<'a> {
    /// A generator without predictive resistance.
    pub fn new(mode: ShakeMode, parallel: bool) -> Self {
        Self::build(mode, None, parallel)
    }

    /// A generator reseeding from an injected provider handle.
    pub fn with_provider(mode: ShakeMode, provider: ProviderHandle<'a>, parallel: bool) -> Self {
        Self::build(mode, Some(provider), parallel)
    }

    /// A generator owning a freshly constructed provider of the named type.
    pub fn with_provider_type(
        mode: ShakeMode,
        provider: ProviderType,
        parallel: bool,
    ) -> Result<Self> {
        Ok(Self::build(
            mode,
            Some(ProviderHandle::Owned(provider.instance()?)),
            parallel,
        ))
    }

    fn build(mode: ShakeMode, provider: Option<ProviderHandle<'a>>, parallel: bool) -> Self {
        let rate = mode.rate();
        Self {
            mode,
            rate,
            domain: SHAKE_DOMAIN,
            parallel,
            lanes: Vec::new(),
            buffer: Zeroizing::new(Vec::new()),
            buffer_index: 0,
            custom: Zeroizing::new(Vec::new()),
            name: Vec::new(),
            seed_size: mode.security_size(),
            reseed_counter: 0,
            reseed_requests: 0,
            reseed_threshold: mode.security_size() * 1000,
            bytes_generated: 0,
            provider,
            initialized: false,
        }
    }

    /// The accepted seed sizes: minimum, recommended, and rate saturation.
    pub fn legal_key_sizes(&self) -> [SymmetricKeySize; 3] {
        let min = self.mode.security_size();
        [
            SymmetricKeySize::new(min, NONCE_SIZE, 0),
            SymmetricKeySize::new(min * 2, NONCE_SIZE, self.rate),
            SymmetricKeySize::new(self.rate, NONCE_SIZE, self.rate),
        ]
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn name(&self) -> &'static str {
        match (self.mode, self.parallel) {
            (ShakeMode::Shake128, false) => "CSG-SHAKE128",
            (ShakeMode::Shake128, true) => "CSG-SHAKE128W",
            (ShakeMode::Shake256, false) => "CSG-SHAKE256",
            (ShakeMode::Shake256, true) => "CSG-SHAKE256W",
        }
    }

    pub const fn max_output_size(&self) -> u64 {
        MAX_OUTPUT
    }

    pub const fn max_request_size(&self) -> usize {
        MAX_REQUEST
    }

    pub const fn max_reseed_count(&self) -> usize {
        MAX_RESEED
    }

    /// Recommended nonce length in bytes.
    pub const fn nonce_size(&self) -> usize {
        NONCE_SIZE
    }

    pub fn security_strength(&self) -> usize {
        self.mode.security_size() * 8
    }

    pub fn reseed_threshold(&self) -> usize {
        self.reseed_threshold
    }

    /// Bytes generated between automatic reseeds. Must be nonzero and no
    /// larger than the per-instance output bound.
    pub fn set_reseed_threshold(&mut self, threshold: usize) -> Result<()> {
        if threshold == 0 || threshold as u64 > MAX_OUTPUT {
            return Err(Error::config("CSG::set_reseed_threshold", "threshold"));
        }
        self.reseed_threshold = threshold;
        Ok(())
    }

    /// Number of reseed operations performed since initialization.
    pub fn reseed_requests(&self) -> usize {
        self.reseed_requests
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Seed the generator. Mode selection: key only → SHAKE; key + nonce →
    /// simple-cSHAKE; key + nonce + info → cSHAKE.
    pub fn initialize(&mut self, material: &KeyMaterial) -> Result<()> {
        let key = material.key();
        let min = self.mode.security_size();
        if key.len() < min || key.len() > self.rate {
            return Err(Error::config("CSG::initialize", "key size"));
        }
        if self.parallel && material.nonce().is_empty() {
            return Err(Error::config(
                "CSG::initialize",
                "parallel mode requires a nonce",
            ));
        }

        self.reset();

        self.custom = Zeroizing::new(material.nonce().to_vec());
        self.name = material.info().to_vec();
        self.domain = if self.custom.is_empty() && self.name.is_empty() {
            SHAKE_DOMAIN
        } else {
            CSHAKE_DOMAIN
        };
        self.seed_size = key.len();

        let lane_count = if self.parallel { PARALLEL_LANES } else { 1 };
        let lanes: Vec<Sponge> = (0..lane_count)
            .map(|lane| {
                let mut sponge = Sponge::new(self.rate);
                if self.domain == CSHAKE_DOMAIN {
                    let custom = self.lane_custom(lane);
                    customize(&mut sponge, &self.name, &custom);
                }
                sponge.absorb(key);
                sponge.finish(self.domain);
                sponge
            })
            .collect();
        self.lanes = lanes;

        self.buffer = Zeroizing::new(vec![0u8; self.rate * lane_count]);
        self.serialize_lanes();
        self.initialized = true;
        log::debug!(
            "{} initialized: {} lane(s), reseed threshold {}",
            self.name(),
            lane_count,
            self.reseed_threshold
        );
        Ok(())
    }

    /// Generate pseudo-random bytes into `output`. Returns the byte count.
    pub fn generate(&mut self, output: &mut [u8]) -> Result<usize> {
        if !self.initialized {
            return Err(Error::uninit("CSG::generate"));
        }
        if output.len() > MAX_REQUEST {
            return Err(Error::limit("CSG::generate", "request size"));
        }
        if self.bytes_generated + output.len() as u64 > MAX_OUTPUT {
            return Err(Error::limit("CSG::generate", "generator output"));
        }

        let mut written = 0;
        while written < output.len() {
            if self.provider.is_some() && self.reseed_counter >= self.reseed_threshold {
                self.reseed()?;
            }
            if self.buffer_index == self.buffer.len() {
                self.permute_lanes();
                self.serialize_lanes();
            }
            let mut take = (output.len() - written).min(self.buffer.len() - self.buffer_index);
            if self.provider.is_some() {
                take = take.min(self.reseed_threshold - self.reseed_counter);
            }
            output[written..written + take]
                .copy_from_slice(&self.buffer[self.buffer_index..self.buffer_index + take]);
            self.buffer_index += take;
            self.reseed_counter += take;
            self.bytes_generated += take as u64;
            written += take;

            if self.provider.is_some() && self.reseed_counter >= self.reseed_threshold {
                self.reseed()?;
            }
        }
        Ok(written)
    }

    /// Fold fresh seed material into the running state (re-keying). The
    /// squeeze stream restarts from the re-keyed state.
    pub fn update(&mut self, seed: &[u8]) -> Result<()> {
        if !self.initialized {
            return Err(Error::uninit("CSG::update"));
        }
        let min = self.mode.security_size();
        if seed.len() < min || seed.len() > self.rate {
            return Err(Error::config("CSG::update", "seed size"));
        }
        self.rekey(seed);
        Ok(())
    }

    /// Clear all generator state; a new `initialize` is required.
    pub fn reset(&mut self) {
        for lane in &mut self.lanes {
            lane.zeroize();
        }
        self.lanes.clear();
        self.buffer.zeroize();
        self.buffer = Zeroizing::new(Vec::new());
        self.buffer_index = 0;
        self.custom.zeroize();
        self.custom = Zeroizing::new(Vec::new());
        self.name.clear();
        self.reseed_counter = 0;
        self.reseed_requests = 0;
        self.bytes_generated = 0;
        self.initialized = false;
    }

    fn lane_custom(&self, lane: usize) -> Zeroizing<Vec<u8>> {
        let mut custom = Zeroizing::new(self.custom.to_vec());
        if let Some(first) = custom.first_mut() {
            *first = first.wrapping_add(lane as u8);
        }
        custom
    }

    fn permute_lanes(&mut self) {
        for lane in &mut self.lanes {
            lane.permute();
        }
    }

    fn serialize_lanes(&mut self) {
        let rate = self.rate;
        for (i, lane) in self.lanes.iter().enumerate() {
            lane.read_block(&mut self.buffer[i * rate..(i + 1) * rate]);
        }
        self.buffer_index = 0;
    }

    fn rekey(&mut self, seed: &[u8]) {
        for lane in 0..self.lanes.len() {
            let custom = self.lane_custom(lane);
            let sponge = &mut self.lanes[lane];
            sponge.restart_absorb();
            sponge.absorb(&[self.domain]);
            sponge.absorb(seed);
            sponge.absorb(&custom);
            sponge.finish(self.domain);
        }
        self.serialize_lanes();
        self.reseed_counter = 0;
    }

    fn reseed(&mut self) -> Result<()> {
        if self.reseed_requests >= MAX_RESEED {
            return Err(Error::limit("CSG::generate", "reseed count"));
        }
        let mut seed = Zeroizing::new(vec![0u8; self.seed_size]);
        let handle = self.provider.as_mut().expect("reseed requires a provider");
        handle.provider().get_bytes(&mut seed)?;
        self.reseed_requests += 1;
        log::trace!("CSG reseed #{}", self.reseed_requests);
        self.rekey(&seed);
        Ok(())
    }
}

impl Drop for Csg<'_> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl crate::traits::Drbg for Csg<'_> {
    fn name(&self) -> &'static str {
        Csg::name(self)
    }

    fn generate(&mut self, output: &mut [u8]) -> Result<usize> {
        Csg::generate(self, output)
    }

    fn update(&mut self, seed: &[u8]) -> Result<()> {
        Csg::update(self, seed)
    }

    fn reset(&mut self) {
        Csg::reset(self);
    }
}

/// Absorb the cSHAKE prefix `bytepad(encode_string(N) || encode_string(S),
/// rate)` into a fresh state.
fn customize(sponge: &mut Sponge, name: &[u8], custom: &[u8]) {
    let mut enc = [0u8; 9];
    let n = keccak::left_encode(&mut enc, sponge.rate());
    sponge.absorb(&enc[..n]);

    let n = keccak::left_encode(&mut enc, name.len() * 8);
    sponge.absorb(&enc[..n]);
    sponge.absorb(name);

    let n = keccak::left_encode(&mut enc, custom.len() * 8);
    sponge.absorb(&enc[..n]);
    sponge.absorb(custom);

    sponge.pad_block();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_requires_initialize() {
        let mut gen = Csg::new(ShakeMode::Shake256, false);
        let mut out = [0u8; 16];
        assert!(matches!(
            gen.generate(&mut out),
            Err(Error::NotInitialized { .. })
        ));
    }

    #[test]
    fn zero_length_request_is_a_noop() {
        let mut gen = Csg::new(ShakeMode::Shake256, false);
        gen.initialize(&KeyMaterial::new(vec![7u8; 32])).unwrap();
        let mut out = [0u8; 0];
        assert_eq!(gen.generate(&mut out).unwrap(), 0);
    }

    #[test]
    fn parallel_without_nonce_is_rejected() {
        let mut gen = Csg::new(ShakeMode::Shake256, true);
        assert!(gen.initialize(&KeyMaterial::new(vec![7u8; 32])).is_err());
    }

    #[test]
    fn reinitialize_restarts_the_stream() {
        let material = KeyMaterial::with_nonce(vec![1u8; 32], vec![9u8; 8]);
        let mut gen = Csg::new(ShakeMode::Shake256, false);
        gen.initialize(&material).unwrap();
        let mut first = [0u8; 64];
        gen.generate(&mut first).unwrap();

        gen.initialize(&material).unwrap();
        let mut second = [0u8; 64];
        gen.generate(&mut second).unwrap();
        assert_eq!(first, second);
    }
}
