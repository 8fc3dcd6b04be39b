//! Entropy provider capability trait, the owned/borrowed handle engines
//! hold providers through, and the thin OS CSP provider.

use rand_core::{OsRng, RngCore};

use crate::error::{Error, Result};

/// A source of seed entropy. Implementations block only on OS syscalls;
/// none of them are safe for concurrent mutation.
pub trait EntropyProvider {
    /// Fill `output` with provider bytes.
    fn get_bytes(&mut self, output: &mut [u8]) -> Result<()>;

    /// One 32-bit draw.
    fn next_u32(&mut self) -> Result<u32> {
        let mut word = [0u8; 4];
        self.get_bytes(&mut word)?;
        Ok(u32::from_le_bytes(word))
    }

    /// Re-run collection/keying from scratch.
    fn reset(&mut self) -> Result<()>;

    /// Whether the provider can currently produce bytes.
    fn is_available(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// How an engine holds an injected provider: constructed-and-owned, or
/// borrowed from the caller. The discriminator governs teardown; borrowed
/// providers are never reseated or dropped by the engine.
pub enum ProviderHandle<'a> {
    Owned(Box<dyn EntropyProvider + 'a>),
    Borrowed(&'a mut dyn EntropyProvider),
}

impl<'a> ProviderHandle<'a> {
    #[inline]
    pub fn provider(&mut self) -> &mut dyn EntropyProvider {
        match self {
            ProviderHandle::Owned(p) => p.as_mut(),
            ProviderHandle::Borrowed(p) => &mut **p,
        }
    }
}

/// The closed set of constructible provider types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderType {
    /// Auto-collection provider ([`crate::acp::Acp`]).
    Acp,
    /// The platform cryptographic RNG, used directly.
    Os,
}

impl ProviderType {
    /// Construct an owned instance of the named provider.
    pub fn instance(self) -> Result<Box<dyn EntropyProvider>> {
        match self {
            ProviderType::Acp => Ok(Box::new(crate::acp::Acp::new()?)),
            ProviderType::Os => Ok(Box::new(OsProvider)),
        }
    }
}

/// The platform CSP exposed as an [`EntropyProvider`]. Stateless; `reset`
/// is a no-op and thread-safety is inherited from the OS RNG.
pub struct OsProvider;

impl EntropyProvider for OsProvider {
    fn get_bytes(&mut self, output: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(output)
            .map_err(|_| Error::entropy("OsProvider::get_bytes", "platform RNG failed"))
    }

    fn reset(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "CSP"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_provider_fills_and_varies() {
        let mut csp = OsProvider;
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        csp.get_bytes(&mut a).unwrap();
        csp.get_bytes(&mut b).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn handle_dispatches_to_borrowed() {
        let mut csp = OsProvider;
        let mut handle = ProviderHandle::Borrowed(&mut csp);
        let mut buf = [0u8; 8];
        handle.provider().get_bytes(&mut buf).unwrap();
        assert_eq!(handle.provider().name(), "CSP");
    }
}
