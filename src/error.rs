//! Engine error kinds. Every fallible operation reports one of five
//! variants at the call boundary; engines never swallow or retry.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;

/// The five failure kinds shared by all engines.
///
/// `origin` names the engine and operation that rejected the call
/// (e.g. `"SHX::initialize"`). After any error the engine stays usable:
/// `reset` followed by re-initialization is always legal.
#[derive(Debug, Error)]
pub enum Error {
    /// An unsupported parameter: key/nonce/info size, digest type,
    /// rounds count, or a malformed length.
    #[error("{origin}: unsupported parameter: {reason}")]
    Configuration {
        origin: &'static str,
        reason: &'static str,
    },

    /// The operation requires a prior `initialize` call.
    #[error("{origin}: engine is not initialized")]
    NotInitialized { origin: &'static str },

    /// Generator output, request size, or reseed count exceeded.
    #[error("{origin}: {limit} exceeded")]
    LimitExceeded {
        origin: &'static str,
        limit: &'static str,
    },

    /// No entropy source can produce bytes.
    #[error("{origin}: entropy unavailable: {reason}")]
    EntropyUnavailable {
        origin: &'static str,
        reason: &'static str,
    },

    /// AEAD tag mismatch; no plaintext is released.
    #[error("{origin}: authentication failed")]
    AuthenticationFailure { origin: &'static str },
}

impl Error {
    pub(crate) fn config(origin: &'static str, reason: &'static str) -> Self {
        Error::Configuration { origin, reason }
    }

    pub(crate) fn uninit(origin: &'static str) -> Self {
        Error::NotInitialized { origin }
    }

    pub(crate) fn limit(origin: &'static str, limit: &'static str) -> Self {
        Error::LimitExceeded { origin, limit }
    }

    pub(crate) fn entropy(origin: &'static str, reason: &'static str) -> Self {
        Error::EntropyUnavailable { origin, reason }
    }
}
