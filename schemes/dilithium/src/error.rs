//! Error types for Dilithium signature operations.

use std::fmt;

/// Specific reasons why signature verification failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationFailure {
    /// The signature buffer does not have the size required by the mode.
    WrongLength,
    /// The response vector z is not strictly inside γ1 - β.
    NormBoundExceeded,
    /// The hint section is not the unique canonical encoding.
    MalformedHints,
    /// The packed challenge has stray sign bits or the wrong weight.
    MalformedChallenge,
    /// The recomputed challenge differs from the one in the signature.
    ChallengeMismatch,
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationFailure::WrongLength => write!(f, "signature has the wrong length"),
            VerificationFailure::NormBoundExceeded => write!(f, "z norm bound exceeded"),
            VerificationFailure::MalformedHints => write!(f, "malformed hint vector"),
            VerificationFailure::MalformedChallenge => write!(f, "malformed challenge"),
            VerificationFailure::ChallengeMismatch => write!(f, "challenge mismatch"),
        }
    }
}

/// Errors that can occur during Dilithium operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DilithiumError {
    /// Signature verification failed with a specific reason.
    VerificationFailed(VerificationFailure),

    /// The signing loop ran past its iteration cap.
    ///
    /// This never happens with a correct build and valid key; it signals an
    /// implementation or parameter bug.
    SigningFailed {
        /// Number of iterations attempted.
        attempts: u32,
    },

    /// The entropy source could not provide a seed.
    EntropyUnavailable,

    /// The provided key is malformed or invalid.
    InvalidKey {
        /// Description of the key issue.
        reason: &'static str,
    },

    /// Invalid input was provided to a function.
    InvalidInput {
        /// The name of the invalid field/parameter.
        field: &'static str,
        /// Description of why the input is invalid.
        reason: &'static str,
    },

    /// Decoding/unpacking failed.
    DecodingError {
        /// What was being decoded.
        context: &'static str,
    },

    /// A hint vector was not canonically encoded.
    InvalidHint,

    /// No mode is registered under the given name.
    UnknownMode {
        /// The name that was looked up.
        name: String,
    },
}

impl fmt::Display for DilithiumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DilithiumError::VerificationFailed(reason) => {
                write!(f, "signature verification failed: {}", reason)
            }
            DilithiumError::SigningFailed { attempts } => {
                write!(f, "signing failed after {} attempts", attempts)
            }
            DilithiumError::EntropyUnavailable => {
                write!(f, "entropy source failed to produce a seed")
            }
            DilithiumError::InvalidKey { reason } => {
                write!(f, "invalid key: {}", reason)
            }
            DilithiumError::InvalidInput { field, reason } => {
                write!(f, "invalid input for '{}': {}", field, reason)
            }
            DilithiumError::DecodingError { context } => {
                write!(f, "decoding error: {}", context)
            }
            DilithiumError::InvalidHint => {
                write!(f, "invalid hint vector")
            }
            DilithiumError::UnknownMode { name } => {
                write!(f, "unknown mode '{}'", name)
            }
        }
    }
}

impl std::error::Error for DilithiumError {}

impl From<VerificationFailure> for DilithiumError {
    fn from(reason: VerificationFailure) -> Self {
        DilithiumError::VerificationFailed(reason)
    }
}

/// Result type alias for Dilithium operations.
pub type Result<T> = std::result::Result<T, DilithiumError>;
