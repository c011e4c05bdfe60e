//! CRYSTALS-Dilithium (round 2) lattice signatures
//!
//! One signing engine serves eight modes, selected at runtime by a [`Mode`]
//! value carried by every key.
//!
//! # Modes
//!
//! | mode | (K, L) | public key | private key | signature |
//! |------|--------|-----------:|------------:|----------:|
//! | Dilithium1 | (3, 2) | 896 | 2096 | 1387 |
//! | Dilithium2 | (4, 3) | 1184 | 2800 | 2044 |
//! | Dilithium3 | (5, 4) | 1472 | 3504 | 2701 |
//! | Dilithium4 | (6, 5) | 1760 | 3856 | 3366 |
//!
//! Each has an `-AES` twin that expands its seeds with AES-256-CTR instead of
//! SHAKE. Keys and signatures of a twin have the same sizes but are not
//! interchangeable.
//!
//! # Example Usage
//!
//! ```rust
//! use pqsigs_dilithium::{generate_key, sign, verify, Mode};
//! use rand::rngs::OsRng;
//!
//! let mode = Mode::by_name("Dilithium3").unwrap();
//! let (public_key, private_key) = generate_key(&mut OsRng, mode).unwrap();
//!
//! let message = b"Hello, post-quantum world!";
//! let signature = sign(&private_key, message).expect("signing should succeed");
//!
//! assert!(verify(&public_key, message, &signature).is_ok());
//! ```
//!
//! # Algorithm Overview
//!
//! ## Key Generation
//! 1. Expand a 32-byte seed into ρ, a secret seed and the signing key
//! 2. Expand the matrix A from ρ, directly in the NTT domain
//! 3. Sample s1, s2 with coefficients in [-η, η]
//! 4. Compute t = A·s1 + s2 and split it with Power2Round into (t1, t0)
//! 5. Public key: (ρ, t1); private key: (ρ, key, tr, s1, s2, t0)
//!
//! ## Signing
//! 1. μ = CRH(tr || M), ρ' = CRH(key || μ)
//! 2. Sample y from ρ' and fresh nonces
//! 3. w = A·y, w1 = HighBits(w), c = B60(μ, w1)
//! 4. z = y + c·s1; restart if z, w0 - c·s2 or c·t0 are too large
//! 5. Hints h recover w1 from w - c·s2 + c·t0; restart if more than Ω
//! 6. Signature: (z, h, c)
//!
//! ## Verification
//! 1. w1' = UseHint(A·z - c·t1·2^d, h)
//! 2. Accept iff B60(μ, w1') == c
//!
//! # References
//!
//! - CRYSTALS-Dilithium, Algorithm Specifications and Supporting
//!   Documentation, round 2 submission to the NIST PQC project
//! - <https://pq-crystals.org/dilithium/>

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod keygen;
pub mod ntt;
pub mod packing;
pub mod params;
pub mod poly;
pub mod polyvec;
pub mod reduce;
pub mod rounding;
pub mod sampling;
pub mod sign;
pub mod verify;

// Re-export main types and functions for convenience
pub use error::{DilithiumError, Result, VerificationFailure};
pub use keygen::{
    generate_key, new_key_from_expanded_seed, new_key_from_seed, PrivateKey, PublicKey,
};
pub use params::{
    mode_names, Mode, DILITHIUM1, DILITHIUM1_AES, DILITHIUM2, DILITHIUM2_AES, DILITHIUM3,
    DILITHIUM3_AES, DILITHIUM4, DILITHIUM4_AES, MODES,
};
pub use sign::{sign, sign_to, Signature};
pub use verify::{verify, verify_bool};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_full_roundtrip_dilithium2() {
        let (pk, sk) = generate_key(&mut OsRng, DILITHIUM2).unwrap();
        let message = b"Integration test message for Dilithium2";

        let sig = sign(&sk, message).expect("signing should succeed");
        assert!(verify(&pk, message, &sig).is_ok());
    }

    #[test]
    fn test_full_roundtrip_dilithium4_aes() {
        let (pk, sk) = generate_key(&mut OsRng, DILITHIUM4_AES).unwrap();
        let message = b"Integration test message for Dilithium4-AES";

        let sig = sign(&sk, message).expect("signing should succeed");
        assert!(verify(&pk, message, &sig).is_ok());
    }

    #[test]
    fn test_cross_mode_rejection() {
        // Same sizes, different expansion: the signature must not transfer.
        let seed = [42u8; 32];
        let (_, sk) = new_key_from_seed(&seed, DILITHIUM3);
        let (pk_aes, _) = new_key_from_seed(&seed, DILITHIUM3_AES);

        let sig = sign(&sk, b"test").unwrap();
        assert!(verify(&pk_aes, b"test", &sig).is_err());

        // Different sizes: rejected on length.
        let (pk1, _) = new_key_from_seed(&seed, DILITHIUM1);
        assert_eq!(
            verify(&pk1, b"test", &sig),
            Err(DilithiumError::VerificationFailed(
                VerificationFailure::WrongLength
            ))
        );
    }

    #[test]
    fn test_deterministic_signing() {
        let (pk, sk) = new_key_from_seed(&[42u8; 32], DILITHIUM1_AES);
        let message = b"deterministic test";

        let sig1 = sign(&sk, message).unwrap();
        let sig2 = sign(&sk, message).unwrap();

        assert_eq!(sig1, sig2);
        assert!(verify(&pk, message, &sig1).is_ok());
    }

    #[test]
    fn test_serialized_keys_sign_and_verify() {
        let mode = DILITHIUM4;
        let (pk, sk) = new_key_from_seed(&[7u8; 32], mode);
        let pk2 = PublicKey::from_bytes(mode, &pk.to_bytes()).unwrap();
        let sk2 = PrivateKey::from_bytes(mode, &sk.to_bytes()).unwrap();

        let sig = sign(&sk2, b"decoded").unwrap();
        assert_eq!(sig, sign(&sk, b"decoded").unwrap());
        assert!(verify_bool(&pk2, b"decoded", &sig));
    }
}
