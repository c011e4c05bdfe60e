//! Dilithium (round 2) parameter sets.
//!
//! Four security levels are defined, each in a SHAKE flavor and an AES
//! flavor that swaps the SHAKE expansion streams for AES-256 in counter
//! mode. All eight share the ring, the modulus and the rounding constants;
//! they differ only in the matrix shape (K, L), the secret range η, the
//! rejection margin β and the hint budget Ω.

use crate::error::{DilithiumError, Result};

/// The prime modulus q = 2^23 - 2^13 + 1 = 8380417
pub const Q: u32 = 8380417;

/// Number of bits needed to represent Q.
pub const Q_BITS: usize = 23;

/// Polynomial degree n = 256
pub const N: usize = 256;

/// Number of dropped bits from t (d = 14)
pub const D: usize = 14;

/// Range of the masking polynomial y: γ1 = (q - 1) / 16
pub const GAMMA1: u32 = (Q - 1) / 16;

/// Low-order rounding range: γ2 = γ1 / 2
pub const GAMMA2: u32 = GAMMA1 / 2;

/// Bucket width of `decompose`: α = 2γ2
pub const ALPHA: u32 = 2 * GAMMA2;

/// Size of a key-generation seed.
pub const SEED_SIZE: usize = 32;

/// Output size of the collision-resistant hash (tr, μ, ρ').
pub const CRH_SIZE: usize = 48;

/// Number of nonzero coefficients in a challenge polynomial.
pub const CHALLENGE_WEIGHT: usize = 60;

/// Size of a packed t1 polynomial (23 - D bits per coefficient).
pub const POLY_T1_SIZE: usize = N * (Q_BITS - D) / 8;

/// Size of a packed t0 polynomial (D bits per coefficient).
pub const POLY_T0_SIZE: usize = N * D / 8;

/// Size of a packed polynomial with coefficients in (-γ1, γ1).
pub const POLY_LE_GAMMA1_SIZE: usize = N * (Q_BITS - 3) / 8;

/// Size of a packed polynomial with coefficients below 16 (w1).
pub const POLY_LE16_SIZE: usize = N * 4 / 8;

/// Size of a packed challenge: a position mask followed by 64 sign bits.
pub const POLY_B60_SIZE: usize = N / 8 + 8;

/// Parameters of one Dilithium mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mode {
    /// Registered name, e.g. `"Dilithium3-AES"`.
    pub name: &'static str,
    /// Whether expansion streams use AES-256-CTR instead of SHAKE.
    pub use_aes: bool,
    /// Number of rows in matrix A (k)
    pub k: usize,
    /// Number of columns in matrix A (l)
    pub l: usize,
    /// Coefficient range for secret vectors s1, s2 (η)
    pub eta: u32,
    /// Bits used to pack a coefficient of norm at most η
    pub double_eta_bits: usize,
    /// Rejection margin β
    pub beta: u32,
    /// Maximum number of 1s in hint vector h (ω)
    pub omega: usize,
}

impl Mode {
    /// Looks up a mode by its registered name.
    pub fn by_name(name: &str) -> Result<Mode> {
        MODES
            .iter()
            .find(|m| m.name == name)
            .copied()
            .ok_or_else(|| DilithiumError::UnknownMode {
                name: name.to_string(),
            })
    }

    /// Size of a packed polynomial of norm at most η.
    pub const fn poly_leq_eta_size(&self) -> usize {
        N * self.double_eta_bits / 8
    }

    /// Returns the seed size in bytes.
    pub const fn seed_size(&self) -> usize {
        SEED_SIZE
    }

    /// Returns the public key size in bytes.
    pub const fn public_key_size(&self) -> usize {
        // pk = ρ || t1
        SEED_SIZE + self.k * POLY_T1_SIZE
    }

    /// Returns the private key size in bytes.
    pub const fn private_key_size(&self) -> usize {
        // sk = ρ || key || tr || s1 || s2 || t0
        2 * SEED_SIZE
            + CRH_SIZE
            + (self.l + self.k) * self.poly_leq_eta_size()
            + self.k * POLY_T0_SIZE
    }

    /// Returns the signature size in bytes.
    pub const fn signature_size(&self) -> usize {
        // sig = z || h || c
        self.l * POLY_LE_GAMMA1_SIZE + self.omega + self.k + POLY_B60_SIZE
    }
}

// ============================================================================
// Dilithium1 (weak, K = 3, L = 2)
// ============================================================================

/// Dilithium1 with SHAKE expansion.
pub const DILITHIUM1: Mode = Mode {
    name: "Dilithium1",
    use_aes: false,
    k: 3,
    l: 2,
    eta: 7,
    double_eta_bits: 4,
    beta: 375,
    omega: 64,
};

/// Dilithium1 with AES-256-CTR expansion.
pub const DILITHIUM1_AES: Mode = Mode {
    name: "Dilithium1-AES",
    use_aes: true,
    ..DILITHIUM1
};

// ============================================================================
// Dilithium2 (medium, K = 4, L = 3)
// ============================================================================

/// Dilithium2 with SHAKE expansion.
pub const DILITHIUM2: Mode = Mode {
    name: "Dilithium2",
    use_aes: false,
    k: 4,
    l: 3,
    eta: 6,
    double_eta_bits: 4,
    beta: 325,
    omega: 80,
};

/// Dilithium2 with AES-256-CTR expansion.
pub const DILITHIUM2_AES: Mode = Mode {
    name: "Dilithium2-AES",
    use_aes: true,
    ..DILITHIUM2
};

// ============================================================================
// Dilithium3 (recommended, K = 5, L = 4)
// ============================================================================

/// Dilithium3 with SHAKE expansion.
pub const DILITHIUM3: Mode = Mode {
    name: "Dilithium3",
    use_aes: false,
    k: 5,
    l: 4,
    eta: 5,
    double_eta_bits: 4,
    beta: 275,
    omega: 96,
};

/// Dilithium3 with AES-256-CTR expansion.
pub const DILITHIUM3_AES: Mode = Mode {
    name: "Dilithium3-AES",
    use_aes: true,
    ..DILITHIUM3
};

// ============================================================================
// Dilithium4 (very high, K = 6, L = 5)
// ============================================================================

/// Dilithium4 with SHAKE expansion.
pub const DILITHIUM4: Mode = Mode {
    name: "Dilithium4",
    use_aes: false,
    k: 6,
    l: 5,
    eta: 3,
    double_eta_bits: 3,
    beta: 175,
    omega: 120,
};

/// Dilithium4 with AES-256-CTR expansion.
pub const DILITHIUM4_AES: Mode = Mode {
    name: "Dilithium4-AES",
    use_aes: true,
    ..DILITHIUM4
};

/// Every supported mode, in registration order.
pub const MODES: [Mode; 8] = [
    DILITHIUM1,
    DILITHIUM1_AES,
    DILITHIUM2,
    DILITHIUM2_AES,
    DILITHIUM3,
    DILITHIUM3_AES,
    DILITHIUM4,
    DILITHIUM4_AES,
];

/// Names of all supported modes.
pub fn mode_names() -> impl Iterator<Item = &'static str> {
    MODES.iter().map(|m| m.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_q() {
        assert_eq!(Q, (1 << 23) - (1 << 13) + 1);
        assert!(Q < 1 << Q_BITS);
        assert_eq!(GAMMA1, 523776);
        assert_eq!(GAMMA2, 261888);
    }

    #[test]
    fn test_packed_sizes() {
        assert_eq!(POLY_T1_SIZE, 288);
        assert_eq!(POLY_T0_SIZE, 448);
        assert_eq!(POLY_LE_GAMMA1_SIZE, 640);
        assert_eq!(POLY_LE16_SIZE, 128);
        assert_eq!(POLY_B60_SIZE, 40);
    }

    #[test]
    fn test_mode_sizes() {
        let expected = [
            (DILITHIUM1, 896, 2096, 1387),
            (DILITHIUM2, 1184, 2800, 2044),
            (DILITHIUM3, 1472, 3504, 2701),
            (DILITHIUM4, 1760, 3856, 3366),
        ];
        for (mode, pk, sk, sig) in expected {
            assert_eq!(mode.public_key_size(), pk, "{}", mode.name);
            assert_eq!(mode.private_key_size(), sk, "{}", mode.name);
            assert_eq!(mode.signature_size(), sig, "{}", mode.name);
        }
    }

    #[test]
    fn test_aes_variants_share_shape() {
        for pair in MODES.chunks(2) {
            let (shake, aes) = (pair[0], pair[1]);
            assert!(!shake.use_aes);
            assert!(aes.use_aes);
            assert_eq!(aes.name, format!("{}-AES", shake.name));
            assert_eq!(shake.public_key_size(), aes.public_key_size());
            assert_eq!(shake.private_key_size(), aes.private_key_size());
            assert_eq!(shake.signature_size(), aes.signature_size());
        }
    }

    #[test]
    fn test_by_name() {
        for mode in MODES {
            assert_eq!(Mode::by_name(mode.name).unwrap(), mode);
        }
        assert!(matches!(
            Mode::by_name("Dilithium5"),
            Err(DilithiumError::UnknownMode { .. })
        ));
        assert_eq!(mode_names().count(), 8);
    }

    #[test]
    fn test_eta_bits_fit() {
        for mode in MODES {
            assert!(2 * mode.eta < 1 << mode.double_eta_bits);
        }
    }
}
