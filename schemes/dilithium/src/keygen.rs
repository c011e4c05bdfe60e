//! Keys and key generation.
//!
//! Both key types carry the values derived from their canonical fields
//! (the expanded matrix, tr, NTT-domain secrets). These are computed once in
//! the constructor and never mutated, so a key can be shared freely between
//! threads.

use crate::error::{DilithiumError, Result};
use crate::packing::{
    pack_leq_eta, pack_t0, pack_t1, pack_vec, unpack_leq_eta, unpack_t0, unpack_t1,
};
use crate::params::{Mode, CRH_SIZE, POLY_T0_SIZE, POLY_T1_SIZE, SEED_SIZE};
use crate::poly::Poly;
use crate::polyvec::{PolyMatrix, PolyVec};
use crate::sampling::{crh, derive_matrix, derive_secrets, expand_seed};
use log::debug;
use rand::{CryptoRng, RngCore};
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

/// Dilithium public key.
#[derive(Clone, Debug)]
pub struct PublicKey {
    pub(crate) mode: Mode,
    pub(crate) rho: [u8; SEED_SIZE],
    pub(crate) t1: PolyVec,
    pub(crate) t1_packed: Vec<u8>,
    pub(crate) tr: [u8; CRH_SIZE],
    pub(crate) a: PolyMatrix,
}

impl PublicKey {
    fn from_parts(mode: Mode, rho: [u8; SEED_SIZE], t1: PolyVec, a: PolyMatrix) -> Self {
        let mut t1_packed = vec![0u8; mode.k * POLY_T1_SIZE];
        pack_vec(&t1, POLY_T1_SIZE, &mut t1_packed, pack_t1);
        let tr = crh(&[&rho, &t1_packed]);
        PublicKey {
            mode,
            rho,
            t1,
            t1_packed,
            tr,
            a,
        }
    }

    /// The mode this key belongs to.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Matrix seed ρ.
    pub fn rho(&self) -> &[u8; SEED_SIZE] {
        &self.rho
    }

    /// High bits t1 of t = A·s1 + s2.
    pub fn t1(&self) -> &PolyVec {
        &self.t1
    }

    /// tr = CRH(packed public key).
    pub fn tr(&self) -> &[u8; CRH_SIZE] {
        &self.tr
    }

    /// Serializes the public key.
    ///
    /// Format: ρ || t1_packed
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.mode.public_key_size());
        bytes.extend_from_slice(&self.rho);
        bytes.extend_from_slice(&self.t1_packed);
        bytes
    }

    /// Decodes a public key, re-deriving A and tr.
    pub fn from_bytes(mode: Mode, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != mode.public_key_size() {
            return Err(DilithiumError::InvalidKey {
                reason: "public key has the wrong length",
            });
        }
        let (rho_bytes, t1_bytes) = bytes.split_at(SEED_SIZE);
        let mut rho = [0u8; SEED_SIZE];
        rho.copy_from_slice(rho_bytes);
        let t1 = PolyVec::from_polys(t1_bytes.chunks_exact(POLY_T1_SIZE).map(unpack_t1).collect());

        debug!("decoded {} public key", mode.name);
        Ok(Self::from_parts(mode, rho, t1, derive_matrix(&rho, &mode)))
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.mode == other.mode && self.rho == other.rho && self.t1 == other.t1
    }
}

impl Eq for PublicKey {}

/// Dilithium private key.
///
/// Secret fields are wiped when the key is dropped.
#[derive(Clone)]
pub struct PrivateKey {
    pub(crate) mode: Mode,
    pub(crate) rho: [u8; SEED_SIZE],
    pub(crate) key: [u8; SEED_SIZE],
    pub(crate) tr: [u8; CRH_SIZE],
    pub(crate) s1: PolyVec,
    pub(crate) s2: PolyVec,
    pub(crate) t0: PolyVec,
    pub(crate) a: PolyMatrix,
    pub(crate) s1_hat: PolyVec,
    pub(crate) s2_hat: PolyVec,
    pub(crate) t0_hat: PolyVec,
}

impl PrivateKey {
    #[allow(clippy::too_many_arguments)]
    fn from_parts(
        mode: Mode,
        rho: [u8; SEED_SIZE],
        key: [u8; SEED_SIZE],
        tr: [u8; CRH_SIZE],
        s1: PolyVec,
        s2: PolyVec,
        t0: PolyVec,
        a: PolyMatrix,
    ) -> Self {
        let s1_hat = s1.to_ntt();
        let s2_hat = s2.to_ntt();
        let t0_hat = t0.to_ntt();
        PrivateKey {
            mode,
            rho,
            key,
            tr,
            s1,
            s2,
            t0,
            a,
            s1_hat,
            s2_hat,
            t0_hat,
        }
    }

    /// The mode this key belongs to.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Recomputes the public key: t = A·s1 + s2, then power2round.
    pub fn public(&self) -> PublicKey {
        let (_, t1) = compute_t(&self.a, &self.s1_hat, &self.s2).power2round();
        PublicKey::from_parts(self.mode, self.rho, t1, self.a.clone())
    }

    /// Serializes the private key.
    ///
    /// Format: ρ || key || tr || s1_packed || s2_packed || t0_packed
    pub fn to_bytes(&self) -> Vec<u8> {
        let mode = &self.mode;
        let eta_size = mode.poly_leq_eta_size();
        let mut bytes = vec![0u8; mode.private_key_size()];

        let (head, rest) = bytes.split_at_mut(2 * SEED_SIZE + CRH_SIZE);
        head[..SEED_SIZE].copy_from_slice(&self.rho);
        head[SEED_SIZE..2 * SEED_SIZE].copy_from_slice(&self.key);
        head[2 * SEED_SIZE..].copy_from_slice(&self.tr);

        let (s1_bytes, rest) = rest.split_at_mut(mode.l * eta_size);
        let (s2_bytes, t0_bytes) = rest.split_at_mut(mode.k * eta_size);
        let pack_eta = |p: &Poly, out: &mut [u8]| pack_leq_eta(p, mode, out);
        pack_vec(&self.s1, eta_size, s1_bytes, pack_eta);
        pack_vec(&self.s2, eta_size, s2_bytes, pack_eta);
        pack_vec(&self.t0, POLY_T0_SIZE, t0_bytes, pack_t0);
        bytes
    }

    /// Decodes a private key and rebuilds its caches.
    ///
    /// Rejects the wrong length and secret coefficients above η.
    pub fn from_bytes(mode: Mode, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != mode.private_key_size() {
            return Err(DilithiumError::InvalidKey {
                reason: "private key has the wrong length",
            });
        }
        let eta_size = mode.poly_leq_eta_size();

        let mut rho = [0u8; SEED_SIZE];
        let mut key = [0u8; SEED_SIZE];
        let mut tr = [0u8; CRH_SIZE];
        rho.copy_from_slice(&bytes[..SEED_SIZE]);
        key.copy_from_slice(&bytes[SEED_SIZE..2 * SEED_SIZE]);
        tr.copy_from_slice(&bytes[2 * SEED_SIZE..2 * SEED_SIZE + CRH_SIZE]);

        let rest = &bytes[2 * SEED_SIZE + CRH_SIZE..];
        let (s1_bytes, rest) = rest.split_at(mode.l * eta_size);
        let (s2_bytes, t0_bytes) = rest.split_at(mode.k * eta_size);

        let s1 = s1_bytes
            .chunks_exact(eta_size)
            .map(|b| unpack_leq_eta(b, &mode))
            .collect::<Result<Vec<_>>>()?;
        let s2 = s2_bytes
            .chunks_exact(eta_size)
            .map(|b| unpack_leq_eta(b, &mode))
            .collect::<Result<Vec<_>>>()?;
        let t0 = t0_bytes.chunks_exact(POLY_T0_SIZE).map(unpack_t0).collect();

        debug!("decoded {} private key", mode.name);
        Ok(Self::from_parts(
            mode,
            rho,
            key,
            tr,
            PolyVec::from_polys(s1),
            PolyVec::from_polys(s2),
            PolyVec::from_polys(t0),
            derive_matrix(&rho, &mode),
        ))
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.mode == other.mode && bool::from(self.to_bytes().ct_eq(&other.to_bytes()))
    }
}

impl Eq for PrivateKey {}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("mode", &self.mode.name)
            .finish_non_exhaustive()
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.key.zeroize();
        self.s1.zeroize();
        self.s2.zeroize();
        self.t0.zeroize();
        self.s1_hat.zeroize();
        self.s2_hat.zeroize();
        self.t0_hat.zeroize();
    }
}

/// t = InvNTT(Â·ŝ1) + s2, normalized.
fn compute_t(a: &PolyMatrix, s1_hat: &PolyVec, s2: &PolyVec) -> PolyVec {
    let mut t = a.mul_vec_hat(s1_hat);
    t.inv_ntt();
    t += s2;
    t.normalize();
    t
}

/// Generates a key pair from fresh entropy.
pub fn generate_key<R: RngCore + CryptoRng>(
    rng: &mut R,
    mode: Mode,
) -> Result<(PublicKey, PrivateKey)> {
    let mut seed = [0u8; SEED_SIZE];
    rng.try_fill_bytes(&mut seed)
        .map_err(|_| DilithiumError::EntropyUnavailable)?;
    let keys = new_key_from_seed(&seed, mode);
    seed.zeroize();
    Ok(keys)
}

/// Deterministic key generation from a 32-byte seed.
pub fn new_key_from_seed(seed: &[u8; SEED_SIZE], mode: Mode) -> (PublicKey, PrivateKey) {
    let mut expanded = expand_seed(seed);
    let keys = new_key_from_expanded_seed(&expanded, mode);
    expanded.zeroize();
    keys
}

/// Deterministic key generation from an already expanded 96-byte seed
/// ρ || secret seed || key.
pub fn new_key_from_expanded_seed(
    seed: &[u8; 3 * SEED_SIZE],
    mode: Mode,
) -> (PublicKey, PrivateKey) {
    let mut rho = [0u8; SEED_SIZE];
    let mut s_seed = [0u8; SEED_SIZE];
    let mut key = [0u8; SEED_SIZE];
    rho.copy_from_slice(&seed[..SEED_SIZE]);
    s_seed.copy_from_slice(&seed[SEED_SIZE..2 * SEED_SIZE]);
    key.copy_from_slice(&seed[2 * SEED_SIZE..]);

    let a = derive_matrix(&rho, &mode);
    let (s1, s2) = derive_secrets(&s_seed, &mode);
    s_seed.zeroize();

    let mut s1_hat = s1.to_ntt();
    let mut t = compute_t(&a, &s1_hat, &s2);
    s1_hat.zeroize();
    let (t0, t1) = t.power2round();
    t.zeroize();

    let pk = PublicKey::from_parts(mode, rho, t1, a.clone());
    let sk = PrivateKey::from_parts(mode, rho, key, pk.tr, s1, s2, t0, a);
    key.zeroize();

    debug!("generated {} key pair", mode.name);
    (pk, sk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{DILITHIUM1, DILITHIUM3_AES, DILITHIUM4, MODES, Q};
    use rand::rngs::OsRng;

    #[test]
    fn test_key_sizes() {
        for mode in MODES {
            let (pk, sk) = new_key_from_seed(&[7u8; 32], mode);
            assert_eq!(pk.to_bytes().len(), mode.public_key_size(), "{}", mode.name);
            assert_eq!(sk.to_bytes().len(), mode.private_key_size(), "{}", mode.name);
            assert_eq!(pk.t1().len(), mode.k);
            assert_eq!(sk.s1.len(), mode.l);
            assert_eq!(sk.s2.len(), mode.k);
        }
    }

    #[test]
    fn test_keygen_deterministic() {
        let (pk1, sk1) = new_key_from_seed(&[42u8; 32], DILITHIUM3_AES);
        let (pk2, sk2) = new_key_from_seed(&[42u8; 32], DILITHIUM3_AES);
        assert_eq!(pk1.to_bytes(), pk2.to_bytes());
        assert_eq!(sk1.to_bytes(), sk2.to_bytes());

        let (pk3, _) = new_key_from_seed(&[43u8; 32], DILITHIUM3_AES);
        assert_ne!(pk1, pk3);
    }

    #[test]
    fn test_expanded_seed_matches() {
        let seed = [3u8; 32];
        let (pk1, sk1) = new_key_from_seed(&seed, DILITHIUM1);
        let (pk2, sk2) = new_key_from_expanded_seed(&expand_seed(&seed), DILITHIUM1);
        assert_eq!(pk1, pk2);
        assert_eq!(sk1, sk2);
    }

    #[test]
    fn test_public_from_private() {
        let (pk, sk) = generate_key(&mut OsRng, DILITHIUM4).unwrap();
        let derived = sk.public();
        assert_eq!(derived, pk);
        assert_eq!(derived.tr(), pk.tr());
        assert_eq!(sk.tr, *pk.tr());
    }

    #[test]
    fn test_t1_bound() {
        let (pk, sk) = new_key_from_seed(&[1u8; 32], DILITHIUM1);
        for p in &pk.t1().polys {
            assert!(p.coeffs.iter().all(|&c| c < 1 << 9));
        }
        for p in &sk.t0.polys {
            assert!(p.coeffs.iter().all(|&c| c > Q - (1 << 13) && c <= Q + (1 << 13)));
        }
    }

    #[test]
    fn test_serialization_round_trip() {
        for mode in MODES {
            let (pk, sk) = new_key_from_seed(&[9u8; 32], mode);
            let pk2 = PublicKey::from_bytes(mode, &pk.to_bytes()).unwrap();
            let sk2 = PrivateKey::from_bytes(mode, &sk.to_bytes()).unwrap();
            assert_eq!(pk, pk2);
            assert_eq!(pk.tr(), pk2.tr());
            assert_eq!(pk.a, pk2.a);
            assert_eq!(sk, sk2);
            assert_eq!(sk.s1_hat, sk2.s1_hat);
            assert_eq!(sk.t0_hat, sk2.t0_hat);
        }
    }

    #[test]
    fn test_from_bytes_wrong_length() {
        let mode = DILITHIUM1;
        let (pk, sk) = new_key_from_seed(&[0u8; 32], mode);
        let mut bytes = pk.to_bytes();
        bytes.pop();
        assert!(matches!(
            PublicKey::from_bytes(mode, &bytes),
            Err(DilithiumError::InvalidKey { .. })
        ));
        let mut bytes = sk.to_bytes();
        bytes.push(0);
        assert!(matches!(
            PrivateKey::from_bytes(mode, &bytes),
            Err(DilithiumError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_private_key_rejects_large_secret() {
        let mode = DILITHIUM1;
        let (_, sk) = new_key_from_seed(&[0u8; 32], mode);
        let mut bytes = sk.to_bytes();
        // first s1 nibble set to 15 > 2η = 14
        bytes[2 * SEED_SIZE + CRH_SIZE] |= 0x0F;
        assert!(matches!(
            PrivateKey::from_bytes(mode, &bytes),
            Err(DilithiumError::DecodingError { .. })
        ));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let (_, sk) = new_key_from_seed(&[0u8; 32], DILITHIUM1);
        let shown = format!("{:?}", sk);
        assert!(shown.contains("Dilithium1"));
        assert!(!shown.contains("s1"));
    }
}
