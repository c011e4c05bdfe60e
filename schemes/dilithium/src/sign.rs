//! Signing (Fiat-Shamir with aborts).
//!
//! Each iteration draws a fresh mask y, commits to the high bits of A·y and
//! derives the challenge c from them. The response z = y + c·s1 is released
//! only if neither z nor the low bits leak information about the secret;
//! otherwise the loop starts over with the next nonces.

use crate::error::{DilithiumError, Result, VerificationFailure};
use crate::keygen::PrivateKey;
use crate::packing::{
    pack_b60, pack_hint, pack_le_gamma1, pack_vec, unpack_b60, unpack_hint, unpack_le_gamma1,
};
use crate::params::{Mode, CRH_SIZE, GAMMA1, GAMMA2, POLY_B60_SIZE, POLY_LE_GAMMA1_SIZE};
use crate::poly::Poly;
use crate::polyvec::PolyVec;
use crate::sampling::{crh, derive_uniform_b60, derive_uniform_le_gamma1};
use log::{debug, error, trace};
use zeroize::Zeroizing;

/// Iteration cap for the rejection loop.
///
/// Every mode accepts with probability well above 1/10 per iteration, so
/// reaching this means the key or the build is broken.
pub const MAX_ITERATIONS: u32 = 10_000;

/// An unpacked signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    /// Response vector z (l polynomials), normalized.
    pub z: PolyVec,
    /// Hint vector (k polynomials with 0/1 coefficients).
    pub hint: PolyVec,
    /// Challenge with sixty coefficients in {1, q - 1}.
    pub c: Poly,
}

impl Signature {
    /// Serializes the signature.
    ///
    /// Format: z_packed || hint_packed || c_packed
    pub fn to_bytes(&self, mode: &Mode) -> Vec<u8> {
        let mut bytes = vec![0u8; mode.signature_size()];
        self.pack_into(mode, &mut bytes);
        bytes
    }

    fn pack_into(&self, mode: &Mode, out: &mut [u8]) {
        let (z_bytes, rest) = out.split_at_mut(mode.l * POLY_LE_GAMMA1_SIZE);
        let (hint_bytes, c_bytes) = rest.split_at_mut(mode.omega + mode.k);
        pack_vec(&self.z, POLY_LE_GAMMA1_SIZE, z_bytes, pack_le_gamma1);
        pack_hint(&self.hint, mode.omega, hint_bytes);
        pack_b60(&self.c, c_bytes);
    }

    /// Decodes a signature.
    ///
    /// Rejects the wrong length, z with a coefficient of norm at least
    /// γ1 - β, a non-canonical hint and a malformed challenge.
    pub fn from_bytes(mode: &Mode, bytes: &[u8]) -> Result<Signature> {
        if bytes.len() != mode.signature_size() {
            return Err(VerificationFailure::WrongLength.into());
        }
        let (z_bytes, rest) = bytes.split_at(mode.l * POLY_LE_GAMMA1_SIZE);
        let (hint_bytes, c_bytes) = rest.split_at(mode.omega + mode.k);

        let z = PolyVec::from_polys(
            z_bytes
                .chunks_exact(POLY_LE_GAMMA1_SIZE)
                .map(unpack_le_gamma1)
                .collect(),
        );
        if z.exceeds(GAMMA1 - mode.beta) {
            return Err(VerificationFailure::NormBoundExceeded.into());
        }
        let hint = unpack_hint(hint_bytes, mode.k, mode.omega)
            .map_err(|_| VerificationFailure::MalformedHints)?;
        debug_assert_eq!(c_bytes.len(), POLY_B60_SIZE);
        let c = unpack_b60(c_bytes).map_err(|_| VerificationFailure::MalformedChallenge)?;

        Ok(Signature { z, hint, c })
    }
}

/// Signs a message, returning the packed signature.
pub fn sign(sk: &PrivateKey, message: &[u8]) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; sk.mode.signature_size()];
    sign_to(sk, message, &mut bytes)?;
    Ok(bytes)
}

/// Signs a message into `signature`.
///
/// # Panics
/// If `signature` is shorter than the mode's signature size.
pub fn sign_to(sk: &PrivateKey, message: &[u8], signature: &mut [u8]) -> Result<()> {
    let size = sk.mode.signature_size();
    assert!(
        signature.len() >= size,
        "signature buffer too short: {} < {}",
        signature.len(),
        size
    );
    let sig = sign_unpacked(sk, message)?;
    sig.pack_into(&sk.mode, &mut signature[..size]);
    Ok(())
}

/// Runs the rejection loop and returns the unpacked signature.
pub fn sign_unpacked(sk: &PrivateKey, message: &[u8]) -> Result<Signature> {
    let mode = &sk.mode;
    let mu = crh(&[&sk.tr, message]);
    let rho_prime = Zeroizing::new(crh(&[&sk.key, &mu]));

    // y uses nonces l·(i-1) .. l·i - 1 in iteration i
    let mut nonce: u16 = 0;
    for attempt in 1..=MAX_ITERATIONS {
        if let Some(sig) = try_sign(sk, &mu, &rho_prime, nonce) {
            debug!("{}: signed after {} iterations", mode.name, attempt);
            return Ok(sig);
        }
        nonce = nonce.wrapping_add(mode.l as u16);
    }

    error!(
        "{}: signing gave up after {} iterations",
        mode.name, MAX_ITERATIONS
    );
    Err(DilithiumError::SigningFailed {
        attempts: MAX_ITERATIONS,
    })
}

/// One iteration of the loop; None means rejected.
fn try_sign(
    sk: &PrivateKey,
    mu: &[u8; CRH_SIZE],
    rho_prime: &[u8; CRH_SIZE],
    nonce: u16,
) -> Option<Signature> {
    let mode = &sk.mode;

    let y = Zeroizing::new(PolyVec::from_polys(
        (0..mode.l)
            .map(|i| derive_uniform_le_gamma1(rho_prime, nonce.wrapping_add(i as u16), mode.use_aes))
            .collect(),
    ));
    let y_hat = Zeroizing::new(y.to_ntt());

    // w = A·y, split into high bits w1 and low bits w0
    let mut w = sk.a.mul_vec_hat(&y_hat);
    w.inv_ntt();
    w.normalize_assuming_le2q();
    let (w0, w1) = w.decompose();

    let c = derive_uniform_b60(mu, &w1);
    let mut c_hat = c.clone();
    c_hat.ntt();

    let mut cs2 = Zeroizing::new(sk.s2_hat.scale_hat(&c_hat));
    cs2.inv_ntt();
    let mut w0_minus_cs2 = &w0 - &*cs2;
    w0_minus_cs2.normalize();
    if w0_minus_cs2.exceeds(GAMMA2 - mode.beta) {
        trace!("rejected: w0 - c·s2 out of range");
        return None;
    }

    let mut z = sk.s1_hat.scale_hat(&c_hat);
    z.inv_ntt();
    z += &*y;
    z.normalize();
    if z.exceeds(GAMMA1 - mode.beta) {
        trace!("rejected: z out of range");
        return None;
    }

    let mut ct0 = sk.t0_hat.scale_hat(&c_hat);
    ct0.inv_ntt();
    ct0.normalize_assuming_le2q();
    if ct0.exceeds(GAMMA2) {
        trace!("rejected: c·t0 out of range");
        return None;
    }

    let mut r0 = &w0_minus_cs2 + &ct0;
    r0.normalize_assuming_le2q();
    let (hint, pop) = PolyVec::make_hint(&r0, &w1);
    if pop as usize > mode.omega {
        trace!("rejected: {} hints exceed omega", pop);
        return None;
    }

    Some(Signature { z, hint, c })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keygen::new_key_from_seed;
    use crate::params::{DILITHIUM1, DILITHIUM2_AES, MODES, Q};

    #[test]
    fn test_signature_size() {
        for mode in MODES {
            let (_, sk) = new_key_from_seed(&[5u8; 32], mode);
            let sig = sign(&sk, b"size").unwrap();
            assert_eq!(sig.len(), mode.signature_size(), "{}", mode.name);
        }
    }

    #[test]
    fn test_sign_is_deterministic() {
        let (_, sk) = new_key_from_seed(&[5u8; 32], DILITHIUM2_AES);
        assert_eq!(sign(&sk, b"msg").unwrap(), sign(&sk, b"msg").unwrap());
        assert_ne!(sign(&sk, b"msg").unwrap(), sign(&sk, b"msh").unwrap());
    }

    #[test]
    fn test_unpacked_signature_invariants() {
        let mode = DILITHIUM1;
        let (_, sk) = new_key_from_seed(&[11u8; 32], mode);
        let sig = sign_unpacked(&sk, b"invariants").unwrap();
        assert!(!sig.z.exceeds(GAMMA1 - mode.beta));
        assert!(sig.z.polys.iter().all(|p| p.is_normalized()));
        assert!(sig.hint.weight() <= mode.omega);
        assert!(sig.hint.polys.iter().all(|p| p.coeffs.iter().all(|&h| h <= 1)));
        assert_eq!(sig.c.weight(), 60);
        assert!(sig.c.coeffs.iter().all(|&x| x == 0 || x == 1 || x == Q - 1));
    }

    #[test]
    fn test_signature_bytes_round_trip() {
        let mode = DILITHIUM1;
        let (_, sk) = new_key_from_seed(&[12u8; 32], mode);
        let sig = sign_unpacked(&sk, b"round trip").unwrap();
        let bytes = sig.to_bytes(&mode);
        assert_eq!(bytes, sign(&sk, b"round trip").unwrap());
        assert_eq!(Signature::from_bytes(&mode, &bytes).unwrap(), sig);
    }

    #[test]
    fn test_sign_to_longer_buffer() {
        let mode = DILITHIUM1;
        let (_, sk) = new_key_from_seed(&[13u8; 32], mode);
        let mut buf = vec![0xEEu8; mode.signature_size() + 4];
        sign_to(&sk, b"buffer", &mut buf).unwrap();
        assert_eq!(&buf[..mode.signature_size()], &sign(&sk, b"buffer").unwrap()[..]);
        assert_eq!(&buf[mode.signature_size()..], &[0xEE; 4]);
    }

    #[test]
    #[should_panic(expected = "signature buffer too short")]
    fn test_sign_to_short_buffer_panics() {
        let mode = DILITHIUM1;
        let (_, sk) = new_key_from_seed(&[13u8; 32], mode);
        let mut buf = vec![0u8; mode.signature_size() - 1];
        let _ = sign_to(&sk, b"buffer", &mut buf);
    }

    #[test]
    fn test_from_bytes_wrong_length() {
        let mode = DILITHIUM1;
        assert_eq!(
            Signature::from_bytes(&mode, &[0u8; 10]),
            Err(DilithiumError::VerificationFailed(
                VerificationFailure::WrongLength
            ))
        );
    }
}
