//! Signature verification.
//!
//! Uses only public data: recomputes w1' = UseHint(A·z - c·t1·2^D, h) and
//! accepts iff the challenge derived from μ and w1' equals c.

use crate::error::{Result, VerificationFailure};
use crate::keygen::PublicKey;
use crate::params::{CHALLENGE_WEIGHT, GAMMA1, Q};
use crate::polyvec::PolyVec;
use crate::sampling::{crh, derive_uniform_b60};
use crate::sign::Signature;
use log::debug;
use subtle::ConstantTimeEq;

/// Verifies a packed signature.
///
/// Returns `Ok(())` if the signature is valid, or the reason it was
/// rejected. Malformed input of any length is rejected without panicking.
pub fn verify(pk: &PublicKey, message: &[u8], signature: &[u8]) -> Result<()> {
    let sig = Signature::from_bytes(&pk.mode, signature).map_err(|e| {
        debug!("{}: rejected signature: {}", pk.mode.name, e);
        e
    })?;
    verify_unpacked(pk, message, &sig)
}

/// Verifies an already decoded signature.
pub fn verify_unpacked(pk: &PublicKey, message: &[u8], sig: &Signature) -> Result<()> {
    let mode = &pk.mode;
    if sig.z.len() != mode.l || sig.hint.len() != mode.k {
        return Err(VerificationFailure::WrongLength.into());
    }
    let z_normalized = sig.z.polys.iter().all(|p| p.is_normalized());
    if !z_normalized || sig.z.exceeds(GAMMA1 - mode.beta) {
        debug!("{}: rejected signature: z out of range", mode.name);
        return Err(VerificationFailure::NormBoundExceeded.into());
    }
    let hint_bits_valid = sig.hint.polys.iter().all(|p| p.coeffs.iter().all(|&h| h <= 1));
    if !hint_bits_valid || sig.hint.weight() > mode.omega {
        return Err(VerificationFailure::MalformedHints.into());
    }
    let c_valid = sig.c.coeffs.iter().all(|&x| x == 0 || x == 1 || x == Q - 1);
    if !c_valid || sig.c.weight() != CHALLENGE_WEIGHT {
        return Err(VerificationFailure::MalformedChallenge.into());
    }

    let mu = crh(&[&pk.tr, message]);

    let z_hat = sig.z.to_ntt();
    let mut c_hat = sig.c.clone();
    c_hat.ntt();

    // w1' = UseHint(A·z - c·t1·2^D, h)
    let mut w1 = PolyVec::zero(mode.k);
    for i in 0..mode.k {
        let az = pk.a.rows[i].dot_hat(&z_hat);
        let mut t1 = pk.t1.polys[i].mul_by_2_to_d();
        t1.ntt();
        let ct1 = t1.mul_hat(&c_hat);

        let mut r = &az - &ct1;
        r.reduce_le2q();
        r.inv_ntt();
        r.normalize_assuming_le2q();
        w1.polys[i] = r.use_hint(&sig.hint.polys[i]);
    }

    let c2 = derive_uniform_b60(&mu, &w1);
    if bool::from(c2.coeffs[..].ct_eq(&sig.c.coeffs[..])) {
        Ok(())
    } else {
        debug!("{}: rejected signature: challenge mismatch", mode.name);
        Err(VerificationFailure::ChallengeMismatch.into())
    }
}

/// Verifies a packed signature, returning a boolean.
pub fn verify_bool(pk: &PublicKey, message: &[u8], signature: &[u8]) -> bool {
    verify(pk, message, signature).is_ok()
}
