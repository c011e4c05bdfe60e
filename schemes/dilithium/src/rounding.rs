//! Coefficient splitting and hints.
//!
//! - `power2round` drops the low D bits of t to form the public t1.
//! - `decompose` splits w into high bits w1 (a bucket index of width α) and
//!   low bits w0.
//! - `make_hint` / `use_hint` let the verifier recover w1 from a value that
//!   the signer has shifted by a small amount.
//!
//! Low parts are returned biased by +q so that everything stays unsigned.

use crate::params::{ALPHA, D, GAMMA2, Q};

/// Splits 0 ≤ a < q as a = a1·2^D + a0 with -2^(D-1) < a0 ≤ 2^(D-1).
///
/// Returns (a0 + q, a1).
#[inline]
pub fn power2round(a: u32) -> (u32, u32) {
    // Take the low D bits and move them from [0, 2^D) into
    // (-2^(D-1), 2^(D-1)] without branching.
    let mut a0 = a & ((1 << D) - 1);
    a0 = a0.wrapping_sub((1 << (D - 1)) + 1);
    a0 = a0.wrapping_add((((a0 as i32) >> 31) as u32) & (1 << D));
    a0 = a0.wrapping_sub((1 << (D - 1)) - 1);
    (Q.wrapping_add(a0), a.wrapping_sub(a0) >> D)
}

/// Splits 0 ≤ a < q as a = a1·α + a0 with -α/2 < a0 ≤ α/2.
///
/// When a1 would be (q-1)/α it is set to 0 instead and a0 decreased by one.
/// Returns (a0 + q, a1) with 0 ≤ a1 < 16.
#[inline]
pub fn decompose(a: u32) -> (u32, u32) {
    // a mod α computed with 2^19 ≡ 2^9 (mod α); the result lies in
    // (-α/2, α/2] after the centering below.
    let mut t = (a & 0x7FFFF) as i32 + (((a as i32) >> 19) << 9);
    t -= (ALPHA / 2 + 1) as i32;
    t += (t >> 31) & ALPHA as i32;
    t -= (ALPHA / 2 - 1) as i32;

    let mut a1 = a.wrapping_sub(t as u32);
    // a1 is now a multiple of α; u = 1 iff a1 == 0.
    let u = (a1.wrapping_sub(1) >> 31) & 1;
    a1 = (a1 >> 19).wrapping_add(1).wrapping_sub(u);

    // a1 == 16 is the wrap-around bucket: fold it to 0 and shift a0 down.
    let a0_plus_q = Q.wrapping_add(t as u32).wrapping_sub(a1 >> 4);
    (a0_plus_q, a1 & 15)
}

/// Returns 1 iff subtracting the perturbation that produced z0 from r
/// would move r's high bits r1 into another bucket.
///
/// z0 is the low part of the perturbed value, normalized to [0, q).
#[inline]
pub fn make_hint(z0: u32, r1: u32) -> u32 {
    if z0 <= GAMMA2 || z0 > Q - GAMMA2 || (z0 == Q - GAMMA2 && r1 == 0) {
        return 0;
    }
    1
}

/// Recovers the high bits of r from r and a hint produced by `make_hint`.
#[inline]
pub fn use_hint(r: u32, hint: u32) -> u32 {
    let (r0_plus_q, r1) = decompose(r);
    if hint == 0 {
        return r1;
    }
    if r0_plus_q > Q {
        return (r1 + 1) & 15;
    }
    r1.wrapping_sub(1) & 15
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reduce::mod_q;
    use proptest::prelude::*;

    #[test]
    fn test_power2round_small() {
        assert_eq!(power2round(0), (Q, 0));
        // 2^(D-1) stays in the low part, 2^(D-1) + 1 carries.
        assert_eq!(power2round(1 << (D - 1)), (Q + (1 << (D - 1)), 0));
        assert_eq!(power2round((1 << (D - 1)) + 1), (Q - (1 << (D - 1)) + 1, 1));
    }

    #[test]
    fn test_power2round_recombines() {
        for a in (0..Q).step_by(4099) {
            let (a0_plus_q, a1) = power2round(a);
            let a0 = a0_plus_q as i64 - Q as i64;
            assert!(a0 > -(1 << (D - 1)) && a0 <= 1 << (D - 1));
            assert_eq!((a1 as i64) * (1 << D) + a0, a as i64);
            assert!(a1 < 1 << 9);
        }
    }

    #[test]
    fn test_decompose_edge_bucket() {
        // Q - 1 lies in the collapsed top bucket: a1 = 0, a0 = -1.
        assert_eq!(decompose(Q - 1), (Q - 1, 0));
        // Just below the top bucket.
        let (a0, a1) = decompose(15 * ALPHA + ALPHA / 2);
        assert_eq!(a1, 15);
        assert_eq!(a0, Q + ALPHA / 2);
    }

    #[test]
    fn test_decompose_recombines() {
        for a in (0..Q).step_by(1021) {
            let (a0_plus_q, a1) = decompose(a);
            let a0 = a0_plus_q as i64 - Q as i64;
            assert!(a1 < 16);
            assert!(a0 >= -((ALPHA / 2) as i64) && a0 <= (ALPHA / 2) as i64);
            let back = (a1 as i64 * ALPHA as i64 + a0).rem_euclid(Q as i64);
            assert_eq!(back, a as i64);
        }
    }

    #[test]
    fn test_use_hint_zero_is_high_bits() {
        for a in (0..Q).step_by(7919) {
            assert_eq!(use_hint(a, 0), decompose(a).1);
        }
    }

    proptest! {
        #[test]
        fn prop_hint_recovers_high_bits(r in 0..Q, f in -(GAMMA2 as i64 - 1)..(GAMMA2 as i64)) {
            let (r0_plus_q, r1) = decompose(r);
            // z0 = r0 - f, r' = r - f, both normalized.
            let z0 = mod_q((r0_plus_q as i64 - f).rem_euclid(Q as i64) as u32);
            let r_prime = (r as i64 - f).rem_euclid(Q as i64) as u32;
            let h = make_hint(z0, r1);
            prop_assert_eq!(use_hint(r_prime, h), r1);
        }
    }
}
