//! Polynomials in R_q = Z_q[X]/(X^256 + 1).
//!
//! Coefficients are unsigned and not always reduced. Each operation states
//! the bound it expects and the bound it produces:
//! - "normalized" means every coefficient is in [0, q);
//! - "le2q" means every coefficient is below 2q;
//! - NTT-domain ("hat") polynomials come out of `ntt` below 18q.
//!
//! Signed values v are stored as v mod q, or as q + v where an operation
//! says so (secrets, t0, low parts of `decompose`).

use crate::ntt::{inv_ntt, ntt};
use crate::params::{D, N, Q};
use crate::reduce::{le2q_mod_q, mod_q, mont_reduce_le2q, reduce_le2q};
use crate::rounding;
use std::ops::{Add, AddAssign, Sub};
use zeroize::Zeroize;

/// A polynomial in R_q.
///
/// Equality compares raw coefficients, so two polynomials are only equal
/// as ring elements when both are normalized.
#[derive(Clone, Debug, PartialEq, Eq, Zeroize)]
pub struct Poly {
    /// coeffs[i] is the coefficient of X^i.
    pub coeffs: [u32; N],
}

impl Default for Poly {
    fn default() -> Self {
        Self::zero()
    }
}

impl Poly {
    /// Creates the zero polynomial.
    pub fn zero() -> Self {
        Poly { coeffs: [0; N] }
    }

    /// Creates a polynomial from a coefficient array.
    pub fn from_coeffs(coeffs: [u32; N]) -> Self {
        Poly { coeffs }
    }

    /// Reduces every coefficient to below 2q.
    pub fn reduce_le2q(&mut self) {
        for c in self.coeffs.iter_mut() {
            *c = reduce_le2q(*c);
        }
    }

    /// Reduces every coefficient to [0, q).
    pub fn normalize(&mut self) {
        for c in self.coeffs.iter_mut() {
            *c = mod_q(*c);
        }
    }

    /// Reduces every coefficient to [0, q), assuming they are below 2q.
    pub fn normalize_assuming_le2q(&mut self) {
        for c in self.coeffs.iter_mut() {
            *c = le2q_mod_q(*c);
        }
    }

    /// Returns true if every coefficient is in [0, q).
    pub fn is_normalized(&self) -> bool {
        self.coeffs.iter().all(|&c| c < Q)
    }

    /// Applies the forward NTT in place.
    ///
    /// Requires coefficients below 2q; leaves them below 18q.
    pub fn ntt(&mut self) {
        ntt(&mut self.coeffs);
    }

    /// Applies the inverse NTT in place.
    ///
    /// Requires coefficients below 2q; leaves them at most 2q.
    pub fn inv_ntt(&mut self) {
        inv_ntt(&mut self.coeffs);
    }

    /// Pointwise Montgomery product of two NTT-domain polynomials.
    ///
    /// Each product of coefficients must be below q·2^32; the result is
    /// at most 2q.
    pub fn mul_hat(&self, other: &Poly) -> Poly {
        let mut r = Poly::zero();
        for i in 0..N {
            r.coeffs[i] = mont_reduce_le2q(self.coeffs[i] as u64 * other.coeffs[i] as u64);
        }
        r
    }

    /// Returns 2^D · self without reducing.
    ///
    /// Coefficients must be below 2^(32-D).
    pub fn mul_by_2_to_d(&self) -> Poly {
        let mut r = Poly::zero();
        for i in 0..N {
            r.coeffs[i] = self.coeffs[i] << D;
        }
        r
    }

    /// Checks whether the infinity norm is at least `bound`.
    ///
    /// Requires normalized coefficients. Which coefficient fails may leak
    /// through timing, its sign does not.
    pub fn exceeds(&self, bound: u32) -> bool {
        const HALF: i32 = ((Q - 1) / 2) as i32;
        for &c in self.coeffs.iter() {
            // |centered c|: for c > (q-1)/2 this is q - c, otherwise c.
            let mut x = HALF.wrapping_sub(c as i32);
            x ^= x >> 31;
            x = HALF.wrapping_sub(x);
            if x as u32 >= bound {
                return true;
            }
        }
        false
    }

    /// Splits each coefficient with `power2round`.
    ///
    /// Returns (t0 + q, t1). Requires normalized coefficients.
    pub fn power2round(&self) -> (Poly, Poly) {
        let mut p0 = Poly::zero();
        let mut p1 = Poly::zero();
        for i in 0..N {
            let (a0, a1) = rounding::power2round(self.coeffs[i]);
            p0.coeffs[i] = a0;
            p1.coeffs[i] = a1;
        }
        (p0, p1)
    }

    /// Splits each coefficient with `decompose`.
    ///
    /// Returns (w0 + q, w1). Requires normalized coefficients.
    pub fn decompose(&self) -> (Poly, Poly) {
        let mut p0 = Poly::zero();
        let mut p1 = Poly::zero();
        for i in 0..N {
            let (a0, a1) = rounding::decompose(self.coeffs[i]);
            p0.coeffs[i] = a0;
            p1.coeffs[i] = a1;
        }
        (p0, p1)
    }

    /// Builds the hint polynomial for the perturbed low bits `z0` and the
    /// unperturbed high bits `r1`.
    ///
    /// Returns the hint and its number of ones.
    pub fn make_hint(z0: &Poly, r1: &Poly) -> (Poly, u32) {
        let mut h = Poly::zero();
        let mut pop = 0;
        for i in 0..N {
            let bit = rounding::make_hint(z0.coeffs[i], r1.coeffs[i]);
            h.coeffs[i] = bit;
            pop += bit;
        }
        (h, pop)
    }

    /// Corrects the high bits of self with `hint`.
    pub fn use_hint(&self, hint: &Poly) -> Poly {
        let mut r = Poly::zero();
        for i in 0..N {
            r.coeffs[i] = rounding::use_hint(self.coeffs[i], hint.coeffs[i]);
        }
        r
    }

    /// Number of nonzero coefficients.
    pub fn weight(&self) -> usize {
        self.coeffs.iter().filter(|&&c| c != 0).count()
    }
}

/// Coefficient-wise sum without reduction.
impl Add for &Poly {
    type Output = Poly;

    fn add(self, rhs: &Poly) -> Poly {
        let mut r = Poly::zero();
        for i in 0..N {
            r.coeffs[i] = self.coeffs[i].wrapping_add(rhs.coeffs[i]);
        }
        r
    }
}

impl AddAssign<&Poly> for Poly {
    fn add_assign(&mut self, rhs: &Poly) {
        for i in 0..N {
            self.coeffs[i] = self.coeffs[i].wrapping_add(rhs.coeffs[i]);
        }
    }
}

/// Coefficient-wise a + 2q - b without reduction.
///
/// The coefficients of the right-hand side must be at most 2q.
impl Sub for &Poly {
    type Output = Poly;

    fn sub(self, rhs: &Poly) -> Poly {
        let mut r = Poly::zero();
        for i in 0..N {
            r.coeffs[i] = self.coeffs[i].wrapping_add((2 * Q).wrapping_sub(rhs.coeffs[i]));
        }
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{GAMMA1, GAMMA2};

    fn sample_poly(step: u32) -> Poly {
        let mut p = Poly::zero();
        for i in 0..N {
            p.coeffs[i] = (i as u32 * step + 17) % Q;
        }
        p
    }

    #[test]
    fn test_normalize() {
        let mut p = Poly::zero();
        p.coeffs[0] = Q;
        p.coeffs[1] = 2 * Q + 5;
        p.coeffs[2] = u32::MAX;
        p.normalize();
        assert_eq!(p.coeffs[0], 0);
        assert_eq!(p.coeffs[1], 5);
        assert_eq!(p.coeffs[2], u32::MAX % Q);
        assert!(p.is_normalized());
    }

    #[test]
    fn test_sub_then_normalize() {
        let a = sample_poly(3);
        let b = sample_poly(11);
        let mut d = &a - &b;
        d.normalize();
        for i in 0..N {
            let expected = (a.coeffs[i] + Q - b.coeffs[i]) % Q;
            assert_eq!(d.coeffs[i], expected);
        }
    }

    #[test]
    fn test_add() {
        let a = sample_poly(5);
        let b = sample_poly(9);
        let mut s = &a + &b;
        s.normalize();
        let mut t = a.clone();
        t += &b;
        t.normalize();
        assert_eq!(s, t);
        assert_eq!(s.coeffs[3], (a.coeffs[3] + b.coeffs[3]) % Q);
    }

    #[test]
    fn test_exceeds() {
        let mut p = Poly::zero();
        assert!(!p.exceeds(1));
        p.coeffs[10] = 100;
        assert!(p.exceeds(100));
        assert!(!p.exceeds(101));
        // -100 has the same norm.
        p.coeffs[10] = Q - 100;
        assert!(p.exceeds(100));
        assert!(!p.exceeds(101));
        // Largest magnitudes on both sides of the center.
        p.coeffs[10] = (Q - 1) / 2;
        assert!(p.exceeds((Q - 1) / 2));
        p.coeffs[10] = (Q + 1) / 2;
        assert!(p.exceeds((Q - 1) / 2));
        assert!(!p.exceeds((Q + 1) / 2));
    }

    #[test]
    fn test_exceeds_gamma_bounds() {
        let mut p = Poly::zero();
        p.coeffs[0] = GAMMA1 - 1;
        assert!(!p.exceeds(GAMMA1));
        p.coeffs[0] = Q - GAMMA2;
        assert!(p.exceeds(GAMMA2));
        assert!(!p.exceeds(GAMMA2 + 1));
    }

    #[test]
    fn test_mul_by_2_to_d() {
        let mut p = Poly::zero();
        p.coeffs[0] = 1;
        p.coeffs[1] = 511;
        let r = p.mul_by_2_to_d();
        assert_eq!(r.coeffs[0], 1 << D);
        assert_eq!(r.coeffs[1], 511 << D);
        assert!(r.coeffs.iter().all(|&c| c < 2 * Q));
    }

    #[test]
    fn test_power2round_recombines() {
        let p = sample_poly(32771);
        let (p0, p1) = p.power2round();
        for i in 0..N {
            let back = (p1.coeffs[i] << D) as u64 + p0.coeffs[i] as u64 - Q as u64;
            assert_eq!(back, p.coeffs[i] as u64);
        }
    }

    #[test]
    fn test_hint_population() {
        let mut z0 = Poly::zero();
        let r1 = Poly::zero();
        z0.coeffs[0] = GAMMA2 + 1;
        z0.coeffs[5] = Q - GAMMA2;
        z0.coeffs[7] = 3;
        let (h, pop) = Poly::make_hint(&z0, &r1);
        // Q - γ2 with r1 = 0 does not need a hint.
        assert_eq!(pop, 1);
        assert_eq!(h.coeffs[0], 1);
        assert_eq!(h.coeffs[5], 0);
        assert_eq!(h.weight(), 1);
    }

    #[test]
    fn test_use_hint_without_hints_is_high_bits() {
        let p = sample_poly(40009);
        let (_, w1) = p.decompose();
        assert_eq!(p.use_hint(&Poly::zero()), w1);
    }

    #[test]
    fn test_zeroize() {
        let mut p = sample_poly(3);
        p.zeroize();
        assert_eq!(p, Poly::zero());
    }
}
