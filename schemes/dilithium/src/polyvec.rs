//! Vectors and matrices of polynomials.
//!
//! In Dilithium:
//! - s1, y and z are vectors of l polynomials
//! - s2, t, w and the hint are vectors of k polynomials
//! - A is a k×l matrix, kept in the NTT domain for its whole life

use crate::poly::Poly;
use std::ops::{Add, AddAssign, Sub};
use zeroize::Zeroize;

/// A vector of polynomials.
#[derive(Clone, Debug, PartialEq, Eq, Zeroize)]
pub struct PolyVec {
    /// The polynomials in this vector.
    pub polys: Vec<Poly>,
}

impl PolyVec {
    /// Creates a zero vector of the given length.
    pub fn zero(len: usize) -> Self {
        PolyVec {
            polys: (0..len).map(|_| Poly::zero()).collect(),
        }
    }

    /// Creates a vector from a Vec of polynomials.
    pub fn from_polys(polys: Vec<Poly>) -> Self {
        PolyVec { polys }
    }

    /// Returns the length of this vector.
    pub fn len(&self) -> usize {
        self.polys.len()
    }

    /// Returns true if the vector is empty.
    pub fn is_empty(&self) -> bool {
        self.polys.is_empty()
    }

    /// Reduces every coefficient to below 2q.
    pub fn reduce_le2q(&mut self) {
        for poly in &mut self.polys {
            poly.reduce_le2q();
        }
    }

    /// Reduces every coefficient to [0, q).
    pub fn normalize(&mut self) {
        for poly in &mut self.polys {
            poly.normalize();
        }
    }

    /// Reduces every coefficient to [0, q), assuming they are below 2q.
    pub fn normalize_assuming_le2q(&mut self) {
        for poly in &mut self.polys {
            poly.normalize_assuming_le2q();
        }
    }

    /// Applies forward NTT to all polynomials.
    pub fn ntt(&mut self) {
        for poly in &mut self.polys {
            poly.ntt();
        }
    }

    /// Applies inverse NTT to all polynomials.
    pub fn inv_ntt(&mut self) {
        for poly in &mut self.polys {
            poly.inv_ntt();
        }
    }

    /// Returns a copy in the NTT domain.
    pub fn to_ntt(&self) -> Self {
        let mut v = self.clone();
        v.ntt();
        v
    }

    /// True if any polynomial has a coefficient of norm at least `bound`.
    pub fn exceeds(&self, bound: u32) -> bool {
        self.polys.iter().any(|p| p.exceeds(bound))
    }

    /// Splits every polynomial with `power2round`, returning (v0 + q, v1).
    pub fn power2round(&self) -> (PolyVec, PolyVec) {
        let (v0, v1) = self.polys.iter().map(|p| p.power2round()).unzip();
        (PolyVec::from_polys(v0), PolyVec::from_polys(v1))
    }

    /// Splits every polynomial with `decompose`, returning (v0 + q, v1).
    pub fn decompose(&self) -> (PolyVec, PolyVec) {
        let (v0, v1) = self.polys.iter().map(|p| p.decompose()).unzip();
        (PolyVec::from_polys(v0), PolyVec::from_polys(v1))
    }

    /// Builds the hint vector and returns it with its total number of ones.
    pub fn make_hint(z0: &PolyVec, r1: &PolyVec) -> (PolyVec, u32) {
        assert_eq!(z0.len(), r1.len(), "Vector lengths must match");
        let mut pop = 0;
        let mut polys = Vec::with_capacity(z0.len());
        for (a, b) in z0.polys.iter().zip(r1.polys.iter()) {
            let (h, n) = Poly::make_hint(a, b);
            pop += n;
            polys.push(h);
        }
        (PolyVec::from_polys(polys), pop)
    }

    /// Recovers high bits using `hint`.
    pub fn use_hint(&self, hint: &PolyVec) -> PolyVec {
        assert_eq!(self.len(), hint.len(), "Vector lengths must match");
        PolyVec {
            polys: self
                .polys
                .iter()
                .zip(hint.polys.iter())
                .map(|(p, h)| p.use_hint(h))
                .collect(),
        }
    }

    /// Multiplies every polynomial by 2^D.
    pub fn mul_by_2_to_d(&self) -> PolyVec {
        PolyVec {
            polys: self.polys.iter().map(|p| p.mul_by_2_to_d()).collect(),
        }
    }

    /// Multiplies every polynomial pointwise by the NTT-domain `c_hat`.
    pub fn scale_hat(&self, c_hat: &Poly) -> PolyVec {
        PolyVec {
            polys: self.polys.iter().map(|p| c_hat.mul_hat(p)).collect(),
        }
    }

    /// Sum over i of mul_hat(self[i], other[i]), left unreduced.
    ///
    /// Both vectors must be in the NTT domain. Each term is at most 2q, so
    /// the sum stays below 2·l·q.
    pub fn dot_hat(&self, other: &PolyVec) -> Poly {
        assert_eq!(self.len(), other.len(), "Vector lengths must match");

        let mut result = Poly::zero();
        for (a, b) in self.polys.iter().zip(other.polys.iter()) {
            result += &a.mul_hat(b);
        }
        result
    }

    /// Total number of nonzero coefficients.
    pub fn weight(&self) -> usize {
        self.polys.iter().map(|p| p.weight()).sum()
    }
}

impl Add for &PolyVec {
    type Output = PolyVec;

    fn add(self, rhs: &PolyVec) -> PolyVec {
        assert_eq!(self.len(), rhs.len(), "Vector lengths must match");
        PolyVec {
            polys: self
                .polys
                .iter()
                .zip(rhs.polys.iter())
                .map(|(a, b)| a + b)
                .collect(),
        }
    }
}

impl AddAssign<&PolyVec> for PolyVec {
    fn add_assign(&mut self, rhs: &PolyVec) {
        assert_eq!(self.len(), rhs.len(), "Vector lengths must match");
        for (a, b) in self.polys.iter_mut().zip(rhs.polys.iter()) {
            *a += b;
        }
    }
}

/// Coefficient-wise a + 2q - b, as for `Poly`.
impl Sub for &PolyVec {
    type Output = PolyVec;

    fn sub(self, rhs: &PolyVec) -> PolyVec {
        assert_eq!(self.len(), rhs.len(), "Vector lengths must match");
        PolyVec {
            polys: self
                .polys
                .iter()
                .zip(rhs.polys.iter())
                .map(|(a, b)| a - b)
                .collect(),
        }
    }
}

/// A matrix of polynomials (k rows, l columns) in the NTT domain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolyMatrix {
    /// Rows of the matrix, where each row is a PolyVec.
    pub rows: Vec<PolyVec>,
}

impl PolyMatrix {
    /// Creates a zero matrix of dimensions k × l.
    pub fn zero(k: usize, l: usize) -> Self {
        PolyMatrix {
            rows: (0..k).map(|_| PolyVec::zero(l)).collect(),
        }
    }

    /// Number of rows (k).
    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns (l).
    pub fn ncols(&self) -> usize {
        self.rows.first().map_or(0, |r| r.len())
    }

    /// Matrix-vector product in the NTT domain.
    ///
    /// Every output coefficient is reduced to below 2q.
    pub fn mul_vec_hat(&self, v: &PolyVec) -> PolyVec {
        assert_eq!(
            self.ncols(),
            v.len(),
            "Matrix columns must match vector length"
        );

        PolyVec {
            polys: self
                .rows
                .iter()
                .map(|row| {
                    let mut p = row.dot_hat(v);
                    p.reduce_le2q();
                    p
                })
                .collect(),
        }
    }
}
