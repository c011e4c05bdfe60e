//! Bit packing for keys and signatures.
//!
//! All fixed-width formats store coefficients little-endian, least
//! significant bit first, with no padding between coefficients:
//! - t1: 9 bits, raw value
//! - t0: 14 bits, 2^13 - t0
//! - s1/s2: 3 or 4 bits, η - s
//! - z: 20 bits, γ1 - 1 - z
//! - w1: 4 bits, raw value
//!
//! The hint is a sparse list of indices followed by one cumulative count per
//! polynomial. The challenge is a 32-byte position mask followed by 64 sign
//! bits in position order.
//!
//! Packers take an output slice of exactly the encoded size and panic on any
//! other length. Decoders that read untrusted bytes validate them and return
//! `Err` for non-canonical input.

use crate::error::{DilithiumError, Result};
use crate::params::{
    Mode, D, GAMMA1, N, POLY_B60_SIZE, POLY_LE16_SIZE, POLY_LE_GAMMA1_SIZE, POLY_T0_SIZE,
    POLY_T1_SIZE, Q,
};
use crate::poly::Poly;
use crate::polyvec::PolyVec;

/// Writes the low `bits` bits of each value into `out`.
fn pack_bits(values: impl Iterator<Item = u32>, bits: usize, out: &mut [u8]) {
    let mask = (1u64 << bits) - 1;
    let mut acc = 0u64;
    let mut n = 0;
    let mut pos = 0;
    for v in values {
        acc |= (v as u64 & mask) << n;
        n += bits;
        while n >= 8 {
            out[pos] = acc as u8;
            acc >>= 8;
            n -= 8;
            pos += 1;
        }
    }
}

/// Reads N values of `bits` bits each.
fn unpack_bits(buf: &[u8], bits: usize) -> [u32; N] {
    let mask = (1u64 << bits) - 1;
    let mut out = [0u32; N];
    let mut acc = 0u64;
    let mut n = 0;
    let mut pos = 0;
    for c in out.iter_mut() {
        while n < bits {
            acc |= (buf[pos] as u64) << n;
            n += 8;
            pos += 1;
        }
        *c = (acc & mask) as u32;
        acc >>= bits;
        n -= bits;
    }
    out
}

/// Packs t1. Coefficients must be below 2^9.
pub fn pack_t1(p: &Poly, out: &mut [u8]) {
    assert_eq!(out.len(), POLY_T1_SIZE, "t1 buffer has the wrong size");
    pack_bits(p.coeffs.iter().copied(), 9, out);
}

/// Unpacks t1. Every 9-bit pattern is a valid coefficient.
pub fn unpack_t1(buf: &[u8]) -> Poly {
    assert_eq!(buf.len(), POLY_T1_SIZE, "t1 buffer has the wrong size");
    Poly::from_coeffs(unpack_bits(buf, 9))
}

/// Packs t0 given as t0 + q with -2^13 < t0 ≤ 2^13.
pub fn pack_t0(p: &Poly, out: &mut [u8]) {
    assert_eq!(out.len(), POLY_T0_SIZE, "t0 buffer has the wrong size");
    let offset = Q + (1 << (D - 1));
    pack_bits(p.coeffs.iter().map(|&c| offset.wrapping_sub(c)), D, out);
}

/// Unpacks t0, returning coefficients as t0 + q.
pub fn unpack_t0(buf: &[u8]) -> Poly {
    assert_eq!(buf.len(), POLY_T0_SIZE, "t0 buffer has the wrong size");
    let offset = Q + (1 << (D - 1));
    let mut p = Poly::from_coeffs(unpack_bits(buf, D));
    for c in p.coeffs.iter_mut() {
        *c = offset - *c;
    }
    p
}

/// Packs a secret polynomial with coefficients in [q - η, q + η].
pub fn pack_leq_eta(p: &Poly, mode: &Mode, out: &mut [u8]) {
    assert_eq!(
        out.len(),
        mode.poly_leq_eta_size(),
        "secret buffer has the wrong size"
    );
    let offset = Q + mode.eta;
    pack_bits(
        p.coeffs.iter().map(|&c| offset.wrapping_sub(c)),
        mode.double_eta_bits,
        out,
    );
}

/// Unpacks a secret polynomial into [q - η, q + η].
///
/// Rejects encodings holding a value above 2η.
pub fn unpack_leq_eta(buf: &[u8], mode: &Mode) -> Result<Poly> {
    assert_eq!(
        buf.len(),
        mode.poly_leq_eta_size(),
        "secret buffer has the wrong size"
    );
    let mut p = Poly::from_coeffs(unpack_bits(buf, mode.double_eta_bits));
    for c in p.coeffs.iter_mut() {
        if *c > 2 * mode.eta {
            return Err(DilithiumError::DecodingError {
                context: "secret coefficient out of range",
            });
        }
        *c = Q + mode.eta - *c;
    }
    Ok(p)
}

/// Packs z. Coefficients must be normalized with norm below γ1.
pub fn pack_le_gamma1(p: &Poly, out: &mut [u8]) {
    assert_eq!(out.len(), POLY_LE_GAMMA1_SIZE, "z buffer has the wrong size");
    pack_bits(
        p.coeffs.iter().map(|&c| {
            // γ1 - 1 - c, moved into [0, 2γ1 - 1) when c encodes a negative value
            let v = (GAMMA1 - 1).wrapping_sub(c);
            v.wrapping_add(((v as i32) >> 31) as u32 & Q)
        }),
        20,
        out,
    );
}

/// Unpacks z into normalized coefficients.
///
/// Any 20-bit pattern decodes; callers check the norm bound.
pub fn unpack_le_gamma1(buf: &[u8]) -> Poly {
    assert_eq!(buf.len(), POLY_LE_GAMMA1_SIZE, "z buffer has the wrong size");
    let mut p = Poly::from_coeffs(unpack_bits(buf, 20));
    for c in p.coeffs.iter_mut() {
        let v = (GAMMA1 - 1).wrapping_sub(*c);
        *c = v.wrapping_add(((v as i32) >> 31) as u32 & Q);
    }
    p
}

/// Packs w1, two coefficients below 16 per byte, low one first.
pub fn pack_le16(p: &Poly, out: &mut [u8]) {
    assert_eq!(out.len(), POLY_LE16_SIZE, "w1 buffer has the wrong size");
    for (b, pair) in out.iter_mut().zip(p.coeffs.chunks_exact(2)) {
        *b = (pair[0] | pair[1] << 4) as u8;
    }
}

/// Packs a challenge polynomial with coefficients in {0, 1, q - 1}.
pub fn pack_b60(c: &Poly, out: &mut [u8]) {
    assert_eq!(out.len(), POLY_B60_SIZE, "challenge buffer has the wrong size");
    out.fill(0);
    let mut signs = 0u64;
    let mut k = 0;
    for (i, &x) in c.coeffs.iter().enumerate() {
        if x != 0 {
            out[i / 8] |= 1 << (i % 8);
            if x == Q - 1 {
                signs |= 1 << k;
            }
            k += 1;
        }
    }
    out[N / 8..].copy_from_slice(&signs.to_le_bytes());
}

/// Unpacks a challenge polynomial.
///
/// Rejects a mask without exactly 60 positions and sign bits beyond the
/// last position.
pub fn unpack_b60(buf: &[u8]) -> Result<Poly> {
    assert_eq!(buf.len(), POLY_B60_SIZE, "challenge buffer has the wrong size");
    let weight: u32 = buf[..N / 8].iter().map(|b| b.count_ones()).sum();
    if weight != 60 {
        return Err(DilithiumError::DecodingError {
            context: "challenge weight",
        });
    }

    let mut sign_bytes = [0u8; 8];
    sign_bytes.copy_from_slice(&buf[N / 8..]);
    let mut signs = u64::from_le_bytes(sign_bytes);
    if signs >> 60 != 0 {
        return Err(DilithiumError::DecodingError {
            context: "challenge sign bits",
        });
    }

    let mut c = Poly::zero();
    for i in 0..N {
        if (buf[i / 8] >> (i % 8)) & 1 == 1 {
            c.coeffs[i] = if signs & 1 == 1 { Q - 1 } else { 1 };
            signs >>= 1;
        }
    }
    Ok(c)
}

/// Packs a hint vector with at most Ω ones into Ω + k bytes.
///
/// Bytes 0..Ω list the positions of the ones, polynomial after polynomial,
/// zero padded. Byte Ω + i is the number of positions in polynomials 0..=i.
pub fn pack_hint(h: &PolyVec, omega: usize, out: &mut [u8]) {
    assert_eq!(out.len(), omega + h.len(), "hint buffer has the wrong size");
    out.fill(0);
    let mut off = 0;
    for (i, p) in h.polys.iter().enumerate() {
        for (j, &bit) in p.coeffs.iter().enumerate() {
            if bit != 0 {
                assert!(off < omega, "hint has more than omega ones");
                out[off] = j as u8;
                off += 1;
            }
        }
        out[omega + i] = off as u8;
    }
}

/// Unpacks a hint vector of length `k`, accepting only the canonical
/// encoding produced by `pack_hint`.
pub fn unpack_hint(buf: &[u8], k: usize, omega: usize) -> Result<PolyVec> {
    assert_eq!(buf.len(), omega + k, "hint buffer has the wrong size");
    let mut h = PolyVec::zero(k);
    let mut prev = 0;
    for (i, p) in h.polys.iter_mut().enumerate() {
        let sop = buf[omega + i] as usize;
        if sop < prev || sop > omega {
            return Err(DilithiumError::InvalidHint);
        }
        for j in prev..sop {
            // positions within one polynomial must strictly increase
            if j > prev && buf[j] <= buf[j - 1] {
                return Err(DilithiumError::InvalidHint);
            }
            p.coeffs[buf[j] as usize] = 1;
        }
        prev = sop;
    }
    if buf[prev..omega].iter().any(|&b| b != 0) {
        return Err(DilithiumError::InvalidHint);
    }
    Ok(h)
}

/// Packs each polynomial of `v` with `pack` into consecutive `size`-byte
/// chunks of `out`.
pub fn pack_vec(v: &PolyVec, size: usize, out: &mut [u8], pack: impl Fn(&Poly, &mut [u8])) {
    assert_eq!(out.len(), v.len() * size, "vector buffer has the wrong size");
    for (p, chunk) in v.polys.iter().zip(out.chunks_exact_mut(size)) {
        pack(p, chunk);
    }
}
