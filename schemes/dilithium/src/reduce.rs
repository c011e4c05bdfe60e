//! Modular reduction for q = 8380417 on unsigned machine words.
//!
//! Every function here is branch-free on its input. Intermediate results are
//! allowed to stay in [0, 2q) and are only brought to [0, q) when a caller
//! needs the canonical residue.
//!
//! Montgomery reduction uses R = 2^32; values in the "Montgomery domain" are
//! stored as a·R mod q.

use crate::params::Q;

/// -q^(-1) mod 2^32
pub const Q_INV_NEG: u64 = 4236238847;

/// R mod q = 2^32 mod q
pub const R_MOD_Q: u32 = 4193792;

/// 2^64 / 256 mod q, the scaling applied at the end of the inverse NTT.
pub const R_OVER_256: u64 = 41978;

/// Returns y ≡ x (mod q) with y < 2q.
///
/// Uses 2^23 ≡ 2^13 - 1 (mod q). Not idempotent.
#[inline]
pub fn reduce_le2q(x: u32) -> u32 {
    let x1 = x >> 23;
    let x2 = x & 0x7FFFFF;
    // x2 + x1 * (2^13 - 1); cannot overflow since x1 < 2^9.
    x2.wrapping_add(x1 << 13).wrapping_sub(x1)
}

/// For x < 2q returns x mod q.
#[inline]
pub fn le2q_mod_q(x: u32) -> u32 {
    let r = x.wrapping_sub(Q);
    let mask = ((r as i32) >> 31) as u32;
    r.wrapping_add(mask & Q)
}

/// Returns the canonical residue of x in [0, q).
#[inline]
pub fn mod_q(x: u32) -> u32 {
    le2q_mod_q(reduce_le2q(x))
}

/// Montgomery reduction: for x ≤ q·2^32 returns y ≤ 2q with y ≡ x·2^(-32) (mod q).
#[inline]
pub fn mont_reduce_le2q(x: u64) -> u32 {
    let m = x.wrapping_mul(Q_INV_NEG) & 0xFFFF_FFFF;
    ((x + m * Q as u64) >> 32) as u32
}
