//! Deterministic expansion of seeds into polynomials.
//!
//! Every derivation reads one continuous XOF stream and rejects
//! out-of-range candidates:
//! - `derive_uniform`: coefficients uniform in [0, q), used for A
//! - `derive_uniform_leq_eta`: secrets s1, s2 in [-η, η]
//! - `derive_uniform_le_gamma1`: the mask y in (-γ1, γ1)
//! - `derive_uniform_b60`: the challenge c with sixty ±1 coefficients
//!
//! Under AES modes the seeded streams are AES-256-CTR keystreams instead of
//! SHAKE. The challenge and the key hashes always use SHAKE.

use crate::packing::pack_le16;
use crate::params::{Mode, CRH_SIZE, GAMMA1, N, POLY_LE16_SIZE, Q, SEED_SIZE};
use crate::poly::Poly;
use crate::polyvec::{PolyMatrix, PolyVec};
use aes::cipher::{KeyIvInit, StreamCipher};
use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Shake128, Shake128Reader, Shake256, Shake256Reader,
};

type Aes256Ctr = ctr::Ctr32BE<aes::Aes256>;

/// SHAKE128 rate in bytes; a multiple of 3.
const SHAKE128_RATE: usize = 168;

/// SHAKE256 rate in bytes.
const SHAKE256_RATE: usize = 136;

/// Bytes read per batch by the γ1 sampler; a multiple of 5.
const LE_GAMMA1_BATCH: usize = 5 * SHAKE256_RATE;

/// A seeded byte stream.
///
/// Reads continue where the previous one stopped, so the batch size used by
/// a sampler never changes what it produces.
pub enum XofStream {
    /// SHAKE128(seed ‖ nonce)
    Shake128(Shake128Reader),
    /// SHAKE256(seed ‖ nonce)
    Shake256(Shake256Reader),
    /// AES-256-CTR keystream with the nonce in the counter block
    Aes(Box<Aes256Ctr>),
}

impl XofStream {
    /// Stream over a 32-byte seed: SHAKE128, or AES-256-CTR under AES modes.
    pub fn stream128(seed: &[u8; SEED_SIZE], nonce: u16, use_aes: bool) -> Self {
        if use_aes {
            return Self::aes(seed, nonce);
        }
        let mut h = Shake128::default();
        h.update(seed);
        h.update(&nonce.to_le_bytes());
        XofStream::Shake128(h.finalize_xof())
    }

    /// Stream over a 48-byte seed: SHAKE256, or AES-256-CTR keyed with the
    /// first 32 seed bytes under AES modes.
    pub fn stream256(seed: &[u8; CRH_SIZE], nonce: u16, use_aes: bool) -> Self {
        if use_aes {
            let mut key = [0u8; SEED_SIZE];
            key.copy_from_slice(&seed[..SEED_SIZE]);
            return Self::aes(&key, nonce);
        }
        let mut h = Shake256::default();
        h.update(seed);
        h.update(&nonce.to_le_bytes());
        XofStream::Shake256(h.finalize_xof())
    }

    fn aes(key: &[u8; SEED_SIZE], nonce: u16) -> Self {
        // nonce_le16 ‖ 10 zero bytes ‖ 32-bit big-endian block counter
        let mut iv = [0u8; 16];
        iv[..2].copy_from_slice(&nonce.to_le_bytes());
        XofStream::Aes(Box::new(Aes256Ctr::new(&(*key).into(), &iv.into())))
    }

    /// Fills `buf` with the next bytes of the stream.
    pub fn read(&mut self, buf: &mut [u8]) {
        match self {
            XofStream::Shake128(r) => r.read(buf),
            XofStream::Shake256(r) => r.read(buf),
            XofStream::Aes(c) => {
                buf.fill(0);
                c.apply_keystream(buf);
            }
        }
    }
}

/// Samples a polynomial with coefficients uniform in [0, q).
pub fn derive_uniform(seed: &[u8; SEED_SIZE], nonce: u16, use_aes: bool) -> Poly {
    let mut stream = XofStream::stream128(seed, nonce, use_aes);
    let mut buf = [0u8; SHAKE128_RATE];
    let mut p = Poly::zero();
    let mut i = 0;

    while i < N {
        stream.read(&mut buf);
        for chunk in buf.chunks_exact(3) {
            if i == N {
                break;
            }
            let t = (chunk[0] as u32 | (chunk[1] as u32) << 8 | (chunk[2] as u32) << 16) & 0x7F_FFFF;
            if t < Q {
                p.coeffs[i] = t;
                i += 1;
            }
        }
    }
    p
}

/// Samples a polynomial with coefficients in [q - η, q + η].
///
/// Each byte gives two candidates: bits 0-2 and 5-7 when η ≤ 3, otherwise
/// the two nibbles. A candidate t ≤ 2η becomes q + η - t.
pub fn derive_uniform_leq_eta(seed: &[u8; SEED_SIZE], nonce: u16, mode: &Mode) -> Poly {
    let mut stream = XofStream::stream128(seed, nonce, mode.use_aes);
    let mut buf = [0u8; SHAKE128_RATE];
    let mut p = Poly::zero();
    let eta = mode.eta;
    let mut i = 0;

    while i < N {
        stream.read(&mut buf);
        for &b in buf.iter() {
            let (t1, t2) = if eta <= 3 {
                ((b & 7) as u32, (b >> 5) as u32)
            } else {
                ((b & 15) as u32, (b >> 4) as u32)
            };
            for t in [t1, t2] {
                if t <= 2 * eta && i < N {
                    p.coeffs[i] = Q + eta - t;
                    i += 1;
                }
            }
            if i == N {
                break;
            }
        }
    }
    p
}

/// Samples the masking polynomial: coefficients in [q - γ1 + 1, q + γ1 - 1].
///
/// Each 5 bytes give two 20-bit candidates; t ≤ 2γ1 - 2 becomes
/// q + γ1 - 1 - t.
pub fn derive_uniform_le_gamma1(seed: &[u8; CRH_SIZE], nonce: u16, use_aes: bool) -> Poly {
    let mut stream = XofStream::stream256(seed, nonce, use_aes);
    let mut buf = [0u8; LE_GAMMA1_BATCH];
    let mut p = Poly::zero();
    let mut i = 0;

    while i < N {
        stream.read(&mut buf);
        for b in buf.chunks_exact(5) {
            let t1 = (b[0] as u32 | (b[1] as u32) << 8 | (b[2] as u32) << 16) & 0xF_FFFF;
            let t2 = (b[2] as u32) >> 4 | (b[3] as u32) << 4 | (b[4] as u32) << 12;
            for t in [t1, t2] {
                if t <= 2 * GAMMA1 - 2 && i < N {
                    p.coeffs[i] = Q + GAMMA1 - 1 - t;
                    i += 1;
                }
            }
            if i == N {
                break;
            }
        }
    }
    p
}

/// Derives the challenge from μ and the high bits w1.
///
/// The result has exactly sixty coefficients equal to 1 or q - 1, placed by
/// an inside-out Fisher-Yates shuffle over SHAKE256(μ ‖ pack_le16(w1)).
pub fn derive_uniform_b60(mu: &[u8; CRH_SIZE], w1: &PolyVec) -> Poly {
    let mut h = Shake256::default();
    h.update(mu);
    let mut packed = [0u8; POLY_LE16_SIZE];
    for p in &w1.polys {
        pack_le16(p, &mut packed);
        h.update(&packed);
    }
    let mut stream = XofStream::Shake256(h.finalize_xof());

    let mut buf = [0u8; SHAKE256_RATE];
    stream.read(&mut buf);
    let mut signs = u64::from_le_bytes([
        buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
    ]);
    let mut pos = 8;

    let mut c = Poly::zero();
    for i in (N - 60)..N {
        let b = loop {
            if pos == SHAKE256_RATE {
                stream.read(&mut buf);
                pos = 0;
            }
            let b = buf[pos] as usize;
            pos += 1;
            if b <= i {
                break b;
            }
        };
        c.coeffs[i] = c.coeffs[b];
        c.coeffs[b] = if signs & 1 == 0 { 1 } else { Q - 1 };
        signs >>= 1;
    }
    c
}

/// Expands ρ into the matrix Â.
///
/// Entry (i, j) uses nonce (i << 8) + j. The samples are used as NTT-domain
/// values directly.
pub fn derive_matrix(rho: &[u8; SEED_SIZE], mode: &Mode) -> PolyMatrix {
    let mut a = PolyMatrix::zero(mode.k, mode.l);
    for (i, row) in a.rows.iter_mut().enumerate() {
        for (j, p) in row.polys.iter_mut().enumerate() {
            *p = derive_uniform(rho, ((i as u16) << 8) + j as u16, mode.use_aes);
        }
    }
    a
}

/// Derives s1 (nonces 0..l) and s2 (nonces l..l+k) from the secret seed.
pub fn derive_secrets(s_seed: &[u8; SEED_SIZE], mode: &Mode) -> (PolyVec, PolyVec) {
    let s1 = (0..mode.l)
        .map(|i| derive_uniform_leq_eta(s_seed, i as u16, mode))
        .collect();
    let s2 = (0..mode.k)
        .map(|i| derive_uniform_leq_eta(s_seed, (mode.l + i) as u16, mode))
        .collect();
    (PolyVec::from_polys(s1), PolyVec::from_polys(s2))
}

/// Expands a key-generation seed into (ρ, secret seed, key) with SHAKE128.
pub fn expand_seed(seed: &[u8; SEED_SIZE]) -> [u8; 3 * SEED_SIZE] {
    let mut h = Shake128::default();
    h.update(seed);
    let mut out = [0u8; 3 * SEED_SIZE];
    h.finalize_xof().read(&mut out);
    out
}

/// Collision-resistant hash: 48 bytes of SHAKE256 over the concatenated parts.
pub fn crh(parts: &[&[u8]]) -> [u8; CRH_SIZE] {
    let mut h = Shake256::default();
    for part in parts {
        h.update(part);
    }
    let mut out = [0u8; CRH_SIZE];
    h.finalize_xof().read(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{DILITHIUM2, DILITHIUM2_AES, DILITHIUM4, DILITHIUM4_AES};

    fn seed32() -> [u8; SEED_SIZE] {
        let mut s = [0u8; SEED_SIZE];
        for (i, b) in s.iter_mut().enumerate() {
            *b = i as u8;
        }
        s
    }

    #[test]
    fn test_stream_is_continuous() {
        for use_aes in [false, true] {
            let mut a = XofStream::stream128(&seed32(), 7, use_aes);
            let mut b = XofStream::stream128(&seed32(), 7, use_aes);
            let mut whole = [0u8; 300];
            a.read(&mut whole);
            let mut parts = [0u8; 300];
            let (x, rest) = parts.split_at_mut(5);
            let (y, z) = rest.split_at_mut(170);
            b.read(x);
            b.read(y);
            b.read(z);
            assert_eq!(whole, parts);
        }
    }

    #[test]
    fn test_nonce_separates_streams() {
        let mut a = XofStream::stream128(&seed32(), 1, false);
        let mut b = XofStream::stream128(&seed32(), 256, false);
        let (mut x, mut y) = ([0u8; 32], [0u8; 32]);
        a.read(&mut x);
        b.read(&mut y);
        assert_ne!(x, y);
    }

    #[test]
    fn test_uniform_range_and_determinism() {
        for use_aes in [false, true] {
            let p = derive_uniform(&seed32(), 513, use_aes);
            assert!(p.is_normalized());
            assert_eq!(p, derive_uniform(&seed32(), 513, use_aes));
        }
        assert_ne!(
            derive_uniform(&seed32(), 0, false),
            derive_uniform(&seed32(), 0, true)
        );
    }

    #[test]
    fn test_leq_eta_range() {
        for mode in [DILITHIUM2, DILITHIUM2_AES, DILITHIUM4, DILITHIUM4_AES] {
            let p = derive_uniform_leq_eta(&seed32(), 3, &mode);
            for &c in p.coeffs.iter() {
                assert!(c >= Q - mode.eta && c <= Q + mode.eta, "{}", mode.name);
            }
        }
    }

    #[test]
    fn test_le_gamma1_range() {
        let mut seed = [0u8; CRH_SIZE];
        seed[47] = 9;
        for use_aes in [false, true] {
            let p = derive_uniform_le_gamma1(&seed, 12, use_aes);
            for &c in p.coeffs.iter() {
                assert!(c > Q - GAMMA1 && c < Q + GAMMA1);
            }
        }
    }

    #[test]
    fn test_b60_weight() {
        let mu = [0x5Au8; CRH_SIZE];
        let w1 = PolyVec::zero(4);
        let c = derive_uniform_b60(&mu, &w1);
        assert_eq!(c.weight(), 60);
        assert!(c.coeffs.iter().all(|&x| x == 0 || x == 1 || x == Q - 1));
        assert_eq!(c, derive_uniform_b60(&mu, &w1));

        let mut w1b = w1.clone();
        w1b.polys[3].coeffs[255] = 1;
        assert_ne!(c, derive_uniform_b60(&mu, &w1b));
    }

    #[test]
    fn test_matrix_shape() {
        let a = derive_matrix(&seed32(), &DILITHIUM4);
        assert_eq!(a.nrows(), 6);
        assert_eq!(a.ncols(), 5);
        assert_eq!(a.rows[2].polys[3], derive_uniform(&seed32(), (2 << 8) + 3, false));
    }

    #[test]
    fn test_secret_nonces() {
        let mode = DILITHIUM2;
        let (s1, s2) = derive_secrets(&seed32(), &mode);
        assert_eq!(s1.len(), mode.l);
        assert_eq!(s2.len(), mode.k);
        assert_eq!(s2.polys[0], derive_uniform_leq_eta(&seed32(), mode.l as u16, &mode));
    }

    #[test]
    fn test_crh_concatenates() {
        assert_eq!(crh(&[b"ab", b"cd"]), crh(&[b"abcd"]));
        assert_ne!(crh(&[b"abcd"]), crh(&[b"abce"]));
    }
}
