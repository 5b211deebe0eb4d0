//! Goldilocks field arithmetic over u64
//!
//! Host-side arithmetic for witness hints, constant folding and reference checks.
//! Nothing in this module emits constraints.

use crate::Fr;
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;

/// Goldilocks modulus: p = 2^64 - 2^32 + 1
pub const P: u64 = 0xFFFF_FFFF_0000_0001;
pub const P_U128: u128 = P as u128;

/// Non-residue of the quadratic extension: X^2 = W.
pub const W: u64 = 7;

pub const MULTIPLICATIVE_GROUP_GENERATOR: u64 = 7;
pub const POWER_OF_TWO_GENERATOR: u64 = 1_753_635_133_440_165_772;
pub const TWO_ADICITY: usize = 32;

/// Element of GF(p^2) as `[c0, c1]` meaning `c0 + c1·X`.
pub type Ext = [u64; 2];

#[inline]
pub fn add(a: u64, b: u64) -> u64 {
    let s = a as u128 + b as u128;
    (s % P_U128) as u64
}

#[inline]
pub fn sub(a: u64, b: u64) -> u64 {
    let (a, b) = (a % P, b % P);
    if a >= b {
        a - b
    } else {
        (a as u128 + P_U128 - b as u128) as u64
    }
}

#[inline]
pub fn neg(a: u64) -> u64 {
    sub(0, a)
}

#[inline]
pub fn mul(a: u64, b: u64) -> u64 {
    ((a as u128) * (b as u128) % P_U128) as u64
}

#[inline]
pub fn square(a: u64) -> u64 {
    mul(a, a)
}

pub fn exp(mut base: u64, mut e: u64) -> u64 {
    let mut result = 1u64;
    while e > 0 {
        if e & 1 == 1 {
            result = mul(result, base);
        }
        base = square(base);
        e >>= 1;
    }
    result
}

pub fn exp_power_of_2(mut base: u64, k: usize) -> u64 {
    for _ in 0..k {
        base = square(base);
    }
    base
}

/// a^{-1} mod p via extended Euclid. Zero maps to zero; callers constrain `a·a^{-1} = 1`.
pub fn inv(a: u64) -> u64 {
    let a = a % P;
    if a == 0 {
        return 0;
    }
    let mut t: i128 = 0;
    let mut new_t: i128 = 1;
    let mut r: i128 = P as i128;
    let mut new_r: i128 = a as i128;
    while new_r != 0 {
        let q = r / new_r;
        (t, new_t) = (new_t, t - q * new_t);
        (r, new_r) = (new_r, r - q * new_r);
    }
    if t < 0 {
        t += P as i128;
    }
    t as u64
}

/// Generator of the multiplicative subgroup of order `2^bits`.
pub fn primitive_root_of_unity(bits: usize) -> u64 {
    assert!(bits <= TWO_ADICITY, "no subgroup of order 2^{bits} in Goldilocks");
    exp_power_of_2(POWER_OF_TWO_GENERATOR, TWO_ADICITY - bits)
}

/// `[g^0, g^1, ..., g^{n-1}]` for the subgroup of order `2^bits`.
pub fn two_adic_subgroup(bits: usize) -> Vec<u64> {
    let g = primitive_root_of_unity(bits);
    let mut out = Vec::with_capacity(1 << bits);
    let mut cur = 1u64;
    for _ in 0..(1usize << bits) {
        out.push(cur);
        cur = mul(cur, g);
    }
    out
}

#[inline]
pub fn reverse_bits(n: usize, num_bits: usize) -> usize {
    if num_bits == 0 {
        return 0;
    }
    n.reverse_bits() >> (usize::BITS as usize - num_bits)
}

#[inline]
pub fn ext_from_base(a: u64) -> Ext {
    [a % P, 0]
}

#[inline]
pub fn ext_add(a: Ext, b: Ext) -> Ext {
    [add(a[0], b[0]), add(a[1], b[1])]
}

#[inline]
pub fn ext_sub(a: Ext, b: Ext) -> Ext {
    [sub(a[0], b[0]), sub(a[1], b[1])]
}

#[inline]
pub fn ext_mul(a: Ext, b: Ext) -> Ext {
    let c0 = add(mul(a[0], b[0]), mul(W, mul(a[1], b[1])));
    let c1 = add(mul(a[0], b[1]), mul(a[1], b[0]));
    [c0, c1]
}

#[inline]
pub fn ext_scalar_mul(a: Ext, s: u64) -> Ext {
    [mul(a[0], s), mul(a[1], s)]
}

pub fn ext_exp(mut base: Ext, mut e: u64) -> Ext {
    let mut result = [1, 0];
    while e > 0 {
        if e & 1 == 1 {
            result = ext_mul(result, base);
        }
        base = ext_mul(base, base);
        e >>= 1;
    }
    result
}

/// (a0 + a1·X)^{-1} = (a0 - a1·X) / (a0^2 - W·a1^2). Zero maps to zero.
pub fn ext_inv(a: Ext) -> Ext {
    let norm = sub(square(a[0]), mul(W, square(a[1])));
    let norm_inv = inv(norm);
    [mul(a[0], norm_inv), mul(neg(a[1]), norm_inv)]
}

pub fn fr_to_biguint(x: Fr) -> BigUint {
    BigUint::from_bytes_le(&x.into_bigint().to_bytes_le())
}

pub fn fr_from_biguint(n: &BigUint) -> Fr {
    Fr::from_le_bytes_mod_order(&n.to_bytes_le())
}

/// Canonical Goldilocks value of an outer-field element (integer value mod p).
pub fn fr_to_gl(x: Fr) -> u64 {
    let v = fr_to_biguint(x) % BigUint::from(P);
    v.to_u64_digits().first().copied().unwrap_or(0)
}

#[inline]
pub fn gl_to_fr(x: u64) -> Fr {
    Fr::from(x % P)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::Zero;
    use plonky2::field::goldilocks_field::GoldilocksField as GF;
    use plonky2::field::types::{Field, PrimeField64};

    #[test]
    fn test_p_nonzero_in_outer_field() {
        assert!(!Fr::from(P).is_zero());
    }

    #[test]
    fn test_basic_ops_match_plonky2() {
        let samples = [0u64, 1, 2, P - 1, P - 2, 1 << 32, 0xdead_beef_1234_5678 % P];
        for &a in &samples {
            for &b in &samples {
                let (fa, fb) = (GF::from_canonical_u64(a), GF::from_canonical_u64(b));
                assert_eq!(add(a, b), (fa + fb).to_canonical_u64());
                assert_eq!(sub(a, b), (fa - fb).to_canonical_u64());
                assert_eq!(mul(a, b), (fa * fb).to_canonical_u64());
            }
            if a != 0 {
                assert_eq!(mul(a, inv(a)), 1);
            }
        }
    }

    #[test]
    fn test_roots_of_unity() {
        for bits in [0usize, 1, 3, 5, 12] {
            let g = primitive_root_of_unity(bits);
            assert_eq!(g, GF::primitive_root_of_unity(bits).to_canonical_u64());
            assert_eq!(exp_power_of_2(g, bits), 1);
        }
        assert_eq!(two_adic_subgroup(2).len(), 4);
    }

    #[test]
    fn test_reverse_bits() {
        assert_eq!(reverse_bits(0b001, 3), 0b100);
        assert_eq!(reverse_bits(0b110, 3), 0b011);
        assert_eq!(reverse_bits(5, 0), 0);
    }

    #[test]
    fn test_ext_inverse() {
        let a = [P - 1, 12345];
        assert_eq!(ext_mul(a, ext_inv(a)), [1, 0]);
    }

    #[test]
    fn test_fr_to_gl_reduces() {
        let x = Fr::from(P_U128 * 3 + 17);
        assert_eq!(fr_to_gl(x), 17);
    }
}
