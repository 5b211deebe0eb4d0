//! Bit decomposition and canonical range checks
//!
//! `alloc_canonical` is the only way a non-constant Goldilocks value enters the circuit:
//! 64 witnessed bits, recomposed linearly, plus the check `x < p`.
//!
//! With p = 2^64 - 2^32 + 1, a 64-bit x is non-canonical exactly when its high
//! 32 bits are all ones and its low 32 bits are not all zero.

use crate::goldilocks::native::P;
use crate::Fr;
use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::{boolean::Boolean, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

/// Σ bits[i]·2^i. Linear, no constraints.
pub fn bits_to_fp(bits: &[Boolean<Fr>]) -> FpVar<Fr> {
    let mut acc = FpVar::zero();
    let mut coeff = Fr::from(1u64);
    for b in bits {
        acc += FpVar::from(b.clone()) * coeff;
        coeff += coeff;
    }
    acc
}

/// Witness the low `n` bits of `v` (LSB first) and enforce they recompose to `v`.
///
/// Unsatisfiable when `v >= 2^n` as an integer. A constant that does not fit is
/// rejected with `SynthesisError::Unsatisfiable` before any bit is emitted.
pub fn decompose(v: &FpVar<Fr>, n: usize) -> Result<Vec<Boolean<Fr>>, SynthesisError> {
    if let FpVar::Constant(c) = v {
        let le = c.into_bigint().to_bits_le();
        if le.iter().skip(n).any(|&b| b) {
            tracing::debug!(n, "constant does not fit in the requested bit width");
            return Err(SynthesisError::Unsatisfiable);
        }
        return Ok((0..n)
            .map(|i| Boolean::constant(le.get(i).copied().unwrap_or(false)))
            .collect());
    }
    let cs = v.cs();
    let le = v.value().ok().map(|x| x.into_bigint().to_bits_le());
    let bits = (0..n)
        .map(|i| {
            Boolean::new_witness(cs.clone(), || {
                le.as_ref()
                    .map(|b| b.get(i).copied().unwrap_or(false))
                    .ok_or(SynthesisError::AssignmentMissing)
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    bits_to_fp(&bits).enforce_equal(v)?;
    Ok(bits)
}

/// Enforce that 64 little-endian bits encode a value below p.
pub fn enforce_bits_lt_p(bits: &[Boolean<Fr>]) -> Result<(), SynthesisError> {
    assert_eq!(bits.len(), 64);
    let hi_all_ones = Boolean::kary_and(&bits[32..])?;
    let lo_any = Boolean::kary_or(&bits[..32])?;
    (&hi_all_ones & &lo_any).enforce_equal(&Boolean::constant(false))
}

/// Allocate a canonical Goldilocks witness. Returns the packed value and its bits.
pub fn alloc_canonical(
    cs: ConstraintSystemRef<Fr>,
    value: Option<u64>,
) -> Result<(FpVar<Fr>, Vec<Boolean<Fr>>), SynthesisError> {
    let bits = (0..64)
        .map(|i| {
            Boolean::new_witness(cs.clone(), || {
                value
                    .map(|v| ((v % P) >> i) & 1 == 1)
                    .ok_or(SynthesisError::AssignmentMissing)
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    enforce_bits_lt_p(&bits)?;
    Ok((bits_to_fp(&bits), bits))
}

/// Enforce that an existing variable already holds a canonical Goldilocks value.
pub fn enforce_canonical(v: &FpVar<Fr>) -> Result<Vec<Boolean<Fr>>, SynthesisError> {
    if let FpVar::Constant(c) = v {
        if c.into_bigint() >= Fr::from(P).into_bigint() {
            tracing::debug!("constant is not a canonical Goldilocks value");
            return Err(SynthesisError::Unsatisfiable);
        }
        return decompose(v, 64);
    }
    let bits = decompose(v, 64)?;
    enforce_bits_lt_p(&bits)?;
    Ok(bits)
}
