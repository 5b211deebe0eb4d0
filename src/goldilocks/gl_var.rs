//! Goldilocks arithmetic inside BN254 with deferred reduction
//!
//! A `GlVar` always holds a canonical value in `[0, p)`. Arithmetic happens on `GlAcc`,
//! an unreduced outer-field integer paired with an upper bound on its bit length.
//! Additions, subtractions and products of accumulators are linear or single
//! multiplications in R1CS; only `GlAcc::reduce` pays for a range check:
//!
//! ```text
//! value = q·p + r,   q < 2^(bits-63),   r < p
//! ```
//!
//! Because every accumulator stays below 2^250 the relation holds over the integers,
//! so it pins `r` to `value mod p` exactly.

use crate::goldilocks::native::{self, P};
use crate::goldilocks::range;
use crate::Fr;
use ark_r1cs_std::{
    alloc::{AllocVar, AllocationMode},
    boolean::Boolean,
    fields::fp::FpVar,
    prelude::*,
};
use ark_relations::r1cs::{ConstraintSystemRef, Namespace, SynthesisError};
use core::borrow::Borrow;
use num_bigint::BigUint;

/// Accumulators must stay well below the 254-bit outer modulus.
pub const MAX_ACC_BITS: usize = 250;

fn bit_len(c: u64) -> usize {
    (u64::BITS - c.leading_zeros()) as usize
}

fn p_fr() -> Fr {
    Fr::from(P)
}

#[derive(Clone, Debug)]
pub struct GlVar(pub(crate) FpVar<Fr>);

/// Unreduced Goldilocks accumulator: `value < 2^bits` as an integer.
#[derive(Clone, Debug)]
pub struct GlAcc {
    value: FpVar<Fr>,
    bits: usize,
}

impl GlAcc {
    fn checked(value: FpVar<Fr>, bits: usize) -> Self {
        assert!(
            bits <= MAX_ACC_BITS,
            "Goldilocks accumulator overflow: {bits} bits"
        );
        GlAcc { value, bits }
    }

    pub fn zero() -> Self {
        GlAcc {
            value: FpVar::zero(),
            bits: 0,
        }
    }

    pub fn constant(c: u64) -> Self {
        let c = c % P;
        GlAcc {
            value: FpVar::constant(Fr::from(c)),
            bits: bit_len(c),
        }
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    pub fn add(&self, other: &GlAcc) -> GlAcc {
        Self::checked(&self.value + &other.value, self.bits.max(other.bits) + 1)
    }

    /// `self - other + p·2^k` with k chosen so the result stays non-negative.
    pub fn sub(&self, other: &GlAcc) -> GlAcc {
        let shift = other.bits.saturating_sub(63);
        let offset = native::fr_from_biguint(&(BigUint::from(P) << shift));
        let bits = self.bits.max(other.bits.max(63) + 1) + 1;
        Self::checked(&self.value - &other.value + offset, bits)
    }

    pub fn mul(&self, other: &GlAcc) -> GlAcc {
        Self::checked(&self.value * &other.value, self.bits + other.bits)
    }

    pub fn mul_const(&self, c: u64) -> GlAcc {
        let c = c % P;
        if c == 0 {
            return GlAcc::zero();
        }
        Self::checked(&self.value * Fr::from(c), self.bits + bit_len(c))
    }

    pub fn add_const(&self, c: u64) -> GlAcc {
        self.add(&GlAcc::constant(c))
    }

    /// Scale by a Boolean. The bound is unchanged.
    pub fn mul_bool(&self, b: &Boolean<Fr>) -> Result<GlAcc, SynthesisError> {
        Ok(GlAcc {
            value: &self.value * &FpVar::from(b.clone()),
            bits: self.bits,
        })
    }

    /// Canonical representative of the accumulator.
    pub fn reduce(&self) -> Result<GlVar, SynthesisError> {
        if let FpVar::Constant(c) = &self.value {
            return Ok(GlVar::constant(native::fr_to_gl(*c)));
        }
        if self.bits <= 63 {
            return Ok(GlVar(self.value.clone()));
        }
        let cs = self.value.cs();
        let q_bits = self.bits - 63;
        let hint = self.value.value().ok().map(|v| {
            let n = native::fr_to_biguint(v);
            let p = BigUint::from(P);
            let r = (&n % &p).to_u64_digits().first().copied().unwrap_or(0);
            (n / p, r)
        });

        let q = (0..q_bits)
            .map(|i| {
                Boolean::new_witness(cs.clone(), || {
                    hint.as_ref()
                        .map(|(q, _)| q.bit(i as u64))
                        .ok_or(SynthesisError::AssignmentMissing)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let q = range::bits_to_fp(&q);
        let (r, _) = range::alloc_canonical(cs, hint.map(|(_, r)| r))?;

        (q * p_fr() + &r).enforce_equal(&self.value)?;
        Ok(GlVar(r))
    }
}

impl GlVar {
    pub fn zero() -> Self {
        GlVar(FpVar::zero())
    }

    pub fn one() -> Self {
        GlVar(FpVar::one())
    }

    pub fn constant(c: u64) -> Self {
        GlVar(FpVar::constant(Fr::from(c % P)))
    }

    /// `1` when `b` is set, `0` otherwise.
    pub fn from_boolean(b: &Boolean<Fr>) -> Self {
        GlVar(FpVar::from(b.clone()))
    }

    pub fn fp(&self) -> &FpVar<Fr> {
        &self.0
    }

    pub fn acc(&self) -> GlAcc {
        let bits = match &self.0 {
            FpVar::Constant(c) => bit_len(native::fr_to_gl(*c)),
            _ => 64,
        };
        GlAcc {
            value: self.0.clone(),
            bits,
        }
    }

    pub fn is_constant(&self) -> bool {
        self.0.is_constant()
    }

    pub fn cs(&self) -> ConstraintSystemRef<Fr> {
        self.0.cs()
    }

    pub fn value(&self) -> Result<u64, SynthesisError> {
        Ok(native::fr_to_gl(self.0.value()?))
    }

    pub fn add(&self, other: &GlVar) -> Result<GlVar, SynthesisError> {
        self.acc().add(&other.acc()).reduce()
    }

    pub fn sub(&self, other: &GlVar) -> Result<GlVar, SynthesisError> {
        self.acc().sub(&other.acc()).reduce()
    }

    pub fn neg(&self) -> Result<GlVar, SynthesisError> {
        GlAcc::zero().sub(&self.acc()).reduce()
    }

    pub fn mul(&self, other: &GlVar) -> Result<GlVar, SynthesisError> {
        self.acc().mul(&other.acc()).reduce()
    }

    pub fn square(&self) -> Result<GlVar, SynthesisError> {
        self.mul(self)
    }

    pub fn add_const(&self, c: u64) -> Result<GlVar, SynthesisError> {
        self.acc().add_const(c).reduce()
    }

    pub fn mul_const(&self, c: u64) -> Result<GlVar, SynthesisError> {
        self.acc().mul_const(c).reduce()
    }

    /// Witness `self^{-1}` and enforce `self · inv = 1`. Unsatisfiable for zero.
    pub fn inverse(&self) -> Result<GlVar, SynthesisError> {
        if self.is_constant() {
            return Ok(GlVar::constant(native::inv(self.value()?)));
        }
        let hint = self.value().ok().map(native::inv);
        let inv = GlVar::new_witness(self.cs(), || hint.ok_or(SynthesisError::AssignmentMissing))?;
        self.mul(&inv)?.enforce_equal(&GlVar::one())?;
        Ok(inv)
    }

    /// Witness `self / other` and enforce `other · q = self`.
    pub fn div(&self, other: &GlVar) -> Result<GlVar, SynthesisError> {
        if self.is_constant() && other.is_constant() {
            let q = native::mul(self.value()?, native::inv(other.value()?));
            return Ok(GlVar::constant(q));
        }
        let cs = self.cs().or(other.cs());
        let hint = match (self.value(), other.value()) {
            (Ok(a), Ok(b)) => Some(native::mul(a, native::inv(b))),
            _ => None,
        };
        let q = GlVar::new_witness(cs, || hint.ok_or(SynthesisError::AssignmentMissing))?;
        other.mul(&q)?.enforce_equal(self)?;
        Ok(q)
    }

    pub fn exp_power_of_2(&self, k: usize) -> Result<GlVar, SynthesisError> {
        let mut cur = self.clone();
        for _ in 0..k {
            cur = cur.square()?;
        }
        Ok(cur)
    }

    pub fn exp_u64(&self, e: u64) -> Result<GlVar, SynthesisError> {
        let mut result = GlVar::one();
        let mut base = self.clone();
        let mut e = e;
        while e > 0 {
            if e & 1 == 1 {
                result = result.mul(&base)?;
            }
            e >>= 1;
            if e > 0 {
                base = base.square()?;
            }
        }
        Ok(result)
    }

    /// `base^{Σ bits[i]·2^i}` for a constant base.
    pub fn exp_from_bits_const_base(
        base: u64,
        bits: &[Boolean<Fr>],
    ) -> Result<GlVar, SynthesisError> {
        let mut result = GlVar::one();
        let mut power = base % P;
        for b in bits {
            // b ? power : 1, which is canonical without reduction
            let factor = GlVar(
                FpVar::from(b.clone()) * Fr::from(native::sub(power, 1)) + FpVar::one(),
            );
            result = result.mul(&factor)?;
            power = native::square(power);
        }
        Ok(result)
    }

    /// Little-endian 64-bit decomposition of the canonical value.
    pub fn to_bits_le(&self) -> Result<Vec<Boolean<Fr>>, SynthesisError> {
        range::decompose(&self.0, 64)
    }

    /// Enforce `self < 2^n`.
    pub fn enforce_fits_in_bits(&self, n: usize) -> Result<(), SynthesisError> {
        range::decompose(&self.0, n).map(|_| ())
    }

    pub fn enforce_equal(&self, other: &GlVar) -> Result<(), SynthesisError> {
        self.0.enforce_equal(&other.0)
    }

    pub fn is_eq(&self, other: &GlVar) -> Result<Boolean<Fr>, SynthesisError> {
        self.0.is_eq(&other.0)
    }
}

impl AllocVar<u64, Fr> for GlVar {
    fn new_variable<T: Borrow<u64>>(
        cs: impl Into<Namespace<Fr>>,
        f: impl FnOnce() -> Result<T, SynthesisError>,
        mode: AllocationMode,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        match mode {
            AllocationMode::Constant => Ok(GlVar::constant(*f()?.borrow())),
            AllocationMode::Witness => {
                let value = if cs.is_in_setup_mode() {
                    None
                } else {
                    Some(*f()?.borrow())
                };
                let (v, _) = range::alloc_canonical(cs, value)?;
                Ok(GlVar(v))
            }
            AllocationMode::Input => {
                let v = FpVar::new_input(cs, || f().map(|v| Fr::from(*v.borrow() % P)))?;
                range::enforce_canonical(&v)?;
                Ok(GlVar(v))
            }
        }
    }
}

impl CondSelectGadget<Fr> for GlVar {
    fn conditionally_select(
        cond: &Boolean<Fr>,
        true_value: &Self,
        false_value: &Self,
    ) -> Result<Self, SynthesisError> {
        Ok(GlVar(FpVar::conditionally_select(
            cond,
            &true_value.0,
            &false_value.0,
        )?))
    }
}
