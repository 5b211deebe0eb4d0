//! Quadratic extension GF(p^2) = GF(p)[X]/(X^2 - 7)

use crate::goldilocks::gl_var::{GlAcc, GlVar};
use crate::goldilocks::native::{self, Ext, W};
use crate::Fr;
use ark_r1cs_std::{
    alloc::{AllocVar, AllocationMode},
    boolean::Boolean,
    select::CondSelectGadget,
};
use ark_relations::r1cs::{ConstraintSystemRef, Namespace, SynthesisError};
use core::borrow::Borrow;

#[derive(Clone, Debug)]
pub struct GlExtVar {
    pub(crate) c0: GlVar,
    pub(crate) c1: GlVar,
}

#[derive(Clone, Debug)]
pub struct GlExtAcc {
    pub c0: GlAcc,
    pub c1: GlAcc,
}

impl GlExtAcc {
    pub fn zero() -> Self {
        GlExtAcc {
            c0: GlAcc::zero(),
            c1: GlAcc::zero(),
        }
    }

    pub fn add(&self, o: &GlExtAcc) -> GlExtAcc {
        GlExtAcc {
            c0: self.c0.add(&o.c0),
            c1: self.c1.add(&o.c1),
        }
    }

    pub fn sub(&self, o: &GlExtAcc) -> GlExtAcc {
        GlExtAcc {
            c0: self.c0.sub(&o.c0),
            c1: self.c1.sub(&o.c1),
        }
    }

    /// (a0 + a1 X)(b0 + b1 X) = (a0 b0 + 7 a1 b1) + (a0 b1 + a1 b0) X
    pub fn mul(&self, o: &GlExtAcc) -> GlExtAcc {
        GlExtAcc {
            c0: self.c0.mul(&o.c0).add(&self.c1.mul(&o.c1).mul_const(W)),
            c1: self.c0.mul(&o.c1).add(&self.c1.mul(&o.c0)),
        }
    }

    pub fn scalar_mul(&self, s: &GlAcc) -> GlExtAcc {
        GlExtAcc {
            c0: self.c0.mul(s),
            c1: self.c1.mul(s),
        }
    }

    pub fn mul_const(&self, c: u64) -> GlExtAcc {
        GlExtAcc {
            c0: self.c0.mul_const(c),
            c1: self.c1.mul_const(c),
        }
    }

    pub fn reduce(&self) -> Result<GlExtVar, SynthesisError> {
        Ok(GlExtVar {
            c0: self.c0.reduce()?,
            c1: self.c1.reduce()?,
        })
    }
}

impl GlExtVar {
    pub fn new(c0: GlVar, c1: GlVar) -> Self {
        GlExtVar { c0, c1 }
    }

    pub fn zero() -> Self {
        Self::from_base(GlVar::zero())
    }

    pub fn one() -> Self {
        Self::from_base(GlVar::one())
    }

    pub fn constant(c: Ext) -> Self {
        GlExtVar {
            c0: GlVar::constant(c[0]),
            c1: GlVar::constant(c[1]),
        }
    }

    pub fn from_base(b: GlVar) -> Self {
        GlExtVar {
            c0: b,
            c1: GlVar::zero(),
        }
    }

    pub fn c0(&self) -> &GlVar {
        &self.c0
    }

    pub fn c1(&self) -> &GlVar {
        &self.c1
    }

    /// Base-field components `[c0, c1]`.
    pub fn to_base_array(&self) -> [GlVar; 2] {
        [self.c0.clone(), self.c1.clone()]
    }

    pub fn acc(&self) -> GlExtAcc {
        GlExtAcc {
            c0: self.c0.acc(),
            c1: self.c1.acc(),
        }
    }

    pub fn is_constant(&self) -> bool {
        self.c0.is_constant() && self.c1.is_constant()
    }

    pub fn cs(&self) -> ConstraintSystemRef<Fr> {
        self.c0.cs().or(self.c1.cs())
    }

    pub fn value(&self) -> Result<Ext, SynthesisError> {
        Ok([self.c0.value()?, self.c1.value()?])
    }

    pub fn add(&self, o: &GlExtVar) -> Result<GlExtVar, SynthesisError> {
        self.acc().add(&o.acc()).reduce()
    }

    pub fn sub(&self, o: &GlExtVar) -> Result<GlExtVar, SynthesisError> {
        self.acc().sub(&o.acc()).reduce()
    }

    pub fn neg(&self) -> Result<GlExtVar, SynthesisError> {
        GlExtAcc::zero().sub(&self.acc()).reduce()
    }

    pub fn mul(&self, o: &GlExtVar) -> Result<GlExtVar, SynthesisError> {
        self.acc().mul(&o.acc()).reduce()
    }

    pub fn square(&self) -> Result<GlExtVar, SynthesisError> {
        self.mul(self)
    }

    pub fn scalar_mul(&self, s: &GlVar) -> Result<GlExtVar, SynthesisError> {
        self.acc().scalar_mul(&s.acc()).reduce()
    }

    pub fn mul_const(&self, c: u64) -> Result<GlExtVar, SynthesisError> {
        self.acc().mul_const(c).reduce()
    }

    pub fn add_base(&self, b: &GlVar) -> Result<GlExtVar, SynthesisError> {
        Ok(GlExtVar {
            c0: self.c0.add(b)?,
            c1: self.c1.clone(),
        })
    }

    pub fn add_const(&self, c: u64) -> Result<GlExtVar, SynthesisError> {
        Ok(GlExtVar {
            c0: self.c0.add_const(c)?,
            c1: self.c1.clone(),
        })
    }

    pub fn inverse(&self) -> Result<GlExtVar, SynthesisError> {
        if self.is_constant() {
            return Ok(GlExtVar::constant(native::ext_inv(self.value()?)));
        }
        let hint = self.value().ok().map(native::ext_inv);
        let inv = GlExtVar::new_witness(self.cs(), || hint.ok_or(SynthesisError::AssignmentMissing))?;
        self.mul(&inv)?.enforce_equal(&GlExtVar::one())?;
        Ok(inv)
    }

    /// Witness `self / other` and enforce `other · q = self`.
    pub fn div(&self, other: &GlExtVar) -> Result<GlExtVar, SynthesisError> {
        if self.is_constant() && other.is_constant() {
            let q = native::ext_mul(self.value()?, native::ext_inv(other.value()?));
            return Ok(GlExtVar::constant(q));
        }
        let hint = match (self.value(), other.value()) {
            (Ok(a), Ok(b)) => Some(native::ext_mul(a, native::ext_inv(b))),
            _ => None,
        };
        let cs = self.cs().or(other.cs());
        let q = GlExtVar::new_witness(cs, || hint.ok_or(SynthesisError::AssignmentMissing))?;
        other.mul(&q)?.enforce_equal(self)?;
        Ok(q)
    }

    pub fn exp_power_of_2(&self, k: usize) -> Result<GlExtVar, SynthesisError> {
        let mut cur = self.clone();
        for _ in 0..k {
            cur = cur.square()?;
        }
        Ok(cur)
    }

    pub fn exp_u64(&self, e: u64) -> Result<GlExtVar, SynthesisError> {
        let mut result = GlExtVar::one();
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

    pub fn enforce_equal(&self, o: &GlExtVar) -> Result<(), SynthesisError> {
        self.c0.enforce_equal(&o.c0)?;
        self.c1.enforce_equal(&o.c1)
    }
}

impl AllocVar<Ext, Fr> for GlExtVar {
    fn new_variable<T: Borrow<Ext>>(
        cs: impl Into<Namespace<Fr>>,
        f: impl FnOnce() -> Result<T, SynthesisError>,
        mode: AllocationMode,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        let value = if mode != AllocationMode::Constant && cs.is_in_setup_mode() {
            None
        } else {
            Some(*f()?.borrow())
        };
        let c0 = GlVar::new_variable(
            cs.clone(),
            || value.map(|v| v[0]).ok_or(SynthesisError::AssignmentMissing),
            mode,
        )?;
        let c1 = GlVar::new_variable(
            cs,
            || value.map(|v| v[1]).ok_or(SynthesisError::AssignmentMissing),
            mode,
        )?;
        Ok(GlExtVar { c0, c1 })
    }
}

impl CondSelectGadget<Fr> for GlExtVar {
    fn conditionally_select(
        cond: &Boolean<Fr>,
        true_value: &Self,
        false_value: &Self,
    ) -> Result<Self, SynthesisError> {
        Ok(GlExtVar {
            c0: GlVar::conditionally_select(cond, &true_value.c0, &false_value.c0)?,
            c1: GlVar::conditionally_select(cond, &true_value.c1, &false_value.c1)?,
        })
    }
}
