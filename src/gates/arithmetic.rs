//! Arithmetic gates over base-field and extension-valued wires, and limb decomposition.

use super::{range_product, reduce_with_const_powers, EvaluationVars, Gate};
use crate::goldilocks::GlExtVar;
use crate::plonk::common_data::D;
use ark_relations::r1cs::SynthesisError;
use core::ops::Range;

/// `output = c0·m0·m1 + c1·addend`, `num_ops` times per row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArithmeticGate {
    pub num_ops: usize,
}

impl ArithmeticGate {
    pub fn wire_ith_multiplicand_0(i: usize) -> usize {
        4 * i
    }
    pub fn wire_ith_multiplicand_1(i: usize) -> usize {
        4 * i + 1
    }
    pub fn wire_ith_addend(i: usize) -> usize {
        4 * i + 2
    }
    pub fn wire_ith_output(i: usize) -> usize {
        4 * i + 3
    }
}

impl Gate for ArithmeticGate {
    fn num_wires(&self) -> usize {
        4 * self.num_ops
    }
    fn num_constants(&self) -> usize {
        2
    }
    fn num_constraints(&self) -> usize {
        self.num_ops
    }

    fn eval_unfiltered(&self, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        let c0 = vars.local_constants[0].acc();
        let c1 = vars.local_constants[1].acc();
        let w = vars.local_wires;
        let mut constraints = Vec::with_capacity(self.num_ops);
        for i in 0..self.num_ops {
            let product = w[Self::wire_ith_multiplicand_0(i)].mul(&w[Self::wire_ith_multiplicand_1(i)])?;
            let computed = product
                .acc()
                .mul(&c0)
                .add(&w[Self::wire_ith_addend(i)].acc().mul(&c1));
            constraints.push(w[Self::wire_ith_output(i)].acc().sub(&computed).reduce()?);
        }
        Ok(constraints)
    }
}

/// Extension-algebra version of `ArithmeticGate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArithmeticExtensionGate {
    pub num_ops: usize,
}

impl ArithmeticExtensionGate {
    pub fn wires_ith_multiplicand_0(i: usize) -> Range<usize> {
        4 * D * i..4 * D * i + D
    }
    pub fn wires_ith_multiplicand_1(i: usize) -> Range<usize> {
        4 * D * i + D..4 * D * i + 2 * D
    }
    pub fn wires_ith_addend(i: usize) -> Range<usize> {
        4 * D * i + 2 * D..4 * D * i + 3 * D
    }
    pub fn wires_ith_output(i: usize) -> Range<usize> {
        4 * D * i + 3 * D..4 * D * i + 4 * D
    }
}

impl Gate for ArithmeticExtensionGate {
    fn num_wires(&self) -> usize {
        4 * D * self.num_ops
    }
    fn num_constants(&self) -> usize {
        2
    }
    fn num_constraints(&self) -> usize {
        D * self.num_ops
    }

    fn eval_unfiltered(&self, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        let c0 = vars.local_constants[0].acc();
        let c1 = vars.local_constants[1].acc();
        let mut constraints = Vec::with_capacity(self.num_constraints());
        for i in 0..self.num_ops {
            let m0 = vars.get_local_ext_algebra(Self::wires_ith_multiplicand_0(i));
            let m1 = vars.get_local_ext_algebra(Self::wires_ith_multiplicand_1(i));
            let addend = vars.get_local_ext_algebra(Self::wires_ith_addend(i));
            let output = vars.get_local_ext_algebra(Self::wires_ith_output(i));
            let product = m0.mul(&m1)?;
            for k in 0..D {
                let computed = product.0[k]
                    .acc()
                    .mul(&c0)
                    .add(&addend.0[k].acc().mul(&c1));
                constraints.push(output.0[k].acc().sub(&computed).reduce()?);
            }
        }
        Ok(constraints)
    }
}

/// `output = c0·m0·m1` over the extension algebra.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MulExtensionGate {
    pub num_ops: usize,
}

impl MulExtensionGate {
    pub fn wires_ith_multiplicand_0(i: usize) -> Range<usize> {
        3 * D * i..3 * D * i + D
    }
    pub fn wires_ith_multiplicand_1(i: usize) -> Range<usize> {
        3 * D * i + D..3 * D * i + 2 * D
    }
    pub fn wires_ith_output(i: usize) -> Range<usize> {
        3 * D * i + 2 * D..3 * D * i + 3 * D
    }
}

impl Gate for MulExtensionGate {
    fn num_wires(&self) -> usize {
        3 * D * self.num_ops
    }
    fn num_constants(&self) -> usize {
        1
    }
    fn num_constraints(&self) -> usize {
        D * self.num_ops
    }

    fn eval_unfiltered(&self, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        let c0 = vars.local_constants[0].acc();
        let mut constraints = Vec::with_capacity(self.num_constraints());
        for i in 0..self.num_ops {
            let m0 = vars.get_local_ext_algebra(Self::wires_ith_multiplicand_0(i));
            let m1 = vars.get_local_ext_algebra(Self::wires_ith_multiplicand_1(i));
            let output = vars.get_local_ext_algebra(Self::wires_ith_output(i));
            let product = m0.mul(&m1)?;
            for k in 0..D {
                let computed = product.0[k].acc().mul(&c0);
                constraints.push(output.0[k].acc().sub(&computed).reduce()?);
            }
        }
        Ok(constraints)
    }
}

/// Wire 0 is the sum of `num_limbs` base-`base` limbs stored little-endian from wire 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BaseSumGate {
    pub num_limbs: usize,
    pub base: usize,
}

impl BaseSumGate {
    pub const WIRE_SUM: usize = 0;
    pub const START_LIMBS: usize = 1;

    pub fn limbs(&self) -> Range<usize> {
        Self::START_LIMBS..Self::START_LIMBS + self.num_limbs
    }
}

impl Gate for BaseSumGate {
    fn id(&self) -> String {
        format!("BaseSumGate {{ num_limbs: {} }} + Base: {}", self.num_limbs, self.base)
    }
    fn num_wires(&self) -> usize {
        1 + self.num_limbs
    }
    fn num_constants(&self) -> usize {
        0
    }
    fn num_constraints(&self) -> usize {
        1 + self.num_limbs
    }

    fn eval_unfiltered(&self, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        let sum = &vars.local_wires[Self::WIRE_SUM];
        let limbs = &vars.local_wires[self.limbs()];
        let mut constraints = Vec::with_capacity(self.num_constraints());
        constraints.push(reduce_with_const_powers(limbs, self.base as u64)?.sub(sum)?);
        for limb in limbs {
            constraints.push(range_product(limb, self.base as u64)?);
        }
        Ok(constraints)
    }
}
