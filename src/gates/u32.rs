//! u32 arithmetic gates: many-addend addition, multiply-add, comparison and bit
//! interleaving. All range checks use 2-bit limbs tested with Π (x − i).

use super::{booleanity, range_product, reduce_with_const_powers, EvaluationVars, Gate};
use crate::goldilocks::GlExtVar;
use ark_relations::r1cs::SynthesisError;

const LIMB_BITS: usize = 2;
const LIMB_BASE: u64 = 1 << LIMB_BITS;
const U32_BASE: u64 = 1 << 32;

/// Horner over limbs from most to least significant, split at `split`:
/// limbs below `split` form the low part.
fn combine_limbs(
    limbs: &[GlExtVar],
    split: usize,
    constraints: &mut Vec<GlExtVar>,
) -> Result<(GlExtVar, GlExtVar), SynthesisError> {
    let mut low = GlExtVar::zero();
    let mut high = GlExtVar::zero();
    for j in (0..limbs.len()).rev() {
        constraints.push(range_product(&limbs[j], LIMB_BASE)?);
        let target = if j < split { &mut low } else { &mut high };
        *target = target.acc().mul_const(LIMB_BASE).add(&limbs[j].acc()).reduce()?;
    }
    Ok((low, high))
}

/// `Σ addends + carry_in = carry_out·2^32 + result`, `num_ops` times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct U32AddManyGate {
    pub num_addends: usize,
    pub num_ops: usize,
}

impl U32AddManyGate {
    const NUM_RESULT_LIMBS: usize = 32 / LIMB_BITS;
    const NUM_CARRY_LIMBS: usize = 2;
    const NUM_LIMBS: usize = Self::NUM_RESULT_LIMBS + Self::NUM_CARRY_LIMBS;

    pub fn wire_ith_op_jth_addend(&self, i: usize, j: usize) -> usize {
        debug_assert!(j < self.num_addends);
        (self.num_addends + 3) * i + j
    }
    pub fn wire_ith_carry(&self, i: usize) -> usize {
        (self.num_addends + 3) * i + self.num_addends
    }
    pub fn wire_ith_output_result(&self, i: usize) -> usize {
        (self.num_addends + 3) * i + self.num_addends + 1
    }
    pub fn wire_ith_output_carry(&self, i: usize) -> usize {
        (self.num_addends + 3) * i + self.num_addends + 2
    }
    pub fn wire_ith_output_jth_limb(&self, i: usize, j: usize) -> usize {
        debug_assert!(j < Self::NUM_LIMBS);
        (self.num_addends + 3) * self.num_ops + Self::NUM_LIMBS * i + j
    }
}

impl Gate for U32AddManyGate {
    fn num_wires(&self) -> usize {
        (self.num_addends + 3) * self.num_ops + Self::NUM_LIMBS * self.num_ops
    }

    fn num_constants(&self) -> usize {
        0
    }

    fn num_constraints(&self) -> usize {
        self.num_ops * (3 + Self::NUM_LIMBS)
    }

    fn eval_unfiltered(&self, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        let w = vars.local_wires;
        let mut constraints = Vec::with_capacity(self.num_constraints());
        for i in 0..self.num_ops {
            let mut computed = w[self.wire_ith_carry(i)].acc();
            for j in 0..self.num_addends {
                computed = computed.add(&w[self.wire_ith_op_jth_addend(i, j)].acc());
            }
            let result = &w[self.wire_ith_output_result(i)];
            let carry = &w[self.wire_ith_output_carry(i)];
            let combined = carry.acc().mul_const(U32_BASE).add(&result.acc());
            constraints.push(combined.sub(&computed).reduce()?);

            let limbs: Vec<GlExtVar> = (0..Self::NUM_LIMBS)
                .map(|j| w[self.wire_ith_output_jth_limb(i, j)].clone())
                .collect();
            let (low, high) = combine_limbs(&limbs, Self::NUM_RESULT_LIMBS, &mut constraints)?;
            constraints.push(low.sub(result)?);
            constraints.push(high.sub(carry)?);
        }
        Ok(constraints)
    }
}

/// `m0·m1 + addend = high·2^32 + low` with a canonicity witness, `num_ops` times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct U32ArithmeticGate {
    pub num_ops: usize,
}

impl U32ArithmeticGate {
    /// m0, m1, addend, low, high and the canonicity inverse of each op.
    const ROUTED_WIRES_PER_OP: usize = 6;
    const NUM_LIMBS: usize = 64 / LIMB_BITS;

    pub fn wire_ith_multiplicand_0(&self, i: usize) -> usize {
        Self::ROUTED_WIRES_PER_OP * i
    }
    pub fn wire_ith_multiplicand_1(&self, i: usize) -> usize {
        Self::ROUTED_WIRES_PER_OP * i + 1
    }
    pub fn wire_ith_addend(&self, i: usize) -> usize {
        Self::ROUTED_WIRES_PER_OP * i + 2
    }
    pub fn wire_ith_output_low_half(&self, i: usize) -> usize {
        Self::ROUTED_WIRES_PER_OP * i + 3
    }
    pub fn wire_ith_output_high_half(&self, i: usize) -> usize {
        Self::ROUTED_WIRES_PER_OP * i + 4
    }
    pub fn wire_ith_inverse(&self, i: usize) -> usize {
        Self::ROUTED_WIRES_PER_OP * i + 5
    }
    pub fn wire_ith_output_jth_limb(&self, i: usize, j: usize) -> usize {
        debug_assert!(j < Self::NUM_LIMBS);
        Self::ROUTED_WIRES_PER_OP * self.num_ops + Self::NUM_LIMBS * i + j
    }
}

impl Gate for U32ArithmeticGate {
    fn num_wires(&self) -> usize {
        self.num_ops * (Self::ROUTED_WIRES_PER_OP + Self::NUM_LIMBS)
    }

    fn num_constants(&self) -> usize {
        0
    }

    fn num_constraints(&self) -> usize {
        self.num_ops * (4 + Self::NUM_LIMBS)
    }

    fn eval_unfiltered(&self, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        let w = vars.local_wires;
        let mut constraints = Vec::with_capacity(self.num_constraints());
        for i in 0..self.num_ops {
            let computed = w[self.wire_ith_multiplicand_0(i)]
                .acc()
                .mul(&w[self.wire_ith_multiplicand_1(i)].acc())
                .add(&w[self.wire_ith_addend(i)].acc());
            let low = &w[self.wire_ith_output_low_half(i)];
            let high = &w[self.wire_ith_output_high_half(i)];
            let inverse = &w[self.wire_ith_inverse(i)];

            // (inverse·(u32::MAX − high) − 1)·low: the high half may only be u32::MAX
            // when the low half is zero, which keeps high·2^32 + low below p.
            let diff = high.neg()?.add_const(u32::MAX as u64)?;
            let hi_not_max = inverse.mul(&diff)?.add_const(crate::goldilocks::native::neg(1))?;
            constraints.push(hi_not_max.mul(low)?);

            let combined = high.acc().mul_const(U32_BASE).add(&low.acc());
            constraints.push(combined.sub(&computed).reduce()?);

            let limbs: Vec<GlExtVar> = (0..Self::NUM_LIMBS)
                .map(|j| w[self.wire_ith_output_jth_limb(i, j)].clone())
                .collect();
            let (lo, hi) = combine_limbs(&limbs, Self::NUM_LIMBS / 2, &mut constraints)?;
            constraints.push(lo.sub(low)?);
            constraints.push(hi.sub(high)?);
        }
        Ok(constraints)
    }
}

/// `result = (first ≤ second)` for `num_bits`-bit inputs split into `num_chunks` chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComparisonGate {
    pub num_bits: usize,
    pub num_chunks: usize,
}

impl ComparisonGate {
    pub fn chunk_bits(&self) -> usize {
        self.num_bits.div_ceil(self.num_chunks)
    }
    pub fn wire_first_input(&self) -> usize {
        0
    }
    pub fn wire_second_input(&self) -> usize {
        1
    }
    pub fn wire_result_bool(&self) -> usize {
        2
    }
    pub fn wire_most_significant_diff(&self) -> usize {
        3
    }
    pub fn wire_first_chunk_val(&self, chunk: usize) -> usize {
        4 + chunk
    }
    pub fn wire_second_chunk_val(&self, chunk: usize) -> usize {
        4 + self.num_chunks + chunk
    }
    pub fn wire_equality_dummy(&self, chunk: usize) -> usize {
        4 + 2 * self.num_chunks + chunk
    }
    pub fn wire_chunks_equal(&self, chunk: usize) -> usize {
        4 + 3 * self.num_chunks + chunk
    }
    pub fn wire_intermediate_value(&self, chunk: usize) -> usize {
        4 + 4 * self.num_chunks + chunk
    }
    /// Bits of `2^chunk_bits + most_significant_diff`, little-endian.
    pub fn wire_most_significant_diff_bit(&self, bit_index: usize) -> usize {
        4 + 5 * self.num_chunks + bit_index
    }
}

impl Gate for ComparisonGate {
    fn num_wires(&self) -> usize {
        4 + 5 * self.num_chunks + (self.chunk_bits() + 1)
    }

    fn num_constants(&self) -> usize {
        0
    }

    fn num_constraints(&self) -> usize {
        6 + 5 * self.num_chunks + self.chunk_bits()
    }

    fn eval_unfiltered(&self, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        let w = vars.local_wires;
        let chunk_bits = self.chunk_bits();
        let chunk_size = 1u64 << chunk_bits;
        let mut constraints = Vec::with_capacity(self.num_constraints());

        let first_chunks: Vec<GlExtVar> =
            (0..self.num_chunks).map(|i| w[self.wire_first_chunk_val(i)].clone()).collect();
        let second_chunks: Vec<GlExtVar> =
            (0..self.num_chunks).map(|i| w[self.wire_second_chunk_val(i)].clone()).collect();

        constraints.push(
            reduce_with_const_powers(&first_chunks, chunk_size)?.sub(&w[self.wire_first_input()])?,
        );
        constraints.push(
            reduce_with_const_powers(&second_chunks, chunk_size)?.sub(&w[self.wire_second_input()])?,
        );

        let mut msd_so_far = GlExtVar::zero();
        for i in 0..self.num_chunks {
            constraints.push(range_product(&first_chunks[i], chunk_size)?);
            constraints.push(range_product(&second_chunks[i], chunk_size)?);

            let difference = second_chunks[i].sub(&first_chunks[i])?;
            let equality_dummy = &w[self.wire_equality_dummy(i)];
            let chunks_equal = &w[self.wire_chunks_equal(i)];

            // difference·dummy − (1 − equal)
            constraints.push(
                difference
                    .acc()
                    .mul(&equality_dummy.acc())
                    .add(&chunks_equal.acc())
                    .reduce()?
                    .add_const(crate::goldilocks::native::neg(1))?,
            );
            constraints.push(chunks_equal.mul(&difference)?);

            let intermediate = &w[self.wire_intermediate_value(i)];
            constraints.push(
                intermediate
                    .acc()
                    .sub(&chunks_equal.acc().mul(&msd_so_far.acc()))
                    .reduce()?,
            );
            // intermediate + (1 − equal)·difference
            msd_so_far = intermediate
                .acc()
                .add(&difference.acc())
                .sub(&chunks_equal.acc().mul(&difference.acc()))
                .reduce()?;
        }

        let msd = &w[self.wire_most_significant_diff()];
        constraints.push(msd.sub(&msd_so_far)?);

        let msd_bits: Vec<GlExtVar> = (0..chunk_bits + 1)
            .map(|i| w[self.wire_most_significant_diff_bit(i)].clone())
            .collect();
        for bit in &msd_bits {
            // bit·(1 − bit)
            constraints.push(booleanity(bit)?.neg()?);
        }
        let bits_combined = reduce_with_const_powers(&msd_bits, 2)?;
        constraints.push(msd.add_const(chunk_size)?.sub(&bits_combined)?);

        // first ≤ second iff the top bit of 2^n + diff is set.
        constraints.push(w[self.wire_result_bool()].sub(&msd_bits[chunk_bits])?);
        Ok(constraints)
    }
}

/// Spreads the 32 bits of x into the even positions of a 64-bit value.
///
/// Layout per op `i`: x at `2i`, the interleaved value at `2i + 1`, then after all routed
/// wires 32 bits of x from the most significant end at `2·num_ops + 32i + j`. Each bit
/// contributes `bit·(bit − 1)`, followed by the two recomposition checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct U32InterleaveGate {
    pub num_ops: usize,
}

impl U32InterleaveGate {
    pub const NUM_BITS: usize = 32;

    pub fn wire_ith_x(&self, i: usize) -> usize {
        2 * i
    }
    pub fn wire_ith_x_interleaved(&self, i: usize) -> usize {
        2 * i + 1
    }
    /// Bit `j` of x counted from the most significant end.
    pub fn wire_ith_bit(&self, i: usize, j: usize) -> usize {
        2 * self.num_ops + Self::NUM_BITS * i + j
    }
}

impl Gate for U32InterleaveGate {
    fn num_wires(&self) -> usize {
        self.num_ops * (2 + Self::NUM_BITS)
    }

    fn num_constants(&self) -> usize {
        0
    }

    fn num_constraints(&self) -> usize {
        self.num_ops * (Self::NUM_BITS + 2)
    }

    fn eval_unfiltered(&self, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        let w = vars.local_wires;
        let mut constraints = Vec::with_capacity(self.num_constraints());
        for i in 0..self.num_ops {
            let mut x_acc = GlExtVar::zero();
            let mut interleaved_acc = GlExtVar::zero();
            for j in 0..Self::NUM_BITS {
                let bit = &w[self.wire_ith_bit(i, j)];
                constraints.push(booleanity(bit)?);
                x_acc = x_acc.acc().mul_const(2).add(&bit.acc()).reduce()?;
                interleaved_acc = interleaved_acc.acc().mul_const(4).add(&bit.acc()).reduce()?;
            }
            constraints.push(x_acc.sub(&w[self.wire_ith_x(i)])?);
            constraints.push(interleaved_acc.sub(&w[self.wire_ith_x_interleaved(i)])?);
        }
        Ok(constraints)
    }
}

/// Splits a 64-bit interleaved value back into its even and odd 32-bit halves.
///
/// Layout per op `i`: the interleaved value at `3i`, evens at `3i + 1`, odds at `3i + 2`,
/// then 64 bits from the most significant end at `3·num_ops + 64i + j`. Constraint order is
/// the booleanity of each bit, then the interleaved, evens and odds recompositions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UninterleaveToU32Gate {
    pub num_ops: usize,
}

impl UninterleaveToU32Gate {
    pub const NUM_BITS: usize = 64;

    pub fn wire_ith_x_interleaved(&self, i: usize) -> usize {
        3 * i
    }
    pub fn wire_ith_x_evens(&self, i: usize) -> usize {
        3 * i + 1
    }
    pub fn wire_ith_x_odds(&self, i: usize) -> usize {
        3 * i + 2
    }
    /// Bit `j` of the interleaved value counted from the most significant end.
    pub fn wire_ith_bit(&self, i: usize, j: usize) -> usize {
        3 * self.num_ops + Self::NUM_BITS * i + j
    }
}

impl Gate for UninterleaveToU32Gate {
    fn num_wires(&self) -> usize {
        self.num_ops * (3 + Self::NUM_BITS)
    }

    fn num_constants(&self) -> usize {
        0
    }

    fn num_constraints(&self) -> usize {
        self.num_ops * (Self::NUM_BITS + 3)
    }

    fn eval_unfiltered(&self, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        let w = vars.local_wires;
        let mut constraints = Vec::with_capacity(self.num_constraints());
        for i in 0..self.num_ops {
            let mut x_acc = GlExtVar::zero();
            let mut evens_acc = GlExtVar::zero();
            let mut odds_acc = GlExtVar::zero();
            for j in 0..Self::NUM_BITS {
                let bit = &w[self.wire_ith_bit(i, j)];
                constraints.push(booleanity(bit)?);
                x_acc = x_acc.acc().mul_const(2).add(&bit.acc()).reduce()?;
                // j counts from the top, so even j is an odd bit position.
                let target = if j % 2 == 0 { &mut odds_acc } else { &mut evens_acc };
                *target = target.acc().mul_const(2).add(&bit.acc()).reduce()?;
            }
            constraints.push(x_acc.sub(&w[self.wire_ith_x_interleaved(i)])?);
            constraints.push(evens_acc.sub(&w[self.wire_ith_x_evens(i)])?);
            constraints.push(odds_acc.sub(&w[self.wire_ith_x_odds(i)])?);
        }
        Ok(constraints)
    }
}
