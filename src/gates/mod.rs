//! Gate constraint evaluators
//!
//! Each gate evaluates its constraints on the openings at zeta. Wire layouts and
//! constraint order follow the prover's gate definitions exactly: constraint `j` of
//! every gate is summed into slot `j` of the combined gate-constraint vector.

pub mod algebra;
pub mod arithmetic;
pub mod basic;
pub mod exponentiation;
pub mod interpolation;
mod parse;
pub mod poseidon;
pub mod random_access;
pub mod reducing;
pub mod u32;

use crate::goldilocks::{GlExtAcc, GlExtVar};
use crate::hash::HashOutVar;
use crate::plonk::common_data::D;
use ark_relations::r1cs::SynthesisError;
use core::ops::Range;

pub use algebra::{ExtAlgebraAcc, ExtAlgebraVar};
pub use arithmetic::{ArithmeticExtensionGate, ArithmeticGate, BaseSumGate, MulExtensionGate};
pub use basic::{ConstantGate, LookupGate, LookupTableGate, NoopGate, PublicInputGate};
pub use exponentiation::ExponentiationGate;
pub use interpolation::CosetInterpolationGate;
pub use poseidon::{PoseidonGate, PoseidonMdsGate};
pub use random_access::RandomAccessGate;
pub use reducing::{ReducingExtensionGate, ReducingGate};
pub use u32::{ComparisonGate, U32AddManyGate, U32ArithmeticGate, U32InterleaveGate, UninterleaveToU32Gate};

/// Selector value reserved for rows that use none of the gates sharing a selector column.
pub const UNUSED_SELECTOR: u64 = u32::MAX as u64;

/// Openings of a single row at zeta as seen by a gate.
#[derive(Clone, Copy, Debug)]
pub struct EvaluationVars<'a> {
    pub local_constants: &'a [GlExtVar],
    pub local_wires: &'a [GlExtVar],
    pub public_inputs_hash: &'a HashOutVar,
}

impl<'a> EvaluationVars<'a> {
    pub fn remove_prefix(&mut self, n: usize) {
        self.local_constants = &self.local_constants[n..];
    }

    pub fn get_local_ext_algebra(&self, range: Range<usize>) -> ExtAlgebraVar {
        debug_assert_eq!(range.len(), D);
        ExtAlgebraVar([
            self.local_wires[range.start].clone(),
            self.local_wires[range.start + 1].clone(),
        ])
    }
}

pub trait Gate: core::fmt::Debug {
    fn id(&self) -> String {
        format!("{self:?}")
    }

    fn num_wires(&self) -> usize;

    fn num_constants(&self) -> usize;

    fn num_constraints(&self) -> usize;

    fn eval_unfiltered(&self, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError>;
}

/// Parsed gate descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateKind {
    Noop(NoopGate),
    Constant(ConstantGate),
    PublicInput(PublicInputGate),
    BaseSum(BaseSumGate),
    Arithmetic(ArithmeticGate),
    ArithmeticExtension(ArithmeticExtensionGate),
    MulExtension(MulExtensionGate),
    Poseidon(PoseidonGate),
    PoseidonMds(PoseidonMdsGate),
    CosetInterpolation(CosetInterpolationGate),
    Exponentiation(ExponentiationGate),
    RandomAccess(RandomAccessGate),
    Reducing(ReducingGate),
    ReducingExtension(ReducingExtensionGate),
    Lookup(LookupGate),
    LookupTable(LookupTableGate),
    U32AddMany(U32AddManyGate),
    U32Arithmetic(U32ArithmeticGate),
    Comparison(ComparisonGate),
    U32Interleave(U32InterleaveGate),
    UninterleaveToU32(UninterleaveToU32Gate),
}

impl GateKind {
    pub fn as_gate(&self) -> &dyn Gate {
        match self {
            GateKind::Noop(g) => g,
            GateKind::Constant(g) => g,
            GateKind::PublicInput(g) => g,
            GateKind::BaseSum(g) => g,
            GateKind::Arithmetic(g) => g,
            GateKind::ArithmeticExtension(g) => g,
            GateKind::MulExtension(g) => g,
            GateKind::Poseidon(g) => g,
            GateKind::PoseidonMds(g) => g,
            GateKind::CosetInterpolation(g) => g,
            GateKind::Exponentiation(g) => g,
            GateKind::RandomAccess(g) => g,
            GateKind::Reducing(g) => g,
            GateKind::ReducingExtension(g) => g,
            GateKind::Lookup(g) => g,
            GateKind::LookupTable(g) => g,
            GateKind::U32AddMany(g) => g,
            GateKind::U32Arithmetic(g) => g,
            GateKind::Comparison(g) => g,
            GateKind::U32Interleave(g) => g,
            GateKind::UninterleaveToU32(g) => g,
        }
    }
}

/// Π_{i ∈ group, i ≠ row} (i − s), times (UNUSED_SELECTOR − s) when the selector
/// column is shared by several groups.
pub fn compute_filter(
    row: usize,
    group_range: Range<usize>,
    s: &GlExtVar,
    many_selector: bool,
) -> Result<GlExtVar, SynthesisError> {
    debug_assert!(group_range.contains(&row));
    let points = group_range
        .filter(|&i| i != row)
        .map(|i| i as u64)
        .chain(many_selector.then_some(UNUSED_SELECTOR));
    let mut filter = GlExtVar::one();
    for i in points {
        filter = filter.mul(&GlExtVar::constant([i, 0]).sub(s)?)?;
    }
    Ok(filter)
}

/// Filtered constraints of `gate` placed at `row` of its selector group, left unreduced
/// so the caller can sum them across gates before a single reduction.
pub fn eval_filtered(
    gate: &dyn Gate,
    mut vars: EvaluationVars<'_>,
    row: usize,
    selector_index: usize,
    group_range: Range<usize>,
    num_selectors: usize,
    num_lookup_selectors: usize,
) -> Result<Vec<GlExtAcc>, SynthesisError> {
    let filter = compute_filter(
        row,
        group_range,
        &vars.local_constants[selector_index],
        num_selectors > 1,
    )?;
    vars.remove_prefix(num_selectors);
    vars.remove_prefix(num_lookup_selectors);
    let filter = filter.acc();
    Ok(gate
        .eval_unfiltered(vars)?
        .iter()
        .map(|c| c.acc().mul(&filter))
        .collect())
}

/// Σ terms[i]·base^i, the Goldilocks `reduce_with_powers` with a constant base.
pub(crate) fn reduce_with_const_powers(
    terms: &[GlExtVar],
    base: u64,
) -> Result<GlExtVar, SynthesisError> {
    let mut acc = GlExtVar::zero();
    for t in terms.iter().rev() {
        acc = acc.acc().mul_const(base).add(&t.acc()).reduce()?;
    }
    Ok(acc)
}

/// Π_{i < n} (x − i): vanishes exactly when x ∈ {0, …, n − 1}.
pub(crate) fn range_product(x: &GlExtVar, n: u64) -> Result<GlExtVar, SynthesisError> {
    let mut prod = x.clone();
    for i in 1..n {
        prod = prod.mul(&x.add_const(crate::goldilocks::native::neg(i))?)?;
    }
    Ok(prod)
}

/// b·(b − 1)
pub(crate) fn booleanity(b: &GlExtVar) -> Result<GlExtVar, SynthesisError> {
    b.mul(&b.add_const(crate::goldilocks::native::neg(1))?)
}
