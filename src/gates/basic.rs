//! Gates with trivial constraints: no-op, constants, public-input hash, lookups.

use super::{EvaluationVars, Gate};
use crate::goldilocks::GlExtVar;
use crate::hash::NUM_HASH_OUT_ELTS;
use ark_relations::r1cs::SynthesisError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoopGate;

impl Gate for NoopGate {
    fn num_wires(&self) -> usize {
        0
    }
    fn num_constants(&self) -> usize {
        0
    }
    fn num_constraints(&self) -> usize {
        0
    }
    fn eval_unfiltered(&self, _vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        Ok(Vec::new())
    }
}

/// Wire `i` equals constant `i`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConstantGate {
    pub num_consts: usize,
}

impl Gate for ConstantGate {
    fn num_wires(&self) -> usize {
        self.num_consts
    }
    fn num_constants(&self) -> usize {
        self.num_consts
    }
    fn num_constraints(&self) -> usize {
        self.num_consts
    }
    fn eval_unfiltered(&self, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        (0..self.num_consts)
            .map(|i| vars.local_constants[i].sub(&vars.local_wires[i]))
            .collect()
    }
}

/// Wires 0..4 hold the hash of the public inputs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublicInputGate;

impl Gate for PublicInputGate {
    fn num_wires(&self) -> usize {
        NUM_HASH_OUT_ELTS
    }
    fn num_constants(&self) -> usize {
        0
    }
    fn num_constraints(&self) -> usize {
        NUM_HASH_OUT_ELTS
    }
    fn eval_unfiltered(&self, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        vars.public_inputs_hash
            .elements
            .iter()
            .enumerate()
            .map(|(i, h)| vars.local_wires[i].sub(&GlExtVar::from_base(h.clone())))
            .collect()
    }
}

/// Lookup rows. The lookup argument itself is not verified, so circuits that
/// commit lookup polynomials are rejected before synthesis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LookupGate;

impl Gate for LookupGate {
    fn num_wires(&self) -> usize {
        0
    }
    fn num_constants(&self) -> usize {
        0
    }
    fn num_constraints(&self) -> usize {
        0
    }
    fn eval_unfiltered(&self, _vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        Ok(Vec::new())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LookupTableGate;

impl Gate for LookupTableGate {
    fn num_wires(&self) -> usize {
        0
    }
    fn num_constants(&self) -> usize {
        0
    }
    fn num_constraints(&self) -> usize {
        0
    }
    fn eval_unfiltered(&self, _vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::tests::{base, eval_on};
    use crate::hash::HashOutVar;

    #[test]
    fn test_constant_gate() {
        let gate = ConstantGate { num_consts: 2 };
        let (out, _) = eval_on(&gate, &base(&[4, 5]), &base(&[4, 6]));
        assert_eq!(out, vec![[0, 0], [crate::goldilocks::native::neg(1), 0]]);
    }

    #[test]
    fn test_public_input_gate() {
        let pih = HashOutVar::constant([1, 2, 3, 4]);
        let wires: Vec<GlExtVar> = [1u64, 2, 3, 5].iter().map(|&x| GlExtVar::constant([x, 0])).collect();
        let vars = EvaluationVars {
            local_constants: &[],
            local_wires: &wires,
            public_inputs_hash: &pih,
        };
        let out = PublicInputGate.eval_unfiltered(vars).unwrap();
        let vals: Vec<_> = out.iter().map(|c| c.value().unwrap()).collect();
        assert_eq!(vals, vec![[0, 0], [0, 0], [0, 0], [1, 0]]);
    }

    #[test]
    fn test_noop_and_lookup_have_no_constraints() {
        let (out, _) = eval_on(&NoopGate, &[], &[]);
        assert!(out.is_empty());
        assert_eq!(LookupGate.num_constraints() + LookupTableGate.num_constraints(), 0);
    }
}
