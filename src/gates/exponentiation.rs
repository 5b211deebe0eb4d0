use super::{EvaluationVars, Gate};
use crate::goldilocks::GlExtVar;
use crate::plonk::common_data::D;
use ark_relations::r1cs::SynthesisError;

/// `output = base^power` by square-and-multiply over the little-endian power bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExponentiationGate {
    pub num_power_bits: usize,
}

impl ExponentiationGate {
    pub fn wire_base(&self) -> usize {
        0
    }

    pub fn wire_power_bit(&self, i: usize) -> usize {
        debug_assert!(i < self.num_power_bits);
        1 + i
    }

    pub fn wire_output(&self) -> usize {
        1 + self.num_power_bits
    }

    pub fn wire_intermediate_value(&self, i: usize) -> usize {
        debug_assert!(i < self.num_power_bits);
        2 + self.num_power_bits + i
    }
}

impl Gate for ExponentiationGate {
    fn id(&self) -> String {
        format!("{self:?}<D={D}>")
    }

    fn num_wires(&self) -> usize {
        self.wire_intermediate_value(self.num_power_bits - 1) + 1
    }

    fn num_constants(&self) -> usize {
        0
    }

    fn num_constraints(&self) -> usize {
        self.num_power_bits + 1
    }

    fn eval_unfiltered(&self, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        let w = vars.local_wires;
        let n = self.num_power_bits;
        let base = &w[self.wire_base()];
        let mut constraints = Vec::with_capacity(self.num_constraints());

        for i in 0..n {
            let prev = if i == 0 {
                GlExtVar::one()
            } else {
                w[self.wire_intermediate_value(i - 1)].square()?
            };
            // Bits are stored little-endian and consumed most significant first.
            let bit = &w[self.wire_power_bit(n - i - 1)];
            // bit·base + (1 − bit)
            let factor = bit.acc().mul(&base.acc()).sub(&bit.acc()).reduce()?.add_const(1)?;
            let computed = prev.mul(&factor)?;
            constraints.push(computed.sub(&w[self.wire_intermediate_value(i)])?);
        }
        constraints.push(w[self.wire_output()].sub(&w[self.wire_intermediate_value(n - 1)])?);
        Ok(constraints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::tests::{base, eval_on};
    use crate::goldilocks::native;

    fn witness(gate: &ExponentiationGate, b: u64, power: u64) -> Vec<u64> {
        let n = gate.num_power_bits;
        let mut w = vec![0u64; gate.num_wires()];
        w[gate.wire_base()] = b;
        let mut acc = 1u64;
        for i in 0..n {
            w[gate.wire_power_bit(i)] = (power >> i) & 1;
            let bit = (power >> (n - 1 - i)) & 1;
            acc = native::square(acc);
            if bit == 1 {
                acc = native::mul(acc, b);
            }
            w[gate.wire_intermediate_value(i)] = acc;
        }
        w[gate.wire_output()] = native::exp(b, power);
        w
    }

    #[test]
    fn test_exponentiation_gate() {
        let gate = ExponentiationGate { num_power_bits: 6 };
        let w = witness(&gate, 0x1234_5678_9abc, 45);
        assert_eq!(w[gate.wire_intermediate_value(5)], w[gate.wire_output()]);
        let (out, cs) = eval_on(&gate, &[], &base(&w));
        assert!(out.iter().all(|c| *c == [0, 0]));
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_exponentiation_gate_wrong_output() {
        let gate = ExponentiationGate { num_power_bits: 4 };
        let mut w = witness(&gate, 3, 11);
        w[gate.wire_output()] = native::exp(3, 12);
        let (out, _) = eval_on(&gate, &[], &base(&w));
        assert_ne!(out[4], [0, 0]);
        assert!(out[..4].iter().all(|c| *c == [0, 0]));
    }
}
