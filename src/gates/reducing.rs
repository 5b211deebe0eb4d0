//! Horner reduction `acc' = acc·alpha + coeff` with base-field or extension coefficients.

use super::{EvaluationVars, ExtAlgebraVar, Gate};
use crate::goldilocks::GlExtVar;
use crate::plonk::common_data::D;
use ark_relations::r1cs::SynthesisError;
use core::ops::Range;

fn wires_output() -> Range<usize> {
    0..D
}

fn wires_alpha() -> Range<usize> {
    D..2 * D
}

fn wires_old_acc() -> Range<usize> {
    2 * D..3 * D
}

const START_COEFFS: usize = 3 * D;

/// One Horner step per coefficient; the last accumulator is the output wire.
fn horner_constraints(
    vars: &EvaluationVars<'_>,
    coeffs: Vec<ExtAlgebraVar>,
    start_accs: usize,
) -> Result<Vec<GlExtVar>, SynthesisError> {
    let n = coeffs.len();
    let alpha = vars.get_local_ext_algebra(wires_alpha());
    let mut acc = vars.get_local_ext_algebra(wires_old_acc());
    let mut constraints = Vec::with_capacity(D * n);
    for (i, coeff) in coeffs.iter().enumerate() {
        let next = if i == n - 1 {
            vars.get_local_ext_algebra(wires_output())
        } else {
            vars.get_local_ext_algebra(start_accs + D * i..start_accs + D * (i + 1))
        };
        let c = acc.mul_acc(&alpha).add(&coeff.acc()).sub(&next.acc()).reduce()?;
        constraints.extend(c.into_ext_array());
        acc = next;
    }
    Ok(constraints)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReducingGate {
    pub num_coeffs: usize,
}

impl ReducingGate {
    pub fn wires_coeffs(&self) -> Range<usize> {
        START_COEFFS..START_COEFFS + self.num_coeffs
    }

    fn start_accs(&self) -> usize {
        START_COEFFS + self.num_coeffs
    }
}

impl Gate for ReducingGate {
    fn num_wires(&self) -> usize {
        2 * D + self.num_coeffs * (D + 1)
    }

    fn num_constants(&self) -> usize {
        0
    }

    fn num_constraints(&self) -> usize {
        D * self.num_coeffs
    }

    fn eval_unfiltered(&self, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        let coeffs = self
            .wires_coeffs()
            .map(|i| ExtAlgebraVar::from_ext(vars.local_wires[i].clone()))
            .collect();
        horner_constraints(&vars, coeffs, self.start_accs())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReducingExtensionGate {
    pub num_coeffs: usize,
}

impl ReducingExtensionGate {
    pub fn wires_coeff(i: usize) -> Range<usize> {
        START_COEFFS + i * D..START_COEFFS + (i + 1) * D
    }

    fn start_accs(&self) -> usize {
        START_COEFFS + self.num_coeffs * D
    }
}

impl Gate for ReducingExtensionGate {
    fn num_wires(&self) -> usize {
        2 * D + 2 * D * self.num_coeffs
    }

    fn num_constants(&self) -> usize {
        0
    }

    fn num_constraints(&self) -> usize {
        D * self.num_coeffs
    }

    fn eval_unfiltered(&self, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        let coeffs = (0..self.num_coeffs)
            .map(|i| vars.get_local_ext_algebra(Self::wires_coeff(i)))
            .collect();
        horner_constraints(&vars, coeffs, self.start_accs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::tests::eval_on;
    use crate::goldilocks::native::{ext_add, ext_mul, ext_scalar_mul, Ext, W};

    type Alg = [Ext; 2];

    fn alg_mul_add(acc: Alg, alpha: Alg, c: Alg) -> Alg {
        [
            ext_add(
                ext_add(ext_mul(acc[0], alpha[0]), ext_scalar_mul(ext_mul(acc[1], alpha[1]), W)),
                c[0],
            ),
            ext_add(ext_add(ext_mul(acc[0], alpha[1]), ext_mul(acc[1], alpha[0])), c[1]),
        ]
    }

    fn put(w: &mut [Ext], r: Range<usize>, a: Alg) {
        w[r.start] = a[0];
        w[r.start + 1] = a[1];
    }

    #[test]
    fn test_reducing_gate() {
        let gate = ReducingGate { num_coeffs: 3 };
        let mut w = vec![[0u64; 2]; gate.num_wires()];
        let alpha: Alg = [[3, 1], [2, 5]];
        let old: Alg = [[7, 0], [0, 1]];
        put(&mut w, wires_alpha(), alpha);
        put(&mut w, wires_old_acc(), old);
        let coeffs: [Ext; 3] = [[11, 4], [13, 0], [17, 9]];
        let mut acc = old;
        for (i, c) in coeffs.iter().enumerate() {
            w[START_COEFFS + i] = *c;
            acc = alg_mul_add(acc, alpha, [*c, [0, 0]]);
            let r = if i == 2 {
                wires_output()
            } else {
                gate.start_accs() + D * i..gate.start_accs() + D * (i + 1)
            };
            put(&mut w, r, acc);
        }
        let (out, cs) = eval_on(&gate, &[], &w);
        assert_eq!(out.len(), 6);
        assert!(out.iter().all(|c| *c == [0, 0]));
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_reducing_extension_gate() {
        let gate = ReducingExtensionGate { num_coeffs: 2 };
        let mut w = vec![[0u64; 2]; gate.num_wires()];
        let alpha: Alg = [[1, 2], [3, 4]];
        put(&mut w, wires_alpha(), alpha);
        let mut acc: Alg = [[0, 0], [0, 0]];
        let coeffs: [Alg; 2] = [[[5, 6], [7, 8]], [[9, 10], [11, 12]]];
        for (i, c) in coeffs.iter().enumerate() {
            put(&mut w, ReducingExtensionGate::wires_coeff(i), *c);
            acc = alg_mul_add(acc, alpha, *c);
            let r = if i == 1 {
                wires_output()
            } else {
                gate.start_accs()..gate.start_accs() + D
            };
            put(&mut w, r, acc);
        }
        let (out, _) = eval_on(&gate, &[], &w);
        assert!(out.iter().all(|c| *c == [0, 0]));
        // a wrong output shows up in the last step only
        w[0][0] ^= 1;
        let (out, _) = eval_on(&gate, &[], &w);
        assert!(out[..2].iter().all(|c| *c == [0, 0]));
        assert_ne!(out[2], [0, 0]);
    }
}
