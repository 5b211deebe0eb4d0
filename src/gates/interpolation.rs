//! Barycentric interpolation over a coset of a two-adic subgroup.
//!
//! With domain points x_i, values v_i, weights w_i and evaluation point z:
//! p_0 = 1, p_i = p_{i-1}·(z − x_{i-1}); e_0 = 0, e_i = e_{i-1}·(z − x_{i-1}) + w_{i-1}·v_{i-1}·p_{i-1}.
//! The interpolant at z is e_n. Every (degree − 1)-th pair (e, p) is stored in a
//! wire so each constraint stays within the gate degree.

use super::{EvaluationVars, ExtAlgebraVar, Gate};
use crate::goldilocks::native::{self, P};
use crate::goldilocks::GlExtVar;
use crate::plonk::common_data::D;
use ark_relations::r1cs::SynthesisError;
use core::ops::Range;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CosetInterpolationGate {
    pub subgroup_bits: usize,
    pub degree: usize,
    pub barycentric_weights: Vec<u64>,
}

impl CosetInterpolationGate {
    pub fn new(subgroup_bits: usize) -> Self {
        Self::with_max_degree(subgroup_bits, 1 << subgroup_bits)
    }

    pub fn with_max_degree(subgroup_bits: usize, max_degree: usize) -> Self {
        assert!(max_degree > 1, "need at least quadratic constraints");
        let n_points = 1 << subgroup_bits;
        let n_intermediates = (n_points - 2) / (max_degree - 1);
        let degree = (n_points - 2) / (n_intermediates + 1) + 2;
        Self::with_degree(subgroup_bits, degree)
    }

    /// Uses the exact degree the prover recorded.
    pub fn with_degree(subgroup_bits: usize, degree: usize) -> Self {
        CosetInterpolationGate {
            subgroup_bits,
            degree,
            barycentric_weights: barycentric_weights(&native::two_adic_subgroup(subgroup_bits)),
        }
    }

    pub fn num_points(&self) -> usize {
        1 << self.subgroup_bits
    }

    pub fn wire_shift(&self) -> usize {
        0
    }

    fn start_values(&self) -> usize {
        1
    }

    pub fn wires_value(&self, i: usize) -> Range<usize> {
        debug_assert!(i < self.num_points());
        let start = self.start_values() + i * D;
        start..start + D
    }

    fn start_evaluation_point(&self) -> usize {
        self.start_values() + self.num_points() * D
    }

    pub fn wires_evaluation_point(&self) -> Range<usize> {
        let start = self.start_evaluation_point();
        start..start + D
    }

    fn start_evaluation_value(&self) -> usize {
        self.start_evaluation_point() + D
    }

    pub fn wires_evaluation_value(&self) -> Range<usize> {
        let start = self.start_evaluation_value();
        start..start + D
    }

    fn start_intermediates(&self) -> usize {
        self.start_evaluation_value() + D
    }

    pub fn num_intermediates(&self) -> usize {
        (self.num_points() - 2) / (self.degree - 1)
    }

    pub fn wires_intermediate_eval(&self, i: usize) -> Range<usize> {
        debug_assert!(i < self.num_intermediates());
        let start = self.start_intermediates() + D * i;
        start..start + D
    }

    pub fn wires_intermediate_prod(&self, i: usize) -> Range<usize> {
        debug_assert!(i < self.num_intermediates());
        let start = self.start_intermediates() + D * (self.num_intermediates() + i);
        start..start + D
    }

    pub fn wires_shifted_evaluation_point(&self) -> Range<usize> {
        let start = self.start_intermediates() + D * 2 * self.num_intermediates();
        start..start + D
    }

    fn end(&self) -> usize {
        self.start_intermediates() + D * (2 * self.num_intermediates() + 1)
    }
}

/// w_i = 1 / Π_{j≠i} (x_i − x_j)
pub fn barycentric_weights(points: &[u64]) -> Vec<u64> {
    points
        .iter()
        .enumerate()
        .map(|(i, &xi)| {
            let denom = points
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .fold(1u64, |acc, (_, &xj)| native::mul(acc, native::sub(xi, xj)));
            native::inv(denom)
        })
        .collect()
}

fn algebra_sub_const(a: &ExtAlgebraVar, c: u64) -> Result<ExtAlgebraVar, SynthesisError> {
    Ok(ExtAlgebraVar([
        a.0[0].add_const(native::neg(c))?,
        a.0[1].clone(),
    ]))
}

fn algebra_mul_const(a: &ExtAlgebraVar, c: u64) -> Result<ExtAlgebraVar, SynthesisError> {
    Ok(ExtAlgebraVar([a.0[0].mul_const(c)?, a.0[1].mul_const(c)?]))
}

fn partial_interpolate(
    domain: &[u64],
    values: &[ExtAlgebraVar],
    weights: &[u64],
    x: &ExtAlgebraVar,
    initial_eval: ExtAlgebraVar,
    initial_prod: ExtAlgebraVar,
) -> Result<(ExtAlgebraVar, ExtAlgebraVar), SynthesisError> {
    debug_assert_eq!(domain.len(), values.len());
    let mut eval = initial_eval;
    let mut prod = initial_prod;
    for ((&x_i, value), &weight) in domain.iter().zip(values).zip(weights) {
        let term = algebra_sub_const(x, x_i)?;
        let weighted = algebra_mul_const(value, weight)?;
        eval = eval.mul_acc(&term).add(&weighted.mul_acc(&prod)).reduce()?;
        prod = prod.mul(&term)?;
    }
    Ok((eval, prod))
}

impl Gate for CosetInterpolationGate {
    fn id(&self) -> String {
        format!("{self:?}<D={D}>")
    }

    fn num_wires(&self) -> usize {
        self.end()
    }

    fn num_constants(&self) -> usize {
        0
    }

    fn num_constraints(&self) -> usize {
        // D for the shifted point, D per intermediate (eval, prod) each, D for the value.
        D + D + 2 * D * self.num_intermediates()
    }

    fn eval_unfiltered(&self, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        let mut constraints = Vec::with_capacity(self.num_constraints());
        let deg = self.degree;

        let shift = &vars.local_wires[self.wire_shift()];
        let evaluation_point = vars.get_local_ext_algebra(self.wires_evaluation_point());
        let shifted_point = vars.get_local_ext_algebra(self.wires_shifted_evaluation_point());
        constraints.extend(
            evaluation_point
                .sub(&shifted_point.scalar_mul(shift)?)?
                .into_ext_array(),
        );

        let domain = native::two_adic_subgroup(self.subgroup_bits);
        let values: Vec<ExtAlgebraVar> = (0..self.num_points())
            .map(|i| vars.get_local_ext_algebra(self.wires_value(i)))
            .collect();
        let weights = &self.barycentric_weights;

        let (mut computed_eval, mut computed_prod) = partial_interpolate(
            &domain[..deg],
            &values[..deg],
            &weights[..deg],
            &shifted_point,
            ExtAlgebraVar::zero(),
            ExtAlgebraVar::one(),
        )?;

        for i in 0..self.num_intermediates() {
            let intermediate_eval = vars.get_local_ext_algebra(self.wires_intermediate_eval(i));
            let intermediate_prod = vars.get_local_ext_algebra(self.wires_intermediate_prod(i));
            constraints.extend(intermediate_eval.sub(&computed_eval)?.into_ext_array());
            constraints.extend(intermediate_prod.sub(&computed_prod)?.into_ext_array());

            let start = 1 + (deg - 1) * (i + 1);
            let end = (start + deg - 1).min(self.num_points());
            (computed_eval, computed_prod) = partial_interpolate(
                &domain[start..end],
                &values[start..end],
                &weights[start..end],
                &shifted_point,
                intermediate_eval,
                intermediate_prod,
            )?;
        }

        let evaluation_value = vars.get_local_ext_algebra(self.wires_evaluation_value());
        constraints.extend(evaluation_value.sub(&computed_eval)?.into_ext_array());
        Ok(constraints)
    }
}

/// Reduces weights parsed from a descriptor, which may be non-canonical.
pub(crate) fn canonical_weights(raw: Vec<u64>) -> Vec<u64> {
    raw.into_iter().map(|w| w % P).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::tests::eval_on;
    use crate::goldilocks::native::{ext_add, ext_from_base, ext_mul, ext_scalar_mul, ext_sub, Ext, W};

    type Alg = [Ext; 2];

    fn alg_mul(a: Alg, b: Alg) -> Alg {
        [
            ext_add(ext_mul(a[0], b[0]), ext_scalar_mul(ext_mul(a[1], b[1]), W)),
            ext_add(ext_mul(a[0], b[1]), ext_mul(a[1], b[0])),
        ]
    }

    fn alg_add(a: Alg, b: Alg) -> Alg {
        [ext_add(a[0], b[0]), ext_add(a[1], b[1])]
    }

    fn alg_scale(a: Alg, c: u64) -> Alg {
        [ext_scalar_mul(a[0], c), ext_scalar_mul(a[1], c)]
    }

    /// Builds a satisfying row for the gate on a coset shift·H.
    fn witness(gate: &CosetInterpolationGate, shift: u64, values: &[Alg], z: Alg) -> Vec<Ext> {
        let mut w = vec![[0u64; 2]; gate.num_wires()];
        w[gate.wire_shift()] = ext_from_base(shift);
        for (i, v) in values.iter().enumerate() {
            let r = gate.wires_value(i);
            w[r.start] = v[0];
            w[r.start + 1] = v[1];
        }
        let ep = gate.wires_evaluation_point();
        w[ep.start] = z[0];
        w[ep.start + 1] = z[1];
        let shift_inv = native::inv(shift);
        let shifted = alg_scale(z, shift_inv);
        let sp = gate.wires_shifted_evaluation_point();
        w[sp.start] = shifted[0];
        w[sp.start + 1] = shifted[1];

        let domain = native::two_adic_subgroup(gate.subgroup_bits);
        let mut eval: Alg = [[0, 0], [0, 0]];
        let mut prod: Alg = [[1, 0], [0, 0]];
        let deg = gate.degree;
        let mut stored = 0;
        for i in 0..gate.num_points() {
            if i >= deg && (i - 1) % (deg - 1) == 0 && stored < gate.num_intermediates() {
                let re = gate.wires_intermediate_eval(stored);
                let rp = gate.wires_intermediate_prod(stored);
                w[re.start] = eval[0];
                w[re.start + 1] = eval[1];
                w[rp.start] = prod[0];
                w[rp.start + 1] = prod[1];
                stored += 1;
            }
            let term = [ext_sub(shifted[0], ext_from_base(domain[i])), shifted[1]];
            let weighted = alg_scale(values[i], gate.barycentric_weights[i]);
            eval = alg_add(alg_mul(eval, term), alg_mul(weighted, prod));
            prod = alg_mul(prod, term);
        }
        let ev = gate.wires_evaluation_value();
        w[ev.start] = eval[0];
        w[ev.start + 1] = eval[1];
        w
    }

    #[test]
    fn test_barycentric_weights_are_x_over_n() {
        let pts = native::two_adic_subgroup(3);
        let n_inv = native::inv(8);
        for (x, w) in pts.iter().zip(barycentric_weights(&pts)) {
            assert_eq!(w, native::mul(*x, n_inv));
        }
    }

    #[test]
    fn test_degree_choice() {
        let gate = CosetInterpolationGate::with_max_degree(4, 6);
        assert_eq!(gate.num_intermediates(), 2);
        assert_eq!(gate.degree, 6);
        assert_eq!(gate.num_constraints(), 12);
    }

    #[test]
    fn test_interpolation_of_constant_polynomial() {
        // Interpolating a constant over any coset gives that constant everywhere.
        let gate = CosetInterpolationGate::with_max_degree(3, 4);
        let c: Alg = [[42, 3], [5, 0]];
        let values = vec![c; gate.num_points()];
        let z: Alg = [[123, 456], [789, 1]];
        let w = witness(&gate, native::MULTIPLICATIVE_GROUP_GENERATOR, &values, z);
        let ev = gate.wires_evaluation_value();
        assert_eq!([w[ev.start], w[ev.start + 1]], c);
        let (out, cs) = eval_on(&gate, &[], &w);
        assert!(out.iter().all(|x| *x == [0, 0]));
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_interpolation_wrong_value() {
        let gate = CosetInterpolationGate::new(2);
        let values: Vec<Alg> = (0..4u64).map(|i| [[i * i + 1, i], [0, 2]]).collect();
        let mut w = witness(&gate, 7, &values, [[9, 9], [1, 1]]);
        let ev = gate.wires_evaluation_value();
        w[ev.start][0] = native::add(w[ev.start][0], 1);
        let (out, _) = eval_on(&gate, &[], &w);
        assert_eq!(out[out.len() - 2], [1, 0]);
    }
}
