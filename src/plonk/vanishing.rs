//! Vanishing polynomial at zeta
//!
//! Per challenge index the terms are, in order: `L_0(ζ)·(Z(ζ) − 1)`, one partial
//! product check per chunk of routed wires, then the combined gate constraints.
//! They are folded with powers of that index's alpha.

use super::common_data::CommonData;
use super::proof_var::OpeningSetVar;
use crate::gates::{eval_filtered, EvaluationVars, GateKind};
use crate::goldilocks::native;
use crate::goldilocks::{GlExtAcc, GlExtVar, GlVar};
use crate::hash::HashOutVar;
use ark_relations::r1cs::SynthesisError;
use itertools::Itertools;

/// `L_0(x) = (x^n − 1) / (n·(x − 1))`, the first Lagrange basis polynomial of the
/// size-`n` subgroup.
pub fn eval_l_0(n: usize, x: &GlExtVar, x_pow_n: &GlExtVar) -> Result<GlExtVar, SynthesisError> {
    let numerator = x_pow_n.add_const(native::neg(1))?;
    let denominator = x.add_const(native::neg(1))?.mul_const(n as u64)?;
    numerator.div(&denominator)
}

/// Σ terms[i]·base^i
pub fn reduce_with_powers(terms: &[GlExtVar], base: &GlExtVar) -> Result<GlExtVar, SynthesisError> {
    let mut acc = GlExtVar::zero();
    for t in terms.iter().rev() {
        acc = acc.acc().mul(&base.acc()).add(&t.acc()).reduce()?;
    }
    Ok(acc)
}

/// Same as `reduce_with_powers` for a base-field `alpha`.
fn reduce_with_base_powers(terms: &[GlExtVar], alpha: &GlVar) -> Result<GlExtVar, SynthesisError> {
    let alpha = alpha.acc();
    let mut acc = GlExtVar::zero();
    for t in terms.iter().rev() {
        acc = acc.acc().scalar_mul(&alpha).add(&t.acc()).reduce()?;
    }
    Ok(acc)
}

fn product(values: &[GlExtVar]) -> Result<GlExtVar, SynthesisError> {
    let mut iter = values.iter();
    let mut acc = match iter.next() {
        Some(v) => v.clone(),
        None => return Ok(GlExtVar::one()),
    };
    for v in iter {
        acc = acc.mul(v)?;
    }
    Ok(acc)
}

/// For each chunk of `max_degree` numerator/denominator pairs, with accumulators
/// `Z(x), π_1, …, π_k, Z(gx)`: `prev·Π numerators − next·Π denominators`.
pub fn check_partial_products(
    numerators: &[GlExtVar],
    denominators: &[GlExtVar],
    partials: &[GlExtVar],
    z_x: &GlExtVar,
    z_gx: &GlExtVar,
    max_degree: usize,
) -> Result<Vec<GlExtVar>, SynthesisError> {
    let accs: Vec<&GlExtVar> = core::iter::once(z_x)
        .chain(partials.iter())
        .chain(core::iter::once(z_gx))
        .collect();
    let chunks = numerators.chunks(max_degree).zip(denominators.chunks(max_degree));
    if chunks.len() + 1 != accs.len() {
        tracing::error!(
            chunks = numerators.len().div_ceil(max_degree),
            partials = partials.len(),
            "partial products do not match the routed wire chunks"
        );
        return Err(SynthesisError::Unsatisfiable);
    }
    chunks
        .zip(accs.into_iter().tuple_windows())
        .map(|((nume, deno), (prev, next))| {
            let nume_product = product(nume)?;
            let deno_product = product(deno)?;
            prev.acc()
                .mul(&nume_product.acc())
                .sub(&next.acc().mul(&deno_product.acc()))
                .reduce()
        })
        .collect()
}

/// Filtered constraints of every gate, summed slot by slot.
pub fn evaluate_gate_constraints(
    common: &CommonData,
    gates: &[GateKind],
    vars: EvaluationVars<'_>,
) -> Result<Vec<GlExtVar>, SynthesisError> {
    let info = &common.selectors_info;
    let mut combined = vec![GlExtAcc::zero(); common.num_gate_constraints];
    for (i, gate) in gates.iter().enumerate() {
        let selector_index = info.selector_indices[i];
        let constraints = eval_filtered(
            gate.as_gate(),
            vars,
            i,
            selector_index,
            info.groups[selector_index].clone(),
            info.num_selectors(),
            common.num_lookup_selectors,
        )?;
        for (acc, c) in combined.iter_mut().zip(constraints) {
            *acc = acc.add(&c);
        }
    }
    combined.iter().map(GlExtAcc::reduce).collect()
}

/// Challenges and openings the vanishing polynomial is evaluated on.
pub struct VanishingInputs<'a> {
    pub zeta: &'a GlExtVar,
    pub zeta_pow_deg: &'a GlExtVar,
    pub openings: &'a OpeningSetVar,
    pub public_inputs_hash: &'a HashOutVar,
    pub betas: &'a [GlVar],
    pub gammas: &'a [GlVar],
    pub alphas: &'a [GlVar],
}

/// One vanishing value per alpha.
pub fn eval_vanishing_poly(
    common: &CommonData,
    gates: &[GateKind],
    inputs: &VanishingInputs<'_>,
) -> Result<Vec<GlExtVar>, SynthesisError> {
    let o = inputs.openings;
    let max_degree = common.quotient_degree_factor;
    let num_prods = common.num_partial_products;
    let num_routed = common.config.num_routed_wires;

    let vars = EvaluationVars {
        local_constants: &o.constants,
        local_wires: &o.wires,
        public_inputs_hash: inputs.public_inputs_hash,
    };
    let constraint_terms = evaluate_gate_constraints(common, gates, vars)?;

    let l_0 = eval_l_0(common.degree(), inputs.zeta, inputs.zeta_pow_deg)?;

    let mut z_1_terms = Vec::with_capacity(common.num_challenges());
    let mut partial_product_terms = Vec::new();
    for i in 0..common.num_challenges() {
        let z_x = &o.plonk_zs[i];
        let z_gx = &o.plonk_zs_next[i];
        z_1_terms.push(l_0.mul(&z_x.add_const(native::neg(1))?)?);

        let beta = inputs.betas[i].acc();
        let gamma = GlExtVar::from_base(inputs.gammas[i].clone()).acc();
        let mut numerators = Vec::with_capacity(num_routed);
        let mut denominators = Vec::with_capacity(num_routed);
        for j in 0..num_routed {
            let wire_plus_gamma = o.wires[j].acc().add(&gamma);
            // β·k_j·ζ + w_j + γ  and  β·σ_j + w_j + γ
            let s_id = inputs.zeta.acc().mul_const(common.k_is[j]);
            numerators.push(s_id.scalar_mul(&beta).add(&wire_plus_gamma).reduce()?);
            denominators.push(
                o.plonk_sigmas[j]
                    .acc()
                    .scalar_mul(&beta)
                    .add(&wire_plus_gamma)
                    .reduce()?,
            );
        }
        let partials = &o.partial_products[i * num_prods..(i + 1) * num_prods];
        partial_product_terms.extend(check_partial_products(
            &numerators,
            &denominators,
            partials,
            z_x,
            z_gx,
            max_degree,
        )?);
    }

    let terms: Vec<GlExtVar> = z_1_terms
        .into_iter()
        .chain(partial_product_terms)
        .chain(constraint_terms)
        .collect();
    inputs
        .alphas
        .iter()
        .map(|alpha| reduce_with_base_powers(&terms, alpha))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goldilocks::native::{ext_add, ext_exp, ext_inv, ext_mul, ext_scalar_mul, ext_sub, Ext};

    fn c(e: Ext) -> GlExtVar {
        GlExtVar::constant(e)
    }

    #[test]
    fn test_eval_l_0() {
        let x: Ext = [12345, 678];
        let n = 8;
        let x_n = ext_exp(x, n as u64);
        let got = eval_l_0(n, &c(x), &c(x_n)).unwrap().value().unwrap();
        let expected = ext_mul(
            ext_sub(x_n, [1, 0]),
            ext_inv(ext_scalar_mul(ext_sub(x, [1, 0]), n as u64)),
        );
        assert_eq!(got, expected);
    }

    #[test]
    fn test_reduce_with_powers() {
        let base: Ext = [2, 1];
        let terms: Vec<Ext> = vec![[1, 0], [0, 1], [5, 5]];
        let expected = terms
            .iter()
            .enumerate()
            .fold([0, 0], |acc, (i, t)| ext_add(acc, ext_mul(*t, ext_exp(base, i as u64))));
        let vars: Vec<GlExtVar> = terms.iter().map(|t| c(*t)).collect();
        assert_eq!(reduce_with_powers(&vars, &c(base)).unwrap().value().unwrap(), expected);
        let alpha = GlVar::constant(9);
        let expected = terms
            .iter()
            .enumerate()
            .fold([0, 0], |acc, (i, t)| ext_add(acc, ext_scalar_mul(*t, native::exp(9, i as u64))));
        assert_eq!(reduce_with_base_powers(&vars, &alpha).unwrap().value().unwrap(), expected);
    }

    #[test]
    fn test_partial_products_vanish_on_consistent_chain() {
        // Five ratios in chunks of two: Z(x) → π_1 → π_2 → Z(gx).
        let nums: Vec<Ext> = vec![[3, 1], [5, 0], [7, 2], [11, 0], [13, 4]];
        let dens: Vec<Ext> = vec![[2, 0], [9, 1], [4, 4], [6, 0], [8, 3]];
        let ratio = |a: &[Ext], b: &[Ext]| {
            let n = a.iter().fold([1, 0], |acc, x| ext_mul(acc, *x));
            let d = b.iter().fold([1, 0], |acc, x| ext_mul(acc, *x));
            ext_mul(n, ext_inv(d))
        };
        let z_x: Ext = [42, 1];
        let p1 = ext_mul(z_x, ratio(&nums[..2], &dens[..2]));
        let p2 = ext_mul(p1, ratio(&nums[2..4], &dens[2..4]));
        let z_gx = ext_mul(p2, ratio(&nums[4..], &dens[4..]));

        let n: Vec<GlExtVar> = nums.iter().map(|v| c(*v)).collect();
        let d: Vec<GlExtVar> = dens.iter().map(|v| c(*v)).collect();
        let checks =
            check_partial_products(&n, &d, &[c(p1), c(p2)], &c(z_x), &c(z_gx), 2).unwrap();
        assert_eq!(checks.len(), 3);
        assert!(checks.iter().all(|v| v.value().unwrap() == [0, 0]));

        let bad = check_partial_products(&n, &d, &[c(p1), c(p1)], &c(z_x), &c(z_gx), 2).unwrap();
        assert_ne!(bad[1].value().unwrap(), [0, 0]);
        assert!(check_partial_products(&n, &d, &[c(p1)], &c(z_x), &c(z_gx), 2).is_err());
    }
}
