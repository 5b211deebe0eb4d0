//! FRI query-round verification
//!
//! For every query the verifier opens all initial oracles at `x = g·ω^rev(index)`,
//! combines the openings into a single DEEP quotient value, then walks the commit
//! phase: each step checks the previous value against the coset evaluations, folds
//! them at `beta` and moves to `x^arity`. The walk ends at the final polynomial.

use super::instance::FriInstanceInfo;
use super::FriChallengesVar;
use crate::goldilocks::native::{self, MULTIPLICATIVE_GROUP_GENERATOR};
use crate::goldilocks::{select_le, GlExtAcc, GlExtVar, GlVar};
use crate::hash::{verify_merkle_proof_to_cap, MerkleHasher};
use crate::plonk::common_data::CommonData;
use crate::plonk::proof_var::{FriProofVar, FriQueryRoundVar};
use crate::Fr;
use ark_r1cs_std::boolean::Boolean;
use ark_relations::r1cs::SynthesisError;

/// `[1, alpha, alpha^2, …, alpha^n]`
fn powers(alpha: &GlExtVar, n: usize) -> Result<Vec<GlExtVar>, SynthesisError> {
    let mut out = Vec::with_capacity(n + 1);
    out.push(GlExtVar::one());
    for i in 0..n {
        let next = out[i].mul(alpha)?;
        out.push(next);
    }
    Ok(out)
}

/// Σ alpha^i·terms[i] over extension terms with one final reduction.
fn reduce_ext(terms: &[GlExtVar], alpha_powers: &[GlExtVar]) -> Result<GlExtVar, SynthesisError> {
    let mut acc = GlExtAcc::zero();
    for (t, a) in terms.iter().zip(alpha_powers) {
        acc = acc.add(&t.acc().mul(&a.acc()));
    }
    acc.reduce()
}

/// Σ alpha^i·terms[i] over base-field terms with one final reduction.
fn reduce_base(terms: &[&GlVar], alpha_powers: &[GlExtVar]) -> Result<GlExtVar, SynthesisError> {
    let mut acc = GlExtAcc::zero();
    for (t, a) in terms.iter().zip(alpha_powers) {
        acc = acc.add(&a.acc().scalar_mul(&t.acc()));
    }
    acc.reduce()
}

fn reverse_index_bits<T: Clone>(v: &[T]) -> Vec<T> {
    let bits = v.len().trailing_zeros() as usize;
    (0..v.len())
        .map(|i| v[native::reverse_bits(i, bits)].clone())
        .collect()
}

/// Enforce that the grinding response has `pow_bits` leading zeros.
pub fn verify_proof_of_work(pow_response: &GlVar, pow_bits: u32) -> Result<(), SynthesisError> {
    if pow_bits == 0 {
        return Ok(());
    }
    pow_response.enforce_fits_in_bits(64 - pow_bits as usize)
}

/// Interpolate the coset evaluations of one folding step and evaluate at `beta`.
///
/// The coset of `x` is `{s·g^i}` with `s = x·g^{-rev(within)}`; `evals` arrive in
/// bit-reversed order.
pub fn compute_evaluation(
    x: &GlVar,
    x_index_within_coset_bits: &[Boolean<Fr>],
    arity_bits: usize,
    evals: &[GlExtVar],
    beta: &GlExtVar,
) -> Result<GlExtVar, SynthesisError> {
    let arity = 1usize << arity_bits;
    debug_assert_eq!(evals.len(), arity);
    let g = native::primitive_root_of_unity(arity_bits);
    let g_inv = native::exp(g, arity as u64 - 1);
    let evals = reverse_index_bits(evals);

    let rev_bits: Vec<Boolean<Fr>> = x_index_within_coset_bits.iter().rev().cloned().collect();
    let coset_start = GlVar::exp_from_bits_const_base(g_inv, &rev_bits)?.mul(x)?;

    // Barycentric form over the subgroup H of order n, at z = beta / s:
    // P(beta) = (z^n - 1)/n · Σ evals[i]·g^i / (z - g^i)
    let z = beta.scalar_mul(&coset_start.inverse()?)?;
    let z_n = z.exp_power_of_2(arity_bits)?;
    let mut sum = GlExtAcc::zero();
    for (e, gi) in evals.iter().zip(native::two_adic_subgroup(arity_bits)) {
        let term = e.mul_const(gi)?.div(&z.add_const(native::neg(gi))?)?;
        sum = sum.add(&term.acc());
    }
    let sum = sum.reduce()?;
    let vanishing = z_n.add_const(native::neg(1))?;
    sum.acc()
        .mul(&vanishing.acc())
        .reduce()?
        .mul_const(native::inv(arity as u64))
}

/// Horner evaluation of the final polynomial at a base-field point.
pub fn eval_final_poly(coeffs: &[GlExtVar], x: &GlVar) -> Result<GlExtVar, SynthesisError> {
    let x = x.acc();
    let mut acc = GlExtVar::zero();
    for c in coeffs.iter().rev() {
        acc = acc.acc().scalar_mul(&x).add(&c.acc()).reduce()?;
    }
    Ok(acc)
}

struct PrecomputedReducedOpenings {
    alpha_powers: Vec<GlExtVar>,
    /// Σ alpha^i·opening[i] per batch.
    reduced_openings: Vec<GlExtVar>,
}

impl PrecomputedReducedOpenings {
    fn new(openings: &[Vec<GlExtVar>], alpha: &GlExtVar) -> Result<Self, SynthesisError> {
        let max_len = openings.iter().map(Vec::len).max().unwrap_or(0);
        let alpha_powers = powers(alpha, max_len)?;
        let reduced_openings = openings
            .iter()
            .map(|batch| reduce_ext(batch, &alpha_powers))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PrecomputedReducedOpenings {
            alpha_powers,
            reduced_openings,
        })
    }
}

/// Σ over batches of (reduced leaf values − reduced openings)/(x − point), each
/// earlier batch shifted by alpha^len of the later one.
fn combine_initial<H: MerkleHasher>(
    instance: &FriInstanceInfo,
    round: &FriQueryRoundVar<H>,
    subgroup_x: &GlVar,
    precomputed: &PrecomputedReducedOpenings,
) -> Result<GlExtVar, SynthesisError> {
    let alpha_powers = &precomputed.alpha_powers;
    let mut sum = GlExtVar::zero();
    for (i, (batch, reduced_openings)) in instance
        .batches
        .iter()
        .zip(&precomputed.reduced_openings)
        .enumerate()
    {
        let evals: Vec<&GlVar> = batch
            .polynomials
            .iter()
            .map(|p| &round.initial_trees_proof[p.oracle_index].0[p.polynomial_index])
            .collect();
        let reduced_evals = reduce_base(&evals, alpha_powers)?;
        let numerator = reduced_evals.sub(reduced_openings)?;
        let denominator = GlExtVar::from_base(subgroup_x.clone()).sub(&batch.point)?;
        let quotient = numerator.div(&denominator)?;
        sum = if i == 0 {
            quotient
        } else {
            sum.acc()
                .mul(&alpha_powers[evals.len()].acc())
                .add(&quotient.acc())
                .reduce()?
        };
    }
    Ok(sum)
}

#[allow(clippy::too_many_arguments)]
fn verify_query_round<H: MerkleHasher>(
    hasher: &H,
    common: &CommonData,
    instance: &FriInstanceInfo,
    challenges: &FriChallengesVar,
    precomputed: &PrecomputedReducedOpenings,
    initial_merkle_caps: &[&[H::Digest]],
    proof: &FriProofVar<H>,
    x_index_bits: &[Boolean<Fr>],
    round: &FriQueryRoundVar<H>,
) -> Result<(), SynthesisError> {
    for ((evals, siblings), cap) in round.initial_trees_proof.iter().zip(initial_merkle_caps) {
        verify_merkle_proof_to_cap(hasher, evals, x_index_bits, cap, siblings)?;
    }

    let omega = native::primitive_root_of_unity(x_index_bits.len());
    let rev_bits: Vec<Boolean<Fr>> = x_index_bits.iter().rev().cloned().collect();
    let subgroup_x = GlVar::exp_from_bits_const_base(omega, &rev_bits)?
        .mul_const(MULTIPLICATIVE_GROUP_GENERATOR)?;

    let mut old_eval = combine_initial(instance, round, &subgroup_x, precomputed)?;
    let mut x = subgroup_x;
    let mut index_bits = x_index_bits.to_vec();

    for (i, &arity_bits) in common.fri_params.reduction_arity_bits.iter().enumerate() {
        let step = &round.steps[i];
        let coset_index_bits = index_bits[arity_bits..].to_vec();
        let within = &index_bits[..arity_bits];

        select_le(within, &step.evals)?.enforce_equal(&old_eval)?;
        old_eval = compute_evaluation(&x, within, arity_bits, &step.evals, &challenges.fri_betas[i])?;

        let leaf: Vec<GlVar> = step.evals.iter().flat_map(|e| e.to_base_array()).collect();
        verify_merkle_proof_to_cap(
            hasher,
            &leaf,
            &coset_index_bits,
            &proof.commit_phase_merkle_caps[i],
            &step.siblings,
        )?;

        x = x.exp_power_of_2(arity_bits)?;
        index_bits = coset_index_bits;
    }

    eval_final_poly(&proof.final_poly, &x)?.enforce_equal(&old_eval)
}

/// Verify a FRI proof for `instance`. `openings` holds the claimed values per batch,
/// in the same order as `instance.batches`.
pub fn verify_fri_proof<H: MerkleHasher>(
    hasher: &H,
    common: &CommonData,
    instance: &FriInstanceInfo,
    openings: &[Vec<GlExtVar>],
    challenges: &FriChallengesVar,
    initial_merkle_caps: &[&[H::Digest]],
    proof: &FriProofVar<H>,
) -> Result<(), SynthesisError> {
    if openings.len() != instance.batches.len()
        || initial_merkle_caps.len() != instance.oracles.len()
        || proof.query_round_proofs.len() != challenges.fri_query_indices.len()
    {
        tracing::error!("FRI instance, openings and proof disagree in size");
        return Err(SynthesisError::Unsatisfiable);
    }

    verify_proof_of_work(
        &challenges.fri_pow_response,
        common.fri_config().proof_of_work_bits,
    )?;

    let precomputed = PrecomputedReducedOpenings::new(openings, &challenges.fri_alpha)?;

    for (round, x_index_bits) in proof
        .query_round_proofs
        .iter()
        .zip(&challenges.fri_query_indices)
    {
        verify_query_round(
            hasher,
            common,
            instance,
            challenges,
            &precomputed,
            initial_merkle_caps,
            proof,
            x_index_bits,
            round,
        )?;
    }
    Ok(())
}
