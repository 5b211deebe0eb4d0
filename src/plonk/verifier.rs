//! PLONK verification of a Plonky2 proof as R1CS constraints

use super::challenges::{get_challenges, ProofChallengesVar};
use super::common_data::CommonData;
use super::proof_var::{ProofWithPublicInputsVar, VerifierDataVar};
use super::vanishing::{eval_vanishing_poly, reduce_with_powers, VanishingInputs};
use crate::fri::{verify_fri_proof, FriInstanceInfo};
use crate::gates::GateKind;
use crate::goldilocks::native;
use crate::hash::{hash_no_pad, HashOutVar, MerkleHasher};
use crate::poseidon::GlPermutation;
use crate::Fr;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

/// Verify `proof` against the circuit described by `common` and `vd`.
///
/// `perm` drives the challenger and the public-input hash, `hasher` the Merkle trees.
pub fn verify_proof<P: GlPermutation, H: MerkleHasher>(
    cs: ConstraintSystemRef<Fr>,
    perm: &P,
    hasher: &H,
    common: &CommonData,
    gates: &[GateKind],
    proof: &ProofWithPublicInputsVar<H>,
    vd: &VerifierDataVar<H>,
) -> Result<(), SynthesisError> {
    let start = cs.num_constraints();
    let public_inputs_hash = hash_no_pad(perm, &proof.public_inputs)?;
    tracing::debug!(
        constraints = cs.num_constraints() - start,
        "public inputs hashed"
    );

    let mark = cs.num_constraints();
    let challenges = get_challenges(perm, &public_inputs_hash, &proof.proof, vd, common)?;
    tracing::debug!(
        constraints = cs.num_constraints() - mark,
        "challenges derived"
    );

    verify_with_challenges(cs.clone(), hasher, common, gates, proof, &public_inputs_hash, &challenges, vd)?;
    tracing::debug!(
        constraints = cs.num_constraints() - start,
        "plonky2 proof verified"
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn verify_with_challenges<H: MerkleHasher>(
    cs: ConstraintSystemRef<Fr>,
    hasher: &H,
    common: &CommonData,
    gates: &[GateKind],
    proof: &ProofWithPublicInputsVar<H>,
    public_inputs_hash: &HashOutVar,
    challenges: &ProofChallengesVar,
    vd: &VerifierDataVar<H>,
) -> Result<(), SynthesisError> {
    let proof = &proof.proof;
    let zeta = &challenges.plonk_zeta;

    let mark = cs.num_constraints();
    let zeta_pow_deg = zeta.exp_power_of_2(common.degree_bits())?;
    let vanishing_polys_zeta = eval_vanishing_poly(
        common,
        gates,
        &VanishingInputs {
            zeta,
            zeta_pow_deg: &zeta_pow_deg,
            openings: &proof.openings,
            public_inputs_hash,
            betas: &challenges.plonk_betas,
            gammas: &challenges.plonk_gammas,
            alphas: &challenges.plonk_alphas,
        },
    )?;

    // vanishing(ζ) = Z_H(ζ)·quotient(ζ), the quotient recombined from its degree-n chunks.
    let z_h_zeta = zeta_pow_deg.add_const(native::neg(1))?;
    for (vanishing, chunk) in vanishing_polys_zeta
        .iter()
        .zip(proof.openings.quotient_polys.chunks(common.quotient_degree_factor))
    {
        let recombined_quotient = reduce_with_powers(chunk, &zeta_pow_deg)?;
        z_h_zeta.mul(&recombined_quotient)?.enforce_equal(vanishing)?;
    }
    tracing::debug!(
        constraints = cs.num_constraints() - mark,
        "vanishing polynomial checked"
    );

    let mark = cs.num_constraints();
    let merkle_caps: [&[H::Digest]; 4] = [
        &vd.constants_sigmas_cap,
        &proof.wires_cap,
        &proof.plonk_zs_partial_products_cap,
        &proof.quotient_polys_cap,
    ];
    let instance = FriInstanceInfo::for_plonk(common, zeta)?;
    verify_fri_proof(
        hasher,
        common,
        &instance,
        &proof.openings.to_fri_openings(),
        &challenges.fri_challenges,
        &merkle_caps,
        &proof.opening_proof,
    )?;
    tracing::debug!(constraints = cs.num_constraints() - mark, "FRI verified");
    Ok(())
}
