//! Fiat–Shamir challenges of a proof, in the exact order the prover derived them

use super::common_data::CommonData;
use super::proof_var::{ProofVar, VerifierDataVar};
use crate::challenger::ChallengerVar;
use crate::fri::FriChallengesVar;
use crate::goldilocks::{GlExtVar, GlVar};
use crate::hash::{HashOutVar, MerkleHasher};
use crate::poseidon::GlPermutation;
use ark_relations::r1cs::SynthesisError;

#[derive(Clone, Debug)]
pub struct ProofChallengesVar {
    pub plonk_betas: Vec<GlVar>,
    pub plonk_gammas: Vec<GlVar>,
    pub plonk_alphas: Vec<GlVar>,
    pub plonk_zeta: GlExtVar,
    pub fri_challenges: FriChallengesVar,
}

pub fn get_challenges<P: GlPermutation, H: MerkleHasher>(
    perm: &P,
    public_inputs_hash: &HashOutVar,
    proof: &ProofVar<H>,
    vd: &VerifierDataVar<H>,
    common: &CommonData,
) -> Result<ProofChallengesVar, SynthesisError> {
    let num_challenges = common.num_challenges();
    let mut challenger = ChallengerVar::new(perm.clone());

    challenger.observe_digest::<H>(&vd.circuit_digest)?;
    challenger.observe_hash(public_inputs_hash)?;

    challenger.observe_cap::<H>(&proof.wires_cap)?;
    let plonk_betas = challenger.get_n_challenges(num_challenges)?;
    let plonk_gammas = challenger.get_n_challenges(num_challenges)?;

    challenger.observe_cap::<H>(&proof.plonk_zs_partial_products_cap)?;
    let plonk_alphas = challenger.get_n_challenges(num_challenges)?;

    challenger.observe_cap::<H>(&proof.quotient_polys_cap)?;
    let plonk_zeta = challenger.get_extension_challenge()?;

    for batch in proof.openings.to_fri_openings() {
        challenger.observe_extension_elements(&batch)?;
    }

    // FRI
    let fri = &proof.opening_proof;
    let fri_alpha = challenger.get_extension_challenge()?;
    let mut fri_betas = Vec::with_capacity(fri.commit_phase_merkle_caps.len());
    for cap in &fri.commit_phase_merkle_caps {
        challenger.observe_cap::<H>(cap)?;
        fri_betas.push(challenger.get_extension_challenge()?);
    }
    challenger.observe_extension_elements(&fri.final_poly)?;
    challenger.observe_element(&fri.pow_witness)?;
    let fri_pow_response = challenger.get_challenge()?;

    let lde_bits = common.lde_bits();
    let fri_query_indices = (0..common.fri_config().num_query_rounds)
        .map(|_| {
            let c = challenger.get_challenge()?;
            let mut bits = c.to_bits_le()?;
            bits.truncate(lde_bits);
            Ok(bits)
        })
        .collect::<Result<Vec<_>, SynthesisError>>()?;

    Ok(ProofChallengesVar {
        plonk_betas,
        plonk_gammas,
        plonk_alphas,
        plonk_zeta,
        fri_challenges: FriChallengesVar {
            fri_alpha,
            fri_betas,
            fri_pow_response,
            fri_query_indices,
        },
    })
}
