//! Proof and verifier data allocated in the constraint system
//!
//! Allocation is driven by `ProofShape`, so the same code sizes every array whether
//! or not a concrete proof is supplied. Every Goldilocks element is allocated through
//! `GlVar`, which range-checks it to be canonical.

use super::proof::{MerkleCap, ProofWithPublicInputs, VerifierOnlyCircuitData};
use super::shape::ProofShape;
use crate::goldilocks::native::Ext;
use crate::goldilocks::{GlExtVar, GlVar};
use crate::hash::MerkleHasher;
use crate::Fr;
use ark_r1cs_std::alloc::{AllocVar, AllocationMode};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

#[derive(Clone, Debug)]
pub struct OpeningSetVar {
    pub constants: Vec<GlExtVar>,
    pub plonk_sigmas: Vec<GlExtVar>,
    pub wires: Vec<GlExtVar>,
    pub plonk_zs: Vec<GlExtVar>,
    pub plonk_zs_next: Vec<GlExtVar>,
    pub partial_products: Vec<GlExtVar>,
    pub quotient_polys: Vec<GlExtVar>,
}

impl OpeningSetVar {
    /// Openings grouped by evaluation point: everything at zeta, then the Zs at g·zeta.
    pub fn to_fri_openings(&self) -> [Vec<GlExtVar>; 2] {
        let zeta = [
            &self.constants,
            &self.plonk_sigmas,
            &self.wires,
            &self.plonk_zs,
            &self.partial_products,
            &self.quotient_polys,
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect();
        [zeta, self.plonk_zs_next.clone()]
    }
}

#[derive(Clone)]
pub struct FriQueryStepVar<H: MerkleHasher> {
    pub evals: Vec<GlExtVar>,
    pub siblings: Vec<H::Digest>,
}

#[derive(Clone)]
pub struct FriQueryRoundVar<H: MerkleHasher> {
    /// Leaf values and Merkle siblings for each of the four initial oracles.
    pub initial_trees_proof: Vec<(Vec<GlVar>, Vec<H::Digest>)>,
    pub steps: Vec<FriQueryStepVar<H>>,
}

#[derive(Clone)]
pub struct FriProofVar<H: MerkleHasher> {
    pub commit_phase_merkle_caps: Vec<Vec<H::Digest>>,
    pub query_round_proofs: Vec<FriQueryRoundVar<H>>,
    pub final_poly: Vec<GlExtVar>,
    pub pow_witness: GlVar,
}

#[derive(Clone)]
pub struct ProofVar<H: MerkleHasher> {
    pub wires_cap: Vec<H::Digest>,
    pub plonk_zs_partial_products_cap: Vec<H::Digest>,
    pub quotient_polys_cap: Vec<H::Digest>,
    pub openings: OpeningSetVar,
    pub opening_proof: FriProofVar<H>,
}

#[derive(Clone)]
pub struct ProofWithPublicInputsVar<H: MerkleHasher> {
    pub proof: ProofVar<H>,
    pub public_inputs: Vec<GlVar>,
}

/// Circuit-specific commitments, fixed when the verifier relation is built.
#[derive(Clone)]
pub struct VerifierDataVar<H: MerkleHasher> {
    pub constants_sigmas_cap: Vec<H::Digest>,
    pub circuit_digest: H::Digest,
}

fn alloc_gl_vec(
    cs: &ConstraintSystemRef<Fr>,
    values: Option<&[u64]>,
    len: usize,
) -> Result<Vec<GlVar>, SynthesisError> {
    (0..len)
        .map(|i| {
            GlVar::new_witness(cs.clone(), || {
                values
                    .and_then(|v| v.get(i).copied())
                    .ok_or(SynthesisError::AssignmentMissing)
            })
        })
        .collect()
}

fn alloc_ext_vec(
    cs: &ConstraintSystemRef<Fr>,
    values: Option<&[Ext]>,
    len: usize,
) -> Result<Vec<GlExtVar>, SynthesisError> {
    (0..len)
        .map(|i| {
            GlExtVar::new_witness(cs.clone(), || {
                values
                    .and_then(|v| v.get(i).copied())
                    .ok_or(SynthesisError::AssignmentMissing)
            })
        })
        .collect()
}

fn alloc_digests<H: MerkleHasher>(
    cs: &ConstraintSystemRef<Fr>,
    values: Option<&MerkleCap>,
    len: usize,
    mode: AllocationMode,
) -> Result<Vec<H::Digest>, SynthesisError> {
    (0..len)
        .map(|i| {
            let native = match values.and_then(|v| v.get(i)) {
                Some(h) => Some(H::parse_digest(h)?),
                None => None,
            };
            H::alloc_digest(cs.clone(), native, mode)
        })
        .collect()
}

impl<H: MerkleHasher> ProofWithPublicInputsVar<H> {
    /// Allocate a proof of the given shape as witnesses. `value` is `None` in setup mode.
    pub fn new_witness(
        cs: ConstraintSystemRef<Fr>,
        shape: &ProofShape,
        value: Option<&ProofWithPublicInputs>,
    ) -> Result<Self, SynthesisError> {
        let witness = AllocationMode::Witness;
        let proof = value.map(|p| &p.proof);
        let openings = proof.map(|p| &p.openings);
        let fri = proof.map(|p| &p.opening_proof);

        let public_inputs = alloc_gl_vec(
            &cs,
            value.map(|p| p.public_inputs.as_slice()),
            shape.num_public_inputs,
        )?;

        let wires_cap = alloc_digests::<H>(&cs, proof.map(|p| &p.wires_cap), shape.cap_len, witness)?;
        let plonk_zs_partial_products_cap = alloc_digests::<H>(
            &cs,
            proof.map(|p| &p.plonk_zs_partial_products_cap),
            shape.cap_len,
            witness,
        )?;
        let quotient_polys_cap =
            alloc_digests::<H>(&cs, proof.map(|p| &p.quotient_polys_cap), shape.cap_len, witness)?;

        let openings = OpeningSetVar {
            constants: alloc_ext_vec(
                &cs,
                openings.map(|o| o.constants.as_slice()),
                shape.num_constants,
            )?,
            plonk_sigmas: alloc_ext_vec(
                &cs,
                openings.map(|o| o.plonk_sigmas.as_slice()),
                shape.num_routed_wires,
            )?,
            wires: alloc_ext_vec(&cs, openings.map(|o| o.wires.as_slice()), shape.num_wires)?,
            plonk_zs: alloc_ext_vec(
                &cs,
                openings.map(|o| o.plonk_zs.as_slice()),
                shape.num_challenges,
            )?,
            plonk_zs_next: alloc_ext_vec(
                &cs,
                openings.map(|o| o.plonk_zs_next.as_slice()),
                shape.num_challenges,
            )?,
            partial_products: alloc_ext_vec(
                &cs,
                openings.map(|o| o.partial_products.as_slice()),
                shape.num_partial_products,
            )?,
            quotient_polys: alloc_ext_vec(
                &cs,
                openings.map(|o| o.quotient_polys.as_slice()),
                shape.num_quotient_polys,
            )?,
        };

        let commit_phase_merkle_caps = (0..shape.fri_steps.len())
            .map(|i| {
                alloc_digests::<H>(
                    &cs,
                    fri.and_then(|f| f.commit_phase_merkle_caps.get(i)),
                    shape.cap_len,
                    witness,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut query_round_proofs = Vec::with_capacity(shape.num_query_rounds);
        for r in 0..shape.num_query_rounds {
            let round = fri.and_then(|f| f.query_round_proofs.get(r));
            let mut initial_trees_proof = Vec::with_capacity(shape.initial_leaf_lens.len());
            for (t, &leaf_len) in shape.initial_leaf_lens.iter().enumerate() {
                let tree = round.and_then(|q| q.initial_trees_proof.evals_proofs.get(t));
                let evals = alloc_gl_vec(&cs, tree.map(|(e, _)| e.as_slice()), leaf_len)?;
                let siblings = alloc_digests::<H>(
                    &cs,
                    tree.map(|(_, p)| &p.siblings),
                    shape.initial_path_len,
                    witness,
                )?;
                initial_trees_proof.push((evals, siblings));
            }
            let mut steps = Vec::with_capacity(shape.fri_steps.len());
            for (s, step_shape) in shape.fri_steps.iter().enumerate() {
                let step = round.and_then(|q| q.steps.get(s));
                steps.push(FriQueryStepVar {
                    evals: alloc_ext_vec(
                        &cs,
                        step.map(|st| st.evals.as_slice()),
                        1 << step_shape.arity_bits,
                    )?,
                    siblings: alloc_digests::<H>(
                        &cs,
                        step.map(|st| &st.merkle_proof.siblings),
                        step_shape.path_len,
                        witness,
                    )?,
                });
            }
            query_round_proofs.push(FriQueryRoundVar {
                initial_trees_proof,
                steps,
            });
        }

        let final_poly = alloc_ext_vec(
            &cs,
            fri.map(|f| f.final_poly.coeffs.as_slice()),
            shape.final_poly_len,
        )?;
        let pow_witness = GlVar::new_witness(cs.clone(), || {
            fri.map(|f| f.pow_witness)
                .ok_or(SynthesisError::AssignmentMissing)
        })?;

        Ok(ProofWithPublicInputsVar {
            proof: ProofVar {
                wires_cap,
                plonk_zs_partial_products_cap,
                quotient_polys_cap,
                openings,
                opening_proof: FriProofVar {
                    commit_phase_merkle_caps,
                    query_round_proofs,
                    final_poly,
                    pow_witness,
                },
            },
            public_inputs,
        })
    }
}

impl<H: MerkleHasher> VerifierDataVar<H> {
    /// Verifier data is part of the relation itself, so it is allocated as constants.
    pub fn new_constant(
        cs: ConstraintSystemRef<Fr>,
        shape: &ProofShape,
        vd: &VerifierOnlyCircuitData,
    ) -> Result<Self, SynthesisError> {
        let constants_sigmas_cap = alloc_digests::<H>(
            &cs,
            Some(&vd.constants_sigmas_cap),
            shape.cap_len,
            AllocationMode::Constant,
        )?;
        let circuit_digest = H::alloc_digest(
            cs,
            Some(H::parse_digest(&vd.circuit_digest)?),
            AllocationMode::Constant,
        )?;
        Ok(VerifierDataVar {
            constants_sigmas_cap,
            circuit_digest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Bn254MerkleHasher;
    use crate::plonk::common_data::{tests::sample_common_json, CommonData};
    use ark_relations::r1cs::ConstraintSystem;

    fn shape() -> ProofShape {
        let mut c = CommonData::from_json(&sample_common_json()).unwrap();
        c.k_is = (1..=80).collect();
        c.config.fri_config.num_query_rounds = 2;
        ProofShape::from_common(&c).unwrap()
    }

    #[test]
    fn test_setup_mode_allocation_needs_no_values() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        cs.set_mode(ark_relations::r1cs::SynthesisMode::Setup);
        let shape = shape();
        let p = ProofWithPublicInputsVar::<Bn254MerkleHasher>::new_witness(cs.clone(), &shape, None)
            .unwrap();
        assert_eq!(p.public_inputs.len(), 4);
        assert_eq!(p.proof.openings.wires.len(), 135);
        assert_eq!(p.proof.opening_proof.query_round_proofs.len(), 2);
        let round = &p.proof.opening_proof.query_round_proofs[0];
        assert_eq!(round.initial_trees_proof[0].0.len(), 84);
        assert_eq!(round.steps[1].siblings.len(), 3);
        let [zeta, next] = p.proof.openings.to_fri_openings();
        assert_eq!(zeta.len(), 4 + 80 + 135 + 2 + 18 + 16);
        assert_eq!(next.len(), 2);
    }

    #[test]
    fn test_prove_mode_without_values_is_an_error() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let res = ProofWithPublicInputsVar::<Bn254MerkleHasher>::new_witness(cs, &shape(), None);
        assert!(matches!(res, Err(SynthesisError::AssignmentMissing)));
    }
}
