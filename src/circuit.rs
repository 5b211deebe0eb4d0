//! Top-level R1CS relation: "this Plonky2 proof verifies, and its public inputs hash
//! to the outer statement".
//!
//! Outer public inputs are the two 128-bit halves of the SHA-256 commitment to the
//! inner public inputs. Everything else (proof, openings, Merkle paths) is witness;
//! the verifier-only data is baked into the relation as constants.

use crate::error::{Error, Result};
use crate::gates::GateKind;
use crate::hash::{Bn254MerkleHasher, GoldilocksMerkleHasher, MerkleHasher};
use crate::plonk::proof::{HashValue, Proof};
use crate::plonk::{
    verify_proof, CommonData, HasherKind, ProofShape, ProofWithPublicInputs,
    ProofWithPublicInputsVar, VerifierConfig, VerifierDataVar, VerifierOnlyCircuitData,
};
use crate::poseidon::{GlPermutation, Poseidon2Goldilocks, PoseidonGoldilocks};
use crate::public_inputs::{commit_public_inputs, commitment_native, PublicInputBreakdown};
use crate::Fr;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

/// Number of outer public inputs.
pub const NUM_OUTER_PUBLIC_INPUTS: usize = 2;

#[derive(Clone, Debug)]
pub struct Plonky2VerifierCircuit {
    pub common: CommonData,
    pub verifier_only: VerifierOnlyCircuitData,
    /// `None` for key generation.
    pub proof: Option<ProofWithPublicInputs>,
    pub config: VerifierConfig,
    pub breakdown: PublicInputBreakdown,
    gates: Vec<GateKind>,
    shape: ProofShape,
}

fn proof_hashes(proof: &Proof) -> impl Iterator<Item = &HashValue> {
    let fri = &proof.opening_proof;
    proof
        .wires_cap
        .iter()
        .chain(&proof.plonk_zs_partial_products_cap)
        .chain(&proof.quotient_polys_cap)
        .chain(fri.commit_phase_merkle_caps.iter().flatten())
        .chain(fri.query_round_proofs.iter().flat_map(|round| {
            round
                .initial_trees_proof
                .evals_proofs
                .iter()
                .flat_map(|(_, p)| &p.siblings)
                .chain(round.steps.iter().flat_map(|s| &s.merkle_proof.siblings))
        }))
}

fn check_hashes<'a, H: MerkleHasher>(hashes: impl IntoIterator<Item = &'a HashValue>) -> Result<()> {
    hashes
        .into_iter()
        .try_for_each(|h| H::parse_digest(h).map(|_| ()))
}

impl Plonky2VerifierCircuit {
    /// Build the relation for `common`/`verifier_only`, optionally with a proof to witness.
    ///
    /// Every array length and hash encoding is checked here, so synthesis only fails on
    /// an invalid proof. Public inputs are committed as 64-bit limbs; see
    /// [`Self::with_breakdown`].
    pub fn new(
        common: CommonData,
        verifier_only: VerifierOnlyCircuitData,
        proof: Option<ProofWithPublicInputs>,
        config: VerifierConfig,
    ) -> Result<Self> {
        let shape = ProofShape::from_common(&common)?;
        let gates = common.parsed_gates()?;
        shape.validate_verifier_only(&verifier_only)?;
        if let Some(p) = &proof {
            shape.validate(p)?;
        }

        let hashes = verifier_only
            .constants_sigmas_cap
            .iter()
            .chain(core::iter::once(&verifier_only.circuit_digest))
            .chain(proof.iter().flat_map(|p| proof_hashes(&p.proof)));
        match config.hasher {
            HasherKind::Poseidon => check_hashes::<GoldilocksMerkleHasher<PoseidonGoldilocks>>(hashes)?,
            HasherKind::Poseidon2 => {
                check_hashes::<GoldilocksMerkleHasher<Poseidon2Goldilocks>>(hashes)?
            }
            HasherKind::PoseidonBn254 => check_hashes::<Bn254MerkleHasher>(hashes)?,
        }

        let breakdown = PublicInputBreakdown::uniform(common.num_public_inputs);
        tracing::debug!(
            gates = gates.len(),
            degree_bits = common.degree_bits(),
            hasher = ?config.hasher,
            with_proof = proof.is_some(),
            "verifier circuit configured"
        );
        Ok(Plonky2VerifierCircuit {
            common,
            verifier_only,
            proof,
            config,
            breakdown,
            gates,
            shape,
        })
    }

    /// Circuit for key generation: same relation, no assignment.
    pub fn setup(
        common: CommonData,
        verifier_only: VerifierOnlyCircuitData,
        config: VerifierConfig,
    ) -> Result<Self> {
        Self::new(common, verifier_only, None, config)
    }

    /// Replace the public input grouping used by the commitment.
    pub fn with_breakdown(mut self, breakdown: PublicInputBreakdown) -> Result<Self> {
        breakdown.validate(self.common.num_public_inputs)?;
        if let Some(p) = &self.proof {
            commitment_native(&p.public_inputs, &breakdown)?;
        }
        self.breakdown = breakdown;
        Ok(self)
    }

    pub fn shape(&self) -> &ProofShape {
        &self.shape
    }

    pub fn gates(&self) -> &[GateKind] {
        &self.gates
    }

    /// Outer statement `[high, low]` for the attached proof.
    pub fn public_inputs(&self) -> Result<Vec<Fr>> {
        let proof = self.proof.as_ref().ok_or(Error::MissingProof)?;
        Ok(commitment_native(&proof.public_inputs, &self.breakdown)?.to_vec())
    }

    fn synthesize<P: GlPermutation, H: MerkleHasher>(
        &self,
        cs: ConstraintSystemRef<Fr>,
        perm: &P,
        hasher: &H,
    ) -> core::result::Result<(), SynthesisError> {
        let statement_values = match &self.proof {
            Some(p) => Some(commitment_native(&p.public_inputs, &self.breakdown)?),
            None => None,
        };
        let statement = (0..NUM_OUTER_PUBLIC_INPUTS)
            .map(|i| {
                FpVar::new_input(cs.clone(), || {
                    statement_values
                        .map(|v| v[i])
                        .ok_or(SynthesisError::AssignmentMissing)
                })
            })
            .collect::<core::result::Result<Vec<_>, _>>()?;

        let vd = VerifierDataVar::<H>::new_constant(cs.clone(), &self.shape, &self.verifier_only)?;
        let proof =
            ProofWithPublicInputsVar::<H>::new_witness(cs.clone(), &self.shape, self.proof.as_ref())?;
        tracing::debug!(
            witnesses = cs.num_witness_variables(),
            "proof allocated"
        );

        let mark = cs.num_constraints();
        let commitment = commit_public_inputs(&proof.public_inputs, &self.breakdown)?;
        for (c, s) in commitment.iter().zip(&statement) {
            c.enforce_equal(s)?;
        }
        tracing::debug!(
            constraints = cs.num_constraints() - mark,
            "public input commitment bound"
        );

        verify_proof(cs.clone(), perm, hasher, &self.common, &self.gates, &proof, &vd)?;
        tracing::debug!(constraints = cs.num_constraints(), "verifier circuit synthesized");
        Ok(())
    }
}

impl ConstraintSynthesizer<Fr> for Plonky2VerifierCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> core::result::Result<(), SynthesisError> {
        match self.config.hasher {
            HasherKind::Poseidon => self.synthesize(
                cs,
                &PoseidonGoldilocks,
                &GoldilocksMerkleHasher(PoseidonGoldilocks),
            ),
            HasherKind::Poseidon2 => self.synthesize(
                cs,
                &Poseidon2Goldilocks,
                &GoldilocksMerkleHasher(Poseidon2Goldilocks),
            ),
            HasherKind::PoseidonBn254 => self.synthesize(cs, &PoseidonGoldilocks, &Bn254MerkleHasher),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plonk::common_data::tests::sample_common_json;
    use ark_relations::r1cs::{ConstraintSystem, SynthesisMode};

    fn sample_vd(hash: HashValue) -> VerifierOnlyCircuitData {
        VerifierOnlyCircuitData {
            constants_sigmas_cap: vec![hash.clone(); 16],
            circuit_digest: hash,
        }
    }

    #[test]
    fn test_rejects_mismatched_hash_encoding() {
        let common = CommonData::from_json(&sample_common_json()).unwrap();
        let gl = HashValue::Goldilocks { elements: [1, 2, 3, 4] };
        let err = Plonky2VerifierCircuit::setup(common.clone(), sample_vd(gl.clone()), VerifierConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHash(_)));

        let config = VerifierConfig { hasher: HasherKind::Poseidon };
        let circuit = Plonky2VerifierCircuit::setup(common, sample_vd(gl), config).unwrap();
        assert!(matches!(circuit.public_inputs(), Err(Error::MissingProof)));
        assert!(matches!(
            circuit.with_breakdown("3:32".parse().unwrap()),
            Err(Error::BreakdownMismatch { expected: 3, actual: 4 })
        ));
    }

    #[test]
    #[ignore = "synthesizes the full verifier for a 2^12 circuit"]
    fn test_setup_mode_synthesis() {
        let common = CommonData::from_json(&sample_common_json()).unwrap();
        let vd = sample_vd(HashValue::Bn254("12345".into()));
        let circuit = Plonky2VerifierCircuit::setup(common, vd, VerifierConfig::default()).unwrap();

        let cs = ConstraintSystem::<Fr>::new_ref();
        cs.set_mode(SynthesisMode::Setup);
        circuit.generate_constraints(cs.clone()).unwrap();
        // The outer statement plus the constant one.
        assert_eq!(cs.num_instance_variables(), NUM_OUTER_PUBLIC_INPUTS + 1);
        eprintln!("verifier constraints (setup): {}", cs.num_constraints());
        assert!(cs.num_constraints() > 0);
    }
}
