//! Serde model of plonky2 proof artifacts (JSON)
//!
//! Field elements are plain `u64`, extension elements `[u64; 2]`. Hashes are either
//! `{"elements": [u64; 4]}` (Goldilocks hashers) or a decimal string (BN254 Poseidon).
//! All values are reduced mod p on load.

use crate::error::Result;
use crate::goldilocks::native::{Ext, P};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HashValue {
    Goldilocks { elements: [u64; 4] },
    Bn254(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub siblings: Vec<HashValue>,
}

pub type MerkleCap = Vec<HashValue>;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningSet {
    pub constants: Vec<Ext>,
    pub plonk_sigmas: Vec<Ext>,
    pub wires: Vec<Ext>,
    pub plonk_zs: Vec<Ext>,
    pub plonk_zs_next: Vec<Ext>,
    pub partial_products: Vec<Ext>,
    pub quotient_polys: Vec<Ext>,
    #[serde(default)]
    pub lookup_zs: Vec<Ext>,
    #[serde(default)]
    pub lookup_zs_next: Vec<Ext>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriInitialTreeProof {
    pub evals_proofs: Vec<(Vec<u64>, MerkleProof)>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriQueryStep {
    pub evals: Vec<Ext>,
    pub merkle_proof: MerkleProof,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriQueryRound {
    pub initial_trees_proof: FriInitialTreeProof,
    pub steps: Vec<FriQueryStep>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolynomialCoeffs {
    pub coeffs: Vec<Ext>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriProof {
    pub commit_phase_merkle_caps: Vec<MerkleCap>,
    pub query_round_proofs: Vec<FriQueryRound>,
    pub final_poly: PolynomialCoeffs,
    pub pow_witness: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub wires_cap: MerkleCap,
    pub plonk_zs_partial_products_cap: MerkleCap,
    pub quotient_polys_cap: MerkleCap,
    pub openings: OpeningSet,
    pub opening_proof: FriProof,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofWithPublicInputs {
    pub proof: Proof,
    pub public_inputs: Vec<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierOnlyCircuitData {
    pub constants_sigmas_cap: MerkleCap,
    pub circuit_digest: HashValue,
}

fn canon(v: &mut u64) {
    *v %= P;
}

fn canon_ext(v: &mut [Ext]) {
    for e in v.iter_mut() {
        canon(&mut e[0]);
        canon(&mut e[1]);
    }
}

fn canon_hash(h: &mut HashValue) {
    if let HashValue::Goldilocks { elements } = h {
        elements.iter_mut().for_each(canon);
    }
}

fn canon_cap(cap: &mut [HashValue]) {
    cap.iter_mut().for_each(canon_hash);
}

impl OpeningSet {
    fn canonicalize(&mut self) {
        for v in [
            &mut self.constants,
            &mut self.plonk_sigmas,
            &mut self.wires,
            &mut self.plonk_zs,
            &mut self.plonk_zs_next,
            &mut self.partial_products,
            &mut self.quotient_polys,
            &mut self.lookup_zs,
            &mut self.lookup_zs_next,
        ] {
            canon_ext(v);
        }
    }
}

impl FriProof {
    fn canonicalize(&mut self) {
        for cap in self.commit_phase_merkle_caps.iter_mut() {
            canon_cap(cap);
        }
        for round in self.query_round_proofs.iter_mut() {
            for (evals, proof) in round.initial_trees_proof.evals_proofs.iter_mut() {
                evals.iter_mut().for_each(canon);
                canon_cap(&mut proof.siblings);
            }
            for step in round.steps.iter_mut() {
                canon_ext(&mut step.evals);
                canon_cap(&mut step.merkle_proof.siblings);
            }
        }
        canon_ext(&mut self.final_poly.coeffs);
        canon(&mut self.pow_witness);
    }
}

impl ProofWithPublicInputs {
    pub fn from_json(s: &str) -> Result<Self> {
        let mut p: ProofWithPublicInputs = serde_json::from_str(s)?;
        p.canonicalize();
        Ok(p)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&s)?)
    }

    pub fn canonicalize(&mut self) {
        self.public_inputs.iter_mut().for_each(canon);
        canon_cap(&mut self.proof.wires_cap);
        canon_cap(&mut self.proof.plonk_zs_partial_products_cap);
        canon_cap(&mut self.proof.quotient_polys_cap);
        self.proof.openings.canonicalize();
        self.proof.opening_proof.canonicalize();
    }
}

impl VerifierOnlyCircuitData {
    pub fn from_json(s: &str) -> Result<Self> {
        let mut v: VerifierOnlyCircuitData = serde_json::from_str(s)?;
        canon_cap(&mut v.constants_sigmas_cap);
        canon_hash(&mut v.circuit_digest);
        Ok(v)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&s)?)
    }
}
