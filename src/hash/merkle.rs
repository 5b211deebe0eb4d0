//! Merkle proofs against a cap
//!
//! A cap of height h is the 2^h nodes h levels below the root. A proof for leaf
//! index `i` carries one sibling per level up to the cap; the remaining high bits of
//! `i` select the cap entry. Sibling order follows the index bit at each level:
//! bit = 1 means the current node is the RIGHT child.

use super::{HashOutVar, NUM_HASH_OUT_ELTS};
use crate::error::Error;
use crate::goldilocks::{select_le, GlVar};
use crate::plonk::proof::HashValue;
use crate::poseidon::{bn254, GlPermutation};
use crate::Fr;
use ark_r1cs_std::{
    alloc::{AllocVar, AllocationMode},
    boolean::Boolean,
    fields::fp::FpVar,
    prelude::*,
    select::CondSelectGadget,
};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

/// Hash family used for Merkle trees and for digests the challenger observes.
pub trait MerkleHasher: Clone {
    type Digest: Clone + core::fmt::Debug + CondSelectGadget<Fr>;
    type NativeDigest: Copy + PartialEq + core::fmt::Debug;

    fn hash_or_noop(&self, inputs: &[GlVar]) -> Result<Self::Digest, SynthesisError>;
    fn two_to_one(
        &self,
        left: &Self::Digest,
        right: &Self::Digest,
    ) -> Result<Self::Digest, SynthesisError>;
    fn enforce_digest_equal(a: &Self::Digest, b: &Self::Digest) -> Result<(), SynthesisError>;
    /// Goldilocks elements a challenger absorbs for this digest.
    fn digest_to_gl(d: &Self::Digest) -> Result<Vec<GlVar>, SynthesisError>;
    fn alloc_digest(
        cs: ConstraintSystemRef<Fr>,
        value: Option<Self::NativeDigest>,
        mode: AllocationMode,
    ) -> Result<Self::Digest, SynthesisError>;
    fn digest_value(d: &Self::Digest) -> Result<Self::NativeDigest, SynthesisError>;

    fn parse_digest(v: &HashValue) -> crate::error::Result<Self::NativeDigest>;
    fn hash_or_noop_native(&self, inputs: &[u64]) -> Self::NativeDigest;
    fn two_to_one_native(
        &self,
        left: Self::NativeDigest,
        right: Self::NativeDigest,
    ) -> Self::NativeDigest;
}

/// Merkle trees hashed with a width-12 Goldilocks permutation.
#[derive(Clone, Copy, Debug, Default)]
pub struct GoldilocksMerkleHasher<P: GlPermutation>(pub P);

impl<P: GlPermutation> MerkleHasher for GoldilocksMerkleHasher<P> {
    type Digest = HashOutVar;
    type NativeDigest = [u64; NUM_HASH_OUT_ELTS];

    fn hash_or_noop(&self, inputs: &[GlVar]) -> Result<HashOutVar, SynthesisError> {
        super::hash_or_noop(&self.0, inputs)
    }

    fn two_to_one(&self, left: &HashOutVar, right: &HashOutVar) -> Result<HashOutVar, SynthesisError> {
        super::two_to_one(&self.0, left, right)
    }

    fn enforce_digest_equal(a: &HashOutVar, b: &HashOutVar) -> Result<(), SynthesisError> {
        a.enforce_equal(b)
    }

    fn digest_to_gl(d: &HashOutVar) -> Result<Vec<GlVar>, SynthesisError> {
        Ok(d.elements.to_vec())
    }

    fn alloc_digest(
        cs: ConstraintSystemRef<Fr>,
        value: Option<Self::NativeDigest>,
        mode: AllocationMode,
    ) -> Result<HashOutVar, SynthesisError> {
        HashOutVar::new_variable(cs, || value.ok_or(SynthesisError::AssignmentMissing), mode)
    }

    fn digest_value(d: &HashOutVar) -> Result<Self::NativeDigest, SynthesisError> {
        d.value()
    }

    fn parse_digest(v: &HashValue) -> crate::error::Result<Self::NativeDigest> {
        match v {
            HashValue::Goldilocks { elements } => Ok(elements.map(|x| x % crate::goldilocks::native::P)),
            HashValue::Bn254(s) => Err(Error::InvalidHash(format!(
                "expected four Goldilocks elements, found field string {s}"
            ))),
        }
    }

    fn hash_or_noop_native(&self, inputs: &[u64]) -> Self::NativeDigest {
        super::hash_or_noop_native(&self.0, inputs)
    }

    fn two_to_one_native(&self, left: Self::NativeDigest, right: Self::NativeDigest) -> Self::NativeDigest {
        super::two_to_one_native(&self.0, left, right)
    }
}

/// Merkle trees hashed with Poseidon over the BN254 scalar field.
#[derive(Clone, Copy, Debug, Default)]
pub struct Bn254MerkleHasher;

impl MerkleHasher for Bn254MerkleHasher {
    type Digest = FpVar<Fr>;
    type NativeDigest = Fr;

    fn hash_or_noop(&self, inputs: &[GlVar]) -> Result<FpVar<Fr>, SynthesisError> {
        bn254::hash_or_noop_var(inputs)
    }

    fn two_to_one(&self, left: &FpVar<Fr>, right: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
        bn254::two_to_one_var(left, right)
    }

    fn enforce_digest_equal(a: &FpVar<Fr>, b: &FpVar<Fr>) -> Result<(), SynthesisError> {
        a.enforce_equal(b)
    }

    fn digest_to_gl(d: &FpVar<Fr>) -> Result<Vec<GlVar>, SynthesisError> {
        bn254::digest_to_gl_var(d)
    }

    fn alloc_digest(
        cs: ConstraintSystemRef<Fr>,
        value: Option<Fr>,
        mode: AllocationMode,
    ) -> Result<FpVar<Fr>, SynthesisError> {
        FpVar::new_variable(cs, || value.ok_or(SynthesisError::AssignmentMissing), mode)
    }

    fn digest_value(d: &FpVar<Fr>) -> Result<Fr, SynthesisError> {
        d.value()
    }

    fn parse_digest(v: &HashValue) -> crate::error::Result<Fr> {
        use core::str::FromStr;
        match v {
            HashValue::Bn254(s) => {
                Fr::from_str(s).map_err(|_| Error::InvalidHash(format!("not a BN254 field element: {s}")))
            }
            HashValue::Goldilocks { .. } => Err(Error::InvalidHash(
                "expected a BN254 field string, found Goldilocks elements".into(),
            )),
        }
    }

    fn hash_or_noop_native(&self, inputs: &[u64]) -> Fr {
        bn254::hash_or_noop_native(inputs)
    }

    fn two_to_one_native(&self, left: Fr, right: Fr) -> Fr {
        bn254::two_to_one_native(left, right)
    }
}

/// Verify that `leaf` sits at `leaf_index_bits` under `cap`.
///
/// The low `siblings.len()` bits order each compression; the remaining bits select the
/// cap entry, so `cap.len()` must equal `2^(bits - siblings)`.
pub fn verify_merkle_proof_to_cap<H: MerkleHasher>(
    hasher: &H,
    leaf: &[GlVar],
    leaf_index_bits: &[Boolean<Fr>],
    cap: &[H::Digest],
    siblings: &[H::Digest],
) -> Result<(), SynthesisError> {
    if siblings.len() > leaf_index_bits.len() {
        tracing::error!(
            siblings = siblings.len(),
            bits = leaf_index_bits.len(),
            "Merkle path longer than index"
        );
        return Err(SynthesisError::Unsatisfiable);
    }
    let mut current = hasher.hash_or_noop(leaf)?;
    for (bit, sibling) in leaf_index_bits.iter().zip(siblings.iter()) {
        let left = H::Digest::conditionally_select(bit, sibling, &current)?;
        let right = H::Digest::conditionally_select(bit, &current, sibling)?;
        current = hasher.two_to_one(&left, &right)?;
    }
    let cap_bits = &leaf_index_bits[siblings.len()..];
    let expected = select_le(cap_bits, cap)?;
    H::enforce_digest_equal(&current, &expected)
}

/// Host-side Merkle tree with a cap, used to build fixtures and cross-check gadgets.
#[derive(Clone, Debug)]
pub struct NativeMerkleTree<D> {
    pub leaves: Vec<Vec<u64>>,
    layers: Vec<Vec<D>>,
    pub cap: Vec<D>,
}

impl<D: Copy + PartialEq + core::fmt::Debug> NativeMerkleTree<D> {
    /// `leaves.len()` must be a power of two no smaller than `2^cap_height`.
    pub fn new<H: MerkleHasher<NativeDigest = D>>(
        hasher: &H,
        leaves: Vec<Vec<u64>>,
        cap_height: usize,
    ) -> Self {
        assert!(leaves.len().is_power_of_two());
        assert!(leaves.len() >= 1 << cap_height);
        let mut layers = vec![leaves
            .iter()
            .map(|l| hasher.hash_or_noop_native(l))
            .collect::<Vec<_>>()];
        while layers.last().map(|l| l.len()).unwrap_or(0) > 1 << cap_height {
            let prev = layers.last().map(|l| l.as_slice()).unwrap_or(&[]);
            let next = prev
                .chunks(2)
                .map(|p| hasher.two_to_one_native(p[0], p[1]))
                .collect::<Vec<_>>();
            layers.push(next);
        }
        let cap = layers.last().cloned().unwrap_or_default();
        NativeMerkleTree { leaves, layers, cap }
    }

    pub fn prove(&self, index: usize) -> Vec<D> {
        let mut idx = index;
        let mut siblings = Vec::new();
        for layer in &self.layers[..self.layers.len() - 1] {
            siblings.push(layer[idx ^ 1]);
            idx >>= 1;
        }
        siblings
    }
}
