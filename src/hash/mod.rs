//! Sponge hashing over Goldilocks and Merkle cap verification

pub mod merkle;

use crate::goldilocks::GlVar;
use crate::poseidon::{GlPermutation, PermutationState, SPONGE_RATE, SPONGE_WIDTH};
use crate::Fr;
use ark_r1cs_std::{
    alloc::{AllocVar, AllocationMode},
    boolean::Boolean,
    select::CondSelectGadget,
};
use ark_relations::r1cs::{Namespace, SynthesisError};
use core::borrow::Borrow;

pub use merkle::{
    verify_merkle_proof_to_cap, Bn254MerkleHasher, GoldilocksMerkleHasher, MerkleHasher,
};

pub const NUM_HASH_OUT_ELTS: usize = 4;

/// Four-element Goldilocks digest.
#[derive(Clone, Debug)]
pub struct HashOutVar {
    pub elements: [GlVar; NUM_HASH_OUT_ELTS],
}

impl HashOutVar {
    pub fn constant(v: [u64; NUM_HASH_OUT_ELTS]) -> Self {
        HashOutVar {
            elements: v.map(GlVar::constant),
        }
    }

    /// Zero-pads inputs shorter than four elements.
    pub fn from_partial(inputs: &[GlVar]) -> Self {
        assert!(inputs.len() <= NUM_HASH_OUT_ELTS);
        HashOutVar {
            elements: core::array::from_fn(|i| inputs.get(i).cloned().unwrap_or_else(GlVar::zero)),
        }
    }

    pub fn value(&self) -> Result<[u64; NUM_HASH_OUT_ELTS], SynthesisError> {
        Ok([
            self.elements[0].value()?,
            self.elements[1].value()?,
            self.elements[2].value()?,
            self.elements[3].value()?,
        ])
    }

    pub fn enforce_equal(&self, other: &HashOutVar) -> Result<(), SynthesisError> {
        for (a, b) in self.elements.iter().zip(other.elements.iter()) {
            a.enforce_equal(b)?;
        }
        Ok(())
    }
}

impl AllocVar<[u64; NUM_HASH_OUT_ELTS], Fr> for HashOutVar {
    fn new_variable<T: Borrow<[u64; NUM_HASH_OUT_ELTS]>>(
        cs: impl Into<Namespace<Fr>>,
        f: impl FnOnce() -> Result<T, SynthesisError>,
        mode: AllocationMode,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        let value = if mode != AllocationMode::Constant && cs.is_in_setup_mode() {
            None
        } else {
            Some(*f()?.borrow())
        };
        let mut elements = Vec::with_capacity(NUM_HASH_OUT_ELTS);
        for i in 0..NUM_HASH_OUT_ELTS {
            elements.push(GlVar::new_variable(
                cs.clone(),
                || value.map(|v| v[i]).ok_or(SynthesisError::AssignmentMissing),
                mode,
            )?);
        }
        Ok(HashOutVar {
            elements: core::array::from_fn(|i| elements[i].clone()),
        })
    }
}

impl CondSelectGadget<Fr> for HashOutVar {
    fn conditionally_select(
        cond: &Boolean<Fr>,
        true_value: &Self,
        false_value: &Self,
    ) -> Result<Self, SynthesisError> {
        let mut elements = Vec::with_capacity(NUM_HASH_OUT_ELTS);
        for (t, f) in true_value.elements.iter().zip(false_value.elements.iter()) {
            elements.push(GlVar::conditionally_select(cond, t, f)?);
        }
        Ok(HashOutVar {
            elements: core::array::from_fn(|i| elements[i].clone()),
        })
    }
}

/// Sponge without padding: overwrite the rate with each 8-element chunk, permute,
/// then read the first four lanes. Empty input hashes to the zero digest.
pub fn hash_no_pad<P: GlPermutation>(perm: &P, inputs: &[GlVar]) -> Result<HashOutVar, SynthesisError> {
    let mut state = PermutationState::new(perm.clone());
    for chunk in inputs.chunks(SPONGE_RATE) {
        state.set_from_slice(chunk, 0);
        state.permute()?;
    }
    Ok(HashOutVar::from_partial(&state.squeeze()[..NUM_HASH_OUT_ELTS]))
}

pub fn hash_or_noop<P: GlPermutation>(
    perm: &P,
    inputs: &[GlVar],
) -> Result<HashOutVar, SynthesisError> {
    if inputs.len() <= NUM_HASH_OUT_ELTS {
        Ok(HashOutVar::from_partial(inputs))
    } else {
        hash_no_pad(perm, inputs)
    }
}

pub fn two_to_one<P: GlPermutation>(
    perm: &P,
    left: &HashOutVar,
    right: &HashOutVar,
) -> Result<HashOutVar, SynthesisError> {
    let inputs: Vec<GlVar> = left
        .elements
        .iter()
        .chain(right.elements.iter())
        .cloned()
        .collect();
    hash_no_pad(perm, &inputs)
}

pub fn hash_no_pad_native<P: GlPermutation>(perm: &P, inputs: &[u64]) -> [u64; NUM_HASH_OUT_ELTS] {
    let mut state = [0u64; SPONGE_WIDTH];
    for chunk in inputs.chunks(SPONGE_RATE) {
        state[..chunk.len()].copy_from_slice(chunk);
        state = perm.permute_native(state);
    }
    [state[0], state[1], state[2], state[3]]
}

pub fn hash_or_noop_native<P: GlPermutation>(perm: &P, inputs: &[u64]) -> [u64; NUM_HASH_OUT_ELTS] {
    if inputs.len() <= NUM_HASH_OUT_ELTS {
        core::array::from_fn(|i| inputs.get(i).copied().unwrap_or(0))
    } else {
        hash_no_pad_native(perm, inputs)
    }
}

pub fn two_to_one_native<P: GlPermutation>(
    perm: &P,
    left: [u64; NUM_HASH_OUT_ELTS],
    right: [u64; NUM_HASH_OUT_ELTS],
) -> [u64; NUM_HASH_OUT_ELTS] {
    let mut inputs = left.to_vec();
    inputs.extend_from_slice(&right);
    hash_no_pad_native(perm, &inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goldilocks::native::P;
    use crate::poseidon::PoseidonGoldilocks;
    use ark_relations::r1cs::ConstraintSystem;
    use plonky2::field::goldilocks_field::GoldilocksField as GF;
    use plonky2::field::types::{Field, PrimeField64};
    use plonky2::hash::hash_types::HashOut;
    use plonky2::hash::poseidon::PoseidonHash;
    use plonky2::plonk::config::Hasher;

    fn gl(v: &[u64]) -> Vec<GF> {
        v.iter().map(|&x| GF::from_canonical_u64(x)).collect()
    }

    fn hash_out_u64(h: HashOut<GF>) -> [u64; 4] {
        h.elements.map(|x| x.to_canonical_u64())
    }

    #[test]
    fn test_native_hashes_match_plonky2() {
        let inputs: Vec<u64> = (0..19).map(|i| (P - 1) - i * 1_000_003).collect();
        for n in [0usize, 3, 4, 5, 8, 9, 19] {
            let expected = hash_out_u64(PoseidonHash::hash_no_pad(&gl(&inputs[..n])));
            assert_eq!(hash_no_pad_native(&PoseidonGoldilocks, &inputs[..n]), expected);
            let expected = hash_out_u64(PoseidonHash::hash_or_noop(&gl(&inputs[..n])));
            assert_eq!(hash_or_noop_native(&PoseidonGoldilocks, &inputs[..n]), expected);
        }
        let l = hash_no_pad_native(&PoseidonGoldilocks, &inputs[..7]);
        let r = hash_no_pad_native(&PoseidonGoldilocks, &inputs[7..]);
        let expected = PoseidonHash::two_to_one(
            HashOut { elements: l.map(GF::from_canonical_u64) },
            HashOut { elements: r.map(GF::from_canonical_u64) },
        );
        assert_eq!(two_to_one_native(&PoseidonGoldilocks, l, r), hash_out_u64(expected));
    }

    #[test]
    fn test_hash_no_pad_gadget() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let inputs: Vec<u64> = (0..10).map(|i| i * 0x1111_2222_3333 % P).collect();
        let vars: Vec<GlVar> = inputs
            .iter()
            .map(|&v| GlVar::new_witness(cs.clone(), || Ok(v)).unwrap())
            .collect();
        let h = hash_no_pad(&PoseidonGoldilocks, &vars).unwrap();
        assert_eq!(h.value().unwrap(), hash_no_pad_native(&PoseidonGoldilocks, &inputs));
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_hash_empty_input_is_zero() {
        let h = hash_no_pad(&PoseidonGoldilocks, &[]).unwrap();
        assert_eq!(h.value().unwrap(), [0; 4]);
    }

    #[test]
    fn test_hash_or_noop_short_input_pads() {
        let h = hash_or_noop(&PoseidonGoldilocks, &[GlVar::constant(5), GlVar::constant(6)]).unwrap();
        assert_eq!(h.value().unwrap(), [5, 6, 0, 0]);
    }
}
