//! In-circuit Fiat–Shamir challenger
//!
//! Duplex sponge over a width-12 Goldilocks permutation. Observed elements overwrite
//! the rate one at a time; a full rate, or a challenge request with pending input,
//! triggers a permutation whose rate becomes the output buffer. Challenges pop from
//! the end of that buffer, so the sequence matches the prover's challenger exactly.

use crate::goldilocks::{GlExtVar, GlVar};
use crate::hash::{HashOutVar, MerkleHasher};
use crate::poseidon::{GlPermutation, PermutationState, SPONGE_RATE};
use ark_relations::r1cs::SynthesisError;

#[derive(Clone, Debug)]
pub struct ChallengerVar<P: GlPermutation> {
    sponge: PermutationState<P>,
    input_buffer: Vec<GlVar>,
    output_buffer: Vec<GlVar>,
}

impl<P: GlPermutation> ChallengerVar<P> {
    pub fn new(perm: P) -> Self {
        ChallengerVar {
            sponge: PermutationState::new(perm),
            input_buffer: Vec::with_capacity(SPONGE_RATE),
            output_buffer: Vec::with_capacity(SPONGE_RATE),
        }
    }

    pub fn observe_element(&mut self, element: &GlVar) -> Result<(), SynthesisError> {
        // Any buffered output is stale once new input arrives.
        self.output_buffer.clear();
        self.input_buffer.push(element.clone());
        if self.input_buffer.len() == SPONGE_RATE {
            self.duplexing()?;
        }
        Ok(())
    }

    pub fn observe_elements(&mut self, elements: &[GlVar]) -> Result<(), SynthesisError> {
        for e in elements {
            self.observe_element(e)?;
        }
        Ok(())
    }

    pub fn observe_extension_element(&mut self, e: &GlExtVar) -> Result<(), SynthesisError> {
        self.observe_elements(&e.to_base_array())
    }

    pub fn observe_extension_elements(&mut self, es: &[GlExtVar]) -> Result<(), SynthesisError> {
        for e in es {
            self.observe_extension_element(e)?;
        }
        Ok(())
    }

    pub fn observe_hash(&mut self, h: &HashOutVar) -> Result<(), SynthesisError> {
        self.observe_elements(&h.elements)
    }

    /// Observe a Merkle digest through its Goldilocks encoding.
    pub fn observe_digest<H: MerkleHasher>(&mut self, d: &H::Digest) -> Result<(), SynthesisError> {
        self.observe_elements(&H::digest_to_gl(d)?)
    }

    pub fn observe_cap<H: MerkleHasher>(&mut self, cap: &[H::Digest]) -> Result<(), SynthesisError> {
        for d in cap {
            self.observe_digest::<H>(d)?;
        }
        Ok(())
    }

    pub fn get_challenge(&mut self) -> Result<GlVar, SynthesisError> {
        if !self.input_buffer.is_empty() || self.output_buffer.is_empty() {
            self.duplexing()?;
        }
        self.output_buffer.pop().ok_or(SynthesisError::Unsatisfiable)
    }

    pub fn get_n_challenges(&mut self, n: usize) -> Result<Vec<GlVar>, SynthesisError> {
        (0..n).map(|_| self.get_challenge()).collect()
    }

    pub fn get_extension_challenge(&mut self) -> Result<GlExtVar, SynthesisError> {
        let c0 = self.get_challenge()?;
        let c1 = self.get_challenge()?;
        Ok(GlExtVar::new(c0, c1))
    }

    pub fn get_n_extension_challenges(&mut self, n: usize) -> Result<Vec<GlExtVar>, SynthesisError> {
        (0..n).map(|_| self.get_extension_challenge()).collect()
    }

    fn duplexing(&mut self) -> Result<(), SynthesisError> {
        debug_assert!(self.input_buffer.len() <= SPONGE_RATE);
        let inputs = core::mem::take(&mut self.input_buffer);
        self.sponge.set_from_slice(&inputs, 0);
        self.sponge.permute()?;
        self.output_buffer.clear();
        self.output_buffer.extend_from_slice(self.sponge.squeeze());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Bn254MerkleHasher;
    use crate::poseidon::{bn254, Poseidon2Goldilocks, PoseidonGoldilocks};
    use crate::Fr;
    use ark_r1cs_std::alloc::AllocVar;
    use ark_r1cs_std::fields::fp::FpVar;
    use ark_relations::r1cs::ConstraintSystem;
    use plonky2::field::extension::FieldExtension;
    use plonky2::field::goldilocks_field::GoldilocksField as GF;
    use plonky2::field::types::{Field, PrimeField64};
    use plonky2::hash::poseidon::PoseidonHash;
    use plonky2::iop::challenger::Challenger;

    #[test]
    fn test_challenger_matches_plonky2() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let mut native = Challenger::<GF, PoseidonHash>::new();
        let mut var = ChallengerVar::new(PoseidonGoldilocks);

        // Interleave observations of awkward lengths with challenge draws.
        let mut next = 1u64;
        for (observe, draw) in [(3usize, 1usize), (8, 2), (11, 9), (0, 3), (17, 1)] {
            for _ in 0..observe {
                next = next.wrapping_mul(0x9E37_79B9_7F4A_7C15) % crate::goldilocks::native::P;
                native.observe_element(GF::from_canonical_u64(next));
                let v = GlVar::new_witness(cs.clone(), || Ok(next)).unwrap();
                var.observe_element(&v).unwrap();
            }
            for _ in 0..draw {
                let expected = native.get_challenge().to_canonical_u64();
                assert_eq!(var.get_challenge().unwrap().value().unwrap(), expected);
            }
        }
        let expected = native.get_extension_challenge::<2>();
        let got = var.get_extension_challenge().unwrap().value().unwrap();
        let expected: [GF; 2] = expected.to_basefield_array();
        assert_eq!(got, expected.map(|x| x.to_canonical_u64()));
        assert!(cs.is_satisfied().unwrap());
        eprintln!("challenger constraints: {}", cs.num_constraints());
    }

    #[test]
    fn test_challenger_deterministic_across_permutations() {
        let run = |seed: u64| {
            let mut c = ChallengerVar::new(Poseidon2Goldilocks);
            c.observe_element(&GlVar::constant(seed)).unwrap();
            c.get_challenge().unwrap().value().unwrap()
        };
        assert_eq!(run(5), run(5));
        assert_ne!(run(5), run(6));
    }

    #[test]
    fn test_observe_bn254_digest_uses_five_limbs() {
        let d = Fr::from(0x1234_5678_9abc_def0u64) * Fr::from(u64::MAX);
        let mut a = ChallengerVar::new(PoseidonGoldilocks);
        a.observe_digest::<Bn254MerkleHasher>(&FpVar::Constant(d)).unwrap();
        let mut b = ChallengerVar::new(PoseidonGoldilocks);
        let limbs = bn254::digest_to_gl_native(d);
        assert_eq!(limbs.len(), bn254::OBSERVE_ELEMENTS);
        for l in limbs {
            b.observe_element(&GlVar::constant(l)).unwrap();
        }
        assert_eq!(
            a.get_challenge().unwrap().value().unwrap(),
            b.get_challenge().unwrap().value().unwrap()
        );
    }
}
