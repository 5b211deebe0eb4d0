//! Poseidon over Fr(BN254), t=4, alpha=5, RF=8, RP=56, with the circom parameter set
//! (the one PoseidonBN128 plonky2 configurations hash with), loaded from `light-poseidon`.
//!
//! Round structure follows `ark_crypto_primitives::sponge::poseidon`, so the native
//! permutation agrees with `PoseidonSponge` on the same config.
//!
//! Goldilocks inputs are packed three limbs per field element (`Σ limb·2^(64k)`) and
//! absorbed by overwriting `state[1..4]`. Digests are `state[0]`.
//!
//! Exposes: POSEIDON_BN254_PARAMS_T4: PoseidonConfig<Fr>

use crate::goldilocks::{native, range, GlVar};
use crate::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_ff::{BigInteger, Field, PrimeField};
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;
use ark_std::{One, Zero};
use light_poseidon::parameters::bn254_x5;
use once_cell::sync::Lazy;

pub const WIDTH: usize = 4;
pub const RATE: usize = 3; // WIDTH - capacity
const CAP: usize = 1;

/// Goldilocks limbs per packed field element.
pub const LIMBS_PER_ELEMENT: usize = 3;
/// Bits per Goldilocks element when a digest is observed by the challenger.
pub const OBSERVE_CHUNK_BITS: usize = 56;
pub const OBSERVE_ELEMENTS: usize = 5;

/// Panics if the circom tables lack a width-4 entry.
pub fn poseidon_bn254_t4() -> PoseidonConfig<Fr> {
    let params = bn254_x5::get_poseidon_parameters::<Fr>(WIDTH as u8)
        .unwrap_or_else(|e| panic!("circom Poseidon parameters for t=4: {e}"));
    assert_eq!(params.width, WIDTH);
    PoseidonConfig {
        full_rounds: params.full_rounds,
        partial_rounds: params.partial_rounds,
        alpha: params.alpha,
        mds: params.mds,
        ark: params.ark.chunks_exact(WIDTH).map(|c| c.to_vec()).collect(),
        rate: RATE,
        capacity: CAP,
    }
}

pub static POSEIDON_BN254_PARAMS_T4: Lazy<PoseidonConfig<Fr>> = Lazy::new(poseidon_bn254_t4);

fn is_full_round(round: usize, cfg: &PoseidonConfig<Fr>) -> bool {
    let half = cfg.full_rounds / 2;
    round < half || round >= half + cfg.partial_rounds
}

pub fn permute_native(mut state: [Fr; WIDTH]) -> [Fr; WIDTH] {
    let cfg = &*POSEIDON_BN254_PARAMS_T4;
    for round in 0..cfg.full_rounds + cfg.partial_rounds {
        for (s, c) in state.iter_mut().zip(cfg.ark[round].iter()) {
            *s += c;
        }
        if is_full_round(round, cfg) {
            for s in state.iter_mut() {
                *s = s.pow([cfg.alpha]);
            }
        } else {
            state[0] = state[0].pow([cfg.alpha]);
        }
        let prev = state;
        for (i, s) in state.iter_mut().enumerate() {
            *s = cfg.mds[i]
                .iter()
                .zip(prev.iter())
                .fold(Fr::zero(), |acc, (m, x)| acc + *m * x);
        }
    }
    state
}

fn sbox_var(x: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    let x2 = x.square()?;
    let x4 = x2.square()?;
    Ok(x4 * x)
}

pub fn permute_var(state: &[FpVar<Fr>]) -> Result<Vec<FpVar<Fr>>, SynthesisError> {
    assert_eq!(state.len(), WIDTH, "BN254 Poseidon state must have width 4");
    let cfg = &*POSEIDON_BN254_PARAMS_T4;
    let mut state = state.to_vec();
    for round in 0..cfg.full_rounds + cfg.partial_rounds {
        for (s, c) in state.iter_mut().zip(cfg.ark[round].iter()) {
            *s += *c;
        }
        if is_full_round(round, cfg) {
            for s in state.iter_mut() {
                *s = sbox_var(s)?;
            }
        } else {
            state[0] = sbox_var(&state[0])?;
        }
        state = cfg
            .mds
            .iter()
            .map(|row| {
                row.iter()
                    .zip(state.iter())
                    .fold(FpVar::zero(), |acc, (m, x)| acc + x * *m)
            })
            .collect();
    }
    Ok(state)
}

/// Sponge state for BN254 Poseidon.
#[derive(Clone, Debug)]
pub struct Bn254PermutationState {
    state: Vec<FpVar<Fr>>,
}

impl Default for Bn254PermutationState {
    fn default() -> Self {
        Bn254PermutationState {
            state: vec![FpVar::zero(); WIDTH],
        }
    }
}

impl Bn254PermutationState {
    pub fn set(&mut self, index: usize, value: FpVar<Fr>) {
        self.state[index] = value;
    }

    pub fn permute(&mut self) -> Result<(), SynthesisError> {
        self.state = permute_var(&self.state)?;
        Ok(())
    }

    pub fn squeeze(&self) -> &[FpVar<Fr>] {
        &self.state[..RATE]
    }
}

fn pack_limbs_var(limbs: &[GlVar]) -> FpVar<Fr> {
    let mut acc = FpVar::zero();
    let mut coeff = Fr::one();
    let shift = Fr::from(1u128 << 64);
    for l in limbs {
        acc += l.fp() * coeff;
        coeff *= shift;
    }
    acc
}

fn pack_limbs_native(limbs: &[u64]) -> Fr {
    let shift = Fr::from(1u128 << 64);
    limbs
        .iter()
        .rev()
        .fold(Fr::zero(), |acc, &l| acc * shift + native::gl_to_fr(l))
}

pub fn hash_no_pad_var(inputs: &[GlVar]) -> Result<FpVar<Fr>, SynthesisError> {
    let mut sponge = Bn254PermutationState::default();
    for chunk in inputs.chunks(RATE * LIMBS_PER_ELEMENT) {
        for (j, limbs) in chunk.chunks(LIMBS_PER_ELEMENT).enumerate() {
            sponge.set(1 + j, pack_limbs_var(limbs));
        }
        sponge.permute()?;
    }
    Ok(sponge.squeeze()[0].clone())
}

/// Inputs of at most three limbs are packed directly instead of hashed.
pub fn hash_or_noop_var(inputs: &[GlVar]) -> Result<FpVar<Fr>, SynthesisError> {
    if inputs.len() <= LIMBS_PER_ELEMENT {
        Ok(pack_limbs_var(inputs))
    } else {
        hash_no_pad_var(inputs)
    }
}

pub fn two_to_one_var(left: &FpVar<Fr>, right: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    let out = permute_var(&[FpVar::zero(), FpVar::zero(), left.clone(), right.clone()])?;
    Ok(out[0].clone())
}

pub fn hash_no_pad_native(inputs: &[u64]) -> Fr {
    let mut state = [Fr::zero(); WIDTH];
    for chunk in inputs.chunks(RATE * LIMBS_PER_ELEMENT) {
        for (j, limbs) in chunk.chunks(LIMBS_PER_ELEMENT).enumerate() {
            state[1 + j] = pack_limbs_native(limbs);
        }
        state = permute_native(state);
    }
    state[0]
}

pub fn hash_or_noop_native(inputs: &[u64]) -> Fr {
    if inputs.len() <= LIMBS_PER_ELEMENT {
        pack_limbs_native(inputs)
    } else {
        hash_no_pad_native(inputs)
    }
}

pub fn two_to_one_native(left: Fr, right: Fr) -> Fr {
    permute_native([Fr::zero(), Fr::zero(), left, right])[0]
}

/// Split a digest into five Goldilocks elements of 56 bits each (canonical bits).
pub fn digest_to_gl_var(d: &FpVar<Fr>) -> Result<Vec<GlVar>, SynthesisError> {
    let bits = d.to_bits_le()?;
    let bits = &bits[..bits.len().min(Fr::MODULUS_BIT_SIZE as usize)];
    Ok(bits
        .chunks(OBSERVE_CHUNK_BITS)
        .map(|c| GlVar(range::bits_to_fp(c)))
        .collect())
}

pub fn digest_to_gl_native(d: Fr) -> Vec<u64> {
    let bits = d.into_bigint().to_bits_le();
    bits[..Fr::MODULUS_BIT_SIZE as usize]
        .chunks(OBSERVE_CHUNK_BITS)
        .map(|c| c.iter().rev().fold(0u64, |acc, &b| (acc << 1) | b as u64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_crypto_primitives::sponge::poseidon::PoseidonSponge;
    use ark_crypto_primitives::sponge::CryptographicSponge;
    use light_poseidon::{Poseidon, PoseidonHasher};
    use ark_r1cs_std::alloc::AllocVar;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn test_params_are_circom_t4() {
        let cfg = &*POSEIDON_BN254_PARAMS_T4;
        assert_eq!((cfg.full_rounds, cfg.partial_rounds, cfg.alpha), (8, 56, 5));
        assert_eq!(cfg.ark.len(), 64);
        assert!(cfg.ark.iter().all(|row| row.len() == WIDTH));
        assert_eq!(cfg.mds.len(), WIDTH);
    }

    #[test]
    fn test_native_permutation_matches_sponge() {
        let (a, b, c) = (Fr::from(123u64), Fr::from(456u64), Fr::from(789u64));
        let mut s = PoseidonSponge::<Fr>::new(&POSEIDON_BN254_PARAMS_T4);
        s.absorb(&vec![a, b, c]);
        let out: Vec<Fr> = s.squeeze_field_elements(1);
        assert_eq!(permute_native([Fr::zero(), a, b, c])[1], out[0]);
    }

    #[test]
    fn test_matches_circom_hash() {
        // circom Poseidon(3) puts a zero domain tag in lane 0 and returns lane 0.
        let mut reference = Poseidon::<Fr>::new_circom(3).unwrap();
        for inputs in [
            [Fr::from(1u64), Fr::from(2u64), Fr::from(3u64)],
            [Fr::zero(), Fr::zero(), Fr::zero()],
            [-Fr::one(), Fr::from(u64::MAX), Fr::from(1u64 << 40)],
        ] {
            let expected = reference.hash(&inputs).unwrap();
            let [a, b, c] = inputs;
            assert_eq!(permute_native([Fr::zero(), a, b, c])[0], expected);
        }
        // two_to_one is the same permutation read at lane 0 with two zero lanes in front.
        let (l, r) = (Fr::from(11u64), Fr::from(22u64));
        let expected = reference.hash(&[Fr::zero(), l, r]).unwrap();
        assert_eq!(two_to_one_native(l, r), expected);
    }

    #[test]
    fn test_gadget_matches_native() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let input = [Fr::from(1u64), Fr::from(2u64), Fr::from(3u64), Fr::from(4u64)];
        let vars: Vec<_> = input
            .iter()
            .map(|v| FpVar::new_witness(cs.clone(), || Ok(*v)).unwrap())
            .collect();
        let out = permute_var(&vars).unwrap();
        let expected = permute_native(input);
        for (o, e) in out.iter().zip(expected.iter()) {
            assert_eq!(o.value().unwrap(), *e);
        }
        assert!(cs.is_satisfied().unwrap());
        eprintln!("bn254 poseidon constraints: {}", cs.num_constraints());
    }

    #[test]
    fn test_hashes_match_native() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let limbs: Vec<u64> = (0..11).map(|i| native::P - 1 - i).collect();
        let vars: Vec<GlVar> = limbs
            .iter()
            .map(|&v| GlVar::new_witness(cs.clone(), || Ok(v)).unwrap())
            .collect();
        assert_eq!(hash_no_pad_var(&vars).unwrap().value().unwrap(), hash_no_pad_native(&limbs));
        assert_eq!(
            hash_or_noop_var(&vars[..2]).unwrap().value().unwrap(),
            hash_or_noop_native(&limbs[..2])
        );
        let l = hash_or_noop_native(&limbs[..4]);
        let r = hash_or_noop_native(&limbs[4..]);
        let lv = FpVar::new_witness(cs.clone(), || Ok(l)).unwrap();
        let rv = FpVar::new_witness(cs.clone(), || Ok(r)).unwrap();
        assert_eq!(two_to_one_var(&lv, &rv).unwrap().value().unwrap(), two_to_one_native(l, r));
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_digest_to_gl_roundtrip_value() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let d = Fr::from(0x0123_4567_89ab_cdefu64) * Fr::from(1u128 << 100) - Fr::from(3u64);
        let dv = FpVar::new_witness(cs.clone(), || Ok(d)).unwrap();
        let elems = digest_to_gl_var(&dv).unwrap();
        assert_eq!(elems.len(), OBSERVE_ELEMENTS);
        let native_elems = digest_to_gl_native(d);
        for (e, n) in elems.iter().zip(native_elems.iter()) {
            assert_eq!(e.value().unwrap(), *n);
            assert!(*n < 1 << OBSERVE_CHUNK_BITS);
        }
        assert!(cs.is_satisfied().unwrap());
    }
}
