//! Plonky2 Poseidon over Goldilocks, width 12
//!
//! Rounds: 4 full, 22 partial, 4 full, x^7 S-box. Partial rounds use the sparse
//! "fast" matrix decomposition so each one costs a single S-box and one dense row.
//! Round constants and matrices are taken from `plonky2` itself.
//!
//! The layers are generic over `GlArith` so the Poseidon gate can evaluate them on
//! extension-valued openings.

use super::{GlArith, GlPermutation, SPONGE_WIDTH};
use crate::goldilocks::GlVar;
use ark_relations::r1cs::SynthesisError;
use plonky2::field::goldilocks_field::GoldilocksField;
use plonky2::field::types::{Field, PrimeField64};
use plonky2::hash::poseidon::{Poseidon, ALL_ROUND_CONSTANTS};

pub const HALF_N_FULL_ROUNDS: usize = 4;
pub const N_PARTIAL_ROUNDS: usize = 22;

type GF = GoldilocksField;

pub(crate) const MDS_MATRIX_CIRC: [u64; SPONGE_WIDTH] = <GF as Poseidon>::MDS_MATRIX_CIRC;
pub(crate) const MDS_MATRIX_DIAG: [u64; SPONGE_WIDTH] = <GF as Poseidon>::MDS_MATRIX_DIAG;
pub(crate) const FAST_PARTIAL_FIRST_ROUND_CONSTANT: [u64; SPONGE_WIDTH] =
    <GF as Poseidon>::FAST_PARTIAL_FIRST_ROUND_CONSTANT;
pub(crate) const FAST_PARTIAL_ROUND_CONSTANTS: [u64; N_PARTIAL_ROUNDS] =
    <GF as Poseidon>::FAST_PARTIAL_ROUND_CONSTANTS;
pub(crate) const FAST_PARTIAL_ROUND_VS: [[u64; SPONGE_WIDTH - 1]; N_PARTIAL_ROUNDS] =
    <GF as Poseidon>::FAST_PARTIAL_ROUND_VS;
pub(crate) const FAST_PARTIAL_ROUND_W_HATS: [[u64; SPONGE_WIDTH - 1]; N_PARTIAL_ROUNDS] =
    <GF as Poseidon>::FAST_PARTIAL_ROUND_W_HATS;
pub(crate) const FAST_PARTIAL_ROUND_INITIAL_MATRIX: [[u64; SPONGE_WIDTH - 1]; SPONGE_WIDTH - 1] =
    <GF as Poseidon>::FAST_PARTIAL_ROUND_INITIAL_MATRIX;

pub(crate) fn round_constant(round_ctr: usize, i: usize) -> u64 {
    ALL_ROUND_CONSTANTS[i + SPONGE_WIDTH * round_ctr]
}

pub(crate) fn constant_layer<T: GlArith>(
    state: &mut [T],
    round_ctr: usize,
) -> Result<(), SynthesisError> {
    for (i, s) in state.iter_mut().enumerate() {
        *s = s.add_const(round_constant(round_ctr, i))?;
    }
    Ok(())
}

pub(crate) fn sbox_layer<T: GlArith>(state: &mut [T]) -> Result<(), SynthesisError> {
    for s in state.iter_mut() {
        *s = s.sbox7()?;
    }
    Ok(())
}

pub(crate) fn mds_row_shf<T: GlArith>(r: usize, v: &[T]) -> Result<T, SynthesisError> {
    let mut terms: Vec<(&T, u64)> = (0..SPONGE_WIDTH)
        .map(|i| (&v[(i + r) % SPONGE_WIDTH], MDS_MATRIX_CIRC[i]))
        .collect();
    terms.push((&v[r], MDS_MATRIX_DIAG[r]));
    T::linear_combination(&terms)
}

pub(crate) fn mds_layer<T: GlArith>(state: &[T]) -> Result<Vec<T>, SynthesisError> {
    (0..SPONGE_WIDTH).map(|r| mds_row_shf(r, state)).collect()
}

pub(crate) fn partial_first_constant_layer<T: GlArith>(
    state: &mut [T],
) -> Result<(), SynthesisError> {
    for (i, s) in state.iter_mut().enumerate() {
        *s = s.add_const(FAST_PARTIAL_FIRST_ROUND_CONSTANT[i])?;
    }
    Ok(())
}

pub(crate) fn mds_partial_layer_init<T: GlArith>(state: &[T]) -> Result<Vec<T>, SynthesisError> {
    let mut result = Vec::with_capacity(SPONGE_WIDTH);
    result.push(state[0].clone());
    for c in 1..SPONGE_WIDTH {
        let terms: Vec<(&T, u64)> = (1..SPONGE_WIDTH)
            .map(|r| (&state[r], FAST_PARTIAL_ROUND_INITIAL_MATRIX[r - 1][c - 1]))
            .collect();
        result.push(T::linear_combination(&terms)?);
    }
    Ok(result)
}

pub(crate) fn mds_partial_layer_fast<T: GlArith>(
    state: &[T],
    r: usize,
) -> Result<Vec<T>, SynthesisError> {
    let mut d_terms: Vec<(&T, u64)> = vec![(&state[0], MDS_MATRIX_CIRC[0] + MDS_MATRIX_DIAG[0])];
    for i in 1..SPONGE_WIDTH {
        d_terms.push((&state[i], FAST_PARTIAL_ROUND_W_HATS[r][i - 1]));
    }
    let mut result = Vec::with_capacity(SPONGE_WIDTH);
    result.push(T::linear_combination(&d_terms)?);
    for i in 1..SPONGE_WIDTH {
        result.push(T::linear_combination(&[
            (&state[0], FAST_PARTIAL_ROUND_VS[r][i - 1]),
            (&state[i], 1),
        ])?);
    }
    Ok(result)
}

fn full_rounds<T: GlArith>(state: &mut Vec<T>, round_ctr: &mut usize) -> Result<(), SynthesisError> {
    for _ in 0..HALF_N_FULL_ROUNDS {
        constant_layer(state, *round_ctr)?;
        sbox_layer(state)?;
        *state = mds_layer(state)?;
        *round_ctr += 1;
    }
    Ok(())
}

fn partial_rounds<T: GlArith>(
    state: &mut Vec<T>,
    round_ctr: &mut usize,
) -> Result<(), SynthesisError> {
    partial_first_constant_layer(state)?;
    *state = mds_partial_layer_init(state)?;
    for i in 0..N_PARTIAL_ROUNDS {
        state[0] = state[0].sbox7()?.add_const(FAST_PARTIAL_ROUND_CONSTANTS[i])?;
        *state = mds_partial_layer_fast(state, i)?;
    }
    *round_ctr += N_PARTIAL_ROUNDS;
    Ok(())
}

/// Full Poseidon permutation over any `GlArith` state of width 12.
pub fn poseidon_permute<T: GlArith>(input: &[T]) -> Result<Vec<T>, SynthesisError> {
    assert_eq!(input.len(), SPONGE_WIDTH, "Poseidon state must have width 12");
    let mut state = input.to_vec();
    let mut round_ctr = 0;
    full_rounds(&mut state, &mut round_ctr)?;
    partial_rounds(&mut state, &mut round_ctr)?;
    full_rounds(&mut state, &mut round_ctr)?;
    debug_assert_eq!(round_ctr, 2 * HALF_N_FULL_ROUNDS + N_PARTIAL_ROUNDS);
    Ok(state)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PoseidonGoldilocks;

impl GlPermutation for PoseidonGoldilocks {
    fn permute(&self, state: &[GlVar]) -> Result<Vec<GlVar>, SynthesisError> {
        poseidon_permute(state)
    }

    fn permute_native(&self, state: [u64; SPONGE_WIDTH]) -> [u64; SPONGE_WIDTH] {
        let input = state.map(GF::from_noncanonical_u64);
        GF::poseidon(input).map(|x| x.to_canonical_u64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goldilocks::native::P;
    use crate::Fr;
    use ark_r1cs_std::alloc::AllocVar;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn test_native_zero_state_known_answer() {
        let out = PoseidonGoldilocks.permute_native([0; SPONGE_WIDTH]);
        assert_eq!(out[0], 0x3c18a9786cb0b359);
        assert_eq!(out[1], 0xc4055e3364a246c3);
    }

    #[test]
    fn test_gadget_matches_plonky2() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let input: [u64; SPONGE_WIDTH] =
            core::array::from_fn(|i| (i as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15) % P);
        let vars: Vec<GlVar> = input
            .iter()
            .map(|&v| GlVar::new_witness(cs.clone(), || Ok(v)).unwrap())
            .collect();
        let out = PoseidonGoldilocks.permute(&vars).unwrap();
        let expected = PoseidonGoldilocks.permute_native(input);
        for (o, e) in out.iter().zip(expected.iter()) {
            assert_eq!(o.value().unwrap(), *e);
        }
        assert!(cs.is_satisfied().unwrap());
        eprintln!("poseidon permutation constraints: {}", cs.num_constraints());
    }

    #[test]
    fn test_constant_input_folds() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let vars = vec![GlVar::zero(); SPONGE_WIDTH];
        let out = PoseidonGoldilocks.permute(&vars).unwrap();
        assert!(out.iter().all(|v| v.is_constant()));
        assert_eq!(out[0].value().unwrap(), 0x3c18a9786cb0b359);
        assert_eq!(cs.num_constraints(), 0);
    }

    #[test]
    fn test_tampered_output_is_unsatisfiable() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let vars: Vec<GlVar> = (0..SPONGE_WIDTH as u64)
            .map(|v| GlVar::new_witness(cs.clone(), || Ok(v)).unwrap())
            .collect();
        let out = PoseidonGoldilocks.permute(&vars).unwrap();
        let wrong = GlVar::new_witness(cs.clone(), || Ok(out[0].value().unwrap() ^ 1)).unwrap();
        out[0].enforce_equal(&wrong).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    #[should_panic(expected = "width 12")]
    fn test_wrong_width_panics() {
        let short: [GlVar; 3] = core::array::from_fn(|_| GlVar::zero());
        let _ = PoseidonGoldilocks.permute(&short);
    }
}
