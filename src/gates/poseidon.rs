//! Poseidon permutation gate and its standalone MDS gate.
//!
//! Both reuse the generic round layers from `poseidon::goldilocks`, evaluated on
//! extension-valued wire openings.

use super::{booleanity, EvaluationVars, Gate};
use crate::goldilocks::GlExtVar;
use crate::plonk::common_data::D;
use crate::poseidon::goldilocks::{
    constant_layer, mds_layer, mds_partial_layer_fast, mds_partial_layer_init,
    partial_first_constant_layer, sbox_layer, FAST_PARTIAL_ROUND_CONSTANTS, HALF_N_FULL_ROUNDS,
    N_PARTIAL_ROUNDS,
};
use crate::poseidon::{GlArith, SPONGE_WIDTH};
use ark_relations::r1cs::SynthesisError;
use core::ops::Range;

/// One Poseidon permutation per row, with an optional swap of the first two
/// 4-element input chunks (used for Merkle path hashing).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoseidonGate;

impl PoseidonGate {
    pub const WIRE_SWAP: usize = 2 * SPONGE_WIDTH;
    const START_DELTA: usize = 2 * SPONGE_WIDTH + 1;
    const START_FULL_0: usize = Self::START_DELTA + 4;
    const START_PARTIAL: usize = Self::START_FULL_0 + SPONGE_WIDTH * (HALF_N_FULL_ROUNDS - 1);
    const START_FULL_1: usize = Self::START_PARTIAL + N_PARTIAL_ROUNDS;

    pub fn wire_input(i: usize) -> usize {
        i
    }

    pub fn wire_output(i: usize) -> usize {
        SPONGE_WIDTH + i
    }

    /// `swap · (input[i + 4] − input[i])`
    pub fn wire_delta(i: usize) -> usize {
        debug_assert!(i < 4);
        Self::START_DELTA + i
    }

    /// S-box input of full round `round` (≥ 1) in the first half.
    pub fn wire_full_sbox_0(round: usize, i: usize) -> usize {
        debug_assert!(round != 0, "the first round's S-box inputs are not stored");
        Self::START_FULL_0 + SPONGE_WIDTH * (round - 1) + i
    }

    pub fn wire_partial_sbox(round: usize) -> usize {
        Self::START_PARTIAL + round
    }

    pub fn wire_full_sbox_1(round: usize, i: usize) -> usize {
        Self::START_FULL_1 + SPONGE_WIDTH * round + i
    }
}

impl Gate for PoseidonGate {
    fn id(&self) -> String {
        format!("PoseidonGate<WIDTH={SPONGE_WIDTH}>")
    }

    fn num_wires(&self) -> usize {
        Self::START_FULL_1 + SPONGE_WIDTH * HALF_N_FULL_ROUNDS
    }

    fn num_constants(&self) -> usize {
        0
    }

    fn num_constraints(&self) -> usize {
        SPONGE_WIDTH * (2 * HALF_N_FULL_ROUNDS - 1) + N_PARTIAL_ROUNDS + SPONGE_WIDTH + 1 + 4
    }

    fn eval_unfiltered(&self, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        let w = vars.local_wires;
        let mut constraints = Vec::with_capacity(self.num_constraints());

        let swap = &w[Self::WIRE_SWAP];
        constraints.push(booleanity(swap)?);

        for i in 0..4 {
            let lhs = &w[Self::wire_input(i)];
            let rhs = &w[Self::wire_input(i + 4)];
            let delta = &w[Self::wire_delta(i)];
            constraints.push(swap.mul(&rhs.sub(lhs)?)?.sub(delta)?);
        }

        let mut state: Vec<GlExtVar> = (0..SPONGE_WIDTH).map(|i| w[Self::wire_input(i)].clone()).collect();
        for i in 0..4 {
            let delta = &w[Self::wire_delta(i)];
            state[i] = w[Self::wire_input(i)].add(delta)?;
            state[i + 4] = w[Self::wire_input(i + 4)].sub(delta)?;
        }

        let mut round_ctr = 0;
        for r in 0..HALF_N_FULL_ROUNDS {
            constant_layer(&mut state, round_ctr)?;
            if r != 0 {
                for i in 0..SPONGE_WIDTH {
                    let sbox_in = &w[Self::wire_full_sbox_0(r, i)];
                    constraints.push(state[i].sub(sbox_in)?);
                    state[i] = sbox_in.clone();
                }
            }
            sbox_layer(&mut state)?;
            state = mds_layer(&state)?;
            round_ctr += 1;
        }

        partial_first_constant_layer(&mut state)?;
        state = mds_partial_layer_init(&state)?;
        for r in 0..N_PARTIAL_ROUNDS {
            let sbox_in = &w[Self::wire_partial_sbox(r)];
            constraints.push(state[0].sub(sbox_in)?);
            state[0] = sbox_in.sbox7()?;
            if r + 1 < N_PARTIAL_ROUNDS {
                state[0] = state[0].add_const(FAST_PARTIAL_ROUND_CONSTANTS[r])?;
            }
            state = mds_partial_layer_fast(&state, r)?;
        }
        round_ctr += N_PARTIAL_ROUNDS;

        for r in 0..HALF_N_FULL_ROUNDS {
            constant_layer(&mut state, round_ctr)?;
            for i in 0..SPONGE_WIDTH {
                let sbox_in = &w[Self::wire_full_sbox_1(r, i)];
                constraints.push(state[i].sub(sbox_in)?);
                state[i] = sbox_in.clone();
            }
            sbox_layer(&mut state)?;
            state = mds_layer(&state)?;
            round_ctr += 1;
        }

        for i in 0..SPONGE_WIDTH {
            constraints.push(state[i].sub(&w[Self::wire_output(i)])?);
        }
        Ok(constraints)
    }
}

/// The Poseidon MDS layer applied to 12 extension-algebra inputs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoseidonMdsGate;

impl PoseidonMdsGate {
    pub fn wires_input(i: usize) -> Range<usize> {
        i * D..(i + 1) * D
    }

    pub fn wires_output(i: usize) -> Range<usize> {
        (SPONGE_WIDTH + i) * D..(SPONGE_WIDTH + i + 1) * D
    }
}

impl Gate for PoseidonMdsGate {
    fn id(&self) -> String {
        format!("PoseidonMdsGate<WIDTH={SPONGE_WIDTH}>")
    }

    fn num_wires(&self) -> usize {
        2 * D * SPONGE_WIDTH
    }

    fn num_constants(&self) -> usize {
        0
    }

    fn num_constraints(&self) -> usize {
        SPONGE_WIDTH * D
    }

    fn eval_unfiltered(&self, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        let inputs: Vec<_> = (0..SPONGE_WIDTH)
            .map(|i| vars.get_local_ext_algebra(Self::wires_input(i)))
            .collect();
        let outputs: Vec<_> = (0..SPONGE_WIDTH)
            .map(|i| vars.get_local_ext_algebra(Self::wires_output(i)))
            .collect();

        // The matrix has base-field entries, so it acts on each algebra component separately.
        let mut computed = Vec::with_capacity(D);
        for k in 0..D {
            let component: Vec<GlExtVar> = inputs.iter().map(|a| a.0[k].clone()).collect();
            computed.push(mds_layer(&component)?);
        }

        let mut constraints = Vec::with_capacity(self.num_constraints());
        for (i, out) in outputs.iter().enumerate() {
            for k in 0..D {
                constraints.push(out.0[k].sub(&computed[k][i])?);
            }
        }
        Ok(constraints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::tests::{base, eval_on};
    use crate::goldilocks::native::Ext;
    use crate::goldilocks::GlVar;
    use plonky2::field::goldilocks_field::GoldilocksField as GF;
    use plonky2::field::types::{Field, PrimeField64};
    use plonky2::hash::poseidon::Poseidon;

    /// Fills the gate's witness by running the round layers on constants.
    fn poseidon_gate_witness(input: [u64; SPONGE_WIDTH], swap: bool) -> Vec<u64> {
        let gate = PoseidonGate;
        let mut w = vec![0u64; gate.num_wires()];
        w[..SPONGE_WIDTH].copy_from_slice(&input);
        w[PoseidonGate::WIRE_SWAP] = swap as u64;
        let mut state: Vec<GlVar> = input.iter().map(|&x| GlVar::constant(x)).collect();
        for i in 0..4 {
            let delta = if swap {
                crate::goldilocks::native::sub(input[i + 4], input[i])
            } else {
                0
            };
            w[PoseidonGate::wire_delta(i)] = delta;
            state[i] = GlVar::constant(crate::goldilocks::native::add(input[i], delta));
            state[i + 4] = GlVar::constant(crate::goldilocks::native::sub(input[i + 4], delta));
        }
        let swapped: [u64; SPONGE_WIDTH] = core::array::from_fn(|i| state[i].value().unwrap());

        let mut round_ctr = 0;
        for r in 0..HALF_N_FULL_ROUNDS {
            constant_layer(&mut state, round_ctr).unwrap();
            if r != 0 {
                for i in 0..SPONGE_WIDTH {
                    w[PoseidonGate::wire_full_sbox_0(r, i)] = state[i].value().unwrap();
                }
            }
            sbox_layer(&mut state).unwrap();
            state = mds_layer(&state).unwrap();
            round_ctr += 1;
        }
        partial_first_constant_layer(&mut state).unwrap();
        state = mds_partial_layer_init(&state).unwrap();
        for r in 0..N_PARTIAL_ROUNDS {
            w[PoseidonGate::wire_partial_sbox(r)] = state[0].value().unwrap();
            state[0] = state[0].sbox7().unwrap();
            if r + 1 < N_PARTIAL_ROUNDS {
                state[0] = GlArith::add_const(&state[0], FAST_PARTIAL_ROUND_CONSTANTS[r]).unwrap();
            }
            state = mds_partial_layer_fast(&state, r).unwrap();
        }
        round_ctr += N_PARTIAL_ROUNDS;
        for r in 0..HALF_N_FULL_ROUNDS {
            constant_layer(&mut state, round_ctr).unwrap();
            for i in 0..SPONGE_WIDTH {
                w[PoseidonGate::wire_full_sbox_1(r, i)] = state[i].value().unwrap();
            }
            sbox_layer(&mut state).unwrap();
            state = mds_layer(&state).unwrap();
            round_ctr += 1;
        }

        let expected = GF::poseidon(swapped.map(GF::from_canonical_u64));
        for i in 0..SPONGE_WIDTH {
            w[PoseidonGate::wire_output(i)] = expected[i].to_canonical_u64();
        }
        w
    }

    #[test]
    fn test_poseidon_gate_layout() {
        assert_eq!(PoseidonGate.num_wires(), 135);
        assert_eq!(PoseidonGate.num_constraints(), 123);
        assert_eq!(PoseidonMdsGate.num_constraints(), 24);
    }

    #[test]
    fn test_poseidon_gate_satisfied() {
        let input: [u64; SPONGE_WIDTH] = core::array::from_fn(|i| (i as u64 + 1) * 0x0123_4567_89ab);
        for swap in [false, true] {
            let w = poseidon_gate_witness(input, swap);
            let (out, cs) = eval_on(&PoseidonGate, &[], &base(&w));
            assert!(out.iter().all(|c| *c == [0, 0]), "swap = {swap}");
            assert!(cs.is_satisfied().unwrap());
        }
    }

    #[test]
    fn test_poseidon_gate_wrong_output() {
        let input = [7u64; SPONGE_WIDTH];
        let mut w = poseidon_gate_witness(input, false);
        w[PoseidonGate::wire_output(3)] ^= 1;
        let (out, _) = eval_on(&PoseidonGate, &[], &base(&w));
        let nonzero: Vec<usize> = (0..out.len()).filter(|&i| out[i] != [0, 0]).collect();
        assert_eq!(nonzero, vec![123 - SPONGE_WIDTH + 3]);
    }

    #[test]
    fn test_poseidon_mds_gate() {
        let inputs: Vec<Ext> = (0..SPONGE_WIDTH * D).map(|i| [i as u64 * 31 + 1, i as u64]).collect();
        let mut outputs = vec![[0u64; 2]; SPONGE_WIDTH * D];
        for k in 0..D {
            for c in 0..2 {
                let column: [GF; SPONGE_WIDTH] =
                    core::array::from_fn(|i| GF::from_canonical_u64(inputs[i * D + k][c]));
                let mixed = <GF as Poseidon>::mds_layer(&column);
                for i in 0..SPONGE_WIDTH {
                    outputs[i * D + k][c] = mixed[i].to_canonical_u64();
                }
            }
        }
        let wires = [inputs, outputs].concat();
        let (out, cs) = eval_on(&PoseidonMdsGate, &[], &wires);
        assert!(out.iter().all(|c| *c == [0, 0]));
        assert!(cs.is_satisfied().unwrap());
    }
}
