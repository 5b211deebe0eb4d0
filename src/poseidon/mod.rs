//! Sponge permutations used by the verifier
//!
//! - `goldilocks`: Plonky2's Poseidon over Goldilocks (width 12, rate 8).
//! - `poseidon2`: Poseidon2 over Goldilocks with the same width and rate.
//! - `bn254`: Poseidon over the BN254 scalar field (width 4, rate 3) for BN254 Merkle trees.

pub mod bn254;
pub mod goldilocks;
pub mod poseidon2;

use crate::goldilocks::{GlExtVar, GlVar};
use ark_relations::r1cs::SynthesisError;

pub use goldilocks::PoseidonGoldilocks;
pub use poseidon2::Poseidon2Goldilocks;

pub const SPONGE_WIDTH: usize = 12;
pub const SPONGE_RATE: usize = 8;

/// Goldilocks arithmetic shared by base-field wires and extension-valued gate openings,
/// so a permutation layer can be evaluated on either.
pub trait GlArith: Clone + Sized {
    fn from_u64(c: u64) -> Self;
    fn add(&self, other: &Self) -> Result<Self, SynthesisError>;
    fn sub(&self, other: &Self) -> Result<Self, SynthesisError>;
    fn mul(&self, other: &Self) -> Result<Self, SynthesisError>;
    fn add_const(&self, c: u64) -> Result<Self, SynthesisError>;
    /// Σ cᵢ·xᵢ with a single reduction.
    fn linear_combination(terms: &[(&Self, u64)]) -> Result<Self, SynthesisError>;

    fn sbox7(&self) -> Result<Self, SynthesisError> {
        let x2 = self.mul(self)?;
        let x3 = x2.mul(self)?;
        let x4 = x2.mul(&x2)?;
        x3.mul(&x4)
    }
}

impl GlArith for GlVar {
    fn from_u64(c: u64) -> Self {
        GlVar::constant(c)
    }
    fn add(&self, other: &Self) -> Result<Self, SynthesisError> {
        GlVar::add(self, other)
    }
    fn sub(&self, other: &Self) -> Result<Self, SynthesisError> {
        GlVar::sub(self, other)
    }
    fn mul(&self, other: &Self) -> Result<Self, SynthesisError> {
        GlVar::mul(self, other)
    }
    fn add_const(&self, c: u64) -> Result<Self, SynthesisError> {
        GlVar::add_const(self, c)
    }
    fn linear_combination(terms: &[(&Self, u64)]) -> Result<Self, SynthesisError> {
        let mut acc = crate::goldilocks::GlAcc::zero();
        for (x, c) in terms {
            acc = acc.add(&x.acc().mul_const(*c));
        }
        acc.reduce()
    }
}

impl GlArith for GlExtVar {
    fn from_u64(c: u64) -> Self {
        GlExtVar::from_base(GlVar::constant(c))
    }
    fn add(&self, other: &Self) -> Result<Self, SynthesisError> {
        GlExtVar::add(self, other)
    }
    fn sub(&self, other: &Self) -> Result<Self, SynthesisError> {
        GlExtVar::sub(self, other)
    }
    fn mul(&self, other: &Self) -> Result<Self, SynthesisError> {
        GlExtVar::mul(self, other)
    }
    fn add_const(&self, c: u64) -> Result<Self, SynthesisError> {
        GlExtVar::add_const(self, c)
    }
    fn linear_combination(terms: &[(&Self, u64)]) -> Result<Self, SynthesisError> {
        let mut acc = crate::goldilocks::GlExtAcc::zero();
        for (x, c) in terms {
            acc = acc.add(&x.acc().mul_const(*c));
        }
        acc.reduce()
    }
}

/// A width-12 permutation over Goldilocks, in-circuit and on the host.
pub trait GlPermutation: Clone {
    /// Panics unless `state.len() == SPONGE_WIDTH`.
    fn permute(&self, state: &[GlVar]) -> Result<Vec<GlVar>, SynthesisError>;

    fn permute_native(&self, state: [u64; SPONGE_WIDTH]) -> [u64; SPONGE_WIDTH];
}

/// Sponge state driven by a `GlPermutation`.
#[derive(Clone, Debug)]
pub struct PermutationState<P: GlPermutation> {
    perm: P,
    state: Vec<GlVar>,
}

impl<P: GlPermutation> PermutationState<P> {
    pub fn new(perm: P) -> Self {
        PermutationState {
            perm,
            state: vec![GlVar::zero(); SPONGE_WIDTH],
        }
    }

    pub fn set(&mut self, index: usize, value: GlVar) {
        self.state[index] = value;
    }

    /// Overwrite `state[start..start + values.len()]`.
    pub fn set_from_slice(&mut self, values: &[GlVar], start: usize) {
        self.state[start..start + values.len()].clone_from_slice(values);
    }

    pub fn permute(&mut self) -> Result<(), SynthesisError> {
        self.state = self.perm.permute(&self.state)?;
        Ok(())
    }

    /// Rate portion of the state.
    pub fn squeeze(&self) -> &[GlVar] {
        &self.state[..SPONGE_RATE]
    }

    pub fn as_slice(&self) -> &[GlVar] {
        &self.state
    }
}
