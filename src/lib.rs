//! Plonky2 proof verification as an R1CS relation over BN254
//!
//! This crate expresses the Plonky2 verifier (Goldilocks field, quadratic extension,
//! Poseidon Fiat-Shamir, PLONK vanishing identity and FRI) as arkworks constraints
//! over the BN254 scalar field, so that a Plonky2 proof can be wrapped by a
//! pairing-based SNARK such as Groth16.
//!
//! Layers, bottom up:
//! - `goldilocks`: emulated Goldilocks arithmetic with deferred modular reduction
//! - `poseidon`, `hash`: width-12 permutations, sponge hashing and Merkle caps
//! - `challenger`: the duplex Fiat-Shamir transcript
//! - `gates`: constraint evaluators for every supported gate
//! - `plonk`, `fri`: proof model, shape checks and the verifier proper
//! - `public_inputs`, `circuit`: the outer statement and `ConstraintSynthesizer`

pub mod challenger;
pub mod circuit;
pub mod error;
pub mod fri;
pub mod gates;
pub mod goldilocks;
pub mod hash;
pub mod plonk;
pub mod poseidon;
pub mod public_inputs;

/// Outer (BN254 scalar) field.
pub type Fr = ark_bn254::Fr;

pub use circuit::Plonky2VerifierCircuit;
pub use error::{Error, Result};
pub use plonk::{CommonData, HasherKind, ProofWithPublicInputs, VerifierConfig, VerifierOnlyCircuitData};
pub use public_inputs::{PublicInputBreakdown, PublicInputGroup};
