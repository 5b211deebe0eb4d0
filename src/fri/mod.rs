//! FRI low-degree test over the committed oracles
//!
//! `instance` describes which polynomials are opened at which points, `verifier`
//! checks the query rounds against the Merkle caps.

pub mod instance;
pub mod verifier;

use crate::goldilocks::{GlExtVar, GlVar};
use crate::Fr;
use ark_r1cs_std::boolean::Boolean;

pub use instance::{FriBatchInfo, FriInstanceInfo, FriOracleInfo, FriPolynomialInfo};
pub use verifier::verify_fri_proof;

#[derive(Clone, Debug)]
pub struct FriChallengesVar {
    /// Batching challenge for combining openings.
    pub fri_alpha: GlExtVar,
    /// One folding challenge per commit-phase round.
    pub fri_betas: Vec<GlExtVar>,
    pub fri_pow_response: GlVar,
    /// Little-endian bits of each query index into the LDE domain.
    pub fri_query_indices: Vec<Vec<Boolean<Fr>>>,
}
