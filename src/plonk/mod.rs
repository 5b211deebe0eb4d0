//! PLONK layer of the inner proof: artifacts, shape checks, challenges and the
//! vanishing-polynomial identity.

pub mod challenges;
pub mod common_data;
pub mod proof;
pub mod proof_var;
pub mod shape;
pub mod vanishing;
pub mod verifier;

pub use common_data::{CommonData, HasherKind, VerifierConfig};
pub use proof::{ProofWithPublicInputs, VerifierOnlyCircuitData};
pub use proof_var::{ProofWithPublicInputsVar, VerifierDataVar};
pub use shape::ProofShape;
pub use verifier::verify_proof;
