// src/error.rs

use ark_relations::r1cs::SynthesisError;

#[derive(Debug)]
pub enum Error {
    /// Gate id matched a known family but its parameters did not parse.
    MalformedGate(String),
    UnsupportedGate(String),
    /// Circuit uses lookup arguments (num_lookup_polys != 0).
    LookupsUnsupported,
    UnsupportedConfig(String),
    /// Proof component length differs from what the common data implies.
    ShapeMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },
    InvalidHash(String),
    BreakdownMismatch {
        expected: usize,
        actual: usize,
    },
    /// Public input does not fit the limb width its breakdown group declares.
    PublicInputRange {
        index: usize,
        limb_bits: usize,
    },
    /// Operation needs a proof but the circuit was built for setup only.
    MissingProof,
    Json(serde_json::Error),
}

pub type Result<T> = core::result::Result<T, Error>;

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::MalformedGate(id) => write!(f, "malformed gate id: {id}"),
            Error::UnsupportedGate(id) => write!(f, "unsupported gate: {id}"),
            Error::LookupsUnsupported => write!(f, "lookup arguments are not supported"),
            Error::UnsupportedConfig(msg) => write!(f, "unsupported circuit configuration: {msg}"),
            Error::ShapeMismatch {
                field,
                expected,
                actual,
            } => write!(f, "proof shape mismatch in {field}: expected {expected}, got {actual}"),
            Error::InvalidHash(s) => write!(f, "invalid hash value: {s}"),
            Error::BreakdownMismatch { expected, actual } => write!(
                f,
                "public input breakdown covers {expected} inputs but proof has {actual}"
            ),
            Error::PublicInputRange { index, limb_bits } => {
                write!(f, "public input {index} does not fit in {limb_bits} bits")
            }
            Error::MissingProof => write!(f, "no proof attached to the circuit"),
            Error::Json(e) => write!(f, "json: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

/// Configuration problems discovered during synthesis surface as an unsatisfiable relation.
impl From<Error> for SynthesisError {
    fn from(e: Error) -> Self {
        tracing::error!(error = %e, "configuration rejected during synthesis");
        SynthesisError::Unsatisfiable
    }
}
