//! Circuit shape description and verifier configuration

use crate::error::{Error, Result};
use crate::gates::GateKind;
use crate::goldilocks::native::P;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;

/// Extension degree of the inner proof. Only quadratic extensions are supported.
pub const D: usize = 2;

/// Random salt elements appended to blinded oracle leaves in zero-knowledge mode.
pub const SALT_SIZE: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriConfig {
    pub rate_bits: usize,
    pub cap_height: usize,
    pub proof_of_work_bits: u32,
    pub num_query_rounds: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitConfig {
    pub num_wires: usize,
    pub num_routed_wires: usize,
    pub num_constants: usize,
    pub num_challenges: usize,
    pub zero_knowledge: bool,
    pub fri_config: FriConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriParams {
    pub hiding: bool,
    pub degree_bits: usize,
    pub reduction_arity_bits: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorsInfo {
    pub selector_indices: Vec<usize>,
    pub groups: Vec<Range<usize>>,
}

impl SelectorsInfo {
    pub fn num_selectors(&self) -> usize {
        self.groups.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonData {
    pub config: CircuitConfig,
    pub fri_params: FriParams,
    pub gates: Vec<String>,
    pub selectors_info: SelectorsInfo,
    pub quotient_degree_factor: usize,
    pub num_gate_constraints: usize,
    pub num_constants: usize,
    pub num_public_inputs: usize,
    pub k_is: Vec<u64>,
    pub num_partial_products: usize,
    #[serde(default)]
    pub num_lookup_polys: usize,
    #[serde(default)]
    pub num_lookup_selectors: usize,
}

impl CommonData {
    pub fn from_json(s: &str) -> Result<Self> {
        let mut c: CommonData = serde_json::from_str(s)?;
        c.k_is.iter_mut().for_each(|k| *k %= P);
        Ok(c)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&s)?)
    }

    /// Reject circuit features the verifier relation does not cover.
    pub fn check_supported(&self) -> Result<()> {
        if self.num_lookup_polys != 0 {
            return Err(Error::LookupsUnsupported);
        }
        if self.fri_params.degree_bits + self.fri_config().rate_bits > 32 {
            return Err(Error::UnsupportedConfig(format!(
                "LDE of 2^{} exceeds the two-adicity of Goldilocks",
                self.fri_params.degree_bits + self.fri_config().rate_bits
            )));
        }
        if self.selectors_info.selector_indices.len() != self.gates.len() {
            return Err(Error::UnsupportedConfig(
                "selector_indices must have one entry per gate".into(),
            ));
        }
        if self.k_is.len() < self.config.num_routed_wires {
            return Err(Error::UnsupportedConfig(
                "k_is must cover every routed wire".into(),
            ));
        }
        if self.quotient_degree_factor == 0 {
            return Err(Error::UnsupportedConfig("quotient_degree_factor is zero".into()));
        }
        Ok(())
    }

    pub fn parsed_gates(&self) -> Result<Vec<GateKind>> {
        self.gates.iter().map(|id| GateKind::parse(id)).collect()
    }

    pub fn fri_config(&self) -> &FriConfig {
        &self.config.fri_config
    }

    pub fn degree_bits(&self) -> usize {
        self.fri_params.degree_bits
    }

    pub fn degree(&self) -> usize {
        1 << self.degree_bits()
    }

    pub fn lde_bits(&self) -> usize {
        self.degree_bits() + self.fri_config().rate_bits
    }

    pub fn num_challenges(&self) -> usize {
        self.config.num_challenges
    }

    /// Salt length carried by a blinded oracle's leaves.
    pub fn salt_size(&self, blinding: bool) -> usize {
        if blinding && self.fri_params.hiding {
            SALT_SIZE
        } else {
            0
        }
    }

    /// Number of polynomials committed in the Zs/partial-products oracle.
    pub fn num_zs_partial_products_polys(&self) -> usize {
        self.num_challenges() * (1 + self.num_partial_products)
    }

    pub fn num_quotient_polys(&self) -> usize {
        self.num_challenges() * self.quotient_degree_factor
    }

    pub fn total_arities(&self) -> usize {
        self.fri_params.reduction_arity_bits.iter().sum()
    }

    pub fn final_poly_len(&self) -> usize {
        1 << (self.degree_bits() - self.total_arities())
    }
}

/// Merkle hasher of the inner proof.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HasherKind {
    Poseidon,
    Poseidon2,
    #[default]
    PoseidonBn254,
}

impl core::str::FromStr for HasherKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "poseidon" => Ok(HasherKind::Poseidon),
            "poseidon2" => Ok(HasherKind::Poseidon2),
            "bn254" | "poseidon_bn254" => Ok(HasherKind::PoseidonBn254),
            other => Err(Error::UnsupportedConfig(format!("unknown hasher {other}"))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    pub hasher: HasherKind,
}
