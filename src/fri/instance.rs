//! Which polynomials of which oracle are opened at which point

use crate::goldilocks::native;
use crate::goldilocks::GlExtVar;
use crate::plonk::common_data::CommonData;
use ark_relations::r1cs::SynthesisError;

/// Committed oracles in Merkle-cap order.
pub const CONSTANTS_SIGMAS: usize = 0;
pub const WIRES: usize = 1;
pub const ZS_PARTIAL_PRODUCTS: usize = 2;
pub const QUOTIENT: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FriOracleInfo {
    pub num_polys: usize,
    /// Blinded oracles carry salt after their polynomial values when hiding.
    pub blinding: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FriPolynomialInfo {
    pub oracle_index: usize,
    pub polynomial_index: usize,
}

impl FriPolynomialInfo {
    fn from_range(oracle_index: usize, range: core::ops::Range<usize>) -> Vec<Self> {
        range
            .map(|polynomial_index| FriPolynomialInfo {
                oracle_index,
                polynomial_index,
            })
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct FriBatchInfo {
    pub point: GlExtVar,
    pub polynomials: Vec<FriPolynomialInfo>,
}

#[derive(Clone, Debug)]
pub struct FriInstanceInfo {
    pub oracles: Vec<FriOracleInfo>,
    pub batches: Vec<FriBatchInfo>,
}

impl FriInstanceInfo {
    /// Openings of a PLONK proof: every polynomial at `zeta`, the Zs again at `g·zeta`.
    pub fn for_plonk(common: &CommonData, zeta: &GlExtVar) -> Result<Self, SynthesisError> {
        let num_challenges = common.num_challenges();
        let oracles = vec![
            FriOracleInfo {
                num_polys: common.num_constants + common.config.num_routed_wires,
                blinding: false,
            },
            FriOracleInfo {
                num_polys: common.config.num_wires,
                blinding: true,
            },
            FriOracleInfo {
                num_polys: common.num_zs_partial_products_polys(),
                blinding: true,
            },
            FriOracleInfo {
                num_polys: common.num_quotient_polys(),
                blinding: true,
            },
        ];

        let zeta_polys = oracles
            .iter()
            .enumerate()
            .flat_map(|(i, o)| FriPolynomialInfo::from_range(i, 0..o.num_polys))
            .collect();
        let zeta_batch = FriBatchInfo {
            point: zeta.clone(),
            polynomials: zeta_polys,
        };

        let g = native::primitive_root_of_unity(common.degree_bits());
        let zeta_next_batch = FriBatchInfo {
            point: zeta.mul_const(g)?,
            polynomials: FriPolynomialInfo::from_range(ZS_PARTIAL_PRODUCTS, 0..num_challenges),
        };

        Ok(FriInstanceInfo {
            oracles,
            batches: vec![zeta_batch, zeta_next_batch],
        })
    }
}
