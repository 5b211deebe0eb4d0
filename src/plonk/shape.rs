//! Array lengths a proof must have for a given circuit
//!
//! Every in-circuit array is sized from `ProofShape` before any constraint is
//! recorded, so a proof whose lengths disagree is rejected up front as a
//! configuration error instead of surfacing as an index panic during synthesis.

use super::common_data::CommonData;
use super::proof::{FriQueryRound, MerkleCap, ProofWithPublicInputs, VerifierOnlyCircuitData};
use crate::error::{Error, Result};
use crate::gates::GateKind;

/// Lengths of one FRI folding step inside a query round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FriStepShape {
    pub arity_bits: usize,
    /// Merkle siblings from the step leaf up to the cap.
    pub path_len: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofShape {
    pub cap_len: usize,
    pub num_public_inputs: usize,
    pub num_constants: usize,
    pub num_routed_wires: usize,
    pub num_wires: usize,
    pub num_challenges: usize,
    pub num_partial_products: usize,
    pub num_quotient_polys: usize,
    /// Leaf widths of the constants-sigmas, wires, Zs/partial-products and quotient
    /// oracles, salts included.
    pub initial_leaf_lens: [usize; 4],
    pub initial_path_len: usize,
    pub num_query_rounds: usize,
    pub fri_steps: Vec<FriStepShape>,
    pub final_poly_len: usize,
}

fn expect_len(field: impl Into<String>, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::ShapeMismatch {
            field: field.into(),
            expected,
            actual,
        });
    }
    Ok(())
}

impl ProofShape {
    /// Derive the shape and check that the circuit description is self-consistent.
    pub fn from_common(common: &CommonData) -> Result<Self> {
        common.check_supported()?;
        let gates = common.parsed_gates()?;
        check_gates(common, &gates)?;

        let cfg = common.fri_config();
        let lde_bits = common.lde_bits();
        if lde_bits < cfg.cap_height {
            return Err(Error::UnsupportedConfig(format!(
                "cap height {} exceeds LDE bits {lde_bits}",
                cfg.cap_height
            )));
        }
        if common.total_arities() > common.degree_bits() {
            return Err(Error::UnsupportedConfig(
                "FRI reduction arities exceed the degree".into(),
            ));
        }
        let expected_pp = common
            .config
            .num_routed_wires
            .div_ceil(common.quotient_degree_factor)
            .saturating_sub(1);
        expect_len("common_data.num_partial_products", expected_pp, common.num_partial_products)?;

        let mut fri_steps = Vec::with_capacity(common.fri_params.reduction_arity_bits.len());
        let mut bits = lde_bits;
        for &arity_bits in &common.fri_params.reduction_arity_bits {
            bits -= arity_bits;
            if bits < cfg.cap_height {
                return Err(Error::UnsupportedConfig(format!(
                    "FRI step tree of height {bits} is below the cap height {}",
                    cfg.cap_height
                )));
            }
            fri_steps.push(FriStepShape {
                arity_bits,
                path_len: bits - cfg.cap_height,
            });
        }

        let num_challenges = common.num_challenges();
        Ok(ProofShape {
            cap_len: 1 << cfg.cap_height,
            num_public_inputs: common.num_public_inputs,
            num_constants: common.num_constants,
            num_routed_wires: common.config.num_routed_wires,
            num_wires: common.config.num_wires,
            num_challenges,
            num_partial_products: num_challenges * common.num_partial_products,
            num_quotient_polys: common.num_quotient_polys(),
            initial_leaf_lens: [
                common.num_constants + common.config.num_routed_wires,
                common.config.num_wires + common.salt_size(true),
                common.num_zs_partial_products_polys() + common.salt_size(true),
                common.num_quotient_polys() + common.salt_size(true),
            ],
            initial_path_len: lde_bits - cfg.cap_height,
            num_query_rounds: cfg.num_query_rounds,
            fri_steps,
            final_poly_len: common.final_poly_len(),
        })
    }

    pub fn validate_verifier_only(&self, vd: &VerifierOnlyCircuitData) -> Result<()> {
        self.validate_cap("verifier_only.constants_sigmas_cap", &vd.constants_sigmas_cap)
    }

    pub fn validate(&self, p: &ProofWithPublicInputs) -> Result<()> {
        expect_len("public_inputs", self.num_public_inputs, p.public_inputs.len())?;
        let proof = &p.proof;
        self.validate_cap("proof.wires_cap", &proof.wires_cap)?;
        self.validate_cap(
            "proof.plonk_zs_partial_products_cap",
            &proof.plonk_zs_partial_products_cap,
        )?;
        self.validate_cap("proof.quotient_polys_cap", &proof.quotient_polys_cap)?;

        let o = &proof.openings;
        expect_len("openings.constants", self.num_constants, o.constants.len())?;
        expect_len("openings.plonk_sigmas", self.num_routed_wires, o.plonk_sigmas.len())?;
        expect_len("openings.wires", self.num_wires, o.wires.len())?;
        expect_len("openings.plonk_zs", self.num_challenges, o.plonk_zs.len())?;
        expect_len("openings.plonk_zs_next", self.num_challenges, o.plonk_zs_next.len())?;
        expect_len(
            "openings.partial_products",
            self.num_partial_products,
            o.partial_products.len(),
        )?;
        expect_len("openings.quotient_polys", self.num_quotient_polys, o.quotient_polys.len())?;
        expect_len("openings.lookup_zs", 0, o.lookup_zs.len())?;
        expect_len("openings.lookup_zs_next", 0, o.lookup_zs_next.len())?;

        let fri = &proof.opening_proof;
        expect_len(
            "opening_proof.commit_phase_merkle_caps",
            self.fri_steps.len(),
            fri.commit_phase_merkle_caps.len(),
        )?;
        for (i, cap) in fri.commit_phase_merkle_caps.iter().enumerate() {
            self.validate_cap(format!("opening_proof.commit_phase_merkle_caps[{i}]"), cap)?;
        }
        expect_len(
            "opening_proof.query_round_proofs",
            self.num_query_rounds,
            fri.query_round_proofs.len(),
        )?;
        for (i, round) in fri.query_round_proofs.iter().enumerate() {
            self.validate_round(i, round)?;
        }
        expect_len(
            "opening_proof.final_poly",
            self.final_poly_len,
            fri.final_poly.coeffs.len(),
        )
    }

    fn validate_cap(&self, field: impl Into<String>, cap: &MerkleCap) -> Result<()> {
        expect_len(field, self.cap_len, cap.len())
    }

    fn validate_round(&self, i: usize, round: &FriQueryRound) -> Result<()> {
        let prefix = format!("opening_proof.query_round_proofs[{i}]");
        let trees = &round.initial_trees_proof.evals_proofs;
        expect_len(format!("{prefix}.initial_trees_proof"), 4, trees.len())?;
        for (j, (evals, proof)) in trees.iter().enumerate() {
            expect_len(
                format!("{prefix}.initial_trees_proof[{j}].evals"),
                self.initial_leaf_lens[j],
                evals.len(),
            )?;
            expect_len(
                format!("{prefix}.initial_trees_proof[{j}].siblings"),
                self.initial_path_len,
                proof.siblings.len(),
            )?;
        }
        expect_len(format!("{prefix}.steps"), self.fri_steps.len(), round.steps.len())?;
        for (j, (step, shape)) in round.steps.iter().zip(&self.fri_steps).enumerate() {
            expect_len(
                format!("{prefix}.steps[{j}].evals"),
                1 << shape.arity_bits,
                step.evals.len(),
            )?;
            expect_len(
                format!("{prefix}.steps[{j}].siblings"),
                shape.path_len,
                step.merkle_proof.siblings.len(),
            )?;
        }
        Ok(())
    }
}

/// Every gate must fit the row and sit inside its selector group.
fn check_gates(common: &CommonData, gates: &[GateKind]) -> Result<()> {
    let num_selectors = common.selectors_info.num_selectors();
    let free_constants = common
        .num_constants
        .checked_sub(num_selectors + common.num_lookup_selectors)
        .ok_or_else(|| Error::UnsupportedConfig("selectors exceed the constant columns".into()))?;
    let mut max_constraints = 0;
    for (i, kind) in gates.iter().enumerate() {
        let gate = kind.as_gate();
        if gate.num_wires() > common.config.num_wires {
            return Err(Error::UnsupportedConfig(format!(
                "{} needs {} wires, rows have {}",
                gate.id(),
                gate.num_wires(),
                common.config.num_wires
            )));
        }
        if gate.num_constants() > free_constants {
            return Err(Error::UnsupportedConfig(format!(
                "{} needs {} constants, rows have {free_constants}",
                gate.id(),
                gate.num_constants()
            )));
        }
        let group = common.selectors_info.selector_indices[i];
        let in_group = common
            .selectors_info
            .groups
            .get(group)
            .is_some_and(|g| g.contains(&i));
        if !in_group {
            return Err(Error::UnsupportedConfig(format!(
                "gate {i} is outside its selector group {group}"
            )));
        }
        max_constraints = max_constraints.max(gate.num_constraints());
    }
    expect_len(
        "common_data.num_gate_constraints",
        max_constraints,
        common.num_gate_constraints,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plonk::common_data::tests::sample_common_json;

    fn sample() -> CommonData {
        let mut c = CommonData::from_json(&sample_common_json()).unwrap();
        c.k_is = (1..=80).collect();
        c
    }

    #[test]
    fn test_shape_from_sample() {
        let s = ProofShape::from_common(&sample()).unwrap();
        assert_eq!(s.cap_len, 16);
        assert_eq!(s.initial_leaf_lens, [84, 135, 20, 16]);
        assert_eq!(s.initial_path_len, 11);
        assert_eq!(
            s.fri_steps,
            vec![
                FriStepShape { arity_bits: 4, path_len: 7 },
                FriStepShape { arity_bits: 4, path_len: 3 },
            ]
        );
        assert_eq!(s.final_poly_len, 16);
    }

    #[test]
    fn test_shape_rejects_inconsistent_partial_products() {
        let mut c = sample();
        c.num_partial_products = 3;
        assert!(matches!(
            ProofShape::from_common(&c),
            Err(Error::ShapeMismatch { expected: 9, actual: 3, .. })
        ));
    }

    #[test]
    fn test_shape_rejects_oversized_gate() {
        let mut c = sample();
        c.gates[3] = "ArithmeticGate { num_ops: 40 }".into();
        assert!(matches!(
            ProofShape::from_common(&c),
            Err(Error::UnsupportedConfig(_))
        ));
    }

    #[test]
    fn test_shape_rejects_wrong_constraint_count() {
        let mut c = sample();
        c.num_gate_constraints = 21;
        assert!(ProofShape::from_common(&c).is_err());
    }
}
