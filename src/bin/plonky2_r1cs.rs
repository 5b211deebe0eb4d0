use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem, OptimizationGoal};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use plonky2_r1cs::{
    CommonData, Fr, HasherKind, Plonky2VerifierCircuit, ProofWithPublicInputs,
    PublicInputBreakdown, VerifierConfig, VerifierOnlyCircuitData,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Synthesize the R1CS verifier for a Plonky2 proof")]
struct Cli {
    /// Circuit common data (JSON).
    common_data: PathBuf,
    /// Proof with public inputs (JSON).
    proof: PathBuf,
    /// Verifier-only circuit data (JSON).
    verifier_only: PathBuf,
    /// Merkle hasher of the inner proof: poseidon, poseidon2 or bn254.
    #[arg(long, default_value = "bn254")]
    hasher: HasherKind,
    /// Public input groups as `len:bits` pairs, e.g. `8:32,4:64`. Defaults to 64-bit limbs.
    #[arg(long)]
    breakdown: Option<PublicInputBreakdown>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let common = CommonData::from_file(&cli.common_data)
        .with_context(|| format!("loading {}", cli.common_data.display()))?;
    let proof = ProofWithPublicInputs::from_file(&cli.proof)
        .with_context(|| format!("loading {}", cli.proof.display()))?;
    let verifier_only = VerifierOnlyCircuitData::from_file(&cli.verifier_only)
        .with_context(|| format!("loading {}", cli.verifier_only.display()))?;

    let config = VerifierConfig { hasher: cli.hasher };
    let mut circuit = Plonky2VerifierCircuit::new(common, verifier_only, Some(proof), config)?;
    if let Some(breakdown) = cli.breakdown {
        circuit = circuit.with_breakdown(breakdown)?;
    }
    let statement: Vec<Fr> = circuit.public_inputs()?;
    tracing::info!(
        hi = %statement[0],
        lo = %statement[1],
        "public input commitment"
    );

    let cs = ConstraintSystem::<Fr>::new_ref();
    cs.set_optimization_goal(OptimizationGoal::Constraints);
    circuit.generate_constraints(cs.clone())?;
    cs.finalize();

    let satisfied = cs.is_satisfied()?;
    tracing::info!(
        constraints = cs.num_constraints(),
        witnesses = cs.num_witness_variables(),
        instances = cs.num_instance_variables(),
        satisfied,
        "verifier relation synthesized"
    );
    if !satisfied {
        let which = cs.which_is_unsatisfied()?.unwrap_or_default();
        bail!("proof does not verify (first unsatisfied constraint: {which})");
    }
    Ok(())
}
