//! Real plonky2 proofs, round-tripped through JSON into the crate's artifact model.
#![allow(dead_code)]

use plonky2::field::types::{Field, PrimeField64};
use plonky2::fri::FriConfig;
use plonky2::hash::poseidon::PoseidonHash;
use plonky2::iop::witness::{PartialWitness, WitnessWrite};
use plonky2::plonk::circuit_builder::CircuitBuilder;
use plonky2::plonk::circuit_data::CircuitConfig;
use plonky2::plonk::config::{GenericConfig, Hasher, PoseidonGoldilocksConfig};
use plonky2_r1cs::{CommonData, ProofWithPublicInputs, VerifierOnlyCircuitData};

pub const D: usize = 2;
pub type C = PoseidonGoldilocksConfig;
pub type F = <C as GenericConfig<D>>::F;

pub struct Fixture {
    pub common_json: String,
    pub proof_json: String,
    pub verifier_only_json: String,
    /// Public-input hash as plonky2 computes it.
    pub public_inputs_hash: [u64; 4],
}

impl Fixture {
    pub fn common(&self) -> CommonData {
        CommonData::from_json(&self.common_json).unwrap()
    }

    pub fn proof(&self) -> ProofWithPublicInputs {
        ProofWithPublicInputs::from_json(&self.proof_json).unwrap()
    }

    pub fn verifier_only(&self) -> VerifierOnlyCircuitData {
        VerifierOnlyCircuitData::from_json(&self.verifier_only_json).unwrap()
    }
}

/// Proves that the `steps`-th Fibonacci number starting from (0, 1) is the third public input.
/// A few extension multiplications and a range check pull in more gate types.
pub fn fibonacci(steps: usize) -> Fixture {
    fibonacci_with_config(steps, CircuitConfig::standard_recursion_config())
}

/// Same circuit with one challenge, one FRI query and no grinding, small enough to verify
/// in-circuit during a normal test run.
pub fn small_fibonacci(steps: usize) -> Fixture {
    let standard = CircuitConfig::standard_recursion_config();
    let config = CircuitConfig {
        num_challenges: 1,
        fri_config: FriConfig {
            num_query_rounds: 1,
            proof_of_work_bits: 0,
            ..standard.fri_config.clone()
        },
        ..standard
    };
    fibonacci_with_config(steps, config)
}

pub fn fibonacci_with_config(steps: usize, config: CircuitConfig) -> Fixture {
    let mut builder = CircuitBuilder::<F, D>::new(config);

    let initial_a = builder.add_virtual_target();
    let initial_b = builder.add_virtual_target();
    let mut prev = initial_a;
    let mut cur = initial_b;
    for _ in 0..steps {
        let next = builder.add(prev, cur);
        prev = cur;
        cur = next;
    }
    builder.register_public_input(initial_a);
    builder.register_public_input(initial_b);
    builder.register_public_input(cur);

    let ext = builder.convert_to_ext(cur);
    let squared = builder.mul_extension(ext, ext);
    let cubed = builder.mul_extension(squared, ext);
    let cubed_base = builder.add_extension(cubed, ext);
    builder.register_public_inputs(&cubed_base.0);
    builder.range_check(initial_b, 8);

    let data = builder.build::<C>();
    let mut pw = PartialWitness::new();
    pw.set_target(initial_a, F::ZERO);
    pw.set_target(initial_b, F::ONE);
    let proof = data.prove(pw).unwrap();
    data.verify(proof.clone()).unwrap();

    let public_inputs_hash = PoseidonHash::hash_no_pad(&proof.public_inputs)
        .elements
        .map(|x| x.to_canonical_u64());
    Fixture {
        common_json: serde_json::to_string(&data.common).unwrap(),
        proof_json: serde_json::to_string(&proof).unwrap(),
        verifier_only_json: serde_json::to_string(&data.verifier_only).unwrap(),
        public_inputs_hash,
    }
}
