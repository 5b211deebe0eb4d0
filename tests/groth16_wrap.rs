//! Groth16 over the verifier relation: keys from a proof-less circuit, proof from a real one.

mod helpers;

use ark_bn254::Bn254;
use ark_groth16::Groth16;
use ark_snark::SNARK;
use ark_std::rand::rngs::StdRng;
use ark_std::rand::SeedableRng;
use helpers::plonky2_fixture::small_fibonacci;
use plonky2_r1cs::{Fr, HasherKind, Plonky2VerifierCircuit, VerifierConfig};

#[test]
#[ignore = "Groth16 setup and proving over the full verifier circuit"]
fn test_groth16_wraps_plonky2_proof() {
    let fixture = small_fibonacci(1);
    let config = VerifierConfig {
        hasher: HasherKind::Poseidon,
    };
    let mut rng = StdRng::seed_from_u64(42);

    let setup = Plonky2VerifierCircuit::setup(fixture.common(), fixture.verifier_only(), config)
        .unwrap();
    let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(setup, &mut rng).unwrap();

    let circuit = Plonky2VerifierCircuit::new(
        fixture.common(),
        fixture.verifier_only(),
        Some(fixture.proof()),
        config,
    )
    .unwrap();
    let statement = circuit.public_inputs().unwrap();
    let proof = Groth16::<Bn254>::prove(&pk, circuit, &mut rng).unwrap();

    assert!(Groth16::<Bn254>::verify(&vk, &statement, &proof).unwrap());

    let wrong: Vec<Fr> = vec![statement[0], statement[1] + Fr::from(1u64)];
    assert!(!Groth16::<Bn254>::verify(&vk, &wrong, &proof).unwrap());
}
