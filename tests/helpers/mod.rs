pub mod plonky2_fixture;
