//! SHA-256 commitment to the inner public inputs
//!
//! Public inputs are grouped by a breakdown; each input of a group is encoded as
//! `limb_bits / 8` big-endian bytes and the concatenation is hashed. The outer
//! statement is the digest split into two 128-bit halves (high, low).

use crate::error::{Error, Result};
use crate::goldilocks::range::{bits_to_fp, decompose};
use crate::goldilocks::GlVar;
use crate::Fr;
use ark_crypto_primitives::crh::sha256::constraints::Sha256Gadget;
use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*, uint8::UInt8};
use ark_relations::r1cs::SynthesisError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const DIGEST_HALF_BYTES: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInputGroup {
    pub len: usize,
    pub limb_bits: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInputBreakdown {
    pub groups: Vec<PublicInputGroup>,
}

impl PublicInputBreakdown {
    /// Every input as a full 64-bit limb.
    pub fn uniform(num_public_inputs: usize) -> Self {
        PublicInputBreakdown {
            groups: vec![PublicInputGroup {
                len: num_public_inputs,
                limb_bits: 64,
            }],
        }
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validate(&self, num_public_inputs: usize) -> Result<()> {
        if let Some(g) = self
            .groups
            .iter()
            .find(|g| !matches!(g.limb_bits, 8 | 16 | 32 | 64))
        {
            return Err(Error::UnsupportedConfig(format!(
                "public input limb width {} (expected 8, 16, 32 or 64)",
                g.limb_bits
            )));
        }
        if self.len() != num_public_inputs {
            return Err(Error::BreakdownMismatch {
                expected: self.len(),
                actual: num_public_inputs,
            });
        }
        Ok(())
    }

    /// Limb width of each public input, in order.
    pub fn limb_widths(&self) -> impl Iterator<Item = usize> + '_ {
        self.groups
            .iter()
            .flat_map(|g| core::iter::repeat(g.limb_bits).take(g.len))
    }
}

/// `len:bits` pairs separated by commas, e.g. `8:32,4:64`.
impl core::str::FromStr for PublicInputBreakdown {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let groups = s
            .split(',')
            .filter(|g| !g.trim().is_empty())
            .map(|g| {
                let (len, bits) = g
                    .split_once(':')
                    .ok_or_else(|| Error::UnsupportedConfig(format!("breakdown group {g:?}")))?;
                let parse = |v: &str| {
                    v.trim()
                        .parse::<usize>()
                        .map_err(|_| Error::UnsupportedConfig(format!("breakdown group {g:?}")))
                };
                Ok(PublicInputGroup {
                    len: parse(len)?,
                    limb_bits: parse(bits)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(PublicInputBreakdown { groups })
    }
}

/// Big-endian byte encoding of `public_inputs` under `breakdown`.
pub fn encode_native(public_inputs: &[u64], breakdown: &PublicInputBreakdown) -> Result<Vec<u8>> {
    breakdown.validate(public_inputs.len())?;
    let mut out = Vec::new();
    for (index, (&v, limb_bits)) in public_inputs.iter().zip(breakdown.limb_widths()).enumerate() {
        if limb_bits < 64 && v >> limb_bits != 0 {
            return Err(Error::PublicInputRange { index, limb_bits });
        }
        out.extend_from_slice(&v.to_be_bytes()[8 - limb_bits / 8..]);
    }
    Ok(out)
}

/// Outer public inputs `[high, low]` for the given inner public inputs.
pub fn commitment_native(public_inputs: &[u64], breakdown: &PublicInputBreakdown) -> Result<[Fr; 2]> {
    let digest = Sha256::digest(encode_native(public_inputs, breakdown)?);
    Ok([
        Fr::from_be_bytes_mod_order(&digest[..DIGEST_HALF_BYTES]),
        Fr::from_be_bytes_mod_order(&digest[DIGEST_HALF_BYTES..]),
    ])
}

/// Range-check every input to its limb width and emit its bytes, most significant first.
pub fn encode_public_inputs(
    public_inputs: &[GlVar],
    breakdown: &PublicInputBreakdown,
) -> core::result::Result<Vec<UInt8<Fr>>, SynthesisError> {
    breakdown.validate(public_inputs.len())?;
    let mut out = Vec::new();
    for (pi, limb_bits) in public_inputs.iter().zip(breakdown.limb_widths()) {
        let bits = decompose(pi.fp(), limb_bits)?;
        out.extend(bits.chunks(8).rev().map(UInt8::from_bits_le));
    }
    Ok(out)
}

/// Big-endian integer of a byte string.
fn bytes_to_fp(bytes: &[UInt8<Fr>]) -> core::result::Result<FpVar<Fr>, SynthesisError> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for b in bytes.iter().rev() {
        bits.extend(b.to_bits_le()?);
    }
    Ok(bits_to_fp(&bits))
}

/// SHA-256 of the encoded public inputs, as `[high, low]` 128-bit halves.
pub fn commit_public_inputs(
    public_inputs: &[GlVar],
    breakdown: &PublicInputBreakdown,
) -> core::result::Result<[FpVar<Fr>; 2], SynthesisError> {
    let bytes = encode_public_inputs(public_inputs, breakdown)?;
    let digest = Sha256Gadget::<Fr>::digest(&bytes)?;
    let (hi, lo) = digest.0.split_at(DIGEST_HALF_BYTES);
    Ok([bytes_to_fp(hi)?, bytes_to_fp(lo)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;

    fn breakdown() -> PublicInputBreakdown {
        "2:8,1:16,2:32,1:64".parse().unwrap()
    }

    #[test]
    fn test_breakdown_parse_and_validate() {
        let b = breakdown();
        assert_eq!(b.groups.len(), 4);
        assert_eq!(b.len(), 6);
        b.validate(6).unwrap();
        assert!(matches!(
            b.validate(5),
            Err(Error::BreakdownMismatch { expected: 6, actual: 5 })
        ));
        let bad: PublicInputBreakdown = "3:24".parse().unwrap();
        assert!(matches!(bad.validate(3), Err(Error::UnsupportedConfig(_))));
        assert!("3".parse::<PublicInputBreakdown>().is_err());
    }

    #[test]
    fn test_native_encoding_is_big_endian() {
        let bytes = encode_native(&[0xab, 0x1234, 0xdeadbeef], &"1:8,1:16,1:32".parse().unwrap())
            .unwrap();
        assert_eq!(bytes, vec![0xab, 0x12, 0x34, 0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(
            encode_native(&[0x100], &"1:8".parse().unwrap()),
            Err(Error::PublicInputRange { index: 0, limb_bits: 8 })
        ));
    }

    #[test]
    fn test_commitment_gadget_matches_native() {
        let inputs = [0x7f, 0x01, 0xbeef, 0x1234_5678, 0, 0xffff_ffff_0000_0000];
        let b = breakdown();
        let expected = commitment_native(&inputs, &b).unwrap();

        let cs = ConstraintSystem::<Fr>::new_ref();
        let vars: Vec<GlVar> = inputs
            .iter()
            .map(|v| GlVar::new_witness(cs.clone(), || Ok(*v)).unwrap())
            .collect();
        let [hi, lo] = commit_public_inputs(&vars, &b).unwrap();
        assert_eq!(hi.value().unwrap(), expected[0]);
        assert_eq!(lo.value().unwrap(), expected[1]);
        assert!(cs.is_satisfied().unwrap());
        eprintln!("sha256 commitment constraints: {}", cs.num_constraints());
    }

    #[test]
    fn test_oversized_limb_is_unsatisfiable() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let vars: Vec<GlVar> = [0x1ff_u64, 3]
            .iter()
            .map(|v| GlVar::new_witness(cs.clone(), || Ok(*v)).unwrap())
            .collect();
        commit_public_inputs(&vars, &"2:8".parse().unwrap()).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
