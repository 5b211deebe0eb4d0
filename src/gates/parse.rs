//! Gate descriptor parsing.
//!
//! Descriptors are the prover's `Debug` output, e.g. `ArithmeticGate { num_ops: 20 }`,
//! `BaseSumGate { num_limbs: 63 } + Base: 2` or
//! `CosetInterpolationGate { subgroup_bits: 4, degree: 6, barycentric_weights: [..], .. }<D=2>`.

use super::*;
use super::interpolation::canonical_weights;
use crate::error::{Error, Result};
use regex::Regex;

fn malformed(id: &str, why: impl core::fmt::Display) -> Error {
    Error::MalformedGate(format!("{id}: {why}"))
}

fn gate_name(id: &str) -> Result<&str> {
    let end = id
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(id.len());
    if end == 0 {
        return Err(malformed(id, "missing gate name"));
    }
    Ok(&id[..end])
}

fn usize_field(id: &str, name: &str) -> Result<usize> {
    let re = Regex::new(&format!(r"\b{name}: (\d+)")).map_err(|e| malformed(id, e))?;
    let caps = re
        .captures(id)
        .ok_or_else(|| malformed(id, format!("missing `{name}`")))?;
    caps[1].parse().map_err(|e| malformed(id, e))
}

fn u64_list_field(id: &str, name: &str) -> Result<Vec<u64>> {
    let re = Regex::new(&format!(r"\b{name}: \[([^\]]*)\]")).map_err(|e| malformed(id, e))?;
    let caps = re
        .captures(id)
        .ok_or_else(|| malformed(id, format!("missing `{name}`")))?;
    caps[1]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u64>().map_err(|e| malformed(id, e)))
        .collect()
}

fn check_extension_degree(id: &str) -> Result<()> {
    let re = Regex::new(r"<D=(\d+)>").map_err(|e| malformed(id, e))?;
    match re.captures(id) {
        Some(caps) if &caps[1] != "2" => Err(Error::UnsupportedConfig(format!(
            "{id}: only D=2 is supported"
        ))),
        _ => Ok(()),
    }
}

fn check_width(id: &str) -> Result<()> {
    let re = Regex::new(r"<WIDTH=(\d+)>").map_err(|e| malformed(id, e))?;
    match re.captures(id) {
        Some(caps) if &caps[1] != "12" => Err(Error::UnsupportedConfig(format!(
            "{id}: only width-12 Poseidon is supported"
        ))),
        _ => Ok(()),
    }
}

impl GateKind {
    pub fn parse(id: &str) -> Result<GateKind> {
        let id = id.trim();
        check_extension_degree(id)?;
        let gate = match gate_name(id)? {
            "NoopGate" => GateKind::Noop(NoopGate),
            "ConstantGate" => GateKind::Constant(ConstantGate {
                num_consts: usize_field(id, "num_consts")?,
            }),
            "PublicInputGate" => GateKind::PublicInput(PublicInputGate),
            "BaseSumGate" => {
                let re = Regex::new(r"\+ Base: (\d+)").map_err(|e| malformed(id, e))?;
                let base = re
                    .captures(id)
                    .ok_or_else(|| malformed(id, "missing base"))?[1]
                    .parse::<usize>()
                    .map_err(|e| malformed(id, e))?;
                if base < 2 {
                    return Err(malformed(id, "base must be at least 2"));
                }
                GateKind::BaseSum(BaseSumGate {
                    num_limbs: usize_field(id, "num_limbs")?,
                    base,
                })
            }
            "ArithmeticGate" => GateKind::Arithmetic(ArithmeticGate {
                num_ops: usize_field(id, "num_ops")?,
            }),
            "ArithmeticExtensionGate" => GateKind::ArithmeticExtension(ArithmeticExtensionGate {
                num_ops: usize_field(id, "num_ops")?,
            }),
            "MulExtensionGate" => GateKind::MulExtension(MulExtensionGate {
                num_ops: usize_field(id, "num_ops")?,
            }),
            "PoseidonGate" => {
                check_width(id)?;
                GateKind::Poseidon(PoseidonGate)
            }
            "PoseidonMdsGate" => {
                check_width(id)?;
                GateKind::PoseidonMds(PoseidonMdsGate)
            }
            "CosetInterpolationGate" => {
                let subgroup_bits = usize_field(id, "subgroup_bits")?;
                let degree = usize_field(id, "degree")?;
                if degree < 2 || degree > 1 << subgroup_bits {
                    return Err(malformed(id, "degree out of range"));
                }
                let mut gate = CosetInterpolationGate::with_degree(subgroup_bits, degree);
                if id.contains("barycentric_weights") {
                    let weights = canonical_weights(u64_list_field(id, "barycentric_weights")?);
                    if weights != gate.barycentric_weights {
                        return Err(malformed(id, "unexpected barycentric weights"));
                    }
                    gate.barycentric_weights = weights;
                }
                GateKind::CosetInterpolation(gate)
            }
            "ExponentiationGate" => {
                let num_power_bits = usize_field(id, "num_power_bits")?;
                if num_power_bits == 0 {
                    return Err(malformed(id, "num_power_bits is zero"));
                }
                GateKind::Exponentiation(ExponentiationGate { num_power_bits })
            }
            "RandomAccessGate" => {
                let gate = RandomAccessGate {
                    bits: usize_field(id, "bits")?,
                    num_copies: usize_field(id, "num_copies")?,
                    num_extra_constants: usize_field(id, "num_extra_constants")?,
                };
                if gate.bits >= 32 {
                    return Err(malformed(id, "bits too large"));
                }
                GateKind::RandomAccess(gate)
            }
            "ReducingGate" => GateKind::Reducing(ReducingGate {
                num_coeffs: nonzero(id, usize_field(id, "num_coeffs")?)?,
            }),
            "ReducingExtensionGate" => GateKind::ReducingExtension(ReducingExtensionGate {
                num_coeffs: nonzero(id, usize_field(id, "num_coeffs")?)?,
            }),
            "LookupGate" => GateKind::Lookup(LookupGate),
            "LookupTableGate" => GateKind::LookupTable(LookupTableGate),
            "U32AddManyGate" => GateKind::U32AddMany(U32AddManyGate {
                num_addends: usize_field(id, "num_addends")?,
                num_ops: usize_field(id, "num_ops")?,
            }),
            "U32ArithmeticGate" => GateKind::U32Arithmetic(U32ArithmeticGate {
                num_ops: usize_field(id, "num_ops")?,
            }),
            "ComparisonGate" => {
                let gate = ComparisonGate {
                    num_bits: usize_field(id, "num_bits")?,
                    num_chunks: nonzero(id, usize_field(id, "num_chunks")?)?,
                };
                if gate.chunk_bits() > 16 {
                    return Err(malformed(id, "chunks wider than 16 bits"));
                }
                GateKind::Comparison(gate)
            }
            "U32InterleaveGate" => GateKind::U32Interleave(U32InterleaveGate {
                num_ops: usize_field(id, "num_ops")?,
            }),
            "UninterleaveToU32Gate" => GateKind::UninterleaveToU32(UninterleaveToU32Gate {
                num_ops: usize_field(id, "num_ops")?,
            }),
            other => return Err(Error::UnsupportedGate(other.to_string())),
        };
        Ok(gate)
    }
}

fn nonzero(id: &str, v: usize) -> Result<usize> {
    if v == 0 {
        return Err(malformed(id, "zero-sized gate"));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_common_descriptors() {
        assert_eq!(GateKind::parse("NoopGate").unwrap(), GateKind::Noop(NoopGate));
        assert_eq!(
            GateKind::parse("ArithmeticGate { num_ops: 20 }").unwrap(),
            GateKind::Arithmetic(ArithmeticGate { num_ops: 20 })
        );
        assert_eq!(
            GateKind::parse("BaseSumGate { num_limbs: 63 } + Base: 2").unwrap(),
            GateKind::BaseSum(BaseSumGate { num_limbs: 63, base: 2 })
        );
        assert_eq!(
            GateKind::parse(
                "PoseidonGate(PhantomData<plonky2_field::goldilocks_field::GoldilocksField>)<WIDTH=12>"
            )
            .unwrap(),
            GateKind::Poseidon(PoseidonGate)
        );
        assert_eq!(
            GateKind::parse(
                "RandomAccessGate { bits: 4, num_copies: 4, num_extra_constants: 2, _phantom: PhantomData<plonky2_field::goldilocks_field::GoldilocksField> }<D=2>"
            )
            .unwrap(),
            GateKind::RandomAccess(RandomAccessGate { bits: 4, num_copies: 4, num_extra_constants: 2 })
        );
        assert_eq!(
            GateKind::parse("U32AddManyGate { num_addends: 3, num_ops: 5, _phantom: PhantomData<F> }")
                .unwrap(),
            GateKind::U32AddMany(U32AddManyGate { num_addends: 3, num_ops: 5 })
        );
    }

    #[test]
    fn test_parse_coset_interpolation_checks_weights() {
        let gate = CosetInterpolationGate::with_max_degree(2, 4);
        let weights: Vec<String> = gate.barycentric_weights.iter().map(|w| w.to_string()).collect();
        let id = format!(
            "CosetInterpolationGate {{ subgroup_bits: 2, degree: {}, barycentric_weights: [{}], _phantom: PhantomData<GoldilocksField> }}<D=2>",
            gate.degree,
            weights.join(", ")
        );
        assert_eq!(GateKind::parse(&id).unwrap(), GateKind::CosetInterpolation(gate));
        let bad = id.replace(&weights[0], "1");
        assert!(matches!(GateKind::parse(&bad), Err(Error::MalformedGate(_))));
    }

    #[test]
    fn test_parse_rejects_unknown_and_malformed() {
        assert!(matches!(
            GateKind::parse("KeccakGate { rounds: 24 }"),
            Err(Error::UnsupportedGate(name)) if name == "KeccakGate"
        ));
        assert!(matches!(
            GateKind::parse("ArithmeticGate { ops: 20 }"),
            Err(Error::MalformedGate(_))
        ));
        assert!(matches!(
            GateKind::parse("ExponentiationGate { num_power_bits: 8, _phantom: PhantomData<F> }<D=4>"),
            Err(Error::UnsupportedConfig(_))
        ));
        assert!(GateKind::parse("").is_err());
    }
}
