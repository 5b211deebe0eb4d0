//! Index selection from little-endian bit vectors

use crate::Fr;
use ark_r1cs_std::{boolean::Boolean, select::CondSelectGadget};
use ark_relations::r1cs::SynthesisError;

/// `items[Σ bits[i]·2^i]`, built as a binary tree of selects that consumes the
/// lowest bit first. `items.len()` must equal `2^bits.len()`.
pub fn select_le<T: CondSelectGadget<Fr>>(
    bits: &[Boolean<Fr>],
    items: &[T],
) -> Result<T, SynthesisError> {
    if items.len() != 1usize << bits.len() {
        tracing::error!(
            items = items.len(),
            bits = bits.len(),
            "selection table does not match index width"
        );
        return Err(SynthesisError::Unsatisfiable);
    }
    let mut level: Vec<T> = items.to_vec();
    for b in bits {
        level = level
            .chunks(2)
            .map(|pair| T::conditionally_select(b, &pair[1], &pair[0]))
            .collect::<Result<Vec<_>, _>>()?;
    }
    level.pop().ok_or(SynthesisError::Unsatisfiable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goldilocks::GlVar;
    use ark_r1cs_std::alloc::AllocVar;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn test_select_le_every_index() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let items: Vec<GlVar> = (0..8u64)
            .map(|i| GlVar::new_witness(cs.clone(), || Ok(100 + i)).unwrap())
            .collect();
        for idx in 0..8usize {
            let bits: Vec<_> = (0..3)
                .map(|i| Boolean::new_witness(cs.clone(), || Ok((idx >> i) & 1 == 1)).unwrap())
                .collect();
            let v = select_le(&bits, &items).unwrap();
            assert_eq!(v.value().unwrap(), 100 + idx as u64);
        }
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_select_le_empty_bits() {
        let v = select_le::<GlVar>(&[], &[GlVar::constant(9)]).unwrap();
        assert_eq!(v.value().unwrap(), 9);
    }

    #[test]
    fn test_select_le_length_mismatch() {
        let items = vec![GlVar::constant(1), GlVar::constant(2), GlVar::constant(3)];
        let bits = vec![Boolean::constant(true), Boolean::constant(false)];
        assert!(matches!(
            select_le(&bits, &items),
            Err(SynthesisError::Unsatisfiable)
        ));
    }
}
