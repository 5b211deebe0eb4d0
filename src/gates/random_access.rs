use super::{booleanity, EvaluationVars, Gate};
use crate::goldilocks::GlExtVar;
use crate::plonk::common_data::D;
use ark_relations::r1cs::SynthesisError;

/// Selects `list[index]` from a `2^bits` list, `num_copies` times per row, plus
/// `num_extra_constants` constant wires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomAccessGate {
    pub bits: usize,
    pub num_copies: usize,
    pub num_extra_constants: usize,
}

impl RandomAccessGate {
    fn vec_size(&self) -> usize {
        1 << self.bits
    }

    pub fn wire_access_index(&self, copy: usize) -> usize {
        debug_assert!(copy < self.num_copies);
        (2 + self.vec_size()) * copy
    }

    pub fn wire_claimed_element(&self, copy: usize) -> usize {
        debug_assert!(copy < self.num_copies);
        (2 + self.vec_size()) * copy + 1
    }

    pub fn wire_list_item(&self, i: usize, copy: usize) -> usize {
        debug_assert!(i < self.vec_size());
        debug_assert!(copy < self.num_copies);
        (2 + self.vec_size()) * copy + 2 + i
    }

    fn start_extra_constants(&self) -> usize {
        (2 + self.vec_size()) * self.num_copies
    }

    fn wire_extra_constant(&self, i: usize) -> usize {
        debug_assert!(i < self.num_extra_constants);
        self.start_extra_constants() + i
    }

    pub fn num_routed_wires(&self) -> usize {
        self.start_extra_constants() + self.num_extra_constants
    }

    /// Little-endian bit `i` of the access index of `copy`.
    pub fn wire_bit(&self, i: usize, copy: usize) -> usize {
        debug_assert!(i < self.bits);
        debug_assert!(copy < self.num_copies);
        self.num_routed_wires() + copy * self.bits + i
    }
}

impl Gate for RandomAccessGate {
    fn id(&self) -> String {
        format!("{self:?}<D={D}>")
    }

    fn num_wires(&self) -> usize {
        self.num_routed_wires() + self.num_copies * self.bits
    }

    fn num_constants(&self) -> usize {
        self.num_extra_constants
    }

    fn num_constraints(&self) -> usize {
        self.num_copies * (self.bits + 2) + self.num_extra_constants
    }

    fn eval_unfiltered(&self, vars: EvaluationVars<'_>) -> Result<Vec<GlExtVar>, SynthesisError> {
        let w = vars.local_wires;
        let mut constraints = Vec::with_capacity(self.num_constraints());

        for copy in 0..self.num_copies {
            let access_index = &w[self.wire_access_index(copy)];
            let mut items: Vec<GlExtVar> = (0..self.vec_size())
                .map(|i| w[self.wire_list_item(i, copy)].clone())
                .collect();
            let claimed = &w[self.wire_claimed_element(copy)];
            let bits: Vec<&GlExtVar> = (0..self.bits).map(|i| &w[self.wire_bit(i, copy)]).collect();

            for b in &bits {
                constraints.push(booleanity(b)?);
            }

            let mut reconstructed = GlExtVar::zero();
            for b in bits.iter().rev() {
                reconstructed = reconstructed.acc().mul_const(2).add(&b.acc()).reduce()?;
            }
            constraints.push(reconstructed.sub(access_index)?);

            // x + b·(y − x) over consecutive pairs, one level per bit.
            for b in &bits {
                let mut next = Vec::with_capacity(items.len() / 2);
                for pair in items.chunks(2) {
                    let (x, y) = (&pair[0], &pair[1]);
                    next.push(x.acc().add(&b.acc().mul(&y.acc().sub(&x.acc()))).reduce()?);
                }
                items = next;
            }
            debug_assert_eq!(items.len(), 1);
            constraints.push(items[0].sub(claimed)?);
        }

        for i in 0..self.num_extra_constants {
            constraints.push(vars.local_constants[i].sub(&w[self.wire_extra_constant(i)])?);
        }
        Ok(constraints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::tests::{base, eval_on};

    fn witness(gate: &RandomAccessGate, lists: &[Vec<u64>], indices: &[usize], extra: &[u64]) -> Vec<u64> {
        let mut w = vec![0u64; gate.num_wires()];
        for copy in 0..gate.num_copies {
            w[gate.wire_access_index(copy)] = indices[copy] as u64;
            w[gate.wire_claimed_element(copy)] = lists[copy][indices[copy]];
            for (i, &v) in lists[copy].iter().enumerate() {
                w[gate.wire_list_item(i, copy)] = v;
            }
            for i in 0..gate.bits {
                w[gate.wire_bit(i, copy)] = ((indices[copy] >> i) & 1) as u64;
            }
        }
        for (i, &c) in extra.iter().enumerate() {
            w[gate.wire_extra_constant(i)] = c;
        }
        w
    }

    #[test]
    fn test_random_access_gate() {
        let gate = RandomAccessGate { bits: 3, num_copies: 2, num_extra_constants: 1 };
        let lists = vec![(10..18).collect::<Vec<u64>>(), (100..108).collect()];
        let w = witness(&gate, &lists, &[5, 2], &[77]);
        let (out, cs) = eval_on(&gate, &base(&[77]), &base(&w));
        assert_eq!(out.len(), gate.num_constraints());
        assert!(out.iter().all(|c| *c == [0, 0]));
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_random_access_wrong_claim() {
        let gate = RandomAccessGate { bits: 2, num_copies: 1, num_extra_constants: 0 };
        let mut w = witness(&gate, &[vec![1, 2, 3, 4]], &[3], &[]);
        w[gate.wire_claimed_element(0)] = 3;
        let (out, _) = eval_on(&gate, &[], &base(&w));
        assert_eq!(out[3], [1, 0]);
    }
}
