//! Extension algebra over GF(p^2): pairs of extension elements with Y^2 = 7.
//!
//! Gates that operate on extension-valued wires see each of their D wires as an
//! opening in GF(p^2), so a wire-level extension element becomes an element of
//! GF(p^2)[Y]/(Y^2 - 7) when evaluated at zeta.

use crate::goldilocks::native::W;
use crate::goldilocks::{GlExtAcc, GlExtVar};
use ark_relations::r1cs::SynthesisError;

#[derive(Clone, Debug)]
pub struct ExtAlgebraVar(pub [GlExtVar; 2]);

impl ExtAlgebraVar {
    pub fn zero() -> Self {
        ExtAlgebraVar([GlExtVar::zero(), GlExtVar::zero()])
    }

    pub fn one() -> Self {
        ExtAlgebraVar([GlExtVar::one(), GlExtVar::zero()])
    }

    pub fn from_ext(e: GlExtVar) -> Self {
        ExtAlgebraVar([e, GlExtVar::zero()])
    }

    pub fn add(&self, o: &ExtAlgebraVar) -> Result<Self, SynthesisError> {
        Ok(ExtAlgebraVar([self.0[0].add(&o.0[0])?, self.0[1].add(&o.0[1])?]))
    }

    pub fn sub(&self, o: &ExtAlgebraVar) -> Result<Self, SynthesisError> {
        Ok(ExtAlgebraVar([self.0[0].sub(&o.0[0])?, self.0[1].sub(&o.0[1])?]))
    }

    pub fn mul(&self, o: &ExtAlgebraVar) -> Result<Self, SynthesisError> {
        self.mul_acc(o).reduce()
    }

    /// Unreduced product, for callers that add further terms before reducing.
    pub fn mul_acc(&self, o: &ExtAlgebraVar) -> ExtAlgebraAcc {
        let (a, b) = (&self.0, &o.0);
        ExtAlgebraAcc([
            a[0].acc()
                .mul(&b[0].acc())
                .add(&a[1].acc().mul(&b[1].acc()).mul_const(W)),
            a[0].acc().mul(&b[1].acc()).add(&a[1].acc().mul(&b[0].acc())),
        ])
    }

    pub fn scalar_mul(&self, s: &GlExtVar) -> Result<Self, SynthesisError> {
        Ok(ExtAlgebraVar([self.0[0].mul(s)?, self.0[1].mul(s)?]))
    }

    pub fn acc(&self) -> ExtAlgebraAcc {
        ExtAlgebraAcc([self.0[0].acc(), self.0[1].acc()])
    }

    pub fn into_ext_array(self) -> [GlExtVar; 2] {
        self.0
    }
}

#[derive(Clone, Debug)]
pub struct ExtAlgebraAcc(pub [GlExtAcc; 2]);

impl ExtAlgebraAcc {
    pub fn add(&self, o: &ExtAlgebraAcc) -> ExtAlgebraAcc {
        ExtAlgebraAcc([self.0[0].add(&o.0[0]), self.0[1].add(&o.0[1])])
    }

    pub fn sub(&self, o: &ExtAlgebraAcc) -> ExtAlgebraAcc {
        ExtAlgebraAcc([self.0[0].sub(&o.0[0]), self.0[1].sub(&o.0[1])])
    }

    pub fn reduce(&self) -> Result<ExtAlgebraVar, SynthesisError> {
        Ok(ExtAlgebraVar([self.0[0].reduce()?, self.0[1].reduce()?]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goldilocks::native::{ext_add, ext_mul, ext_scalar_mul, Ext};

    fn alg(a: [Ext; 2]) -> ExtAlgebraVar {
        ExtAlgebraVar(a.map(GlExtVar::constant))
    }

    #[test]
    fn test_algebra_mul_matches_formula() {
        let a = [[3, 5], [7, 11]];
        let b = [[13, 17], [19, 23]];
        let r = alg(a).mul(&alg(b)).unwrap();
        let c0 = ext_add(
            ext_mul(a[0], b[0]),
            ext_scalar_mul(ext_mul(a[1], b[1]), W),
        );
        let c1 = ext_add(ext_mul(a[0], b[1]), ext_mul(a[1], b[0]));
        assert_eq!(r.0[0].value().unwrap(), c0);
        assert_eq!(r.0[1].value().unwrap(), c1);
    }

    #[test]
    fn test_algebra_one_is_identity() {
        let a = alg([[1, 2], [3, 4]]);
        let r = a.mul(&ExtAlgebraVar::one()).unwrap();
        assert_eq!(r.0[0].value().unwrap(), [1, 2]);
        assert_eq!(r.0[1].value().unwrap(), [3, 4]);
    }
}
