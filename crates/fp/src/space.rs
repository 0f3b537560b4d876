use crate::{prime::ValidPrime, vector::FpVector};

/// The coordinate space $\mathbb{F}_p^n$ together with its ordered standard basis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VectorSpace {
    p: ValidPrime,
    dimension: usize,
}

impl VectorSpace {
    pub fn new(p: ValidPrime, dimension: usize) -> Self {
        Self { p, dimension }
    }

    pub fn prime(&self) -> ValidPrime {
        self.p
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn zero(&self) -> FpVector {
        FpVector::new(self.p, self.dimension)
    }

    /// The `i`th standard basis vector.
    pub fn basis_vector(&self, i: usize) -> FpVector {
        assert!(i < self.dimension, "{i} out of range for {self}");
        let mut v = self.zero();
        v.set_entry(i, 1);
        v
    }

    pub fn basis(&self) -> impl Iterator<Item = FpVector> + '_ {
        (0..self.dimension).map(|i| self.basis_vector(i))
    }

    pub fn contains(&self, v: &FpVector) -> bool {
        v.prime() == self.p && v.len() == self.dimension
    }
}

impl std::fmt::Display for VectorSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "F_{}^{}", self.p, self.dimension)
    }
}
