//! Elements of an [`Algebra`] that need not be homogeneous.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::algebra::Algebra;
use fp::vector::FpVector;

/// Why an element has no well-defined degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DegreeError {
    #[error("the zero element does not have a well-defined degree")]
    ZeroElement,
    #[error("this is a nonhomogeneous element, no well-defined degree")]
    Nonhomogeneous,
}

/// A finite sum of homogeneous elements of `A`. Each homogeneous component is stored as a
/// coordinate vector in the basis of its degree, and zero components are never stored.
pub struct AlgebraElement<A: Algebra> {
    algebra: Arc<A>,
    components: BTreeMap<i32, FpVector>,
}

impl<A: Algebra> Clone for AlgebraElement<A> {
    fn clone(&self) -> Self {
        Self {
            algebra: Arc::clone(&self.algebra),
            components: self.components.clone(),
        }
    }
}

impl<A: Algebra> AlgebraElement<A> {
    pub fn zero(algebra: Arc<A>) -> Self {
        Self {
            algebra,
            components: BTreeMap::new(),
        }
    }

    pub fn one(algebra: Arc<A>) -> Self {
        Self::basis_element(algebra, 0, 0)
    }

    /// The basis element `(degree, idx)`.
    ///
    /// # Panics
    /// If `idx` is not less than the dimension of the algebra in degree `degree`.
    pub fn basis_element(algebra: Arc<A>, degree: i32, idx: usize) -> Self {
        algebra.compute_basis(degree);
        let mut v = FpVector::new(algebra.prime(), algebra.dimension(degree));
        v.set_entry(idx, 1);
        Self::from_vector(algebra, degree, v)
    }

    /// The homogeneous element of degree `degree` with coordinates `v`.
    ///
    /// # Panics
    /// If the length of `v` is not the dimension of the algebra in degree `degree`.
    pub fn from_vector(algebra: Arc<A>, degree: i32, v: FpVector) -> Self {
        algebra.compute_basis(degree);
        assert_eq!(
            v.len(),
            algebra.dimension(degree),
            "vector has the wrong length for degree {degree} of {algebra}"
        );
        let mut components = BTreeMap::new();
        if !v.is_zero() {
            components.insert(degree, v);
        }
        Self {
            algebra,
            components,
        }
    }

    pub fn algebra(&self) -> &Arc<A> {
        &self.algebra
    }

    pub fn is_zero(&self) -> bool {
        self.components.is_empty()
    }

    pub fn is_homogeneous(&self) -> bool {
        self.components.len() <= 1
    }

    pub fn degree(&self) -> Result<i32, DegreeError> {
        let mut degrees = self.components.keys();
        match (degrees.next(), degrees.next()) {
            (None, _) => Err(DegreeError::ZeroElement),
            (Some(&d), None) => Ok(d),
            (Some(_), Some(_)) => Err(DegreeError::Nonhomogeneous),
        }
    }

    /// The nonzero homogeneous components, in increasing degree.
    pub fn components(&self) -> impl Iterator<Item = (i32, &FpVector)> + '_ {
        self.components.iter().map(|(&d, v)| (d, v))
    }

    pub fn component(&self, degree: i32) -> Option<&FpVector> {
        self.components.get(&degree)
    }

    /// The nonzero terms as `(coefficient, degree, index)` triples, ordered by degree and then
    /// index.
    pub fn terms(&self) -> impl Iterator<Item = (u32, i32, usize)> + '_ {
        self.components
            .iter()
            .flat_map(|(&d, v)| v.iter_nonzero().map(move |(i, c)| (c, d, i)))
    }

    /// Adds `c` times the vector `v` in degree `degree`.
    pub fn add_vector(&mut self, c: u32, degree: i32, v: &FpVector) {
        match self.components.get_mut(&degree) {
            Some(w) => {
                w.add(v, c);
                if w.is_zero() {
                    self.components.remove(&degree);
                }
            }
            None => {
                let mut w = FpVector::new(self.algebra.prime(), v.len());
                w.add(v, c);
                if !w.is_zero() {
                    self.components.insert(degree, w);
                }
            }
        }
    }

    /// Adds `c` times `other`.
    pub fn add_multiple(&mut self, other: &Self, c: u32) {
        assert!(Arc::ptr_eq(&self.algebra, &other.algebra));
        for (d, v) in &other.components {
            self.add_vector(c, *d, v);
        }
    }

    pub fn scale(&mut self, c: u32) {
        if c % self.algebra.prime().as_u32() == 0 {
            self.components.clear();
            return;
        }
        for v in self.components.values_mut() {
            v.scale(c);
        }
    }

    pub fn multiply(&self, other: &Self) -> Self {
        assert!(Arc::ptr_eq(&self.algebra, &other.algebra));
        let algebra = &self.algebra;
        let mut products: BTreeMap<i32, FpVector> = BTreeMap::new();
        for (&r_degree, r) in &self.components {
            for (&s_degree, s) in &other.components {
                let degree = r_degree + s_degree;
                algebra.compute_basis(degree);
                let result = products
                    .entry(degree)
                    .or_insert_with(|| FpVector::new(algebra.prime(), algebra.dimension(degree)));
                algebra.multiply_element_by_element(result, 1, r_degree, r, s_degree, s);
            }
        }
        products.retain(|_, v| !v.is_zero());
        Self {
            algebra: Arc::clone(algebra),
            components: products,
        }
    }
}

impl<A: Algebra> PartialEq for AlgebraElement<A> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.algebra, &other.algebra) && self.components == other.components
    }
}

impl<A: Algebra> Eq for AlgebraElement<A> {}

impl<A: Algebra> std::ops::Add for &AlgebraElement<A> {
    type Output = AlgebraElement<A>;

    fn add(self, other: Self) -> AlgebraElement<A> {
        let mut result = self.clone();
        result.add_multiple(other, 1);
        result
    }
}

impl<A: Algebra> std::ops::Sub for &AlgebraElement<A> {
    type Output = AlgebraElement<A>;

    fn sub(self, other: Self) -> AlgebraElement<A> {
        let mut result = self.clone();
        result.add_multiple(other, self.algebra.prime().as_u32() - 1);
        result
    }
}

impl<A: Algebra> std::ops::Neg for &AlgebraElement<A> {
    type Output = AlgebraElement<A>;

    fn neg(self) -> AlgebraElement<A> {
        let mut result = self.clone();
        result.scale(self.algebra.prime().as_u32() - 1);
        result
    }
}

impl<A: Algebra> std::ops::Mul for &AlgebraElement<A> {
    type Output = AlgebraElement<A>;

    fn mul(self, other: Self) -> AlgebraElement<A> {
        self.multiply(other)
    }
}

impl<A: Algebra> std::fmt::Display for AlgebraElement<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let mut first = true;
        for (&d, v) in &self.components {
            if !first {
                write!(f, " + ")?;
            }
            first = false;
            write!(f, "{}", self.algebra.element_to_string(d, v))?;
        }
        Ok(())
    }
}

impl<A: Algebra> std::fmt::Debug for AlgebraElement<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::MilnorAlgebra;
    use fp::prime::ValidPrime;

    fn milnor(p: u32) -> Option<Arc<MilnorAlgebra>> {
        Some(Arc::new(MilnorAlgebra::new(ValidPrime::try_new(p)?)))
    }

    fn sq(algebra: &Arc<MilnorAlgebra>, p_part: &[u32]) -> AlgebraElement<MilnorAlgebra> {
        let (degree, idx) = algebra.basis_element_from_parts(0, p_part).unwrap();
        AlgebraElement::basis_element(Arc::clone(algebra), degree, idx)
    }

    #[test]
    fn degrees() {
        let algebra = milnor(2).unwrap();
        let zero = AlgebraElement::zero(Arc::clone(&algebra));
        assert_eq!(zero.degree(), Err(DegreeError::ZeroElement));
        assert_eq!(
            DegreeError::ZeroElement.to_string(),
            "the zero element does not have a well-defined degree"
        );

        let x = &sq(&algebra, &[4, 1]) + &sq(&algebra, &[0, 0, 1]);
        assert_eq!(x.degree(), Ok(7));
        assert_eq!(x.to_string(), "Sq(4,1) + Sq(0,0,1)");

        let y = &x + &sq(&algebra, &[1]);
        assert_eq!(y.degree(), Err(DegreeError::Nonhomogeneous));
        assert!(!y.is_homogeneous());
        assert_eq!(y.to_string(), "Sq(1) + Sq(4,1) + Sq(0,0,1)");
        assert_eq!(y.terms().count(), 3);
    }

    #[test]
    fn cancellation_removes_components() {
        let algebra = milnor(2).unwrap();
        let x = sq(&algebra, &[3]);
        let sum = &x + &x;
        assert!(sum.is_zero());
        assert_eq!(sum.component(3), None);
        assert_eq!(sum, AlgebraElement::zero(algebra));
    }

    #[test]
    fn add_multiple() {
        let algebra = milnor(2).unwrap();
        let mut x = sq(&algebra, &[3]);
        x.add_multiple(&sq(&algebra, &[0, 1]), 1);
        assert_eq!(x.to_string(), "Sq(3) + Sq(0,1)");
        x.add_multiple(&sq(&algebra, &[3]), 1);
        assert_eq!(x, sq(&algebra, &[0, 1]));
        // 2 = 0 mod 2
        x.add_multiple(&sq(&algebra, &[0, 1]), 2);
        assert_eq!(x.to_string(), "Sq(0,1)");
    }

    #[test]
    fn products() {
        let algebra = milnor(2).unwrap();
        let product = &sq(&algebra, &[2]) * &sq(&algebra, &[1]);
        assert_eq!(product.to_string(), "Sq(3) + Sq(0,1)");

        let one = AlgebraElement::one(Arc::clone(&algebra));
        let x = &sq(&algebra, &[1]) + &sq(&algebra, &[2]);
        assert_eq!(&one * &x, x);
        assert_eq!(&x * &one, x);
        // (Sq(1) + Sq(2))^2 = Sq(2)Sq(1) + Sq(1)Sq(2) + Sq(2)Sq(2) = Sq(0,1) + Sq(1,1)
        assert_eq!((&x * &x).to_string(), "Sq(0,1) + Sq(1,1)");
    }

    #[test]
    fn signs_at_odd_primes() {
        let Some(algebra) = milnor(3) else {
            return;
        };
        let (d, i) = algebra.basis_element_from_parts(1, &[]).unwrap();
        let q0 = AlgebraElement::basis_element(Arc::clone(&algebra), d, i);
        let mut x = q0.clone();
        x.scale(2);
        assert_eq!(x, -&q0);
        assert_eq!(&(&q0 - &x) - &q0, q0);
        assert_eq!(x.to_string(), "2 Q_0");
    }
}
