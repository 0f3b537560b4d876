use std::sync::{Arc, OnceLock};

use crate::algebra::{Algebra, AlgebraElement, DegreeError};
use crate::module::{FreeModule, Module};
use fp::vector::FpVector;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresentationError {
    #[error(transparent)]
    Degree(#[from] DegreeError),
    /// The parent module's basis in this degree does not contain a product of an algebra basis
    /// element with a generator.
    #[error("{term} is not a basis element of degree {degree}")]
    OutsideBasis { degree: i32, term: String },
}

/// An element of a [`FreeModule`], stored as one algebra coefficient per generator.
///
/// Elements are immutable. The coordinate vector of a homogeneous element is computed on first
/// request and kept in the element.
pub struct FreeModuleElement<A: Algebra> {
    module: Arc<FreeModule<A>>,
    coefficients: Vec<AlgebraElement<A>>,
    vector_presentation: OnceLock<FpVector>,
}

impl<A: Algebra> FreeModuleElement<A> {
    /// `coefficients` must have one entry per generator of `module`. Use [`FreeModule::element`]
    /// to construct elements.
    pub(crate) fn new(module: Arc<FreeModule<A>>, coefficients: Vec<AlgebraElement<A>>) -> Self {
        debug_assert_eq!(coefficients.len(), module.num_gens());
        Self {
            module,
            coefficients,
            vector_presentation: OnceLock::new(),
        }
    }

    pub fn module(&self) -> &Arc<FreeModule<A>> {
        &self.module
    }

    /// The coefficient of each generator, in the order of the generators.
    pub fn coefficients(&self) -> &[AlgebraElement<A>] {
        &self.coefficients
    }

    pub fn is_zero(&self) -> bool {
        self.coefficients.iter().all(AlgebraElement::is_zero)
    }

    fn nonzero_terms(&self) -> impl Iterator<Item = (usize, &AlgebraElement<A>)> + '_ {
        self.coefficients
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_zero())
    }

    /// The degree of a nonzero homogeneous element. An element with an inhomogeneous coefficient
    /// is itself inhomogeneous.
    pub fn degree(&self) -> Result<i32, DegreeError> {
        let gen_degrees = self.module.generator_degrees();
        let mut degrees = self.nonzero_terms().map(|(i, c)| {
            c.degree()
                .map(|d| gen_degrees[i] + d)
                .map_err(|_| DegreeError::Nonhomogeneous)
        });
        let degree = degrees.next().ok_or(DegreeError::ZeroElement)??;
        for d in degrees {
            if d? != degree {
                return Err(DegreeError::Nonhomogeneous);
            }
        }
        Ok(degree)
    }

    /// The left action of `a`, multiplying every coefficient by `a` on the left.
    pub fn act(&self, a: &AlgebraElement<A>) -> Self {
        assert!(Arc::ptr_eq(a.algebra(), &self.module.algebra()));
        let coefficients = self.coefficients.iter().map(|c| a * c).collect();
        Self::new(Arc::clone(&self.module), coefficients)
    }

    /// Views the element as an element of a free module, which it already is.
    pub fn lift_to_free(&self) -> &Self {
        self
    }

    /// The coordinates of the element in the basis `self.module().basis(n)`, where `n` is the
    /// degree of the element. This is `None` for the zero element, which has no degree.
    pub fn vector_presentation(&self) -> Result<Option<&FpVector>, PresentationError> {
        if self.is_zero() {
            return Ok(None);
        }
        if let Some(v) = self.vector_presentation.get() {
            return Ok(Some(v));
        }
        let v = self.compute_vector_presentation()?;
        Ok(Some(self.vector_presentation.get_or_init(|| v)))
    }

    fn compute_vector_presentation(&self) -> Result<FpVector, PresentationError> {
        let degree = self.degree()?;
        let module = &*self.module;
        let mut result = module.vector_presentation(degree).zero();
        for (gen_index, c) in self.nonzero_terms() {
            for (scalar, op_degree, op_index) in c.terms() {
                let opgen = module.act_on_generator(op_degree, op_index, gen_index);
                let k = module.basis_index(degree, &opgen).ok_or_else(|| {
                    PresentationError::OutsideBasis {
                        degree,
                        term: module.opgen_to_string(&opgen),
                    }
                })?;
                result.add_basis_element(k, scalar);
            }
        }
        Ok(result)
    }

    /// Adds `c` times `other`.
    fn combine(&self, other: &Self, c: u32) -> Self {
        assert!(Arc::ptr_eq(&self.module, &other.module));
        let coefficients = self
            .coefficients
            .iter()
            .zip(&other.coefficients)
            .map(|(x, y)| {
                let mut sum = x.clone();
                sum.add_multiple(y, c);
                sum
            })
            .collect();
        Self::new(Arc::clone(&self.module), coefficients)
    }

    pub fn scaled(&self, c: u32) -> Self {
        let coefficients = self
            .coefficients
            .iter()
            .map(|x| {
                let mut x = x.clone();
                x.scale(c);
                x
            })
            .collect();
        Self::new(Arc::clone(&self.module), coefficients)
    }
}

impl<A: Algebra> Clone for FreeModuleElement<A> {
    fn clone(&self) -> Self {
        Self {
            module: Arc::clone(&self.module),
            coefficients: self.coefficients.clone(),
            vector_presentation: self.vector_presentation.clone(),
        }
    }
}

impl<A: Algebra> PartialEq for FreeModuleElement<A> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.module, &other.module) && self.coefficients == other.coefficients
    }
}

impl<A: Algebra> Eq for FreeModuleElement<A> {}

impl<A: Algebra> std::ops::Add for &FreeModuleElement<A> {
    type Output = FreeModuleElement<A>;

    fn add(self, other: Self) -> FreeModuleElement<A> {
        self.combine(other, 1)
    }
}

impl<A: Algebra> std::ops::Sub for &FreeModuleElement<A> {
    type Output = FreeModuleElement<A>;

    fn sub(self, other: Self) -> FreeModuleElement<A> {
        self.combine(other, self.module.prime().as_u32() - 1)
    }
}

impl<A: Algebra> std::ops::Neg for &FreeModuleElement<A> {
    type Output = FreeModuleElement<A>;

    fn neg(self) -> FreeModuleElement<A> {
        self.scaled(self.module.prime().as_u32() - 1)
    }
}

impl<A: Algebra> std::ops::Mul<&FreeModuleElement<A>> for &AlgebraElement<A> {
    type Output = FreeModuleElement<A>;

    fn mul(self, x: &FreeModuleElement<A>) -> FreeModuleElement<A> {
        x.act(self)
    }
}

impl<A: Algebra> std::fmt::Display for FreeModuleElement<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut first = true;
        for (i, c) in self.nonzero_terms() {
            if !first {
                write!(f, " + ")?;
            }
            first = false;
            let name = &self.module.generator_names()[i];
            let mut terms = c.terms();
            match (terms.next(), terms.next()) {
                (Some((1, 0, _)), None) => write!(f, "{name}")?,
                (Some((s, 0, _)), None) => write!(f, "{s} {name}")?,
                (Some(_), None) => write!(f, "{c} {name}")?,
                _ => write!(f, "({c}) {name}")?,
            }
        }
        if first {
            write!(f, "0")?;
        }
        Ok(())
    }
}

impl<A: Algebra> std::fmt::Debug for FreeModuleElement<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::MilnorAlgebra;
    use fp::prime::ValidPrime;

    use expect_test::expect;
    use proptest::prelude::*;

    type Element = FreeModuleElement<MilnorAlgebra>;

    fn module(p: u32, degrees: Vec<i32>) -> Option<Arc<FreeModule<MilnorAlgebra>>> {
        let algebra = Arc::new(MilnorAlgebra::new(ValidPrime::try_new(p)?));
        Some(Arc::new(FreeModule::new(algebra, "M", degrees)))
    }

    fn op(
        m: &FreeModule<MilnorAlgebra>,
        q_part: u32,
        p_part: &[u32],
    ) -> AlgebraElement<MilnorAlgebra> {
        let algebra = m.algebra();
        let (degree, idx) = algebra.basis_element_from_parts(q_part, p_part).unwrap();
        AlgebraElement::basis_element(algebra, degree, idx)
    }

    #[test]
    fn zero_element() {
        let m = module(2, vec![0, 1]).unwrap();
        let zero = m.zero();
        assert!(zero.is_zero());
        assert_eq!(zero.degree(), Err(DegreeError::ZeroElement));
        assert_eq!(zero.vector_presentation(), Ok(None));
        assert_eq!(zero.to_string(), "0");
        assert_eq!(zero.coefficients().len(), 2);
    }

    #[test]
    fn sage_example() {
        let m = module(2, vec![0, 1]).unwrap();
        let x = &(&op(&m, 0, &[0, 0, 1]) * &m.generator(0))
            + &(&op(&m, 0, &[3, 1]) * &m.generator(1));
        assert_eq!(x.degree(), Ok(7));
        expect![["Sq(0,0,1) x0 + Sq(3,1) x1"]].assert_eq(&x.to_string());

        let v = x.vector_presentation().unwrap().unwrap();
        let basis: Vec<String> = (0..m.dimension(7))
            .map(|i| m.basis_element_to_string(7, i))
            .collect();
        expect![[r#"
            [
                "Sq(7) x0",
                "Sq(4,1) x0",
                "Sq(1,2) x0",
                "Sq(0,0,1) x0",
                "Sq(6) x1",
                "Sq(3,1) x1",
                "Sq(0,2) x1",
            ]
        "#]]
        .assert_debug_eq(&basis);
        expect![["[0, 0, 0, 1, 0, 1, 0]"]].assert_eq(&v.to_string());
        assert_eq!(m.element_from_coordinates(v, 7), x);
    }

    #[test]
    fn inhomogeneous() {
        let m = module(2, vec![0, 1]).unwrap();
        let x = &m.generator(0) + &m.generator(1);
        assert_eq!(x.degree(), Err(DegreeError::Nonhomogeneous));
        assert_eq!(
            x.vector_presentation(),
            Err(PresentationError::Degree(DegreeError::Nonhomogeneous))
        );
        assert_eq!(
            x.degree().unwrap_err().to_string(),
            "this is a nonhomogeneous element, no well-defined degree"
        );

        // A single coefficient that is not homogeneous
        let c = &op(&m, 0, &[1]) + &op(&m, 0, &[2]);
        let y = m.element(vec![c]);
        assert_eq!(y.degree(), Err(DegreeError::Nonhomogeneous));
        assert_eq!(y.to_string(), "(Sq(1) + Sq(2)) x0");
    }

    #[test]
    fn cancellation() {
        let m = module(2, vec![0, 1]).unwrap();
        let x = &m.generator(0) + &m.generator(1);
        let y = &x - &x;
        assert!(y.is_zero());
        assert_eq!(y, m.zero());
        assert_eq!(&x + &y, x);
    }

    #[test]
    fn action_is_on_the_left() {
        let m = module(2, vec![0]).unwrap();
        let sq1 = op(&m, 0, &[1]);
        let sq2 = op(&m, 0, &[2]);
        let x = &sq1 * &m.generator(0);
        // Sq(2) (Sq(1) x0) = (Sq(2) Sq(1)) x0
        let y = &sq2 * &x;
        assert_eq!(y.to_string(), "(Sq(3) + Sq(0,1)) x0");
        assert_eq!(y, &(&sq2 * &sq1) * &m.generator(0));
        assert_ne!(y, &(&sq1 * &sq2) * &m.generator(0));
        assert!((&sq1 * &x).is_zero());
    }

    #[test]
    fn odd_primes() {
        let Some(m) = module(3, vec![0, 4]) else {
            return;
        };
        let q0 = op(&m, 1, &[]);
        let p1 = op(&m, 0, &[1]);
        // P(1) Q_0 x0 - 2 Q_0 x1 has degree 5
        let x = &(&(&p1 * &q0) * &m.generator(0)) - &m.generator(1).act(&q0).scaled(2);
        assert_eq!(x.degree(), Ok(5));
        assert_eq!(x.to_string(), "(Q_0 P(1) + Q_1) x0 + Q_0 x1");
        assert_eq!(m.element_from_coordinates(x.vector_presentation().unwrap().unwrap(), 5), x);

        let y = &m.generator(1).scaled(2) + &(&p1 * &m.generator(0));
        assert_eq!(y.to_string(), "P(1) x0 + 2 x1");
        assert_eq!(-&y, y.scaled(2));
    }

    #[test]
    fn presentation_is_cached() {
        let m = module(2, vec![0]).unwrap();
        let x = m.an_element(6);
        let first = x.vector_presentation().unwrap().unwrap() as *const FpVector;
        let second = x.vector_presentation().unwrap().unwrap() as *const FpVector;
        assert_eq!(first, second);

        // Equality and clones do not depend on the cache
        let y = x.clone();
        assert_eq!(y.vector_presentation(), x.vector_presentation());
        assert_eq!(m.an_element(6), x);
    }

    #[test]
    fn lift_to_free_is_identity() {
        let m = module(2, vec![0, 1]).unwrap();
        let x = m.an_element(5);
        assert!(std::ptr::eq(x.lift_to_free(), &x));
        assert_eq!(x.lift_to_free(), &x);
    }

    proptest! {
        #[test]
        fn coordinates_round_trip(
            degree in 0i32..12,
            entries in proptest::collection::vec(0u32..2, 0..40),
        ) {
            let m = module(2, vec![0, 1, 3]).unwrap();
            let dim = m.dimension(degree);
            let mut v = FpVector::new(m.prime(), dim);
            for (i, &e) in entries.iter().take(dim).enumerate() {
                v.set_entry(i, e);
            }
            let x: Element = m.element_from_coordinates(&v, degree);
            match x.vector_presentation().unwrap() {
                None => prop_assert!(v.is_zero()),
                Some(w) => prop_assert_eq!(w, &v),
            }
        }
    }
}
