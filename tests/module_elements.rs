use std::sync::Arc;

use algebra::module::{FreeModule, FreeModuleElement, Module, PresentationError};
use algebra::{Algebra, AlgebraElement, DegreeError, SteenrodAlgebra};
use fp::vector::FpVector;
use freegraded::utils::construct;

use proptest::prelude::*;
use rstest::rstest;

type Element = FreeModuleElement<SteenrodAlgebra>;

fn random_vector(module: &FreeModule<SteenrodAlgebra>, degree: i32, entries: &[u32]) -> FpVector {
    let mut v = FpVector::new(module.prime(), module.dimension(degree));
    for (i, &e) in entries.iter().take(v.len()).enumerate() {
        v.set_entry(i, e);
    }
    v
}

fn random_operation(
    algebra: &Arc<SteenrodAlgebra>,
    degree: i32,
    entries: &[u32],
) -> AlgebraElement<SteenrodAlgebra> {
    algebra.compute_basis(degree);
    let mut v = FpVector::new(algebra.prime(), algebra.dimension(degree));
    for (i, &e) in entries.iter().take(v.len()).enumerate() {
        v.set_entry(i, e);
    }
    AlgebraElement::from_vector(Arc::clone(algebra), degree, v)
}

#[rstest]
#[case("S_2", 20)]
#[case("free_1_7", 16)]
#[case("A2", 25)]
#[case("S_3", 30)]
fn basis_round_trip(#[case] module_name: &str, #[case] max_degree: i32) {
    let Ok(module) = construct(module_name) else {
        // Odd primes are disabled
        return;
    };
    for degree in module.min_degree()..=max_degree {
        for (k, x) in module.basis_elements(degree).into_iter().enumerate() {
            assert_eq!(x.degree(), Ok(degree));
            let v = x.vector_presentation().unwrap().unwrap();
            assert_eq!(v.weight(), 1);
            assert_eq!(v.entry(k), 1);
            assert_eq!(module.element_from_coordinates(v, degree), x);
        }
        let x = module.an_element(degree);
        match x.vector_presentation().unwrap() {
            None => assert_eq!(module.dimension(degree), 0),
            Some(v) => assert_eq!(module.element_from_coordinates(v, degree), x),
        }
    }
}

#[test]
fn zero_has_no_degree() {
    let module = construct("free_1_7").unwrap();
    let zero = module.zero();
    assert_eq!(zero.degree(), Err(DegreeError::ZeroElement));
    assert_eq!(zero.vector_presentation(), Ok(None));

    let x = module.an_element(9);
    let difference = &x - &x;
    assert_eq!(difference.degree(), Err(DegreeError::ZeroElement));
    assert_eq!(difference.vector_presentation(), Ok(None));
}

#[test]
fn homogeneity_gate() {
    let module = construct("free_1_7").unwrap();
    let x = &module.an_element(3) + &module.an_element(8);
    assert_eq!(x.degree(), Err(DegreeError::Nonhomogeneous));
    assert_eq!(
        x.vector_presentation(),
        Err(PresentationError::Degree(DegreeError::Nonhomogeneous))
    );
    assert_eq!(
        x.vector_presentation().unwrap_err().to_string(),
        "this is a nonhomogeneous element, no well-defined degree"
    );
}

#[test]
fn unit_acts_trivially() {
    let module = construct("A2").unwrap();
    let one = AlgebraElement::one(module.algebra());
    for degree in 0..12 {
        let x = module.an_element(degree);
        assert_eq!(&one * &x, x);
    }
    assert_eq!(&one * &module.zero(), module.zero());
}

#[test]
fn concrete_element() {
    let module = construct("free_1_7").unwrap();
    let algebra = module.algebra();
    let SteenrodAlgebra::MilnorAlgebra(milnor) = &*algebra else {
        panic!("expected the Milnor basis");
    };
    let (_, i) = milnor.basis_element_from_parts(0, &[6]).unwrap();
    let (_, j) = milnor.basis_element_from_parts(0, &[3, 1]).unwrap();
    let q = &AlgebraElement::basis_element(Arc::clone(&algebra), 6, i)
        + &AlgebraElement::basis_element(Arc::clone(&algebra), 6, j);
    assert_eq!(q.degree(), Ok(6));
    assert_eq!(q.terms().count(), 2);

    let x = &(&q * &module.generator(0)) + &module.generator(1);
    assert_eq!(x.degree(), Ok(7));
    assert_eq!(x.coefficients(), [q, AlgebraElement::one(Arc::clone(&algebra))]);
    assert_eq!(x.to_string(), "(Sq(6) + Sq(3,1)) g0 + g1");

    let v = x.vector_presentation().unwrap().unwrap();
    // Sq(6) g0, Sq(3,1) g0, Sq(0,2) g0, g1
    assert_eq!(v, &FpVector::from_slice(module.prime(), &[1, 1, 0, 1]));
    assert_eq!(v.weight(), 3);
    assert_eq!(module.element_from_coordinates(v, 7), x);
}

#[rstest]
#[case("A2", 7)]
#[case("A2", 12)]
#[case("free_1_7", 9)]
#[case("S_3", 13)]
fn coordinates_recombine_basis(#[case] module_name: &str, #[case] degree: i32) {
    let Ok(module) = construct(module_name) else {
        return;
    };
    let x = module.an_element(degree);
    for x in [x.scaled(2), x] {
        let Some(v) = x.vector_presentation().unwrap() else {
            continue;
        };
        let sum = module
            .basis_elements(degree)
            .iter()
            .enumerate()
            .fold(module.zero(), |acc, (k, b)| &acc + &b.scaled(v.entry(k)));
        assert_eq!(sum, x);
    }
}

#[test]
fn lift_to_free_is_identity() {
    let module = construct("A2").unwrap();
    for degree in 0..10 {
        let x = module.an_element(degree);
        assert!(std::ptr::eq(x.lift_to_free(), &x));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn action_is_linear(
        op_degree in 0i32..6,
        a in proptest::collection::vec(0u32..2, 6),
        b in proptest::collection::vec(0u32..2, 6),
        x_degree in 0i32..10,
        y_degree in 0i32..10,
        x in proptest::collection::vec(0u32..2, 12),
        y in proptest::collection::vec(0u32..2, 12),
    ) {
        let module = construct("free_1_7").unwrap();
        let algebra = module.algebra();
        let a = random_operation(&algebra, op_degree, &a);
        let b = random_operation(&algebra, op_degree + 1, &b);
        let x: Element =
            module.element_from_coordinates(&random_vector(&module, x_degree, &x), x_degree);
        let y: Element =
            module.element_from_coordinates(&random_vector(&module, y_degree, &y), y_degree);

        prop_assert_eq!(&(&a + &b) * &x, &(&a * &x) + &(&b * &x));
        prop_assert_eq!(&a * &(&x + &y), &(&a * &x) + &(&a * &y));
        prop_assert_eq!(&(&a * &b) * &x, &a * &(&b * &x));
    }

    #[test]
    fn action_matches_coordinates(
        op_degree in 0i32..8,
        a in proptest::collection::vec(0u32..2, 8),
        x_degree in 0i32..12,
        x in proptest::collection::vec(0u32..2, 12),
    ) {
        let module = construct("A2").unwrap();
        let algebra = module.algebra();
        let a = random_operation(&algebra, op_degree, &a);
        let v = random_vector(&module, x_degree, &x);
        let x = module.element_from_coordinates(&v, x_degree);

        let degree = op_degree + x_degree;
        let mut expected = FpVector::new(module.prime(), module.dimension(degree));
        if let Some(op) = a.component(op_degree) {
            module.act_by_element(&mut expected, 1, op_degree, op, x_degree, &v);
        }
        match (&a * &x).vector_presentation().unwrap() {
            None => prop_assert!(expected.is_zero()),
            Some(w) => prop_assert_eq!(w, &expected),
        }
    }
}
