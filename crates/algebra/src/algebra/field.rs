use crate::algebra::Algebra;
use fp::prime::ValidPrime;
use fp::vector::FpVector;

/// The ground field F_p, viewed as a graded algebra concentrated in degree 0. This is the
/// trivial sub-Hopf algebra of the Steenrod algebra.
pub struct Field {
    prime: ValidPrime,
}

impl Field {
    pub fn new(p: ValidPrime) -> Self {
        Self { prime: p }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "F_{}", self.prime)
    }
}

impl Algebra for Field {
    fn prime(&self) -> ValidPrime {
        self.prime
    }

    fn compute_basis(&self, _degree: i32) {}

    fn dimension(&self, degree: i32) -> usize {
        if degree == 0 {
            1
        } else {
            0
        }
    }

    fn multiply_basis_elements(
        &self,
        result: &mut FpVector,
        coeff: u32,
        r_degree: i32,
        _r_idx: usize,
        s_degree: i32,
        _s_idx: usize,
    ) {
        assert!(r_degree == 0 && s_degree == 0);
        result.add_basis_element(0, coeff)
    }

    fn basis_element_to_string(&self, degree: i32, _idx: usize) -> String {
        assert!(degree == 0);
        "1".to_string()
    }

    fn element_to_string(&self, degree: i32, element: &FpVector) -> String {
        assert!(degree == 0);
        format!("{}", element.entry(0))
    }
}
