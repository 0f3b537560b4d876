use fp::prime::ValidPrime;
use fp::vector::FpVector;

use enum_dispatch::enum_dispatch;

/// A connected graded algebra over F_p, finite dimensional in each degree, equipped with a choice
/// of ordered basis in each degree. Basis elements of the algebra are referred to by their degree
/// and index, and homogeneous elements are referred to by the degree and an `FpVector` listing
/// the coefficients of the element in terms of the basis.
///
/// Since the graded algebra is often infinite dimensional, we cannot construct a complete
/// description of the algebra. Instead, we use the function `compute_basis(degree)`. When called,
/// the algebra should compute relevant data to be able to perform calculations up to degree
/// `degree`. It is the responsibility of users to ensure `compute_basis(degree)` is called before
/// calling other functions with the `degree` parameter.
///
/// Connectedness means the algebra is one dimensional in degree 0, spanned by the unit `(0, 0)`.
#[enum_dispatch]
pub trait Algebra: std::fmt::Display + Send + Sync + 'static {
    /// Returns the prime the algebra is over.
    fn prime(&self) -> ValidPrime;

    /// Computes the list of basis elements up to and including degree `degree`. One should be
    /// able to call compute_basis multiple times, and there should be little overhead when
    /// calling `compute_basis(degree)` multiple times with the same `degree`.
    fn compute_basis(&self, degree: i32);

    /// Gets the dimension of the algebra in degree `degree`. This is zero in negative degrees.
    fn dimension(&self, degree: i32) -> usize;

    /// Computes the product `r * s` of the two basis elements, and *adds* `coeff` times the
    /// result to `result`, which must have the dimension of the algebra in degree
    /// `r_degree + s_degree`.
    fn multiply_basis_elements(
        &self,
        result: &mut FpVector,
        coeff: u32,
        r_degree: i32,
        r_idx: usize,
        s_degree: i32,
        s_idx: usize,
    );

    fn multiply_basis_element_by_element(
        &self,
        result: &mut FpVector,
        coeff: u32,
        r_degree: i32,
        r_idx: usize,
        s_degree: i32,
        s: &FpVector,
    ) {
        let p = self.prime();
        for (i, v) in s.iter_nonzero() {
            self.multiply_basis_elements(result, p.product(coeff, v), r_degree, r_idx, s_degree, i);
        }
    }

    fn multiply_element_by_element(
        &self,
        result: &mut FpVector,
        coeff: u32,
        r_degree: i32,
        r: &FpVector,
        s_degree: i32,
        s: &FpVector,
    ) {
        let p = self.prime();
        for (i, v) in r.iter_nonzero() {
            self.multiply_basis_element_by_element(
                result,
                p.product(coeff, v),
                r_degree,
                i,
                s_degree,
                s,
            );
        }
    }

    /// Converts a basis element into a string for display.
    fn basis_element_to_string(&self, degree: i32, idx: usize) -> String;

    /// Converts a homogeneous element into a string for display.
    fn element_to_string(&self, degree: i32, element: &FpVector) -> String {
        let mut result = String::new();
        let mut zero = true;
        for (idx, value) in element.iter_nonzero() {
            zero = false;
            if value != 1 {
                result.push_str(&format!("{value} "));
            }
            let b = self.basis_element_to_string(degree, idx);
            result.push_str(&format!("{b} + "));
        }
        if zero {
            result.push('0');
        } else {
            // Remove trailing " + "
            result.truncate(result.len() - 3);
        }
        result
    }
}
