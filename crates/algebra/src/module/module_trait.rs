use std::sync::Arc;

use itertools::Itertools;

use crate::algebra::Algebra;
use fp::prime::ValidPrime;
use fp::vector::FpVector;

/// A graded module over an algebra, with a chosen ordered basis in each degree. As with
/// [`Algebra`], elements of a fixed degree are coordinate vectors in this basis.
pub trait Module: std::fmt::Display + Send + Sync + 'static {
    type Algebra: Algebra;

    fn algebra(&self) -> Arc<Self::Algebra>;

    fn min_degree(&self) -> i32;

    /// Computes the basis up to and including degree `degree`. Should be cheap when the basis is
    /// already known.
    fn compute_basis(&self, _degree: i32) {}

    fn dimension(&self, degree: i32) -> usize;

    /// Adds `coeff` times the action of the algebra basis element `(op_degree, op_index)` on the
    /// module basis element `(mod_degree, mod_index)` to `result`.
    fn act_on_basis(
        &self,
        result: &mut FpVector,
        coeff: u32,
        op_degree: i32,
        op_index: usize,
        mod_degree: i32,
        mod_index: usize,
    );

    fn basis_element_to_string(&self, degree: i32, idx: usize) -> String;

    fn prime(&self) -> ValidPrime {
        self.algebra().prime()
    }

    fn act(
        &self,
        result: &mut FpVector,
        coeff: u32,
        op_degree: i32,
        op_index: usize,
        input_degree: i32,
        input: &FpVector,
    ) {
        assert_eq!(input.len(), self.dimension(input_degree));
        let p = self.prime();
        for (i, v) in input.iter_nonzero() {
            self.act_on_basis(
                result,
                p.product(coeff, v),
                op_degree,
                op_index,
                input_degree,
                i,
            );
        }
    }

    fn act_by_element(
        &self,
        result: &mut FpVector,
        coeff: u32,
        op_degree: i32,
        op: &FpVector,
        input_degree: i32,
        input: &FpVector,
    ) {
        assert_eq!(op.len(), self.algebra().dimension(op_degree));
        let p = self.prime();
        for (i, v) in op.iter_nonzero() {
            self.act(
                result,
                p.product(coeff, v),
                op_degree,
                i,
                input_degree,
                input,
            );
        }
    }

    fn element_to_string(&self, degree: i32, element: &FpVector) -> String {
        let result = element
            .iter_nonzero()
            .map(|(idx, value)| {
                let coeff = if value == 1 {
                    String::new()
                } else {
                    format!("{value} ")
                };
                format!("{coeff}{}", self.basis_element_to_string(degree, idx))
            })
            .join(" + ");
        if result.is_empty() {
            "0".to_string()
        } else {
            result
        }
    }
}
