//! The [`Algebra`] trait and the algebras we act by: the Steenrod algebra in the Milnor basis,
//! optionally restricted by a profile, and the ground field.

mod algebra_trait;
pub use algebra_trait::Algebra;

pub mod combinatorics;

mod element;
pub use element::{AlgebraElement, DegreeError};

pub mod field;
pub use field::Field;

pub mod milnor_algebra;
pub use milnor_algebra::{MilnorAlgebra, MilnorBasisElement, MilnorProfile};

mod steenrod_algebra;
pub use steenrod_algebra::{AlgebraSpecError, SteenrodAlgebra};
