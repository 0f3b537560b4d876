//! Connected graded algebras over $\mathbb{F}_p$, chiefly the mod p Steenrod algebra, and the
//! finitely generated free modules over them.
//!
//! Elements of a free module are symbolic combinations of generators with algebra coefficients
//! ([`module::FreeModuleElement`]). A homogeneous element corresponds to a coordinate vector in
//! the basis of its degree, and [`module::FreeModule::element_from_coordinates`] goes back.

pub mod module;

mod algebra;
pub use crate::algebra::*;
