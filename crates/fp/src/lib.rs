//! Linear algebra over the prime fields $\mathbb{F}_p$.
//!
//! This crate provides the arithmetic of $\mathbb{F}_p$ ([`prime`]), a limb-packed coordinate
//! vector ([`vector::FpVector`]) and the finite dimensional coordinate spaces these vectors live
//! in ([`space::VectorSpace`]).

#![allow(clippy::many_single_char_names)]

pub mod prime;
pub mod space;
pub mod vector;

/// The largest prime we accept. Entries of vectors are stored in 64 bit limbs and products of two
/// entries must fit in a `u32`.
pub const MAX_PRIME: u32 = 1 << 16;
