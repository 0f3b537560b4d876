//! Elements of finitely generated free modules over the Steenrod algebra and their coordinate
//! vectors.
//!
//! The algebra and module types live in the [`algebra`] crate and the linear algebra in [`fp`].
//! This crate constructs modules from JSON specifications, such as the ones bundled in the
//! `modules` directory:
//!
//! ```
//! use freegraded::algebra::module::Module;
//!
//! let module = freegraded::utils::construct("free_1_7@milnor").unwrap();
//! let x = module.an_element(7);
//! assert_eq!(x.to_string(), "Sq(0,2) g0 + g1");
//! assert_eq!(module.element_from_coordinates(x.vector_presentation().unwrap().unwrap(), 7), x);
//! assert_eq!(module.dimension(7), 4);
//! ```

#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_arguments)]

pub mod utils;

pub use algebra;
pub use fp;
