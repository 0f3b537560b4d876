mod module_trait;
pub use module_trait::Module;

pub mod free_module;
pub use free_module::{FreeModule, OperationGeneratorPair};

mod free_module_element;
pub use free_module_element::{FreeModuleElement, PresentationError};
