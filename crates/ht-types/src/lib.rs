pub mod errors;
pub mod reduction;
pub mod values;

pub use errors::*;
pub use reduction::*;
pub use values::*;
