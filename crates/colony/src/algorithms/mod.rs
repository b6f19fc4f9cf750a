pub mod preprocessing;
pub mod morphology;
pub mod separation;
pub mod extraction;
pub mod filtering;

pub use preprocessing::*;
pub use morphology::*;
pub use separation::*;
pub use extraction::*;
pub use filtering::*;
