pub mod analysis;

pub use analysis::spatial::*;
pub use analysis::statistics::*;
