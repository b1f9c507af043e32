pub mod aoi;
pub mod dem;
pub mod detection;
pub mod geometry;
pub mod summary;

pub use aoi::*;
pub use dem::*;
pub use detection::*;
pub use summary::*;
