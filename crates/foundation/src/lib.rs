pub mod bounds;
pub mod ids;
pub mod numfmt;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use ids::*;
pub use numfmt::*;
