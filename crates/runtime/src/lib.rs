pub mod event_bus;
pub mod store;

pub use event_bus::*;
pub use store::*;
