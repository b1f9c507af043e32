pub mod backend;
pub mod config;
pub mod dashboard;
pub mod dem;
pub mod poll;
pub mod submit;
pub mod viewer;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::*;
pub use config::*;
pub use dashboard::*;
pub use dem::*;
pub use poll::*;
pub use submit::*;
pub use viewer::*;
