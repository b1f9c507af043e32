pub mod document;
pub mod pdf;

pub use document::*;
pub use pdf::*;
