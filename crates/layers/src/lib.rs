pub mod draw;
pub mod layer;
pub mod popup;
pub mod symbology;
pub mod vector;
pub mod view;
pub mod volume;

pub use draw::*;
pub use layer::*;
pub use popup::*;
pub use symbology::*;
pub use vector::*;
pub use view::*;
pub use volume::*;
