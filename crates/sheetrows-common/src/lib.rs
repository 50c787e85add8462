pub mod grid;
pub mod image;
pub mod record;

pub use grid::*;
pub use image::*;
pub use record::*;
