pub mod preprocessing;
pub mod extraction;
pub mod detection;
pub mod geometry;

pub use preprocessing::*;
pub use extraction::*;
pub use detection::*;
pub use geometry::*;
