mod draw_context;
mod error;
mod sector_geometry;
mod sector_geometry_list;
pub mod tessellator;

pub use draw_context::*;
pub use error::*;
pub use sector_geometry::*;
pub use sector_geometry_list::*;
pub use tessellator::*;
