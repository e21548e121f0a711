pub mod math;

mod absent_resource_list;
mod angle;
mod bounding_sphere;
mod elevation_model;
mod error;
mod frustum;
mod globe;
mod intersection_tests;
mod level_set;
mod line;
mod plane;
mod position;
mod sector;
mod tile_key;
mod view;

pub use absent_resource_list::*;
pub use angle::*;
pub use bounding_sphere::*;
pub use elevation_model::*;
pub use error::*;
pub use frustum::*;
pub use globe::*;
pub use intersection_tests::*;
pub use level_set::*;
pub use line::*;
pub use math::*;
pub use plane::*;
pub use position::*;
pub use sector::*;
pub use tile_key::*;
pub use view::*;
