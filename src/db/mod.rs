mod repository;
mod schema;

pub use repository::{FeaturedTable, Repository};
