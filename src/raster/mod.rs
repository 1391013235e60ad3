mod distance;
mod occupancy;

pub use distance::{compute_distances, DistanceField};
pub use occupancy::{rasterize, OccupancyGrid};
