//! Navigation primitives used by recovery behaviors
pub mod collision;
pub mod costmap;
pub mod free_direction;

pub use self::collision::CostmapCollisionChecker;
pub use self::costmap::{OccupancyGrid, SharedCostmap};
pub use self::free_direction::{find_best_direction, DirectionSearch, FreeArc};
