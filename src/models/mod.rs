pub mod cell;
mod device;
mod plan;
mod summary;

pub use cell::{NodeCells, RadioFamily, SortedCells};
pub use device::{product_number, DeviceType};
pub use plan::*;
pub use summary::*;
