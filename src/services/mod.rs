pub mod shelf_packer;

pub use shelf_packer::{PackOutcome, Placement, Shelf, ShelfPacker};
