pub mod box_buffer;
pub mod counters;

pub use box_buffer::BoxBuffer;
pub use counters::{Counters, CountersSnapshot, Tally, TallySnapshot};
