//! Reference collaborators backed by process memory.

pub mod memory;
pub mod recording;

pub use memory::InMemoryOrders;
pub use recording::{RecordingSink, SinkEvent};
