//! Embassy async tasks
//!
//! Edge tasks run on the interrupt-priority executor; everything else runs
//! on the thread-mode executor and talks through [`crate::channels`].

pub mod edges;
pub mod link_rx;
pub mod link_tx;
pub mod publisher;
pub mod settings;

pub use edges::{pickup_edge_task, spark_edge_task};
pub use link_rx::link_rx_task;
pub use link_tx::link_tx_task;
pub use publisher::{publisher_task, PublisherConfig};
pub use settings::settings_task;
