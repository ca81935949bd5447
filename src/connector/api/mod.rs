pub mod container;
pub mod controller;
pub mod router;

pub use container::{Container, ContainerConfig, StorageBackend};
pub use router::Router;
