//! Pure domain services: text splitting and size formatting.

mod size;
mod text_splitter;

pub use size::*;
pub use text_splitter::*;
