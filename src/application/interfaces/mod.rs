mod chat_client;
mod embedding_service;
mod file_repository;
mod text_extractor;
mod vector_repository;

pub use chat_client::*;
pub use embedding_service::*;
pub use file_repository::*;
pub use text_extractor::*;
pub use vector_repository::*;
