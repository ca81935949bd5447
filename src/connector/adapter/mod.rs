mod duckdb_file_repository;
mod duckdb_vector_repository;
mod file_text_extractor;
mod in_memory_file_repository;
mod in_memory_vector_repository;
mod mock_embedding;
mod openai_chat_client;
mod openai_embedding;

pub use duckdb_file_repository::*;
pub use duckdb_vector_repository::*;
pub use file_text_extractor::*;
pub use in_memory_file_repository::*;
pub use in_memory_vector_repository::*;
pub use mock_embedding::*;
pub use openai_chat_client::*;
pub use openai_embedding::*;
