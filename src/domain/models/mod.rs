mod chat;
mod document;
mod embedding;
mod file_record;
mod file_type;
mod search_result;

pub use chat::*;
pub use document::*;
pub use embedding::*;
pub use file_record::*;
pub use file_type::*;
pub use search_result::*;
