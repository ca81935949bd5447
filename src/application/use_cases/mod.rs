mod answer_question;
mod chat_sessions;
mod delete_file;
mod ingest_documents;
mod list_files;
mod search_documents;
mod upload_file;

pub use answer_question::*;
pub use chat_sessions::*;
pub use delete_file::*;
pub use ingest_documents::*;
pub use list_files::*;
pub use search_documents::*;
pub use upload_file::*;
