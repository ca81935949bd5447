use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API
    Serve {
        #[arg(long, env = "RAGOPS_HOST", default_value = "127.0.0.1")]
        host: String,

        #[arg(short, long, env = "RAGOPS_PORT", default_value = "8000")]
        port: u16,
    },

    /// Ingest PDF, CSV and XLSX files or whole directories
    Ingest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Semantic search over ingested documents
    Search {
        query: String,

        #[arg(short, long, default_value = "5")]
        num: usize,

        #[arg(short, long)]
        min_score: Option<f32>,

        /// Only search chunks from these file names
        #[arg(short, long)]
        file: Option<Vec<String>>,
    },

    /// Answer a single question from the ingested documents
    Ask { question: String },

    /// Interactive question answering with conversation history
    Chat,

    /// Manage uploaded files
    Files {
        #[command(subcommand)]
        action: Option<FilesCommand>,
    },

    Stats,
}

#[derive(Subcommand)]
pub enum FilesCommand {
    List,

    Show { id: u64 },

    /// Register a file as if it was uploaded through the API
    Upload {
        path: PathBuf,

        /// Defaults to the canonical MIME type of the extension
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Extract and embed an uploaded file
    Process { id: u64 },

    Delete { id: u64 },
}
