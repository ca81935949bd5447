use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ragops::connector::http;
use ragops::{Commands, Container, ContainerConfig, Router};

#[derive(Parser)]
#[command(name = "ragops")]
#[command(author, version, about = "Document question answering over PDF, CSV and XLSX files", long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(long, global = true, env = "VECTORSTORE_PATH", default_value = "./data/vectorstore")]
    vectorstore_path: String,

    #[arg(long, global = true, env = "UPLOAD_DIR", default_value = "./data/uploads")]
    upload_dir: String,

    #[arg(long, global = true, env = "RAGOPS_COLLECTION", default_value = "documents")]
    collection: String,

    #[arg(long, global = true, env = "CHUNK_SIZE", default_value = "1500")]
    chunk_size: usize,

    #[arg(long, global = true, env = "CHUNK_OVERLAP", default_value = "200")]
    chunk_overlap: usize,

    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    #[arg(long, global = true, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com")]
    openai_base_url: String,

    #[arg(long, global = true, env = "OPENAI_MODEL", default_value = "gpt-3.5-turbo")]
    chat_model: String,

    #[arg(
        long,
        global = true,
        env = "OPENAI_EMBEDDING_MODEL",
        default_value = "text-embedding-ada-002"
    )]
    embedding_model: String,

    /// Offline embeddings; search quality is meaningless but the pipeline runs
    #[arg(long, global = true)]
    mock_embeddings: bool,

    #[arg(long, global = true)]
    memory_storage: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn container_config(&self) -> ContainerConfig {
        ContainerConfig {
            vectorstore_path: expand_tilde(&self.vectorstore_path),
            upload_dir: expand_tilde(&self.upload_dir),
            collection: self.collection.clone(),
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            mock_embeddings: self.mock_embeddings,
            memory_storage: self.memory_storage,
            openai_api_key: self.openai_api_key.clone(),
            openai_base_url: self.openai_base_url.clone(),
            chat_model: self.chat_model.clone(),
            embedding_model: self.embedding_model.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.container_config();
    std::fs::create_dir_all(PathBuf::from(&config.upload_dir))?;
    if !config.memory_storage {
        std::fs::create_dir_all(PathBuf::from(&config.vectorstore_path))?;
    }

    let container = Container::new(config).await?;

    match cli.command {
        Commands::Serve { host, port } => {
            info!(
                "Uploads in {}, vectors in {}",
                container.upload_dir(),
                container.storage()
            );
            http::serve(Arc::new(container), &format!("{}:{}", host, port)).await?;
        }
        command => {
            let router = Router::new(&container);
            let output = router.route(command).await?;
            println!("{}", output);
        }
    }

    Ok(())
}

fn expand_tilde(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            if path == "~" {
                return home.to_string_lossy().to_string();
            }
            return path.replacen("~", &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use ragops::FilesCommand;

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["ragops", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 8000);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ragops",
            "search",
            "quarterly revenue",
            "-n",
            "3",
            "--memory-storage",
            "--chunk-size",
            "500",
        ])
        .unwrap();

        assert!(cli.memory_storage);
        assert_eq!(cli.chunk_size, 500);
        match cli.command {
            Commands::Search { query, num, .. } => {
                assert_eq!(query, "quarterly revenue");
                assert_eq!(num, 3);
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn files_subcommands() {
        let cli = Cli::try_parse_from(["ragops", "files", "delete", "4"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Files {
                action: Some(FilesCommand::Delete { id: 4 })
            }
        ));

        let cli = Cli::try_parse_from(["ragops", "files"]).unwrap();
        assert!(matches!(cli.command, Commands::Files { action: None }));
    }

    #[test]
    fn ingest_requires_a_path() {
        assert!(Cli::try_parse_from(["ragops", "ingest"]).is_err());
    }

    #[test]
    fn expand_tilde_leaves_relative_paths() {
        assert_eq!(expand_tilde("./data/uploads"), "./data/uploads");
    }
}
