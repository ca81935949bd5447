use anyhow::{anyhow, Result};

use crate::cli::{Commands, FilesCommand};

use super::container::Container;
use super::controller::{
    AskController, FilesController, IngestController, SearchController, StatsController,
};

pub struct Router<'a> {
    ingest_controller: IngestController<'a>,
    search_controller: SearchController<'a>,
    ask_controller: AskController<'a>,
    files_controller: FilesController<'a>,
    stats_controller: StatsController<'a>,
}

impl<'a> Router<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self {
            ingest_controller: IngestController::new(container),
            search_controller: SearchController::new(container),
            ask_controller: AskController::new(container),
            files_controller: FilesController::new(container),
            stats_controller: StatsController::new(container),
        }
    }

    pub async fn route(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Ingest { paths, no_progress } => {
                self.ingest_controller.ingest(paths, !no_progress).await
            }
            Commands::Search {
                query,
                num,
                min_score,
                file,
            } => {
                self.search_controller
                    .search(query, num, min_score, file)
                    .await
            }
            Commands::Ask { question } => self.ask_controller.ask(question).await,
            Commands::Chat => self.ask_controller.chat().await,
            Commands::Files { action } => match action.unwrap_or(FilesCommand::List) {
                FilesCommand::List => self.files_controller.list().await,
                FilesCommand::Show { id } => self.files_controller.show(id).await,
                FilesCommand::Upload { path, content_type } => {
                    self.files_controller.upload(path, content_type).await
                }
                FilesCommand::Process { id } => self.files_controller.process(id).await,
                FilesCommand::Delete { id } => self.files_controller.delete(id).await,
            },
            Commands::Stats => self.stats_controller.stats().await,
            Commands::Serve { .. } => Err(anyhow!(
                "The serve command starts the HTTP server and cannot be routed"
            )),
        }
    }
}
