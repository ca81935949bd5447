use std::path::PathBuf;

use anyhow::Result;

use crate::application::IngestReport;

use super::super::Container;

pub struct IngestController<'a> {
    container: &'a Container,
}

impl<'a> IngestController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn ingest(&self, paths: Vec<PathBuf>, show_progress: bool) -> Result<String> {
        let use_case = self.container.ingest_use_case();
        let report = use_case.ingest_paths(&paths, show_progress).await?;

        Ok(self.format_report(&report))
    }

    fn format_report(&self, report: &IngestReport) -> String {
        let mut output = format!(
            "Ingested {} of {} files into {} chunks (collection: {})",
            report.documents,
            report.files,
            report.chunks,
            self.container.collection()
        );
        if report.skipped > 0 {
            output.push_str(&format!(
                "\nSkipped {} files that produced no text",
                report.skipped
            ));
        }
        output
    }
}
