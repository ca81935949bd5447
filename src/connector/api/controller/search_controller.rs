use anyhow::Result;

use crate::domain::{SearchQuery, SearchResult};

use super::super::Container;

pub struct SearchController<'a> {
    container: &'a Container,
}

impl<'a> SearchController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn search(
        &self,
        query: String,
        num: usize,
        min_score: Option<f32>,
        files: Option<Vec<String>>,
    ) -> Result<String> {
        let mut search_query = SearchQuery::new(&query).with_limit(num);

        if let Some(score) = min_score {
            search_query = search_query.with_min_score(score);
        }

        if let Some(names) = files {
            search_query = search_query.with_file_names(names);
        }

        let use_case = self.container.search_use_case();
        let results = use_case.execute(search_query).await?;

        Ok(format_search_results(&results))
    }
}

pub(crate) fn format_search_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }

    let mut output = format!("Found {} results:\n\n", results.len());

    for (i, result) in results.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, result.display_line()));

        let preview: String = result
            .chunk()
            .content()
            .lines()
            .filter(|l| !l.trim().is_empty())
            .take(8)
            .map(|l| format!("   | {}", l))
            .collect::<Vec<_>>()
            .join("\n");
        output.push_str(&preview);
        output.push_str("\n\n");
    }

    output
}
