use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::SearchDocumentsUseCase;
use crate::application::ChatClient;
use crate::domain::{ChatHistory, DomainError, SearchResult, HISTORY_WINDOW};

/// Chunks retrieved as context for each question.
pub const CONTEXT_TOP_K: usize = 3;

const PROMPT_TEMPLATE: &str = "You are a helpful AI assistant. Using the following context, answer the user's question.
If you cannot answer the question based on the context, say so.

Context: {context}
Chat History: {chat_history}
Question: {question}

Answer the question based on the context provided. If uncertain, admit it.
Make your response clear and well-structured.";

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SearchResult>,
}

/// Answers a question from retrieved context and recent conversation.
pub struct AnswerQuestionUseCase {
    search: Arc<SearchDocumentsUseCase>,
    chat_client: Arc<dyn ChatClient>,
    top_k: usize,
}

impl AnswerQuestionUseCase {
    pub fn new(search: Arc<SearchDocumentsUseCase>, chat_client: Arc<dyn ChatClient>) -> Self {
        Self {
            search,
            chat_client,
            top_k: CONTEXT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub async fn execute(
        &self,
        question: &str,
        history: &ChatHistory,
    ) -> Result<Answer, DomainError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(DomainError::invalid_input("Question must not be empty"));
        }

        let sources = self.search.retrieve_with_scores(question, self.top_k).await?;
        let context = sources
            .iter()
            .map(|r| r.chunk().content())
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = build_prompt(&context, &history.format_recent(HISTORY_WINDOW), question);

        info!(
            "Asking {} with {} context chunks",
            self.chat_client.model(),
            sources.len()
        );
        let completion = self.chat_client.complete("", &prompt).await?;

        Ok(Answer {
            answer: completion.trim().to_string(),
            sources,
        })
    }
}

pub fn build_prompt(context: &str, chat_history: &str, question: &str) -> String {
    PROMPT_TEMPLATE
        .replace("{context}", context)
        .replace("{chat_history}", chat_history)
        .replace("{question}", question)
}
