use std::io::Write;

use anyhow::{anyhow, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::application::Answer;
use crate::domain::ChatHistory;

use super::super::Container;

const NO_LLM: &str = "No language model configured. Set OPENAI_API_KEY to ask questions.";

pub struct AskController<'a> {
    container: &'a Container,
}

impl<'a> AskController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn ask(&self, question: String) -> Result<String> {
        let use_case = self.container.answer_use_case().ok_or_else(|| anyhow!(NO_LLM))?;

        let answer = use_case.execute(&question, &ChatHistory::new()).await?;
        Ok(format_answer(&answer))
    }

    /// Reads questions from stdin until EOF or `exit`, keeping one session.
    pub async fn chat(&self) -> Result<String> {
        let sessions = self.container.chat_sessions().ok_or_else(|| anyhow!(NO_LLM))?;
        let mut session_id: Option<String> = None;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("Ask questions about your documents. Type 'clear' to start over, 'exit' to quit.");

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let question = line.trim();
            match question {
                "" => continue,
                "exit" | "quit" => break,
                "clear" => {
                    if let Some(id) = session_id.take() {
                        sessions.clear(&id).await;
                    }
                    println!("Conversation cleared.");
                    continue;
                }
                _ => {}
            }

            match sessions.ask(session_id.as_deref(), question).await {
                Ok(reply) => {
                    println!("\n{}\n", format_answer(&reply.answer));
                    session_id = Some(reply.session_id);
                }
                Err(e) => eprintln!("Error: {}", e),
            }
        }

        Ok("Goodbye.".to_string())
    }
}

fn format_answer(answer: &Answer) -> String {
    let mut output = answer.answer.clone();
    if !answer.sources.is_empty() {
        output.push_str("\n\nSources:");
        for source in &answer.sources {
            output.push_str(&format!("\n  - {}", source.display_line()));
        }
    }
    output
}
