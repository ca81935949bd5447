use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{Answer, AnswerQuestionUseCase};
use crate::domain::{ChatHistory, ChatTurn, DomainError};

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub session_id: String,
    pub answer: Answer,
}

pub const MAX_SESSIONS: usize = 1000;
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

struct Session {
    history: ChatHistory,
    last_used: Instant,
}

/// Conversation histories keyed by session id, kept in memory.
///
/// Sessions idle for longer than the TTL are dropped, and once the cap is
/// reached the least recently used session makes room for a new one.
pub struct ChatSessionStore {
    answer: Arc<AnswerQuestionUseCase>,
    sessions: RwLock<HashMap<String, Session>>,
    max_sessions: usize,
    idle_ttl: Duration,
}

impl ChatSessionStore {
    pub fn new(answer: Arc<AnswerQuestionUseCase>) -> Self {
        Self {
            answer,
            sessions: RwLock::new(HashMap::new()),
            max_sessions: MAX_SESSIONS,
            idle_ttl: SESSION_IDLE_TTL,
        }
    }

    pub fn with_limits(mut self, max_sessions: usize, idle_ttl: Duration) -> Self {
        self.max_sessions = max_sessions.max(1);
        self.idle_ttl = idle_ttl;
        self
    }

    /// Answers within a session. A missing id starts a new session; an
    /// unknown id starts an empty history under that id.
    pub async fn ask(
        &self,
        session_id: Option<&str>,
        question: &str,
    ) -> Result<ChatReply, DomainError> {
        let session_id = match session_id.map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        };

        let history = self
            .sessions
            .read()
            .await
            .get(&session_id)
            .map(|session| session.history.clone())
            .unwrap_or_default();

        let answer = self.answer.execute(question, &history).await?;

        let mut sessions = self.sessions.write().await;
        self.prune(&mut sessions, &session_id);
        let session = sessions.entry(session_id.clone()).or_insert_with(|| Session {
            history: ChatHistory::default(),
            last_used: Instant::now(),
        });
        session.history.push(ChatTurn::new(question.trim(), answer.answer.clone()));
        session.last_used = Instant::now();
        debug!(
            "Session {} now has {} turns",
            session_id,
            session.history.len()
        );

        Ok(ChatReply { session_id, answer })
    }

    /// Drops idle sessions, then evicts the least recently used ones until
    /// `keep` fits under the cap.
    fn prune(&self, sessions: &mut HashMap<String, Session>, keep: &str) {
        let before = sessions.len();
        sessions.retain(|id, session| id == keep || session.last_used.elapsed() < self.idle_ttl);

        let limit = if sessions.contains_key(keep) {
            self.max_sessions
        } else {
            self.max_sessions - 1
        };
        while sessions.len() > limit {
            let oldest = sessions
                .iter()
                .filter(|(id, _)| id.as_str() != keep)
                .min_by_key(|(_, session)| session.last_used)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                }
                None => break,
            }
        }

        if sessions.len() < before {
            debug!("Evicted {} chat sessions", before - sessions.len());
        }
    }

    pub async fn history(&self, session_id: &str) -> Option<ChatHistory> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|session| session.history.clone())
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn clear(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::answer_question::tests::{
        answer_use_case, RecordingChatClient,
    };

    #[tokio::test]
    async fn test_sessions_accumulate_history() {
        let chat = Arc::new(RecordingChatClient::default());
        let store = ChatSessionStore::new(Arc::new(answer_use_case(chat.clone()).await));

        let first = store.ask(None, "first question").await.unwrap();
        assert!(Uuid::parse_str(&first.session_id).is_ok());

        let second = store
            .ask(Some(&first.session_id), "second question")
            .await
            .unwrap();
        assert_eq!(second.session_id, first.session_id);

        let history = store.history(&first.session_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.turns()[0].question, "first question");

        let prompts = chat.prompts.lock().await;
        assert!(!prompts[0].contains("Q: first question"));
        assert!(prompts[1].contains("Q: first question\nA: Revenue grew 12%."));
    }

    #[tokio::test]
    async fn test_least_recently_used_session_is_evicted_at_cap() {
        let chat = Arc::new(RecordingChatClient::default());
        let store = ChatSessionStore::new(Arc::new(answer_use_case(chat).await))
            .with_limits(2, Duration::from_secs(3600));

        store.ask(Some("a"), "one").await.unwrap();
        store.ask(Some("b"), "two").await.unwrap();
        store.ask(Some("a"), "three").await.unwrap();
        store.ask(Some("c"), "four").await.unwrap();

        assert_eq!(store.session_count().await, 2);
        assert!(store.history("b").await.is_none());
        assert_eq!(store.history("a").await.unwrap().len(), 2);
        assert_eq!(store.history("c").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let chat = Arc::new(RecordingChatClient::default());
        let store = ChatSessionStore::new(Arc::new(answer_use_case(chat).await))
            .with_limits(100, Duration::ZERO);

        for _ in 0..5 {
            store.ask(None, "anonymous question").await.unwrap();
        }
        assert_eq!(store.session_count().await, 1);

        store.ask(Some("kept"), "first").await.unwrap();
        store.ask(Some("kept"), "second").await.unwrap();
        assert_eq!(store.history("kept").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_answer_leaves_history_untouched() {
        let chat = Arc::new(RecordingChatClient::default());
        let store = ChatSessionStore::new(Arc::new(answer_use_case(chat).await));

        assert!(store.ask(Some("s1"), "").await.is_err());
        assert!(store.history("s1").await.is_none());
        assert!(!store.clear("s1").await);
    }
}
