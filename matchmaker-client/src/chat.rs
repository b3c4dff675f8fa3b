use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::MatchmakerApi;
use crate::error::Result;

pub const GREETING: &str = "Hello! I'm your AI Clinical Assistant. How can I help you today?";
pub const EMPTY_ANSWER_FALLBACK: &str = "Sorry, I couldn't understand that.";
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Bot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Bot,
            content: content.into(),
        }
    }
}

/// The remote assistant seam; swapped for a scripted fake in tests
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn ask(&self, question: &str) -> Result<String>;
}

#[async_trait]
impl Assistant for MatchmakerApi {
    async fn ask(&self, question: &str) -> Result<String> {
        self.ask_chatbot(question).await
    }
}

/// Ordered chat transcript seeded with a fixed greeting.
///
/// The user entry is appended optimistically before the request goes out;
/// on failure the transcript keeps it and gains a generic error entry
/// instead. No retry, no cancellation.
pub struct ChatSession {
    transcript: Vec<ChatMessage>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            transcript: vec![ChatMessage::bot(GREETING)],
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Send one question. Blank input is a no-op returning `None`; otherwise
    /// the bot entry appended to the transcript is returned.
    pub async fn send(
        &mut self,
        assistant: &dyn Assistant,
        question: &str,
    ) -> Option<&ChatMessage> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        self.transcript.push(ChatMessage::user(question));

        let reply = match assistant.ask(question).await {
            Ok(answer) if answer.trim().is_empty() => {
                ChatMessage::bot(EMPTY_ANSWER_FALLBACK)
            }
            Ok(answer) => ChatMessage::bot(answer),
            Err(e) => {
                debug!(error = %e, "assistant request failed");
                ChatMessage::bot(NETWORK_ERROR_MESSAGE)
            }
        };
        self.transcript.push(reply);
        self.transcript.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    struct ScriptedAssistant {
        reply: Result<String>,
    }

    #[async_trait]
    impl Assistant for ScriptedAssistant {
        async fn ask(&self, _question: &str) -> Result<String> {
            match &self.reply {
                Ok(s) => Ok(s.clone()),
                Err(_) => Err(ClientError::api(500, "down")),
            }
        }
    }

    #[tokio::test]
    async fn transcript_starts_with_the_greeting() {
        let chat = ChatSession::new();
        assert_eq!(chat.transcript().len(), 1);
        assert_eq!(chat.transcript()[0].role, ChatRole::Bot);
        assert_eq!(chat.transcript()[0].content, GREETING);
    }

    #[tokio::test]
    async fn blank_question_is_a_no_op() {
        let mut chat = ChatSession::new();
        let assistant = ScriptedAssistant {
            reply: Ok("ignored".into()),
        };
        assert!(chat.send(&assistant, "   ").await.is_none());
        assert_eq!(chat.transcript().len(), 1);
    }

    #[tokio::test]
    async fn answer_is_appended_after_the_user_entry() {
        let mut chat = ChatSession::new();
        let assistant = ScriptedAssistant {
            reply: Ok("Trials usually require informed consent.".into()),
        };
        chat.send(&assistant, " What is consent? ").await;

        let t = chat.transcript();
        assert_eq!(t.len(), 3);
        assert_eq!(t[1].role, ChatRole::User);
        assert_eq!(t[1].content, "What is consent?");
        assert_eq!(t[2].role, ChatRole::Bot);
        assert_eq!(t[2].content, "Trials usually require informed consent.");
    }

    #[tokio::test]
    async fn empty_answer_gets_the_fallback_text() {
        let mut chat = ChatSession::new();
        let assistant = ScriptedAssistant {
            reply: Ok("  ".into()),
        };
        let reply = chat.send(&assistant, "hm").await.unwrap();
        assert_eq!(reply.content, EMPTY_ANSWER_FALLBACK);
    }

    #[tokio::test]
    async fn failure_keeps_the_user_entry_and_adds_an_error_entry() {
        let mut chat = ChatSession::new();
        let assistant = ScriptedAssistant {
            reply: Err(ClientError::api(500, "down")),
        };
        chat.send(&assistant, "hello?").await;

        let t = chat.transcript();
        assert_eq!(t.len(), 3);
        assert_eq!(t[1].content, "hello?");
        assert_eq!(t[2].content, NETWORK_ERROR_MESSAGE);
    }
}
