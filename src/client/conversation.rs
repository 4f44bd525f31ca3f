//! Owned conversation log with an append-only API for finalized messages and
//! a single mutable-in-place slot for the in-progress assistant message.
//!
//! Invariant: at most one message is in progress at a time, and it is always
//! the most recent entry.

use crate::error::ChatError;
use crate::message::Message;

/// Ordered conversation log, insertion order = chronological.
#[derive(Debug, Default)]
pub struct ConversationLog {
    messages: Vec<Message>,
    streaming: bool,
}

impl ConversationLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log from previously persisted messages.
    ///
    /// Restored messages are all finalized; a crash mid-stream leaves no
    /// in-progress marker behind.
    #[must_use]
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            streaming: false,
        }
    }

    /// All messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether an assistant message is currently receiving fragments.
    #[must_use]
    pub const fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// The most recent message, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Append a finalized message.
    ///
    /// # Errors
    /// Returns [`ChatError::Validation`] while an assistant message is in
    /// progress; the in-progress message must stay last.
    pub fn push_finalized(&mut self, message: Message) -> Result<(), ChatError> {
        if self.streaming {
            return Err(ChatError::Validation(
                "an assistant message is still in progress".to_string(),
            ));
        }
        self.messages.push(message);
        Ok(())
    }

    /// Begin a new in-progress assistant message.
    ///
    /// # Errors
    /// Returns [`ChatError::Validation`] if one is already in progress.
    pub fn begin_assistant(&mut self) -> Result<(), ChatError> {
        if self.streaming {
            return Err(ChatError::Validation(
                "an assistant message is already in progress".to_string(),
            ));
        }
        self.messages.push(Message::assistant());
        self.streaming = true;
        Ok(())
    }

    /// Append a text fragment to the in-progress assistant message.
    ///
    /// # Errors
    /// Returns [`ChatError::Validation`] if no message is in progress.
    pub fn append_fragment(&mut self, fragment: &str) -> Result<(), ChatError> {
        if !self.streaming {
            return Err(ChatError::Validation(
                "no assistant message is in progress".to_string(),
            ));
        }
        let Some(current) = self.messages.last_mut() else {
            return Err(ChatError::Validation(
                "conversation log is empty".to_string(),
            ));
        };
        current.text.push_str(fragment);
        Ok(())
    }

    /// Finalize the in-progress assistant message, if any.
    ///
    /// Idempotent; finalizing an idle log is a no-op.
    pub fn finalize(&mut self) {
        self.streaming = false;
    }

    /// Remove every message and reset the streaming state.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.streaming = false;
    }
}

/// Recover a failed turn: preserve any partial text already accumulated and
/// append the fixed apology message.
pub fn recover_failed_turn(log: &mut ConversationLog) {
    if log.is_streaming() {
        log.finalize();
    }
    if log.push_finalized(Message::apology()).is_err() {
        // Unreachable after finalize; kept so recovery can never panic.
        tracing::error!("failed to append apology message");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{APOLOGY_TEXT, Role};

    #[test]
    fn test_append_only_flow() {
        let mut log = ConversationLog::new();
        log.push_finalized(Message::user("hi", Vec::new(), Vec::new()))
            .unwrap();
        log.begin_assistant().unwrap();
        log.append_fragment("Hi").unwrap();
        log.append_fragment(" there").unwrap();
        log.append_fragment("!").unwrap();
        log.finalize();

        assert_eq!(log.len(), 2);
        assert_eq!(log.last().unwrap().text, "Hi there!");
        assert_eq!(log.last().unwrap().role, Role::Assistant);
        assert!(!log.is_streaming());
    }

    #[test]
    fn test_single_in_progress_invariant() {
        let mut log = ConversationLog::new();
        log.begin_assistant().unwrap();
        assert!(log.begin_assistant().is_err());
        assert!(log
            .push_finalized(Message::user("x", Vec::new(), Vec::new()))
            .is_err());

        log.finalize();
        assert!(log.begin_assistant().is_ok());
    }

    #[test]
    fn test_append_without_in_progress_is_rejected() {
        let mut log = ConversationLog::new();
        assert!(log.append_fragment("orphan").is_err());
    }

    #[test]
    fn test_recover_preserves_partial_and_appends_apology() {
        let mut log = ConversationLog::new();
        log.begin_assistant().unwrap();
        log.append_fragment("Hel").unwrap();

        recover_failed_turn(&mut log);

        assert_eq!(log.len(), 2);
        assert_eq!(log.messages()[0].text, "Hel");
        assert_eq!(log.messages()[1].text, APOLOGY_TEXT);
        assert!(!log.is_streaming());
    }

    #[test]
    fn test_recover_without_partial_only_apologizes() {
        let mut log = ConversationLog::new();
        recover_failed_turn(&mut log);
        assert_eq!(log.len(), 1);
        assert_eq!(log.messages()[0].text, APOLOGY_TEXT);
    }

    #[test]
    fn test_restored_log_is_idle() {
        let log = ConversationLog::from_messages(vec![Message::assistant()]);
        assert!(!log.is_streaming());
        assert_eq!(log.len(), 1);
    }
}
