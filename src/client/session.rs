//! Chat session: the submit pipeline tying together validation, web search,
//! the relay call, stream consumption and history persistence.

use std::path::Path;

use url::Url;

use crate::client::attachments::PendingAttachments;
use crate::client::consumer::consume_stream;
use crate::client::conversation::{ConversationLog, recover_failed_turn};
use crate::client::store::{HistoryStore, JsonHistoryStore};
use crate::composer::DEFAULT_MODEL;
use crate::config::{ClientConfig, SearchConfig};
use crate::error::ChatError;
use crate::message::Message;
use crate::search::{SearchClient, SearchResult};
use crate::wire::{ChatRequest, ErrorBody, WireMessage};

/// One user's conversation with the relay.
///
/// A session keeps exactly one turn in flight: `submit` takes `&mut self`
/// and rejects a call while the previous turn's stream is still open.
pub struct ChatSession {
    http: reqwest::Client,
    chat_endpoint: String,
    search: SearchClient,
    store: Box<dyn HistoryStore>,
    log: ConversationLog,
    attachments: PendingAttachments,
    model: String,
    extended_thinking: bool,
    web_search: bool,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("chat_endpoint", &self.chat_endpoint)
            .field("model", &self.model)
            .field("extended_thinking", &self.extended_thinking)
            .field("web_search", &self.web_search)
            .finish_non_exhaustive()
    }
}

impl ChatSession {
    /// Create a session and load any persisted history.
    ///
    /// # Errors
    /// Returns [`ChatError::Validation`] for an invalid relay URL, or an
    /// error if an HTTP client cannot be created.
    pub async fn new(config: ClientConfig, search: SearchConfig) -> Result<Self, ChatError> {
        Url::parse(&config.relay_url)
            .map_err(|err| ChatError::Validation(format!("invalid relay URL: {err}")))?;
        let chat_endpoint = format!("{}/api/chat", config.relay_url.trim_end_matches('/'));

        // Connect timeout only: an open stream must be allowed to idle.
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;

        let store: Box<dyn HistoryStore> = Box::new(JsonHistoryStore::new(&config.history_path));
        let log = ConversationLog::from_messages(store.load().await?);

        Ok(Self {
            http,
            chat_endpoint,
            search: SearchClient::new(search)?,
            store,
            log,
            attachments: PendingAttachments::new(),
            model: DEFAULT_MODEL.to_string(),
            extended_thinking: false,
            web_search: false,
        })
    }

    /// All messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        self.log.messages()
    }

    /// Current logical model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Select a logical model name. Unknown names fall back to the default
    /// when the relay composes the request.
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    /// Toggle extended reasoning; returns the new state.
    pub fn toggle_thinking(&mut self) -> bool {
        self.extended_thinking = !self.extended_thinking;
        self.extended_thinking
    }

    /// Toggle web search; returns the new state.
    pub fn toggle_web_search(&mut self) -> bool {
        self.web_search = !self.web_search;
        self.web_search
    }

    /// Whether web search credentials are configured.
    #[must_use]
    pub const fn search_configured(&self) -> bool {
        self.search.is_configured()
    }

    /// Stage a file as an attachment for the next turn.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or its type is
    /// unsupported.
    pub async fn attach(&mut self, path: &Path) -> Result<(), ChatError> {
        self.attachments.attach_file(path).await
    }

    /// Counts of staged attachments as `(images, documents)`.
    #[must_use]
    pub fn pending_attachments(&self) -> (usize, usize) {
        (
            self.attachments.image_count(),
            self.attachments.document_count(),
        )
    }

    /// Submit one user turn and stream the assistant's reply into the log.
    ///
    /// Every decoded fragment is echoed to `on_fragment` as it arrives.
    /// Transport and relay failures recover into the fixed apology message;
    /// only an invalid submission is returned as an error.
    ///
    /// # Errors
    /// Returns [`ChatError::Validation`] when the turn is empty or a turn is
    /// already in flight.
    pub async fn submit<F>(&mut self, text: &str, on_fragment: F) -> Result<(), ChatError>
    where
        F: FnMut(&str),
    {
        if self.log.is_streaming() {
            return Err(ChatError::Validation(
                "a turn is already in flight".to_string(),
            ));
        }
        if text.trim().is_empty() && self.attachments.is_empty() {
            return Err(ChatError::Validation("nothing to send".to_string()));
        }

        let (images, documents) = self.attachments.drain();
        self.log
            .push_finalized(Message::user(text, images, documents))?;
        self.persist().await;

        let search_results = self.gather_search_results(text).await;

        let request = ChatRequest {
            messages: self.log.messages().iter().map(WireMessage::from).collect(),
            model: self.model.clone(),
            extended_thinking: self.extended_thinking,
            search_results,
        };

        if let Err(err) = self.stream_turn(&request, on_fragment).await {
            tracing::error!("chat turn failed: {err}");
            recover_failed_turn(&mut self.log);
        }
        self.persist().await;
        Ok(())
    }

    /// Clear the conversation, in memory and on disk.
    ///
    /// # Errors
    /// Returns an error if the persisted history cannot be removed.
    pub async fn clear(&mut self) -> Result<(), ChatError> {
        self.log.clear();
        self.store.clear().await
    }

    /// Run the optional pre-send web search, degrading to no results.
    async fn gather_search_results(&self, text: &str) -> Vec<SearchResult> {
        if !self.web_search || text.trim().is_empty() {
            return Vec::new();
        }
        match self.search.search(text).await {
            Ok(results) => results,
            Err(err) => {
                tracing::warn!("web search failed, continuing without results: {err}");
                Vec::new()
            }
        }
    }

    /// POST the composed request and fold the response stream into the log.
    async fn stream_turn<F>(&mut self, request: &ChatRequest, on_fragment: F) -> Result<(), ChatError>
    where
        F: FnMut(&str),
    {
        let response = self
            .http
            .post(&self.chat_endpoint)
            .json(request)
            .send()
            .await
            .map_err(|err| ChatError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| format!("relay returned status {status}"));
            return Err(ChatError::Upstream(message));
        }

        let stream = Box::pin(response.bytes_stream());
        consume_stream(stream, &mut self.log, on_fragment).await
    }

    /// Rewrite the persisted history; failures degrade with a warning.
    async fn persist(&self) {
        if let Err(err) = self.store.save(self.log.messages()).await {
            tracing::warn!("failed to persist history: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_session(dir: &tempfile::TempDir) -> ChatSession {
        let config = ClientConfig::default()
            .with_relay_url("http://127.0.0.1:1")
            .with_history_path(dir.path().join("history.json"));
        ChatSession::new(config, SearchConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_submission_is_rejected_before_any_network_call() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = test_session(&dir).await;

        let err = session.submit("   ", |_| {}).await.unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_relay_url_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::default()
            .with_relay_url("not a url")
            .with_history_path(dir.path().join("history.json"));
        let err = ChatSession::new(config, SearchConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unreachable_relay_recovers_with_apology() {
        // Port 1 is never listening, so the POST fails at the transport
        // level; the turn must degrade to the apology message instead of
        // surfacing an error.
        let dir = tempfile::tempdir().unwrap();
        let mut session = test_session(&dir).await;

        session.submit("hello", |_| {}).await.unwrap();

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "hello");
        assert_eq!(messages[1].text, crate::message::APOLOGY_TEXT);
    }

    #[tokio::test]
    async fn test_history_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut session = test_session(&dir).await;
            session.submit("persisted?", |_| {}).await.unwrap();
        }

        let session = test_session(&dir).await;
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[0].text, "persisted?");
    }

    #[tokio::test]
    async fn test_clear_removes_memory_and_disk_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = test_session(&dir).await;
        session.submit("hello", |_| {}).await.unwrap();
        session.clear().await.unwrap();
        assert!(session.messages().is_empty());

        let reloaded = test_session(&dir).await;
        assert!(reloaded.messages().is_empty());
    }

    #[tokio::test]
    async fn test_toggles() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = test_session(&dir).await;
        assert!(session.toggle_thinking());
        assert!(!session.toggle_thinking());
        assert!(session.toggle_web_search());
        assert_eq!(session.model(), DEFAULT_MODEL);
        session.set_model("opus-4.1");
        assert_eq!(session.model(), "opus-4.1");
    }
}
