//! Stream consumer: folds the normalized event stream into the conversation.
//!
//! Generic over the chunk stream so it can be driven by an HTTP response body
//! in production and by canned chunks in tests.

use std::fmt;

use futures::{Stream, StreamExt};

use crate::client::conversation::ConversationLog;
use crate::error::ChatError;
use crate::sse::{NormalizedDecoder, StreamEvent};

/// Read a normalized stream to its end, folding fragments into the log.
///
/// On the first chunk a new empty assistant message is begun; every decoded
/// text fragment is appended to it and echoed to `on_fragment`. The
/// completion sentinel latches the decoder but does not close the transport;
/// the message finalizes when the stream itself ends. Malformed lines are
/// skipped inside the decoder and never surface here.
///
/// # Errors
/// Returns [`ChatError::Transport`] if the underlying read fails. The
/// partial text accumulated so far stays in the log, still in progress, for
/// the caller to recover.
pub async fn consume_stream<S, B, E, F>(
    mut stream: S,
    log: &mut ConversationLog,
    mut on_fragment: F,
) -> Result<(), ChatError>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: fmt::Display,
    F: FnMut(&str),
{
    let mut decoder = NormalizedDecoder::new();
    let mut started = false;

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => return Err(ChatError::Transport(err.to_string())),
        };

        if !started {
            log.begin_assistant()?;
            started = true;
        }

        for event in decoder.push(chunk.as_ref()) {
            match event {
                StreamEvent::Text(fragment) => {
                    log.append_fragment(&fragment)?;
                    on_fragment(&fragment);
                }
                StreamEvent::Done => {}
            }
        }
    }

    if started {
        log.finalize();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::conversation::recover_failed_turn;
    use crate::message::{APOLOGY_TEXT, Role};
    use crate::sse::encode_event;

    /// Transport failure stand-in for tests.
    #[derive(Debug)]
    struct BrokenPipe;

    impl fmt::Display for BrokenPipe {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "broken pipe")
        }
    }

    fn frame(text: &str) -> Vec<u8> {
        encode_event(&StreamEvent::Text(text.to_string())).into_bytes()
    }

    fn done_frame() -> Vec<u8> {
        encode_event(&StreamEvent::Done).into_bytes()
    }

    fn ok_chunks(chunks: Vec<Vec<u8>>) -> impl Stream<Item = Result<Vec<u8>, BrokenPipe>> + Unpin {
        futures::stream::iter(chunks.into_iter().map(Ok))
    }

    #[tokio::test]
    async fn test_three_deltas_then_completion() {
        let chunks = vec![frame("Hi"), frame(" there"), frame("!"), done_frame()];
        let mut log = ConversationLog::new();
        let mut seen = String::new();

        consume_stream(ok_chunks(chunks), &mut log, |fragment| {
            seen.push_str(fragment);
        })
        .await
        .unwrap();

        assert_eq!(log.len(), 1);
        assert_eq!(log.messages()[0].role, Role::Assistant);
        assert_eq!(log.messages()[0].text, "Hi there!");
        assert_eq!(seen, "Hi there!");
        assert!(!log.is_streaming());
    }

    #[tokio::test]
    async fn test_fragment_split_across_chunks() {
        let bytes = frame("résumé 🦀");
        let mid = bytes.len() / 2;
        let chunks = vec![bytes[..mid].to_vec(), bytes[mid..].to_vec(), done_frame()];

        let mut log = ConversationLog::new();
        consume_stream(ok_chunks(chunks), &mut log, |_| {})
            .await
            .unwrap();

        assert_eq!(log.messages()[0].text, "résumé 🦀");
    }

    #[tokio::test]
    async fn test_sentinel_swallows_trailing_data() {
        let mut tail = done_frame();
        tail.extend_from_slice(&frame("ignored"));
        let chunks = vec![frame("kept"), tail];

        let mut log = ConversationLog::new();
        consume_stream(ok_chunks(chunks), &mut log, |_| {})
            .await
            .unwrap();

        assert_eq!(log.len(), 1);
        assert_eq!(log.messages()[0].text, "kept");
    }

    #[tokio::test]
    async fn test_malformed_line_is_skipped() {
        let chunks = vec![
            frame("before"),
            b"data: {broken\n\n".to_vec(),
            frame(" after"),
            done_frame(),
        ];

        let mut log = ConversationLog::new();
        consume_stream(ok_chunks(chunks), &mut log, |_| {})
            .await
            .unwrap();

        assert_eq!(log.messages()[0].text, "before after");
    }

    #[tokio::test]
    async fn test_transport_error_preserves_partial_text() {
        let chunks: Vec<Result<Vec<u8>, BrokenPipe>> =
            vec![Ok(frame("Hel")), Err(BrokenPipe)];
        let mut log = ConversationLog::new();

        let err = consume_stream(futures::stream::iter(chunks), &mut log, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Transport(_)));
        assert_eq!(log.messages()[0].text, "Hel");
        assert!(log.is_streaming());

        // The session-level recovery finalizes the partial message and
        // appends the fixed apology.
        recover_failed_turn(&mut log);
        assert_eq!(log.len(), 2);
        assert_eq!(log.messages()[0].text, "Hel");
        assert_eq!(log.messages()[1].text, APOLOGY_TEXT);
    }

    #[tokio::test]
    async fn test_empty_stream_appends_nothing() {
        let mut log = ConversationLog::new();
        consume_stream(ok_chunks(Vec::new()), &mut log, |_| {})
            .await
            .unwrap();
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_error_before_first_byte_leaves_log_untouched() {
        let chunks: Vec<Result<Vec<u8>, BrokenPipe>> = vec![Err(BrokenPipe)];
        let mut log = ConversationLog::new();

        let err = consume_stream(futures::stream::iter(chunks), &mut log, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Transport(_)));
        assert!(log.is_empty());
        assert!(!log.is_streaming());
    }
}
