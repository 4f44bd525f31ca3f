//! Chat client: conversation state, stream consumption, attachments,
//! persistence and the submit pipeline.

pub mod attachments;
pub mod consumer;
pub mod conversation;
pub mod session;
pub mod store;

pub use attachments::PendingAttachments;
pub use consumer::consume_stream;
pub use conversation::ConversationLog;
pub use session::ChatSession;
pub use store::{HistoryStore, JsonHistoryStore};
