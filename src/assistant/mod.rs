//! Legal assistant: uploads, chat turns, tools, citations and sessions.

mod citations;
mod conversation;
mod prompts;
mod service;
mod session;
mod tools;
mod upload;

pub use citations::format_with_citations;
pub use conversation::Conversation;
pub use prompts::{run_failed_reply, DEFAULT_INSTRUCTIONS, RECENT_BILLS_TOOL, UNREADABLE_REPLY};
pub use service::{AssistantError, AssistantService, ChatTurn};
pub use session::{ChatMessage, FileInfo, Role, Session, SessionStore, UNKNOWN_FILE_NAME};
pub use tools::{RecentBillsTool, Tool, ToolRegistry};
pub use upload::{delete_remote_file, process_upload, UploadError, UploadResponse};
