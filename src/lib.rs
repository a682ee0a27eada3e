//! Grabby: upload files to an AnythingLLM document locker, have an AI model
//! suggest tags, then embed them into workspaces named after a chosen
//! primary tag.

pub mod anythingllm;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod session;
pub mod tagging;
pub mod upload;

pub use anythingllm::{AnythingLlmClient, DocumentBackend, Workspace};
pub use config::Config;
pub use error::{ApiError, SessionError};
pub use pipeline::{embed_selected, load_workspaces, run_intake, BatchReport};
pub use session::{FileId, FileState, FileStatus, ProcessedFile, Session};
pub use tagging::{CompletionProvider, GeminiProvider, TagSuggester};
pub use upload::Upload;
