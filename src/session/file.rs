use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::upload::Upload;

/// Identity of one upload event: filename, millisecond timestamp and a
/// per-session sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileId(String);

impl FileId {
    pub fn generate(filename: &str, timestamp_ms: i64, seq: u64) -> Self {
        Self(format!("{filename}-{timestamp_ms}-{seq}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status tag of a [`FileState`], without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileStatus {
    Uploading,
    Analyzing,
    AwaitingConfirmation,
    Embedding,
    Complete,
    Error,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uploading => "uploading",
            Self::Analyzing => "analyzing",
            Self::AwaitingConfirmation => "awaiting-confirmation",
            Self::Embedding => "embedding",
            Self::Complete => "complete",
            Self::Error => "error",
        })
    }
}

/// Per-file lifecycle. Each state carries exactly the data valid in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileState {
    Uploading,
    Analyzing {
        doc_path: String,
    },
    AwaitingConfirmation {
        doc_path: String,
        tags: Vec<String>,
        /// Always a member of `tags` when set.
        primary_tag: Option<String>,
    },
    Embedding {
        doc_path: String,
        tags: Vec<String>,
        primary_tag: String,
    },
    Complete {
        doc_path: String,
        tags: Vec<String>,
        primary_tag: String,
    },
    Error {
        message: String,
    },
}

impl FileState {
    pub fn status(&self) -> FileStatus {
        match self {
            Self::Uploading => FileStatus::Uploading,
            Self::Analyzing { .. } => FileStatus::Analyzing,
            Self::AwaitingConfirmation { .. } => FileStatus::AwaitingConfirmation,
            Self::Embedding { .. } => FileStatus::Embedding,
            Self::Complete { .. } => FileStatus::Complete,
            Self::Error { .. } => FileStatus::Error,
        }
    }

    pub fn doc_path(&self) -> Option<&str> {
        match self {
            Self::Analyzing { doc_path }
            | Self::AwaitingConfirmation { doc_path, .. }
            | Self::Embedding { doc_path, .. }
            | Self::Complete { doc_path, .. } => Some(doc_path.as_str()),
            Self::Uploading | Self::Error { .. } => None,
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            Self::AwaitingConfirmation { tags, .. }
            | Self::Embedding { tags, .. }
            | Self::Complete { tags, .. } => tags,
            _ => &[],
        }
    }

    pub fn primary_tag(&self) -> Option<&str> {
        match self {
            Self::AwaitingConfirmation { primary_tag, .. } => primary_tag.as_deref(),
            Self::Embedding { primary_tag, .. } | Self::Complete { primary_tag, .. } => {
                Some(primary_tag.as_str())
            }
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message.as_str()),
            _ => None,
        }
    }
}

/// One uploaded file and where it is in the pipeline.
#[derive(Debug, Clone)]
pub struct ProcessedFile {
    pub id: FileId,
    pub upload: Arc<Upload>,
    pub state: FileState,
}

impl ProcessedFile {
    pub fn new(id: FileId, upload: Upload) -> Self {
        Self {
            id,
            upload: Arc::new(upload),
            state: FileState::Uploading,
        }
    }

    pub fn filename(&self) -> &str {
        &self.upload.filename
    }

    pub fn status(&self) -> FileStatus {
        self.state.status()
    }

    /// Awaiting confirmation with a primary tag chosen.
    pub fn is_selectable(&self) -> bool {
        matches!(
            &self.state,
            FileState::AwaitingConfirmation { primary_tag: Some(tag), .. } if !tag.is_empty()
        )
    }
}

/// Edits valid only in [`FileState::AwaitingConfirmation`]. Each returns
/// `false` when nothing changed.
pub(crate) mod edit {
    use crate::tagging::parse::push_tag;

    /// Same normalisation as model-suggested tags.
    pub fn add_tag(tags: &mut Vec<String>, tag: &str) -> bool {
        push_tag(tags, tag)
    }

    pub fn remove_tag(tags: &mut Vec<String>, primary_tag: &mut Option<String>, tag: &str) -> bool {
        let before = tags.len();
        tags.retain(|t| t != tag);
        if primary_tag.as_deref() == Some(tag) {
            *primary_tag = None;
        }
        tags.len() != before
    }
}
