//! Session state shared by the intake pipeline, the batch orchestrator and
//! whatever renders them.
//!
//! All mutation goes through [`Session`], which holds the file list, the
//! workspace list, the selection set and the activity log behind one mutex.
//! File records are replaced whole, keyed by [`FileId`].

pub mod activity;
pub mod file;

pub use activity::{ActivityLog, ActivityLogEntry};
pub use file::{FileId, FileState, FileStatus, ProcessedFile};

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::BTreeSet;

use crate::anythingllm::Workspace;
use crate::error::SessionError;
use crate::upload::Upload;

/// A selected file that can take part in a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCandidate {
    pub id: FileId,
    pub doc_path: String,
    pub primary_tag: String,
}

#[derive(Debug, Default)]
struct SessionState {
    /// Newest first.
    files: Vec<ProcessedFile>,
    workspaces: Vec<Workspace>,
    selected: BTreeSet<FileId>,
    log: ActivityLog,
    embedding: bool,
    next_seq: u64,
}

impl SessionState {
    fn file(&self, id: &FileId) -> Result<&ProcessedFile, SessionError> {
        self.files
            .iter()
            .find(|f| &f.id == id)
            .ok_or_else(|| SessionError::UnknownFile(id.to_string()))
    }

    fn replace(&mut self, record: ProcessedFile) {
        if let Some(slot) = self.files.iter_mut().find(|f| f.id == record.id) {
            *slot = record;
        }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    state: Mutex<SessionState>,
}

/// Held for the duration of a batch run; releases the batch flag on drop.
#[must_use]
pub struct BatchGuard<'a> {
    session: &'a Session,
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.session.state.lock().embedding = false;
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // --- activity log ---

    pub fn log(&self, message: impl Into<String>) {
        self.state.lock().log.push(message, false);
    }

    pub fn log_error(&self, message: impl Into<String>) {
        self.state.lock().log.push(message, true);
    }

    /// Snapshot, newest first.
    pub fn activity(&self) -> Vec<ActivityLogEntry> {
        self.state.lock().log.entries().cloned().collect()
    }

    // --- workspaces ---

    pub fn workspaces(&self) -> Vec<Workspace> {
        self.state.lock().workspaces.clone()
    }

    pub fn set_workspaces(&self, workspaces: Vec<Workspace>) {
        self.state.lock().workspaces = workspaces;
    }

    // --- files ---

    /// Create `uploading` records for a batch of uploads, ahead of older
    /// records, and return them in input order.
    pub fn add_uploads(&self, uploads: Vec<Upload>) -> Vec<ProcessedFile> {
        let mut state = self.state.lock();
        let now = Utc::now().timestamp_millis();
        let records: Vec<ProcessedFile> = uploads
            .into_iter()
            .map(|upload| {
                let seq = state.next_seq;
                state.next_seq += 1;
                ProcessedFile::new(FileId::generate(&upload.filename, now, seq), upload)
            })
            .collect();

        let older = std::mem::take(&mut state.files);
        state.files = records.iter().cloned().chain(older).collect();
        records
    }

    pub fn file(&self, id: &FileId) -> Option<ProcessedFile> {
        self.state.lock().file(id).ok().cloned()
    }

    /// Snapshot, newest first.
    pub fn files(&self) -> Vec<ProcessedFile> {
        self.state.lock().files.clone()
    }

    /// Replace the state of `id` with whatever `f` returns. `f` returning
    /// `None` leaves the record untouched.
    fn transition<F>(&self, id: &FileId, f: F) -> bool
    where
        F: FnOnce(&FileState) -> Option<FileState>,
    {
        let mut state = self.state.lock();
        let Ok(current) = state.file(id) else {
            return false;
        };
        let Some(next) = f(&current.state) else {
            tracing::debug!(file = %id, status = %current.status(), "transition not applicable");
            return false;
        };
        let record = ProcessedFile {
            state: next,
            ..current.clone()
        };
        state.replace(record);
        true
    }

    pub fn mark_analyzing(&self, id: &FileId, doc_path: String) -> bool {
        self.transition(id, |s| match s {
            FileState::Uploading => Some(FileState::Analyzing { doc_path }),
            _ => None,
        })
    }

    pub fn mark_awaiting_confirmation(&self, id: &FileId, tags: Vec<String>) -> bool {
        self.transition(id, |s| match s {
            FileState::Analyzing { doc_path } => Some(FileState::AwaitingConfirmation {
                doc_path: doc_path.clone(),
                tags,
                primary_tag: None,
            }),
            _ => None,
        })
    }

    pub fn mark_embedding(&self, id: &FileId) -> bool {
        self.transition(id, |s| match s {
            FileState::AwaitingConfirmation {
                doc_path,
                tags,
                primary_tag: Some(primary_tag),
            } => Some(FileState::Embedding {
                doc_path: doc_path.clone(),
                tags: tags.clone(),
                primary_tag: primary_tag.clone(),
            }),
            _ => None,
        })
    }

    pub fn mark_complete(&self, id: &FileId) -> bool {
        self.transition(id, |s| match s {
            FileState::Embedding {
                doc_path,
                tags,
                primary_tag,
            } => Some(FileState::Complete {
                doc_path: doc_path.clone(),
                tags: tags.clone(),
                primary_tag: primary_tag.clone(),
            }),
            _ => None,
        })
    }

    /// Any state but `complete` can fail.
    pub fn mark_error(&self, id: &FileId, message: impl Into<String>) -> bool {
        let message = message.into();
        self.transition(id, |s| match s {
            FileState::Complete { .. } => None,
            _ => Some(FileState::Error { message }),
        })
    }

    // --- user edits ---

    fn edit_awaiting<F>(&self, id: &FileId, f: F) -> Result<bool, SessionError>
    where
        F: FnOnce(&mut Vec<String>, &mut Option<String>) -> Result<bool, SessionError>,
    {
        let mut state = self.state.lock();
        if state.embedding {
            return Err(SessionError::BatchInProgress);
        }
        let mut record = state.file(id)?.clone();
        let FileState::AwaitingConfirmation {
            tags, primary_tag, ..
        } = &mut record.state
        else {
            return Err(SessionError::NotEditable(id.to_string()));
        };
        let changed = f(tags, primary_tag)?;
        if changed {
            state.replace(record);
        }
        Ok(changed)
    }

    /// Add a tag (trimmed, lowercased). Duplicates and blanks are ignored.
    pub fn add_tag(&self, id: &FileId, tag: &str) -> Result<bool, SessionError> {
        self.edit_awaiting(id, |tags, _| Ok(file::edit::add_tag(tags, tag)))
    }

    /// Remove a tag; clears the primary tag if it was the one removed.
    pub fn remove_tag(&self, id: &FileId, tag: &str) -> Result<bool, SessionError> {
        self.edit_awaiting(id, |tags, primary| {
            Ok(file::edit::remove_tag(tags, primary, tag))
        })
    }

    /// Choose the primary tag. An empty tag clears it; any other tag must
    /// already be in the file's tag list.
    pub fn set_primary_tag(&self, id: &FileId, tag: &str) -> Result<bool, SessionError> {
        self.edit_awaiting(id, |tags, primary| {
            if tag.is_empty() {
                return Ok(primary.take().is_some());
            }
            if !tags.iter().any(|t| t == tag) {
                return Err(SessionError::TagNotPresent {
                    id: id.to_string(),
                    tag: tag.to_string(),
                });
            }
            let changed = primary.as_deref() != Some(tag);
            *primary = Some(tag.to_string());
            Ok(changed)
        })
    }

    // --- selection ---

    /// Flip selection of `id` and return whether it is now selected. Only
    /// selectable records can be added.
    pub fn toggle_selection(&self, id: &FileId) -> Result<bool, SessionError> {
        let mut state = self.state.lock();
        if state.embedding {
            return Err(SessionError::BatchInProgress);
        }
        if state.selected.remove(id) {
            return Ok(false);
        }
        if !state.file(id)?.is_selectable() {
            return Err(SessionError::NotSelectable(id.to_string()));
        }
        state.selected.insert(id.clone());
        Ok(true)
    }

    pub fn is_selected(&self, id: &FileId) -> bool {
        self.state.lock().selected.contains(id)
    }

    pub fn selected_count(&self) -> usize {
        self.state.lock().selected.len()
    }

    pub fn clear_selection(&self) {
        self.state.lock().selected.clear();
    }

    /// Selected records that are awaiting confirmation with a primary tag and
    /// a document path, in file-list order. Anything else selected is skipped.
    pub fn batch_candidates(&self) -> Vec<BatchCandidate> {
        let state = self.state.lock();
        state
            .files
            .iter()
            .filter(|f| state.selected.contains(&f.id))
            .filter_map(|f| match &f.state {
                FileState::AwaitingConfirmation {
                    doc_path,
                    primary_tag: Some(primary_tag),
                    ..
                } if !primary_tag.is_empty() => Some(BatchCandidate {
                    id: f.id.clone(),
                    doc_path: doc_path.clone(),
                    primary_tag: primary_tag.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    // --- batch flag ---

    pub fn is_embedding(&self) -> bool {
        self.state.lock().embedding
    }

    pub fn begin_batch(&self) -> Result<BatchGuard<'_>, SessionError> {
        let mut state = self.state.lock();
        if state.embedding {
            return Err(SessionError::BatchInProgress);
        }
        state.embedding = true;
        Ok(BatchGuard { session: self })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A session holding one file already awaiting confirmation.
    fn session_with_tagged_file(tags: &[&str]) -> (Session, FileId) {
        let session = Session::new();
        let record = session
            .add_uploads(vec![Upload::new("Q3_Report.docx", b"x".to_vec())])
            .remove(0);
        session.mark_analyzing(&record.id, "custom-documents/q3.json".into());
        session.mark_awaiting_confirmation(
            &record.id,
            tags.iter().map(|t| t.to_string()).collect(),
        );
        (session, record.id)
    }

    #[test]
    fn uploads_are_prepended_with_unique_ids() {
        let session = Session::new();
        let first = session.add_uploads(vec![Upload::new("a.txt", vec![])]);
        let second = session.add_uploads(vec![
            Upload::new("a.txt", vec![]),
            Upload::new("b.txt", vec![]),
        ]);

        let ids: Vec<FileId> = session.files().into_iter().map(|f| f.id).collect();
        assert_eq!(
            ids,
            vec![second[0].id.clone(), second[1].id.clone(), first[0].id.clone()]
        );
        assert_ne!(first[0].id, second[0].id);
        assert!(session.files().iter().all(|f| f.status() == FileStatus::Uploading));
    }

    #[test]
    fn awaiting_requires_a_document_path() {
        let session = Session::new();
        let record = session.add_uploads(vec![Upload::new("a.txt", vec![])]).remove(0);
        assert!(!session.mark_awaiting_confirmation(&record.id, vec!["a".into()]));
        assert_eq!(
            session.file(&record.id).unwrap().status(),
            FileStatus::Uploading
        );
    }

    #[test]
    fn primary_tag_must_be_a_member() {
        let (session, id) = session_with_tagged_file(&["finance", "report"]);

        assert_eq!(
            session.set_primary_tag(&id, "legal"),
            Err(SessionError::TagNotPresent {
                id: id.to_string(),
                tag: "legal".into()
            })
        );
        assert_eq!(session.set_primary_tag(&id, "finance"), Ok(true));
        assert_eq!(
            session.file(&id).unwrap().state.primary_tag(),
            Some("finance")
        );
        assert_eq!(session.set_primary_tag(&id, ""), Ok(true));
        assert_eq!(session.file(&id).unwrap().state.primary_tag(), None);
    }

    #[test]
    fn removing_primary_tag_makes_file_unselectable() {
        let (session, id) = session_with_tagged_file(&["finance", "report"]);
        session.set_primary_tag(&id, "finance").unwrap();
        assert_eq!(session.toggle_selection(&id), Ok(true));
        assert_eq!(session.batch_candidates().len(), 1);

        session.remove_tag(&id, "finance").unwrap();
        let file = session.file(&id).unwrap();
        assert_eq!(file.state.primary_tag(), None);
        assert_eq!(file.state.tags(), ["report".to_string()]);
        // Still in the selection set but no longer a candidate.
        assert!(session.is_selected(&id));
        assert!(session.batch_candidates().is_empty());
    }

    #[test]
    fn selection_requires_primary_tag() {
        let (session, id) = session_with_tagged_file(&["finance"]);
        assert_eq!(
            session.toggle_selection(&id),
            Err(SessionError::NotSelectable(id.to_string()))
        );

        session.set_primary_tag(&id, "finance").unwrap();
        assert_eq!(session.toggle_selection(&id), Ok(true));
        assert_eq!(session.toggle_selection(&id), Ok(false));
        assert_eq!(session.selected_count(), 0);
    }

    #[test]
    fn errored_files_cannot_be_edited_or_selected() {
        let (session, id) = session_with_tagged_file(&["finance"]);
        session.mark_error(&id, "Embedding failed");

        assert_eq!(
            session.add_tag(&id, "x"),
            Err(SessionError::NotEditable(id.to_string()))
        );
        assert_eq!(
            session.toggle_selection(&id),
            Err(SessionError::NotSelectable(id.to_string()))
        );
    }

    #[test]
    fn batch_guard_blocks_edits_and_second_batch() {
        let (session, id) = session_with_tagged_file(&["finance"]);
        {
            let _guard = session.begin_batch().unwrap();
            assert!(session.is_embedding());
            assert!(matches!(
                session.begin_batch(),
                Err(SessionError::BatchInProgress)
            ));
            assert_eq!(
                session.set_primary_tag(&id, "finance"),
                Err(SessionError::BatchInProgress)
            );
        }
        assert!(!session.is_embedding());
        assert_eq!(session.set_primary_tag(&id, "finance"), Ok(true));
    }

    #[test]
    fn later_states_do_not_go_back_to_analyzing() {
        let (session, id) = session_with_tagged_file(&["finance"]);
        assert!(!session.mark_analyzing(&id, "custom-documents/other.json".into()));
        assert_eq!(
            session.file(&id).unwrap().state.doc_path(),
            Some("custom-documents/q3.json")
        );

        session.set_primary_tag(&id, "finance").unwrap();
        session.mark_embedding(&id);
        session.mark_complete(&id);
        assert!(!session.mark_analyzing(&id, "custom-documents/other.json".into()));
        assert!(!session.mark_error(&id, "Embedding failed"));
        assert_eq!(session.file(&id).unwrap().status(), FileStatus::Complete);
    }

    #[test]
    fn uploading_and_embedding_files_can_fail() {
        let session = Session::new();
        let record = session.add_uploads(vec![Upload::new("a.txt", vec![])]).remove(0);
        assert!(session.mark_error(&record.id, "Document processor offline"));
        assert_eq!(
            session.file(&record.id).unwrap().state.error(),
            Some("Document processor offline")
        );

        let (session, id) = session_with_tagged_file(&["finance"]);
        session.set_primary_tag(&id, "finance").unwrap();
        session.mark_embedding(&id);
        assert!(session.mark_error(&id, "Embedding failed"));
    }

    #[test]
    fn embedding_then_complete_keeps_tags() {
        let (session, id) = session_with_tagged_file(&["finance", "q3"]);
        session.set_primary_tag(&id, "finance").unwrap();

        assert!(session.mark_embedding(&id));
        assert!(session.mark_complete(&id));
        let state = session.file(&id).unwrap().state;
        assert_eq!(state.status(), FileStatus::Complete);
        assert_eq!(state.primary_tag(), Some("finance"));
        assert_eq!(state.doc_path(), Some("custom-documents/q3.json"));
    }
}
