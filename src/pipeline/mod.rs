//! The upload → tag → confirm → embed workflow.
//!
//! [`intake`] runs each new file through the locker upload and tag
//! suggestion; [`embed`] routes a confirmed selection into workspaces.
//! Both report failures through the session rather than returning them.

pub mod embed;
pub mod intake;

pub use embed::{embed_selected, BatchReport, GroupOutcome, GroupResult};
pub use intake::run_intake;

use crate::anythingllm::{DocumentBackend, Workspace};
use crate::error::ApiError;
use crate::session::Session;

/// Re-fetch the workspace list into the session.
pub async fn refresh_workspaces(
    session: &Session,
    backend: &dyn DocumentBackend,
) -> Result<Vec<Workspace>, ApiError> {
    let workspaces = backend.list_workspaces().await?;
    session.set_workspaces(workspaces.clone());
    Ok(workspaces)
}

/// Initial workspace fetch. Failure is logged, not fatal.
pub async fn load_workspaces(session: &Session, backend: &dyn DocumentBackend) -> bool {
    session.log("Fetching workspaces from AnythingLLM...");
    match refresh_workspaces(session, backend).await {
        Ok(workspaces) => {
            session.log(format!(
                "Successfully fetched {} workspaces.",
                workspaces.len()
            ));
            true
        }
        Err(e) => {
            session.log_error(format!("Failed to fetch workspaces: {e}"));
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory backend and completion provider for pipeline tests.

    use anyhow::Result;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Barrier;

    use crate::anythingllm::{CreatedWorkspace, DocumentBackend, Workspace};
    use crate::error::ApiError;
    use crate::tagging::{CompletionProvider, TagSuggester};
    use crate::upload::Upload;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        List,
        Create(String),
        Upload(String),
        Add(String, Vec<String>),
    }

    #[derive(Default)]
    pub struct FakeBackend {
        pub workspaces: Mutex<Vec<Workspace>>,
        pub calls: Mutex<Vec<Call>>,
        pub fail_uploads: HashSet<String>,
        pub fail_creates: HashSet<String>,
        pub fail_adds: HashSet<String>,
        pub fail_lists: bool,
        /// Create succeeds but the workspace never shows up in listings.
        pub hidden_creates: HashSet<String>,
        /// Every create waits here before answering.
        pub create_barrier: Option<Arc<Barrier>>,
        pub adds_in_flight: AtomicUsize,
        pub max_adds_in_flight: AtomicUsize,
    }

    impl FakeBackend {
        pub fn with_workspaces(names: &[&str]) -> Self {
            let fake = Self::default();
            *fake.workspaces.lock() = names
                .iter()
                .map(|n| Workspace {
                    slug: slug(n),
                    name: n.to_string(),
                    documents: 0,
                })
                .collect();
            fake
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }

        pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
            self.calls.lock().iter().filter(|c| pred(c)).count()
        }
    }

    pub fn slug(name: &str) -> String {
        name.to_lowercase().replace(' ', "-")
    }

    #[async_trait]
    impl DocumentBackend for FakeBackend {
        async fn list_workspaces(&self) -> Result<Vec<Workspace>, ApiError> {
            self.calls.lock().push(Call::List);
            if self.fail_lists {
                return Err(ApiError::Rejected("list unavailable".into()));
            }
            let mut list = self.workspaces.lock().clone();
            list.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(list)
        }

        async fn create_workspace(&self, name: &str) -> Result<CreatedWorkspace, ApiError> {
            self.calls.lock().push(Call::Create(name.to_string()));
            if let Some(barrier) = &self.create_barrier {
                barrier.wait().await;
            }
            if self.fail_creates.contains(name) {
                return Err(ApiError::Rejected(format!("cannot create {name}")));
            }
            if !self.hidden_creates.contains(name) {
                self.workspaces.lock().push(Workspace {
                    slug: slug(name),
                    name: name.to_string(),
                    documents: 0,
                });
            }
            Ok(CreatedWorkspace {
                id: 1,
                name: name.to_string(),
                slug: slug(name),
            })
        }

        async fn upload_document(&self, upload: &Upload) -> Result<String, ApiError> {
            self.calls.lock().push(Call::Upload(upload.filename.clone()));
            if self.fail_uploads.contains(&upload.filename) {
                return Err(ApiError::Rejected("Unknown error during file upload.".into()));
            }
            Ok(format!("custom-documents/{}.json", upload.filename))
        }

        async fn add_documents(&self, slug: &str, doc_paths: &[String]) -> Result<(), ApiError> {
            self.calls
                .lock()
                .push(Call::Add(slug.to_string(), doc_paths.to_vec()));
            let in_flight = self.adds_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_adds_in_flight.fetch_max(in_flight, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.adds_in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.fail_adds.contains(slug) {
                return Err(ApiError::Rejected("embedder offline".into()));
            }
            let mut workspaces = self.workspaces.lock();
            if let Some(ws) = workspaces.iter_mut().find(|w| w.slug == slug) {
                ws.documents += doc_paths.len() as u64;
            }
            Ok(())
        }
    }

    /// Replies per filename; unknown filenames get a transport error.
    pub struct FakeCompletion(pub HashMap<String, String>);

    #[async_trait]
    impl CompletionProvider for FakeCompletion {
        fn name(&self) -> &str {
            "fake"
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            self.0
                .iter()
                .find(|(filename, _)| prompt.contains(&format!("Filename: \"{filename}\"")))
                .map(|(_, reply)| reply.clone())
                .ok_or_else(|| anyhow::anyhow!("network error"))
        }
    }

    pub fn tagger(replies: &[(&str, &str)]) -> TagSuggester {
        TagSuggester::new(Arc::new(FakeCompletion(
            replies
                .iter()
                .map(|(f, r)| (f.to_string(), r.to_string()))
                .collect(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[tokio::test]
    async fn load_failure_is_logged_not_raised() {
        let backend = FakeBackend {
            fail_lists: true,
            ..FakeBackend::default()
        };
        let session = Session::new();

        assert!(!load_workspaces(&session, &backend).await);
        let newest = &session.activity()[0];
        assert!(newest.is_error);
        assert_eq!(newest.message, "Failed to fetch workspaces: list unavailable");
    }

    #[tokio::test]
    async fn load_stores_sorted_workspaces() {
        let backend = FakeBackend::with_workspaces(&["research", "Finance"]);
        let session = Session::new();

        assert!(load_workspaces(&session, &backend).await);
        let names: Vec<String> = session.workspaces().into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["Finance", "research"]);
        assert_eq!(session.activity()[0].message, "Successfully fetched 2 workspaces.");
    }
}
