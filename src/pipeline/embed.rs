use futures_util::future::join_all;
use std::collections::BTreeMap;

use super::refresh_workspaces;
use crate::anythingllm::{find_workspace, DocumentBackend, Workspace};
use crate::error::SessionError;
use crate::session::{BatchCandidate, FileId, Session};

pub const WORKSPACE_CREATION_FAILED: &str = "Workspace creation failed";
pub const WORKSPACE_NOT_FOUND: &str = "Workspace not found";
pub const EMBEDDING_FAILED: &str = "Embedding failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupResult {
    Embedded { slug: String },
    CreationFailed { reason: String },
    WorkspaceNotFound,
    EmbeddingFailed { slug: String, reason: String },
}

/// What happened to the files sharing one primary tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupOutcome {
    pub tag: String,
    pub files: Vec<FileId>,
    pub result: GroupResult,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Tags for which a new workspace was created during this run.
    pub created_workspaces: Vec<String>,
    pub groups: Vec<GroupOutcome>,
}

impl BatchReport {
    pub fn embedded_files(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| matches!(g.result, GroupResult::Embedded { .. }))
            .map(|g| g.files.len())
            .sum()
    }

    pub fn failed_files(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| !matches!(g.result, GroupResult::Embedded { .. }))
            .map(|g| g.files.len())
            .sum()
    }
}

/// Group candidates by exact primary tag.
pub fn group_by_primary_tag(
    candidates: Vec<BatchCandidate>,
) -> BTreeMap<String, Vec<BatchCandidate>> {
    let mut groups: BTreeMap<String, Vec<BatchCandidate>> = BTreeMap::new();
    for candidate in candidates {
        groups
            .entry(candidate.primary_tag.clone())
            .or_default()
            .push(candidate);
    }
    groups
}

/// Tags with no workspace of the same name, ignoring case.
pub fn missing_workspaces<'a, I>(tags: I, existing: &[Workspace]) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    tags.into_iter()
        .filter(|tag| find_workspace(existing, tag).is_none())
        .cloned()
        .collect()
}

fn ids(group: &[BatchCandidate]) -> Vec<FileId> {
    group.iter().map(|c| c.id.clone()).collect()
}

fn fail_group(session: &Session, group: &[BatchCandidate], message: &str) {
    for candidate in group {
        session.mark_error(&candidate.id, message);
    }
}

/// Embed every selected, confirmed file into the workspace named after its
/// primary tag, creating missing workspaces first.
///
/// Workspace creation runs concurrently across tags; embedding runs one group
/// at a time. A failure only affects the files of its own group. The
/// selection is cleared and the workspace list refreshed at the end.
pub async fn embed_selected(
    session: &Session,
    backend: &dyn DocumentBackend,
) -> Result<BatchReport, SessionError> {
    let guard = session.begin_batch()?;
    let mut report = BatchReport::default();

    session.log(format!(
        "Starting batch embedding for {} files.",
        session.selected_count()
    ));

    let candidates = session.batch_candidates();
    if candidates.is_empty() {
        session.log_error("No valid files selected for embedding.");
        return Ok(report);
    }

    let mut groups = group_by_primary_tag(candidates);
    let mut workspaces = session.workspaces();
    let new_names = missing_workspaces(groups.keys(), &workspaces);

    if !new_names.is_empty() {
        session.log(format!(
            "Creating {} new workspace(s): {}",
            new_names.len(),
            new_names.join(", ")
        ));

        let results = join_all(new_names.iter().map(|name| async move {
            (name.clone(), backend.create_workspace(name).await)
        }))
        .await;

        for (name, result) in results {
            match result {
                Ok(created) => {
                    tracing::info!(tag = %name, slug = %created.slug, "workspace created");
                    report.created_workspaces.push(name);
                }
                Err(e) => {
                    session.log_error(format!("Failed to create workspace \"{name}\": {e}"));
                    if let Some(group) = groups.remove(&name) {
                        fail_group(session, &group, WORKSPACE_CREATION_FAILED);
                        report.groups.push(GroupOutcome {
                            tag: name,
                            files: ids(&group),
                            result: GroupResult::CreationFailed {
                                reason: e.to_string(),
                            },
                        });
                    }
                }
            }
        }

        if !report.created_workspaces.is_empty() {
            session.log("Refreshing workspace list after creations...");
            match refresh_workspaces(session, backend).await {
                Ok(refreshed) => workspaces = refreshed,
                Err(e) => session.log_error(format!("Failed to refresh workspaces: {e}")),
            }
        }
    }

    for (tag, group) in groups {
        let files = ids(&group);

        let Some(workspace) = find_workspace(&workspaces, &tag) else {
            session.log_error(format!(
                "Could not find workspace \"{tag}\" for embedding. Skipping {} file(s).",
                group.len()
            ));
            fail_group(session, &group, WORKSPACE_NOT_FOUND);
            report.groups.push(GroupOutcome {
                tag,
                files,
                result: GroupResult::WorkspaceNotFound,
            });
            continue;
        };

        let doc_paths: Vec<String> = group.iter().map(|c| c.doc_path.clone()).collect();
        session.log(format!(
            "Embedding {} file(s) into \"{}\"...",
            doc_paths.len(),
            workspace.name
        ));
        for candidate in &group {
            session.mark_embedding(&candidate.id);
        }

        let result = match backend.add_documents(&workspace.slug, &doc_paths).await {
            Ok(()) => {
                session.log(format!(
                    "Successfully embedded files into \"{}\".",
                    workspace.name
                ));
                for candidate in &group {
                    session.mark_complete(&candidate.id);
                }
                GroupResult::Embedded {
                    slug: workspace.slug.clone(),
                }
            }
            Err(e) => {
                session.log_error(format!(
                    "Failed to embed files into \"{}\": {e}",
                    workspace.name
                ));
                fail_group(session, &group, EMBEDDING_FAILED);
                GroupResult::EmbeddingFailed {
                    slug: workspace.slug.clone(),
                    reason: e.to_string(),
                }
            }
        };
        report.groups.push(GroupOutcome { tag, files, result });
    }

    session.clear_selection();
    drop(guard);

    session.log("Batch embedding process finished. Refreshing workspaces...");
    match refresh_workspaces(session, backend).await {
        Ok(_) => session.log("Workspaces updated."),
        Err(e) => session.log_error(format!("Failed to refresh workspaces: {e}")),
    }

    Ok(report)
}
