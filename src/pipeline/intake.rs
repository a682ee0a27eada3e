use crate::anythingllm::DocumentBackend;
use crate::session::{FileId, Session};
use crate::tagging::TagSuggester;
use crate::upload::Upload;

/// Upload each file to the locker and fetch tag suggestions, one file at a
/// time. A failing file ends in `error`; the loop moves on to the next one.
pub async fn run_intake(
    session: &Session,
    backend: &dyn DocumentBackend,
    tagger: &TagSuggester,
    uploads: Vec<Upload>,
) -> Vec<FileId> {
    if uploads.is_empty() {
        return Vec::new();
    }

    let records = session.add_uploads(uploads);
    session.log(format!(
        "Uploaded {} new file(s). Starting processing...",
        records.len()
    ));

    for record in &records {
        let name = record.filename();

        session.log(format!("Uploading \"{name}\" to AnythingLLM locker..."));
        let doc_path = match backend.upload_document(&record.upload).await {
            Ok(path) => path,
            Err(e) => {
                session.log_error(format!("Failed to process \"{name}\": {e}"));
                session.mark_error(&record.id, e.to_string());
                continue;
            }
        };
        session.mark_analyzing(&record.id, doc_path.clone());
        session.log(format!("\"{name}\" is in the locker. Path: {doc_path}"));

        session.log(format!("Grabby is analyzing \"{name}\" for tags..."));
        let tags = tagger.suggest(name).await;
        tracing::debug!(file = %record.id, tags = ?tags, "tags suggested");
        session.mark_awaiting_confirmation(&record.id, tags);
        session.log(format!(
            "Grabby suggested tags for \"{name}\". Ready for embedding."
        ));
    }

    records.into_iter().map(|r| r.id).collect()
}
