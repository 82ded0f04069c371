//! Fetch → decode → name → write, one message at a time.
pub mod layout;
pub mod writer;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::decode::decode;
use crate::gmail::MessageSource;

pub use layout::{file_name, file_path, normalize_dir};
pub use writer::{ensure_dir, write_body};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub message_id: String,
    pub path: PathBuf,
    pub bytes: usize,
}

#[derive(Debug, Default)]
pub struct ExportSummary {
    pub files: Vec<ExportedFile>,
}

impl ExportSummary {
    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(|f| f.bytes).sum()
    }
}

/// Export the `max_count` newest messages of `user_id` into `dir`.
///
/// The first failure stops the run; files written before it are left in
/// place.
pub async fn run_export<S: MessageSource>(
    source: &S,
    user_id: &str,
    dir: &str,
    max_count: u32,
) -> Result<ExportSummary> {
    let dir = normalize_dir(dir);
    ensure_dir(Path::new(&dir)).context("creating export directory")?;

    info!(max_count, "Retrieving messages from Gmail API");
    let refs = source
        .list_recent(user_id, max_count)
        .await
        .context("listing messages")?;
    debug!(listed = refs.len(), "Message list received");

    let mut summary = ExportSummary::default();
    for msg_ref in refs {
        let message = source
            .get_message(user_id, &msg_ref.id)
            .await
            .with_context(|| format!("getting message {}", msg_ref.id))?;
        debug!(message = %message.id, mime = %message.payload.mime_type, "Message fetched");

        let data =
            decode(&message.payload).with_context(|| format!("decoding message {}", message.id))?;
        let path = file_path(&dir, &file_name(&message));
        let bytes = write_body(&path, &data)
            .with_context(|| format!("writing message {}", message.id))?;
        info!(message = %message.id, path = %path.display(), bytes, "Wrote message");

        summary.files.push(ExportedFile {
            message_id: message.id,
            path,
            bytes,
        });
    }

    info!(
        messages = summary.files.len(),
        bytes = summary.total_bytes(),
        "Export finished"
    );
    Ok(summary)
}
