use bytes::Bytes;
use futures::Stream;
use multer::{Constraints, Field, Multipart, SizeLimit};
use std::path::Path;
use std::time::Instant;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::Config,
    error::IngestError,
    models::{Video, VideoDraft},
    store::VideoStore,
};

pub const VIDEO_FIELD: &str = "video";

const TEXT_FIELD_LIMIT: u64 = 64 * 1024;
const FORM_OVERHEAD: u64 = 1024 * 1024;

/// File part of an upload, held in the staging dir until the form checks out.
/// Dropping it deletes the staged bytes.
#[derive(Debug)]
pub struct StagedFile {
    pub original_name: String,
    pub size: u64,
    temp: NamedTempFile,
}

/// Raw form as received, before validation.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub title: String,
    pub description: String,
    pub author: String,
    pub file: Option<StagedFile>,
}

#[derive(Debug)]
pub struct ValidUpload {
    pub title: String,
    pub description: String,
    pub author: String,
    pub file: StagedFile,
}

impl UploadForm {
    pub fn validate(self) -> Result<ValidUpload, IngestError> {
        let file = self.file.ok_or_else(|| {
            IngestError::Validation("Error getting video file: no video part in form".to_string())
        })?;

        if self.title.trim().is_empty() || self.author.trim().is_empty() {
            return Err(IngestError::Validation(
                "Title and author are required".to_string(),
            ));
        }

        Ok(ValidUpload {
            title: self.title,
            description: self.description,
            author: self.author,
            file,
        })
    }
}

/// Full ingestion: parse and stage, validate, write under the upload root, register.
pub async fn ingest<S, O, E>(
    store: &VideoStore,
    config: &Config,
    body: S,
    boundary: String,
) -> Result<Video, IngestError>
where
    S: Stream<Item = Result<O, E>> + Send + 'static,
    O: Into<Bytes> + 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let start = Instant::now();

    let form = read_upload(body, boundary, config).await?;
    let upload = form.validate()?;

    info!("[ingest] 📁 File: {}", upload.file.original_name);
    info!(
        "[ingest] 📦 Size: {:.2} MB ({} bytes)",
        upload.file.size as f64 / 1024.0 / 1024.0,
        upload.file.size
    );

    let video = persist(store, config, upload).await?;

    info!(
        "[ingest] ✅ Stored video {} in {:.2}s",
        video.id,
        start.elapsed().as_secs_f64()
    );

    Ok(video)
}

/// Reads every part of the form. The file part is streamed to the staging dir.
pub async fn read_upload<S, O, E>(
    body: S,
    boundary: String,
    config: &Config,
) -> Result<UploadForm, IngestError>
where
    S: Stream<Item = Result<O, E>> + Send + 'static,
    O: Into<Bytes> + 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    // The stream limit carries form overhead; report the file cap instead.
    read_parts(body, boundary, config)
        .await
        .map_err(|err| match err {
            IngestError::TooLarge { .. } => IngestError::TooLarge {
                limit: config.max_file_size,
            },
            other => other,
        })
}

async fn read_parts<S, O, E>(
    body: S,
    boundary: String,
    config: &Config,
) -> Result<UploadForm, IngestError>
where
    S: Stream<Item = Result<O, E>> + Send + 'static,
    O: Into<Bytes> + 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let constraints = Constraints::new().size_limit(
        SizeLimit::new()
            .whole_stream(config.max_file_size.saturating_add(FORM_OVERHEAD))
            .per_field(TEXT_FIELD_LIMIT)
            .for_field(VIDEO_FIELD, config.max_file_size),
    );
    let mut multipart = Multipart::with_constraints(body, boundary, constraints);
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            // A `video` part without a filename is a plain value, not a file
            Some(VIDEO_FIELD) if field.file_name().is_some() => {
                form.file = Some(stage_file(field, &config.staging_dir).await?);
            }
            Some("title") => form.title = field.text().await?,
            Some("description") => form.description = field.text().await?,
            Some("author") => form.author = field.text().await?,
            _ => {
                // Drain the field
                while field.chunk().await?.is_some() {}
            }
        }
    }

    Ok(form)
}

async fn stage_file(mut field: Field<'_>, staging_dir: &Path) -> Result<StagedFile, IngestError> {
    let original_name = field.file_name().unwrap_or_default().to_string();

    let staging_dir = staging_dir.to_path_buf();
    let (temp, handle) = tokio::task::spawn_blocking(move || {
        let temp = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".part")
            .tempfile_in(&staging_dir)?;
        let handle = temp.as_file().try_clone()?;
        Ok::<_, std::io::Error>((temp, handle))
    })
    .await
    .map_err(IngestError::background)?
    .map_err(IngestError::io("Error creating staging file"))?;
    let mut out = tokio::fs::File::from_std(handle);

    let mut size = 0u64;
    while let Some(chunk) = field.chunk().await? {
        out.write_all(&chunk)
            .await
            .map_err(IngestError::io("Error reading video file"))?;
        size += chunk.len() as u64;
    }
    out.flush()
        .await
        .map_err(IngestError::io("Error reading video file"))?;

    Ok(StagedFile {
        original_name,
        size,
        temp,
    })
}

/// Moves the staged file to `<upload_dir>/videos/<uuid><ext>` and registers it.
///
/// A failed copy leaves whatever was written. A failed registration removes
/// the stored file so it does not linger unreferenced.
pub async fn persist(
    store: &VideoStore,
    config: &Config,
    upload: ValidUpload,
) -> Result<Video, IngestError> {
    let videos_dir = config.videos_dir();
    let file_name = format!(
        "{}{}",
        Uuid::new_v4(),
        extension_of(&upload.file.original_name)
    );
    let file_path = videos_dir.join(file_name);

    tokio::fs::create_dir_all(&videos_dir)
        .await
        .map_err(IngestError::io("Error creating directory"))?;

    move_from_staging(upload.file.temp, &file_path).await?;

    let draft = VideoDraft::new(upload.title, upload.author, file_path.clone())
        .with_description(upload.description);

    match store.create(draft) {
        Ok(video) => Ok(video),
        Err(err) => {
            warn!(
                "[ingest] Registering {:?} failed ({}), removing the file",
                file_path, err
            );
            if let Err(e) = tokio::fs::remove_file(&file_path).await {
                warn!("[ingest] Failed to remove orphaned {:?}: {}", file_path, e);
            }
            Err(err.into())
        }
    }
}

/// Renames the staged file into place, copying when the rename cannot cross
/// filesystems.
async fn move_from_staging(staged: NamedTempFile, target: &Path) -> Result<(), IngestError> {
    let rename_target = target.to_path_buf();
    let renamed = tokio::task::spawn_blocking(move || staged.persist(&rename_target))
        .await
        .map_err(IngestError::background)?;

    match renamed {
        Ok(_) => Ok(()),
        Err(err) => {
            debug!(
                "[ingest] Rename into {:?} failed ({}), copying instead",
                target, err.error
            );
            // The staged file is deleted when `err.file` drops
            copy_into(err.file.path(), target).await
        }
    }
}

async fn copy_into(staged: &Path, target: &Path) -> Result<(), IngestError> {
    let mut src = tokio::fs::File::open(staged)
        .await
        .map_err(IngestError::io("Error reading video file"))?;
    let mut dst = tokio::fs::File::create(target)
        .await
        .map_err(IngestError::io("Error creating file"))?;

    tokio::io::copy(&mut src, &mut dst)
        .await
        .map_err(IngestError::io("Error saving file"))?;
    dst.flush()
        .await
        .map_err(IngestError::io("Error saving file"))?;

    Ok(())
}

/// `.ext` of the client file name, or nothing if it is missing or odd.
fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}
