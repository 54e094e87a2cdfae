//! Import/export packaging
//!
//! Builds and reads the portable note containers: `.snote` (a single note)
//! and `.snotes` (a bulk export, one directory per note). Each container
//! carries `metadata.json`, the raw markdown as `note.md`, and every image
//! blob the content references under `images/`. Containers are built and
//! read entirely in memory; the view layer handles the actual file
//! transfer.

use crate::config::{BUNDLE_EXPORT_EXTENSION, NOTE_EXPORT_EXTENSION};
use crate::database::{ImageRecord, Note, NoteMetadata, NoteSettings, Repository};
use crate::error::{AppError, Result};
use crate::util::{export_timestamp, extract_image_ids, now_ms, sanitize_file_name};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read, Write};
use uuid::Uuid;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Contents of a container's `metadata.json`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteManifest {
    title: String,
    #[serde(default)]
    settings: NoteSettings,
    #[serde(default)]
    metadata: ManifestTimestamps,
}

/// Timestamps inside a manifest; tolerated missing on import
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestTimestamps {
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_modified: Option<i64>,
}

/// A note parsed out of a container, not yet persisted
struct ParsedNote {
    manifest: NoteManifest,
    content: String,
    images: Vec<(String, Vec<u8>)>,
}

/// Service for building and reading note containers
#[derive(Clone)]
pub struct PackagingService {
    repo: Repository,
}

impl PackagingService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Filename for a single-note export
    pub fn export_file_name(note: &Note) -> String {
        format!(
            "{}.{}",
            sanitize_file_name(&note.title),
            NOTE_EXPORT_EXTENSION
        )
    }

    /// Timestamped filename for a bulk export
    pub fn bundle_file_name() -> String {
        format!("notes_{}.{}", export_timestamp(), BUNDLE_EXPORT_EXTENSION)
    }

    /// Package a single note and its referenced images as `.snote` bytes
    pub async fn export_note(&self, note: &Note) -> Result<Vec<u8>> {
        tracing::info!("Exporting note: {}", note.id);

        let images = self.collect_images(&note.content).await?;

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);

        write_note_entries(&mut zip, "", note, &images, options)?;

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    /// Package every given note as a `.snotes` bundle, one directory per
    /// note, each directory following the single-note layout
    pub async fn export_all(&self, notes: &[Note]) -> Result<Vec<u8>> {
        tracing::info!("Exporting {} notes", notes.len());

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);

        for note in notes {
            let images = self.collect_images(&note.content).await?;

            // Explicit directory entries keep the bundle readable by
            // importers that discover notes via folder entries.
            zip.add_directory(note.id.as_str(), options)?;
            let prefix = format!("{}/", note.id);
            write_note_entries(&mut zip, &prefix, note, &images, options)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    /// Parse a `.snote` container, store its images, and return the note.
    /// The note gets a freshly generated id and is never pinned; the
    /// caller stamps `last_modified` and persists it.
    pub async fn import_note(&self, bytes: &[u8]) -> Result<Note> {
        let mut archive = open_archive(bytes)?;
        let parsed = read_note_parts(&mut archive, "")?;

        self.store_images(&parsed).await?;
        Ok(build_note(parsed))
    }

    /// Parse a `.snotes` bundle, store every image, and return the notes
    /// ordered by their recorded `last_modified` ascending. Validation of
    /// every directory happens before anything is stored, so a malformed
    /// bundle leaves prior state untouched.
    pub async fn import_bundle(&self, bytes: &[u8]) -> Result<Vec<Note>> {
        let mut archive = open_archive(bytes)?;

        let mut folders: Vec<String> = Vec::new();
        for name in archive.file_names() {
            if let Some((folder, _)) = name.split_once('/') {
                if !folder.is_empty() && !folders.iter().any(|f| f == folder) {
                    folders.push(folder.to_string());
                }
            }
        }

        if folders.is_empty() {
            return Err(AppError::MalformedContainer(
                "bundle contains no note directories".to_string(),
            ));
        }

        let mut parsed: Vec<ParsedNote> = Vec::new();
        for folder in &folders {
            parsed.push(read_note_parts(&mut archive, &format!("{folder}/"))?);
        }

        for note in &parsed {
            self.store_images(note).await?;
        }

        let mut notes: Vec<Note> = parsed.into_iter().map(build_note).collect();
        notes.sort_by_key(|n| n.metadata.last_modified);

        tracing::info!("Imported {} notes from bundle", notes.len());
        Ok(notes)
    }

    /// Fetch the active image blobs referenced by the given content
    async fn collect_images(&self, content: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let mut images = Vec::new();
        for id in extract_image_ids(content) {
            match self.repo.get_image(&id).await? {
                Some(ImageRecord {
                    blob,
                    deleted_at: None,
                    ..
                }) => images.push((id, blob)),
                _ => tracing::warn!("Skipping unavailable image for export: {}", id),
            }
        }
        Ok(images)
    }

    async fn store_images(&self, parsed: &ParsedNote) -> Result<()> {
        for (id, blob) in &parsed.images {
            self.repo
                .put_image(&ImageRecord::new(id.clone(), blob.clone()))
                .await?;
        }
        Ok(())
    }
}

fn open_archive(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>> {
    ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AppError::MalformedContainer(format!("unreadable archive: {e}")))
}

fn write_note_entries(
    zip: &mut ZipWriter<Cursor<Vec<u8>>>,
    prefix: &str,
    note: &Note,
    images: &[(String, Vec<u8>)],
    options: FileOptions<'static, ()>,
) -> Result<()> {
    let manifest = NoteManifest {
        title: note.title.clone(),
        settings: note.settings.clone(),
        metadata: ManifestTimestamps {
            created_at: Some(note.metadata.created_at),
            last_modified: Some(note.metadata.last_modified),
        },
    };
    let manifest_json = serde_json::to_string_pretty(&manifest)?;

    zip.start_file(format!("{prefix}metadata.json"), options)?;
    zip.write_all(manifest_json.as_bytes())?;

    zip.start_file(format!("{prefix}note.md"), options)?;
    zip.write_all(note.content.as_bytes())?;

    if !images.is_empty() {
        zip.add_directory(format!("{prefix}images"), options)?;
        for (id, blob) in images {
            zip.start_file(format!("{prefix}images/{id}.png"), options)?;
            zip.write_all(blob)?;
        }
    }

    Ok(())
}

/// Read one note's parts out of an archive. `prefix` is `""` for a
/// single-note container or `"<folder>/"` inside a bundle.
fn read_note_parts(archive: &mut ZipArchive<Cursor<&[u8]>>, prefix: &str) -> Result<ParsedNote> {
    let manifest: NoteManifest = {
        let mut file = archive
            .by_name(&format!("{prefix}metadata.json"))
            .map_err(|_| AppError::MalformedContainer("missing metadata.json".to_string()))?;
        let mut raw = String::new();
        file.read_to_string(&mut raw)?;
        serde_json::from_str(&raw)
            .map_err(|e| AppError::MalformedContainer(format!("invalid metadata.json: {e}")))?
    };

    let content = {
        let mut file = archive
            .by_name(&format!("{prefix}note.md"))
            .map_err(|_| AppError::MalformedContainer("missing note.md".to_string()))?;
        let mut raw = String::new();
        file.read_to_string(&mut raw)?;
        raw
    };

    let image_prefix = format!("{prefix}images/");
    let mut images = Vec::new();
    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            continue;
        }

        let name = file.name().to_string();
        if !name.starts_with(&image_prefix) || !name.ends_with(".png") {
            continue;
        }

        let id = name
            .rsplit('/')
            .next()
            .and_then(|file_name| file_name.strip_suffix(".png"))
            .unwrap_or_default()
            .to_string();
        if id.is_empty() {
            continue;
        }

        let mut blob = Vec::new();
        file.read_to_end(&mut blob)?;
        images.push((id, blob));
    }

    Ok(ParsedNote {
        manifest,
        content,
        images,
    })
}

/// Build an in-memory note from parsed container parts. Imported notes get
/// a fresh id so they never collide with an existing note, and arrive
/// unpinned.
fn build_note(parsed: ParsedNote) -> Note {
    let now = now_ms();
    Note {
        id: Uuid::new_v4().to_string(),
        title: parsed.manifest.title,
        content: parsed.content,
        settings: parsed.manifest.settings,
        metadata: NoteMetadata {
            created_at: parsed.manifest.metadata.created_at.unwrap_or(now),
            last_modified: parsed.manifest.metadata.last_modified.unwrap_or(now),
            deleted_at: None,
        },
        is_pinned: false,
        pinned_at: None,
    }
}
