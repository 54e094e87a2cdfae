//! Images service
//!
//! Stores pasted image bytes under fresh ids, serves active blobs back to
//! the preview layer, and computes which notes still reference each image
//! for the image-management view.

use crate::database::{ImageRecord, Note, Repository};
use crate::error::Result;
use serde::Serialize;
use uuid::Uuid;

/// One row of the image-management view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStatus {
    pub id: String,
    /// Ids of the active notes whose content references this image
    pub used_by: Vec<String>,
}

/// The markdown snippet the editor inserts for a stored image.
pub fn embed_markdown(id: &str) -> String {
    format!("![Image](images/{id}.png)")
}

/// Service for managing stored images
#[derive(Clone)]
pub struct ImagesService {
    repo: Repository,
}

impl ImagesService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Store image bytes under a freshly generated id
    pub async fn attach(&self, data: Vec<u8>) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        tracing::info!("Storing image: {} ({} bytes)", id, data.len());

        let record = ImageRecord::new(id.clone(), data);
        self.repo.put_image(&record).await?;

        Ok(id)
    }

    /// Blob for an active image; soft-deleted and missing images both
    /// come back as `None`.
    pub async fn fetch_active(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let image = self.repo.get_image(id).await?;
        Ok(image.filter(|img| img.deleted_at.is_none()).map(|img| img.blob))
    }

    /// Usage overview of every active image. An image counts as used by a
    /// note when its id appears anywhere in that note's content.
    pub async fn overview(&self, notes: &[Note]) -> Result<Vec<ImageStatus>> {
        let images = self.repo.get_all_images().await?;

        let overview = images
            .into_iter()
            .filter(|img| img.deleted_at.is_none())
            .map(|img| {
                let used_by = notes
                    .iter()
                    .filter(|note| note.content.contains(&img.id))
                    .map(|note| note.id.clone())
                    .collect();
                ImageStatus { id: img.id, used_by }
            })
            .collect();

        Ok(overview)
    }
}
