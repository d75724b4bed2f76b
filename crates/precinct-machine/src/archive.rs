//! Scanned image archive.
//!
//! Images are made durable before the scan executor reports success, so a
//! sheet the scanner believes it scanned can always be found again.

use crate::context::{ImageRef, ScannedSheet};
use precinct_core::SheetId;
use precinct_hardware::{GrayImage, SheetImages};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Where scanned images go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageArchive {
    /// Binary PGM files, one per side, named after the sheet id
    Directory(PathBuf),
    /// Keep images in memory
    Memory,
}

impl ImageArchive {
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::Directory(path.into())
    }

    /// Archive both sides of a sheet.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if a file cannot be created, written or synced.
    pub async fn store(
        &self,
        sheet_id: SheetId,
        images: SheetImages,
    ) -> std::io::Result<ScannedSheet> {
        match self {
            Self::Memory => Ok(ScannedSheet {
                sheet_id,
                front: ImageRef::Memory(Arc::new(images.front)),
                back: ImageRef::Memory(Arc::new(images.back)),
            }),
            Self::Directory(dir) => {
                tokio::fs::create_dir_all(dir).await?;
                let front = dir.join(format!("{sheet_id}-front.pgm"));
                let back = dir.join(format!("{sheet_id}-back.pgm"));
                write_pgm(&front, &images.front).await?;
                write_pgm(&back, &images.back).await?;
                debug!("Archived images for sheet {} in {}", sheet_id, dir.display());
                Ok(ScannedSheet {
                    sheet_id,
                    front: ImageRef::File(front),
                    back: ImageRef::File(back),
                })
            }
        }
    }
}

async fn write_pgm(path: &Path, image: &GrayImage) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    let header = format!("P5\n{} {}\n255\n", image.width, image.height);
    file.write_all(header.as_bytes()).await?;
    file.write_all(&image.pixels).await?;
    file.sync_all().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images() -> SheetImages {
        SheetImages {
            front: GrayImage::blank(4, 2),
            back: GrayImage::blank(4, 2),
        }
    }

    #[tokio::test]
    async fn test_directory_archive_writes_pgm() {
        let dir = tempfile::tempdir().unwrap();
        let archive = ImageArchive::directory(dir.path().join("images"));
        let sheet_id = SheetId::new();

        let sheet = archive.store(sheet_id, images()).await.unwrap();

        let ImageRef::File(front) = &sheet.front else {
            panic!("expected file reference");
        };
        assert_eq!(front.file_name().unwrap().to_string_lossy(), format!("{sheet_id}-front.pgm"));

        let bytes = tokio::fs::read(front).await.unwrap();
        assert!(bytes.starts_with(b"P5\n4 2\n255\n"));
        assert_eq!(bytes.len(), "P5\n4 2\n255\n".len() + 8);
        assert!(matches!(&sheet.back, ImageRef::File(path) if path.exists()));
    }

    #[tokio::test]
    async fn test_memory_archive_keeps_images() {
        let sheet = ImageArchive::Memory.store(SheetId::new(), images()).await.unwrap();
        assert_eq!(sheet.front.location(), "memory:4x2");
    }
}
