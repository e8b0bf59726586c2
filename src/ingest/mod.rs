/// Image ingestion
///
/// This module handles:
/// - Validating user-supplied files (media type and size)
/// - Reading and probing them into an in-memory `ImageData`
/// - Deciding where a window-level file drop should land
/// - Live camera capture (camera.rs)
///
/// File picker and drag-and-drop share the exact same path: both end up as a
/// `RawFile` handed to `ingest`.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::task;

use crate::state::data::ImageData;

pub mod camera;

/// Largest accepted upload: 10 MiB
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Extensions offered by the file picker
pub const PICKER_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "webp", "heic", "tif", "tiff"];

// Extension -> declared media type
const MEDIA_TYPES: [(&str, &str); 14] = [
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("jpe", "image/jpeg"),
    ("jfif", "image/jpeg"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("ico", "image/x-icon"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
    ("avif", "image/avif"),
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    #[error("Please choose an image file (JPG, PNG, WEBP).")]
    NotAnImage { media_type: String },
    #[error("File is too large. Please select an image under 10MB.")]
    TooLarge { size: u64 },
    #[error("Could not read {name}: {reason}")]
    Read { name: String, reason: String },
    #[error("{name} could not be decoded as an image: {reason}")]
    Decode { name: String, reason: String },
}

impl IngestError {
    /// Validation failures are the user's to fix; the others are I/O trouble
    pub fn is_validation(&self) -> bool {
        matches!(self, IngestError::NotAnImage { .. } | IngestError::TooLarge { .. })
    }
}

#[derive(Debug, Clone)]
enum Source {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// A file the user handed us, not yet read or trusted
#[derive(Debug, Clone)]
pub struct RawFile {
    pub name: String,
    /// Declared media type (from the extension for on-disk files)
    pub media_type: String,
    pub size: u64,
    source: Source,
}

impl RawFile {
    /// Describe an on-disk file without reading its contents
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let metadata = std::fs::metadata(path).map_err(|e| IngestError::Read {
            name: name.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            media_type: media_type_for(path).to_string(),
            size: metadata.len(),
            name,
            source: Source::Path(path.to_path_buf()),
        })
    }

    /// Wrap bytes that are already in memory
    pub fn from_bytes(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            size: bytes.len() as u64,
            source: Source::Bytes(bytes),
        }
    }
}

/// Declared media type for a path, by extension
pub fn media_type_for(path: &Path) -> &'static str {
    let Some(extension) = path.extension() else {
        return "application/octet-stream";
    };
    let ext = extension.to_string_lossy().to_lowercase();

    MEDIA_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, media_type)| *media_type)
        .unwrap_or("application/octet-stream")
}

/// Type and size checks; runs before a single byte is read
pub fn validate(file: &RawFile) -> Result<(), IngestError> {
    if !file.media_type.starts_with("image/") {
        return Err(IngestError::NotAnImage {
            media_type: file.media_type.clone(),
        });
    }
    if file.size > MAX_IMAGE_BYTES {
        return Err(IngestError::TooLarge { size: file.size });
    }
    Ok(())
}

/// A validated, decoded upload
#[derive(Debug, Clone)]
pub struct Ingested {
    pub file_name: String,
    pub image: ImageData,
}

/// Validate, read and probe a file into a renderable in-memory image
pub async fn ingest(file: RawFile) -> Result<Ingested, IngestError> {
    validate(&file)?;

    let RawFile { name, media_type, source, .. } = file;

    let bytes = match source {
        Source::Bytes(bytes) => bytes,
        Source::Path(path) => tokio::fs::read(&path).await.map_err(|e| IngestError::Read {
            name: name.clone(),
            reason: e.to_string(),
        })?,
    };

    // The file may have grown between metadata and read
    if bytes.len() as u64 > MAX_IMAGE_BYTES {
        return Err(IngestError::TooLarge {
            size: bytes.len() as u64,
        });
    }

    // Probing can touch the whole header chain; keep it off the async executor
    let probe_name = name.clone();
    let image = task::spawn_blocking(move || ImageData::from_encoded(media_type, bytes))
        .await
        .map_err(|e| IngestError::Read {
            name: probe_name,
            reason: format!("Task join error: {}", e),
        })?
        .map_err(|e| IngestError::Decode {
            name: name.clone(),
            reason: e.to_string(),
        })?;

    tracing::info!("📥 Ingested {} ({}x{})", name, image.dimensions().0, image.dimensions().1);

    Ok(Ingested { file_name: name, image })
}

/// Where a file dropped onto the window goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    Photo,
    CustomCostume,
}

impl DropTarget {
    /// Drops fill the photo slot first; once a photo is set they become a
    /// custom costume. Files named `custom-*` are always costumes.
    pub fn resolve(has_photo: bool, file_name: &str) -> Self {
        if file_name.starts_with("custom-") || has_photo {
            DropTarget::CustomCostume
        } else {
            DropTarget::Photo
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::fixtures;
    use tempfile::tempdir;

    #[test]
    fn test_media_type_for() {
        assert_eq!(media_type_for(Path::new("a/b/photo.JPG")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("scan.webp")), "image/webp");
        assert_eq!(media_type_for(Path::new("scan.TIFF")), "image/tiff");
        assert_eq!(media_type_for(Path::new("scan.tif")), "image/tiff");
        assert_eq!(media_type_for(Path::new("favicon.ico")), "image/x-icon");
        assert_eq!(media_type_for(Path::new("photo.jfif")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("notes.txt")), "application/octet-stream");
        assert_eq!(media_type_for(Path::new("README")), "application/octet-stream");
    }

    #[test]
    fn test_validate_rejects_non_images() {
        let file = RawFile::from_bytes("notes.txt", "text/plain", b"hello".to_vec());
        let error = validate(&file).unwrap_err();
        assert!(matches!(error, IngestError::NotAnImage { .. }));
        assert!(error.is_validation());
    }

    #[test]
    fn test_validate_size_limit_is_inclusive() {
        let at_limit = RawFile {
            name: "big.png".into(),
            media_type: "image/png".into(),
            size: MAX_IMAGE_BYTES,
            source: Source::Bytes(Vec::new()),
        };
        assert!(validate(&at_limit).is_ok());

        let over = RawFile { size: MAX_IMAGE_BYTES + 1, ..at_limit };
        assert_eq!(validate(&over), Err(IngestError::TooLarge { size: MAX_IMAGE_BYTES + 1 }));
    }

    #[test]
    fn test_too_large_message_states_limit() {
        let error = IngestError::TooLarge { size: 15 * 1024 * 1024 };
        assert!(error.to_string().contains("10MB"));
    }

    #[tokio::test]
    async fn test_ingest_png_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("selfie.png");
        std::fs::write(&path, fixtures::png(16, 12, 120)).unwrap();

        let raw = RawFile::from_path(&path).unwrap();
        assert_eq!(raw.media_type, "image/png");

        let ingested = ingest(raw).await.unwrap();
        assert_eq!(ingested.file_name, "selfie.png");
        assert_eq!(ingested.image.dimensions(), (16, 12));
        assert_eq!(ingested.image.media_type(), "image/png");
    }

    #[tokio::test]
    async fn test_ingest_tiff_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.tiff");
        image::RgbImage::from_pixel(4, 4, image::Rgb([90, 60, 30]))
            .save_with_format(&path, image::ImageFormat::Tiff)
            .unwrap();

        let raw = RawFile::from_path(&path).unwrap();
        assert_eq!(raw.media_type, "image/tiff");

        let ingested = ingest(raw).await.unwrap();
        assert_eq!(ingested.image.dimensions(), (4, 4));
        assert_eq!(ingested.image.extension(), "tif");
    }

    #[tokio::test]
    async fn test_ingest_large_jpeg_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("portrait.jpg");

        // Noise keeps the JPEG from compressing down to nothing
        let mut seed: u32 = 0x2545_f491;
        let portrait = image::RgbImage::from_fn(2000, 1500, |_, _| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let [r, g, b, _] = seed.to_le_bytes();
            image::Rgb([r, g, b])
        });
        portrait.save_with_format(&path, image::ImageFormat::Jpeg).unwrap();

        let raw = RawFile::from_path(&path).unwrap();
        assert!(raw.size > 512 * 1024, "fixture is only {} bytes", raw.size);
        assert!(raw.size <= MAX_IMAGE_BYTES);

        let ingested = ingest(raw).await.unwrap();
        assert_eq!(ingested.file_name, "portrait.jpg");
        assert_eq!(ingested.image.media_type(), "image/jpeg");
        assert_eq!(ingested.image.dimensions(), (2000, 1500));
    }

    #[tokio::test]
    async fn test_ingest_rejects_oversized_png_without_reading() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("huge.png");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(15 * 1024 * 1024).unwrap();

        let raw = RawFile::from_path(&path).unwrap();
        let error = ingest(raw).await.unwrap_err();
        assert_eq!(error, IngestError::TooLarge { size: 15 * 1024 * 1024 });
    }

    #[tokio::test]
    async fn test_ingest_rejects_wrong_type() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("document.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let error = ingest(RawFile::from_path(&path).unwrap()).await.unwrap_err();
        assert!(matches!(error, IngestError::NotAnImage { .. }));
    }

    #[tokio::test]
    async fn test_ingest_undecodable_image() {
        let raw = RawFile::from_bytes("broken.png", "image/png", vec![0u8; 64]);
        let error = ingest(raw).await.unwrap_err();
        assert!(matches!(error, IngestError::Decode { .. }));
        assert!(!error.is_validation());
    }

    #[tokio::test]
    async fn test_ingest_from_memory() {
        let raw = RawFile::from_bytes("frame.png", "image/png", fixtures::png(4, 4, 0));
        let ingested = ingest(raw).await.unwrap();
        assert_eq!(ingested.image.dimensions(), (4, 4));
    }

    #[test]
    fn test_missing_file() {
        let error = RawFile::from_path(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(error, IngestError::Read { .. }));
    }

    #[test]
    fn test_drop_target() {
        assert_eq!(DropTarget::resolve(false, "me.jpg"), DropTarget::Photo);
        assert_eq!(DropTarget::resolve(true, "me.jpg"), DropTarget::CustomCostume);
        assert_eq!(DropTarget::resolve(false, "custom-armor.png"), DropTarget::CustomCostume);
    }
}
