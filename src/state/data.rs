/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// ingestion, the transformation service and the UI layer.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use iced::widget::image::Handle;
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

/// A decoded-and-verified image held entirely in memory.
///
/// The bytes stay in their original encoding (JPEG, PNG, ...) so they can be
/// shipped to the transformation service untouched. The render handle is
/// created once so the UI does not re-upload the texture on every frame.
#[derive(Clone)]
pub struct ImageData {
    media_type: String,
    bytes: Arc<[u8]>,
    width: u32,
    height: u32,
    handle: Handle,
}

impl ImageData {
    /// Probe an encoded image and wrap it.
    ///
    /// Fails if the `image` crate cannot recognise the format or read its
    /// dimensions, which is our definition of "not renderable".
    pub fn from_encoded(media_type: impl Into<String>, bytes: Vec<u8>) -> Result<Self, image::ImageError> {
        let (width, height) = image::ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()?
            .into_dimensions()?;

        let handle = Handle::from_bytes(bytes.clone());

        Ok(Self {
            media_type: media_type.into(),
            bytes: bytes.into(),
            width,
            height,
            handle,
        })
    }

    /// Declared media type, e.g. `image/png`
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Pixel dimensions (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Render handle for iced image widgets and canvas frames
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// File extension matching the media type, used for save dialogs
    pub fn extension(&self) -> &'static str {
        match self.media_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/tiff" => "tif",
            "image/x-icon" => "ico",
            "image/heic" => "heic",
            "image/heif" => "heif",
            "image/avif" => "avif",
            "image/gif" => "gif",
            "image/bmp" => "bmp",
            _ => "png",
        }
    }
}

impl PartialEq for ImageData {
    fn eq(&self, other: &Self) -> bool {
        self.media_type == other.media_type && self.bytes == other.bytes
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Costume categories shown in the selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CostumeCategory {
    Anime,
    Gaming,
    Movies,
    Fantasy,
    /// User supplied reference image
    Custom,
}

impl CostumeCategory {
    /// Catalog categories in display order (Custom is never listed)
    pub const CATALOG: [CostumeCategory; 4] = [
        CostumeCategory::Anime,
        CostumeCategory::Gaming,
        CostumeCategory::Movies,
        CostumeCategory::Fantasy,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CostumeCategory::Anime => "Anime",
            CostumeCategory::Gaming => "Gaming",
            CostumeCategory::Movies => "Movies",
            CostumeCategory::Fantasy => "Fantasy",
            CostumeCategory::Custom => "Custom",
        }
    }

    /// Short tag used as id prefix
    pub fn tag(&self) -> &'static str {
        match self {
            CostumeCategory::Anime => "anime",
            CostumeCategory::Gaming => "gaming",
            CostumeCategory::Movies => "movies",
            CostumeCategory::Fantasy => "fantasy",
            CostumeCategory::Custom => "custom",
        }
    }
}

impl fmt::Display for CostumeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a costume's preview image comes from
#[derive(Debug, Clone, PartialEq)]
pub enum Thumbnail {
    /// Catalog artwork fetched over HTTP
    Remote(String),
    /// Image the user uploaded themselves
    Embedded(ImageData),
}

/// A named, categorized reference used as the transformation target
#[derive(Debug, Clone, PartialEq)]
pub struct Costume {
    /// Unique id ("c1".."c20" for the catalog, "custom-..." for uploads)
    pub id: String,
    pub name: String,
    pub category: CostumeCategory,
    pub thumbnail: Thumbnail,
}

impl Costume {
    pub fn is_custom(&self) -> bool {
        self.category == CostumeCategory::Custom
    }

    /// The uploaded reference image, if this is a custom costume
    pub fn reference_image(&self) -> Option<&ImageData> {
        match &self.thumbnail {
            Thumbnail::Embedded(image) => Some(image),
            Thumbnail::Remote(_) => None,
        }
    }
}

/// Result of one successful transformation call
#[derive(Debug, Clone, PartialEq)]
pub struct Transformation {
    pub id: String,
    pub original_image: ImageData,
    pub result_image: ImageData,
    pub costume: Costume,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Encode a tiny solid-color PNG
    pub fn png(width: u32, height: u32, shade: u8) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([shade, shade, shade]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    pub fn image(shade: u8) -> ImageData {
        ImageData::from_encoded("image/png", png(8, 6, shade)).unwrap()
    }
}
