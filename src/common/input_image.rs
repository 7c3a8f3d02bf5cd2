use image::{DynamicImage, ImageFormat, RgbImage};
use crate::error::DetectError;

/// Formats accepted at the input boundary.
const ACCEPTED_FORMATS: [ImageFormat; 3] = [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Bmp];

/// A decoded RGB8 image owned by a single request.
#[derive(Debug, Clone, Default)]
pub struct InputImage {
    pub image: RgbImage,
    pub format: Option<ImageFormat>,
}

impl std::ops::Deref for InputImage {
    type Target = RgbImage;

    fn deref(&self) -> &Self::Target {
        &self.image
    }
}

impl From<DynamicImage> for InputImage {
    fn from(image: DynamicImage) -> Self {
        Self {
            image: image.to_rgb8(),
            format: None,
        }
    }
}

impl From<RgbImage> for InputImage {
    fn from(image: RgbImage) -> Self {
        Self {
            image,
            format: None,
        }
    }
}

impl InputImage {
    /// Decodes PNG, JPEG or BMP bytes into a 3-channel image.
    pub fn decode(bytes: &[u8]) -> Result<Self, DetectError> {
        let format = image::guess_format(bytes)
            .map_err(|err| DetectError::ImageDecode(err.to_string()))?;
        if !ACCEPTED_FORMATS.contains(&format) {
            return Err(DetectError::ImageDecode(format!(
                "unsupported image format {:?}, expected PNG, JPEG or BMP",
                format
            )));
        }

        let image = image::load_from_memory_with_format(bytes, format)
            .map_err(|err| DetectError::ImageDecode(err.to_string()))?;
        if image.width() == 0 || image.height() == 0 {
            return Err(DetectError::ImageDecode("image has no pixels".to_string()));
        }
        log::trace!("Decoded {:?} image {}x{}", format, image.width(), image.height());

        Ok(Self {
            image: image.to_rgb8(),
            format: Some(format),
        })
    }

    pub fn get_ratio(&self) -> f32 {
        self.image.width() as f32 / self.image.height() as f32
    }

    pub fn clone_image(&self) -> RgbImage {
        self.image.clone()
    }

    pub fn to_dyn(&self) -> DynamicImage {
        DynamicImage::from(self.image.clone())
    }
}
