//! Functions to preprocess images into model input tensors.

use anyhow::{bail, Result};
use fast_image_resize::{
    images::{CroppedImageMut, Image as FirImage},
    pixels::PixelType,
    ResizeAlg, ResizeOptions, Resizer,
};
use image::RgbImage;
use ndarray::Array;
use crate::data::X;

/// Background value of the letterbox padding.
pub const LETTERBOX_FILL: u8 = 114;

/// Letterboxes `xs` and stacks them into one NCHW `[0, 1]` tensor of
/// `target_h` x `target_w`.
pub fn preprocess(xs: &[FirImage], target_h: u32, target_w: u32) -> Result<X> {
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(
        fast_image_resize::FilterType::Bilinear,
    ));

    let channels = 3;
    let height = target_h as usize;
    let width = target_w as usize;
    let image_size = channels * height * width;

    let mut resizer = Resizer::new();
    let mut batch_flat: Vec<f32> = Vec::with_capacity(xs.len() * image_size);
    for img in xs.iter() {
        let resized = letterbox_image(img, target_h, target_w, LETTERBOX_FILL, &mut resizer, &options)?;
        batch_flat.extend(nchw_normalize_flat(&resized)?);
    }

    let batch = Array::from_shape_vec(
        (xs.len(), channels, height, width),
        batch_flat,
    )?.into_dyn();

    Ok(X::from(batch))
}

/// Scale factor the letterbox applies to a `w0` x `h0` image.
pub fn letterbox_ratio(w0: u32, h0: u32, target_w: u32, target_h: u32) -> f32 {
    (target_w as f32 / w0 as f32).min(target_h as f32 / h0 as f32)
}

pub fn to_fir_image(image: &RgbImage) -> Result<FirImage<'static>> {
    let (width, height) = image.dimensions();
    let buffer = image.as_raw().clone();

    Ok(FirImage::from_vec_u8(width, height, buffer, PixelType::U8x3)?)
}

/// Aspect-preserving resize into the top-left corner of a padded canvas.
fn letterbox_image(
    img: &FirImage,
    target_h: u32,
    target_w: u32,
    bg: u8,
    resizer: &mut Resizer,
    resize_options: &ResizeOptions,
) -> Result<FirImage<'static>> {
    let scale = letterbox_ratio(img.width(), img.height(), target_w, target_h);
    let new_w = ((img.width() as f32 * scale).round() as u32).clamp(1, target_w);
    let new_h = ((img.height() as f32 * scale).round() as u32).clamp(1, target_h);

    let mut padded = FirImage::from_vec_u8(
        target_w,
        target_h,
        vec![bg; (target_w * target_h * 3) as usize],
        PixelType::U8x3,
    )?;

    let mut cropped = CroppedImageMut::new(&mut padded, 0, 0, new_w, new_h)?;
    resizer.resize(img, &mut cropped, resize_options)?;

    Ok(padded)
}

fn nchw_normalize_flat(img: &FirImage) -> Result<Vec<f32>> {
    let buf = img.buffer();
    let w = img.width() as usize;
    let h = img.height() as usize;

    if buf.len() != w * h * 3 {
        bail!("Unexpected buffer size: got {}, expected {}", buf.len(), w * h * 3);
    }

    let mut out = vec![0.0f32; buf.len()];
    let hw = w * h;

    for i in 0..hw {
        out[i] = buf[3 * i] as f32 / 255.0;
        out[i + hw] = buf[3 * i + 1] as f32 / 255.0;
        out[i + 2 * hw] = buf[3 * i + 2] as f32 / 255.0;
    }

    Ok(out)
}
