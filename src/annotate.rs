//! Draws detections over a copy of the input image.

use std::io::Cursor;
use std::path::Path;
use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use crate::common::{Detection, InputImage};

const LABEL_HEIGHT: f32 = 16.;

pub(crate) fn get_class_colour(class: usize) -> Rgb<u8> {
    match class {
        0 => Rgb([128, 0, 128]),     // purple (people)
        1..=8 => Rgb([0, 255, 0]),   // green (vehicles)
        14..=23 => Rgb([255, 0, 0]), // red (animals)
        _ => Rgb([0, 0, 255])        // blue (everything else)
    }
}

pub fn load_font(path: impl AsRef<Path>) -> anyhow::Result<FontVec> {
    let bytes = std::fs::read(path.as_ref())?;
    FontVec::try_from_vec(bytes)
        .map_err(|err| anyhow::anyhow!("Invalid font {}: {}", path.as_ref().display(), err))
}

/// Returns a copy of `image` with a two-pixel box per detection, plus a
/// filled label with the class name and confidence when a font is given.
pub fn draw_detections(image: &InputImage, detections: &[Detection], font: Option<&FontVec>) -> RgbImage {
    let mut img = image.clone_image();
    let (img_w, img_h) = img.dimensions();

    for det in detections {
        let (x, y, w, h) = det.bbox.as_xy_wh_i32();
        let colour = get_class_colour(det.class_id);

        for inset in 0..2 {
            let (w, h) = (w - 2 * inset, h - 2 * inset);
            if w <= 0 || h <= 0 {
                break;
            }
            draw_hollow_rect_mut(&mut img, Rect::at(x + inset, y + inset).of_size(w as u32, h as u32), colour);
        }

        if let Some(font) = font {
            let label = format!("{} {:.2}", det.class_name, det.confidence);
            let scale = PxScale::from(LABEL_HEIGHT);
            let (text_w, text_h) = text_size(scale, font, &label);
            // above the box when there is room, inside it otherwise
            let label_y = if y >= text_h as i32 + 2 { y - text_h as i32 - 2 } else { y };
            let label_x = x.clamp(0, img_w.saturating_sub(1) as i32);
            let label_y = label_y.clamp(0, img_h.saturating_sub(1) as i32);

            draw_filled_rect_mut(
                &mut img,
                Rect::at(label_x, label_y).of_size(text_w.max(1) + 4, text_h.max(1) + 2),
                colour,
            );
            draw_text_mut(&mut img, Rgb([255, 255, 255]), label_x + 2, label_y + 1, scale, font, &label);
        }
    }

    img
}

/// Encodes an annotated image for display.
pub fn encode_png(image: &RgbImage) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image.clone()).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use crate::common::BoundingBox;
    use super::*;

    #[test]
    fn draws_boxes_without_touching_input() {
        let input = InputImage::from(RgbImage::from_pixel(40, 30, Rgb([0, 0, 0])));
        let det = Detection::new(0, "person", 0.9, BoundingBox::new(5., 5., 25., 20.));

        let out = draw_detections(&input, &[det], None);
        assert_eq!(out.dimensions(), (40, 30));
        assert_eq!(*out.get_pixel(5, 5), get_class_colour(0));
        assert_eq!(*out.get_pixel(6, 10), get_class_colour(0));
        assert_eq!(*out.get_pixel(15, 12), Rgb([0, 0, 0]));
        assert_eq!(*input.get_pixel(5, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn tiny_and_offscreen_boxes_are_safe() {
        let input = InputImage::from(RgbImage::new(10, 10));
        let dets = vec![
            Detection::new(3, "car", 0.5, BoundingBox::new(2., 2., 2.2, 2.2)),
            Detection::new(15, "dog", 0.5, BoundingBox::new(8., 8., 30., 30.)),
        ];
        let out = draw_detections(&input, &dets, None);
        assert_eq!(*out.get_pixel(8, 8), get_class_colour(15));
    }

    #[test]
    fn png_output_decodes() {
        let bytes = encode_png(&RgbImage::new(3, 2)).unwrap();
        let decoded = InputImage::decode(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.format, Some(ImageFormat::Png));
    }
}
