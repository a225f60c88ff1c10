//! PDF output through printpdf.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{GenericImageView, PixelWithColorType, RgbImage};
use log::debug;
use printpdf::{
    BuiltinFont, Color, ColorBits, ColorSpace, Image, ImageFilter, ImageTransform, ImageXObject,
    IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Px, Rgb,
};

use crate::page::{PageSpec, Point, Rect};
use crate::render::{DrawSurface, Stroke};
use crate::TileError;

const MM_PER_INCH: f32 = 25.4;

/// Tiles are embedded at no more than this resolution
pub const PRINT_DPI: f64 = 300.0;

const JPEG_QUALITY: u8 = 95;

/// Tile image scaled to print resolution and JPEG-encoded once per sheet run
struct EncodedTile {
    source: RgbImage,
    target: (u32, u32),
    grayscale: bool,
    data: Vec<u8>,
}

impl EncodedTile {
    fn encode(source: &RgbImage, target: (u32, u32)) -> Result<Self, TileError> {
        let scaled = if source.dimensions() == target {
            source.clone()
        } else {
            // Nearest keeps QR modules hard-edged
            imageops::resize(source, target.0, target.1, FilterType::Nearest)
        };

        let grayscale = scaled.pixels().all(|p| p[0] == p[1] && p[1] == p[2]);
        let data = if grayscale {
            encode_jpeg(&imageops::grayscale(&scaled))?
        } else {
            encode_jpeg(&scaled)?
        };
        debug!(
            "Encoded tile image {:?} -> {:?}, {} bytes",
            source.dimensions(),
            target,
            data.len()
        );

        Ok(Self {
            source: source.clone(),
            target,
            grayscale,
            data,
        })
    }

    fn matches(&self, source: &RgbImage, target: (u32, u32)) -> bool {
        self.target == target && self.source == *source
    }

    fn xobject(&self) -> ImageXObject {
        ImageXObject {
            width: Px(self.target.0 as usize),
            height: Px(self.target.1 as usize),
            color_space: if self.grayscale {
                ColorSpace::Greyscale
            } else {
                ColorSpace::Rgb
            },
            bits_per_component: ColorBits::Bit8,
            interpolate: false,
            image_data: self.data.clone(),
            image_filter: Some(ImageFilter::DCT),
            clipping_bbox: None,
            smask: None,
        }
    }
}

fn encode_jpeg<I>(image: &I) -> Result<Vec<u8>, TileError>
where
    I: GenericImageView,
    I::Pixel: PixelWithColorType,
{
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, JPEG_QUALITY)
        .encode_image(image)
        .map_err(|e| TileError::Image(e.to_string()))?;
    Ok(data)
}

/// Pixel size for a tile: source size capped at `PRINT_DPI` for the rect
pub fn print_pixels((width, height): (u32, u32), rect: Rect) -> (u32, u32) {
    let fit = |px: u32, mm: f64| {
        let wanted = (mm / f64::from(MM_PER_INCH) * PRINT_DPI).ceil().max(1.0) as u32;
        px.min(wanted)
    };
    (fit(width, rect.width), fit(height, rect.height))
}

/// Drawing surface backed by a printpdf document
pub struct PdfSurface {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    page: PageSpec,
    pages: u32,
    encoded: Option<EncodedTile>,
}

impl PdfSurface {
    /// Creates a document with one empty page of the given size
    pub fn new(title: &str, page: PageSpec) -> Result<Self, TileError> {
        let (doc, first_page, first_layer) = PdfDocument::new(
            title,
            Mm(page.width as f32),
            Mm(page.height as f32),
            "Page 1",
        );
        let layer = doc.get_page(first_page).get_layer(first_layer);
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| TileError::Render(e.to_string()))?;

        Ok(Self {
            doc,
            layer,
            font,
            page,
            pages: 1,
            encoded: None,
        })
    }

    pub fn page_count(&self) -> u32 {
        self.pages
    }

    /// Writes the document to `path`
    pub fn save(self, path: &Path) -> Result<(), TileError> {
        let file = File::create(path)?;
        self.doc
            .save(&mut BufWriter::new(file))
            .map_err(|e| TileError::Render(e.to_string()))
    }
}

impl DrawSurface for PdfSurface {
    fn new_page(&mut self) -> Result<(), TileError> {
        self.pages += 1;
        let (page, layer) = self.doc.add_page(
            Mm(self.page.width as f32),
            Mm(self.page.height as f32),
            format!("Page {}", self.pages),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        Ok(())
    }

    fn draw_line(&mut self, from: Point, to: Point, stroke: Stroke) -> Result<(), TileError> {
        let gray = f32::clamp(stroke.gray, 0.0, 1.0);
        self.layer
            .set_outline_color(Color::Rgb(Rgb::new(gray, gray, gray, None)));
        self.layer.set_outline_thickness(stroke.width);

        let line = Line {
            points: vec![
                (printpdf::Point::new(Mm(from.x as f32), Mm(from.y as f32)), false),
                (printpdf::Point::new(Mm(to.x as f32), Mm(to.y as f32)), false),
            ],
            is_closed: false,
        };
        self.layer.add_line(line);
        Ok(())
    }

    fn draw_image(&mut self, image: &RgbImage, rect: Rect) -> Result<(), TileError> {
        let (width_px, height_px) = image.dimensions();
        if width_px == 0 || height_px == 0 {
            return Err(TileError::Image("cannot place an empty image".to_string()));
        }

        let target = print_pixels((width_px, height_px), rect);
        let tile = match self.encoded.take() {
            Some(tile) if tile.matches(image, target) => tile,
            _ => EncodedTile::encode(image, target)?,
        };
        let xobject = Image::from(tile.xobject());
        self.encoded = Some(tile);
        let (width_px, height_px) = target;

        // DPI sets the width; scale_y stretches the height to the same rect
        let target_width = rect.width as f32;
        let target_height = rect.height as f32;
        let dpi = width_px as f32 / (target_width / MM_PER_INCH);
        let natural_height = height_px as f32 / dpi * MM_PER_INCH;

        xobject.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(rect.x as f32)),
                translate_y: Some(Mm(rect.y as f32)),
                dpi: Some(dpi),
                scale_y: Some(target_height / natural_height),
                ..Default::default()
            },
        );
        Ok(())
    }

    fn draw_text(&mut self, text: &str, at: Point, font_size: f32) -> Result<(), TileError> {
        self.layer
            .set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        self.layer.use_text(
            text,
            font_size,
            Mm(at.x as f32),
            Mm(at.y as f32),
            &self.font,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb as Pixel;

    fn rect(size: f64) -> Rect {
        Rect::new(0.0, 0.0, size, size)
    }

    #[test]
    fn test_print_pixels_caps_large_images() {
        // 25 mm at 300 dpi is 295.3 px
        assert_eq!(print_pixels((600, 600), rect(25.0)), (296, 296));
    }

    #[test]
    fn test_print_pixels_never_upscales() {
        assert_eq!(print_pixels((40, 40), rect(25.0)), (40, 40));
    }

    #[test]
    fn test_encoded_tile_is_jpeg_and_reused() {
        let mut image = RgbImage::from_pixel(600, 600, Pixel([255, 255, 255]));
        for x in 0..300 {
            for y in 0..300 {
                image.put_pixel(x, y, Pixel([0, 0, 0]));
            }
        }

        let tile = EncodedTile::encode(&image, (296, 296)).unwrap();
        assert!(tile.grayscale);
        assert!(tile.data.starts_with(&[0xFF, 0xD8]));
        assert!(tile.data.len() < image.as_raw().len() / 10);
        assert!(tile.matches(&image, (296, 296)));
        assert!(!tile.matches(&image, (100, 100)));
    }

    #[test]
    fn test_colored_tile_stays_rgb() {
        let image = RgbImage::from_pixel(8, 8, Pixel([200, 20, 20]));
        let tile = EncodedTile::encode(&image, (8, 8)).unwrap();
        assert!(!tile.grayscale);
    }
}
