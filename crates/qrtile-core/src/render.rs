//! Sheet rendering on an abstract drawing surface.
//!
//! The renderer only issues commands in page coordinates (mm, origin at the
//! bottom-left). Encoding them into a document is up to the surface.

use image::RgbImage;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::geometry::SheetGeometry;
use crate::page::{Point, Rect};
use crate::TileError;

/// Line appearance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// 0.0 is black, 1.0 is white
    pub gray: f32,
    /// Width in points
    pub width: f32,
}

impl Stroke {
    /// Light grey hairline for cut guides
    pub const CUT_GUIDE: Stroke = Stroke { gray: 0.8, width: 0.5 };
    pub const RULER: Stroke = Stroke { gray: 0.0, width: 0.3 };
}

/// Drawing capabilities the renderer needs
pub trait DrawSurface {
    /// Starts a new page of the same size
    fn new_page(&mut self) -> Result<(), TileError>;

    fn draw_line(&mut self, from: Point, to: Point, stroke: Stroke) -> Result<(), TileError>;

    /// Draws the image stretched to `rect`
    fn draw_image(&mut self, image: &RgbImage, rect: Rect) -> Result<(), TileError>;

    /// `at` is the text baseline start, `font_size` is in points
    fn draw_text(&mut self, text: &str, at: Point, font_size: f32) -> Result<(), TileError>;
}

/// One recorded drawing instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    NewPage,
    Line { from: Point, to: Point, stroke: Stroke },
    Image { rect: Rect },
    Text { text: String, at: Point, font_size: f32 },
}

/// Surface that keeps the commands instead of drawing them
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }

    /// Rectangles of all recorded image commands
    pub fn image_rects(&self) -> Vec<Rect> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Image { rect } => Some(*rect),
                _ => None,
            })
            .collect()
    }
}

impl DrawSurface for RecordingSurface {
    fn new_page(&mut self) -> Result<(), TileError> {
        self.commands.push(DrawCommand::NewPage);
        Ok(())
    }

    fn draw_line(&mut self, from: Point, to: Point, stroke: Stroke) -> Result<(), TileError> {
        self.commands.push(DrawCommand::Line { from, to, stroke });
        Ok(())
    }

    fn draw_image(&mut self, _image: &RgbImage, rect: Rect) -> Result<(), TileError> {
        self.commands.push(DrawCommand::Image { rect });
        Ok(())
    }

    fn draw_text(&mut self, text: &str, at: Point, font_size: f32) -> Result<(), TileError> {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            at,
            font_size,
        });
        Ok(())
    }
}

/// Rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Number of identical sheets in the document
    pub sheets: u32,
    /// Draw a millimetre ruler along the top edge
    pub ruler: bool,
    pub cut_guides: bool,
    pub guide_stroke: Stroke,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            sheets: 1,
            ruler: false,
            cut_guides: true,
            guide_stroke: Stroke::CUT_GUIDE,
        }
    }
}

const FINE_TICK_MM: f64 = 1.5;
const MINOR_TICK_MM: f64 = 3.0;
const MAJOR_TICK_MM: f64 = 5.0;
const LABEL_FONT_PT: f32 = 6.0;

/// Issues the drawing commands for a planned sheet
pub struct SheetRenderer {
    options: RenderOptions,
}

impl Default for SheetRenderer {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

impl SheetRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Renders every sheet; the surface already holds the first page.
    pub fn render<S: DrawSurface + ?Sized>(
        &self,
        surface: &mut S,
        geometry: &SheetGeometry,
        image: &RgbImage,
    ) -> Result<(), TileError> {
        let sheets = self.options.sheets.max(1);
        for sheet in 0..sheets {
            if sheet > 0 {
                surface.new_page()?;
            }
            self.render_sheet(surface, geometry, image)?;
        }
        debug!(
            "Rendered {} sheet(s) with {} tiles each",
            sheets, geometry.layout.count
        );
        Ok(())
    }

    fn render_sheet<S: DrawSurface + ?Sized>(
        &self,
        surface: &mut S,
        geometry: &SheetGeometry,
        image: &RgbImage,
    ) -> Result<(), TileError> {
        if self.options.cut_guides {
            for line in geometry.cut_lines() {
                surface.draw_line(line.from, line.to, self.options.guide_stroke)?;
            }
        }

        for rect in geometry.tile_rects() {
            surface.draw_image(image, rect)?;
        }

        if self.options.ruler {
            draw_ruler(surface, geometry.page.width, geometry.page.height)?;
        }
        Ok(())
    }
}

/// Ticks hang down from the top edge: every 1 mm fine, every 5 mm minor,
/// every 10 mm major with a label.
fn draw_ruler<S: DrawSurface + ?Sized>(
    surface: &mut S,
    page_width: f64,
    page_height: f64,
) -> Result<(), TileError> {
    // Page widths are far below u32::MAX millimetres
    let last = page_width.floor() as u32;

    for mm in 0..=last {
        let x = f64::from(mm);
        let length = if mm % 10 == 0 {
            MAJOR_TICK_MM
        } else if mm % 5 == 0 {
            MINOR_TICK_MM
        } else {
            FINE_TICK_MM
        };

        surface.draw_line(
            Point::new(x, page_height),
            Point::new(x, page_height - length),
            Stroke::RULER,
        )?;

        if mm % 10 == 0 && mm > 0 {
            let label = Point::new(x + 0.5, page_height - MAJOR_TICK_MM - 2.5);
            surface.draw_text(&mm.to_string(), label, LABEL_FONT_PT)?;
        }
    }
    Ok(())
}
