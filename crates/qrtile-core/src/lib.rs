//! QRTile Core - Модуль раскладки QR-кодов для печати
//!
//! Библиотека для многократного размещения одного QR-кода на листе:
//! - Оптимизация сетки (максимальный размер, максимальное количество, резка на квадраты)
//! - Расчёт положения плиток и линий реза
//! - Отрисовка на абстрактной поверхности (PDF через printpdf)
//! - Подготовка изображения (прозрачность на белый фон)

pub mod geometry;
pub mod layout;
pub mod page;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod preprocessing;
pub mod render;

pub use geometry::{Segment, SheetGeometry};
pub use layout::{
    LayoutMode, LayoutOptimizer, LayoutOptions, LayoutRequest, LayoutResult, MarginPolicy, Objective,
};
pub use page::{PageSpec, Point, Rect};
#[cfg(feature = "pdf")]
pub use pdf::PdfSurface;
pub use preprocessing::{ImageProcessor, ProcessingConfig};
pub use render::{
    DrawCommand, DrawSurface, RecordingSurface, RenderOptions, SheetRenderer, Stroke,
};

use std::path::{Path, PathBuf};

use image::RgbImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Основные ошибки модуля
#[derive(Error, Debug)]
pub enum TileError {
    #[error("Image not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Image processing error: {0}")]
    Image(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Полная конфигурация генерации листа
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    pub page: PageSpec,
    pub layout: LayoutOptions,
    pub render: RenderOptions,
    pub processing: ProcessingConfig,
    /// Каталог для готовых PDF
    pub output_dir: PathBuf,
}

impl SheetConfig {
    /// Загрузка конфигурации из JSON-файла
    pub fn load(path: &Path) -> Result<Self, TileError> {
        if !path.exists() {
            return Err(TileError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, TileError> {
        serde_json::from_str(text).map_err(|e| TileError::Configuration(e.to_string()))
    }
}

/// Раскладка листа: сетка и положение плиток
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SheetPlan {
    pub layout: LayoutResult,
    pub geometry: SheetGeometry,
}

/// Результат генерации: путь, количество, размер
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetOutput {
    pub path: PathBuf,
    /// Плиток на одном листе
    pub count: u32,
    /// Сторона плитки (мм)
    pub tile_size: f64,
    pub sheets: u32,
}

/// Главный генератор листов
pub struct SheetGenerator {
    config: SheetConfig,
    processor: ImageProcessor,
    optimizer: LayoutOptimizer,
    renderer: SheetRenderer,
}

impl Default for SheetGenerator {
    fn default() -> Self {
        Self::new(SheetConfig::default())
    }
}

impl SheetGenerator {
    /// Создание генератора с конфигурацией
    pub fn new(config: SheetConfig) -> Self {
        Self {
            processor: ImageProcessor::new(config.processing.clone()),
            optimizer: LayoutOptimizer::new(config.layout.clone()),
            renderer: SheetRenderer::new(config.render.clone()),
            config,
        }
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    pub fn processor(&self) -> &ImageProcessor {
        &self.processor
    }

    /// Расчёт раскладки без отрисовки
    pub fn plan(&self, request: &LayoutRequest) -> Result<SheetPlan, TileError> {
        let layout = self.optimizer.optimize(&self.config.page, request)?;
        let geometry = SheetGeometry::new(self.config.page, layout);
        Ok(SheetPlan { layout, geometry })
    }

    /// Отрисовка готовой раскладки на любой поверхности
    pub fn render<S: DrawSurface + ?Sized>(
        &self,
        surface: &mut S,
        image: &RgbImage,
        plan: &SheetPlan,
    ) -> Result<(), TileError> {
        self.renderer.render(surface, &plan.geometry, image)
    }

    /// Имя выходного файла, однозначно задаваемое параметрами
    pub fn output_file_name(&self, layout: &LayoutResult) -> String {
        let suffix = match layout.objective {
            Objective::TightPack => "",
            Objective::SquareCut => "_cut",
        };
        format!(
            "qr_{}pcs_{:.1}mm_margin{:.1}mm{}.pdf",
            layout.count, layout.tile_size, self.config.page.margin, suffix
        )
    }

    /// Полный цикл: изображение, раскладка, PDF
    #[cfg(feature = "pdf")]
    pub fn generate(
        &self,
        image_path: &Path,
        request: &LayoutRequest,
    ) -> Result<SheetOutput, TileError> {
        log::info!("Generating sheet for {:?}", image_path);

        let image = self.processor.load(image_path)?;
        let plan = self.plan(request)?;
        log::info!(
            "Layout: {}x{} grid, {} tiles of {:.1} mm",
            plan.layout.columns, plan.layout.rows, plan.layout.count, plan.layout.tile_size
        );

        let mut surface = PdfSurface::new("QR Tiles", self.config.page)?;
        self.render(&mut surface, &image, &plan)?;
        let sheets = surface.page_count();

        if !self.config.output_dir.as_os_str().is_empty() {
            std::fs::create_dir_all(&self.config.output_dir)?;
        }
        let path = self.config.output_dir.join(self.output_file_name(&plan.layout));
        surface.save(&path)?;
        log::info!("Saved {:?}", path);

        Ok(SheetOutput {
            path,
            count: plan.layout.count,
            tile_size: plan.layout.tile_size,
            sheets,
        })
    }
}
