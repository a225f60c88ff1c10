//! Модуль подготовки изображения QR-кода
//!
//! Перед вставкой в документ изображение:
//! - Загружается с диска (отсутствующий файл - ошибка NotFound)
//! - Накладывается на непрозрачный белый фон (прозрачные пиксели становятся белыми)
//! - При необходимости уменьшается с сохранением пропорций

use std::path::Path;

use image::{DynamicImage, Rgb, RgbImage};
use log::info;
use serde::{Deserialize, Serialize};

use crate::TileError;

/// Конфигурация подготовки изображения
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Максимальная сторона в пикселях (None - без уменьшения)
    pub max_dimension: Option<u32>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_dimension: Some(1200),
        }
    }
}

/// Процессор изображений
pub struct ImageProcessor {
    config: ProcessingConfig,
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new(ProcessingConfig::default())
    }
}

impl ImageProcessor {
    /// Создание процессора с конфигурацией
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// Загрузка и подготовка изображения из файла
    pub fn load(&self, path: &Path) -> Result<RgbImage, TileError> {
        if !path.exists() {
            return Err(TileError::NotFound(path.to_path_buf()));
        }

        let img = image::open(path).map_err(|e| TileError::Image(e.to_string()))?;
        info!("Loaded {:?}, size: {:?}", path, (img.width(), img.height()));

        Ok(self.process(&img))
    }

    /// Подготовка изображения из байтов (PNG, JPEG)
    pub fn load_bytes(&self, bytes: &[u8]) -> Result<RgbImage, TileError> {
        let img = image::load_from_memory(bytes).map_err(|e| TileError::Image(e.to_string()))?;
        Ok(self.process(&img))
    }

    /// Полная обработка: белый фон, затем уменьшение
    pub fn process(&self, img: &DynamicImage) -> RgbImage {
        let flat = self.flatten(img);
        match self.config.max_dimension {
            Some(max_dimension) => self.resize(&flat, max_dimension),
            None => flat,
        }
    }

    /// Наложение на белый фон по альфа-каналу
    pub fn flatten(&self, img: &DynamicImage) -> RgbImage {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut result = RgbImage::new(width, height);

        for (x, y, pixel) in rgba.enumerate_pixels() {
            let [r, g, b, a] = pixel.0;
            let alpha = f32::from(a) / 255.0;
            let blend = |channel: u8| (f32::from(channel) * alpha + 255.0 * (1.0 - alpha)).round() as u8;
            result.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
        }

        result
    }

    /// Ресайз изображения с сохранением пропорций (ближайший сосед, модули остаются чёткими)
    pub fn resize(&self, img: &RgbImage, max_dimension: u32) -> RgbImage {
        let (width, height) = img.dimensions();

        if width <= max_dimension && height <= max_dimension {
            return img.clone();
        }

        let scale = if width > height {
            max_dimension as f32 / width as f32
        } else {
            max_dimension as f32 / height as f32
        };

        let new_width = ((width as f32 * scale) as u32).max(1);
        let new_height = ((height as f32 * scale) as u32).max(1);

        image::imageops::resize(
            img,
            new_width,
            new_height,
            image::imageops::FilterType::Nearest,
        )
    }
}
