//! WASM bindings для раскладки QR-кодов
//!
//! Предоставляет JavaScript API: расчёт сетки, список команд отрисовки
//! для canvas и подготовку изображения (прозрачность на белый фон)

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbImage};
use qrtile_core::{
    DrawCommand, LayoutRequest, LayoutResult, PageSpec, RecordingSurface, SheetConfig,
    SheetGenerator,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Инициализация panic hook и логирования
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
    log::info!("QR tile WASM module initialized");
}

/// Раскладка вместе с командами отрисовки одного листа
#[derive(Serialize)]
struct SheetDrawing {
    layout: LayoutResult,
    commands: Vec<DrawCommand>,
}

/// JavaScript-доступный планировщик листов
#[wasm_bindgen]
pub struct WasmSheetPlanner {
    generator: SheetGenerator,
}

#[wasm_bindgen]
impl WasmSheetPlanner {
    /// Создание планировщика с настройками по умолчанию (A4, поле 5 мм)
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            generator: SheetGenerator::default(),
        }
    }

    /// Создание планировщика из JSON-конфигурации
    ///
    /// @param config - строка JSON с полями page, layout, render
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config: &str) -> Result<WasmSheetPlanner, JsError> {
        let config = SheetConfig::from_json(config).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(Self {
            generator: SheetGenerator::new(config),
        })
    }

    /// Расчёт сетки
    ///
    /// @param count - количество кодов или undefined
    /// @param size - сторона кода в мм или undefined
    /// @returns LayoutResult
    #[wasm_bindgen(js_name = planLayout)]
    pub fn plan_layout(&self, count: Option<u32>, size: Option<f64>) -> Result<JsValue, JsError> {
        let plan = self
            .generator
            .plan(&LayoutRequest::new(count, size))
            .map_err(|e| JsError::new(&e.to_string()))?;

        serde_wasm_bindgen::to_value(&plan.layout).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Команды отрисовки листа в миллиметрах (начало координат внизу слева)
    ///
    /// @returns Object { layout, commands }
    #[wasm_bindgen(js_name = planSheet)]
    pub fn plan_sheet(&self, count: Option<u32>, size: Option<f64>) -> Result<JsValue, JsError> {
        let plan = self
            .generator
            .plan(&LayoutRequest::new(count, size))
            .map_err(|e| JsError::new(&e.to_string()))?;

        // Изображение рисует сам JS, здесь нужен только прямоугольник
        let placeholder = RgbImage::new(1, 1);
        let mut surface = RecordingSurface::new();
        self.generator
            .render(&mut surface, &placeholder, &plan)
            .map_err(|e| JsError::new(&e.to_string()))?;

        let drawing = SheetDrawing {
            layout: plan.layout,
            commands: surface.into_commands(),
        };
        serde_wasm_bindgen::to_value(&drawing).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Наложение изображения на белый фон
    ///
    /// @param image_data - Uint8Array с PNG или JPEG
    /// @returns Uint8Array с PNG без прозрачности
    #[wasm_bindgen(js_name = flattenImage)]
    pub fn flatten_image(&self, image_data: &[u8]) -> Result<js_sys::Uint8Array, JsError> {
        let flat = self
            .generator
            .processor()
            .load_bytes(image_data)
            .map_err(|e| JsError::new(&e.to_string()))?;

        let png = encode_png(flat).map_err(|e| JsError::new(&e))?;
        Ok(js_sys::Uint8Array::from(png.as_slice()))
    }
}

impl Default for WasmSheetPlanner {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_png(img: RgbImage) -> Result<Vec<u8>, String> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| e.to_string())?;
    Ok(bytes)
}

/// Быстрый расчёт для A4 с заданным полем
#[wasm_bindgen(js_name = quickPlan)]
pub fn quick_plan(count: Option<u32>, size: Option<f64>, margin: f64) -> Result<JsValue, JsError> {
    let config = SheetConfig {
        page: PageSpec::a4(margin),
        ..SheetConfig::default()
    };
    let planner = WasmSheetPlanner {
        generator: SheetGenerator::new(config),
    };
    planner.plan_layout(count, size)
}

/// Информация о версии
#[wasm_bindgen(js_name = version)]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
