//! Модуль оптимизации раскладки
//!
//! Подбор сетки (столбцы × строки) и размера плитки для многократного
//! размещения QR-кода на листе:
//! - Режим A: задано количество, размер плитки максимизируется
//! - Режим B: задан размер, количество максимизируется
//! - Режим C: заданы и количество, и размер
//!
//! Все функции чистые: одинаковый вход всегда даёт одинаковый результат.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::page::{PageSpec, EPSILON};
use crate::TileError;

/// Верхняя граница количества плиток по умолчанию
pub const DEFAULT_MAX_COUNT: u32 = 10_000;

/// Верхняя граница плиток на листе в режиме B
pub const DEFAULT_MAX_TILES: u32 = 100_000;

/// Целевая функция раскладки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Плитки вплотную друг к другу, блок по центру печатной области
    #[default]
    TightPack,
    /// Лист делится на равные куски для резки, плитка по центру куска
    SquareCut,
}

/// Как поле принтера вычитается из листа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginPolicy {
    /// Один раз из всего листа, затем деление
    Page,
    /// Из каждой ячейки после деления всего листа
    Cell,
}

impl Objective {
    /// Каждой целевой функции соответствует ровно одна политика полей
    pub fn margin_policy(self) -> MarginPolicy {
        match self {
            Objective::TightPack => MarginPolicy::Page,
            Objective::SquareCut => MarginPolicy::Cell,
        }
    }
}

/// Настройки оптимизатора
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub objective: Objective,
    /// В режиме A дополнительно проверять сетку с переставленными осями.
    /// Переставленная сетка (⌈n/c⌉, c) не лучше прямой (C, ⌈n/C⌉) при C = ⌈n/c⌉,
    /// поэтому победитель от этого флага не меняется
    pub try_rotated: bool,
    /// Запросы с большим количеством отклоняются до поиска
    pub max_count: u32,
    /// Режим B не возвращает больше плиток на лист
    pub max_tiles: u32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            objective: Objective::TightPack,
            try_rotated: true,
            max_count: DEFAULT_MAX_COUNT,
            max_tiles: DEFAULT_MAX_TILES,
        }
    }
}

/// Запрос раскладки: количество и/или размер плитки (мм)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutRequest {
    pub count: Option<u32>,
    pub size: Option<f64>,
}

/// Что именно зафиксировано в запросе
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutMode {
    FixedCount(u32),
    FixedSize(f64),
    FixedBoth { count: u32, size: f64 },
}

impl LayoutRequest {
    pub fn new(count: Option<u32>, size: Option<f64>) -> Self {
        Self { count, size }
    }

    pub fn with_count(count: u32) -> Self {
        Self::new(Some(count), None)
    }

    pub fn with_size(size: f64) -> Self {
        Self::new(None, Some(size))
    }

    /// Проверка запроса и определение режима
    pub fn mode(&self, max_count: u32) -> Result<LayoutMode, TileError> {
        if let Some(count) = self.count {
            if count == 0 {
                return Err(TileError::InvalidRequest(
                    "count must be at least 1".to_string(),
                ));
            }
            if count > max_count {
                return Err(TileError::InvalidRequest(format!(
                    "count {count} exceeds the limit of {max_count}"
                )));
            }
        }
        if let Some(size) = self.size {
            if !size.is_finite() || size <= 0.0 {
                return Err(TileError::InvalidRequest(format!(
                    "tile size must be a positive number of mm, got {size}"
                )));
            }
        }

        match (self.count, self.size) {
            (Some(count), None) => Ok(LayoutMode::FixedCount(count)),
            (None, Some(size)) => Ok(LayoutMode::FixedSize(size)),
            (Some(count), Some(size)) => Ok(LayoutMode::FixedBoth { count, size }),
            (None, None) => Err(TileError::InvalidRequest(
                "either a tile count or a tile size is required".to_string(),
            )),
        }
    }
}

/// Результат раскладки
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub columns: u32,
    pub rows: u32,
    /// Сторона плитки (мм)
    pub tile_size: f64,
    /// Сколько плиток реально рисуется (последняя строка может быть неполной)
    pub count: u32,
    pub objective: Objective,
}

impl LayoutResult {
    /// Количество ячеек сетки
    pub fn capacity(&self) -> u32 {
        self.columns * self.rows
    }
}

/// Кандидат сетки с оценкой (больше - лучше)
#[derive(Debug, Clone, Copy)]
struct Candidate {
    columns: u32,
    rows: u32,
    score: f64,
}

/// Оптимизатор раскладки
pub struct LayoutOptimizer {
    options: LayoutOptions,
}

impl Default for LayoutOptimizer {
    fn default() -> Self {
        Self::new(LayoutOptions::default())
    }
}

impl LayoutOptimizer {
    /// Создание оптимизатора
    pub fn new(options: LayoutOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Подбор раскладки для листа и запроса
    pub fn optimize(
        &self,
        page: &PageSpec,
        request: &LayoutRequest,
    ) -> Result<LayoutResult, TileError> {
        // Запрос проверяется раньше листа
        let mode = request.mode(self.options.max_count)?;
        page.validate()?;

        let result = match mode {
            LayoutMode::FixedCount(count) => self.maximize_size(page, count)?,
            LayoutMode::FixedSize(size) => self.maximize_count(page, size)?,
            LayoutMode::FixedBoth { count, size } => match self.options.objective {
                Objective::TightPack => self.pack_fixed(page, count, size)?,
                Objective::SquareCut => self.square_cut(page, count, size)?,
            },
        };

        debug!(
            "Layout {:?}: {}x{} grid, tile {:.3} mm, {} tiles",
            mode, result.columns, result.rows, result.tile_size, result.count
        );
        Ok(result)
    }

    /// Режим A: количество задано, размер максимизируется
    fn maximize_size(&self, page: &PageSpec, count: u32) -> Result<LayoutResult, TileError> {
        let policy = self.options.objective.margin_policy();
        let grids = grid_candidates(count, self.options.try_rotated);

        let best = best_candidate(grids, |columns, rows| {
            let size = fitted_size(page, policy, columns, rows);
            (size > 0.0).then_some(size)
        });

        match best {
            Some(best) => Ok(self.result(best.columns, best.rows, best.score, count)),
            None => Err(TileError::Configuration(format!(
                "margin of {} mm is too large or {} tiles are too many for a {}x{} mm page",
                page.margin, count, page.width, page.height
            ))),
        }
    }

    /// Режим B: размер задан, количество максимизируется
    fn maximize_count(&self, page: &PageSpec, size: f64) -> Result<LayoutResult, TileError> {
        let (max_cols, max_rows) = self.grid_capacity(page, size)?;

        let count = u64::from(max_cols) * u64::from(max_rows);
        if count > u64::from(self.options.max_tiles) {
            return Err(TileError::Configuration(format!(
                "tile size {size} mm yields {count} tiles, above the limit of {}",
                self.options.max_tiles
            )));
        }

        Ok(self.result(max_cols, max_rows, size, count as u32))
    }

    /// Режим C: плотная укладка заданного количества заданного размера
    fn pack_fixed(&self, page: &PageSpec, count: u32, size: f64) -> Result<LayoutResult, TileError> {
        let (max_cols, max_rows) = self.grid_capacity(page, size)?;

        let columns = max_cols.min(count);
        let rows = count.div_ceil(columns);
        if rows > max_rows {
            return Err(does_not_fit(count, size, max_cols, max_rows));
        }

        Ok(self.result(columns, rows, size, count))
    }

    /// Режим C: ищем сетку, при которой куски листа ближе всего к квадрату
    fn square_cut(&self, page: &PageSpec, count: u32, size: f64) -> Result<LayoutResult, TileError> {
        let (max_cols, max_rows) = self.grid_capacity(page, size)?;

        let grids = grid_candidates(count, false)
            .filter(|&(columns, rows)| columns <= max_cols && rows <= max_rows);
        let best = best_candidate(grids, |columns, rows| {
            let cell_width = page.width / f64::from(columns);
            let cell_height = page.height / f64::from(rows);
            Some(-(cell_width - cell_height).abs())
        });

        match best {
            Some(best) => Ok(self.result(best.columns, best.rows, size, count)),
            None => Err(does_not_fit(count, size, max_cols, max_rows)),
        }
    }

    /// Сколько столбцов и строк плиток заданного размера помещается на лист
    fn grid_capacity(&self, page: &PageSpec, size: f64) -> Result<(u32, u32), TileError> {
        let (width, height, pitch) = match self.options.objective.margin_policy() {
            MarginPolicy::Page => (page.effective_width(), page.effective_height(), size),
            MarginPolicy::Cell => (page.width, page.height, size + 2.0 * page.margin),
        };

        let max_cols = floor_count(width / pitch);
        let max_rows = floor_count(height / pitch);
        if max_cols == 0 || max_rows == 0 {
            return Err(TileError::Configuration(format!(
                "tile size {size} mm with a {} mm margin does not fit a {}x{} mm page",
                page.margin, page.width, page.height
            )));
        }
        Ok((max_cols, max_rows))
    }

    fn result(&self, columns: u32, rows: u32, tile_size: f64, count: u32) -> LayoutResult {
        LayoutResult {
            columns,
            rows,
            tile_size,
            count,
            objective: self.options.objective,
        }
    }
}

/// Наибольшая плитка для сетки columns × rows
fn fitted_size(page: &PageSpec, policy: MarginPolicy, columns: u32, rows: u32) -> f64 {
    let columns = f64::from(columns);
    let rows = f64::from(rows);
    match policy {
        MarginPolicy::Page => (page.effective_width() / columns).min(page.effective_height() / rows),
        MarginPolicy::Cell => {
            let margin = 2.0 * page.margin;
            (page.width / columns - margin).min(page.height / rows - margin)
        }
    }
}

/// Сетки (c, ⌈n/c⌉) для c = 1..=n, затем (при rotated) переставленные (⌈n/c⌉, c)
fn grid_candidates(count: u32, rotated: bool) -> impl Iterator<Item = (u32, u32)> {
    let primary = (1..=count).map(move |columns| (columns, count.div_ceil(columns)));
    let swapped = (1..=count)
        .filter(move |_| rotated)
        .map(move |rows| (count.div_ceil(rows), rows));
    primary.chain(swapped)
}

/// Первый кандидат с наибольшей оценкой; равные оценки не вытесняют найденного ранее
fn best_candidate<I, F>(grids: I, score: F) -> Option<Candidate>
where
    I: Iterator<Item = (u32, u32)>,
    F: Fn(u32, u32) -> Option<f64>,
{
    grids
        .filter_map(|(columns, rows)| {
            score(columns, rows).map(|score| Candidate { columns, rows, score })
        })
        .fold(None, |best, candidate| match best {
            Some(best) if best.score >= candidate.score => Some(best),
            _ => Some(candidate),
        })
}

fn floor_count(ratio: f64) -> u32 {
    (ratio + EPSILON).floor().clamp(0.0, f64::from(u32::MAX)) as u32
}

fn does_not_fit(count: u32, size: f64, max_cols: u32, max_rows: u32) -> TileError {
    TileError::Configuration(format!(
        "requested {count} tiles of {size} mm do not fit; max capacity is {}",
        u64::from(max_cols) * u64::from(max_rows)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn optimizer(objective: Objective) -> LayoutOptimizer {
        LayoutOptimizer::new(LayoutOptions {
            objective,
            ..LayoutOptions::default()
        })
    }

    #[test]
    fn test_fixed_size_fills_page() {
        let page = PageSpec::a4(0.0);
        let result = LayoutOptimizer::default()
            .optimize(&page, &LayoutRequest::with_size(30.0))
            .unwrap();

        assert_eq!((result.columns, result.rows), (7, 9));
        assert_eq!(result.count, 63);
        assert_eq!(result.tile_size, 30.0);
    }

    #[test]
    fn test_fixed_count_maximizes_size() {
        let page = PageSpec::a4(5.0);
        let result = LayoutOptimizer::default()
            .optimize(&page, &LayoutRequest::with_count(20))
            .unwrap();

        // 200x287: 4x5 даёт min(50, 57.4) = 50
        assert_eq!((result.columns, result.rows), (4, 5));
        assert!((result.tile_size - 50.0).abs() < 1e-9);
        assert_eq!(result.count, 20);
    }

    #[test]
    fn test_rotation_does_not_change_tie_winner() {
        let page = PageSpec::a4(5.0);
        let plain = LayoutOptimizer::new(LayoutOptions {
            try_rotated: false,
            ..LayoutOptions::default()
        })
        .optimize(&page, &LayoutRequest::with_count(20))
        .unwrap();
        let rotated = LayoutOptimizer::default()
            .optimize(&page, &LayoutRequest::with_count(20))
            .unwrap();
        assert_eq!(plain, rotated);
    }

    #[test]
    fn test_fixed_count_margin_too_large() {
        // Поле 50 мм внутри клетки не оставляет места ни в одной сетке на 20 плиток
        let page = PageSpec::a4(50.0);
        let err = optimizer(Objective::SquareCut)
            .optimize(&page, &LayoutRequest::with_count(20))
            .unwrap_err();
        assert!(matches!(err, TileError::Configuration(_)));
    }

    #[test]
    fn test_small_tiles_fill_page() {
        let page = PageSpec::a4(5.0);
        let result = LayoutOptimizer::default()
            .optimize(&page, &LayoutRequest::with_size(1.0))
            .unwrap();
        assert_eq!((result.columns, result.rows), (200, 287));
        assert_eq!(result.count, 57_400);
    }

    #[test]
    fn test_tiles_per_sheet_limit() {
        let page = PageSpec::a4(5.0);
        let err = LayoutOptimizer::default()
            .optimize(&page, &LayoutRequest::with_size(0.5))
            .unwrap_err();
        assert!(matches!(err, TileError::Configuration(_)));
    }

    #[test]
    fn test_tile_larger_than_page() {
        let page = PageSpec::a4(0.0);
        let err = LayoutOptimizer::default()
            .optimize(&page, &LayoutRequest::with_size(300.0))
            .unwrap_err();
        assert!(matches!(err, TileError::Configuration(_)));
    }

    #[test]
    fn test_empty_request() {
        // Лист заведомо некорректен: ошибка запроса должна прийти раньше
        let page = PageSpec::new(-1.0, -1.0, 500.0);
        let err = LayoutOptimizer::default()
            .optimize(&page, &LayoutRequest::default())
            .unwrap_err();
        assert!(matches!(err, TileError::InvalidRequest(_)));
    }

    #[test]
    fn test_zero_count_rejected() {
        let err = LayoutRequest::with_count(0).mode(DEFAULT_MAX_COUNT).unwrap_err();
        assert!(matches!(err, TileError::InvalidRequest(_)));
    }

    #[test]
    fn test_count_above_limit_rejected() {
        let err = LayoutRequest::with_count(DEFAULT_MAX_COUNT + 1)
            .mode(DEFAULT_MAX_COUNT)
            .unwrap_err();
        assert!(matches!(err, TileError::InvalidRequest(_)));
    }

    #[test]
    fn test_nan_size_rejected() {
        let err = LayoutRequest::with_size(f64::NAN).mode(DEFAULT_MAX_COUNT).unwrap_err();
        assert!(matches!(err, TileError::InvalidRequest(_)));
    }

    #[test]
    fn test_pack_fixed_both() {
        let page = PageSpec::a4(0.0);
        let result = LayoutOptimizer::default()
            .optimize(&page, &LayoutRequest::new(Some(10), Some(40.0)))
            .unwrap();

        // 5 столбцов по 40 мм, 2 строки
        assert_eq!((result.columns, result.rows), (5, 2));
        assert_eq!(result.count, 10);
        assert_eq!(result.tile_size, 40.0);
    }

    #[test]
    fn test_pack_fixed_both_overflow_reports_capacity() {
        let page = PageSpec::a4(0.0);
        let err = LayoutOptimizer::default()
            .optimize(&page, &LayoutRequest::new(Some(64), Some(30.0)))
            .unwrap_err();

        match err {
            TileError::Configuration(message) => assert!(message.contains("63")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_square_cut_prefers_square_pieces() {
        let page = PageSpec::a4(0.0);
        let result = optimizer(Objective::SquareCut)
            .optimize(&page, &LayoutRequest::new(Some(20), Some(30.0)))
            .unwrap();

        // |52.5 - 59.4| меньше, чем у любой другой допустимой сетки
        assert_eq!((result.columns, result.rows), (4, 5));
        assert_eq!(result.objective, Objective::SquareCut);
    }

    #[test]
    fn test_square_cut_margin_per_cell() {
        // 30 + 2*5 = 40 мм на ячейку: 5 столбцов, 7 строк
        let page = PageSpec::a4(5.0);
        let result = optimizer(Objective::SquareCut)
            .optimize(&page, &LayoutRequest::with_size(30.0))
            .unwrap();
        assert_eq!((result.columns, result.rows), (5, 7));
        assert_eq!(result.count, 35);
    }

    #[test]
    fn test_square_cut_fixed_count_subtracts_margin_per_cell() {
        let page = PageSpec::a4(5.0);
        let result = optimizer(Objective::SquareCut)
            .optimize(&page, &LayoutRequest::with_count(20))
            .unwrap();

        // 4x5 кусков по 52.5x59.4, минус 10 мм
        assert_eq!((result.columns, result.rows), (4, 5));
        assert!((result.tile_size - 42.5).abs() < 1e-9);
    }

    #[test]
    fn test_square_cut_impossible_count() {
        let page = PageSpec::a4(0.0);
        let err = optimizer(Objective::SquareCut)
            .optimize(&page, &LayoutRequest::new(Some(100), Some(30.0)))
            .unwrap_err();
        assert!(matches!(err, TileError::Configuration(_)));
    }

    #[test]
    fn test_best_candidate_keeps_first_tie() {
        let grids = [(1, 4), (2, 2), (4, 1)].into_iter();
        let best = best_candidate(grids, |_, _| Some(1.0)).unwrap();
        assert_eq!((best.columns, best.rows), (1, 4));
    }

    #[test]
    fn test_floor_count_tolerates_rounding() {
        assert_eq!(floor_count(0.3 / 0.1), 3);
        assert_eq!(floor_count(2.5), 2);
    }
}
