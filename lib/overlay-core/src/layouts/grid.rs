use crate::config::LayoutConfig;
use crate::geometry::{Bounds, Size};
use crate::layouts::Layouter;
use crate::overlay::OverlayRef;
use crate::renderer::{RendererRef, WeakRendererRef};
use std::sync::Arc;

pub const GRID_IDENTIFIER: &str = "grid";

/// Splits the viewport into equally sized cells, `columns` per row, and gives
/// each overlay one cell in row-major order.
#[derive(Debug)]
pub struct GridLayouter {
    renderer: WeakRendererRef,
    columns: u32,
    margin: u32,
    spacing: u32,
}

impl GridLayouter {
    pub fn new(renderer: &RendererRef, config: &LayoutConfig) -> Arc<Self> {
        Arc::new(Self {
            renderer: Arc::downgrade(renderer),
            columns: config.grid_columns.max(1),
            margin: config.margin,
            spacing: config.spacing,
        })
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    fn cell_origin(&self, index: u32, extent: u32) -> i32 {
        let step = extent.saturating_add(self.spacing);
        let origin = self.margin.saturating_add(index.saturating_mul(step));
        i32::try_from(origin).unwrap_or(i32::MAX)
    }

    fn cell_extent(available: u32, margin: u32, spacing: u32, count: u32) -> u32 {
        available
            .saturating_sub(margin.saturating_mul(2))
            .saturating_sub(spacing.saturating_mul(count.saturating_sub(1)))
            / count.max(1)
    }
}

impl Layouter for GridLayouter {
    fn identifier(&self) -> &str {
        GRID_IDENTIFIER
    }

    fn renderer(&self) -> WeakRendererRef {
        self.renderer.clone()
    }

    fn prepare_layout(&self, renderer: &RendererRef, overlays: &[OverlayRef]) {
        if overlays.is_empty() {
            return;
        }

        let viewport = renderer.viewport();
        let count = overlays.len() as u32;
        let columns = self.columns.min(count);
        let rows = count.div_ceil(columns);

        let cell = Size::new(
            Self::cell_extent(viewport.width, self.margin, self.spacing, columns),
            Self::cell_extent(viewport.height, self.margin, self.spacing, rows),
        );

        for (index, overlay) in overlays.iter().enumerate() {
            let column = index as u32 % columns;
            let row = index as u32 / columns;
            let x = self.cell_origin(column, cell.width);
            let y = self.cell_origin(row, cell.height);
            overlay.set_bounds(renderer, Bounds::new(x, y, cell.width, cell.height));
        }
    }
}
